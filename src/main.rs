use std::path::Path;

use crossfacet::faculty::dashboard::SalaryDashboard;
use crossfacet::faculty::load_csv;
use jemallocator::Jemalloc;

#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

fn print_snapshot(dash: &SalaryDashboard) {
    println!("  gender balance:");
    for row in dash.gender_balance() {
        println!("    {:?} => {}", row.key, row.value);
    }
    println!("  average salaries:");
    for row in dash.average_salaries() {
        println!("    {:?} => {:.2}", row.key, row.value.average);
    }
    println!("  rank distribution:");
    for stack in dash.rank_distribution() {
        for row in stack.rows {
            println!(
                "    {} / {:?} => {:.1}%",
                stack.rank,
                row.key,
                row.value.ratio() * 100.0
            );
        }
    }
    println!(
        "  professors among women: {:.2}%",
        dash.percent_professors("Female") * 100.0
    );
    println!(
        "  professors among men: {:.2}%",
        dash.percent_professors("Male") * 100.0
    );
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();
    let path = args
        .get(1)
        .map(String::as_str)
        .unwrap_or("data/Salaries.csv");

    let records = load_csv(Path::new(path))?;
    println!("Loaded {} records from {}", records.len(), path);

    let mut dash = SalaryDashboard::new(records)?;

    println!("\nUnfiltered:");
    print_snapshot(&dash);

    for discipline in ["A", "B"] {
        dash.filter_discipline(Some(discipline))?;
        println!("\nDiscipline {}:", discipline);
        print_snapshot(&dash);
    }
    dash.filter_discipline(None)?;

    if let Some((lo, hi)) = dash.service_range()? {
        println!("\nYears-of-service axis: {} .. {}", lo, hi);
    }
    if let Some((lo, hi)) = dash.phd_range()? {
        println!("Years-since-PhD axis: {} .. {}", lo, hi);
    }

    Ok(())
}
