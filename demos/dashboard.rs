use crossfacet::faculty::dashboard::SalaryDashboard;

use crate::utils::sample_faculty;
mod utils;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut dash = SalaryDashboard::new(sample_faculty())?;

    println!("Gender balance:");
    for row in dash.gender_balance() {
        println!("  {:?} => {}", row.key, row.value);
    }

    println!("Rank distribution:");
    for stack in dash.rank_distribution() {
        for row in stack.rows {
            println!(
                "  {} / {:?} => {:.1}%",
                stack.rank,
                row.key,
                row.value.ratio() * 100.0
            );
        }
    }

    dash.filter_discipline(Some("A"))?;
    println!("Average salaries, discipline A:");
    for row in dash.average_salaries() {
        println!("  {:?} => {:.2}", row.key, row.value.average);
    }

    println!(
        "Professors among women: {:.1}%",
        dash.percent_professors("Female") * 100.0
    );

    Ok(())
}
