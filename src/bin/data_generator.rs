use rand::Rng;
use std::fs::File;
use std::io::{BufWriter, Write};

fn main() {
    let path = "data/Salaries.csv";
    std::fs::create_dir_all("data").unwrap();
    let file = File::create(path).unwrap();
    let mut writer = BufWriter::new(file);

    writeln!(writer, "\"\",rank,discipline,yrs.since.phd,yrs.service,sex,salary").unwrap();

    let mut rng = rand::rng();
    for i in 0..100_000 {
        let rank = ["Prof", "AsstProf", "AssocProf"][rng.random_range(0..3)];
        let discipline = ["A", "B"][rng.random_range(0..2)];
        let yrs_since_phd = rng.random_range(1..45);
        let yrs_service = rng.random_range(0..yrs_since_phd + 1);
        let sex = ["Male", "Female"][rng.random_range(0..2)];
        let salary = rng.random_range(55_000..240_000);
        writeln!(
            writer,
            "\"{}\",\"{}\",\"{}\",{},{},\"{}\",{}",
            i + 1,
            rank,
            discipline,
            yrs_since_phd,
            yrs_service,
            sex,
            salary
        )
        .unwrap();
    }

    println!("Sample CSV generated: {}", path);
}
