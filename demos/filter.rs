use crossfacet::faculty::Faculty;
use crossfacet::{FilterPredicate, Frame, Key, Reducer};

use crate::utils::sample_faculty;
mod utils;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut frame = Frame::from_records(sample_faculty());

    let sex = frame.dimension("sex", |r: &Faculty| Key::from(r.sex.clone()))?;
    let salary = frame.dimension("salary", |r: &Faculty| Key::from(r.salary))?;
    let count = frame.group_count(sex);

    println!("Unfiltered:");
    for row in frame.group_rows(count) {
        println!("  {:?} => {}", row.key, row.value);
    }

    // Only records earning 100k or more; the sex counts update from the
    // delta of records leaving the active subset
    frame.filter(
        salary,
        Some(FilterPredicate::GreaterThan(Key::from(99_999))),
    )?;
    println!("Salary >= 100k:");
    for row in frame.group_rows(count) {
        println!("  {:?} => {}", row.key, row.value);
    }

    frame.filter(salary, None)?;
    println!("Cleared ({} active records)", frame.active_count());

    Ok(())
}
