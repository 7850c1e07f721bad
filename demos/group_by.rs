use crossfacet::faculty::Faculty;
use crossfacet::{Frame, Key, Reducer};

use crate::utils::sample_faculty;
mod utils;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut frame = Frame::from_records(sample_faculty());

    let sex = frame.dimension("sex", |r: &Faculty| Key::from(r.sex.clone()))?;

    // Average salary per gender, maintained incrementally
    let avg = frame.group(sex, Reducer::average(|r: &Faculty| r.salary as f64));
    for row in frame.group_rows(avg) {
        println!("{:?} => {:.2}", row.key, row.value.average);
    }

    Ok(())
}
