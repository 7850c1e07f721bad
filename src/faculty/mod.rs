//! Faculty dataset: the typed record struct, the CSV loader and the
//! dashboard view wiring.

pub mod dashboard;
pub mod loader;

pub use loader::load_csv;

/// Rank categories of the dataset, in display order
pub const RANKS: [&str; 3] = ["Prof", "AsstProf", "AssocProf"];

/// One faculty row with named, typed fields (fixed at load time — no
/// dynamic property bags)
#[derive(Debug, Clone, PartialEq)]
pub struct Faculty {
    pub sex: String,
    pub rank: String,
    pub discipline: String,
    pub salary: i64,
    pub yrs_service: i64,
    pub yrs_since_phd: i64,
}
