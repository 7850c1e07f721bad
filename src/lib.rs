//! # crossfacet
//!
//! `crossfacet` is an in-memory multidimensional filtering engine that keeps
//! group aggregates (counts, sums, averages, ratios) correct incrementally
//! as filters change, instead of rescanning the dataset. It supports:
//!
//! - An immutable record store loaded once at startup
//! - Dimensions: pure key projections with a sorted reverse index
//! - One filter per dimension (set, replace, clear), conjoined across
//!   dimensions — with the self-filter exemption: a dimension's own groups
//!   ignore that dimension's own filter
//! - Incremental group aggregators parameterized by an
//!   `initial`/`add`/`remove` reducer triple, plus keyless `group_all`
//!   accumulators for scalar summaries
//! - `top`/`bottom` record queries for axis ranges
//! - A memory-mapped, parallel CSV loader for the faculty salaries dataset
//!
//! Filter-change cost is proportional to the records entering or leaving
//! the active subset, never to the dataset size — which is what keeps a
//! dashboard built on top of it interactive.
//!
//! # Example
//!
//! ```rust
//! use crossfacet::{FilterPredicate, Frame, Key, Reducer};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut frame = Frame::from_records(vec![
//!         ("Male", 100_i64),
//!         ("Female", 200),
//!         ("Female", 50),
//!     ]);
//!
//!     let sex = frame.dimension("sex", |r: &(&str, i64)| Key::from(r.0))?;
//!     let salary = frame.dimension("salary", |r: &(&str, i64)| Key::from(r.1))?;
//!
//!     let avg = frame.group(sex, Reducer::average(|r: &(&str, i64)| r.1 as f64));
//!
//!     frame.filter(salary, Some(FilterPredicate::GreaterThan(Key::from(60))))?;
//!     for row in frame.group_rows(avg) {
//!         println!("{:?} => {:?}", row.key, row.value);
//!     }
//!     Ok(())
//! }
//! ```

pub mod engine;
pub mod faculty;

pub use engine::dimension::DimensionHandle;
pub use engine::frame::Frame;
pub use engine::group::{Average, Fraction, GroupAllHandle, GroupHandle, Reducer};
pub use engine::record_store::RecordStore;
pub use engine::{FacetError, FilterPredicate, GroupRow, Key};
