pub mod binomial;
pub mod tally;

pub use tally::{SignificanceReport, DEFAULT_ALPHA};
