//! Version parsing and comparison.
//!
//! - [`comparison`] - dotted-numeric versions and the comparator used by the loop guard

pub mod comparison;

pub use comparison::{DottedVersion, VersionComparator};
