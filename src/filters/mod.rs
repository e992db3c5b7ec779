//! Per-parameter value normalizers applied before a value becomes a criteria.

mod date_time;
mod entity_name;
mod identifier;

pub use date_time::*;
pub use entity_name::*;
pub use identifier::*;

use crate::error::Result;

/// Converts a raw, pattern-checked query parameter into a typed filter value.
pub trait ParameterFilter {
    type Output;

    fn filter(&self, raw: &str) -> Result<Self::Output>;
}
