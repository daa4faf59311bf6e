//! Typed configuration models for usekit
//!
//! Raw document values are validated into serde models, edited as plain
//! Rust data and written back with [`fancy_dump`], which keeps the key
//! order and unknown keys of the value already on disk.
//!
//! Canonical order tables live next to each model as `static` data and are
//! checked against the serde schema by [`check_orderings`].

pub mod dump;
pub mod error;
pub mod introspect;
pub mod models;
pub mod ordering;
pub mod projection;

pub use dump::fancy_dump;
pub use error::{Error, Result};
pub use ordering::{FieldOrder, Ordering, Shape};
pub use projection::{Model, to_raw, validate};

/// Root order tables of every model usekit writes
pub fn registered_orderings() -> [&'static Ordering; 4] {
    [
        &models::precommit::CONFIG_ORDER,
        &models::pipelines::CONFIGURATION_ORDER,
        &models::pyproject::PROJECT_ORDER,
        &models::settings::SETTINGS_ORDER,
    ]
}

/// Check every registered order table against its model's fields.
pub fn check_orderings() -> Result<()> {
    ordering::check_all(&registered_orderings())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registered_orderings_are_valid() {
        check_orderings().unwrap();
    }
}
