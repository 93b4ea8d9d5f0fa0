//! Site configuration
//!
//! YAML overrides for the built-in widgets and the contact number.

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{ConfigLimits, ConfigLoader, LoadResult};
pub use schema::{ContactConfig, SiteConfig, WidgetOverride};
pub use validation::{ValidationResult, Validator};
