//! Widgets
//!
//! The embeddable surfaces built on the phase engine: the cycling
//! [`Widget`] shell, the non-cycling [`Panel`], the catalog of concrete
//! widgets and the text renderer used by the CLI.

pub mod catalog;
pub mod panel;
pub mod render;
pub mod shell;

pub use catalog::{CatalogEntry, catalog, lookup};
pub use panel::{Panel, PanelDef};
pub use render::Scene;
pub use shell::{Widget, WidgetConfig, WidgetDef, WidgetSnapshot, WidgetState};

use crate::error::PhaseError;

/// Classes every widget container carries.
pub const BASE_CONTAINER_CLASS: &str = "relative w-full h-full overflow-hidden rounded-lg";

/// Common surface of everything the catalog can build.
pub trait Mockup: Send {
    /// Catalog key.
    fn key(&self) -> &str;

    /// Mounts and starts timers. A no-op when already active.
    ///
    /// # Errors
    ///
    /// Returns [`PhaseError`] if the first phase cannot be mounted.
    fn activate(&mut self) -> Result<(), PhaseError>;

    /// Tears down every timer. Returns `true` if it was active.
    fn deactivate(&mut self) -> bool;

    /// Returns `true` while active.
    fn is_active(&self) -> bool;

    /// Full container class string.
    fn container_class(&self) -> String;

    /// Text rendering of what is on screen right now.
    fn scene(&self) -> Scene;
}

/// Joins the base container classes with the embedding's extra classes.
#[must_use]
pub fn container_class(extra: &str) -> String {
    let extra = extra.trim();
    if extra.is_empty() {
        BASE_CONTAINER_CLASS.to_string()
    } else {
        format!("{BASE_CONTAINER_CLASS} {extra}")
    }
}
