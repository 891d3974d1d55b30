//! Update classification and decision rules.
//!
//! This module provides:
//! - The locale matcher behind the language rule
//! - The selection filter deciding whether an update stays in the catalog
//! - The first-match-wins decision pipeline
//!
//! Everything here is pure: no server access, no I/O.

mod decision;
mod locale;
mod selection;

pub use decision::{Architecture, Decision, Pipeline};
pub use locale::{matches_disallowed_locale, LocaleMatcher};
pub use selection::is_selected;
