//! URL construction for named resources.
//!
//! Independent of the dispatcher: this module only renders URL strings.
//!
//! - [`UrlBuilder`] - Low-level assembly from a preset, segments, params and query
//! - [`ResourceDefinition`] - A path with its allowed methods and parameter names
//! - [`UrlChain`] - Staged, validating builder over a set of resources

mod builder;
mod chain;
mod resource;

pub use builder::{UrlBuilder, UrlPreset};
pub use chain::{MethodSelected, ParamsSelected, QuerySelected, ResourceSelected, UrlChain};
pub use resource::{ResourceBuilder, ResourceDefinition};
