//! File formats shared by the edgedev tools.
//!
//! - [`module`]: the per-module `module.json` metadata file
//! - [`deployment`]: module references inside a deployment manifest template
//! - [`vars`]: `${VAR}` expansion applied to both of the above

pub mod deployment;
pub mod error;
pub mod module;
pub mod vars;

pub use deployment::{DeploymentReference, DeploymentTemplate};
pub use error::MetadataError;
pub use module::{BuildOptionsSpec, ImageSection, ModuleMetadata, TagSection};
