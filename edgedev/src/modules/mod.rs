//! Module build/push orchestration.
//!
//! A run flows through the submodules in order:
//!
//! 1. [`descriptor`]: read `module.json` from every module directory
//! 2. [`tag`]: compute an image tag for each (module, platform)
//! 3. [`reconcile`]: match the deployment manifest's `${MODULES.*}`
//!    references against those tags
//! 4. [`select`]: apply the bypass and active-platform lists
//! 5. [`driver`]: build and push the selected tags through the engine
//! 6. [`patch`]: write the resolved tags into the deployment manifest
//!
//! [`plan`] ties them together behind the [`Plannable`](crate::plan::Plannable)
//! interface.

pub mod build_options;
pub mod descriptor;
pub mod driver;
pub mod patch;
pub mod plan;
pub mod reconcile;
pub mod select;
pub mod tag;

pub use descriptor::{ModuleDescriptor, resolve_modules};
pub use driver::{BuildMode, DriveReport, Driver, TagOutcome, TagState};
pub use patch::{ReplacementMap, apply_replacements};
pub use plan::{BuildPushCommand, BuildPushPlan};
pub use reconcile::{Reconciliation, reconcile};
pub use select::{BuildSet, select};
pub use tag::{BuildProfile, ImageTag, PlatformTag, TagTable, tag};
