//! Matching deployment manifest references against local modules.

use super::patch::ReplacementMap;
use super::tag::{ImageTag, PlatformTag, TagTable};
use edgedev_common::DeploymentReference;
use tracing::debug;

/// Result of reconciling the manifest's references with the tag table.
#[derive(Debug, Clone, Default)]
pub struct Reconciliation {
    /// Placeholders with a local module behind them.
    pub replacements: ReplacementMap,
    /// Resolved references with their tags, in manifest order.
    pub referenced: Vec<(DeploymentReference, ImageTag)>,
    /// References with no local (module, platform); their placeholders
    /// stay in the manifest as written.
    pub unresolved: Vec<DeploymentReference>,
}

pub fn reconcile(references: &[DeploymentReference], table: &TagTable) -> Reconciliation {
    let mut result = Reconciliation::default();
    for reference in references {
        let key = PlatformTag::new(&reference.module, &reference.platform);
        match table.get(&key) {
            Some(tag) => {
                result.replacements.insert(reference, tag.clone());
                result.referenced.push((reference.clone(), tag.clone()));
            }
            None => {
                debug!(reference = %reference, "No local module for deployment reference");
                result.unresolved.push(reference.clone());
            }
        }
    }
    result
}
