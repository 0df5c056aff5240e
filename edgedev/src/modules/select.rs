//! Choosing which tags to build and push.

use super::tag::{BuildProfile, ImageTag, TagTable};
use crate::config::NameList;
use edgedev_common::DeploymentReference;
use std::collections::BTreeMap;
use tracing::trace;

/// Tags selected for this run, in ascending tag order.
#[derive(Debug, Clone, Default)]
pub struct BuildSet {
    entries: BTreeMap<ImageTag, BuildProfile>,
}

impl BuildSet {
    pub fn iter(&self) -> impl Iterator<Item = (&ImageTag, &BuildProfile)> {
        self.entries.iter()
    }

    pub fn tags(&self) -> impl Iterator<Item = &ImageTag> {
        self.entries.keys()
    }

    pub fn contains(&self, tag: &ImageTag) -> bool {
        self.entries.contains_key(tag)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn add(&mut self, tag: &ImageTag, table: &TagTable) {
        if let Some(profile) = table.profile(tag) {
            self.entries.insert(tag.clone(), profile.clone());
        }
    }
}

/// Select the tags to build.
///
/// Local tags need a module outside `bypass` and a platform in `active`.
/// Manifest-referenced tags only need a module outside `bypass`, since the
/// manifest already pinned the platform.
pub fn select(
    table: &TagTable,
    referenced: &[(DeploymentReference, ImageTag)],
    bypass: &NameList,
    active: &NameList,
) -> BuildSet {
    let mut set = BuildSet::default();

    for (key, tag) in table.iter() {
        if !bypass.contains(&key.module) && active.contains(&key.platform) {
            set.add(tag, table);
        } else {
            trace!(module = %key.module, platform = %key.platform, "Not selected locally");
        }
    }

    for (reference, tag) in referenced {
        if !bypass.contains(&reference.module) {
            set.add(tag, table);
        }
    }

    set
}
