//! Image tags for (module, platform) pairs.

use super::descriptor::ModuleDescriptor;
use edgedev_common::BuildOptionsSpec;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use tracing::debug;

/// Composite key identifying one buildable artifact.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PlatformTag {
    pub module: String,
    pub platform: String,
}

impl PlatformTag {
    pub fn new(module: impl Into<String>, platform: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            platform: platform.into(),
        }
    }
}

impl fmt::Display for PlatformTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.module, self.platform)
    }
}

/// A concrete `repository:version[-suffix]-platform` image reference.
///
/// Always lower-case when produced by [`ImageTag::compute`]. Equality is
/// exact string equality, so two pairs that yield the same tag are the same
/// build unit.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ImageTag(String);

impl ImageTag {
    pub fn compute(repository: &str, version: &str, env_suffix: &str, platform: &str) -> Self {
        let mut tag = format!("{repository}:{version}");
        if !env_suffix.is_empty() {
            tag.push('-');
            tag.push_str(env_suffix);
        }
        tag.push('-');
        tag.push_str(platform);
        Self(tag.to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Everything before the first `/`, which names the registry for
    /// qualified repositories (`localhost:5000/filtermodule:...`).
    pub fn registry_host(&self) -> &str {
        self.0.split('/').next().unwrap_or_default()
    }
}

impl From<&str> for ImageTag {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for ImageTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Tag of `descriptor` built for `platform`.
pub fn tag(descriptor: &ModuleDescriptor, platform: &str, env_suffix: &str) -> ImageTag {
    ImageTag::compute(
        &descriptor.repository,
        &descriptor.version,
        env_suffix,
        platform,
    )
}

/// How to build the image behind one [`ImageTag`].
#[derive(Debug, Clone, PartialEq)]
pub struct BuildProfile {
    pub module: String,
    pub dockerfile: PathBuf,
    pub context: PathBuf,
    pub build_options: BuildOptionsSpec,
}

/// Tags of every locally defined (module, platform) pair.
#[derive(Debug, Clone, Default)]
pub struct TagTable {
    tags: BTreeMap<PlatformTag, ImageTag>,
    profiles: BTreeMap<ImageTag, BuildProfile>,
}

impl TagTable {
    /// Compute tags for all `modules`.
    ///
    /// When two pairs yield the same tag, the profile of the module that
    /// comes later in `modules` is kept.
    pub fn compute(modules: &[ModuleDescriptor], env_suffix: &str) -> Self {
        let mut table = Self::default();
        for module in modules {
            for (platform, dockerfile) in module.dockerfiles() {
                let image = tag(module, platform, env_suffix);
                let profile = BuildProfile {
                    module: module.name.clone(),
                    dockerfile: dockerfile.to_path_buf(),
                    context: module.context.clone(),
                    build_options: module.build_options.clone(),
                };
                if let Some(previous) = table.profiles.insert(image.clone(), profile) {
                    debug!(
                        tag = %image,
                        previous = %previous.module,
                        module = %module.name,
                        "Image tag shared by several modules"
                    );
                }
                table
                    .tags
                    .insert(PlatformTag::new(&module.name, platform), image);
            }
        }
        table
    }

    pub fn get(&self, key: &PlatformTag) -> Option<&ImageTag> {
        self.tags.get(key)
    }

    pub fn profile(&self, tag: &ImageTag) -> Option<&BuildProfile> {
        self.profiles.get(tag)
    }

    /// All pairs in (module, platform) order.
    pub fn iter(&self) -> impl Iterator<Item = (&PlatformTag, &ImageTag)> {
        self.tags.iter()
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}
