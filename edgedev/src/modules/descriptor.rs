//! Module descriptors read from `<modules root>/<name>/module.json`.

use crate::error::ResolveError;
use edgedev_common::module::MODULE_METADATA_FILE;
use edgedev_common::vars::expand_vars;
use edgedev_common::{BuildOptionsSpec, MetadataError, ModuleMetadata};
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// Everything needed to build one module's images.
///
/// Every platform has a Dockerfile; [`ModuleDescriptor::load`] rejects
/// metadata that breaks this.
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleDescriptor {
    /// Directory name of the module.
    pub name: String,
    pub directory: PathBuf,
    pub repository: String,
    pub version: String,
    /// Platform to Dockerfile, joined onto `directory`.
    dockerfiles: BTreeMap<String, PathBuf>,
    /// Build context, joined onto `directory`.
    pub context: PathBuf,
    pub build_options: BuildOptionsSpec,
}

impl ModuleDescriptor {
    /// Load the module in `directory`.
    ///
    /// Returns `Ok(None)` when the directory has no `module.json`, which
    /// just means it is not a module.
    pub fn load(
        directory: &Path,
        vars: &BTreeMap<String, String>,
    ) -> Result<Option<Self>, MetadataError> {
        let name = directory
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let path = directory.join(MODULE_METADATA_FILE);

        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                trace!(module = %name, "No {} found, skipping", MODULE_METADATA_FILE);
                return Ok(None);
            }
            Err(source) => {
                return Err(MetadataError::Read {
                    module: name,
                    path,
                    source,
                });
            }
        };

        let metadata = ModuleMetadata::from_json(&name, &expand_vars(&raw, vars))?;
        Ok(Some(Self::from_metadata(name, directory, metadata)))
    }

    pub fn from_metadata(name: String, directory: &Path, metadata: ModuleMetadata) -> Self {
        let image = metadata.image;
        let dockerfiles = image
            .tag
            .platforms
            .into_iter()
            .map(|(platform, dockerfile)| (platform, directory.join(dockerfile)))
            .collect();

        Self {
            name,
            directory: directory.to_path_buf(),
            repository: image.repository,
            version: image.tag.version,
            dockerfiles,
            context: directory.join(image.context_path),
            build_options: image.build_options,
        }
    }

    /// Supported platforms in sorted order.
    pub fn platforms(&self) -> impl Iterator<Item = &str> {
        self.dockerfiles.keys().map(String::as_str)
    }

    pub fn dockerfile(&self, platform: &str) -> Option<&Path> {
        self.dockerfiles.get(platform).map(PathBuf::as_path)
    }

    /// (platform, Dockerfile) pairs in platform order.
    pub fn dockerfiles(&self) -> impl Iterator<Item = (&str, &Path)> {
        self.dockerfiles
            .iter()
            .map(|(platform, path)| (platform.as_str(), path.as_path()))
    }
}

/// Read every module under `root`, sorted by directory name.
///
/// Subdirectories without `module.json` are skipped. Malformed metadata is
/// an error naming the module.
pub fn resolve_modules(
    root: &Path,
    vars: &BTreeMap<String, String>,
) -> Result<Vec<ModuleDescriptor>, ResolveError> {
    if !root.is_dir() {
        return Err(ResolveError::ModulesRootMissing {
            path: root.to_path_buf(),
        });
    }

    let unreadable = |source| ResolveError::ModulesRootUnreadable {
        path: root.to_path_buf(),
        source,
    };
    let mut directories = Vec::new();
    for entry in fs::read_dir(root).map_err(unreadable)? {
        let path = entry.map_err(unreadable)?.path();
        if path.is_dir() {
            directories.push(path);
        }
    }
    directories.sort();

    let mut modules = Vec::new();
    for directory in directories {
        if let Some(module) = ModuleDescriptor::load(&directory, vars)? {
            debug!(
                module = %module.name,
                repository = %module.repository,
                platforms = module.dockerfiles.len(),
                "Resolved module"
            );
            modules.push(module);
        }
    }
    Ok(modules)
}
