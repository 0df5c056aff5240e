//! Project configuration.
//!
//! Everything a run needs from the outside world is read once into an
//! immutable [`ProjectConfig`] and handed to each component by reference.
//! Values come from environment-style variables (the names match the
//! `.env` files of existing IoT Edge projects); tests build the config from
//! an explicit map with [`ProjectConfig::from_vars`].

use crate::engine::EngineKind;
use crate::error::ConfigError;
use crate::modules::ImageTag;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

pub const MODULES_PATH: &str = "MODULES_PATH";
pub const DEPLOYMENT_CONFIG_TEMPLATE_FILE: &str = "DEPLOYMENT_CONFIG_TEMPLATE_FILE";
pub const CONFIG_OUTPUT_DIR: &str = "CONFIG_OUTPUT_DIR";
pub const CONTAINER_TAG: &str = "CONTAINER_TAG";
pub const BYPASS_MODULES: &str = "BYPASS_MODULES";
pub const ACTIVE_DOCKER_PLATFORMS: &str = "ACTIVE_DOCKER_PLATFORMS";
pub const CONTAINER_ENGINE: &str = "CONTAINER_ENGINE";

const REGISTRY_SERVER: &str = "CONTAINER_REGISTRY_SERVER";
const REGISTRY_USERNAME: &str = "CONTAINER_REGISTRY_USERNAME";
const REGISTRY_PASSWORD: &str = "CONTAINER_REGISTRY_PASSWORD";

/// Sentinel list entry meaning "every name".
pub const MATCH_ALL: &str = "*";

/// A configured list of module names or platforms.
///
/// Membership is an exact, case-sensitive comparison unless the list holds
/// the [`MATCH_ALL`] sentinel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameList {
    entries: Vec<String>,
    match_all: bool,
}

impl NameList {
    /// Parse a comma-separated list. Empty entries are dropped.
    pub fn parse(variable: &str, raw: &str) -> Result<Self, ConfigError> {
        let mut list = Self::default();
        for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            if entry == MATCH_ALL {
                list.match_all = true;
            } else if entry
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
            {
                list.entries.push(entry.to_string());
            } else {
                return Err(ConfigError::InvalidListEntry {
                    variable: variable.to_string(),
                    entry: entry.to_string(),
                });
            }
        }
        Ok(list)
    }

    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut list = Self::default();
        for name in names {
            let name = name.into();
            if name == MATCH_ALL {
                list.match_all = true;
            } else {
                list.entries.push(name);
            }
        }
        list
    }

    pub fn match_all() -> Self {
        Self {
            entries: Vec::new(),
            match_all: true,
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.match_all || self.entries.iter().any(|e| e == name)
    }

    pub fn is_empty(&self) -> bool {
        !self.match_all && self.entries.is_empty()
    }
}

impl fmt::Display for NameList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.match_all {
            return write!(f, "{MATCH_ALL}");
        }
        write!(f, "{}", self.entries.join(","))
    }
}

/// Login for one container registry.
#[derive(Clone, PartialEq, Eq)]
pub struct RegistryCredentials {
    pub server: String,
    pub username: String,
    pub password: String,
}

impl fmt::Debug for RegistryCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryCredentials")
            .field("server", &self.server)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Registry credentials keyed by the suffix of their variables.
///
/// `CONTAINER_REGISTRY_SERVER` is stored under the empty key,
/// `CONTAINER_REGISTRY_SERVER_ACR` under `ACR`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistryTable {
    registries: BTreeMap<String, RegistryCredentials>,
}

impl RegistryTable {
    fn from_vars(vars: &BTreeMap<String, String>) -> Self {
        let mut registries = BTreeMap::new();
        for (name, server) in vars {
            let Some(key) = name.strip_prefix(REGISTRY_SERVER) else {
                continue;
            };
            if !(key.is_empty() || key.starts_with('_')) || server.trim().is_empty() {
                continue;
            }
            let lookup =
                |base: &str| vars.get(&format!("{base}{key}")).cloned().unwrap_or_default();
            registries.insert(
                key.trim_start_matches('_').to_string(),
                RegistryCredentials {
                    server: server.trim().to_string(),
                    username: lookup(REGISTRY_USERNAME),
                    password: lookup(REGISTRY_PASSWORD),
                },
            );
        }
        Self { registries }
    }

    pub fn insert(&mut self, key: impl Into<String>, credentials: RegistryCredentials) {
        self.registries.insert(key.into(), credentials);
    }

    /// Find the registry whose server matches the tag's host segment,
    /// ignoring case.
    pub fn find_for_tag(&self, tag: &ImageTag) -> Option<&RegistryCredentials> {
        let host = tag.registry_host();
        self.registries
            .values()
            .find(|r| r.server.eq_ignore_ascii_case(host))
    }

    pub fn len(&self) -> usize {
        self.registries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registries.is_empty()
    }
}

/// Immutable per-run configuration.
#[derive(Debug, Clone)]
pub struct ProjectConfig {
    /// Directory whose immediate subdirectories are modules.
    pub modules_path: PathBuf,
    /// Deployment manifest template.
    pub deployment_template: PathBuf,
    /// Directory the patched manifest is written to.
    pub config_output_dir: PathBuf,
    /// Environment suffix inserted into every image tag.
    pub container_tag: String,
    pub bypass_modules: NameList,
    pub active_platforms: NameList,
    pub engine: EngineKind,
    pub registries: RegistryTable,
    /// Variables available for `${VAR}` expansion.
    pub vars: BTreeMap<String, String>,
}

impl ProjectConfig {
    /// Read the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(std::env::vars())
    }

    pub fn from_vars<I, K, V>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let vars: BTreeMap<String, String> = vars
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        let get = |name: &str| vars.get(name).map(|v| v.trim()).unwrap_or("");
        let path_or = |name: &str, default: &str| {
            let value = get(name);
            PathBuf::from(if value.is_empty() { default } else { value })
        };

        let engine = match get(CONTAINER_ENGINE) {
            "" => EngineKind::default(),
            name => name.parse()?,
        };

        Ok(Self {
            modules_path: path_or(MODULES_PATH, "modules"),
            deployment_template: path_or(
                DEPLOYMENT_CONFIG_TEMPLATE_FILE,
                "deployment.template.json",
            ),
            config_output_dir: path_or(CONFIG_OUTPUT_DIR, "config"),
            container_tag: get(CONTAINER_TAG).to_string(),
            bypass_modules: NameList::parse(BYPASS_MODULES, get(BYPASS_MODULES))?,
            active_platforms: NameList::parse(
                ACTIVE_DOCKER_PLATFORMS,
                get(ACTIVE_DOCKER_PLATFORMS),
            )?,
            engine,
            registries: RegistryTable::from_vars(&vars),
            vars,
        })
    }

    /// Use `template` instead of the configured deployment template.
    pub fn with_template(mut self, template: impl Into<PathBuf>) -> Self {
        self.deployment_template = template.into();
        self
    }

    /// Path of the patched manifest: the template's file name without
    /// `.template`, inside the output directory.
    pub fn deployment_output(&self) -> PathBuf {
        let name = self
            .deployment_template
            .file_name()
            .map(|n| n.to_string_lossy().replace(".template", ""))
            .unwrap_or_else(|| "deployment.json".to_string());
        self.config_output_dir.join(name)
    }
}
