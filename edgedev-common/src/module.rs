//! The per-module `module.json` metadata file.
//!
//! ```json
//! {
//!   "$schema-version": "0.0.1",
//!   "image": {
//!     "repository": "${CONTAINER_REGISTRY_SERVER}/filtermodule",
//!     "tag": {
//!       "version": "0.0.1",
//!       "platforms": { "amd64": "./Dockerfile.amd64" }
//!     },
//!     "buildOptions": [],
//!     "contextPath": "./"
//!   }
//! }
//! ```

use crate::error::MetadataError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Name of the metadata file inside every module directory.
pub const MODULE_METADATA_FILE: &str = "module.json";

/// Contents of one `module.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
pub struct ModuleMetadata {
    /// Version of the module.json format
    #[serde(
        rename = "$schema-version",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub schema_version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// How the module's container images are built
    pub image: ImageSection,

    /// Language the module was scaffolded from (informational)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

/// The `image` section of `module.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
#[serde(rename_all = "camelCase")]
pub struct ImageSection {
    /// Image repository, e.g. `localhost:5000/filtermodule`. May reference `${VAR}`s.
    pub repository: String,

    pub tag: TagSection,

    /// Extra options handed to the container engine's build call
    #[serde(default)]
    pub build_options: BuildOptionsSpec,

    /// Build context, relative to the module directory
    #[serde(default = "default_context_path")]
    pub context_path: String,
}

/// Version and per-platform Dockerfiles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
pub struct TagSection {
    pub version: String,

    /// Platform identifier to Dockerfile path (relative to the module directory)
    pub platforms: BTreeMap<String, String>,
}

/// Free-form build options.
///
/// The list shape holds engine CLI arguments (`"--build-arg FOO=bar"`); the
/// map shape holds option names with JSON values (`{"nocache": true}`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
#[serde(untagged)]
pub enum BuildOptionsSpec {
    List(Vec<String>),
    Map(BTreeMap<String, serde_json::Value>),
}

impl Default for BuildOptionsSpec {
    fn default() -> Self {
        BuildOptionsSpec::List(Vec::new())
    }
}

impl BuildOptionsSpec {
    pub fn is_empty(&self) -> bool {
        match self {
            BuildOptionsSpec::List(items) => items.is_empty(),
            BuildOptionsSpec::Map(items) => items.is_empty(),
        }
    }
}

fn default_context_path() -> String {
    "./".to_string()
}

impl ModuleMetadata {
    /// Parse and validate the metadata of `module`.
    ///
    /// `content` must already have its `${VAR}` references expanded.
    pub fn from_json(module: &str, content: &str) -> Result<Self, MetadataError> {
        let metadata: Self =
            serde_json::from_str(content).map_err(|source| MetadataError::Parse {
                module: module.to_string(),
                source,
            })?;
        metadata.validate(module)?;
        Ok(metadata)
    }

    fn validate(&self, module: &str) -> Result<(), MetadataError> {
        if self.image.repository.trim().is_empty() {
            return Err(MetadataError::MissingField {
                module: module.to_string(),
                field: "image.repository",
            });
        }
        if self.image.tag.version.trim().is_empty() {
            return Err(MetadataError::MissingField {
                module: module.to_string(),
                field: "image.tag.version",
            });
        }
        if self.image.tag.platforms.is_empty() {
            return Err(MetadataError::NoPlatforms {
                module: module.to_string(),
            });
        }
        if let Some((platform, _)) = self
            .image
            .tag
            .platforms
            .iter()
            .find(|(_, dockerfile)| dockerfile.trim().is_empty())
        {
            return Err(MetadataError::EmptyDockerfile {
                module: module.to_string(),
                platform: platform.clone(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FILTER_MODULE: &str = r#"{
        "$schema-version": "0.0.1",
        "description": "",
        "image": {
            "repository": "localhost:5000/filtermodule",
            "tag": {
                "version": "0.0.1",
                "platforms": {
                    "amd64": "./Dockerfile.amd64",
                    "arm32v7": "./Dockerfile.arm32v7"
                }
            },
            "buildOptions": ["--add-host=github.com:192.30.255.112"],
            "contextPath": "./"
        },
        "language": "csharp"
    }"#;

    #[test]
    fn parses_list_build_options() {
        let metadata = ModuleMetadata::from_json("filtermodule", FILTER_MODULE).unwrap();
        assert_eq!(metadata.image.repository, "localhost:5000/filtermodule");
        assert_eq!(metadata.image.tag.version, "0.0.1");
        assert_eq!(
            metadata.image.tag.platforms.keys().collect::<Vec<_>>(),
            vec!["amd64", "arm32v7"]
        );
        assert_eq!(
            metadata.image.build_options,
            BuildOptionsSpec::List(vec!["--add-host=github.com:192.30.255.112".to_string()])
        );
        assert_eq!(metadata.language.as_deref(), Some("csharp"));
    }

    #[test]
    fn defaults_context_and_options() {
        let json = r#"{"image": {"repository": "r/m", "tag": {"version": "1.0", "platforms": {"amd64": "Dockerfile"}}}}"#;
        let metadata = ModuleMetadata::from_json("m", json).unwrap();
        assert_eq!(metadata.image.context_path, "./");
        assert!(metadata.image.build_options.is_empty());
    }

    #[test]
    fn accepts_map_build_options() {
        let json = r#"{"image": {"repository": "r/m", "tag": {"version": "1.0", "platforms": {"amd64": "Dockerfile"}},
            "buildOptions": {"nocache": true, "buildargs": {"A": "1"}}}}"#;
        let metadata = ModuleMetadata::from_json("m", json).unwrap();
        match metadata.image.build_options {
            BuildOptionsSpec::Map(map) => {
                assert_eq!(map.get("nocache"), Some(&serde_json::json!(true)));
            }
            other => panic!("expected map options, got {other:?}"),
        }
    }

    #[test]
    fn invalid_json_names_module() {
        let err = ModuleMetadata::from_json("broken", "{ not json").unwrap_err();
        assert_eq!(err.module(), "broken");
        assert!(err.to_string().contains("broken"));
    }

    #[test]
    fn empty_repository_is_rejected() {
        let json = r#"{"image": {"repository": " ", "tag": {"version": "1.0", "platforms": {"amd64": "Dockerfile"}}}}"#;
        let err = ModuleMetadata::from_json("m", json).unwrap_err();
        assert!(matches!(
            err,
            MetadataError::MissingField {
                field: "image.repository",
                ..
            }
        ));
    }

    #[test]
    fn no_platforms_is_rejected() {
        let json = r#"{"image": {"repository": "r/m", "tag": {"version": "1.0", "platforms": {}}}}"#;
        let err = ModuleMetadata::from_json("m", json).unwrap_err();
        assert!(matches!(err, MetadataError::NoPlatforms { .. }));
    }

    #[test]
    fn empty_dockerfile_is_rejected() {
        let json = r#"{"image": {"repository": "r/m", "tag": {"version": "1.0", "platforms": {"arm64v8": ""}}}}"#;
        let err = ModuleMetadata::from_json("m", json).unwrap_err();
        assert!(err.to_string().contains("arm64v8"));
    }
}
