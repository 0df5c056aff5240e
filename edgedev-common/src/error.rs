use std::path::PathBuf;
use thiserror::Error;

/// A module directory whose metadata exists but cannot be used.
#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("module '{module}': failed to read {}: {source}", .path.display())]
    Read {
        module: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("module '{module}': invalid module.json: {source}")]
    Parse {
        module: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("module '{module}': {field} must not be empty")]
    MissingField { module: String, field: &'static str },
    #[error("module '{module}': no platforms declared under image.tag.platforms")]
    NoPlatforms { module: String },
    #[error("module '{module}': platform '{platform}' has an empty Dockerfile path")]
    EmptyDockerfile { module: String, platform: String },
}

impl MetadataError {
    /// Name of the module the error refers to.
    pub fn module(&self) -> &str {
        match self {
            MetadataError::Read { module, .. }
            | MetadataError::Parse { module, .. }
            | MetadataError::MissingField { module, .. }
            | MetadataError::NoPlatforms { module }
            | MetadataError::EmptyDockerfile { module, .. } => module,
        }
    }
}
