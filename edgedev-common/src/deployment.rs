//! Module references inside a deployment manifest template.
//!
//! A template points at locally built images through placeholders of the
//! form `${MODULES.<module>.<platform>}` in each module's `settings.image`.

use serde_json::Value;
use std::fmt;

/// Leading segment of a module image placeholder.
pub const MODULES_PREFIX: &str = "MODULES";

/// A (module, platform) pair required by the deployment manifest.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DeploymentReference {
    pub module: String,
    pub platform: String,
}

impl DeploymentReference {
    pub fn new(module: impl Into<String>, platform: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            platform: platform.into(),
        }
    }

    /// The placeholder text this reference appears as in the template.
    pub fn placeholder(&self) -> String {
        format!("${{{}.{}.{}}}", MODULES_PREFIX, self.module, self.platform)
    }

    /// Parse a `settings.image` value.
    ///
    /// Any `${...}` image with at least three `.`-separated parts is a
    /// reference, whatever its leading segment. The module name is the text
    /// between the first and second `.`; the platform is everything after
    /// that up to the closing brace, so `${MODULES.filter.amd64.debug}`
    /// yields platform `amd64.debug`.
    pub fn parse_image(image: &str) -> Option<Self> {
        let body = image.strip_prefix("${")?.strip_suffix('}')?;
        let (_, rest) = body.split_once('.')?;
        let (module, platform) = rest.split_once('.')?;
        if module.is_empty() || platform.is_empty() {
            return None;
        }
        Some(Self::new(module, platform))
    }
}

impl fmt::Display for DeploymentReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.module, self.platform)
    }
}

/// A parsed deployment manifest template.
///
/// The raw text is kept alongside the parsed value so that patching can
/// work on the text and leave unrelated content byte-for-byte intact.
#[derive(Debug, Clone)]
pub struct DeploymentTemplate {
    content: String,
    value: Value,
}

impl DeploymentTemplate {
    pub fn from_json(content: impl Into<String>) -> Result<Self, serde_json::Error> {
        let content = content.into();
        let value = serde_json::from_str(&content)?;
        Ok(Self { content, value })
    }

    /// Raw template text.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Every module placeholder referenced by the edge agent's module list,
    /// in module-key order.
    pub fn references(&self) -> Vec<DeploymentReference> {
        let Some(modules) = self.agent_modules() else {
            return Vec::new();
        };

        modules
            .values()
            .filter_map(|module| module.pointer("/settings/image"))
            .filter_map(Value::as_str)
            .filter_map(DeploymentReference::parse_image)
            .collect()
    }

    fn agent_modules(&self) -> Option<&serde_json::Map<String, Value>> {
        // Older templates use "moduleContent".
        let content = self
            .value
            .get("modulesContent")
            .or_else(|| self.value.get("moduleContent"))?;
        content
            .get("$edgeAgent")?
            .get("properties.desired")?
            .get("modules")?
            .as_object()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEMPLATE: &str = r#"{
      "modulesContent": {
        "$edgeAgent": {
          "properties.desired": {
            "modules": {
              "tempSensor": {
                "settings": { "image": "mcr.microsoft.com/azureiotedge-simulated-temperature-sensor:1.0" }
              },
              "filtermodule": {
                "settings": { "image": "${MODULES.filtermodule.amd64}" }
              },
              "debugmodule": {
                "settings": { "image": "${MODULES.debugmodule.amd64.debug}" }
              },
              "shortform": {
                "settings": { "image": "${MODULES.shortform}" }
              }
            }
          }
        }
      }
    }"#;

    #[test]
    fn placeholder_format() {
        let reference = DeploymentReference::new("filtermodule", "amd64");
        assert_eq!(reference.placeholder(), "${MODULES.filtermodule.amd64}");
    }

    #[test]
    fn parse_image_placeholder() {
        assert_eq!(
            DeploymentReference::parse_image("${MODULES.filtermodule.arm32v7}"),
            Some(DeploymentReference::new("filtermodule", "arm32v7"))
        );
        assert_eq!(
            DeploymentReference::parse_image("${MODULES.m.amd64.debug}"),
            Some(DeploymentReference::new("m", "amd64.debug"))
        );
    }

    #[test]
    fn parse_image_rejects_non_references() {
        assert_eq!(DeploymentReference::parse_image("${MODULES.only}"), None);
        assert_eq!(DeploymentReference::parse_image("registry/image:1.0"), None);
        assert_eq!(DeploymentReference::parse_image("${MODULES..amd64}"), None);
    }

    #[test]
    fn parse_image_accepts_any_leading_segment() {
        assert_eq!(
            DeploymentReference::parse_image("${OTHER.filtermodule.amd64}"),
            Some(DeploymentReference::new("filtermodule", "amd64"))
        );
    }

    #[test]
    fn references_from_template() {
        let template = DeploymentTemplate::from_json(TEMPLATE).unwrap();
        assert_eq!(
            template.references(),
            vec![
                DeploymentReference::new("debugmodule", "amd64.debug"),
                DeploymentReference::new("filtermodule", "amd64"),
            ]
        );
    }

    #[test]
    fn legacy_module_content_key() {
        let legacy = TEMPLATE.replace("modulesContent", "moduleContent");
        let template = DeploymentTemplate::from_json(legacy).unwrap();
        assert_eq!(template.references().len(), 2);
    }

    #[test]
    fn template_without_agent_has_no_references() {
        let template = DeploymentTemplate::from_json(r#"{"modulesContent": {}}"#).unwrap();
        assert!(template.references().is_empty());
    }

    #[test]
    fn keeps_raw_content() {
        let template = DeploymentTemplate::from_json(TEMPLATE).unwrap();
        assert_eq!(template.content(), TEMPLATE);
    }
}
