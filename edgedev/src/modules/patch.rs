//! Writing resolved image tags back into the deployment manifest.

use super::tag::ImageTag;
use crate::effects::Executor;
use anyhow::Result;
use edgedev_common::vars::expand_vars;
use edgedev_common::{DeploymentReference, DeploymentTemplate};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

/// Placeholder text (`${MODULES.<module>.<platform>}`) to resolved tag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplacementMap(BTreeMap<String, ImageTag>);

impl ReplacementMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, reference: &DeploymentReference, tag: ImageTag) {
        self.0.insert(reference.placeholder(), tag);
    }

    pub fn get(&self, placeholder: &str) -> Option<&ImageTag> {
        self.0.get(placeholder)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ImageTag)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Replace every occurrence of each placeholder with its tag.
///
/// Text that is not a known placeholder is left untouched. Computed tags are
/// lower-case and placeholders start with `${MODULES`, so a replaced tag can
/// never form a placeholder again and a second pass changes nothing.
pub fn apply_replacements(content: &str, replacements: &ReplacementMap) -> String {
    replacements
        .iter()
        .fold(content.to_string(), |text, (placeholder, tag)| {
            text.replace(placeholder, tag.as_str())
        })
}

/// Final manifest text: replacements first, then `${VAR}` expansion.
pub fn render(
    template: &DeploymentTemplate,
    replacements: &ReplacementMap,
    vars: &BTreeMap<String, String>,
) -> String {
    expand_vars(&apply_replacements(template.content(), replacements), vars)
}

/// What [`write_manifest`] did with the output file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Written,
    Unchanged,
}

/// Returns true when `path` already holds exactly `content`.
pub fn is_up_to_date(path: &Path, content: &str) -> bool {
    std::fs::read_to_string(path).is_ok_and(|existing| existing == content)
}

/// Write `content` to `path` unless it is already there.
pub fn write_manifest(executor: &mut Executor, path: &Path, content: &str) -> Result<WriteOutcome> {
    if is_up_to_date(path, content) {
        debug!(path = %path.display(), "Deployment manifest unchanged");
        return Ok(WriteOutcome::Unchanged);
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        executor.create_dir_all(parent, "deployment output directory")?;
    }
    executor.write_file(path, content, "deployment manifest")?;
    Ok(WriteOutcome::Written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const TEMPLATE: &str = r#"{
  "modulesContent": {
    "$edgeAgent": {
      "properties.desired": {
        "registryCredentials": { "address": "${CONTAINER_REGISTRY_SERVER}" },
        "modules": {
          "filtermodule": { "settings": { "image": "${MODULES.filtermodule.amd64}" } },
          "other": { "settings": { "image": "${MODULES.other.arm32v7}" } }
        }
      }
    }
  }
}"#;

    fn replacements() -> ReplacementMap {
        let mut map = ReplacementMap::new();
        map.insert(
            &DeploymentReference::new("filtermodule", "amd64"),
            ImageTag::compute("localhost:5000/filtermodule", "0.0.1", "", "amd64"),
        );
        map
    }

    #[test]
    fn replaces_known_placeholders_only() {
        let patched = apply_replacements(TEMPLATE, &replacements());
        assert!(patched.contains(r#""image": "localhost:5000/filtermodule:0.0.1-amd64""#));
        assert!(patched.contains("${MODULES.other.arm32v7}"));
        assert!(patched.contains("${CONTAINER_REGISTRY_SERVER}"));
    }

    #[test]
    fn empty_map_is_identity() {
        assert_eq!(apply_replacements(TEMPLATE, &ReplacementMap::new()), TEMPLATE);
    }

    #[test]
    fn patching_twice_changes_nothing() {
        let once = apply_replacements(TEMPLATE, &replacements());
        assert_eq!(apply_replacements(&once, &replacements()), once);
    }

    #[test]
    fn render_expands_variables_after_replacing() {
        let template = DeploymentTemplate::from_json(TEMPLATE).unwrap();
        let vars = BTreeMap::from([(
            "CONTAINER_REGISTRY_SERVER".to_string(),
            "localhost:5000".to_string(),
        )]);
        let rendered = render(&template, &replacements(), &vars);
        assert!(rendered.contains(r#""address": "localhost:5000""#));
        assert!(rendered.contains("${MODULES.other.arm32v7}"));
    }

    #[test]
    fn write_skips_identical_content() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config").join("deployment.json");
        let mut executor = Executor::new(false);

        assert_eq!(
            write_manifest(&mut executor, &path, "{}").unwrap(),
            WriteOutcome::Written
        );
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{}");
        assert_eq!(
            write_manifest(&mut executor, &path, "{}").unwrap(),
            WriteOutcome::Unchanged
        );
    }

    #[test]
    fn dry_run_write_touches_nothing() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config").join("deployment.json");
        let mut executor = Executor::new(true);

        write_manifest(&mut executor, &path, "{}").unwrap();
        assert!(!path.exists());
        assert_eq!(executor.effects().len(), 2);
    }
}
