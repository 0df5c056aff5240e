//! Property-based tests for tag computation, build selection and manifest
//! patching.
//!
//! These tests use proptest to generate random module sets and verify the
//! invariants that must hold for any project.

use edgedev::config::NameList;
use edgedev::modules::{
    ImageTag, ModuleDescriptor, PlatformTag, ReplacementMap, TagTable, apply_replacements, select,
};
use edgedev_common::{DeploymentReference, ModuleMetadata};
use proptest::prelude::*;
use std::collections::BTreeSet;
use std::path::Path;

const PLATFORMS: &[&str] = &["amd64", "arm32v7", "arm64v8", "windows-amd64"];

fn name_strategy() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_-]{0,11}"
}

fn version_strategy() -> impl Strategy<Value = String> {
    "[0-9]{1,2}\\.[0-9]{1,2}\\.[0-9]{1,2}"
}

fn suffix_strategy() -> impl Strategy<Value = String> {
    prop_oneof![Just(String::new()), "[A-Za-z0-9]{1,6}"]
}

fn platforms_strategy() -> impl Strategy<Value = Vec<&'static str>> {
    prop::sample::subsequence(PLATFORMS, 1..=PLATFORMS.len())
}

/// Distinct module names, each with its own platform list.
fn modules_strategy() -> impl Strategy<Value = Vec<(String, Vec<&'static str>)>> {
    prop::collection::btree_set(name_strategy(), 1..6).prop_flat_map(|names| {
        let names: Vec<String> = names.into_iter().collect();
        let count = names.len();
        (
            Just(names),
            prop::collection::vec(platforms_strategy(), count),
        )
            .prop_map(|(names, platforms)| names.into_iter().zip(platforms).collect())
    })
}

fn descriptor(name: &str, platforms: &[&str]) -> ModuleDescriptor {
    let platforms: serde_json::Map<String, serde_json::Value> = platforms
        .iter()
        .map(|p| (p.to_string(), format!("./Dockerfile.{p}").into()))
        .collect();
    let json = serde_json::json!({
        "image": {
            "repository": format!("localhost:5000/{name}"),
            "tag": { "version": "0.0.1", "platforms": platforms },
            "contextPath": "./"
        }
    })
    .to_string();
    let metadata = ModuleMetadata::from_json(name, &json).unwrap();
    ModuleDescriptor::from_metadata(name.to_string(), &Path::new("modules").join(name), metadata)
}

fn descriptors(modules: &[(String, Vec<&'static str>)]) -> Vec<ModuleDescriptor> {
    modules.iter().map(|(name, p)| descriptor(name, p)).collect()
}

proptest! {
    #[test]
    fn tag_is_deterministic(
        repo in "[a-zA-Z0-9./:]{1,20}",
        version in version_strategy(),
        suffix in suffix_strategy(),
        platform in prop::sample::select(PLATFORMS),
    ) {
        let first = ImageTag::compute(&repo, &version, &suffix, platform);
        let second = ImageTag::compute(&repo, &version, &suffix, platform);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn tag_is_lowercase(
        repo in "[a-zA-Z0-9./:]{1,20}",
        version in version_strategy(),
        suffix in suffix_strategy(),
        platform in "[A-Za-z0-9]{1,8}",
    ) {
        let tag = ImageTag::compute(&repo, &version, &suffix, &platform);
        prop_assert_eq!(tag.as_str(), tag.as_str().to_lowercase());
    }

    #[test]
    fn empty_suffix_adds_no_segment(
        repo in "[a-z0-9./:]{1,20}",
        version in version_strategy(),
        platform in prop::sample::select(PLATFORMS),
    ) {
        let tag = ImageTag::compute(&repo, &version, "", platform);
        prop_assert_eq!(tag.as_str(), format!("{repo}:{version}-{platform}"));
    }

    #[test]
    fn table_has_one_tag_per_declared_platform(
        modules in modules_strategy(),
        suffix in suffix_strategy(),
    ) {
        let table = TagTable::compute(&descriptors(&modules), &suffix);
        let declared: usize = modules.iter().map(|(_, p)| p.len()).sum();
        prop_assert_eq!(table.len(), declared);
        for (name, platforms) in &modules {
            for platform in platforms {
                prop_assert!(table.get(&PlatformTag::new(name.as_str(), *platform)).is_some());
            }
        }
    }

    #[test]
    fn bypassed_modules_never_selected(
        modules in modules_strategy(),
        bypass_mask in prop::collection::vec(any::<bool>(), 6),
    ) {
        let table = TagTable::compute(&descriptors(&modules), "");
        let bypassed: Vec<&str> = modules
            .iter()
            .zip(&bypass_mask)
            .filter(|(_, skip)| **skip)
            .map(|((name, _), _)| name.as_str())
            .collect();
        let bypass = NameList::from_names(bypassed.iter().copied());

        // Every module references its first platform from the manifest
        let referenced: Vec<(DeploymentReference, ImageTag)> = modules
            .iter()
            .filter_map(|(name, platforms)| {
                let key = PlatformTag::new(name.as_str(), platforms[0]);
                table
                    .get(&key)
                    .map(|tag| (DeploymentReference::new(name.as_str(), platforms[0]), tag.clone()))
            })
            .collect();

        let set = select(&table, &referenced, &bypass, &NameList::match_all());
        for (_, profile) in set.iter() {
            prop_assert!(!bypassed.contains(&profile.module.as_str()));
        }
    }

    #[test]
    fn inactive_platforms_excluded_for_local_tags(
        modules in modules_strategy(),
        active in platforms_strategy(),
    ) {
        let table = TagTable::compute(&descriptors(&modules), "");
        let active_list = NameList::from_names(active.iter().copied());
        let set = select(&table, &[], &NameList::default(), &active_list);

        for (key, tag) in table.iter() {
            prop_assert_eq!(set.contains(tag), active.contains(&key.platform.as_str()));
        }
    }

    #[test]
    fn match_all_equals_every_platform(modules in modules_strategy()) {
        let table = TagTable::compute(&descriptors(&modules), "");
        let none = NameList::default();

        let wildcard: BTreeSet<_> = select(&table, &[], &none, &NameList::match_all())
            .tags()
            .cloned()
            .collect();
        let every = NameList::from_names(PLATFORMS.iter().copied());
        let explicit: BTreeSet<_> = select(&table, &[], &none, &every)
            .tags()
            .cloned()
            .collect();
        prop_assert_eq!(wildcard, explicit);
    }

    #[test]
    fn patching_with_no_replacements_is_identity(content in "\\PC{0,200}") {
        prop_assert_eq!(apply_replacements(&content, &ReplacementMap::new()), content);
    }

    #[test]
    fn patching_is_idempotent(
        modules in modules_strategy(),
        suffix in suffix_strategy(),
        filler in "[a-zA-Z0-9 ,:{}\"]{0,40}",
    ) {
        let table = TagTable::compute(&descriptors(&modules), &suffix);
        let mut replacements = ReplacementMap::new();
        let mut content = filler.clone();
        for (key, tag) in table.iter() {
            let reference = DeploymentReference::new(key.module.as_str(), key.platform.as_str());
            content.push_str(&format!("\"{}\"{filler}", reference.placeholder()));
            replacements.insert(&reference, tag.clone());
        }

        let once = apply_replacements(&content, &replacements);
        let twice = apply_replacements(&once, &replacements);
        prop_assert!(!once.contains("${MODULES"), "placeholder left after patching");
        prop_assert_eq!(once, twice);
    }
}
