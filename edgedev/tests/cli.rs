//! Integration tests for the edgedev CLI.
//!
//! These tests run the compiled binary against a project laid out in a
//! temporary directory. None of them reach a container engine: they either
//! stop at the plan (`--dry-run`) or only regenerate the manifest.

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use assert_fs::prelude::*;
use predicates::prelude::*;

const TEMPLATE: &str = r#"{
  "modulesContent": {
    "$edgeAgent": {
      "properties.desired": {
        "modules": {
          "filtermodule": {
            "settings": { "image": "${MODULES.filtermodule.amd64}" }
          },
          "remote": {
            "settings": { "image": "${MODULES.remote.amd64}" }
          }
        }
      }
    }
  }
}"#;

const FILTER_TAG: &str = "localhost:5000/filtermodule:0.0.1-amd64";

fn module_json(repository: &str) -> String {
    serde_json::json!({
        "$schema-version": "0.0.1",
        "image": {
            "repository": repository,
            "tag": {
                "version": "0.0.1",
                "platforms": {
                    "amd64": "./Dockerfile.amd64",
                    "arm32v7": "./Dockerfile.arm32v7"
                }
            },
            "buildOptions": [],
            "contextPath": "./"
        }
    })
    .to_string()
}

/// A project with one local module and a template that also references a
/// module that only exists remotely.
fn project() -> assert_fs::TempDir {
    let temp = assert_fs::TempDir::new().unwrap();
    temp.child("modules/filtermodule/module.json")
        .write_str(&module_json("localhost:5000/filtermodule"))
        .unwrap();
    temp.child("modules/filtermodule/Dockerfile.amd64")
        .write_str("FROM scratch\n")
        .unwrap();
    temp.child("deployment.template.json").write_str(TEMPLATE).unwrap();
    temp
}

/// edgedev running inside `temp` with a clean environment.
fn edgedev(temp: &assert_fs::TempDir) -> Command {
    let mut cmd = cargo_bin_cmd!("edgedev");
    cmd.env_clear();
    cmd.current_dir(temp.path());
    cmd
}

// ============================================================================
// Basic CLI tests
// ============================================================================

#[test]
fn cli_no_args_shows_help() {
    cargo_bin_cmd!("edgedev")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage:"));
}

#[test]
fn cli_help_lists_commands() {
    cargo_bin_cmd!("edgedev")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("build"))
        .stdout(predicate::str::contains("push"))
        .stdout(predicate::str::contains("genconfig"));
}

#[test]
fn cli_rejects_unknown_engine_flag() {
    cargo_bin_cmd!("edgedev")
        .args(["--engine", "containerd", "genconfig"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("containerd"));
}

// ============================================================================
// genconfig
// ============================================================================

#[test]
fn genconfig_writes_patched_manifest() {
    let temp = project();

    edgedev(&temp).arg("genconfig").assert().success();

    let output = std::fs::read_to_string(temp.path().join("config/deployment.json")).unwrap();
    assert!(output.contains(FILTER_TAG));
    assert!(!output.contains("${MODULES.filtermodule.amd64}"));
    // No local module named "remote"
    assert!(output.contains("${MODULES.remote.amd64}"));
}

#[test]
fn genconfig_applies_container_tag_and_output_dir() {
    let temp = project();

    edgedev(&temp)
        .env("CONTAINER_TAG", "Dev")
        .env("CONFIG_OUTPUT_DIR", "out")
        .arg("gen")
        .assert()
        .success();

    temp.child("out/deployment.json")
        .assert(predicate::str::contains("localhost:5000/filtermodule:0.0.1-dev-amd64"));
    temp.child("config").assert(predicate::path::missing());
}

#[test]
fn genconfig_expands_environment_variables() {
    let temp = project();
    temp.child("modules/filtermodule/module.json")
        .write_str(&module_json("${REGISTRY}/filtermodule"))
        .unwrap();

    edgedev(&temp)
        .env("REGISTRY", "myreg.azurecr.io")
        .arg("genconfig")
        .assert()
        .success();

    temp.child("config/deployment.json")
        .assert(predicate::str::contains("myreg.azurecr.io/filtermodule:0.0.1-amd64"));
}

#[test]
fn genconfig_second_run_reports_up_to_date() {
    let temp = project();

    edgedev(&temp).arg("genconfig").assert().success();
    edgedev(&temp)
        .arg("genconfig")
        .assert()
        .success()
        .stdout(predicate::str::contains("up to date"));
}

#[test]
fn file_flag_overrides_template() {
    let temp = project();
    temp.child("alt.template.json").write_str(TEMPLATE).unwrap();

    edgedev(&temp)
        .args(["genconfig", "--file", "alt.template.json"])
        .assert()
        .success();

    temp.child("config/alt.json")
        .assert(predicate::str::contains(FILTER_TAG));
    temp.child("config/deployment.json")
        .assert(predicate::path::missing());
}

// ============================================================================
// build / push
// ============================================================================

#[test]
fn dry_run_build_shows_plan_and_writes_nothing() {
    let temp = project();

    edgedev(&temp)
        .args(["--dry-run", "build"])
        .assert()
        .success()
        .stdout(predicate::str::contains(FILTER_TAG))
        .stdout(predicate::str::contains("[dry-run]"))
        .stdout(predicate::str::contains("${MODULES.remote.amd64}"));

    temp.child("config").assert(predicate::path::missing());
}

#[test]
fn dry_run_push_reports_anonymous_registry() {
    let temp = project();

    edgedev(&temp)
        .args(["push", "-n"])
        .assert()
        .success()
        .stdout(predicate::str::contains("anonymous"));
}

#[test]
fn dry_run_push_uses_matching_registry_credentials() {
    let temp = project();

    edgedev(&temp)
        .env("CONTAINER_REGISTRY_SERVER", "LOCALHOST:5000")
        .env("CONTAINER_REGISTRY_USERNAME", "builder")
        .env("CONTAINER_REGISTRY_PASSWORD", "hunter2")
        .args(["push", "--no-build", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("as builder"))
        .stdout(predicate::str::contains("hunter2").not());
}

#[test]
fn bypassed_module_is_not_built() {
    let temp = project();

    edgedev(&temp)
        .env("BYPASS_MODULES", "filtermodule")
        .args(["--dry-run", "build"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Build: 0 image(s)"));
}

#[test]
fn invalid_bypass_entry_fails() {
    let temp = project();

    edgedev(&temp)
        .env("BYPASS_MODULES", "filter module!")
        .arg("genconfig")
        .assert()
        .failure()
        .stderr(predicate::str::contains("BYPASS_MODULES"));
}

#[test]
fn unknown_engine_variable_fails() {
    let temp = project();

    edgedev(&temp)
        .env("CONTAINER_ENGINE", "rkt")
        .arg("genconfig")
        .assert()
        .failure()
        .stderr(predicate::str::contains("rkt"));
}

#[test]
fn missing_template_fails() {
    let temp = project();

    edgedev(&temp)
        .env("DEPLOYMENT_CONFIG_TEMPLATE_FILE", "nope.template.json")
        .arg("genconfig")
        .assert()
        .failure()
        .stderr(predicate::str::contains("nope.template.json"));
}

#[test]
fn missing_modules_directory_fails() {
    let temp = project();

    edgedev(&temp)
        .env("MODULES_PATH", "elsewhere")
        .args(["--dry-run", "build"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("elsewhere"));
}

#[test]
fn invalid_module_metadata_names_module() {
    let temp = project();
    temp.child("modules/broken/module.json")
        .write_str("{ not json")
        .unwrap();

    edgedev(&temp)
        .arg("genconfig")
        .assert()
        .failure()
        .stderr(predicate::str::contains("broken"));
}

// ============================================================================
// schema / completions
// ============================================================================

#[test]
fn schema_list_names_schemas() {
    cargo_bin_cmd!("edgedev")
        .args(["schema", "--list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("module.schema.json"));
}

#[test]
fn schema_writes_files() {
    let temp = assert_fs::TempDir::new().unwrap();

    cargo_bin_cmd!("edgedev")
        .args(["schema", "-o"])
        .arg(temp.path())
        .assert()
        .success();

    temp.child("module.schema.json")
        .assert(predicate::str::contains("repository"));
}

#[test]
fn completions_bash() {
    cargo_bin_cmd!("edgedev")
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("edgedev"));
}
