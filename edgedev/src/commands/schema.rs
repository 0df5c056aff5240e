//! Schema generation command implementation.

use anyhow::{Context, Result};
use clap::Args;
use edgedev_common::{BuildOptionsSpec, ModuleMetadata};
use schemars::{Schema, schema_for};
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct SchemaArgs {
    /// Output directory (if not specified, prints to stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// List available schema types instead of generating them
    #[arg(long, conflicts_with = "output")]
    pub list: bool,
}

struct SchemaInfo {
    name: &'static str,
    filename: &'static str,
    description: &'static str,
    generate: fn() -> Schema,
}

const SCHEMAS: &[SchemaInfo] = &[
    SchemaInfo {
        name: "ModuleMetadata",
        filename: "module.schema.json",
        description: "The per-module module.json file",
        generate: || schema_for!(ModuleMetadata),
    },
    SchemaInfo {
        name: "BuildOptionsSpec",
        filename: "build-options.schema.json",
        description: "image.buildOptions: engine arguments (list) or named options (map)",
        generate: || schema_for!(BuildOptionsSpec),
    },
];

/// Generate all schemas as (filename, json) pairs.
fn generate_all_schemas() -> Result<Vec<(&'static str, String)>> {
    SCHEMAS
        .iter()
        .map(|info| {
            let json = serde_json::to_string_pretty(&(info.generate)())
                .with_context(|| format!("Failed to serialize schema {}", info.name))?;
            Ok((info.filename, json))
        })
        .collect()
}

pub fn run(args: SchemaArgs) -> Result<()> {
    if args.list {
        println!("Available schema types:\n");
        for info in SCHEMAS {
            println!("  {} ({})", info.name, info.filename);
            println!("    {}\n", info.description);
        }
        return Ok(());
    }

    let schemas = generate_all_schemas()?;
    match args.output {
        Some(dir) => {
            fs::create_dir_all(&dir)
                .with_context(|| format!("Failed to create directory {}", dir.display()))?;

            for (filename, json) in schemas {
                let path = dir.join(filename);
                fs::write(&path, &json)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                println!("Wrote {}", path.display());
            }
        }
        None => {
            // Print all schemas to stdout as a combined object
            let mut combined = serde_json::Map::new();
            for (filename, json) in schemas {
                let value: serde_json::Value = serde_json::from_str(&json)?;
                let name = filename.strip_suffix(".schema.json").unwrap_or(filename);
                combined.insert(name.to_string(), value);
            }
            println!("{}", serde_json::to_string_pretty(&combined)?);
        }
    }

    Ok(())
}
