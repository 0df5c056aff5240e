//! Translation of `module.json` build options into engine arguments.
//!
//! The list shape already holds engine CLI arguments and is only split and
//! checked. The map shape uses option names (`buildargs`, `nocache`, ...)
//! which are looked up in [`KNOWN_OPTIONS`]; names that are not in the table
//! become `--name=value`.

use crate::error::BuildOptionError;
use edgedev_common::BuildOptionsSpec;
use serde_json::Value;

/// How a recognised option's value becomes arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OptionKind {
    /// Boolean; `true` emits the bare flag.
    Switch,
    /// Boolean that the engine enables by default; `false` emits `--flag=false`.
    DefaultOn,
    /// One scalar, or a list of scalars emitting the flag once each.
    Value,
    /// A `{key: value}` map joined with the separator, or preformatted strings.
    Pairs(char),
}

struct KnownOption {
    names: &'static [&'static str],
    flag: &'static str,
    kind: OptionKind,
}

const KNOWN_OPTIONS: &[KnownOption] = &[
    KnownOption {
        names: &["platform", "--platform"],
        flag: "--platform",
        kind: OptionKind::Value,
    },
    KnownOption {
        names: &["buildargs", "build_args", "--build-arg"],
        flag: "--build-arg",
        kind: OptionKind::Pairs('='),
    },
    KnownOption {
        names: &["nocache", "no_cache", "--no-cache"],
        flag: "--no-cache",
        kind: OptionKind::Switch,
    },
    KnownOption {
        names: &["pull", "--pull"],
        flag: "--pull",
        kind: OptionKind::Switch,
    },
    KnownOption {
        names: &["target", "--target"],
        flag: "--target",
        kind: OptionKind::Value,
    },
    KnownOption {
        names: &["labels", "--label"],
        flag: "--label",
        kind: OptionKind::Pairs('='),
    },
    KnownOption {
        names: &["extra_hosts", "--add-host"],
        flag: "--add-host",
        kind: OptionKind::Pairs(':'),
    },
    KnownOption {
        names: &["network_mode", "--network"],
        flag: "--network",
        kind: OptionKind::Value,
    },
    KnownOption {
        names: &["cache_from", "--cache-from"],
        flag: "--cache-from",
        kind: OptionKind::Value,
    },
    KnownOption {
        names: &["shmsize", "--shm-size"],
        flag: "--shm-size",
        kind: OptionKind::Value,
    },
    KnownOption {
        names: &["quiet", "-q", "--quiet"],
        flag: "--quiet",
        kind: OptionKind::Switch,
    },
    KnownOption {
        names: &["rm", "--rm"],
        flag: "--rm",
        kind: OptionKind::DefaultOn,
    },
    KnownOption {
        names: &["forcerm", "--force-rm"],
        flag: "--force-rm",
        kind: OptionKind::Switch,
    },
    KnownOption {
        names: &["memory", "-m", "--memory"],
        flag: "--memory",
        kind: OptionKind::Value,
    },
    KnownOption {
        names: &["memswap", "--memory-swap"],
        flag: "--memory-swap",
        kind: OptionKind::Value,
    },
    KnownOption {
        names: &["cpushares", "--cpu-shares"],
        flag: "--cpu-shares",
        kind: OptionKind::Value,
    },
    KnownOption {
        names: &["cpusetcpus", "--cpuset-cpus"],
        flag: "--cpuset-cpus",
        kind: OptionKind::Value,
    },
];

/// Options owned by the module metadata itself.
const RESERVED: &[&str] = &["tag", "--tag", "-t", "file", "--file", "-f", "dockerfile"];

/// Engine arguments for `spec`, in declaration order for lists and
/// option-name order for maps.
pub fn translate(spec: &BuildOptionsSpec) -> Result<Vec<String>, BuildOptionError> {
    match spec {
        BuildOptionsSpec::List(items) => translate_list(items),
        BuildOptionsSpec::Map(options) => {
            let mut args = Vec::new();
            for (name, value) in options {
                translate_entry(name, value, &mut args)?;
            }
            Ok(args)
        }
    }
}

fn translate_list(items: &[String]) -> Result<Vec<String>, BuildOptionError> {
    let mut args = Vec::new();
    for item in items {
        let tokens =
            shlex::split(item).ok_or_else(|| BuildOptionError::Unparsable(item.clone()))?;
        for token in tokens {
            check_reserved(&token)?;
            args.push(token);
        }
    }
    Ok(args)
}

fn check_reserved(token: &str) -> Result<(), BuildOptionError> {
    let name = token.split_once('=').map_or(token, |(name, _)| name);
    if name.starts_with('-') && RESERVED.contains(&name) {
        return Err(BuildOptionError::Reserved(name.to_string()));
    }
    Ok(())
}

fn translate_entry(
    name: &str,
    value: &Value,
    args: &mut Vec<String>,
) -> Result<(), BuildOptionError> {
    if RESERVED.contains(&name) {
        return Err(BuildOptionError::Reserved(name.to_string()));
    }

    let Some(known) = KNOWN_OPTIONS.iter().find(|o| o.names.contains(&name)) else {
        let flag = if name.starts_with('-') {
            name.to_string()
        } else {
            format!("--{name}")
        };
        return passthrough(&flag, value, args);
    };

    let invalid = |reason: &str| BuildOptionError::InvalidValue {
        option: name.to_string(),
        reason: reason.to_string(),
    };

    match (known.kind, value) {
        (OptionKind::Switch, Value::Bool(true)) => args.push(known.flag.to_string()),
        (OptionKind::Switch, Value::Bool(false) | Value::Null) => {}
        (OptionKind::DefaultOn, Value::Bool(true)) => args.push(known.flag.to_string()),
        (OptionKind::DefaultOn, Value::Bool(false)) => args.push(format!("{}=false", known.flag)),
        (OptionKind::Switch | OptionKind::DefaultOn, _) => {
            return Err(invalid("expected true or false"));
        }
        (OptionKind::Value, Value::Array(items)) => {
            for item in items {
                let item = scalar(item)
                    .ok_or_else(|| invalid("expected a list of strings or numbers"))?;
                args.push(format!("{}={item}", known.flag));
            }
        }
        (OptionKind::Value, Value::Null) => {}
        (OptionKind::Value, other) => {
            let value = scalar(other).ok_or_else(|| invalid("expected a string or number"))?;
            args.push(format!("{}={value}", known.flag));
        }
        (OptionKind::Pairs(separator), Value::Object(pairs)) => {
            for (key, value) in pairs {
                let value = scalar(value)
                    .ok_or_else(|| invalid("map values must be strings or numbers"))?;
                args.push(format!("{}={key}{separator}{value}", known.flag));
            }
        }
        (OptionKind::Pairs(_), Value::String(pair)) => args.push(format!("{}={pair}", known.flag)),
        (OptionKind::Pairs(_), Value::Array(items)) => {
            for item in items {
                let pair = item.as_str().ok_or_else(|| invalid("expected a list of strings"))?;
                args.push(format!("{}={pair}", known.flag));
            }
        }
        (OptionKind::Pairs(_), Value::Null) => {}
        (OptionKind::Pairs(_), _) => return Err(invalid("expected a map or a list of strings")),
    }
    Ok(())
}

fn passthrough(flag: &str, value: &Value, args: &mut Vec<String>) -> Result<(), BuildOptionError> {
    match value {
        Value::Bool(true) => args.push(flag.to_string()),
        Value::Bool(false) | Value::Null => {}
        Value::Array(items) => {
            for item in items {
                passthrough(flag, item, args)?;
            }
        }
        Value::Object(pairs) => {
            for (key, value) in pairs {
                let value = scalar(value).ok_or_else(|| BuildOptionError::InvalidValue {
                    option: flag.to_string(),
                    reason: "map values must be strings or numbers".to_string(),
                })?;
                args.push(format!("{flag}={key}={value}"));
            }
        }
        other => {
            if let Some(value) = scalar(other) {
                args.push(format!("{flag}={value}"));
            }
        }
    }
    Ok(())
}

fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
