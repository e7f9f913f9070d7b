use envschema_core::{EnvschemaError, Result};
use serde::de::Error as _;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use tracing::debug;

/// Key that marks a mapping as a described leaf rather than a group.
pub const ENV_KEY: &str = "env";
/// Optional default next to [`ENV_KEY`].
pub const DEFAULT_KEY: &str = "default";

/// One node of a configuration schema.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaNode {
    /// Read the named variable; `null` when it is absent.
    EnvRef(String),
    /// Read the named variable; the default when it is absent.
    EnvRefWithDefault { env: String, default: Value },
    /// Nested keys, in declaration order.
    Group(Vec<(String, SchemaNode)>),
}

/// A leaf flattened out of a schema, addressed by its dotted path.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaEntry {
    pub path: String,
    pub env: String,
    pub default: Option<Value>,
}

impl SchemaNode {
    pub fn env(name: impl Into<String>) -> Self {
        Self::EnvRef(name.into())
    }

    pub fn env_or(name: impl Into<String>, default: impl Into<Value>) -> Self {
        Self::EnvRefWithDefault {
            env: name.into(),
            default: default.into(),
        }
    }

    /// Build a group. A repeated key replaces the earlier node in place.
    pub fn group<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, SchemaNode)>,
        K: Into<String>,
    {
        let mut out: Vec<(String, SchemaNode)> = Vec::new();
        for (key, node) in entries {
            let key = key.into();
            match out.iter_mut().find(|(k, _)| *k == key) {
                Some(slot) => slot.1 = node,
                None => out.push((key, node)),
            }
        }
        Self::Group(out)
    }

    /// Parse a schema from a JSON value.
    ///
    /// A mapping with an `env` key is a described leaf, a string is a simple
    /// leaf, and any other mapping is a group. This means a group cannot use
    /// `env` as one of its own keys.
    pub fn from_value(value: &Value) -> Result<Self> {
        Self::parse_at(value, &mut Vec::new())
    }

    fn parse_at(value: &Value, path: &mut Vec<String>) -> Result<Self> {
        match value {
            Value::String(name) => Ok(Self::EnvRef(name.clone())),
            Value::Object(map) if map.contains_key(ENV_KEY) => {
                let env = match &map[ENV_KEY] {
                    Value::String(s) => s.clone(),
                    other => {
                        return Err(EnvschemaError::schema(
                            display_path(path),
                            format!("`{ENV_KEY}` must be a string, found {}", kind(other)),
                        ));
                    }
                };
                for extra in map.keys().filter(|k| *k != ENV_KEY && *k != DEFAULT_KEY) {
                    debug!(path = %display_path(path), key = %extra, "ignoring unknown key in leaf");
                }
                Ok(match map.get(DEFAULT_KEY) {
                    Some(default) => Self::EnvRefWithDefault {
                        env,
                        default: default.clone(),
                    },
                    None => Self::EnvRef(env),
                })
            }
            Value::Object(map) => {
                let mut entries = Vec::with_capacity(map.len());
                for (key, child) in map {
                    path.push(key.clone());
                    let node = Self::parse_at(child, path);
                    path.pop();
                    entries.push((key.clone(), node?));
                }
                Ok(Self::Group(entries))
            }
            other => Err(EnvschemaError::schema(
                display_path(path),
                format!(
                    "expected a variable name, a `{{ {ENV_KEY} = ... }}` record or a table, found {}",
                    kind(other)
                ),
            )),
        }
    }

    /// Every leaf in declaration order, with dotted paths.
    pub fn entries(&self) -> Vec<SchemaEntry> {
        let mut out = Vec::new();
        self.collect_entries(&mut Vec::new(), &mut out);
        out
    }

    fn collect_entries(&self, path: &mut Vec<String>, out: &mut Vec<SchemaEntry>) {
        match self {
            Self::EnvRef(env) => out.push(SchemaEntry {
                path: path.join("."),
                env: env.clone(),
                default: None,
            }),
            Self::EnvRefWithDefault { env, default } => out.push(SchemaEntry {
                path: path.join("."),
                env: env.clone(),
                default: Some(default.clone()),
            }),
            Self::Group(children) => {
                for (key, child) in children {
                    path.push(key.clone());
                    child.collect_entries(path, out);
                    path.pop();
                }
            }
        }
    }
}

pub(crate) fn display_path(path: &[String]) -> String {
    if path.is_empty() {
        "(root)".to_string()
    } else {
        path.join(".")
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "a table",
    }
}

impl<'de> Deserialize<'de> for SchemaNode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        SchemaNode::from_value(&value).map_err(D::Error::custom)
    }
}

impl Serialize for SchemaNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Self::EnvRef(env) => serializer.serialize_str(env),
            Self::EnvRefWithDefault { env, default } => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry(ENV_KEY, env)?;
                map.serialize_entry(DEFAULT_KEY, default)?;
                map.end()
            }
            Self::Group(children) => {
                let mut map = serializer.serialize_map(Some(children.len()))?;
                for (key, child) in children {
                    map.serialize_entry(key, child)?;
                }
                map.end()
            }
        }
    }
}
