use envschema_core::EnvSnapshot;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::Value;
use tracing::debug;

use crate::schema::{SchemaNode, display_path};

/// Value of one resolved leaf, tagged with where it came from.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedLeaf {
    /// The variable was present; its value verbatim (possibly empty).
    Env(String),
    /// The variable was absent and the schema supplied a default.
    Default(Value),
    /// The variable was absent and there was no default.
    Unset,
}

impl ResolvedLeaf {
    /// JSON view of the leaf; `Unset` becomes `null`.
    pub fn to_value(&self) -> Value {
        match self {
            Self::Env(s) => Value::String(s.clone()),
            Self::Default(v) => v.clone(),
            Self::Unset => Value::Null,
        }
    }

    pub fn is_unset(&self) -> bool {
        matches!(self, Self::Unset)
    }

    fn source(&self) -> &'static str {
        match self {
            Self::Env(_) => "env",
            Self::Default(_) => "default",
            Self::Unset => "unset",
        }
    }
}

/// Configuration tree with the same shape as the schema it came from.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolved {
    Leaf(ResolvedLeaf),
    Group(Vec<(String, Resolved)>),
}

impl Resolved {
    /// JSON view of the whole tree, keys in schema order.
    pub fn to_value(&self) -> Value {
        match self {
            Self::Leaf(leaf) => leaf.to_value(),
            Self::Group(children) => Value::Object(
                children
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_value()))
                    .collect(),
            ),
        }
    }

    /// Look up a node by dotted path (`"db.port"`). The empty path is the root.
    ///
    /// Keys may themselves contain dots. At each level a key equal to the
    /// whole remaining path wins, then splits are tried left to right. So
    /// with both `"a.b"` and `a = { b }` in one group, `"a.b"` names the
    /// literal key and the nested leaf is not addressable.
    pub fn get(&self, path: &str) -> Option<&Resolved> {
        if path.is_empty() {
            return Some(self);
        }
        let Self::Group(children) = self else {
            return None;
        };
        let child = |key: &str| children.iter().find(|(k, _)| k == key).map(|(_, v)| v);
        if let Some(node) = child(path) {
            return Some(node);
        }
        path.match_indices('.').find_map(|(i, _)| child(&path[..i])?.get(&path[i + 1..]))
    }

    /// Leaf at a dotted path, if the path ends on a leaf.
    pub fn leaf(&self, path: &str) -> Option<&ResolvedLeaf> {
        match self.get(path)? {
            Self::Leaf(leaf) => Some(leaf),
            Self::Group(_) => None,
        }
    }

    /// Every leaf with its dotted path, in schema order. A root leaf is
    /// named `(root)`.
    ///
    /// Keys are joined verbatim, so a key containing `.` can produce the same
    /// name as a nested path.
    pub fn leaves(&self) -> Vec<(String, &ResolvedLeaf)> {
        let mut out = Vec::new();
        self.collect_leaves(&mut Vec::new(), &mut out);
        out
    }

    fn collect_leaves<'a>(&'a self, path: &mut Vec<String>, out: &mut Vec<(String, &'a ResolvedLeaf)>) {
        match self {
            Self::Leaf(leaf) => out.push((display_path(path), leaf)),
            Self::Group(children) => {
                for (key, child) in children {
                    path.push(key.clone());
                    child.collect_leaves(path, out);
                    path.pop();
                }
            }
        }
    }

    /// Paths of leaves that had neither a value nor a default.
    pub fn unset_paths(&self) -> Vec<String> {
        self.leaves()
            .into_iter()
            .filter(|(_, leaf)| leaf.is_unset())
            .map(|(path, _)| path)
            .collect()
    }
}

impl Serialize for Resolved {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Self::Leaf(ResolvedLeaf::Env(s)) => serializer.serialize_str(s),
            Self::Leaf(ResolvedLeaf::Default(v)) => v.serialize(serializer),
            Self::Leaf(ResolvedLeaf::Unset) => serializer.serialize_unit(),
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

/// Resolve a schema against an environment snapshot.
///
/// A variable present in `env` resolves to its value verbatim, even when that
/// value is empty. Only an absent variable falls back to the default, or to
/// [`ResolvedLeaf::Unset`] when the node has none.
pub fn resolve(schema: &SchemaNode, env: &EnvSnapshot) -> Resolved {
    resolve_at(schema, env, &mut Vec::new())
}

fn resolve_at(node: &SchemaNode, env: &EnvSnapshot, path: &mut Vec<String>) -> Resolved {
    match node {
        SchemaNode::EnvRef(name) => Resolved::Leaf(resolve_leaf(name, None, env, path)),
        SchemaNode::EnvRefWithDefault { env: name, default } => {
            Resolved::Leaf(resolve_leaf(name, Some(default), env, path))
        }
        SchemaNode::Group(children) => Resolved::Group(
            children
                .iter()
                .map(|(key, child)| {
                    path.push(key.clone());
                    let value = resolve_at(child, env, path);
                    path.pop();
                    (key.clone(), value)
                })
                .collect(),
        ),
    }
}

fn resolve_leaf(
    name: &str,
    default: Option<&Value>,
    env: &EnvSnapshot,
    path: &[String],
) -> ResolvedLeaf {
    let leaf = match (env.get(name), default) {
        (Some(value), _) => ResolvedLeaf::Env(value.to_string()),
        (None, Some(default)) => ResolvedLeaf::Default(default.clone()),
        (None, None) => ResolvedLeaf::Unset,
    };
    // Values may be secrets; log the source only.
    debug!(path = %path.join("."), var = %name, source = leaf.source(), "resolved leaf");
    leaf
}
