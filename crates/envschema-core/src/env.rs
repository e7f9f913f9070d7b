use std::collections::HashMap;
use tracing::debug;

/// Immutable view of environment variables at resolution time.
///
/// Resolution reads from a snapshot instead of the live process environment,
/// so the same snapshot always yields the same configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvSnapshot {
    vars: HashMap<String, String>,
}

impl EnvSnapshot {
    /// An empty snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Capture the current process environment.
    ///
    /// Variables whose name or value is not valid UTF-8 are skipped.
    pub fn from_process() -> Self {
        let mut vars = HashMap::new();
        for (key, value) in std::env::vars_os() {
            match (key.into_string(), value.into_string()) {
                (Ok(k), Ok(v)) => {
                    vars.insert(k, v);
                }
                (Ok(k), Err(_)) => debug!(var = %k, "skipping non-UTF-8 environment value"),
                (Err(k), _) => debug!(var = ?k, "skipping non-UTF-8 environment name"),
            }
        }
        Self { vars }
    }

    /// Builder-style insert, mostly for tests and embedding.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(name.into(), value.into());
        self
    }

    /// Add entries whose names are not present yet. Existing values win.
    ///
    /// Returns how many entries were added.
    pub fn merge_missing<I, K, V>(&mut self, entries: I) -> usize
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut added = 0;
        for (k, v) in entries {
            let k = k.into();
            if !self.vars.contains_key(&k) {
                self.vars.insert(k, v.into());
                added += 1;
            }
        }
        added
    }

    /// Value of a variable, if the name is present (the value may be empty).
    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    /// Whether the name is present at all, regardless of its value.
    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for EnvSnapshot
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
