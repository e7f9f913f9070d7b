use envschema_core::{EnvSnapshot, EnvschemaError, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::resolver::{Resolved, resolve};
use crate::schema::SchemaNode;

/// File name looked up in the working directory when no schema path is given.
pub const LOCAL_SCHEMA_FILE: &str = "envschema.toml";

/// On-disk schema syntax, picked from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaFormat {
    Toml,
    Json,
}

impl SchemaFormat {
    /// `.json` is JSON; anything else is read as TOML.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Toml,
        }
    }
}

/// Loads a schema file from disk.
#[derive(Debug, Clone)]
pub struct SchemaLoader {
    schema: SchemaNode,
    schema_path: PathBuf,
}

impl SchemaLoader {
    /// Resolve the schema path: explicit path > ENVSCHEMA_SCHEMA env >
    /// ./envschema.toml > <config dir>/envschema/schema.toml
    pub fn resolve_path(explicit: Option<&Path>) -> PathBuf {
        Self::resolve_path_from(
            explicit,
            std::env::var("ENVSCHEMA_SCHEMA").ok(),
            Path::new(LOCAL_SCHEMA_FILE),
            dirs::config_dir(),
        )
    }

    /// Same precedence as [`resolve_path`](Self::resolve_path), with every
    /// input supplied by the caller.
    pub fn resolve_path_from(
        explicit: Option<&Path>,
        env_var: Option<String>,
        local: &Path,
        config_dir: Option<PathBuf>,
    ) -> PathBuf {
        if let Some(p) = explicit {
            return p.to_path_buf();
        }
        if let Some(p) = env_var {
            return PathBuf::from(p);
        }
        if local.exists() {
            return local.to_path_buf();
        }
        config_dir
            .unwrap_or_else(|| PathBuf::from("."))
            .join("envschema")
            .join("schema.toml")
    }

    /// Read and parse the schema. Unlike the environment, a schema has no
    /// sensible fallback, so a missing file is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let schema_path = Self::resolve_path(path);
        if !schema_path.exists() {
            return Err(EnvschemaError::Config(format!(
                "schema file not found: {}",
                schema_path.display()
            )));
        }
        info!(?schema_path, "loading schema");
        let raw = std::fs::read_to_string(&schema_path)?;
        let schema = Self::parse_str(&raw, SchemaFormat::from_path(&schema_path)).map_err(|e| {
            match e {
                EnvschemaError::Config(reason) => EnvschemaError::Config(format!(
                    "failed to parse {}: {}",
                    schema_path.display(),
                    reason
                )),
                other => other,
            }
        })?;
        debug!(leaves = schema.entries().len(), "schema parsed");
        Ok(Self {
            schema,
            schema_path,
        })
    }

    /// Parse schema text in the given format.
    pub fn parse_str(raw: &str, format: SchemaFormat) -> Result<SchemaNode> {
        let value: serde_json::Value = match format {
            SchemaFormat::Toml => {
                toml::from_str(raw).map_err(|e| EnvschemaError::Config(e.to_string()))?
            }
            SchemaFormat::Json => {
                serde_json::from_str(raw).map_err(|e| EnvschemaError::Config(e.to_string()))?
            }
        };
        SchemaNode::from_value(&value)
    }

    pub fn schema(&self) -> &SchemaNode {
        &self.schema
    }

    /// Path the schema was read from.
    pub fn path(&self) -> &Path {
        &self.schema_path
    }
}

/// Builds the environment snapshot: the process environment plus an
/// optional `.env` file.
///
/// File entries only fill gaps; a variable already set in the process keeps
/// its value. The process environment itself is never modified.
#[derive(Debug, Clone)]
pub struct EnvLoader {
    env_file: Option<PathBuf>,
    dotenv: bool,
}

impl Default for EnvLoader {
    fn default() -> Self {
        Self {
            env_file: None,
            dotenv: true,
        }
    }
}

impl EnvLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read this file instead of searching for `.env`. It must exist.
    pub fn with_env_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.env_file = Some(path.into());
        self
    }

    /// Skip env files entirely and use the process environment as-is.
    pub fn without_dotenv(mut self) -> Self {
        self.dotenv = false;
        self
    }

    /// Snapshot the process environment and layer the env file under it.
    pub fn load(&self) -> Result<EnvSnapshot> {
        let mut env = EnvSnapshot::from_process();
        self.apply(&mut env)?;
        Ok(env)
    }

    /// Layer the env file under an existing snapshot. Returns how many
    /// variables the file added.
    pub fn apply(&self, env: &mut EnvSnapshot) -> Result<usize> {
        if !self.dotenv {
            return Ok(0);
        }
        let (label, iter) = match &self.env_file {
            Some(path) => {
                let label = path.display().to_string();
                let iter = dotenvy::from_path_iter(path).map_err(|e| env_file_error(&label, e))?;
                (label, iter)
            }
            None => match dotenvy::dotenv_iter() {
                Ok(iter) => (".env".to_string(), iter),
                Err(e) if e.not_found() => {
                    debug!("no .env file found, using process environment only");
                    return Ok(0);
                }
                Err(e) => return Err(env_file_error(".env", e)),
            },
        };

        let entries = iter
            .collect::<std::result::Result<Vec<(String, String)>, _>>()
            .map_err(|e| env_file_error(&label, e))?;
        let total = entries.len();
        let added = env.merge_missing(entries);
        info!(file = %label, added, shadowed = total - added, "loaded env file");
        Ok(added)
    }
}

fn env_file_error(path: &str, e: dotenvy::Error) -> EnvschemaError {
    EnvschemaError::EnvFile {
        path: path.to_string(),
        reason: e.to_string(),
    }
}

/// Load `.env` (if any) over the process environment, then resolve `schema`.
pub fn load_configuration(schema: &SchemaNode) -> Result<Resolved> {
    let env = EnvLoader::default().load()?;
    Ok(resolve(schema, &env))
}
