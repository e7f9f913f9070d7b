use console::style;
use serde_json::json;
use tracing::{info, warn};

use envschema_config::{SchemaLoader, resolve};
use envschema_core::{EnvSnapshot, EnvschemaError};

pub(super) fn cmd_resolve(
    schema: &SchemaLoader,
    env: &EnvSnapshot,
    compact: bool,
) -> envschema_core::Result<()> {
    let resolved = resolve(schema.schema(), env);
    let unset = resolved.unset_paths();
    if !unset.is_empty() {
        warn!(count = unset.len(), "some variables are unset and have no default");
    }
    let out = if compact {
        serde_json::to_string(&resolved)?
    } else {
        serde_json::to_string_pretty(&resolved)?
    };
    println!("{out}");
    Ok(())
}

pub(super) fn cmd_vars(
    schema: &SchemaLoader,
    env: &EnvSnapshot,
    json: bool,
) -> envschema_core::Result<()> {
    let entries = schema.schema().entries();

    if json {
        let rows: Vec<serde_json::Value> = entries
            .iter()
            .map(|e| {
                json!({
                    "path": e.path,
                    "env": e.env,
                    "default": e.default,
                    "set": env.contains(&e.env),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    if entries.is_empty() {
        println!("Schema {} reads no variables.", schema.path().display());
        return Ok(());
    }

    let path_width = entries.iter().map(|e| e.path.len()).max().unwrap_or(0);
    let env_width = entries.iter().map(|e| e.env.len()).max().unwrap_or(0);
    for e in &entries {
        let status = if env.contains(&e.env) {
            style("set").green()
        } else if e.default.is_some() {
            style("default").yellow()
        } else {
            style("unset").red()
        };
        let default = e
            .default
            .as_ref()
            .map(|d| format!("  (default: {d})"))
            .unwrap_or_default();
        println!(
            "{:<path_width$}  {:<env_width$}  {:<7}{}",
            e.path,
            style(&e.env).bold(),
            status,
            style(default).dim(),
        );
    }
    Ok(())
}

pub(super) fn cmd_check(schema: &SchemaLoader, env: &EnvSnapshot) -> envschema_core::Result<()> {
    let resolved = resolve(schema.schema(), env);
    let unset = resolved.unset_paths();
    if !unset.is_empty() {
        return Err(EnvschemaError::Unresolved(unset));
    }
    info!(leaves = resolved.leaves().len(), "all variables resolved");
    println!("✅ {} resolves completely", schema.path().display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load_schema(dir: &tempfile::TempDir, body: &str) -> SchemaLoader {
        let path = dir.path().join("envschema.toml");
        std::fs::write(&path, body).unwrap();
        SchemaLoader::load(Some(path.as_path())).unwrap()
    }

    const SCHEMA: &str = r#"
foo = "FOO"

[db]
host = "DB_HOST"
port = { env = "DB_PORT", default = 5432 }
"#;

    #[test]
    fn test_check_lists_unset_paths() {
        let dir = tempfile::tempdir().unwrap();
        let schema = load_schema(&dir, SCHEMA);
        let env = EnvSnapshot::new();

        match cmd_check(&schema, &env) {
            Err(EnvschemaError::Unresolved(paths)) => {
                assert_eq!(paths, vec!["foo".to_string(), "db.host".to_string()]);
            }
            other => panic!("expected unresolved error, got {other:?}"),
        }
    }

    #[test]
    fn test_check_passes_when_everything_resolves() {
        let dir = tempfile::tempdir().unwrap();
        let schema = load_schema(&dir, SCHEMA);
        let env = EnvSnapshot::new().with("FOO", "").with("DB_HOST", "db");

        assert!(cmd_check(&schema, &env).is_ok());
    }

    #[test]
    fn test_resolve_and_vars_succeed_with_unset_variables() {
        let dir = tempfile::tempdir().unwrap();
        let schema = load_schema(&dir, SCHEMA);
        let env = EnvSnapshot::new().with("FOO", "foo");

        assert!(cmd_resolve(&schema, &env, true).is_ok());
        assert!(cmd_resolve(&schema, &env, false).is_ok());
        assert!(cmd_vars(&schema, &env, true).is_ok());
        assert!(cmd_vars(&schema, &env, false).is_ok());
    }

    #[test]
    fn test_vars_on_empty_schema() {
        let dir = tempfile::tempdir().unwrap();
        let schema = load_schema(&dir, "");
        assert!(cmd_vars(&schema, &EnvSnapshot::new(), false).is_ok());
    }
}
