use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use std::path::PathBuf;

use envschema_config::{EnvLoader, SchemaLoader};
use envschema_core::EnvSnapshot;

mod resolve;

/// Resolve environment-variable schemas into configuration trees
#[derive(Parser)]
#[command(name = "envschema", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the schema file (.toml or .json)
    #[arg(short, long, global = true, env = "ENVSCHEMA_SCHEMA")]
    schema: Option<PathBuf>,

    /// Env file to load instead of searching for .env
    #[arg(short, long, global = true, env = "ENVSCHEMA_ENV_FILE")]
    env_file: Option<PathBuf>,

    /// Use the process environment only, without any env file
    #[arg(long, global = true, conflicts_with = "env_file")]
    no_dotenv: bool,

    /// Log level override (e.g. debug, info, warn, error)
    #[arg(short, long, global = true, env = "ENVSCHEMA_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log output format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Pretty, env = "ENVSCHEMA_LOG_FORMAT")]
    log_format: LogFormat,

    /// Enable verbose output (debug logging)
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Suppress all log output (errors only)
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve the schema and print the configuration as JSON
    Resolve {
        /// Print on a single line
        #[arg(long)]
        compact: bool,
    },
    /// List every variable the schema reads, with its default and status
    Vars {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Fail if any variable without a default is unset
    Check,
    /// Generate shell completions for bash, zsh, or fish
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

impl Cli {
    pub fn run(self) -> envschema_core::Result<()> {
        // Resolve log level: --verbose > --quiet > --log-level > info
        let log_level = if self.verbose {
            "debug"
        } else if self.quiet {
            "error"
        } else {
            self.log_level.as_deref().unwrap_or("info")
        };
        init_tracing(log_level, self.log_format);

        match &self.command {
            Commands::Resolve { compact } => {
                let (schema, env) = self.load_inputs()?;
                resolve::cmd_resolve(&schema, &env, *compact)
            }
            Commands::Vars { json } => {
                let (schema, env) = self.load_inputs()?;
                resolve::cmd_vars(&schema, &env, *json)
            }
            Commands::Check => {
                let (schema, env) = self.load_inputs()?;
                resolve::cmd_check(&schema, &env)
            }
            Commands::Completions { shell } => Self::cmd_completions(*shell),
        }
    }

    fn env_loader(&self) -> EnvLoader {
        let loader = EnvLoader::new();
        if self.no_dotenv {
            return loader.without_dotenv();
        }
        match &self.env_file {
            Some(path) => loader.with_env_file(path),
            None => loader,
        }
    }

    /// Environment first, so a broken env file is reported before schema errors.
    fn load_inputs(&self) -> envschema_core::Result<(SchemaLoader, EnvSnapshot)> {
        let env = self.env_loader().load()?;
        let schema = SchemaLoader::load(self.schema.as_deref())?;
        Ok((schema, env))
    }

    fn cmd_completions(shell: Shell) -> envschema_core::Result<()> {
        let mut cmd = Cli::command();
        generate(shell, &mut cmd, "envschema", &mut std::io::stdout());
        Ok(())
    }
}

/// Logs go to stderr; stdout is reserved for command output.
fn init_tracing(log_level: &str, format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));
    match format {
        LogFormat::Json => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .json()
            .with_target(true)
            .init(),
        LogFormat::Pretty => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .init(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_resolve_with_globals() {
        let cli = Cli::try_parse_from([
            "envschema",
            "resolve",
            "--schema",
            "app.toml",
            "--compact",
            "--no-dotenv",
        ])
        .unwrap();
        assert_eq!(cli.schema, Some(PathBuf::from("app.toml")));
        assert!(cli.no_dotenv);
        assert!(matches!(cli.command, Commands::Resolve { compact: true }));
    }

    #[test]
    fn test_env_file_conflicts_with_no_dotenv() {
        let res = Cli::try_parse_from([
            "envschema",
            "check",
            "--env-file",
            "prod.env",
            "--no-dotenv",
        ]);
        assert!(res.is_err());
    }

    #[test]
    fn test_schema_flag_reads_env_var() {
        let cmd = Cli::command();
        let schema = cmd
            .get_arguments()
            .find(|a| a.get_id() == "schema")
            .unwrap();
        assert_eq!(
            schema.get_env(),
            Some(std::ffi::OsStr::new("ENVSCHEMA_SCHEMA"))
        );
    }

    #[test]
    fn test_verbose_conflicts_with_quiet() {
        assert!(Cli::try_parse_from(["envschema", "vars", "-v", "-q"]).is_err());
    }
}
