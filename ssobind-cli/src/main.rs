//! ssobind CLI - nonce utilities and a loopback handshake simulator

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use ssobind_auth::{AuthConfig, AuthorizationErrorCode};
use tracing_subscriber::EnvFilter;

mod commands;
mod loopback;

use commands::{cmd_digest, cmd_nonce, cmd_simulate};
use loopback::Behavior;

/// ssobind - Nonce-bound sign-in handshake tools
#[derive(Parser)]
#[command(name = "ssobind", version, about)]
struct Cli {
    /// JSON config file (SSOBIND_* environment variables override it)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output JSON instead of human-readable text
    #[arg(long, global = true)]
    json: bool,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate nonces and their digests
    Nonce {
        /// Raw nonce length (defaults to the configured length)
        #[arg(long)]
        length: Option<usize>,

        /// Number of nonces to generate
        #[arg(long, default_value = "1")]
        count: usize,
    },

    /// Print the SHA-256 digest of a raw nonce
    Digest {
        /// Raw nonce
        raw: String,
    },

    /// Run one handshake against an in-process loopback issuer
    Simulate {
        /// Issue a token bound to the wrong nonce
        #[arg(long, conflicts_with_all = ["fail", "unrecognized"])]
        tamper: bool,

        /// Fail the authorization with this code
        #[arg(long, value_enum, conflicts_with = "unrecognized")]
        fail: Option<FailureCode>,

        /// Fail with an error outside the authorization taxonomy
        #[arg(long)]
        unrecognized: bool,

        /// Seconds to wait for the outcome
        #[arg(long, default_value = "5")]
        timeout: u64,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum FailureCode {
    Unknown,
    Canceled,
    InvalidResponse,
    NotHandled,
    Failed,
    NotInteractive,
}

impl FailureCode {
    fn to_code(self) -> AuthorizationErrorCode {
        match self {
            FailureCode::Unknown => AuthorizationErrorCode::Unknown,
            FailureCode::Canceled => AuthorizationErrorCode::Canceled,
            FailureCode::InvalidResponse => AuthorizationErrorCode::InvalidResponse,
            FailureCode::NotHandled => AuthorizationErrorCode::NotHandled,
            FailureCode::Failed => AuthorizationErrorCode::Failed,
            FailureCode::NotInteractive => AuthorizationErrorCode::NotInteractive,
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("error: {e:#}");
            std::process::exit(1);
        }
    }
}

async fn run(cli: Cli) -> Result<i32> {
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Nonce { length, count } => {
            cmd_nonce(&config, length, count, cli.json)?;
            Ok(0)
        }

        Commands::Digest { raw } => {
            cmd_digest(&raw, cli.json)?;
            Ok(0)
        }

        Commands::Simulate {
            tamper,
            fail,
            unrecognized,
            timeout,
        } => {
            let behavior = if tamper {
                Behavior::Tamper
            } else if let Some(code) = fail {
                Behavior::Fail(code.to_code())
            } else if unrecognized {
                Behavior::Unrecognized
            } else {
                Behavior::Issue
            };
            cmd_simulate(config, behavior, Duration::from_secs(timeout), cli.json).await
        }
    }
}

/// Load the config file (if any), then overlay `SSOBIND_*` variables.
fn load_config(path: Option<&Path>) -> Result<AuthConfig> {
    let base: AuthConfig = match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("Failed to parse config {}", path.display()))?
        }
        None => AuthConfig::default(),
    };

    base.overlay(|name| std::env::var(name).ok())
        .context("Invalid configuration")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_nonce_defaults() {
        let cli = Cli::try_parse_from(["ssobind", "nonce"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Nonce {
                length: None,
                count: 1
            }
        ));
    }

    #[test]
    fn test_parse_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["ssobind", "digest", "abc", "--json"]).unwrap();
        assert!(cli.json);
        assert!(matches!(cli.command, Commands::Digest { ref raw } if raw == "abc"));
    }

    #[test]
    fn test_parse_simulate_fail_code() {
        let cli = Cli::try_parse_from(["ssobind", "simulate", "--fail", "not-interactive"]).unwrap();
        let Commands::Simulate { fail, .. } = cli.command else {
            panic!("expected simulate");
        };
        assert_eq!(
            fail.map(FailureCode::to_code),
            Some(AuthorizationErrorCode::NotInteractive)
        );
    }

    #[test]
    fn test_simulate_flags_conflict() {
        assert!(Cli::try_parse_from(["ssobind", "simulate", "--tamper", "--unrecognized"]).is_err());
    }

    #[test]
    fn test_load_config_missing_file() {
        let err = load_config(Some(Path::new("/nonexistent/ssobind.json"))).unwrap_err();
        assert!(format!("{err:#}").contains("Failed to read config"));
    }
}
