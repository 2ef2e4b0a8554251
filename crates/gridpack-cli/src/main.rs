#![forbid(unsafe_code)]

//! JSON-in, JSON-out front end for the packing engine.
//!
//! Reads a camelCase options document (the same shape the HTTP wrappers
//! accept), runs the packer, and prints the solved layout as JSON. Errors
//! go to stderr as `{"error": "..."}` with a non-zero exit code so callers
//! can pipe stdout unconditionally.

use std::io::Read;
use std::path::PathBuf;

use clap::Parser;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

use gridpack::{PackError, Packer, PackerConfig};

#[derive(Debug, Error)]
enum CliError {
    #[error("failed to read {path}: {source}")]
    ReadInput {
        path: String,
        source: std::io::Error,
    },
    #[error("invalid options document: {0}")]
    ParseOptions(#[from] serde_json::Error),
    #[error("invalid configuration: {0}")]
    Config(#[from] gridpack::ConfigError),
    #[error(transparent)]
    Pack(#[from] PackError),
}

impl CliError {
    fn exit_code(&self) -> i32 {
        match self {
            CliError::ReadInput { .. } | CliError::ParseOptions(_) | CliError::Config(_) => 1,
            CliError::Pack(_) => 2,
        }
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "gridpack",
    about = "Pack same-aspect-ratio tiles into a screen area",
    version
)]
struct Cli {
    /// Path to the JSON options document, or `-` for stdin.
    #[arg(default_value = "-")]
    options: PathBuf,

    /// Pretty-print the result.
    #[arg(long)]
    pretty: bool,

    /// Seed the search with an explicit initial tile-height guess.
    #[arg(long, value_name = "HEIGHT")]
    guess: Option<f64>,

    /// Omit the per-iteration try log from the output.
    #[arg(long)]
    no_tries: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(error) = run(&cli) {
        eprintln!("{}", serde_json::json!({ "error": error.to_string() }));
        std::process::exit(error.exit_code());
    }
}

fn run(cli: &Cli) -> Result<(), CliError> {
    let raw = read_options(cli)?;
    let config: PackerConfig<serde_json::Value> = serde_json::from_str(&raw)?;
    let mut packer = Packer::new(config)?;
    if let Some(guess) = cli.guess {
        packer.set_best_guess_tile_height(guess);
    }
    let result = packer.pack()?;

    let mut value = serde_json::to_value(&result)?;
    if cli.no_tries && let Some(object) = value.as_object_mut() {
        object.remove("tries");
    }
    let rendered = if cli.pretty {
        serde_json::to_string_pretty(&value)?
    } else {
        serde_json::to_string(&value)?
    };
    println!("{rendered}");
    Ok(())
}

fn read_options(cli: &Cli) -> Result<String, CliError> {
    if cli.options.as_os_str() == "-" {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .map_err(|source| CliError::ReadInput {
                path: "<stdin>".to_string(),
                source,
            })?;
        Ok(buffer)
    } else {
        std::fs::read_to_string(&cli.options).map_err(|source| CliError::ReadInput {
            path: cli.options.display().to_string(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn cli_for(path: &std::path::Path) -> Cli {
        Cli {
            options: path.to_path_buf(),
            pretty: false,
            guess: None,
            no_tries: false,
        }
    }

    #[test]
    fn packs_an_options_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("options.json");
        let mut file = std::fs::File::create(&path).unwrap();
        write!(
            file,
            r#"{{
                "screenArea": [720, 480],
                "tiles": ["a", "b", "c", "d", "e", "f", "g", "h", "i", "j"],
                "tileAspectRatio": 0.8,
                "gutter": 5
            }}"#
        )
        .unwrap();
        assert!(run(&cli_for(&path)).is_ok());
    }

    #[test]
    fn missing_file_maps_to_read_error() {
        let error = run(&cli_for(std::path::Path::new("/nonexistent/options.json"))).unwrap_err();
        assert!(matches!(error, CliError::ReadInput { .. }));
        assert_eq!(error.exit_code(), 1);
    }

    #[test]
    fn infeasible_options_map_to_pack_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("options.json");
        let mut file = std::fs::File::create(&path).unwrap();
        // 11 fixed columns for 10 tiles cannot be satisfied.
        write!(
            file,
            r#"{{
                "screenArea": [720, 480],
                "tiles": [1, 2, 3, 4, 5, 6, 7, 8, 9, 10],
                "tileAspectRatio": 0.8,
                "columns": 11
            }}"#
        )
        .unwrap();
        let error = run(&cli_for(&path)).unwrap_err();
        assert!(matches!(error, CliError::Pack(_)));
        assert_eq!(error.exit_code(), 2);
    }

    #[test]
    fn malformed_json_maps_to_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("options.json");
        std::fs::write(&path, "{not json").unwrap();
        let error = run(&cli_for(&path)).unwrap_err();
        assert!(matches!(error, CliError::ParseOptions(_)));
    }
}
