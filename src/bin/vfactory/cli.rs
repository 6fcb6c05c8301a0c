//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// vfactory - Inspect how a validator factory bootstraps
#[derive(Parser)]
#[command(name = "vfactory")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build a factory from properties and show its effective configuration
    Inspect(InspectArgs),

    /// List the built-in constraint types and their validators
    Constraints(ConstraintsArgs),
}

#[derive(Args)]
pub struct InspectArgs {
    /// Properties file to load; later files override earlier ones.
    /// Without any, the global and project properties files are used.
    #[arg(short, long = "properties", value_name = "FILE")]
    pub properties: Vec<PathBuf>,

    /// Set a property (KEY=VALUE); overrides properties files
    #[arg(short = 'D', long = "set", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    pub set: Vec<(String, String)>,

    /// Enable fail-fast programmatically
    #[arg(long)]
    pub fail_fast: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct ConstraintsArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got `{}`", s))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty property key in `{}`", s));
    }
    Ok((key.to_string(), value.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_key_value() {
        assert_eq!(
            parse_key_value("validator.fail_fast = true").unwrap(),
            ("validator.fail_fast".to_string(), "true".to_string())
        );
        assert!(parse_key_value("validator.fail_fast").is_err());
        assert!(parse_key_value("=true").is_err());
    }

    #[test]
    fn test_inspect_args() {
        let cli = Cli::try_parse_from([
            "vfactory",
            "inspect",
            "-p",
            "a.toml",
            "--properties",
            "b.toml",
            "-D",
            "validator.fail_fast=true",
            "--json",
        ])
        .unwrap();

        match cli.command {
            Commands::Inspect(args) => {
                assert_eq!(args.properties, vec![PathBuf::from("a.toml"), PathBuf::from("b.toml")]);
                assert_eq!(args.set.len(), 1);
                assert!(args.json);
                assert!(!args.fail_fast);
            }
            Commands::Constraints(_) => panic!("expected inspect"),
        }
    }
}
