//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

use normargs::{Value, ValueType};

/// normargs - validate and normalize arguments against availability data
#[derive(Parser)]
#[command(name = "normargs")]
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
    /// Check a (partial) combination against an availability file
    Check(CheckArgs),

    /// Display the availability tree
    Tree(TreeArgs),

    /// List the values observed for each key
    Values(ValuesArgs),

    /// Run a single normalizer over a value
    Normalize(NormalizeArgs),

    /// Inspect and change settings
    Settings(SettingsArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args)]
pub struct CheckArgs {
    /// Availability file (.json or .toml)
    pub file: PathBuf,

    /// Arguments as KEY=VALUE; `a,b` is a list, an empty value a wildcard
    #[arg(value_parser = parse_assignment)]
    pub assignments: Vec<(String, Value)>,
}

#[derive(Args)]
pub struct TreeArgs {
    /// Availability file (.json or .toml)
    pub file: PathBuf,

    /// Maximum depth to display
    #[arg(short, long)]
    pub depth: Option<usize>,
}

#[derive(Args)]
pub struct ValuesArgs {
    /// Availability file (.json or .toml)
    pub file: PathBuf,

    /// Only show this key
    #[arg(short, long)]
    pub key: Option<String>,
}

#[derive(Args)]
pub struct NormalizeArgs {
    /// Parameter name
    pub name: String,

    /// Value(s) to normalize; several values form a list
    #[arg(required = true)]
    pub values: Vec<String>,

    /// Legal values, comma separated
    #[arg(long = "values", value_delimiter = ',', conflicts_with_all = ["values_file", "ty"])]
    pub legal: Vec<String>,

    /// File with legal values (.json or .toml)
    #[arg(long, conflicts_with = "ty")]
    pub values_file: Option<PathBuf>,

    /// Alias as FROM=TO (repeatable)
    #[arg(long, value_parser = parse_assignment)]
    pub alias: Vec<(String, Value)>,

    /// Coerce to a type (int, float, str, bool, date)
    #[arg(long = "type")]
    pub ty: Option<ValueType>,

    /// Always produce a list
    #[arg(long)]
    pub multiple: bool,
}

#[derive(Args)]
pub struct SettingsArgs {
    #[command(subcommand)]
    pub command: SettingsCommands,
}

#[derive(Subcommand)]
pub enum SettingsCommands {
    /// List all settings
    List,

    /// Show one setting
    Get {
        /// Setting name
        name: String,
    },

    /// Change a setting for this project
    Set {
        /// Setting name
        name: String,
        /// New value
        value: String,
    },

    /// Restore one setting, or all of them, to the default
    Reset {
        /// Setting name
        name: Option<String>,
    },
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

/// Parse `KEY=VALUE`. The value is a list when it contains commas and a
/// wildcard when empty.
pub fn parse_assignment(s: &str) -> Result<(String, Value), String> {
    let (key, raw) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got `{}`", s))?;

    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing key in `{}`", s));
    }

    let value = if raw.is_empty() {
        Value::Null
    } else if raw.contains(',') {
        Value::List(raw.split(',').map(|item| Value::parse_scalar(item.trim())).collect())
    } else {
        Value::parse_scalar(raw)
    };

    Ok((key.to_string(), value))
}
