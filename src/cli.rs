use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::config::Config;

#[derive(Debug, Parser)]
#[command(author, version, about = "Turn loosely formatted payloads into canonical records", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Detect, normalize and re-emit a payload as canonical records
    Convert(ConvertArgs),
    /// Report the detected format of a payload and how many rows it holds
    Detect(DetectArgs),
}

#[derive(Debug, Args)]
pub struct ConvertArgs {
    /// Input payload ('-' reads stdin)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Output file ('-' or omitted writes stdout)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    /// Try YAML before XML and CSV
    #[arg(long)]
    pub yaml: bool,
    /// Fail on keys that cannot be matched
    #[arg(long)]
    pub strict: bool,
    /// Keep keys exactly as they appear in the input
    #[arg(long = "no-normalize")]
    pub no_normalize: bool,
    /// Keep form values as text instead of converting numbers and booleans
    #[arg(long = "no-number-conversion")]
    pub no_number_conversion: bool,
    /// Output encoding
    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,
}

impl ConvertArgs {
    pub fn config(&self) -> Config {
        Config::default()
            .with_yaml(self.yaml)
            .with_strict(self.strict)
            .with_key_normalization(!self.no_normalize)
            .with_number_conversion(!self.no_number_conversion)
    }
}

#[derive(Debug, Args)]
pub struct DetectArgs {
    /// Input payload ('-' reads stdin)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Try YAML before XML and CSV
    #[arg(long)]
    pub yaml: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Default)]
#[value(rename_all = "kebab-case")]
pub enum OutputFormat {
    #[default]
    Json,
    Pretty,
    Yaml,
}
