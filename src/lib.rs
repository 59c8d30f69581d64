//! Best-effort transformation of loosely formatted payloads into typed values.
//!
//! A payload of guessable format (JSON, URL-encoded form, YAML, XML, or CSV) is
//! detected, its keys normalized, matched against the destination's declared
//! fields, coerced to the field types, and decoded through `serde`.
//!
//! ```
//! use databridge::{Config, record_shape, transform};
//!
//! #[derive(Debug, serde::Deserialize, PartialEq)]
//! struct User {
//!     #[serde(rename = "FirstName")]
//!     first_name: String,
//!     #[serde(rename = "Age")]
//!     age: i64,
//! }
//!
//! record_shape!(User {
//!     first_name as "FirstName": String,
//!     age as "Age": i64,
//! });
//!
//! let user: User = transform("first-name=Ada&AGE=36", &Config::default()).unwrap();
//! assert_eq!(user, User { first_name: "Ada".into(), age: 36 });
//! ```

pub mod assemble;
pub mod cli;
pub mod coerce;
pub mod config;
pub mod convert;
pub mod data;
pub mod detect;
pub mod engine;
pub mod error;
pub mod form;
pub mod io_utils;
pub mod mapper;
pub mod normalize;
pub mod schema;
pub mod tabular;
pub mod yaml;

use std::{env, sync::OnceLock};

use clap::Parser;
use log::LevelFilter;

pub use crate::{
    config::{Config, KeyNormalizer, LogSink, Setting},
    data::{Dataset, Record, Value},
    detect::{Detected, Format, Payload},
    engine::{Input, transform, transform_into, transform_to_canonical, transform_to_canonical_as},
    error::{Error, Result},
    form::FormValues,
    schema::{Describe, Kind, Shape},
};

use crate::cli::{Cli, Commands};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("databridge", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> anyhow::Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Convert(args) => convert::execute(&args),
        Commands::Detect(args) => convert::detect_format(&args),
    }
}
