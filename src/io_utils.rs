//! I/O helpers for payload decoding, stream draining, and CSV reader setup.
//!
//! - **Decoding**: payload bytes are decoded as UTF-8 via `encoding_rs`, which
//!   also removes a leading byte-order mark.
//! - **Draining**: readable streams are read to the end before detection; there is
//!   no incremental mode.
//! - **stdin/stdout**: the `-` path convention routes the CLI through standard streams.

use std::{
    fs::File,
    io::{self, BufReader, BufWriter, Read, Write},
    path::Path,
};

use anyhow::{Context, Result};
use encoding_rs::UTF_8;
use log::debug;

pub const DEFAULT_CSV_DELIMITER: u8 = b',';
pub const UTF8_BOM: char = '\u{feff}';

pub fn is_dash(path: &Path) -> bool {
    path == Path::new("-")
}

/// Decodes payload bytes as UTF-8, dropping a leading BOM. Invalid sequences are
/// replaced.
pub fn decode_payload(bytes: &[u8]) -> String {
    let (text, had_errors) = UTF_8.decode_with_bom_removal(bytes);
    if had_errors {
        debug!("Payload contained invalid UTF-8; replacement characters substituted");
    }
    text.into_owned()
}

/// Strips a leading BOM (possibly repeated after decoding) and surrounding whitespace.
pub fn trim_payload(text: &str) -> &str {
    text.trim_start_matches(UTF8_BOM).trim()
}

pub fn drain<R>(mut reader: R) -> io::Result<Vec<u8>>
where
    R: Read,
{
    let mut buf = Vec::new();
    reader.read_to_end(&mut buf)?;
    Ok(buf)
}

pub fn open_csv_reader<R>(reader: R, delimiter: u8) -> csv::Reader<R>
where
    R: Read,
{
    let mut builder = csv::ReaderBuilder::new();
    builder
        .has_headers(false)
        .delimiter(delimiter)
        .double_quote(true)
        .flexible(true);
    builder.from_reader(reader)
}

pub fn read_input(path: &Path) -> Result<Vec<u8>> {
    if is_dash(path) {
        return drain(io::stdin().lock()).context("Reading payload from stdin");
    }
    let file = File::open(path).with_context(|| format!("Opening input file {path:?}"))?;
    drain(BufReader::new(file)).with_context(|| format!("Reading input file {path:?}"))
}

pub fn open_output(path: Option<&Path>) -> Result<Box<dyn Write>> {
    Ok(match path {
        Some(p) if !is_dash(p) => Box::new(BufWriter::new(
            File::create(p).with_context(|| format!("Creating output file {p:?}"))?,
        )),
        _ => Box::new(io::stdout()),
    })
}
