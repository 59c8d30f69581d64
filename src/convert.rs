use std::io::Write;

use anyhow::{Context, Result};
use log::info;

use crate::{
    cli::{ConvertArgs, DetectArgs, OutputFormat},
    config::Config,
    detect::detect,
    engine::transform,
    io_utils::{open_output, read_input},
    yaml,
};

pub fn execute(args: &ConvertArgs) -> Result<()> {
    let config = args.config();
    let raw = read_input(&args.input)?;
    info!(
        "Converting {} byte(s) from {:?} as {:?}",
        raw.len(),
        args.input,
        args.format
    );
    let value: serde_json::Value = transform(raw, &config)
        .with_context(|| format!("Transforming payload from {:?}", args.input))?;
    let rendered = match args.format {
        OutputFormat::Json => serde_json::to_string(&value)?,
        OutputFormat::Pretty => serde_json::to_string_pretty(&value)?,
        OutputFormat::Yaml => yaml::to_string(&value)?,
    };
    let mut writer = open_output(args.output.as_deref())?;
    writer
        .write_all(rendered.as_bytes())
        .context("Writing converted payload")?;
    if !rendered.ends_with('\n') {
        writer.write_all(b"\n").context("Writing converted payload")?;
    }
    writer.flush().context("Flushing output")?;
    Ok(())
}

pub fn detect_format(args: &DetectArgs) -> Result<()> {
    let config = Config::default().with_yaml(args.yaml);
    let raw = read_input(&args.input)?;
    let detected = detect(&raw, &config);
    info!("Detected {} in {:?}", detected.format, args.input);
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{}\t{}", detected.format, detected.payload.rows())
        .context("Writing detection result")?;
    Ok(())
}
