use anyhow::{Context, Result};
use log::info;
use serde::Serialize;
use std::io::Write;
use std::path::Path;

/// Writes `value` as JSON to `output`, or to stdout when no path is given.
pub fn export_json<T: Serialize>(value: &T, pretty: bool, output: Option<&Path>) -> Result<()> {
    let json = to_json(value, pretty)?;

    match output {
        Some(path) => {
            std::fs::write(path, format!("{json}\n"))
                .with_context(|| format!("Failed to write output file: {}", path.display()))?;
            info!("Output written to: {}", path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{json}")?;
        }
    }

    Ok(())
}

fn to_json<T: Serialize>(value: &T, pretty: bool) -> Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(json)
}
