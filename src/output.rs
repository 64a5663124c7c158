//! Output formatting for aggregated stop information.
//!
//! Used by the one-shot `lookup` command; the HTTP handler serializes
//! through axum's `Json` instead.

use std::io::Write;

use anyhow::Result;
use tracing::debug;

use crate::aggregator::types::StopInfo;

/// Logs stop information using Rust's debug pretty-print format.
pub fn print_pretty(info: &StopInfo) {
    debug!("{:#?}", info);
}

/// Serializes stop information as compact or indented JSON.
pub fn render_json(info: &StopInfo, pretty: bool) -> Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(info)?
    } else {
        serde_json::to_string(info)?
    };
    Ok(json)
}

/// Writes the JSON rendering followed by a newline.
pub fn write_json<W: Write>(mut writer: W, info: &StopInfo, pretty: bool) -> Result<()> {
    writeln!(writer, "{}", render_json(info, pretty)?)?;
    writer.flush()?;
    Ok(())
}
