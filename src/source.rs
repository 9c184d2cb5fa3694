//! Where the track text comes from.
//!
//! The loader never does I/O itself: callers read the payload from a [`TextSource`] and, if
//! that fails, fall back to the track bundled with the binary.

use std::{
    fs,
    io::{self, Read},
    path::PathBuf,
};

use anyhow::{Context, Result};
use tracing::warn;

/// Track bundled with the binary, used whenever the configured source can't be read.
pub const FALLBACK_CSV: &str = r#""timestamp","latlng","odometer"
"1754543792","""49.972678,36.301253""","37911894"
"1754543361","""49.949600,36.384890""","37905347"
"1754544376","""49.992947,36.255598""","37916131"
"1754544061","""49.989742,36.265702""","37915134"
"1754544392","""49.993527,36.255878""","37916202"
"1754544003","""49.984900,36.275548""","37914244"
"1754544349","""49.992315,36.255320""","37916061"
"1754543319","""49.948002,36.383502""","37905148"
"1754543856","""49.975008,36.295270""","37912447"
"1754544398","""49.993708,36.255605""","37916232"
"#;

pub trait TextSource {
    fn describe(&self) -> String;
    fn read(&self) -> Result<String>;
}

pub struct FileSource(pub PathBuf);

impl TextSource for FileSource {
    fn describe(&self) -> String {
        self.0.display().to_string()
    }

    fn read(&self) -> Result<String> {
        fs::read_to_string(&self.0).with_context(|| format!("Failed to read {}", self.describe()))
    }
}

pub struct StdinSource;

impl TextSource for StdinSource {
    fn describe(&self) -> String {
        "stdin".into()
    }

    fn read(&self) -> Result<String> {
        let mut text = String::new();
        io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read stdin")?;
        Ok(text)
    }
}

pub fn read_or_fallback(source: &dyn TextSource) -> String {
    match source.read() {
        Ok(text) => text,
        Err(e) => {
            warn!("{e:#}, using the bundled track instead");
            FALLBACK_CSV.to_string()
        }
    }
}
