//! Reader and writer settings loaded as one unit

use crate::parse::ParseOptions;
use crate::writer::WriterOptions;
use serde::{Deserialize, Serialize};

/// Combined settings, as stored in a JSON options file.
///
/// Missing sections and fields take their defaults:
///
/// ```json
/// { "writer": { "indent": 2 }, "parse": { "ignore_layout": false } }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub parse: ParseOptions,
    pub writer: WriterOptions,
}

impl Config {
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }
}
