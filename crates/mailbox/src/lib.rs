use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use common::{Error, Result};

/// The shared mailbox document: candidate lists written by the trend
/// scanner, read (never mutated) by the confirmation engine.
///
/// The wire keys keep the legacy `"BL"` / `"BS"` names — the document format
/// is a fixed external interface. Missing keys read as empty lists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateLists {
    #[serde(rename = "BL", default)]
    pub long_candidates: Vec<String>,
    #[serde(rename = "BS", default)]
    pub short_candidates: Vec<String>,
}

impl CandidateLists {
    pub fn is_empty(&self) -> bool {
        self.long_candidates.is_empty() && self.short_candidates.is_empty()
    }

    /// Append to the long list unless already present.
    /// Returns whether the list changed.
    pub fn add_long(&mut self, pair: &str) -> bool {
        add_unique(&mut self.long_candidates, pair)
    }

    /// Append to the short list unless already present.
    /// Returns whether the list changed.
    pub fn add_short(&mut self, pair: &str) -> bool {
        add_unique(&mut self.short_candidates, pair)
    }
}

fn add_unique(list: &mut Vec<String>, pair: &str) -> bool {
    if list.iter().any(|p| p == pair) {
        return false;
    }
    list.push(pair.to_string());
    true
}

/// File-backed mailbox with whole-document semantics: every save is a full
/// overwrite, every read parses the complete document. There is no lock —
/// staleness between the two processes is bounded by their polling and
/// reset cadences, not by coordination.
pub struct Mailbox {
    path: PathBuf,
}

impl Mailbox {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Parse the document. A missing or malformed file is a recoverable
    /// `Mailbox` error — the caller retries on its next cycle.
    pub fn load(&self) -> Result<CandidateLists> {
        let content = std::fs::read_to_string(&self.path)
            .map_err(|e| Error::Mailbox(format!("{}: {e}", self.path.display())))?;
        serde_json::from_str(&content)
            .map_err(|e| Error::Mailbox(format!("{}: {e}", self.path.display())))
    }

    /// Overwrite the document with the given lists.
    pub fn save(&self, lists: &CandidateLists) -> Result<()> {
        self.write(&to_pretty_json(lists)?)
    }

    /// Reset the document to `{}` (read back as empty lists).
    pub fn clear(&self) -> Result<()> {
        self.write("{}")
    }

    /// Write to a temp file and rename over the target, so a reader never
    /// observes a torn document from this writer and the last complete
    /// write stands even across process termination.
    fn write(&self, contents: &str) -> Result<()> {
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, contents)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

/// 4-space indentation, matching the document's established cosmetic format.
fn to_pretty_json(lists: &CandidateLists) -> Result<String> {
    let mut buf = Vec::new();
    let fmt = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, fmt);
    lists.serialize(&mut ser)?;
    Ok(String::from_utf8(buf).expect("serde_json produces valid UTF-8"))
}
