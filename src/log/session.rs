/// Measurement session log
///
/// Every user action that changes what is measured is recorded with:
/// - Timestamp
/// - Action name
/// - Description (sample, mode, wavelengths)
/// - Sequential order
///
/// Completed measurements also keep their result lines so the session can
/// be exported as human-readable text or JSON.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::io;
use std::path::Path;

use visor_core::{CalcFoci, CalcSummary, SeriesStore, SummaryValue};

/// A single log entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    /// Sequential number (1-based)
    pub sequence: usize,
    pub timestamp: DateTime<Local>,
    pub action: String,
    pub description: String,
    /// Result lines of a completed measurement, empty otherwise
    #[serde(default)]
    pub results: Vec<String>,
}

impl LogEntry {
    /// Format as human-readable text
    pub fn to_text(&self) -> String {
        let mut out = format!(
            "[{:03}] {} | {} | {}",
            self.sequence,
            self.timestamp.format("%Y-%m-%d %H:%M:%S"),
            self.action,
            self.description,
        );
        for line in &self.results {
            out.push_str("\n      ");
            out.push_str(line);
        }
        out
    }
}

/// The session log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionLog {
    pub session_id: String,
    pub session_start: DateTime<Local>,
    /// Sample files loaded during the session
    pub sources: Vec<String>,
    pub software_version: String,
    pub entries: Vec<LogEntry>,
}

impl SessionLog {
    pub fn new() -> Self {
        Self {
            session_id: uuid::Uuid::new_v4().to_string(),
            session_start: Local::now(),
            sources: Vec::new(),
            software_version: env!("CARGO_PKG_VERSION").to_string(),
            entries: Vec::new(),
        }
    }

    pub fn add_source(&mut self, source: &str) {
        self.sources.push(source.to_string());
    }

    /// Add an action to the log
    pub fn add_entry(&mut self, action: &str, description: &str) {
        self.push(action, description, Vec::new());
    }

    /// Record a completed measurement, one line per measured series
    pub fn add_measurement(&mut self, summary: &CalcSummary, store: &SeriesStore, mode_name: &str) {
        let mut lines: Vec<String> = summary.shoulders.clone();
        if let Some(heading) = &summary.heading {
            lines.push(heading.clone());
        }
        lines.extend(result_lines(&summary.values, store));
        self.push("Measurement", mode_name, lines);
    }

    /// Record the results a mode or apply-to-all change recomputed. Nothing
    /// is logged while the measurement is incomplete.
    pub fn add_recalculation(&mut self, calc: &CalcFoci, store: &SeriesStore) -> bool {
        if calc.results().is_empty() {
            return false;
        }
        let summary = calc.summary(store);
        let mut lines = summary.heading.into_iter().collect::<Vec<_>>();
        lines.extend(result_lines(&summary.values, store));
        self.push("Recalculation", calc.mode().display_name(), lines);
        true
    }

    fn push(&mut self, action: &str, description: &str, results: Vec<String>) {
        let seq = self.entries.len() + 1;
        self.entries.push(LogEntry {
            sequence: seq,
            timestamp: Local::now(),
            action: action.to_string(),
            description: description.to_string(),
            results,
        });
        log::info!("[LOG {:03}] {}: {}", seq, action, description);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Export as human-readable text
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        out.push_str("═══════════════════════════════════════════════════════════════\n");
        out.push_str("  Reflectance Measurement Session\n");
        out.push_str("═══════════════════════════════════════════════════════════════\n");
        out.push_str(&format!("  Session ID:  {}\n", self.session_id));
        out.push_str(&format!(
            "  Started:     {}\n",
            self.session_start.format("%Y-%m-%d %H:%M:%S")
        ));
        for source in &self.sources {
            out.push_str(&format!("  Source:      {}\n", source));
        }
        out.push_str(&format!("  Software:    visor v{}\n", self.software_version));
        out.push_str(&format!("  Entries:     {}\n", self.entries.len()));
        out.push_str("───────────────────────────────────────────────────────────────\n\n");

        for entry in &self.entries {
            out.push_str(&entry.to_text());
            out.push_str("\n\n");
        }

        out.push_str("═══════════════════════════════════════════════════════════════\n");
        out.push_str(&format!(
            "  Log exported: {}\n",
            Local::now().format("%Y-%m-%d %H:%M:%S")
        ));
        out.push_str("═══════════════════════════════════════════════════════════════\n");
        out
    }

    /// Export as JSON
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|e| format!("JSON error: {}", e))
    }

    pub fn save_text(&self, path: &Path) -> io::Result<()> {
        std::fs::write(path, self.to_text())
    }

    pub fn save_json(&self, path: &Path) -> io::Result<()> {
        std::fs::write(path, self.to_json())
    }

    /// Save in the format picked by the file extension (`.json` or text)
    pub fn save(&self, path: &Path) -> io::Result<()> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => self.save_json(path),
            _ => self.save_text(path),
        }
    }
}

/// One line per value, naming the series it was measured on.
fn result_lines(values: &[SummaryValue], store: &SeriesStore) -> Vec<String> {
    values
        .iter()
        .map(|value| {
            let owner = store
                .series_label(value.key)
                .unwrap_or_else(|| value.key.to_string());
            format!("  {}: {}", owner, value.text)
        })
        .collect()
}

impl Default for SessionLog {
    fn default() -> Self {
        Self::new()
    }
}
