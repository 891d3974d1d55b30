//! Append-only action log.
//!
//! One tab-separated line per decision, written and flushed before the next
//! update is looked at, so an aborted run leaves an exact record of what it
//! completed. An optional JSONL file receives the same actions as objects.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

use chrono::{SecondsFormat, Utc};
use serde::Serialize;

use super::types::{ActionKind, ActionRecord, Outcome, Phase};
use crate::error_handling::InitializationError;

#[derive(Serialize)]
struct AuditLine<'a> {
    ts: &'a str,
    phase: Phase,
    action: ActionKind,
    reason: Option<&'a str>,
    update_id: &'a str,
    title: &'a str,
    dry_run: bool,
    outcome: &'a str,
    error: Option<&'a str>,
}

/// Writer for the action log and the optional JSONL audit trail.
#[derive(Debug)]
pub struct ActionLog {
    text: File,
    jsonl: Option<File>,
    dry_run: bool,
}

fn open_append(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Tabs and newlines in titles would break the one-line-per-action format.
fn one_line(s: &str) -> String {
    s.replace(['\t', '\r', '\n'], " ")
}

impl ActionLog {
    /// Opens (or creates) both files in append mode.
    ///
    /// # Errors
    ///
    /// Returns `InitializationError::ActionLogError` if a file cannot be opened.
    pub fn open(
        path: &Path,
        jsonl: Option<&Path>,
        dry_run: bool,
    ) -> Result<Self, InitializationError> {
        let text = open_append(path)?;
        let jsonl = jsonl.map(open_append).transpose()?;
        Ok(Self {
            text,
            jsonl,
            dry_run,
        })
    }

    /// Free-form line: run start and end, sync progress, aborts.
    pub fn note(&mut self, phase: Phase, message: &str) -> io::Result<()> {
        writeln!(
            self.text,
            "{}\t{}\tNOTE\t{}",
            timestamp(),
            phase.as_str(),
            one_line(message)
        )?;
        self.text.flush()
    }

    /// Appends one action to the log (and the JSONL file when configured).
    pub fn record(&mut self, action: &ActionRecord) -> io::Result<()> {
        let ts = timestamp();
        let marker = if self.dry_run { "DRY-RUN " } else { "" };
        let error = match &action.outcome {
            Outcome::Failed(reason) => Some(reason.as_str()),
            _ => None,
        };

        writeln!(
            self.text,
            "{}\t{}\t{}{}\t{}\t{}\t{}\t{}{}",
            ts,
            action.phase.as_str(),
            marker,
            action.kind.as_str(),
            action.detail.as_deref().unwrap_or("-"),
            action.update_id,
            one_line(&action.title),
            action.outcome.as_str(),
            error.map(|e| format!(": {}", one_line(e))).unwrap_or_default()
        )?;
        self.text.flush()?;

        if let Some(jsonl) = self.jsonl.as_mut() {
            let line = AuditLine {
                ts: &ts,
                phase: action.phase,
                action: action.kind,
                reason: action.detail.as_deref(),
                update_id: action.update_id.as_str(),
                title: &action.title,
                dry_run: self.dry_run,
                outcome: action.outcome.as_str(),
                error,
            };
            let json = serde_json::to_string(&line).map_err(io::Error::other)?;
            writeln!(jsonl, "{json}")?;
            jsonl.flush()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::{Architecture, Decision};
    use crate::server::{UpdateId, UpdateRecord};
    use tempfile::TempDir;

    fn update() -> UpdateRecord {
        UpdateRecord {
            id: UpdateId::from("u-1"),
            title: "Update for ARM64\tSystems".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_record_writes_one_tab_separated_line() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("actions.log");
        let mut log = ActionLog::open(&path, None, false).unwrap();
        log.record(&ActionRecord::new(
            Phase::Decide,
            Decision::DeclineArch(Architecture::Arm64),
            &update(),
            Outcome::Done,
        ))
        .unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 1);
        let fields: Vec<&str> = lines[0].split('\t').collect();
        assert_eq!(fields.len(), 7);
        assert_eq!(fields[1], "decide");
        assert_eq!(fields[2], "DECLINE-ARCH");
        assert_eq!(fields[3], "arm64");
        assert_eq!(fields[4], "u-1");
        assert_eq!(fields[5], "Update for ARM64 Systems");
        assert_eq!(fields[6], "done");
    }

    #[test]
    fn test_log_is_appended_across_opens() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("actions.log");
        {
            let mut log = ActionLog::open(&path, None, false).unwrap();
            log.note(Phase::Sync, "run started").unwrap();
        }
        {
            let mut log = ActionLog::open(&path, None, false).unwrap();
            log.note(Phase::Sync, "second run").unwrap();
        }
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);
        assert!(content.contains("run started"));
        assert!(content.contains("second run"));
    }

    #[test]
    fn test_dry_run_marker_and_failure_reason() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("actions.log");
        let mut log = ActionLog::open(&path, None, true).unwrap();
        log.record(&ActionRecord::new(
            Phase::Prune,
            Decision::Delete,
            &update(),
            Outcome::Failed("DeleteUpdate returned HTTP 500".into()),
        ))
        .unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("DRY-RUN DELETE"));
        assert!(content.contains("failed: DeleteUpdate returned HTTP 500"));
    }

    #[test]
    fn test_jsonl_audit_line() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("actions.log");
        let audit = dir.path().join("audit.jsonl");
        let mut log = ActionLog::open(&path, Some(&audit), true).unwrap();
        log.record(&ActionRecord::new(
            Phase::Decide,
            Decision::DeclineArch(Architecture::Arm64),
            &update(),
            Outcome::DryRun,
        ))
        .unwrap();

        let content = std::fs::read_to_string(&audit).unwrap();
        let value: serde_json::Value = serde_json::from_str(content.trim()).unwrap();
        assert_eq!(value["phase"], "decide");
        assert_eq!(value["action"], "decline-arch");
        assert_eq!(value["reason"], "arm64");
        assert_eq!(value["update_id"], "u-1");
        assert_eq!(value["dry_run"], true);
        assert_eq!(value["outcome"], "dry-run");
        assert!(value["error"].is_null());
    }
}
