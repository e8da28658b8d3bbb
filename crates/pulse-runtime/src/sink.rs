//! Report sinks — where finished reports go.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use pulse_core::{ClassifiedRow, Error, Result};
use tracing::info;

pub const ROWS_FILE: &str = "classified_reviews.json";
pub const EMAIL_DRAFT_FILE: &str = "email_draft.txt";

/// One finished batch, ready for delivery.
#[derive(Debug, Clone, Copy)]
pub struct ReportDelivery<'a> {
    pub rendered: &'a str,
    pub rows: &'a [ClassifiedRow],
    pub run_date: NaiveDate,
}

pub trait ReportSink: Send + Sync {
    fn deliver(&self, delivery: &ReportDelivery<'_>) -> Result<()>;

    fn name(&self) -> &str;
}

/// Writes the report, the classified-review table and an email draft to a
/// directory.
pub struct FileSink {
    output_dir: PathBuf,
    recipient: String,
    sender: String,
}

impl FileSink {
    pub fn new(output_dir: impl Into<PathBuf>, recipient: &str, sender: &str) -> Self {
        Self {
            output_dir: output_dir.into(),
            recipient: recipient.to_string(),
            sender: sender.to_string(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// `weekly_pulse_YYYYMMDD.md`
    pub fn report_file_name(run_date: NaiveDate) -> String {
        format!("weekly_pulse_{}.md", run_date.format("%Y%m%d"))
    }

    pub fn report_path(&self, run_date: NaiveDate) -> PathBuf {
        self.output_dir.join(Self::report_file_name(run_date))
    }

    fn email_draft(&self, run_date: NaiveDate) -> String {
        format!(
            "To: {}\n\
             From: {}\n\
             Subject: Weekly Product Pulse Report - {}\n\
             \n\
             Hello Team,\n\
             \n\
             Please find attached the weekly pulse report for product reviews.\n\
             \n\
             This report summarizes:\n\
             - Top 3 themes from customer reviews\n\
             - Key customer quotes\n\
             - Actionable insights\n\
             \n\
             Best regards,\n\
             Product Analytics\n\
             \n\
             Attachment: {}\n",
            self.recipient,
            self.sender,
            run_date.format("%Y-%m-%d"),
            Self::report_file_name(run_date)
        )
    }

    fn write(&self, name: &str, contents: &str) -> Result<PathBuf> {
        let path = self.output_dir.join(name);
        std::fs::write(&path, contents)
            .map_err(|e| Error::Sink(format!("cannot write {}: {}", path.display(), e)))?;
        Ok(path)
    }
}

impl ReportSink for FileSink {
    fn deliver(&self, delivery: &ReportDelivery<'_>) -> Result<()> {
        std::fs::create_dir_all(&self.output_dir).map_err(|e| {
            Error::Sink(format!("cannot create {}: {}", self.output_dir.display(), e))
        })?;

        let report = self.write(&Self::report_file_name(delivery.run_date), delivery.rendered)?;
        let rows = self.write(ROWS_FILE, &serde_json::to_string_pretty(delivery.rows)?)?;
        let draft = self.write(EMAIL_DRAFT_FILE, &self.email_draft(delivery.run_date))?;

        info!(
            "Report written to {} ({} rows in {}, draft {})",
            report.display(),
            delivery.rows.len(),
            rows.display(),
            draft.display()
        );
        Ok(())
    }

    fn name(&self) -> &str {
        "file"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: &str) -> ClassifiedRow {
        ClassifiedRow {
            id: id.to_string(),
            title: "UPI failed".into(),
            body: "payment stuck".into(),
            date: "2024-03-10".into(),
            rating: 1,
            theme: "Payment, Banking and Money Flow".into(),
            confidence: 0.4,
            rationale: "Matched keywords: upi, payment".into(),
        }
    }

    #[test]
    fn test_file_sink_writes_all_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nested").join("output");
        let sink = FileSink::new(&out, "team@example.com", "pulse@example.com");
        let run_date = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let rows = vec![row("r1"), row("r2")];

        sink.deliver(&ReportDelivery {
            rendered: "# Weekly Product Pulse Report\n\nNo reviews found for this period.",
            rows: &rows,
            run_date,
        })
        .unwrap();

        let report = std::fs::read_to_string(out.join("weekly_pulse_20240315.md")).unwrap();
        assert!(report.starts_with("# Weekly Product Pulse Report"));

        let json = std::fs::read_to_string(out.join(ROWS_FILE)).unwrap();
        let parsed: Vec<ClassifiedRow> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, rows);

        let draft = std::fs::read_to_string(out.join(EMAIL_DRAFT_FILE)).unwrap();
        let mut lines = draft.lines();
        assert_eq!(lines.next(), Some("To: team@example.com"));
        assert_eq!(lines.next(), Some("From: pulse@example.com"));
        assert_eq!(lines.next(), Some("Subject: Weekly Product Pulse Report - 2024-03-15"));
        assert_eq!(lines.next(), Some(""));
        assert!(draft.trim_end().ends_with("Attachment: weekly_pulse_20240315.md"));
    }

    #[test]
    fn test_file_sink_reports_unwritable_dir() {
        let file = tempfile::NamedTempFile::new().unwrap();
        // a regular file cannot act as the output directory
        let sink = FileSink::new(file.path(), "a@example.com", "b@example.com");
        let err = sink
            .deliver(&ReportDelivery {
                rendered: "",
                rows: &[],
                run_date: NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
            })
            .unwrap_err();
        assert!(matches!(err, Error::Sink(_)));
    }
}
