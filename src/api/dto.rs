use serde::{Deserialize, Serialize};

use crate::application::{BatchReport, FileReport};
use crate::domain::diagnostics::Diagnostic;

#[derive(Debug, Serialize, Deserialize)]
pub struct ReportDto {
    pub files: Vec<FileReportDto>,
    pub failures: usize,
    pub diagnostics: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FileReportDto {
    pub source: String,
    pub destination: String,
    pub status: FileStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub sends: usize,
    pub receives: usize,
    pub selects: usize,
    pub spawns: usize,
    pub time_calls: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub virtual_time: Option<String>,
    pub diagnostics: Vec<DiagnosticDto>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    Rewritten,
    Violations,
    Failed,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DiagnosticDto {
    pub file: String,
    pub line: usize,
    pub column: usize,
    pub message: String,
}

impl From<&Diagnostic> for DiagnosticDto {
    fn from(d: &Diagnostic) -> Self {
        DiagnosticDto {
            file: d.position.filename.clone(),
            line: d.position.line,
            column: d.position.column,
            message: d.message.clone(),
        }
    }
}

impl From<&FileReport> for FileReportDto {
    fn from(report: &FileReport) -> Self {
        let outcome = report.outcome.clone().unwrap_or_default();
        let status = if report.error.is_some() {
            FileStatus::Failed
        } else if outcome.is_clean() {
            FileStatus::Rewritten
        } else {
            FileStatus::Violations
        };

        FileReportDto {
            source: report.job.source.display().to_string(),
            destination: report.job.destination.display().to_string(),
            status,
            error: report.error.as_ref().map(|e| e.to_string()),
            sends: outcome.stats.sends,
            receives: outcome.stats.receives,
            selects: outcome.stats.selects,
            spawns: outcome.stats.spawns,
            time_calls: outcome.converted_calls,
            virtual_time: report.outcome.as_ref().map(|o| o.virtual_time.clone()),
            diagnostics: outcome.diagnostics.iter().map(DiagnosticDto::from).collect(),
        }
    }
}

impl From<&BatchReport> for ReportDto {
    fn from(report: &BatchReport) -> Self {
        ReportDto {
            files: report.files.iter().map(FileReportDto::from).collect(),
            failures: report.failures(),
            diagnostics: report.diagnostics(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::pipeline::FileOutcome;
    use crate::application::RewriteJob;
    use crate::domain::diagnostics::{RewriteError, MSG_NESTED_PRIMITIVE};
    use crate::domain::source_map::Position;

    #[test]
    fn test_report_dto_statuses() {
        let violation = Diagnostic::new(
            Position {
                filename: "main.go".into(),
                line: 4,
                column: 9,
            },
            MSG_NESTED_PRIMITIVE,
        );
        let report = BatchReport {
            files: vec![
                FileReport {
                    job: RewriteJob::new("a.json", "out/a.go"),
                    outcome: Some(FileOutcome {
                        virtual_time: "vtime".into(),
                        diagnostics: vec![violation],
                        ..Default::default()
                    }),
                    error: None,
                },
                FileReport {
                    job: RewriteJob::new("b.json", "out/b.go"),
                    outcome: None,
                    error: Some(RewriteError::parse("b.json", "unexpected end of input")),
                },
            ],
        };

        let dto = ReportDto::from(&report);
        assert_eq!(dto.failures, 1);
        assert_eq!(dto.diagnostics, 1);
        assert_eq!(dto.files[0].status, FileStatus::Violations);
        assert_eq!(dto.files[0].diagnostics[0].line, 4);
        assert_eq!(dto.files[1].status, FileStatus::Failed);
        assert!(dto.files[1].error.as_deref().unwrap().contains("b.json"));

        let json = serde_json::to_value(&dto).unwrap();
        assert_eq!(json["files"][0]["status"], "violations");
        assert!(json["files"][1].get("virtual_time").is_none());
    }
}
