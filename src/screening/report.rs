//! Assessment report rendering and export.
//!
//! The report is plain markdown. `MarkdownExporter` hands it back as-is;
//! `PandocPdfExporter` pipes it through a local `pandoc` binary.

use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use super::parsing::question_text;
use crate::error::ExportError;

/// Rendered in place of an answer the candidate never gave.
pub const NOT_PROVIDED: &str = "Not provided";

const REPORT_TITLE: &str = "Technical Assessment";

/// One question with its answer, numeral already stripped.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportEntry {
    pub number: usize,
    pub question: String,
    pub answer: String,
}

/// Questions paired with the candidate's answers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssessmentReport {
    pub candidate_name: Option<String>,
    pub entries: Vec<ReportEntry>,
}

impl AssessmentReport {
    pub fn new(questions: &[String], answers: &[String]) -> Self {
        let entries = questions
            .iter()
            .enumerate()
            .map(|(i, question)| ReportEntry {
                number: i + 1,
                question: question_text(question).to_string(),
                answer: answers
                    .get(i)
                    .cloned()
                    .unwrap_or_else(|| NOT_PROVIDED.to_string()),
            })
            .collect();
        Self {
            candidate_name: None,
            entries,
        }
    }

    pub fn with_candidate_name(mut self, name: Option<String>) -> Self {
        self.candidate_name = name;
        self
    }

    /// Render as markdown. Candidate and model text is escaped so it can
    /// never open headings, links, raw HTML or TeX.
    pub fn render_markdown(&self) -> String {
        let mut out = format!("# {REPORT_TITLE}\n\n");
        if let Some(name) = &self.candidate_name {
            out.push_str(&format!("**Candidate:** {}\n\n", escape_markdown(name)));
        }
        for entry in &self.entries {
            out.push_str(&format!(
                "## Question {}: {}\n\n**Answer:** {}\n\n",
                entry.number,
                escape_markdown(&entry.question),
                escape_markdown(&entry.answer)
            ));
        }
        out
    }
}

const MARKDOWN_SPECIAL: &[char] = &[
    '\\', '`', '*', '_', '{', '}', '[', ']', '(', ')', '<', '>', '#', '+', '-', '.', '!', '|',
    '~', '^', '$', '&', '@', '=', ':',
];

/// Backslash-escape markdown metacharacters and keep multi-line text inside
/// one paragraph using hard line breaks.
fn escape_markdown(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            let mut escaped = String::with_capacity(line.len());
            for c in line.chars() {
                if MARKDOWN_SPECIAL.contains(&c) {
                    escaped.push('\\');
                }
                escaped.push(c);
            }
            escaped
        })
        .collect::<Vec<_>>()
        .join("\\\n")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Markdown,
    Pdf,
}

impl ExportFormat {
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Markdown => "text/markdown; charset=utf-8",
            Self::Pdf => "application/pdf",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Markdown => "md",
            Self::Pdf => "pdf",
        }
    }
}

/// Bytes of an exported report plus how to label them.
#[derive(Debug, Clone)]
pub struct ExportedDocument {
    pub format: ExportFormat,
    pub bytes: Vec<u8>,
}

impl ExportedDocument {
    /// Suggested download name, e.g. `assessment.pdf`.
    pub fn file_name(&self) -> String {
        format!("assessment.{}", self.format.extension())
    }
}

/// Turns a report into a downloadable document.
#[async_trait]
pub trait ReportExporter: Send + Sync {
    fn format(&self) -> ExportFormat;

    async fn export(&self, report: &AssessmentReport) -> Result<ExportedDocument, ExportError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownExporter;

#[async_trait]
impl ReportExporter for MarkdownExporter {
    fn format(&self) -> ExportFormat {
        ExportFormat::Markdown
    }

    async fn export(&self, report: &AssessmentReport) -> Result<ExportedDocument, ExportError> {
        Ok(ExportedDocument {
            format: ExportFormat::Markdown,
            bytes: report.render_markdown().into_bytes(),
        })
    }
}

/// PDF export through an external `pandoc` install.
#[derive(Debug, Clone)]
pub struct PandocPdfExporter {
    /// Falls back to `pandoc` on `PATH`.
    pandoc_path: Option<String>,
    timeout: Duration,
}

impl Default for PandocPdfExporter {
    fn default() -> Self {
        Self::new()
    }
}

impl PandocPdfExporter {
    pub fn new() -> Self {
        Self {
            pandoc_path: None,
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_pandoc_path(mut self, path: impl Into<String>) -> Self {
        self.pandoc_path = Some(path.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn pandoc_command(&self) -> &str {
        self.pandoc_path.as_deref().unwrap_or("pandoc")
    }

    async fn pandoc_available(&self) -> bool {
        Command::new(self.pandoc_command())
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map(|status| status.success())
            .unwrap_or(false)
    }
}

#[async_trait]
impl ReportExporter for PandocPdfExporter {
    fn format(&self) -> ExportFormat {
        ExportFormat::Pdf
    }

    async fn export(&self, report: &AssessmentReport) -> Result<ExportedDocument, ExportError> {
        if !self.pandoc_available().await {
            return Err(ExportError::ServiceUnavailable(format!(
                "'{}' not found; PDF export requires pandoc",
                self.pandoc_command()
            )));
        }

        let mut child = Command::new(self.pandoc_command())
            .args(["-f", "markdown-raw_tex-raw_html", "-t", "pdf", "-o", "-"])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ExportError::PdfConversionFailed(format!("failed to start pandoc: {e}")))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(report.render_markdown().as_bytes())
                .await
                .map_err(|e| {
                    ExportError::PdfConversionFailed(format!("failed to write to pandoc: {e}"))
                })?;
        }

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| ExportError::Timeout(self.timeout.as_secs()))??;

        if !output.status.success() {
            return Err(ExportError::PdfConversionFailed(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }

        tracing::info!(bytes = output.stdout.len(), "Rendered assessment PDF");
        Ok(ExportedDocument {
            format: ExportFormat::Pdf,
            bytes: output.stdout,
        })
    }
}

/// Exporter producing `format`. PDF conversion is bounded by `timeout`.
pub fn exporter_for(format: ExportFormat, timeout: Duration) -> Arc<dyn ReportExporter> {
    match format {
        ExportFormat::Markdown => Arc::new(MarkdownExporter),
        ExportFormat::Pdf => Arc::new(PandocPdfExporter::new().with_timeout(timeout)),
    }
}
