//! Stdin/stdout REPL for running one screening session locally.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use uuid::Uuid;

use crate::screening::dispatcher::EXIT_COMMANDS;
use crate::screening::report::NOT_PROVIDED;
use crate::screening::{
    CandidateProfile, ExportedDocument, ProfileField, SCALAR_FIELDS, ScreeningService,
    SentimentSummary,
};

/// A single-candidate terminal session.
pub struct CliSession {
    service: Arc<ScreeningService>,
    report_dir: PathBuf,
}

impl CliSession {
    pub fn new(service: Arc<ScreeningService>, report_dir: impl Into<PathBuf>) -> Self {
        Self {
            service,
            report_dir: report_dir.into(),
        }
    }

    /// Run against the process's stdin and stdout.
    pub async fn run(&self) -> anyhow::Result<()> {
        let stdin = BufReader::new(tokio::io::stdin());
        self.run_with(stdin, tokio::io::stdout()).await
    }

    /// Drive the session from `input` until EOF, an exit command, or
    /// completion of the assessment.
    pub async fn run_with<R, W>(&self, input: R, mut output: W) -> anyhow::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let opened = self.service.initialize_conversation().await;
        let id = opened.session_id;
        write_block(&mut output, &opened.reply).await?;

        let mut lines = input.lines();
        while let Some(line) = lines.next_line().await? {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let outcome = self.service.submit_turn(id, line).await?;
            write_block(&mut output, &outcome.reply).await?;

            if EXIT_COMMANDS.contains(&line.to_lowercase().as_str()) {
                break;
            }
            if outcome.complete {
                self.finish(id, &mut output).await?;
                break;
            }
        }

        self.service.remove(id).await?;
        Ok(())
    }

    async fn finish<W: AsyncWrite + Unpin>(&self, id: Uuid, output: &mut W) -> anyhow::Result<()> {
        let snapshot = self.service.snapshot(id).await?;
        write_block(output, &render_profile(&snapshot.candidate_data)).await?;
        let summary = self.service.summarize(id).await?;
        write_block(output, &render_summary(&summary)).await?;

        match self.service.export_report(id).await {
            Ok(doc) => {
                let path = write_report(&self.report_dir, id, &doc).await?;
                tracing::info!(session_id = %id, path = %path.display(), "Wrote assessment report");
                write_block(output, &format!("Assessment saved to {}", path.display())).await?;
            }
            Err(e) => {
                tracing::warn!(session_id = %id, error = %e, "Could not export assessment report");
                write_block(output, &format!("Could not export the assessment: {e}")).await?;
            }
        }
        Ok(())
    }
}

async fn write_block<W: AsyncWrite + Unpin>(output: &mut W, text: &str) -> std::io::Result<()> {
    output.write_all(format!("\n{text}\n\n").as_bytes()).await?;
    output.flush().await
}

/// Collected profile, one `Label: value` line per field.
pub fn render_profile(profile: &CandidateProfile) -> String {
    let mut out = String::from("Candidate Profile");
    for field in SCALAR_FIELDS {
        push_profile_line(&mut out, field, profile.get(field).unwrap_or(NOT_PROVIDED));
    }
    let stack = profile
        .tech_stack
        .as_ref()
        .map(|techs| techs.join(", "))
        .unwrap_or_else(|| NOT_PROVIDED.to_string());
    push_profile_line(&mut out, ProfileField::TechStack, &stack);
    out
}

fn push_profile_line(out: &mut String, field: ProfileField, value: &str) {
    let label = field.display_name();
    let mut chars = label.chars();
    let capitalized: String = chars
        .next()
        .map(|c| c.to_uppercase().chain(chars).collect())
        .unwrap_or_default();
    out.push_str(&format!("\n{capitalized}: {value}"));
}

/// Human-readable end-of-interview summary.
pub fn render_summary(summary: &SentimentSummary) -> String {
    let mut out = String::from("Conversation Summary\n");
    out.push_str(&format!("Total Interactions: {}\n", summary.total_interactions));
    out.push_str(&format!(
        "Sentiment: {} positive, {} negative, {} neutral",
        summary.sentiment_counts.positive,
        summary.sentiment_counts.negative,
        summary.sentiment_counts.neutral
    ));
    if let (Some(average), Some(tone)) = (summary.average_sentiment, summary.overall_tone) {
        out.push_str(&format!("\nAverage Sentiment: {average:.2}\nOverall Tone: {tone}"));
    }
    out
}

/// Write `doc` under `dir` as `assessment-<session>.<ext>`.
pub async fn write_report(dir: &Path, id: Uuid, doc: &ExportedDocument) -> std::io::Result<PathBuf> {
    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(format!("assessment-{id}.{}", doc.format.extension()));
    tokio::fs::write(&path, &doc.bytes).await?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::error::{LlmError, SentimentError};
    use crate::screening::sentiment::{SentimentCounts, Tone};
    use crate::screening::{
        Collaborators, Interviewer, MarkdownExporter, Relevance, SentimentAnalyzer,
        SentimentLabel, SentimentScore,
    };

    struct Templates;

    #[async_trait]
    impl Interviewer for Templates {
        async fn generate_questions(
            &self,
            _tech_stack: &[String],
            _years_experience: &str,
            _desired_position: &str,
        ) -> Result<String, LlmError> {
            Err(LlmError::RequestFailed {
                provider: "stub".into(),
                reason: "offline".into(),
            })
        }

        async fn check_relevance(
            &self,
            _q: &str,
            _query: &str,
            _recent_dialogue: &str,
        ) -> Result<Relevance, LlmError> {
            Ok(Relevance::Irrelevant)
        }

        async fn revise_question(
            &self,
            q: &str,
            _query: &str,
            _recent_dialogue: &str,
        ) -> Result<String, LlmError> {
            Ok(q.to_string())
        }
    }

    struct Upbeat;

    #[async_trait]
    impl SentimentAnalyzer for Upbeat {
        async fn classify(&self, _text: &str) -> Result<SentimentScore, SentimentError> {
            Ok(SentimentScore {
                label: SentimentLabel::Positive,
                score: 0.8,
            })
        }
    }

    fn session(dir: &Path) -> CliSession {
        let collaborators =
            Collaborators::new(Arc::new(Templates), Arc::new(Upbeat), Duration::from_secs(1));
        let service = ScreeningService::new(collaborators, Arc::new(MarkdownExporter));
        CliSession::new(Arc::new(service), dir)
    }

    #[tokio::test]
    async fn full_session_writes_report() {
        let dir = tempfile::tempdir().unwrap();
        let cli = session(dir.path());
        let script = "start\nLinus\nlinus@example.com\n+1 555 010 0199\n30\nMaintainer\nPortland\n\nC, Git\n\
                      first answer\nsecond answer\nthird answer\nfourth answer\nfifth answer\nignored\n";
        let mut out = Vec::new();
        cli.run_with(script.as_bytes(), &mut out).await.unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Question 5:"));
        assert!(text.contains("Candidate Profile\nFull name: Linus\nEmail address: linus@example.com"));
        assert!(text.contains("Years of professional experience: 30"));
        assert!(text.contains("Tech stack: C, Git"));
        assert!(text.contains("Total Interactions:"));
        assert!(text.contains("Overall Tone: Positive"));
        assert!(text.contains("Assessment saved to"));

        let files: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(files.len(), 1);
        let report = std::fs::read_to_string(files[0].as_ref().unwrap().path()).unwrap();
        assert!(report.contains("## Question 1: What experience do you have with C?"));
        assert!(report.contains("**Answer:** fifth answer"));
        assert!(cli.service.store().is_empty().await);
    }

    #[tokio::test]
    async fn exit_stops_the_loop() {
        let dir = tempfile::tempdir().unwrap();
        let cli = session(dir.path());
        let mut out = Vec::new();
        cli.run_with("start\nquit\nLinus\n".as_bytes(), &mut out)
            .await
            .unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("We'll be in touch soon!"));
        assert!(!text.contains("What is your email address?"));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn profile_marks_missing_fields() {
        let profile = CandidateProfile {
            full_name: Some("Grace Hopper".into()),
            current_location: Some("Arlington".into()),
            ..CandidateProfile::default()
        };
        let text = render_profile(&profile);
        assert_eq!(text.lines().count(), 1 + SCALAR_FIELDS.len() + 1);
        assert!(text.contains("Full name: Grace Hopper"));
        assert!(text.contains(&format!("Phone number: {NOT_PROVIDED}")));
        assert!(text.contains("Current location: Arlington"));
        assert!(text.ends_with(&format!("Tech stack: {NOT_PROVIDED}")));
    }

    #[test]
    fn summary_without_scores_omits_tone() {
        let summary = SentimentSummary {
            total_interactions: 4,
            sentiment_counts: SentimentCounts::default(),
            average_sentiment: None,
            overall_tone: None,
        };
        let text = render_summary(&summary);
        assert!(text.contains("Total Interactions: 4"));
        assert!(!text.contains("Overall Tone"));

        let scored = SentimentSummary {
            average_sentiment: Some(0.5825),
            overall_tone: Some(Tone::Neutral),
            ..summary
        };
        assert!(render_summary(&scored).contains("Average Sentiment: 0.58\nOverall Tone: Neutral"));
    }
}
