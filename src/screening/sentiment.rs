//! Sentiment scoring of candidate answers and post-hoc aggregation over the
//! interaction log.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::InterviewerConfig;
use crate::error::SentimentError;
use crate::llm::{ChatMessage, CompletionRequest, LlmProvider};

use super::prompts;
use super::transcript::InteractionLog;

/// Prefix of sentiment lines in the interaction log.
pub const SENTIMENT_PREFIX: &str = "Sentiment:";

/// Inputs shorter than this are not worth classifying.
const MIN_SENTIMENT_CHARS: usize = 3;

/// Classifier label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SentimentLabel {
    Positive,
    Negative,
    Neutral,
    Error,
}

impl std::fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Positive => "POSITIVE",
            Self::Negative => "NEGATIVE",
            Self::Neutral => "NEUTRAL",
            Self::Error => "ERROR",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for SentimentLabel {
    type Err = SentimentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "POSITIVE" => Ok(Self::Positive),
            "NEGATIVE" => Ok(Self::Negative),
            "NEUTRAL" => Ok(Self::Neutral),
            "ERROR" => Ok(Self::Error),
            other => Err(SentimentError::UnknownLabel(other.to_string())),
        }
    }
}

/// A label with its confidence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SentimentScore {
    pub label: SentimentLabel,
    pub score: f64,
}

impl SentimentScore {
    pub fn neutral() -> Self {
        Self {
            label: SentimentLabel::Neutral,
            score: 0.0,
        }
    }

    pub fn error() -> Self {
        Self {
            label: SentimentLabel::Error,
            score: 0.0,
        }
    }

    /// Interaction-log line, e.g. `Sentiment: POSITIVE (0.91)`.
    pub fn log_line(&self) -> String {
        format!("{SENTIMENT_PREFIX} {} ({:.2})", self.label, self.score)
    }
}

/// Black-box text classifier.
#[async_trait]
pub trait SentimentAnalyzer: Send + Sync {
    async fn classify(&self, text: &str) -> Result<SentimentScore, SentimentError>;
}

/// Score `text`, never failing.
///
/// Very short inputs are `NEUTRAL 0.0`; classifier errors and timeouts are
/// `ERROR 0.0`.
pub async fn analyze_sentiment(
    analyzer: &dyn SentimentAnalyzer,
    text: &str,
    limit: Duration,
) -> SentimentScore {
    if text.chars().count() < MIN_SENTIMENT_CHARS {
        return SentimentScore::neutral();
    }
    match tokio::time::timeout(limit, analyzer.classify(text)).await {
        Ok(Ok(score)) => score,
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "Sentiment classification failed");
            SentimentScore::error()
        }
        Err(_) => {
            tracing::warn!(after = ?limit, "Sentiment classification timed out");
            SentimentScore::error()
        }
    }
}

/// Wire shape of the classifier's JSON reply.
#[derive(Debug, Deserialize)]
struct RawSentiment {
    label: String,
    score: f64,
}

/// `SentimentAnalyzer` that asks an `LlmProvider` for a JSON verdict.
pub struct LlmSentimentAnalyzer {
    llm: Arc<dyn LlmProvider>,
    temperature: f32,
}

impl LlmSentimentAnalyzer {
    pub fn new(llm: Arc<dyn LlmProvider>, config: &InterviewerConfig) -> Self {
        Self {
            llm,
            temperature: config.sentiment_temperature,
        }
    }
}

#[async_trait]
impl SentimentAnalyzer for LlmSentimentAnalyzer {
    async fn classify(&self, text: &str) -> Result<SentimentScore, SentimentError> {
        let request = CompletionRequest::new(vec![
            ChatMessage::system(prompts::sentiment_prompt()),
            ChatMessage::user(text),
        ])
        .with_temperature(self.temperature)
        .with_max_tokens(64);

        let response = self.llm.complete(request).await?;
        let json = extract_json_object(&response.content);
        let raw: RawSentiment = serde_json::from_str(json)
            .map_err(|e| SentimentError::Unparseable(format!("{e}: {}", response.content)))?;

        Ok(SentimentScore {
            label: raw.label.parse()?,
            score: raw.score.clamp(0.0, 1.0),
        })
    }
}

/// Slice out the first `{...}` object from model output that may carry
/// markdown fences or prose.
fn extract_json_object(text: &str) -> &str {
    let trimmed = text.trim();
    match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(start), Some(end)) if end > start => &trimmed[start..=end],
        _ => trimmed,
    }
}

/// Counts per counted label.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SentimentCounts {
    pub positive: usize,
    pub negative: usize,
    pub neutral: usize,
}

/// Overall tone of the interview answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Tone {
    Positive,
    Negative,
    Neutral,
}

impl Tone {
    /// `> 0.6` is positive, then `< 0.4` is negative, anything else neutral.
    pub fn from_average(average: f64) -> Self {
        if average > 0.6 {
            Self::Positive
        } else if average < 0.4 {
            Self::Negative
        } else {
            Self::Neutral
        }
    }
}

impl std::fmt::Display for Tone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Positive => write!(f, "Positive"),
            Self::Negative => write!(f, "Negative"),
            Self::Neutral => write!(f, "Neutral"),
        }
    }
}

/// End-of-interview summary.
#[derive(Debug, Clone, Serialize)]
pub struct SentimentSummary {
    pub total_interactions: usize,
    pub sentiment_counts: SentimentCounts,
    /// `None` when no sentiment line carried a score.
    pub average_sentiment: Option<f64>,
    pub overall_tone: Option<Tone>,
}

/// Parse one `Sentiment: LABEL (score)` line into its label and score.
///
/// Either part may be missing or malformed independently.
fn parse_sentiment_line(line: &str) -> Option<(Option<&str>, Option<f64>)> {
    let rest = line.strip_prefix(SENTIMENT_PREFIX)?;
    let segment = rest.split(':').next().unwrap_or_default();
    let label = segment.split_whitespace().next();
    let score = segment
        .split_once('(')
        .map(|(_, after)| after.split(')').next().unwrap_or_default())
        .and_then(|s| s.trim().parse::<f64>().ok());
    Some((label, score))
}

/// Aggregate sentiment lines out of an interaction log.
pub fn summarize(log: &InteractionLog) -> SentimentSummary {
    let mut counts = SentimentCounts::default();
    let mut scores = Vec::new();

    for (label, score) in log.messages().filter_map(parse_sentiment_line) {
        match label {
            Some("POSITIVE") => counts.positive += 1,
            Some("NEGATIVE") => counts.negative += 1,
            Some("NEUTRAL") => counts.neutral += 1,
            _ => {}
        }
        scores.extend(score);
    }

    let average_sentiment = if scores.is_empty() {
        None
    } else {
        Some(scores.iter().sum::<f64>() / scores.len() as f64)
    };

    SentimentSummary {
        total_interactions: log.len(),
        sentiment_counts: counts,
        average_sentiment,
        overall_tone: average_sentiment.map(Tone::from_average),
    }
}
