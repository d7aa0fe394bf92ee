//! Configuration types.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

use crate::error::ConfigError;
use crate::llm::{LlmBackend, LlmConfig};
use crate::screening::report::ExportFormat;

/// Default Anthropic model when `TALENTBOT_MODEL` is unset.
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";

/// Default OpenAI model when `TALENTBOT_MODEL` is unset.
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o";

/// How the binary exposes the conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Interactive stdin/stdout session.
    Cli,
    /// REST API serving many independent sessions.
    Http,
}

/// Sampling parameters for each collaborator call.
#[derive(Debug, Clone)]
pub struct InterviewerConfig {
    /// Temperature for question generation (wide, so questions vary).
    pub question_temperature: f32,
    /// Token budget for question generation.
    pub question_max_tokens: u32,
    /// Temperature for relevance checks and revisions.
    pub review_temperature: f32,
    /// Token budget for relevance checks and revisions.
    pub review_max_tokens: u32,
    /// Temperature for sentiment classification.
    pub sentiment_temperature: f32,
}

impl Default for InterviewerConfig {
    fn default() -> Self {
        Self {
            question_temperature: 1.0,
            question_max_tokens: 1024,
            review_temperature: 0.3,
            review_max_tokens: 256,
            sentiment_temperature: 0.0,
        }
    }
}

/// Runtime configuration for the screening service.
#[derive(Debug, Clone)]
pub struct ScreeningConfig {
    pub llm: LlmConfig,
    pub mode: RunMode,
    pub http_port: u16,
    /// Upper bound on any single collaborator call.
    pub collaborator_timeout: Duration,
    /// HTTP sessions untouched for this long are evicted.
    pub session_ttl: Duration,
    /// Directory for daily-rolling log files. Stderr only when unset.
    pub log_dir: Option<PathBuf>,
    /// Where the CLI writes finished assessment reports.
    pub report_dir: PathBuf,
    /// Document type produced by report export.
    pub report_format: ExportFormat,
    pub interviewer: InterviewerConfig,
}

impl ScreeningConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let backend = match lookup("TALENTBOT_LLM_BACKEND")
            .map(|s| s.trim().to_lowercase())
            .as_deref()
        {
            None | Some("") | Some("anthropic") => LlmBackend::Anthropic,
            Some("openai") => LlmBackend::OpenAi,
            Some(other) => {
                return Err(ConfigError::InvalidValue {
                    key: "TALENTBOT_LLM_BACKEND".to_string(),
                    message: format!("expected 'anthropic' or 'openai', got '{other}'"),
                });
            }
        };

        let (key_var, default_model) = match backend {
            LlmBackend::Anthropic => ("ANTHROPIC_API_KEY", DEFAULT_MODEL),
            LlmBackend::OpenAi => ("OPENAI_API_KEY", DEFAULT_OPENAI_MODEL),
        };
        let api_key = lookup(key_var)
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar(key_var.to_string()))?;

        let model = lookup("TALENTBOT_MODEL")
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| default_model.to_string());

        let mode = match lookup("TALENTBOT_MODE").as_deref().map(str::trim) {
            None | Some("") | Some("cli") => RunMode::Cli,
            Some("http") => RunMode::Http,
            Some(other) => {
                return Err(ConfigError::InvalidValue {
                    key: "TALENTBOT_MODE".to_string(),
                    message: format!("expected 'cli' or 'http', got '{other}'"),
                });
            }
        };

        let http_port: u16 = lookup("TALENTBOT_HTTP_PORT")
            .and_then(|s| s.parse().ok())
            .unwrap_or(8080);

        let timeout_secs: u64 = lookup("TALENTBOT_COLLABORATOR_TIMEOUT_SECS")
            .and_then(|s| s.parse().ok())
            .filter(|secs| *secs > 0)
            .unwrap_or(60);

        let ttl_secs: u64 = lookup("TALENTBOT_SESSION_TTL_SECS")
            .and_then(|s| s.parse().ok())
            .filter(|secs| *secs > 0)
            .unwrap_or(1800);

        let log_dir = lookup("TALENTBOT_LOG_DIR")
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from);

        let report_dir = lookup("TALENTBOT_REPORT_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./reports"));

        let report_format = match lookup("TALENTBOT_REPORT_FORMAT")
            .map(|s| s.trim().to_lowercase())
            .as_deref()
        {
            None | Some("") | Some("markdown") | Some("md") => ExportFormat::Markdown,
            Some("pdf") => ExportFormat::Pdf,
            Some(other) => {
                return Err(ConfigError::InvalidValue {
                    key: "TALENTBOT_REPORT_FORMAT".to_string(),
                    message: format!("expected 'markdown' or 'pdf', got '{other}'"),
                });
            }
        };

        Ok(Self {
            llm: LlmConfig {
                backend,
                api_key: SecretString::from(api_key),
                model,
            },
            mode,
            http_port,
            collaborator_timeout: Duration::from_secs(timeout_secs),
            session_ttl: Duration::from_secs(ttl_secs),
            log_dir,
            report_dir,
            report_format,
            interviewer: InterviewerConfig::default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn missing_api_key_is_an_error() {
        let err = ScreeningConfig::from_lookup(lookup_from(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref k) if k == "ANTHROPIC_API_KEY"));
    }

    #[test]
    fn defaults_apply() {
        let config =
            ScreeningConfig::from_lookup(lookup_from(&[("ANTHROPIC_API_KEY", "sk-test")])).unwrap();
        assert_eq!(config.llm.model, DEFAULT_MODEL);
        assert_eq!(config.mode, RunMode::Cli);
        assert_eq!(config.http_port, 8080);
        assert_eq!(config.collaborator_timeout, Duration::from_secs(60));
        assert_eq!(config.session_ttl, Duration::from_secs(1800));
        assert!(config.log_dir.is_none());
        assert_eq!(config.report_dir, PathBuf::from("./reports"));
        assert_eq!(config.llm.backend, LlmBackend::Anthropic);
        assert_eq!(config.report_format, ExportFormat::Markdown);
    }

    #[test]
    fn openai_backend_uses_its_own_key() {
        let config = ScreeningConfig::from_lookup(lookup_from(&[
            ("TALENTBOT_LLM_BACKEND", "OpenAI"),
            ("OPENAI_API_KEY", "sk-openai"),
        ]))
        .unwrap();
        assert_eq!(config.llm.backend, LlmBackend::OpenAi);
        assert_eq!(config.llm.model, DEFAULT_OPENAI_MODEL);

        let err = ScreeningConfig::from_lookup(lookup_from(&[
            ("TALENTBOT_LLM_BACKEND", "openai"),
            ("ANTHROPIC_API_KEY", "sk-ant"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref k) if k == "OPENAI_API_KEY"));
    }

    #[test]
    fn unknown_backend_rejected() {
        let err = ScreeningConfig::from_lookup(lookup_from(&[
            ("ANTHROPIC_API_KEY", "sk-test"),
            ("TALENTBOT_LLM_BACKEND", "gemini"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "TALENTBOT_LLM_BACKEND"));
    }

    #[test]
    fn report_format_selection() {
        let config = ScreeningConfig::from_lookup(lookup_from(&[
            ("ANTHROPIC_API_KEY", "sk-test"),
            ("TALENTBOT_REPORT_FORMAT", "PDF"),
        ]))
        .unwrap();
        assert_eq!(config.report_format, ExportFormat::Pdf);

        let err = ScreeningConfig::from_lookup(lookup_from(&[
            ("ANTHROPIC_API_KEY", "sk-test"),
            ("TALENTBOT_REPORT_FORMAT", "docx"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "TALENTBOT_REPORT_FORMAT"));
    }

    #[test]
    fn unparseable_numbers_fall_back() {
        let config = ScreeningConfig::from_lookup(lookup_from(&[
            ("ANTHROPIC_API_KEY", "sk-test"),
            ("TALENTBOT_HTTP_PORT", "not-a-port"),
            ("TALENTBOT_COLLABORATOR_TIMEOUT_SECS", "0"),
            ("TALENTBOT_SESSION_TTL_SECS", "-5"),
        ]))
        .unwrap();
        assert_eq!(config.http_port, 8080);
        assert_eq!(config.collaborator_timeout, Duration::from_secs(60));
        assert_eq!(config.session_ttl, Duration::from_secs(1800));
    }

    #[test]
    fn http_mode_and_overrides() {
        let config = ScreeningConfig::from_lookup(lookup_from(&[
            ("ANTHROPIC_API_KEY", "sk-test"),
            ("TALENTBOT_MODE", "http"),
            ("TALENTBOT_HTTP_PORT", "9090"),
            ("TALENTBOT_MODEL", "claude-3-5-haiku-latest"),
            ("TALENTBOT_LOG_DIR", "/tmp/talentbot-logs"),
            ("TALENTBOT_SESSION_TTL_SECS", "600"),
        ]))
        .unwrap();
        assert_eq!(config.session_ttl, Duration::from_secs(600));
        assert_eq!(config.mode, RunMode::Http);
        assert_eq!(config.http_port, 9090);
        assert_eq!(config.llm.model, "claude-3-5-haiku-latest");
        assert_eq!(config.log_dir, Some(PathBuf::from("/tmp/talentbot-logs")));
    }

    #[test]
    fn unknown_mode_rejected() {
        let err = ScreeningConfig::from_lookup(lookup_from(&[
            ("ANTHROPIC_API_KEY", "sk-test"),
            ("TALENTBOT_MODE", "gui"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }
}
