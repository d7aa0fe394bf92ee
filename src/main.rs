use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use talentbot::cli::CliSession;
use talentbot::config::{RunMode, ScreeningConfig};
use talentbot::llm::create_provider;
use talentbot::screening::report::exporter_for;
use talentbot::screening::{
    Collaborators, LlmInterviewer, LlmSentimentAnalyzer, ScreeningService, screening_routes,
};

/// Stderr logging, plus a daily-rolling file when `TALENTBOT_LOG_DIR` is set.
fn init_tracing(config: &ScreeningConfig) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let (file_layer, guard) = match &config.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "talentbot.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_target(false)
                .with_ansi(false)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(file_layer)
        .init();

    guard
}

/// Periodically close HTTP sessions idle for longer than `ttl`.
fn spawn_idle_sweep(service: Arc<ScreeningService>, ttl: Duration) {
    let period = ttl.min(Duration::from_secs(60));
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let evicted = service.evict_idle(ttl).await;
            if evicted > 0 {
                tracing::debug!(evicted, "Idle session sweep");
            }
        }
    });
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = match ScreeningConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            eprintln!("  export ANTHROPIC_API_KEY=sk-ant-...  (or TALENTBOT_LLM_BACKEND=openai with OPENAI_API_KEY)");
            std::process::exit(1);
        }
    };

    let _log_guard = init_tracing(&config);

    let llm = create_provider(&config.llm).context("failed to create LLM provider")?;
    let collaborators = Collaborators::new(
        Arc::new(LlmInterviewer::new(Arc::clone(&llm), config.interviewer.clone())),
        Arc::new(LlmSentimentAnalyzer::new(Arc::clone(&llm), &config.interviewer)),
        config.collaborator_timeout,
    );
    let exporter = exporter_for(config.report_format, config.collaborator_timeout);
    let service = Arc::new(ScreeningService::new(collaborators, exporter));

    eprintln!("TalentBot v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Model: {} ({:?})", config.llm.model, config.llm.backend);
    eprintln!("   Report format: {}", config.report_format.extension());

    match config.mode {
        RunMode::Cli => {
            eprintln!("   Reports: {}", config.report_dir.display());
            eprintln!("   Type 'exit' to leave.\n");
            CliSession::new(service, config.report_dir.clone()).run().await?;
        }
        RunMode::Http => {
            spawn_idle_sweep(Arc::clone(&service), config.session_ttl);
            let app = screening_routes(service);
            let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.http_port))
                .await
                .with_context(|| format!("failed to bind port {}", config.http_port))?;
            eprintln!("   API: http://0.0.0.0:{}/api/sessions\n", config.http_port);
            tracing::info!(port = config.http_port, "Screening API started");
            axum::serve(listener, app).await?;
        }
    }

    Ok(())
}
