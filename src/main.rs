use anyhow::Result;
use avatar_chat::http::{create_router, AppState};
use avatar_chat::llm::GeminiClient;
use avatar_chat::orchestrator::Orchestrator;
use avatar_chat::synthesis::{RenderQueueSynthesizer, SpeechSynthesizer};
use avatar_chat::Config;
use clap::Parser;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "avatar-chat", about = "Streaming avatar chat server")]
struct Args {
    /// Config file to load (path without extension)
    #[arg(long, default_value = "config/avatar-chat")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = Args::parse();
    let cfg = Config::load(&args.config)?;

    info!("{} starting", cfg.service.name);
    info!("Text generation model: {}", cfg.llm.model);
    info!("Render queue: {}", cfg.synthesis.endpoint);

    let generator = Arc::new(GeminiClient::new(cfg.llm.clone()));
    let synthesizer: Arc<dyn SpeechSynthesizer> =
        Arc::new(RenderQueueSynthesizer::new(cfg.synthesis.clone()));
    let orchestrator = Arc::new(Orchestrator::new(
        generator,
        synthesizer.clone(),
        cfg.llm.system_prompt.clone(),
    ));

    let app = create_router(AppState::new(orchestrator, synthesizer));

    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("HTTP server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
