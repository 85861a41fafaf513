//! PDF Overlay Web - HTTP API that drives the overlay viewer.

mod helpers;
mod routes;
mod state;

use anyhow::{Context, Result};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, header},
    routing::{get, post},
};
use clap::Parser;
use pdf_overlay_core::{AppConfig, OverlayFont, ProjectStore, create_translator};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use state::AppState;

#[derive(Parser, Debug)]
#[command(name = "pdf-overlay-web")]
#[command(author, version, about = "PDF Overlay Web Server", long_about = None)]
struct Args {
    /// Host to bind to
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Port to bind to
    #[arg(short, long, default_value = "3000")]
    port: u16,

    /// Project store directory
    #[arg(long, env = "PDF_OVERLAY_STORE")]
    store: Option<PathBuf>,

    /// Config file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Font for overlay text (defaults to a system font)
    #[arg(long, env = "PDF_OVERLAY_FONT")]
    font: Option<PathBuf>,

    /// OpenAI API base URL (selects the AI backend)
    #[arg(long, env = "OPENAI_API_BASE")]
    api_base: Option<String>,

    /// OpenAI API key
    #[arg(long, env = "OPENAI_API_KEY")]
    api_key: Option<String>,

    /// Model name for OpenAI-compatible API
    #[arg(long, env = "OPENAI_MODEL")]
    model: Option<String>,

    /// Verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn build_config(args: &Args) -> Result<AppConfig> {
    let mut config = if let Some(path) = &args.config {
        AppConfig::from_file(path).context("Failed to load config file")?
    } else {
        AppConfig::load()
    };

    if let Some(api_base) = &args.api_base {
        config.translator = pdf_overlay_core::TranslatorConfig::openai(
            api_base.clone(),
            args.api_key.clone(),
            args.model.clone().unwrap_or_else(|| config.translator.model.clone()),
        );
    }
    if args.font.is_some() {
        config.overlay.font_path.clone_from(&args.font);
    }
    Ok(config)
}

fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            "/api/projects",
            post(routes::create_project).get(routes::list_projects),
        )
        .route(
            "/api/projects/{id}",
            axum::routing::delete(routes::delete_project),
        )
        .route(
            "/api/projects/{id}/translate",
            post(routes::start_pass).get(routes::pass_status),
        )
        .route("/api/projects/{id}/pages", get(routes::list_pages))
        .route(
            "/api/projects/{id}/viewer",
            get(routes::get_viewer).post(routes::update_viewer),
        )
        .route("/api/projects/{id}/pointer", post(routes::pointer_event))
        .route("/api/projects/{id}/frame", get(routes::get_frame))
        .route(
            "/api/projects/{id}/batch-edit",
            post(routes::begin_batch)
                .put(routes::update_batch)
                .delete(routes::discard_batch),
        )
        .route("/api/projects/{id}/export", get(routes::export_pdf))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(DefaultBodyLimit::max(300 * 1024 * 1024)) // 300MB limit for uploads
                .layer(CompressionLayer::new())
                // Viewer state changes on every request
                .layer(SetResponseHeaderLayer::if_not_present(
                    header::CACHE_CONTROL,
                    HeaderValue::from_static("no-store, max-age=0"),
                )),
        )
        .with_state(state)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (before parsing args so env vars are available)
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let default_level = match args.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{default_level},sled=warn")));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();

    let config = build_config(&args)?;

    // Opens the store - fails fast if another process holds it
    let store_path = args
        .store
        .clone()
        .unwrap_or_else(|| config.store.resolved_path());
    let store = ProjectStore::open(&store_path)
        .with_context(|| format!("Failed to open store {}", store_path.display()))?;

    let translator =
        create_translator(&config.translator).context("Failed to initialize translator")?;
    let font = OverlayFont::load(config.overlay.font_path.as_deref())
        .context("No usable font; pass --font or set overlay.font_path")?;

    let state = Arc::new(AppState::new(config, store, translator, font));

    // Spawn background task for idle viewer cleanup (runs every 5 minutes)
    let cleanup_state = Arc::clone(&state);
    tokio::spawn(async move {
        let cleanup_interval = Duration::from_secs(5 * 60);
        loop {
            tokio::time::sleep(cleanup_interval).await;
            let dropped = cleanup_state.cleanup_idle_viewers().await;
            if dropped > 0 {
                info!("Dropped {} idle viewer(s)", dropped);
            }
        }
    });

    let app = router(state);

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
