//! pdfsift server
//!
//! Upload a PDF, search its text and download the result as a report.
//!
//! - `POST /upload`: extract text and images, refine the search term
//!   (spelling correction and synonyms), return the matching content
//! - `POST /generate_pdf`, `POST /generate_docx`: render filtered content
//!   and extracted images as a downloadable report
//! - `POST /extract`: short extractive summary of a PDF
//!
//! Spelling and synonym resources are loaded once at startup and shared
//! read-only between requests.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use clap::Parser;
use sift_search::{ResourcePaths, SearchResources};
use tower::ServiceBuilder;
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod api;
mod error;
mod state;
mod storage;
mod summary;

use api::{
    handle_extract, handle_generate_docx, handle_generate_pdf, handle_health, handle_upload,
};
use state::AppState;
use storage::Directories;
use summary::FrequencySummarizer;

/// Command-line arguments for the sift server; every flag can also come
/// from the environment or a `.env` file
#[derive(Parser, Debug)]
#[command(name = "sift-server")]
#[command(about = "Extract, search and report on PDF documents")]
struct Args {
    /// Port to listen on
    #[arg(short, long, env = "SIFT_PORT", default_value = "5000")]
    port: u16,

    /// Host address to bind to
    #[arg(long, env = "SIFT_HOST", default_value = "0.0.0.0")]
    host: String,

    /// Where uploads are staged while being processed
    #[arg(long, env = "SIFT_UPLOAD_DIR", default_value = "uploads")]
    upload_dir: PathBuf,

    /// Where generated reports are written
    #[arg(long, env = "SIFT_OUTPUT_DIR", default_value = "outputs")]
    output_dir: PathBuf,

    /// Where extracted images are written, one subdirectory per upload
    #[arg(long, env = "SIFT_IMAGE_DIR", default_value = "images")]
    image_dir: PathBuf,

    /// SymSpell frequency dictionary (`word count` per line)
    #[arg(long, env = "SIFT_DICTIONARY")]
    dictionary: Option<PathBuf>,

    /// Word-frequency list for first-stage correction (defaults to the dictionary)
    #[arg(long, env = "SIFT_LANGUAGE_MODEL")]
    language_model: Option<PathBuf>,

    /// Synonym lexicon, one comma-separated sense group per line
    #[arg(long, env = "SIFT_LEXICON")]
    lexicon: Option<PathBuf>,

    /// Maximum upload size in megabytes
    #[arg(long, env = "SIFT_MAX_UPLOAD_MB", default_value = "32")]
    max_upload_mb: usize,

    /// Sentences kept by the /extract summary
    #[arg(long, env = "SIFT_SUMMARY_SENTENCES", default_value = "3")]
    summary_sentences: usize,

    /// Rate limit: requests per second per IP
    #[arg(long, env = "SIFT_RATE_LIMIT", default_value = "10")]
    rate_limit: u32,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn resource_paths(&self) -> ResourcePaths {
        ResourcePaths {
            dictionary: self.dictionary.clone(),
            language_model: self.language_model.clone(),
            lexicon: self.lexicon.clone(),
        }
    }

    fn directories(&self) -> Directories {
        Directories {
            uploads: self.upload_dir.clone(),
            outputs: self.output_dir.clone(),
            images: self.image_dir.clone(),
        }
    }
}

/// All routes and shared middleware; rate limiting is added in `main`
pub fn build_router(state: AppState, max_upload_bytes: usize) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health))
        .route("/upload", post(handle_upload))
        .route("/generate_pdf", post(handle_generate_pdf))
        .route("/generate_docx", post(handle_generate_docx))
        .route("/extract", post(handle_extract))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let log_level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting sift server on {}:{}", args.host, args.port);

    let dirs = args.directories();
    dirs.create_all()
        .context("Failed to create working directories")?;

    let paths = args.resource_paths();
    let resources = tokio::task::spawn_blocking(move || SearchResources::load(&paths)).await?;

    let state = AppState::new(
        resources,
        FrequencySummarizer::new(args.summary_sentences),
        dirs,
    );

    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(args.rate_limit.max(1).into())
            .burst_size(args.rate_limit.max(1) * 2)
            .finish()
            .context("Invalid rate limit configuration")?,
    );

    let app = build_router(state, args.max_upload_mb * 1024 * 1024).layer(GovernorLayer {
        config: governor_conf,
    });

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("Server listening on http://{}", addr);
    info!("Rate limit: {} requests/second per IP", args.rate_limit);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
