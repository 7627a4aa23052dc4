use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use tokio::io::BufReader;
use tokio::net::TcpListener;

use caregraph::application::services::RetrievalService;
use caregraph::infrastructure::observability::{TracingConfig, init_tracing};
use caregraph::presentation::cli::{render_analysis, run_repl};
use caregraph::presentation::state::{
    build_app_state, build_embedder, build_ingestion_service, build_model_services,
    build_vector_store,
};
use caregraph::presentation::{Environment, Settings, create_router};

#[derive(Parser)]
#[command(
    name = "caregraph",
    about = "Guideline-grounded medical Q&A and lab-report analysis",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the web UI and JSON API
    Serve {
        /// Bind address (overrides server.host)
        #[arg(long)]
        host: Option<String>,
        /// Port (overrides server.port)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Rebuild the vector index from the PDFs in the corpus folder
    Ingest {
        /// Corpus folder (overrides corpus.data_dir)
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },

    /// Ask questions interactively
    Chat,

    /// Read a lab-report image and cross-reference it with the guidelines
    Analyze {
        /// Path to a PNG, JPEG, WebP or GIF image
        image: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let environment = Environment::from_env().map_err(anyhow::Error::msg)?;
    let mut settings = Settings::load(environment).context("failed to load configuration")?;

    init_tracing(&TracingConfig::from_settings(&settings.logging, environment))
        .context("failed to initialise tracing")?;

    match cli.command {
        Command::Serve { host, port } => {
            if let Some(host) = host {
                settings.server.host = host;
            }
            if let Some(port) = port {
                settings.server.port = port;
            }
            serve(settings).await
        }
        Command::Ingest { data_dir } => {
            if let Some(data_dir) = data_dir {
                settings.corpus.data_dir = data_dir;
            }
            ingest(settings).await
        }
        Command::Chat => chat(settings).await,
        Command::Analyze { image } => analyze(settings, image).await,
    }
}

async fn serve(settings: Settings) -> anyhow::Result<()> {
    let state = build_app_state(&settings).await?;
    let router = create_router(state);

    let addr: SocketAddr = format!("{}:{}", settings.server.host, settings.server.port)
        .parse()
        .with_context(|| format!("invalid bind address {}", settings.server.host))?;

    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, index_dir = %settings.index.dir.display(), "Listening");
    axum::serve(listener, router).await?;

    Ok(())
}

async fn ingest(settings: Settings) -> anyhow::Result<()> {
    let embedder = build_embedder(&settings).await?;
    let vector_store = build_vector_store(&settings);
    let ingestion_service = build_ingestion_service(&settings, embedder, vector_store);

    let report = ingestion_service
        .ingest_directory(&settings.corpus.data_dir)
        .await?;

    for skipped in &report.files_skipped {
        println!("Skipped {}: {}", skipped.file, skipped.reason);
    }
    println!(
        "Indexed {} file(s) into {} chunks at {}",
        report.files_indexed.len(),
        report.chunk_count,
        settings.index.dir.display()
    );

    Ok(())
}

async fn retrieval_service(settings: &Settings) -> anyhow::Result<Arc<RetrievalService>> {
    let embedder = build_embedder(settings).await?;
    let retrieval_service = Arc::new(RetrievalService::new(
        embedder,
        build_vector_store(settings),
    ));

    if !retrieval_service.index_ready().await? {
        bail!(
            "vector index not found at {}; run `caregraph ingest` first",
            settings.index.dir.display()
        );
    }

    Ok(retrieval_service)
}

async fn chat(settings: Settings) -> anyhow::Result<()> {
    let retrieval_service = retrieval_service(&settings).await?;
    let (answer_service, _) = build_model_services(&settings, retrieval_service)?;

    println!("CareGraph is ready. Type `exit` to quit.");
    let mut stdout = tokio::io::stdout();
    run_repl(&answer_service, BufReader::new(tokio::io::stdin()), &mut stdout).await?;

    Ok(())
}

async fn analyze(settings: Settings, image: PathBuf) -> anyhow::Result<()> {
    let bytes = tokio::fs::read(&image)
        .await
        .with_context(|| format!("failed to read {}", image.display()))?;

    let retrieval_service = retrieval_service(&settings).await?;
    let (_, lab_report_service) = build_model_services(&settings, retrieval_service)?;

    let analysis = lab_report_service.analyze(&bytes).await?;
    println!("{}", render_analysis(&analysis));

    Ok(())
}
