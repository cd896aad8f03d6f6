//! Command-line surface: `serve`, `load`, `generate`.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use clap::{Args, Parser, Subcommand};
use sqlx::PgPool;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use crate::config::{Config, S3Config};
use crate::db::{create_pool, ensure_schema};
use crate::export::render_all;
use crate::generation::assembler::ResumeDocument;
use crate::generation::generator::GenerationConfig;
use crate::generation::pipeline::{
    run_pipeline, ExperienceLevel, GenerateRequest, Industry, PipelineOutcome, USAGE_INSTRUCTIONS,
};
use crate::llm_client::ModelClient;
use crate::resources::Resources;
use crate::retrieval::corpus::{load_snippets, IdStrategy, RESUME_SNIPPETS};
use crate::retrieval::embedder::EMBEDDING_DIM;
use crate::retrieval::store::InMemorySnippetStore;
use crate::routes::build_router;
use crate::state::AppState;

#[derive(Debug, Parser)]
#[command(name = "resume-rag", version, about = "Retrieval-augmented resume generator")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the HTTP API.
    Serve,
    /// Embed the built-in snippet corpus into the snippet store.
    Load(LoadArgs),
    /// Generate one resume and write TXT, PDF and DOCX exports.
    Generate(GenerateArgs),
}

#[derive(Debug, Args)]
pub struct LoadArgs {
    /// Empty the collection before loading.
    #[arg(long)]
    pub reset: bool,
    /// Assign sequential ids "0".."n-1" instead of content hashes.
    #[arg(long)]
    pub legacy_ids: bool,
}

#[derive(Debug, Args)]
pub struct GenerateArgs {
    /// Target job role, e.g. "Senior Python Developer".
    #[arg(long, default_value = "")]
    pub role: String,
    #[arg(long, value_enum)]
    pub experience_level: Option<ExperienceLevel>,
    #[arg(long, value_enum)]
    pub industry: Option<Industry>,
    #[arg(long, default_value = ".")]
    pub out_dir: PathBuf,
    /// Load the corpus into an in-memory store instead of using PostgreSQL.
    #[arg(long)]
    pub offline_store: bool,
}

pub async fn run(cli: Cli, config: Config) -> Result<()> {
    match cli.command {
        Command::Serve => serve(config).await,
        Command::Load(args) => load(config, args).await,
        Command::Generate(args) => generate(config, args).await,
    }
}

async fn serve(config: Config) -> Result<()> {
    let s3_config = config.require_s3()?.clone();

    let db = connect_database(&config).await?;
    let s3 = build_s3_client(&s3_config).await;
    info!("S3 client initialized (bucket: {})", s3_config.bucket);

    let resources = Resources::new(&config, model_client(&config), Some(db.clone()), redis_client(&config)?);

    let state = AppState {
        db,
        s3,
        s3_bucket: s3_config.bucket.clone(),
        resources: Arc::new(resources),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn load(config: Config, args: LoadArgs) -> Result<()> {
    let db = connect_database(&config).await?;
    let resources = Resources::new(&config, model_client(&config), Some(db), None);

    let embedder = resources.embedder().await?;
    let store = resources.snippet_store().await?;
    let strategy = if args.legacy_ids {
        IdStrategy::Sequential
    } else {
        IdStrategy::ContentHash
    };

    let report = load_snippets(
        RESUME_SNIPPETS,
        embedder.as_ref(),
        store.as_ref(),
        strategy,
        args.reset,
    )
    .await?;

    println!(
        "Loaded {} resume snippets into '{}' ({} already present, {} total)",
        report.inserted, report.collection, report.skipped, report.total_in_store
    );
    Ok(())
}

async fn generate(config: Config, args: GenerateArgs) -> Result<()> {
    let request = GenerateRequest {
        job_role: args.role.clone(),
        experience_level: args.experience_level,
        industry: args.industry,
    };

    if request.job_role.trim().is_empty() {
        print_instructions();
        return Ok(());
    }

    let resources = if args.offline_store {
        let store = Arc::new(InMemorySnippetStore::new(&config.snippet_collection, EMBEDDING_DIM));
        Resources::new(&config, model_client(&config), None, redis_client(&config)?).with_store(store)
    } else {
        let db = connect_database(&config).await?;
        Resources::new(&config, model_client(&config), Some(db), redis_client(&config)?)
    };

    let loaded = resources.loaded().await?;
    if args.offline_store {
        load_snippets(
            RESUME_SNIPPETS,
            loaded.embedder.as_ref(),
            loaded.store.as_ref(),
            IdStrategy::ContentHash,
            false,
        )
        .await?;
    }

    let outcome =
        match run_pipeline(&request, loaded.capabilities(), &GenerationConfig::default()).await? {
            PipelineOutcome::Generated(outcome) => outcome,
            PipelineOutcome::AwaitingInput => {
                print_instructions();
                return Ok(());
            }
        };

    println!("Detected skills: {}", outcome.detected_skills.join(", "));
    println!(
        "Retrieved {} snippets for query '{}'",
        outcome.rag_debug.retrieved_count, outcome.rag_debug.query
    );
    println!("Context preview: {}", outcome.rag_debug.context_preview);

    let written = write_exports(&args.out_dir, &outcome.document, &outcome.job_role)?;
    for path in written {
        println!("Wrote {}", path.display());
    }
    Ok(())
}

fn write_exports(
    out_dir: &Path,
    document: &ResumeDocument,
    job_role: &str,
) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create output directory {}", out_dir.display()))?;

    render_all(document, job_role)?
        .into_iter()
        .map(|artifact| {
            let path = out_dir.join(&artifact.filename);
            std::fs::write(&path, &artifact.bytes)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            Ok(path)
        })
        .collect()
}

/// Opens the pool and bootstraps the schema, so the `resumes` table exists
/// before the first request reaches it.
async fn connect_database(config: &Config) -> Result<PgPool> {
    let pool = create_pool(config.require_database_url()?).await?;
    ensure_schema(&pool)
        .await
        .context("Failed to bootstrap database schema")?;
    Ok(pool)
}

fn print_instructions() {
    for line in USAGE_INSTRUCTIONS {
        println!("{line}");
    }
}

fn model_client(config: &Config) -> ModelClient {
    ModelClient::new(&config.model_server_url)
}

fn redis_client(config: &Config) -> Result<Option<redis::Client>> {
    config
        .redis_url
        .as_deref()
        .map(|url| redis::Client::open(url).context("Invalid REDIS_URL"))
        .transpose()
}

/// Constructs an S3 client configured for MinIO (local) or AWS (production).
async fn build_s3_client(config: &S3Config) -> aws_sdk_s3::Client {
    let credentials = Credentials::new(
        &config.access_key_id,
        &config.secret_access_key,
        None,
        None,
        "resume-rag-static",
    );

    let s3_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .credentials_provider(credentials)
        .endpoint_url(&config.endpoint)
        .load()
        .await;

    aws_sdk_s3::Client::new(&s3_config)
}
