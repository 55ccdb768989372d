//! `postpix-worker`: post dispatcher, or a single-post worker when given
//! a post id.
//!
//! ```text
//! postpix-worker             # poll and dispatch until SIGINT/SIGTERM
//! postpix-worker <post-id>   # process one post, print one JSON line, exit
//! ```

use std::sync::Arc;

use anyhow::Context;
use postpix_ai::config::ProviderConfig;
use postpix_cloud::{S3BlobStore, S3Config};
use postpix_core::retry::{retry, RetryConfig};
use postpix_core::types::DbId;
use postpix_db::store::{PgPostStore, PostStore};
use postpix_db::DbPool;
use postpix_pipeline::{ImageRenderer, JobContext};
use postpix_worker::config::{LogFormat, WorkerConfig};
use postpix_worker::dispatcher::PostDispatcher;
use postpix_worker::launcher::ProcessLauncher;
use postpix_worker::unit;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_LOG_FILTER: &str =
    "postpix_worker=info,postpix_pipeline=info,postpix_ai=info,postpix_cloud=info,postpix_core=info";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let post_id = unit::parse_post_id(std::env::args().nth(1)).context("Invalid post id argument")?;
    let config = WorkerConfig::from_env()?;
    init_tracing(config.log_format);

    let pool = connect(&config.database_url).await?;

    match post_id {
        None => run_dispatcher(pool, &config).await,
        Some(post_id) => run_worker(pool, &config, post_id).await,
    }
}

/// Logs go to stderr so a unit worker's stdout carries only its result.
fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init(),
        LogFormat::Text => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
    }
}

/// Connect and wait until the database answers.
async fn connect(database_url: &str) -> anyhow::Result<DbPool> {
    let pool = retry(
        || async move {
            let pool = postpix_db::create_pool(database_url).await?;
            postpix_db::health_check(&pool).await?;
            Ok::<_, sqlx::Error>(pool)
        },
        |_| true,
        &RetryConfig::default(),
    )
    .await
    .context("Database is unreachable")?;

    tracing::info!("Database health check passed");
    Ok(pool)
}

async fn run_dispatcher(pool: DbPool, config: &WorkerConfig) -> anyhow::Result<()> {
    postpix_db::run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;
    tracing::info!("Database migrations applied");

    let store: Arc<dyn PostStore> = Arc::new(PgPostStore::new(pool));
    let launcher = Arc::new(ProcessLauncher::current_exe()?);
    let mut dispatcher = PostDispatcher::new(store, launcher, config.dispatcher());

    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        signal_cancel.cancel();
    });

    dispatcher.run(cancel).await;
    tracing::info!("Dispatcher stopped");
    Ok(())
}

async fn run_worker(pool: DbPool, config: &WorkerConfig, post_id: DbId) -> anyhow::Result<()> {
    tracing::info!(%post_id, "Worker starting");

    let providers = ProviderConfig::from_env()?;
    let http = reqwest::Client::new();
    let generator = providers
        .build_image_generator(&http)
        .context("OPENAI_API_KEY is required for image generation")?;

    let s3 = S3Config::from_env()?;
    let blobs = S3BlobStore::connect(&s3).await;

    let ctx = JobContext {
        store: Arc::new(PgPostStore::new(pool)),
        completion: Arc::new(providers.build_completion(&http)),
        renderer: Arc::new(ImageRenderer::new(
            Arc::new(generator),
            Arc::new(blobs),
            &config.data_dir,
        )),
        assets_url: s3.assets_url.clone(),
    };

    let result = unit::run_unit(&ctx, post_id)
        .await
        .with_context(|| format!("Post {post_id} failed"))?;

    println!("{}", serde_json::to_string(&result)?);
    Ok(())
}

/// Wait for SIGINT or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl-C"),
        _ = terminate => tracing::info!("Received SIGTERM"),
    }
}
