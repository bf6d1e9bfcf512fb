// ABOUTME: Worker binary entry point — preflight config, wire adapters, serve the invocation route
// ABOUTME: Grounded on the teacher's src/bin/multitenant_server.rs clap+tokio::main shape
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Planforge Worker Binary
//!
//! Starts the HTTP invocation surface (spec.md §6) backed by a local SQLite
//! queue/checkpoint/plan store. Production deployments point `DATABASE_URL`
//! at the shared Postgres-compatible store instead; this binary defaults to
//! a file-backed SQLite database for local runs and tests.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use sqlx::sqlite::SqlitePoolOptions;
use tokio::net::TcpListener;
use tracing::info;

use planforge_worker::checkpoint::SqliteCheckpointStore;
use planforge_worker::config::{LoggingConfig, WorkerConfig};
use planforge_worker::llm::DeepSeekClient;
use planforge_worker::notifier::HttpNotifier;
use planforge_worker::orchestrator::Orchestrator;
use planforge_worker::plan_store::SqlitePlanStore;
use planforge_worker::queue::SqliteJobQueue;
use planforge_worker::worker::http::router;
use planforge_worker::worker::WorkerDeps;

#[derive(Parser)]
#[command(name = "planforge-worker")]
#[command(about = "Checkpointed, timeout-bounded worker for 7-day fitness plan generation")]
struct Args {
    /// Address to bind the invocation HTTP surface to.
    #[arg(long, default_value = "0.0.0.0:8787")]
    bind: String,

    /// SQLite database file backing the queue/checkpoint/plan stores.
    #[arg(long, default_value = "planforge_worker.sqlite3")]
    database: String,

    /// Validate the environment and exit without binding a listener or
    /// opening the database pool. Prints a redacted configuration summary
    /// on success, an error on failure.
    #[arg(long)]
    config_check: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Preflight: missing SUPABASE_URL/SUPABASE_SERVICE_ROLE_KEY/DEEPSEEK_API_KEY
    // fails before a job is ever claimed (spec.md §6).
    let config = WorkerConfig::from_env().context("worker preflight failed")?;

    if args.config_check {
        println!(
            "configuration valid: environment={:?} log_level={:?} data_store_url={} llm_api_key={} data_store_service_key={}",
            config.environment,
            config.log_level,
            config.data_store_url,
            redact(&config.llm_api_key),
            redact(&config.data_store_service_key),
        );
        return Ok(());
    }

    LoggingConfig::new(config.log_level, config.environment).init();

    info!(environment = ?config.environment, "starting planforge-worker");

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&format!("sqlite://{}?mode=rwc", args.database))
        .await
        .context("failed to open sqlite database")?;

    let checkpoint_store = SqliteCheckpointStore::new(pool.clone());
    checkpoint_store.migrate().await.context("checkpoint store migration failed")?;

    let queue = SqliteJobQueue::new(pool.clone());
    queue.migrate().await.context("job queue migration failed")?;

    let plan_store = SqlitePlanStore::new(pool.clone());
    plan_store.migrate().await.context("plan store migration failed")?;

    let llm = Arc::new(DeepSeekClient::new(config.llm_api_key.clone(), config.timeouts));
    let checkpoint_store = Arc::new(checkpoint_store);
    let orchestrator = Arc::new(Orchestrator::new(llm, checkpoint_store.clone()));
    let notifier = Arc::new(HttpNotifier::new(&config));

    let deps = Arc::new(WorkerDeps {
        queue: Arc::new(queue),
        checkpoint_store,
        plan_store: Arc::new(plan_store),
        notifier,
        orchestrator,
        timeouts: config.timeouts,
    });

    let listener = TcpListener::bind(&args.bind)
        .await
        .with_context(|| format!("failed to bind {}", args.bind))?;
    info!(addr = %args.bind, "invocation surface listening");

    axum::serve(listener, router(deps))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server exited unexpectedly")?;

    info!("invocation surface shut down");
    Ok(())
}

/// Redact a secret down to a short prefix, so `--config-check` output never
/// leaks a usable credential to logs or a terminal scrollback.
fn redact(secret: &str) -> String {
    if secret.len() <= 4 {
        "***".to_owned()
    } else {
        format!("{}***", &secret[..4])
    }
}

/// Resolves on the first `SIGINT`/`SIGTERM`, whichever arrives first, so
/// `axum::serve`'s graceful shutdown can drain in-flight requests instead of
/// dropping connections mid-invocation.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("received SIGINT, draining in-flight invocations"),
        () = terminate => info!("received SIGTERM, draining in-flight invocations"),
    }
}
