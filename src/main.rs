use std::process;
use std::sync::Arc;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use peskar_hub::api::{self, state::AppState};
use peskar_hub::cli::Cli;
use peskar_hub::config::Config;
use peskar_hub::messaging::{MessageBus, RedisBus, TOPIC_INDEX};
use peskar_hub::scheduler::Scheduler;
use peskar_hub::snapshot::SnapshotClient;

const BASE_NAME: &str = "peskar-hub";

fn init_tracing(config: &Config) {
    let level = config
        .log_level
        .as_deref()
        .unwrap_or("info")
        .parse::<tracing::Level>()
        .unwrap_or(tracing::Level::INFO);
    tracing_subscriber::fmt().with_max_level(level).init();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm =
            signal(SignalKind::terminate()).expect("failed to install signal handler");
        sigterm.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match Config::resolve(&cli) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{}", err);
            process::exit(1);
        }
    };
    init_tracing(&config);

    info!("Starting {}", BASE_NAME);

    let bus = match RedisBus::connect(
        &config.redis_addr,
        config.redis_max_idle,
        config.redis_idle_timeout,
    ) {
        Ok(bus) => bus,
        Err(err) => {
            error!("Could not configure Redis: {}", err);
            process::exit(1);
        }
    };
    if let Err(err) = bus.check().await {
        error!("Redis is unreachable: {}", err);
        process::exit(1);
    }

    let snapshots = Arc::new(SnapshotClient::new(&config.data_dir));
    let scheduler = Arc::new(Scheduler::new(
        config.parallel_job_count,
        Arc::new(bus.clone()),
    ));
    if let Err(err) = scheduler.restore(&snapshots).await {
        error!("Could not load state snapshots: {}", err);
        process::exit(1);
    }

    let token = CancellationToken::new();
    let mut tasks = scheduler
        .clone()
        .spawn_background(snapshots.clone(), token.clone());

    tasks.push(tokio::spawn({
        let bus = bus.clone();
        let scheduler = scheduler.clone();
        let token = token.clone();
        async move {
            bus.run_subscriber(TOPIC_INDEX, token, move |payload| {
                let scheduler = scheduler.clone();
                async move { scheduler.ingest_log(&payload).await }
            })
            .await;
        }
    }));

    tokio::spawn({
        let token = token.clone();
        async move {
            shutdown_signal().await;
            info!("Captured shutdown signal. Exiting...");
            token.cancel();
        }
    });

    let state = match AppState::new(config.clone(), scheduler.clone()) {
        Ok(state) => state,
        Err(err) => {
            error!("Could not build application state: {}", err);
            process::exit(1);
        }
    };

    if let Err(err) = api::serve(state, &config.listen_addr, token.clone()).await {
        error!("HTTP server failed: {}", err);
        token.cancel();
        process::exit(1);
    }

    for task in tasks {
        let _ = task.await;
    }

    if let Err(err) = scheduler.persist(&snapshots).await {
        error!("Final save failed: {}", err);
        process::exit(1);
    }
}
