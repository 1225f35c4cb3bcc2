mod cli;
mod config;

use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::{
    Router,
    extract::State,
    http::{StatusCode, header::CONTENT_TYPE},
    response::{IntoResponse, Response},
    routing::get,
};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use grun_api::{HttpApi, StoreHandler};
use grun_core::{
    MetricsHandle,
    cache::SpawnCache,
    engine::ScalingEngine,
    state::StatusStore,
    supervisor::PoolSupervisor,
};
use grun_exec::SubprocessLauncher;
use grun_gitea::GiteaClient;
use grun_observe::{Subscriber, init_logger};
use grun_prometheus::PrometheusMetrics;
use taskvisor::{Config as SupervisorConfig, ControllerConfig, Subscribe};

use crate::{cli::Args, config::AgentConfig};

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // 1) config
    let cfg = AgentConfig::load(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;

    // 2) logger
    init_logger(&cfg.logger)?;
    info!(config = %args.config.display(), pools = cfg.pools.len(), "configuration loaded");
    if args.check {
        return Ok(());
    }

    // 3) metrics
    let prometheus = PrometheusMetrics::new()?;
    let metrics: MetricsHandle = Arc::new(prometheus.clone());

    // 4) queue client + launcher
    let client = Arc::new(GiteaClient::new(&cfg.engine.gitea_config())?);
    let launcher = Arc::new(SubprocessLauncher::new(cfg.launcher.clone())?);

    // 5) supervisor
    let store = StatusStore::new();
    let subscribers: Vec<Arc<dyn Subscribe>> = vec![Arc::new(Subscriber)];
    let supervisor = PoolSupervisor::new(
        SupervisorConfig::default(),
        ControllerConfig::default(),
        subscribers,
        store.clone(),
        metrics.clone(),
    )
    .await?;

    // 6) one engine per pool; dedup state is never shared between pools
    for pool in cfg.pools {
        let engine = ScalingEngine::new(
            client.clone(),
            launcher.clone(),
            Arc::new(SpawnCache::new(cfg.engine.spawn_ttl())),
        )
        .with_metrics(metrics.clone())
        .with_default_labels(cfg.engine.default_labels.clone());

        let name = pool.name.clone();
        supervisor
            .submit(pool, Arc::new(engine))
            .await
            .with_context(|| format!("scheduling pool '{name}'"))?;
        info!(pool = %name, "pool scheduled");
    }

    // 7) status API
    let api_stop = CancellationToken::new();
    let api = if cfg.api.enabled {
        let stop = api_stop.clone();
        let listen = cfg.api.listen;
        Some(tokio::spawn(async move {
            if let Err(e) = serve_api(listen, store, prometheus, stop).await {
                error!(error = %e, "status API stopped");
            }
        }))
    } else {
        None
    };

    // 8) run until interrupted
    tokio::select! {
        res = tokio::signal::ctrl_c() => {
            if let Err(e) = res {
                warn!(error = %e, "failed to listen for interrupt");
            }
            info!("interrupt received; shutting down");
        }
        _ = supervisor.stopped() => info!("supervisor stopped; shutting down"),
    }

    api_stop.cancel();
    launcher.shutdown().await;
    if let Some(api) = api {
        let _ = api.await;
    }
    info!("grun-agentd stopped");
    Ok(())
}

async fn serve_api(
    listen: SocketAddr,
    store: StatusStore,
    metrics: PrometheusMetrics,
    stop: CancellationToken,
) -> anyhow::Result<()> {
    let app = HttpApi::new(Arc::new(StoreHandler::new(store)))
        .router()
        .merge(
            Router::new()
                .route("/metrics", get(metrics_handler))
                .with_state(Arc::new(metrics)),
        );

    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .with_context(|| format!("binding status API to {listen}"))?;
    info!(%listen, "status API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { stop.cancelled().await })
        .await?;
    Ok(())
}

async fn metrics_handler(State(metrics): State<Arc<PrometheusMetrics>>) -> Response {
    match metrics.encode_text() {
        Ok(body) => ([(CONTENT_TYPE, grun_prometheus::TEXT_FORMAT)], body).into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}
