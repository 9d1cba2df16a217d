//! Marquee server entry point.
//!
//! Wires configuration, storage, presence, and the change notifier, then
//! starts the API server and the metrics listener. The `build_state` helper
//! keeps wiring testable and minimizes main setup logic.
use marquee_notify::Notifier;
use marquee_presence::PresenceTracker;
use marquee_server::app::{AppState, build_router};
use marquee_server::config::ServerConfig;
use marquee_server::observability;
use marquee_store::{ContentStore, MemoryStore};
use std::future::Future;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::from_env_or_yaml()?;
    run_with_shutdown(config, async {
        let _ = tokio::signal::ctrl_c().await;
    })
    .await
}

async fn run_with_shutdown<F>(config: ServerConfig, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let metrics_handle = observability::init_observability("marquee-server");
    let state = build_state(&config)?;
    let metrics_task = tokio::spawn(observability::serve_metrics(
        metrics_handle,
        config.metrics_bind,
    ));

    let app = build_router(state);

    let addr = config.bind_addr;
    tracing::info!(%addr, backend = "memory", "marquee server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tokio::pin!(shutdown);
    tokio::select! {
        result = axum::serve(listener, app.into_make_service()) => {
            result?;
        }
        _ = &mut shutdown => {}
    }

    metrics_task.abort();
    let _ = metrics_task.await;
    Ok(())
}

fn build_state(config: &ServerConfig) -> anyhow::Result<AppState> {
    let store: Arc<dyn ContentStore> = Arc::new(MemoryStore::new());
    let notifier = Arc::new(Notifier::new().with_queue_capacity(config.notify_queue_capacity)?);
    let presence = Arc::new(PresenceTracker::with_stale_threshold(
        config.stale_threshold(),
    ));
    Ok(AppState::new(store, notifier, presence))
}
