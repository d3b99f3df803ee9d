//! Waitress backend HTTP service entry point.
//!
//! # Purpose
//! Loads configuration, builds the gated router, and serves it alongside the
//! Prometheus metrics listener.
use backend::app::{build_router, build_state};
use backend::config::BackendConfig;
use backend::observability;
use std::future::Future;
use std::sync::Arc;
use waitress_authz::SystemClock;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = BackendConfig::from_env_or_yaml()?;
    run_with_shutdown(config, async {
        let _ = tokio::signal::ctrl_c().await;
    })
    .await
}

async fn run_with_shutdown<F>(config: BackendConfig, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let metrics_handle = observability::init_observability("waitress-backend")?;
    let state = build_state(&config, Arc::new(SystemClock)).await?;
    let metrics_task = tokio::spawn(observability::serve_metrics(
        metrics_handle,
        config.metrics_bind,
    ));

    let app = build_router(state);
    let addr = config.bind_addr;
    tracing::info!(%addr, "backend listening");
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
