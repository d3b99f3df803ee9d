//! Logs, traces, and metrics for the backend.
//!
//! # Purpose
//! Installs the tracing subscriber (with an OTLP layer when an endpoint is
//! configured), the Prometheus recorder, and the helpers the route guard and
//! login handler use to count gate decisions and logins.
//!
//! # Notes
//! Installation is process-wide and idempotent; tests may call
//! [`init_observability`] repeatedly.
use anyhow::Context;
use axum::Router;
use axum::http::HeaderMap;
use metrics::Unit;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use opentelemetry::KeyValue;
use opentelemetry::global;
use opentelemetry::propagation::Extractor;
use opentelemetry::trace::TracerProvider;
use opentelemetry_sdk::Resource;
use opentelemetry_sdk::propagation::TraceContextPropagator;
use opentelemetry_sdk::trace::SdkTracerProvider;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::OnceLock;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use waitress_authz::{CapabilityGroup, GateDecision};

pub const GATE_DECISIONS_TOTAL: &str = "waitress_gate_decisions_total";
pub const AUTH_RESOLUTIONS_TOTAL: &str = "waitress_auth_resolutions_total";
pub const LOGINS_TOTAL: &str = "waitress_logins_total";

const SERVICE_NAMESPACE: &str = "waitress";
const OTLP_ENDPOINT_ENV: &str = "OTEL_EXPORTER_OTLP_ENDPOINT";

static SUBSCRIBER: OnceLock<()> = OnceLock::new();
static PROPAGATOR: OnceLock<()> = OnceLock::new();
static RECORDER: OnceLock<PrometheusHandle> = OnceLock::new();

/// Deployment identity stamped on every exported span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceIdentity {
    pub name: String,
    pub instance_id: Option<String>,
    pub environment: Option<String>,
}

impl ServiceIdentity {
    /// `WAITRESS_SERVICE_INSTANCE_ID` wins over `HOSTNAME`.
    pub fn from_env(name: &str) -> Self {
        Self {
            name: name.to_string(),
            instance_id: std::env::var("WAITRESS_SERVICE_INSTANCE_ID")
                .or_else(|_| std::env::var("HOSTNAME"))
                .ok(),
            environment: std::env::var("DEPLOYMENT_ENVIRONMENT").ok(),
        }
    }

    fn resource(&self) -> Resource {
        let mut attributes = vec![
            KeyValue::new("service.name", self.name.clone()),
            KeyValue::new("service.namespace", SERVICE_NAMESPACE),
            KeyValue::new("service.version", env!("CARGO_PKG_VERSION")),
        ];
        if let Some(instance) = &self.instance_id {
            attributes.push(KeyValue::new("service.instance.id", instance.clone()));
        }
        if let Some(environment) = &self.environment {
            attributes.push(KeyValue::new("deployment.environment", environment.clone()));
        }
        Resource::builder_empty().with_attributes(attributes).build()
    }
}

/// Install logging, tracing, and the metrics recorder.
pub fn init_observability(service_name: &str) -> anyhow::Result<PrometheusHandle> {
    install_propagator();
    SUBSCRIBER.get_or_init(|| {
        let identity = ServiceIdentity::from_env(service_name);
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let registry = tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer());
        match otlp_tracer_provider(&identity) {
            Some(provider) => {
                let tracer = provider.tracer(identity.name.clone());
                global::set_tracer_provider(provider);
                let _ = registry
                    .with(tracing_opentelemetry::layer().with_tracer(tracer))
                    .try_init();
            }
            None => {
                let _ = registry.try_init();
            }
        }
    });
    install_recorder()
}

/// Span export only runs when an OTLP endpoint is configured.
fn otlp_tracer_provider(identity: &ServiceIdentity) -> Option<SdkTracerProvider> {
    std::env::var(OTLP_ENDPOINT_ENV).ok()?;
    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .build()
        .ok()?;
    Some(
        SdkTracerProvider::builder()
            .with_batch_exporter(exporter)
            .with_resource(identity.resource())
            .build(),
    )
}

fn install_propagator() {
    PROPAGATOR.get_or_init(|| global::set_text_map_propagator(TraceContextPropagator::new()));
}

fn install_recorder() -> anyhow::Result<PrometheusHandle> {
    if let Some(handle) = RECORDER.get() {
        return Ok(handle.clone());
    }
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .context("install prometheus recorder")?;
    describe_metrics();
    Ok(RECORDER.get_or_init(|| handle).clone())
}

fn describe_metrics() {
    metrics::describe_counter!(
        GATE_DECISIONS_TOTAL,
        Unit::Count,
        "Route gate outcomes by capability group (allow, unauthenticated, forbidden, configuration)"
    );
    metrics::describe_counter!(
        AUTH_RESOLUTIONS_TOTAL,
        Unit::Count,
        "Callers admitted by a gate, by the channel that authenticated them"
    );
    metrics::describe_counter!(
        LOGINS_TOTAL,
        Unit::Count,
        "Login attempts by outcome"
    );
}

/// Count one gate decision for a route guarded by `group`.
pub fn record_gate_decision(group: CapabilityGroup, decision: &GateDecision) {
    let outcome = match decision {
        GateDecision::Allow(claim) => {
            metrics::counter!(AUTH_RESOLUTIONS_TOTAL, "source" => claim.source.as_str())
                .increment(1);
            "allow"
        }
        GateDecision::Deny(reason) => reason.as_str(),
    };
    metrics::counter!(GATE_DECISIONS_TOTAL, "group" => group.as_str(), "outcome" => outcome)
        .increment(1);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginOutcome {
    Success,
    Rejected,
}

impl LoginOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            LoginOutcome::Success => "success",
            LoginOutcome::Rejected => "rejected",
        }
    }
}

pub fn record_login(outcome: LoginOutcome) {
    metrics::counter!(LOGINS_TOTAL, "outcome" => outcome.as_str()).increment(1);
}

/// W3C trace context carried by an inbound request, if any.
pub fn trace_context_from_headers(headers: &HeaderMap) -> opentelemetry::Context {
    install_propagator();
    global::get_text_map_propagator(|propagator| propagator.extract(&HeaderCarrier(headers)))
}

struct HeaderCarrier<'a>(&'a HeaderMap);

impl Extractor for HeaderCarrier<'_> {
    fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|value| value.to_str().ok())
    }

    fn keys(&self) -> Vec<&str> {
        self.0.keys().map(|name| name.as_str()).collect()
    }
}

pub fn metrics_router(handle: PrometheusHandle) -> Router {
    Router::new().route(
        "/metrics",
        axum::routing::get(move || async move { handle.render() }),
    )
}

pub async fn serve_metrics(handle: PrometheusHandle, addr: SocketAddr) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    serve_metrics_until(handle, listener, std::future::pending()).await
}

async fn serve_metrics_until<F>(
    handle: PrometheusHandle,
    listener: tokio::net::TcpListener,
    shutdown: F,
) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, metrics_router(handle).into_make_service())
        .with_graceful_shutdown(shutdown)
        .await
}
