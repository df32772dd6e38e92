//! Tracing, trace-context extraction, and Prometheus metrics for the console.
//!
//! # Notes
//! - Initialization is guarded by `OnceLock`, so repeated calls (tests, embedded
//!   use) are no-ops after the first.
//! - Spans are exported over OTLP only when `OTEL_EXPORTER_OTLP_ENDPOINT` is
//!   set. Deployment attributes come from `OTEL_RESOURCE_ATTRIBUTES`.
//! - Inbound `traceparent` headers parent the request span; the console makes
//!   no outbound calls, so nothing is injected.
//! - Metrics are served on their own listener, separate from the API.
use anyhow::Context;
use gatehouse_authz::Verdict;
use metrics_exporter_prometheus::PrometheusBuilder;
use metrics_exporter_prometheus::PrometheusHandle;
use opentelemetry::KeyValue;
use opentelemetry::propagation::{Extractor, TextMapPropagator};
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

pub const DECISIONS_TOTAL: &str = "gatehouse_authz_decisions_total";
pub const ROLES_TOTAL: &str = "gatehouse_roles_total";
pub const ROLE_MUTATIONS_TOTAL: &str = "gatehouse_role_mutations_total";

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();
static TRACING_INIT: OnceLock<()> = OnceLock::new();

/// Install the tracing subscriber and the Prometheus recorder.
pub fn init_observability(service_name: &str) -> anyhow::Result<PrometheusHandle> {
    TRACING_INIT.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let registry = tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer());
        match build_tracer_provider(service_name) {
            Some(provider) => {
                let tracer = provider.tracer(service_name.to_string());
                let _ = registry
                    .with(tracing_opentelemetry::layer().with_tracer(tracer))
                    .try_init();
            }
            None => {
                let _ = registry.try_init();
            }
        }
    });

    install_metrics_recorder()
}

fn build_tracer_provider(service_name: &str) -> Option<SdkTracerProvider> {
    std::env::var_os("OTEL_EXPORTER_OTLP_ENDPOINT")?;
    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .build()
        .ok()?;
    Some(
        SdkTracerProvider::builder()
            .with_batch_exporter(exporter)
            .with_resource(console_resource(service_name))
            .build(),
    )
}

fn console_resource(service_name: &str) -> Resource {
    Resource::builder()
        .with_service_name(service_name.to_string())
        .with_attribute(KeyValue::new("service.version", env!("CARGO_PKG_VERSION")))
        .build()
}

/// Parent context carried by an inbound W3C `traceparent` header, if any.
pub fn trace_context_from_headers(headers: &axum::http::HeaderMap) -> opentelemetry::Context {
    TraceContextPropagator::new().extract(&HeaderMapExtractor(headers))
}

struct HeaderMapExtractor<'a>(&'a axum::http::HeaderMap);

impl Extractor for HeaderMapExtractor<'_> {
    fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|value| value.to_str().ok())
    }

    fn keys(&self) -> Vec<&str> {
        self.0.keys().map(|name| name.as_str()).collect()
    }
}

/// Serve `/metrics` on `addr` until the task is dropped.
pub async fn serve_metrics(handle: PrometheusHandle, addr: SocketAddr) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "metrics listener starting");
    serve_metrics_with_listener(handle, listener, std::future::pending()).await
}

async fn serve_metrics_with_listener<F>(
    handle: PrometheusHandle,
    listener: tokio::net::TcpListener,
    shutdown: F,
) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = axum::Router::new().route(
        "/metrics",
        axum::routing::get(move || async move { handle.render() }),
    );
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown)
        .await
}

fn install_metrics_recorder() -> anyhow::Result<PrometheusHandle> {
    if let Some(handle) = METRICS_HANDLE.get() {
        return Ok(handle.clone());
    }
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .context("install metrics recorder")?;
    let _ = METRICS_HANDLE.set(handle.clone());
    describe_metrics();
    Ok(handle)
}

fn describe_metrics() {
    metrics::describe_counter!(DECISIONS_TOTAL, "Authorization verdicts issued by the request gate");
    metrics::describe_gauge!(ROLES_TOTAL, "Roles currently stored");
    metrics::describe_counter!(ROLE_MUTATIONS_TOTAL, "Role create, update, and delete operations");
}

/// Count one gate verdict.
pub fn record_decision(verdict: Verdict) {
    metrics::counter!(DECISIONS_TOTAL, "verdict" => verdict.as_str()).increment(1);
}

pub fn record_role_mutation(op: &'static str) {
    metrics::counter!(ROLE_MUTATIONS_TOTAL, "op" => op).increment(1);
}

pub fn set_role_total(total: u64) {
    metrics::gauge!(ROLES_TOTAL).set(total as f64);
}

#[cfg(test)]
mod tests {
    use super::*;
    use opentelemetry::trace::{TraceContextExt, TraceId};
    use serial_test::serial;
    use std::time::{Duration, Instant};
    use tokio::sync::oneshot;

    const TRACEPARENT: &str = "00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01";

    #[test]
    fn header_extractor_skips_non_utf8_values() {
        let mut headers = axum::http::HeaderMap::new();
        headers.insert("traceparent", TRACEPARENT.parse().unwrap());
        headers.insert(
            "tracestate",
            axum::http::HeaderValue::from_bytes(b"\xFF").unwrap(),
        );
        let extractor = HeaderMapExtractor(&headers);

        assert_eq!(extractor.get("traceparent"), Some(TRACEPARENT));
        assert!(extractor.get("tracestate").is_none());
        assert!(extractor.keys().contains(&"tracestate"));
    }

    #[test]
    fn request_span_parent_comes_from_traceparent() {
        let mut headers = axum::http::HeaderMap::new();
        headers.insert("traceparent", TRACEPARENT.parse().unwrap());
        let context = trace_context_from_headers(&headers);
        let span = context.span();
        let span_ctx = span.span_context();
        assert!(span_ctx.is_valid());
        assert!(span_ctx.is_remote());
        assert_eq!(
            span_ctx.trace_id(),
            TraceId::from_hex("4bf92f3577b34da6a3ce929d0e0e4736").unwrap()
        );
    }

    #[test]
    fn missing_or_malformed_traceparent_has_no_parent() {
        let empty = trace_context_from_headers(&axum::http::HeaderMap::new());
        assert!(!empty.span().span_context().is_valid());

        let mut headers = axum::http::HeaderMap::new();
        headers.insert("traceparent", "not-a-trace".parse().unwrap());
        let context = trace_context_from_headers(&headers);
        assert!(!context.span().span_context().is_valid());
    }

    #[test]
    fn resource_names_the_console() {
        let resource = console_resource("gatehouse-console");
        let attr = |name: &str| {
            resource
                .iter()
                .find(|(key, _)| key.as_str() == name)
                .map(|(_, value)| value.to_string())
        };
        assert_eq!(attr("service.name").as_deref(), Some("gatehouse-console"));
        assert_eq!(attr("service.version").as_deref(), Some(env!("CARGO_PKG_VERSION")));
    }

    fn build_test_client() -> reqwest::Client {
        reqwest::Client::builder()
            .timeout(Duration::from_secs(1))
            .no_proxy()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .expect("build test client")
    }

    async fn wait_for_listen(addr: SocketAddr) -> Result<(), String> {
        let deadline = Instant::now() + Duration::from_secs(1);
        loop {
            if tokio::net::TcpStream::connect(addr).await.is_ok() {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(format!("metrics listener never became ready at {addr}"));
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    async fn spawn_metrics_server(
        handle: PrometheusHandle,
    ) -> (
        SocketAddr,
        oneshot::Sender<()>,
        tokio::task::JoinHandle<std::io::Result<()>>,
    ) {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind listener");
        let bound_addr = listener.local_addr().expect("local addr");
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let server_handle = tokio::spawn(async move {
            serve_metrics_with_listener(handle, listener, async move {
                let _ = shutdown_rx.await;
            })
            .await
        });
        (bound_addr, shutdown_tx, server_handle)
    }

    #[tokio::test(flavor = "multi_thread")]
    #[serial]
    async fn init_observability_is_idempotent() {
        let first = init_observability("gatehouse-test").expect("init");
        let second = init_observability("gatehouse-test").expect("init");
        let _ = (first.render(), second.render());
    }

    #[test]
    #[serial]
    fn console_metrics_are_rendered() {
        let handle = install_metrics_recorder().expect("recorder");
        record_decision(Verdict::Authorized);
        record_decision(Verdict::Unauthorized);
        record_role_mutation("created");
        set_role_total(3);

        let rendered = handle.render();
        assert!(rendered.contains(r#"gatehouse_authz_decisions_total{verdict="authorized"}"#));
        assert!(rendered.contains(r#"gatehouse_authz_decisions_total{verdict="unauthorized"}"#));
        assert!(rendered.contains(r#"gatehouse_role_mutations_total{op="created"}"#));
        assert!(rendered.contains(ROLES_TOTAL));
    }

    #[tokio::test(flavor = "multi_thread")]
    #[serial]
    async fn metrics_listener_serves_only_metrics() {
        let handle = init_observability("gatehouse-metrics-test").expect("init");
        record_decision(Verdict::Authorized);
        let (addr, shutdown_tx, server_handle) = spawn_metrics_server(handle).await;
        wait_for_listen(addr).await.expect("server ready");

        let client = build_test_client();
        let url = format!("http://{addr}/metrics");
        let response = client
            .get(&url)
            .send()
            .await
            .unwrap_or_else(|err| panic!("GET /metrics failed for {url}: {err}"));
        let body = response
            .error_for_status()
            .expect("metrics status")
            .text()
            .await
            .expect("metrics body");
        assert!(body.contains(DECISIONS_TOTAL));

        let response = client
            .get(format!("http://{addr}/v1/roles"))
            .send()
            .await
            .expect("GET /v1/roles");
        assert_eq!(response.status(), reqwest::StatusCode::NOT_FOUND);

        let _ = shutdown_tx.send(());
        let _ = tokio::time::timeout(Duration::from_secs(1), server_handle)
            .await
            .expect("server shutdown");
    }
}
