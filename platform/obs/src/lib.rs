//! Tracing setup and the operation observer hook shared by the service crates.

mod observer;

pub use observer::{OperationObserver, TracingObserver};

use anyhow::{Context, Result, anyhow};
use once_cell::sync::OnceCell;
use opentelemetry::trace::TracerProvider;
use opentelemetry_otlp::{Protocol, SpanExporter, WithExportConfig};
use opentelemetry_sdk::{Resource, trace::SdkTracerProvider};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

pub const DEFAULT_FILTER: &str = "info,tower_http=warn";

static INSTALLED: OnceCell<&'static str> = OnceCell::new();

/// What to log and where to export spans. The caller builds it; this crate
/// never reads the environment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObsConfig {
    pub service_name: &'static str,
    pub filter: String,
    pub otlp_endpoint: Option<String>,
}

impl ObsConfig {
    pub fn new(service_name: &'static str) -> Self {
        Self {
            service_name,
            filter: DEFAULT_FILTER.to_string(),
            otlp_endpoint: None,
        }
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = filter.into();
        self
    }

    /// A blank endpoint disables export.
    pub fn with_otlp_endpoint(mut self, endpoint: Option<String>) -> Self {
        self.otlp_endpoint = endpoint
            .map(|endpoint| endpoint.trim().to_string())
            .filter(|endpoint| !endpoint.is_empty());
        self
    }
}

/// Install the global subscriber: formatted output through `config.filter`,
/// plus OTLP span export when an endpoint is set.
///
/// The filter is validated on every call; only the first valid call installs
/// anything.
pub fn init_tracing(config: ObsConfig) -> Result<()> {
    let env_filter = EnvFilter::try_new(&config.filter)
        .with_context(|| format!("invalid log filter {:?}", config.filter))?;
    if INSTALLED.get().is_some() {
        return Ok(());
    }

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(false));
    match config.otlp_endpoint.as_deref() {
        Some(endpoint) => {
            let tracer = otlp_provider(config.service_name, endpoint)?.tracer(config.service_name);
            registry
                .with(tracing_opentelemetry::layer().with_tracer(tracer))
                .try_init()
        }
        None => registry.try_init(),
    }
    .context("installing tracing subscriber")?;

    INSTALLED
        .set(config.service_name)
        .map_err(|_| anyhow!("tracing already initialized"))
}

fn otlp_provider(service_name: &'static str, endpoint: &str) -> Result<SdkTracerProvider> {
    let exporter = SpanExporter::builder()
        .with_http()
        .with_protocol(Protocol::HttpBinary)
        .with_endpoint(endpoint)
        .build()
        .with_context(|| format!("building OTLP exporter for {endpoint}"))?;
    let resource = Resource::builder().with_service_name(service_name).build();
    Ok(SdkTracerProvider::builder()
        .with_resource(resource)
        .with_batch_exporter(exporter)
        .build())
}
