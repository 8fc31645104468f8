//! Observability hooks.
//!
//! Managers report notable events (pruned elements, dropped edges, algorithm failures) to an
//! injected [`TelemetryProvider`]. The default forwards to `tracing`.

use std::collections::BTreeMap;
use std::sync::Arc;

pub type TelemetryProperties = BTreeMap<String, serde_json::Value>;

pub trait TelemetryProvider {
    fn info(&self, message: &str, source: &str, action: &str, props: Option<&TelemetryProperties>);

    fn error(
        &self,
        error: &dyn std::error::Error,
        source: &str,
        action: &str,
        props: Option<&TelemetryProperties>,
    );
}

pub type SharedTelemetry = Arc<dyn TelemetryProvider + Send + Sync>;

#[derive(Debug, Clone, Copy, Default)]
pub struct TracingTelemetry;

impl TelemetryProvider for TracingTelemetry {
    fn info(&self, message: &str, source: &str, action: &str, props: Option<&TelemetryProperties>) {
        match props {
            Some(props) => tracing::info!(source, action, props = ?props, "{message}"),
            None => tracing::info!(source, action, "{message}"),
        }
    }

    fn error(
        &self,
        error: &dyn std::error::Error,
        source: &str,
        action: &str,
        props: Option<&TelemetryProperties>,
    ) {
        match props {
            Some(props) => tracing::error!(source, action, props = ?props, "{error}"),
            None => tracing::error!(source, action, "{error}"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTelemetry;

impl TelemetryProvider for NoopTelemetry {
    fn info(&self, _: &str, _: &str, _: &str, _: Option<&TelemetryProperties>) {}

    fn error(&self, _: &dyn std::error::Error, _: &str, _: &str, _: Option<&TelemetryProperties>) {}
}

pub fn default_telemetry() -> SharedTelemetry {
    Arc::new(TracingTelemetry)
}

/// Builds a property bag from string pairs.
pub(crate) fn props<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> TelemetryProperties {
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), serde_json::Value::from(v)))
        .collect()
}
