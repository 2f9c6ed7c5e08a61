//! Telemetry items and the envelope they travel in.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracer_primitives::{
    CustomProperties, InstrumentationKey, Measurements, OperationId, SeverityLevel,
};

/// Context tag carrying the tracer session.
pub const SESSION_ID_TAG: &str = "ai.session.id";
/// Context tag carrying the open operation's correlation id.
pub const OPERATION_ID_TAG: &str = "ai.operation.id";
/// Context tag carrying the open operation's name.
pub const OPERATION_NAME_TAG: &str = "ai.operation.name";

/// Severity-tagged trace message.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceTelemetry {
    /// Message text, never truncated.
    pub message: String,
    /// Severity of the message.
    pub severity_level: SeverityLevel,
    /// Properties stamped by the emitting tracer.
    #[serde(default)]
    pub properties: CustomProperties,
}

/// Structured exception record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExceptionTelemetry {
    /// Name of the error type.
    pub type_name: String,
    /// Primary error message, bounded by the exception length policy.
    pub message: String,
    /// Messages of the underlying causes, outermost first.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub causes: Vec<String>,
    /// Properties stamped by the emitting tracer.
    #[serde(default)]
    pub properties: CustomProperties,
}

/// Single named metric sample.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricTelemetry {
    /// Metric name.
    pub name: String,
    /// Sampled value.
    pub value: f64,
    /// Caller and tracer properties.
    #[serde(default)]
    pub properties: CustomProperties,
}

/// Summary of one unit of work (an operation or an explicitly tracked request).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestTelemetry {
    /// Correlation id shared with the items emitted during the request.
    pub id: OperationId,
    /// Request or operation name.
    pub name: String,
    /// Wall-clock start.
    pub start_time: DateTime<Utc>,
    /// Time taken.
    pub duration: Duration,
    /// Status code; `"200"` on success.
    pub response_code: String,
    /// Whether the request succeeded.
    pub success: bool,
    /// Tracer properties.
    #[serde(default)]
    pub properties: CustomProperties,
    /// Measurements recorded while the request was open.
    #[serde(default)]
    pub measurements: Measurements,
}

/// Call made to an external dependency.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyTelemetry {
    /// Dependency name (service, database, queue...).
    pub name: String,
    /// Command issued against the dependency.
    pub command: String,
    /// Wall-clock start of the call.
    pub start_time: DateTime<Utc>,
    /// Time taken by the call.
    pub duration: Duration,
    /// Whether the call succeeded.
    pub success: bool,
    /// Tracer properties.
    #[serde(default)]
    pub properties: CustomProperties,
}

/// Every kind of item a tracer can emit.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "baseType", content = "baseData")]
pub enum TelemetryItem {
    /// Trace message.
    #[serde(rename = "MessageData")]
    Trace(TraceTelemetry),
    /// Structured exception.
    #[serde(rename = "ExceptionData")]
    Exception(ExceptionTelemetry),
    /// Metric sample.
    #[serde(rename = "MetricData")]
    Metric(MetricTelemetry),
    /// Request or operation summary.
    #[serde(rename = "RequestData")]
    Request(RequestTelemetry),
    /// Dependency call.
    #[serde(rename = "RemoteDependencyData")]
    Dependency(DependencyTelemetry),
}

impl TelemetryItem {
    /// Envelope name for this kind of item.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Trace(_) => "Message",
            Self::Exception(_) => "Exception",
            Self::Metric(_) => "Metric",
            Self::Request(_) => "Request",
            Self::Dependency(_) => "RemoteDependency",
        }
    }

    /// Properties carried by the item.
    #[must_use]
    pub fn properties(&self) -> &CustomProperties {
        match self {
            Self::Trace(item) => &item.properties,
            Self::Exception(item) => &item.properties,
            Self::Metric(item) => &item.properties,
            Self::Request(item) => &item.properties,
            Self::Dependency(item) => &item.properties,
        }
    }

    /// Mutable access to the item's properties.
    pub fn properties_mut(&mut self) -> &mut CustomProperties {
        match self {
            Self::Trace(item) => &mut item.properties,
            Self::Exception(item) => &mut item.properties,
            Self::Metric(item) => &mut item.properties,
            Self::Request(item) => &mut item.properties,
            Self::Dependency(item) => &mut item.properties,
        }
    }
}

/// Item plus the context the client stamped onto it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    /// Item kind, see [`TelemetryItem::kind`].
    pub name: String,
    /// Emission time.
    pub time: DateTime<Utc>,
    /// Resource the item is addressed to.
    #[serde(rename = "iKey")]
    pub instrumentation_key: InstrumentationKey,
    /// Session and operation context tags.
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
    /// The item itself.
    pub data: TelemetryItem,
}

impl Envelope {
    /// Returns the value of a context tag.
    #[must_use]
    pub fn tag(&self, name: &str) -> Option<&str> {
        self.tags.get(name).map(String::as_str)
    }
}
