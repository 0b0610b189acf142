//! Per-tool argument validation.
//!
//! Tool-call arguments produced by the model are checked against a typed
//! schema before any provider contact: unknown tools and malformed arguments
//! are rejected here. Unknown fields are ignored (models pad freely);
//! missing required fields and out-of-range values are errors. The sanitized
//! arguments (defaults applied, extras dropped) are what gets sent to the
//! provider.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

/// Argument validation failure. `validated against the registry, not the
/// provider` — the invocation client is never reached on error.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ToolArgError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),
    #[error("Invalid arguments: {0}")]
    Invalid(String),
}

/// Station status values accepted by status-filtered tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum StationStatus {
    Running,
    Idle,
    Maintenance,
    Error,
}

#[derive(Debug, Deserialize, Serialize)]
struct StationArgs {
    station_id: String,
}

#[derive(Debug, Deserialize, Serialize)]
struct OptionalStationArgs {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    station_id: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
struct StatusArgs {
    status: StationStatus,
}

#[derive(Debug, Deserialize, Serialize)]
struct LimitArgs {
    #[serde(default)]
    limit: Option<u32>,
}

fn non_empty(field: &str, value: &str) -> Result<(), ToolArgError> {
    if value.trim().is_empty() {
        Err(ToolArgError::Invalid(format!(
            "{} must be a non-empty string",
            field
        )))
    } else {
        Ok(())
    }
}

fn parse<T: serde::de::DeserializeOwned>(args: &Value) -> Result<T, ToolArgError> {
    serde_json::from_value(args.clone()).map_err(|e| ToolArgError::Invalid(e.to_string()))
}

fn serialize<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or_else(|_| json!({}))
}

fn validate_limit(args: &Value, default: u32) -> Result<Value, ToolArgError> {
    let parsed: LimitArgs = parse(args)?;
    let limit = parsed.limit.unwrap_or(default);
    if !(1..=500).contains(&limit) {
        return Err(ToolArgError::Invalid(format!(
            "limit must be between 1 and 500, got {}",
            limit
        )));
    }
    Ok(json!({ "limit": limit }))
}

/// Validates and sanitizes tool arguments coming from the model.
///
/// Returns the sanitized arguments on success. Unknown tool names and
/// malformed arguments are errors with a human-readable message.
pub fn validate_tool_args(tool_name: &str, raw_args: &Value) -> Result<Value, ToolArgError> {
    // Null stands in for "no arguments" so callers can pass parse fallbacks through.
    let empty = json!({});
    let args = if raw_args.is_null() { &empty } else { raw_args };
    if !args.is_object() {
        return Err(ToolArgError::Invalid(format!(
            "arguments must be a JSON object, got {}",
            args
        )));
    }

    match tool_name {
        "get_all_stations"
        | "get_production_metrics"
        | "find_bottleneck"
        | "get_maintenance_schedule"
        | "get_scrap_summary"
        | "get_product_mix" => Ok(json!({})),

        "get_station" | "get_station_status" | "get_station_energy" => {
            let parsed: StationArgs = parse(args)?;
            non_empty("station_id", &parsed.station_id)?;
            Ok(serialize(&parsed))
        }

        "calculate_oee" => {
            let parsed: OptionalStationArgs = parse(args)?;
            if let Some(ref id) = parsed.station_id {
                non_empty("station_id", id)?;
            }
            Ok(serialize(&parsed))
        }

        "get_stations_by_status" => {
            let parsed: StatusArgs = parse(args)?;
            Ok(serialize(&parsed))
        }

        "get_recent_runs" => validate_limit(args, 5),
        "get_alarm_log" => validate_limit(args, 10),

        other => Err(ToolArgError::UnknownTool(other.to_string())),
    }
}
