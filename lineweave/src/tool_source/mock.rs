//! Mock tool source with canned production-line fixtures.
//!
//! Serves the demo capability set (stations, metrics, OEE, bottleneck,
//! alarms, …) from in-memory JSON. Tests inject per-tool failures and
//! delays to exercise degraded paths and the invocation timeout.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use super::{ToolSource, ToolSourceError, ToolSpec};

fn object_schema(properties: Value, required: &[&str]) -> Value {
    json!({ "type": "object", "properties": properties, "required": required })
}

/// The demo capability set: names, descriptions, and argument schemas.
pub fn demo_tool_specs() -> Vec<ToolSpec> {
    vec![
        ToolSpec {
            name: "get_all_stations".into(),
            description: Some("Get the list of all stations on the line".into()),
            input_schema: object_schema(json!({}), &[]),
        },
        ToolSpec {
            name: "get_station_status".into(),
            description: Some("Get the current status of a station".into()),
            input_schema: object_schema(
                json!({"station_id": {"type": "string", "description": "Station ID, e.g. ST001"}}),
                &["station_id"],
            ),
        },
        ToolSpec {
            name: "get_production_metrics".into(),
            description: Some(
                "Get overall production metrics: units produced, efficiency, downtime, quality rate"
                    .into(),
            ),
            input_schema: object_schema(json!({}), &[]),
        },
        ToolSpec {
            name: "calculate_oee".into(),
            description: Some(
                "Calculate Overall Equipment Effectiveness for a station or the whole line".into(),
            ),
            input_schema: object_schema(
                json!({"station_id": {"type": "string", "description": "Optional station ID"}}),
                &[],
            ),
        },
        ToolSpec {
            name: "find_bottleneck".into(),
            description: Some(
                "Identify the production bottleneck (station with lowest throughput)".into(),
            ),
            input_schema: object_schema(json!({}), &[]),
        },
        ToolSpec {
            name: "get_maintenance_schedule".into(),
            description: Some("Get upcoming maintenance windows".into()),
            input_schema: object_schema(json!({}), &[]),
        },
        ToolSpec {
            name: "get_alarm_log".into(),
            description: Some("Get recent alarms and downtime events".into()),
            input_schema: object_schema(
                json!({"limit": {"type": "integer", "description": "Max entries (1-500)"}}),
                &[],
            ),
        },
        ToolSpec {
            name: "get_scrap_summary".into(),
            description: Some("Get scrap/defect statistics".into()),
            input_schema: object_schema(json!({}), &[]),
        },
    ]
}

fn demo_fixtures() -> HashMap<String, Value> {
    let mut data = HashMap::new();
    data.insert(
        "get_all_stations".to_string(),
        json!([
            {"station_id": "ST001", "name": "Assembly", "status": "running"},
            {"station_id": "ST002", "name": "Welding", "status": "running"},
            {"station_id": "ST003", "name": "Painting", "status": "maintenance"},
            {"station_id": "ST004", "name": "Inspection", "status": "running"},
            {"station_id": "ST005", "name": "Packaging", "status": "idle"}
        ]),
    );
    data.insert(
        "get_station_status".to_string(),
        json!({"station_id": "ST003", "status": "maintenance", "since": "2026-08-06T06:40:00Z"}),
    );
    data.insert(
        "get_production_metrics".to_string(),
        json!({
            "units_produced": 1184,
            "target_units": 1250,
            "efficiency_pct": 94.7,
            "downtime_minutes": 23,
            "quality_rate_pct": 98.2
        }),
    );
    data.insert(
        "calculate_oee".to_string(),
        json!({"availability": 0.93, "performance": 0.91, "quality": 0.982, "oee": 0.831}),
    );
    data.insert(
        "find_bottleneck".to_string(),
        json!({"station_id": "ST003", "name": "Painting", "throughput_per_hour": 41, "reason": "maintenance window"}),
    );
    data.insert(
        "get_maintenance_schedule".to_string(),
        json!([{"station_id": "ST003", "window": "2026-08-06T06:00:00Z/2026-08-06T10:00:00Z", "kind": "planned"}]),
    );
    data.insert(
        "get_alarm_log".to_string(),
        json!([
            {"station_id": "ST002", "code": "E-114", "message": "Weld temperature high", "at": "2026-08-06T07:12:09Z"},
            {"station_id": "ST005", "code": "W-021", "message": "Conveyor idle", "at": "2026-08-06T07:40:51Z"}
        ]),
    );
    data.insert(
        "get_scrap_summary".to_string(),
        json!({"scrap_units": 21, "scrap_rate_pct": 1.8, "top_defect": "paint blemish"}),
    );
    data
}

/// Mock tool source: canned specs + fixtures, injectable failures and delays.
pub struct MockToolSource {
    specs: Vec<ToolSpec>,
    fixtures: HashMap<String, Value>,
    failures: Mutex<HashMap<String, ToolSourceError>>,
    delays: HashMap<String, Duration>,
}

impl MockToolSource {
    /// The demo capability set with plausible fixtures.
    pub fn with_demo_tools() -> Self {
        Self {
            specs: demo_tool_specs(),
            fixtures: demo_fixtures(),
            failures: Mutex::new(HashMap::new()),
            delays: HashMap::new(),
        }
    }

    /// A source with explicit specs and fixtures (tests that want full control).
    pub fn with_tools(specs: Vec<ToolSpec>, fixtures: HashMap<String, Value>) -> Self {
        Self {
            specs,
            fixtures,
            failures: Mutex::new(HashMap::new()),
            delays: HashMap::new(),
        }
    }

    /// Makes one tool fail with the given error (builder).
    pub fn with_failure(self, name: &str, error: ToolSourceError) -> Self {
        self.failures
            .lock()
            .expect("mock failures lock")
            .insert(name.to_string(), error);
        self
    }

    /// Delays one tool's reply (builder); pair with a short invoker timeout
    /// to exercise the timeout path.
    pub fn with_delay(mut self, name: &str, delay: Duration) -> Self {
        self.delays.insert(name.to_string(), delay);
        self
    }
}

#[async_trait]
impl ToolSource for MockToolSource {
    async fn list_tools(&self) -> Result<Vec<ToolSpec>, ToolSourceError> {
        Ok(self.specs.clone())
    }

    async fn call_tool(&self, name: &str, _arguments: Value) -> Result<Value, ToolSourceError> {
        if let Some(delay) = self.delays.get(name) {
            tokio::time::sleep(*delay).await;
        }
        if let Some(err) = self.failures.lock().expect("mock failures lock").get(name) {
            return Err(err.clone());
        }
        self.fixtures
            .get(name)
            .cloned()
            .ok_or_else(|| ToolSourceError::NotFound(name.to_string()))
    }
}
