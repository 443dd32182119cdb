//! Request/response contract between a caller and a background executor
//!
//! Wire shape:
//!
//! ```json
//! { "requestId": "…", "operation": "layout", "payload": { "data": …, "layout": … } }
//! { "requestId": "…", "result": … }
//! { "requestId": "…", "error": "…" }
//! ```
//!
//! Every request gets exactly one response carrying the same `requestId`.

use crate::analytics::{
    calculate_all_metrics, calculate_all_metrics_or_default, calculate_metric, GraphMetrics,
    MetricKind,
};
use crate::config::{AnalyticsConfig, OffloadConfig};
use crate::error::MapResult;
use crate::graph::{MapData, Node};
use crate::layout::{apply_layout, try_layout, Layout};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Operation names as they appear on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Operation {
    CalculateAllMetrics,
    CalculateMetric,
    Layout,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::CalculateAllMetrics => "calculateAllMetrics",
            Operation::CalculateMetric => "calculateMetric",
            Operation::Layout => "layout",
        };
        write!(f, "{}", name)
    }
}

/// Operation plus its payload. Each task owns its copy of the graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "operation", content = "payload", rename_all = "camelCase")]
pub enum OffloadTask {
    CalculateAllMetrics {
        data: MapData,
        #[serde(default)]
        config: AnalyticsConfig,
    },
    CalculateMetric {
        data: MapData,
        kind: MetricKind,
        #[serde(default)]
        config: AnalyticsConfig,
    },
    Layout { data: MapData, layout: Layout },
}

impl OffloadTask {
    pub fn operation(&self) -> Operation {
        match self {
            OffloadTask::CalculateAllMetrics { .. } => Operation::CalculateAllMetrics,
            OffloadTask::CalculateMetric { .. } => Operation::CalculateMetric,
            OffloadTask::Layout { .. } => Operation::Layout,
        }
    }

    pub fn data(&self) -> &MapData {
        match self {
            OffloadTask::CalculateAllMetrics { data, .. }
            | OffloadTask::CalculateMetric { data, .. }
            | OffloadTask::Layout { data, .. } => data,
        }
    }

    pub fn node_count(&self) -> usize {
        self.data().node_count()
    }

    /// Run at full fidelity, propagating any failure
    pub fn run(&self) -> MapResult<TaskOutput> {
        Ok(match self {
            OffloadTask::CalculateAllMetrics { data, config } => {
                TaskOutput::Metrics(calculate_all_metrics(data, config)?)
            }
            OffloadTask::CalculateMetric { data, kind, config } => {
                TaskOutput::Metric(calculate_metric(data, *kind, config)?)
            }
            OffloadTask::Layout { data, layout } => TaskOutput::Layout(try_layout(data, layout)?),
        })
    }

    /// Run with the fail-soft fallbacks: grid placement for layouts,
    /// empty metrics carrying the error for the aggregate.
    pub fn run_fail_soft(&self) -> MapResult<TaskOutput> {
        Ok(match self {
            OffloadTask::CalculateAllMetrics { data, config } => {
                TaskOutput::Metrics(calculate_all_metrics_or_default(data, config))
            }
            OffloadTask::CalculateMetric { data, kind, config } => {
                TaskOutput::Metric(calculate_metric(data, *kind, config)?)
            }
            OffloadTask::Layout { data, layout } => TaskOutput::Layout(apply_layout(data, layout)),
        })
    }

    /// Same task with iteration budgets capped for a synchronous retry
    pub fn with_reduced_fidelity(self, limits: &OffloadConfig) -> Self {
        let cap = |mut config: AnalyticsConfig| {
            config.eigenvector.max_iterations = config
                .eigenvector
                .max_iterations
                .min(limits.fallback_eigenvector_iterations);
            config
        };
        match self {
            OffloadTask::CalculateAllMetrics { data, config } => OffloadTask::CalculateAllMetrics {
                data,
                config: cap(config),
            },
            OffloadTask::CalculateMetric { data, kind, config } => OffloadTask::CalculateMetric {
                data,
                kind,
                config: cap(config),
            },
            OffloadTask::Layout { data, layout } => {
                let layout =
                    layout.reduced_fidelity(limits.fallback_force_iterations, data.node_count());
                OffloadTask::Layout { data, layout }
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OffloadRequest {
    pub request_id: Uuid,
    #[serde(flatten)]
    pub task: OffloadTask,
}

impl OffloadRequest {
    pub fn new(task: OffloadTask) -> Self {
        OffloadRequest {
            request_id: Uuid::new_v4(),
            task,
        }
    }
}

/// Result payload; the shape follows the operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TaskOutput {
    Layout(Vec<Node>),
    Metrics(GraphMetrics),
    Metric(IndexMap<String, f64>),
}

impl TaskOutput {
    pub fn operation(&self) -> Operation {
        match self {
            TaskOutput::Metrics(_) => Operation::CalculateAllMetrics,
            TaskOutput::Metric(_) => Operation::CalculateMetric,
            TaskOutput::Layout(_) => Operation::Layout,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Outcome {
    Result(TaskOutput),
    Error(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OffloadResponse {
    pub request_id: Uuid,
    #[serde(flatten)]
    pub outcome: Outcome,
}

impl OffloadResponse {
    pub fn result(request_id: Uuid, output: TaskOutput) -> Self {
        OffloadResponse {
            request_id,
            outcome: Outcome::Result(output),
        }
    }

    pub fn error(request_id: Uuid, message: impl Into<String>) -> Self {
        OffloadResponse {
            request_id,
            outcome: Outcome::Error(message.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Edge, NodeType};
    use crate::layout::LayoutStrategy;
    use serde_json::json;

    fn tiny() -> MapData {
        MapData::new(
            vec![
                Node::new("a", NodeType::User, "A"),
                Node::new("b", NodeType::Team, "B"),
            ],
            vec![Edge::new("a", "b")],
        )
    }

    #[test]
    fn test_request_wire_shape() {
        let request = OffloadRequest::new(OffloadTask::CalculateMetric {
            data: tiny(),
            kind: MetricKind::Degree,
            config: AnalyticsConfig::default(),
        });
        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(value["operation"], "calculateMetric");
        assert_eq!(value["requestId"], json!(request.request_id.to_string()));
        assert_eq!(value["payload"]["kind"], "degree");
        assert_eq!(value["payload"]["data"]["nodes"][0]["id"], "a");
    }

    #[test]
    fn test_request_parses_from_wire() {
        let raw = json!({
            "requestId": "67e55044-10b1-426f-9247-bb680e5fe0c8",
            "operation": "layout",
            "payload": {
                "data": {"nodes": [{"id": "x", "type": "goal"}], "edges": []},
                "layout": {"strategy": "grid", "spacing": 10.0}
            }
        });
        let request: OffloadRequest = serde_json::from_value(raw).unwrap();
        assert_eq!(request.task.operation(), Operation::Layout);
        assert_eq!(request.task.node_count(), 1);
    }

    #[test]
    fn test_response_wire_shape() {
        let id = Uuid::new_v4();
        let ok = serde_json::to_value(OffloadResponse::result(
            id,
            TaskOutput::Metric(IndexMap::from([("a".to_string(), 1.0)])),
        ))
        .unwrap();
        assert_eq!(ok["result"]["a"], 1.0);
        assert!(ok.get("error").is_none());

        let err = serde_json::to_value(OffloadResponse::error(id, "boom")).unwrap();
        assert_eq!(err["error"], "boom");
        assert_eq!(err["requestId"], json!(id.to_string()));
    }

    #[test]
    fn test_run_matches_operation() {
        let task = OffloadTask::Layout {
            data: tiny(),
            layout: Layout::from_strategy(LayoutStrategy::Circular, 1),
        };
        let output = task.run().unwrap();
        assert_eq!(output.operation(), task.operation());
    }

    #[test]
    fn test_reduced_fidelity_caps_budgets() {
        let limits = OffloadConfig::default();
        let task = OffloadTask::CalculateAllMetrics {
            data: tiny(),
            config: AnalyticsConfig::default(),
        }
        .with_reduced_fidelity(&limits);
        match task {
            OffloadTask::CalculateAllMetrics { config, .. } => {
                assert_eq!(config.eigenvector.max_iterations, limits.fallback_eigenvector_iterations)
            }
            other => panic!("unexpected task {:?}", other.operation()),
        }
    }

    #[test]
    fn test_fail_soft_layout_on_duplicates() {
        let mut data = tiny();
        data.nodes[1].id = "a".to_string();
        let task = OffloadTask::Layout {
            data,
            layout: Layout::from_strategy(LayoutStrategy::ForceDirected, 1),
        };
        assert!(task.run().is_err());
        match task.run_fail_soft().unwrap() {
            TaskOutput::Layout(nodes) => assert!(nodes.iter().all(|n| n.position().is_some())),
            other => panic!("unexpected output {:?}", other.operation()),
        }
    }
}
