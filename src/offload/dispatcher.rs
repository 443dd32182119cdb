//! Size-based dispatch between the caller's thread and a background executor

use super::protocol::{OffloadRequest, OffloadTask, Outcome, TaskOutput};
use super::worker::TaskExecutor;
use crate::analytics::{GraphMetrics, MetricKind};
use crate::config::{AnalyticsConfig, EngineConfig, OffloadConfig};
use crate::error::{MapError, MapResult};
use crate::graph::{MapData, Node};
use crate::layout::Layout;
use indexmap::IndexMap;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Routes metrics and layout work for named graphs.
///
/// Graphs above the node threshold go to the executor; the rest run inline.
/// Only the most recent request per graph key is authoritative: an older
/// request that finishes after a newer one was issued resolves to
/// [`MapError::StaleResponse`].
pub struct Dispatcher {
    offload: OffloadConfig,
    analytics: AnalyticsConfig,
    executor: Option<Arc<dyn TaskExecutor>>,
    latest: Mutex<HashMap<String, Uuid>>,
}

impl Dispatcher {
    pub fn new(config: &EngineConfig, executor: Arc<dyn TaskExecutor>) -> Self {
        Self {
            offload: config.offload.clone(),
            analytics: config.analytics.clone(),
            executor: Some(executor),
            latest: Mutex::new(HashMap::new()),
        }
    }

    /// No background executor: large graphs take the reduced-fidelity path
    pub fn synchronous(config: &EngineConfig) -> Self {
        Self {
            offload: config.offload.clone(),
            analytics: config.analytics.clone(),
            executor: None,
            latest: Mutex::new(HashMap::new()),
        }
    }

    pub fn should_offload(&self, node_count: usize) -> bool {
        self.offload.enabled && node_count > self.offload.node_threshold
    }

    pub async fn calculate_all_metrics(
        &self,
        graph_key: &str,
        data: MapData,
    ) -> MapResult<GraphMetrics> {
        let task = OffloadTask::CalculateAllMetrics {
            data,
            config: self.analytics.clone(),
        };
        match self.dispatch(graph_key, task).await? {
            (_, TaskOutput::Metrics(metrics)) => Ok(metrics),
            (request_id, other) => Err(unexpected_output(request_id, &other)),
        }
    }

    pub async fn calculate_metric(
        &self,
        graph_key: &str,
        data: MapData,
        kind: MetricKind,
    ) -> MapResult<IndexMap<String, f64>> {
        let task = OffloadTask::CalculateMetric {
            data,
            kind,
            config: self.analytics.clone(),
        };
        match self.dispatch(graph_key, task).await? {
            (_, TaskOutput::Metric(values)) => Ok(values),
            (request_id, other) => Err(unexpected_output(request_id, &other)),
        }
    }

    pub async fn layout(
        &self,
        graph_key: &str,
        data: MapData,
        layout: Layout,
    ) -> MapResult<Vec<Node>> {
        match self.dispatch(graph_key, OffloadTask::Layout { data, layout }).await? {
            (_, TaskOutput::Layout(nodes)) => Ok(nodes),
            (request_id, other) => Err(unexpected_output(request_id, &other)),
        }
    }

    async fn dispatch(
        &self,
        graph_key: &str,
        task: OffloadTask,
    ) -> MapResult<(Uuid, TaskOutput)> {
        let request_id = Uuid::new_v4();
        self.latest
            .lock()
            .await
            .insert(graph_key.to_string(), request_id);

        let node_count = task.node_count();
        let output = if self.should_offload(node_count) {
            info!(
                "offloading {} for graph '{}' ({} nodes, request {})",
                task.operation(),
                graph_key,
                node_count,
                request_id
            );
            let offloaded = self.offload_task(request_id, &task).await;
            match offloaded {
                Ok(output) => output,
                Err(e) => {
                    warn!(
                        "background {} failed, retrying synchronously with reduced fidelity: {}",
                        task.operation(),
                        e
                    );
                    self.retry_in_place(request_id, task).await?
                }
            }
        } else {
            // at or below the threshold the work is cheap enough for the caller's task
            debug!(
                "running {} inline for graph '{}' ({} nodes)",
                task.operation(),
                graph_key,
                node_count
            );
            task.run_fail_soft()?
        };

        match self.latest.lock().await.get(graph_key) {
            Some(latest) if *latest != request_id => {
                debug!(
                    "discarding stale response {} for graph '{}'",
                    request_id, graph_key
                );
                Err(MapError::StaleResponse(request_id))
            }
            _ => Ok((request_id, output)),
        }
    }

    /// Reduced-fidelity run on the blocking pool, so a large graph never
    /// stalls the caller's runtime thread.
    async fn retry_in_place(&self, request_id: Uuid, task: OffloadTask) -> MapResult<TaskOutput> {
        let task = task.with_reduced_fidelity(&self.offload);
        tokio::task::spawn_blocking(move || task.run_fail_soft())
            .await
            .map_err(|e| MapError::WorkerFailed {
                request_id,
                message: format!("synchronous retry aborted: {}", e),
            })?
    }

    async fn offload_task(&self, request_id: Uuid, task: &OffloadTask) -> MapResult<TaskOutput> {
        let executor = self.executor.as_ref().ok_or_else(|| {
            MapError::WorkerUnavailable("no background executor configured".to_string())
        })?;

        let response = executor
            .submit(OffloadRequest {
                request_id,
                task: task.clone(),
            })
            .await?;

        if response.request_id != request_id {
            return Err(MapError::WorkerFailed {
                request_id,
                message: format!("response carried request id {}", response.request_id),
            });
        }
        match response.outcome {
            Outcome::Result(output) if output.operation() == task.operation() => Ok(output),
            Outcome::Result(output) => Err(unexpected_output(request_id, &output)),
            Outcome::Error(message) => Err(MapError::WorkerFailed {
                request_id,
                message,
            }),
        }
    }
}

fn unexpected_output(request_id: Uuid, output: &TaskOutput) -> MapError {
    MapError::WorkerFailed {
        request_id,
        message: format!("unexpected {} output", output.operation()),
    }
}
