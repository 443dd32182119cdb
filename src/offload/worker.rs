//! Background execution
//!
//! [`BackgroundWorker`] runs each request on tokio's blocking pool. Results
//! flow back through a response channel to a router task, which hands each
//! one to whoever is waiting on that `requestId`. Requests run concurrently
//! and may complete in any order.

use super::protocol::{OffloadRequest, OffloadResponse};
use crate::error::{MapError, MapResult};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot, Mutex};
use tracing::{debug, warn};
use uuid::Uuid;

/// Anything that can run an [`OffloadRequest`] somewhere else and answer
/// with the matching [`OffloadResponse`].
#[async_trait]
pub trait TaskExecutor: Send + Sync {
    async fn submit(&self, request: OffloadRequest) -> MapResult<OffloadResponse>;
}

type PendingMap = Arc<Mutex<HashMap<Uuid, oneshot::Sender<OffloadResponse>>>>;

pub struct BackgroundWorker {
    requests: mpsc::Sender<OffloadRequest>,
    pending: PendingMap,
}

impl BackgroundWorker {
    /// Start the worker and its response router on the current runtime.
    ///
    /// Fails with [`MapError::WorkerUnavailable`] outside a tokio runtime.
    pub fn spawn(capacity: usize) -> MapResult<Self> {
        let handle = Handle::try_current()
            .map_err(|e| MapError::WorkerUnavailable(format!("no tokio runtime: {}", e)))?;

        let (request_tx, request_rx) = mpsc::channel(capacity.max(1));
        let (response_tx, response_rx) = mpsc::channel(capacity.max(1));
        let pending: PendingMap = Arc::new(Mutex::new(HashMap::new()));

        handle.spawn(Self::run_loop(request_rx, response_tx));
        handle.spawn(Self::route_responses(response_rx, Arc::clone(&pending)));

        Ok(Self {
            requests: request_tx,
            pending,
        })
    }

    /// Requests submitted but not yet answered
    pub async fn pending_count(&self) -> usize {
        self.pending.lock().await.len()
    }

    async fn run_loop(
        mut requests: mpsc::Receiver<OffloadRequest>,
        responses: mpsc::Sender<OffloadResponse>,
    ) {
        while let Some(request) = requests.recv().await {
            let responses = responses.clone();
            tokio::spawn(async move {
                let request_id = request.request_id;
                let operation = request.task.operation();
                let started = Instant::now();

                let job = tokio::task::spawn_blocking(move || request.task.run());
                let response = match job.await {
                    Ok(Ok(output)) => OffloadResponse::result(request_id, output),
                    Ok(Err(e)) => OffloadResponse::error(request_id, e.to_string()),
                    Err(e) => {
                        OffloadResponse::error(request_id, format!("worker task aborted: {}", e))
                    }
                };
                debug!(
                    "background {} for request {} finished in {:?}",
                    operation,
                    request_id,
                    started.elapsed()
                );

                if responses.send(response).await.is_err() {
                    warn!(
                        "response router gone, dropping result for request {}",
                        request_id
                    );
                }
            });
        }
        debug!("background worker request channel closed");
    }

    async fn route_responses(mut responses: mpsc::Receiver<OffloadResponse>, pending: PendingMap) {
        while let Some(response) = responses.recv().await {
            let waiter = pending.lock().await.remove(&response.request_id);
            match waiter {
                Some(tx) => {
                    // receiver may have given up; nothing to do then
                    let _ = tx.send(response);
                }
                None => debug!("no caller waiting on request {}", response.request_id),
            }
        }
    }
}

#[async_trait]
impl TaskExecutor for BackgroundWorker {
    async fn submit(&self, request: OffloadRequest) -> MapResult<OffloadResponse> {
        let request_id = request.request_id;
        let (tx, rx) = oneshot::channel();
        self.pending.lock().await.insert(request_id, tx);

        if self.requests.send(request).await.is_err() {
            self.pending.lock().await.remove(&request_id);
            return Err(MapError::WorkerUnavailable(
                "background worker has shut down".to_string(),
            ));
        }

        rx.await.map_err(|_| {
            MapError::WorkerUnavailable(format!("worker dropped request {}", request_id))
        })
    }
}

/// Runs the request on the caller's task. Useful where no background
/// context exists and in tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct InlineExecutor;

#[async_trait]
impl TaskExecutor for InlineExecutor {
    async fn submit(&self, request: OffloadRequest) -> MapResult<OffloadResponse> {
        Ok(match request.task.run() {
            Ok(output) => OffloadResponse::result(request.request_id, output),
            Err(e) => OffloadResponse::error(request.request_id, e.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::MetricKind;
    use crate::config::AnalyticsConfig;
    use crate::graph::{Edge, MapData, Node, NodeType};
    use crate::offload::protocol::{OffloadTask, Outcome, TaskOutput};

    fn star(leaves: usize) -> MapData {
        let mut nodes = vec![Node::new("hub", NodeType::Team, "Hub")];
        let mut edges = Vec::new();
        for i in 0..leaves {
            nodes.push(Node::new(format!("l{}", i), NodeType::User, ""));
            edges.push(Edge::new("hub", format!("l{}", i)));
        }
        MapData::new(nodes, edges)
    }

    fn degree_request(data: MapData) -> OffloadRequest {
        OffloadRequest::new(OffloadTask::CalculateMetric {
            data,
            kind: MetricKind::Degree,
            config: AnalyticsConfig::default(),
        })
    }

    #[tokio::test]
    async fn test_response_matches_request_id() {
        let worker = BackgroundWorker::spawn(8).unwrap();
        let request = degree_request(star(4));
        let id = request.request_id;

        let response = worker.submit(request).await.unwrap();
        assert_eq!(response.request_id, id);
        match response.outcome {
            Outcome::Result(TaskOutput::Metric(values)) => assert_eq!(values["hub"], 1.0),
            other => panic!("unexpected outcome {:?}", other),
        }
        assert_eq!(worker.pending_count().await, 0);
    }

    #[tokio::test]
    async fn test_concurrent_requests_are_routed() {
        let worker = BackgroundWorker::spawn(4).unwrap();
        let requests: Vec<_> = (1..=6).map(|n| degree_request(star(n))).collect();
        let ids: Vec<Uuid> = requests.iter().map(|r| r.request_id).collect();

        let responses =
            futures::future::join_all(requests.into_iter().map(|r| worker.submit(r))).await;
        for (id, response) in ids.iter().zip(responses) {
            let response = response.unwrap();
            assert_eq!(response.request_id, *id);
            assert!(matches!(response.outcome, Outcome::Result(_)));
        }
    }

    #[tokio::test]
    async fn test_failure_is_reported_as_error_response() {
        let worker = BackgroundWorker::spawn(1).unwrap();
        let mut data = star(2);
        data.nodes[2].id = "hub".to_string();

        let response = worker.submit(degree_request(data)).await.unwrap();
        match response.outcome {
            Outcome::Error(message) => assert!(message.contains("hub")),
            other => panic!("expected error, got {:?}", other),
        }
    }

    #[test]
    fn test_spawn_outside_runtime_is_unavailable() {
        assert!(matches!(
            BackgroundWorker::spawn(1),
            Err(MapError::WorkerUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_inline_executor() {
        let request = degree_request(star(3));
        let id = request.request_id;
        let response = InlineExecutor.submit(request).await.unwrap();
        assert_eq!(response.request_id, id);
    }
}
