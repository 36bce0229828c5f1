use crate::node::NodeHandle;
use crate::tuning::EngineTuning;
use crate::EngineError;
use axon_protocol::{NodeRecord, NodeStatus};
use futures::future::join_all;
use std::future::Future;
use std::time::{Duration, Instant};
use tokio::time::{sleep, timeout};
use tracing::debug;

const SETTLE_POLL_PAUSE: Duration = Duration::from_millis(2);

/// A live network: the handles of every node actor plus the timing knobs the
/// coordinator applies to their replies.
#[derive(Debug, Clone)]
pub struct NeuralNetwork {
    nodes: Vec<NodeHandle>,
    tuning: EngineTuning,
}

impl NeuralNetwork {
    pub fn new(nodes: Vec<NodeHandle>) -> Self {
        Self::with_tuning(nodes, EngineTuning::default())
    }

    pub fn with_tuning(nodes: Vec<NodeHandle>, tuning: EngineTuning) -> Self {
        Self { nodes, tuning }
    }

    pub fn nodes(&self) -> &[NodeHandle] {
        &self.nodes
    }

    /// Poll every node until all report ready, or until the optional think
    /// budget elapses (`Ok(false)`). A node that misses the reply budget is
    /// fatal.
    ///
    /// Readiness is observed per node as its probe is handled; messages that
    /// arrive behind a probe are only seen by the next poll, so one pass of
    /// all-ready is quiescence only because we re-poll until it holds.
    pub async fn wait_until_settled(
        &self,
        check_actuators: bool,
        think_budget: Option<Duration>,
    ) -> Result<bool, EngineError> {
        let started = Instant::now();
        loop {
            let mut all_ready = true;
            for node in &self.nodes {
                let status = timeout(self.tuning.reply_budget(), node.status(check_actuators))
                    .await
                    .map_err(|_| EngineError::NodeUnresponsive(node.node_id()))??;
                if status == NodeStatus::Busy {
                    all_ready = false;
                    break;
                }
            }
            if all_ready {
                return Ok(true);
            }
            if let Some(budget) = think_budget {
                if started.elapsed() >= budget {
                    debug!("think budget elapsed before the network settled");
                    return Ok(false);
                }
            }
            sleep(SETTLE_POLL_PAUSE).await;
        }
    }

    /// Broadcast a sync tick to every node in parallel. Sensors fan out
    /// their input vectors; everything else acks and moves on.
    pub async fn synchronize(&self) -> Result<(), EngineError> {
        self.broadcast(|node| node.sync()).await.map(|_| ())
    }

    /// Broadcast `ActivateActuator` in parallel. Only cortex-gated actuators
    /// holding a satisfied barrier fire.
    pub async fn activate_actuators(&self) -> Result<(), EngineError> {
        self.broadcast(|node| node.activate_actuator())
            .await
            .map(|_| ())
    }

    /// Register the cortex with every node; only actuators change state.
    /// From then on actuators hold fire until `activate_actuators`.
    pub async fn register_cortex(&self) -> Result<(), EngineError> {
        self.broadcast(|node| node.register_cortex())
            .await
            .map(|_| ())
    }

    /// Prime every recurrent edge with a zero synapse so feedback-only
    /// neurons can fire once and seed their loops.
    pub async fn seed_recurrent_connections(&self) -> Result<(), EngineError> {
        self.broadcast(|node| node.send_recurrent_signals())
            .await
            .map(|_| ())
    }

    /// Snapshot the learned topology: one record per node, in handle order.
    pub async fn node_records(&self) -> Result<Vec<NodeRecord>, EngineError> {
        self.broadcast(|node| node.node_record()).await
    }

    /// Wait for quiescence (actuator readiness not required), then tear every
    /// node down in parallel.
    pub async fn shutdown(self) -> Result<(), EngineError> {
        self.wait_until_settled(false, None).await?;
        self.broadcast(|node| node.die()).await.map(|_| ())
    }

    /// Run one command against every node concurrently, holding each reply to
    /// the tuning's budget.
    async fn broadcast<'a, Fut, T>(
        &'a self,
        command: impl Fn(&'a NodeHandle) -> Fut,
    ) -> Result<Vec<T>, EngineError>
    where
        Fut: Future<Output = Result<T, EngineError>> + 'a,
    {
        let budget = self.tuning.reply_budget();
        let replies = join_all(self.nodes.iter().map(|node| {
            let pending = command(node);
            let node_id = node.node_id();
            async move {
                match timeout(budget, pending).await {
                    Ok(reply) => reply,
                    Err(_) => Err(EngineError::NodeUnresponsive(node_id)),
                }
            }
        }))
        .await;
        replies.into_iter().collect()
    }
}
