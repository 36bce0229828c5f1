use axon_protocol::{NeuronConnectionId, NodeId};
use std::sync::Arc;
use thiserror::Error;

pub mod activation;
pub mod network;
pub mod node;
pub mod records;
pub mod tuning;
pub mod wiring;

#[cfg(test)]
mod tests;

pub use activation::{sigmoid, ActivationFn};
pub use network::NeuralNetwork;
pub use node::{spawn_node, InboundConnection, NodeHandle, OutboundConnection};
pub use records::{actuator_record, neuron_record, sensor_record, FunctionRegistry};
pub use tuning::EngineTuning;

/// External data source feeding a sensor. Called once per sync tick; the
/// returned vector may be shorter or longer than the sensor's fan-out.
pub type SyncFn = Arc<dyn Fn() -> Vec<f32> + Send + Sync>;

/// External sink for an actuator's summed barrier.
pub type OutputHookFn = Arc<dyn Fn(f32) + Send + Sync>;

/// Side-band textual trace, one line per event. Custom sinks are invoked from
/// node tasks concurrently; the core only requires `Send + Sync` bounds and
/// makes no further thread-safety promises on the caller's behalf.
pub type InfoLogSink = Arc<dyn Fn(String) + Send + Sync>;

/// The default info log sink: one line per event on stdout.
pub fn stdout_info_log() -> InfoLogSink {
    Arc::new(|line| println!("{line}"))
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum EngineError {
    #[error("node {0} did not reply within the reply budget")]
    NodeUnresponsive(NodeId),
    #[error("sensor {0} has no outbound connections to fan out over")]
    SensorHasNoOutboundConnections(NodeId),
    #[error("node {node} fired without a barrier entry for inbound connection {connection}")]
    MissingInboundConnection {
        node: NodeId,
        connection: NeuronConnectionId,
    },
    #[error("sensor {0} received a synapse input")]
    SensorReceivedInput(NodeId),
    #[error("node {0} references a function id missing from the registry")]
    MissingFunction(NodeId),
}
