use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Identity of a single directed connection. Generated on the source node at
/// wiring time and shared verbatim with the target, so both endpoints key
/// their barrier and connection lists by the same value.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NeuronConnectionId(Uuid);

impl NeuronConnectionId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for NeuronConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActivationFunctionId(pub u32);

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SyncFunctionId(pub u32);

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OutputHookId(pub u32);

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "node_kind")]
pub enum NodeKind {
    Neuron,
    Sensor { fan_out: u32 },
    Actuator,
}

impl NodeKind {
    pub fn role(&self) -> NodeRole {
        match self {
            NodeKind::Neuron => NodeRole::Neuron,
            NodeKind::Sensor { .. } => NodeRole::Sensor,
            NodeKind::Actuator => NodeRole::Actuator,
        }
    }
}

/// `NodeKind` without the sensor fan-out payload. Carried on node handles,
/// where the live outbound list is the source of truth for fan-out.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum NodeRole {
    Sensor,
    Neuron,
    Actuator,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(tag = "algorithm")]
pub enum LearningAlgorithm {
    NoLearning,
    Hebbian { rate: f32 },
}

/// How an incoming synapse may trigger activation. Every input message
/// carries one of these; `OnSoleInbound` exists so the recurrent bootstrap
/// can fire neurons whose only input is a feedback edge.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum FireRule {
    OnFullBarrier,
    OnSoleInbound,
    Never,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum NodeStatus {
    Ready,
    Busy,
}

/// Persistent form of one inbound connection. The single stored weight
/// becomes both the initial and the current weight on hydration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct InactiveConnection {
    pub source: NodeId,
    pub weight: f32,
    pub order: u32,
}

/// Persistent form of a node. Callables are referenced by id; resolving them
/// back into functions is the caller's business.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NodeRecord {
    pub node_id: NodeId,
    pub layer: i32,
    pub kind: NodeKind,
    pub inbound: HashMap<NeuronConnectionId, InactiveConnection>,
    pub bias: Option<f32>,
    pub activation_function: Option<ActivationFunctionId>,
    pub sync_function: Option<SyncFunctionId>,
    pub output_hook: Option<OutputHookId>,
    pub max_vector_length: Option<u32>,
    pub learning: LearningAlgorithm,
}
