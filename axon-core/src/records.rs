use crate::activation::ActivationFn;
use crate::{OutputHookFn, SyncFn};
use axon_protocol::{
    ActivationFunctionId, LearningAlgorithm, NodeId, NodeKind, NodeRecord, OutputHookId,
    SyncFunctionId,
};
use std::collections::HashMap;

/// Resolves the callable ids stored in node records back into functions.
/// Supplied by the caller at spawn time; the core never owns behaviour, only
/// references it.
#[derive(Clone, Default)]
pub struct FunctionRegistry {
    pub activation: HashMap<ActivationFunctionId, ActivationFn>,
    pub sync: HashMap<SyncFunctionId, SyncFn>,
    pub output: HashMap<OutputHookId, OutputHookFn>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_activation(mut self, id: ActivationFunctionId, function: ActivationFn) -> Self {
        self.activation.insert(id, function);
        self
    }

    pub fn with_sync(mut self, id: SyncFunctionId, function: SyncFn) -> Self {
        self.sync.insert(id, function);
        self
    }

    pub fn with_output_hook(mut self, id: OutputHookId, hook: OutputHookFn) -> Self {
        self.output.insert(id, hook);
        self
    }
}

/// Fresh sensor record: no inbound, fan-out grows as wiring attaches
/// connections.
pub fn sensor_record(
    node_id: NodeId,
    layer: i32,
    sync_function: SyncFunctionId,
    max_vector_length: Option<u32>,
) -> NodeRecord {
    NodeRecord {
        node_id,
        layer,
        kind: NodeKind::Sensor { fan_out: 0 },
        inbound: HashMap::new(),
        bias: None,
        activation_function: None,
        sync_function: Some(sync_function),
        output_hook: None,
        max_vector_length,
        learning: LearningAlgorithm::NoLearning,
    }
}

pub fn neuron_record(
    node_id: NodeId,
    layer: i32,
    bias: f32,
    activation_function: ActivationFunctionId,
    learning: LearningAlgorithm,
) -> NodeRecord {
    NodeRecord {
        node_id,
        layer,
        kind: NodeKind::Neuron,
        inbound: HashMap::new(),
        bias: Some(bias),
        activation_function: Some(activation_function),
        sync_function: None,
        output_hook: None,
        max_vector_length: None,
        learning,
    }
}

pub fn actuator_record(node_id: NodeId, layer: i32, output_hook: OutputHookId) -> NodeRecord {
    NodeRecord {
        node_id,
        layer,
        kind: NodeKind::Actuator,
        inbound: HashMap::new(),
        bias: None,
        activation_function: None,
        sync_function: None,
        output_hook: Some(output_hook),
        max_vector_length: None,
        learning: LearningAlgorithm::NoLearning,
    }
}
