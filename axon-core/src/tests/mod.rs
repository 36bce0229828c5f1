pub(super) use crate::network::NeuralNetwork;
pub(super) use crate::node::{spawn_node, NodeHandle};
pub(super) use crate::records::{actuator_record, neuron_record, sensor_record, FunctionRegistry};
pub(super) use crate::tuning::EngineTuning;
pub(super) use crate::wiring::{connect_node_to_actuator, connect_node_to_node, connect_sensor_to_node};
pub(super) use crate::{EngineError, InfoLogSink};
pub(super) use axon_protocol::{
    ActivationFunctionId, FireRule, LearningAlgorithm, NeuronConnectionId, NodeId, NodeKind,
    NodeStatus, OutputHookId, SyncFunctionId,
};
pub(super) use std::sync::Arc;
pub(super) use std::time::Duration;

mod records_and_hydration;
mod support;
