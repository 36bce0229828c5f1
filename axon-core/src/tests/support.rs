use super::*;
use crate::activation::sigmoid;
use crate::OutputHookFn;
use axon_protocol::{InactiveConnection, NodeRecord};
use std::collections::HashMap;
use std::sync::Mutex;
use tokio::sync::mpsc;

pub(super) const SIGMOID: ActivationFunctionId = ActivationFunctionId(0);
pub(super) const IDENTITY: ActivationFunctionId = ActivationFunctionId(1);
pub(super) const SYNC: SyncFunctionId = SyncFunctionId(0);
pub(super) const HOOK: OutputHookId = OutputHookId(0);

pub(super) fn quiet_log() -> InfoLogSink {
    Arc::new(|_| {})
}

/// Sink that appends every line to a shared buffer for assertions.
pub(super) fn memory_log() -> (InfoLogSink, Arc<Mutex<Vec<String>>>) {
    let lines = Arc::new(Mutex::new(Vec::new()));
    let captured = Arc::clone(&lines);
    let sink: InfoLogSink = Arc::new(move |line| {
        captured.lock().expect("log buffer").push(line);
    });
    (sink, lines)
}

/// Output hook that forwards every fired value to a channel the test can
/// await on.
pub(super) fn output_probe() -> (OutputHookFn, mpsc::UnboundedReceiver<f32>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let hook: OutputHookFn = Arc::new(move |value| {
        let _ = tx.send(value);
    });
    (hook, rx)
}

pub(super) fn base_registry() -> FunctionRegistry {
    FunctionRegistry::new()
        .with_activation(SIGMOID, Arc::new(sigmoid))
        .with_activation(IDENTITY, Arc::new(|x| x))
}

pub(super) fn spawn_neuron(
    id: u64,
    layer: i32,
    bias: f32,
    activation: ActivationFunctionId,
    learning: LearningAlgorithm,
) -> NodeHandle {
    let record = neuron_record(NodeId(id), layer, bias, activation, learning);
    spawn_node(&record, &base_registry(), quiet_log(), EngineTuning::default())
        .expect("spawn neuron")
}

pub(super) fn spawn_sensor(id: u64, layer: i32, data: Vec<f32>) -> NodeHandle {
    let registry = base_registry().with_sync(SYNC, Arc::new(move || data.clone()));
    let record = sensor_record(NodeId(id), layer, SYNC, None);
    spawn_node(&record, &registry, quiet_log(), EngineTuning::default()).expect("spawn sensor")
}

pub(super) fn spawn_actuator(id: u64, layer: i32) -> (NodeHandle, mpsc::UnboundedReceiver<f32>) {
    let (hook, outputs) = output_probe();
    let registry = base_registry().with_output_hook(HOOK, hook);
    let record = actuator_record(NodeId(id), layer, HOOK);
    let handle =
        spawn_node(&record, &registry, quiet_log(), EngineTuning::default()).expect("spawn actuator");
    (handle, outputs)
}

/// Look up the connection id a node stores for the given source, via its
/// record snapshot.
pub(super) async fn inbound_id_from(node: &NodeHandle, source: &NodeHandle) -> NeuronConnectionId {
    let record = node.node_record().await.expect("node record");
    *record
        .inbound
        .iter()
        .find(|(_, connection)| connection.source == source.node_id())
        .map(|(id, _)| id)
        .expect("connection from source")
}

pub(super) async fn recv_output(outputs: &mut mpsc::UnboundedReceiver<f32>) -> f32 {
    tokio::time::timeout(Duration::from_secs(2), outputs.recv())
        .await
        .expect("output within deadline")
        .expect("output channel open")
}

pub(super) async fn assert_no_output(outputs: &mut mpsc::UnboundedReceiver<f32>) {
    let quiet = tokio::time::timeout(Duration::from_millis(100), outputs.recv()).await;
    assert!(quiet.is_err(), "expected no output, got {quiet:?}");
}

/// Build a neuron record whose inbound map is pre-populated, for hydration
/// tests.
pub(super) fn hydratable_neuron_record(
    id: u64,
    entries: &[(NodeId, f32, u32)],
) -> (NodeRecord, Vec<NeuronConnectionId>) {
    let mut inbound = HashMap::new();
    let mut ids = Vec::new();
    for &(source, weight, order) in entries {
        let connection_id = NeuronConnectionId::generate();
        ids.push(connection_id);
        inbound.insert(
            connection_id,
            InactiveConnection {
                source,
                weight,
                order,
            },
        );
    }
    let mut record = neuron_record(
        NodeId(id),
        1,
        0.0,
        IDENTITY,
        LearningAlgorithm::NoLearning,
    );
    record.inbound = inbound;
    (record, ids)
}
