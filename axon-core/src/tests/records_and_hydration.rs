use super::support::*;
use super::*;

#[tokio::test]
async fn record_survives_hydration_and_snapshot() {
    let (record, _ids) = hydratable_neuron_record(
        5,
        &[
            (NodeId(1), 0.25, 0),
            (NodeId(2), -1.5, 0),
        ],
    );
    let neuron = spawn_node(
        &record,
        &base_registry(),
        quiet_log(),
        EngineTuning::default(),
    )
    .expect("spawn neuron");

    let snapshot = neuron.node_record().await.expect("snapshot");
    assert_eq!(snapshot, record);
}

#[tokio::test]
async fn snapshot_round_trips_through_json() {
    let (record, _ids) = hydratable_neuron_record(6, &[(NodeId(1), 2.0, 0)]);
    let neuron = spawn_node(
        &record,
        &base_registry(),
        quiet_log(),
        EngineTuning::default(),
    )
    .expect("spawn neuron");

    let snapshot = neuron.node_record().await.expect("snapshot");
    let json = serde_json::to_string(&snapshot).expect("serialize");
    let parsed: axon_protocol::NodeRecord = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(parsed, snapshot);
}

#[tokio::test]
async fn sensor_snapshot_reports_live_fan_out_and_max_vector_length() {
    let sensor = spawn_sensor(1, 0, vec![1.0, 2.0, 3.0]);
    let neuron = spawn_neuron(2, 1, 0.0, IDENTITY, LearningAlgorithm::NoLearning);
    let (actuator, mut outputs) = spawn_actuator(3, 2);

    connect_sensor_to_node(&sensor, &neuron, &[1.0, 1.0]).await.expect("wire sensor");
    connect_node_to_actuator(&neuron, &actuator).await.expect("wire actuator");

    sensor.sync().await.expect("sync");
    assert_eq!(recv_output(&mut outputs).await, 3.0);

    let record = sensor.node_record().await.expect("record");
    assert_eq!(record.kind, NodeKind::Sensor { fan_out: 2 });
    // Raw input was three values even though only two connections exist.
    assert_eq!(record.max_vector_length, Some(3));
}

#[tokio::test]
async fn max_vector_length_only_grows() {
    let registry = base_registry().with_sync(SYNC, Arc::new(|| vec![0.0]));
    let record = sensor_record(NodeId(1), 0, SYNC, Some(5));
    let sensor =
        spawn_node(&record, &registry, quiet_log(), EngineTuning::default()).expect("spawn sensor");
    let neuron = spawn_neuron(2, 1, 0.0, IDENTITY, LearningAlgorithm::NoLearning);
    let (actuator, mut outputs) = spawn_actuator(3, 2);

    connect_sensor_to_node(&sensor, &neuron, &[1.0]).await.expect("wire sensor");
    connect_node_to_actuator(&neuron, &actuator).await.expect("wire actuator");

    sensor.sync().await.expect("sync");
    assert_eq!(recv_output(&mut outputs).await, 0.0);

    let snapshot = sensor.node_record().await.expect("record");
    assert_eq!(snapshot.max_vector_length, Some(5));
}

#[tokio::test]
async fn missing_registry_function_fails_the_spawn() {
    let record = neuron_record(
        NodeId(9),
        1,
        0.0,
        ActivationFunctionId(99),
        LearningAlgorithm::NoLearning,
    );
    let spawned = spawn_node(
        &record,
        &base_registry(),
        quiet_log(),
        EngineTuning::default(),
    );
    assert_eq!(spawned.err(), Some(EngineError::MissingFunction(NodeId(9))));
}

#[tokio::test]
async fn sensor_without_sync_function_fails_the_spawn() {
    let mut record = sensor_record(NodeId(4), 0, SYNC, None);
    record.sync_function = None;
    let spawned = spawn_node(
        &record,
        &base_registry(),
        quiet_log(),
        EngineTuning::default(),
    );
    assert_eq!(spawned.err(), Some(EngineError::MissingFunction(NodeId(4))));
}

#[tokio::test]
async fn hydrated_connections_keep_their_orders() {
    let (record, ids) = hydratable_neuron_record(
        7,
        &[
            (NodeId(1), 1.0, 2),
            (NodeId(2), 1.0, 0),
            (NodeId(3), 1.0, 1),
        ],
    );
    let neuron = spawn_node(
        &record,
        &base_registry(),
        quiet_log(),
        EngineTuning::default(),
    )
    .expect("spawn neuron");

    let snapshot = neuron.node_record().await.expect("snapshot");
    assert_eq!(snapshot.inbound[&ids[0]].order, 2);
    assert_eq!(snapshot.inbound[&ids[1]].order, 0);
    assert_eq!(snapshot.inbound[&ids[2]].order, 1);
}
