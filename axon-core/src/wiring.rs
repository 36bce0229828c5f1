use crate::node::NodeHandle;
use crate::EngineError;

/// Connect `source`'s output to `target`'s input with the given weight.
///
/// Two-phase handshake: the source generates the connection id and appends
/// its outbound half, then forwards the caller's reply to the target, which
/// acks only after recording the inbound half. Once this returns, both
/// endpoints agree on the connection's identity and weight.
pub async fn connect_node_to_node(
    source: &NodeHandle,
    target: &NodeHandle,
    weight: f32,
) -> Result<(), EngineError> {
    source.add_outbound(target.clone(), weight).await
}

/// Actuator inputs are unweighted; the stored weight is fixed at zero.
pub async fn connect_node_to_actuator(
    source: &NodeHandle,
    target: &NodeHandle,
) -> Result<(), EngineError> {
    connect_node_to_node(source, target, 0.0).await
}

/// Wire one connection per weight, in order. The sensor assigns ordinals
/// 0, 1, 2, … as each connection lands, so the supplied weight order is the
/// input-vector alignment from then on.
pub async fn connect_sensor_to_node(
    sensor: &NodeHandle,
    target: &NodeHandle,
    weights: &[f32],
) -> Result<(), EngineError> {
    for &weight in weights {
        connect_node_to_node(sensor, target, weight).await?;
    }
    Ok(())
}
