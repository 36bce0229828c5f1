use crate::activation::{default_activation, ActivationFn};
use crate::records::FunctionRegistry;
use crate::tuning::EngineTuning;
use crate::{EngineError, InfoLogSink, OutputHookFn, SyncFn};
use axon_protocol::{
    ActivationFunctionId, FireRule, InactiveConnection, LearningAlgorithm, NeuronConnectionId,
    NodeId, NodeKind, NodeRecord, NodeRole, NodeStatus, OutputHookId, SyncFunctionId,
};
use std::collections::HashMap;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error};

const DEFAULT_BIAS: f32 = 0.0;

type Barrier = HashMap<NeuronConnectionId, f32>;
type ReplyTo<T> = oneshot::Sender<T>;

/// Live outbound edge: everything needed to post a synapse to the target.
#[derive(Debug, Clone)]
pub struct OutboundConnection {
    pub id: NeuronConnectionId,
    /// Ordinal within a sensor's fan-out; always 0 on non-sensor sources.
    pub order: u32,
    pub initial_weight: f32,
    pub target_id: NodeId,
    pub(crate) target: mpsc::UnboundedSender<NodeMessage>,
}

/// Live inbound edge. `weight` drifts under learning; `initial_weight` is
/// what a reset restores.
#[derive(Debug, Clone, PartialEq)]
pub struct InboundConnection {
    pub id: NeuronConnectionId,
    pub order: u32,
    pub source: NodeId,
    pub initial_weight: f32,
    pub weight: f32,
}

/// Actuator firing gate. `RegisterCortex` moves `Ungated` to `Waiting`; a
/// satisfied barrier moves any gated actuator to `Ready`; firing via
/// `ActivateActuator` returns it to `Waiting`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ActuatorGate {
    Ungated,
    Waiting,
    Ready,
}

pub(crate) enum NodeMessage {
    Sync {
        reply: ReplyTo<Result<(), EngineError>>,
    },
    ReceiveInput {
        connection_id: NeuronConnectionId,
        value: f32,
        fire_rule: FireRule,
    },
    AddOutboundConnection {
        target: NodeHandle,
        weight: f32,
        reply: ReplyTo<()>,
    },
    AddInboundConnection {
        connection: InboundConnection,
        reply: ReplyTo<()>,
    },
    NodeRecordRequest {
        reply: ReplyTo<NodeRecord>,
    },
    Die {
        reply: ReplyTo<()>,
    },
    RegisterCortex {
        reply: ReplyTo<()>,
    },
    ActivateActuator {
        reply: ReplyTo<()>,
    },
    StatusRequest {
        check_actuators: bool,
        reply: ReplyTo<NodeStatus>,
    },
    ResetNeuron {
        reply: ReplyTo<()>,
    },
    SendRecurrentSignals {
        reply: ReplyTo<()>,
    },
}

/// Cheap, cloneable address of a node actor.
#[derive(Debug, Clone)]
pub struct NodeHandle {
    node_id: NodeId,
    layer: i32,
    role: NodeRole,
    tx: mpsc::UnboundedSender<NodeMessage>,
}

impl NodeHandle {
    pub fn node_id(&self) -> NodeId {
        self.node_id
    }

    pub fn layer(&self) -> i32 {
        self.layer
    }

    pub fn role(&self) -> NodeRole {
        self.role
    }

    pub(crate) fn sender(&self) -> mpsc::UnboundedSender<NodeMessage> {
        self.tx.clone()
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(ReplyTo<T>) -> NodeMessage,
    ) -> Result<T, EngineError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(build(reply))
            .map_err(|_| EngineError::NodeUnresponsive(self.node_id))?;
        rx.await.map_err(|_| EngineError::NodeUnresponsive(self.node_id))
    }

    /// Post a synapse to this node without awaiting anything.
    pub fn deliver(&self, connection_id: NeuronConnectionId, value: f32, fire_rule: FireRule) {
        let _ = self.tx.send(NodeMessage::ReceiveInput {
            connection_id,
            value,
            fire_rule,
        });
    }

    /// Sensor: pull one vector from the sync function and fan it out.
    /// Neurons and actuators acknowledge without doing anything.
    pub async fn sync(&self) -> Result<(), EngineError> {
        self.request(|reply| NodeMessage::Sync { reply }).await?
    }

    /// Snapshot the node's current state as a persistent record.
    pub async fn node_record(&self) -> Result<NodeRecord, EngineError> {
        self.request(|reply| NodeMessage::NodeRecordRequest { reply })
            .await
    }

    pub async fn die(&self) -> Result<(), EngineError> {
        self.request(|reply| NodeMessage::Die { reply }).await
    }

    pub async fn register_cortex(&self) -> Result<(), EngineError> {
        self.request(|reply| NodeMessage::RegisterCortex { reply })
            .await
    }

    pub async fn activate_actuator(&self) -> Result<(), EngineError> {
        self.request(|reply| NodeMessage::ActivateActuator { reply })
            .await
    }

    pub async fn status(&self, check_actuators: bool) -> Result<NodeStatus, EngineError> {
        self.request(|reply| NodeMessage::StatusRequest {
            check_actuators,
            reply,
        })
        .await
    }

    /// Restore initial weights, clear both barriers, and drop anything still
    /// queued in the mailbox.
    pub async fn reset(&self) -> Result<(), EngineError> {
        self.request(|reply| NodeMessage::ResetNeuron { reply }).await
    }

    /// Post a zero synapse along every recurrent outbound edge.
    pub async fn send_recurrent_signals(&self) -> Result<(), EngineError> {
        self.request(|reply| NodeMessage::SendRecurrentSignals { reply })
            .await
    }

    pub(crate) async fn add_outbound(
        &self,
        target: NodeHandle,
        weight: f32,
    ) -> Result<(), EngineError> {
        self.request(|reply| NodeMessage::AddOutboundConnection {
            target,
            weight,
            reply,
        })
        .await
    }
}

enum Flow {
    Continue,
    Stop,
}

struct NodeActor {
    node_id: NodeId,
    layer: i32,
    role: NodeRole,
    bias: Option<f32>,
    learning: LearningAlgorithm,
    activation_id: Option<ActivationFunctionId>,
    sync_id: Option<SyncFunctionId>,
    output_hook_id: Option<OutputHookId>,
    activation: ActivationFn,
    sync_fn: Option<SyncFn>,
    output_hook: Option<OutputHookFn>,
    inbound: Vec<InboundConnection>,
    outbound: Vec<OutboundConnection>,
    recurrent_outbound: Vec<OutboundConnection>,
    barrier: Barrier,
    overflow: Barrier,
    max_vector_len: Option<u32>,
    gate: ActuatorGate,
    sink: InfoLogSink,
}

/// Hydrate a record into a live actor task and return its handle.
///
/// Inbound connections are restored from the record (ordered by
/// `(order, id)` so firing iterates deterministically); the outbound side
/// starts empty and is re-established by wiring. Callable ids resolve
/// through `registry`; a sensor without its sync function, an actuator
/// without its output hook, or any named id absent from the registry is a
/// spawn-time error.
pub fn spawn_node(
    record: &NodeRecord,
    registry: &FunctionRegistry,
    sink: InfoLogSink,
    tuning: EngineTuning,
) -> Result<NodeHandle, EngineError> {
    let role = record.kind.role();
    let missing = || EngineError::MissingFunction(record.node_id);

    let activation = match record.activation_function {
        Some(id) => registry.activation.get(&id).cloned().ok_or_else(missing)?,
        None => default_activation(),
    };
    let sync_fn = match record.sync_function {
        Some(id) => Some(registry.sync.get(&id).cloned().ok_or_else(missing)?),
        None => None,
    };
    let output_hook = match record.output_hook {
        Some(id) => Some(registry.output.get(&id).cloned().ok_or_else(missing)?),
        None => None,
    };
    if role == NodeRole::Sensor && sync_fn.is_none() {
        return Err(missing());
    }
    if role == NodeRole::Actuator && output_hook.is_none() {
        return Err(missing());
    }

    let mut inbound: Vec<InboundConnection> = record
        .inbound
        .iter()
        .map(|(id, connection)| InboundConnection {
            id: *id,
            order: connection.order,
            source: connection.source,
            initial_weight: connection.weight,
            weight: connection.weight,
        })
        .collect();
    inbound.sort_by_key(|connection| (connection.order, connection.id));

    let (tx, rx) = mpsc::unbounded_channel();
    let actor = NodeActor {
        node_id: record.node_id,
        layer: record.layer,
        role,
        bias: record.bias,
        learning: record.learning,
        activation_id: record.activation_function,
        sync_id: record.sync_function,
        output_hook_id: record.output_hook,
        activation,
        sync_fn,
        output_hook,
        inbound,
        outbound: Vec::new(),
        recurrent_outbound: Vec::new(),
        barrier: Barrier::new(),
        overflow: Barrier::new(),
        max_vector_len: record.max_vector_length,
        gate: ActuatorGate::Ungated,
        sink,
    };
    tokio::spawn(actor.run(rx, tuning));

    Ok(NodeHandle {
        node_id: record.node_id,
        layer: record.layer,
        role,
        tx,
    })
}

impl NodeActor {
    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<NodeMessage>, tuning: EngineTuning) {
        debug!(node = self.node_id.0, role = ?self.role, "node actor started");
        loop {
            let message = match tokio::time::timeout(tuning.mailbox_poll(), rx.recv()).await {
                Err(_) => continue, // idle poll tick
                Ok(None) => break,  // every handle dropped
                Ok(Some(message)) => message,
            };
            match self.handle(message, &mut rx) {
                Ok(Flow::Continue) => {}
                Ok(Flow::Stop) => break,
                Err(err) => {
                    (self.sink)(format!("node {} terminated: {err}", self.node_id));
                    error!(node = self.node_id.0, %err, "node actor terminated");
                    break;
                }
            }
        }
        debug!(node = self.node_id.0, "node actor stopped");
    }

    fn handle(
        &mut self,
        message: NodeMessage,
        rx: &mut mpsc::UnboundedReceiver<NodeMessage>,
    ) -> Result<Flow, EngineError> {
        match message {
            NodeMessage::Sync { reply } => {
                let result = self.handle_sync();
                let _ = reply.send(result.clone());
                result.map(|()| Flow::Continue)
            }
            NodeMessage::ReceiveInput {
                connection_id,
                value,
                fire_rule,
            } => {
                self.handle_input(connection_id, value, fire_rule)?;
                Ok(Flow::Continue)
            }
            NodeMessage::AddOutboundConnection {
                target,
                weight,
                reply,
            } => {
                self.handle_add_outbound(target, weight, reply);
                Ok(Flow::Continue)
            }
            NodeMessage::AddInboundConnection { connection, reply } => {
                self.inbound.push(connection);
                let _ = reply.send(());
                Ok(Flow::Continue)
            }
            NodeMessage::NodeRecordRequest { reply } => {
                // Snapshot synchronously so no later transition leaks in,
                // then reply off-loop.
                let record = self.snapshot_record();
                tokio::spawn(async move {
                    let _ = reply.send(record);
                });
                Ok(Flow::Continue)
            }
            NodeMessage::Die { reply } => {
                let _ = reply.send(());
                Ok(Flow::Stop)
            }
            NodeMessage::RegisterCortex { reply } => {
                if self.role == NodeRole::Actuator && self.gate == ActuatorGate::Ungated {
                    self.gate = ActuatorGate::Waiting;
                }
                let _ = reply.send(());
                Ok(Flow::Continue)
            }
            NodeMessage::ActivateActuator { reply } => {
                if self.role == NodeRole::Actuator && self.gate == ActuatorGate::Ready {
                    self.invoke_output_hook();
                    self.gate = ActuatorGate::Waiting;
                    self.promote_overflow();
                }
                let _ = reply.send(());
                Ok(Flow::Continue)
            }
            NodeMessage::StatusRequest {
                check_actuators,
                reply,
            } => {
                // Queue length is whatever is behind this probe right now;
                // later arrivals are the next poll's business.
                let settled = rx.is_empty() && self.gate_settled(check_actuators);
                let status = if settled {
                    NodeStatus::Ready
                } else {
                    NodeStatus::Busy
                };
                let _ = reply.send(status);
                Ok(Flow::Continue)
            }
            NodeMessage::ResetNeuron { reply } => {
                for connection in &mut self.inbound {
                    connection.weight = connection.initial_weight;
                }
                self.barrier.clear();
                self.overflow.clear();
                while rx.try_recv().is_ok() {}
                let _ = reply.send(());
                Ok(Flow::Continue)
            }
            NodeMessage::SendRecurrentSignals { reply } => {
                for connection in &self.recurrent_outbound {
                    post_synapse(connection, 0.0, FireRule::OnSoleInbound);
                }
                let _ = reply.send(());
                Ok(Flow::Continue)
            }
        }
    }

    fn handle_sync(&mut self) -> Result<(), EngineError> {
        let Some(sync_fn) = self.sync_fn.clone() else {
            return Ok(());
        };
        if self.role != NodeRole::Sensor {
            return Ok(());
        }
        if self.outbound.is_empty() {
            return Err(EngineError::SensorHasNoOutboundConnections(self.node_id));
        }

        let mut data = sync_fn();
        let raw_len = data.len() as u32;
        self.max_vector_len = Some(self.max_vector_len.unwrap_or(0).max(raw_len));

        let mut ordered: Vec<&OutboundConnection> = self.outbound.iter().collect();
        ordered.sort_by_key(|connection| connection.order);
        if data.len() < ordered.len() {
            data.resize(ordered.len(), 0.0);
        }
        // Excess input values fall off the end of the zip.
        for (connection, value) in ordered.into_iter().zip(data) {
            post_synapse(connection, value, FireRule::OnFullBarrier);
        }
        (self.sink)(format!(
            "sensor {} dispatched {} synapses (raw input length {raw_len})",
            self.node_id,
            self.outbound.len()
        ));
        Ok(())
    }

    fn handle_input(
        &mut self,
        connection_id: NeuronConnectionId,
        value: f32,
        fire_rule: FireRule,
    ) -> Result<(), EngineError> {
        if self.role == NodeRole::Sensor {
            return Err(EngineError::SensorReceivedInput(self.node_id));
        }

        // One synapse per connection per cycle; a second arrival belongs to
        // the next cycle.
        if self.barrier.contains_key(&connection_id) {
            self.overflow.insert(connection_id, value);
        } else {
            self.barrier.insert(connection_id, value);
        }

        let wants_fire = match fire_rule {
            FireRule::OnFullBarrier => true,
            FireRule::OnSoleInbound => self.inbound.len() == 1,
            FireRule::Never => false,
        };
        if wants_fire && self.barrier_satisfied() {
            self.fire()?;
        }
        Ok(())
    }

    fn handle_add_outbound(&mut self, target: NodeHandle, weight: f32, reply: ReplyTo<()>) {
        let connection_id = NeuronConnectionId::generate();
        let order = if self.role == NodeRole::Sensor {
            self.outbound.len() as u32
        } else {
            0
        };
        let outbound = OutboundConnection {
            id: connection_id,
            order,
            initial_weight: weight,
            target_id: target.node_id(),
            target: target.sender(),
        };
        if self.role == NodeRole::Neuron
            && target.role() == NodeRole::Neuron
            && self.layer >= target.layer()
        {
            self.recurrent_outbound.push(outbound.clone());
        }
        self.outbound.push(outbound);

        let inbound = InboundConnection {
            id: connection_id,
            order,
            source: self.node_id,
            initial_weight: weight,
            weight,
        };
        // The wiring caller's reply travels with the inbound half, so the
        // handshake completes only once the target has recorded it.
        let _ = target.sender().send(NodeMessage::AddInboundConnection {
            connection: inbound,
            reply,
        });
    }

    fn barrier_satisfied(&self) -> bool {
        self.inbound
            .iter()
            .all(|connection| self.barrier.contains_key(&connection.id))
    }

    fn fire(&mut self) -> Result<(), EngineError> {
        match self.role {
            NodeRole::Neuron => self.fire_neuron(),
            NodeRole::Actuator => {
                self.fire_actuator();
                Ok(())
            }
            NodeRole::Sensor => Ok(()),
        }
    }

    fn fire_neuron(&mut self) -> Result<(), EngineError> {
        let mut weighted_sum = self.bias.unwrap_or(DEFAULT_BIAS);
        let mut synapses = Vec::with_capacity(self.inbound.len());
        for connection in &self.inbound {
            let Some(&synapse) = self.barrier.get(&connection.id) else {
                return Err(EngineError::MissingInboundConnection {
                    node: self.node_id,
                    connection: connection.id,
                });
            };
            weighted_sum += synapse * connection.weight;
            synapses.push(synapse);
        }

        let output = (self.activation)(weighted_sum);

        if let LearningAlgorithm::Hebbian { rate } = self.learning {
            for (connection, synapse) in self.inbound.iter_mut().zip(&synapses) {
                connection.weight += rate * synapse * output;
            }
        }

        for connection in &self.outbound {
            post_synapse(connection, output, FireRule::OnFullBarrier);
        }
        (self.sink)(format!("neuron {} fired {output}", self.node_id));

        self.promote_overflow();
        Ok(())
    }

    fn fire_actuator(&mut self) {
        match self.gate {
            ActuatorGate::Ungated => {
                self.invoke_output_hook();
                self.promote_overflow();
            }
            // Gated: hold the barrier as-is until the cortex activates us.
            ActuatorGate::Waiting | ActuatorGate::Ready => {
                self.gate = ActuatorGate::Ready;
            }
        }
    }

    fn invoke_output_hook(&self) {
        let sum: f32 = self.barrier.values().sum();
        if let Some(hook) = &self.output_hook {
            hook(sum);
        }
        (self.sink)(format!("actuator {} fired {sum}", self.node_id));
    }

    fn promote_overflow(&mut self) {
        self.barrier = std::mem::take(&mut self.overflow);
    }

    fn snapshot_record(&self) -> NodeRecord {
        let inbound = self
            .inbound
            .iter()
            .map(|connection| {
                (
                    connection.id,
                    InactiveConnection {
                        source: connection.source,
                        weight: connection.weight,
                        order: connection.order,
                    },
                )
            })
            .collect();
        let kind = match self.role {
            NodeRole::Sensor => NodeKind::Sensor {
                fan_out: self.outbound.len() as u32,
            },
            NodeRole::Neuron => NodeKind::Neuron,
            NodeRole::Actuator => NodeKind::Actuator,
        };
        NodeRecord {
            node_id: self.node_id,
            layer: self.layer,
            kind,
            inbound,
            bias: self.bias,
            activation_function: self.activation_id,
            sync_function: self.sync_id,
            output_hook: self.output_hook_id,
            max_vector_length: self.max_vector_len,
            learning: self.learning,
        }
    }

    fn gate_settled(&self, check_actuators: bool) -> bool {
        if self.role != NodeRole::Actuator {
            return true;
        }
        match self.gate {
            ActuatorGate::Ungated => true,
            ActuatorGate::Ready => true,
            ActuatorGate::Waiting => !check_actuators,
        }
    }
}

fn post_synapse(connection: &OutboundConnection, value: f32, fire_rule: FireRule) {
    let _ = connection.target.send(NodeMessage::ReceiveInput {
        connection_id: connection.id,
        value,
        fire_rule,
    });
}
