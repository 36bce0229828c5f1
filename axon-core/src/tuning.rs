use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_MAILBOX_POLL_MS: u64 = 250;
const DEFAULT_REPLY_BUDGET_MS: u64 = 500;

/// Engine timing knobs. There are no config files and no environment lookups;
/// callers that want different timings construct one of these and hand it to
/// `spawn_node` / `NeuralNetwork::with_tuning`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct EngineTuning {
    /// Bounded mailbox receive. A timeout re-enters the actor loop, which is
    /// what keeps idle nodes cheap without busy-waiting.
    #[serde(default = "default_mailbox_poll_ms")]
    pub mailbox_poll_ms: u64,
    /// How long the coordinator waits for any single reply before declaring
    /// the node unresponsive.
    #[serde(default = "default_reply_budget_ms")]
    pub reply_budget_ms: u64,
}

impl EngineTuning {
    pub fn mailbox_poll(&self) -> Duration {
        Duration::from_millis(self.mailbox_poll_ms)
    }

    pub fn reply_budget(&self) -> Duration {
        Duration::from_millis(self.reply_budget_ms)
    }
}

impl Default for EngineTuning {
    fn default() -> Self {
        Self {
            mailbox_poll_ms: DEFAULT_MAILBOX_POLL_MS,
            reply_budget_ms: DEFAULT_REPLY_BUDGET_MS,
        }
    }
}

fn default_mailbox_poll_ms() -> u64 {
    DEFAULT_MAILBOX_POLL_MS
}

fn default_reply_budget_ms() -> u64 {
    DEFAULT_REPLY_BUDGET_MS
}
