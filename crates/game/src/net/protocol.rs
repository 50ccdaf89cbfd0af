use rkyv::{Archive, Deserialize, Serialize, rancor};

use crate::state::GameState;

pub const PROTOCOL_VERSION: u32 = 1;

/// Lifecycle commands. Either peer may send them; receivers discard any
/// command whose timestamp is not newer than the last one processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Archive, Serialize, Deserialize)]
#[rkyv(compare(PartialEq), derive(Debug))]
pub enum ControlAction {
    Start,
    Pause,
    Resume,
    Restart,
}

#[derive(Debug, Clone, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub enum MessageBody {
    /// Full authoritative snapshot, host to client only.
    GameState(GameState),
    /// Paddle movement intent, client to host only. Positions are never
    /// accepted from the client.
    PaddleMove { up: bool, down: bool },
    GameControl { action: ControlAction },
    /// Latency probe; also nudges the host into sending fresh state.
    Ping,
    Pong,
}

#[derive(Debug, Clone, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub struct Message {
    pub version: u32,
    pub timestamp_ms: u64,
    pub body: MessageBody,
}

#[derive(Debug, thiserror::Error)]
pub enum WireError {
    #[error("serialization failed: {0}")]
    Serialize(rancor::Error),
    #[error("deserialization failed: {0}")]
    Deserialize(rancor::Error),
}

impl Message {
    pub fn new(timestamp_ms: u64, body: MessageBody) -> Self {
        Self {
            version: PROTOCOL_VERSION,
            timestamp_ms,
            body,
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>, WireError> {
        rkyv::to_bytes::<rancor::Error>(self)
            .map(|aligned| aligned.into_vec())
            .map_err(WireError::Serialize)
    }

    pub fn decode(data: &[u8]) -> Result<Self, WireError> {
        rkyv::from_bytes::<Self, rancor::Error>(data).map_err(WireError::Deserialize)
    }
}
