mod protocol;
mod transport;

pub use protocol::{ControlAction, Message, MessageBody, PROTOCOL_VERSION, WireError};
pub use transport::{
    ConnectionStatus, LinkConditions, LinkHandle, MemoryEndpoint, MemoryLink, Transport,
};
