pub mod config;
pub mod control;
pub mod event;
pub mod net;
pub mod physics;
pub mod powerup;
pub mod rng;
pub mod session;
pub mod simulation;
pub mod state;
pub mod sync;

pub use config::{DEFAULT_TICK_RATE, GameConfig, PowerUpConfig};
pub use control::{ControlMachine, FAILSAFE_INTERVAL_SECS};
pub use event::{EventQueue, GameEvent};
pub use net::{
    ConnectionStatus, ControlAction, LinkConditions, LinkHandle, MemoryEndpoint, MemoryLink,
    Message, MessageBody, PROTOCOL_VERSION, Transport, WireError,
};
pub use physics::{BallState, MoveIntent, PaddleMotion, PaddleState};
pub use powerup::{ActiveEffect, FieldPowerUp, PowerUpKind, PowerUpSpawner};
pub use rng::GameRng;
pub use session::{GameSession, Role, SyncStats};
pub use simulation::{FixedTimestep, Simulator};
pub use state::{GamePhase, GameState, Side};
pub use sync::{ReconcileOutcome, SendThrottle, SnapshotRing};
