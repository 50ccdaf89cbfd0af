use crate::config::GameConfig;
use crate::control::ControlMachine;
use crate::event::{EventQueue, GameEvent};
use crate::net::{ConnectionStatus, ControlAction, Message, MessageBody, Transport};
use crate::physics::MoveIntent;
use crate::powerup::PowerUpSpawner;
use crate::simulation::{FixedTimestep, Simulator};
use crate::state::{GameState, Side};
use crate::sync::{ReconcileOutcome, SendThrottle, SnapshotRing, reconcile};

const PING_INTERVAL_MS: u64 = 1000;

/// Which end of the link this peer is. The host's simulation is
/// authoritative; the client predicts and defers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Host,
    Client,
}

impl Role {
    pub fn is_host(self) -> bool {
        self == Role::Host
    }

    /// Host plays the left side, client the right.
    pub fn own_side(self) -> Side {
        match self {
            Role::Host => Side::Left,
            Role::Client => Side::Right,
        }
    }
}

/// Counters for the sync layer, surfaced for diagnostics overlays.
#[derive(Debug, Clone, Default)]
pub struct SyncStats {
    pub snapshots_sent: u64,
    pub snapshots_received: u64,
    pub snapshots_stale: u64,
    pub hard_reconciliations: u64,
    pub soft_merges: u64,
    pub intents_sent: u64,
    pub controls_ignored: u64,
    pub rtt_ms: Option<f32>,
}

/// One peer's complete game loop state: simulation, lifecycle, sync
/// policy and the transport boundary. Drive it with `update` once per
/// render callback; everything else is queries.
///
/// All mutation happens inside `update`, on the caller's thread.
/// Messages that arrive while the transport buffers them are applied at
/// the top of the next update, never mid-tick.
pub struct GameSession<T: Transport> {
    role: Role,
    transport: T,
    state: GameState,
    timestep: FixedTimestep,
    simulator: Simulator,
    control: ControlMachine,
    spawner: PowerUpSpawner,
    snapshot_throttle: SendThrottle,
    intent_throttle: SendThrottle,
    snapshots: SnapshotRing,
    events: EventQueue,
    stats: SyncStats,
    last_status: ConnectionStatus,
    last_snapshot_ms: Option<u64>,
    last_ping_sent_ms: Option<u64>,
    ping_outstanding: bool,
    send_now: bool,
}

impl<T: Transport> GameSession<T> {
    pub fn new(role: Role, config: GameConfig, seed: u64, transport: T) -> Self {
        let last_status = transport.status();
        Self {
            role,
            transport,
            state: GameState::new(config),
            timestep: FixedTimestep::new(config.tick_rate, config.max_ticks_per_update),
            simulator: Simulator::new(seed),
            control: ControlMachine::new(),
            spawner: PowerUpSpawner::new(),
            snapshot_throttle: SendThrottle::new(config.min_send_interval_ms),
            intent_throttle: SendThrottle::new(config.min_send_interval_ms),
            snapshots: SnapshotRing::new(config.snapshot_ring_capacity as usize),
            events: EventQueue::new(),
            stats: SyncStats::default(),
            last_status,
            last_snapshot_ms: None,
            last_ping_sent_ms: None,
            ping_outstanding: false,
            send_now: false,
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// Read-only snapshot for the renderer. The core never calls into
    /// rendering itself.
    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// Mutable state access for tools and tests. Gameplay code should
    /// go through `update` and the input setters.
    pub fn state_mut(&mut self) -> &mut GameState {
        &mut self.state
    }

    pub fn stats(&self) -> &SyncStats {
        &self.stats
    }

    pub fn snapshot_ring(&self) -> &SnapshotRing {
        &self.snapshots
    }

    pub fn interpolation_alpha(&self) -> f32 {
        self.timestep.alpha()
    }

    /// Signals for the audio/particle layer, drained per frame.
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        self.events.drain()
    }

    /// Update the local paddle's movement intent from input.
    pub fn set_local_intent(&mut self, up: bool, down: bool) {
        let side = self.role.own_side();
        self.state.paddle_mut(side).intent = MoveIntent::new(up, down);
    }

    pub fn start(&mut self, now_ms: u64) {
        self.send_control(ControlAction::Start, now_ms);
    }

    /// On the host this pauses immediately; a client only requests and
    /// waits for the host's broadcast to reflect the change.
    pub fn request_pause(&mut self, now_ms: u64) {
        self.send_control(ControlAction::Pause, now_ms);
    }

    pub fn request_resume(&mut self, now_ms: u64) {
        self.send_control(ControlAction::Resume, now_ms);
    }

    pub fn request_restart(&mut self, now_ms: u64) {
        self.send_control(ControlAction::Restart, now_ms);
    }

    /// One cooperative loop iteration: apply buffered messages, run the
    /// fixed-step simulation, run the countdown failsafe, then send per
    /// policy. A tick fully completes before the next begins; there is
    /// no partial-tick interleaving.
    pub fn update(&mut self, now_ms: u64, frame_dt: f32) {
        self.check_connection();

        for message in self.transport.poll() {
            self.handle_message(message, now_ms);
        }

        self.timestep.accumulate(frame_dt);
        let dt = self.timestep.dt();
        while self.timestep.consume_tick() {
            self.control
                .tick_fixed(&mut self.state, dt, self.simulator.rng_mut(), &mut self.events);
            self.simulator.advance(&mut self.state, dt, &mut self.events);
            if self.role.is_host() {
                self.spawner
                    .tick(&mut self.state, dt, self.simulator.rng_mut(), &mut self.events);
            }
        }

        self.control.tick_failsafe(
            &mut self.state,
            frame_dt,
            self.simulator.rng_mut(),
            &mut self.events,
        );

        self.send_outgoing(now_ms);
        self.send_ping(now_ms);
    }

    fn check_connection(&mut self) {
        let status = self.transport.status();
        if status != self.last_status {
            log::info!("connection status changed to {:?}", status);
            if status != ConnectionStatus::Connected {
                self.control.force_waiting(&mut self.state, &mut self.events);
                self.snapshots.clear();
                self.last_snapshot_ms = None;
            }
            self.last_status = status;
        }
    }

    fn handle_message(&mut self, message: Message, now_ms: u64) {
        match message.body {
            MessageBody::GameState(remote) => self.handle_snapshot(remote),
            MessageBody::PaddleMove { up, down } => {
                // Intent only; a position from the client would be
                // ignored by construction since none is carried
                if self.role.is_host() {
                    let client_side = Role::Client.own_side();
                    self.state.paddle_mut(client_side).intent = MoveIntent::new(up, down);
                }
            }
            MessageBody::GameControl { action } => {
                let applied = self.control.apply_control(
                    &mut self.state,
                    action,
                    message.timestamp_ms,
                    &mut self.events,
                );
                if applied {
                    if self.role.is_host() {
                        // Push the transition out without waiting for
                        // the throttle window
                        self.send_now = true;
                    }
                } else {
                    self.stats.controls_ignored += 1;
                }
            }
            MessageBody::Ping => {
                let _ = self.transport.send(&Message::new(now_ms, MessageBody::Pong));
                if self.role.is_host() {
                    self.send_now = true;
                }
            }
            MessageBody::Pong => {
                if self.ping_outstanding
                    && let Some(sent) = self.last_ping_sent_ms
                {
                    self.stats.rtt_ms = Some(now_ms.saturating_sub(sent) as f32);
                    self.ping_outstanding = false;
                }
            }
        }
    }

    fn handle_snapshot(&mut self, remote: GameState) {
        if self.role.is_host() {
            log::debug!("host ignoring inbound snapshot");
            return;
        }
        self.stats.snapshots_received += 1;

        // The channel reorders; never let an old snapshot roll back a
        // newer one
        if let Some(last) = self.last_snapshot_ms
            && remote.timestamp_ms <= last
        {
            self.stats.snapshots_stale += 1;
            return;
        }
        self.last_snapshot_ms = Some(remote.timestamp_ms);

        match reconcile(&mut self.state, &remote, self.role.own_side()) {
            ReconcileOutcome::Hard => self.stats.hard_reconciliations += 1,
            ReconcileOutcome::Soft => self.stats.soft_merges += 1,
        }
        self.snapshots.push(remote);
    }

    fn send_outgoing(&mut self, now_ms: u64) {
        match self.role {
            Role::Host => {
                if self.send_now || self.snapshot_throttle.should_send(self.state.phase, now_ms) {
                    self.state.timestamp_ms = now_ms;
                    let message =
                        Message::new(now_ms, MessageBody::GameState(self.state.clone()));
                    if self.transport.send(&message) {
                        self.snapshot_throttle.mark_sent(now_ms);
                        self.stats.snapshots_sent += 1;
                        self.send_now = false;
                    }
                    // A failed send is dropped silently; the next update
                    // sends fresher state anyway
                }
            }
            Role::Client => {
                if self.intent_throttle.ready(now_ms) {
                    let intent = self.state.paddle(self.role.own_side()).intent;
                    let message = Message::new(
                        now_ms,
                        MessageBody::PaddleMove {
                            up: intent.up,
                            down: intent.down,
                        },
                    );
                    if self.transport.send(&message) {
                        self.intent_throttle.mark_sent(now_ms);
                        self.stats.intents_sent += 1;
                    }
                }
            }
        }
    }

    fn send_ping(&mut self, now_ms: u64) {
        let due = match self.last_ping_sent_ms {
            None => true,
            Some(sent) => now_ms.saturating_sub(sent) >= PING_INTERVAL_MS,
        };
        if due && self.transport.send(&Message::new(now_ms, MessageBody::Ping)) {
            self.last_ping_sent_ms = Some(now_ms);
            self.ping_outstanding = true;
        }
    }

    fn send_control(&mut self, action: ControlAction, now_ms: u64) {
        if self.role.is_host() {
            let applied = self.control.apply_control(
                &mut self.state,
                action,
                now_ms,
                &mut self.events,
            );
            if applied {
                self.send_now = true;
            }
        }
        let message = Message::new(now_ms, MessageBody::GameControl { action });
        let _ = self.transport.send(&message);
    }
}
