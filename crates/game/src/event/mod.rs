use std::collections::VecDeque;

use glam::Vec2;

use crate::powerup::PowerUpKind;
use crate::state::{GamePhase, Side};

const MAX_PENDING_EVENTS: usize = 64;

/// Discrete signals the simulation emits for the effects layer (audio,
/// particles) to consume. The core never calls into those systems; it
/// only queues these.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GameEvent {
    WallBounce { position: Vec2 },
    PaddleHit { side: Side, position: Vec2 },
    Serve { toward: Side },
    Score { side: Side },
    PowerUpSpawned { kind: PowerUpKind, position: Vec2 },
    PowerUpCollected { kind: PowerUpKind, side: Side },
    PowerUpExpired { kind: PowerUpKind, side: Side },
    PhaseChanged { phase: GamePhase },
}

/// Bounded queue of pending effect signals. If nobody drains it the
/// oldest signals are dropped; effects are cosmetic and must never
/// grow memory.
#[derive(Debug, Default)]
pub struct EventQueue {
    pending: VecDeque<GameEvent>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self {
            pending: VecDeque::with_capacity(MAX_PENDING_EVENTS),
        }
    }

    pub fn push(&mut self, event: GameEvent) {
        if self.pending.len() >= MAX_PENDING_EVENTS {
            self.pending.pop_front();
        }
        self.pending.push_back(event);
    }

    pub fn drain(&mut self) -> Vec<GameEvent> {
        self.pending.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }
}
