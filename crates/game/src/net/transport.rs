use std::cell::RefCell;
use std::rc::Rc;

use crate::rng::GameRng;

use super::protocol::Message;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Disconnected,
    Connecting,
    Connected,
    Error,
}

/// Thin boundary over an unordered, partially reliable channel. The
/// core only ever sees these three primitives; session establishment
/// and the channel's internal handshake live outside.
///
/// No delivery or ordering guarantee is assumed: any message may be
/// lost, duplicated, or arrive late.
pub trait Transport {
    /// Returns false when the channel is not currently connected; the
    /// message is dropped and the periodic resend cadence heals it.
    fn send(&mut self, message: &Message) -> bool;

    /// Drain everything that has arrived since the last poll. Called
    /// once per update so all state mutation stays on the game loop.
    fn poll(&mut self) -> Vec<Message>;

    fn status(&self) -> ConnectionStatus;
}

/// Link fault model for the in-process transport.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinkConditions {
    pub loss_percent: f32,
    pub duplicate_percent: f32,
    pub min_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl LinkConditions {
    pub fn lossy(loss_percent: f32) -> Self {
        Self {
            loss_percent,
            ..Self::default()
        }
    }
}

#[derive(Debug)]
struct InFlight {
    release_ms: u64,
    sequence: u64,
    payload: Vec<u8>,
}

#[derive(Debug)]
struct LinkCore {
    now_ms: u64,
    status: ConnectionStatus,
    conditions: LinkConditions,
    rng: GameRng,
    next_sequence: u64,
    to_first: Vec<InFlight>,
    to_second: Vec<InFlight>,
}

impl LinkCore {
    fn delay_ms(&mut self) -> u64 {
        let c = self.conditions;
        if c.max_delay_ms <= c.min_delay_ms {
            return c.min_delay_ms;
        }
        c.min_delay_ms + self.rng.pick((c.max_delay_ms - c.min_delay_ms + 1) as u32) as u64
    }

    fn enqueue(&mut self, to_first: bool, payload: Vec<u8>) {
        if self.conditions.loss_percent > 0.0 && self.rng.chance(self.conditions.loss_percent) {
            return;
        }

        let mut copies = 1;
        if self.conditions.duplicate_percent > 0.0
            && self.rng.chance(self.conditions.duplicate_percent)
        {
            copies = 2;
        }

        for _ in 0..copies {
            let release_ms = self.now_ms + self.delay_ms();
            let sequence = self.next_sequence;
            self.next_sequence += 1;
            let flight = InFlight {
                release_ms,
                sequence,
                payload: payload.clone(),
            };
            if to_first {
                self.to_first.push(flight);
            } else {
                self.to_second.push(flight);
            }
        }
    }

    fn drain(&mut self, first: bool) -> Vec<Vec<u8>> {
        if self.status != ConnectionStatus::Connected {
            return Vec::new();
        }
        let now = self.now_ms;
        let lane = if first {
            &mut self.to_first
        } else {
            &mut self.to_second
        };

        let mut ready: Vec<InFlight> = Vec::new();
        let mut i = 0;
        while i < lane.len() {
            if lane[i].release_ms <= now {
                ready.push(lane.swap_remove(i));
            } else {
                i += 1;
            }
        }

        // Variable delay is what produces reordering; within the same
        // release instant keep send order
        ready.sort_by_key(|f| (f.release_ms, f.sequence));
        ready.into_iter().map(|f| f.payload).collect()
    }
}

/// A connected pair of in-process endpoints with configurable loss,
/// duplication and delay, driven by an explicit clock so tests stay
/// deterministic. Both tests and the headless demo run over this.
pub struct MemoryLink;

impl MemoryLink {
    pub fn pair(conditions: LinkConditions, seed: u64) -> (MemoryEndpoint, MemoryEndpoint) {
        let core = Rc::new(RefCell::new(LinkCore {
            now_ms: 0,
            status: ConnectionStatus::Connected,
            conditions,
            rng: GameRng::new(seed),
            next_sequence: 0,
            to_first: Vec::new(),
            to_second: Vec::new(),
        }));

        (
            MemoryEndpoint {
                core: Rc::clone(&core),
                is_first: true,
            },
            MemoryEndpoint {
                core,
                is_first: false,
            },
        )
    }
}

pub struct MemoryEndpoint {
    core: Rc<RefCell<LinkCore>>,
    is_first: bool,
}

impl MemoryEndpoint {
    /// Advance the shared link clock. Messages become deliverable once
    /// the clock passes their release time.
    pub fn advance(&self, now_ms: u64) {
        let mut core = self.core.borrow_mut();
        core.now_ms = core.now_ms.max(now_ms);
    }

    pub fn set_status(&self, status: ConnectionStatus) {
        self.core.borrow_mut().status = status;
    }

    /// Detached handle to the shared link, for driving the clock and
    /// injecting faults after the endpoints have been handed off.
    pub fn handle(&self) -> LinkHandle {
        LinkHandle {
            core: Rc::clone(&self.core),
        }
    }
}

/// Clock and fault control over a [`MemoryLink`], independent of the
/// endpoints.
pub struct LinkHandle {
    core: Rc<RefCell<LinkCore>>,
}

impl LinkHandle {
    pub fn advance(&self, now_ms: u64) {
        let mut core = self.core.borrow_mut();
        core.now_ms = core.now_ms.max(now_ms);
    }

    pub fn set_status(&self, status: ConnectionStatus) {
        self.core.borrow_mut().status = status;
    }

    pub fn set_conditions(&self, conditions: LinkConditions) {
        self.core.borrow_mut().conditions = conditions;
    }
}

impl Transport for MemoryEndpoint {
    fn send(&mut self, message: &Message) -> bool {
        let mut core = self.core.borrow_mut();
        if core.status != ConnectionStatus::Connected {
            return false;
        }

        let payload = match message.encode() {
            Ok(bytes) => bytes,
            Err(err) => {
                log::debug!("dropping unencodable message: {err}");
                return false;
            }
        };

        // Messages for the peer go into the opposite lane
        let to_first = !self.is_first;
        core.enqueue(to_first, payload);
        true
    }

    fn poll(&mut self) -> Vec<Message> {
        let payloads = self.core.borrow_mut().drain(self.is_first);
        payloads
            .into_iter()
            .filter_map(|bytes| match Message::decode(&bytes) {
                Ok(message) => Some(message),
                Err(err) => {
                    log::debug!("dropping malformed message: {err}");
                    None
                }
            })
            .collect()
    }

    fn status(&self) -> ConnectionStatus {
        self.core.borrow().status
    }
}
