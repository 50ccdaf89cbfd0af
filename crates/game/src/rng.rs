/// Seedable xorshift generator for the places the simulation needs
/// randomness (speed-up jitter, serve angles, power-up spawns). Keeping
/// the generator explicit and owned by the simulation is what makes the
/// determinism tests possible.
#[derive(Debug, Clone)]
pub struct GameRng {
    state: u64,
}

impl GameRng {
    pub fn new(seed: u64) -> Self {
        Self {
            // xorshift must not start at zero
            state: seed | 1,
        }
    }

    pub fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }

    /// Uniform in [0, 1).
    pub fn next_f32(&mut self) -> f32 {
        (self.next_u64() >> 40) as f32 / (1u64 << 24) as f32
    }

    /// Uniform in [0, max).
    pub fn jitter(&mut self, max: f32) -> f32 {
        self.next_f32() * max
    }

    /// Uniform in [-max, max).
    pub fn symmetric(&mut self, max: f32) -> f32 {
        (self.next_f32() * 2.0 - 1.0) * max
    }

    pub fn coin(&mut self) -> bool {
        self.next_u64() & 1 == 1
    }

    pub fn chance(&mut self, percent: f32) -> bool {
        self.next_f32() * 100.0 < percent
    }

    pub fn pick(&mut self, upper: u32) -> u32 {
        if upper == 0 {
            return 0;
        }
        (self.next_u64() % upper as u64) as u32
    }
}
