/// Fixed-step accumulator. Wall-clock time goes in, whole simulation
/// slices come out, with a hard cap on how many slices a single update
/// may run. When the cap is hit the rest of the backlog is dropped so a
/// long stall (backgrounded tab, debugger pause) costs a one-time loss
/// of simulated time instead of an unbounded catch-up loop.
#[derive(Debug)]
pub struct FixedTimestep {
    dt: f32,
    accumulator: f32,
    max_ticks_per_update: u32,
    ticks_this_update: u32,
}

impl FixedTimestep {
    pub fn new(tick_rate: u32, max_ticks_per_update: u32) -> Self {
        Self {
            dt: 1.0 / tick_rate as f32,
            accumulator: 0.0,
            max_ticks_per_update,
            ticks_this_update: 0,
        }
    }

    pub fn dt(&self) -> f32 {
        self.dt
    }

    pub fn accumulate(&mut self, delta: f32) {
        self.accumulator += delta.max(0.0);
        self.ticks_this_update = 0;
    }

    /// Take one slice if available and the per-update budget allows it.
    /// Exhausting the budget clears the backlog.
    pub fn consume_tick(&mut self) -> bool {
        if self.accumulator < self.dt {
            return false;
        }
        if self.ticks_this_update >= self.max_ticks_per_update {
            self.accumulator = 0.0;
            return false;
        }
        self.accumulator -= self.dt;
        self.ticks_this_update += 1;
        true
    }

    /// Fraction of the next slice already elapsed, for render
    /// interpolation.
    pub fn alpha(&self) -> f32 {
        (self.accumulator / self.dt).min(1.0)
    }

    pub fn reset(&mut self) {
        self.accumulator = 0.0;
        self.ticks_this_update = 0;
    }
}
