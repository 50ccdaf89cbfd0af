use glam::Vec2;
use rkyv::{Archive, Deserialize, Serialize};

use crate::config::GameConfig;
use crate::rng::GameRng;
use crate::state::Side;

/// Distance the ball is pushed off a surface after a bounce so it never
/// re-collides on the next tick.
pub const CONTACT_EPSILON: f32 = 0.01;

#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub struct BallState {
    pub position: Vec2,
    pub velocity: Vec2,
    pub radius: f32,
    /// Monotonically non-decreasing within a rally, reset to 1.0 on serve.
    pub speed_scale: f32,
    /// Paddle hits since the last serve.
    pub hit_count: u32,
    /// Strength of the in-flight curve, in [0, 1].
    pub curve_intensity: f32,
    /// Direction of the curve acceleration, radians.
    pub curve_direction: f32,
    /// Side that last touched the ball with a paddle, if any.
    pub last_touched: Option<Side>,
}

impl BallState {
    pub fn new(config: &GameConfig) -> Self {
        Self {
            position: config.center(),
            velocity: Vec2::ZERO,
            radius: config.ball_radius,
            speed_scale: 1.0,
            hit_count: 0,
            curve_intensity: 0.0,
            curve_direction: 0.0,
            last_touched: None,
        }
    }

    /// Re-center and launch toward `toward` with a randomized angle.
    /// Resets everything a rally accumulates.
    pub fn serve(&mut self, config: &GameConfig, toward: Side, rng: &mut GameRng) {
        let angle = rng.symmetric(config.serve_max_angle);
        let sign = match toward {
            Side::Left => -1.0,
            Side::Right => 1.0,
        };

        self.position = config.center();
        self.velocity = Vec2::new(
            angle.cos() * config.ball_base_speed * sign,
            angle.sin() * config.ball_base_speed,
        );
        self.speed_scale = 1.0;
        self.hit_count = 0;
        self.curve_intensity = 0.0;
        self.curve_direction = 0.0;
        self.last_touched = None;
    }

    pub fn speed(&self) -> f32 {
        self.velocity.length()
    }

    /// Advance position by one slice, applying and decaying the curve.
    /// `multiplier` folds in turbo and any global speed scaling.
    pub fn integrate(&mut self, dt: f32, multiplier: f32, config: &GameConfig) {
        if self.curve_intensity > 0.0 {
            let accel = Vec2::new(self.curve_direction.cos(), self.curve_direction.sin())
                * (config.curve_strength * self.curve_intensity);
            self.velocity += accel * dt;
            self.curve_intensity = (self.curve_intensity - config.curve_decay * dt).max(0.0);
        }

        self.position += self.velocity * (dt * multiplier);
    }

    /// Reflect off the top/bottom walls. Returns true if a bounce happened.
    pub fn bounce_walls(&mut self, config: &GameConfig) -> bool {
        let mut bounced = false;

        if self.position.y - self.radius <= 0.0 {
            self.position.y = self.radius + CONTACT_EPSILON;
            self.velocity.y = self.velocity.y.abs();
            bounced = true;
        } else if self.position.y + self.radius >= config.field_height {
            self.position.y = config.field_height - self.radius - CONTACT_EPSILON;
            self.velocity.y = -self.velocity.y.abs();
            bounced = true;
        }

        bounced
    }

    /// Which side boundary the ball has fully crossed, if any.
    pub fn crossed_boundary(&self, config: &GameConfig) -> Option<Side> {
        if self.position.x <= -self.radius {
            Some(Side::Left)
        } else if self.position.x >= config.field_width + self.radius {
            Some(Side::Right)
        } else {
            None
        }
    }

    /// Per-hit speed-up: bump the hit counter, recompute the scale with a
    /// small random jitter, and renormalize velocity while preserving
    /// direction. The scale never decreases within a rally and never
    /// exceeds the configured maximum.
    pub fn apply_speedup(&mut self, config: &GameConfig, rng: &mut GameRng) {
        self.hit_count += 1;

        let jitter = rng.jitter(config.speed_jitter);
        let proposed = 1.0 + self.hit_count as f32 * config.speed_increment * (1.0 + jitter);
        self.speed_scale = proposed.min(config.max_speed_scale).max(self.speed_scale);

        let target = config.ball_base_speed * self.speed_scale;
        let speed = self.speed();
        if speed > f32::EPSILON {
            self.velocity *= target / speed;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wall_bounce_repositions_inside() {
        let config = GameConfig::default();
        let mut ball = BallState::new(&config);
        ball.position = Vec2::new(100.0, 2.0);
        ball.velocity = Vec2::new(50.0, -120.0);

        assert!(ball.bounce_walls(&config));
        assert!(ball.velocity.y > 0.0);
        assert!(ball.position.y - ball.radius > 0.0);

        // A second check must not bounce again
        assert!(!ball.bounce_walls(&config));
    }

    #[test]
    fn speedup_is_monotonic_and_capped() {
        let config = GameConfig::default();
        let mut rng = GameRng::new(99);
        let mut ball = BallState::new(&config);
        ball.velocity = Vec2::new(config.ball_base_speed, 0.0);

        let mut previous = ball.speed_scale;
        for _ in 0..60 {
            ball.apply_speedup(&config, &mut rng);
            assert!(ball.speed_scale >= previous);
            assert!(ball.speed_scale <= config.max_speed_scale);
            previous = ball.speed_scale;
        }
        assert_eq!(ball.speed_scale, config.max_speed_scale);
    }

    #[test]
    fn serve_resets_rally_state() {
        let config = GameConfig::default();
        let mut rng = GameRng::new(3);
        let mut ball = BallState::new(&config);
        ball.hit_count = 7;
        ball.speed_scale = 1.9;
        ball.curve_intensity = 0.5;
        ball.last_touched = Some(Side::Left);

        ball.serve(&config, Side::Right, &mut rng);

        assert_eq!(ball.hit_count, 0);
        assert_eq!(ball.speed_scale, 1.0);
        assert_eq!(ball.curve_intensity, 0.0);
        assert_eq!(ball.last_touched, None);
        assert!(ball.velocity.x > 0.0);
        assert!((ball.speed() - config.ball_base_speed).abs() < 0.01);
    }

    #[test]
    fn serve_direction_matches_side() {
        let config = GameConfig::default();
        let mut rng = GameRng::new(11);
        let mut ball = BallState::new(&config);

        ball.serve(&config, Side::Left, &mut rng);
        assert!(ball.velocity.x < 0.0);
    }

    #[test]
    fn crossed_boundary_requires_full_exit() {
        let config = GameConfig::default();
        let mut ball = BallState::new(&config);

        ball.position = Vec2::new(1.0, 100.0);
        assert_eq!(ball.crossed_boundary(&config), None);

        ball.position = Vec2::new(-ball.radius - 0.1, 100.0);
        assert_eq!(ball.crossed_boundary(&config), Some(Side::Left));

        ball.position = Vec2::new(config.field_width + ball.radius + 0.1, 100.0);
        assert_eq!(ball.crossed_boundary(&config), Some(Side::Right));
    }
}
