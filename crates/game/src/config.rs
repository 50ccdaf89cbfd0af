use rkyv::{Archive, Deserialize, Serialize};

pub const DEFAULT_TICK_RATE: u32 = 120;

/// Full match configuration. Embedded in every snapshot so that a hard
/// reconciliation also converges the config both peers simulate with.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Archive,
    Serialize,
    Deserialize,
    serde::Serialize,
    serde::Deserialize,
)]
#[rkyv(derive(Debug))]
pub struct GameConfig {
    pub field_width: f32,
    pub field_height: f32,

    pub paddle_width: f32,
    pub paddle_height: f32,
    pub paddle_min_height: f32,
    pub paddle_max_height: f32,
    pub paddle_speed: f32,
    pub paddle_margin: f32,
    pub rebound_duration: f32,
    pub rebound_speed: f32,
    pub dash_duration: f32,
    pub dash_multiplier: f32,

    pub ball_radius: f32,
    pub ball_base_speed: f32,
    pub serve_max_angle: f32,
    pub speed_increment: f32,
    pub speed_jitter: f32,
    pub max_speed_scale: f32,
    pub max_deflection_ratio: f32,
    pub curve_threshold: f32,
    pub max_curve_intensity: f32,
    pub curve_strength: f32,
    pub curve_decay: f32,

    pub winning_score: u8,
    pub countdown_secs: u8,

    pub tick_rate: u32,
    pub max_ticks_per_update: u32,
    pub min_send_interval_ms: u64,
    pub reconcile_threshold: f32,
    pub snapshot_ring_capacity: u32,

    pub powerups: PowerUpConfig,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Archive,
    Serialize,
    Deserialize,
    serde::Serialize,
    serde::Deserialize,
)]
#[rkyv(derive(Debug))]
pub struct PowerUpConfig {
    pub enabled: bool,
    pub spawn_interval_secs: f32,
    pub lifetime_secs: f32,
    pub effect_duration_secs: f32,
    pub pickup_radius: f32,
    pub turbo_multiplier: f32,
    pub resize_factor: f32,
    pub extra_ball_count: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            field_width: 800.0,
            field_height: 450.0,

            paddle_width: 12.0,
            paddle_height: 80.0,
            paddle_min_height: 40.0,
            paddle_max_height: 160.0,
            paddle_speed: 320.0,
            paddle_margin: 24.0,
            rebound_duration: 0.15,
            rebound_speed: 220.0,
            dash_duration: 0.25,
            dash_multiplier: 2.5,

            ball_radius: 8.0,
            ball_base_speed: 300.0,
            serve_max_angle: 0.6,
            speed_increment: 0.05,
            speed_jitter: 0.1,
            max_speed_scale: 2.5,
            max_deflection_ratio: 0.85,
            curve_threshold: 0.3,
            max_curve_intensity: 0.8,
            curve_strength: 240.0,
            curve_decay: 0.4,

            winning_score: 11,
            countdown_secs: 3,

            tick_rate: DEFAULT_TICK_RATE,
            max_ticks_per_update: 5,
            min_send_interval_ms: 16,
            reconcile_threshold: 10.0,
            snapshot_ring_capacity: 10,

            powerups: PowerUpConfig::default(),
        }
    }
}

impl Default for PowerUpConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            spawn_interval_secs: 8.0,
            lifetime_secs: 10.0,
            effect_duration_secs: 6.0,
            pickup_radius: 14.0,
            turbo_multiplier: 1.5,
            resize_factor: 1.5,
            extra_ball_count: 2,
        }
    }
}

impl GameConfig {
    pub fn fixed_dt(&self) -> f32 {
        1.0 / self.tick_rate as f32
    }

    pub fn center(&self) -> glam::Vec2 {
        glam::Vec2::new(self.field_width * 0.5, self.field_height * 0.5)
    }
}
