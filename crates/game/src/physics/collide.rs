use glam::Vec2;

use crate::config::GameConfig;
use crate::rng::GameRng;
use crate::state::Side;

use super::ball::{BallState, CONTACT_EPSILON};
use super::paddle::PaddleState;

/// Result of a circle-vs-paddle test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaddleHit {
    pub contact: Vec2,
    /// Vertical offset of the ball from the paddle center, normalized to
    /// [-1, 1] of the half-height. Negative is above center.
    pub offset: f32,
}

/// Closest-point-on-rectangle test against the ball's circle. Only
/// reports a hit when the ball is actually moving into the paddle, so a
/// ball repositioned just outside cannot re-trigger on the next tick.
pub fn ball_paddle_hit(ball: &BallState, paddle: &PaddleState) -> Option<PaddleHit> {
    let toward_paddle = match paddle.side {
        Side::Left => ball.velocity.x < 0.0,
        Side::Right => ball.velocity.x > 0.0,
    };
    if !toward_paddle {
        return None;
    }

    let closest = Vec2::new(
        ball.position.x.clamp(
            paddle.position.x - paddle.half_width(),
            paddle.position.x + paddle.half_width(),
        ),
        ball.position.y.clamp(
            paddle.position.y - paddle.half_height(),
            paddle.position.y + paddle.half_height(),
        ),
    );

    if ball.position.distance_squared(closest) > ball.radius * ball.radius {
        return None;
    }

    let offset = ((ball.position.y - paddle.position.y) / paddle.half_height()).clamp(-1.0, 1.0);
    Some(PaddleHit {
        contact: closest,
        offset,
    })
}

/// Apply the full hit response: reverse horizontal travel into the
/// field, deflect vertically with a cubic ramp (steeper near the paddle
/// edges), clamp the vertical share, re-speed the rally, assign curve on
/// strongly off-center hits, and reposition outside the paddle face.
pub fn resolve_paddle_hit(
    ball: &mut BallState,
    paddle: &mut PaddleState,
    hit: PaddleHit,
    config: &GameConfig,
    rng: &mut GameRng,
) {
    let speed = ball.speed().max(config.ball_base_speed * 0.25);
    let into_field = match paddle.side {
        Side::Left => 1.0,
        Side::Right => -1.0,
    };

    // Cubic deflection keeps center hits flat; the ratio cap bounds the
    // vertical share so the horizontal component never collapses
    let vy = speed * hit.offset.powi(3) * config.max_deflection_ratio;
    let vy = vy.clamp(
        -speed * config.max_deflection_ratio,
        speed * config.max_deflection_ratio,
    );
    let vx = (speed * speed - vy * vy).sqrt() * into_field;
    ball.velocity = Vec2::new(vx, vy);

    ball.apply_speedup(config, rng);

    let off_center = hit.offset.abs();
    if off_center > config.curve_threshold {
        ball.curve_intensity = (off_center * config.max_curve_intensity)
            .min(config.max_curve_intensity);
        // Curve bends vertically, away from the struck half, mirrored
        // per paddle side
        let vertical = if hit.offset > 0.0 {
            std::f32::consts::FRAC_PI_2
        } else {
            -std::f32::consts::FRAC_PI_2
        };
        ball.curve_direction = vertical * into_field;
    }

    // Push the ball just clear of the paddle face to prevent tunneling
    let face_x = paddle.position.x + into_field * paddle.half_width();
    ball.position.x = face_x + into_field * (ball.radius + CONTACT_EPSILON);

    ball.last_touched = Some(paddle.side);
    paddle.combo_hits += 1;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (GameConfig, BallState, PaddleState, GameRng) {
        let config = GameConfig::default();
        let ball = BallState::new(&config);
        let paddle = PaddleState::new(Side::Left, &config);
        let rng = GameRng::new(5);
        (config, ball, paddle, rng)
    }

    #[test]
    fn miss_when_moving_away() {
        let (_config, mut ball, paddle, _rng) = setup();
        ball.position = paddle.position;
        ball.velocity = Vec2::new(100.0, 0.0); // away from the left paddle
        assert!(ball_paddle_hit(&ball, &paddle).is_none());
    }

    #[test]
    fn hit_detected_at_contact() {
        let (_config, mut ball, paddle, _rng) = setup();
        ball.position = Vec2::new(
            paddle.position.x + paddle.half_width() + ball.radius - 1.0,
            paddle.position.y + 10.0,
        );
        ball.velocity = Vec2::new(-100.0, 0.0);

        let hit = ball_paddle_hit(&ball, &paddle).expect("should hit");
        assert!(hit.offset > 0.0);
    }

    #[test]
    fn center_hit_goes_nearly_straight() {
        let (config, mut ball, mut paddle, mut rng) = setup();
        ball.position = paddle.position + Vec2::new(paddle.half_width() + 2.0, 0.0);
        ball.velocity = Vec2::new(-config.ball_base_speed, 20.0);

        let hit = ball_paddle_hit(&ball, &paddle).expect("should hit");
        resolve_paddle_hit(&mut ball, &mut paddle, hit, &config, &mut rng);

        assert!(ball.velocity.x > 0.0);
        assert!(ball.velocity.y.abs() < 1.0);
        assert_eq!(ball.curve_intensity, 0.0);
    }

    #[test]
    fn edge_hit_deflects_and_curves() {
        let (config, mut ball, mut paddle, mut rng) = setup();
        ball.position = Vec2::new(
            paddle.position.x + paddle.half_width() + 2.0,
            paddle.position.y + paddle.half_height() * 0.95,
        );
        ball.velocity = Vec2::new(-config.ball_base_speed, 0.0);

        let hit = ball_paddle_hit(&ball, &paddle).expect("should hit");
        resolve_paddle_hit(&mut ball, &mut paddle, hit, &config, &mut rng);

        let speed = ball.speed();
        assert!(ball.velocity.y > 0.0);
        assert!(ball.velocity.y.abs() <= speed * config.max_deflection_ratio + 0.001);
        assert!(ball.curve_intensity > 0.0);
        assert!(ball.curve_intensity <= config.max_curve_intensity);
    }

    #[test]
    fn hit_preserves_total_speed_scaled() {
        let (config, mut ball, mut paddle, mut rng) = setup();
        ball.position = Vec2::new(
            paddle.position.x + paddle.half_width() + 2.0,
            paddle.position.y + 20.0,
        );
        ball.velocity = Vec2::new(-config.ball_base_speed, 0.0);

        let hit = ball_paddle_hit(&ball, &paddle).expect("should hit");
        resolve_paddle_hit(&mut ball, &mut paddle, hit, &config, &mut rng);

        let expected = config.ball_base_speed * ball.speed_scale;
        assert!((ball.speed() - expected).abs() < 0.01);
    }

    #[test]
    fn hit_repositions_outside_paddle() {
        let (config, mut ball, mut paddle, mut rng) = setup();
        ball.position = paddle.position + Vec2::new(2.0, 0.0); // overlapping
        ball.velocity = Vec2::new(-config.ball_base_speed, 0.0);

        let hit = ball_paddle_hit(&ball, &paddle).expect("should hit");
        resolve_paddle_hit(&mut ball, &mut paddle, hit, &config, &mut rng);

        assert!(ball.position.x > paddle.position.x + paddle.half_width() + ball.radius);
        assert!(ball_paddle_hit(&ball, &paddle).is_none());
    }

    #[test]
    fn hit_tracks_toucher_and_combo() {
        let (config, mut ball, mut paddle, mut rng) = setup();
        ball.position = paddle.position + Vec2::new(paddle.half_width() + 2.0, 0.0);
        ball.velocity = Vec2::new(-config.ball_base_speed, 0.0);

        let hit = ball_paddle_hit(&ball, &paddle).expect("should hit");
        resolve_paddle_hit(&mut ball, &mut paddle, hit, &config, &mut rng);

        assert_eq!(ball.last_touched, Some(Side::Left));
        assert_eq!(paddle.combo_hits, 1);
        assert_eq!(ball.hit_count, 1);
    }
}
