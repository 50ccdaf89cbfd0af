use crate::config::GameConfig;
use crate::event::{EventQueue, GameEvent};
use crate::physics::{BallState, PaddleState, ball_paddle_hit, resolve_paddle_hit};
use crate::powerup;
use crate::rng::GameRng;
use crate::state::{GamePhase, GameState, Side};

/// Deterministic fixed-step advance of the whole playfield. Both peers
/// own one; only the host's output is authoritative. All side effects
/// (sound, particles) leave through the event queue.
#[derive(Debug)]
pub struct Simulator {
    rng: GameRng,
}

impl Simulator {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: GameRng::new(seed),
        }
    }

    pub fn rng_mut(&mut self) -> &mut GameRng {
        &mut self.rng
    }

    /// One fixed slice: paddles, effects, balls, collisions, scoring.
    /// Does nothing outside the Playing phase.
    pub fn advance(&mut self, state: &mut GameState, dt: f32, events: &mut EventQueue) {
        if !state.phase.is_simulating() {
            return;
        }

        let config = state.config;
        let multiplier = state.effective_multiplier();

        for side in [Side::Left, Side::Right] {
            state.paddle_mut(side).step(dt, &config);
        }

        powerup::tick_effects(state, dt, events);

        Self::step_ball(
            &mut state.ball,
            &mut state.paddles,
            dt,
            multiplier,
            &config,
            &mut self.rng,
            events,
        );

        let (extra_balls, paddles) = (&mut state.extra_balls, &mut state.paddles);
        for ball in extra_balls.iter_mut() {
            Self::step_ball(ball, paddles, dt, multiplier, &config, &mut self.rng, events);
        }

        powerup::collect(state, &mut self.rng, events);

        self.resolve_scoring(state, &config, events);
    }

    fn step_ball(
        ball: &mut BallState,
        paddles: &mut [PaddleState; 2],
        dt: f32,
        multiplier: f32,
        config: &GameConfig,
        rng: &mut GameRng,
        events: &mut EventQueue,
    ) {
        ball.integrate(dt, multiplier, config);

        if ball.bounce_walls(config) {
            events.push(GameEvent::WallBounce {
                position: ball.position,
            });
        }

        for paddle in paddles.iter_mut() {
            if let Some(hit) = ball_paddle_hit(ball, paddle) {
                resolve_paddle_hit(ball, paddle, hit, config, rng);
                events.push(GameEvent::PaddleHit {
                    side: paddle.side,
                    position: hit.contact,
                });
            }
        }
    }

    fn resolve_scoring(&mut self, state: &mut GameState, config: &GameConfig, events: &mut EventQueue) {
        // Only the main ball scores; extra balls just disappear when
        // they leave the field
        state
            .extra_balls
            .retain(|ball| ball.crossed_boundary(config).is_none());

        let Some(conceder) = state.ball.crossed_boundary(config) else {
            return;
        };
        let scorer = conceder.opposite();

        state.scores[scorer.index()] = state.scores[scorer.index()].saturating_add(1);
        state.paddle_mut(conceder).combo_hits = 0;
        state.extra_balls.clear();
        events.push(GameEvent::Score { side: scorer });
        log::debug!(
            "{:?} scored, {}-{}",
            scorer,
            state.scores[0],
            state.scores[1]
        );

        if state.score(scorer) >= config.winning_score {
            state.phase = GamePhase::GameOver { winner: scorer };
            events.push(GameEvent::PhaseChanged { phase: state.phase });
        } else {
            // The conceding side receives the next serve
            state.ball.serve(config, conceder, &mut self.rng);
            events.push(GameEvent::Serve { toward: conceder });
        }
    }
}
