use glam::Vec2;

use rally::{
    ConnectionStatus, GameConfig, GamePhase, GameSession, LinkConditions, LinkHandle,
    MemoryEndpoint, MemoryLink, Role, Side,
};

const FRAME_MS: u64 = 8;
const FRAME_DT: f32 = FRAME_MS as f32 / 1000.0;

struct Duo {
    host: GameSession<MemoryEndpoint>,
    client: GameSession<MemoryEndpoint>,
    link: LinkHandle,
    now_ms: u64,
}

impl Duo {
    fn new(conditions: LinkConditions, seed: u64) -> Self {
        let (host_end, client_end) = MemoryLink::pair(conditions, seed);
        let link = host_end.handle();
        let config = GameConfig::default();

        Self {
            host: GameSession::new(Role::Host, config, seed.wrapping_add(1), host_end),
            client: GameSession::new(Role::Client, config, seed.wrapping_add(2), client_end),
            link,
            now_ms: 0,
        }
    }

    fn frame(&mut self) {
        self.now_ms += FRAME_MS;
        self.link.advance(self.now_ms);
        self.host.update(self.now_ms, FRAME_DT);
        self.client.update(self.now_ms, FRAME_DT);
    }

    fn run_ms(&mut self, ms: u64) {
        for _ in 0..ms / FRAME_MS {
            self.frame();
        }
    }
}

#[test]
fn start_countdown_then_both_peers_playing() {
    let mut duo = Duo::new(LinkConditions::default(), 1);

    assert_eq!(duo.host.state().phase, GamePhase::WaitingForOpponent);
    assert_eq!(duo.client.state().phase, GamePhase::WaitingForOpponent);

    duo.frame();
    duo.host.start(duo.now_ms);
    duo.run_ms(200);

    assert!(matches!(
        duo.host.state().phase,
        GamePhase::Countdown { .. }
    ));
    assert!(matches!(
        duo.client.state().phase,
        GamePhase::Countdown { .. }
    ));

    // Three simulated seconds of countdown, with headroom
    duo.run_ms(3500);

    assert_eq!(duo.host.state().phase, GamePhase::Playing);
    assert_eq!(duo.client.state().phase, GamePhase::Playing);
    assert!(duo.host.state().ball.velocity.length() > 0.0);
    assert!(duo.client.state().ball.velocity.length() > 0.0);
}

#[test]
fn crossing_right_boundary_scores_left_and_serves_toward_conceder() {
    let mut duo = Duo::new(LinkConditions::default(), 2);
    duo.frame();
    duo.host.start(duo.now_ms);
    duo.run_ms(3700);
    assert_eq!(duo.host.state().phase, GamePhase::Playing);

    // Aim the authoritative ball at the right boundary, clear of the
    // right paddle's lane
    {
        let state = duo.host.state_mut();
        state.ball.position = Vec2::new(state.config.field_width - 60.0, 60.0);
        state.ball.velocity = Vec2::new(600.0, 0.0);
        state.ball.curve_intensity = 0.0;
    }

    let mut guard = 0;
    while duo.host.state().scores == [0, 0] {
        duo.frame();
        guard += 1;
        assert!(guard < 500, "ball never scored");
    }

    let host_state = duo.host.state();
    assert_eq!(host_state.scores, [1, 0]);
    // Fresh serve from center, toward the side that conceded (right)
    assert!(host_state.ball.velocity.x > 0.0);
    assert_eq!(host_state.ball.hit_count, 0);
    assert_eq!(host_state.ball.speed_scale, 1.0);

    // The client converges on the new score through sync
    duo.run_ms(500);
    assert_eq!(duo.client.state().scores, [1, 0]);
}

#[test]
fn client_converges_under_loss_and_jitter() {
    let conditions = LinkConditions {
        loss_percent: 30.0,
        min_delay_ms: 20,
        max_delay_ms: 60,
        ..LinkConditions::default()
    };
    let mut duo = Duo::new(conditions, 3);

    duo.frame();
    duo.host.start(duo.now_ms);
    duo.run_ms(5000);

    assert_eq!(duo.host.state().phase, GamePhase::Playing);
    assert_eq!(duo.client.state().phase, GamePhase::Playing);
    assert!(duo.client.stats().snapshots_received > 0);

    // Scores agree after convergence time
    duo.run_ms(1000);
    assert_eq!(duo.client.state().scores, duo.host.state().scores);
}

#[test]
fn diverged_client_hard_reconciles_to_host() {
    let mut duo = Duo::new(LinkConditions::default(), 4);
    duo.frame();
    duo.host.start(duo.now_ms);
    duo.run_ms(3700);

    let before = duo.client.stats().hard_reconciliations;

    // Teleport the client's predicted ball far from truth
    duo.client.state_mut().ball.position += Vec2::new(120.0, 0.0);

    duo.run_ms(200);

    assert!(duo.client.stats().hard_reconciliations > before);
    let drift = duo
        .client
        .state()
        .ball
        .position
        .distance(duo.host.state().ball.position);
    assert!(
        drift <= duo.client.state().config.reconcile_threshold + 20.0,
        "client did not converge, drift {drift}"
    );
}

#[test]
fn steady_play_mostly_soft_merges() {
    let mut duo = Duo::new(LinkConditions::default(), 5);
    duo.frame();
    duo.host.start(duo.now_ms);
    duo.run_ms(3700);
    duo.run_ms(1000);

    assert!(duo.client.stats().soft_merges > 0);
}

#[test]
fn client_pause_is_request_only_and_host_decides() {
    let mut duo = Duo::new(LinkConditions::default(), 6);
    duo.frame();
    duo.host.start(duo.now_ms);
    duo.run_ms(3700);
    assert_eq!(duo.client.state().phase, GamePhase::Playing);

    duo.client.request_pause(duo.now_ms);
    // The client does not pause itself
    assert_eq!(duo.client.state().phase, GamePhase::Playing);

    duo.run_ms(200);
    assert_eq!(duo.host.state().phase, GamePhase::Paused);
    assert_eq!(duo.client.state().phase, GamePhase::Paused);

    duo.host.request_resume(duo.now_ms);
    duo.run_ms(200);
    assert_eq!(duo.host.state().phase, GamePhase::Playing);
    assert_eq!(duo.client.state().phase, GamePhase::Playing);
}

#[test]
fn duplicated_controls_apply_once() {
    let conditions = LinkConditions {
        duplicate_percent: 100.0,
        ..LinkConditions::default()
    };
    let mut duo = Duo::new(conditions, 7);

    duo.frame();
    duo.host.start(duo.now_ms);
    duo.run_ms(4000);

    // The duplicate Start was discarded as stale, and the match still
    // progressed normally
    assert!(duo.client.stats().controls_ignored >= 1);
    assert_eq!(duo.host.state().phase, GamePhase::Playing);
    assert_eq!(duo.client.state().phase, GamePhase::Playing);
}

#[test]
fn host_applies_client_intent_but_never_its_position() {
    let mut duo = Duo::new(LinkConditions::default(), 8);
    duo.frame();
    duo.host.start(duo.now_ms);
    duo.run_ms(3700);

    let client_side = Side::Right;
    let before_y = duo.host.state().paddle(client_side).position.y;

    duo.client.set_local_intent(false, true);
    // Try to smuggle a position; only the intent flags travel
    duo.client.state_mut().paddle_mut(client_side).position.y = 10.0;

    duo.run_ms(400);

    let host_paddle = duo.host.state().paddle(client_side);
    assert!(host_paddle.intent.down);
    assert!(host_paddle.position.y > before_y);
    assert!((host_paddle.position.y - 10.0).abs() > 30.0);
}

#[test]
fn disconnect_forces_both_peers_to_waiting() {
    let mut duo = Duo::new(LinkConditions::default(), 9);
    duo.frame();
    duo.host.start(duo.now_ms);
    duo.run_ms(3700);
    assert_eq!(duo.host.state().phase, GamePhase::Playing);

    duo.link.set_status(ConnectionStatus::Disconnected);
    duo.run_ms(100);

    assert_eq!(duo.host.state().phase, GamePhase::WaitingForOpponent);
    assert_eq!(duo.client.state().phase, GamePhase::WaitingForOpponent);
}

#[test]
fn ping_pong_measures_rtt_both_ways() {
    let mut duo = Duo::new(LinkConditions::default(), 10);
    duo.run_ms(2500);

    assert!(duo.host.stats().rtt_ms.is_some());
    assert!(duo.client.stats().rtt_ms.is_some());
}

#[test]
fn snapshot_ring_stays_bounded() {
    let mut duo = Duo::new(LinkConditions::default(), 11);
    duo.frame();
    duo.host.start(duo.now_ms);
    duo.run_ms(4000);

    let capacity = duo.client.state().config.snapshot_ring_capacity as usize;
    assert!(duo.client.stats().snapshots_received as usize > capacity);
    assert_eq!(duo.client.snapshot_ring().len(), capacity);
}
