use anyhow::Result;
use clap::Parser;

use rally::{
    GameConfig, GameEvent, GamePhase, GameSession, LinkConditions, MemoryLink, Role,
};

/// Headless soak run: a host and a client peer play over an in-process
/// link with configurable network faults.
#[derive(Parser, Debug)]
#[command(name = "rally-demo")]
struct Args {
    /// Simulated match duration in seconds
    #[arg(long, default_value_t = 30.0)]
    seconds: f32,

    /// Packet loss percentage applied to every message
    #[arg(long, default_value_t = 10.0)]
    loss: f32,

    /// Minimum one-way delay in milliseconds
    #[arg(long, default_value_t = 20)]
    min_delay: u64,

    /// Maximum one-way delay in milliseconds
    #[arg(long, default_value_t = 80)]
    max_delay: u64,

    /// Seed for the link and both simulations
    #[arg(long, default_value_t = 7)]
    seed: u64,
}

const FRAME_MS: u64 = 8;

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let conditions = LinkConditions {
        loss_percent: args.loss,
        duplicate_percent: 1.0,
        min_delay_ms: args.min_delay,
        max_delay_ms: args.max_delay,
    };
    let (host_end, client_end) = MemoryLink::pair(conditions, args.seed);
    let link = host_end.handle();

    let config = GameConfig::default();
    let mut host = GameSession::new(Role::Host, config, args.seed.wrapping_add(1), host_end);
    let mut client = GameSession::new(Role::Client, config, args.seed.wrapping_add(2), client_end);

    let frame_dt = FRAME_MS as f32 / 1000.0;
    let total_frames = (args.seconds * 1000.0) as u64 / FRAME_MS;
    let mut now_ms = 0u64;

    host.start(now_ms);

    for frame in 0..total_frames {
        now_ms += FRAME_MS;
        link.advance(now_ms);

        // Wiggle both paddles so the rally stays alive
        let up = (frame / 60) % 2 == 0;
        host.set_local_intent(up, !up);
        client.set_local_intent(!up, up);

        host.update(now_ms, frame_dt);
        client.update(now_ms, frame_dt);

        for event in host.drain_events() {
            match event {
                GameEvent::Score { side } => {
                    let state = host.state();
                    log::info!(
                        "{side:?} scores, {}-{}",
                        state.scores[0],
                        state.scores[1]
                    );
                }
                GameEvent::PhaseChanged { phase } => log::info!("phase -> {phase:?}"),
                GameEvent::PowerUpCollected { kind, side } => {
                    log::info!("{side:?} collected {kind:?}")
                }
                _ => {}
            }
        }
        client.drain_events();

        if let GamePhase::GameOver { winner } = host.state().phase {
            log::info!("game over, {winner:?} wins");
            break;
        }
    }

    let host_state = host.state();
    let client_stats = client.stats();
    println!(
        "final score {}-{} after {:.1}s",
        host_state.scores[0],
        host_state.scores[1],
        now_ms as f32 / 1000.0
    );
    println!(
        "client sync: {} snapshots, {} hard reconciliations, {} soft merges, {} stale",
        client_stats.snapshots_received,
        client_stats.hard_reconciliations,
        client_stats.soft_merges,
        client_stats.snapshots_stale,
    );
    if let Some(rtt) = client_stats.rtt_ms {
        println!("client rtt ~{rtt:.0}ms");
    }

    Ok(())
}
