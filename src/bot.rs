//! Scripted players that drive a [`GameServer`] end to end, the same way a
//! browser client would: long-poll, aim, fire, repeat.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, bail, Context};
use log::debug;
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Serialize;

use crate::board::FleetBoard;
use crate::coord::Coord;
use crate::registry::{PlayerId, PlayerStatus};
use crate::round::{Outcome, RoundStatus};
use crate::server::GameServer;

pub const BOT_NAMES: [&str; 2] = ["Alpha", "Bravo"];

/// Result of a finished bot match.
#[derive(Debug, Clone, Serialize)]
pub struct MatchSummary {
    pub players: [String; 2],
    pub winner: Option<String>,
    pub outcome: Outcome,
    pub rounds: u32,
    /// Shots fired, by player.
    pub shots: [usize; 2],
}

/// Join two bots, pair them through the lobby and play one game to the end.
///
/// Each bot places a random fleet from its seed and fires at untried cells in
/// a seeded order, so a pair of seeds always plays out the same way.
/// `timeout` bounds every long poll; a bot that waits that long without a
/// change gives up.
pub async fn play_match(
    server: Arc<GameServer>,
    seeds: [u64; 2],
    timeout: Duration,
) -> anyhow::Result<MatchSummary> {
    let alpha = server.join(BOT_NAMES[0])?;
    let bravo = server.join(BOT_NAMES[1])?;
    server.send_game_request(alpha, bravo)?;

    let mut known = None;
    loop {
        let polled = server.poll_lobby(bravo, known, Some(timeout)).await?;
        if polled.state.status == PlayerStatus::PendingResponse {
            break;
        }
        if polled.timed_out {
            bail!("{} never saw the game request", BOT_NAMES[1]);
        }
        known = Some(polled.version);
    }
    let pairing = server.accept_game_request(bravo)?;
    debug!("bots paired in {}", pairing.game);

    tokio::try_join!(
        run_bot(&server, alpha, seeds[0], timeout),
        run_bot(&server, bravo, seeds[1], timeout),
    )?;

    let view = server.view(alpha)?;
    let name_of = |id: PlayerId| {
        if id == alpha {
            BOT_NAMES[0]
        } else {
            BOT_NAMES[1]
        }
    };
    let mut shots = [0; 2];
    for report in &view.reports {
        shots[0] += report.shots.len();
    }
    for report in &server.view(bravo)?.reports {
        shots[1] += report.shots.len();
    }
    let summary = MatchSummary {
        players: BOT_NAMES.map(String::from),
        winner: view.outcome.winner().map(|w| name_of(w).to_string()),
        outcome: view.outcome,
        rounds: view.reports.len() as u32,
        shots,
    };

    server.return_to_lobby(alpha)?;
    server.return_to_lobby(bravo)?;
    Ok(summary)
}

async fn run_bot(
    server: &GameServer,
    me: PlayerId,
    seed: u64,
    timeout: Duration,
) -> anyhow::Result<()> {
    let mut rng = SmallRng::seed_from_u64(seed);
    let board = FleetBoard::random(&mut rng).map_err(|e| anyhow!(e))?;
    server.place_fleet(me, Arc::new(board))?;

    let mut targets: Vec<Coord> = Coord::all().collect();
    targets.shuffle(&mut rng);

    let mut known = None;
    loop {
        let polled = server
            .poll_game(me, known, Some(timeout))
            .await
            .with_context(|| format!("{} lost its game", me))?;
        known = Some(polled.version);
        let view = polled.state;
        if view.outcome.is_over() {
            return Ok(());
        }
        if polled.timed_out {
            bail!("{} waited {:?} without progress", me, timeout);
        }
        if view.round_status != Some(RoundStatus::Open) || view.submitted {
            continue;
        }
        let wanted = view.shots_available.saturating_sub(view.aimed.len());
        for _ in 0..wanted {
            let Some(target) = targets.pop() else {
                break;
            };
            server.aim(me, &target.to_string())?;
        }
        server.fire(me)?;
    }
}
