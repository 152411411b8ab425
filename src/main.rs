#[cfg(not(feature = "std"))]
fn main() {}

#[cfg(feature = "std")]
use std::sync::Arc;
#[cfg(feature = "std")]
use std::time::Duration;

#[cfg(feature = "std")]
use clap::Parser;
#[cfg(feature = "std")]
use salvo::{bot, init_logging, Config, FixedQuota, GameServer};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[cfg(feature = "std")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Parser)]
#[cfg(feature = "std")]
enum Commands {
    /// Run two bots through the lobby and one full game.
    Demo {
        #[arg(long, help = "Fix RNG seed for reproducible games (e.g., --seed 12345)")]
        seed: Option<u64>,
        #[arg(long, default_value_t = 5000, help = "Long-poll timeout in milliseconds")]
        poll_timeout_ms: u64,
        #[arg(long, help = "Give every player this many shots per round")]
        fixed_quota: Option<usize>,
    },
}

#[cfg(feature = "std")]
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Demo {
            seed,
            poll_timeout_ms,
            fixed_quota,
        } => {
            let seed = seed.unwrap_or_else(rand::random);
            println!("Starting bot match with seed {}", seed);
            let timeout = Duration::from_millis(poll_timeout_ms);
            let config = Config::default().with_long_poll_timeout(timeout);
            let server = match fixed_quota {
                Some(n) => GameServer::with_quota(config, Arc::new(FixedQuota(n))),
                None => GameServer::new(config),
            };
            let server = Arc::new(server);
            let summary =
                bot::play_match(server.clone(), [seed, seed.wrapping_add(1)], timeout).await?;
            match &summary.winner {
                Some(name) => println!("{} wins after {} rounds", name, summary.rounds),
                None => println!("Draw after {} rounds", summary.rounds),
            }
            println!(
                "Shots fired: {} {}, {} {}",
                summary.players[0], summary.shots[0], summary.players[1], summary.shots[1]
            );
            server.shutdown();
        }
    }
    Ok(())
}
