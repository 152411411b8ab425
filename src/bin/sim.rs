use std::sync::Arc;
use std::time::Duration;

use salvo::{bot, GameServer};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() != 3 {
        eprintln!("Usage: {} <seed1> <seed2>", args[0]);
        std::process::exit(1);
    }
    let seed1: u64 = args[1].parse()?;
    let seed2: u64 = args[2].parse()?;

    let server = Arc::new(GameServer::default());
    let summary = bot::play_match(server, [seed1, seed2], Duration::from_secs(5)).await?;

    println!("{}", serde_json::to_string(&summary)?);
    Ok(())
}
