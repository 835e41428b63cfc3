//! Chess server binary.
//!
//! Loads `chess-server.toml`, starts the idle-lock sweeper and plays a
//! short bot-against-bot game through the service as a smoke run.

use anyhow::Context;
use chess_core::Side;
use chess_engine::{GameState, GameStatus};
use chess_server::{GameRepository, GameService, InMemoryRepository, ServerConfig};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::load().context("loading chess-server.toml")?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    tracing::info!(
        depth = config.search_depth,
        mode = ?config.bot_mode,
        workers = config.scheduler_workers,
        "starting chess server"
    );

    let service = GameService::new(InMemoryRepository::new(), &config);
    let sweeper = Arc::clone(service.locks())
        .spawn_sweeper(config.lock_sweep_interval(), config.lock_idle_threshold());

    let game = service.create_game(GameState::initial(), vec![Side::White, Side::Black])?;
    for position in 0..config.self_play_moves {
        let worker = service.clone();
        let changes = tokio::task::spawn_blocking(move || worker.apply_bot_move(game, position))
            .await
            .context("bot move task")??;
        let Some(changes) = changes else {
            break;
        };
        println!("{:>3}. {}", changes.position, changes.mv);
        if changes.status != GameStatus::Ongoing {
            break;
        }
    }

    let record = service.repository().load(game)?.record;
    let state = record.current()?;
    println!("{}", state.board.pretty());
    println!("{}", state.to_fen());
    println!("status: {:?}", service.status(game)?);

    sweeper.abort();
    Ok(())
}
