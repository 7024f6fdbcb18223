//! Starts one game on a running game server and waits for it to end.
//!
//! Both seats are external: start your two clients by hand and hand them
//! the logged reservations (prepared mode) or let them join any game
//! (`--open`). Configuration comes from `LOBBY_*` environment variables,
//! the server password from `LOBBY_PASSWORD`.

use std::sync::Arc;

use lobbyist::prelude::*;
use tokio::sync::oneshot;
use tracing_subscriber::EnvFilter;

struct Printer;

impl RoomListener for Printer {
    fn on_error(&self, room_id: &RoomId, message: &str) {
        tracing::warn!(%room_id, message, "room error");
    }

    fn on_paused(&self, room_id: &RoomId, next_player: &str) {
        tracing::info!(%room_id, next_player, "game paused");
    }
}

#[tokio::main]
async fn main() -> Result<(), LobbyError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let open = std::env::args().skip(1).any(|arg| arg == "--open");
    let config = LobbyConfig::from_env()?;

    let lobby = match Lobby::connect(config, &EnvCredential::default()).await {
        Ok(lobby) => lobby,
        Err(e) => {
            tracing::error!(error = %e, "could not connect to game server");
            std::process::exit(1);
        }
    };

    let players: Vec<Arc<dyn Participant>> = vec![
        Arc::new(ExternalParticipant::new("One")),
        Arc::new(ExternalParticipant::new("Two")),
    ];
    let (over_tx, over_rx) = oneshot::channel();
    let options = if open {
        StartOptions::open()
    } else {
        StartOptions::prepared()
    }
    .with_listener(Arc::new(Printer))
    .on_game_over(move |result| {
        let _ = over_tx.send(result);
    });

    let mut start = lobby.start_new_game(players, options).await;
    let room_id = start.room_id().await?;
    println!("room: {room_id}");
    start.started().await?;
    tracing::info!(%room_id, "all players joined");

    tokio::select! {
        result = over_rx => match result {
            Ok(result) => {
                println!("winner: {}", result.winner.as_deref().unwrap_or("none"));
                for score in result.scores {
                    println!("  {}: {} ({:?})", score.name, score.points, score.cause);
                }
            }
            Err(_) => tracing::warn!("room released before the game was over"),
        },
        _ = tokio::signal::ctrl_c() => tracing::info!("interrupted"),
    }
    Ok(())
}
