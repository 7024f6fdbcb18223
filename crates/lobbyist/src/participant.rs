//! Participants: anything that can take a seat in a room.

use futures_util::future::BoxFuture;
use lobbyist_protocol::{GameType, Request, ReservationToken};
use lobbyist_session::Session;

use crate::ParticipantError;

/// A player the lobby can seat.
///
/// The lobby only ever asks a participant to join. How it plays (a UI, a
/// bot, a separate process) is its own business.
pub trait Participant: Send + Sync + 'static {
    /// Display name, also used as the slot name of prepared games.
    fn name(&self) -> &str;

    /// Joins whatever open game the server matches it into.
    fn join_any_game(&self) -> BoxFuture<'_, Result<(), ParticipantError>>;

    /// Joins the prepared slot that `reservation` stands for.
    fn join_prepared_game<'a>(
        &'a self,
        reservation: &'a ReservationToken,
    ) -> BoxFuture<'a, Result<(), ParticipantError>>;
}

/// A participant that plays over its own session.
pub struct ClientParticipant {
    name: String,
    session: Session,
    game_type: Option<GameType>,
}

impl ClientParticipant {
    pub fn new(name: impl Into<String>, session: Session) -> Self {
        Self {
            name: name.into(),
            session,
            game_type: None,
        }
    }

    /// Restricts open joins to games of `game_type`.
    pub fn with_game_type(mut self, game_type: impl Into<GameType>) -> Self {
        self.game_type = Some(game_type.into());
        self
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    async fn send(&self, request: Request) -> Result<(), ParticipantError> {
        self.session
            .send(request)
            .await
            .map(drop)
            .map_err(|source| ParticipantError::Session {
                name: self.name.clone(),
                source,
            })
    }
}

impl Participant for ClientParticipant {
    fn name(&self) -> &str {
        &self.name
    }

    fn join_any_game(&self) -> BoxFuture<'_, Result<(), ParticipantError>> {
        Box::pin(async move {
            tracing::debug!(participant = %self.name, "joining any game");
            self.send(Request::JoinAnyGame {
                game_type: self.game_type.clone(),
            })
            .await
        })
    }

    fn join_prepared_game<'a>(
        &'a self,
        reservation: &'a ReservationToken,
    ) -> BoxFuture<'a, Result<(), ParticipantError>> {
        Box::pin(async move {
            tracing::debug!(participant = %self.name, %reservation, "joining prepared game");
            self.send(Request::JoinPreparedGame {
                reservation: reservation.clone(),
            })
            .await
        })
    }
}

/// A seat filled by a client the operator starts by hand.
///
/// Joining does nothing on this side: for open games the external client
/// joins by itself, for prepared games its reservation is logged so it
/// can be handed over.
pub struct ExternalParticipant {
    name: String,
}

impl ExternalParticipant {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Participant for ExternalParticipant {
    fn name(&self) -> &str {
        &self.name
    }

    fn join_any_game(&self) -> BoxFuture<'_, Result<(), ParticipantError>> {
        Box::pin(async move {
            tracing::info!(participant = %self.name, "waiting for external client to join");
            Ok(())
        })
    }

    fn join_prepared_game<'a>(
        &'a self,
        reservation: &'a ReservationToken,
    ) -> BoxFuture<'a, Result<(), ParticipantError>> {
        Box::pin(async move {
            tracing::info!(
                participant = %self.name,
                %reservation,
                "reservation ready for external client"
            );
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lobbyist_protocol::{Codec, JsonCodec, RequestFrame};
    use lobbyist_session::SessionConfig;
    use lobbyist_transport::{Connection, MemoryConnection};

    async fn next_request(server: &MemoryConnection) -> Request {
        let bytes = server.recv().await.unwrap().unwrap();
        let frame: RequestFrame = JsonCodec.decode(&bytes).unwrap();
        frame.request
    }

    #[tokio::test]
    async fn test_client_participant_sends_joins() {
        let (client, server) = MemoryConnection::pair();
        let (session, _events) = Session::start(client, SessionConfig::default());
        let player = ClientParticipant::new("One", session).with_game_type("blokus");

        player.join_any_game().await.unwrap();
        player
            .join_prepared_game(&ReservationToken::from("r1"))
            .await
            .unwrap();

        assert_eq!(
            next_request(&server).await,
            Request::JoinAnyGame {
                game_type: Some(GameType::from("blokus"))
            }
        );
        assert_eq!(
            next_request(&server).await,
            Request::JoinPreparedGame {
                reservation: ReservationToken::from("r1")
            }
        );
    }

    #[tokio::test]
    async fn test_external_participant_joins_are_no_ops() {
        let player = ExternalParticipant::new("Two");
        assert_eq!(player.name(), "Two");
        player.join_any_game().await.unwrap();
        player
            .join_prepared_game(&ReservationToken::from("r2"))
            .await
            .unwrap();
    }
}
