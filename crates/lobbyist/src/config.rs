//! Lobby configuration.

use std::time::Duration;

use lobbyist_protocol::GameType;
use lobbyist_room::DEFAULT_CALLBACK_QUEUE;
use lobbyist_session::SessionConfig;

use crate::LobbyError;

/// Game type requested when none is configured.
pub const DEFAULT_GAME_TYPE: &str = "swc_2021_blokus";

pub const HOST_VAR: &str = "LOBBY_HOST";
pub const PORT_VAR: &str = "LOBBY_PORT";
pub const GAME_TYPE_VAR: &str = "LOBBY_GAME_TYPE";
pub const REQUEST_TIMEOUT_VAR: &str = "LOBBY_REQUEST_TIMEOUT_MS";

/// Settings for a [`Lobby`](crate::Lobby).
#[derive(Debug, Clone)]
pub struct LobbyConfig {
    /// Connection settings for the lobby's own session.
    pub session: SessionConfig,
    /// Game type sent with prepare and join-any requests.
    pub game_type: GameType,
    /// Capacity of the callback worker's queue.
    pub callback_queue: usize,
}

impl Default for LobbyConfig {
    fn default() -> Self {
        Self {
            session: SessionConfig::default(),
            game_type: GameType::from(DEFAULT_GAME_TYPE),
            callback_queue: DEFAULT_CALLBACK_QUEUE,
        }
    }
}

impl LobbyConfig {
    pub fn with_session(mut self, session: SessionConfig) -> Self {
        self.session = session;
        self
    }

    pub fn with_game_type(mut self, game_type: impl Into<GameType>) -> Self {
        self.game_type = game_type.into();
        self
    }

    /// Sets the callback queue capacity (at least 1).
    pub fn with_callback_queue(mut self, capacity: usize) -> Self {
        self.callback_queue = capacity.max(1);
        self
    }

    /// Builds a config from the process environment.
    ///
    /// Unset variables keep their defaults:
    ///
    /// | variable                   | field                     |
    /// |----------------------------|---------------------------|
    /// | `LOBBY_HOST`               | `session.host`            |
    /// | `LOBBY_PORT`               | `session.port`            |
    /// | `LOBBY_GAME_TYPE`          | `game_type`               |
    /// | `LOBBY_REQUEST_TIMEOUT_MS` | `session.request_timeout` |
    ///
    /// # Errors
    /// [`LobbyError::Config`] if a port or timeout is not a number.
    pub fn from_env() -> Result<Self, LobbyError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    pub(crate) fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, LobbyError> {
        let mut config = Self::default();
        let mut session = config.session.clone();

        if let Some(host) = lookup(HOST_VAR) {
            session = session.with_host(host);
        }
        if let Some(port) = lookup(PORT_VAR) {
            let port = port.trim().parse::<u16>().map_err(|e| LobbyError::Config {
                var: PORT_VAR,
                message: e.to_string(),
            })?;
            session = session.with_port(port);
        }
        if let Some(ms) = lookup(REQUEST_TIMEOUT_VAR) {
            let ms = ms.trim().parse::<u64>().map_err(|e| LobbyError::Config {
                var: REQUEST_TIMEOUT_VAR,
                message: e.to_string(),
            })?;
            session = session.with_request_timeout(Duration::from_millis(ms));
        }
        if let Some(game_type) = lookup(GAME_TYPE_VAR) {
            config.game_type = GameType::from(game_type);
        }

        config.session = session;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_nothing_is_set() {
        let config = LobbyConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.session.host, "localhost");
        assert_eq!(config.session.port, 13050);
        assert_eq!(config.game_type, GameType::from(DEFAULT_GAME_TYPE));
        assert_eq!(config.callback_queue, DEFAULT_CALLBACK_QUEUE);
    }

    #[test]
    fn test_reads_every_variable() {
        let config = LobbyConfig::from_lookup(lookup(&[
            (HOST_VAR, "game.example"),
            (PORT_VAR, "9000"),
            (GAME_TYPE_VAR, "hive"),
            (REQUEST_TIMEOUT_VAR, "2500"),
        ]))
        .unwrap();
        assert_eq!(config.session.host, "game.example");
        assert_eq!(config.session.port, 9000);
        assert_eq!(config.game_type, GameType::from("hive"));
        assert_eq!(config.session.request_timeout, Duration::from_millis(2500));
    }

    #[test]
    fn test_bad_port_names_the_variable() {
        let err = LobbyConfig::from_lookup(lookup(&[(PORT_VAR, "eighty")])).unwrap_err();
        assert!(matches!(err, LobbyError::Config { var: PORT_VAR, .. }));
        assert!(err.to_string().contains(PORT_VAR));
    }

    #[test]
    fn test_callback_queue_is_at_least_one() {
        assert_eq!(LobbyConfig::default().with_callback_queue(0).callback_queue, 1);
    }
}
