//! Room layer for Lobbyist.
//!
//! Everything that happens per room once a session is up:
//!
//! - [`WaiterRegistry`]: join waiters, join counters, game-over handlers,
//!   and listeners, shared between the dispatcher and orchestration code
//! - [`Dispatcher`]: the task that drains the [`EventStream`] and routes
//!   each event
//! - [`CallbackWorker`]: runs application callbacks in order, off the
//!   dispatch task, with panics contained
//! - [`SessionHandle`]: pause, resume, and timeout control for one room
//!
//! [`EventStream`]: lobbyist_session::EventStream

mod dispatch;
mod error;
mod handle;
mod listener;
mod registry;
mod worker;

pub use dispatch::Dispatcher;
pub use error::RoomError;
pub use handle::SessionHandle;
pub use listener::{GameOverHandler, RoomListener};
pub use registry::{JoinWait, Joined, WaiterRegistry};
pub use worker::{CallbackWorker, DEFAULT_CALLBACK_QUEUE};
