//! Game service for the chess server.
//!
//! This crate provides:
//! - [`GameLocks`] - per-game reentrant locks with idle eviction
//! - [`BotScheduler`] - debounced, coalescing machine-opponent moves
//! - [`GameService`] - legality queries, player and bot moves, take-backs
//!   and change notification over a [`GameRepository`]
//! - [`ServerConfig`] - TOML configuration with defaults
//!
//! Different games share no mutable state; within one game every mutation
//! is serialized by its lock.

pub mod config;
mod error;
mod locks;
mod repository;
mod scheduler;
mod service;

/// Identifier of a stored game.
pub type GameId = u64;

pub use config::{BotMode, ConfigError, ServerConfig};
pub use error::ServiceError;
pub use locks::GameLocks;
pub use repository::{GameRepository, InMemoryRepository, StoredGame};
pub use scheduler::BotScheduler;
pub use service::{GameService, MoveChanges};
