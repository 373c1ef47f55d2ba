//! Shared realtime collaborators: stream presence tracking and matchmaking.

mod matchmaker;
mod tracker;

pub use matchmaker::{InMemoryMatchmaker, MatchmakeOutcome, Matchmaker, MatchmakerEntry};
pub use tracker::Tracker;
