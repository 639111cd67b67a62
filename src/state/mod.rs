//! Persistent state management

pub mod manager;

pub use manager::{OrderStats, StateManager};
