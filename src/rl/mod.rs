//! Reinforcement learning stack for the Snake game
//!
//! Provides:
//! - 11-feature binary observations (danger, heading, food direction)
//! - A step/reset environment wrapper over the game engine
//! - Backend-agnostic tensor operations
//! - Q-network and DQN agent with experience replay
//! - Policy export as a portable JSON artifact

pub mod agent;
pub mod backend;
pub mod config;
pub mod environment;
pub mod export;
pub mod memory;
pub mod network;
pub mod observation;

pub use agent::DqnAgent;
pub use backend::{InferenceBackend, TrainingBackend, default_device};
pub use config::DqnConfig;
pub use environment::SnakeEnvironment;
pub use export::{PolicyArtifact, export_policy};
pub use memory::{ReplayMemory, Transition};
pub use network::{QNetwork, QNetworkConfig};
pub use observation::{OBSERVATION_SIZE, observe};
