//! Snake DQN - Deep Q-learning for the Snake game
//!
//! This library provides:
//! - Core game logic (game module)
//! - DQN training infrastructure (rl module)
//! - Training statistics (metrics module)
//! - Execution modes for training and evaluation (modes module)

pub mod game;
pub mod metrics;
pub mod modes;
pub mod rl;
