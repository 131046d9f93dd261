//! Experience replay memory for DQN training
//!
//! This module stores transitions collected during environment interaction
//! and hands out uniform random minibatches for Q-learning updates. Unlike
//! an on-policy rollout buffer it is never cleared: old experience stays
//! useful, and the oldest transitions are evicted once capacity is reached.

use rand::Rng;

use crate::rl::observation::OBSERVATION_SIZE;
use std::collections::VecDeque;

/// One step of experience
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    /// Observation before the action
    pub state: [f32; OBSERVATION_SIZE],
    /// Index of the action taken
    pub action: usize,
    /// Reward received for the step
    pub reward: f32,
    /// Observation after the action
    pub next_state: [f32; OBSERVATION_SIZE],
    /// Whether the episode ended on this step
    pub done: bool,
}

/// Bounded FIFO store of transitions
///
/// # Example
///
/// ```rust
/// use snake_dqn::rl::{ReplayMemory, Transition};
///
/// let mut memory = ReplayMemory::new(100);
/// memory.push(Transition {
///     state: [0.0; 11],
///     action: 0,
///     reward: 10.0,
///     next_state: [0.0; 11],
///     done: false,
/// });
///
/// assert_eq!(memory.len(), 1);
/// ```
pub struct ReplayMemory {
    transitions: VecDeque<Transition>,
    capacity: usize,
}

impl ReplayMemory {
    /// Create a new replay memory with the given capacity
    pub fn new(capacity: usize) -> Self {
        Self {
            transitions: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Add a transition, evicting the oldest one if the memory is full
    pub fn push(&mut self, transition: Transition) {
        if self.transitions.len() == self.capacity {
            self.transitions.pop_front();
        }
        self.transitions.push_back(transition);
    }

    /// Get the number of stored transitions
    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    /// Check if the memory contains no transitions
    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }

    /// Maximum number of transitions the memory will hold
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Draw `amount` distinct transitions uniformly at random
    ///
    /// Sampling is without replacement, so a transition appears at most once
    /// per batch.
    ///
    /// # Panics
    ///
    /// Panics if `amount` exceeds the number of stored transitions.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R, amount: usize) -> Vec<&Transition> {
        rand::seq::index::sample(rng, self.transitions.len(), amount)
            .iter()
            .map(|i| &self.transitions[i])
            .collect()
    }
}
