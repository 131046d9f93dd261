use super::observation::{OBSERVATION_SIZE, observe};
use crate::game::{Action, GameConfig, GameEngine, GameState};

/// Snake environment for reinforcement learning
///
/// Wraps the game engine and provides a standard RL interface with:
/// - Compact feature-vector observations (11 binary features)
/// - Discrete relative action space (straight, turn right, turn left)
/// - Standard RL interface (reset, step)
pub struct SnakeEnvironment {
    engine: GameEngine,
    state: GameState,
}

impl SnakeEnvironment {
    /// Create a new Snake environment with a seeded random source
    pub fn new(config: GameConfig, seed: u64) -> Self {
        let mut engine = GameEngine::new(config, seed);
        let state = engine.reset();
        Self { engine, state }
    }

    /// Reset the environment and return the initial observation
    pub fn reset(&mut self) -> [f32; OBSERVATION_SIZE] {
        self.state = self.engine.reset();
        observe(&self.state)
    }

    /// Step the environment with a discrete action
    ///
    /// Actions:
    /// - 0: Keep heading
    /// - 1: Turn right
    /// - 2: Turn left
    ///
    /// Returns: (observation, reward, done). Stepping a finished episode is
    /// a no-op that keeps reporting done with zero reward.
    pub fn step(&mut self, action_idx: usize) -> ([f32; OBSERVATION_SIZE], f32, bool) {
        let action = Action::from_index(action_idx);
        let step_result = self.engine.step(&mut self.state, action);

        (
            observe(&self.state),
            step_result.reward,
            step_result.terminated,
        )
    }

    /// Get current observation without stepping
    pub fn get_observation(&self) -> [f32; OBSERVATION_SIZE] {
        observe(&self.state)
    }

    /// Get reference to current game state (for testing/debugging)
    pub fn state(&self) -> &GameState {
        &self.state
    }
}
