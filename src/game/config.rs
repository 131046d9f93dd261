use serde::{Deserialize, Serialize};

/// Configuration for the game
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameConfig {
    /// Side length of the square game grid
    pub grid_size: usize,

    // Rewards (for RL)
    /// Reward for eating food
    pub food_reward: f32,
    /// Penalty for dying
    pub death_penalty: f32,

    /// Steps allowed without eating, per unit of snake length
    ///
    /// An episode is cut off once the steps since the last meal exceed
    /// `stall_factor * snake_length`, with the same penalty as a crash.
    pub stall_factor: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            grid_size: 8,
            food_reward: 10.0,
            death_penalty: -10.0,
            stall_factor: 100,
        }
    }
}

impl GameConfig {
    /// Create a new configuration with a custom grid size
    pub fn new(grid_size: usize) -> Self {
        Self {
            grid_size,
            ..Default::default()
        }
    }

    /// Steps without food before an episode with the given snake length stalls out
    pub fn stall_limit(&self, snake_length: usize) -> u32 {
        self.stall_factor * snake_length as u32
    }
}
