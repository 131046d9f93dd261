//! Evaluation mode for exported policies
//!
//! This module loads an exported policy artifact and plays greedy episodes
//! with it, reporting per-episode results and a summary. Evaluation runs on
//! the artifact itself rather than the training network, so the numbers
//! match what a deployment consumer of the artifact would see.
//!
//! # Example
//!
//! ```rust,ignore
//! use snake_dqn::modes::{EvalMode, EvalConfig};
//! use std::path::PathBuf;
//!
//! let config = EvalConfig::new(PathBuf::from("models/snake-rl/model.json"));
//! let mut eval_mode = EvalMode::new(config)?;
//! eval_mode.run()?;
//! ```

use anyhow::{Context, Result, bail};
use std::path::PathBuf;

use crate::game::{GameConfig, NUM_ACTIONS};
use crate::rl::{OBSERVATION_SIZE, PolicyArtifact, SnakeEnvironment};

/// Configuration for evaluation mode
#[derive(Debug, Clone)]
pub struct EvalConfig {
    /// Path of the policy artifact to evaluate
    pub model_path: PathBuf,

    /// Number of greedy episodes to play
    pub num_episodes: usize,

    /// Game configuration (grid size, rewards)
    pub game_config: GameConfig,

    /// Seed for food placement
    pub seed: u64,
}

impl EvalConfig {
    /// Create a new evaluation configuration with defaults
    ///
    /// # Example
    ///
    /// ```rust
    /// use snake_dqn::modes::EvalConfig;
    /// use std::path::PathBuf;
    ///
    /// let config = EvalConfig::new(PathBuf::from("models/snake-rl/model.json"));
    /// assert_eq!(config.num_episodes, 20);
    /// ```
    pub fn new(model_path: PathBuf) -> Self {
        Self {
            model_path,
            num_episodes: 20,
            game_config: GameConfig::default(),
            seed: 42,
        }
    }
}

/// Evaluation mode for exported policies
pub struct EvalMode {
    /// Loaded policy artifact
    artifact: PolicyArtifact,

    /// Snake environment
    env: SnakeEnvironment,

    /// Evaluation configuration
    config: EvalConfig,
}

impl EvalMode {
    /// Create a new evaluation mode
    ///
    /// Loads the policy artifact and checks that its dimensions match the
    /// observation and action spaces.
    ///
    /// # Returns
    ///
    /// A new EvalMode instance or an error if loading fails
    pub fn new(config: EvalConfig) -> Result<Self> {
        let artifact = PolicyArtifact::load_json(&config.model_path)
            .with_context(|| format!("Failed to load policy from {:?}", config.model_path))?;

        if artifact.input_size != OBSERVATION_SIZE {
            bail!(
                "Policy expects {} input features but observations have {}",
                artifact.input_size,
                OBSERVATION_SIZE
            );
        }
        if artifact.num_actions != NUM_ACTIONS {
            bail!(
                "Policy scores {} actions but the game has {}",
                artifact.num_actions,
                NUM_ACTIONS
            );
        }

        let env = SnakeEnvironment::new(config.game_config.clone(), config.seed);

        Ok(Self {
            artifact,
            env,
            config,
        })
    }

    /// Run the evaluation loop
    ///
    /// Plays the configured number of greedy episodes and prints per-episode
    /// results followed by a summary.
    ///
    /// # Returns
    ///
    /// `Ok(())` on successful completion
    pub fn run(&mut self) -> Result<()> {
        self.print_header();

        let mut total_score = 0u32;
        let mut total_steps = 0usize;
        let mut best_score = 0u32;

        for episode in 0..self.config.num_episodes {
            let (score, steps) = self.run_episode();

            println!(
                "[Episode {}/{}] Score: {} | Steps: {}",
                episode + 1,
                self.config.num_episodes,
                score,
                steps
            );

            total_score += score;
            total_steps += steps;
            best_score = best_score.max(score);
        }

        let mean_score = if self.config.num_episodes == 0 {
            0.0
        } else {
            total_score as f32 / self.config.num_episodes as f32
        };

        println!("\nEvaluation complete!");
        println!(
            "Mean score: {:.2} | Best score: {} | Total steps: {}",
            mean_score, best_score, total_steps
        );

        Ok(())
    }

    /// Play one greedy episode
    ///
    /// # Returns
    ///
    /// The final score and the number of steps taken
    fn run_episode(&mut self) -> (u32, usize) {
        let mut obs = self.env.reset();
        let mut steps = 0;

        loop {
            let action = self.artifact.best_action(&obs);
            let (next_obs, _reward, terminated) = self.env.step(action);

            steps += 1;
            obs = next_obs;

            if terminated {
                break;
            }
        }

        (self.env.state().score, steps)
    }

    /// Print loaded policy information
    fn print_header(&self) {
        println!("{}", "=".repeat(60));
        println!("Loaded Policy Information");
        println!("{}", "=".repeat(60));
        println!("Model path: {:?}", self.config.model_path);
        println!("Episodes trained: {}", self.artifact.episodes_trained);
        println!(
            "Inputs: {} | Hidden: {} | Actions: {}",
            self.artifact.input_size, self.artifact.hidden_size, self.artifact.num_actions
        );
        println!("Version: {}", self.artifact.version);
        println!("{}", "=".repeat(60));
        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rl::export::DenseLayer;
    use crate::rl::{InferenceBackend, QNetworkConfig, default_device, export_policy};
    use tempfile::TempDir;

    fn export_test_policy(dir: &TempDir) -> PathBuf {
        let device = default_device();
        let network_config = QNetworkConfig::new();
        let network = network_config.init::<InferenceBackend>(&device);

        export_policy(
            &network,
            &network_config,
            5,
            &dir.path().join("export"),
            &dir.path().join("staging"),
            &device,
        )
        .unwrap()
    }

    #[test]
    fn test_eval_config_defaults() {
        let config = EvalConfig::new(PathBuf::from("model.json"));
        assert_eq!(config.num_episodes, 20);
        assert_eq!(config.seed, 42);
        assert_eq!(config.game_config.grid_size, 8);
    }

    #[test]
    fn test_eval_mode_creation() {
        let temp_dir = TempDir::new().unwrap();
        let model_path = export_test_policy(&temp_dir);

        let eval_mode = EvalMode::new(EvalConfig::new(model_path));
        assert!(eval_mode.is_ok());

        let mode = eval_mode.unwrap();
        assert_eq!(mode.artifact.episodes_trained, 5);
    }

    #[test]
    fn test_eval_mode_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let config = EvalConfig::new(temp_dir.path().join("nope.json"));

        assert!(EvalMode::new(config).is_err());
    }

    #[test]
    fn test_eval_mode_rejects_mismatched_inputs() {
        let temp_dir = TempDir::new().unwrap();
        let model_path = temp_dir.path().join("model.json");

        // Internally consistent artifact with the wrong input width
        let artifact = PolicyArtifact {
            version: "test".to_string(),
            input_size: 5,
            hidden_size: 4,
            num_actions: 3,
            episodes_trained: 0,
            layers: vec![
                DenseLayer {
                    weights: vec![0.0; 5 * 4],
                    bias: vec![0.0; 4],
                    in_features: 5,
                    out_features: 4,
                },
                DenseLayer {
                    weights: vec![0.0; 4 * 3],
                    bias: vec![0.0; 3],
                    in_features: 4,
                    out_features: 3,
                },
            ],
        };
        artifact.save_json(&model_path).unwrap();

        assert!(EvalMode::new(EvalConfig::new(model_path)).is_err());
    }

    #[test]
    fn test_run_episode_terminates() {
        let temp_dir = TempDir::new().unwrap();
        let model_path = export_test_policy(&temp_dir);

        let mut mode = EvalMode::new(EvalConfig::new(model_path)).unwrap();
        let (_score, steps) = mode.run_episode();

        // The stall rule bounds every episode
        assert!(steps > 0);
    }

    #[test]
    fn test_run_completes() {
        let temp_dir = TempDir::new().unwrap();
        let model_path = export_test_policy(&temp_dir);

        let mut config = EvalConfig::new(model_path);
        config.num_episodes = 2;

        let mut mode = EvalMode::new(config).unwrap();
        assert!(mode.run().is_ok());
    }
}
