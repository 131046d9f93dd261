//! Training mode for the DQN agent
//!
//! This module implements the training loop for the DQN agent. It runs
//! episodes in the Snake environment, stores transitions in replay memory,
//! performs one replay update per environment step, and refreshes the target
//! network once per episode. When training finishes the policy is exported
//! as a portable artifact.
//!
//! # Example
//!
//! ```rust,ignore
//! use snake_dqn::modes::{TrainMode, TrainConfig};
//! use snake_dqn::rl::{default_device, TrainingBackend};
//! use std::path::PathBuf;
//!
//! let config = TrainConfig::new(1000, PathBuf::from("models/snake-rl"));
//! let device = default_device();
//! let mut train_mode = TrainMode::<TrainingBackend>::new(config, device);
//! train_mode.run()?;
//! ```

use anyhow::{Context, Result};
use burn::module::AutodiffModule;
use burn::tensor::backend::AutodiffBackend;
use std::path::PathBuf;

use crate::game::GameConfig;
use crate::metrics::TrainingStats;
use crate::rl::{
    DqnAgent, DqnConfig, QNetworkConfig, SnakeEnvironment, Transition, export_policy,
};

/// Configuration for training mode
#[derive(Debug, Clone)]
pub struct TrainConfig {
    /// Number of episodes to train
    pub num_episodes: usize,

    /// Directory receiving the exported policy artifact
    pub export_dir: PathBuf,

    /// Scratch directory used while exporting, removed afterwards
    pub staging_dir: PathBuf,

    /// Log training progress every N episodes
    pub log_frequency: usize,

    /// Seed for the environment and the agent's exploration
    pub seed: u64,

    /// Game configuration (grid size, rewards)
    pub game_config: GameConfig,

    /// DQN hyperparameters
    pub dqn_config: DqnConfig,
}

impl TrainConfig {
    /// Create a new training configuration with defaults
    ///
    /// The staging directory is derived as a sibling of the export
    /// directory.
    ///
    /// # Arguments
    ///
    /// * `num_episodes` - Number of episodes to train
    /// * `export_dir` - Directory receiving the exported policy
    ///
    /// # Example
    ///
    /// ```rust
    /// use snake_dqn::modes::TrainConfig;
    /// use std::path::PathBuf;
    ///
    /// let config = TrainConfig::new(1000, PathBuf::from("models/snake-rl"));
    /// assert_eq!(config.log_frequency, 10);
    /// ```
    pub fn new(num_episodes: usize, export_dir: PathBuf) -> Self {
        let staging_dir = export_dir.with_extension("staging");
        Self {
            num_episodes,
            export_dir,
            staging_dir,
            log_frequency: 10,
            seed: 42,
            game_config: GameConfig::default(),
            dqn_config: DqnConfig::default(),
        }
    }
}

/// Training mode for the DQN agent
///
/// Runs the training loop, collecting transitions into replay memory and
/// updating the online network every step. The target network is refreshed
/// and exploration decayed once per episode.
pub struct TrainMode<B: AutodiffBackend> {
    /// DQN agent being trained
    agent: DqnAgent<B>,

    /// Snake environment the agent learns in
    env: SnakeEnvironment,

    /// Network dimensions, reused when exporting
    network_config: QNetworkConfig,

    /// Training statistics tracker
    stats: TrainingStats,

    /// Training configuration
    config: TrainConfig,

    /// Device for computation
    device: B::Device,
}

impl<B: AutodiffBackend> TrainMode<B> {
    /// Create a new training mode
    ///
    /// # Arguments
    ///
    /// * `config` - Training configuration
    /// * `device` - Device for computation (CPU/GPU)
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// use snake_dqn::modes::{TrainMode, TrainConfig};
    /// use snake_dqn::rl::{default_device, TrainingBackend};
    ///
    /// let config = TrainConfig::new(1000, "models/snake-rl".into());
    /// let device = default_device();
    /// let mut train_mode = TrainMode::<TrainingBackend>::new(config, device);
    /// ```
    pub fn new(config: TrainConfig, device: B::Device) -> Self {
        // Deterministic parameter init
        B::seed(config.seed);

        let network_config = QNetworkConfig::new();
        let network = network_config.init::<B>(&device);

        // The agent draws from its own stream so exploration and food
        // placement stay decoupled
        let agent = DqnAgent::new(
            network,
            config.dqn_config.clone(),
            config.seed.wrapping_add(1),
            device.clone(),
        );

        let env = SnakeEnvironment::new(config.game_config.clone(), config.seed);

        // 100-episode rolling window
        let stats = TrainingStats::new(100);

        Self {
            agent,
            env,
            network_config,
            stats,
            config,
            device,
        }
    }

    /// Run the training loop
    ///
    /// Trains the agent for the configured number of episodes, logging
    /// progress periodically and exporting the final policy.
    ///
    /// # Returns
    ///
    /// `Ok(())` on successful completion
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let mut train_mode = TrainMode::new(config, device);
    /// train_mode.run()?;
    /// ```
    pub fn run(&mut self) -> Result<()> {
        self.print_header();

        for episode in 0..self.config.num_episodes {
            let (episode_reward, episode_steps, episode_score) = self.run_episode()?;

            self.stats
                .record_episode(episode_reward, episode_steps, episode_score);

            // Target refresh and exploration decay happen once per episode
            self.agent.sync_target();
            self.agent.decay_epsilon();

            if (episode + 1) % self.config.log_frequency == 0 {
                self.print_progress(episode + 1, episode_reward, episode_score);
            }
        }

        let artifact_path = self
            .export()
            .context("Failed to export trained policy")?;

        println!("\nTraining complete!");
        println!("Policy exported to: {:?}", artifact_path);
        println!("\nFinal Statistics:");
        println!("{}", self.stats.format_summary());

        Ok(())
    }

    /// Run a single training episode
    ///
    /// Steps the environment until termination, storing every transition in
    /// replay memory and performing one replay update per step.
    ///
    /// # Returns
    ///
    /// A tuple containing:
    /// - Total episode reward
    /// - Number of steps in the episode
    /// - Final score (food eaten)
    fn run_episode(&mut self) -> Result<(f32, usize, u32)> {
        let mut obs = self.env.reset();
        let mut episode_reward = 0.0;
        let mut episode_steps = 0;
        let mut done = false;

        while !done {
            // Epsilon-greedy action
            let action = self.agent.act(&obs);

            // Step environment
            let (next_obs, reward, terminated) = self.env.step(action);

            // Store transition
            self.agent.remember(Transition {
                state: obs,
                action,
                reward,
                next_state: next_obs,
                done: terminated,
            });

            // Replay update (no-op until memory holds a full batch)
            if let Some(loss) = self.agent.replay() {
                self.stats.record_loss(loss);
            }

            episode_reward += reward;
            episode_steps += 1;
            done = terminated;
            obs = next_obs;
        }

        let episode_score = self.env.state().score;

        Ok((episode_reward, episode_steps, episode_score))
    }

    /// Export the trained policy as a portable artifact
    fn export(&self) -> Result<PathBuf> {
        let network = self.agent.network().clone().valid();

        export_policy(
            &network,
            &self.network_config,
            self.stats.total_episodes(),
            &self.config.export_dir,
            &self.config.staging_dir,
            &self.device,
        )
    }

    /// Print training header information
    fn print_header(&self) {
        println!("{}", "=".repeat(70));
        println!("DQN Training - Snake");
        println!("{}", "=".repeat(70));
        println!("Episodes: {}", self.config.num_episodes);
        println!(
            "Game Config: {}x{} grid",
            self.config.game_config.grid_size, self.config.game_config.grid_size
        );
        println!("DQN Config:");
        println!("  Learning rate: {}", self.config.dqn_config.learning_rate);
        println!("  Gamma: {}", self.config.dqn_config.gamma);
        println!(
            "  Epsilon: {} -> {} (decay {})",
            self.config.dqn_config.epsilon_start,
            self.config.dqn_config.epsilon_min,
            self.config.dqn_config.epsilon_decay
        );
        println!("  Batch size: {}", self.config.dqn_config.batch_size);
        println!(
            "  Memory capacity: {}",
            self.config.dqn_config.memory_capacity
        );
        println!("Logging: Every {} episodes", self.config.log_frequency);
        println!("Export dir: {:?}", self.config.export_dir);
        println!("{}", "=".repeat(70));
        println!();
    }

    /// Print training progress
    ///
    /// Reports the episode that just finished plus the rolling-window
    /// summary.
    fn print_progress(&self, episode: usize, episode_reward: f32, episode_score: u32) {
        println!(
            "[Episode {}/{}] Score: {} | Reward: {:.1} | Epsilon: {:.3} | {}",
            episode,
            self.config.num_episodes,
            episode_score,
            episode_reward,
            self.agent.epsilon(),
            self.stats.format_summary()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rl::{PolicyArtifact, TrainingBackend, default_device};
    use tempfile::TempDir;

    #[test]
    fn test_train_config_creation() {
        let config = TrainConfig::new(1000, PathBuf::from("models/snake-rl"));
        assert_eq!(config.num_episodes, 1000);
        assert_eq!(config.export_dir, PathBuf::from("models/snake-rl"));
        assert_eq!(config.staging_dir, PathBuf::from("models/snake-rl.staging"));
        assert_eq!(config.log_frequency, 10);
        assert_eq!(config.seed, 42);
    }

    #[test]
    fn test_train_mode_creation() {
        let temp_dir = TempDir::new().unwrap();
        let config = TrainConfig::new(10, temp_dir.path().join("export"));

        let device = default_device();
        let train_mode = TrainMode::<TrainingBackend>::new(config, device);

        assert_eq!(train_mode.stats.total_episodes(), 0);
        assert_eq!(train_mode.agent.memory_len(), 0);
    }

    #[test]
    fn test_run_single_episode() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = TrainConfig::new(1, temp_dir.path().join("export"));
        config.dqn_config.batch_size = 10_000; // no replay during the test

        let device = default_device();
        let mut train_mode = TrainMode::<TrainingBackend>::new(config, device);

        let result = train_mode.run_episode();
        assert!(result.is_ok());

        let (reward, steps, score) = result.unwrap();
        assert!(steps > 0);
        assert!(reward < 0.0 || score > 0); // Either died or ate food

        // Every step of the episode was remembered
        assert_eq!(train_mode.agent.memory_len(), steps);
    }

    #[test]
    fn test_full_run_exports_policy() {
        let temp_dir = TempDir::new().unwrap();
        let export_dir = temp_dir.path().join("export");

        let mut config = TrainConfig::new(2, export_dir.clone());
        config.staging_dir = temp_dir.path().join("staging");
        config.dqn_config.batch_size = 4;
        config.dqn_config.memory_capacity = 100;

        let device = default_device();
        let mut train_mode = TrainMode::<TrainingBackend>::new(config, device);

        train_mode.run().unwrap();

        // Two episodes of target sync and decay happened
        assert!(train_mode.agent.epsilon() < 1.0);
        assert_eq!(train_mode.stats.total_episodes(), 2);

        // The artifact landed and the staging scaffolding is gone
        let artifact_path = export_dir.join("model.json");
        assert!(artifact_path.exists());
        assert!(!temp_dir.path().join("staging").exists());

        let artifact = PolicyArtifact::load_json(&artifact_path).unwrap();
        assert_eq!(artifact.episodes_trained, 2);
    }
}
