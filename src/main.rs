use anyhow::Result;
use clap::{Parser, ValueEnum};
use snake_dqn::game::GameConfig;
use snake_dqn::modes::{EvalConfig, EvalMode, TrainConfig, TrainMode};
use snake_dqn::rl::export::ARTIFACT_FILE_NAME;
use snake_dqn::rl::{TrainingBackend, default_device};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "snake_dqn")]
#[command(version, about = "Deep Q-learning for Snake")]
struct Cli {
    /// Run mode
    #[arg(long, default_value = "train")]
    mode: Mode,

    /// Number of episodes (defaults to 1000 for train, 20 for eval)
    #[arg(long)]
    episodes: Option<usize>,

    /// Grid size (the board is square)
    #[arg(long, default_value = "8")]
    grid_size: usize,

    /// Seed for the environment and exploration
    #[arg(long, default_value = "42")]
    seed: u64,

    /// Replay minibatch size (train mode only)
    #[arg(long)]
    batch_size: Option<usize>,

    /// Directory receiving the exported policy
    #[arg(long, default_value = "models/snake-rl")]
    export_dir: PathBuf,

    /// Policy artifact to evaluate (defaults to <export-dir>/model.json)
    #[arg(long)]
    model: Option<PathBuf>,
}

#[derive(Clone, ValueEnum)]
enum Mode {
    /// Train a DQN agent and export the policy
    Train,
    /// Play greedy episodes with an exported policy
    Eval,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let game_config = GameConfig::new(cli.grid_size);

    match cli.mode {
        Mode::Train => {
            let mut config = TrainConfig::new(cli.episodes.unwrap_or(1000), cli.export_dir);
            config.seed = cli.seed;
            config.game_config = game_config;
            if let Some(batch_size) = cli.batch_size {
                config.dqn_config.batch_size = batch_size;
            }

            let device = default_device();
            let mut train_mode = TrainMode::<TrainingBackend>::new(config, device);
            train_mode.run()?;
        }
        Mode::Eval => {
            let model_path = cli
                .model
                .unwrap_or_else(|| cli.export_dir.join(ARTIFACT_FILE_NAME));

            let mut config = EvalConfig::new(model_path);
            if let Some(episodes) = cli.episodes {
                config.num_episodes = episodes;
            }
            config.seed = cli.seed;
            config.game_config = game_config;

            let mut eval_mode = EvalMode::new(config)?;
            eval_mode.run()?;
        }
    }

    Ok(())
}
