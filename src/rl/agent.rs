//! DQN (Deep Q-Network) agent implementation
//!
//! This module implements the DQN algorithm for training the Snake agent.
//! It covers epsilon-greedy action selection, experience replay updates
//! against a frozen target network, and the per-episode bookkeeping of
//! target synchronization and epsilon decay.

use super::config::DqnConfig;
use super::memory::{ReplayMemory, Transition};
use super::network::QNetwork;
use super::observation::{OBSERVATION_SIZE, batch_to_tensor};
use crate::game::NUM_ACTIONS;
use burn::{
    module::AutodiffModule,
    optim::{Adam, AdamConfig, GradientsParams, Optimizer, adaptor::OptimizerAdaptor},
    tensor::{ElementConversion, Tensor, TensorData, backend::AutodiffBackend},
};
use rand::{Rng, SeedableRng, rngs::StdRng};

/// DQN agent for reinforcement learning
///
/// Holds two copies of the Q-network: the online copy that gradients flow
/// through, and a detached target copy used to score next states during
/// replay. The target copy only changes on [`sync_target`](Self::sync_target).
///
/// # Type Parameters
///
/// * `B` - Autodiff backend for gradient computation
///
/// # Example
///
/// ```rust,ignore
/// use snake_dqn::rl::{DqnAgent, DqnConfig, QNetworkConfig};
/// use burn::backend::{Autodiff, ndarray::{NdArray, NdArrayDevice}};
///
/// type Backend = Autodiff<NdArray<f32>>;
///
/// let device = NdArrayDevice::default();
/// let network = QNetworkConfig::new().init::<Backend>(&device);
///
/// let mut agent = DqnAgent::new(network, DqnConfig::default(), 42, device);
/// ```
pub struct DqnAgent<B: AutodiffBackend> {
    /// Online Q-network, updated every replay step
    online: QNetwork<B>,

    /// Target Q-network on the inner backend, synced once per episode
    target: QNetwork<B::InnerBackend>,

    /// Adam optimizer for the online network parameters
    optim: OptimizerAdaptor<Adam, QNetwork<B>, B>,

    /// DQN hyperparameters
    config: DqnConfig,

    /// Replay memory of past transitions
    memory: ReplayMemory,

    /// Current exploration rate
    epsilon: f32,

    /// Seeded source of exploration randomness
    rng: StdRng,

    /// Device for tensor operations
    device: B::Device,
}

impl<B: AutodiffBackend> DqnAgent<B> {
    /// Create a new DQN agent
    ///
    /// The target network starts as an exact copy of the online network,
    /// and epsilon starts at `config.epsilon_start`.
    ///
    /// # Arguments
    ///
    /// * `network` - Q-network to train
    /// * `config` - DQN hyperparameters
    /// * `seed` - Seed for the exploration random source
    /// * `device` - Device for computation
    pub fn new(network: QNetwork<B>, config: DqnConfig, seed: u64, device: B::Device) -> Self {
        // Validate config
        config.validate().expect("Invalid DQN configuration");

        let optim = AdamConfig::new().init();
        let target = network.clone().valid();
        let memory = ReplayMemory::new(config.memory_capacity);
        let epsilon = config.epsilon_start;

        Self {
            online: network,
            target,
            optim,
            config,
            memory,
            epsilon,
            rng: StdRng::seed_from_u64(seed),
            device,
        }
    }

    /// Select an action for an observation, epsilon-greedily
    ///
    /// With probability epsilon the action is uniform random; otherwise it
    /// is the greedy choice under the online network.
    ///
    /// # Returns
    ///
    /// Action index in `0..NUM_ACTIONS`
    pub fn act(&mut self, observation: &[f32; OBSERVATION_SIZE]) -> usize {
        if self.rng.r#gen::<f32>() <= self.epsilon {
            return self.rng.gen_range(0..NUM_ACTIONS);
        }

        self.greedy_action(observation)
    }

    /// Select the highest-valued action for an observation
    ///
    /// Runs the online network in valid (no-grad) mode, so dropout is
    /// inert and the choice is deterministic. Ties break toward the
    /// lowest action index.
    pub fn greedy_action(&self, observation: &[f32; OBSERVATION_SIZE]) -> usize {
        let network = self.online.clone().valid();
        let input = batch_to_tensor::<B::InnerBackend>(&[*observation], &self.device);

        let q_values: Vec<f32> = network
            .forward(input)
            .into_data()
            .to_vec()
            .expect("Failed to convert Q-values to vec");

        argmax(&q_values)
    }

    /// Store a transition in the replay memory
    pub fn remember(&mut self, transition: Transition) {
        self.memory.push(transition);
    }

    /// Perform one replay update on a random minibatch
    ///
    /// Does nothing until the memory holds at least `batch_size`
    /// transitions. The TD target for the taken action is
    /// `r + gamma * max_a Q_target(s', a)`, or just `r` on terminal
    /// transitions; the other action slots keep the online network's own
    /// predictions so their error is zero.
    ///
    /// # Returns
    ///
    /// The minibatch MSE loss, or `None` if the memory is still warming up
    pub fn replay(&mut self) -> Option<f32> {
        if self.memory.len() < self.config.batch_size {
            return None;
        }

        let batch_size = self.config.batch_size;
        let batch = self.memory.sample(&mut self.rng, batch_size);

        let states: Vec<[f32; OBSERVATION_SIZE]> = batch.iter().map(|t| t.state).collect();
        let next_states: Vec<[f32; OBSERVATION_SIZE]> =
            batch.iter().map(|t| t.next_state).collect();
        let actions: Vec<usize> = batch.iter().map(|t| t.action).collect();
        let rewards: Vec<f32> = batch.iter().map(|t| t.reward).collect();
        let dones: Vec<bool> = batch.iter().map(|t| t.done).collect();

        // Score next states with the frozen target network
        let next_input = batch_to_tensor::<B::InnerBackend>(&next_states, &self.device);
        let max_next_q: Vec<f32> = self
            .target
            .forward(next_input)
            .max_dim(1)
            .into_data()
            .to_vec()
            .expect("Failed to convert target Q-values to vec");

        // Start each target row from the online network's own predictions
        // (no-grad mode), then overwrite the slot of the action taken
        let base_input = batch_to_tensor::<B::InnerBackend>(&states, &self.device);
        let mut targets: Vec<f32> = self
            .online
            .clone()
            .valid()
            .forward(base_input)
            .into_data()
            .to_vec()
            .expect("Failed to convert Q-values to vec");

        for i in 0..batch_size {
            let mut td_target = rewards[i];
            if !dones[i] {
                td_target += self.config.gamma * max_next_q[i];
            }
            targets[i * NUM_ACTIONS + actions[i]] = td_target;
        }

        // Forward pass with gradients, MSE against the target rows
        let input = batch_to_tensor::<B>(&states, &self.device);
        let predicted = self.online.forward(input);

        let target_tensor: Tensor<B, 2> = Tensor::from_data(
            TensorData::new(targets, [batch_size, NUM_ACTIONS]),
            &self.device,
        );

        let diff = predicted - target_tensor;
        let loss = (diff.clone() * diff).mean();
        let loss_value = loss.clone().into_scalar().elem::<f32>();

        // Backward pass and parameter update
        let grads = loss.backward();
        let grads = GradientsParams::from_grads(grads, &self.online);
        self.online = self
            .optim
            .step(self.config.learning_rate, self.online.clone(), grads);

        Some(loss_value)
    }

    /// Copy the online network's parameters into the target network
    pub fn sync_target(&mut self) {
        self.target = self.online.clone().valid();
    }

    /// Decay epsilon by one episode's worth, clamped to the floor
    pub fn decay_epsilon(&mut self) {
        self.epsilon = (self.epsilon * self.config.epsilon_decay).max(self.config.epsilon_min);
    }

    /// Get the current exploration rate
    pub fn epsilon(&self) -> f32 {
        self.epsilon
    }

    /// Get the number of transitions currently in the replay memory
    pub fn memory_len(&self) -> usize {
        self.memory.len()
    }

    /// Get a reference to the online Q-network
    pub fn network(&self) -> &QNetwork<B> {
        &self.online
    }

    /// Get a reference to the DQN configuration
    pub fn config(&self) -> &DqnConfig {
        &self.config
    }
}

/// Index of the largest value, first occurrence winning ties
fn argmax(values: &[f32]) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate().skip(1) {
        if v > values[best] {
            best = i;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{Action, GameConfig, GameEngine};
    use crate::rl::QNetworkConfig;
    use crate::rl::observation::observe;
    use burn::backend::{
        Autodiff,
        ndarray::{NdArray, NdArrayDevice},
    };

    type TestBackend = Autodiff<NdArray<f32>>;

    fn create_test_agent() -> DqnAgent<TestBackend> {
        let device = NdArrayDevice::default();
        let network = QNetworkConfig::new().init::<TestBackend>(&device);
        let config = DqnConfig {
            batch_size: 8,
            memory_capacity: 64,
            ..Default::default()
        };

        DqnAgent::new(network, config, 42, device)
    }

    fn zero_observation() -> [f32; OBSERVATION_SIZE] {
        [0.0; OBSERVATION_SIZE]
    }

    fn transition(action: usize, reward: f32, done: bool) -> Transition {
        Transition {
            state: zero_observation(),
            action,
            reward,
            next_state: zero_observation(),
            done,
        }
    }

    #[test]
    fn test_agent_creation() {
        let agent = create_test_agent();
        assert_eq!(agent.epsilon(), 1.0);
        assert_eq!(agent.memory_len(), 0);
    }

    #[test]
    fn test_act_returns_valid_action() {
        let mut agent = create_test_agent();
        let obs = zero_observation();

        for _ in 0..50 {
            assert!(agent.act(&obs) < NUM_ACTIONS);
        }
    }

    #[test]
    fn test_exploration_covers_all_actions() {
        let mut agent = create_test_agent();
        let obs = zero_observation();

        let mut seen = [false; NUM_ACTIONS];
        for _ in 0..100 {
            seen[agent.act(&obs)] = true;
        }

        assert_eq!(seen, [true; NUM_ACTIONS]);
    }

    #[test]
    fn test_greedy_action_is_deterministic() {
        let mut agent = create_test_agent();
        agent.epsilon = 0.0;

        let mut obs = zero_observation();
        obs[4] = 1.0;
        obs[8] = 1.0;

        let first = agent.act(&obs);
        for _ in 0..10 {
            assert_eq!(agent.act(&obs), first);
        }
    }

    #[test]
    fn test_remember_grows_memory() {
        let mut agent = create_test_agent();
        agent.remember(transition(0, 1.0, false));
        agent.remember(transition(1, 0.0, true));
        assert_eq!(agent.memory_len(), 2);
    }

    #[test]
    fn test_replay_noop_until_batch_available() {
        let mut agent = create_test_agent();

        for _ in 0..7 {
            agent.remember(transition(0, 0.0, false));
            assert_eq!(agent.replay(), None);
        }

        agent.remember(transition(0, 0.0, false));
        assert!(agent.replay().is_some());
    }

    #[test]
    fn test_replay_returns_finite_loss() {
        let mut agent = create_test_agent();

        for i in 0..16 {
            agent.remember(transition(i % NUM_ACTIONS, (i % 5) as f32, i % 7 == 0));
        }

        for _ in 0..4 {
            let loss = agent.replay().unwrap();
            assert!(loss.is_finite());
            assert!(loss >= 0.0);
        }
    }

    #[test]
    fn test_replay_does_not_drain_memory() {
        let mut agent = create_test_agent();

        for _ in 0..10 {
            agent.remember(transition(0, 1.0, false));
        }

        agent.replay();
        assert_eq!(agent.memory_len(), 10);
    }

    #[test]
    fn test_epsilon_decay_monotone_with_floor() {
        let mut agent = create_test_agent();
        let floor = agent.config().epsilon_min;

        let mut previous = agent.epsilon();
        for _ in 0..2000 {
            agent.decay_epsilon();
            let current = agent.epsilon();
            assert!(current <= previous);
            assert!(current >= floor);
            previous = current;
        }

        // 0.995^2000 is far below the floor, so the clamp must have engaged
        assert_eq!(agent.epsilon(), floor);
    }

    #[test]
    fn test_sync_target_copies_online() {
        let mut agent = create_test_agent();

        // Drift the online network away from the stale target
        for i in 0..16 {
            agent.remember(transition(i % NUM_ACTIONS, 1.0, false));
        }
        agent.replay();
        agent.sync_target();

        let mut obs = zero_observation();
        obs[0] = 1.0;
        let input = batch_to_tensor::<NdArray<f32>>(&[obs], &NdArrayDevice::default());

        let from_target: Vec<f32> = agent
            .target
            .forward(input.clone())
            .into_data()
            .to_vec()
            .unwrap();
        let from_online: Vec<f32> = agent
            .online
            .clone()
            .valid()
            .forward(input)
            .into_data()
            .to_vec()
            .unwrap();

        assert_eq!(from_target, from_online);
    }

    #[test]
    fn test_integration_with_environment() {
        let device = NdArrayDevice::default();
        let network = QNetworkConfig::new().init::<TestBackend>(&device);
        let config = DqnConfig {
            batch_size: 16,
            memory_capacity: 256,
            ..Default::default()
        };
        let mut agent = DqnAgent::new(network, config, 0, device);

        let mut engine = GameEngine::new(GameConfig::default(), 0);
        let mut state = engine.reset();
        let mut obs = observe(&state);

        let mut last_loss = None;
        for _ in 0..64 {
            let action = agent.act(&obs);
            let result = engine.step(&mut state, Action::from_index(action));
            let next_obs = observe(&state);

            agent.remember(Transition {
                state: obs,
                action,
                reward: result.reward,
                next_state: next_obs,
                done: result.terminated,
            });
            last_loss = agent.replay().or(last_loss);

            if result.terminated {
                state = engine.reset();
                obs = observe(&state);
            } else {
                obs = next_obs;
            }
        }

        assert!(last_loss.unwrap().is_finite());

        agent.sync_target();
        agent.decay_epsilon();
        assert!(agent.epsilon() < 1.0);
    }
}
