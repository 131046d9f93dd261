//! Q-network for the Snake DQN agent
//!
//! This module implements the fully connected network that maps an
//! 11-feature observation to one Q-value per action.
//!
//! # Architecture
//!
//! ```text
//! Input: [batch, 11]
//!   ↓ Linear(11 → 256) + ReLU
//!   ↓ Dropout(0.2)
//!   ↓ Linear(256 → 256) + ReLU
//!   ↓ Linear(256 → 3)
//! Output: [batch, 3] Q-values (no activation)
//! ```
//!
//! Dropout only fires on autodiff backends, so training passes see it and
//! action selection or target evaluation on the inner backend does not.
//!
//! # Example
//!
//! ```rust
//! use snake_dqn::rl::QNetworkConfig;
//! use burn::backend::ndarray::NdArrayDevice;
//! use burn::backend::NdArray;
//! use burn::tensor::Tensor;
//!
//! type Backend = NdArray<f32>;
//!
//! let device = NdArrayDevice::default();
//! let config = QNetworkConfig::new();
//! let network = config.init::<Backend>(&device);
//!
//! // Forward pass with a batch of observations
//! let observation = Tensor::zeros([4, 11], &device);
//! let q_values = network.forward(observation);
//!
//! assert_eq!(q_values.dims(), [4, 3]); // [batch, num_actions]
//! ```

use burn::{
    module::Module,
    nn::{Dropout, DropoutConfig, Linear, LinearConfig},
    tensor::{Tensor, activation::relu, backend::Backend},
};

use crate::game::NUM_ACTIONS;
use crate::rl::observation::OBSERVATION_SIZE;

/// Configuration for the Q-network
///
/// Use the `new()` constructor for the standard architecture; the fields are
/// public for experiments with other widths.
#[derive(Debug, Clone)]
pub struct QNetworkConfig {
    /// Number of input features (default: 11)
    pub input_size: usize,

    /// Number of actions the network scores (default: 3)
    pub num_actions: usize,

    /// Width of the two hidden layers (default: 256)
    pub hidden_size: usize,

    /// Dropout probability after the first hidden layer (default: 0.2)
    pub dropout: f64,
}

impl QNetworkConfig {
    /// Create a new configuration with the standard hyperparameters
    pub fn new() -> Self {
        Self {
            input_size: OBSERVATION_SIZE,
            num_actions: NUM_ACTIONS,
            hidden_size: 256,
            dropout: 0.2,
        }
    }

    /// Initialize a Q-network from this configuration
    ///
    /// # Example
    ///
    /// ```rust
    /// use snake_dqn::rl::QNetworkConfig;
    /// use burn::backend::ndarray::NdArrayDevice;
    /// use burn::backend::NdArray;
    ///
    /// type Backend = NdArray<f32>;
    ///
    /// let device = NdArrayDevice::default();
    /// let network = QNetworkConfig::new().init::<Backend>(&device);
    /// ```
    pub fn init<B: Backend>(&self, device: &B::Device) -> QNetwork<B> {
        QNetwork {
            fc1: LinearConfig::new(self.input_size, self.hidden_size).init(device),
            dropout: DropoutConfig::new(self.dropout).init(),
            fc2: LinearConfig::new(self.hidden_size, self.hidden_size).init(device),
            output: LinearConfig::new(self.hidden_size, self.num_actions).init(device),
        }
    }
}

impl Default for QNetworkConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Fully connected Q-value network
///
/// The network is generic over the Backend, so the same definition serves
/// the autodiff-wrapped training copy, the detached target copy, and plain
/// inference.
#[derive(Module, Debug)]
pub struct QNetwork<B: Backend> {
    /// First hidden layer: 11 → 256
    fc1: Linear<B>,
    /// Dropout after the first hidden layer
    dropout: Dropout,
    /// Second hidden layer: 256 → 256
    fc2: Linear<B>,
    /// Output layer: 256 → 3, one Q-value per action
    output: Linear<B>,
}

impl<B: Backend> QNetwork<B> {
    /// Forward pass through the network
    ///
    /// # Arguments
    ///
    /// * `observation` - Tensor with shape `[batch, 11]`
    ///
    /// # Returns
    ///
    /// Q-values with shape `[batch, 3]`, one estimate per action, in the
    /// fixed order straight / turn right / turn left.
    pub fn forward(&self, observation: Tensor<B, 2>) -> Tensor<B, 2> {
        let x = self.fc1.forward(observation);
        let x = relu(x);
        let x = self.dropout.forward(x);

        let x = self.fc2.forward(x);
        let x = relu(x);

        self.output.forward(x)
    }

    /// First hidden layer
    pub fn fc1(&self) -> &Linear<B> {
        &self.fc1
    }

    /// Second hidden layer
    pub fn fc2(&self) -> &Linear<B> {
        &self.fc2
    }

    /// Output layer
    pub fn output(&self) -> &Linear<B> {
        &self.output
    }
}
