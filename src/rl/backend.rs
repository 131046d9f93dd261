//! Backend type aliases and device management
//!
//! This module provides convenient type aliases for the Burn backends used in
//! training and inference, as well as a helper for device management.
//!
//! # Backend Selection
//!
//! - **TrainingBackend**: Autodiff-enabled NdArray backend for training (CPU)
//! - **InferenceBackend**: Plain NdArray backend for inference (CPU)
//!
//! NdArray backend is sufficient given the 11-float observation and the small
//! dense Q-network. GPU support (via Wgpu backend) could be added later if
//! needed for larger-scale training.
//!
//! # Example
//!
//! ```rust
//! use snake_dqn::rl::{TrainingBackend, default_device};
//!
//! // Create device for training
//! let device = default_device();
//!
//! // Use with training components
//! // let network = QNetworkConfig::new().init::<TrainingBackend>(&device);
//! ```

use burn::backend::{
    Autodiff,
    ndarray::{NdArray, NdArrayDevice},
};

/// Backend type for training (with autodiff)
///
/// This is the backend used for training the DQN agent. It includes automatic
/// differentiation support needed for gradient-based optimization.
pub type TrainingBackend = Autodiff<NdArray<f32>>;

/// Backend type for inference (without autodiff)
///
/// This is the backend used for running trained models. It's more efficient
/// than the training backend since it doesn't track gradients.
pub type InferenceBackend = NdArray<f32>;

/// Get the default device for computation
///
/// Returns the default NdArray device (CPU). This can be called multiple times
/// safely as it uses Burn's device management.
pub fn default_device() -> NdArrayDevice {
    NdArrayDevice::default()
}
