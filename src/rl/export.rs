//! Policy export for deployment outside the training stack
//!
//! This module converts a trained Q-network into a small, self-describing
//! JSON artifact that downstream consumers can evaluate with nothing but a
//! JSON parser and a dot product. Export goes through a staging directory:
//! the network is first written as a Burn record, reloaded, and only the
//! reloaded copy is flattened into the artifact, so the artifact always
//! reflects what the record round-trip preserves.
//!
//! Both the export directory and the staging directory are cleared
//! wholesale at the start of an export, which makes repeated exports (and
//! exports over the debris of a crashed run) land in a clean state.

use super::network::{QNetwork, QNetworkConfig};
use anyhow::{Context, Result, anyhow, bail};
use burn::{
    module::Module,
    nn::Linear,
    record::{FullPrecisionSettings, NamedMpkFileRecorder, Recorder},
    tensor::backend::Backend,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File name of the exported artifact inside the export directory
pub const ARTIFACT_FILE_NAME: &str = "model.json";

/// File stem of the staged Burn record (the recorder adds its extension)
const NETWORK_RECORD_NAME: &str = "q_network";

/// Portable description of a trained policy
///
/// Holds the flattened weights of every dense layer plus enough metadata
/// to sanity-check an observation before scoring it. Dropout has no effect
/// at inference time, so it does not appear here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyArtifact {
    /// Version identifier for compatibility checking
    pub version: String,

    /// Number of input features the policy expects
    pub input_size: usize,

    /// Width of the hidden layers
    pub hidden_size: usize,

    /// Number of actions the policy scores
    pub num_actions: usize,

    /// Number of episodes the policy was trained for
    pub episodes_trained: usize,

    /// Dense layers in forward order
    pub layers: Vec<DenseLayer>,
}

impl PolicyArtifact {
    /// Flatten a Q-network into an artifact
    pub fn from_network<B: Backend>(
        network: &QNetwork<B>,
        config: &QNetworkConfig,
        episodes_trained: usize,
    ) -> Result<Self> {
        let layers = vec![
            DenseLayer::from_linear(network.fc1())?,
            DenseLayer::from_linear(network.fc2())?,
            DenseLayer::from_linear(network.output())?,
        ];

        Ok(Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            input_size: config.input_size,
            hidden_size: config.hidden_size,
            num_actions: config.num_actions,
            episodes_trained,
            layers,
        })
    }

    /// Compute Q-values for an observation
    ///
    /// ReLU is applied between layers; the final layer's output is returned
    /// as is.
    pub fn q_values(&self, observation: &[f32]) -> Vec<f32> {
        let mut activations = observation.to_vec();
        let last = self.layers.len().saturating_sub(1);

        for (i, layer) in self.layers.iter().enumerate() {
            activations = layer.forward(&activations);
            if i < last {
                for value in &mut activations {
                    *value = value.max(0.0);
                }
            }
        }

        activations
    }

    /// Index of the highest-valued action for an observation
    ///
    /// Ties break toward the lowest action index, matching the training
    /// loop's greedy selection.
    pub fn best_action(&self, observation: &[f32]) -> usize {
        argmax(&self.q_values(observation))
    }

    /// Save the artifact as pretty-printed JSON
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json =
            serde_json::to_string_pretty(self).context("Failed to serialize policy artifact")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write policy artifact to {:?}", path))?;

        Ok(())
    }

    /// Load and validate an artifact from a JSON file
    pub fn load_json(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read policy artifact from {:?}", path))?;
        let artifact: Self =
            serde_json::from_str(&json).context("Failed to parse policy artifact")?;

        artifact.validate()?;
        Ok(artifact)
    }

    /// Check that the layer dimensions form a consistent chain
    fn validate(&self) -> Result<()> {
        let first = self.layers.first().context("Artifact has no layers")?;
        let last = self.layers.last().context("Artifact has no layers")?;

        if first.in_features != self.input_size {
            bail!(
                "Artifact input size mismatch: layers expect {}, header says {}",
                first.in_features,
                self.input_size
            );
        }

        if last.out_features != self.num_actions {
            bail!(
                "Artifact action count mismatch: layers produce {}, header says {}",
                last.out_features,
                self.num_actions
            );
        }

        for (i, layer) in self.layers.iter().enumerate() {
            if layer.weights.len() != layer.in_features * layer.out_features {
                bail!(
                    "Layer {} weight count {} does not match {}x{}",
                    i,
                    layer.weights.len(),
                    layer.in_features,
                    layer.out_features
                );
            }
            if layer.bias.len() != layer.out_features {
                bail!(
                    "Layer {} bias count {} does not match {} outputs",
                    i,
                    layer.bias.len(),
                    layer.out_features
                );
            }
        }

        for (i, pair) in self.layers.windows(2).enumerate() {
            if pair[0].out_features != pair[1].in_features {
                bail!(
                    "Layer {} outputs {} features but layer {} expects {}",
                    i,
                    pair[0].out_features,
                    i + 1,
                    pair[1].in_features
                );
            }
        }

        Ok(())
    }
}

/// One dense layer with flattened row-major weights
///
/// `weights[i * out_features + j]` is the weight from input `i` to
/// output `j`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DenseLayer {
    pub weights: Vec<f32>,
    pub bias: Vec<f32>,
    pub in_features: usize,
    pub out_features: usize,
}

impl DenseLayer {
    /// Copy the parameters out of a Burn linear layer
    fn from_linear<B: Backend>(linear: &Linear<B>) -> Result<Self> {
        let weight = linear.weight.val();
        let [in_features, out_features] = weight.dims();

        let weights: Vec<f32> = weight
            .into_data()
            .to_vec()
            .map_err(|err| anyhow!("Failed to read layer weights: {:?}", err))?;

        let bias = match &linear.bias {
            Some(bias) => bias
                .val()
                .into_data()
                .to_vec()
                .map_err(|err| anyhow!("Failed to read layer bias: {:?}", err))?,
            None => vec![0.0; out_features],
        };

        Ok(Self {
            weights,
            bias,
            in_features,
            out_features,
        })
    }

    /// Affine transform of the input, without activation
    pub fn forward(&self, input: &[f32]) -> Vec<f32> {
        assert_eq!(input.len(), self.in_features, "Input size mismatch");

        let mut output = self.bias.clone();

        for (i, &x) in input.iter().enumerate() {
            let row = &self.weights[i * self.out_features..(i + 1) * self.out_features];
            for (j, &w) in row.iter().enumerate() {
                output[j] += x * w;
            }
        }

        output
    }
}

/// Export a trained Q-network as a portable JSON artifact
///
/// Runs in three phases:
/// 1. Delete the export directory if it exists.
/// 2. Recreate the staging directory, write the network there as a Burn
///    record, and reload that record into a fresh network.
/// 3. Flatten the reloaded network into `model.json` inside a fresh export
///    directory, then delete the staging directory.
///
/// # Returns
///
/// The path of the written artifact file
pub fn export_policy<B: Backend>(
    network: &QNetwork<B>,
    network_config: &QNetworkConfig,
    episodes_trained: usize,
    export_dir: &Path,
    staging_dir: &Path,
    device: &B::Device,
) -> Result<PathBuf> {
    if export_dir.exists() {
        std::fs::remove_dir_all(export_dir)
            .with_context(|| format!("Failed to clear export directory {:?}", export_dir))?;
    }

    if staging_dir.exists() {
        std::fs::remove_dir_all(staging_dir)
            .with_context(|| format!("Failed to clear staging directory {:?}", staging_dir))?;
    }
    std::fs::create_dir_all(staging_dir)
        .with_context(|| format!("Failed to create staging directory {:?}", staging_dir))?;

    let record_path = staging_dir.join(NETWORK_RECORD_NAME);
    let recorder = NamedMpkFileRecorder::<FullPrecisionSettings>::new();
    recorder
        .record(network.clone().into_record(), record_path.clone())
        .context("Failed to stage network weights")?;

    let record = recorder
        .load(record_path, device)
        .context("Failed to reload staged network weights")?;
    let staged = network_config.init::<B>(device).load_record(record);

    let artifact = PolicyArtifact::from_network(&staged, network_config, episodes_trained)?;

    std::fs::create_dir_all(export_dir)
        .with_context(|| format!("Failed to create export directory {:?}", export_dir))?;
    let artifact_path = export_dir.join(ARTIFACT_FILE_NAME);
    artifact.save_json(&artifact_path)?;

    std::fs::remove_dir_all(staging_dir)
        .with_context(|| format!("Failed to remove staging directory {:?}", staging_dir))?;

    Ok(artifact_path)
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
    use crate::rl::observation::{OBSERVATION_SIZE, batch_to_tensor};
    use burn::backend::ndarray::{NdArray, NdArrayDevice};
    use tempfile::TempDir;

    type TestBackend = NdArray<f32>;

    fn test_observation(bits: &[usize]) -> [f32; OBSERVATION_SIZE] {
        let mut obs = [0.0; OBSERVATION_SIZE];
        for &bit in bits {
            obs[bit] = 1.0;
        }
        obs
    }

    fn network_q_values(
        network: &QNetwork<TestBackend>,
        obs: &[f32; OBSERVATION_SIZE],
    ) -> Vec<f32> {
        let device = NdArrayDevice::default();
        let input = batch_to_tensor::<TestBackend>(&[*obs], &device);
        network.forward(input).into_data().to_vec().unwrap()
    }

    #[test]
    fn test_dense_layer_forward() {
        let layer = DenseLayer {
            weights: vec![1.0, 2.0, 3.0, 4.0],
            bias: vec![0.5, -0.5],
            in_features: 2,
            out_features: 2,
        };

        let output = layer.forward(&[1.0, 1.0]);
        assert_eq!(output, vec![4.5, 5.5]);
    }

    #[test]
    #[should_panic(expected = "Input size mismatch")]
    fn test_forward_wrong_input_size() {
        let layer = DenseLayer {
            weights: vec![1.0, 2.0, 3.0, 4.0],
            bias: vec![0.5, -0.5],
            in_features: 2,
            out_features: 2,
        };

        layer.forward(&[1.0, 1.0, 1.0]);
    }

    #[test]
    #[should_panic(expected = "Input size mismatch")]
    fn test_q_values_wrong_observation_size() {
        let device = NdArrayDevice::default();
        let config = QNetworkConfig::new();
        let network = config.init::<TestBackend>(&device);
        let artifact = PolicyArtifact::from_network(&network, &config, 0).unwrap();

        artifact.q_values(&[1.0; OBSERVATION_SIZE + 1]);
    }

    #[test]
    fn test_relu_between_layers_but_not_at_output() {
        let artifact = PolicyArtifact {
            version: "test".to_string(),
            input_size: 1,
            hidden_size: 1,
            num_actions: 1,
            episodes_trained: 0,
            layers: vec![
                DenseLayer {
                    weights: vec![1.0],
                    bias: vec![0.0],
                    in_features: 1,
                    out_features: 1,
                },
                DenseLayer {
                    weights: vec![1.0],
                    bias: vec![-1.0],
                    in_features: 1,
                    out_features: 1,
                },
            ],
        };

        // -2 is clipped to 0 between layers, and the output layer is free
        // to go negative
        assert_eq!(artifact.q_values(&[-2.0]), vec![-1.0]);
    }

    #[test]
    fn test_artifact_matches_network() {
        let device = NdArrayDevice::default();
        let config = QNetworkConfig::new();
        let network = config.init::<TestBackend>(&device);

        let artifact = PolicyArtifact::from_network(&network, &config, 10).unwrap();
        assert_eq!(artifact.input_size, OBSERVATION_SIZE);
        assert_eq!(artifact.num_actions, 3);
        assert_eq!(artifact.layers.len(), 3);

        for obs in [
            test_observation(&[]),
            test_observation(&[0, 4, 8]),
            test_observation(&[1, 2, 3, 7, 10]),
        ] {
            let expected = network_q_values(&network, &obs);
            let actual = artifact.q_values(&obs);

            assert_eq!(actual.len(), expected.len());
            for (a, e) in actual.iter().zip(expected.iter()) {
                assert!(
                    (a - e).abs() < 1e-5,
                    "artifact Q-value {} drifted from network value {}",
                    a,
                    e
                );
            }
        }
    }

    #[test]
    fn test_best_action_matches_q_values() {
        let device = NdArrayDevice::default();
        let config = QNetworkConfig::new();
        let network = config.init::<TestBackend>(&device);
        let artifact = PolicyArtifact::from_network(&network, &config, 0).unwrap();

        let obs = test_observation(&[4, 9]);
        let q = artifact.q_values(&obs);
        let best = artifact.best_action(&obs);

        for (i, &value) in q.iter().enumerate() {
            assert!(value <= q[best]);
            if value == q[best] {
                assert!(best <= i);
            }
        }
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("model.json");

        let device = NdArrayDevice::default();
        let config = QNetworkConfig::new();
        let network = config.init::<TestBackend>(&device);
        let artifact = PolicyArtifact::from_network(&network, &config, 123).unwrap();

        artifact.save_json(&path).unwrap();
        let loaded = PolicyArtifact::load_json(&path).unwrap();

        assert_eq!(loaded, artifact);
        assert_eq!(loaded.episodes_trained, 123);
    }

    #[test]
    fn test_load_rejects_inconsistent_layers() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("model.json");

        let device = NdArrayDevice::default();
        let config = QNetworkConfig::new();
        let network = config.init::<TestBackend>(&device);
        let mut artifact = PolicyArtifact::from_network(&network, &config, 0).unwrap();

        // Break the dimension chain
        artifact.layers[1].in_features = 7;
        artifact.save_json(&path).unwrap();

        assert!(PolicyArtifact::load_json(&path).is_err());
    }

    #[test]
    fn test_export_writes_artifact_and_removes_staging() {
        let dir = TempDir::new().unwrap();
        let export_dir = dir.path().join("models").join("snake-rl");
        let staging_dir = dir.path().join("staging");

        let device = NdArrayDevice::default();
        let config = QNetworkConfig::new();
        let network = config.init::<TestBackend>(&device);

        let artifact_path = export_policy(
            &network,
            &config,
            50,
            &export_dir,
            &staging_dir,
            &device,
        )
        .unwrap();

        assert_eq!(artifact_path, export_dir.join(ARTIFACT_FILE_NAME));
        assert!(artifact_path.exists());
        assert!(!staging_dir.exists());

        // The exported artifact must predict exactly like the source network
        let loaded = PolicyArtifact::load_json(&artifact_path).unwrap();
        assert_eq!(loaded.episodes_trained, 50);

        let obs = test_observation(&[0, 5, 8]);
        let expected = network_q_values(&network, &obs);
        for (a, e) in loaded.q_values(&obs).iter().zip(expected.iter()) {
            assert!((a - e).abs() < 1e-5);
        }
    }

    #[test]
    fn test_export_overwrites_previous_export() {
        let dir = TempDir::new().unwrap();
        let export_dir = dir.path().join("export");
        let staging_dir = dir.path().join("staging");

        std::fs::create_dir_all(&export_dir).unwrap();
        let stale = export_dir.join("stale.bin");
        std::fs::write(&stale, b"old artifact").unwrap();

        let device = NdArrayDevice::default();
        let config = QNetworkConfig::new();
        let network = config.init::<TestBackend>(&device);

        export_policy(&network, &config, 1, &export_dir, &staging_dir, &device).unwrap();

        assert!(!stale.exists());
        assert!(export_dir.join(ARTIFACT_FILE_NAME).exists());
    }

    #[test]
    fn test_export_clears_leftover_staging() {
        let dir = TempDir::new().unwrap();
        let export_dir = dir.path().join("export");
        let staging_dir = dir.path().join("staging");

        // Debris from a previous crashed export
        std::fs::create_dir_all(&staging_dir).unwrap();
        std::fs::write(staging_dir.join("junk"), b"leftover").unwrap();

        let device = NdArrayDevice::default();
        let config = QNetworkConfig::new();
        let network = config.init::<TestBackend>(&device);

        export_policy(&network, &config, 1, &export_dir, &staging_dir, &device).unwrap();

        assert!(!staging_dir.exists());
        assert!(export_dir.join(ARTIFACT_FILE_NAME).exists());
    }
}
