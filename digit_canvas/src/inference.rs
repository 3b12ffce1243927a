use std::path::{Path, PathBuf};

use burn::{module::Module, tensor::{activation::softmax, backend::Backend, Data, Tensor}};
use derive_new::new;
use tracing::{debug, info, warn};

use crate::{data::NormalizedImage, error::{LoadError, PredictError}, model::{Model, TopologyConfig, IMAGE_SIZE}, weights};

/// Where an uploaded set of weights comes from.
#[derive(Clone, Debug)]
pub enum WeightsSource {
    Bytes(Vec<u8>),
    File(PathBuf),
}

impl WeightsSource {
    pub fn into_bytes(self) -> Result<Vec<u8>, LoadError> {
        match self {
            WeightsSource::Bytes(bytes) => Ok(bytes),
            WeightsSource::File(path) => std::fs::read(&path).map_err(|source| LoadError::Io { path, source }),
        }
    }
}

impl From<Vec<u8>> for WeightsSource {
    fn from(bytes: Vec<u8>) -> Self {
        WeightsSource::Bytes(bytes)
    }
}

impl From<&Path> for WeightsSource {
    fn from(path: &Path) -> Self {
        WeightsSource::File(path.to_path_buf())
    }
}

/// Outcome of one forward pass.
#[derive(new, Clone, Debug, PartialEq)]
pub struct Prediction {
    /// Index of the most probable class.
    pub label: usize,
    /// Probability of `label`, in percent.
    pub confidence: f32,
    /// Softmax over all classes.
    pub distribution: Vec<f32>,
}

/// A classifier whose weights loaded and validated successfully.
#[derive(Debug)]
pub struct ModelHandle<B: Backend> {
    model: Model<B>,
    topology: TopologyConfig,
    device: B::Device,
}

impl<B: Backend> ModelHandle<B> {
    /// Loads a weights blob into `topology`.
    pub fn load(blob: &[u8], topology: TopologyConfig, device: B::Device) -> Result<Self, LoadError> {
        let record = weights::decode::<B>(blob, &topology, &device)?;
        let model = topology.init_with::<B>(record);
        info!(bytes = blob.len(), "model loaded");

        Ok(Self { model, topology, device })
    }

    pub fn from_source(source: WeightsSource, topology: TopologyConfig, device: B::Device) -> Result<Self, LoadError> {
        Self::load(&source.into_bytes()?, topology, device)
    }

    pub fn topology(&self) -> &TopologyConfig {
        &self.topology
    }

    /// Serializes the loaded weights back into the blob format.
    pub fn to_bytes(&self) -> Result<Vec<u8>, LoadError> {
        weights::encode(self.model.clone().into_record())
    }

    /// Scores one image. Ties in the distribution resolve to the lowest label.
    ///
    /// Finite weights can still overflow the logits, so a distribution with
    /// NaN or infinite entries is reported as [`PredictError::NonFinite`].
    pub fn predict(&self, image: &NormalizedImage) -> Result<Prediction, PredictError> {
        let input = Tensor::<B, 2>::from_data(Data::<f32, 2>::from(image.pixels).convert(), &self.device)
            .reshape([1, IMAGE_SIZE, IMAGE_SIZE]);

        let output = self.model.forward(input);
        let distribution = softmax(output, 1).into_data().convert::<f32>().value;
        if !distribution.iter().all(|p| p.is_finite()) {
            warn!("forward pass overflowed");
            return Err(PredictError::NonFinite);
        }

        let (label, probability) = distribution
            .iter()
            .copied()
            .enumerate()
            .fold((0, f32::NEG_INFINITY), |best, (index, p)| if p > best.1 { (index, p) } else { best });
        let confidence = probability * 100.0;
        debug!(label, confidence, "prediction");

        Ok(Prediction::new(label, confidence, distribution))
    }
}
