use burn::{config::Config, tensor::backend::Backend};
use tracing::warn;

use crate::{canvas::{Canvas, CanvasConfig}, data::{normalize, CanvasImage, NormalizedImage}, error::{LoadError, ViewError}, inference::{ModelHandle, Prediction, WeightsSource}, model::TopologyConfig};

#[derive(Config, Debug)]
pub struct SessionConfig {
    #[config(default = "TopologyConfig::new()")]
    pub topology: TopologyConfig,
    #[config(default = "CanvasConfig::new()")]
    pub canvas: CanvasConfig,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ModelStatus {
    NotLoaded,
    Loaded,
    Failed(String),
}

/// What the results panel shows after an interaction.
#[derive(Clone, Debug, PartialEq)]
pub enum SessionView {
    NeedsModel,
    NeedsDrawing,
    Prediction {
        prediction: Prediction,
        preview: NormalizedImage,
    },
}

/// State of one user session: the current model, if any, and the canvas.
///
/// Every interaction is followed by a full recompute through [`Session::view`].
/// A new upload replaces the model wholesale.
#[derive(Debug)]
pub struct Session<B: Backend> {
    topology: TopologyConfig,
    device: B::Device,
    model: Option<ModelHandle<B>>,
    status: ModelStatus,
    canvas: Canvas,
}

impl<B: Backend> Session<B> {
    pub fn new(config: &SessionConfig, device: B::Device) -> Self {
        Self {
            topology: config.topology.clone(),
            device,
            model: None,
            status: ModelStatus::NotLoaded,
            canvas: config.canvas.init(),
        }
    }

    pub fn status(&self) -> &ModelStatus {
        &self.status
    }

    pub fn model(&self) -> Option<&ModelHandle<B>> {
        self.model.as_ref()
    }

    /// Loads uploaded weights. On failure any previous model is dropped and
    /// the session stays without a usable model until a valid upload.
    pub fn upload(&mut self, source: WeightsSource) -> Result<(), LoadError> {
        match ModelHandle::from_source(source, self.topology.clone(), self.device.clone()) {
            Ok(model) => {
                self.model = Some(model);
                self.status = ModelStatus::Loaded;
                Ok(())
            }
            Err(err) => {
                warn!(%err, "rejected uploaded weights");
                self.model = None;
                self.status = ModelStatus::Failed(err.to_string());
                Err(err)
            }
        }
    }

    pub fn draw(&mut self, points: &[(f32, f32)]) {
        self.canvas.stroke(points);
    }

    pub fn replace_canvas(&mut self, canvas: CanvasImage) {
        self.canvas.replace(canvas);
    }

    pub fn clear(&mut self) {
        self.canvas.clear();
    }

    /// Recomputes the panel contents. A blank canvas returns before any
    /// normalization work.
    pub fn view(&self) -> Result<SessionView, ViewError> {
        let Some(model) = self.model.as_ref() else {
            return Ok(SessionView::NeedsModel);
        };
        if self.canvas.is_blank() {
            return Ok(SessionView::NeedsDrawing);
        }

        let preview = normalize(&self.canvas.snapshot()?);
        let prediction = model.predict(&preview)?;

        Ok(SessionView::Prediction { prediction, preview })
    }
}
