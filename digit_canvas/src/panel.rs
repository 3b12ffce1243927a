use std::fmt;

use derive_new::new;

use crate::{data::NormalizedImage, session::{ModelStatus, SessionView}};

const BAR_WIDTH: usize = 40;
const SHADES: &[u8] = b" .:-=+*#%@";

/// Text rendering of the results panel.
#[derive(new)]
pub struct Panel<'a> {
    status: &'a ModelStatus,
    view: &'a SessionView,
}

impl fmt::Display for Panel<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            ModelStatus::Loaded => writeln!(f, "Model loaded successfully!")?,
            ModelStatus::Failed(message) => writeln!(f, "Error loading model: {message}")?,
            ModelStatus::NotLoaded => writeln!(f, "Please train and upload a model first")?,
        }
        writeln!(f)?;

        match self.view {
            SessionView::NeedsModel => writeln!(f, "Upload a trained model to start classifying"),
            SessionView::NeedsDrawing => writeln!(f, "Draw a digit on the canvas"),
            SessionView::Prediction { prediction, preview } => {
                writeln!(f, "Predicted Digit: {}", prediction.label)?;
                writeln!(f, "Confidence: {:.1}%", prediction.confidence)?;
                writeln!(f)?;

                writeln!(f, "Probability Distribution")?;
                for (label, probability) in prediction.distribution.iter().enumerate() {
                    let filled = (probability * BAR_WIDTH as f32).round() as usize;
                    writeln!(f, "{label} | {:<width$} {probability:.3}", "#".repeat(filled.min(BAR_WIDTH)), width = BAR_WIDTH)?;
                }
                writeln!(f)?;

                writeln!(f, "Processed image (28x28)")?;
                write_preview(f, preview)
            }
        }
    }
}

fn write_preview(f: &mut fmt::Formatter<'_>, preview: &NormalizedImage) -> fmt::Result {
    let image = preview.to_gray_image();
    for row in image.rows() {
        let line: String = row
            .map(|pixel| SHADES[pixel.0[0] as usize * (SHADES.len() - 1) / 255] as char)
            .collect();
        writeln!(f, "{line}")?;
    }
    Ok(())
}
