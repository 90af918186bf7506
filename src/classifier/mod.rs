mod command;
mod decode;

use std::cmp::Ordering;
use std::path::Path;

use image::DynamicImage;

use crate::error::{AppError, Result};
use crate::models::Category;

pub use command::CommandClassifier;
pub use decode::{crop_square, decode_image};

/// An image classification model. Implementations may block; callers run them
/// off the UI task.
pub trait Classifier: Send + Sync {
    fn classify(&self, image: &DynamicImage) -> Result<Vec<Category>>;
}

/// Validate raw model output and order it by descending confidence.
pub fn rank(categories: Vec<Category>) -> Result<Vec<Category>> {
    let mut ranked: Vec<Category> = categories
        .into_iter()
        .filter(|c| c.score.is_finite())
        .map(|c| Category {
            score: c.score.clamp(0.0, 1.0),
            ..c
        })
        .collect();

    if ranked.is_empty() {
        return Err(AppError::Classification("model returned no results".to_string()));
    }

    ranked.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    Ok(ranked)
}

/// Decode, square-crop and classify the image at `path`.
pub fn classify_file(
    classifier: &dyn Classifier,
    path: &Path,
    max_side: u32,
) -> Result<Vec<Category>> {
    let image = decode_image(path)?;
    let image = crop_square(&image, max_side);
    tracing::debug!(
        "Classifying {} ({}x{})",
        path.display(),
        image.width(),
        image.height()
    );
    rank(classifier.classify(&image)?)
}

/// Label shown to the user and stored in history, e.g. `Benign 92.50%`.
pub fn format_result(category: &Category) -> String {
    format!("{} {:.2}%", category.label, category.score * 100.0)
}
