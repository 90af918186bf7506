use std::io::{Cursor, Write};
use std::process::{Command, Stdio};

use image::{DynamicImage, ImageFormat};
use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::models::Category;

use super::Classifier;

#[derive(Debug, Deserialize)]
struct RunnerCategory {
    label: String,
    score: f32,
}

/// Runs an external model runner once per image.
///
/// The runner receives the image as PNG on stdin and must print a JSON array
/// of `{"label": ..., "score": ...}` objects on stdout.
pub struct CommandClassifier {
    program: String,
    args: Vec<String>,
}

impl CommandClassifier {
    pub fn new(command: &[String]) -> Result<Self> {
        let (program, args) = command
            .split_first()
            .ok_or_else(|| AppError::Config("classifier_command is empty".to_string()))?;
        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
        })
    }
}

impl Classifier for CommandClassifier {
    fn classify(&self, image: &DynamicImage) -> Result<Vec<Category>> {
        let mut png = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .map_err(|e| AppError::Classification(format!("could not encode image: {}", e)))?;

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                AppError::Classification(format!("could not start {}: {}", self.program, e))
            })?;

        // stdin is written on its own thread while stdout is drained
        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| AppError::Classification("runner stdin unavailable".to_string()))?;
        let writer = std::thread::spawn(move || stdin.write_all(&png));

        let output = child.wait_with_output()?;
        if let Ok(Err(e)) = writer.join() {
            tracing::debug!("Runner closed stdin early: {}", e);
        }

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AppError::Classification(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }

        let parsed: Vec<RunnerCategory> = serde_json::from_slice(&output.stdout)
            .map_err(|e| AppError::Classification(format!("invalid runner output: {}", e)))?;

        Ok(parsed
            .into_iter()
            .map(|c| Category {
                label: c.label,
                score: c.score,
            })
            .collect())
    }
}
