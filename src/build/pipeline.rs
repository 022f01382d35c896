//! Image build and push.
//!
//! The pipeline runs two external commands strictly in sequence:
//! `build -t <image> --platform linux/amd64 <path>`, then `push <image>`.
//! The first failure stops the sequence; nothing is retried or rolled back.
//! One pipeline call touches one image, so callers fanning out across
//! services must not run two calls for the same image at once.

use std::path::Path;
use tracing::info;

use crate::error::{BuildError, BuildStep, Result, ShipyardError};

use super::executor::Executor;
use super::progress::Progress;

/// Default container tool.
pub const DEFAULT_TOOL: &str = "docker";

/// Platform every image is built for.
pub const TARGET_PLATFORM: &str = "linux/amd64";

/// Builds and pushes container images through an [`Executor`].
#[derive(Debug)]
pub struct ImagePipeline<E> {
    executor: E,
    tool: String,
    progress: Progress,
}

impl<E: Executor> ImagePipeline<E> {
    /// Creates a pipeline using `docker` with spinner output.
    #[must_use]
    pub fn new(executor: E) -> Self {
        Self {
            executor,
            tool: String::from(DEFAULT_TOOL),
            progress: Progress::Spinner,
        }
    }

    /// Overrides the container tool (e.g. `podman`).
    #[must_use]
    pub fn with_tool(mut self, tool: impl Into<String>) -> Self {
        self.tool = tool.into();
        self
    }

    /// Sets how progress is reported.
    #[must_use]
    pub fn with_progress(mut self, progress: Progress) -> Self {
        self.progress = progress;
        self
    }

    /// Builds `image` from `build_path`, then pushes it.
    ///
    /// # Errors
    ///
    /// Returns `BuildError::StepFailed` naming the step that failed.
    pub async fn deploy(&self, image: &str, build_path: impl AsRef<Path>) -> Result<()> {
        let build_path = build_path.as_ref();
        info!("Building image {} from {}", image, build_path.display());

        self.progress
            .run("Building image", "Image built", self.build_image(image, build_path))
            .await?;

        self.progress
            .run("Pushing image", "Image pushed", self.push_image(image))
            .await?;

        info!("Image {image} pushed");
        Ok(())
    }

    async fn build_image(&self, image: &str, path: &Path) -> Result<()> {
        let args = vec![
            String::from("build"),
            String::from("-t"),
            image.to_string(),
            String::from("--platform"),
            String::from(TARGET_PLATFORM),
            path.display().to_string(),
        ];
        self.step(BuildStep::Build, image, &args).await
    }

    async fn push_image(&self, image: &str) -> Result<()> {
        let args = vec![String::from("push"), image.to_string()];
        self.step(BuildStep::Push, image, &args).await
    }

    async fn step(&self, step: BuildStep, image: &str, args: &[String]) -> Result<()> {
        self.executor
            .run_command(&self.tool, args)
            .await
            .map(|_| ())
            .map_err(|e| {
                ShipyardError::Build(BuildError::StepFailed {
                    step,
                    image: image.to_string(),
                    message: e.to_string(),
                })
            })
    }
}
