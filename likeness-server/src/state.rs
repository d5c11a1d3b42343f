//! Application state module
//!
//! Defines shared state accessible across all request handlers.

use std::path::PathBuf;
use std::sync::Arc;

use likeness_core::{Comparator, ImageGenerator};

use crate::config::Config;
use crate::db::GeneratedImageRepository;

/// Application state containing shared resources.
#[derive(Clone)]
pub struct AppState {
    /// Comparator shared by all requests; its extractor is built once
    pub comparator: Arc<Comparator>,
    /// Directory for transient comparison uploads
    pub upload_dir: PathBuf,
    /// Directory where generated images are written
    pub images_dir: PathBuf,
    /// Per-file upload limit in bytes
    pub max_file_size: usize,
    /// Image generator, present when generation is enabled
    pub generator: Option<Arc<dyn ImageGenerator>>,
    /// Repository for generated image records
    pub image_repo: Option<Arc<GeneratedImageRepository>>,
}

impl AppState {
    /// Build state for a comparator using the directories and limits in `config`
    pub fn new(comparator: Comparator, config: &Config) -> Self {
        Self {
            comparator: Arc::new(comparator),
            upload_dir: config.upload_dir.clone(),
            images_dir: config.images_dir.clone(),
            max_file_size: config.max_file_size(),
            generator: None,
            image_repo: None,
        }
    }

    /// Enable `/generate_image` with the given generator
    pub fn with_generator(mut self, generator: Arc<dyn ImageGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    /// Record generated images through the given repository
    pub fn with_image_repo(mut self, repo: GeneratedImageRepository) -> Self {
        self.image_repo = Some(Arc::new(repo));
        self
    }
}
