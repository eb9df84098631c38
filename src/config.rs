use std::path::PathBuf;

use serde::Serialize;

/// Application-level constants
pub const APP_NAME: &str = "TitleScan";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default tracing filter when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    if cfg!(debug_assertions) {
        "titlescan_lib=debug,titlescan=debug"
    } else {
        "titlescan_lib=info,titlescan=info"
    }
}

/// Get the application data directory (~/TitleScan/).
/// Falls back to the working directory when no home directory is known.
pub fn app_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("TitleScan")
}

/// Get the models directory (for ONNX embeddings, etc.)
pub fn models_dir() -> PathBuf {
    app_data_dir().join("models")
}

/// Get the embedding model directory (all-MiniLM-L6-v2)
pub fn embedding_model_dir() -> PathBuf {
    models_dir().join("all-MiniLM-L6-v2")
}

/// Tesseract language data. `TESSDATA_PREFIX` overrides the bundled location.
pub fn tessdata_dir() -> PathBuf {
    std::env::var("TESSDATA_PREFIX")
        .map(PathBuf::from)
        .unwrap_or_else(|_| models_dir().join("tessdata"))
}

/// Tunables for the document-understanding pipeline.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineConfig {
    /// Native text longer than this many characters marks a page as digital.
    pub min_native_text_chars: usize,
    /// Rasterisation resolution for pages sent to OCR.
    pub ocr_dpi: u32,
    /// OCR language code handed to the backend.
    pub ocr_language: String,
    /// Best sentence similarity must be strictly above this to fill a slot.
    pub entity_min_similarity: f32,
    /// Upper bound on concurrent page workers per document.
    pub max_page_workers: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        let workers = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
            .min(8);
        Self {
            min_native_text_chars: 30,
            ocr_dpi: 300,
            ocr_language: "eng".into(),
            entity_min_similarity: 0.5,
            max_page_workers: workers,
        }
    }
}

/// Connection settings for the collaborators around the pipeline.
#[derive(Debug, Clone)]
pub struct CollaboratorConfig {
    pub label_studio_url: String,
    pub label_studio_token: String,
    pub label_studio_project: String,
    pub object_store_root: PathBuf,
    pub bucket: String,
    pub metadata_db_path: PathBuf,
}

impl CollaboratorConfig {
    /// Read settings from the environment, using the deployment defaults
    /// for anything unset.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());
        Self {
            label_studio_url: get("LABEL_STUDIO_URL", "http://labelstudio:8080"),
            label_studio_token: get("LABEL_STUDIO_TOKEN", "changeme"),
            label_studio_project: get("LABEL_STUDIO_PID", "1"),
            object_store_root: lookup("TITLESCAN_OBJECT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| app_data_dir().join("objects")),
            bucket: get("TITLESCAN_BUCKET", "title-search-bucket"),
            metadata_db_path: lookup("TITLESCAN_METADATA_DB")
                .map(PathBuf::from)
                .unwrap_or_else(|| app_data_dir().join("metadata.db")),
        }
    }
}
