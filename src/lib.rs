pub mod args;
pub mod audio;
pub mod batch;
pub mod compose;
pub mod config;
pub mod content;
pub mod error;
pub mod footage;
pub mod openai;
pub mod script;
pub mod subtitle;
pub mod tts;
pub mod utils;

pub use batch::{GenerationResult, VideoGenerator};
pub use config::Config;
pub use content::{ContentItem, Manifest};
pub use error::{PipelineError, PipelineResult};

/// Shared `tracing` setup for the binaries; `RUST_LOG` overrides `info`.
pub fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
