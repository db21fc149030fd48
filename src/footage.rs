use rand::seq::SliceRandom;
use reqwest::blocking::Client;
use serde::Deserialize;
use std::fs::File;
use std::path::PathBuf;
use tracing::{debug, info, warn};

use crate::compose::{TARGET_HEIGHT, TARGET_WIDTH, probe_video_dimensions};
use crate::config::Config;
use crate::error::{PipelineError, PipelineResult};
use crate::utils::timestamp_tag;

pub const PEXELS_BASE_URL: &str = "https://api.pexels.com";
pub const SEARCH_PAGE_SIZE: u32 = 15;

/// Filler colours: dark blue, purple, dark red, dark green.
pub const FILLER_PALETTE: [[u8; 3]; 4] = [[20, 20, 30], [30, 20, 40], [40, 20, 20], [20, 30, 20]];

/// Background video for one short.
#[derive(Debug, Clone, PartialEq)]
pub enum FootageAsset {
    /// Downloaded stock clip. Its own length is unrelated to `duration`,
    /// which is what the composer cuts or loops it to.
    Stock {
        path: PathBuf,
        width: u32,
        height: u32,
        duration: f64,
    },
    /// Solid colour clip generated at encode time.
    Filler { color: [u8; 3], duration: f64 },
}

impl FootageAsset {
    pub fn filler(duration: f64) -> Self {
        let color = *FILLER_PALETTE
            .choose(&mut rand::thread_rng())
            .unwrap_or(&FILLER_PALETTE[0]);
        FootageAsset::Filler { color, duration }
    }

    pub fn width(&self) -> u32 {
        match self {
            FootageAsset::Stock { width, .. } => *width,
            FootageAsset::Filler { .. } => TARGET_WIDTH,
        }
    }

    pub fn height(&self) -> u32 {
        match self {
            FootageAsset::Stock { height, .. } => *height,
            FootageAsset::Filler { .. } => TARGET_HEIGHT,
        }
    }

    pub fn duration(&self) -> f64 {
        match self {
            FootageAsset::Stock { duration, .. } | FootageAsset::Filler { duration, .. } => {
                *duration
            }
        }
    }
}

pub trait FootageSource {
    /// Never fails for lack of stock footage; a filler clip is returned
    /// instead.
    fn fetch(&self, keyword: &str, duration: f64) -> PipelineResult<FootageAsset>;
}

#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub videos: Vec<PexelsVideo>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PexelsVideo {
    pub id: u64,
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
    #[serde(default)]
    pub video_files: Vec<PexelsVideoFile>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PexelsVideoFile {
    pub link: String,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
}

/// Stock footage from the Pexels video search, falling back to a filler
/// clip when no key is configured, nothing matches, or a request fails.
pub struct PexelsFootage {
    api_key: Option<String>,
    base_url: String,
    temp_dir: PathBuf,
    http: Client,
}

impl PexelsFootage {
    pub fn new(api_key: Option<String>, temp_dir: impl Into<PathBuf>) -> Self {
        Self::with_base_url(api_key, temp_dir, PEXELS_BASE_URL)
    }

    pub fn with_base_url(
        api_key: Option<String>,
        temp_dir: impl Into<PathBuf>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            api_key,
            base_url: base_url.into(),
            temp_dir: temp_dir.into(),
            http: Client::new(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.pexels_api_key.clone(), config.temp_directory.clone())
    }

    fn search(&self, api_key: &str, keyword: &str) -> PipelineResult<Vec<PexelsVideo>> {
        let url = format!("{}/videos/search", self.base_url);
        let per_page = SEARCH_PAGE_SIZE.to_string();
        let res: SearchResponse = self
            .http
            .get(&url)
            .header(reqwest::header::AUTHORIZATION, api_key)
            .query(&[
                ("query", keyword),
                ("per_page", per_page.as_str()),
                ("orientation", "portrait"),
            ])
            .send()?
            .error_for_status()?
            .json()?;
        debug!("Pexels returned {} videos for '{}'", res.videos.len(), keyword);
        Ok(res.videos)
    }

    fn download(
        &self,
        video: &PexelsVideo,
        keyword: &str,
        duration: f64,
    ) -> PipelineResult<FootageAsset> {
        let file = video
            .video_files
            .first()
            .ok_or_else(|| PipelineError::provider(format!("video {} has no files", video.id)))?;
        let path = self.temp_dir.join(format!(
            "stock_{}_{}.mp4",
            sanitize_keyword(keyword),
            timestamp_tag()
        ));
        info!("Downloading stock clip {} to {}", video.id, path.display());

        let mut res = self.http.get(&file.link).send()?.error_for_status()?;
        let mut out = File::create(&path)?;
        res.copy_to(&mut out)?;

        let (width, height) = match (
            file.width.unwrap_or(video.width),
            file.height.unwrap_or(video.height),
        ) {
            (w, h) if w > 0 && h > 0 => (w, h),
            _ => probe_video_dimensions(&path)?,
        };
        Ok(FootageAsset::Stock {
            path,
            width,
            height,
            duration,
        })
    }
}

impl FootageSource for PexelsFootage {
    fn fetch(&self, keyword: &str, duration: f64) -> PipelineResult<FootageAsset> {
        let Some(api_key) = self.api_key.as_deref() else {
            debug!("No Pexels key configured, using filler clip");
            return Ok(FootageAsset::filler(duration));
        };

        let videos = match self.search(api_key, keyword) {
            Ok(videos) => videos,
            Err(e) => {
                warn!("Stock footage search for '{keyword}' failed ({e}), using filler clip");
                return Ok(FootageAsset::filler(duration));
            }
        };
        let Some(video) = videos.choose(&mut rand::thread_rng()) else {
            info!("No stock footage for '{keyword}', using filler clip");
            return Ok(FootageAsset::filler(duration));
        };

        match self.download(video, keyword, duration) {
            Ok(asset) => Ok(asset),
            Err(e) => {
                warn!("Stock footage download failed ({e}), using filler clip");
                Ok(FootageAsset::filler(duration))
            }
        }
    }
}

fn sanitize_keyword(keyword: &str) -> String {
    keyword
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}
