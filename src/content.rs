use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;

use crate::error::{PipelineError, PipelineResult};

pub const DEFAULT_KEYWORD: &str = "abstract";

/// One video to produce.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    pub title: String,
    #[serde(default)]
    pub script: String,
    #[serde(default = "default_keyword")]
    pub keyword: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub niche: String,
}

fn default_keyword() -> String {
    DEFAULT_KEYWORD.to_string()
}

impl ContentItem {
    /// Checks the fields the pipeline cannot work without.
    pub fn validate(&self) -> PipelineResult<()> {
        if self.title.trim().is_empty() {
            return Err(PipelineError::input("content item has an empty title"));
        }
        if self.script.trim().is_empty() {
            return Err(PipelineError::input(format!(
                "content item '{}' has an empty script",
                self.title
            )));
        }
        Ok(())
    }
}

/// The `{"videos": [...]}` file passed from the script generator to the
/// video generator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub videos: Vec<ContentItem>,
}

impl Manifest {
    pub fn load(path: &Path) -> PipelineResult<Self> {
        let data = fs::read_to_string(path).map_err(|e| {
            PipelineError::input(format!("cannot read manifest {}: {e}", path.display()))
        })?;
        let manifest: Manifest = serde_json::from_str(&data).map_err(|e| {
            PipelineError::input(format!("malformed manifest {}: {e}", path.display()))
        })?;
        info!(
            "Loaded manifest {} with {} videos",
            path.display(),
            manifest.videos.len()
        );
        Ok(manifest)
    }

    pub fn save(&self, path: &Path) -> PipelineResult<()> {
        let data = serde_json::to_string_pretty(self).map_err(anyhow::Error::from)?;
        fs::write(path, data)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn optional_fields_fall_back() {
        let manifest: Manifest =
            serde_json::from_str(r#"{"videos": [{"title": "t", "script": "s"}]}"#).unwrap();
        let item = &manifest.videos[0];
        assert_eq!(item.keyword, "abstract");
        assert!(item.tags.is_empty());
        assert_eq!(item.niche, "");
    }

    #[test]
    fn missing_script_loads_as_blank_and_fails_validation() {
        let manifest: Manifest = serde_json::from_str(r#"{"videos": [{"title": "t"}]}"#).unwrap();
        assert_eq!(manifest.videos[0].script, "");
        assert!(matches!(
            manifest.videos[0].validate(),
            Err(PipelineError::Input(_))
        ));
    }

    #[test]
    fn missing_manifest_is_an_input_error() {
        let dir = tempdir().unwrap();
        let err = Manifest::load(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, PipelineError::Input(_)));
    }

    #[test]
    fn manifest_without_videos_key_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, r#"[{"title": "t", "script": "s"}]"#).unwrap();
        assert!(matches!(Manifest::load(&path), Err(PipelineError::Input(_))));
    }

    #[test]
    fn blank_script_fails_validation() {
        let item = ContentItem {
            title: "Title".into(),
            script: "   ".into(),
            keyword: DEFAULT_KEYWORD.into(),
            tags: vec![],
            niche: "health".into(),
        };
        assert!(matches!(item.validate(), Err(PipelineError::Input(_))));
    }
}
