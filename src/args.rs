use clap::Parser;
use std::path::PathBuf;

const NICHE_HELP: &str = "Available niches:
  - self-improvement
  - finance
  - productivity
  - motivation
  - health

Example: generate-scripts finance 20";

/// Render every video described in a content manifest.
#[derive(Parser, Debug)]
#[clap(name = "generate-video")]
pub struct VideoArgs {
    /// Content manifest produced by generate-scripts
    pub manifest: PathBuf,

    #[clap(long, default_value = "config.json")]
    pub config: PathBuf,
}

/// Write a content manifest of short-video scripts for a niche.
#[derive(Parser, Debug)]
#[clap(name = "generate-scripts", after_help = NICHE_HELP)]
pub struct ScriptArgs {
    pub niche: String,

    #[clap(default_value_t = 10)]
    pub count: usize,

    /// OpenAI key; scripts come from the chat model instead of the template
    pub api_key: Option<String>,

    /// Directory the manifest is written to
    #[clap(long, default_value = ".")]
    pub out_dir: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_args_default_count() {
        let args = ScriptArgs::try_parse_from(["generate-scripts", "finance"]).unwrap();
        assert_eq!(args.niche, "finance");
        assert_eq!(args.count, 10);
        assert!(args.api_key.is_none());
    }

    #[test]
    fn script_args_positional_key() {
        let args =
            ScriptArgs::try_parse_from(["generate-scripts", "health", "3", "sk-abc"]).unwrap();
        assert_eq!(args.count, 3);
        assert_eq!(args.api_key.as_deref(), Some("sk-abc"));
    }

    #[test]
    fn missing_positionals_are_usage_errors() {
        assert!(ScriptArgs::try_parse_from(["generate-scripts"]).is_err());
        assert!(VideoArgs::try_parse_from(["generate-video"]).is_err());
    }

    #[test]
    fn video_args_default_config() {
        let args = VideoArgs::try_parse_from(["generate-video", "content.json"]).unwrap();
        assert_eq!(args.manifest, PathBuf::from("content.json"));
        assert_eq!(args.config, PathBuf::from("config.json"));
    }
}
