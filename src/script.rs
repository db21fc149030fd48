use chrono::Local;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::content::{ContentItem, DEFAULT_KEYWORD, Manifest};
use crate::error::{PipelineError, PipelineResult};
use crate::openai::OpenAiClient;
use crate::utils::title_stem;

pub const DEFAULT_NICHE: &str = "self-improvement";

struct NicheCatalog {
    name: &'static str,
    titles: [&'static str; 5],
    keywords: [&'static str; 4],
    tags: &'static [&'static str],
}

static CATALOG: [NicheCatalog; 5] = [
    NicheCatalog {
        name: "self-improvement",
        titles: [
            "3 morning habits that will change your life",
            "Why you're not productive (and how to fix it)",
            "The truth about discipline vs motivation",
            "How to build unbreakable habits",
            "5 books that made me successful",
        ],
        keywords: ["motivation", "success", "discipline", "habits"],
        tags: &["selfimprovement", "personaldevelopment", "growth"],
    },
    NicheCatalog {
        name: "finance",
        titles: [
            "5 passive income streams for 2025",
            "How I made my first $10k online",
            "Investing mistakes that cost me $50k",
            "Best side hustles that actually work",
            "The compound effect of saving $10/day",
        ],
        keywords: ["money", "investing", "wealth", "success"],
        tags: &["money", "finance", "investing", "wealth"],
    },
    NicheCatalog {
        name: "productivity",
        titles: [
            "Time blocking changed my life",
            "Why you can't focus (and the fix)",
            "The Pomodoro technique explained",
            "Deep work vs shallow work",
            "My productivity system that actually works",
        ],
        keywords: ["focus", "work", "efficiency", "success"],
        tags: &["productivity", "focus", "efficiency"],
    },
    NicheCatalog {
        name: "motivation",
        titles: [
            "When you feel like giving up, watch this",
            "The pain of discipline vs regret",
            "Why comfort is killing your dreams",
            "You're running out of time",
            "Success leaves clues - here they are",
        ],
        keywords: ["success", "inspire", "achieve", "goals"],
        tags: &["motivation", "inspiration", "success"],
    },
    NicheCatalog {
        name: "health",
        titles: [
            "5 foods destroying your health",
            "Why you're always tired (fix this)",
            "The truth about intermittent fasting",
            "Simple workout routine for busy people",
            "Sleep hacks that actually work",
        ],
        keywords: ["fitness", "healthy", "wellness", "energy"],
        tags: &["health", "fitness", "wellness"],
    },
];

pub fn known_niches() -> impl Iterator<Item = &'static str> {
    CATALOG.iter().map(|c| c.name)
}

fn lookup(niche: &str) -> Option<&'static NicheCatalog> {
    CATALOG.iter().find(|c| c.name == niche)
}

/// Titles for `niche`, capped at `count`. Unknown niches use the
/// self-improvement catalog.
pub fn titles_for(niche: &str, count: usize) -> PipelineResult<Vec<&'static str>> {
    if count == 0 {
        return Err(PipelineError::input("count must be at least 1"));
    }
    let catalog = match lookup(niche) {
        Some(catalog) => catalog,
        None => {
            warn!("Unknown niche '{niche}', using the {DEFAULT_NICHE} catalog");
            lookup(DEFAULT_NICHE).unwrap_or(&CATALOG[0])
        }
    };
    Ok(catalog.titles.iter().copied().take(count).collect())
}

pub fn keyword_for(niche: &str) -> &'static str {
    lookup(niche).map_or(DEFAULT_KEYWORD, |c| c.keywords[0])
}

pub fn tags_for(niche: &str) -> Vec<String> {
    match lookup(niche) {
        Some(c) => c.tags.iter().map(|t| t.to_string()).collect(),
        None => vec!["viral".to_string()],
    }
}

/// Produces the spoken body for one title.
pub trait ScriptWriter {
    fn write(&self, niche: &str, title: &str) -> PipelineResult<String>;
}

/// Fills a fixed hook / value / call-to-action template.
#[derive(Debug, Default, Clone, Copy)]
pub struct TemplateWriter;

impl ScriptWriter for TemplateWriter {
    fn write(&self, niche: &str, title: &str) -> PipelineResult<String> {
        Ok(format!(
            "Want to {}? Here's what actually works.\n\n\
             First, understand this: {niche} isn't about perfection. It's about consistency.\n\n\
             Second, most people fail because they overcomplicate things. Keep it simple.\n\n\
             Third, results take time. Give it 90 days minimum.\n\n\
             Follow for more {niche} content that actually works.",
            title.to_lowercase()
        ))
    }
}

/// Asks a chat model for the script.
pub struct OpenAiWriter {
    client: OpenAiClient,
    model: String,
}

impl OpenAiWriter {
    pub fn new(client: OpenAiClient) -> Self {
        Self {
            client,
            model: "gpt-4".to_string(),
        }
    }
}

impl ScriptWriter for OpenAiWriter {
    fn write(&self, _niche: &str, title: &str) -> PipelineResult<String> {
        let prompt = format!(
            "Create a viral TikTok/YouTube Shorts script about: {title}\n\n\
             Requirements:\n\
             - 45-55 seconds when read aloud\n\
             - Start with a strong hook (first 3 seconds)\n\
             - Provide clear value/insights\n\
             - End with a call-to-action\n\
             - Use simple, direct language\n\
             - No fluff or filler\n\n\
             Format: Just the script, no labels or descriptions."
        );
        info!("Requesting script for '{title}' from {}", self.model);
        self.client.chat(&self.model, &prompt, 200, 0.8)
    }
}

/// Picks the chat writer when an API key is supplied, the template otherwise.
pub fn writer_for(api_key: Option<&str>) -> Box<dyn ScriptWriter> {
    match api_key.filter(|k| !k.trim().is_empty()) {
        Some(key) => Box::new(OpenAiWriter::new(OpenAiClient::new(key))),
        None => Box::new(TemplateWriter),
    }
}

pub fn generate_scripts(
    niche: &str,
    count: usize,
    writer: &dyn ScriptWriter,
) -> PipelineResult<Vec<ContentItem>> {
    let titles = titles_for(niche, count)?;
    let keyword = keyword_for(niche);
    let tags = tags_for(niche);

    titles
        .into_iter()
        .map(|title| {
            Ok(ContentItem {
                title: title.to_string(),
                script: writer.write(niche, title)?,
                keyword: keyword.to_string(),
                tags: tags.clone(),
                niche: niche.to_string(),
            })
        })
        .collect()
}

/// Generates scripts and writes them to `content_<niche>_<timestamp>.json`
/// inside `dir`.
pub fn create_content_file(
    niche: &str,
    count: usize,
    writer: &dyn ScriptWriter,
    dir: &Path,
) -> PipelineResult<(PathBuf, Manifest)> {
    let videos = generate_scripts(niche, count, writer)?;
    let manifest = Manifest { videos };
    let path = dir.join(format!(
        "content_{}_{}.json",
        title_stem(niche),
        Local::now().format("%Y%m%d_%H%M%S")
    ));
    manifest.save(&path)?;
    info!(
        "Wrote {} scripts for '{}' to {}",
        manifest.videos.len(),
        niche,
        path.display()
    );
    Ok((path, manifest))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use tempfile::tempdir;

    #[test]
    fn known_niches_return_capped_unique_titles() {
        for niche in known_niches() {
            for n in [1, 3, 5, 10] {
                let titles = titles_for(niche, n).unwrap();
                assert_eq!(titles.len(), n.min(5), "{niche} / {n}");
                assert!(titles.iter().all(|t| !t.is_empty()));
                let unique: HashSet<_> = titles.iter().collect();
                assert_eq!(unique.len(), titles.len());
            }
        }
    }

    #[test]
    fn unknown_niche_uses_default_catalog() {
        let titles = titles_for("underwater-basket-weaving", 10).unwrap();
        assert_eq!(titles, titles_for(DEFAULT_NICHE, 10).unwrap());
        assert_eq!(keyword_for("underwater-basket-weaving"), "abstract");
        assert_eq!(tags_for("underwater-basket-weaving"), vec!["viral"]);
    }

    #[test]
    fn zero_count_is_rejected() {
        assert!(matches!(
            titles_for("finance", 0),
            Err(PipelineError::Input(_))
        ));
    }

    #[test]
    fn template_interpolates_niche_and_title() {
        let script = TemplateWriter
            .write("finance", "Best side hustles that actually work")
            .unwrap();
        assert!(script.starts_with("Want to best side hustles that actually work?"));
        assert!(script.contains("finance isn't about perfection"));
        assert!(script.ends_with("Follow for more finance content that actually works."));
    }

    #[test]
    fn generated_items_carry_niche_metadata() {
        let items = generate_scripts("health", 2, &TemplateWriter).unwrap();
        assert_eq!(items.len(), 2);
        assert!(items.iter().all(|i| i.keyword == "fitness"));
        assert!(items.iter().all(|i| i.niche == "health"));
        assert_eq!(items[0].tags, vec!["health", "fitness", "wellness"]);
    }

    #[test]
    fn written_manifest_loads_back() {
        let dir = tempdir().unwrap();
        let (path, manifest) =
            create_content_file("productivity", 3, &TemplateWriter, dir.path()).unwrap();
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("content_productivity_"));
        assert_eq!(Manifest::load(&path).unwrap(), manifest);
    }

    #[test]
    fn blank_api_key_selects_template() {
        let writer = writer_for(Some(""));
        let script = writer.write("health", "Sleep hacks that actually work").unwrap();
        assert!(script.contains("health"));
    }
}
