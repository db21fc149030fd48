use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::{debug, info, warn};

use crate::audio::AudioAsset;
use crate::config::{CaptionPosition, Config};
use crate::error::{PipelineError, PipelineResult};
use crate::footage::FootageAsset;
use crate::subtitle::CaptionChunk;
use crate::utils::{timestamp_tag, title_stem, unique_path, wrap_text};

pub const TARGET_WIDTH: u32 = 1080;
pub const TARGET_HEIGHT: u32 = 1920;
pub const FPS: u32 = 30;
pub const VIDEO_CODEC: &str = "libx264";
pub const AUDIO_CODEC: &str = "aac";
pub const PRESET: &str = "medium";
pub const ENCODER_THREADS: u32 = 4;
pub const CAPTION_FONT_SIZE: u32 = 60;
pub const CAPTION_BORDER: u32 = 3;
/// Roughly what fits in a 1000px wide box at the caption font size.
pub const CAPTION_WRAP_COLUMNS: usize = 28;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryStep {
    Scale { width: u32, height: u32 },
    Crop { width: u32, height: u32, x: u32 },
}

/// Scales to 1920 high, then center-crops anything wider than 1080 or
/// stretches anything narrower to 1080.
pub fn plan_vertical(width: u32, height: u32) -> Vec<GeometryStep> {
    if width == 0 || height == 0 {
        return vec![GeometryStep::Scale {
            width: TARGET_WIDTH,
            height: TARGET_HEIGHT,
        }];
    }
    let scaled_width = (width as f64 * TARGET_HEIGHT as f64 / height as f64).round() as u32;
    let mut steps = vec![GeometryStep::Scale {
        width: scaled_width,
        height: TARGET_HEIGHT,
    }];
    if scaled_width > TARGET_WIDTH {
        steps.push(GeometryStep::Crop {
            width: TARGET_WIDTH,
            height: TARGET_HEIGHT,
            x: (scaled_width - TARGET_WIDTH) / 2,
        });
    } else if scaled_width < TARGET_WIDTH {
        steps.push(GeometryStep::Scale {
            width: TARGET_WIDTH,
            height: TARGET_HEIGHT,
        });
    }
    steps
}

/// One caption drawn from a text file over `[start, end)`.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptionOverlay {
    pub text_file: PathBuf,
    pub start: f64,
    pub end: f64,
}

/// Everything the encoder needs for one short.
#[derive(Debug, Clone)]
pub struct RenderJob {
    pub footage: FootageAsset,
    pub audio: AudioAsset,
    pub overlays: Vec<CaptionOverlay>,
    pub caption_y: u32,
    pub font_file: Option<PathBuf>,
    pub output: PathBuf,
}

impl RenderJob {
    pub fn duration(&self) -> f64 {
        self.audio.duration
    }

    pub fn filter_graph(&self) -> String {
        let mut filters: Vec<String> = plan_vertical(self.footage.width(), self.footage.height())
            .into_iter()
            .map(|step| match step {
                GeometryStep::Scale { width, height } => format!("scale={width}:{height}"),
                GeometryStep::Crop { width, height, x } => {
                    format!("crop={width}:{height}:{x}:0")
                }
            })
            .collect();
        filters.push("setsar=1".to_string());

        for overlay in &self.overlays {
            let mut drawtext = format!(
                "drawtext=textfile={}:expansion=none",
                escape_filter_value(&overlay.text_file.to_string_lossy())
            );
            if let Some(font) = &self.font_file {
                drawtext.push_str(&format!(
                    ":fontfile={}",
                    escape_filter_value(&font.to_string_lossy())
                ));
            }
            drawtext.push_str(&format!(
                ":fontsize={CAPTION_FONT_SIZE}:fontcolor=white:borderw={CAPTION_BORDER}:bordercolor=black\
                 :line_spacing=8:x=(w-text_w)/2:y={}:enable='gte(t,{:.3})*lt(t,{:.3})'",
                self.caption_y, overlay.start, overlay.end
            ));
            filters.push(drawtext);
        }
        format!("[0:v]{}[v]", filters.join(","))
    }

    pub fn ffmpeg_args(&self) -> Vec<String> {
        let duration = format!("{:.3}", self.duration());
        let mut args: Vec<String> = ["-y", "-loglevel", "error"]
            .into_iter()
            .map(String::from)
            .collect();

        match &self.footage {
            FootageAsset::Stock { path, .. } => {
                // Loop short clips; `-t` below cuts long ones.
                args.extend(["-stream_loop".into(), "-1".into(), "-i".into()]);
                args.push(path.display().to_string());
            }
            FootageAsset::Filler { color, .. } => {
                args.extend(["-f".into(), "lavfi".into(), "-i".into()]);
                args.push(format!(
                    "color=c=0x{:02X}{:02X}{:02X}:s={TARGET_WIDTH}x{TARGET_HEIGHT}:r={FPS}:d={duration}",
                    color[0], color[1], color[2]
                ));
            }
        }
        args.push("-i".into());
        args.push(self.audio.path.display().to_string());

        args.extend([
            "-filter_complex".to_string(),
            self.filter_graph(),
            "-map".into(),
            "[v]".into(),
            "-map".into(),
            "1:a:0".into(),
            "-t".into(),
            duration,
            "-r".into(),
            FPS.to_string(),
            "-c:v".into(),
            VIDEO_CODEC.into(),
            "-preset".into(),
            PRESET.into(),
            "-threads".into(),
            ENCODER_THREADS.to_string(),
            "-pix_fmt".into(),
            "yuv420p".into(),
            "-c:a".into(),
            AUDIO_CODEC.into(),
            "-movflags".into(),
            "+faststart".into(),
        ]);
        args.push(self.output.display().to_string());
        args
    }
}

/// Escapes an option value for both filtergraph parsing levels: first the
/// option parser (`\ ' :`), then the graph parser (`\ ' [ ] , ;`).
fn escape_filter_value(value: &str) -> String {
    fn escape(input: &str, special: &[char]) -> String {
        let mut out = String::with_capacity(input.len());
        for c in input.chars() {
            if special.contains(&c) {
                out.push('\\');
            }
            out.push(c);
        }
        out
    }
    let option_level = escape(value, &['\\', '\'', ':']);
    escape(&option_level, &['\\', '\'', '[', ']', ',', ';'])
}

pub trait Renderer {
    fn render(&self, job: &RenderJob) -> PipelineResult<()>;
}

/// Encodes through the system `ffmpeg` binary.
#[derive(Debug, Default, Clone, Copy)]
pub struct FfmpegRenderer;

impl Renderer for FfmpegRenderer {
    fn render(&self, job: &RenderJob) -> PipelineResult<()> {
        let args = job.ffmpeg_args();
        debug!("ffmpeg {}", args.join(" "));
        let output = Command::new("ffmpeg")
            .args(&args)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| {
                PipelineError::encoding(format!(
                    "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
                ))
            })?;
        if !output.status.success() {
            return Err(PipelineError::encoding(format!(
                "ffmpeg failed to produce {} ({}): {}",
                job.output.display(),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(())
    }
}

pub fn probe_video_dimensions(path: &Path) -> PipelineResult<(u32, u32)> {
    let output = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-select_streams",
            "v:0",
            "-show_entries",
            "stream=width,height",
            "-of",
            "csv=s=x:p=0",
        ])
        .arg(path)
        .output()
        .map_err(|e| PipelineError::provider(format!("failed to run ffprobe: {e}")))?;
    if !output.status.success() {
        return Err(PipelineError::provider(format!(
            "ffprobe failed on {}",
            path.display()
        )));
    }
    parse_dimensions(&String::from_utf8_lossy(&output.stdout)).ok_or_else(|| {
        PipelineError::provider(format!("no video stream in {}", path.display()))
    })
}

fn parse_dimensions(raw: &str) -> Option<(u32, u32)> {
    let (w, h) = raw.trim().split_once('x')?;
    Some((w.parse().ok()?, h.parse().ok()?))
}

/// Where the video for `title` goes: spaces replaced, timestamped, and
/// never an existing file.
pub fn output_path_for(output_dir: &Path, title: &str) -> PathBuf {
    unique_path(output_dir, &title_stem(title), "mp4")
}

/// Lays captions over the footage, attaches the voice-over, and exports.
pub struct Composer {
    renderer: Box<dyn Renderer>,
    temp_dir: PathBuf,
    caption_position: CaptionPosition,
    font_file: Option<PathBuf>,
}

impl Composer {
    pub fn new(renderer: Box<dyn Renderer>, config: &Config) -> Self {
        Self {
            renderer,
            temp_dir: config.temp_directory.clone(),
            caption_position: config.caption_position,
            font_file: config.font_file.clone(),
        }
    }

    pub fn compose(
        &self,
        footage: &FootageAsset,
        audio: &AudioAsset,
        captions: &[CaptionChunk],
        output: &Path,
    ) -> PipelineResult<PathBuf> {
        let overlays = self.write_caption_files(captions)?;
        let job = RenderJob {
            footage: footage.clone(),
            audio: audio.clone(),
            overlays,
            caption_y: self.caption_position.y(),
            font_file: self.font_file.clone(),
            output: output.to_path_buf(),
        };

        info!(
            "Rendering {} ({:.1}s, {} captions)",
            output.display(),
            job.duration(),
            job.overlays.len()
        );
        let result = self.renderer.render(&job);
        for overlay in &job.overlays {
            if let Err(e) = fs::remove_file(&overlay.text_file) {
                warn!("Could not remove {}: {e}", overlay.text_file.display());
            }
        }
        result?;

        if let Err(e) = fs::remove_file(&audio.path) {
            warn!("Could not remove {}: {e}", audio.path.display());
        }
        info!("Video created: {}", output.display());
        Ok(job.output)
    }

    fn write_caption_files(
        &self,
        captions: &[CaptionChunk],
    ) -> PipelineResult<Vec<CaptionOverlay>> {
        let tag = timestamp_tag();
        let mut overlays = Vec::with_capacity(captions.len());
        for (i, chunk) in captions.iter().enumerate() {
            let lines = wrap_text(&chunk.text, CAPTION_WRAP_COLUMNS);
            if lines.is_empty() {
                continue;
            }
            let text_file = self.temp_dir.join(format!("caption_{tag}_{i:03}.txt"));
            fs::write(&text_file, lines.join("\n"))?;
            overlays.push(CaptionOverlay {
                text_file,
                start: chunk.start,
                end: chunk.end(),
            });
        }
        Ok(overlays)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use tempfile::tempdir;

    #[test]
    fn landscape_is_scaled_then_center_cropped() {
        assert_eq!(plan_vertical(1920, 1080), vec![
            GeometryStep::Scale {
                width: 3413,
                height: 1920
            },
            GeometryStep::Crop {
                width: 1080,
                height: 1920,
                x: 1166
            },
        ]);
    }

    #[test]
    fn narrow_footage_is_stretched_to_width() {
        let steps = plan_vertical(720, 1920);
        assert_eq!(steps.last(), Some(&GeometryStep::Scale {
            width: 1080,
            height: 1920
        }));
        assert_eq!(steps.len(), 2);
    }

    #[test]
    fn exact_portrait_needs_only_one_scale() {
        assert_eq!(plan_vertical(720, 1280), vec![GeometryStep::Scale {
            width: 1080,
            height: 1920
        }]);
    }

    fn job(footage: FootageAsset, overlays: Vec<CaptionOverlay>) -> RenderJob {
        RenderJob {
            footage,
            audio: AudioAsset {
                path: PathBuf::from("temp/voice.mp3"),
                duration: 12.5,
            },
            overlays,
            caption_y: 1400,
            font_file: None,
            output: PathBuf::from("out/My_Title.mp4"),
        }
    }

    #[test]
    fn filler_args_use_lavfi_color_source() {
        let args = job(
            FootageAsset::Filler {
                color: [20, 30, 20],
                duration: 12.5,
            },
            vec![],
        )
        .ffmpeg_args();
        let i = args.iter().position(|a| a == "lavfi").unwrap();
        assert_eq!(args[i + 2], "color=c=0x141E14:s=1080x1920:r=30:d=12.500");
        assert!(!args.iter().any(|a| a == "-stream_loop"));
    }

    #[test]
    fn stock_args_loop_and_cut_to_audio_length() {
        let args = job(
            FootageAsset::Stock {
                path: PathBuf::from("temp/stock.mp4"),
                width: 1920,
                height: 1080,
                duration: 12.5,
            },
            vec![],
        )
        .ffmpeg_args();
        let joined = args.join(" ");
        assert!(joined.contains("-stream_loop -1 -i temp/stock.mp4 -i temp/voice.mp3"));
        assert!(joined.contains("-t 12.500 -r 30 -c:v libx264 -preset medium -threads 4"));
        assert!(joined.contains("-c:a aac"));
        assert_eq!(args.last().unwrap(), "out/My_Title.mp4");
    }

    #[test]
    fn captions_become_timed_drawtext_filters() {
        let footage = FootageAsset::Filler {
            color: [20, 20, 30],
            duration: 12.5,
        };
        let overlays = vec![
            CaptionOverlay {
                text_file: PathBuf::from("temp/c0.txt"),
                start: 0.0,
                end: 6.25,
            },
            CaptionOverlay {
                text_file: PathBuf::from("temp/c1.txt"),
                start: 6.25,
                end: 12.5,
            },
        ];
        let graph = job(footage, overlays).filter_graph();
        assert!(
            graph.starts_with("[0:v]scale=1080:1920,setsar=1,drawtext=textfile=temp/c0.txt:")
        );
        assert!(graph.contains("enable='gte(t,0.000)*lt(t,6.250)'"));
        assert!(graph.contains("enable='gte(t,6.250)*lt(t,12.500)'"));
        assert!(graph.contains("x=(w-text_w)/2:y=1400"));
        assert!(graph.contains("fontcolor=white:borderw=3:bordercolor=black"));
        assert!(graph.ends_with("[v]"));
    }

    #[test]
    fn special_characters_are_escaped_for_both_levels() {
        assert_eq!(escape_filter_value("temp/c0.txt"), "temp/c0.txt");
        assert_eq!(escape_filter_value("it's.txt"), r"it\\\'s.txt");
        assert_eq!(escape_filter_value(r"C:\tmp\a.txt"), r"C\\:\\\\tmp\\\\a.txt");
        assert_eq!(escape_filter_value("a,b[1];c"), r"a\,b\[1\]\;c");
    }

    #[test]
    fn awkward_temp_paths_stay_inside_the_textfile_option() {
        let footage = FootageAsset::filler(2.0);
        let overlays = vec![CaptionOverlay {
            text_file: PathBuf::from("D:/it's, temp/c0.txt"),
            start: 0.0,
            end: 2.0,
        }];
        let graph = job(footage, overlays).filter_graph();
        assert!(graph.contains(r"textfile=D\\:/it\\\'s\, temp/c0.txt:expansion=none"));
    }

    #[test]
    fn ffprobe_dimensions_parse() {
        assert_eq!(parse_dimensions("1080x1920\n"), Some((1080, 1920)));
        assert_eq!(parse_dimensions(""), None);
    }

    #[test]
    fn output_names_derive_from_title() {
        let dir = tempdir().unwrap();
        let path = output_path_for(dir.path(), "Deep work vs shallow work");
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("Deep_work_vs_shallow_work_"));
        assert!(name.ends_with(".mp4"));
    }

    struct Recording {
        jobs: RefCell<Vec<RenderJob>>,
        fail: bool,
    }

    impl Renderer for Recording {
        fn render(&self, job: &RenderJob) -> PipelineResult<()> {
            for overlay in &job.overlays {
                assert!(overlay.text_file.exists());
            }
            self.jobs.borrow_mut().push(job.clone());
            if self.fail {
                return Err(PipelineError::encoding("boom"));
            }
            fs::write(&job.output, b"mp4")?;
            Ok(())
        }
    }

    fn composer(dir: &Path, fail: bool) -> Composer {
        let config = Config::from_json(
            &serde_json::json!({
                "output_directory": dir.join("out"),
                "temp_directory": dir,
            })
            .to_string(),
        )
        .unwrap();
        Composer::new(
            Box::new(Recording {
                jobs: RefCell::new(Vec::new()),
                fail,
            }),
            &config,
        )
    }

    #[test]
    fn compose_cleans_up_audio_and_caption_files() {
        let dir = tempdir().unwrap();
        let audio_path = dir.path().join("voice.wav");
        fs::write(&audio_path, b"RIFF").unwrap();
        let audio = AudioAsset {
            path: audio_path.clone(),
            duration: 4.0,
        };
        let captions =
            crate::subtitle::segment("one two three four five six seven eight nine", 4.0);
        let output = dir.path().join("video.mp4");

        let path = composer(dir.path(), false)
            .compose(&FootageAsset::filler(4.0), &audio, &captions, &output)
            .unwrap();
        assert_eq!(path, output);
        assert!(output.exists());
        assert!(!audio_path.exists());
        let leftovers = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(Result::ok)
            .filter(|e| e.file_name().to_string_lossy().starts_with("caption_"))
            .count();
        assert_eq!(leftovers, 0);
    }

    #[test]
    fn failed_render_keeps_audio() {
        let dir = tempdir().unwrap();
        let audio_path = dir.path().join("voice.wav");
        fs::write(&audio_path, b"RIFF").unwrap();
        let audio = AudioAsset {
            path: audio_path.clone(),
            duration: 2.0,
        };
        let err = composer(dir.path(), true)
            .compose(
                &FootageAsset::filler(2.0),
                &audio,
                &crate::subtitle::segment("hi", 2.0),
                &dir.path().join("v.mp4"),
            )
            .unwrap_err();
        assert!(matches!(err, PipelineError::Encoding(_)));
        assert!(audio_path.exists());
    }
}
