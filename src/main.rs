use anyhow::Context;
use clap::Parser;
use tracing::info;

use shortsmith::args::VideoArgs;
use shortsmith::{Config, VideoGenerator, init_logging};

fn main() -> anyhow::Result<()> {
    init_logging();
    let args = VideoArgs::parse();

    info!("Starting short video generation pipeline");
    let config = Config::load(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;

    let generator = VideoGenerator::from_config(config);
    let results = generator
        .batch_generate(&args.manifest)
        .with_context(|| format!("processing {}", args.manifest.display()))?;

    let succeeded = results.iter().filter(|r| r.is_success()).count();
    println!("\n{}", "=".repeat(50));
    println!("Generation Complete!");
    println!("Success: {succeeded}");
    println!("Failed: {}", results.len() - succeeded);
    println!("{}", "=".repeat(50));
    Ok(())
}
