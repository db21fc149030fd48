use anyhow::Context;
use clap::Parser;

use shortsmith::args::ScriptArgs;
use shortsmith::init_logging;
use shortsmith::script::{create_content_file, writer_for};

fn main() -> anyhow::Result<()> {
    init_logging();
    let args = ScriptArgs::parse();

    let writer = writer_for(args.api_key.as_deref());
    let (path, manifest) = create_content_file(&args.niche, args.count, writer.as_ref(), &args.out_dir)
        .with_context(|| format!("generating scripts for '{}'", args.niche))?;

    println!("Created {} with {} video scripts", path.display(), manifest.videos.len());
    println!("Niche: {}", args.niche);
    println!("Total videos: {}", manifest.videos.len());
    println!("\nNext step: generate-video {}", path.display());
    Ok(())
}
