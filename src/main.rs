use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;

use painterly::{Sketch, UserParams};

/// Render a painterly rendition of a source image from random polygon
/// strokes.
#[derive(Parser, Debug)]
#[command(name = "painterly", version)]
struct Args {
    /// Source image (any format the image crate can decode).
    input: PathBuf,

    /// Output PNG path.
    #[arg(long, default_value = "out.png")]
    out: PathBuf,

    /// YAML file overriding the default stroke parameters. Omitted fields
    /// keep their defaults.
    #[arg(long)]
    params: Option<PathBuf>,

    /// Number of strokes to draw.
    #[arg(long, default_value_t = 5000)]
    strokes: u32,

    /// Seed for reproducible runs. Defaults to OS entropy.
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let params = match &args.params {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            serde_yaml::from_str(&text)
                .with_context(|| format!("parsing {}", path.display()))?
        }
        None => UserParams::default(),
    };

    let source = image::open(&args.input)
        .with_context(|| format!("loading {}", args.input.display()))?
        .into_rgba8();

    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let mut sketch = Sketch::new(&source, params)?;
    let report_every = (args.strokes / 10).max(1);
    for i in 0..args.strokes {
        if i % report_every == 0 {
            println!("{} / {} strokes", i, args.strokes);
        }
        sketch.step(&mut rng);
    }

    sketch
        .into_image()
        .save(&args.out)
        .with_context(|| format!("writing {}", args.out.display()))?;
    println!("wrote {}", args.out.display());

    Ok(())
}
