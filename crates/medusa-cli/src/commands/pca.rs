use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;
use medusa_core::band::BandCatalog;
use medusa_core::consts::DEFAULT_WHITE_CHANNEL;
use medusa_core::frame::{BandStack, Frame};
use medusa_core::io::image_io::{load_band_image, PngSink};
use medusa_core::io::{ImageKey, ImageSink};
use medusa_core::pca;

#[derive(Args)]
pub struct PcaArgs {
    /// Index of the set to reduce
    pub set: usize,

    /// Directory holding the set's band images
    #[arg(short, long, default_value = ".")]
    pub dir: PathBuf,

    /// Comma-separated bands to include (default: every band image found)
    #[arg(short, long)]
    pub bands: Option<String>,

    /// Channel of the white reference LED, which is never part of the stack
    #[arg(long, default_value_t = DEFAULT_WHITE_CHANNEL)]
    pub white: u8,
}

pub fn run(args: &PcaArgs) -> Result<()> {
    let catalog = BandCatalog::medusa(args.white);
    let bands = match args.bands {
        Some(ref list) => list
            .split(',')
            .map(|name| catalog.resolve(name))
            .collect::<std::result::Result<Vec<_>, _>>()?,
        None => catalog.bands().to_vec(),
    };

    let mut planes = Vec::new();
    for band in bands.iter().filter(|b| !b.is_reference_white) {
        let key = ImageKey::Band {
            set: args.set,
            label: band.label.clone(),
        };
        let path = args.dir.join(key.file_name());
        if !path.exists() {
            if args.bands.is_some() {
                bail!("Missing band image {}", path.display());
            }
            continue;
        }
        let plane = load_band_image(&path)
            .with_context(|| format!("Failed to load {}", path.display()))?;
        planes.push((band.label.clone(), plane));
    }

    println!("Loaded {} band images for set {}", planes.len(), args.set);

    let stack = BandStack::new(planes.iter().map(|(l, p)| (l.as_str(), p)).collect());
    let output = pca::reduce(&stack).context("PCA failed")?;

    let mut sink = PngSink::new(&args.dir)?;
    for (i, component) in output.components.into_iter().enumerate() {
        let key = ImageKey::Component {
            set: args.set,
            rank: i + 1,
        };
        sink.save(&key, &Frame::Mono(component))?;
        println!("  {}", sink.path_for(&key).display());
    }

    let total: f64 = output.eigenvalues.sum();
    for (i, value) in output.eigenvalues.iter().take(3).enumerate() {
        println!(
            "PC{}: eigenvalue {:.4} ({:.1}% of variance)",
            i + 1,
            value,
            100.0 * value / total
        );
    }
    Ok(())
}
