use argh::FromArgs;
use serde::Serialize;
use std::path::{Path, PathBuf};

use nowcast_image::{Image, ImageSize};
use nowcast_motion::{estimate_motion, ProesmansConfig};

#[derive(FromArgs)]
/// Estimate the motion field between two grayscale images.
struct Args {
    /// path to the earlier image
    #[argh(option, short = 'a')]
    first: PathBuf,

    /// path to the later image
    #[argh(option, short = 'b')]
    second: PathBuf,

    /// path to a JSON file with the estimation parameters
    #[argh(option, short = 'c')]
    config: Option<PathBuf>,

    /// multiplier of the data term
    #[argh(option)]
    lam: Option<f32>,

    /// number of iterations per pyramid level
    #[argh(option)]
    num_iter: Option<usize>,

    /// maximum number of pyramid levels
    #[argh(option)]
    num_levels: Option<usize>,

    /// standard deviation of the pre-smoothing filter
    #[argh(option)]
    filter_std: Option<f32>,

    /// path to write the motion field as JSON
    #[argh(option, short = 'o')]
    output: Option<PathBuf>,
}

#[derive(Serialize)]
struct MotionOutput {
    width: usize,
    height: usize,
    config: ProesmansConfig,
    mean_displacement: [f32; 2],
    u: Vec<f32>,
    v: Vec<f32>,
    consistency: Vec<f32>,
}

fn read_grayscale(path: &Path) -> Result<Image<f32, 1>, Box<dyn std::error::Error>> {
    let gray = image::open(path)?.to_luma8();
    let size = ImageSize {
        width: gray.width() as usize,
        height: gray.height() as usize,
    };
    let image = Image::<u8, 1>::new(size, gray.into_raw())?;
    Ok(image.cast::<f32>()?)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args: Args = argh::from_env();

    let mut config = match &args.config {
        Some(path) => ProesmansConfig::from_json_file(path)?,
        None => ProesmansConfig::default(),
    };
    if let Some(lam) = args.lam {
        config = config.with_lam(lam);
    }
    if let Some(num_iter) = args.num_iter {
        config = config.with_num_iter(num_iter);
    }
    if let Some(num_levels) = args.num_levels {
        config = config.with_num_levels(num_levels);
    }
    if let Some(filter_std) = args.filter_std {
        config = config.with_filter_std(filter_std);
    }

    let first = read_grayscale(&args.first)?;
    let second = read_grayscale(&args.second)?;
    log::info!(
        "estimating motion between {} and {} ({})",
        args.first.display(),
        args.second.display(),
        first.size()
    );

    let estimate = estimate_motion(&first, &second, &config)?;

    let mean_displacement = estimate.forward.mean()?;
    let mean_consistency = estimate.consistency[0].as_slice().iter().sum::<f32>()
        / estimate.consistency[0].as_slice().len() as f32;
    log::info!(
        "mean displacement: ({:.3}, {:.3}), max magnitude: {:.3}, mean consistency: {:.3}",
        mean_displacement[0],
        mean_displacement[1],
        estimate.forward.max_magnitude(),
        mean_consistency
    );

    if let Some(path) = args.output {
        let (u, v) = estimate.forward.components()?;
        let output = MotionOutput {
            width: first.width(),
            height: first.height(),
            config,
            mean_displacement,
            u: u.into_vec(),
            v: v.into_vec(),
            consistency: estimate.consistency[0].as_slice().to_vec(),
        };
        let file = std::fs::File::create(&path)?;
        serde_json::to_writer_pretty(std::io::BufWriter::new(file), &output)?;
        log::info!("motion field written to {}", path.display());
    }

    Ok(())
}
