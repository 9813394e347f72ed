use argh::FromArgs;
use std::path::PathBuf;

use spectra::image::{Image, ImageSize};
use spectra::imgproc::draw;
use spectra::{
    apply_frequency, apply_spatial, detect_edges, find_objects, FrequencyFilterParams,
    SpatialFilter,
};

#[derive(FromArgs)]
/// Filter a synthetic scene and report the objects found in it
struct Args {
    /// path to a JSON file with the frequency filter parameters
    #[argh(option, short = 'p')]
    params: Option<PathBuf>,

    /// spatial filter applied before the frequency filter, as JSON
    #[argh(option, short = 's')]
    spatial: Option<String>,

    /// low hysteresis threshold
    #[argh(option, default = "30.0")]
    low: f32,

    /// high hysteresis threshold
    #[argh(option, default = "150.0")]
    high: f32,

    /// sigma of the gaussian blur applied before the gradients
    #[argh(option, default = "1.0")]
    sigma: f32,

    /// smallest object area kept
    #[argh(option, default = "20.0")]
    min_area: f64,

    /// side length of the generated scene
    #[argh(option, default = "256")]
    size: usize,
}

/// Two rectangles and a disk on a dark background.
fn synthetic_scene(side: usize) -> Result<Image<u8, 3>, Box<dyn std::error::Error>> {
    let mut scene = Image::<u8, 3>::from_size_val(
        ImageSize {
            width: side,
            height: side,
        },
        20,
    )?;

    let s = side as i64;
    draw::draw_rect(&mut scene, (s / 8, s / 8), (s / 3, s / 4), [220, 40, 40], s as usize / 16);
    draw::draw_rect(&mut scene, (s / 2, s / 6), (7 * s / 8, s / 3), [40, 220, 40], 1);

    let (cx, cy, r) = (s / 2, 2 * s / 3, s / 6);
    for y in 0..side {
        for x in 0..side {
            let (dx, dy) = (x as i64 - cx, y as i64 - cy);
            if dx * dx + dy * dy <= r * r {
                for ch in 0..3 {
                    scene.set_pixel(x, y, ch, 200)?;
                }
            }
        }
    }
    Ok(scene)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args: Args = argh::from_env();

    let params = match &args.params {
        Some(path) => serde_json::from_str(&std::fs::read_to_string(path)?)?,
        None => FrequencyFilterParams::default(),
    };
    log::info!("frequency filter: {params:?}");

    let mut image = synthetic_scene(args.size)?;

    if let Some(json) = &args.spatial {
        let filter: SpatialFilter = serde_json::from_str(json)?;
        log::info!("spatial filter: {filter:?}");
        image = apply_spatial(&image, &filter)?;
    }

    let filtered = apply_frequency(&image, &params)?;
    let edges = detect_edges(&filtered.image, args.low, args.high, args.sigma)?;
    let objects = find_objects(&edges, args.min_area)?;

    log::info!(
        "{} edge pixels, {} objects",
        edges.as_slice().iter().filter(|&&v| v > 0).count(),
        objects.len()
    );

    println!("{}", serde_json::to_string_pretty(&objects)?);

    Ok(())
}
