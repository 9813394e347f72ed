use spectra_image::{Image, ImageSize};
use spectra_imgproc::{
    contours::find_objects,
    draw::draw_detected_objects,
    edge::{detect_edges, EDGE},
    fft::{apply_frequency, FilterFamily, FilterShape, FrequencyFilterParams},
    spatial::{apply_spatial, SpatialFilter},
};

type TestResult = Result<(), Box<dyn std::error::Error>>;

// 20x20 bright square at (10, 10) on a 40x40 dark background
fn square_scene() -> Result<Image<u8, 1>, Box<dyn std::error::Error>> {
    let mut img = Image::from_size_val(ImageSize { width: 40, height: 40 }, 0u8)?;
    for y in 10..30 {
        for x in 10..30 {
            img.set_pixel(x, y, 0, 255)?;
        }
    }
    Ok(img)
}

fn max_neighbor_step(img: &Image<u8, 1>) -> u8 {
    img.as_slice()
        .chunks_exact(img.width())
        .flat_map(|row| row.windows(2).map(|w| w[0].abs_diff(w[1])))
        .max()
        .unwrap_or(0)
}

#[test]
fn test_square_is_one_object() -> TestResult {
    let scene = square_scene()?;
    let edges = detect_edges(&scene, 30.0, 150.0, 1.0)?;
    assert!(edges.as_slice().iter().any(|&v| v == EDGE));

    let objects = find_objects(&edges, 0.0)?;
    assert_eq!(objects.len(), 1);

    let object = &objects[0];
    assert_eq!(object.id, 1);
    assert!((9..=11).contains(&object.bbox.min_x), "{:?}", object.bbox);
    assert!((9..=11).contains(&object.bbox.min_y), "{:?}", object.bbox);
    assert!((28..=30).contains(&object.bbox.max_x), "{:?}", object.bbox);
    assert!((28..=30).contains(&object.bbox.max_y), "{:?}", object.bbox);
    assert!((object.centroid.0 - 19.5).abs() <= 1.0);
    assert!((object.centroid.1 - 19.5).abs() <= 1.0);
    Ok(())
}

#[test]
fn test_min_area_filters_square() -> TestResult {
    let edges = detect_edges(&square_scene()?, 30.0, 150.0, 1.0)?;
    assert!(find_objects(&edges, 500.0)?.is_empty());
    Ok(())
}

#[test]
fn test_blank_scene_has_no_objects() -> TestResult {
    let blank = Image::<u8, 1>::from_size_val(ImageSize { width: 32, height: 24 }, 90)?;
    let edges = detect_edges(&blank, 30.0, 150.0, 1.0)?;
    assert!(edges.as_slice().iter().all(|&v| v == 0));
    assert!(find_objects(&edges, 0.0)?.is_empty());
    Ok(())
}

#[test]
fn test_lowpass_smooths_step() -> TestResult {
    let scene = square_scene()?;
    let params = FrequencyFilterParams {
        family: FilterFamily::Lowpass,
        shape: FilterShape::Gaussian,
        cutoff: 5.0,
        ..Default::default()
    };
    let output = apply_frequency(&scene, &params)?;
    assert_eq!(output.image.size(), scene.size());
    assert_eq!(output.spectrum.size(), scene.size());

    assert_eq!(max_neighbor_step(&scene), 255);
    assert!(max_neighbor_step(&output.image) < 128);

    let mean = |img: &Image<u8, 1>| {
        img.as_slice().iter().map(|&v| v as f64).sum::<f64>() / img.as_slice().len() as f64
    };
    assert!((mean(&output.image) - mean(&scene)).abs() < 1.0);
    Ok(())
}

#[test]
fn test_blur_then_detect() -> TestResult {
    let scene = square_scene()?;
    let smoothed = apply_spatial(&scene, &SpatialFilter::Median { kernel_size: 3 })?;
    // a median keeps a large square intact apart from its corners
    assert_eq!(smoothed.get_pixel(20, 20, 0)?, &255);
    assert_eq!(smoothed.get_pixel(2, 2, 0)?, &0);

    let edges = detect_edges(&smoothed, 30.0, 150.0, 1.0)?;
    assert_eq!(find_objects(&edges, 0.0)?.len(), 1);
    Ok(())
}

#[test]
fn test_params_from_json() -> TestResult {
    let params: FrequencyFilterParams = serde_json::from_str(
        r#"{"family": "highpass", "shape": "butterworth", "cutoff": 4.0, "order": 3}"#,
    )?;
    assert_eq!(params.family, FilterFamily::Highpass);
    assert_eq!(params.cutoff_high, Some(80.0));

    let output = apply_frequency(&square_scene()?, &params)?;
    // flat regions go to zero, the border of the square survives
    assert!(max_neighbor_step(&output.image) > 0);
    Ok(())
}

#[test]
fn test_annotate_detections() -> TestResult {
    let scene = square_scene()?;
    let edges = detect_edges(&scene, 30.0, 150.0, 1.0)?;
    let objects = find_objects(&edges, 0.0)?;

    let mut canvas = Image::<u8, 3>::from_size_val(scene.size(), 0)?;
    draw_detected_objects(&mut canvas, &objects, [0, 255, 0]);

    let bbox = objects[0].bbox;
    assert_eq!(
        canvas.get_pixel(bbox.min_x as usize, bbox.min_y as usize, 1)?,
        &255
    );
    assert_eq!(canvas.get_pixel(0, 0, 1)?, &0);
    Ok(())
}
