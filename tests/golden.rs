use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::Context;
use image::ImageFormat;
use raqote::DrawTarget;

use tessella::{Color, Palette, Params, Style};

// Set this environment variable to any non-empty string to write golden files (trivially passing
// the test) instead of checking them.
const ENV_UPDATE_GOLDENS: &str = "TESSELLA_UPDATE_GOLDENS";

const GOLDEN_SIZE: i32 = 512;

fn golden_params(seed: u64, style: &str) -> Params {
    Params {
        seed,
        palette: Palette::new(
            vec![
                Color::from_str("#E53935").unwrap(),
                Color::from_str("#1E88E5").unwrap(),
            ],
            Color::from_str("#F5F5DC").unwrap(),
        ),
        width: GOLDEN_SIZE,
        height: GOLDEN_SIZE,
        grid_density: 8,
        style: Style::from_str(style).unwrap(),
        complexity: 0.7,
    }
}

fn test_golden(name: &str, params: &Params) -> anyhow::Result<()> {
    let golden_filepath = PathBuf::from_iter([
        env!("CARGO_MANIFEST_DIR"),
        "goldens",
        format!("{name}.png").as_str(),
    ]);

    let canvas = tessella::draw(params)?;
    if std::env::var_os(ENV_UPDATE_GOLDENS).is_some_and(|v| !v.is_empty()) {
        write_golden(&canvas, golden_filepath.as_ref())
    } else if !golden_filepath.exists() {
        // A fresh checkout has no goldens yet; the update path creates them.
        eprintln!(
            "no golden at {}; set {} to create it",
            golden_filepath.display(),
            ENV_UPDATE_GOLDENS
        );
        Ok(())
    } else {
        check_golden(&canvas, golden_filepath.as_ref())
    }
}

fn write_golden(dt: &DrawTarget, golden_filepath: &Path) -> anyhow::Result<()> {
    if let Some(dir) = golden_filepath.parent() {
        std::fs::create_dir_all(dir).context("Failed to create goldens directory")?;
    }
    dt.write_png(golden_filepath)
        .context("Failed to write golden PNG")
}

fn check_golden(dt: &DrawTarget, golden_filepath: &Path) -> anyhow::Result<()> {
    let reader = BufReader::new(
        File::open(golden_filepath)
            .with_context(|| format!("Failed to read golden at {}", golden_filepath.display()))?,
    );
    let reader = image::io::Reader::with_format(reader, ImageFormat::Png);
    let golden = reader
        .decode()
        .context("Failed to decode image")?
        .into_rgba8();

    assert_eq!(
        (dt.width() as u32, dt.height() as u32),
        (golden.width(), golden.height())
    );

    let actual_pixels = dt.get_data().iter();
    let golden_pixels = golden.enumerate_pixels();
    for (actual_px, (x, y, golden_px)) in actual_pixels.zip(golden_pixels) {
        let [ab, ag, ar, _aa] = actual_px.to_le_bytes();
        let [gr, gg, gb, _ga] = golden_px.0;
        // Use a simple L-infinity norm for now. Can refine if we need to.
        assert_px_close((x, y), (ar, ag, ab), (gr, gg, gb));
    }

    Ok(())
}

fn assert_px_close((x, y): (u32, u32), actual: (u8, u8, u8), golden: (u8, u8, u8)) {
    const THRESHOLD: u32 = 16;
    let dr = channel_delta(actual.0, golden.0);
    let dg = channel_delta(actual.1, golden.1);
    let db = channel_delta(actual.2, golden.2);
    if dr > THRESHOLD || dg > THRESHOLD || db > THRESHOLD {
        panic!(
            "at ({}, {}): expected ~{:?}, got {:?}; max allowed deviation is {}",
            x, y, golden, actual, THRESHOLD
        );
    }
}

fn channel_delta(u: u8, v: u8) -> u32 {
    ((u as i32) - (v as i32)).abs() as u32
}

// One scenario per style family, chosen to exercise both the vector-path
// renderers and the per-pixel ones while staying quick to draw.

#[test]
fn golden_tile_quarter_circles() -> anyhow::Result<()> {
    test_golden(
        "42-tile-quarterCircles",
        &golden_params(42, "tile:quarterCircles"),
    )
}

#[test]
fn golden_voronoi_stained_glass() -> anyhow::Result<()> {
    test_golden(
        "7-voronoi-stainedGlass",
        &golden_params(7, "voronoi:stainedGlass"),
    )
}

#[test]
fn golden_contour_topo() -> anyhow::Result<()> {
    test_golden("19-contour-topo", &golden_params(19, "contour:topo"))
}

#[test]
fn golden_terrain_sunset() -> anyhow::Result<()> {
    test_golden("3-terrain-sunset", &golden_params(3, "terrain:sunset"))
}

#[test]
fn golden_flow_streams() -> anyhow::Result<()> {
    test_golden("64-flow-streams", &golden_params(64, "flow:streams"))
}

#[test]
fn golden_blend_lava() -> anyhow::Result<()> {
    test_golden("5-blend-lava", &golden_params(5, "blend:lava"))
}
