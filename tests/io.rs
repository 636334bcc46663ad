//! PNG loading/export round trips and filesystem error surfaces

use ndarray::Array2;
use wavepath::io::image::{export_grid_png, load_sample_png, parse_hex_color};

type TestResult = Result<(), Box<dyn std::error::Error>>;

#[test]
fn test_png_export_and_reload_round_trip() -> TestResult {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("out.png");

    let palette = [[255, 0, 0, 255], [0, 0, 255, 255]];
    let grid = Array2::from_shape_vec((2, 3), vec![0, 1, 0, 1, 1, 0])?;
    export_grid_png(&grid, &palette, &path)?;

    let reloaded = load_sample_png(&path)?;
    assert_eq!(reloaded.len(), 2);
    for (y, row) in reloaded.iter().enumerate() {
        assert_eq!(row.len(), 3);
        for (x, pixel) in row.iter().enumerate() {
            let tile = grid.get((y, x)).copied().unwrap_or(usize::MAX);
            assert_eq!(Some(pixel), palette.get(tile));
        }
    }
    Ok(())
}

#[test]
fn test_export_creates_parent_directories() -> TestResult {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("nested").join("deeper").join("out.png");

    let palette = [[10, 20, 30, 255]];
    let grid = Array2::zeros((1, 1));
    export_grid_png(&grid, &palette, &path)?;
    assert!(path.exists());
    Ok(())
}

#[test]
fn test_export_rejects_out_of_range_palette_index() -> TestResult {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("out.png");

    let palette = [[0, 0, 0, 255]];
    let grid = Array2::from_shape_vec((1, 2), vec![0, 5])?;
    assert!(export_grid_png(&grid, &palette, &path).is_err());
    Ok(())
}

#[test]
fn test_load_missing_file_reports_path() -> TestResult {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("absent.png");
    let Err(error) = load_sample_png(&path) else {
        return Err("loading a missing file succeeded".into());
    };
    assert!(error.to_string().contains("absent.png"));
    Ok(())
}

#[test]
fn test_hex_colors_round_trip_through_export() -> TestResult {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("out.png");

    let border = parse_hex_color("336699")?;
    let grid = Array2::zeros((2, 2));
    export_grid_png(&grid, &[border], &path)?;

    let reloaded = load_sample_png(&path)?;
    let pixel = reloaded
        .first()
        .and_then(|row| row.first())
        .copied()
        .ok_or("empty reload")?;
    assert_eq!(pixel, [0x33, 0x66, 0x99, 255]);
    Ok(())
}
