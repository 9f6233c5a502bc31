// Marker layout tests
//
// Covers the three mask layouts and the geometry of the diagonal tiling.

use paritymark::watermark::position::diagonal_transform;
use paritymark::watermark::{
    diagonal_cell, diagonal_tile_origins, BlockRasterizer, Corner, GlyphRasterizer, MaskLayout,
    MaskRenderer, MaskSpec, Point, Spacing, WatermarkError,
};

fn inked(mask: &paritymark::watermark::PixelBuffer) -> usize {
    mask.pixels().filter(|p| p[3] != 0).count()
}

/// Known asymmetry: the row pitch of the diagonal grid is derived from the
/// text width, not the text height.
#[test]
fn test_diagonal_row_pitch_uses_text_width() {
    let spacing = Spacing::new(10.0, 30.0);
    assert_eq!(diagonal_cell(100.0, spacing), (110.0, 130.0));

    let rasterizer = BlockRasterizer::new();
    let metrics = rasterizer.measure_text("WATERMARK", 20.0).unwrap();
    assert!(metrics.width > metrics.height);

    let origins = diagonal_tile_origins(400, 300, metrics.width, spacing).unwrap();
    let first = origins[0];
    let next_row = origins
        .iter()
        .find(|p| p.y > first.y)
        .copied()
        .unwrap();
    let row_pitch = next_row.y - first.y;

    assert!((row_pitch - (metrics.width + spacing.vertical)).abs() < 1e-3);
    assert!((row_pitch - (metrics.height + spacing.vertical)).abs() > 1.0);
}

#[test]
fn test_diagonal_grid_starts_at_negative_half_diagonal() {
    // 300x400 canvas has a 500 diagonal
    let origins = diagonal_tile_origins(300, 400, 90.0, Spacing::new(10.0, 10.0)).unwrap();
    assert_eq!(origins[0], Point::new(-250.0, -250.0));
    // Steps of 100 while below 250: -250..150, five per axis
    assert_eq!(origins.len(), 25);
    assert!(origins.iter().all(|p| p.x < 250.0 && p.y < 250.0));
}

/// Every canvas pixel, mapped back into the rotated frame, lands inside
/// some tile cell, so no region of the canvas is left without a tile.
#[test]
fn test_diagonal_cells_cover_canvas_at_any_angle() {
    let (width, height) = (160u32, 90u32);
    let spacing = Spacing::new(6.0, 14.0);
    let text_width = 30.0;
    let (cell_w, cell_h) = diagonal_cell(text_width, spacing);
    let origins = diagonal_tile_origins(width, height, text_width, spacing).unwrap();

    let min_x = origins.iter().map(|p| p.x).fold(f32::INFINITY, f32::min);
    let min_y = origins.iter().map(|p| p.y).fold(f32::INFINITY, f32::min);
    let max_x = origins.iter().map(|p| p.x).fold(f32::NEG_INFINITY, f32::max) + cell_w;
    let max_y = origins.iter().map(|p| p.y).fold(f32::NEG_INFINITY, f32::max) + cell_h;
    let reach = cell_w.hypot(cell_h);

    for angle in (0..360).step_by(15) {
        let transform = diagonal_transform(width, height, angle as f32);
        for y in 0..height {
            for x in 0..width {
                let local = transform.invert(Point::new(x as f32 + 0.5, y as f32 + 0.5));
                assert!(
                    local.x >= min_x && local.x < max_x && local.y >= min_y && local.y < max_y,
                    "pixel ({x},{y}) outside tiling at {angle} degrees"
                );
                let nearest = origins
                    .iter()
                    .map(|o| (o.x - local.x).hypot(o.y - local.y))
                    .fold(f32::INFINITY, f32::min);
                assert!(nearest <= reach);
            }
        }
    }
}

#[test]
fn test_diagonal_mask_has_ink_in_every_quadrant() {
    let rasterizer = BlockRasterizer::new();
    let renderer = MaskRenderer::new(&rasterizer);

    for angle in [0.0, -30.0, 90.0, 200.0, 315.0] {
        let spec = MaskSpec::new(
            "ID",
            8.0,
            MaskLayout::DiagonalTiled {
                angle_degrees: angle,
                spacing: Spacing::new(4.0, 4.0),
            },
        );
        let mask = renderer.render(&spec, 120, 80).unwrap();
        for (qx, qy) in [(0, 0), (60, 0), (0, 40), (60, 40)] {
            let hit = (qy..qy + 40).any(|y| (qx..qx + 60).any(|x| mask.pixel(x, y)[3] != 0));
            assert!(hit, "quadrant ({qx},{qy}) empty at {angle} degrees");
        }
    }
}

#[test]
fn test_anchored_corners_land_in_their_quadrant() {
    let rasterizer = BlockRasterizer::new();
    let renderer = MaskRenderer::new(&rasterizer);

    let cases = [
        (Corner::TopLeft, (0, 0)),
        (Corner::TopRight, (100, 0)),
        (Corner::BottomLeft, (0, 50)),
        (Corner::BottomRight, (100, 50)),
    ];
    for (corner, (qx, qy)) in cases {
        let spec = MaskSpec::new(
            "MARK",
            10.0,
            MaskLayout::Anchored {
                corner,
                margin: Spacing::new(8.0, 6.0),
            },
        );
        let mask = renderer.render(&spec, 200, 100).unwrap();
        let total = inked(&mask);
        assert!(total > 0);

        let in_quadrant = (qy..qy + 50)
            .flat_map(|y| (qx..qx + 100).map(move |x| (x, y)))
            .filter(|&(x, y)| mask.pixel(x, y)[3] != 0)
            .count();
        assert_eq!(in_quadrant, total, "{corner:?}");
    }
}

#[test]
fn test_centered_is_symmetric() {
    let rasterizer = BlockRasterizer::new();
    let spec = MaskSpec::new("X", 20.0, MaskLayout::Centered);
    let mask = MaskRenderer::new(&rasterizer).render(&spec, 100, 100).unwrap();

    let xs: Vec<u32> = (0..100)
        .filter(|&x| (0..100).any(|y| mask.pixel(x, y)[3] != 0))
        .collect();
    let left = xs[0];
    let right = 99 - xs[xs.len() - 1];
    assert!((left as i32 - right as i32).abs() <= 1);
}

#[test]
fn test_negative_spacing_rejected() {
    let err = diagonal_tile_origins(10, 10, 5.0, Spacing::new(1.0, -1.0)).unwrap_err();
    assert!(matches!(err, WatermarkError::InvalidParameter(_)));
    assert_eq!(err.code(), 3001);
}
