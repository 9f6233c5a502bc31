//! Visible watermark end-to-end tests
//!
//! Image and text overlays applied through the processor, with output
//! written to disk or encoded as a data URL.

use base64::{engine::general_purpose::STANDARD, Engine};
use paritymark::watermark::image_fetcher::decode_image;
use paritymark::watermark::{
    to_data_url, write_png, ApplyOutcome, ImageFetcher, ImageFetcherConfig, ImagePosition,
    ImageWatermarkConfig, PixelBuffer, TextPosition, TextWatermarkConfig, WatermarkDefinition,
    WatermarkProcessor,
};
use rstest::rstest;

const RED: [u8; 4] = [255, 0, 0, 255];
const WHITE: [u8; 4] = [255, 255, 255, 255];

fn processor() -> WatermarkProcessor {
    WatermarkProcessor::new(ImageFetcher::new(ImageFetcherConfig::default()).unwrap())
}

fn logo_on_disk(dir: &tempfile::TempDir, size: u32) -> String {
    let path = dir.path().join("logo.png");
    write_png(&PixelBuffer::filled(size, size, RED).unwrap(), &path).unwrap();
    path.to_string_lossy().to_string()
}

#[rstest]
#[case(ImagePosition::TopLeft, (0, 0), (99, 59))]
#[case(ImagePosition::TopRight, (99, 0), (0, 59))]
#[case(ImagePosition::BottomLeft, (0, 59), (99, 0))]
#[case(ImagePosition::BottomRight, (99, 59), (0, 0))]
#[case(ImagePosition::Center, (50, 30), (0, 0))]
#[tokio::test]
async fn test_image_overlay_positions(
    #[case] position: ImagePosition,
    #[case] covered: (u32, u32),
    #[case] untouched: (u32, u32),
) {
    let dir = tempfile::tempdir().unwrap();
    let source = logo_on_disk(&dir, 10);
    let mut target = PixelBuffer::filled(100, 60, WHITE).unwrap();

    let config = ImageWatermarkConfig {
        source,
        width: None,
        height: None,
        opacity: 1.0,
        position,
    };
    let outcome = processor()
        .apply(&mut target, &WatermarkDefinition::Image(config))
        .await
        .unwrap();

    assert_eq!(outcome, ApplyOutcome::ImageDrawn { placements: 1 });
    assert_eq!(target.pixel(covered.0, covered.1), RED);
    assert_eq!(target.pixel(untouched.0, untouched.1), WHITE);
}

#[tokio::test]
async fn test_image_overlay_repeat_covers_canvas() {
    let dir = tempfile::tempdir().unwrap();
    let source = logo_on_disk(&dir, 16);
    let mut target = PixelBuffer::filled(50, 35, WHITE).unwrap();

    let config = ImageWatermarkConfig {
        source,
        width: None,
        height: None,
        opacity: 1.0,
        position: ImagePosition::Repeat,
    };
    let outcome = processor()
        .apply(&mut target, &WatermarkDefinition::Image(config))
        .await
        .unwrap();

    // 4 columns (0, 16, 32, 48) x 3 rows (0, 16, 32)
    assert_eq!(outcome, ApplyOutcome::ImageDrawn { placements: 12 });
    assert!(target.pixels().all(|p| p == RED));
}

#[tokio::test]
async fn test_image_overlay_opacity_blends() {
    let dir = tempfile::tempdir().unwrap();
    let source = logo_on_disk(&dir, 4);
    let mut target = PixelBuffer::filled(4, 4, [0, 0, 0, 255]).unwrap();

    let config = ImageWatermarkConfig {
        source,
        width: None,
        height: None,
        opacity: 0.5,
        position: ImagePosition::TopLeft,
    };
    processor()
        .apply(&mut target, &WatermarkDefinition::Image(config))
        .await
        .unwrap();

    let p = target.pixel(1, 1);
    assert!(p[0] >= 127 && p[0] <= 128);
    assert_eq!(p[1], 0);
    assert_eq!(p[3], 255);
}

#[tokio::test]
async fn test_text_overlay_to_data_url() {
    let mut target = PixelBuffer::filled(120, 60, WHITE).unwrap();
    let config = TextWatermarkConfig {
        color: "#0000FF".to_string(),
        position: TextPosition::BottomLeft,
        ..TextWatermarkConfig::new("SAMPLE")
    };
    processor()
        .apply(&mut target, &WatermarkDefinition::Text(config))
        .await
        .unwrap();

    let url = to_data_url(&target).unwrap();
    let encoded = url.strip_prefix("data:image/png;base64,").unwrap();
    let bytes = STANDARD.decode(encoded).unwrap();
    let decoded = decode_image(&bytes, "inline.png").unwrap();

    assert_eq!(decoded, target);
    assert!(decoded.pixels().any(|p| p == [0, 0, 255, 255]));
    // Bottom-left run sits above the 20px margin, nothing near the top
    assert!((0..16).all(|y| (0..120).all(|x| decoded.pixel(x, y) == WHITE)));
    assert!((41..60).all(|y| (0..120).all(|x| decoded.pixel(x, y) == WHITE)));
}
