//! Covert watermark end-to-end tests
//!
//! Tests the complete flow:
//!   PNG on disk → job file → embed → PNG on disk → reveal
//!
//! The hidden marker must survive the PNG round trip bit for bit.

use paritymark::watermark::image_fetcher::decode_image;
use paritymark::watermark::{
    write_png, ApplyOutcome, BlockRasterizer, Channel, ImageFetcher, ImageFetcherConfig,
    MaskRenderer, ParityCodec, PixelBuffer, TextPosition, TextWatermarkConfig,
    WatermarkDefinition, WatermarkError, WatermarkJob, WatermarkProcessor,
};
use std::path::Path;

fn processor() -> WatermarkProcessor {
    WatermarkProcessor::new(ImageFetcher::new(ImageFetcherConfig::default()).unwrap())
}

/// Gradient photo stand-in with every channel value present somewhere.
fn create_test_image(width: u32, height: u32) -> PixelBuffer {
    let mut buffer = PixelBuffer::new(width, height).unwrap();
    for y in 0..height {
        for x in 0..width {
            buffer.set_pixel(
                x,
                y,
                [
                    ((x * 7 + y) % 256) as u8,
                    ((y * 5) % 256) as u8,
                    ((x + y * 3) % 256) as u8,
                    255,
                ],
            );
        }
    }
    buffer
}

fn read_png(path: &Path) -> PixelBuffer {
    decode_image(&std::fs::read(path).unwrap(), &path.to_string_lossy()).unwrap()
}

#[tokio::test]
async fn test_embed_job_then_reveal_matches_mask() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("photo.png");
    let output = dir.path().join("photo.marked.png");
    let original = create_test_image(240, 160);
    write_png(&original, &input).unwrap();

    let yaml = format!(
        r#"
target: "{}"
output: "{}"
watermark:
  type: text
  text: "owner:42"
  font_size: 14
  position: diagonal
  angle: -30
  c_space: 12
  v_space: 12
  secret: true
  channel: g
"#,
        input.display(),
        output.display()
    );
    let job = WatermarkJob::from_yaml_with_env(&yaml).unwrap();

    let outcome = processor().run(&job).await.unwrap();
    assert!(matches!(outcome, ApplyOutcome::Embedded { ink_pixels, .. } if ink_pixels > 0));

    // Only the green channel moved, by at most one level
    let marked = read_png(&output);
    for (before, after) in original.pixels().zip(marked.pixels()) {
        assert_eq!(before[0], after[0]);
        assert!((before[1] as i16 - after[1] as i16).abs() <= 1);
        assert_eq!(before[2], after[2]);
        assert_eq!(before[3], after[3]);
    }

    // Revealed picture equals the binarized marker mask
    let WatermarkDefinition::Text(config) = &job.watermark else {
        panic!("Expected Text watermark");
    };
    let rasterizer = BlockRasterizer::new();
    let mask = MaskRenderer::new(&rasterizer)
        .render(&config.to_mask_spec().unwrap(), 240, 160)
        .unwrap();
    let codec = ParityCodec::for_channel(Channel::G);

    let revealed = processor()
        .reveal(&output.to_string_lossy(), Channel::G)
        .await
        .unwrap();
    assert_eq!(revealed, codec.binarize(&mask));
}

#[tokio::test]
async fn test_reveal_wrong_channel_does_not_show_marker() {
    let processor = processor();
    let mut target = PixelBuffer::filled(80, 40, [100, 100, 100, 255]).unwrap();

    let config = TextWatermarkConfig {
        secret: true,
        channel: Channel::R,
        position: TextPosition::Center,
        ..TextWatermarkConfig::new("HIDDEN")
    };
    processor
        .apply(&mut target, &WatermarkDefinition::Text(config))
        .await
        .unwrap();

    let red = ParityCodec::for_channel(Channel::R).decode(&target);
    let blue = ParityCodec::for_channel(Channel::B).decode(&target);
    assert!(red.pixels().any(|p| p == [255, 255, 255, 255]));
    assert!(blue.pixels().all(|p| p == [0, 0, 0, 255]));
}

#[tokio::test]
async fn test_missing_target_is_resource_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let job = WatermarkJob {
        target: dir.path().join("missing.png").to_string_lossy().to_string(),
        output: dir.path().join("out.png"),
        watermark: WatermarkDefinition::Text(TextWatermarkConfig::new("x")),
    };

    let err = processor().run(&job).await.unwrap_err();
    assert!(matches!(err, WatermarkError::ResourceNotFound(_)));
    assert_eq!(err.code(), 2001);
    assert!(!dir.path().join("out.png").exists());
}

#[tokio::test]
async fn test_reembedding_same_marker_is_stable() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in.png");
    let once = dir.path().join("once.png");
    let twice = dir.path().join("twice.png");
    write_png(&create_test_image(64, 64), &input).unwrap();

    let watermark = WatermarkDefinition::Text(TextWatermarkConfig {
        secret: true,
        ..TextWatermarkConfig::new("ID")
    });
    let processor = processor();
    processor
        .run(&WatermarkJob {
            target: input.to_string_lossy().to_string(),
            output: once.clone(),
            watermark: watermark.clone(),
        })
        .await
        .unwrap();
    let outcome = processor
        .run(&WatermarkJob {
            target: once.to_string_lossy().to_string(),
            output: twice.clone(),
            watermark,
        })
        .await
        .unwrap();

    assert!(matches!(
        outcome,
        ApplyOutcome::Embedded {
            changed_pixels: 0,
            ..
        }
    ));
    assert_eq!(read_png(&once), read_png(&twice));
}
