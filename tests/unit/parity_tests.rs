// Parity codec tests
//
// These tests pin the bit-level contract of the covert watermark:
// - decode(encode(T, M)) reproduces the presence pattern of M
// - the encoded channel moves by at most one level, other channels never
// - re-encoding is a no-op
// - 255 and 0 never wrap

use paritymark::watermark::{Channel, EncodedChannel, ParityCodec, PixelBuffer, WatermarkError};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rstest::rstest;

const WHITE: [u8; 4] = [255, 255, 255, 255];
const BLACK: [u8; 4] = [0, 0, 0, 255];

fn random_buffer(rng: &mut StdRng, width: u32, height: u32) -> PixelBuffer {
    let data: Vec<u8> = (0..width * height * 4).map(|_| rng.gen()).collect();
    PixelBuffer::from_raw(width, height, data).unwrap()
}

/// Mask with roughly `density` of its pixels inked.
fn random_mask(rng: &mut StdRng, width: u32, height: u32, density: f64) -> PixelBuffer {
    let mut mask = PixelBuffer::new(width, height).unwrap();
    for y in 0..height {
        for x in 0..width {
            if rng.gen_bool(density) {
                mask.set_pixel(x, y, [rng.gen(), rng.gen(), rng.gen(), rng.gen_range(1..=255)]);
            }
        }
    }
    mask
}

/// Scenario A: single ink pixel on an all-black target.
#[test]
fn test_single_ink_pixel_on_black_target() {
    let mut target = PixelBuffer::new(4, 4).unwrap();
    let mut mask = PixelBuffer::new(4, 4).unwrap();
    mask.set_pixel(0, 0, [0, 0, 0, 255]);

    let codec = ParityCodec::for_channel(Channel::R);
    codec.encode(&mut target, &mask).unwrap();

    assert_eq!(target.pixel(0, 0), [1, 0, 0, 0]);
    for y in 0..4 {
        for x in 0..4 {
            if (x, y) != (0, 0) {
                assert_eq!(target.pixel(x, y), [0, 0, 0, 0], "pixel ({x},{y})");
            }
        }
    }

    let decoded = codec.decode(&target);
    assert_eq!(decoded.pixel(0, 0), WHITE);
    for y in 0..4 {
        for x in 0..4 {
            if (x, y) != (0, 0) {
                assert_eq!(decoded.pixel(x, y), BLACK);
            }
        }
    }
}

/// Scenario B: saturated channel with an empty mask steps down to 254.
#[test]
fn test_saturated_channel_with_empty_mask_steps_down() {
    let mut target = PixelBuffer::filled(6, 3, [255, 40, 90, 255]).unwrap();
    let mask = PixelBuffer::new(6, 3).unwrap();

    let codec = ParityCodec::default();
    let stats = codec.encode_with_stats(&mut target, &mask).unwrap();
    assert_eq!(stats.ink_pixels, 0);
    assert_eq!(stats.changed_pixels, 18);

    assert!(target.pixels().all(|p| p == [254, 40, 90, 255]));
    assert!(codec.decode(&target).pixels().all(|p| p == BLACK));
}

/// Scenario C: mismatched sizes fail before any byte changes.
#[test]
fn test_dimension_mismatch_leaves_target_untouched() {
    let mut rng = StdRng::seed_from_u64(7);
    let mut target = random_buffer(&mut rng, 10, 10);
    let before = target.clone();
    let mask = random_mask(&mut rng, 5, 5, 1.0);

    let err = ParityCodec::default().encode(&mut target, &mask).unwrap_err();
    assert!(matches!(
        err,
        WatermarkError::DimensionMismatch {
            target: (10, 10),
            mask: (5, 5)
        }
    ));
    assert_eq!(err.code(), 3002);
    assert_eq!(target, before);
}

#[rstest]
#[case(Channel::R)]
#[case(Channel::G)]
#[case(Channel::B)]
fn test_round_trip_presence(#[case] channel: Channel) {
    let mut rng = StdRng::seed_from_u64(0xC0DE + channel.index() as u64);
    let codec = ParityCodec::for_channel(channel);

    for (w, h, density) in [(1, 1, 0.5), (17, 9, 0.3), (64, 48, 0.05), (32, 32, 0.95)] {
        let mut target = random_buffer(&mut rng, w, h);
        let mask = random_mask(&mut rng, w, h, density);

        codec.encode(&mut target, &mask).unwrap();
        assert_eq!(codec.decode(&target), codec.binarize(&mask), "{w}x{h}");
    }
}

#[rstest]
#[case(Channel::R)]
#[case(Channel::G)]
#[case(Channel::B)]
fn test_minimal_perturbation(#[case] channel: Channel) {
    let mut rng = StdRng::seed_from_u64(42);
    let original = random_buffer(&mut rng, 40, 30);
    let mask = random_mask(&mut rng, 40, 30, 0.4);

    let mut encoded = original.clone();
    ParityCodec::for_channel(channel)
        .encode(&mut encoded, &mask)
        .unwrap();

    let bit = channel.index();
    for (before, after) in original.pixels().zip(encoded.pixels()) {
        for c in 0..4 {
            let delta = (before[c] as i16 - after[c] as i16).abs();
            if c == bit {
                assert!(delta <= 1);
            } else {
                assert_eq!(delta, 0);
            }
        }
    }
}

#[test]
fn test_encode_is_idempotent() {
    let mut rng = StdRng::seed_from_u64(99);
    let mask = random_mask(&mut rng, 25, 25, 0.5);
    let codec = ParityCodec::for_channel(Channel::G);

    let mut once = random_buffer(&mut rng, 25, 25);
    codec.encode(&mut once, &mask).unwrap();

    let mut twice = once.clone();
    let stats = codec.encode_with_stats(&mut twice, &mask).unwrap();
    assert_eq!(stats.changed_pixels, 0);
    assert_eq!(once, twice);
}

#[test]
fn test_zero_with_ink_steps_up_to_one() {
    let mut target = PixelBuffer::filled(3, 3, [0, 0, 0, 255]).unwrap();
    let mask = PixelBuffer::filled(3, 3, [0, 0, 0, 255]).unwrap();
    ParityCodec::default().encode(&mut target, &mask).unwrap();
    assert!(target.pixels().all(|p| p == [1, 0, 0, 255]));
}

#[test]
fn test_only_sampled_mask_byte_counts_as_ink() {
    // Default R pairing samples offset 3; a color-only mask pixel is no ink
    let mut target = PixelBuffer::filled(2, 1, [10, 10, 10, 255]).unwrap();
    let mut mask = PixelBuffer::new(2, 1).unwrap();
    mask.set_pixel(0, 0, [255, 255, 255, 0]);
    mask.set_pixel(1, 0, [0, 0, 0, 1]);

    ParityCodec::default().encode(&mut target, &mask).unwrap();
    assert_eq!(target.pixel(0, 0)[0], 10);
    assert_eq!(target.pixel(1, 0)[0], 11);
}

#[test]
fn test_custom_pairing_round_trip() {
    // Encode into B and read ink from the mask's own blue byte
    let pairing = EncodedChannel::new(Channel::B, 0).unwrap();
    assert_eq!(pairing.mask_index(), 2);
    assert!(EncodedChannel::new(Channel::B, 2).is_err());
    let codec = ParityCodec::new(pairing);

    let mut rng = StdRng::seed_from_u64(5);
    let mut target = random_buffer(&mut rng, 12, 12);
    let mask = random_mask(&mut rng, 12, 12, 0.5);
    codec.encode(&mut target, &mask).unwrap();
    assert_eq!(codec.decode(&target), codec.binarize(&mask));
}

#[test]
fn test_decode_does_not_touch_source() {
    let source = PixelBuffer::filled(2, 2, [3, 4, 5, 6]).unwrap();
    let before = source.clone();
    let decoded = ParityCodec::default().decode(&source);
    assert_eq!(source, before);
    assert!(decoded.pixels().all(|p| p == WHITE));
}
