//! Covert watermarking through channel parity.
//!
//! One hidden bit per pixel is stored as the odd/even-ness of a single
//! color channel of the target image: odd means "ink", even means "no ink".
//! Encoding moves a channel byte by at most one, which is invisible, and
//! never touches the other channels.
//!
//! Decoding only needs the encoded image and yields a black/white
//! visualization of the hidden presence mask. The signal does not survive
//! resizing, cropping or lossy recompression.
//!
//! # Example
//!
//! ```ignore
//! use paritymark::watermark::parity::ParityCodec;
//!
//! let codec = ParityCodec::default();
//! codec.encode(&mut target, &mask)?;
//! let revealed = codec.decode(&target);
//! ```

use super::pixel_buffer::CHANNELS;
use super::{PixelBuffer, WatermarkError};
use serde::{Deserialize, Serialize};

const WHITE: [u8; 4] = [255, 255, 255, 255];
const BLACK: [u8; 4] = [0, 0, 0, 255];

/// Color channel that carries the hidden bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    #[default]
    #[serde(alias = "red", alias = "R")]
    R,
    #[serde(alias = "green", alias = "G")]
    G,
    #[serde(alias = "blue", alias = "B")]
    B,
}

impl Channel {
    /// Byte position of the channel within a pixel.
    pub fn index(self) -> usize {
        match self {
            Self::R => 0,
            Self::G => 1,
            Self::B => 2,
        }
    }
}

impl std::str::FromStr for Channel {
    type Err = WatermarkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "r" | "red" => Ok(Self::R),
            "g" | "green" => Ok(Self::G),
            "b" | "blue" => Ok(Self::B),
            _ => Err(WatermarkError::InvalidParameter(format!(
                "unknown channel '{s}', expected r, g or b"
            ))),
        }
    }
}

/// Which target channel holds the parity bits, and which mask byte decides
/// "ink present".
///
/// The mask byte is sampled at `channel.index() + mask_offset` within each
/// mask pixel. The default pairings all land on the mask's alpha byte:
/// R at offset 3, G at offset 2, B at offset 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodedChannel {
    channel: Channel,
    mask_offset: u8,
}

impl Default for EncodedChannel {
    fn default() -> Self {
        Self::for_channel(Channel::R)
    }
}

impl EncodedChannel {
    /// Pair `channel` with an explicit mask offset.
    ///
    /// # Errors
    ///
    /// `InvalidParameter` if the sampled byte would fall outside the pixel.
    pub fn new(channel: Channel, mask_offset: u8) -> Result<Self, WatermarkError> {
        if channel.index() + mask_offset as usize >= CHANNELS {
            return Err(WatermarkError::InvalidParameter(format!(
                "mask offset {mask_offset} from channel {channel:?} leaves the pixel"
            )));
        }
        Ok(Self {
            channel,
            mask_offset,
        })
    }

    /// Pair `channel` with the offset that samples mask alpha.
    pub fn for_channel(channel: Channel) -> Self {
        Self {
            channel,
            mask_offset: (CHANNELS - 1 - channel.index()) as u8,
        }
    }

    pub fn channel(&self) -> Channel {
        self.channel
    }

    pub fn mask_offset(&self) -> u8 {
        self.mask_offset
    }

    /// Byte position within a mask pixel that is tested for ink.
    pub fn mask_index(&self) -> usize {
        self.channel.index() + self.mask_offset as usize
    }
}

/// Statistics from one encode call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EncodeStats {
    /// Pixels whose mask byte was non-zero.
    pub ink_pixels: usize,
    /// Channel bytes that had to move by one.
    pub changed_pixels: usize,
}

/// Parity encoder/decoder for one channel pairing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ParityCodec {
    channel: EncodedChannel,
}

/// Nearest value with the requested parity, at most one step away.
///
/// Odd to even always steps down (odd values are at least 1). Even to odd
/// always steps up (even values are at most 254).
#[inline]
fn with_parity(value: u8, odd: bool) -> u8 {
    match (value % 2 == 1, odd) {
        (true, false) => value - 1,
        (false, true) => value + 1,
        _ => value,
    }
}

impl ParityCodec {
    pub fn new(channel: EncodedChannel) -> Self {
        Self { channel }
    }

    pub fn for_channel(channel: Channel) -> Self {
        Self::new(EncodedChannel::for_channel(channel))
    }

    pub fn channel(&self) -> EncodedChannel {
        self.channel
    }

    /// Hide the presence pattern of `mask` in `target`.
    ///
    /// After the call the encode-channel byte of every target pixel is odd
    /// exactly where the mask byte is non-zero. Returns the same buffer.
    ///
    /// # Errors
    ///
    /// `DimensionMismatch` if the buffers differ in size. The target is left
    /// untouched in that case.
    pub fn encode<'a>(
        &self,
        target: &'a mut PixelBuffer,
        mask: &PixelBuffer,
    ) -> Result<&'a mut PixelBuffer, WatermarkError> {
        self.encode_with_stats(target, mask)?;
        Ok(target)
    }

    /// Like [`encode`](Self::encode) but reports what changed.
    pub fn encode_with_stats(
        &self,
        target: &mut PixelBuffer,
        mask: &PixelBuffer,
    ) -> Result<EncodeStats, WatermarkError> {
        if target.dimensions() != mask.dimensions() {
            return Err(WatermarkError::DimensionMismatch {
                target: target.dimensions(),
                mask: mask.dimensions(),
            });
        }

        let bit = self.channel.channel().index();
        let sample = self.channel.mask_index();
        let mut stats = EncodeStats::default();

        for (px, ink) in target.pixels_mut().zip(mask.pixels()) {
            let ink_present = ink[sample] != 0;
            let next = with_parity(px[bit], ink_present);
            if next != px[bit] {
                px[bit] = next;
                stats.changed_pixels += 1;
            }
            if ink_present {
                stats.ink_pixels += 1;
            }
        }

        tracing::debug!(
            width = target.width(),
            height = target.height(),
            channel = ?self.channel.channel(),
            ink_pixels = stats.ink_pixels,
            changed_pixels = stats.changed_pixels,
            "Parity watermark encoded"
        );

        Ok(stats)
    }

    /// Recover the hidden mask from an encoded image.
    ///
    /// Returns a new opaque buffer: white where the channel byte is odd,
    /// black where it is even. The source is not modified.
    pub fn decode(&self, source: &PixelBuffer) -> PixelBuffer {
        let bit = self.channel.channel().index();
        let mut out = source.clone();
        for px in out.pixels_mut() {
            let rgba = if px[bit] % 2 == 1 { WHITE } else { BLACK };
            px.copy_from_slice(&rgba);
        }
        out
    }

    /// Black/white rendering of the ink present in `mask`, in the same form
    /// that [`decode`](Self::decode) produces.
    pub fn binarize(&self, mask: &PixelBuffer) -> PixelBuffer {
        let sample = self.channel.mask_index();
        let mut out = mask.clone();
        for px in out.pixels_mut() {
            let rgba = if px[sample] != 0 { WHITE } else { BLACK };
            px.copy_from_slice(&rgba);
        }
        out
    }
}
