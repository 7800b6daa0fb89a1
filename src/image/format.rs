use serde::{Deserialize, Serialize};

/// Pixel formats understood by the engine.
///
/// Names list channels from the most significant bit of the pixel value down, so
/// `A8R8G8B8` is the value `0xAARRGGBB`. Formats with an `X` channel carry padding where the
/// alpha would be and always read as opaque. All colour data is premultiplied.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PixelFormat {
    /// `0xAARRGGBB`, the working format.
    A8R8G8B8,
    /// `0x__RRGGBB`.
    X8R8G8B8,
    /// `0xAABBGGRR`.
    A8B8G8R8,
    /// `0x__BBGGRR`.
    X8B8G8R8,
    /// `0xBBGGRRAA`.
    B8G8R8A8,
    /// `0xBBGGRR__`.
    B8G8R8X8,
    /// `0xRRGGBBAA`.
    R8G8B8A8,
    /// `0xRRGGBB__`.
    R8G8B8X8,
    /// 16-bit, five bits red, six green, five blue.
    R5G6B5,
    /// 8-bit alpha only.
    A8,
}

impl PixelFormat {
    /// Every supported format, in declaration order.
    pub const ALL: [PixelFormat; 10] = [
        PixelFormat::A8R8G8B8,
        PixelFormat::X8R8G8B8,
        PixelFormat::A8B8G8R8,
        PixelFormat::X8B8G8R8,
        PixelFormat::B8G8R8A8,
        PixelFormat::B8G8R8X8,
        PixelFormat::R8G8B8A8,
        PixelFormat::R8G8B8X8,
        PixelFormat::R5G6B5,
        PixelFormat::A8,
    ];

    /// Bits per pixel.
    pub const fn bpp(self) -> u32 {
        match self {
            Self::R5G6B5 => 16,
            Self::A8 => 8,
            _ => 32,
        }
    }

    /// Bytes per pixel.
    pub const fn bytes_per_pixel(self) -> usize {
        (self.bpp() / 8) as usize
    }

    /// Whether the alpha channel is stored and significant.
    pub const fn has_alpha(self) -> bool {
        matches!(
            self,
            Self::A8R8G8B8 | Self::A8B8G8R8 | Self::B8G8R8A8 | Self::R8G8B8A8 | Self::A8
        )
    }

    /// The format that differs from `self` only in whether alpha is significant.
    pub const fn alpha_twin(self) -> Option<Self> {
        Some(match self {
            Self::A8R8G8B8 => Self::X8R8G8B8,
            Self::X8R8G8B8 => Self::A8R8G8B8,
            Self::A8B8G8R8 => Self::X8B8G8R8,
            Self::X8B8G8R8 => Self::A8B8G8R8,
            Self::B8G8R8A8 => Self::B8G8R8X8,
            Self::B8G8R8X8 => Self::B8G8R8A8,
            Self::R8G8B8A8 => Self::R8G8B8X8,
            Self::R8G8B8X8 => Self::R8G8B8A8,
            Self::R5G6B5 | Self::A8 => return None,
        })
    }

    /// Equal formats, or formats that differ only in alpha significance.
    pub fn is_alpha_interchangeable(self, other: Self) -> bool {
        self == other || self.alpha_twin() == Some(other)
    }

    /// Expand a raw pixel to premultiplied `0xAARRGGBB`.
    pub const fn to_argb(self, raw: u32) -> u32 {
        match self {
            Self::A8R8G8B8 => raw,
            Self::X8R8G8B8 => raw | 0xff00_0000,
            Self::A8B8G8R8 => swap_red_blue(raw),
            Self::X8B8G8R8 => swap_red_blue(raw) | 0xff00_0000,
            Self::B8G8R8A8 => raw.swap_bytes(),
            Self::B8G8R8X8 => raw.swap_bytes() | 0xff00_0000,
            Self::R8G8B8A8 => raw.rotate_right(8),
            Self::R8G8B8X8 => raw.rotate_right(8) | 0xff00_0000,
            Self::R5G6B5 => expand_0565(raw),
            Self::A8 => (raw & 0xff) << 24,
        }
    }

    /// Narrow a premultiplied `0xAARRGGBB` pixel to this format.
    ///
    /// Padding channels are written as zero and `R5G6B5` truncates.
    pub const fn from_argb(self, argb: u32) -> u32 {
        match self {
            Self::A8R8G8B8 => argb,
            Self::X8R8G8B8 => argb & 0x00ff_ffff,
            Self::A8B8G8R8 => swap_red_blue(argb),
            Self::X8B8G8R8 => swap_red_blue(argb) & 0x00ff_ffff,
            Self::B8G8R8A8 => argb.swap_bytes(),
            Self::B8G8R8X8 => argb.swap_bytes() & 0xffff_ff00,
            Self::R8G8B8A8 => argb.rotate_left(8),
            Self::R8G8B8X8 => argb.rotate_left(8) & 0xffff_ff00,
            Self::R5G6B5 => pack_0565(argb),
            Self::A8 => argb >> 24,
        }
    }

    /// Lowercase name, as accepted by `FromStr`.
    pub const fn name(self) -> &'static str {
        match self {
            Self::A8R8G8B8 => "a8r8g8b8",
            Self::X8R8G8B8 => "x8r8g8b8",
            Self::A8B8G8R8 => "a8b8g8r8",
            Self::X8B8G8R8 => "x8b8g8r8",
            Self::B8G8R8A8 => "b8g8r8a8",
            Self::B8G8R8X8 => "b8g8r8x8",
            Self::R8G8B8A8 => "r8g8b8a8",
            Self::R8G8B8X8 => "r8g8b8x8",
            Self::R5G6B5 => "r5g6b5",
            Self::A8 => "a8",
        }
    }
}

const fn swap_red_blue(p: u32) -> u32 {
    (p & 0xff00_ff00) | ((p >> 16) & 0xff) | ((p & 0xff) << 16)
}

pub(crate) const fn expand_0565(p: u32) -> u32 {
    let r = ((p >> 8) & 0xf8) | ((p >> 13) & 0x07);
    let g = ((p >> 3) & 0xfc) | ((p >> 9) & 0x03);
    let b = ((p << 3) & 0xf8) | ((p >> 2) & 0x07);
    0xff00_0000 | (r << 16) | (g << 8) | b
}

pub(crate) const fn pack_0565(argb: u32) -> u32 {
    ((argb >> 3) & 0x001f) | ((argb >> 5) & 0x07e0) | ((argb >> 8) & 0xf800)
}

#[cfg(test)]
#[path = "../../tests/unit/image/format.rs"]
mod tests;
