use crate::foundation::math::alpha;
use crate::image::filter::FilterKind;
use crate::image::format::PixelFormat;
use crate::image::model::Image;
use crate::image::transform::TransformKind;
use crate::sample::repeat::Repeat;

bitflags::bitflags! {
    /// Capabilities of one composite operand.
    ///
    /// A fast path lists the flags it needs; it applies only when the operand has all of them.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct PathFlags: u32 {
        /// No transform at all.
        const ID_TRANSFORM = 1 << 0;
        /// Axis-aligned scale and translation only.
        const SCALE_TRANSFORM = 1 << 1;
        /// Any invertible affine transform.
        const AFFINE_TRANSFORM = 1 << 2;
        /// Stepping one destination pixel right moves right in the source, not up or down.
        const X_UNIT_POSITIVE = 1 << 3;
        /// Samples equal nearest-neighbour samples.
        const NEAREST_FILTER = 1 << 4;
        /// Samples are bilinear.
        const BILINEAR_FILTER = 1 << 5;
        /// Outside the image is transparent.
        const REPEAT_NONE = 1 << 6;
        /// Outside the image clamps to the edge.
        const REPEAT_PAD = 1 << 7;
        /// The image tiles.
        const REPEAT_NORMAL = 1 << 8;
        /// The image tiles, mirrored every other tile.
        const REPEAT_REFLECT = 1 << 9;
        /// Every nearest sample of the composite lands inside the image.
        const SAMPLES_COVER_CLIP_NEAREST = 1 << 10;
        /// Every bilinear 2x2 neighbourhood of the composite lands inside the image.
        const SAMPLES_COVER_CLIP_BILINEAR = 1 << 11;
        /// Every sample has alpha 0xff.
        const IS_OPAQUE = 1 << 12;

        /// A source read one-to-one in destination order.
        const STANDARD_SOURCE = Self::ID_TRANSFORM.bits()
            | Self::NEAREST_FILTER.bits()
            | Self::SAMPLES_COVER_CLIP_NEAREST.bits();
        /// A scaled source sampled nearest-neighbour, left to right.
        const SCALED_NEAREST = Self::SCALE_TRANSFORM.bits()
            | Self::X_UNIT_POSITIVE.bits()
            | Self::NEAREST_FILTER.bits();
        /// A scaled source sampled bilinearly, left to right.
        const SCALED_BILINEAR = Self::SCALE_TRANSFORM.bits()
            | Self::X_UNIT_POSITIVE.bits()
            | Self::BILINEAR_FILTER.bits();
    }
}

/// What kind of operand occupies a composite slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FormatCode {
    /// No mask was supplied.
    Null,
    /// A solid colour, or a 1x1 tiling bits image.
    Solid,
    /// A pixel rectangle in this format.
    Bits(PixelFormat),
}

impl FormatCode {
    /// Classify an operand, `None` meaning an absent mask.
    pub fn of(image: Option<&Image<'_>>) -> Self {
        match image {
            None => Self::Null,
            Some(img) if img.solid_color().is_some() => Self::Solid,
            Some(img) => img.format().map_or(Self::Solid, Self::Bits),
        }
    }
}

fn repeat_flag(repeat: Repeat) -> PathFlags {
    match repeat {
        Repeat::None => PathFlags::REPEAT_NONE,
        Repeat::Pad => PathFlags::REPEAT_PAD,
        Repeat::Normal => PathFlags::REPEAT_NORMAL,
        Repeat::Reflect => PathFlags::REPEAT_REFLECT,
    }
}

/// Flags that follow from the image alone. Cover flags depend on the composite rectangle and
/// are added by the caller.
pub(crate) fn image_flags(image: &Image<'_>) -> PathFlags {
    if let Some(color) = image.solid_color() {
        let mut flags = PathFlags::ID_TRANSFORM
            | PathFlags::SCALE_TRANSFORM
            | PathFlags::AFFINE_TRANSFORM
            | PathFlags::X_UNIT_POSITIVE
            | PathFlags::NEAREST_FILTER
            | PathFlags::REPEAT_NORMAL
            | PathFlags::SAMPLES_COVER_CLIP_NEAREST
            | PathFlags::SAMPLES_COVER_CLIP_BILINEAR;
        if alpha(color) == 0xff {
            flags |= PathFlags::IS_OPAQUE;
        }
        return flags;
    }

    let mut flags = repeat_flag(image.repeat());
    let unit_step = match image.transform() {
        None => {
            flags |= PathFlags::ID_TRANSFORM | PathFlags::SCALE_TRANSFORM | PathFlags::AFFINE_TRANSFORM;
            true
        }
        Some(t) => {
            let m = &t.matrix;
            match t.kind() {
                TransformKind::Identity | TransformKind::Scale => {
                    flags |= PathFlags::SCALE_TRANSFORM | PathFlags::AFFINE_TRANSFORM;
                }
                TransformKind::Affine => flags |= PathFlags::AFFINE_TRANSFORM,
                TransformKind::Projective => {}
            }
            if t.is_affine() && m[0][0].0 > 0 && m[1][0].0 == 0 {
                flags |= PathFlags::X_UNIT_POSITIVE;
            }
            t.is_integer_translation()
        }
    };
    if image.transform().is_none() {
        flags |= PathFlags::X_UNIT_POSITIVE;
    }

    let filter = image.filter().kind();
    match filter {
        FilterKind::Nearest => flags |= PathFlags::NEAREST_FILTER,
        FilterKind::Bilinear => {
            flags |= PathFlags::BILINEAR_FILTER;
            if unit_step {
                flags |= PathFlags::NEAREST_FILTER;
            }
        }
        FilterKind::Convolution | FilterKind::SeparableConvolution => {}
    }

    let opaque_format = image.format().is_some_and(|f| !f.has_alpha());
    let exact_filter = matches!(filter, FilterKind::Nearest | FilterKind::Bilinear);
    if opaque_format && exact_filter && image.repeat() != Repeat::None {
        flags |= PathFlags::IS_OPAQUE;
    }
    flags
}

/// Flags of a destination raster, which is always addressed one-to-one.
pub(crate) fn destination_flags(format: PixelFormat) -> PathFlags {
    let mut flags = PathFlags::STANDARD_SOURCE
        | PathFlags::SCALE_TRANSFORM
        | PathFlags::AFFINE_TRANSFORM
        | PathFlags::X_UNIT_POSITIVE
        | PathFlags::SAMPLES_COVER_CLIP_BILINEAR;
    if !format.has_alpha() {
        flags |= PathFlags::IS_OPAQUE;
    }
    flags
}

#[cfg(test)]
#[path = "../../tests/unit/dispatch/flags.rs"]
mod tests;
