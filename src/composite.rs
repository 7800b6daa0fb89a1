//! The composite entry point: clip, classify, resolve once, run once.

use crate::combine::op::Operator;
use crate::dispatch::fast_path::PathKey;
use crate::dispatch::flags::{FormatCode, PathFlags, destination_flags, image_flags};
use crate::dispatch::implementation::{ImplementationChain, default_chain};
use crate::foundation::error::PixmixResult;
use crate::foundation::fixed::Fixed;
use crate::image::filter::FilterKind;
use crate::image::model::{DestRaster, Image};
use crate::image::transform::{Transform, TransformKind};
use crate::sample::repeat::Repeat;

/// A clipped composite as handed to a resolved routine.
///
/// Offsets are already shifted so that `(dest_x, dest_y, width, height)` lies inside the
/// destination. The path key it was resolved from describes this exact rectangle.
pub(crate) struct CompositeInfo<'a> {
    pub op: Operator,
    pub src: &'a Image<'a>,
    pub mask: Option<&'a Image<'a>>,
    pub dest: DestRaster<'a>,
    pub src_x: i32,
    pub src_y: i32,
    pub mask_x: i32,
    pub mask_y: i32,
    pub dest_x: i32,
    pub dest_y: i32,
    pub width: i32,
    pub height: i32,
}

/// Composite `src` (optionally through `mask`) onto `dst` with `op`, using the process-wide
/// implementation chain.
///
/// Destination pixel `(dest_x + i, dest_y + j)` combines source sample `(src_x + i, src_y + j)`
/// and mask sample `(mask_x + i, mask_y + j)`, each taken through its image's transform,
/// filter and repeat mode. Only the part of the rectangle inside the destination is written.
#[allow(clippy::too_many_arguments)]
pub fn composite(
    op: Operator,
    src: &Image<'_>,
    mask: Option<&Image<'_>>,
    dst: &mut Image<'_>,
    src_x: i32,
    src_y: i32,
    mask_x: i32,
    mask_y: i32,
    dest_x: i32,
    dest_y: i32,
    width: u32,
    height: u32,
) -> PixmixResult<()> {
    composite_with(
        default_chain(),
        op,
        src,
        mask,
        dst,
        src_x,
        src_y,
        mask_x,
        mask_y,
        dest_x,
        dest_y,
        width,
        height,
    )
}

/// [`composite`] through an explicit chain.
#[allow(clippy::too_many_arguments)]
pub fn composite_with(
    chain: &ImplementationChain,
    op: Operator,
    src: &Image<'_>,
    mask: Option<&Image<'_>>,
    dst: &mut Image<'_>,
    src_x: i32,
    src_y: i32,
    mask_x: i32,
    mask_y: i32,
    dest_x: i32,
    dest_y: i32,
    width: u32,
    height: u32,
) -> PixmixResult<()> {
    let dest = dst.dest_raster()?;
    if width == 0 || height == 0 {
        return Ok(());
    }

    let mut region = Region {
        x0: i64::from(dest_x),
        y0: i64::from(dest_y),
        x1: i64::from(dest_x) + i64::from(width),
        y1: i64::from(dest_y) + i64::from(height),
    };
    region = region.intersect(Region::sized(0, 0, dest.width, dest.height));
    region = clip_to_operand(region, src, src_x, src_y, dest_x, dest_y);
    if let Some(mask) = mask {
        region = clip_to_operand(region, mask, mask_x, mask_y, dest_x, dest_y);
    }
    if region.is_empty() {
        return Ok(());
    }

    let dx = region.x0 - i64::from(dest_x);
    let dy = region.y0 - i64::from(dest_y);
    let (Ok(src_x), Ok(src_y), Ok(mask_x), Ok(mask_y)) = (
        i32::try_from(i64::from(src_x) + dx),
        i32::try_from(i64::from(src_y) + dy),
        i32::try_from(i64::from(mask_x) + dx),
        i32::try_from(i64::from(mask_y) + dy),
    ) else {
        tracing::warn!("composite offsets leave the 32-bit range; skipping");
        return Ok(());
    };
    let (w, h) = (region.x1 - region.x0, region.y1 - region.y0);

    let Some(src_flags) = analyze_extent(src, image_flags(src), src_x, src_y, w, h) else {
        tracing::warn!("source transform leaves the 16.16 range; skipping composite");
        return Ok(());
    };
    let mask_flags = match mask {
        Some(m) => match analyze_extent(m, image_flags(m), mask_x, mask_y, w, h) {
            Some(flags) => flags,
            None => {
                tracing::warn!("mask transform leaves the 16.16 range; skipping composite");
                return Ok(());
            }
        },
        None => PathFlags::empty(),
    };
    let dest_flags = destination_flags(dest.format);

    let src_opaque = src_flags.contains(PathFlags::IS_OPAQUE)
        && mask.is_none_or(|_| mask_flags.contains(PathFlags::IS_OPAQUE));
    let reduced = op.reduce(src_opaque, dest_flags.contains(PathFlags::IS_OPAQUE));
    if reduced != op {
        tracing::debug!(from = op.name(), to = reduced.name(), "operator reduced");
    }

    let key = PathKey {
        op: reduced,
        src: FormatCode::of(Some(src)),
        src_flags,
        mask: FormatCode::of(mask),
        mask_flags,
        dest: FormatCode::Bits(dest.format),
        dest_flags,
    };
    let head = chain.head();
    let (_, func) = head.resolve(&key);

    let mut info = CompositeInfo {
        op: reduced,
        src,
        mask,
        dest,
        src_x,
        src_y,
        mask_x,
        mask_y,
        dest_x: region.x0 as i32,
        dest_y: region.y0 as i32,
        width: w as i32,
        height: h as i32,
    };
    func(head, &mut info);
    Ok(())
}

/// Half-open rectangle in 64-bit destination coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Region {
    x0: i64,
    y0: i64,
    x1: i64,
    y1: i64,
}

impl Region {
    fn sized(x: i64, y: i64, w: i32, h: i32) -> Self {
        Self {
            x0: x,
            y0: y,
            x1: x + i64::from(w),
            y1: y + i64::from(h),
        }
    }

    fn intersect(self, other: Self) -> Self {
        Self {
            x0: self.x0.max(other.x0),
            y0: self.y0.max(other.y0),
            x1: self.x1.min(other.x1),
            y1: self.y1.min(other.y1),
        }
    }

    fn is_empty(&self) -> bool {
        self.x0 >= self.x1 || self.y0 >= self.y1
    }
}

/// Drop destination pixels that would sample outside an untransformed, non-repeating
/// operand. Those samples are transparent and the pixels are left as they are.
fn clip_to_operand(
    region: Region,
    image: &Image<'_>,
    x: i32,
    y: i32,
    dest_x: i32,
    dest_y: i32,
) -> Region {
    let Some(bits) = image.bits() else {
        return region;
    };
    let point_sampled = matches!(
        image.filter().kind(),
        FilterKind::Nearest | FilterKind::Bilinear
    );
    if image.transform().is_some() || image.repeat() != Repeat::None || !point_sampled {
        return region;
    }
    let origin_x = i64::from(dest_x) - i64::from(x);
    let origin_y = i64::from(dest_y) - i64::from(y);
    region.intersect(Region::sized(origin_x, origin_y, bits.width, bits.height))
}

/// Extremes of a transformed rectangle of sample points, in 48.16.
#[derive(Clone, Copy, Debug)]
struct Extents {
    min_x: i64,
    min_y: i64,
    max_x: i64,
    max_y: i64,
}

/// Map the centres of pixels `[x0, x1] x [y0, y1]` (inclusive) through an affine `t`.
fn affine_extents(t: &Transform, x0: i64, y0: i64, x1: i64, y1: i64) -> Option<Extents> {
    let centre = |i: i64| (i << 16) + i64::from(Fixed::HALF.0);
    let mut ext = Extents {
        min_x: i64::MAX,
        min_y: i64::MAX,
        max_x: i64::MIN,
        max_y: i64::MIN,
    };
    for (cx, cy) in [(x0, y0), (x1, y0), (x0, y1), (x1, y1)] {
        let [vx, vy, _] = t.transform_point_3d([centre(cx), centre(cy), 1 << 16])?;
        ext.min_x = ext.min_x.min(vx);
        ext.min_y = ext.min_y.min(vy);
        ext.max_x = ext.max_x.max(vx);
        ext.max_y = ext.max_y.max(vy);
    }
    Some(ext)
}

/// Reach of the filter beyond a sample point, in 16.16.
fn filter_reach(image: &Image<'_>) -> i64 {
    let filter = image.filter();
    let taps = match filter.kind() {
        FilterKind::Nearest => 0,
        FilterKind::Bilinear => 1,
        FilterKind::Convolution => filter
            .convolution()
            .map_or(0, |p| p.width.max(p.height)),
        FilterKind::SeparableConvolution => filter
            .separable()
            .map_or(0, |p| p.width.max(p.height)),
    };
    (i64::from(taps) + 1) << 16
}

/// Add the sample-coverage flags for the `w x h` block of samples starting at `(x, y)`.
///
/// Returns `None` when an affine transform sends the block (grown by one pixel and the
/// filter's reach) outside the 16.16 range scanline stepping works in.
fn analyze_extent(
    image: &Image<'_>,
    mut flags: PathFlags,
    x: i32,
    y: i32,
    w: i64,
    h: i64,
) -> Option<PathFlags> {
    let Some(bits) = image.bits() else {
        return Some(flags);
    };
    if image.solid_color().is_some() {
        return Some(flags);
    }
    let t = image.transform().copied().unwrap_or(Transform::IDENTITY);
    if t.kind() == TransformKind::Projective {
        return Some(flags);
    }
    let (x, y) = (i64::from(x), i64::from(y));

    let grown = affine_extents(&t, x - 1, y - 1, x + w, y + h)?;
    let reach = filter_reach(image) + 8;
    let fits = |v: i64| v - reach >= i64::from(i32::MIN) && v + reach <= i64::from(i32::MAX);
    if ![grown.min_x, grown.min_y, grown.max_x, grown.max_y]
        .into_iter()
        .all(fits)
    {
        return None;
    }

    let ext = affine_extents(&t, x, y, x + w - 1, y + h - 1)?;
    let (width, height) = (i64::from(bits.width), i64::from(bits.height));
    let floor = |v: i64| v >> 16;

    let e = i64::from(Fixed::EPSILON.0);
    if floor(ext.min_x - e) >= 0
        && floor(ext.min_y - e) >= 0
        && floor(ext.max_x - e) < width
        && floor(ext.max_y - e) < height
    {
        flags |= PathFlags::SAMPLES_COVER_CLIP_NEAREST;
    }
    let half = i64::from(Fixed::HALF.0);
    if floor(ext.min_x - half) >= 0
        && floor(ext.min_y - half) >= 0
        && floor(ext.max_x - half) + 1 < width
        && floor(ext.max_y - half) + 1 < height
    {
        flags |= PathFlags::SAMPLES_COVER_CLIP_BILINEAR;
    }

    let covered = match image.filter().kind() {
        FilterKind::Nearest => flags.contains(PathFlags::SAMPLES_COVER_CLIP_NEAREST),
        // A bilinear image flagged NEAREST_FILTER samples exact texels.
        FilterKind::Bilinear => {
            flags.contains(PathFlags::SAMPLES_COVER_CLIP_BILINEAR)
                || flags.contains(PathFlags::NEAREST_FILTER | PathFlags::SAMPLES_COVER_CLIP_NEAREST)
        }
        FilterKind::Convolution | FilterKind::SeparableConvolution => false,
    };
    if covered && !bits.format.has_alpha() {
        flags |= PathFlags::IS_OPAQUE;
    }
    Some(flags)
}

#[cfg(test)]
#[path = "../tests/unit/composite.rs"]
mod tests;
