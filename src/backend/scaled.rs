//! Main loops for axis-aligned scaling of 32-bit sources.
//!
//! A source row is walked in 16.16 steps and split into a left edge run, an in-range middle
//! run handed to a backend kernel, and a right edge run. Edge samples go through the image's
//! repeat mode exactly like the general fetcher, so the split never changes the output.

use smallvec::smallvec;

use crate::backend::Scanline;
use crate::backend::general::general_composite;
use crate::combine::op::Operator;
use crate::composite::CompositeInfo;
use crate::dispatch::fast_path::{FastPath, FormatPattern};
use crate::dispatch::flags::PathFlags;
use crate::dispatch::implementation::Implementation;
use crate::foundation::fixed::Fixed;
use crate::image::format::PixelFormat;
use crate::image::model::Bits;
use crate::image::transform::Transform;
use crate::sample::repeat::Repeat;
use crate::sample::scanline::{bilinear_weight, interpolate, nearest_scanline, scanline_runs};

/// Scanline kernels a backend plugs into the scaling loops.
///
/// Pixels are 32-bit with alpha in the top byte; the channel order of the other three bytes
/// does not matter.
pub(crate) trait ScanlineKernels {
    /// Premultiplied OVER of `src` onto `dest` (equal lengths).
    fn over(dest: &mut [u32], src: &[u32]);

    /// Same contract as [`crate::sample::scanline::bilinear_scanline`].
    fn bilinear(out: &mut [u32], top: &[u32], bottom: &[u32], wb: u32, vx: Fixed, unit_x: Fixed);
}

/// A scaled-nearest table entry for `op` from `format` onto the same channel order.
pub(crate) const fn nearest_path(
    op: Operator,
    format: PixelFormat,
    repeat: PathFlags,
    func: crate::dispatch::fast_path::CompositeFn,
) -> FastPath {
    FastPath::unmasked(
        op,
        FormatPattern::Exact(format),
        PathFlags::SCALED_NEAREST.union(repeat),
        FormatPattern::IgnoringAlpha(format),
        func,
    )
}

pub(crate) const fn bilinear_path(
    op: Operator,
    format: PixelFormat,
    repeat: PathFlags,
    func: crate::dispatch::fast_path::CompositeFn,
) -> FastPath {
    FastPath::unmasked(
        op,
        FormatPattern::Exact(format),
        PathFlags::SCALED_BILINEAR.union(repeat),
        FormatPattern::IgnoringAlpha(format),
        func,
    )
}

/// Declare a backend's fast-path table: the listed entries followed by scaled nearest and
/// bilinear `SRC`/`OVER` entries for `a8r8g8b8` and `a8b8g8r8` driven by `$kernels`.
macro_rules! fast_path_table {
    ($kernels:ty; $($entry:expr),* $(,)?) => {
        pub(crate) static FAST_PATHS: &[$crate::dispatch::fast_path::FastPath] = {
            use $crate::backend::scaled::{bilinear_path, nearest_path, scaled_bilinear, scaled_nearest};
            use $crate::combine::op::Operator::{Over, Src};
            use $crate::dispatch::flags::PathFlags as F;
            use $crate::image::format::PixelFormat::{A8B8G8R8, A8R8G8B8};
            &[
                $($entry,)*
                nearest_path(Src, A8R8G8B8, F::SAMPLES_COVER_CLIP_NEAREST, scaled_nearest::<$kernels>),
                nearest_path(Over, A8R8G8B8, F::SAMPLES_COVER_CLIP_NEAREST, scaled_nearest::<$kernels>),
                nearest_path(Src, A8B8G8R8, F::SAMPLES_COVER_CLIP_NEAREST, scaled_nearest::<$kernels>),
                nearest_path(Over, A8B8G8R8, F::SAMPLES_COVER_CLIP_NEAREST, scaled_nearest::<$kernels>),
                nearest_path(Src, A8R8G8B8, F::REPEAT_PAD, scaled_nearest::<$kernels>),
                nearest_path(Over, A8R8G8B8, F::REPEAT_PAD, scaled_nearest::<$kernels>),
                nearest_path(Src, A8B8G8R8, F::REPEAT_PAD, scaled_nearest::<$kernels>),
                nearest_path(Over, A8B8G8R8, F::REPEAT_PAD, scaled_nearest::<$kernels>),
                nearest_path(Src, A8R8G8B8, F::REPEAT_NONE, scaled_nearest::<$kernels>),
                nearest_path(Over, A8R8G8B8, F::REPEAT_NONE, scaled_nearest::<$kernels>),
                nearest_path(Src, A8B8G8R8, F::REPEAT_NONE, scaled_nearest::<$kernels>),
                nearest_path(Over, A8B8G8R8, F::REPEAT_NONE, scaled_nearest::<$kernels>),
                nearest_path(Src, A8R8G8B8, F::REPEAT_NORMAL, scaled_nearest::<$kernels>),
                nearest_path(Over, A8R8G8B8, F::REPEAT_NORMAL, scaled_nearest::<$kernels>),
                nearest_path(Src, A8B8G8R8, F::REPEAT_NORMAL, scaled_nearest::<$kernels>),
                nearest_path(Over, A8B8G8R8, F::REPEAT_NORMAL, scaled_nearest::<$kernels>),
                bilinear_path(Src, A8R8G8B8, F::SAMPLES_COVER_CLIP_BILINEAR, scaled_bilinear::<$kernels>),
                bilinear_path(Over, A8R8G8B8, F::SAMPLES_COVER_CLIP_BILINEAR, scaled_bilinear::<$kernels>),
                bilinear_path(Src, A8B8G8R8, F::SAMPLES_COVER_CLIP_BILINEAR, scaled_bilinear::<$kernels>),
                bilinear_path(Over, A8B8G8R8, F::SAMPLES_COVER_CLIP_BILINEAR, scaled_bilinear::<$kernels>),
                bilinear_path(Src, A8R8G8B8, F::REPEAT_PAD, scaled_bilinear::<$kernels>),
                bilinear_path(Over, A8R8G8B8, F::REPEAT_PAD, scaled_bilinear::<$kernels>),
                bilinear_path(Src, A8B8G8R8, F::REPEAT_PAD, scaled_bilinear::<$kernels>),
                bilinear_path(Over, A8B8G8R8, F::REPEAT_PAD, scaled_bilinear::<$kernels>),
                bilinear_path(Src, A8R8G8B8, F::REPEAT_NONE, scaled_bilinear::<$kernels>),
                bilinear_path(Over, A8R8G8B8, F::REPEAT_NONE, scaled_bilinear::<$kernels>),
                bilinear_path(Src, A8B8G8R8, F::REPEAT_NONE, scaled_bilinear::<$kernels>),
                bilinear_path(Over, A8B8G8R8, F::REPEAT_NONE, scaled_bilinear::<$kernels>),
            ]
        };
    };
}
pub(crate) use fast_path_table;

/// Where the first sample of the composite lands in the source, in 48.16, and the per-pixel
/// and per-row steps.
struct Walk {
    vx: i64,
    vy: i64,
    unit_x: Fixed,
    unit_y: i64,
}

impl Walk {
    fn new(info: &CompositeInfo<'_>, bias: Fixed) -> Option<Self> {
        let t = info.src.transform().copied().unwrap_or(Transform::IDENTITY);
        let centre = |i: i32| (i64::from(i) << 16) + i64::from(Fixed::HALF.0);
        let [vx, vy, _] = t.transform_point_3d([centre(info.src_x), centre(info.src_y), 1 << 16])?;
        Some(Self {
            vx: vx - i64::from(bias.0),
            vy: vy - i64::from(bias.0),
            unit_x: t.matrix[0][0],
            unit_y: t.matrix[1][1].to_48_16(),
        })
    }

    fn start(&self) -> Option<Fixed> {
        i32::try_from(self.vx).ok().map(Fixed)
    }

    fn row(&self, j: i32) -> i64 {
        self.vy + i64::from(j) * self.unit_y
    }

    fn x_at(&self, i: usize) -> i64 {
        self.vx + i as i64 * i64::from(self.unit_x.0)
    }
}

fn write_line<K: ScanlineKernels>(info: &mut CompositeInfo<'_>, j: i32, line: &[u32]) {
    let x = info.dest_x as usize;
    let row = &mut info.dest.row_mut(info.dest_y + j)[x..x + line.len()];
    match info.op {
        Operator::Src => row.copy_from_slice(line),
        _ => K::over(row, line),
    }
}

#[inline]
fn texel(row: Option<&[u32]>, repeat: Repeat, x: i64, width: i32) -> u32 {
    match (row, repeat.resolve((x >> 16) as i32, width)) {
        (Some(row), Some(x)) => row[x as usize],
        _ => 0,
    }
}

/// Nearest-neighbour scaling of a 32-bit source, `SRC` or `OVER`.
pub(crate) fn scaled_nearest<K: ScanlineKernels>(
    toplevel: &Implementation,
    info: &mut CompositeInfo<'_>,
) {
    let src = info.src;
    let (Some(bits), Some(walk)) = (src.bits(), Walk::new(info, Fixed::EPSILON)) else {
        return general_composite(toplevel, info);
    };
    let Some(vx) = walk.start() else {
        return general_composite(toplevel, info);
    };
    debug_assert!(matches!(info.op, Operator::Src | Operator::Over));
    let repeat = src.repeat();
    let width = info.width as usize;
    let limit = i64::from(bits.width) << 16;
    let runs = scanline_runs(limit, vx, walk.unit_x, width);

    let mut line: Scanline = smallvec![0; width];
    for j in 0..info.height {
        let row = repeat
            .resolve((walk.row(j) >> 16) as i32, bits.height)
            .map(|y| bits.row(y));
        match row {
            None => line.fill(0),
            Some(row) => {
                let (left, rest) = line.split_at_mut(runs.left);
                let (middle, right) = rest.split_at_mut(runs.middle);
                for (i, px) in left.iter_mut().enumerate() {
                    *px = texel(Some(row), repeat, walk.x_at(i), bits.width);
                }
                nearest_scanline(middle, row, Fixed(walk.x_at(runs.left) as i32), walk.unit_x);
                let skip = runs.left + runs.middle;
                for (i, px) in right.iter_mut().enumerate() {
                    *px = texel(Some(row), repeat, walk.x_at(skip + i), bits.width);
                }
            }
        }
        write_line::<K>(info, j, &line);
    }
}

/// Bilinear scaling of a 32-bit source, `SRC` or `OVER`.
pub(crate) fn scaled_bilinear<K: ScanlineKernels>(
    toplevel: &Implementation,
    info: &mut CompositeInfo<'_>,
) {
    let src = info.src;
    let (Some(bits), Some(walk)) = (src.bits(), Walk::new(info, Fixed::HALF)) else {
        return general_composite(toplevel, info);
    };
    let Some(vx) = walk.start() else {
        return general_composite(toplevel, info);
    };
    debug_assert!(matches!(info.op, Operator::Src | Operator::Over));
    let repeat = src.repeat();
    let width = info.width as usize;
    let limit = i64::from(bits.width - 1) << 16;
    let runs = scanline_runs(limit, vx, walk.unit_x, width);
    let zeros: Scanline = smallvec![0; bits.width as usize + 1];

    let mut line: Scanline = smallvec![0; width];
    for j in 0..info.height {
        let y = walk.row(j);
        let y1 = (y >> 16) as i32;
        let wb = bilinear_weight(Fixed(y as i32));
        let rows = (
            repeat.resolve(y1, bits.height).map(|y| bits.row(y)),
            repeat.resolve(y1.wrapping_add(1), bits.height).map(|y| bits.row(y)),
        );
        if rows == (None, None) {
            line.fill(0);
        } else {
            fill_bilinear::<K>(&mut line, bits, repeat, &walk, runs, rows, wb, &zeros);
        }
        write_line::<K>(info, j, &line);
    }
}

#[allow(clippy::too_many_arguments)]
fn fill_bilinear<K: ScanlineKernels>(
    line: &mut [u32],
    bits: &Bits<'_>,
    repeat: Repeat,
    walk: &Walk,
    runs: crate::sample::scanline::ScanlineRuns,
    (top, bottom): (Option<&[u32]>, Option<&[u32]>),
    wb: u32,
    zeros: &[u32],
) {
    let edge = |x: i64| {
        let x2 = x + (1 << 16);
        interpolate(
            texel(top, repeat, x, bits.width),
            texel(top, repeat, x2, bits.width),
            texel(bottom, repeat, x, bits.width),
            texel(bottom, repeat, x2, bits.width),
            bilinear_weight(Fixed(x as i32)),
            wb,
        )
    };
    let (left, rest) = line.split_at_mut(runs.left);
    let (middle, right) = rest.split_at_mut(runs.middle);
    for (i, px) in left.iter_mut().enumerate() {
        *px = edge(walk.x_at(i));
    }
    K::bilinear(
        middle,
        top.unwrap_or(zeros),
        bottom.unwrap_or(zeros),
        wb,
        Fixed(walk.x_at(runs.left) as i32),
        walk.unit_x,
    );
    let skip = runs.left + runs.middle;
    for (i, px) in right.iter_mut().enumerate() {
        *px = edge(walk.x_at(skip + i));
    }
}

#[cfg(test)]
#[path = "../../tests/unit/backend/scaled.rs"]
mod tests;
