//! Portable fast paths built on packed-lane (two channels per 32-bit word) arithmetic.

use crate::backend::general::general_composite;
use crate::backend::scaled::{ScanlineKernels, fast_path_table};
use crate::combine::op::Operator;
use crate::composite::CompositeInfo;
use crate::dispatch::fast_path::{FastPath, FormatPattern};
use crate::dispatch::flags::PathFlags;
use crate::dispatch::implementation::Implementation;
use crate::foundation::fixed::Fixed;
use crate::foundation::math::{alpha, over_un8x4, un8x4_add_sat, un8x4_mul_un8};
use crate::image::format::{PixelFormat, expand_0565, pack_0565};
use crate::image::model::Bits;
use crate::sample::scanline::bilinear_weight;

use FormatPattern::{Exact, IgnoringAlpha};
use PixelFormat::*;

const STD: PathFlags = PathFlags::STANDARD_SOURCE;

/// Packed-lane scanline kernels.
pub(crate) struct Portable;

impl ScanlineKernels for Portable {
    fn over(dest: &mut [u32], src: &[u32]) {
        over_run(dest, src);
    }

    fn bilinear(out: &mut [u32], top: &[u32], bottom: &[u32], wb: u32, mut vx: Fixed, unit_x: Fixed) {
        for px in out {
            let x = vx.to_int() as usize;
            *px = bilinear_pixel(
                [top[x], top[x + 1], bottom[x], bottom[x + 1]],
                bilinear_weight(vx),
                wb,
            );
            vx += unit_x;
        }
    }
}

fast_path_table!(Portable;
    FastPath::unmasked(Operator::Over, Exact(A8R8G8B8), STD, IgnoringAlpha(A8R8G8B8), over_8888_8888),
    FastPath::unmasked(Operator::Over, Exact(A8B8G8R8), STD, IgnoringAlpha(A8B8G8R8), over_8888_8888),
    FastPath::unmasked(Operator::Over, Exact(A8R8G8B8), STD, Exact(R5G6B5), over_8888_0565),
    FastPath::solid_masked(Operator::Over, A8, IgnoringAlpha(A8R8G8B8), over_n_8_8888),
    FastPath::solid_masked(Operator::Over, A8, IgnoringAlpha(A8B8G8R8), over_n_8_8888),
    FastPath::unmasked(Operator::Add, Exact(A8R8G8B8), STD, Exact(A8R8G8B8), add_8888_8888),
    FastPath::unmasked(Operator::Add, Exact(A8B8G8R8), STD, Exact(A8B8G8R8), add_8888_8888),
    FastPath::unmasked(Operator::Add, Exact(A8), STD, Exact(A8), add_8_8),
    FastPath::unmasked(Operator::Src, Exact(X8R8G8B8), STD, Exact(A8R8G8B8), src_x888_8888),
    FastPath::unmasked(Operator::Src, Exact(X8B8G8R8), STD, Exact(A8B8G8R8), src_x888_8888),
    FastPath::unmasked(Operator::Src, Exact(A8R8G8B8), STD, IgnoringAlpha(A8R8G8B8), src_copy_32),
    FastPath::unmasked(Operator::Src, Exact(A8B8G8R8), STD, IgnoringAlpha(A8B8G8R8), src_copy_32),
    FastPath::unmasked(Operator::Src, Exact(B8G8R8A8), STD, IgnoringAlpha(B8G8R8A8), src_copy_32),
    FastPath::unmasked(Operator::Src, Exact(R8G8B8A8), STD, IgnoringAlpha(R8G8B8A8), src_copy_32),
    FastPath::unmasked(Operator::Src, Exact(X8R8G8B8), STD, Exact(X8R8G8B8), src_copy_32),
    FastPath::unmasked(Operator::Src, Exact(X8B8G8R8), STD, Exact(X8B8G8R8), src_copy_32),
    FastPath::unmasked(Operator::Src, Exact(B8G8R8X8), STD, Exact(B8G8R8X8), src_copy_32),
    FastPath::unmasked(Operator::Src, Exact(R8G8B8X8), STD, Exact(R8G8B8X8), src_copy_32),
    FastPath::unmasked(Operator::Src, Exact(R5G6B5), STD, Exact(R5G6B5), src_copy_packed),
    FastPath::unmasked(Operator::Src, Exact(A8), STD, Exact(A8), src_copy_packed),
);

#[inline]
pub(crate) fn over_pixel(s: u32, d: u32) -> u32 {
    match alpha(s) {
        0xff => s,
        0 if s == 0 => d,
        _ => over_un8x4(s, d),
    }
}

pub(crate) fn over_run(dest: &mut [u32], src: &[u32]) {
    for (d, &s) in dest.iter_mut().zip(src) {
        *d = over_pixel(s, *d);
    }
}

pub(crate) fn add_run(dest: &mut [u32], src: &[u32]) {
    for (d, &s) in dest.iter_mut().zip(src) {
        *d = un8x4_add_sat(s, *d);
    }
}

/// Bilinear blend of `[tl, tr, bl, br]` with two channels per 64-bit word, 32 bits apart.
#[inline]
pub(crate) fn bilinear_pixel(corners: [u32; 4], wx: u32, wy: u32) -> u32 {
    const LANES: u64 = 0x0000_00ff_0000_00ff;
    let weights = [
        (128 - wx) * (128 - wy),
        wx * (128 - wy),
        (128 - wx) * wy,
        wx * wy,
    ];
    // Blue and red in `even`, green and alpha in `odd`.
    let (mut even, mut odd) = (0u64, 0u64);
    for (p, w) in corners.into_iter().zip(weights) {
        let p = u64::from(p);
        let w = u64::from(w);
        even += ((p | (p << 16)) & LANES) * w;
        odd += (((p >> 8) | (p << 8)) & LANES) * w;
    }
    let even = (even >> 14) & LANES;
    let odd = (odd >> 14) & LANES;
    (even as u32) | ((even >> 16) as u32) | ((odd as u32) << 8) | ((odd >> 8) as u32)
}

/// Rows `[x, x + w)` of an untransformed 32-bit source and destination, row by row.
fn for_each_row_32(
    toplevel: &Implementation,
    info: &mut CompositeInfo<'_>,
    mut kernel: impl FnMut(&mut [u32], &[u32]),
) {
    let src = info.src;
    let Some(bits) = src.bits() else {
        return general_composite(toplevel, info);
    };
    let (w, sx, dx) = (info.width as usize, info.src_x as usize, info.dest_x as usize);
    for j in 0..info.height {
        let s = &bits.row(info.src_y + j)[sx..sx + w];
        let d = &mut info.dest.row_mut(info.dest_y + j)[dx..dx + w];
        kernel(d, s);
    }
}

fn over_8888_8888(toplevel: &Implementation, info: &mut CompositeInfo<'_>) {
    for_each_row_32(toplevel, info, over_run);
}

fn add_8888_8888(toplevel: &Implementation, info: &mut CompositeInfo<'_>) {
    for_each_row_32(toplevel, info, add_run);
}

fn src_x888_8888(toplevel: &Implementation, info: &mut CompositeInfo<'_>) {
    for_each_row_32(toplevel, info, |d, s| {
        for (d, &s) in d.iter_mut().zip(s) {
            *d = s | 0xff00_0000;
        }
    });
}

fn src_copy_32(toplevel: &Implementation, info: &mut CompositeInfo<'_>) {
    for_each_row_32(toplevel, info, |d, s| d.copy_from_slice(s));
}

/// Visit every pixel of an untransformed source and the destination as raw values.
fn for_each_pixel(
    toplevel: &Implementation,
    info: &mut CompositeInfo<'_>,
    mut kernel: impl FnMut(&Bits<'_>, i32, i32, u32) -> Option<u32>,
) {
    let src = info.src;
    let Some(bits) = src.bits() else {
        return general_composite(toplevel, info);
    };
    for j in 0..info.height {
        for i in 0..info.width {
            let (dx, dy) = (info.dest_x + i, info.dest_y + j);
            let d = info.dest.fetch_raw(dx, dy);
            if let Some(v) = kernel(bits, info.src_x + i, info.src_y + j, d) {
                info.dest.store_raw(dx, dy, v);
            }
        }
    }
}

fn src_copy_packed(toplevel: &Implementation, info: &mut CompositeInfo<'_>) {
    for_each_pixel(toplevel, info, |bits, x, y, _| Some(bits.fetch_raw(x, y)));
}

fn add_8_8(toplevel: &Implementation, info: &mut CompositeInfo<'_>) {
    for_each_pixel(toplevel, info, |bits, x, y, d| {
        let s = bits.fetch_raw(x, y);
        (s != 0).then(|| (s + d).min(0xff))
    });
}

fn over_8888_0565(toplevel: &Implementation, info: &mut CompositeInfo<'_>) {
    for_each_pixel(toplevel, info, |bits, x, y, d| {
        let s = bits.fetch_raw(x, y);
        match alpha(s) {
            0xff => Some(pack_0565(s)),
            0 if s == 0 => None,
            _ => Some(pack_0565(over_un8x4(s, expand_0565(d)))),
        }
    });
}

/// A solid ARGB colour in the byte order of a 32-bit destination.
pub(crate) fn solid_in_order(format: PixelFormat, argb: u32) -> u32 {
    match format {
        A8B8G8R8 | X8B8G8R8 => A8B8G8R8.from_argb(argb),
        _ => argb,
    }
}

fn over_n_8_8888(toplevel: &Implementation, info: &mut CompositeInfo<'_>) {
    let (src, mask) = (info.src, info.mask);
    let (Some(color), Some(mask)) = (src.solid_color(), mask.and_then(|m| m.bits())) else {
        return general_composite(toplevel, info);
    };
    let color = solid_in_order(info.dest.format, color);
    if color == 0 {
        return;
    }
    let dx = info.dest_x as usize;
    for j in 0..info.height {
        let row = &mut info.dest.row_mut(info.dest_y + j)[dx..dx + info.width as usize];
        for (i, d) in row.iter_mut().enumerate() {
            let m = mask.fetch_raw(info.mask_x + i as i32, info.mask_y + j);
            *d = match m {
                0 => continue,
                0xff => over_pixel(color, *d),
                m => over_un8x4(un8x4_mul_un8(color, m), *d),
            };
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/backend/fast.rs"]
mod tests;
