//! 8-bit channel arithmetic on premultiplied pixels.
//!
//! The scalar forms work on one channel at a time; the `un8x4_*` forms work on a whole
//! `0xAARRGGBB` word at once by splitting it into two 0x00ff00ff lane pairs. Both forms are
//! bit-identical, which is what lets the specialized backends agree with the reference combiner.

const RB_MASK: u32 = 0x00ff_00ff;
const RB_ONE_HALF: u32 = 0x0080_0080;
const RB_MASK_PLUS_ONE: u32 = 0x1000_0100;

/// `round(a * b / 255)` for `a, b <= 255`.
#[inline]
pub(crate) const fn mul_div255(a: u32, b: u32) -> u32 {
    let t = a * b + 0x80;
    ((t >> 8) + t) >> 8
}

/// `round(a * 255 / b)`; callers guarantee `b != 0`.
#[inline]
pub(crate) const fn div_un8(a: u32, b: u32) -> u32 {
    (a * 0xff + (b >> 1)) / b
}

#[inline]
pub(crate) const fn add_sat_un8(a: u32, b: u32) -> u32 {
    let t = a + b;
    if t > 0xff { 0xff } else { t }
}

/// Divide a `0..=255*255` product sum by 255 with rounding.
#[inline]
pub(crate) const fn div_one_un8(x: u32) -> u32 {
    (x + 0x80 + ((x + 0x80) >> 8)) >> 8
}

#[inline]
pub(crate) const fn alpha(p: u32) -> u32 {
    p >> 24
}

#[inline]
const fn rb_mul_un8(x: u32, a: u32) -> u32 {
    let t = (x & RB_MASK) * a + RB_ONE_HALF;
    ((t + ((t >> 8) & RB_MASK)) >> 8) & RB_MASK
}

#[inline]
const fn rb_add_sat(x: u32, y: u32) -> u32 {
    let t = x + y;
    let t = t | (RB_MASK_PLUS_ONE - ((t >> 8) & RB_MASK));
    t & RB_MASK
}

/// Every channel of `x` times `a / 255`.
#[inline]
pub(crate) const fn un8x4_mul_un8(x: u32, a: u32) -> u32 {
    rb_mul_un8(x, a) | (rb_mul_un8(x >> 8, a) << 8)
}

/// Per-channel saturating add.
#[inline]
pub(crate) const fn un8x4_add_sat(x: u32, y: u32) -> u32 {
    rb_add_sat(x & RB_MASK, y & RB_MASK) | (rb_add_sat((x >> 8) & RB_MASK, (y >> 8) & RB_MASK) << 8)
}

/// `x * a + y`, per channel, saturating.
#[inline]
pub(crate) const fn un8x4_mul_un8_add(x: u32, a: u32, y: u32) -> u32 {
    un8x4_add_sat(un8x4_mul_un8(x, a), y)
}

/// Premultiplied OVER of one pixel.
#[inline]
pub(crate) const fn over_un8x4(src: u32, dst: u32) -> u32 {
    un8x4_mul_un8_add(dst, 0xff - alpha(src), src)
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/math.rs"]
mod tests;
