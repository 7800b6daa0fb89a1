//! Per-scanline source fetching for the general path.
//!
//! Handles every image kind, transform class and filter. Samples are taken at destination
//! pixel centres mapped through the image transform; out-of-image samples go through the
//! image's edge extension.

use crate::foundation::fixed::Fixed;
use crate::image::filter::{ConvolutionParams, FilterKind, SeparableParams};
use crate::image::model::{Bits, Image, ImageKind};
use crate::image::transform::Transform;
use crate::sample::repeat::Repeat;
use crate::sample::scanline::{bilinear_weight, interpolate};

/// Fill `out` with the ARGB samples for destination-space pixels `(x + i, y)`.
pub(crate) fn fetch_scanline(image: &Image<'_>, x: i32, y: i32, out: &mut [u32]) {
    let bits = match image.kind() {
        ImageKind::Solid(c) => {
            out.fill(*c);
            return;
        }
        ImageKind::Bits(b) => b,
    };
    let sampler = Sampler {
        bits,
        repeat: image.repeat(),
        filter: image.filter().kind(),
        convolution: image.filter().convolution(),
        separable: image.filter().separable(),
    };

    match image.transform() {
        None if matches!(sampler.filter, FilterKind::Nearest | FilterKind::Bilinear) => {
            sampler.fetch_untransformed(x, y, out);
        }
        None => sampler.fetch_affine(&Transform::IDENTITY, x, y, out),
        Some(t) if t.is_affine() => sampler.fetch_affine(t, x, y, out),
        Some(t) => sampler.fetch_projective(t, x, y, out),
    }
}

fn centre(i: i32) -> i64 {
    (i64::from(i) << 16) + i64::from(Fixed::HALF.0)
}

/// Saturate a 48.16 coordinate into 16.16.
fn clamp_fixed(v: i64) -> Fixed {
    Fixed(v.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32)
}

struct Sampler<'i, 'a> {
    bits: &'i Bits<'a>,
    repeat: Repeat,
    filter: FilterKind,
    convolution: Option<ConvolutionParams<'i>>,
    separable: Option<SeparableParams<'i>>,
}

impl Sampler<'_, '_> {
    #[inline]
    fn texel(&self, x: i32, y: i32) -> u32 {
        match (
            self.repeat.resolve(x, self.bits.width),
            self.repeat.resolve(y, self.bits.height),
        ) {
            (Some(x), Some(y)) => self.bits.fetch_argb(x, y),
            _ => 0,
        }
    }

    fn fetch_untransformed(&self, x: i32, y: i32, out: &mut [u32]) {
        let b = self.bits;
        if b.contains(i64::from(x), i64::from(y), out.len() as i64, 1) {
            b.fetch_argb_run(x, y, out);
            return;
        }
        for (i, px) in out.iter_mut().enumerate() {
            *px = self.texel(x.wrapping_add(i as i32), y);
        }
    }

    fn fetch_affine(&self, t: &Transform, x: i32, y: i32, out: &mut [u32]) {
        let Some([mut vx, mut vy, _]) = t.transform_point_3d([centre(x), centre(y), 1 << 16])
        else {
            out.fill(0);
            return;
        };
        let ux = t.matrix[0][0].to_48_16();
        let uy = t.matrix[1][0].to_48_16();
        for px in out.iter_mut() {
            *px = self.sample(clamp_fixed(vx), clamp_fixed(vy));
            vx += ux;
            vy += uy;
        }
    }

    fn fetch_projective(&self, t: &Transform, x: i32, y: i32, out: &mut [u32]) {
        let cy = centre(y);
        for (i, px) in out.iter_mut().enumerate() {
            let cx = centre(x) + ((i as i64) << 16);
            *px = match t.transform_point_3d([cx, cy, 1 << 16]) {
                Some([vx, vy, w]) if w != 0 => {
                    let sx = (i128::from(vx) << 16) / i128::from(w);
                    let sy = (i128::from(vy) << 16) / i128::from(w);
                    let narrow = |v: i128| clamp_fixed(v.clamp(i64::MIN.into(), i64::MAX.into()) as i64);
                    self.sample(narrow(sx), narrow(sy))
                }
                _ => 0,
            };
        }
    }

    fn sample(&self, x: Fixed, y: Fixed) -> u32 {
        match self.filter {
            FilterKind::Nearest => self.nearest(x, y),
            FilterKind::Bilinear => self.bilinear(x, y),
            FilterKind::Convolution => match self.convolution {
                Some(p) => self.convolve(p, x, y),
                None => self.nearest(x, y),
            },
            FilterKind::SeparableConvolution => match self.separable {
                Some(p) => self.convolve_separable(p, x, y),
                None => self.nearest(x, y),
            },
        }
    }

    fn nearest(&self, x: Fixed, y: Fixed) -> u32 {
        self.texel((x - Fixed::EPSILON).to_int(), (y - Fixed::EPSILON).to_int())
    }

    fn bilinear(&self, x: Fixed, y: Fixed) -> u32 {
        let x = x - Fixed::HALF;
        let y = y - Fixed::HALF;
        let (x1, y1) = (x.to_int(), y.to_int());
        let (x2, y2) = (x1.wrapping_add(1), y1.wrapping_add(1));
        interpolate(
            self.texel(x1, y1),
            self.texel(x2, y1),
            self.texel(x1, y2),
            self.texel(x2, y2),
            bilinear_weight(x),
            bilinear_weight(y),
        )
    }

    fn convolve(&self, p: ConvolutionParams<'_>, x: Fixed, y: Fixed) -> u32 {
        let x_off = Fixed((Fixed::from_int(p.width).0 - Fixed::ONE.0) >> 1);
        let y_off = Fixed((Fixed::from_int(p.height).0 - Fixed::ONE.0) >> 1);
        let x1 = (x - Fixed::EPSILON - x_off).to_int();
        let y1 = (y - Fixed::EPSILON - y_off).to_int();

        let mut acc = [0i64; 4];
        let mut weights = p.weights.iter();
        for j in 0..p.height {
            for i in 0..p.width {
                let Some(&f) = weights.next() else { break };
                if f.0 != 0 {
                    accumulate(&mut acc, self.texel(x1 + i, y1 + j), i64::from(f.0));
                }
            }
        }
        finish(acc)
    }

    fn convolve_separable(&self, p: SeparableParams<'_>, x: Fixed, y: Fixed) -> u32 {
        let x_shift = 16 - p.x_phase_bits;
        let y_shift = 16 - p.y_phase_bits;
        // Snap to the centre of the nearest phase so the tables line up.
        let x = Fixed(((x.0 >> x_shift) << x_shift) + ((1 << x_shift) >> 1));
        let y = Fixed(((y.0 >> y_shift) << y_shift) + ((1 << y_shift) >> 1));
        let px = (x.frac() >> x_shift) as usize;
        let py = (y.frac() >> y_shift) as usize;

        let x_off = Fixed((Fixed::from_int(p.width).0 - Fixed::ONE.0) >> 1);
        let y_off = Fixed((Fixed::from_int(p.height).0 - Fixed::ONE.0) >> 1);
        let x1 = (x - Fixed::EPSILON - x_off).to_int();
        let y1 = (y - Fixed::EPSILON - y_off).to_int();

        let (cw, ch) = (p.width as usize, p.height as usize);
        let x_taps = &p.x_weights[px * cw..(px + 1) * cw];
        let y_taps = &p.y_weights[py * ch..(py + 1) * ch];

        let mut acc = [0i64; 4];
        for (j, fy) in y_taps.iter().enumerate() {
            if fy.0 == 0 {
                continue;
            }
            for (i, fx) in x_taps.iter().enumerate() {
                if fx.0 == 0 {
                    continue;
                }
                let f = (i64::from(fx.0) * i64::from(fy.0) + 0x8000) >> 16;
                accumulate(&mut acc, self.texel(x1 + i as i32, y1 + j as i32), f);
            }
        }
        finish(acc)
    }
}

#[inline]
fn accumulate(acc: &mut [i64; 4], px: u32, f: i64) {
    for (k, slot) in acc.iter_mut().enumerate() {
        *slot += i64::from((px >> (k * 8)) & 0xff) * f;
    }
}

#[inline]
fn finish(acc: [i64; 4]) -> u32 {
    acc.iter().enumerate().fold(0, |out, (k, &sum)| {
        out | ((((sum + 0x8000) >> 16).clamp(0, 0xff) as u32) << (k * 8))
    })
}

#[cfg(test)]
#[path = "../../tests/unit/sample/fetch.rs"]
mod tests;
