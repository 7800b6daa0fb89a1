//! Filter configuration and separable-convolution kernel generation.

use serde::{Deserialize, Serialize};

use crate::foundation::error::{PixmixError, PixmixResult};
use crate::foundation::fixed::Fixed;

/// How a transformed source is reconstructed between pixel centres.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterKind {
    /// Nearest pixel centre.
    #[default]
    Nearest,
    /// Weighted 2x2 neighbourhood.
    Bilinear,
    /// Arbitrary `w x h` kernel: params `[w, h, weights...]`.
    Convolution,
    /// Per-axis phase tables: params `[w, h, x_bits, y_bits, x phases..., y phases...]`.
    SeparableConvolution,
}

/// One-dimensional kernels for [`create_separable_convolution`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Kernel {
    /// Dirac delta.
    Impulse,
    /// Unit box.
    Box,
    /// Tent of width two.
    Linear,
    /// Mitchell-Netravali cubic, `B = C = 1/3`.
    Cubic,
    /// Gaussian, sigma `sqrt(2)/2`, cut at five pixels.
    Gaussian,
    /// Two-lobe windowed sinc.
    Lanczos2,
    /// Three-lobe windowed sinc.
    Lanczos3,
    /// Lanczos3 stretched by 4/3.
    Lanczos3Stretched,
}

impl Kernel {
    /// Support width in source pixels.
    pub const fn width(self) -> f64 {
        match self {
            Self::Impulse => 0.0,
            Self::Box => 1.0,
            Self::Linear => 2.0,
            Self::Cubic | Self::Lanczos2 => 4.0,
            Self::Gaussian => 5.0,
            Self::Lanczos3 => 6.0,
            Self::Lanczos3Stretched => 8.0,
        }
    }

    /// Kernel value at `x` pixels from its centre.
    pub fn eval(self, x: f64) -> f64 {
        match self {
            Self::Impulse => {
                if x == 0.0 {
                    1.0
                } else {
                    0.0
                }
            }
            Self::Box => 1.0,
            Self::Linear => 1.0 - x.abs(),
            Self::Cubic => general_cubic(x, 1.0 / 3.0, 1.0 / 3.0),
            Self::Gaussian => {
                let sigma = std::f64::consts::SQRT_2 / 2.0;
                (-x * x / (2.0 * sigma * sigma)).exp()
                    / (sigma * (2.0 * std::f64::consts::PI).sqrt())
            }
            Self::Lanczos2 => lanczos(x, 2.0),
            Self::Lanczos3 => lanczos(x, 3.0),
            Self::Lanczos3Stretched => lanczos(x * 0.75, 3.0),
        }
    }
}

fn sinc(x: f64) -> f64 {
    if x == 0.0 {
        1.0
    } else {
        let px = std::f64::consts::PI * x;
        px.sin() / px
    }
}

fn lanczos(x: f64, n: f64) -> f64 {
    sinc(x) * sinc(x / n)
}

fn general_cubic(x: f64, b: f64, c: f64) -> f64 {
    let ax = x.abs();
    if ax < 1.0 {
        (((12.0 - 9.0 * b - 6.0 * c) * ax + (-18.0 + 12.0 * b + 6.0 * c)) * ax * ax
            + (6.0 - 2.0 * b))
            / 6.0
    } else if ax < 2.0 {
        ((((-b - 6.0 * c) * ax + (6.0 * b + 30.0 * c)) * ax + (-12.0 * b - 48.0 * c)) * ax
            + (8.0 * b + 24.0 * c))
            / 6.0
    } else {
        0.0
    }
}

/// A validated filter: kind plus fixed-point parameters.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Filter {
    kind: FilterKind,
    params: Vec<Fixed>,
}

/// Borrowed view of a `Convolution` parameter block.
#[derive(Clone, Copy, Debug)]
pub(crate) struct ConvolutionParams<'a> {
    pub width: i32,
    pub height: i32,
    pub weights: &'a [Fixed],
}

/// Borrowed view of a `SeparableConvolution` parameter block.
#[derive(Clone, Copy, Debug)]
pub(crate) struct SeparableParams<'a> {
    pub width: i32,
    pub height: i32,
    pub x_phase_bits: u32,
    pub y_phase_bits: u32,
    pub x_weights: &'a [Fixed],
    pub y_weights: &'a [Fixed],
}

const MAX_KERNEL_SIZE: i32 = 0x7fff;

fn kernel_dim(v: Fixed, what: &str) -> PixmixResult<i32> {
    let n = v.to_int();
    if v.frac() != 0 || !(1..=MAX_KERNEL_SIZE).contains(&n) {
        return Err(PixmixError::validation(format!(
            "convolution {what} must be a whole number in 1..={MAX_KERNEL_SIZE}"
        )));
    }
    Ok(n)
}

fn phase_bits(v: Fixed, what: &str) -> PixmixResult<u32> {
    let n = v.to_int();
    if v.frac() != 0 || !(0..=16).contains(&n) {
        return Err(PixmixError::validation(format!(
            "{what} subsample bits must be a whole number in 0..=16"
        )));
    }
    Ok(n as u32)
}

fn expect_len(params: &[Fixed], expected: usize, kind: FilterKind) -> PixmixResult<()> {
    if params.len() != expected {
        return Err(PixmixError::validation(format!(
            "{kind:?} filter expects {expected} parameters, got {}",
            params.len()
        )));
    }
    Ok(())
}

impl Filter {
    /// Validate `params` against `kind` and keep a copy.
    pub fn new(kind: FilterKind, params: &[Fixed]) -> PixmixResult<Self> {
        match kind {
            FilterKind::Nearest | FilterKind::Bilinear => expect_len(params, 0, kind)?,
            FilterKind::Convolution => {
                if params.len() < 2 {
                    return Err(PixmixError::validation(
                        "convolution filter needs width and height",
                    ));
                }
                let w = kernel_dim(params[0], "width")? as usize;
                let h = kernel_dim(params[1], "height")? as usize;
                expect_len(params, 2 + w * h, kind)?;
            }
            FilterKind::SeparableConvolution => {
                if params.len() < 4 {
                    return Err(PixmixError::validation(
                        "separable convolution needs width, height and subsample bits",
                    ));
                }
                let w = kernel_dim(params[0], "width")? as usize;
                let h = kernel_dim(params[1], "height")? as usize;
                let bx = phase_bits(params[2], "x")?;
                let by = phase_bits(params[3], "y")?;
                expect_len(params, 4 + (w << bx) + (h << by), kind)?;
            }
        }

        let mut owned = Vec::new();
        owned.try_reserve_exact(params.len())?;
        owned.extend_from_slice(params);
        Ok(Self {
            kind,
            params: owned,
        })
    }

    /// The filter kind.
    pub fn kind(&self) -> FilterKind {
        self.kind
    }

    /// The parameter block, as given to [`Filter::new`].
    pub fn params(&self) -> &[Fixed] {
        &self.params
    }

    pub(crate) fn convolution(&self) -> Option<ConvolutionParams<'_>> {
        if self.kind != FilterKind::Convolution {
            return None;
        }
        Some(ConvolutionParams {
            width: self.params[0].to_int(),
            height: self.params[1].to_int(),
            weights: &self.params[2..],
        })
    }

    pub(crate) fn separable(&self) -> Option<SeparableParams<'_>> {
        if self.kind != FilterKind::SeparableConvolution {
            return None;
        }
        let width = self.params[0].to_int();
        let height = self.params[1].to_int();
        let x_phase_bits = self.params[2].to_int() as u32;
        let y_phase_bits = self.params[3].to_int() as u32;
        let (x_weights, y_weights) = self.params[4..].split_at((width as usize) << x_phase_bits);
        Some(SeparableParams {
            width,
            height,
            x_phase_bits,
            y_phase_bits,
            x_weights,
            y_weights,
        })
    }
}

/// Integrate `k1(x1 + t) * k2((x2 + t) * scale)` for `t` in `0..width`.
fn integral(k1: Kernel, x1: f64, k2: Kernel, scale: f64, x2: f64, width: f64) -> f64 {
    const SEGMENTS: usize = 12;

    if k1 == Kernel::Box && k2 == Kernel::Box {
        width
    } else if k1 == Kernel::Linear && x1 < 0.0 && x1 + width > 0.0 {
        // The tent is not differentiable at 0; integrate each side separately.
        integral(k1, x1, k2, scale, x2, -x1) + integral(k1, 0.0, k2, scale, x2 - x1, width + x1)
    } else if k2 == Kernel::Linear && x2 < 0.0 && x2 + width > 0.0 {
        integral(k1, x1, k2, scale, x2, -x2) + integral(k1, x1 - x2, k2, scale, 0.0, width + x2)
    } else if k1 == Kernel::Impulse {
        k2.eval(x2 * scale)
    } else if k2 == Kernel::Impulse {
        k1.eval(x1)
    } else {
        let sample = |t: f64| k1.eval(x1 + t) * k2.eval((x2 + t) * scale);
        let h = width / SEGMENTS as f64;
        let mut s = sample(0.0) + sample(width);
        for i in (1..SEGMENTS).step_by(2) {
            s += 4.0 * sample(h * i as f64);
        }
        for i in (2..SEGMENTS).step_by(2) {
            s += 2.0 * sample(h * i as f64);
        }
        h * s / 3.0
    }
}

fn filter_width(reconstruct: Kernel, sample: Kernel, scale: f64) -> usize {
    (reconstruct.width() + scale * sample.width()).ceil() as usize
}

/// Fill `out` (`n_phases * width` weights) with the phase tables for one axis.
fn build_phases(
    out: &mut [Fixed],
    width: usize,
    reconstruct: Kernel,
    sample: Kernel,
    scale: f64,
    n_phases: usize,
) {
    let step = 1.0 / n_phases as f64;
    let rlow = -reconstruct.width() / 2.0;
    let rhigh = rlow + reconstruct.width();

    for (phase, taps) in out.chunks_exact_mut(width).enumerate() {
        let frac = step / 2.0 + phase as f64 * step;
        let x1 = (frac - width as f64 / 2.0 - 0.5).ceil();

        let mut total = 0.0;
        for (i, tap) in taps.iter_mut().enumerate() {
            let pos = x1 + i as f64 + 0.5 - frac;
            let slow = pos - scale * sample.width() / 2.0;
            let shigh = slow + scale * sample.width();
            let mut c = 0.0;
            if rhigh >= slow && rlow <= shigh {
                let ilow = slow.max(rlow);
                let ihigh = shigh.min(rhigh);
                c = integral(reconstruct, ilow, sample, 1.0 / scale, ilow - pos, ihigh - ilow);
            }
            *tap = Fixed((c * 65536.0 + 0.5).floor() as i32);
            total += f64::from(tap.0);
        }

        normalize_phase(taps, total);
    }
}

/// Rescale one phase so its taps sum to exactly one, diffusing the rounding error along the
/// row. Whatever is still missing, all of it when `total` is zero, goes on the first tap.
fn normalize_phase(taps: &mut [Fixed], total: f64) {
    let mut new_total = 0i32;
    if total != 0.0 {
        let norm = 65536.0 / total;
        let mut err = 0.0;
        for tap in taps.iter_mut() {
            let v = f64::from(tap.0) * norm + err;
            let t = (v + 0.5).floor();
            err = v - t;
            tap.0 = t as i32;
            new_total += tap.0;
        }
    } else {
        taps.fill(Fixed::ZERO);
    }
    if new_total != Fixed::ONE.0 {
        taps[0].0 += Fixed::ONE.0 - new_total;
    }
}

/// Build the parameter block for a [`FilterKind::SeparableConvolution`] filter.
///
/// `scale_x`/`scale_y` are the source-pixels-per-destination-pixel factors; the sampling kernel
/// is stretched by them. Each axis gets `1 << subsample_bits` phases, each summing to one.
#[allow(clippy::too_many_arguments)]
#[tracing::instrument(level = "debug")]
pub fn create_separable_convolution(
    scale_x: Fixed,
    scale_y: Fixed,
    reconstruct_x: Kernel,
    reconstruct_y: Kernel,
    sample_x: Kernel,
    sample_y: Kernel,
    subsample_bits_x: u32,
    subsample_bits_y: u32,
) -> PixmixResult<Vec<Fixed>> {
    let sx = scale_x.to_f64().abs();
    let sy = scale_y.to_f64().abs();
    if sx == 0.0 || sy == 0.0 {
        return Err(PixmixError::validation("separable convolution scale must be non-zero"));
    }
    if subsample_bits_x > 16 || subsample_bits_y > 16 {
        return Err(PixmixError::validation("subsample bits must be at most 16"));
    }

    let x_width = filter_width(reconstruct_x, sample_x, sx);
    let y_width = filter_width(reconstruct_y, sample_y, sy);
    if x_width == 0 || y_width == 0 {
        return Err(PixmixError::validation(
            "impulse reconstruction with impulse sampling has no support",
        ));
    }
    if x_width > MAX_KERNEL_SIZE as usize || y_width > MAX_KERNEL_SIZE as usize {
        return Err(PixmixError::validation("separable kernel is too wide"));
    }
    let x_phases = 1usize << subsample_bits_x;
    let y_phases = 1usize << subsample_bits_y;
    let x_len = x_width * x_phases;
    let len = 4 + x_len + y_width * y_phases;

    let mut params = Vec::new();
    params.try_reserve_exact(len)?;
    params.resize(len, Fixed::ZERO);
    params[0] = Fixed::from_int(x_width as i32);
    params[1] = Fixed::from_int(y_width as i32);
    params[2] = Fixed::from_int(subsample_bits_x as i32);
    params[3] = Fixed::from_int(subsample_bits_y as i32);

    let (x_params, y_params) = params[4..].split_at_mut(x_len);
    build_phases(x_params, x_width, reconstruct_x, sample_x, sx, x_phases);
    build_phases(y_params, y_width, reconstruct_y, sample_y, sy, y_phases);

    tracing::debug!(x_width, y_width, x_phases, y_phases, "built separable kernel");
    Ok(params)
}

#[cfg(test)]
#[path = "../../tests/unit/image/filter.rs"]
mod tests;
