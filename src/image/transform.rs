use kurbo::Affine;
use serde::{Deserialize, Serialize};

use crate::foundation::error::{PixmixError, PixmixResult};
use crate::foundation::fixed::Fixed;

/// A 3x3 fixed-point matrix mapping destination coordinates to source coordinates.
///
/// Points are column vectors `(x, y, 1)`; row 2 is `(0, 0, 1)` for affine maps.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Transform {
    /// Row-major coefficients.
    pub matrix: [[Fixed; 3]; 3],
}

/// Coarse classification used to pick sampling strategies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransformKind {
    /// No transform.
    Identity,
    /// Axis-aligned scale plus translation (includes pure translation).
    Scale,
    /// Rotation, shear or reflection as well.
    Affine,
    /// Non-trivial bottom row.
    Projective,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    /// The identity matrix.
    pub const IDENTITY: Self = Self {
        matrix: [
            [Fixed::ONE, Fixed::ZERO, Fixed::ZERO],
            [Fixed::ZERO, Fixed::ONE, Fixed::ZERO],
            [Fixed::ZERO, Fixed::ZERO, Fixed::ONE],
        ],
    };

    /// Wrap a row-major matrix as is.
    pub const fn new(matrix: [[Fixed; 3]; 3]) -> Self {
        Self { matrix }
    }

    /// Multiply source coordinates by `sx` and `sy`.
    pub const fn scale(sx: Fixed, sy: Fixed) -> Self {
        Self {
            matrix: [
                [sx, Fixed::ZERO, Fixed::ZERO],
                [Fixed::ZERO, sy, Fixed::ZERO],
                [Fixed::ZERO, Fixed::ZERO, Fixed::ONE],
            ],
        }
    }

    /// Offset source coordinates by `(tx, ty)`.
    pub const fn translate(tx: Fixed, ty: Fixed) -> Self {
        Self {
            matrix: [
                [Fixed::ONE, Fixed::ZERO, tx],
                [Fixed::ZERO, Fixed::ONE, ty],
                [Fixed::ZERO, Fixed::ZERO, Fixed::ONE],
            ],
        }
    }

    /// Convert a floating-point affine map. Coefficients must be finite and inside the
    /// 16.16 range.
    pub fn from_affine(affine: Affine) -> PixmixResult<Self> {
        let [a, b, c, d, e, f] = affine.as_coeffs();
        let fx = |v: f64| -> PixmixResult<Fixed> {
            if !v.is_finite() || v.abs() >= 32768.0 {
                return Err(PixmixError::validation(format!(
                    "transform coefficient {v} is outside the 16.16 range"
                )));
            }
            Ok(Fixed::from_f64(v))
        };
        Ok(Self {
            matrix: [
                [fx(a)?, fx(c)?, fx(e)?],
                [fx(b)?, fx(d)?, fx(f)?],
                [Fixed::ZERO, Fixed::ZERO, Fixed::ONE],
            ],
        })
    }

    /// Sampling transform for an image placed on the destination by `placement`.
    pub fn from_placement(placement: Affine) -> PixmixResult<Self> {
        if placement.determinant().abs() < f64::EPSILON {
            return Err(PixmixError::validation("placement transform is not invertible"));
        }
        Self::from_affine(placement.inverse())
    }

    /// The floating-point equivalent, or `None` for projective matrices.
    pub fn to_affine(&self) -> Option<Affine> {
        if !self.is_affine() {
            return None;
        }
        let m = &self.matrix;
        Some(Affine::new([
            m[0][0].to_f64(),
            m[1][0].to_f64(),
            m[0][1].to_f64(),
            m[1][1].to_f64(),
            m[0][2].to_f64(),
            m[1][2].to_f64(),
        ]))
    }

    /// Exactly the identity.
    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    /// Bottom row is `(0, 0, 1)`.
    pub fn is_affine(&self) -> bool {
        let w = &self.matrix[2];
        w[0] == Fixed::ZERO && w[1] == Fixed::ZERO && w[2] == Fixed::ONE
    }

    /// Classify the matrix.
    pub fn kind(&self) -> TransformKind {
        let m = &self.matrix;
        if self.is_identity() {
            TransformKind::Identity
        } else if !self.is_affine() {
            TransformKind::Projective
        } else if m[0][1] == Fixed::ZERO && m[1][0] == Fixed::ZERO {
            TransformKind::Scale
        } else {
            TransformKind::Affine
        }
    }

    /// Unit scale with whole-pixel offsets: sampling reduces to an index shift.
    pub fn is_integer_translation(&self) -> bool {
        let m = &self.matrix;
        self.kind() == TransformKind::Scale
            && m[0][0] == Fixed::ONE
            && m[1][1] == Fixed::ONE
            && m[0][2].frac() == 0
            && m[1][2].frac() == 0
    }

    /// Multiply a homogeneous 48.16 point, rounding each component to 16 fractional bits.
    ///
    /// Returns `None` if a component does not fit in 48.16.
    pub fn transform_point_3d(&self, v: [i64; 3]) -> Option<[i64; 3]> {
        let mut out = [0i64; 3];
        for (row, slot) in self.matrix.iter().zip(out.iter_mut()) {
            let acc: i128 = row
                .iter()
                .zip(v.iter())
                .map(|(m, &c)| i128::from(m.0) * i128::from(c))
                .sum();
            *slot = i64::try_from((acc + 0x8000) >> 16).ok()?;
        }
        Some(out)
    }

    /// Transform an affine point; the homogeneous row is ignored.
    pub fn transform_point(&self, x: Fixed, y: Fixed) -> Option<(i64, i64)> {
        let [tx, ty, _] = self.transform_point_3d([x.to_48_16(), y.to_48_16(), Fixed::ONE.to_48_16()])?;
        Some((tx, ty))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/image/transform.rs"]
mod tests;
