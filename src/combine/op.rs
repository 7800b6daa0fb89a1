use serde::{Deserialize, Serialize};

use crate::foundation::error::PixmixError;

/// Compositing operators.
///
/// The first fourteen are the Porter-Duff set plus `Add` and `Saturate`; the rest are the
/// separable blend modes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    /// Result is transparent.
    Clear,
    /// Source replaces destination.
    Src,
    /// Destination is left alone.
    Dst,
    /// Source over destination.
    Over,
    /// Destination over source.
    OverReverse,
    /// Source where the destination is.
    In,
    /// Destination where the source is.
    InReverse,
    /// Source where the destination is not.
    Out,
    /// Destination where the source is not.
    OutReverse,
    /// Source atop destination.
    Atop,
    /// Destination atop source.
    AtopReverse,
    /// Source and destination where the other is not.
    Xor,
    /// Per-channel saturating sum.
    Add,
    /// Source scaled down to fit the room left in the destination alpha.
    Saturate,
    /// `s * d` plus the uncovered parts.
    Multiply,
    /// `s + d - s * d`.
    Screen,
    /// Multiply or screen, picked by the destination.
    Overlay,
    /// Per-channel minimum.
    Darken,
    /// Per-channel maximum.
    Lighten,
    /// `|s - d|`.
    Difference,
    /// `s + d - 2 * s * d`.
    Exclusion,
}

impl Operator {
    /// Every operator, in declaration order.
    pub const ALL: [Operator; 21] = [
        Operator::Clear,
        Operator::Src,
        Operator::Dst,
        Operator::Over,
        Operator::OverReverse,
        Operator::In,
        Operator::InReverse,
        Operator::Out,
        Operator::OutReverse,
        Operator::Atop,
        Operator::AtopReverse,
        Operator::Xor,
        Operator::Add,
        Operator::Saturate,
        Operator::Multiply,
        Operator::Screen,
        Operator::Overlay,
        Operator::Darken,
        Operator::Lighten,
        Operator::Difference,
        Operator::Exclusion,
    ];

    /// Whether this is one of the separable blend modes (`Multiply` onwards).
    pub const fn is_blend_mode(self) -> bool {
        matches!(
            self,
            Self::Multiply
                | Self::Screen
                | Self::Overlay
                | Self::Darken
                | Self::Lighten
                | Self::Difference
                | Self::Exclusion
        )
    }

    /// The cheapest operator with bit-identical results when the source (including the mask)
    /// and/or the destination are known to be opaque.
    pub const fn reduce(self, src_opaque: bool, dst_opaque: bool) -> Self {
        use Operator::*;
        match (self, src_opaque, dst_opaque) {
            (Over, true, _) => Src,
            (OverReverse, _, true) => Dst,
            (In, _, true) => Src,
            (InReverse, true, _) => Dst,
            (Out, _, true) => Clear,
            (OutReverse, true, _) => Clear,
            (Atop, true, true) => Src,
            (Atop, true, false) => In,
            (Atop, false, true) => Over,
            (AtopReverse, true, true) => Dst,
            (AtopReverse, true, false) => OverReverse,
            (AtopReverse, false, true) => InReverse,
            (Xor, true, true) => Clear,
            (Xor, true, false) => Out,
            (Xor, false, true) => OutReverse,
            (Saturate, true, true) => Dst,
            (Saturate, true, false) => OverReverse,
            (op, _, _) => op,
        }
    }

    /// Lowercase snake-case name, as accepted by `FromStr`.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Clear => "clear",
            Self::Src => "src",
            Self::Dst => "dst",
            Self::Over => "over",
            Self::OverReverse => "over_reverse",
            Self::In => "in",
            Self::InReverse => "in_reverse",
            Self::Out => "out",
            Self::OutReverse => "out_reverse",
            Self::Atop => "atop",
            Self::AtopReverse => "atop_reverse",
            Self::Xor => "xor",
            Self::Add => "add",
            Self::Saturate => "saturate",
            Self::Multiply => "multiply",
            Self::Screen => "screen",
            Self::Overlay => "overlay",
            Self::Darken => "darken",
            Self::Lighten => "lighten",
            Self::Difference => "difference",
            Self::Exclusion => "exclusion",
        }
    }
}

impl std::str::FromStr for Operator {
    type Err = PixmixError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|op| op.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| PixmixError::validation(format!("unknown operator '{s}'")))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/combine/op.rs"]
mod tests;
