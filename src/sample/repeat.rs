use serde::{Deserialize, Serialize};

/// Edge extension: what a sample outside the image returns.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Repeat {
    /// Transparent black outside the image.
    #[default]
    None,
    /// Clamp to the nearest edge pixel.
    Pad,
    /// Mirror, with period `2 * size`.
    Reflect,
    /// Tile, with period `size`.
    Normal,
}

impl Repeat {
    /// Map a sample index on an axis of `size` pixels to an in-range index, or `None` for a
    /// transparent sample.
    #[inline]
    pub fn resolve(self, i: i32, size: i32) -> Option<i32> {
        if size <= 0 {
            return None;
        }
        match self {
            Self::None => (0..size).contains(&i).then_some(i),
            Self::Pad => Some(i.clamp(0, size - 1)),
            Self::Normal => Some(i.rem_euclid(size)),
            Self::Reflect => {
                let period = size * 2;
                let m = i.rem_euclid(period);
                Some(if m < size { m } else { period - 1 - m })
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/sample/repeat.rs"]
mod tests;
