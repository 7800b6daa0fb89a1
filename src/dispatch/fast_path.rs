//! Fast-path tables.
//!
//! A backend publishes a static slice of [`FastPath`] entries. Lookup walks the slice in
//! order and the first entry whose patterns all match the composite wins, so more specific
//! entries go first.

use crate::combine::op::Operator;
use crate::composite::CompositeInfo;
use crate::dispatch::flags::{FormatCode, PathFlags};
use crate::dispatch::implementation::Implementation;
use crate::image::format::PixelFormat;

/// A composite routine. The first argument is the head of the chain the call was resolved
/// through, used for combiner lookup.
pub(crate) type CompositeFn = fn(&Implementation, &mut CompositeInfo<'_>);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum OpPattern {
    Any,
    Is(Operator),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum FormatPattern {
    /// Matches every operand, including a missing mask.
    Any,
    Null,
    Solid,
    Exact(PixelFormat),
    /// Matches the format or its alpha twin. For destinations whose alpha a path leaves
    /// untouched.
    IgnoringAlpha(PixelFormat),
}

impl OpPattern {
    fn matches(self, op: Operator) -> bool {
        match self {
            Self::Any => true,
            Self::Is(want) => want == op,
        }
    }
}

impl FormatPattern {
    fn matches(self, code: FormatCode) -> bool {
        match (self, code) {
            (Self::Any, _) => true,
            (Self::Null, FormatCode::Null) => true,
            (Self::Solid, FormatCode::Solid) => true,
            (Self::Exact(want), FormatCode::Bits(f)) => want == f,
            (Self::IgnoringAlpha(want), FormatCode::Bits(f)) => want.is_alpha_interchangeable(f),
            _ => false,
        }
    }
}

/// The operator, operand codes and operand flags a composite is dispatched on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PathKey {
    /// The operator after opacity reduction.
    pub op: Operator,
    /// Source operand.
    pub src: FormatCode,
    /// Source capabilities for this composite rectangle.
    pub src_flags: PathFlags,
    /// Mask operand, [`FormatCode::Null`] without a mask.
    pub mask: FormatCode,
    /// Mask capabilities, empty without a mask.
    pub mask_flags: PathFlags,
    /// Destination operand, always [`FormatCode::Bits`].
    pub dest: FormatCode,
    /// Destination capabilities.
    pub dest_flags: PathFlags,
}

#[derive(Clone, Copy)]
pub(crate) struct FastPath {
    pub op: OpPattern,
    pub src: FormatPattern,
    pub src_flags: PathFlags,
    pub mask: FormatPattern,
    pub mask_flags: PathFlags,
    pub dest: FormatPattern,
    pub dest_flags: PathFlags,
    pub func: CompositeFn,
}

impl std::fmt::Debug for FastPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FastPath")
            .field("op", &self.op)
            .field("src", &self.src)
            .field("mask", &self.mask)
            .field("dest", &self.dest)
            .finish_non_exhaustive()
    }
}

impl FastPath {
    /// An entry without a mask.
    pub const fn unmasked(
        op: Operator,
        src: FormatPattern,
        src_flags: PathFlags,
        dest: FormatPattern,
        func: CompositeFn,
    ) -> Self {
        Self {
            op: OpPattern::Is(op),
            src,
            src_flags,
            mask: FormatPattern::Null,
            mask_flags: PathFlags::empty(),
            dest,
            dest_flags: PathFlags::empty(),
            func,
        }
    }

    /// An entry with a solid source, an untransformed mask and any destination flags.
    pub const fn solid_masked(
        op: Operator,
        mask: PixelFormat,
        dest: FormatPattern,
        func: CompositeFn,
    ) -> Self {
        Self {
            op: OpPattern::Is(op),
            src: FormatPattern::Solid,
            src_flags: PathFlags::empty(),
            mask: FormatPattern::Exact(mask),
            mask_flags: PathFlags::STANDARD_SOURCE,
            dest,
            dest_flags: PathFlags::empty(),
            func,
        }
    }

    /// A catch-all entry.
    pub const fn any(func: CompositeFn) -> Self {
        Self {
            op: OpPattern::Any,
            src: FormatPattern::Any,
            src_flags: PathFlags::empty(),
            mask: FormatPattern::Any,
            mask_flags: PathFlags::empty(),
            dest: FormatPattern::Any,
            dest_flags: PathFlags::empty(),
            func,
        }
    }

    pub fn matches(&self, key: &PathKey) -> bool {
        self.op.matches(key.op)
            && self.src.matches(key.src)
            && key.src_flags.contains(self.src_flags)
            && self.mask.matches(key.mask)
            && key.mask_flags.contains(self.mask_flags)
            && self.dest.matches(key.dest)
            && key.dest_flags.contains(self.dest_flags)
    }
}

/// First entry of `table` matching `key`.
pub(crate) fn find(table: &[FastPath], key: &PathKey) -> Option<CompositeFn> {
    table.iter().find(|path| path.matches(key)).map(|path| path.func)
}

#[cfg(test)]
#[path = "../../tests/unit/dispatch/fast_path.rs"]
mod tests;
