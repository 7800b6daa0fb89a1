use crate::combine::op::Operator;
use crate::composite::CompositeInfo;
use crate::dispatch::fast_path::{FastPath, OpPattern};
use crate::dispatch::implementation::Implementation;

pub(crate) static FAST_PATHS: &[FastPath] = &[FastPath {
    op: OpPattern::Is(Operator::Dst),
    ..FastPath::any(noop_composite)
}];

/// `DST` leaves the destination as it is.
fn noop_composite(_toplevel: &Implementation, _info: &mut CompositeInfo<'_>) {}
