//! Fetch, combine, store.

use smallvec::smallvec;

use crate::backend::Scanline;
use crate::composite::CompositeInfo;
use crate::dispatch::fast_path::FastPath;
use crate::dispatch::implementation::Implementation;
use crate::sample::fetch::fetch_scanline;

pub(crate) static FAST_PATHS: &[FastPath] = &[FastPath::any(general_composite)];

/// Composite any operator, format, transform and filter one scanline at a time.
///
/// Source and mask rows are sampled into ARGB scratch, the destination row is expanded to
/// ARGB, combined with the chain's combiner for the operator and narrowed back.
pub(crate) fn general_composite(toplevel: &Implementation, info: &mut CompositeInfo<'_>) {
    let width = info.width as usize;
    let combine = toplevel.lookup_combiner(info.op);
    let (src, mask) = (info.src, info.mask);

    let mut src_line: Scanline = smallvec![0; width];
    let mut mask_line: Option<Scanline> = mask.map(|_| smallvec![0; width]);
    let mut dest_line: Scanline = smallvec![0; width];

    for j in 0..info.height {
        fetch_scanline(src, info.src_x, info.src_y.wrapping_add(j), &mut src_line);
        if let (Some(mask), Some(line)) = (mask, mask_line.as_mut()) {
            fetch_scanline(mask, info.mask_x, info.mask_y.wrapping_add(j), line);
        }
        let y = info.dest_y + j;
        info.dest.fetch_argb_run(info.dest_x, y, &mut dest_line);
        combine(info.op, &mut dest_line, &src_line, mask_line.as_deref());
        info.dest.store_argb_run(info.dest_x, y, &dest_line);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/backend/general.rs"]
mod tests;
