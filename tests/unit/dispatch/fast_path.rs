use super::*;

fn nothing(_: &Implementation, _: &mut CompositeInfo<'_>) {}

fn key(op: Operator, src: FormatCode, mask: FormatCode, dest: FormatCode) -> PathKey {
    PathKey {
        op,
        src,
        src_flags: PathFlags::STANDARD_SOURCE,
        mask,
        mask_flags: PathFlags::STANDARD_SOURCE,
        dest,
        dest_flags: PathFlags::STANDARD_SOURCE,
    }
}

const ARGB: FormatCode = FormatCode::Bits(PixelFormat::A8R8G8B8);
const XRGB: FormatCode = FormatCode::Bits(PixelFormat::X8R8G8B8);

#[test]
fn exact_and_alpha_twin_destinations() {
    let exact = FastPath::unmasked(
        Operator::Over,
        FormatPattern::Exact(PixelFormat::A8R8G8B8),
        PathFlags::STANDARD_SOURCE,
        FormatPattern::Exact(PixelFormat::A8R8G8B8),
        nothing,
    );
    let twin = FastPath {
        dest: FormatPattern::IgnoringAlpha(PixelFormat::A8R8G8B8),
        ..exact
    };
    let into_x = key(Operator::Over, ARGB, FormatCode::Null, XRGB);
    assert!(!exact.matches(&into_x));
    assert!(twin.matches(&into_x));
    assert!(twin.matches(&key(Operator::Over, ARGB, FormatCode::Null, ARGB)));
    assert!(!twin.matches(&key(Operator::Add, ARGB, FormatCode::Null, ARGB)));
}

#[test]
fn required_flags_must_all_be_present() {
    let path = FastPath::unmasked(
        Operator::Src,
        FormatPattern::Exact(PixelFormat::A8R8G8B8),
        PathFlags::SCALED_NEAREST | PathFlags::SAMPLES_COVER_CLIP_NEAREST,
        FormatPattern::Exact(PixelFormat::A8R8G8B8),
        nothing,
    );
    let mut k = key(Operator::Src, ARGB, FormatCode::Null, ARGB);
    k.src_flags = PathFlags::SCALED_NEAREST;
    assert!(!path.matches(&k));
    k.src_flags |= PathFlags::SAMPLES_COVER_CLIP_NEAREST | PathFlags::REPEAT_PAD;
    assert!(path.matches(&k));
}

#[test]
fn null_and_solid_patterns() {
    let masked = FastPath::solid_masked(
        Operator::Over,
        PixelFormat::A8,
        FormatPattern::Exact(PixelFormat::A8R8G8B8),
        nothing,
    );
    let a8 = FormatCode::Bits(PixelFormat::A8);
    assert!(masked.matches(&key(Operator::Over, FormatCode::Solid, a8, ARGB)));
    assert!(!masked.matches(&key(Operator::Over, ARGB, a8, ARGB)));
    assert!(!masked.matches(&key(Operator::Over, FormatCode::Solid, FormatCode::Null, ARGB)));

    let unmasked = FastPath::unmasked(
        Operator::Over,
        FormatPattern::Solid,
        PathFlags::empty(),
        FormatPattern::Any,
        nothing,
    );
    assert!(!unmasked.matches(&key(Operator::Over, FormatCode::Solid, a8, ARGB)));
}

#[test]
fn catch_all_matches_everything_and_first_match_wins() {
    let table = [
        FastPath::unmasked(
            Operator::Add,
            FormatPattern::Exact(PixelFormat::A8),
            PathFlags::STANDARD_SOURCE,
            FormatPattern::Exact(PixelFormat::A8),
            nothing,
        ),
        FastPath::any(nothing),
    ];
    let a8 = FormatCode::Bits(PixelFormat::A8);
    let add = key(Operator::Add, a8, FormatCode::Null, a8);
    assert_eq!(table.iter().position(|p| p.matches(&add)), Some(0));

    let mut odd = key(Operator::Xor, FormatCode::Solid, a8, XRGB);
    odd.src_flags = PathFlags::empty();
    odd.mask_flags = PathFlags::empty();
    assert_eq!(table.iter().position(|p| p.matches(&odd)), Some(1));
    assert!(find(&table, &odd).is_some());
    assert!(find(&table[..1], &odd).is_none());
}
