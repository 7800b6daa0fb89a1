use super::*;
use crate::dispatch::flags::{FormatCode, PathFlags};
use crate::image::format::PixelFormat;

fn key(op: Operator, src: PixelFormat, dest: PixelFormat) -> PathKey {
    PathKey {
        op,
        src: FormatCode::Bits(src),
        src_flags: PathFlags::STANDARD_SOURCE | PathFlags::SCALE_TRANSFORM,
        mask: FormatCode::Null,
        mask_flags: PathFlags::empty(),
        dest: FormatCode::Bits(dest),
        dest_flags: PathFlags::STANDARD_SOURCE,
    }
}

#[test]
fn backend_names_parse_and_serialize() {
    for kind in BackendKind::ALL {
        assert_eq!(kind.name().parse::<BackendKind>().expect("parse"), kind);
        let json = serde_json::to_string(&kind).expect("json");
        assert_eq!(json, format!("\"{}\"", kind.name()));
    }
    assert_eq!(" SSE2 ".parse::<BackendKind>().expect("parse"), BackendKind::Sse2);
    assert!("mmx".parse::<BackendKind>().is_err());
}

#[test]
fn disable_list_parsing() {
    let config = ChainConfig::parse_list("avx2, sse2 bogus,,general avx2");
    assert_eq!(config.disabled, vec![BackendKind::Avx2, BackendKind::Sse2]);
    assert!(config.is_disabled(BackendKind::Sse2));
    assert!(!config.is_disabled(BackendKind::Fast));
    assert_eq!(ChainConfig::parse_list(""), ChainConfig::default());
}

#[test]
fn chain_runs_from_specialized_to_general() {
    let chain = ImplementationChain::new(&ChainConfig::default());
    let backends = chain.backends();
    assert_eq!(backends.first(), Some(&BackendKind::Noop));
    assert_eq!(backends.last(), Some(&BackendKind::General));
    assert!(backends.contains(&BackendKind::Fast));
    for kind in [BackendKind::Sse2, BackendKind::Avx2] {
        assert_eq!(backends.contains(&kind), kind.is_available());
    }
}

#[test]
fn disabled_backends_are_left_out() {
    let config = ChainConfig {
        disabled: vec![BackendKind::Noop, BackendKind::Sse2, BackendKind::Avx2],
    };
    let chain = ImplementationChain::new(&config);
    assert_eq!(chain.backends(), vec![BackendKind::Fast, BackendKind::General]);
    assert_eq!(
        ImplementationChain::reference().backends(),
        vec![BackendKind::General]
    );
}

#[test]
fn general_cannot_be_stacked() {
    let err = create_implementation(BackendKind::General, create_general_implementation());
    assert!(matches!(err, Err(PixmixError::Validation(_))));
}

#[test]
fn resolution_is_total_and_prefers_the_head() {
    let chain = ImplementationChain::new(&ChainConfig {
        disabled: vec![BackendKind::Sse2, BackendKind::Avx2],
    });
    let head = chain.head();
    assert_eq!(
        head.resolve_backend(&key(Operator::Over, PixelFormat::A8R8G8B8, PixelFormat::A8R8G8B8)),
        BackendKind::Fast
    );
    assert_eq!(
        head.resolve_backend(&key(Operator::Dst, PixelFormat::A8, PixelFormat::R5G6B5)),
        BackendKind::Noop
    );
    for op in Operator::ALL {
        for src in PixelFormat::ALL {
            let k = key(op, src, PixelFormat::B8G8R8X8);
            let _ = head.resolve(&k);
            assert_eq!(
                ImplementationChain::reference().head().resolve_backend(&k),
                BackendKind::General
            );
        }
    }
}

#[test]
fn combiner_lookup_agrees_with_reference() {
    let chain = default_chain();
    let src = [0x8040_2010, 0xff00_ff00, 0x0000_0000, 0x7f7f_7f7f, 0xffff_ffff];
    let dest0 = [0x1020_3040, 0x8080_8080, 0xffff_ffff, 0x0000_0000, 0x4000_0040];
    let mask = [0xff00_0000, 0x8000_0000, 0x4000_0000, 0x0000_0000, 0xffff_ffff];
    for op in Operator::ALL {
        for m in [None, Some(&mask[..])] {
            let mut expect = dest0;
            reference::combine(op, &mut expect, &src, m);
            let mut got = dest0;
            chain.head().lookup_combiner(op)(op, &mut got, &src, m);
            assert_eq!(got, expect, "{op:?} mask={}", m.is_some());
        }
    }
}
