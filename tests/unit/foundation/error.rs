use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        PixmixError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(
        PixmixError::unsupported("x")
            .to_string()
            .contains("unsupported:")
    );
    assert!(
        PixmixError::allocation("x")
            .to_string()
            .contains("allocation error:")
    );
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = PixmixError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}

#[test]
fn failed_reservation_maps_to_allocation() {
    let mut v: Vec<u32> = Vec::new();
    let err = v.try_reserve_exact(usize::MAX).unwrap_err();
    assert!(matches!(PixmixError::from(err), PixmixError::Allocation(_)));
}
