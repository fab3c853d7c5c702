use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        PackError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(
        PackError::precondition("x")
            .to_string()
            .contains("precondition failure:")
    );
    assert!(
        PackError::serialization("x")
            .to_string()
            .contains("serialization error:")
    );
    assert!(PackError::decode("x").to_string().contains("decode error:"));
}

#[test]
fn packaging_failure_names_symbol() {
    let err = PackError::packaging(PackagingReason::TooBigImage, Some("hero_idle".to_string()));
    let msg = err.to_string();
    assert!(msg.starts_with("[AtlasGenerator]"));
    assert!(msg.contains("too big"));
    assert!(msg.contains("hero_idle"));

    let err = PackError::packaging(PackagingReason::Unknown, None);
    assert!(err.to_string().contains("unknown symbol"));
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = PackError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}
