use super::*;

fn scratch_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("scpack_exporter_{tag}_{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn directory_exporter_copies_named_file() {
    let root = scratch_dir("copy");
    std::fs::write(root.join("hero.png"), b"not really a png").unwrap();
    let dest = root.join("out.bin");

    let exporter = DirectoryExporter::new(&root);
    exporter.export("hero.png", &dest).unwrap();
    assert_eq!(std::fs::read(&dest).unwrap(), b"not really a png");

    std::fs::remove_dir_all(&root).unwrap();
}

#[test]
fn directory_exporter_rejects_escaping_names() {
    let root = scratch_dir("escape");
    let exporter = DirectoryExporter::new(&root);
    let err = exporter
        .export("../secret.png", &root.join("out.bin"))
        .unwrap_err();
    assert!(matches!(err, PackError::Validation(_)));
    std::fs::remove_dir_all(&root).unwrap();
}

#[test]
fn directory_exporter_reports_missing_source() {
    let root = scratch_dir("missing");
    let exporter = DirectoryExporter::new(&root);
    let err = exporter.export("nope.png", &root.join("out.bin")).unwrap_err();
    assert!(err.to_string().contains("copy bitmap"));
    std::fs::remove_dir_all(&root).unwrap();
}
