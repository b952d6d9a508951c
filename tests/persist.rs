//! Model bundle round-trips and load failure modes on real files.

use std::fs;

use glyphboost::{testing, Classifier, LoadError, Sample, SaveError};

fn projector_classifier() -> Classifier {
    let tree = testing::continuous(
        0,
        0.0,
        "minus",
        &[("minus", 1.0), ("plus", 1.0)],
        testing::leaf("minus", &[("minus", 1.0)]),
        testing::leaf("plus", &[("plus", 1.0)]),
    );
    let ensemble = testing::ensemble(vec![(tree, 1.0)]);
    let projector = testing::projector(
        &["minus", "plus"],
        &[(1.0, 2.0), (3.0, 0.0)],
        vec![vec![0.5, 0.5]],
        1,
    );
    Classifier::from_schemas(ensemble, Some(projector)).unwrap()
}

#[test]
fn full_bundle_roundtrips_through_disk() {
    let dir = tempfile::tempdir().unwrap();
    let ensemble_path = dir.path().join("ensemble.json");
    let projector_path = dir.path().join("projector.json");

    let original = projector_classifier();
    original
        .save(&ensemble_path, Some(&projector_path))
        .unwrap();

    let loaded = Classifier::load(&ensemble_path, Some(&projector_path)).unwrap();
    assert_eq!(loaded.class_list(), original.class_list());

    for x in [-4.0, 0.0, 3.0, 8.0] {
        let sample = Sample::from_numbers(&[x, 1.0]);
        assert_eq!(
            loaded.classify(&sample).unwrap(),
            original.classify(&sample).unwrap()
        );
    }
}

#[test]
fn ensemble_only_bundle_roundtrips() {
    let dir = tempfile::tempdir().unwrap();
    let ensemble_path = dir.path().join("ensemble.json");

    let tree = testing::leaf("a", &[("a", 2.0), ("b", 1.0)]);
    let original =
        Classifier::from_schemas(testing::ensemble(vec![(tree, 1.0)]), None).unwrap();
    original.save(&ensemble_path, None).unwrap();

    let loaded = Classifier::load(&ensemble_path, None).unwrap();
    assert!(loaded.projector().is_none());
    assert_eq!(loaded.class_list(), &["a"]);
}

#[test]
fn saving_a_projector_without_a_path_fails() {
    let dir = tempfile::tempdir().unwrap();
    let ensemble_path = dir.path().join("ensemble.json");

    let err = projector_classifier()
        .save(&ensemble_path, None)
        .unwrap_err();
    assert!(matches!(err, SaveError::MissingProjectorPath));
}

#[test]
fn missing_bundle_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = Classifier::load(dir.path().join("nope.json"), None).unwrap_err();
    assert!(matches!(err, LoadError::Io(_)));
}

#[test]
fn malformed_bundle_is_a_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ensemble.json");
    fs::write(&path, b"{not json").unwrap();

    let err = Classifier::load(&path, None).unwrap_err();
    assert!(matches!(err, LoadError::Json(_)));
}

#[test]
fn broken_projector_fails_the_whole_load() {
    let dir = tempfile::tempdir().unwrap();
    let ensemble_path = dir.path().join("ensemble.json");
    let projector_path = dir.path().join("projector.json");

    projector_classifier()
        .save(&ensemble_path, Some(&projector_path))
        .unwrap();
    fs::write(&projector_path, b"[]").unwrap();

    assert!(Classifier::load(&ensemble_path, Some(&projector_path)).is_err());
}
