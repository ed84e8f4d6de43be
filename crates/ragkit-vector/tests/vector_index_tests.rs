use ragkit_core::config::VectorSettings;
use ragkit_core::error::Error;
use ragkit_core::types::Modality;
use ragkit_vector::{ArtifactPaths, ModalityIndexes, VectorIndex};
use tempfile::TempDir;

fn sample_index() -> VectorIndex {
    let mut index = VectorIndex::new(4).unwrap();
    index.add(&[1.0, 0.0, 0.0, 0.0], "x").unwrap();
    index.add(&[0.0, 2.0, 0.0, 0.0], "y").unwrap();
    index.add(&[3.0, 3.0, 0.0, 0.0], "xy").unwrap();
    index.add(&[0.0, 0.0, 0.5, -0.5], "zw").unwrap();
    index
}

#[test]
fn unit_vector_matches_itself() {
    let mut index = VectorIndex::new(4).unwrap();
    index.add(&[1.0, 0.0, 0.0, 0.0], "x").unwrap();
    let hits = index.search(&[1.0, 0.0, 0.0, 0.0], 5).unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, "x");
    assert!((hits[0].score - 1.0).abs() < 1e-6);
}

#[test]
fn stored_vectors_are_unit_length() {
    let index = sample_index();
    for ord in 0..index.len() {
        let v = index.vector(ord).unwrap();
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-6);
    }
    assert!(index.vector(index.len()).is_none());
}

#[test]
fn search_ranks_by_cosine_similarity() {
    let index = sample_index();
    let hits = index.search(&[10.0, 1.0, 0.0, 0.0], 3).unwrap();
    let ids: Vec<&str> = hits.iter().map(|h| h.id.as_str()).collect();
    assert_eq!(ids, vec!["x", "xy", "y"]);
    assert!(hits.windows(2).all(|w| w[0].score >= w[1].score));
    // Magnitude of the query does not matter.
    let scaled = index.search(&[100.0, 10.0, 0.0, 0.0], 3).unwrap();
    for (a, b) in hits.iter().zip(&scaled) {
        assert_eq!(a.id, b.id);
        assert!((a.score - b.score).abs() < 1e-6);
    }
}

#[test]
fn equal_similarity_keeps_insertion_order() {
    let mut index = VectorIndex::new(2).unwrap();
    index.add(&[1.0, 1.0], "b").unwrap();
    index.add(&[2.0, 2.0], "a").unwrap();
    index.add(&[3.0, 3.0], "c").unwrap();
    let hits = index.search(&[1.0, 1.0], 2).unwrap();
    let ids: Vec<&str> = hits.iter().map(|h| h.id.as_str()).collect();
    assert_eq!(ids, vec!["b", "a"]);
}

#[test]
fn empty_index_and_zero_k_return_nothing() {
    let index = VectorIndex::new(4).unwrap();
    // An empty index short-circuits before the query is even inspected.
    assert!(index.search(&[0.0, 0.0, 0.0, 0.0], 3).unwrap().is_empty());
    assert!(sample_index().search(&[1.0, 0.0, 0.0, 0.0], 0).unwrap().is_empty());
}

#[test]
fn wrong_dimension_is_rejected_without_mutation() {
    let mut index = sample_index();
    let before = index.len();
    let err = index.add(&[1.0, 2.0, 3.0], "bad").unwrap_err();
    assert!(matches!(err, Error::DimensionMismatch { expected: 4, actual: 3 }));
    assert_eq!(index.len(), before);
    assert_eq!(index.chunk_ids().len(), before);
    assert!(!index.all_chunk_ids().contains("bad"));

    let err = index.search(&[1.0, 0.0], 1).unwrap_err();
    assert!(matches!(err, Error::DimensionMismatch { .. }));
}

#[test]
fn zero_norm_and_non_finite_vectors_are_degenerate() {
    let mut index = VectorIndex::new(3).unwrap();
    assert!(matches!(index.add(&[0.0, 0.0, 0.0], "z"), Err(Error::DegenerateVector(_))));
    assert!(matches!(index.add(&[f32::NAN, 1.0, 0.0], "n"), Err(Error::DegenerateVector(_))));
    assert!(index.is_empty());
    index.add(&[0.0, 0.0, 1.0], "ok").unwrap();
    assert!(matches!(index.search(&[0.0, 0.0, 0.0], 1), Err(Error::DegenerateVector(_))));
}

#[test]
fn duplicate_chunk_id_is_rejected() {
    let mut index = sample_index();
    assert!(matches!(index.add(&[0.0, 0.0, 0.0, 1.0], "x"), Err(Error::DuplicateChunk(_))));
    assert_eq!(index.len(), 4);
}

#[test]
fn zero_dimension_is_invalid() {
    assert!(matches!(VectorIndex::new(0), Err(Error::InvalidInput(_))));
}

#[test]
fn save_load_round_trip_reproduces_rankings() {
    let tmp = TempDir::new().unwrap();
    let paths = ArtifactPaths::new(tmp.path(), "text");
    let index = sample_index();
    index.save(&paths).unwrap();

    let restored = VectorIndex::load(&paths, 4).unwrap();
    assert_eq!(restored.chunk_ids(), index.chunk_ids());
    for q in [[1.0, 0.2, 0.0, 0.0], [0.0, 0.0, 1.0, -1.0], [0.3, 0.3, 0.3, 0.3]] {
        let a = index.search(&q, 4).unwrap();
        let b = restored.search(&q, 4).unwrap();
        assert_eq!(a, b, "bit-identical ranking after reload");
    }
}

#[test]
fn load_with_other_dimension_fails() {
    let tmp = TempDir::new().unwrap();
    let paths = ArtifactPaths::new(tmp.path(), "text");
    sample_index().save(&paths).unwrap();
    assert!(matches!(VectorIndex::load(&paths, 8), Err(Error::DimensionMismatch { expected: 8, actual: 4 })));
}

#[test]
fn load_detects_length_mismatch() {
    let tmp = TempDir::new().unwrap();
    let paths = ArtifactPaths::new(tmp.path(), "text");
    sample_index().save(&paths).unwrap();
    std::fs::write(&paths.ids, r#"["x","y","xy"]"#).unwrap();
    assert!(matches!(VectorIndex::load(&paths, 4), Err(Error::LengthMismatch { vectors: 4, ids: 3 })));
}

#[test]
fn load_rejects_corrupt_or_missing_artifacts() {
    let tmp = TempDir::new().unwrap();
    let paths = ArtifactPaths::new(tmp.path(), "text");
    assert!(matches!(VectorIndex::load(&paths, 4), Err(Error::Io(_))));

    sample_index().save(&paths).unwrap();
    std::fs::write(&paths.ids, b"{not a list").unwrap();
    assert!(matches!(VectorIndex::load(&paths, 4), Err(Error::CorruptArtifact(_))));

    std::fs::write(&paths.ids, r#"["a","a","b","c"]"#).unwrap();
    assert!(matches!(VectorIndex::load(&paths, 4), Err(Error::CorruptArtifact(_))));

    std::fs::write(&paths.vectors, [1u8, 2, 3]).unwrap();
    assert!(matches!(VectorIndex::load(&paths, 4), Err(Error::CorruptArtifact(_))));
}

#[test]
fn load_rejects_non_finite_or_unnormalized_rows() {
    let tmp = TempDir::new().unwrap();
    let paths = ArtifactPaths::new(tmp.path(), "text");
    std::fs::write(&paths.ids, r#"["a","b"]"#).unwrap();

    // format_version, dim, count, row-major data
    let nan_row = bincode::serialize(&(1u32, 2u64, 2u64, vec![1.0f32, 0.0, f32::NAN, 0.0])).unwrap();
    std::fs::write(&paths.vectors, nan_row).unwrap();
    assert!(matches!(VectorIndex::load(&paths, 2), Err(Error::CorruptArtifact(msg)) if msg.contains("row 1")));

    let long_row = bincode::serialize(&(1u32, 2u64, 2u64, vec![3.0f32, 4.0, 0.0, 1.0])).unwrap();
    std::fs::write(&paths.vectors, long_row).unwrap();
    assert!(matches!(VectorIndex::load(&paths, 2), Err(Error::CorruptArtifact(msg)) if msg.contains("row 0")));

    let ok = bincode::serialize(&(1u32, 2u64, 2u64, vec![0.6f32, 0.8, 0.0, 1.0])).unwrap();
    std::fs::write(&paths.vectors, ok).unwrap();
    let index = VectorIndex::load(&paths, 2).unwrap();
    assert_eq!(index.search(&[0.0, 1.0], 1).unwrap()[0].id, "b");
}

#[test]
fn modalities_are_independent() {
    let indexes = ModalityIndexes::new(VectorSettings { text_dim: 4, image_dim: 2 }).unwrap();
    indexes.add(Modality::Text, "t1", &[1.0, 0.0, 0.0, 0.0]).unwrap();
    indexes.add(Modality::Image, "i1", &[0.0, 1.0]).unwrap();
    assert!(matches!(indexes.add(Modality::Image, "i2", &[1.0, 0.0, 0.0, 0.0]), Err(Error::DimensionMismatch { .. })));

    assert_eq!(indexes.len(Modality::Text), 1);
    assert_eq!(indexes.len(Modality::Image), 1);
    let text_hits = indexes.search(Modality::Text, &[1.0, 0.0, 0.0, 0.0], 5).unwrap();
    assert_eq!(text_hits.len(), 1);
    assert_eq!(text_hits[0].id, "t1");
    let image_hits = indexes.search(Modality::Image, &[0.0, 1.0], 5).unwrap();
    assert_eq!(image_hits[0].id, "i1");
}

#[test]
fn modalities_can_be_written_concurrently_and_persisted() {
    let tmp = TempDir::new().unwrap();
    let settings = VectorSettings { text_dim: 3, image_dim: 2 };
    let indexes = ModalityIndexes::new(settings).unwrap();
    std::thread::scope(|s| {
        s.spawn(|| {
            for i in 0..50 {
                indexes.add(Modality::Text, &format!("t{i}"), &[1.0, i as f32, 0.5]).unwrap();
            }
        });
        s.spawn(|| {
            for i in 0..30 {
                indexes.add(Modality::Image, &format!("i{i}"), &[i as f32 + 1.0, 1.0]).unwrap();
            }
        });
    });
    assert_eq!(indexes.len(Modality::Text), 50);
    assert_eq!(indexes.len(Modality::Image), 30);
    assert_eq!(indexes.read(Modality::Text).chunk_ids()[7], "t7");

    indexes.save(tmp.path()).unwrap();
    let reopened = ModalityIndexes::open(tmp.path(), settings).unwrap();
    assert_eq!(reopened.len(Modality::Text), 50);
    assert_eq!(reopened.len(Modality::Image), 30);
    assert_eq!(
        indexes.search(Modality::Text, &[1.0, 3.0, 0.5], 5).unwrap(),
        reopened.search(Modality::Text, &[1.0, 3.0, 0.5], 5).unwrap()
    );
}

#[test]
fn open_starts_empty_without_artifacts_and_rejects_half_pairs() {
    let tmp = TempDir::new().unwrap();
    let settings = VectorSettings { text_dim: 3, image_dim: 2 };
    let indexes = ModalityIndexes::open(tmp.path(), settings).unwrap();
    assert_eq!(indexes.len(Modality::Text), 0);
    assert_eq!(indexes.dim(Modality::Image), 2);

    std::fs::write(ArtifactPaths::for_modality(tmp.path(), Modality::Image).ids, "[]").unwrap();
    assert!(matches!(ModalityIndexes::open(tmp.path(), settings), Err(Error::CorruptArtifact(_))));
}

#[test]
fn from_parts_wraps_built_indexes() {
    let image = VectorIndex::new(2).unwrap();
    let modalities = ModalityIndexes::from_parts(sample_index(), image);
    assert_eq!(modalities.len(Modality::Text), 4);
    assert_eq!(modalities.dim(Modality::Image), 2);
    modalities.add(Modality::Image, "img", &[0.0, 1.0]).unwrap();
    let (text, image) = modalities.into_inner();
    assert_eq!(text.chunk_ids(), sample_index().chunk_ids());
    assert_eq!(image.chunk_ids(), &["img"]);
}
