use ragkit_core::traits::Embedder;
use ragkit_embed::{get_default_embedder, HashEmbedder};

fn cosine(a: &[f32], b: &[f32]) -> f32 { a.iter().zip(b).map(|(x, y)| x * y).sum() }

#[test]
fn hash_embedder_shapes_and_determinism() {
    let embedder = get_default_embedder(64).expect("embedder");
    let texts = vec!["hello world".to_string(), "hello world".to_string()];
    let embs = embedder.embed_batch(&texts).expect("embed_batch");
    let v1 = &embs[0];
    let v2 = &embs[1];

    assert_eq!(v1.len(), 64, "embedding dim is 64");

    // Norm approximately 1.0
    let norm: f32 = v1.iter().map(|x| x * x).sum::<f32>().sqrt();
    assert!((norm - 1.0).abs() <= 1e-3, "vector is L2-normalized (norm={norm})");

    // Deterministic for same input
    for (a, b) in v1.iter().zip(v2.iter()) { assert!((a - b).abs() <= 1e-6); }
}

#[test]
fn case_and_punctuation_do_not_matter() {
    let e = HashEmbedder::new(32).unwrap();
    assert_eq!(e.embed_text("Leave policy."), e.embed_text("leave POLICY"));
}

#[test]
fn shared_words_score_higher_than_disjoint_text() {
    let e = HashEmbedder::new(256).unwrap();
    let q = e.embed_text("leave policy");
    let near = e.embed_text("annual leave policy applies to all staff");
    let far = e.embed_text("travel reimbursement requires manager approval");
    assert!(cosine(&q, &near) > cosine(&q, &far));
}

#[test]
fn wordless_text_is_zero_and_seed_changes_output() {
    let e = HashEmbedder::new(16).unwrap();
    assert!(e.embed_text("  ... ").iter().all(|&x| x == 0.0));
    let seeded = HashEmbedder::new(16).unwrap().with_seed(7);
    assert_ne!(e.embed_text("alpha beta gamma"), seeded.embed_text("alpha beta gamma"));
    assert!(HashEmbedder::new(0).is_err());
}
