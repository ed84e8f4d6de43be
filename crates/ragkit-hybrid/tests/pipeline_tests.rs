use ragkit_core::error::Error;
use ragkit_core::traits::Embedder;
use ragkit_core::types::SourceKind;
use ragkit_embed::HashEmbedder;
use ragkit_hybrid::{dense_retrieve, sparse_retrieve, FusionWeights, HybridRetriever};
use ragkit_text::Bm25Index;
use ragkit_vector::VectorIndex;

const DIM: usize = 64;

fn retriever() -> HybridRetriever<Bm25Index, VectorIndex> {
    let embedder = Box::new(HashEmbedder::new(DIM).unwrap());
    HybridRetriever::new(Bm25Index::default(), VectorIndex::new(DIM).unwrap(), embedder).unwrap()
}

fn corpus() -> Vec<(&'static str, &'static str)> {
    vec![
        ("c1", "annual leave policy applies to all staff"),
        ("c2", "travel reimbursement requires manager approval"),
        ("c3", "the cafeteria opens at noon"),
    ]
}

#[test]
fn embedder_dimension_must_match_index() {
    let embedder = Box::new(HashEmbedder::new(8).unwrap());
    let res = HybridRetriever::new(Bm25Index::default(), VectorIndex::new(16).unwrap(), embedder);
    assert!(matches!(res, Err(Error::DimensionMismatch { expected: 16, actual: 8 })));
}

#[test]
fn index_feeds_both_indexes() {
    let mut r = retriever();
    let report = r.index(corpus()).unwrap();
    assert_eq!(report.lexical_indexed, 3);
    assert_eq!(report.dense_indexed, 3);
    assert_eq!(r.text().corpus_size(), 3);
    assert_eq!(r.vector().len(), 3);
    assert_eq!(r.vector().chunk_ids(), &["c1", "c2", "c3"]);
}

#[test]
fn chunks_without_words_are_skipped_and_counted() {
    let mut r = retriever();
    let report = r.index(vec![("c1", "leave policy"), ("blank", "  ?? ... ")]).unwrap();
    assert_eq!(report.lexical_skipped, 1);
    assert_eq!(report.dense_skipped, 1);
    assert_eq!(r.vector().len(), 1);
    assert!(!r.text().contains("blank"));
}

#[test]
fn duplicate_chunk_aborts_ingest() {
    let mut r = retriever();
    r.index(corpus()).unwrap();
    let err = r.index(vec![("c1", "something else")]).unwrap_err();
    assert!(matches!(err, Error::DuplicateChunk(id) if id == "c1"));
}

#[test]
fn retrieve_ranks_matching_chunk_first() {
    let mut r = retriever();
    r.index(corpus()).unwrap();
    let retrieval = r.retrieve("leave policy", 3).unwrap();
    assert_eq!(retrieval.query, "leave policy");
    assert_eq!(retrieval.top_k, 3);
    assert_eq!(retrieval.candidates[0].chunk_id, "c1");
    assert!(retrieval.candidates[0].sparse_score > 0.0);
    assert!(retrieval.candidates[0].dense_score > 0.0);
    assert!(retrieval.candidates.len() <= 3);
    for pair in retrieval.candidates.windows(2) {
        assert!(pair[0].fused_score >= pair[1].fused_score);
    }
}

#[test]
fn query_without_words_yields_no_candidates() {
    let mut r = retriever();
    r.index(corpus()).unwrap();
    assert!(r.retrieve("?? !!", 5).unwrap().candidates.is_empty());
    assert!(r.retrieve("leave", 0).unwrap().candidates.is_empty());
}

#[test]
fn empty_indexes_retrieve_nothing() {
    let r = retriever();
    assert!(r.retrieve("leave policy", 5).unwrap().candidates.is_empty());
}

#[test]
fn sparse_only_weights_follow_bm25_order() {
    let mut r = retriever().with_weights(FusionWeights { dense: 0.0, sparse: 1.0 });
    r.index(corpus()).unwrap();
    let retrieval = r.retrieve("reimbursement", 3).unwrap();
    let bm25 = sparse_retrieve("reimbursement", r.text(), 3).unwrap();
    assert_eq!(retrieval.candidates[0].chunk_id, bm25[0].id);
    assert!((retrieval.candidates[0].fused_score - bm25[0].score).abs() < 1e-12);
}

#[test]
fn dense_retrieve_labels_hits_and_skips_missing_embedding() {
    let mut r = retriever();
    r.index(corpus()).unwrap();
    assert!(dense_retrieve(None, r.vector(), 5).unwrap().is_empty());

    let q = HashEmbedder::new(DIM).unwrap().embed_batch(&["cafeteria noon".to_string()]).unwrap().remove(0);
    let hits = dense_retrieve(Some(&q), r.vector(), 2).unwrap();
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].id, "c3");
    assert!(hits.iter().all(|h| h.source == SourceKind::Vector));

    let wrong = vec![1.0f32; DIM + 1];
    assert!(matches!(dense_retrieve(Some(&wrong), r.vector(), 2), Err(Error::DimensionMismatch { .. })));
    assert_eq!(r.vector().len(), 3);
}
