//! Tests for the hash embedder and the timeout wrapper.

use std::time::Duration;

use async_trait::async_trait;
use docqa_rag::{Answerer, DistanceMetric, Embedder, HashEmbedder, RagError, WithTimeout};
use proptest::prelude::*;

#[tokio::test]
async fn hash_embedder_is_deterministic() {
    let embedder = HashEmbedder::default();
    let a = embedder.embed("Hard hats are required on site.").await.unwrap();
    let b = embedder.embed("Hard hats are required on site.").await.unwrap();
    assert_eq!(a, b);
    assert_eq!(a.len(), 384);
}

#[tokio::test]
async fn hash_embedder_output_is_unit_length() {
    let embedder = HashEmbedder::new(64);
    let v = embedder.embed("scaffolding inspection checklist").await.unwrap();
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    assert!((norm - 1.0).abs() < 1e-5);
}

#[tokio::test]
async fn empty_text_embeds_to_zero_vector() {
    let embedder = HashEmbedder::new(16);
    let v = embedder.embed("").await.unwrap();
    assert_eq!(v, vec![0.0; 16]);
}

#[tokio::test]
async fn related_texts_are_closer_than_unrelated_ones() {
    let embedder = HashEmbedder::default();
    let query = embedder.embed("helmet safety rules").await.unwrap();
    let related = embedder.embed("Safety rules: every worker wears a helmet.").await.unwrap();
    let unrelated = embedder.embed("Quarterly revenue grew in the retail segment.").await.unwrap();

    let metric = DistanceMetric::Cosine;
    assert!(metric.distance(&query, &related) < metric.distance(&query, &unrelated));
}

#[tokio::test]
async fn batch_preserves_input_order() {
    let embedder = HashEmbedder::new(32);
    let texts = ["first", "second", "third"];
    let batch = embedder.embed_batch(&texts).await.unwrap();
    for (text, vector) in texts.iter().zip(&batch) {
        assert_eq!(&embedder.embed(text).await.unwrap(), vector);
    }
}

#[tokio::test]
async fn zero_dimensions_is_unavailable() {
    let embedder = HashEmbedder::new(0);
    assert!(matches!(embedder.embed("x").await, Err(RagError::EmbeddingUnavailable { .. })));
}

struct SlowEmbedder;

#[async_trait]
impl Embedder for SlowEmbedder {
    async fn embed(&self, _text: &str) -> docqa_rag::Result<Vec<f32>> {
        tokio::time::sleep(Duration::from_secs(60)).await;
        Ok(vec![1.0])
    }

    fn dimensions(&self) -> usize {
        1
    }

    fn name(&self) -> &str {
        "Slow"
    }
}

struct SlowAnswerer;

#[async_trait]
impl Answerer for SlowAnswerer {
    async fn generate(&self, _prompt: &str) -> docqa_rag::Result<String> {
        tokio::time::sleep(Duration::from_secs(60)).await;
        Ok("too late".to_string())
    }

    fn name(&self) -> &str {
        "Slow"
    }
}

#[tokio::test(start_paused = true)]
async fn elapsed_embedding_maps_to_embedding_unavailable() {
    let embedder = WithTimeout::new(SlowEmbedder, Duration::from_secs(1));
    let err = embedder.embed("x").await.unwrap_err();
    assert!(matches!(err, RagError::EmbeddingUnavailable { ref provider, .. } if provider == "Slow"));

    let err = embedder.embed_batch(&["x", "y"]).await.unwrap_err();
    assert!(matches!(err, RagError::EmbeddingUnavailable { .. }));
    assert_eq!(embedder.dimensions(), 1);
}

#[tokio::test(start_paused = true)]
async fn elapsed_generation_maps_to_generation_unavailable() {
    let answerer = WithTimeout::new(SlowAnswerer, Duration::from_secs(1));
    let err = answerer.generate("prompt").await.unwrap_err();
    assert!(matches!(err, RagError::GenerationUnavailable { .. }));
}

#[tokio::test]
async fn fast_calls_pass_through_the_timeout() {
    let embedder = WithTimeout::new(HashEmbedder::new(8), Duration::from_secs(5));
    let direct = HashEmbedder::new(8).embed("hello").await.unwrap();
    assert_eq!(embedder.embed("hello").await.unwrap(), direct);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn embedding_twice_is_bit_identical(text in ".{0,120}", dims in 1usize..128) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let (a, b) = rt.block_on(async {
            let embedder = HashEmbedder::new(dims);
            (embedder.embed(&text).await.unwrap(), embedder.embed(&text).await.unwrap())
        });
        prop_assert_eq!(a.len(), dims);
        let bits = |v: &[f32]| v.iter().map(|x| x.to_bits()).collect::<Vec<_>>();
        prop_assert_eq!(bits(&a), bits(&b));
    }
}
