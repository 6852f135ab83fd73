//! Flat vector index with exhaustive cosine search

use chrono::{DateTime, Utc};
use std::time::Instant;

use crate::error::{Error, Result};
use crate::providers::EmbeddingProvider;
use crate::types::{Chunk, ScoredChunk};

/// Embedded chunk
#[derive(Debug, Clone)]
struct IndexEntry {
    chunk: Chunk,
    embedding: Vec<f32>,
}

/// Ephemeral index over one document's chunks
///
/// Entries are kept in chunk order; that order breaks similarity ties.
#[derive(Debug, Clone)]
pub struct VectorIndex {
    /// SHA-256 of the source document bytes
    document_hash: String,
    /// Embedding model the vectors came from
    model: String,
    /// Vector dimensions (0 for an empty index)
    dimensions: usize,
    entries: Vec<IndexEntry>,
    built_at: DateTime<Utc>,
}

impl VectorIndex {
    /// Embed every chunk and build the index
    ///
    /// All-or-nothing: the first embedding failure aborts the build and no
    /// index is returned.
    pub async fn build(
        document_hash: impl Into<String>,
        chunks: Vec<Chunk>,
        embedder: &dyn EmbeddingProvider,
    ) -> Result<Self> {
        let document_hash = document_hash.into();
        let model = embedder.model().to_string();

        if chunks.is_empty() {
            return Ok(Self {
                document_hash,
                model,
                dimensions: 0,
                entries: Vec::new(),
                built_at: Utc::now(),
            });
        }

        let start = Instant::now();
        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let embeddings = embedder.embed_batch(&texts).await.map_err(into_embedding_error)?;

        if embeddings.len() != chunks.len() {
            return Err(Error::embedding(format!(
                "expected {} embeddings, got {}",
                chunks.len(),
                embeddings.len()
            )));
        }

        let dimensions = embeddings[0].len();
        if dimensions == 0 {
            return Err(Error::embedding("embedding service returned empty vectors"));
        }
        if let Some(bad) = embeddings.iter().position(|e| e.len() != dimensions) {
            return Err(Error::embedding(format!(
                "chunk {} embedded to {} dimensions, expected {}",
                bad,
                embeddings[bad].len(),
                dimensions
            )));
        }

        let entries = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| IndexEntry { chunk, embedding })
            .collect::<Vec<_>>();

        tracing::info!(
            "{:09.3} seconds taken to embed {} chunks with {} ({} dims)",
            start.elapsed().as_secs_f64(),
            entries.len(),
            model,
            dimensions
        );

        Ok(Self {
            document_hash,
            model,
            dimensions,
            entries,
            built_at: Utc::now(),
        })
    }

    /// Embed the query and return the `k` most similar chunks
    ///
    /// An empty index (or `k == 0`) returns nothing without calling the embedder.
    pub async fn retrieve(
        &self,
        query: &str,
        k: usize,
        embedder: &dyn EmbeddingProvider,
    ) -> Result<Vec<ScoredChunk>> {
        if self.entries.is_empty() || k == 0 {
            return Ok(Vec::new());
        }
        if embedder.model() != self.model {
            tracing::warn!(
                "Querying index built with '{}' using '{}'",
                self.model,
                embedder.model()
            );
        }

        let start = Instant::now();
        let query_embedding = embedder.embed(query).await.map_err(into_embedding_error)?;
        let results = self.search(&query_embedding, k)?;

        tracing::info!(
            "{:09.3} seconds taken to retrieve {} chunks",
            start.elapsed().as_secs_f64(),
            results.len()
        );
        Ok(results)
    }

    /// Rank entries against a query vector
    ///
    /// Ordered by decreasing similarity; equal scores keep chunk order.
    pub fn search(&self, query_embedding: &[f32], k: usize) -> Result<Vec<ScoredChunk>> {
        if self.entries.is_empty() || k == 0 {
            return Ok(Vec::new());
        }
        if query_embedding.len() != self.dimensions {
            return Err(Error::embedding(format!(
                "query has {} dimensions, index has {}",
                query_embedding.len(),
                self.dimensions
            )));
        }

        let mut scored: Vec<(usize, f32)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, entry)| (i, cosine_similarity(query_embedding, &entry.embedding)))
            .collect();

        // Stable sort, so ties stay in chunk order
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .map(|(i, similarity)| ScoredChunk {
                chunk: self.entries[i].chunk.clone(),
                similarity,
            })
            .collect())
    }

    /// Number of indexed chunks
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Hash of the document this index was built from
    pub fn document_hash(&self) -> &str {
        &self.document_hash
    }

    /// Embedding model identifier
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Vector dimensions
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// When the vectors were computed
    pub fn built_at(&self) -> DateTime<Utc> {
        self.built_at
    }

    /// Indexed chunks in order
    pub fn chunks(&self) -> impl Iterator<Item = &Chunk> {
        self.entries.iter().map(|e| &e.chunk)
    }
}

/// Cosine similarity; zero when either vector has zero norm
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

fn into_embedding_error(err: Error) -> Error {
    match err {
        Error::EmbeddingService(_) => err,
        other => Error::embedding(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Embeds text as counts of a few fixed keywords
    struct KeywordEmbedder {
        calls: AtomicUsize,
        fail_after: Option<usize>,
    }

    impl KeywordEmbedder {
        const KEYWORDS: [&'static str; 4] = ["force", "planet", "cell", "music"];

        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail_after: None,
            }
        }
    }

    #[async_trait]
    impl EmbeddingProvider for KeywordEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_after.is_some_and(|n| call >= n) {
                return Err(Error::internal("connection refused"));
            }
            let lower = text.to_lowercase();
            Ok(Self::KEYWORDS
                .iter()
                .map(|k| lower.matches(k).count() as f32)
                .collect())
        }

        fn model(&self) -> &str {
            "keywords"
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(true)
        }

        fn name(&self) -> &str {
            "keywords"
        }
    }

    fn chunk(index: u32, text: &str) -> Chunk {
        Chunk {
            index,
            segment: 1,
            char_offset: 0,
            text: text.to_string(),
        }
    }

    fn sample_chunks() -> Vec<Chunk> {
        vec![
            chunk(0, "A planet orbits a star."),
            chunk(1, "Force equals mass times acceleration."),
            chunk(2, "A cell is the unit of life."),
            chunk(3, "Net force changes motion; force is a vector."),
        ]
    }

    #[tokio::test]
    async fn test_build_and_retrieve_ranked() {
        let embedder = KeywordEmbedder::new();
        let index = VectorIndex::build("hash", sample_chunks(), &embedder).await.unwrap();
        assert_eq!(index.len(), 4);
        assert_eq!(index.dimensions(), 4);
        assert_eq!(index.model(), "keywords");

        let results = index.retrieve("What is force?", 2, &embedder).await.unwrap();
        let indices: Vec<u32> = results.iter().map(|r| r.chunk.index).collect();
        // Both force chunks are parallel to the query; tie keeps chunk order
        assert_eq!(indices, vec![1, 3]);
        assert!(results[0].similarity >= results[1].similarity);
    }

    #[tokio::test]
    async fn test_retrieval_is_deterministic() {
        let embedder = KeywordEmbedder::new();
        let index = VectorIndex::build("hash", sample_chunks(), &embedder).await.unwrap();

        let first = index.retrieve("planet cell force", 3, &embedder).await.unwrap();
        for _ in 0..5 {
            let again = index.retrieve("planet cell force", 3, &embedder).await.unwrap();
            assert_eq!(again, first);
        }
    }

    #[tokio::test]
    async fn test_ties_broken_by_chunk_order() {
        let embedder = KeywordEmbedder::new();
        let chunks = vec![chunk(0, "music"), chunk(1, "music"), chunk(2, "music")];
        let index = VectorIndex::build("hash", chunks, &embedder).await.unwrap();

        let results = index.retrieve("music", 3, &embedder).await.unwrap();
        let indices: Vec<u32> = results.iter().map(|r| r.chunk.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn test_empty_index_skips_embedder() {
        let embedder = KeywordEmbedder::new();
        let index = VectorIndex::build("hash", Vec::new(), &embedder).await.unwrap();
        assert!(index.is_empty());

        let results = index.retrieve("anything", 4, &embedder).await.unwrap();
        assert!(results.is_empty());
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_failed_embedding_aborts_build() {
        let embedder = KeywordEmbedder {
            calls: AtomicUsize::new(0),
            fail_after: Some(2),
        };
        let err = VectorIndex::build("hash", sample_chunks(), &embedder)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::EmbeddingService(_)));
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert!((cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
    }

    #[tokio::test]
    async fn test_dimension_mismatch_rejected() {
        let embedder = KeywordEmbedder::new();
        let index = VectorIndex::build("hash", sample_chunks(), &embedder).await.unwrap();
        let err = index.search(&[1.0, 2.0], 3).unwrap_err();
        assert!(matches!(err, Error::EmbeddingService(_)));
    }
}
