//! Ingest, chunk, index, retrieve, generate

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;

use crate::config::RagConfig;
use crate::error::{Error, Result};
use crate::generation::{AnswerGenerator, PromptBuilder, ReasoningFilter};
use crate::ingestion::{DocumentParser, FileParser, TextChunker};
use crate::providers::{ollama::ollama_providers, ChatProvider, EmbeddingProvider};
use crate::retrieval::{CacheStats, IndexCache, VectorIndex};
use crate::types::{document::hash_bytes, AnswerOutcome, Chunk, Document, FileType};

/// Result of indexing one upload
#[derive(Debug, Clone)]
pub struct IndexedDocument {
    /// The built (or cached) index
    pub index: Arc<VectorIndex>,
    /// Uploaded filename
    pub filename: String,
    /// Detected file type
    pub file_type: FileType,
    /// Pages/sections that contributed chunks
    pub segments: usize,
    /// True when no embedding calls were made
    pub cached: bool,
}

/// The retrieval-augmented answering pipeline
///
/// Stateless between calls apart from the index cache; the caller decides
/// which index a question runs against.
pub struct RagPipeline {
    parser: Arc<dyn DocumentParser>,
    chunker: TextChunker,
    embedder: Arc<dyn EmbeddingProvider>,
    chat: Arc<dyn ChatProvider>,
    generator: AnswerGenerator,
    cache: Option<IndexCache>,
    top_k: usize,
}

impl RagPipeline {
    /// Build a pipeline from explicit collaborators
    pub fn new(
        config: &RagConfig,
        parser: Arc<dyn DocumentParser>,
        embedder: Arc<dyn EmbeddingProvider>,
        chat: Arc<dyn ChatProvider>,
    ) -> Result<Self> {
        config.validate()?;

        let chunker = TextChunker::from_config(&config.chunking)?;
        let filter = ReasoningFilter::from_config(&config.reasoning)?;
        let generator = AnswerGenerator::new(
            Arc::clone(&chat),
            filter,
            config.llm.generation_timeout(),
        );
        let cache = config
            .cache
            .enabled
            .then(|| IndexCache::new(config.cache.max_entries));

        Ok(Self {
            parser,
            chunker,
            embedder,
            chat,
            generator,
            cache,
            top_k: config.retrieval.top_k,
        })
    }

    /// Build a pipeline backed by the local parser and Ollama
    pub fn from_config(config: &RagConfig) -> Result<Self> {
        let parser = Arc::new(FileParser::new(config.parsing.parse_timeout()));
        let (embedder, chat) = ollama_providers(&config.llm)?;
        Self::new(config, parser, Arc::new(embedder), Arc::new(chat))
    }

    /// Extract, chunk and embed an upload
    ///
    /// Any failure returns an error and no index; callers keep whatever
    /// index they had before.
    pub async fn index_document(&self, filename: &str, data: &[u8]) -> Result<IndexedDocument> {
        let file_type = FileType::detect(filename, data);

        if let Some(cache) = &self.cache {
            if let Some(index) = cache.get(&hash_bytes(data), self.embedder.model()) {
                tracing::info!("Reusing cached index for '{}' ({} chunks)", filename, index.len());
                return Ok(IndexedDocument {
                    segments: count_segments(index.chunks()),
                    index,
                    filename: filename.to_string(),
                    file_type,
                    cached: true,
                });
            }
        }

        let segments = self.parser.parse(filename, data).await?;
        let document = Document::new(filename, data, segments);

        let start = Instant::now();
        let chunks: Vec<Chunk> = self.chunker.chunks(&document.segments).collect();
        tracing::info!(
            "{:09.3} seconds taken to split '{}' ({} bytes, {} chars) into {} chunks",
            start.elapsed().as_secs_f64(),
            document.filename,
            document.size_bytes,
            document.char_len(),
            chunks.len()
        );

        let index = Arc::new(
            VectorIndex::build(document.content_hash.clone(), chunks, self.embedder.as_ref())
                .await?,
        );

        if let Some(cache) = &self.cache {
            cache.insert(Arc::clone(&index));
        }

        Ok(IndexedDocument {
            segments: count_segments(index.chunks()),
            index,
            filename: document.filename,
            file_type: document.file_type,
            cached: false,
        })
    }

    /// Answer a question against an optional index
    ///
    /// Without an index the outcome is [`AnswerOutcome::NoDocument`] and no
    /// service is called. Zero retrieved chunks still go to the model with an
    /// empty context.
    pub async fn answer(
        &self,
        index: Option<&VectorIndex>,
        question: &str,
        top_k: Option<usize>,
    ) -> Result<AnswerOutcome> {
        let Some(index) = index else {
            tracing::info!("Question asked with no document indexed");
            return Ok(AnswerOutcome::NoDocument);
        };

        let question = question.trim();
        if question.is_empty() {
            return Err(Error::InvalidRequest("question must not be empty".to_string()));
        }

        let k = top_k.unwrap_or(self.top_k);
        let sources = index.retrieve(question, k, self.embedder.as_ref()).await?;
        let context = PromptBuilder::build_context(&sources);
        let answer = self.generator.generate(question, &context).await?;

        Ok(AnswerOutcome::Answered { answer, sources })
    }

    /// Chunker in use
    pub fn chunker(&self) -> &TextChunker {
        &self.chunker
    }

    /// Embedding model identifier
    pub fn embed_model(&self) -> &str {
        self.embedder.model()
    }

    /// Chat model identifier
    pub fn chat_model(&self) -> &str {
        self.generator.model()
    }

    /// Index cache counters, if caching is enabled
    pub fn cache_stats(&self) -> Option<CacheStats> {
        self.cache.as_ref().map(IndexCache::stats)
    }

    /// True when both model services respond
    pub async fn health_check(&self) -> bool {
        let embed_ok = self.embedder.health_check().await.unwrap_or(false);
        let chat_ok = self.chat.health_check().await.unwrap_or(false);
        embed_ok && chat_ok
    }
}

fn count_segments<'a>(chunks: impl Iterator<Item = &'a Chunk>) -> usize {
    chunks.map(|c| c.segment).collect::<BTreeSet<_>>().len()
}

#[cfg(test)]
pub(crate) mod testing {
    //! Deterministic stand-ins for the model services

    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use crate::error::{Error, Result};
    use crate::providers::{ChatMessage, ChatProvider, EmbeddingProvider};

    const VOCABULARY: [&str; 8] = [
        "newton", "force", "mass", "acceleration", "capital", "france", "planet", "orbit",
    ];

    /// Bag-of-words embedder over a fixed vocabulary
    #[derive(Default)]
    pub struct StubEmbedder {
        pub calls: AtomicUsize,
        pub fail: AtomicBool,
    }

    #[async_trait]
    impl EmbeddingProvider for StubEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail.load(Ordering::SeqCst) {
                return Err(Error::embedding("embedding service unavailable"));
            }
            let lower = text.to_lowercase();
            let mut vector: Vec<f32> = VOCABULARY
                .iter()
                .map(|w| lower.matches(w).count() as f32)
                .collect();
            // Keeps every vector non-zero
            vector.push(0.1);
            Ok(vector)
        }

        fn model(&self) -> &str {
            "stub-embed"
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(true)
        }

        fn name(&self) -> &str {
            "stub"
        }
    }

    /// Chat model that "answers" by echoing the context behind a reasoning span
    #[derive(Default)]
    pub struct StubChat {
        pub calls: AtomicUsize,
        pub prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ChatProvider for StubChat {
        async fn chat(&self, messages: &[ChatMessage]) -> Result<ChatMessage> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let prompt = messages.last().map(|m| m.content.clone()).unwrap_or_default();
            self.prompts.lock().push(prompt.clone());
            let context = prompt.split_once("Context: ").map(|(_, c)| c).unwrap_or("");
            Ok(ChatMessage::assistant(format!(
                "<think>\nLooking at the context.\n</think>\n\nAccording to the document: {}",
                context
            )))
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(true)
        }

        fn name(&self) -> &str {
            "stub"
        }

        fn model(&self) -> &str {
            "stub-chat"
        }
    }
}
