//! Prompt templates for question answering

use crate::types::ScoredChunk;

/// Prompt builder for RAG queries
pub struct PromptBuilder;

impl PromptBuilder {
    /// Join retrieved chunk texts, in retrieval order, separated by a blank line
    pub fn build_context(results: &[ScoredChunk]) -> String {
        results
            .iter()
            .map(|r| r.chunk.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Build the single user prompt sent to the chat model
    pub fn build_qa_prompt(question: &str, context: &str) -> String {
        format!("Question: {question}\n\nContext: {context}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Chunk;

    fn scored(index: u32, text: &str, similarity: f32) -> ScoredChunk {
        ScoredChunk {
            chunk: Chunk {
                index,
                segment: 1,
                char_offset: 0,
                text: text.to_string(),
            },
            similarity,
        }
    }

    #[test]
    fn test_context_keeps_retrieval_order() {
        let results = vec![scored(3, "third chunk", 0.9), scored(0, "first chunk", 0.4)];
        assert_eq!(
            PromptBuilder::build_context(&results),
            "third chunk\n\nfirst chunk"
        );
    }

    #[test]
    fn test_empty_context() {
        assert_eq!(PromptBuilder::build_context(&[]), "");
        assert_eq!(
            PromptBuilder::build_qa_prompt("Why?", ""),
            "Question: Why?\n\nContext: "
        );
    }

    #[test]
    fn test_qa_prompt_format() {
        let prompt = PromptBuilder::build_qa_prompt(
            "What does Newton's second law state?",
            "Newton's second law states force equals mass times acceleration.",
        );
        assert_eq!(
            prompt,
            "Question: What does Newton's second law state?\n\nContext: Newton's second law states force equals mass times acceleration."
        );
    }
}
