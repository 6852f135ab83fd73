//! Answer generation: prompt formatting, the chat call and reply cleanup

pub mod ollama;
pub mod prompt;
pub mod reasoning;

pub use ollama::OllamaClient;
pub use prompt::PromptBuilder;
pub use reasoning::ReasoningFilter;

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::{Error, Result};
use crate::providers::{ChatMessage, ChatProvider};

/// Formats the prompt, calls the chat model once and cleans the reply
pub struct AnswerGenerator {
    chat: Arc<dyn ChatProvider>,
    filter: ReasoningFilter,
    timeout: Duration,
}

impl AnswerGenerator {
    /// Create a generator
    pub fn new(chat: Arc<dyn ChatProvider>, filter: ReasoningFilter, timeout: Duration) -> Self {
        Self {
            chat,
            filter,
            timeout,
        }
    }

    /// Model used for generation
    pub fn model(&self) -> &str {
        self.chat.model()
    }

    /// Answer `question` from `context`
    ///
    /// A failed or timed-out call is a [`Error::GenerationService`]; it is not retried.
    pub async fn generate(&self, question: &str, context: &str) -> Result<String> {
        let messages = [ChatMessage::user(PromptBuilder::build_qa_prompt(
            question, context,
        ))];

        let start = Instant::now();
        let reply = match tokio::time::timeout(self.timeout, self.chat.chat(&messages)).await {
            Ok(Ok(reply)) => reply,
            Ok(Err(Error::GenerationService(message))) => {
                return Err(Error::GenerationService(message));
            }
            Ok(Err(other)) => return Err(Error::generation(other.to_string())),
            Err(_) => {
                return Err(Error::generation(format!(
                    "{} did not answer within {}s",
                    self.chat.model(),
                    self.timeout.as_secs()
                )));
            }
        };

        tracing::info!(
            "{:09.3} seconds taken to generate answer with {}",
            start.elapsed().as_secs_f64(),
            self.chat.model()
        );

        if self.filter.has_reasoning(&reply.content) {
            tracing::debug!("Removing reasoning span from reply");
        }
        Ok(self.filter.strip(&reply.content).trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;

    use crate::config::ReasoningConfig;

    /// Chat stub returning a canned reply and recording prompts
    struct CannedChat {
        reply: String,
        delay: Duration,
        prompts: Mutex<Vec<Vec<ChatMessage>>>,
    }

    impl CannedChat {
        fn new(reply: &str) -> Self {
            Self {
                reply: reply.to_string(),
                delay: Duration::ZERO,
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ChatProvider for CannedChat {
        async fn chat(&self, messages: &[ChatMessage]) -> Result<ChatMessage> {
            self.prompts.lock().push(messages.to_vec());
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            Ok(ChatMessage::assistant(self.reply.clone()))
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(true)
        }

        fn name(&self) -> &str {
            "canned"
        }

        fn model(&self) -> &str {
            "canned-model"
        }
    }

    struct FailingChat;

    #[async_trait]
    impl ChatProvider for FailingChat {
        async fn chat(&self, _messages: &[ChatMessage]) -> Result<ChatMessage> {
            Err(Error::internal("connection reset"))
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(false)
        }

        fn name(&self) -> &str {
            "failing"
        }

        fn model(&self) -> &str {
            "failing-model"
        }
    }

    fn generator(chat: Arc<dyn ChatProvider>, timeout: Duration) -> AnswerGenerator {
        let filter = ReasoningFilter::from_config(&ReasoningConfig::default()).unwrap();
        AnswerGenerator::new(chat, filter, timeout)
    }

    #[tokio::test]
    async fn test_reasoning_removed_and_trimmed() {
        let chat = Arc::new(CannedChat::new("<think>reasoning...</think>Final answer."));
        let answer = generator(chat, Duration::from_secs(5))
            .generate("q", "c")
            .await
            .unwrap();
        assert_eq!(answer, "Final answer.");
    }

    #[tokio::test]
    async fn test_single_user_message_sent() {
        let chat = Arc::new(CannedChat::new("ok"));
        generator(chat.clone(), Duration::from_secs(5))
            .generate("What is F?", "F = ma")
            .await
            .unwrap();

        let prompts = chat.prompts.lock();
        assert_eq!(prompts.len(), 1);
        assert_eq!(
            prompts[0],
            vec![ChatMessage::user("Question: What is F?\n\nContext: F = ma")]
        );
    }

    #[tokio::test]
    async fn test_failure_is_generation_error() {
        let err = generator(Arc::new(FailingChat), Duration::from_secs(5))
            .generate("q", "c")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::GenerationService(_)));
    }

    #[tokio::test]
    async fn test_timeout_is_generation_error() {
        let mut chat = CannedChat::new("too late");
        chat.delay = Duration::from_secs(10);
        let err = generator(Arc::new(chat), Duration::from_millis(50))
            .generate("q", "c")
            .await
            .unwrap_err();
        match err {
            Error::GenerationService(message) => assert!(message.contains("did not answer")),
            other => panic!("unexpected error: {other}"),
        }
    }
}
