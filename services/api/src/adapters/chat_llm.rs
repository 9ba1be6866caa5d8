//! services/api/src/adapters/chat_llm.rs
//!
//! This module contains the adapter for the completion gateway.
//! It implements the `CompletionService` port from the `core` crate.

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs},
    Client,
};
use async_trait::async_trait;
use sabi_assistant_core::ports::{
    CompletionOptions, CompletionService, GatewayError, GatewayErrorKind,
};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `CompletionService` using an OpenAI-compatible LLM.
#[derive(Clone)]
pub struct OpenAiChatAdapter {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiChatAdapter {
    /// Creates a new `OpenAiChatAdapter`.
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }
}

// Transport-level failures are worth a later retry; anything the API itself
// rejected (bad request, exhausted quota, undecodable body) is not.
fn classify(error: &OpenAIError) -> GatewayErrorKind {
    match error {
        OpenAIError::Reqwest(_) => GatewayErrorKind::Transient,
        _ => GatewayErrorKind::Permanent,
    }
}

fn to_gateway_error(error: OpenAIError) -> GatewayError {
    GatewayError {
        kind: classify(&error),
        message: error.to_string(),
    }
}

//=========================================================================================
// `CompletionService` Trait Implementation
//=========================================================================================

#[async_trait]
impl CompletionService for OpenAiChatAdapter {
    /// Sends the finished prompt to the hosted model and returns the reply text.
    ///
    /// The prompt already carries the persona, instruction and language
    /// preface, so it travels as a single user message.
    async fn complete(
        &self,
        prompt: &str,
        options: &CompletionOptions,
    ) -> Result<String, GatewayError> {
        let messages = vec![ChatCompletionRequestUserMessageArgs::default()
            .content(prompt)
            .build()
            .map_err(to_gateway_error)?
            .into()];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .max_tokens(options.max_reply_tokens)
            .temperature(options.temperature)
            .n(1)
            .build()
            .map_err(to_gateway_error)?;

        // Call the API and manually map the error if it occurs, which respects the orphan rule.
        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(to_gateway_error)?;

        // Extract the text content from the first choice in the response.
        if let Some(choice) = response.choices.into_iter().next() {
            if let Some(content) = choice.message.content {
                Ok(content)
            } else {
                Err(GatewayError::permanent(
                    "Completion response contained no text content.",
                ))
            }
        } else {
            Err(GatewayError::permanent(
                "Completion response contained no choices.",
            ))
        }
    }
}
