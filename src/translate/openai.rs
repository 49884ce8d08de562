use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::capability::{TranslationError, Translator};
use crate::translate::prompt::{build_messages, extract_sql, ChatMessage};

/// Connection settings for an OpenAI-compatible chat completions endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslatorSettings {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Translator capability that asks a chat model for a SQL query
#[derive(Debug, Clone)]
pub struct OpenAiTranslator {
    client: reqwest::Client,
    settings: TranslatorSettings,
    context: Option<String>,
}

impl OpenAiTranslator {
    pub fn new(client: reqwest::Client, settings: TranslatorSettings, context: Option<String>) -> Self {
        Self {
            client,
            settings,
            context,
        }
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.settings.base_url.trim_end_matches('/'))
    }
}

#[async_trait::async_trait]
impl Translator for OpenAiTranslator {
    fn context(&self) -> Option<&str> {
        self.context.as_deref()
    }

    async fn convert_to_sql(
        &self,
        schema: &str,
        context: Option<&str>,
        prompt: &str,
    ) -> Result<String, TranslationError> {
        let messages = build_messages(schema, context, prompt);
        let request = ChatCompletionRequest {
            model: &self.settings.model,
            messages: &messages,
            temperature: 0.0,
        };

        debug!("Requesting completion from {} with model {}", self.completions_url(), self.settings.model);
        let response = self
            .client
            .post(self.completions_url())
            .bearer_auth(&self.settings.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|err| TranslationError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response
                .text()
                .await
                .unwrap_or_else(|err| format!("<unreadable body: {}>", err));
            return Err(TranslationError::Upstream {
                status: status.as_u16(),
                detail,
            });
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|err| TranslationError::MalformedResponse(err.to_string()))?;

        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| TranslationError::MalformedResponse("no completion choices".to_string()))?;

        let sql = extract_sql(&content);
        if sql.is_empty() {
            return Err(TranslationError::MalformedResponse("empty completion".to_string()));
        }
        info!("Model {} produced {} bytes of SQL", self.settings.model, sql.len());
        Ok(sql)
    }
}
