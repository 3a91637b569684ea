use std::fmt;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use haru_core::text::is_mostly_english;
use haru_core::{Error, Result, Summarizer, VisionAnalyzer};

use crate::Config;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_CHAT_MODEL: &str = "gpt-3.5-turbo";
const VISION_MODEL: &str = "gpt-4-turbo";

const TRANSLATE_PROMPT: &str = "You are a professional translator. Translate the given \
English text to Korean. Maintain the academic and formal tone appropriate for journal \
articles. Return only the Korean translation without any additional text or explanations.";

const SUMMARIZE_PROMPT: &str = "You are a helpful assistant that summarizes text. \
Provide clear, concise summaries in Korean.";

const FOOD_PROMPT: &str = "You are a food image analysis expert with deep knowledge in \
culinary arts. If there are more than two food photos, please add the two values together. \
Please analyze the food image provided below carefully, considering its appearance, \
ingredients, and regional characteristics. Your response must be written in Korean, \
formatted exactly like this:\n\n\
- 요리명: (dish name in Korean)\n\
- 칼로리: (exact calories in kcal)\n\
- 탄수화물: (carbohydrates in grams)\n\
- 단백질: (protein in grams)\n\
- 지방: (fat in grams)\n\
- 나트륨: (sodium in grams)\n\
- 식이섬유: (dietary fiber in grams)\n\
- 총량: (number of foods and total amount in grams)";

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Deserialize)]
struct Message {
    content: String,
}

/// Client for an OpenAI-compatible chat-completions API.
#[derive(Clone)]
pub struct OpenAiModel {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAiModel {
    pub fn new(config: Config) -> Result<Self> {
        let api_key = config
            .api_key
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .ok_or_else(|| Error::Inference("OpenAI API key is required".to_string()))?;

        Ok(Self {
            client: Client::new(),
            api_key,
            base_url: config
                .base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            model: config
                .model_name
                .unwrap_or_else(|| DEFAULT_CHAT_MODEL.to_string()),
        })
    }

    async fn chat(&self, system: &str, user: String, max_tokens: u32) -> Result<String> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: user,
                },
            ],
            max_tokens,
            temperature: 0.3,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json::<ChatResponse>()
            .await?;

        response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content.trim().to_string())
            .ok_or_else(|| Error::Inference("chat response contained no choices".to_string()))
    }
}

impl fmt::Debug for OpenAiModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiModel")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish()
    }
}

#[async_trait]
impl Summarizer for OpenAiModel {
    fn name(&self) -> &str {
        "openai"
    }

    async fn summarize(&self, text: &str) -> Result<String> {
        debug!(chars = text.chars().count(), "summarizing chunk");
        self.chat(
            SUMMARIZE_PROMPT,
            format!("Please summarize the following text:\n\n{text}"),
            500,
        )
        .await
    }

    async fn translate_to_korean(&self, text: &str) -> Result<String> {
        let translated = self
            .chat(
                TRANSLATE_PROMPT,
                format!("Translate this English text to Korean: {text}"),
                500,
            )
            .await?;
        debug!(from = text, to = %translated, "translated title");
        Ok(translated)
    }

    async fn shorten_title(&self, title: &str, max_words: usize) -> Result<String> {
        let system = if is_mostly_english(title) {
            format!(
                "You are a title summarizer. Create a very short, concise title with maximum \
                 {max_words} words that captures the main topic of the given title. Focus on \
                 the key subject and main concept. Return only the summarized title without \
                 quotes or additional text."
            )
        } else {
            format!(
                "You are a Korean title summarizer. Create a very short, concise Korean title \
                 with maximum {max_words} words that captures the main topic of the given \
                 Korean title. Focus on the key subject and main concept. Return only the \
                 summarized Korean title without quotes or additional text."
            )
        };
        self.chat(
            &system,
            format!("Summarize this title to maximum {max_words} words: {title}"),
            100,
        )
        .await
    }
}

#[async_trait]
impl VisionAnalyzer for OpenAiModel {
    async fn analyze_food_image(&self, image_base64: &str) -> Result<String> {
        let body = serde_json::json!({
            "model": VISION_MODEL,
            "messages": [{
                "role": "user",
                "content": [
                    { "type": "text", "text": FOOD_PROMPT },
                    {
                        "type": "image_url",
                        "image_url": { "url": format!("data:image/png;base64,{image_base64}") }
                    }
                ]
            }],
            "max_tokens": 300
        });

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json::<ChatResponse>()
            .await?;

        response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content.trim().to_string())
            .ok_or_else(|| Error::Inference("vision response contained no choices".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_api_key_is_accepted() {
        let model = OpenAiModel::new(Config {
            api_key: Some("test-key".to_string()),
            model_name: None,
            base_url: None,
        })
        .unwrap();
        assert_eq!(model.model, DEFAULT_CHAT_MODEL);
        assert_eq!(model.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn debug_redacts_the_api_key() {
        let model = OpenAiModel::new(Config {
            api_key: Some("super-secret".to_string()),
            model_name: None,
            base_url: None,
        })
        .unwrap();
        let rendered = format!("{model:?}");
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn chat_request_serializes_expected_shape() {
        let request = ChatRequest {
            model: "gpt-3.5-turbo".to_string(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: "hello".to_string(),
            }],
            max_tokens: 100,
            temperature: 0.3,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "gpt-3.5-turbo");
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["max_tokens"], 100);
    }
}
