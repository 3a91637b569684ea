use async_trait::async_trait;

use crate::Result;

/// Text-in/text-out language model capability. Implementations live in
/// `haru_inference`; the crawl pipeline only depends on this trait so the
/// whole core can run against a deterministic fake.
#[async_trait]
pub trait Summarizer: Send + Sync {
    fn name(&self) -> &str;

    /// Summarize one bounded chunk of article text in Korean.
    async fn summarize(&self, text: &str) -> Result<String>;

    async fn translate_to_korean(&self, text: &str) -> Result<String>;

    /// Condense a title to at most `max_words` words, keeping its language.
    async fn shorten_title(&self, title: &str, max_words: usize) -> Result<String>;
}

/// Image-in/text-out capability behind the meal analysis endpoint.
#[async_trait]
pub trait VisionAnalyzer: Send + Sync {
    /// Nutritional breakdown of a base64-encoded food photo, in Korean.
    async fn analyze_food_image(&self, image_base64: &str) -> Result<String>;
}
