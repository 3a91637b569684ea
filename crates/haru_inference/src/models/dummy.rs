use async_trait::async_trait;

use haru_core::{Result, Summarizer, VisionAnalyzer};

/// Deterministic stand-in for tests and offline runs: summaries and titles
/// are word truncations, translation is identity.
#[derive(Debug, Clone, Copy)]
pub struct DummyModel;

#[async_trait]
impl Summarizer for DummyModel {
    fn name(&self) -> &str {
        "dummy"
    }

    async fn summarize(&self, text: &str) -> Result<String> {
        let words: Vec<&str> = text.split_whitespace().take(20).collect();
        Ok(words.join(" "))
    }

    async fn translate_to_korean(&self, text: &str) -> Result<String> {
        Ok(text.to_string())
    }

    async fn shorten_title(&self, title: &str, max_words: usize) -> Result<String> {
        let words: Vec<&str> = title.split_whitespace().take(max_words).collect();
        Ok(words.join(" "))
    }
}

#[async_trait]
impl VisionAnalyzer for DummyModel {
    async fn analyze_food_image(&self, _image_base64: &str) -> Result<String> {
        Ok("- 요리명: 테스트 음식\n- 칼로리: 0kcal".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn summarize_keeps_the_first_twenty_words() {
        let text = (1..=30).map(|i| format!("w{i}")).collect::<Vec<_>>().join(" ");
        let summary = DummyModel.summarize(&text).await.unwrap();
        assert_eq!(summary.split_whitespace().count(), 20);
        assert!(summary.starts_with("w1 w2"));
    }

    #[tokio::test]
    async fn shorten_title_respects_the_word_cap() {
        let title = "지역사회 영양 식생활 조사 결과에 대한 장기 보고";
        let short = DummyModel.shorten_title(title, 5).await.unwrap();
        assert_eq!(short.split_whitespace().count(), 5);
    }

    #[tokio::test]
    async fn translation_is_identity() {
        let text = "Dietary patterns among Korean adults";
        assert_eq!(DummyModel.translate_to_korean(text).await.unwrap(), text);
    }
}
