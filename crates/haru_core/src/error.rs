use thiserror::Error;

/// Why a served page failed article extraction. Distinct from transport
/// failures: the page loaded, but does not carry the journal's article
/// layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionFailure {
    TitleMissing,
    BodyContainerMissing,
    BodyEmpty,
}

impl std::fmt::Display for ExtractionFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let msg = match self {
            ExtractionFailure::TitleMissing => "no valid article title found",
            ExtractionFailure::BodyContainerMissing => "article body container not found",
            ExtractionFailure::BodyEmpty => "article body is empty",
        };
        f.write_str(msg)
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Not an article: {0}")]
    NotAnArticle(ExtractionFailure),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Inference error: {0}")]
    Inference(String),

    #[error("Crawl error: {0}")]
    Crawl(String),

    #[error("External error: {0}")]
    External(#[from] anyhow::Error),
}

impl Error {
    /// True for the failures a batch crawl records as a handled `error`
    /// outcome; everything else is an unexpected `exception`.
    pub fn is_handled(&self) -> bool {
        matches!(
            self,
            Error::Http(_) | Error::Transport(_) | Error::NotAnArticle(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extraction_failures_are_handled() {
        assert!(Error::NotAnArticle(ExtractionFailure::TitleMissing).is_handled());
        assert!(Error::Transport("status 500".to_string()).is_handled());
        assert!(!Error::Storage("insert failed".to_string()).is_handled());
        assert!(!Error::Inference("model unavailable".to_string()).is_handled());
    }

    #[test]
    fn extraction_failure_messages_are_distinct() {
        let reasons = [
            ExtractionFailure::TitleMissing,
            ExtractionFailure::BodyContainerMissing,
            ExtractionFailure::BodyEmpty,
        ];
        let messages: Vec<String> = reasons.iter().map(|r| r.to_string()).collect();
        assert_eq!(messages.len(), 3);
        assert!(messages.iter().all(|m| !m.is_empty()));
        assert_ne!(messages[0], messages[1]);
        assert_ne!(messages[1], messages[2]);
    }
}
