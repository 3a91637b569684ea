use std::sync::Arc;

use haru_core::{Error, Result, Summarizer, VisionAnalyzer};

use crate::Config;

pub mod dummy;
pub mod openai;

pub use dummy::DummyModel;
pub use openai::OpenAiModel;

/// Build the text and vision capabilities for a model selected by name.
pub fn create_model(
    name: &str,
    config: &Config,
) -> Result<(Arc<dyn Summarizer>, Arc<dyn VisionAnalyzer>)> {
    match name {
        "openai" => {
            let model = OpenAiModel::new(config.clone())?;
            Ok((Arc::new(model.clone()), Arc::new(model)))
        }
        "dummy" => Ok((Arc::new(DummyModel), Arc::new(DummyModel))),
        other => Err(Error::Inference(format!("unknown model: {other}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_model_is_rejected() {
        let config = Config::default();
        assert!(create_model("gpt-nonexistent", &config).is_err());
    }

    #[test]
    fn dummy_model_needs_no_configuration() {
        let (summarizer, _vision) = create_model("dummy", &Config::default()).unwrap();
        assert_eq!(summarizer.name(), "dummy");
    }
}
