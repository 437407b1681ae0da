pub mod assistant;
pub mod gemini;

use anyhow::Result;

/// A text-generation backend. Implemented by [`gemini::GeminiClient`];
/// tests substitute their own.
pub trait TextGenerator {
    fn generate(&self, prompt: &str) -> Result<String>;
}

impl<G: TextGenerator + ?Sized> TextGenerator for &G {
    fn generate(&self, prompt: &str) -> Result<String> {
        (**self).generate(prompt)
    }
}

/// Prefix of the string `Summarizer::summarize` returns instead of a summary
/// when generation fails.
pub const SUMMARY_ERROR_PREFIX: &str = "Error summarizing: ";

pub struct Summarizer<G> {
    generator: G,
    language: String,
}

impl<G: TextGenerator> Summarizer<G> {
    pub fn new(generator: G, language: impl Into<String>) -> Self {
        Self {
            generator,
            language: language.into(),
        }
    }

    pub fn prompt(&self, text: &str, subject: &str) -> String {
        format!(
            "Summarize the following email concisely and clearly:\n\
             \n\
             Subject: {subject}\n\
             Content: {text}\n\
             \n\
             Provide a summary in {} with the main points in up to 3 sentences.\n",
            self.language
        )
    }

    pub fn try_summarize(&self, text: &str, subject: &str) -> Result<String> {
        self.generator.generate(&self.prompt(text, subject))
    }

    /// The generated summary, or `SUMMARY_ERROR_PREFIX` followed by the
    /// failure when the backend could not be reached.
    pub fn summarize(&self, text: &str, subject: &str) -> String {
        match self.try_summarize(text, subject) {
            Ok(s) => s,
            Err(e) => {
                log::warn!("summarization failed: {e:#}");
                format!("{SUMMARY_ERROR_PREFIX}{e:#}")
            }
        }
    }
}
