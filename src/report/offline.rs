use anyhow::Result;

use super::prompt::{information_value, ACTION_KEY, PEOPLE_KEY, STATUS_KEY};
use super::{Generated, TextGenerator};

/// Deterministic provider that needs no network.
///
/// Reads the INFORMATION block of a report prompt and fills a fixed
/// three-sentence template. Prompts without one get a fixed greeting.
#[derive(Clone, Copy, Debug, Default)]
pub struct OfflineGenerator;

impl OfflineGenerator {
    pub fn new() -> Self {
        Self
    }
}

impl TextGenerator for OfflineGenerator {
    fn name(&self) -> &'static str {
        "offline"
    }

    fn generate(&self, prompt: &str) -> Result<Generated> {
        let text = match (
            information_value(prompt, PEOPLE_KEY),
            information_value(prompt, STATUS_KEY),
        ) {
            (Some(people), Some(status)) => {
                let noun = if people == "1" { "person" } else { "people" };
                let closing = match information_value(prompt, ACTION_KEY) {
                    Some(action) => format!("Our advice right now: {}.", action.to_lowercase()),
                    None => "We will keep watching to make sure everyone stays safe.".to_string(),
                };
                format!(
                    "The camera counted {} {} in this picture. That means the area is {} right now. {}",
                    people,
                    noun,
                    status.to_lowercase(),
                    closing
                )
            }
            _ => "Hello! The offline report writer is ready.".to_string(),
        };
        Ok(Generated {
            text,
            provider: self.name().to_string(),
            model: "template".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::{ClassificationMode, PersonCount};
    use crate::report::prompt::{build_prompt, ReportFacts};

    #[test]
    fn writes_three_sentences_from_prompt() {
        let outcome = ClassificationMode::Tiered.classify(PersonCount::new(1));
        let prompt = build_prompt(&ReportFacts::from(&outcome));
        let generated = OfflineGenerator::new().generate(&prompt).unwrap();
        assert_eq!(
            generated.text,
            "The camera counted 1 person in this picture. That means the area is empty right now. \
             Our advice right now: area is clear."
        );
        assert_eq!(generated.text.matches(". ").count() + 1, 3);
    }

    #[test]
    fn greets_without_information() {
        let generated = OfflineGenerator::new().generate("Say hello!").unwrap();
        assert!(generated.text.starts_with("Hello!"));
        assert_eq!(generated.provider, "offline");
    }
}
