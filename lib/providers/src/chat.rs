use anyhow::{anyhow, Result};
use gadgetcache_core::SpecSheet;
use gadgetcache_normalizer::SpecExtractor;
use gadgetcache_query::QueryRewriter;
use reqwest::blocking::Client;
use serde_json::Value;
use tracing::debug;

use crate::{auth_headers, endpoint, http_client, ProviderConfig};

const EXTRACT_PROMPT: &str = "Extract phone specifications from the listing below. \
Return ONLY a JSON object with the keys ram (GB, integer), storage (GB, integer), \
camera_mp (integer), battery_mah (integer), display_inches (number) and processor (string). \
Use ram=4, storage=64, camera_mp=12, battery_mah=4000, display_inches=6.5, \
processor=\"Unknown\" for anything not stated.";

const REWRITE_PROMPT: &str = "Rewrite the shopping query below as a short phone search \
phrase of at most five words (for example \"budget gaming phone\" or \"samsung s24 ultra phone\"). \
Reply with the phrase only.";

/// OpenAI-compatible chat completions client
pub struct ChatClient {
    cfg: ProviderConfig,
    client: Client,
}

impl ChatClient {
    pub fn new(cfg: ProviderConfig) -> Result<Self> {
        let client = http_client(&cfg)?;
        Ok(Self { cfg, client })
    }

    fn complete(&self, system: &str, user: &str) -> Result<String> {
        let body = serde_json::json!({
            "model": self.cfg.model,
            "temperature": self.cfg.temperature,
            "messages": [
                { "role": "system", "content": system },
                { "role": "user", "content": user },
            ],
        });
        let json: Value = self
            .client
            .post(endpoint(&self.cfg, "chat/completions"))
            .headers(auth_headers(&self.cfg.api_key)?)
            .json(&body)
            .send()?
            .error_for_status()?
            .json()?;
        message_content(&json)
    }
}

/// Text of the first choice
fn message_content(json: &Value) -> Result<String> {
    json.get("choices")
        .and_then(|v| v.as_array())
        .and_then(|arr| arr.first())
        .and_then(|choice| choice.get("message"))
        .and_then(|msg| msg.get("content"))
        .and_then(|c| c.as_str())
        .map(str::to_string)
        .ok_or_else(|| anyhow!("chat response is missing message content"))
}

/// Parse a spec sheet from model output, tolerating a Markdown code fence
fn parse_spec_sheet(content: &str) -> Result<SpecSheet> {
    let text = content
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim();
    let value: Value =
        serde_json::from_str(text).map_err(|e| anyhow!("spec response is not valid JSON: {e}"))?;
    if !value.is_object() {
        return Err(anyhow!("spec response is not a JSON object"));
    }
    Ok(serde_json::from_value(value)?)
}

fn clean_rewrite(content: &str) -> String {
    content
        .lines()
        .next()
        .unwrap_or_default()
        .trim()
        .trim_matches(|c: char| c == '"' || c == '\'' || c == '`')
        .trim()
        .to_lowercase()
}

impl SpecExtractor for ChatClient {
    fn extract_specs(&self, name: &str, features: &[String]) -> Result<SpecSheet> {
        let user = format!("Phone: {}\nFeatures:\n{}", name, features.join("\n"));
        let content = self.complete(EXTRACT_PROMPT, &user)?;
        debug!("Spec extraction for '{}': {}", name, content);
        parse_spec_sheet(&content)
    }
}

impl QueryRewriter for ChatClient {
    fn rewrite(&self, query: &str, budget: Option<u32>) -> Result<String> {
        let user = match budget {
            Some(budget) => format!("Query: {query}\nBudget: up to {budget}"),
            None => format!("Query: {query}"),
        };
        let content = self.complete(REWRITE_PROMPT, &user)?;
        Ok(clean_rewrite(&content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_content() {
        let json = serde_json::json!({
            "choices": [
                { "message": { "content": "gaming phone" } }
            ]
        });
        assert_eq!(message_content(&json).unwrap(), "gaming phone");
        assert!(message_content(&serde_json::json!({ "choices": [] })).is_err());
    }

    #[test]
    fn test_parse_fenced_spec_sheet() {
        let content = "```json\n{\"ram\": 8, \"storage\": 256, \"camera_mp\": 50, \"battery_mah\": 5500, \"display_inches\": 6.78, \"processor\": \"Dimensity 7050\"}\n```";
        let specs = parse_spec_sheet(content).unwrap();
        assert_eq!(specs.ram, 8);
        assert_eq!(specs.storage, 256);
        assert_eq!(specs.processor, "Dimensity 7050");
    }

    #[test]
    fn test_partial_spec_sheet_uses_defaults() {
        let specs = parse_spec_sheet("{\"ram\": 6}").unwrap();
        assert_eq!(specs.ram, 6);
        assert_eq!(specs.battery_mah, 4000);
    }

    #[test]
    fn test_malformed_spec_sheet_is_an_error() {
        assert!(parse_spec_sheet("Sorry, I cannot help with that.").is_err());
        assert!(parse_spec_sheet("[1, 2, 3]").is_err());
        assert!(parse_spec_sheet("{\"ram\": \"eight\"}").is_err());
    }

    #[test]
    fn test_clean_rewrite() {
        assert_eq!(clean_rewrite("\"Budget Gaming Phone\"\n"), "budget gaming phone");
        assert_eq!(clean_rewrite(""), "");
    }
}
