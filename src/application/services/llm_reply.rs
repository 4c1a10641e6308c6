use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

static JSON_OBJECT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\{.*\}").expect("json pattern is valid"));

/// Returns the body of the first fenced block tagged `language`, else of the
/// first untagged fence, else the whole reply.
pub fn strip_code_fences<'a>(reply: &'a str, language: &str) -> &'a str {
    let tagged = format!("```{}", language);
    let body = if let Some((_, rest)) = reply.split_once(tagged.as_str()) {
        rest
    } else if let Some((_, rest)) = reply.split_once("```") {
        rest
    } else {
        return reply.trim();
    };

    match body.split_once("```") {
        Some((inner, _)) => inner.trim(),
        None => body.trim(),
    }
}

/// Parses the JSON object in a model reply, tolerating code fences and
/// surrounding prose.
pub fn parse_json_object(reply: &str) -> Option<Value> {
    let stripped = strip_code_fences(reply, "json");
    if let Ok(value @ Value::Object(_)) = serde_json::from_str::<Value>(stripped) {
        return Some(value);
    }

    JSON_OBJECT
        .find(stripped)
        .and_then(|m| serde_json::from_str::<Value>(m.as_str()).ok())
        .filter(Value::is_object)
}
