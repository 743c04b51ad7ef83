//! Extraction of a structured verdict from freeform judge output.
//!
//! The judge is asked for JSON but routinely wraps it in prose or a fenced
//! code block. Extraction is an ordered chain of pure strategies — direct
//! parse, fenced block, first balanced brace span — each tried in turn
//! until one yields a candidate document, which is then validated.

use serde::Deserialize;

use crate::dao::models::{JudgmentEntity, WinnerSlot};
use crate::error::ServiceError;

/// Candidate document before validation; every field optional so missing
/// keys fail validation rather than deserialization.
#[derive(Debug, Deserialize)]
struct RawVerdict {
    winner: Option<String>,
    critique1: Option<String>,
    critique2: Option<String>,
    roast: Option<String>,
    prompt: Option<String>,
}

/// Parse judge output into a verdict, tolerating prose and fence wrapping.
pub fn parse_verdict(text: &str) -> Result<JudgmentEntity, ServiceError> {
    let raw = parse_direct(text)
        .or_else(|| parse_fenced(text))
        .or_else(|| parse_brace_span(text))
        .ok_or_else(|| {
            ServiceError::MalformedJudgment("no JSON document found in judge response".into())
        })?;

    validate(raw)
}

fn parse_direct(text: &str) -> Option<RawVerdict> {
    serde_json::from_str(text.trim()).ok()
}

fn parse_fenced(text: &str) -> Option<RawVerdict> {
    let after_open = text.split_once("```")?.1;
    // Skip an optional language tag on the opening fence line.
    let body = match after_open.split_once('\n') {
        Some((first_line, rest)) if first_line.trim().chars().all(char::is_alphanumeric) => rest,
        _ => after_open,
    };
    let inner = body.split_once("```")?.0;
    serde_json::from_str(inner.trim()).ok()
}

fn parse_brace_span(text: &str) -> Option<RawVerdict> {
    let span = first_brace_span(text)?;
    serde_json::from_str(span).ok()
}

/// Slice of `text` covering the first balanced `{...}` span, tracking
/// string literals so braces inside values do not confuse the depth count.
fn first_brace_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + ch.len_utf8()]);
                }
            }
            _ => {}
        }
    }

    None
}

fn validate(raw: RawVerdict) -> Result<JudgmentEntity, ServiceError> {
    let winner = match raw.winner.as_deref() {
        Some("1") => WinnerSlot::Host,
        Some("2") => WinnerSlot::Guest,
        Some(other) => {
            return Err(ServiceError::MalformedJudgment(format!(
                "winner must be \"1\" or \"2\", got `{other}`"
            )));
        }
        None => {
            return Err(ServiceError::MalformedJudgment(
                "missing required field `winner`".into(),
            ));
        }
    };

    let critique1 = require_non_empty("critique1", raw.critique1)?;
    let critique2 = require_non_empty("critique2", raw.critique2)?;
    let roast = require_non_empty("roast", raw.roast)?;

    Ok(JudgmentEntity {
        winner,
        critique1,
        critique2,
        roast,
        prompt: raw.prompt.unwrap_or_default(),
    })
}

fn require_non_empty(field: &str, value: Option<String>) -> Result<String, ServiceError> {
    match value {
        Some(value) if !value.trim().is_empty() => Ok(value),
        Some(_) => Err(ServiceError::MalformedJudgment(format!(
            "field `{field}` is empty"
        ))),
        None => Err(ServiceError::MalformedJudgment(format!(
            "missing required field `{field}`"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAYLOAD: &str = r#"{
        "winner": "2",
        "critique1": "a brave attempt at a cat, though it resembles a potato",
        "critique2": "a confident cat with an actual hat",
        "roast": "drawing 1 appears to have been made during an earthquake",
        "prompt": "a happy cat wearing a hat"
    }"#;

    fn expected() -> JudgmentEntity {
        parse_verdict(PAYLOAD).unwrap()
    }

    #[test]
    fn parses_raw_json() {
        let verdict = parse_verdict(PAYLOAD).unwrap();
        assert_eq!(verdict.winner, WinnerSlot::Guest);
        assert_eq!(verdict.prompt, "a happy cat wearing a hat");
    }

    #[test]
    fn parses_fenced_block_with_surrounding_prose() {
        let wrapped = format!(
            "Sure! Here is my judgment of the two drawings:\n```json\n{PAYLOAD}\n```\nHope that helps!"
        );
        assert_eq!(parse_verdict(&wrapped).unwrap(), expected());
    }

    #[test]
    fn parses_fence_without_language_tag() {
        let wrapped = format!("```\n{PAYLOAD}\n```");
        assert_eq!(parse_verdict(&wrapped).unwrap(), expected());
    }

    #[test]
    fn parses_first_brace_span_in_longer_message() {
        let wrapped = format!("After careful deliberation I ruled as follows: {PAYLOAD} -- the judge");
        assert_eq!(parse_verdict(&wrapped).unwrap(), expected());
    }

    #[test]
    fn braces_inside_string_values_do_not_break_span_scan() {
        let tricky = r#"verdict: {"winner":"1","critique1":"nice {curly} strokes","critique2":"fine","roast":"oof","prompt":"x"} done"#;
        let verdict = parse_verdict(tricky).unwrap();
        assert_eq!(verdict.critique1, "nice {curly} strokes");
    }

    #[test]
    fn rejects_missing_fields() {
        let err = parse_verdict(r#"{"winner":"1","critique1":"a"}"#).unwrap_err();
        assert!(matches!(err, ServiceError::MalformedJudgment(_)));
    }

    #[test]
    fn rejects_empty_roast() {
        let err = parse_verdict(
            r#"{"winner":"1","critique1":"a","critique2":"b","roast":"  "}"#,
        )
        .unwrap_err();
        assert!(matches!(err, ServiceError::MalformedJudgment(_)));
    }

    #[test]
    fn rejects_unknown_winner() {
        let err = parse_verdict(
            r#"{"winner":"3","critique1":"a","critique2":"b","roast":"c"}"#,
        )
        .unwrap_err();
        assert!(matches!(err, ServiceError::MalformedJudgment(_)));
    }

    #[test]
    fn rejects_prose_without_json() {
        let err = parse_verdict("I simply cannot decide.").unwrap_err();
        assert!(matches!(err, ServiceError::MalformedJudgment(_)));
    }
}
