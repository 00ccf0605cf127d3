//! Bounding documents on the way to the model and recovering structured results
//! from what comes back.
//!
//! Replies go through two stages. The strict stage trims the reply, removes a
//! surrounding code fence and parses what is left. If that fails, the repair stage
//! works from the untouched reply: typographic quotes become ASCII, line breaks
//! become spaces, and the greedy `{ ... }` span is parsed instead.

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::AnalysisResult;

pub const REQUIRED_FIELDS: [&str; 4] = ["propertyAddress", "issues", "recommendations", "summary"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    #[error("model returned an empty reply")]
    EmptyModelReply,

    #[error("missing required fields: {}", .0.join(", "))]
    MissingRequiredFields(Vec<&'static str>),

    #[error("malformed JSON: {0}")]
    MalformedJson(String),

    #[error("reply does not match the analysis schema: {0}")]
    SchemaMismatch(String),
}

/// Document text after applying the character budget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundedDocument<'a> {
    pub text: &'a str,
    pub original_chars: usize,
    pub kept_chars: usize,
}

impl BoundedDocument<'_> {
    pub fn is_truncated(&self) -> bool {
        self.kept_chars < self.original_chars
    }
}

/// Cuts `text` to at most `max_chars` characters, preferring the latest line break
/// or sentence end (". ") inside the budget over a hard cut.
pub fn truncate_document(text: &str, max_chars: usize) -> BoundedDocument<'_> {
    let Some((hard_cut, at_budget)) = text.char_indices().nth(max_chars) else {
        let chars = text.chars().count();
        return BoundedDocument {
            text,
            original_chars: chars,
            kept_chars: chars,
        };
    };

    // the character at the budget offset is still a candidate break
    let window = &text[..hard_cut + at_budget.len_utf8()];
    let line_break = window.rfind('\n');
    // keep the period, drop the space
    let sentence_end = window.rfind(". ").map(|at| at + 1);

    let cut = line_break
        .max(sentence_end)
        .filter(|&at| at > 0)
        .map_or(hard_cut, |at| at.min(hard_cut));

    let kept = &text[..cut];
    let document = BoundedDocument {
        text: kept,
        original_chars: text.chars().count(),
        kept_chars: kept.chars().count(),
    };
    debug!(
        original = document.original_chars,
        kept = document.kept_chars,
        "document truncated to fit budget"
    );
    document
}

/// A recovered result and whether the repair stage was needed to get it.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub result: AnalysisResult,
    pub repaired: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseExtractor {
    // Skip the required-field check after a repair
    lenient_repair: bool,
}

impl ResponseExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lenient(lenient_repair: bool) -> Self {
        Self { lenient_repair }
    }

    pub fn parse(&self, raw: &str) -> Result<Extraction, ExtractError> {
        if raw.trim().is_empty() {
            return Err(ExtractError::EmptyModelReply);
        }

        let strict_err = match strict_stage(raw) {
            Ok(result) => {
                return Ok(Extraction {
                    result,
                    repaired: false,
                });
            }
            Err(e) => e,
        };
        debug!(error = %strict_err, "strict parse failed, attempting repair");

        match self.repair_stage(raw) {
            Ok(result) => {
                debug!("reply recovered by repair pass");
                Ok(Extraction {
                    result,
                    repaired: true,
                })
            }
            // a missing-field report is more useful than a syntax error
            Err(missing @ ExtractError::MissingRequiredFields(_)) => {
                warn!(error = %missing, "repaired reply is incomplete");
                Err(missing)
            }
            Err(repair_err) => {
                warn!(strict = %strict_err, repair = %repair_err, "reply could not be recovered");
                Err(strict_err)
            }
        }
    }

    fn repair_stage(&self, raw: &str) -> Result<AnalysisResult, ExtractError> {
        let normalized = normalize_reply(raw);
        let span = object_span(&normalized)
            .ok_or_else(|| ExtractError::MalformedJson("no JSON object found in reply".into()))?;
        let value = parse_value(span)?;
        if self.lenient_repair {
            if !value.is_object() {
                return Err(ExtractError::MalformedJson("expected a JSON object".into()));
            }
        } else {
            check_required(&value)?;
        }
        into_result(value)
    }
}

fn strict_stage(raw: &str) -> Result<AnalysisResult, ExtractError> {
    let value = parse_value(strip_code_fence(raw.trim()))?;
    check_required(&value)?;
    into_result(value)
}

/// Removes a leading ```` ```json ```` or bare ```` ``` ```` fence and a trailing ```` ``` ````.
pub fn strip_code_fence(text: &str) -> &str {
    let body = match text.get(..7) {
        Some(tag) if tag.eq_ignore_ascii_case("```json") => &text[7..],
        _ => match text.strip_prefix("```") {
            Some(rest) => rest,
            None => return text,
        },
    };
    let body = body
        .strip_prefix("\r\n")
        .or_else(|| body.strip_prefix('\n'))
        .unwrap_or(body);
    body.strip_suffix("```").unwrap_or(body).trim()
}

fn normalize_reply(raw: &str) -> String {
    raw.chars()
        .map(|c| match c {
            '\u{201C}' | '\u{201D}' => '"',
            '\u{2018}' | '\u{2019}' => '\'',
            '\n' | '\r' => ' ',
            other => other,
        })
        .collect::<String>()
        .trim()
        .to_string()
}

// First '{' through last '}'
fn object_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (start < end).then(|| &text[start..=end])
}

fn parse_value(text: &str) -> Result<Value, ExtractError> {
    serde_json::from_str(text).map_err(|e| ExtractError::MalformedJson(e.to_string()))
}

// A field counts as missing when absent, null or an empty string. Empty arrays are fine.
fn check_required(value: &Value) -> Result<(), ExtractError> {
    let object = value
        .as_object()
        .ok_or_else(|| ExtractError::MalformedJson("expected a JSON object".into()))?;

    let missing: Vec<&'static str> = REQUIRED_FIELDS
        .into_iter()
        .filter(|field| match object.get(*field) {
            None | Some(Value::Null) => true,
            Some(Value::String(s)) => s.is_empty(),
            Some(_) => false,
        })
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ExtractError::MissingRequiredFields(missing))
    }
}

fn into_result(value: Value) -> Result<AnalysisResult, ExtractError> {
    serde_json::from_value(value).map_err(|e| ExtractError::SchemaMismatch(e.to_string()))
}

/// First `max_chars` characters of a raw reply for error bodies, `None` when disabled.
pub fn reply_preview(raw: &str, max_chars: usize) -> Option<String> {
    if max_chars == 0 {
        return None;
    }
    match raw.char_indices().nth(max_chars) {
        Some((cut, _)) => Some(format!("{}...", &raw[..cut])),
        None => Some(raw.to_string()),
    }
}
