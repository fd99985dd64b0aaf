//! Schema-checked parsing of the analysis text returned by the backend.
//!
//! The backend answers with model output: a JSON document that usually, but
//! not always, matches [`AnalysisResult`]. Parsing happens in two steps so the
//! caller gets a precise [`ParseError`]: first the text must be a JSON object,
//! then the object must fit the wire schema. Sentiment `confidence` and
//! `score` are optional on the wire and get placeholder values here.

use rand::Rng;
use serde::{Deserialize, Deserializer};

use crate::error::ParseError;
use crate::types::{AnalysisResult, KeyDetail, Sentiment, SentimentLabel};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct WireAnalysis {
    summary: String,
    key_details: Vec<KeyDetail>,
    sentiment: Option<WireSentiment>,
    actionable_items: Vec<String>,
    delay_indicators: Vec<String>,
    suggested_questions: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WireSentiment {
    #[serde(deserialize_with = "null_as_default")]
    label: SentimentLabel,
    #[serde(deserialize_with = "null_as_default")]
    reasoning: String,
    confidence: Option<f64>,
    score: Option<f64>,
}

/// Reads an explicit `null` the same way as a missing key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Parses the raw analysis text into an [`AnalysisResult`].
///
/// Missing (or zero) `confidence` becomes a value in `[0.85, 1.0)`. Missing
/// (or zero) `score` becomes Positive `[75, 100)`, Negative `[0, 25)`,
/// anything else `[40, 60)`. Duplicate key-detail keys keep their first entry.
///
/// # Errors
///
/// [`ParseError::Syntax`] when the text is not JSON, [`ParseError::NotAnObject`]
/// when it is JSON but not an object, [`ParseError::Shape`] when a field has
/// the wrong type.
pub fn parse_analysis<R: Rng + ?Sized>(raw: &str, rng: &mut R) -> Result<AnalysisResult, ParseError> {
    let value: serde_json::Value = serde_json::from_str(raw).map_err(ParseError::Syntax)?;
    if !value.is_object() {
        return Err(ParseError::NotAnObject(json_kind(&value)));
    }
    let wire: WireAnalysis = serde_json::from_value(value).map_err(ParseError::Shape)?;

    let sentiment = wire.sentiment.unwrap_or_default();
    let confidence = sentiment
        .confidence
        .filter(|c| *c != 0.0)
        .unwrap_or_else(|| synthesize_confidence(rng));
    let score = sentiment
        .score
        .filter(|s| *s != 0.0)
        .unwrap_or_else(|| synthesize_score(sentiment.label, rng));

    Ok(AnalysisResult {
        summary: wire.summary,
        key_details: dedup_keys(wire.key_details),
        sentiment: Sentiment {
            label: sentiment.label,
            reasoning: sentiment.reasoning,
            confidence,
            score,
        },
        actionable_items: wire.actionable_items,
        delay_indicators: wire.delay_indicators,
        suggested_questions: wire.suggested_questions,
    })
}

/// Placeholder confidence in `[0.85, 1.0)`.
pub fn synthesize_confidence<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    rng.gen_range(0.85..1.0)
}

/// Placeholder score for `label`, see [`parse_analysis`] for the ranges.
pub fn synthesize_score<R: Rng + ?Sized>(label: SentimentLabel, rng: &mut R) -> f64 {
    match label {
        SentimentLabel::Positive => rng.gen_range(75.0..100.0),
        SentimentLabel::Negative => rng.gen_range(0.0..25.0),
        SentimentLabel::Neutral => rng.gen_range(40.0..60.0),
    }
}

fn dedup_keys(details: Vec<KeyDetail>) -> Vec<KeyDetail> {
    let mut out: Vec<KeyDetail> = Vec::with_capacity(details.len());
    for detail in details {
        if out.iter().any(|d| d.key == detail.key) {
            tracing::warn!(key = %detail.key, "dropping duplicate key detail");
            continue;
        }
        out.push(detail);
    }
    out
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
