//! Result Validator & Normalizer: maps parsed JSON onto the typed results.
//!
//! Model output follows the requested schema loosely, so minor omissions are
//! filled with defaults instead of failing:
//! - missing `name` → "Unknown Product"
//! - non-numeric `score` → numeric coercion, else 50
//! - missing `reason` / `explanation` → "No reason provided"
//!
//! Category lists are sorted best-first; callers rely on that order.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::advisor::categories::QueryKind;
use crate::models::{CategoryRecommendation, ProductScore, Recommendation, SimilarProduct};

pub const DEFAULT_SCORE: u32 = 50;
pub const UNKNOWN_PRODUCT: &str = "Unknown Product";
pub const NO_REASON: &str = "No reason provided";
pub const MAX_SIMILAR_PRODUCTS: usize = 3;

/// Keys under which a model sometimes wraps the list it was asked for.
const WRAPPER_KEYS: [&str; 3] = ["recommendations", "products", "similarProducts"];

#[derive(Debug, Clone, PartialEq, Error)]
#[error("Completion output matches neither a product score nor a recommendation list")]
pub struct UnrecognizedShape;

/// Normalizes a parsed completion.
///
/// `kind` only breaks ties: an object that carries both a usable score and a
/// wrapped list is a product evaluation unless a category was asked for.
pub fn normalize(value: &Value, kind: QueryKind) -> Result<Recommendation, UnrecognizedShape> {
    match value {
        Value::Array(items) => Ok(category_list(items)),
        Value::Object(map) => {
            let has_score = map.get("score").and_then(coerce_score).is_some();
            match (kind, has_score, wrapped_list(map)) {
                (QueryKind::Category, _, Some(items)) => Ok(category_list(items)),
                (_, true, _) => Ok(Recommendation::Product(product_score(map))),
                (_, false, Some(items)) => Ok(category_list(items)),
                _ => Err(UnrecognizedShape),
            }
        }
        _ => Err(UnrecognizedShape),
    }
}

/// Normalizes one category entry, also used for batch-scored titles.
pub fn category_entry(item: &Value) -> CategoryRecommendation {
    match item {
        Value::Object(map) => CategoryRecommendation {
            name: text_field(map, &["name", "title", "product"])
                .unwrap_or_else(|| UNKNOWN_PRODUCT.to_string()),
            score: score_or_default(map.get("score")),
            reason: text_field(map, &["reason", "explanation"])
                .unwrap_or_else(|| NO_REASON.to_string()),
            asin: text_field(map, &["asin", "ASIN"]),
            affiliate_link: text_field(map, &["affiliateLink", "affiliate_link"]),
            price: map.get("price").and_then(coerce_price),
        },
        Value::String(name) if !name.trim().is_empty() => CategoryRecommendation {
            name: name.trim().to_string(),
            score: DEFAULT_SCORE,
            reason: NO_REASON.to_string(),
            asin: None,
            affiliate_link: None,
            price: None,
        },
        _ => CategoryRecommendation {
            name: UNKNOWN_PRODUCT.to_string(),
            score: DEFAULT_SCORE,
            reason: NO_REASON.to_string(),
            asin: None,
            affiliate_link: None,
            price: None,
        },
    }
}

/// Integer 0–100 from a number or numeric string ("85", "85%", 87.6).
pub fn coerce_score(value: &Value) -> Option<u32> {
    let raw = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().trim_end_matches('%').trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if !raw.is_finite() {
        return None;
    }
    Some(raw.round().clamp(0.0, 100.0) as u32)
}

pub fn score_or_default(value: Option<&Value>) -> u32 {
    value.and_then(coerce_score).unwrap_or(DEFAULT_SCORE)
}

fn category_list(items: &[Value]) -> Recommendation {
    let mut recommendations: Vec<CategoryRecommendation> =
        items.iter().map(category_entry).collect();
    recommendations.sort_by(|a, b| b.score.cmp(&a.score));
    Recommendation::Category { recommendations }
}

fn product_score(map: &Map<String, Value>) -> ProductScore {
    let similar_products = match map.get("similarProducts") {
        Some(Value::Array(items)) => items
            .iter()
            .take(MAX_SIMILAR_PRODUCTS)
            .map(|item| {
                let entry = category_entry(item);
                SimilarProduct {
                    name: entry.name,
                    score: entry.score,
                    reason: entry.reason,
                }
            })
            .collect(),
        _ => Vec::new(),
    };

    ProductScore {
        score: score_or_default(map.get("score")),
        explanation: text_field(map, &["explanation", "reason"])
            .unwrap_or_else(|| NO_REASON.to_string()),
        similar_products,
    }
}

fn wrapped_list(map: &Map<String, Value>) -> Option<&[Value]> {
    WRAPPER_KEYS.iter().find_map(|key| match map.get(*key) {
        Some(Value::Array(items)) => Some(items.as_slice()),
        _ => None,
    })
}

/// First key holding a non-blank string, trimmed.
fn text_field(map: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match map.get(*key) {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    })
}

fn coerce_price(value: &Value) -> Option<f64> {
    let price = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s
            .trim()
            .trim_start_matches('$')
            .replace(',', "")
            .parse::<f64>()
            .ok()?,
        _ => return None,
    };
    (price.is_finite() && price >= 0.0).then_some(price)
}
