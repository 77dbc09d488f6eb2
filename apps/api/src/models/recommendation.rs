use serde::{Deserialize, Serialize};

/// An alternative suggested alongside a single-product evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarProduct {
    pub name: String,
    pub score: u32, // 0 – 100
    pub reason: String,
}

/// Suitability of one named product for a dog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductScore {
    pub score: u32, // 0 – 100
    pub explanation: String,
    /// At most three entries.
    pub similar_products: Vec<SimilarProduct>,
}

/// One product recommended for a category query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryRecommendation {
    pub name: String,
    pub score: u32, // 0 – 100
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub affiliate_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
}

/// The normalized outcome of one recommendation request.
///
/// Category recommendations are always ordered by descending score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Recommendation {
    Product(ProductScore),
    Category {
        recommendations: Vec<CategoryRecommendation>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_serializes_with_kind_tag() {
        let rec = Recommendation::Product(ProductScore {
            score: 70,
            explanation: "Fine".to_string(),
            similar_products: vec![],
        });
        let json = serde_json::to_value(&rec).unwrap();
        assert_eq!(json["kind"], "product");
        assert_eq!(json["score"], 70);
        assert_eq!(json["similarProducts"], serde_json::json!([]));
    }

    #[test]
    fn test_category_omits_absent_optional_fields() {
        let rec = Recommendation::Category {
            recommendations: vec![CategoryRecommendation {
                name: "Kong Classic".to_string(),
                score: 91,
                reason: "Durable".to_string(),
                asin: Some("B0002AR0I8".to_string()),
                affiliate_link: None,
                price: None,
            }],
        };
        let json = serde_json::to_value(&rec).unwrap();
        assert_eq!(json["kind"], "category");
        let first = &json["recommendations"][0];
        assert_eq!(first["asin"], "B0002AR0I8");
        assert!(first.get("affiliateLink").is_none());
        assert!(first.get("price").is_none());
    }
}
