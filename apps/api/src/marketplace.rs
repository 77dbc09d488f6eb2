//! Marketplace affiliate links.

use crate::models::CategoryRecommendation;

const MARKETPLACE_HOST: &str = "https://www.amazon.com";

/// Builds affiliate links carrying a fixed tag.
#[derive(Debug, Clone)]
pub struct AffiliateLinks {
    tag: String,
}

impl AffiliateLinks {
    pub fn new(tag: impl Into<String>) -> Self {
        Self { tag: tag.into() }
    }

    /// Search results page for a product name.
    pub fn search_url(&self, product_name: &str) -> String {
        format!(
            "{MARKETPLACE_HOST}/s?k={}&tag={}",
            urlencoding::encode(product_name.trim()),
            urlencoding::encode(&self.tag)
        )
    }

    /// Product detail page for an ASIN.
    pub fn product_url(&self, asin: &str) -> String {
        format!(
            "{MARKETPLACE_HOST}/dp/{}?tag={}",
            urlencoding::encode(asin.trim()),
            urlencoding::encode(&self.tag)
        )
    }

    /// Prefers the ASIN when one is present.
    pub fn link_for(&self, product_name: &str, asin: Option<&str>) -> String {
        match asin.map(str::trim).filter(|a| !a.is_empty()) {
            Some(asin) => self.product_url(asin),
            None => self.search_url(product_name),
        }
    }

    /// Fills `affiliate_link` on entries that lack one.
    pub fn attach(&self, recommendations: &mut [CategoryRecommendation]) {
        for rec in recommendations.iter_mut() {
            if rec.affiliate_link.is_none() {
                rec.affiliate_link = Some(self.link_for(&rec.name, rec.asin.as_deref()));
            }
        }
    }
}
