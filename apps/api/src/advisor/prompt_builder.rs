//! Prompt Builder: renders a dog profile and query into completion prompts.
//!
//! Pure functions of their inputs plus the static templates in `prompts.rs`.

use crate::advisor::categories::{canonical_category, QueryKind};
use crate::advisor::prompts::{
    CATEGORY_PROMPT_TEMPLATE, CATEGORY_SYSTEM, IDEAS_PROMPT_TEMPLATE, MATCH_PROMPT_TEMPLATE,
    PRODUCT_PROMPT_TEMPLATE, PRODUCT_SYSTEM, PROFILE_BLOCK,
};
use crate::llm_client::prompts::JSON_ONLY_INSTRUCTION;
use crate::models::DogProfile;

/// The system + user pair for one recommendation request.
#[derive(Debug, Clone, PartialEq)]
pub struct RecommendationPrompt {
    pub kind: QueryKind,
    pub system: &'static str,
    pub user: String,
}

pub fn build_prompt(profile: &DogProfile, query: &str) -> RecommendationPrompt {
    let query = query.trim();
    let profile_block = render_profile(profile);

    match canonical_category(query) {
        Some(category) => RecommendationPrompt {
            kind: QueryKind::Category,
            system: CATEGORY_SYSTEM,
            user: fill(
                CATEGORY_PROMPT_TEMPLATE,
                &[
                    ("profile", profile_block.as_str()),
                    ("category", category),
                    ("json_only", JSON_ONLY_INSTRUCTION),
                ],
            ),
        },
        None => RecommendationPrompt {
            kind: QueryKind::Product,
            system: PRODUCT_SYSTEM,
            user: fill(
                PRODUCT_PROMPT_TEMPLATE,
                &[
                    ("profile", profile_block.as_str()),
                    ("product", query),
                    ("json_only", JSON_ONLY_INSTRUCTION),
                ],
            ),
        },
    }
}

pub fn build_ideas_prompt(profile: &DogProfile, category: &str) -> String {
    fill(
        IDEAS_PROMPT_TEMPLATE,
        &[
            ("profile", render_profile(profile).as_str()),
            ("category", category.trim()),
        ],
    )
}

pub fn build_match_prompt(profile: &DogProfile, product_title: &str) -> String {
    fill(
        MATCH_PROMPT_TEMPLATE,
        &[
            ("profile", render_profile(profile).as_str()),
            ("product", product_title.trim()),
        ],
    )
}

pub fn render_profile(profile: &DogProfile) -> String {
    fill(
        PROFILE_BLOCK,
        &[
            ("name", profile.name.as_str()),
            ("breed", profile.breed.as_str()),
            ("weight", profile.weight.to_string().as_str()),
            ("age", profile.age.to_string().as_str()),
            ("health_issues", join_or_none(&profile.health_issues).as_str()),
            (
                "dietary_restrictions",
                join_or_none(&profile.dietary_restrictions).as_str(),
            ),
        ],
    )
}

/// Replaces `{key}` markers in one left-to-right pass.
///
/// Substituted values are never rescanned, and braces that do not name a
/// known key (the JSON examples) are copied through unchanged.
fn fill(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let marker = &rest[open + 1..];
        let hit = values.iter().find(|(key, _)| {
            marker
                .strip_prefix(*key)
                .is_some_and(|after| after.starts_with('}'))
        });

        match hit {
            Some((key, value)) => {
                out.push_str(value);
                rest = &marker[key.len() + 1..];
            }
            None => {
                out.push('{');
                rest = marker;
            }
        }
    }

    out.push_str(rest);
    out
}

/// Joins with ", "; an empty list renders as "None".
pub fn join_or_none(items: &[String]) -> String {
    if items.is_empty() {
        "None".to_string()
    } else {
        items.join(", ")
    }
}
