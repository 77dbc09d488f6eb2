use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;
use thiserror::Error;
use uuid::Uuid;

/// A validated dog profile: name and breed non-empty, weight > 0, age >= 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DogProfile {
    pub name: String,
    pub breed: String,
    /// Pounds.
    pub weight: f64,
    /// Years.
    pub age: f64,
    #[serde(default)]
    pub health_issues: Vec<String>,
    #[serde(default)]
    pub dietary_restrictions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Error)]
#[error("Invalid dog profile: {field} {reason}")]
pub struct InvalidProfile {
    pub field: &'static str,
    pub reason: &'static str,
}

/// A dog profile as submitted by a form, before validation.
///
/// Every field is optional so that missing data surfaces as a validation
/// failure rather than a body-decoding failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DogProfileInput {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub breed: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub weight: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub age: Option<f64>,
    #[serde(default, alias = "vet_issues", deserialize_with = "string_or_list")]
    pub health_issues: Vec<String>,
    #[serde(
        default,
        alias = "dietary_restrictions",
        deserialize_with = "string_or_list"
    )]
    pub dietary_restrictions: Vec<String>,
}

impl DogProfileInput {
    pub fn validate(&self) -> Result<DogProfile, InvalidProfile> {
        let name = required_text(self.name.as_deref(), "name")?;
        let breed = required_text(self.breed.as_deref(), "breed")?;

        let weight = self.weight.ok_or(InvalidProfile {
            field: "weight",
            reason: "is required and must be a number",
        })?;
        if !weight.is_finite() || weight <= 0.0 {
            return Err(InvalidProfile {
                field: "weight",
                reason: "must be greater than zero",
            });
        }

        let age = self.age.ok_or(InvalidProfile {
            field: "age",
            reason: "is required and must be a number",
        })?;
        if !age.is_finite() || age < 0.0 {
            return Err(InvalidProfile {
                field: "age",
                reason: "must not be negative",
            });
        }

        Ok(DogProfile {
            name,
            breed,
            weight,
            age,
            health_issues: self.health_issues.clone(),
            dietary_restrictions: self.dietary_restrictions.clone(),
        })
    }
}

impl From<&DogProfile> for DogProfileInput {
    fn from(profile: &DogProfile) -> Self {
        Self {
            name: Some(profile.name.clone()),
            breed: Some(profile.breed.clone()),
            weight: Some(profile.weight),
            age: Some(profile.age),
            health_issues: profile.health_issues.clone(),
            dietary_restrictions: profile.dietary_restrictions.clone(),
        }
    }
}

fn required_text(value: Option<&str>, field: &'static str) -> Result<String, InvalidProfile> {
    match value.map(str::trim) {
        Some(text) if !text.is_empty() => Ok(text.to_string()),
        _ => Err(InvalidProfile {
            field,
            reason: "is required",
        }),
    }
}

/// A profile held by a `ProfileStore`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredProfile {
    pub id: Uuid,
    #[serde(flatten)]
    pub profile: DogProfile,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct DogProfileRow {
    pub id: Uuid,
    pub name: String,
    pub breed: String,
    pub weight: f64,
    pub age: f64,
    pub health_issues: Vec<String>,
    pub dietary_restrictions: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<DogProfileRow> for StoredProfile {
    fn from(row: DogProfileRow) -> Self {
        Self {
            id: row.id,
            profile: DogProfile {
                name: row.name,
                breed: row.breed,
                weight: row.weight,
                age: row.age,
                health_issues: row.health_issues,
                dietary_restrictions: row.dietary_restrictions,
            },
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Accepts a list of strings, a bare string, or null.
fn string_or_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum TextList {
        One(String),
        Many(Vec<String>),
    }

    let items = match Option::<TextList>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(TextList::One(text)) => vec![text],
        Some(TextList::Many(list)) => list,
    };

    Ok(items
        .into_iter()
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect())
}

/// Accepts a JSON number or a numeric string (form inputs arrive as text).
fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberLike {
        Number(f64),
        Text(String),
    }

    Ok(match Option::<NumberLike>::deserialize(deserializer)? {
        None => None,
        Some(NumberLike::Number(n)) => Some(n),
        Some(NumberLike::Text(text)) => text.trim().parse::<f64>().ok(),
    })
}
