//! Dog profile storage behind a swappable capability.
//!
//! `AppState` holds an `Arc<dyn ProfileStore>`: PostgreSQL when a database is
//! configured, otherwise the in-memory store (also used by tests).

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::PgPool;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::{DogProfileRow, StoredProfile};

pub mod handlers;

#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn get(&self, id: Uuid) -> Result<Option<StoredProfile>, sqlx::Error>;

    /// All profiles, oldest first.
    async fn list(&self) -> Result<Vec<StoredProfile>, sqlx::Error>;

    /// Inserts or replaces the profile with `profile.id`.
    async fn put(&self, profile: StoredProfile) -> Result<StoredProfile, sqlx::Error>;

    /// Returns false when no profile had that id.
    async fn delete(&self, id: Uuid) -> Result<bool, sqlx::Error>;
}

#[derive(Default)]
pub struct InMemoryProfileStore {
    profiles: RwLock<HashMap<Uuid, StoredProfile>>,
}

impl InMemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProfileStore for InMemoryProfileStore {
    async fn get(&self, id: Uuid) -> Result<Option<StoredProfile>, sqlx::Error> {
        Ok(self.profiles.read().await.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<StoredProfile>, sqlx::Error> {
        let mut profiles: Vec<StoredProfile> =
            self.profiles.read().await.values().cloned().collect();
        profiles.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(profiles)
    }

    async fn put(&self, profile: StoredProfile) -> Result<StoredProfile, sqlx::Error> {
        self.profiles
            .write()
            .await
            .insert(profile.id, profile.clone());
        Ok(profile)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, sqlx::Error> {
        Ok(self.profiles.write().await.remove(&id).is_some())
    }
}

pub struct PgProfileStore {
    pool: PgPool,
}

impl PgProfileStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProfileStore for PgProfileStore {
    async fn get(&self, id: Uuid) -> Result<Option<StoredProfile>, sqlx::Error> {
        let row = sqlx::query_as::<_, DogProfileRow>("SELECT * FROM dog_profiles WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(StoredProfile::from))
    }

    async fn list(&self) -> Result<Vec<StoredProfile>, sqlx::Error> {
        let rows = sqlx::query_as::<_, DogProfileRow>(
            "SELECT * FROM dog_profiles ORDER BY created_at, id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(StoredProfile::from).collect())
    }

    async fn put(&self, profile: StoredProfile) -> Result<StoredProfile, sqlx::Error> {
        let row = sqlx::query_as::<_, DogProfileRow>(
            r#"
            INSERT INTO dog_profiles
                (id, name, breed, weight, age, health_issues, dietary_restrictions, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                breed = EXCLUDED.breed,
                weight = EXCLUDED.weight,
                age = EXCLUDED.age,
                health_issues = EXCLUDED.health_issues,
                dietary_restrictions = EXCLUDED.dietary_restrictions,
                updated_at = EXCLUDED.updated_at
            RETURNING *
            "#,
        )
        .bind(profile.id)
        .bind(&profile.profile.name)
        .bind(&profile.profile.breed)
        .bind(profile.profile.weight)
        .bind(profile.profile.age)
        .bind(&profile.profile.health_issues)
        .bind(&profile.profile.dietary_restrictions)
        .bind(profile.created_at)
        .bind(profile.updated_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM dog_profiles WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
