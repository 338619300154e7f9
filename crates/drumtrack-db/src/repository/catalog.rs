//! # Catalog Repository
//!
//! Reference data: drum categories, shops and user profiles. Written by
//! the seed binary and administrators, read by everything else.

use drumtrack_core::{DrumCategory, Profile, Shop};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;

/// Repository for reference data.
#[derive(Debug, Clone)]
pub struct CatalogRepository {
    pool: SqlitePool,
}

impl CatalogRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CatalogRepository { pool }
    }

    // =========================================================================
    // Drum Categories
    // =========================================================================

    /// All categories, ordered by name.
    pub async fn list_categories(&self) -> DbResult<Vec<DrumCategory>> {
        let rows = sqlx::query_as::<_, DrumCategory>(
            "SELECT id, name FROM drum_categories ORDER BY name, id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Inserts a category unless one with the same id exists.
    ///
    /// Returns whether a row was written.
    pub async fn insert_category(&self, category: &DrumCategory) -> DbResult<bool> {
        debug!(id = %category.id, name = %category.name, "Inserting drum category");

        let result = sqlx::query(
            "INSERT INTO drum_categories (id, name) VALUES (?1, ?2) ON CONFLICT(id) DO NOTHING",
        )
        .bind(&category.id)
        .bind(&category.name)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    // =========================================================================
    // Shops
    // =========================================================================

    /// All shops, ordered by name.
    pub async fn list_shops(&self) -> DbResult<Vec<Shop>> {
        let rows = sqlx::query_as::<_, Shop>("SELECT id, name FROM shops ORDER BY name, id")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn insert_shop(&self, shop: &Shop) -> DbResult<bool> {
        debug!(id = %shop.id, name = %shop.name, "Inserting shop");

        let result =
            sqlx::query("INSERT INTO shops (id, name) VALUES (?1, ?2) ON CONFLICT(id) DO NOTHING")
                .bind(&shop.id)
                .bind(&shop.name)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    // =========================================================================
    // Profiles
    // =========================================================================

    /// All profiles, ordered by name.
    pub async fn list_profiles(&self) -> DbResult<Vec<Profile>> {
        let rows = sqlx::query_as::<_, Profile>(
            "SELECT id, name, email, role FROM profiles ORDER BY name, id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn get_profile(&self, id: &str) -> DbResult<Option<Profile>> {
        let row = sqlx::query_as::<_, Profile>(
            "SELECT id, name, email, role FROM profiles WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn insert_profile(&self, profile: &Profile) -> DbResult<bool> {
        debug!(id = %profile.id, role = ?profile.role, "Inserting profile");

        let result = sqlx::query(
            r#"
            INSERT INTO profiles (id, name, email, role)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(id) DO NOTHING
            "#,
        )
        .bind(&profile.id)
        .bind(&profile.name)
        .bind(&profile.email)
        .bind(profile.role)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use crate::pool::{Database, DbConfig};
    use drumtrack_core::{DrumCategory, Profile, Role, Shop};

    #[tokio::test]
    async fn test_reference_data_roundtrip() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let catalog = db.catalog();

        for (id, name) in [("c2", "Mango White"), ("c1", "Love White")] {
            let category = DrumCategory {
                id: id.into(),
                name: name.into(),
            };
            assert!(catalog.insert_category(&category).await.unwrap());
        }
        let again = DrumCategory {
            id: "c1".into(),
            name: "Love White".into(),
        };
        assert!(!catalog.insert_category(&again).await.unwrap());

        let names: Vec<String> = catalog
            .list_categories()
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["Love White", "Mango White"]);

        catalog
            .insert_shop(&Shop {
                id: "s1".into(),
                name: "Westlands".into(),
            })
            .await
            .unwrap();
        assert_eq!(catalog.list_shops().await.unwrap().len(), 1);

        let manager = Profile {
            id: "u1".into(),
            name: "Wanjiru".into(),
            email: "wanjiru@example.com".into(),
            role: Role::StoreManager,
        };
        catalog.insert_profile(&manager).await.unwrap();
        assert_eq!(catalog.get_profile("u1").await.unwrap(), Some(manager));
        assert_eq!(catalog.get_profile("u2").await.unwrap(), None);
    }
}
