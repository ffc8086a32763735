use saleflash_core::CategoryConfig;
use sqlx::PgPool;

use crate::DbError;

/// Upsert categories from config into the database.
///
/// Returns the number of categories processed (inserted or updated).
/// All upserts run inside a single transaction; if any operation fails
/// the entire batch is rolled back.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any database operation fails.
pub async fn seed_categories(pool: &PgPool, categories: &[CategoryConfig]) -> Result<usize, DbError> {
    let mut tx = pool.begin().await?;
    let mut count = 0usize;

    for category in categories {
        let slug = category.slug();

        sqlx::query(
            "INSERT INTO categories (name, slug) \
             VALUES ($1, $2) \
             ON CONFLICT (slug) DO UPDATE SET \
                 name = EXCLUDED.name, \
                 updated_at = NOW()",
        )
        .bind(&category.name)
        .bind(&slug)
        .execute(&mut *tx)
        .await?;

        count += 1;
    }

    tx.commit().await?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn category(name: &str, slug: Option<&str>) -> CategoryConfig {
        CategoryConfig {
            name: name.to_string(),
            slug: slug.map(str::to_string),
        }
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn seed_inserts_categories_with_derived_and_explicit_slugs(pool: PgPool) {
        let categories = vec![
            category("Garden Furniture", None),
            category("Office Furniture", Some("office")),
        ];

        let seeded = seed_categories(&pool, &categories).await.expect("seed");
        assert_eq!(seeded, 2);

        let slugs: Vec<String> = sqlx::query_scalar("SELECT slug FROM categories ORDER BY slug")
            .fetch_all(&pool)
            .await
            .expect("read slugs");
        assert_eq!(slugs, vec!["garden-furniture", "office"]);
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn reseeding_updates_name_on_slug_conflict(pool: PgPool) {
        seed_categories(&pool, &[category("Sofas", None)])
            .await
            .expect("first seed");

        let seeded = seed_categories(&pool, &[category("Sofas & Sectionals", Some("sofas"))])
            .await
            .expect("second seed");
        assert_eq!(seeded, 1);

        let name: String = sqlx::query_scalar("SELECT name FROM categories WHERE slug = 'sofas'")
            .fetch_one(&pool)
            .await
            .expect("read name");
        assert_eq!(name, "Sofas & Sectionals");

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM categories")
            .fetch_one(&pool)
            .await
            .expect("count");
        assert_eq!(total, 1);
    }
}
