//! Vehicle catalog lookups
//!
//! Read-only access to brands, models and generations. The catalog itself is
//! maintained elsewhere.

use sqlx::SqlitePool;
use std::collections::HashSet;

use crate::models::GenerationContext;
use crate::utils::{ApiError, ApiResult, find_duplicates, unique_ordered, vec_to_map};

const GENERATION_CONTEXT_SELECT: &str = r#"
    SELECT g.id AS generation_id,
           g.name AS generation_name,
           g.generation_code,
           g.year_start,
           g.year_end,
           m.id AS model_id,
           m.name AS model_name,
           b.id AS brand_id,
           b.name AS brand_name
    FROM vehicle_generations g
    JOIN vehicle_models m ON m.id = g.model_id
    JOIN vehicle_brands b ON b.id = m.brand_id
"#;

/// Ids bound per `IN (...)` query; SQLite caps bind variables per statement.
const LOOKUP_CHUNK_SIZE: usize = 500;

fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

pub struct VehicleRepository {
    pool: SqlitePool,
}

impl VehicleRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Resolve every requested generation to its brand/model context.
    ///
    /// Fails closed: an unknown brand, an unknown generation or a generation
    /// whose brand was not requested fails the whole call. The result follows
    /// the order of `generation_ids`.
    pub async fn resolve_generations(
        &self,
        brand_ids: &[String],
        generation_ids: &[String],
    ) -> ApiResult<Vec<GenerationContext>> {
        let duplicates = find_duplicates(generation_ids);
        if !duplicates.is_empty() {
            return Err(ApiError::validation_error(format!(
                "Duplicate generation ids: {}",
                duplicates.join(", ")
            )));
        }

        let brand_ids = unique_ordered(brand_ids.to_vec());
        let known_brands = self.existing_brand_ids(&brand_ids).await?;
        if let Some(missing) = brand_ids.iter().find(|id| !known_brands.contains(*id)) {
            return Err(ApiError::not_found(format!("Brand not found: {}", missing)));
        }

        let mut by_id = vec_to_map(self.fetch_contexts(generation_ids).await?, |c| c.generation_id.clone());

        let mut contexts = Vec::with_capacity(generation_ids.len());
        for id in generation_ids {
            let context = by_id
                .remove(id)
                .ok_or_else(|| ApiError::not_found(format!("Generation not found: {}", id)))?;

            if !known_brands.contains(&context.brand_id) {
                return Err(ApiError::not_found(format!(
                    "Generation {} does not belong to any of the requested brands",
                    id
                )));
            }
            contexts.push(context);
        }

        tracing::debug!("Resolved {} generation contexts", contexts.len());
        Ok(contexts)
    }

    async fn fetch_contexts(&self, generation_ids: &[String]) -> ApiResult<Vec<GenerationContext>> {
        let mut contexts = Vec::with_capacity(generation_ids.len());
        for chunk in generation_ids.chunks(LOOKUP_CHUNK_SIZE) {
            let sql = format!("{} WHERE g.id IN ({})", GENERATION_CONTEXT_SELECT, placeholders(chunk.len()));
            let mut query = sqlx::query_as::<_, GenerationContext>(&sql);
            for id in chunk {
                query = query.bind(id);
            }
            contexts.extend(query.fetch_all(&self.pool).await?);
        }
        Ok(contexts)
    }

    async fn existing_brand_ids(&self, brand_ids: &[String]) -> ApiResult<HashSet<String>> {
        let mut known = HashSet::new();
        for chunk in brand_ids.chunks(LOOKUP_CHUNK_SIZE) {
            let sql = format!("SELECT id FROM vehicle_brands WHERE id IN ({})", placeholders(chunk.len()));
            let mut query = sqlx::query_scalar::<_, String>(&sql);
            for id in chunk {
                query = query.bind(id);
            }
            known.extend(query.fetch_all(&self.pool).await?);
        }
        Ok(known)
    }
}
