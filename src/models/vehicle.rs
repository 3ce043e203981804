use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::utils::clean_optional_string;

/// A vehicle generation joined with its parent model and brand.
///
/// Resolved once per requested generation before any generation work starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct GenerationContext {
    pub generation_id: String,
    pub generation_name: String,
    pub generation_code: Option<String>,
    pub year_start: Option<i64>,
    pub year_end: Option<i64>,
    pub model_id: String,
    pub model_name: String,
    pub brand_id: String,
    pub brand_name: String,
}

impl GenerationContext {
    /// Human readable vehicle identity, e.g. `Volkswagen Golf Golf VII (5G, 2012-2020)`.
    pub fn identity(&self) -> String {
        let mut identity = format!("{} {} {}", self.brand_name, self.model_name, self.generation_name);

        let mut details = Vec::with_capacity(2);
        if let Some(code) = clean_optional_string(self.generation_code.as_ref()) {
            details.push(code);
        }
        if let Some(years) = self.year_range() {
            details.push(years);
        }

        if !details.is_empty() {
            identity.push_str(&format!(" ({})", details.join(", ")));
        }
        identity
    }

    /// `2012-2020`, `2012-` for a running generation, `None` without a start year.
    pub fn year_range(&self) -> Option<String> {
        match (self.year_start, self.year_end) {
            (Some(start), Some(end)) => Some(format!("{}-{}", start, end)),
            (Some(start), None) => Some(format!("{}-", start)),
            _ => None,
        }
    }
}
