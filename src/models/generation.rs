use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// Upper bound for `questionsPerGeneration`.
pub const MAX_QUESTIONS_PER_GENERATION: u32 = 50_000;

/// Upper bound for `generationIds.len() * questionsPerGeneration`.
pub const MAX_TOTAL_QUESTIONS: u64 = 50_000;

/// Kind of content the generated questions are about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    /// Fault symptoms, warning lights, error codes
    Fault,
    /// Maintenance and repair procedures
    Manual,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fault => "fault",
            Self::Manual => "manual",
        }
    }
}

/// Output language of questions and answers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    En,
    #[default]
    De,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::En => "en",
            Self::De => "de",
        }
    }
}

/// Request body for `POST /api/generate-questions`
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerateQuestionsRequest {
    #[validate(length(min = 1, message = "brandIds must be a non-empty array"))]
    pub brand_ids: Vec<String>,
    #[validate(length(min = 1, message = "generationIds must be a non-empty array"))]
    pub generation_ids: Vec<String>,
    pub content_type: ContentType,
    #[validate(range(
        min = 1,
        max = MAX_QUESTIONS_PER_GENERATION,
        message = "questionsPerGeneration must be between 1 and 50000"
    ))]
    pub questions_per_generation: u32,
    #[serde(default)]
    pub language: Language,
}

impl GenerateQuestionsRequest {
    /// Upper bound of records a job for this request can produce
    pub fn total_questions(&self) -> u64 {
        self.generation_ids.len() as u64 * u64::from(self.questions_per_generation)
    }
}

/// Successful response for `POST /api/generate-questions`
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerateQuestionsResponse {
    pub success: bool,
    pub file_url: String,
    pub filename: String,
    pub count: usize,
    pub generations_count: usize,
    pub questions_per_generation: u32,
}

/// Outcome of one completed generation job
#[derive(Debug, Clone)]
pub struct JobResult {
    pub job_id: String,
    pub file_url: String,
    pub filename: String,
    pub record_count: usize,
    pub generations_processed: usize,
    pub requested_per_generation: u32,
    pub input_tokens: i64,
    pub output_tokens: i64,
}

impl From<JobResult> for GenerateQuestionsResponse {
    fn from(r: JobResult) -> Self {
        Self {
            success: true,
            file_url: r.file_url,
            filename: r.filename,
            count: r.record_count,
            generations_count: r.generations_processed,
            questions_per_generation: r.requested_per_generation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_deserializes_camel_case() {
        let req: GenerateQuestionsRequest = serde_json::from_value(serde_json::json!({
            "brandIds": ["b1"],
            "generationIds": ["g1", "g2"],
            "contentType": "manual",
            "questionsPerGeneration": 250,
            "language": "en"
        }))
        .unwrap();

        assert_eq!(req.brand_ids, vec!["b1"]);
        assert_eq!(req.content_type, ContentType::Manual);
        assert_eq!(req.language, Language::En);
        assert_eq!(req.total_questions(), 500);
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_language_defaults_to_german() {
        let req: GenerateQuestionsRequest = serde_json::from_value(serde_json::json!({
            "brandIds": ["b1"],
            "generationIds": ["g1"],
            "contentType": "fault",
            "questionsPerGeneration": 5
        }))
        .unwrap();
        assert_eq!(req.language, Language::De);
    }

    #[test]
    fn test_unknown_content_type_rejected() {
        let result = serde_json::from_value::<GenerateQuestionsRequest>(serde_json::json!({
            "brandIds": ["b1"],
            "generationIds": ["g1"],
            "contentType": "review",
            "questionsPerGeneration": 5,
            "language": "de"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_field_validation() {
        let req = GenerateQuestionsRequest {
            brand_ids: vec![],
            generation_ids: vec!["g1".to_string()],
            content_type: ContentType::Fault,
            questions_per_generation: 0,
            language: Language::De,
        };
        let errors = req.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("brand_ids"));
        assert!(fields.contains_key("questions_per_generation"));
        assert!(!fields.contains_key("generation_ids"));
    }

    #[test]
    fn test_per_generation_upper_bound() {
        let mut req = GenerateQuestionsRequest {
            brand_ids: vec!["b1".to_string()],
            generation_ids: vec!["g1".to_string()],
            content_type: ContentType::Manual,
            questions_per_generation: MAX_QUESTIONS_PER_GENERATION,
            language: Language::En,
        };
        assert!(req.validate().is_ok());

        req.questions_per_generation = MAX_QUESTIONS_PER_GENERATION + 1;
        let errors = req.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("questions_per_generation"));
    }

    #[test]
    fn test_response_serializes_camel_case() {
        let response = GenerateQuestionsResponse::from(JobResult {
            job_id: "j".to_string(),
            file_url: "/files/a.jsonl".to_string(),
            filename: "a.jsonl".to_string(),
            record_count: 5,
            generations_processed: 1,
            requested_per_generation: 5,
            input_tokens: 0,
            output_tokens: 0,
        });
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["success"], true);
        assert_eq!(value["fileUrl"], "/files/a.jsonl");
        assert_eq!(value["generationsCount"], 1);
        assert_eq!(value["questionsPerGeneration"], 5);
    }
}
