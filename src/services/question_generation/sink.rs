use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use super::assembler::AnswerRequestRecord;
use crate::config::StorageConfig;
use crate::models::ContentType;

#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize record: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Wrote {written} lines, expected {expected}")]
    LineCountMismatch { expected: usize, written: usize },
}

/// What the artifact name is derived from
#[derive(Debug, Clone, Copy)]
pub struct ArtifactLabel {
    pub content_type: ContentType,
    pub generations: usize,
    pub per_generation: u32,
}

impl ArtifactLabel {
    /// `answer-batch-fault-3x100-20261018T093000Z-1a2b3c4d.jsonl`
    pub fn filename(&self) -> String {
        let timestamp = chrono::Utc::now().format("%Y%m%dT%H%M%SZ");
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        format!(
            "answer-batch-{}-{}x{}-{}-{}.jsonl",
            self.content_type.as_str(),
            self.generations,
            self.per_generation,
            timestamp,
            &suffix[..8]
        )
    }
}

/// Handle to a persisted batch file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredArtifact {
    pub filename: String,
    pub path: PathBuf,
    pub file_url: String,
    pub count: usize,
}

#[async_trait]
pub trait PersistenceSink: Send + Sync {
    /// Persist all records as one artifact. Called once per job.
    async fn write(
        &self,
        label: &ArtifactLabel,
        records: &[AnswerRequestRecord],
    ) -> Result<StoredArtifact, PersistenceError>;

    /// Remove an artifact written by this sink
    async fn discard(&self, artifact: &StoredArtifact) -> Result<(), PersistenceError>;
}

/// Writes JSONL files into a directory served under `public_base_url`
pub struct JsonlFileSink {
    output_dir: PathBuf,
    public_base_url: String,
}

impl JsonlFileSink {
    pub fn new(output_dir: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self { output_dir: output_dir.into(), public_base_url: public_base_url.into() }
    }

    pub fn from_config(config: &StorageConfig) -> Self {
        Self::new(&config.output_dir, &config.public_base_url)
    }

    fn file_url(&self, filename: &str) -> String {
        format!("{}/{}", self.public_base_url.trim_end_matches('/'), filename)
    }

    async fn write_temp(temp_path: &Path, payload: &[u8]) -> Result<(), PersistenceError> {
        let mut file = fs::File::create(temp_path).await?;
        file.write_all(payload).await?;
        file.sync_all().await?;
        Ok(())
    }
}

/// One JSON document per line, each terminated by `\n`
pub fn encode_jsonl(records: &[AnswerRequestRecord]) -> Result<Vec<u8>, serde_json::Error> {
    let mut payload = Vec::with_capacity(records.len() * 512);
    for record in records {
        serde_json::to_writer(&mut payload, record)?;
        payload.push(b'\n');
    }
    Ok(payload)
}

#[async_trait]
impl PersistenceSink for JsonlFileSink {
    async fn write(
        &self,
        label: &ArtifactLabel,
        records: &[AnswerRequestRecord],
    ) -> Result<StoredArtifact, PersistenceError> {
        let payload = encode_jsonl(records)?;
        let lines = payload.iter().filter(|&&b| b == b'\n').count();
        if lines != records.len() {
            return Err(PersistenceError::LineCountMismatch { expected: records.len(), written: lines });
        }

        fs::create_dir_all(&self.output_dir).await?;

        let filename = label.filename();
        let final_path = self.output_dir.join(&filename);
        let temp_path = self.output_dir.join(format!(".{}.tmp", filename));

        if let Err(e) = Self::write_temp(&temp_path, &payload).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e);
        }
        if let Err(e) = fs::rename(&temp_path, &final_path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        tracing::info!("Wrote {} records to {}", records.len(), final_path.display());

        Ok(StoredArtifact {
            file_url: self.file_url(&filename),
            filename,
            path: final_path,
            count: records.len(),
        })
    }

    async fn discard(&self, artifact: &StoredArtifact) -> Result<(), PersistenceError> {
        match fs::remove_file(&artifact.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
