use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use medassist_core::MedAssistError;
use tokio::fs;
use tracing::{info, warn};

use crate::similarity::cosine_distance;
use crate::types::{KnowledgeChunk, KnowledgeMatch};

/// Cosine distance under which a chunk counts as relevant.
pub const DEFAULT_DISTANCE_THRESHOLD: f32 = 0.3;

/// Precomputed knowledge base, loaded once at startup and read-only afterwards.
///
/// On disk it is a JSON object mapping each source file name to its chunks.
#[derive(Debug, Clone, Default)]
pub struct KnowledgeBase {
    files: Vec<(String, Vec<KnowledgeChunk>)>,
    dimension: usize,
}

impl KnowledgeBase {
    /// Build from per-file chunk lists, checking that every embedding is
    /// non-empty and that all share one dimension.
    pub fn from_files(files: Vec<(String, Vec<KnowledgeChunk>)>) -> Result<Self, MedAssistError> {
        let mut dimension = 0usize;
        for (file, chunks) in &files {
            for chunk in chunks {
                let len = chunk.embedding.len();
                if len == 0 {
                    return Err(MedAssistError::KnowledgeBase(format!(
                        "chunk {} in {} has an empty embedding",
                        chunk.chunk_id, file
                    )));
                }
                if dimension == 0 {
                    dimension = len;
                } else if len != dimension {
                    return Err(MedAssistError::KnowledgeBase(format!(
                        "chunk {} in {} has dimension {}, expected {}",
                        chunk.chunk_id, file, len, dimension
                    )));
                }
            }
        }
        Ok(Self { files, dimension })
    }

    pub fn from_json_str(raw: &str) -> Result<Self, MedAssistError> {
        let parsed: BTreeMap<String, Vec<KnowledgeChunk>> = serde_json::from_str(raw)
            .map_err(|e| MedAssistError::KnowledgeBase(format!("invalid knowledge base JSON: {e}")))?;
        Self::from_files(parsed.into_iter().collect())
    }

    /// Load the knowledge base file from disk.
    pub async fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read knowledge base: {}", path.display()))?;
        let kb = Self::from_json_str(&raw)?;
        if kb.is_empty() {
            warn!(path = %path.display(), "Knowledge base has no chunks; every query will miss");
        }
        info!(
            path = %path.display(),
            files = kb.files.len(),
            chunks = kb.len(),
            dimension = kb.dimension,
            "Knowledge base was loaded"
        );
        Ok(kb)
    }

    /// Write the knowledge base as pretty JSON, keeping non-ASCII text readable.
    pub async fn write(&self, path: &Path) -> Result<()> {
        let map: BTreeMap<&str, &Vec<KnowledgeChunk>> =
            self.files.iter().map(|(f, c)| (f.as_str(), c)).collect();
        let json = serde_json::to_string_pretty(&map).context("Failed to serialize knowledge base")?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }
        fs::write(path, json)
            .await
            .with_context(|| format!("Failed to write knowledge base: {}", path.display()))?;
        info!(path = %path.display(), chunks = self.len(), "Chunked embeddings saved");
        Ok(())
    }

    /// Total number of chunks across all files.
    pub fn len(&self) -> usize {
        self.files.iter().map(|(_, c)| c.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Embedding dimension, 0 for an empty knowledge base.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn files(&self) -> impl Iterator<Item = &str> {
        self.files.iter().map(|(f, _)| f.as_str())
    }

    /// Linear scan over every chunk. Keeps chunks whose cosine distance to
    /// `query` is at most `threshold`, closest first. Ties keep file order.
    pub fn find_closest_match(&self, query: &[f32], threshold: f32) -> Vec<KnowledgeMatch> {
        if self.dimension != 0 && query.len() != self.dimension {
            warn!(
                query_dimension = query.len(),
                expected = self.dimension,
                "Query embedding dimension does not match the knowledge base"
            );
        }

        let mut matches: Vec<KnowledgeMatch> = self
            .files
            .iter()
            .flat_map(|(file, chunks)| chunks.iter().map(move |chunk| (file, chunk)))
            .filter_map(|(file, chunk)| {
                let distance = cosine_distance(query, &chunk.embedding);
                (distance <= threshold).then(|| KnowledgeMatch {
                    file: file.clone(),
                    chunk_id: chunk.chunk_id.clone(),
                    content: chunk.content.clone(),
                    distance,
                })
            })
            .collect();

        matches.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        matches
    }
}
