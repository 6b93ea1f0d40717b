//! Offline knowledge-base generation: HTML pages → text chunks → embeddings.

use std::path::Path;

use anyhow::{Context, Result};
use tokio::fs;
use tracing::{debug, info};

use crate::chunker::{chunk_text, DEFAULT_MAX_TOKENS};
use crate::embeddings::EmbeddingProvider;
use crate::html::extract_raw_text;
use crate::store::KnowledgeBase;
use crate::types::KnowledgeChunk;

pub struct KnowledgeBaseBuilder {
    embeddings: Box<dyn EmbeddingProvider>,
    max_tokens: usize,
}

impl KnowledgeBaseBuilder {
    pub fn new(embeddings: Box<dyn EmbeddingProvider>) -> Self {
        Self { embeddings, max_tokens: DEFAULT_MAX_TOKENS }
    }

    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens.max(1);
        self
    }

    /// Chunk and embed a single page. Chunk ids are `<file_name>_chunk_<i>`.
    pub async fn build_file(&self, file_name: &str, html: &str) -> Result<Vec<KnowledgeChunk>> {
        let raw_text = extract_raw_text(html);
        let chunks = chunk_text(&raw_text, self.max_tokens);
        let texts: Vec<&str> = chunks.iter().map(String::as_str).collect();
        let vectors = self
            .embeddings
            .embed_batch(&texts)
            .await
            .with_context(|| format!("Failed to embed chunks of {file_name}"))?;

        debug!(file = file_name, chunks = chunks.len(), "Embedded file");

        Ok(chunks
            .into_iter()
            .zip(vectors)
            .enumerate()
            .map(|(i, (content, embedding))| KnowledgeChunk {
                chunk_id: format!("{file_name}_chunk_{i}"),
                embedding,
                content,
            })
            .collect())
    }

    /// Build a knowledge base from every `*.html` file directly inside `data_dir`,
    /// in file-name order.
    pub async fn build_from_dir(&self, data_dir: &Path) -> Result<KnowledgeBase> {
        info!(dir = %data_dir.display(), "Generating embeddings for files in directory");

        let mut names = Vec::new();
        let mut entries = fs::read_dir(data_dir)
            .await
            .with_context(|| format!("Failed to read data directory: {}", data_dir.display()))?;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.ends_with(".html") && entry.file_type().await?.is_file() {
                names.push(name);
            }
        }
        names.sort();

        let mut files = Vec::with_capacity(names.len());
        for name in names {
            let html = fs::read_to_string(data_dir.join(&name))
                .await
                .with_context(|| format!("Failed to read {name}"))?;
            let chunks = self.build_file(&name, &html).await?;
            files.push((name, chunks));
        }

        Ok(KnowledgeBase::from_files(files)?)
    }
}
