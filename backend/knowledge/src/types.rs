use serde::{Deserialize, Serialize};

/// One chunk of a source document with its precomputed embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeChunk {
    pub chunk_id: String,
    /// The embedding vector (1536 dims for ada-002)
    pub embedding: Vec<f32>,
    /// The source text of the chunk
    pub content: String,
}

/// A chunk that fell within the distance threshold of a query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeMatch {
    /// Source file the chunk came from
    pub file: String,
    pub chunk_id: String,
    pub content: String,
    /// Cosine distance to the query (0.0 = identical direction)
    pub distance: f32,
}
