pub mod builder;
pub mod chunker;
pub mod embeddings;
pub mod html;
pub mod similarity;
pub mod store;
pub mod types;

pub use builder::KnowledgeBaseBuilder;
pub use chunker::chunk_text;
pub use embeddings::{create_provider, EmbeddingProvider, EmbeddingProviderKind, StaticEmbeddings};
pub use html::extract_raw_text;
pub use similarity::{cosine_distance, cosine_similarity};
pub use store::{KnowledgeBase, DEFAULT_DISTANCE_THRESHOLD};
pub use types::{KnowledgeChunk, KnowledgeMatch};
