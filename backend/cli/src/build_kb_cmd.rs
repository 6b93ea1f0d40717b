//! `medassist build-kb`: embed the HTML service pages into the knowledge
//! base file the gateway loads.

use std::path::PathBuf;

use anyhow::{bail, Result};
use medassist_config::MedAssistConfig;
use medassist_knowledge::KnowledgeBaseBuilder;
use tracing::info;

use crate::providers;
use crate::terminal_output::note_success;

pub struct BuildKbArgs {
    pub data_dir: Option<PathBuf>,
    pub out: Option<PathBuf>,
    pub max_tokens: Option<usize>,
}

pub async fn run(config: &MedAssistConfig, args: BuildKbArgs) -> Result<()> {
    let knowledge = providers::knowledge_config(config);
    let data_dir = args
        .data_dir
        .or_else(|| knowledge.data_dir.map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("./data"));
    let out = args
        .out
        .or_else(|| knowledge.path.map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("knowledge_base_embeddings_chunked.json"));
    let max_tokens = args.max_tokens.or(knowledge.max_chunk_tokens).unwrap_or(150);
    if max_tokens == 0 {
        bail!("--max-tokens must be greater than zero");
    }

    let embeddings = providers::embedding_provider(config, 0)?;
    let builder = KnowledgeBaseBuilder::new(embeddings).with_max_tokens(max_tokens);

    let kb = builder.build_from_dir(&data_dir).await?;
    info!(files = kb.files().count(), chunks = kb.len(), "Knowledge base built");
    kb.write(&out).await?;

    note_success(&format!(
        "Embedded {} chunks from {} files into {}",
        kb.len(),
        kb.files().count(),
        out.display()
    ));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use medassist_config::{apply_all_defaults, LlmConfig};
    use medassist_knowledge::KnowledgeBase;

    #[tokio::test]
    async fn test_build_with_mock_embeddings() {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("data");
        std::fs::create_dir(&data).unwrap();
        std::fs::write(
            data.join("dentel_services.html"),
            "<html><body><h2>ניקוי שיניים</h2><p>זהב 80% הנחה</p></body></html>",
        )
        .unwrap();
        std::fs::write(data.join("notes.txt"), "ignored").unwrap();

        let config = apply_all_defaults(MedAssistConfig {
            llm: Some(LlmConfig { provider: Some("mock".into()), ..Default::default() }),
            ..Default::default()
        });
        let out = dir.path().join("kb.json");
        run(
            &config,
            BuildKbArgs { data_dir: Some(data), out: Some(out.clone()), max_tokens: Some(50) },
        )
        .await
        .unwrap();

        let kb = KnowledgeBase::load(&out).await.unwrap();
        assert_eq!(kb.files().collect::<Vec<_>>(), ["dentel_services.html"]);
        assert!(!kb.is_empty());
    }
}
