//! FAQ knowledge base: question/answer pairs retrieved by question
//! similarity.

use csv::{ReaderBuilder, Result as CsvResult, Trim};
use serde::{Deserialize, Serialize};
use std::fs::{File, read_to_string};
use std::io::Read;
use std::path::Path;
use switchyard_core::{Error, Result};
use tokio::sync::RwLock;

use crate::{EmbeddingProvider, StoredEntry, VectorStore};

/// One FAQ record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaqEntry {
    /// Question text; this is what gets embedded and searched.
    pub question: String,
    /// Answer returned as context when the question matches.
    pub answer: String,
}

/// On-disk FAQ layout (`[[faq]]` tables).
#[derive(Debug, Deserialize)]
struct FaqFile {
    #[serde(default)]
    faq: Vec<FaqEntry>,
}

impl FaqEntry {
    /// Parses `[[faq]]` entries from TOML text.
    ///
    /// # Errors
    /// Returns an error if the text is not valid TOML.
    pub fn parse_toml(contents: &str) -> Result<Vec<Self>> {
        let file: FaqFile = toml::from_str(contents)?;
        Ok(file.faq)
    }

    /// Loads `[[faq]]` entries from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from_file(path: &Path) -> Result<Vec<Self>> {
        let contents = read_to_string(path)?;
        Self::parse_toml(&contents)
    }

    /// Reads CSV records with a `question,answer` header row. Column order is
    /// free and extra columns are ignored.
    ///
    /// # Errors
    /// Returns an error if a record is malformed or a column is missing.
    pub fn parse_csv<R: Read>(reader: R) -> Result<Vec<Self>> {
        let mut reader = ReaderBuilder::new().trim(Trim::All).from_reader(reader);
        let entries = reader.deserialize().collect::<CsvResult<Vec<Self>>>()?;
        Ok(entries)
    }

    /// Loads entries from a CSV file with a `question,answer` header.
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened or parsed.
    pub fn load_csv(path: &Path) -> Result<Vec<Self>> {
        Self::parse_csv(File::open(path)?)
    }

    /// Loads entries, choosing the format by extension: `.csv` is read as
    /// CSV, anything else as TOML.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Vec<Self>> {
        let is_csv = path
            .extension()
            .and_then(|extension| extension.to_str())
            .is_some_and(|extension| extension.eq_ignore_ascii_case("csv"));
        if is_csv {
            Self::load_csv(path)
        } else {
            Self::load_from_file(path)
        }
    }
}

/// Retrieved FAQ record with its similarity to the query.
#[derive(Debug, Clone)]
pub struct FaqMatch {
    /// Stored question that matched.
    pub question: String,
    /// Its answer.
    pub answer: String,
    /// Cosine similarity between the query and the question.
    pub score: f32,
}

/// Vector-indexed FAQ collection.
pub struct FaqStore<E> {
    embedder: E,
    store: RwLock<VectorStore>,
}

impl<E: EmbeddingProvider> FaqStore<E> {
    /// Empty store embedding with `embedder`.
    #[must_use]
    pub fn new(embedder: E) -> Self {
        Self {
            embedder,
            store: RwLock::new(VectorStore::default()),
        }
    }

    /// Indexes entries under ids `faq_<position>`. Entries whose id is
    /// already present are skipped, so ingesting the same list twice is a
    /// no-op. Returns the number of newly indexed entries.
    ///
    /// # Errors
    /// Returns an error if embedding fails.
    pub async fn ingest(&self, entries: &[FaqEntry]) -> Result<usize> {
        let pending: Vec<(String, &FaqEntry)> = {
            let store = self.store.read().await;
            entries
                .iter()
                .enumerate()
                .map(|(position, entry)| (format!("faq_{position}"), entry))
                .filter(|(id, _)| !store.contains(id))
                .collect()
        };

        if pending.is_empty() {
            tracing::info!("FAQ collection already ingested ({} entries)", entries.len());
            return Ok(0);
        }

        let embeddings = self
            .embedder
            .embed_batch(pending.iter().map(|(_, entry)| entry.question.clone()).collect())
            .await?;
        if embeddings.len() != pending.len() {
            return Err(Error::InvalidResponse(format!(
                "Expected {} embeddings, got {}",
                pending.len(),
                embeddings.len()
            )));
        }

        let added = pending.len();
        let mut store = self.store.write().await;
        for ((id, entry), embedding) in pending.into_iter().zip(embeddings) {
            store.upsert(
                id,
                StoredEntry {
                    label: entry.answer.clone(),
                    text: entry.question.clone(),
                    embedding,
                },
            );
        }
        tracing::info!("Ingested {added} FAQ entries into the FAQ collection");
        Ok(added)
    }

    /// The `n_results` FAQ entries whose questions are closest to the query.
    ///
    /// # Errors
    /// Returns an error if embedding the query fails.
    pub async fn search(&self, query: &str, n_results: usize) -> Result<Vec<FaqMatch>> {
        let embedding = self.embedder.embed(query).await?;
        let hits = self.store.read().await.search(&embedding, n_results);
        Ok(hits
            .into_iter()
            .map(|hit| FaqMatch {
                question: hit.text,
                answer: hit.label,
                score: hit.score,
            })
            .collect())
    }

    /// Number of indexed entries.
    pub async fn len(&self) -> usize {
        self.store.read().await.len()
    }

    /// Whether nothing has been ingested.
    pub async fn is_empty(&self) -> bool {
        self.store.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LexicalEmbedder;
    use std::io::Write as _;
    use tempfile::{Builder, NamedTempFile};

    fn entries() -> Vec<FaqEntry> {
        vec![
            FaqEntry {
                question: "What is the return policy of the products?".to_owned(),
                answer: "Products can be returned within 30 days of delivery.".to_owned(),
            },
            FaqEntry {
                question: "Do you accept cash as a payment option?".to_owned(),
                answer: "Yes, cash on delivery is available for all orders.".to_owned(),
            },
            FaqEntry {
                question: "How can I track my order?".to_owned(),
                answer: "Use the tracking link in your confirmation email.".to_owned(),
            },
        ]
    }

    #[tokio::test]
    async fn test_ingest_is_idempotent() -> Result<()> {
        let store = FaqStore::new(LexicalEmbedder::default());
        assert_eq!(store.ingest(&entries()).await?, 3);
        assert_eq!(store.ingest(&entries()).await?, 0);
        assert_eq!(store.len().await, 3);
        Ok(())
    }

    #[tokio::test]
    async fn test_search_returns_closest_answers() -> Result<()> {
        let store = FaqStore::new(LexicalEmbedder::default());
        store.ingest(&entries()).await?;

        let hits = store
            .search("Do you take cash as a payment option?", 2)
            .await?;
        assert_eq!(hits.len(), 2);
        assert!(hits[0].answer.contains("cash on delivery"));
        assert!(hits[0].score >= hits[1].score);
        Ok(())
    }

    #[tokio::test]
    async fn test_search_empty_store() -> Result<()> {
        let store = FaqStore::new(LexicalEmbedder::default());
        assert!(store.is_empty().await);
        assert!(store.search("anything", 2).await?.is_empty());
        Ok(())
    }

    #[test]
    fn test_load_faq_file() -> anyhow::Result<()> {
        let mut file = NamedTempFile::new()?;
        write!(
            file,
            r#"
[[faq]]
question = "How long does it take to process a refund?"
answer = "Refunds are processed within 7 business days."
"#
        )?;
        let loaded = FaqEntry::load_from_file(file.path())?;
        assert_eq!(loaded.len(), 1);
        assert!(loaded[0].answer.starts_with("Refunds"));
        Ok(())
    }

    #[tokio::test]
    async fn test_ingest_csv_with_header() -> anyhow::Result<()> {
        let mut file = Builder::new().suffix(".csv").tempfile()?;
        write!(
            file,
            "question,answer\n\
             What is the return policy of the products?,\"Returns are accepted within 30 days, unused.\"\n\
             Do you accept cash as a payment option?,\"Yes, cash on delivery is available.\"\n"
        )?;

        let loaded = FaqEntry::load(file.path())?;
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].answer, "Returns are accepted within 30 days, unused.");

        let store = FaqStore::new(LexicalEmbedder::default());
        assert_eq!(store.ingest(&loaded).await?, 2);
        let hits = store.search("Do you take cash?", 1).await?;
        assert_eq!(hits[0].answer, "Yes, cash on delivery is available.");
        Ok(())
    }

    #[test]
    fn test_parse_csv_reordered_columns() -> Result<()> {
        let data = "answer,question\nWithin the country only.,Do you ship internationally?\n";
        let loaded = FaqEntry::parse_csv(data.as_bytes())?;
        assert_eq!(
            loaded,
            vec![FaqEntry {
                question: "Do you ship internationally?".to_owned(),
                answer: "Within the country only.".to_owned(),
            }]
        );
        Ok(())
    }

    #[test]
    fn test_parse_csv_missing_column_fails() {
        let result = FaqEntry::parse_csv("question\nOnly a question?\n".as_bytes());
        assert!(matches!(result, Err(Error::Csv(_))));
    }
}
