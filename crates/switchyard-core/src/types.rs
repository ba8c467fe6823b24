//! Data model: queries, categories, synonyms, the validated catalog, and
//! completion request/response types.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::HashSet;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::fs::read_to_string;
use std::path::Path;
use std::sync::Arc;

use crate::{Error, Result, builtin};

/// An immutable user query. Matching is case-insensitive, so the lower-cased
/// form is computed once on construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    text: String,
    normalized: String,
}

impl Query {
    /// Wraps raw query text.
    pub fn new<T: Into<String>>(text: T) -> Self {
        let text = text.into();
        let normalized = text.to_lowercase();
        Self { text, normalized }
    }

    /// The query as the user typed it.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The lower-cased query used by the lexical stages.
    #[must_use]
    pub fn normalized(&self) -> &str {
        &self.normalized
    }
}

/// Unique identifier of a category.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryId(String);

impl CategoryId {
    /// Wraps an identifier string.
    pub fn new<T: Into<String>>(id: T) -> Self {
        Self(id.into())
    }

    /// The identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for CategoryId {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for CategoryId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for CategoryId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

/// Raw category definition as written in a catalog file.
#[derive(Debug, Clone, Deserialize)]
struct CategoryDefinition {
    id: CategoryId,
    #[serde(default)]
    utterances: Vec<String>,
    #[serde(default)]
    keywords: Vec<String>,
}

/// A named intent bucket a query can be routed to.
///
/// [`Catalog::new`] re-normalizes keywords, so categories assembled field by
/// field obey the same case rules as those built with [`Category::new`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "CategoryDefinition")]
pub struct Category {
    /// Unique identifier.
    pub id: CategoryId,
    /// Example utterances used to seed the semantic classifier.
    pub utterances: Vec<String>,
    /// Lower-cased, de-duplicated keywords in declaration order.
    pub keywords: Vec<String>,
}

impl Category {
    /// Builds a category, lower-casing keywords and dropping blank or
    /// case-insensitive duplicates while keeping first-seen order.
    pub fn new<I, U, K>(id: I, utterances: U, keywords: K) -> Self
    where
        I: Into<CategoryId>,
        U: IntoIterator,
        U::Item: Into<String>,
        K: IntoIterator,
        K::Item: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let keywords = keywords
            .into_iter()
            .map(|keyword| keyword.as_ref().trim().to_lowercase())
            .filter(|keyword| !keyword.is_empty() && seen.insert(keyword.clone()))
            .collect();

        Self {
            id: id.into(),
            utterances: utterances.into_iter().map(Into::into).collect(),
            keywords,
        }
    }
}

impl From<CategoryDefinition> for Category {
    fn from(definition: CategoryDefinition) -> Self {
        Self::new(definition.id, definition.utterances, definition.keywords)
    }
}

/// Raw synonym group as written in a catalog file.
#[derive(Debug, Clone, Deserialize)]
struct SynonymDefinition {
    term: String,
    #[serde(default)]
    phrases: Vec<String>,
}

/// A canonical term mapped to alternative phrases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "SynonymDefinition")]
pub struct SynonymGroup {
    /// Canonical term.
    pub term: String,
    /// Lower-cased phrases, in declaration order.
    pub phrases: Vec<String>,
}

impl SynonymGroup {
    /// Builds a group, lower-casing the term and phrases and dropping blank
    /// phrases.
    pub fn new<T, P>(term: T, phrases: P) -> Self
    where
        T: AsRef<str>,
        P: IntoIterator,
        P::Item: AsRef<str>,
    {
        Self {
            term: term.as_ref().trim().to_lowercase(),
            phrases: phrases
                .into_iter()
                .map(|phrase| phrase.as_ref().trim().to_lowercase())
                .filter(|phrase| !phrase.is_empty())
                .collect(),
        }
    }

    /// Whether this group belongs to the given keyword: its term is the
    /// keyword or one of its phrases is.
    #[must_use]
    pub fn covers(&self, keyword: &str) -> bool {
        self.term == keyword || self.phrases.iter().any(|phrase| phrase == keyword)
    }
}

impl From<SynonymDefinition> for SynonymGroup {
    fn from(definition: SynonymDefinition) -> Self {
        Self::new(definition.term, definition.phrases)
    }
}

/// Global synonym groups shared by every category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SynonymTable {
    groups: Vec<SynonymGroup>,
}

impl SynonymTable {
    /// Wraps groups in lookup order.
    #[must_use]
    pub fn new(groups: Vec<SynonymGroup>) -> Self {
        Self { groups }
    }

    /// Groups in lookup order.
    #[must_use]
    pub fn groups(&self) -> &[SynonymGroup] {
        &self.groups
    }

    /// Whether the table holds no groups.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Which synonym groups the fuzzy stage consults when a keyword misses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SynonymScope {
    /// Every group, regardless of the keyword being checked.
    #[default]
    Global,
    /// Only groups whose term or phrases include the keyword being checked.
    KeywordBound,
}

/// On-disk catalog layout.
#[derive(Debug, Deserialize)]
struct CatalogFile {
    categories: Vec<Category>,
    #[serde(default)]
    synonyms: Vec<SynonymGroup>,
}

/// Validated, immutable category and synonym configuration.
///
/// Built once at startup and shared read-only by every routing stage.
/// Category order is the evaluation order used for tie-breaking.
#[derive(Debug, Clone)]
pub struct Catalog {
    categories: Vec<Arc<Category>>,
    synonyms: SynonymTable,
}

impl Catalog {
    /// Validates and freezes a catalog.
    ///
    /// Keywords, synonym terms and synonym phrases are normalized again here
    /// (trimmed, lower-cased, keywords de-duplicated) whatever way the values
    /// were built.
    ///
    /// # Errors
    /// Returns [`Error::Config`] if the category set is empty or two categories
    /// share an identifier.
    pub fn new(categories: Vec<Category>, synonyms: SynonymTable) -> Result<Self> {
        if categories.is_empty() {
            return Err(Error::Config("category set is empty".to_owned()));
        }

        let mut seen = HashSet::new();
        for category in &categories {
            if !seen.insert(category.id.as_str()) {
                return Err(Error::Config(format!(
                    "duplicate category id `{}`",
                    category.id
                )));
            }
        }

        let synonyms = SynonymTable::new(
            synonyms
                .groups
                .into_iter()
                .map(|group| SynonymGroup::new(group.term, group.phrases))
                .collect(),
        );

        Ok(Self {
            categories: categories
                .into_iter()
                .map(|category| {
                    Arc::new(Category::new(
                        category.id,
                        category.utterances,
                        category.keywords,
                    ))
                })
                .collect(),
            synonyms,
        })
    }

    /// The built-in `faq` / `sql` storefront catalog.
    ///
    /// # Errors
    /// Never fails for the shipped definitions; the `Result` mirrors
    /// [`Catalog::new`].
    pub fn builtin() -> Result<Self> {
        Self::new(vec![builtin::faq(), builtin::sql()], builtin::synonyms())
    }

    /// Parses a catalog from TOML text.
    ///
    /// # Errors
    /// Returns an error if the text is not valid TOML or fails validation.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let file: CatalogFile = toml::from_str(contents)?;
        Self::new(file.categories, SynonymTable::new(file.synonyms))
    }

    /// Loads a catalog from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, parsed, or validated.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = read_to_string(path)?;
        let catalog = Self::from_toml_str(&contents)?;
        tracing::debug!(
            "Loaded catalog from {}: {} categories, {} synonym groups",
            path.display(),
            catalog.len(),
            catalog.synonyms.groups().len()
        );
        Ok(catalog)
    }

    /// Categories in evaluation order.
    #[must_use]
    pub fn categories(&self) -> &[Arc<Category>] {
        &self.categories
    }

    /// Synonym groups consulted by the fuzzy stage.
    #[must_use]
    pub fn synonyms(&self) -> &SynonymTable {
        &self.synonyms
    }

    /// Looks up a category by identifier.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Arc<Category>> {
        self.categories
            .iter()
            .find(|category| category.id.as_str() == id)
    }

    /// Number of categories.
    #[must_use]
    pub fn len(&self) -> usize {
        self.categories.len()
    }

    /// Always `false` for a validated catalog.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

/// Prompt sent to a text completion service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// User message.
    pub prompt: String,
    /// Optional system message sent ahead of the prompt.
    pub system_prompt: Option<String>,
}

impl CompletionRequest {
    /// Request with no system prompt.
    pub fn new<T: Into<String>>(prompt: T) -> Self {
        Self {
            prompt: prompt.into(),
            system_prompt: None,
        }
    }

    /// Sets the system prompt.
    #[must_use]
    pub fn with_system_prompt<T: Into<String>>(mut self, system_prompt: T) -> Self {
        self.system_prompt = Some(system_prompt.into());
        self
    }
}

/// Text returned by a completion service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Completion {
    /// Generated text.
    pub text: String,
    /// Provider and model that produced the text.
    pub provider: String,
    /// Token accounting reported by the provider.
    pub tokens_used: TokenUsage,
    /// Wall-clock request time in milliseconds.
    pub latency_ms: u64,
}

/// Token usage for one completion.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Prompt tokens.
    pub input: u64,
    /// Completion tokens.
    pub output: u64,
}

impl TokenUsage {
    /// Prompt plus completion tokens.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.input + self.output
    }
}
