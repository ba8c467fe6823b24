//! Exact-keyword matching, the cheap first pass of the cascade.
//!
//! Keywords match as plain substrings of the lower-cased query, so this stage
//! over-triggers slightly (`"order"` fires inside `"border"`). It always wins
//! when it fires at all.

use std::sync::Arc;
use switchyard_core::{Catalog, Category, Query};

/// Picks the entry with the strictly highest positive score; the earliest
/// entry wins a tie.
pub(crate) fn strict_best<'cat, I>(scores: I) -> Option<&'cat Arc<Category>>
where
    I: IntoIterator<Item = (&'cat Arc<Category>, u32)>,
{
    let mut best = None;
    let mut best_score = 0;
    for (category, score) in scores {
        if score > best_score {
            best_score = score;
            best = Some(category);
        }
    }
    best
}

/// Per-category keyword sets matched by substring.
pub struct KeywordIndex {
    catalog: Arc<Catalog>,
}

impl KeywordIndex {
    /// Index over the keywords of every category in `catalog`.
    #[must_use]
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self { catalog }
    }

    /// Number of keywords of each category found in the query, in
    /// evaluation order.
    pub fn counts(&self, query: &Query) -> Vec<(&Arc<Category>, u32)> {
        let text = query.normalized();
        self.catalog
            .categories()
            .iter()
            .map(|category| {
                let hits = category
                    .keywords
                    .iter()
                    .filter(|keyword| text.contains(keyword.as_str()))
                    .count();
                (category, hits as u32)
            })
            .collect()
    }

    /// The category with the most keyword hits, or `None` when no keyword
    /// occurs in the query.
    pub fn match_query(&self, query: &Query) -> Option<&Arc<Category>> {
        strict_best(self.counts(query))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FuzzyMatcher;
    use switchyard_core::{Result, SynonymScope, SynonymTable};

    fn index(categories: Vec<Category>) -> Result<KeywordIndex> {
        Ok(KeywordIndex::new(Arc::new(Catalog::new(
            categories,
            SynonymTable::default(),
        )?)))
    }

    fn matched(index: &KeywordIndex, text: &str) -> Option<String> {
        index
            .match_query(&Query::new(text))
            .map(|category| category.id.to_string())
    }

    #[test]
    fn test_single_category_keyword() -> Result<()> {
        let index = index(vec![
            Category::new("faq", Vec::<String>::new(), ["refund", "delivery"]),
            Category::new("sql", Vec::<String>::new(), ["price", "buy"]),
        ])?;
        assert_eq!(matched(&index, "When will my REFUND arrive?").as_deref(), Some("faq"));
        assert_eq!(matched(&index, "what is the price").as_deref(), Some("sql"));
        Ok(())
    }

    #[test]
    fn test_substring_not_word_boundary() -> Result<()> {
        let index = index(vec![Category::new("faq", Vec::<String>::new(), ["order"])])?;
        assert_eq!(matched(&index, "ships across the border").as_deref(), Some("faq"));
        Ok(())
    }

    #[test]
    fn test_highest_count_wins() -> Result<()> {
        let index = index(vec![
            Category::new("faq", Vec::<String>::new(), ["order"]),
            Category::new("sql", Vec::<String>::new(), ["puma", "shoes", "order"]),
        ])?;
        assert_eq!(
            matched(&index, "order puma shoes").as_deref(),
            Some("sql")
        );
        Ok(())
    }

    #[test]
    fn test_tie_keeps_first_category() -> Result<()> {
        let index = index(vec![
            Category::new("faq", Vec::<String>::new(), ["cancel"]),
            Category::new("sql", Vec::<String>::new(), ["nike"]),
        ])?;
        assert_eq!(matched(&index, "cancel my nike order").as_deref(), Some("faq"));

        let reversed = index_reversed()?;
        assert_eq!(matched(&reversed, "cancel my nike order").as_deref(), Some("sql"));
        Ok(())
    }

    fn index_reversed() -> Result<KeywordIndex> {
        index(vec![
            Category::new("sql", Vec::<String>::new(), ["nike"]),
            Category::new("faq", Vec::<String>::new(), ["cancel"]),
        ])
    }

    #[test]
    fn test_no_keyword_is_no_match() -> Result<()> {
        let index = index(vec![Category::new("faq", Vec::<String>::new(), ["refund"])])?;
        assert!(matched(&index, "asdjklqwe random text").is_none());
        Ok(())
    }

    #[test]
    fn test_counts_report_every_category() -> Result<()> {
        let index = index(vec![
            Category::new("faq", Vec::<String>::new(), ["refund", "refund policy"]),
            Category::new("sql", Vec::<String>::new(), ["price"]),
        ])?;
        let counts: Vec<u32> = index
            .counts(&Query::new("what is your refund policy"))
            .into_iter()
            .map(|(_, count)| count)
            .collect();
        assert_eq!(counts, vec![2, 0]);
        Ok(())
    }

    #[test]
    fn test_literal_category_keywords_match_like_fuzzy_stage() -> anyhow::Result<()> {
        let literal = Category {
            id: "faq".into(),
            utterances: Vec::new(),
            keywords: vec!["Delivery".to_owned()],
        };
        let catalog = Catalog::new(vec![literal], SynonymTable::default())?;
        let fuzzy = FuzzyMatcher::new(&catalog, SynonymScope::Global)?;
        let index = KeywordIndex::new(Arc::new(catalog));

        let query = Query::new("do you support cash on delivery?");
        let exact = index.match_query(&query).map(|category| category.id.to_string());
        let loose = fuzzy.match_query(&query).map(|category| category.id.to_string());
        assert_eq!(exact.as_deref(), Some("faq"));
        assert_eq!(exact, loose);
        Ok(())
    }
}
