//! Synonym-aware fallback matching on whole words and phrases.

use regex::{Regex, RegexBuilder};
use std::sync::Arc;
use switchyard_core::{Catalog, Category, Query, SynonymScope};

use crate::Result;
use crate::keyword::strict_best;

/// Score for a keyword found as a whole word or phrase.
pub const KEYWORD_WEIGHT: u32 = 2;
/// Score for a missed keyword when a synonym is present instead.
pub const SYNONYM_WEIGHT: u32 = 1;

/// Compiles a case-insensitive `\b<phrase>\b` pattern.
fn boundary_pattern(phrase: &str) -> Result<Regex> {
    let pattern = format!(r"\b{}\b", regex::escape(phrase));
    Ok(RegexBuilder::new(&pattern).case_insensitive(true).build()?)
}

struct CompiledKeyword {
    pattern: Regex,
    /// Synonym groups tied to this keyword, used by [`SynonymScope::KeywordBound`].
    groups: Vec<usize>,
}

struct CompiledCategory {
    category: Arc<Category>,
    keywords: Vec<CompiledKeyword>,
}

/// Scores categories by whole-word keyword hits, falling back to synonyms
/// for every keyword that misses.
///
/// With [`SynonymScope::Global`] any synonym present in the query credits
/// every missed keyword of every category, whether or not the synonym is
/// related to that keyword. A missed keyword earns at most one synonym
/// credit.
pub struct FuzzyMatcher {
    categories: Vec<CompiledCategory>,
    synonym_groups: Vec<Vec<Regex>>,
    scope: SynonymScope,
}

impl FuzzyMatcher {
    /// Compiles keyword and synonym patterns for the whole catalog.
    ///
    /// # Errors
    /// Returns [`crate::RoutingError::InvalidPattern`] if a pattern fails to compile.
    pub fn new(catalog: &Catalog, scope: SynonymScope) -> Result<Self> {
        let groups = catalog.synonyms().groups();

        let synonym_groups = groups
            .iter()
            .map(|group| {
                group
                    .phrases
                    .iter()
                    .map(|phrase| boundary_pattern(phrase))
                    .collect::<Result<Vec<_>>>()
            })
            .collect::<Result<Vec<_>>>()?;

        let categories = catalog
            .categories()
            .iter()
            .map(|category| {
                let keywords = category
                    .keywords
                    .iter()
                    .map(|keyword| {
                        Ok(CompiledKeyword {
                            pattern: boundary_pattern(keyword)?,
                            groups: groups
                                .iter()
                                .enumerate()
                                .filter(|(_, group)| group.covers(keyword))
                                .map(|(index, _)| index)
                                .collect(),
                        })
                    })
                    .collect::<Result<Vec<_>>>()?;
                Ok(CompiledCategory {
                    category: Arc::clone(category),
                    keywords,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            categories,
            synonym_groups,
            scope,
        })
    }

    /// How synonym hits are credited.
    #[must_use]
    pub fn scope(&self) -> SynonymScope {
        self.scope
    }

    /// Fuzzy score of each category, in evaluation order.
    pub fn scores(&self, query: &Query) -> Vec<(&Arc<Category>, u32)> {
        let text = query.normalized();
        let group_hits: Vec<bool> = self
            .synonym_groups
            .iter()
            .map(|phrases| phrases.iter().any(|pattern| pattern.is_match(text)))
            .collect();
        let any_synonym = group_hits.contains(&true);

        self.categories
            .iter()
            .map(|compiled| {
                let score = compiled
                    .keywords
                    .iter()
                    .map(|keyword| {
                        if keyword.pattern.is_match(text) {
                            return KEYWORD_WEIGHT;
                        }
                        let synonym_hit = match self.scope {
                            SynonymScope::Global => any_synonym,
                            SynonymScope::KeywordBound => {
                                keyword.groups.iter().any(|&group| group_hits[group])
                            }
                        };
                        if synonym_hit { SYNONYM_WEIGHT } else { 0 }
                    })
                    .sum();
                (&compiled.category, score)
            })
            .collect()
    }

    /// The top-scoring category, or `None` when every score is zero.
    pub fn match_query(&self, query: &Query) -> Option<&Arc<Category>> {
        strict_best(self.scores(query))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use switchyard_core::{SynonymGroup, SynonymTable};

    fn catalog(categories: Vec<Category>, groups: Vec<SynonymGroup>) -> Catalog {
        match Catalog::new(categories, SynonymTable::new(groups)) {
            Ok(catalog) => catalog,
            Err(error) => panic!("invalid test catalog: {error}"),
        }
    }

    fn score_of(matcher: &FuzzyMatcher, text: &str, id: &str) -> u32 {
        matcher
            .scores(&Query::new(text))
            .into_iter()
            .find(|(category, _)| category.id.as_str() == id)
            .map_or(0, |(_, score)| score)
    }

    fn track_catalog() -> Catalog {
        catalog(
            vec![Category::new("faq", Vec::<String>::new(), ["track"])],
            vec![SynonymGroup::new("track", ["track", "tracking", "where is", "where's"])],
        )
    }

    #[test]
    fn test_whole_word_keyword_scores_two() -> Result<()> {
        let matcher = FuzzyMatcher::new(&track_catalog(), SynonymScope::Global)?;
        assert_eq!(score_of(&matcher, "Track my parcel", "faq"), 2);
        Ok(())
    }

    #[test]
    fn test_partial_word_is_not_keyword_hit() -> Result<()> {
        let matcher = FuzzyMatcher::new(
            &catalog(
                vec![Category::new("faq", Vec::<String>::new(), ["order"])],
                Vec::new(),
            ),
            SynonymScope::Global,
        )?;
        assert_eq!(score_of(&matcher, "ships across the border", "faq"), 0);
        assert!(matcher.match_query(&Query::new("ships across the border")).is_none());
        Ok(())
    }

    #[test]
    fn test_synonym_only_scores_one() -> Result<()> {
        let matcher = FuzzyMatcher::new(&track_catalog(), SynonymScope::Global)?;
        assert_eq!(score_of(&matcher, "Where's my package?", "faq"), 1);
        Ok(())
    }

    #[test]
    fn test_neither_scores_zero() -> Result<()> {
        let matcher = FuzzyMatcher::new(&track_catalog(), SynonymScope::Global)?;
        assert_eq!(score_of(&matcher, "asdjklqwe random text", "faq"), 0);
        assert!(matcher.match_query(&Query::new("asdjklqwe random text")).is_none());
        Ok(())
    }

    #[test]
    fn test_one_synonym_credit_per_missed_keyword() -> Result<()> {
        // Both groups hit, but the single missed keyword earns one point.
        let matcher = FuzzyMatcher::new(
            &catalog(
                vec![Category::new("faq", Vec::<String>::new(), ["refund"])],
                vec![
                    SynonymGroup::new("track", ["where's"]),
                    SynonymGroup::new("payment", ["pay"]),
                ],
            ),
            SynonymScope::Global,
        )?;
        assert_eq!(score_of(&matcher, "where's the pay slip", "faq"), 1);
        Ok(())
    }

    #[test]
    fn test_global_synonyms_credit_unrelated_keywords() -> Result<()> {
        let matcher = FuzzyMatcher::new(
            &catalog(
                vec![
                    Category::new("faq", Vec::<String>::new(), ["track"]),
                    Category::new("sql", Vec::<String>::new(), ["price", "size"]),
                ],
                vec![SynonymGroup::new("track", ["where's"])],
            ),
            SynonymScope::Global,
        )?;
        let query = Query::new("Where's my package?");
        assert_eq!(score_of(&matcher, query.text(), "faq"), 1);
        assert_eq!(score_of(&matcher, query.text(), "sql"), 2);
        assert_eq!(
            matcher.match_query(&query).map(|category| category.id.as_str()),
            Some("sql")
        );
        Ok(())
    }

    #[test]
    fn test_keyword_bound_synonyms_only_credit_their_keyword() -> Result<()> {
        let matcher = FuzzyMatcher::new(
            &catalog(
                vec![
                    Category::new("faq", Vec::<String>::new(), ["track"]),
                    Category::new("sql", Vec::<String>::new(), ["price", "size"]),
                ],
                vec![SynonymGroup::new("track", ["where's"])],
            ),
            SynonymScope::KeywordBound,
        )?;
        let query = Query::new("Where's my package?");
        assert_eq!(score_of(&matcher, query.text(), "sql"), 0);
        assert_eq!(
            matcher.match_query(&query).map(|category| category.id.as_str()),
            Some("faq")
        );
        Ok(())
    }

    #[test]
    fn test_multi_word_phrase_matches_on_boundaries() -> Result<()> {
        let matcher = FuzzyMatcher::new(
            &catalog(
                vec![Category::new("sql", Vec::<String>::new(), ["top 3"])],
                Vec::new(),
            ),
            SynonymScope::Global,
        )?;
        assert_eq!(score_of(&matcher, "show the top 3 shoes", "sql"), 2);
        assert_eq!(score_of(&matcher, "show the top 30 shoes", "sql"), 0);
        Ok(())
    }

    #[test]
    fn test_regex_metacharacters_are_escaped() -> Result<()> {
        let matcher = FuzzyMatcher::new(
            &catalog(
                vec![Category::new("faq", Vec::<String>::new(), ["u.s"])],
                Vec::new(),
            ),
            SynonymScope::Global,
        )?;
        assert_eq!(score_of(&matcher, "do you ship to the u.s today", "faq"), 2);
        assert_eq!(score_of(&matcher, "do you ship to the uxs today", "faq"), 0);
        Ok(())
    }

    #[test]
    fn test_tie_keeps_first_category() -> Result<()> {
        let matcher = FuzzyMatcher::new(
            &catalog(
                vec![
                    Category::new("faq", Vec::<String>::new(), ["cancel"]),
                    Category::new("sql", Vec::<String>::new(), ["nike"]),
                ],
                Vec::new(),
            ),
            SynonymScope::Global,
        )?;
        assert_eq!(
            matcher
                .match_query(&Query::new("cancel nike"))
                .map(|category| category.id.as_str()),
            Some("faq")
        );
        Ok(())
    }
}
