//! The storefront catalog shipped with switchyard: customer FAQ questions
//! versus structured product queries.

use crate::{Category, SynonymGroup, SynonymTable};

/// Identifier of the FAQ category.
pub const FAQ: &str = "faq";
/// Identifier of the structured product query category.
pub const SQL: &str = "sql";

/// The FAQ category: policy, payment and order-status questions.
pub(crate) fn faq() -> Category {
    Category::new(
        FAQ,
        [
            "What is the return policy of the products?",
            "Do I get discount with the HDFC credit card?",
            "How can I track my order?",
            "What payment methods are accepted?",
            "What other payment options do you support?",
            "do you support cash on delivery?",
            "How long does it take to process a refund?",
        ],
        [
            "return",
            "refund",
            "track",
            "order",
            "payment",
            "delivery",
            "cancel",
            "refund policy",
        ],
    )
}

/// The product query category: prices, sizes, brands and sales.
pub(crate) fn sql() -> Category {
    Category::new(
        SQL,
        [
            "I want to buy nike shoes that have 50% discount.",
            "Are there any shoes under Rs. 3000?",
            "Do you have formal shoes in size 9?",
            "Are there any Puma shoes on sale?",
            "What is the price of puma running shoes?",
            "give me the top 3 shoes in descending order of rating",
        ],
        [
            "buy",
            "price",
            "discount",
            "shoes",
            "size",
            "sale",
            "nike",
            "puma",
            "top 3",
            "ratings",
            "average price",
            "price range",
        ],
    )
}

/// Synonym groups widening the fuzzy stage.
#[must_use]
pub fn synonyms() -> SynonymTable {
    SynonymTable::new(vec![
        SynonymGroup::new("refund", ["refund", "return", "reimburse"]),
        SynonymGroup::new("track", ["track", "tracking", "where is", "where's"]),
        SynonymGroup::new(
            "payment",
            ["payment", "pay", "checkout", "cash on delivery", "cod"],
        ),
        SynonymGroup::new("discount", ["discount", "sale", "offer", "deal"]),
    ])
}
