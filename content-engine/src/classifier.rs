//! Keyword detection and topic categorisation of observed posts.

use chainpulse_core::{Category, KeywordSet};
use std::collections::BTreeSet;

/// Ordered category tests. The first group with any hit wins, so a post
/// that mentions both DeFi and NFT terms is DeFi.
///
/// Terms are matched against lowercased text with punctuation folded to
/// spaces; a leading or trailing space in a term anchors it to a word
/// boundary.
const CATEGORY_TESTS: &[(Category, &[&str])] = &[
    (
        Category::DeFi,
        &[
            "defi", "yield", "liquidity", "lending", "borrow", " dex ", " amm ", " tvl ", "swap",
            "stablecoin", "perp",
        ],
    ),
    (
        Category::Nft,
        &[" nft", "opensea", "mint", "collectible", " pfp ", "ordinals", "digital art"],
    ),
    (
        Category::Scaling,
        &[
            "layer 2", " l2", "rollup", " zk ", "zero knowledge", "sharding", "scalab", " tps ",
            "throughput", "parallel evm", "data availability",
        ],
    ),
    (
        Category::MajorAsset,
        &[
            "bitcoin", " btc ", "ethereum", " eth ", "solana", " sol ", "halving", " etf",
        ],
    ),
    (
        Category::Ai,
        &[
            " ai ", "artificial intelligence", "machine learning", " llm", "agents", "neural",
            " gpu",
        ],
    ),
    (
        Category::Regulatory,
        &[
            "regulat", " sec ", "gensler", "compliance", "lawsuit", "legislation", " law ",
            "policy", "congress", " mica ",
        ],
    ),
    (
        Category::Gaming,
        &["gaming", "game", "metaverse", "play to earn", " p2e ", "esports"],
    ),
];

/// Case-insensitive substring match of every keyword against the text.
pub fn detect_keywords(text: &str, keywords: &KeywordSet) -> BTreeSet<String> {
    let haystack = text.to_lowercase();
    keywords
        .iter()
        .filter(|keyword| haystack.contains(&keyword.to_lowercase()))
        .map(str::to_string)
        .collect()
}

/// Deterministic and total: every input maps to exactly one category.
pub fn categorize(text: &str, matched_keywords: &BTreeSet<String>) -> Category {
    let mut combined = String::with_capacity(text.len() + 64);
    combined.push_str(text);
    for keyword in matched_keywords {
        combined.push(' ');
        combined.push_str(keyword);
    }
    let haystack = normalize(&combined);

    CATEGORY_TESTS
        .iter()
        .find(|(_, terms)| terms.iter().any(|term| haystack.contains(term)))
        .map(|(category, _)| *category)
        .unwrap_or(Category::General)
}

fn normalize(text: &str) -> String {
    let folded: String = text
        .chars()
        .map(|c| {
            if c.is_alphanumeric() {
                c.to_lowercase().next().unwrap_or(c)
            } else {
                ' '
            }
        })
        .collect();
    format!(" {} ", folded)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keywords() -> KeywordSet {
        KeywordSet::new(["DeFi", "NFT", "Layer 2", "Bitcoin", "AI agents", "regulation", "gaming"])
    }

    #[test]
    fn test_detect_keywords_case_insensitive() {
        let found = detect_keywords("DEFI yield farming", &KeywordSet::new(["Defi"]));
        assert_eq!(found, BTreeSet::from(["Defi".to_string()]));
    }

    #[test]
    fn test_nft_post_scenario() {
        let text = "gm frens, just minted an NFT on opensea";
        let found = detect_keywords(text, &chainpulse_core::Catalog::builtin().keywords().clone());
        assert_eq!(found, BTreeSet::from(["NFT".to_string()]));
        assert_eq!(categorize(text, &found), Category::Nft);
    }

    #[test]
    fn test_defi_wins_tie_break_over_nft() {
        let text = "NFT lending is the next DeFi primitive";
        let found = detect_keywords(text, &keywords());
        assert_eq!(categorize(text, &found), Category::DeFi);
    }

    #[test]
    fn test_each_category_reachable() {
        let empty = BTreeSet::new();
        assert_eq!(categorize("Rollup fees dropped again", &empty), Category::Scaling);
        assert_eq!(categorize("Bitcoin at a new high", &empty), Category::MajorAsset);
        assert_eq!(categorize("Onchain AI is overhyped", &empty), Category::Ai);
        assert_eq!(categorize("The SEC filed another case", &empty), Category::Regulatory);
        assert_eq!(categorize("This game economy is broken", &empty), Category::Gaming);
    }

    #[test]
    fn test_word_boundary_terms_do_not_match_inside_words() {
        let empty = BTreeSet::new();
        // "said" and "again" contain "ai"; "second" contains "sec".
        assert_eq!(
            categorize("She said it again in the second panel", &empty),
            Category::General
        );
    }

    #[test]
    fn test_matched_keywords_feed_categorisation() {
        let matched = BTreeSet::from(["Layer 2".to_string()]);
        assert_eq!(categorize("big week ahead", &matched), Category::Scaling);
    }

    #[test]
    fn test_categorize_defaults_to_general() {
        assert_eq!(
            categorize("gm, coffee first", &BTreeSet::new()),
            Category::General
        );
        assert_eq!(categorize("", &BTreeSet::new()), Category::General);
    }

    #[test]
    fn test_categorize_is_deterministic() {
        let text = "Ethereum rollups and AI agents";
        let found = detect_keywords(text, &keywords());
        let first = categorize(text, &found);
        for _ in 0..10 {
            assert_eq!(categorize(text, &found), first);
        }
        assert_eq!(first, Category::Scaling);
    }
}
