use chainpulse_core::{Category, ObservedPost, ProjectEntry};
use chrono::NaiveDate;
use std::collections::BTreeSet;
use std::fmt;

/// Market narrative rotated into post prompts so consecutive runs do not
/// read alike.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarketContext {
    BullMomentum,
    BearCapitulation,
    SidewaysChop,
    AltcoinSeason,
    BitcoinDominance,
    MacroRiskOff,
    RegulatoryHeadlines,
    NarrativeRotation,
    LiquidityCrunch,
    EtfFlows,
}

impl MarketContext {
    pub const ALL: [MarketContext; 10] = [
        MarketContext::BullMomentum,
        MarketContext::BearCapitulation,
        MarketContext::SidewaysChop,
        MarketContext::AltcoinSeason,
        MarketContext::BitcoinDominance,
        MarketContext::MacroRiskOff,
        MarketContext::RegulatoryHeadlines,
        MarketContext::NarrativeRotation,
        MarketContext::LiquidityCrunch,
        MarketContext::EtfFlows,
    ];

    pub fn random() -> Self {
        Self::ALL[fastrand::usize(..Self::ALL.len())]
    }

    pub fn description(&self) -> &'static str {
        match self {
            MarketContext::BullMomentum => "strong bullish momentum with risk appetite returning",
            MarketContext::BearCapitulation => "a bearish market where weak hands are capitulating",
            MarketContext::SidewaysChop => "a sideways, range-bound market with low conviction",
            MarketContext::AltcoinSeason => "an altcoin season with capital rotating out of majors",
            MarketContext::BitcoinDominance => {
                "rising Bitcoin dominance draining altcoin liquidity"
            }
            MarketContext::MacroRiskOff => "a macro risk-off environment driven by rates",
            MarketContext::RegulatoryHeadlines => "a week dominated by regulatory headlines",
            MarketContext::NarrativeRotation => "fast narrative rotation between sectors",
            MarketContext::LiquidityCrunch => "thin onchain liquidity and widening spreads",
            MarketContext::EtfFlows => "ETF flows setting the tone for spot demand",
        }
    }
}

impl fmt::Display for MarketContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

pub fn build_prompt(project: &ProjectEntry, context: MarketContext, date: NaiveDate) -> String {
    format!(
        "Today is {date}. The market is in {context}.\n\
         Write 2 or 3 short analytical posts about {name} ({handle}, {website}), \
         a {category} project.\n\
         Cover what the project is building, why it matters in the current market, \
         and one specific thing worth watching next.\n\
         Rules:\n\
         - One post per line, no numbering, no hashtags, no emojis.\n\
         - Each line under 270 characters.\n\
         - Mention {handle} exactly once.\n\
         - No price predictions and no financial advice.",
        date = date.format("%B %-d, %Y"),
        context = context,
        name = project.name,
        handle = project.handle,
        website = project.website,
        category = project.category,
    )
}

pub fn build_reply_prompt(
    post: &ObservedPost,
    matched_keywords: &BTreeSet<String>,
    category: Category,
) -> String {
    let keywords = if matched_keywords.is_empty() {
        "none".to_string()
    } else {
        matched_keywords
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    };

    format!(
        "@{author} posted:\n\"{text}\"\n\n\
         Detected topics: {keywords}\n\
         Category: {category}\n\n\
         Write one thoughtful reply that adds a concrete insight about this {category} topic.\n\
         Rules: a single sentence or two, under 270 characters, no hashtags, \
         no emojis, no links, do not start with \"Great post\".",
        author = post.author,
        text = post.text,
        keywords = keywords,
        category = category,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn monad() -> ProjectEntry {
        ProjectEntry {
            name: "Monad".to_string(),
            handle: "@monad_xyz".to_string(),
            website: "https://www.monad.xyz".to_string(),
            category: "Parallel EVM".to_string(),
        }
    }

    #[test]
    fn test_build_prompt_is_deterministic() {
        let date = NaiveDate::from_ymd_opt(2026, 10, 17).unwrap();
        let first = build_prompt(&monad(), MarketContext::AltcoinSeason, date);
        let second = build_prompt(&monad(), MarketContext::AltcoinSeason, date);
        assert_eq!(first, second);

        assert!(first.contains("October 17, 2026"));
        assert!(first.contains("Monad (@monad_xyz, https://www.monad.xyz)"));
        assert!(first.contains("a Parallel EVM project"));
        assert!(first.contains(MarketContext::AltcoinSeason.description()));
    }

    #[test]
    fn test_market_context_random_is_member() {
        for _ in 0..20 {
            assert!(MarketContext::ALL.contains(&MarketContext::random()));
        }
    }

    #[test]
    fn test_build_reply_prompt() {
        let post = ObservedPost {
            id: "1849".to_string(),
            author: "punk6529".to_string(),
            text: "gm frens, just minted an NFT on opensea".to_string(),
            timestamp: Utc.with_ymd_and_hms(2026, 10, 17, 12, 0, 0).unwrap(),
            url: "https://x.com/punk6529/status/1849".to_string(),
        };
        let matched = BTreeSet::from(["NFT".to_string()]);
        let prompt = build_reply_prompt(&post, &matched, Category::Nft);

        assert!(prompt.starts_with("@punk6529 posted:"));
        assert!(prompt.contains("\"gm frens, just minted an NFT on opensea\""));
        assert!(prompt.contains("Detected topics: NFT"));
        assert!(prompt.contains("Category: NFT"));

        let bare = build_reply_prompt(&post, &BTreeSet::new(), Category::General);
        assert!(bare.contains("Detected topics: none"));
    }
}
