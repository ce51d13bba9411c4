use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Hard per-post character limit of the platform.
pub const HARD_CHAR_LIMIT: usize = 280;
/// Target length that leaves headroom for thread numbering.
pub const SOFT_CHAR_LIMIT: usize = 270;
pub const ELLIPSIS: &str = "...";
/// Lines at or below this many characters are treated as noise.
pub const MIN_CONTENT_CHARS: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectEntry {
    pub name: String,
    pub handle: String,
    pub website: String,
    pub category: String,
}

/// Topic keywords used for classification. Keeps insertion order and drops
/// case-insensitive duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeywordSet {
    keywords: Vec<String>,
}

impl KeywordSet {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set = Self::default();
        for keyword in keywords {
            let keyword: String = keyword.into();
            let trimmed = keyword.trim();
            if trimmed.is_empty() {
                continue;
            }
            if !set
                .keywords
                .iter()
                .any(|existing| existing.eq_ignore_ascii_case(trimmed))
            {
                set.keywords.push(trimmed.to_string());
            }
        }
        set
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.keywords.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.keywords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }
}

/// Platform-ready text: a single post, or an ordered thread of numbered
/// chunks. Every chunk is at most [`HARD_CHAR_LIMIT`] characters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeneratedContent {
    Single(String),
    Thread(Vec<String>),
}

impl GeneratedContent {
    pub fn chunks(&self) -> &[String] {
        match self {
            GeneratedContent::Single(text) => std::slice::from_ref(text),
            GeneratedContent::Thread(chunks) => chunks,
        }
    }

    pub fn len(&self) -> usize {
        self.chunks().len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks().is_empty()
    }

    pub fn is_thread(&self) -> bool {
        matches!(self, GeneratedContent::Thread(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservedPost {
    /// Platform identifier used as the reply target.
    pub id: String,
    pub author: String,
    pub text: String,
    pub timestamp: DateTime<Utc>,
    pub url: String,
}

impl ObservedPost {
    pub fn age(&self, now: DateTime<Utc>) -> chrono::Duration {
        now.signed_duration_since(self.timestamp)
    }
}

/// Topic category of an observed post, listed in classification priority
/// order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    DeFi,
    Nft,
    Scaling,
    MajorAsset,
    Ai,
    Regulatory,
    Gaming,
    General,
}

impl Category {
    pub const ALL: [Category; 8] = [
        Category::DeFi,
        Category::Nft,
        Category::Scaling,
        Category::MajorAsset,
        Category::Ai,
        Category::Regulatory,
        Category::Gaming,
        Category::General,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::DeFi => "DeFi",
            Category::Nft => "NFT",
            Category::Scaling => "Scaling",
            Category::MajorAsset => "MajorAsset",
            Category::Ai => "AI",
            Category::Regulatory => "Regulatory",
            Category::Gaming => "Gaming",
            Category::General => "General",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
