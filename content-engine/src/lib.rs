//! Turns catalog entries and observed posts into platform-ready text.

pub mod classifier;
pub mod cleaning;
pub mod composer;
pub mod prompts;
pub mod thread;

pub use classifier::{categorize, detect_keywords};
pub use cleaning::{
    clean_lines, clean_reply, postprocess, strip_wrapping_quotes, truncate_with_ellipsis,
};
pub use composer::{shape, ContentComposer, ReplyComposer, ReplyDraft};
pub use prompts::{build_prompt, build_reply_prompt, MarketContext};
pub use thread::{number_chunks, split_into_thread};
