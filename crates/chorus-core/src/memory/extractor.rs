//! Importance heuristics for memory extraction.
//!
//! A user turn is worth remembering only when it states something durable
//! about the user: who they are, what they like, where they live or work,
//! or an explicit request to remember. Everything else is dropped. A semantic
//! extractor can replace this module behind the `MemoryBackend` seam.

use std::sync::LazyLock;

use regex::Regex;

use chorus_types::memory::MemoryCategory;

/// Ordered (category, pattern) table. The first matching row wins.
static PATTERNS: LazyLock<Vec<(MemoryCategory, Regex)>> = LazyLock::new(|| {
    [
        (
            MemoryCategory::Identity,
            r"(?i)\b(my name is|call me|i am called|i['’]?m called)\b|我叫|我的名字",
        ),
        (
            MemoryCategory::Location,
            r"(?i)\b(i live in|i['’]?m from|i am from|i['’]?m based in|i am based in|i moved to)\b|我住在|我来自",
        ),
        (
            MemoryCategory::Occupation,
            r"(?i)\bi work (as|at|for|in)\b|\bmy (job|profession|occupation) is\b|\bi(['’]?m| am) an? (developer|engineer|programmer|designer|teacher|student|doctor|nurse|writer|manager|researcher|scientist|lawyer)\b|我的工作|我是一名",
        ),
        (
            MemoryCategory::Preference,
            r"(?i)\bi (really )?(like|love|enjoy|prefer|hate|dislike)\b|\bmy favou?rite\b|我喜欢|我爱|我讨厌",
        ),
        (
            MemoryCategory::Instruction,
            r"(?i)\b(remember (that|this|me|my)|please remember|don['’]?t forget|do not forget|keep in mind)\b|记住|别忘了",
        ),
        (
            MemoryCategory::Marked,
            r"(?i)\bimportant\b|^\s*note\s*:|重要",
        ),
    ]
    .into_iter()
    .filter_map(|(category, pattern)| match Regex::new(pattern) {
        Ok(regex) => Some((category, regex)),
        Err(e) => {
            tracing::error!(%category, error = %e, "Invalid memory importance pattern");
            None
        }
    })
    .collect()
});

/// The importance category `content` falls under, if any.
pub fn classify(content: &str) -> Option<MemoryCategory> {
    PATTERNS
        .iter()
        .find(|(_, regex)| regex.is_match(content))
        .map(|(category, _)| *category)
}
