//! Slugs for heading anchors.

use std::collections::{HashMap, HashSet};
use unicode_segmentation::UnicodeSegmentation;

/// Convert a heading or title into a URL-safe anchor
///
/// Lowercases, turns whitespace, `_` and `-` runs into a single hyphen and
/// drops punctuation. Letters outside ASCII are kept.
///
/// ```
/// use riscdocs_core::slugify;
///
/// assert_eq!(slugify("Getting Started"), "getting-started");
/// assert_eq!(slugify("AXI4-Lite & MMIO"), "axi4-lite-mmio");
/// assert_eq!(slugify("rv32i_cpu"), "rv32i-cpu");
/// ```
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_hyphen = false;

    for grapheme in input.graphemes(true) {
        let Some(first) = grapheme.chars().next() else {
            continue;
        };

        if first.is_whitespace() || first == '_' || first == '-' {
            pending_hyphen = !slug.is_empty();
        } else if first.is_alphanumeric() {
            if pending_hyphen {
                slug.push('-');
                pending_hyphen = false;
            }
            slug.extend(grapheme.chars().flat_map(char::to_lowercase));
        }
    }

    slug
}

/// Hands out unique slugs within one page (`intro`, `intro-1`, `intro-2`)
///
/// Every slug handed out or reserved is remembered, so a heading whose own
/// text slugifies to `intro-1` never collides with a numbered duplicate.
#[derive(Debug, Default)]
pub struct SlugAllocator {
    taken: HashSet<String>,
    next_suffix: HashMap<String, usize>,
}

impl SlugAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark an explicit id as used
    pub fn reserve(&mut self, id: &str) {
        self.taken.insert(id.to_string());
    }

    pub fn allocate(&mut self, text: &str) -> String {
        let mut base = slugify(text);
        if base.is_empty() {
            base = "section".to_string();
        }

        if self.taken.insert(base.clone()) {
            return base;
        }

        let suffix = self.next_suffix.entry(base.clone()).or_insert(1);
        loop {
            let candidate = format!("{}-{}", base, suffix);
            *suffix += 1;
            if self.taken.insert(candidate.clone()) {
                return candidate;
            }
        }
    }
}
