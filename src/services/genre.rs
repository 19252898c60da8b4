//! Genre label normalization
//!
//! Genre labels arrive as free text (user-entered on legacy books, seeded on
//! catalog titles) and carry typos, synonyms and arbitrary casing. The
//! recommenders only ever compare canonical forms produced here.

/// How a synonym-table needle is matched against the lower-cased, trimmed label
#[derive(Debug)]
enum Needle {
    Contains(&'static str),
    Equals(&'static str),
}

/// Synonym table mapping noisy labels onto the canonical taxonomy.
///
/// Checked top to bottom, first matching row wins. This is maintained data,
/// not an algorithm: extend it by adding rows. Labels matching no row are
/// title-cased as-is.
const SYNONYMS: &[(&[Needle], &str)] = &[
    (
        &[Needle::Contains("psycholog"), Needle::Contains("pscolog")],
        "Mystery",
    ),
    (
        &[Needle::Contains("fantas"), Needle::Contains("fanasy")],
        "Fantasy",
    ),
    (
        &[
            Needle::Contains("sci-fi"),
            Needle::Contains("sci fi"),
            Needle::Contains("science fiction"),
        ],
        "Sci-Fi",
    ),
    (
        &[Needle::Equals("self-help"), Needle::Contains("self help")],
        "Self-Help",
    ),
];

impl Needle {
    fn matches(&self, label: &str) -> bool {
        match self {
            Needle::Contains(s) => label.contains(s),
            Needle::Equals(s) => label == *s,
        }
    }
}

/// Canonicalizes a raw genre label; blank input carries no signal and yields `None`
pub fn normalize(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let lowered = trimmed.to_lowercase();
    for (needles, canonical) in SYNONYMS {
        if needles.iter().any(|n| n.matches(&lowered)) {
            return Some((*canonical).to_string());
        }
    }

    // No synonym matched: capitalize the first character, lower-case the rest
    let mut chars = trimmed.chars();
    let first = chars.next()?;
    Some(format!(
        "{}{}",
        first.to_uppercase(),
        chars.as_str().to_lowercase()
    ))
}
