//! Locale matching for the language rule.
//!
//! A title "names a locale" when any known locale tag occurs in it as a
//! case-insensitive substring. Titles without any tag are language-neutral
//! and never declined here. Short tags can collide with unrelated product
//! codes; that false-positive risk is accepted.

use std::collections::BTreeSet;

use regex::{Regex, RegexBuilder};

/// Compiled alternations over the known and the allowed locale tags.
#[derive(Debug, Clone)]
pub struct LocaleMatcher {
    any_locale: Option<Regex>,
    allowed: Option<Regex>,
}

/// Builds `(?:tag1|tag2|...)`, case-insensitive; `None` for an empty set.
fn alternation<'a, I>(tags: I) -> Result<Option<Regex>, regex::Error>
where
    I: IntoIterator<Item = &'a String>,
{
    let escaped: Vec<String> = tags
        .into_iter()
        .filter(|t| !t.is_empty())
        .map(|t| regex::escape(t))
        .collect();
    if escaped.is_empty() {
        return Ok(None);
    }
    RegexBuilder::new(&format!("(?:{})", escaped.join("|")))
        .case_insensitive(true)
        .build()
        .map(Some)
}

impl LocaleMatcher {
    /// Compiles both alternations once per run.
    ///
    /// # Errors
    ///
    /// Returns a `regex::Error` only if the tag list is large enough to
    /// exceed the regex size limit.
    pub fn new(
        all_locales: &BTreeSet<String>,
        allowed_locales: &BTreeSet<String>,
    ) -> Result<Self, regex::Error> {
        Ok(Self {
            any_locale: alternation(all_locales)?,
            allowed: alternation(allowed_locales)?,
        })
    }

    /// True iff the title names some known locale and none of the allowed ones.
    ///
    /// An empty allow-list disables the rule.
    pub fn matches_disallowed_locale(&self, title: &str) -> bool {
        let (Some(any_locale), Some(allowed)) = (&self.any_locale, &self.allowed) else {
            return false;
        };
        any_locale.is_match(title) && !allowed.is_match(title)
    }
}

/// One-shot form of [`LocaleMatcher::matches_disallowed_locale`].
pub fn matches_disallowed_locale(
    title: &str,
    all_locales: &BTreeSet<String>,
    allowed_locales: &BTreeSet<String>,
) -> bool {
    LocaleMatcher::new(all_locales, allowed_locales)
        .map(|m| m.matches_disallowed_locale(title))
        .unwrap_or(false)
}
