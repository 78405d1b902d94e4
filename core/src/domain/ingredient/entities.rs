use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

const BULLETS: &[char] = &['-', '*', '•', '·'];
const TRAILING_PUNCTUATION: &[char] = &['.', ',', ';', ':', '!', '?'];

/// Ordered ingredient names as the vision model reported them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct IngredientList(Vec<String>);

impl IngredientList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a comma-separated model answer. Entries are trimmed, lose list
    /// bullets and trailing punctuation, and empty entries are dropped.
    pub fn parse_response(text: &str) -> Self {
        let items = text
            .split([',', '\n'])
            .filter_map(clean_entry)
            .collect();
        Self(items)
    }

    /// Parses user-typed hints, which use the same comma-separated shape.
    pub fn from_hints<S: AsRef<str>>(hints: &[S]) -> Self {
        let mut list = Self::new();
        for hint in hints {
            list.merge(Self::parse_response(hint.as_ref()));
        }
        list
    }

    /// Appends the entries of `other` that are not already present,
    /// comparing case-insensitively and keeping first-seen order.
    pub fn merge(&mut self, other: IngredientList) {
        for item in other.0 {
            let key = item.to_lowercase();
            if !self.0.iter().any(|existing| existing.to_lowercase() == key) {
                self.0.push(item);
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<String> {
        self.0
    }
}

impl From<Vec<String>> for IngredientList {
    fn from(items: Vec<String>) -> Self {
        Self(items)
    }
}

fn clean_entry(raw: &str) -> Option<String> {
    let entry = raw
        .trim()
        .trim_start_matches(BULLETS)
        .trim()
        .trim_end_matches(TRAILING_PUNCTUATION)
        .trim();

    if entry.is_empty() {
        None
    } else {
        Some(entry.to_string())
    }
}
