use itertools::Itertools;
use serde::Serialize;

/// Trims, drops blanks and de-duplicates case-insensitively, keeping the first spelling seen.
pub fn unique_trimmed_values<I, S>(values: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    values
        .into_iter()
        .map(|v| v.as_ref().trim().to_string())
        .filter(|v| !v.is_empty())
        .unique_by(|v| v.to_lowercase())
        .collect()
}

fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Selected values for one facet (genre or artist).
///
/// Values are trimmed and unique ignoring case. Only whitespace and case are normalized:
/// "Drum & Bass" and "drum and bass" are two different values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FacetSelection {
    values: Vec<String>,
}

impl FacetSelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_values<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            values: unique_trimmed_values(values),
        }
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn contains(&self, candidate: &str) -> bool {
        let needle = normalize(candidate);
        !needle.is_empty() && self.values.iter().any(|v| normalize(v) == needle)
    }

    /// Returns true when the value was added.
    pub fn add(&mut self, candidate: &str) -> bool {
        let trimmed = candidate.trim();
        if trimmed.is_empty() || self.contains(trimmed) {
            return false;
        }
        self.values.push(trimmed.to_string());
        true
    }

    /// Returns true when something was removed.
    pub fn remove(&mut self, candidate: &str) -> bool {
        let needle = normalize(candidate);
        let before = self.values.len();
        self.values.retain(|v| normalize(v) != needle);
        self.values.len() != before
    }

    pub fn toggle(&mut self, candidate: &str) {
        if self.contains(candidate) {
            self.remove(candidate);
        } else {
            self.add(candidate);
        }
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }
}
