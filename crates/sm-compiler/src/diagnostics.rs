use sm_core::SkinMenuError;

/// Recoverable problems collected while building. Each distinct entry is
/// stored and logged once.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Diagnostics {
    entries: Vec<SkinMenuError>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report(&mut self, error: SkinMenuError) {
        if self.entries.contains(&error) {
            return;
        }
        log::warn!("{error}");
        self.entries.push(error);
    }

    pub fn push(&mut self, code: &str, message: impl Into<String>) {
        self.report(SkinMenuError::new(code, message));
    }

    pub fn extend(&mut self, other: Diagnostics) {
        for entry in other.entries {
            self.report(entry);
        }
    }

    pub fn entries(&self) -> &[SkinMenuError] {
        &self.entries
    }

    pub fn into_vec(self) -> Vec<SkinMenuError> {
        self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn has_code(&self, code: &str) -> bool {
        self.entries.iter().any(|entry| entry.code == code)
    }
}

#[cfg(test)]
mod diagnostics_tests {
    use super::*;

    #[test]
    fn report_deduplicates_identical_entries() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.push("PRESET_UNKNOWN", "Unknown preset \"a\".");
        diagnostics.push("PRESET_UNKNOWN", "Unknown preset \"a\".");
        diagnostics.push("PRESET_UNKNOWN", "Unknown preset \"b\".");
        assert_eq!(diagnostics.len(), 2);
        assert!(diagnostics.has_code("PRESET_UNKNOWN"));
        assert!(!diagnostics.has_code("INCLUDE_UNKNOWN"));
    }

    #[test]
    fn extend_merges_without_duplicates() {
        let mut first = Diagnostics::new();
        first.push("A", "one");
        let mut second = Diagnostics::new();
        second.push("A", "one");
        second.push("B", "two");
        first.extend(second);
        let codes = first
            .into_vec()
            .into_iter()
            .map(|entry| entry.code)
            .collect::<Vec<_>>();
        assert_eq!(codes, vec!["A".to_string(), "B".to_string()]);
    }
}
