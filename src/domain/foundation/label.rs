//! Folding of free-text labels from the backend.

/// Lowercases and strips whitespace, underscores and hyphens.
///
/// "In Progress", "in_progress" and "IN-PROGRESS" all fold to "inprogress".
pub fn fold_label(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
        .flat_map(char::to_lowercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn separators_and_case_are_ignored() {
        assert_eq!(fold_label("Quality Checked"), "qualitychecked");
        assert_eq!(fold_label(" quality_checked "), "qualitychecked");
        assert_eq!(fold_label("QUALITY-CHECKED"), "qualitychecked");
    }

    #[test]
    fn empty_label_folds_to_empty() {
        assert_eq!(fold_label(" _- "), "");
    }
}
