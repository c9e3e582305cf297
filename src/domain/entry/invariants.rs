use super::entity::MediaEntry;
use crate::domain::{DomainError, DomainResult};

/// Validates all MediaEntry invariants
pub fn validate_entry(entry: &MediaEntry) -> DomainResult<()> {
    validate_id(entry)?;
    validate_titles(entry)?;
    Ok(())
}

/// Catalog IDs start at 1
fn validate_id(entry: &MediaEntry) -> DomainResult<()> {
    if entry.id == 0 {
        return Err(DomainError::InvariantViolation(format!(
            "Entry '{}' has no catalog ID",
            entry.titles.primary
        )));
    }
    Ok(())
}

/// At least one title variant must be usable for matching
fn validate_titles(entry: &MediaEntry) -> DomainResult<()> {
    if entry.titles.variants().is_empty() {
        return Err(DomainError::InvariantViolation(format!(
            "Entry #{} has no usable title",
            entry.id
        )));
    }
    Ok(())
}

/// Invariants that must hold true for MediaEntry:
///
/// 1. The catalog ID is non-zero
/// 2. At least one title variant is non-blank
/// 3. Media kind is carried by the progress variant, never inferred
/// 4. A missing status means "not on the list", not an error

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entry::{EntryTitles, MediaProgress};

    #[test]
    fn test_valid_entry() {
        let entry = MediaEntry::new(
            5114,
            "Fullmetal Alchemist: Brotherhood",
            MediaProgress::episodic(0, 64),
        );
        assert!(validate_entry(&entry).is_ok());
    }

    #[test]
    fn test_zero_id_fails() {
        let entry = MediaEntry::new(0, "Trigun", MediaProgress::episodic(0, 26));
        assert!(validate_entry(&entry).is_err());
    }

    #[test]
    fn test_blank_titles_fail() {
        let entry = MediaEntry::new(6, "   ", MediaProgress::episodic(0, 26))
            .with_titles(EntryTitles {
                primary: " ".to_string(),
                english: Some(String::new()),
                native: None,
            });
        assert!(validate_entry(&entry).is_err());
    }

    #[test]
    fn test_english_title_alone_is_enough() {
        let entry = MediaEntry::new(6, "", MediaProgress::episodic(0, 26)).with_titles(EntryTitles {
            primary: String::new(),
            english: Some("Trigun".to_string()),
            native: None,
        });
        assert!(validate_entry(&entry).is_ok());
    }
}
