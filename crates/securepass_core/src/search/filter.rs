//! Substring filter over credential records.
//!
//! # Invariants
//! - Output is a subsequence of the input in the same relative order.
//! - Matching is case-insensitive; the term is not trimmed.
//! - An empty term returns every record.
//! - The input is never mutated.

use crate::model::credential::CredentialRecord;

/// Returns the records whose `site_name`, `login_name`, `login_email` or
/// `note` contains `term`, ignoring case.
pub fn filter_records<'a>(
    records: &'a [CredentialRecord],
    term: &str,
) -> Vec<&'a CredentialRecord> {
    if term.is_empty() {
        return records.iter().collect();
    }

    let needle = term.to_lowercase();
    records
        .iter()
        .filter(|record| matches_term(record, &needle))
        .collect()
}

/// Returns whether `record` matches an already lowercased `needle`.
fn matches_term(record: &CredentialRecord, needle: &str) -> bool {
    [
        Some(record.site_name.as_str()),
        Some(record.login_name.as_str()),
        record.login_email.as_deref(),
        record.note.as_deref(),
    ]
    .into_iter()
    .flatten()
    .any(|field| field.to_lowercase().contains(needle))
}
