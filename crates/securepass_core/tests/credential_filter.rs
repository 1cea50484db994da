use securepass_core::{filter_records, CredentialDraft, CredentialRecord};
use uuid::Uuid;

fn record(
    site_name: &str,
    login_name: &str,
    email: Option<&str>,
    note: Option<&str>,
) -> CredentialRecord {
    let mut draft = CredentialDraft::new(site_name, login_name, "secret");
    draft.login_email = email.map(str::to_string);
    draft.note = note.map(str::to_string);
    CredentialRecord::from_draft(Uuid::new_v4(), Uuid::new_v4(), draft, 1_000)
}

fn sample() -> Vec<CredentialRecord> {
    vec![
        record("GitHub", "octocat", Some("octo@gmail.com"), Some("work")),
        record("Bank of Gmailia", "alice", None, None),
        record("Forum", "bob", Some("bob@example.com"), Some("old GMAIL login")),
        record("Netflix", "family", None, Some("shared with kids")),
    ]
}

fn site_names(records: &[&CredentialRecord]) -> Vec<String> {
    records.iter().map(|record| record.site_name.clone()).collect()
}

#[test]
fn empty_term_returns_every_record_in_order() {
    let records = sample();

    let filtered = filter_records(&records, "");

    assert_eq!(filtered.len(), records.len());
    assert!(filtered
        .iter()
        .zip(records.iter())
        .all(|(left, right)| std::ptr::eq(*left, right)));
}

#[test]
fn matching_is_case_insensitive() {
    let records = sample();

    let upper = filter_records(&records, "GMAIL");
    let lower = filter_records(&records, "gmail");

    assert_eq!(upper, lower);
    assert_eq!(
        site_names(&upper),
        vec!["GitHub", "Bank of Gmailia", "Forum"]
    );
}

#[test]
fn matches_each_searchable_field() {
    let records = sample();

    assert_eq!(site_names(&filter_records(&records, "netf")), vec!["Netflix"]);
    assert_eq!(site_names(&filter_records(&records, "ALICE")), vec!["Bank of Gmailia"]);
    assert_eq!(site_names(&filter_records(&records, "example.com")), vec!["Forum"]);
    assert_eq!(site_names(&filter_records(&records, "kids")), vec!["Netflix"]);
}

#[test]
fn result_is_an_ordered_subsequence() {
    let records = sample();

    for term in ["o", "a", "b", "zzz", "Or", " "] {
        let filtered = filter_records(&records, term);
        let mut cursor = records.iter();
        for hit in &filtered {
            assert!(
                cursor.any(|record| std::ptr::eq(record, *hit)),
                "term `{term}` broke input order"
            );
        }
    }
}

#[test]
fn filtering_is_idempotent_and_leaves_input_untouched() {
    let records = sample();
    let before = records.clone();

    let once = filter_records(&records, "o")
        .into_iter()
        .cloned()
        .collect::<Vec<_>>();
    let twice = filter_records(&once, "o");

    assert_eq!(twice.len(), once.len());
    assert_eq!(records, before);
}

#[test]
fn unmatched_term_returns_nothing() {
    let records = sample();
    assert!(filter_records(&records, "nope").is_empty());
}
