//! Integration tests for concord-store
//!
//! These tests cover reading couple records and the verdict upsert cycle.

use concord_domain::traits::{DataSource, ResultSink};
use concord_domain::{
    AccessId, Category, CoupleRecord, FocusCategory, QuestionKey, RawAnswer, RawValue,
    Respondent, RespondentProfile, RiskLevel, Verdict,
};
use concord_store::SqliteStore;
use std::collections::BTreeMap;

fn profile(name: &str, age: u32) -> RespondentProfile {
    RespondentProfile {
        name: name.to_string(),
        age,
        civil_status: "Living In".to_string(),
        years_living_together: 2,
        education: "College Graduate".to_string(),
        income: "10,000-20,000".to_string(),
        ..Default::default()
    }
}

fn verdict(risk_level: RiskLevel) -> Verdict {
    let mut scores = BTreeMap::new();
    scores.insert(Category::PlanningTheFamily.as_str().to_string(), 0.4);
    Verdict {
        risk_level,
        confidence: 0.7,
        category_scores: scores,
        focus_categories: vec![FocusCategory::new("Planning The Family", 0.4)],
        recommendations: vec!["Attend a family planning session".to_string()],
        method: "test".to_string(),
        risk_reasoning: Some("reason".to_string()),
        counseling_reasoning: None,
    }
}

#[test]
fn test_store_initialization() {
    let store = SqliteStore::new(":memory:");
    assert!(store.is_ok(), "Store should initialize successfully");
}

#[test]
fn test_record_roundtrip() {
    let store = SqliteStore::new(":memory:").unwrap();
    let id = AccessId::from("ABC123");

    store.insert_profile(&id, "male", &profile("Juan", 30)).unwrap();
    store.insert_profile(&id, "female", &profile("Maria", 28)).unwrap();

    let record = store.get_couple_record(&id).unwrap().unwrap();
    assert_eq!(record.access_id, id);
    assert_eq!(record.primary.as_ref().unwrap().name, "Juan");
    assert_eq!(record.secondary.as_ref().unwrap().age, 28);
    assert!(record.answers.is_empty());
}

#[test]
fn test_answers_are_ordered_and_typed() {
    let store = SqliteStore::new(":memory:").unwrap();
    let id = AccessId::from("c1");

    // Inserted out of order
    store.insert_answer(&id, "female", QuestionKey::new(2, 1, None), "Disagree").unwrap();
    store.insert_answer(&id, "male", QuestionKey::new(1, 2, Some(1)), "4").unwrap();
    store.insert_answer(&id, "male", QuestionKey::new(1, 2, None), "Agree").unwrap();
    store.insert_answer(&id, "Female", QuestionKey::new(1, 1, None), " 5 ").unwrap();

    let record = store.get_couple_record(&id).unwrap().unwrap();
    let keys: Vec<_> = record.answers.iter().map(|a| a.key).collect();
    assert_eq!(
        keys,
        vec![
            QuestionKey::new(1, 1, None),
            QuestionKey::new(1, 2, None),
            QuestionKey::new(1, 2, Some(1)),
            QuestionKey::new(2, 1, None),
        ]
    );

    assert_eq!(record.answers[0].respondent, Respondent::Secondary);
    assert_eq!(record.answers[0].value, RawValue::Numeric(5));
    assert_eq!(record.answers[1].value, RawValue::Textual("Agree".to_string()));
    assert_eq!(record.answers[2].value, RawValue::Numeric(4));
    assert!(record.primary.is_none());
}

#[test]
fn test_unknown_label_reads_as_primary() {
    let store = SqliteStore::new(":memory:").unwrap();
    let id = AccessId::from("c2");
    store.insert_answer(&id, "partner", QuestionKey::new(1, 1, None), "3").unwrap();

    let record = store.get_couple_record(&id).unwrap().unwrap();
    assert_eq!(record.answers[0].respondent, Respondent::Primary);
}

#[test]
fn test_records_are_isolated_by_access_id() {
    let store = SqliteStore::new(":memory:").unwrap();
    store
        .insert_answer(&AccessId::from("a"), "male", QuestionKey::new(1, 1, None), "1")
        .unwrap();
    store
        .insert_answer(&AccessId::from("b"), "male", QuestionKey::new(1, 1, None), "5")
        .unwrap();

    let a = store.get_couple_record(&AccessId::from("a")).unwrap().unwrap();
    assert_eq!(a.answers.len(), 1);
    assert_eq!(a.answers[0].value, RawValue::Numeric(1));

    assert_eq!(
        store.list_access_ids().unwrap(),
        vec![AccessId::from("a"), AccessId::from("b")]
    );
}

#[test]
fn test_persist_is_an_upsert() {
    let store = SqliteStore::new(":memory:").unwrap();
    let id = AccessId::from("c3");

    store.persist(&id, &verdict(RiskLevel::High)).unwrap();
    store.persist(&id, &verdict(RiskLevel::Low)).unwrap();

    assert_eq!(store.verdict_count().unwrap(), 1);
    let stored = store.get_verdict(&id).unwrap().unwrap();
    assert_eq!(stored.verdict.risk_level, RiskLevel::Low);
    assert_eq!(stored.verdict, verdict(RiskLevel::Low));
    assert!(stored.updated_at > 0);
}

#[test]
fn test_pending_excludes_classified_couples() {
    let store = SqliteStore::new(":memory:").unwrap();
    let done = AccessId::from("done");
    let waiting = AccessId::from("waiting");
    store.insert_profile(&done, "male", &profile("Juan", 30)).unwrap();
    store
        .insert_answer(&waiting, "female", QuestionKey::new(1, 1, None), "2")
        .unwrap();

    assert_eq!(store.pending_access_ids().unwrap(), vec![done.clone(), waiting.clone()]);

    store.persist(&done, &verdict(RiskLevel::Low)).unwrap();
    assert_eq!(store.pending_access_ids().unwrap(), vec![waiting]);
}

#[test]
fn test_persist_same_verdict_twice_is_idempotent() {
    let store = SqliteStore::new(":memory:").unwrap();
    let id = AccessId::from("c4");

    store.persist(&id, &verdict(RiskLevel::Medium)).unwrap();
    store.persist(&id, &verdict(RiskLevel::Medium)).unwrap();

    assert_eq!(store.verdict_count().unwrap(), 1);
    assert_eq!(
        store.get_verdict(&id).unwrap().unwrap().verdict,
        verdict(RiskLevel::Medium)
    );
}

#[test]
fn test_import_record_replaces_answers() {
    let store = SqliteStore::new(":memory:").unwrap();
    let id = AccessId::from("imported");

    let mut record = CoupleRecord::new(id.clone());
    record.primary = Some(profile("Juan", 30));
    record.secondary = Some(profile("Maria", 27));
    record.answers = vec![
        RawAnswer::new(Respondent::Primary, QuestionKey::new(1, 1, None), 5i64),
        RawAnswer::new(Respondent::Secondary, QuestionKey::new(1, 1, None), "Neutral"),
    ];

    assert_eq!(store.import_record(&record).unwrap(), 2);
    assert_eq!(store.import_record(&record).unwrap(), 2);

    let loaded = store.get_couple_record(&id).unwrap().unwrap();
    assert_eq!(loaded, record);
}

#[test]
fn test_category_map_from_catalog() {
    let store = SqliteStore::new(":memory:").unwrap();
    store
        .insert_category(7, "MARRIAGE EXPECTATIONS AND INVENTORY ON RESPONSIBLE PARENTHOOD")
        .unwrap();
    store
        .insert_category(8, "MARRIAGE EXPECTATIONS AND INVENTORY ON FINANCES")
        .unwrap();

    let map = store.load_category_map("catalog").unwrap().unwrap();
    assert_eq!(map.version, "catalog");
    assert_eq!(map.category_of(7), Some(Category::ResponsibleParenthood));
    assert_eq!(map.category_of(8), None);
}

#[test]
fn test_file_backed_store_persists() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("concord.db");
    let id = AccessId::from("durable");

    {
        let store = SqliteStore::new(&path).unwrap();
        store.insert_profile(&id, "male", &profile("Juan", 30)).unwrap();
        store.persist(&id, &verdict(RiskLevel::High)).unwrap();
    }

    let store = SqliteStore::new(&path).unwrap();
    assert!(store.get_couple_record(&id).unwrap().is_some());
    assert_eq!(
        store.get_verdict(&id).unwrap().unwrap().verdict.risk_level,
        RiskLevel::High
    );
}
