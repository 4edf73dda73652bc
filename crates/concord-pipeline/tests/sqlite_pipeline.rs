//! End-to-end runs against an in-memory SQLite store and the mock classifier

use concord_classifier::MockClassifier;
use concord_domain::{AccessId, QuestionKey, RespondentProfile, RiskLevel};
use concord_pipeline::{Pipeline, PipelineConfig, PipelineError};
use concord_store::SqliteStore;

fn seed(store: &SqliteStore, id: &str) {
    let id = AccessId::from(id);
    let male = RespondentProfile {
        name: "Juan".to_string(),
        age: 34,
        civil_status: "Married".to_string(),
        years_living_together: 6,
        children: 2,
        education: "High School Graduate".to_string(),
        income: "5,000-10,000".to_string(),
        ..Default::default()
    };
    let female = RespondentProfile {
        name: "Maria".to_string(),
        age: 22,
        ..male.clone()
    };
    store.insert_profile(&id, "male", &male).unwrap();
    store.insert_profile(&id, "female", &female).unwrap();

    for (q, male_answer, female_answer) in [
        (1, "Strongly Agree", "Strongly Disagree"),
        (2, "5", "1"),
        (3, "Agree", "Agree"),
    ] {
        store
            .insert_answer(&id, "male", QuestionKey::new(1, q, None), male_answer)
            .unwrap();
        store
            .insert_answer(&id, "female", QuestionKey::new(1, q, None), female_answer)
            .unwrap();
    }
}

#[tokio::test]
async fn test_run_against_sqlite() {
    let store = SqliteStore::new(":memory:").unwrap();
    seed(&store, "c1");

    let pipeline = Pipeline::new(
        &store,
        MockClassifier::new(RiskLevel::High),
        &store,
        PipelineConfig::default(),
    )
    .unwrap();

    let request = pipeline.prepare(&AccessId::from("c1")).unwrap();
    assert_eq!(request.context.male_responses, vec![5, 5, 4]);
    assert_eq!(request.context.female_responses, vec![1, 1, 4]);
    assert_eq!(request.context.personalized_features.total_conflicts, 2);
    assert_eq!(request.context.demographics.male_age, 34);
    assert_eq!(request.context.demographics.female_age, 22);

    let outcome = pipeline.run(&AccessId::from("c1")).await.unwrap();
    let stored = store.get_verdict(&AccessId::from("c1")).unwrap().unwrap();
    assert_eq!(stored.verdict, outcome.verdict);

    let reasoning = stored.verdict.risk_reasoning.unwrap();
    assert!(reasoning.starts_with("High risk assessment based on: "));
    assert!(reasoning.contains("Significant age gap (12 years)"));
}

#[tokio::test]
async fn test_batch_against_sqlite() {
    let store = SqliteStore::new(":memory:").unwrap();
    seed(&store, "a");
    seed(&store, "b");

    let pipeline = Pipeline::new(
        &store,
        MockClassifier::default(),
        &store,
        PipelineConfig::default(),
    )
    .unwrap();

    let ids = vec![AccessId::from("a"), AccessId::from("ghost"), AccessId::from("b")];
    let report = pipeline.run_batch(&ids).await;

    assert_eq!((report.total, report.success, report.failed), (3, 2, 1));
    assert!(report.messages[0].contains("ghost"));
    assert_eq!(store.verdict_count().unwrap(), 2);
    assert!(store.pending_access_ids().unwrap().is_empty());
}

#[tokio::test]
async fn test_rerun_is_idempotent() {
    let store = SqliteStore::new(":memory:").unwrap();
    seed(&store, "c1");
    let pipeline = Pipeline::new(
        &store,
        MockClassifier::default(),
        &store,
        PipelineConfig::default(),
    )
    .unwrap();

    let first = pipeline.run(&AccessId::from("c1")).await.unwrap();
    let second = pipeline.run(&AccessId::from("c1")).await.unwrap();

    assert_ne!(first.run_id, second.run_id);
    assert_eq!(first.verdict, second.verdict);
    assert_eq!(store.verdict_count().unwrap(), 1);
}

#[tokio::test]
async fn test_profile_without_partner_fails() {
    let store = SqliteStore::new(":memory:").unwrap();
    let id = AccessId::from("solo");
    store
        .insert_profile(&id, "female", &RespondentProfile::default())
        .unwrap();

    let pipeline = Pipeline::new(
        &store,
        MockClassifier::default(),
        &store,
        PipelineConfig::default(),
    )
    .unwrap();
    let err = pipeline.run(&id).await.unwrap_err();
    assert!(matches!(err, PipelineError::MissingProfile { .. }));
    assert_eq!(pipeline.classifier().call_count(), 0);
}
