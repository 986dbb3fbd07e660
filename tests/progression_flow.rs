//! End-to-end progression through the built-in curriculum

use nature_quest::progression::VariantMatch;
use nature_quest::storage::keys;
use nature_quest::{
    Catalog, ExperimentStatus, FileStore, InMemoryStore, KeyValueStore, LearnerProfile,
    ObservationInput, ProgressionEngine, StoredProfile,
};
use std::sync::Arc;

fn notes(text: &str) -> ObservationInput {
    ObservationInput {
        notes: text.to_string(),
        rating: 4,
        photo_ref: None,
    }
}

fn engine_for(store: Arc<dyn KeyValueStore>, age_group: &str) -> anyhow::Result<ProgressionEngine> {
    let catalog = Arc::new(Catalog::builtin()?);
    Ok(ProgressionEngine::new(store, catalog, Arc::new(LearnerProfile::new(age_group))))
}

#[tokio::test]
async fn test_young_learner_walks_the_curriculum() -> anyhow::Result<()> {
    let engine = engine_for(Arc::new(InMemoryStore::new()), "4-5")?;

    let eligible: Vec<String> = engine.eligible_experiments().await.into_iter().map(|e| e.id).collect();
    assert_eq!(eligible.len(), 10);
    assert!(eligible.contains(&"static-balloon".to_string()));
    assert!(!eligible.contains(&"weather-station".to_string()));
    assert!(!eligible.contains(&"solar-oven".to_string()));

    let current = engine.current_experiment().await.expect("curriculum has experiments");
    assert_eq!(current.experiment.id, "rainbow-milk");

    let steps = engine.resolve_steps("rainbow-milk").await.expect("known experiment");
    assert_eq!(steps.steps.len(), 4);
    assert_eq!(steps.matched_by, VariantMatch::NumericBucket);
    assert_eq!(steps.estimated_time, "10 min");

    let steps = engine.resolve_steps("bean-sprout").await.expect("known experiment");
    assert_eq!(steps.matched_by, VariantMatch::Exact);
    assert_eq!(steps.steps.len(), 3);

    let mut total = 0;
    for id in &eligible {
        let result = engine.complete_experiment(id, notes("done")).await;
        assert!(result.success, "{} should complete", id);
        total += u64::from(result.points_earned);
    }

    let progress = engine.progress().await;
    assert_eq!(progress.total_completed, 10);
    assert_eq!(progress.total_points, total);
    assert!(engine.current_experiment().await.is_none());
    assert!(engine
        .experiment_statuses()
        .await
        .iter()
        .all(|e| e.status == ExperimentStatus::Completed));

    for id in ["first-experiment", "five-experiments", "ten-experiments", "streak-7", "points-500", "points-1000"] {
        assert!(progress.has_badge(id), "missing badge {}", id);
    }
    for category in ["chemistry", "physics", "biology", "earth-science"] {
        assert!(progress.has_badge(&format!("category-{}", category)));
    }
    Ok(())
}

#[tokio::test]
async fn test_older_learner_sees_hard_track() -> anyhow::Result<()> {
    let engine = engine_for(Arc::new(InMemoryStore::new()), "10-12")?;
    let eligible: Vec<String> = engine.eligible_experiments().await.into_iter().map(|e| e.id).collect();
    assert!(eligible.contains(&"solar-oven".to_string()));
    assert!(!eligible.contains(&"static-balloon".to_string()));

    let steps = engine.resolve_steps("density-tower").await.expect("known experiment");
    assert_eq!(steps.variant.as_deref(), Some("10-12"));
    assert_eq!(steps.estimated_time, "45 min");
    Ok(())
}

#[tokio::test]
async fn test_progress_survives_restart() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;

    {
        let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::with_dir(dir.path().to_path_buf()));
        StoredProfile::new(store.clone()).save(&LearnerProfile::new("6-7")).await;
        let catalog = Arc::new(Catalog::builtin()?);
        let engine = ProgressionEngine::new(store.clone(), catalog, Arc::new(StoredProfile::new(store)));
        assert!(engine.complete_experiment("rainbow-milk", notes("swirls")).await.success);
        assert!(engine.complete_experiment("sink-or-float", notes("apple floats")).await.success);
    }

    let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::with_dir(dir.path().to_path_buf()));
    let catalog = Arc::new(Catalog::builtin()?);
    let engine = ProgressionEngine::new(store.clone(), catalog, Arc::new(StoredProfile::new(store.clone())));

    let progress = engine.progress().await;
    assert_eq!(progress.total_completed, 2);
    assert_eq!(progress.total_points, 100);
    assert_eq!(engine.completed_ids().await, vec!["rainbow-milk", "sink-or-float"]);
    assert_eq!(engine.observations().await["sink-or-float"].notes, "apple floats");
    assert_eq!(engine.current_experiment().await.map(|c| c.experiment.id), Some("bean-sprout".to_string()));

    assert!(!engine.complete_experiment("rainbow-milk", notes("again")).await.success);

    let raw = store.get(keys::PROGRESS).await?.expect("progress persisted");
    let json: serde_json::Value = serde_json::from_str(&raw)?;
    assert_eq!(json["totalExperimentsCompleted"], 2);
    assert_eq!(json["totalPoints"], 100);
    assert_eq!(json["badges"][0]["id"], "first-experiment");
    assert!(json["badges"][0]["earnedAt"].is_string());
    Ok(())
}

#[tokio::test]
async fn test_malformed_progress_falls_back_to_defaults() -> anyhow::Result<()> {
    let store: Arc<dyn KeyValueStore> = Arc::new(InMemoryStore::new());
    store.set(keys::PROGRESS, "{not json".to_string()).await?;

    let engine = engine_for(store, "8-9")?;
    let progress = engine.progress().await;
    assert_eq!(progress.total_completed, 0);
    assert_eq!(progress.current_week, 1);

    let result = engine.complete_experiment("rainbow-milk", notes("ok")).await;
    assert!(result.success);
    assert_eq!(engine.progress().await.total_points, 50);
    Ok(())
}

#[tokio::test]
async fn test_label_without_age_sees_full_curriculum() -> anyhow::Result<()> {
    let total = Catalog::builtin()?.experiments().len();
    for label in ["", "toddler"] {
        let engine = engine_for(Arc::new(InMemoryStore::new()), label)?;
        assert_eq!(engine.eligible_experiments().await.len(), total, "label {:?}", label);
    }
    Ok(())
}
