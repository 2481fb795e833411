use super::*;
use serde_json::json;
use std::collections::HashSet;

#[test]
fn test_repository_equality_uses_all_fields() {
    let main = Repository::new("github.com", "acme/widgets", "main");
    let develop = Repository::new("github.com", "acme/widgets", "develop");

    assert_ne!(main, develop);

    let mut set = HashSet::new();
    set.insert(main.clone());
    set.insert(main.clone());
    set.insert(develop);
    assert_eq!(set.len(), 2);
}

#[test]
fn test_repository_owner_and_name() {
    let repository = Repository::new("github.com", "acme/widgets", "main");
    assert_eq!(repository.owner_and_name(), Some(("acme", "widgets")));

    let nested = Repository::new("gitlab.com", "group/sub/project", "main");
    assert_eq!(nested.owner_and_name(), None);

    let bare = Repository::new("github.com", "widgets", "main");
    assert_eq!(bare.owner_and_name(), None);
}

#[test]
fn test_run_state_round_trips_through_strings() {
    for state in RunState::ALL {
        assert_eq!(state.as_str().parse::<RunState>(), Ok(state));
    }
    assert_eq!("finished".parse::<RunState>(), Ok(RunState::Finished));
    assert!("DONE".parse::<RunState>().is_err());
}

#[test]
fn test_recipe_run_summary_deserializes_from_wire_format() {
    let node = json!({
        "debugMarkers": 0,
        "errorMarkers": 1,
        "infoMarkers": 2,
        "warningMarkers": 3,
        "timeSavings": "PT5M",
        "totalChanged": 4,
        "totalSearched": 120,
        "state": "FINISHED",
        "performance": { "recipeRun": "PT12S" },
        "repository": { "origin": "github.com", "path": "acme/widgets", "branch": "main" }
    });

    let summary: RecipeRunSummary = serde_json::from_value(node).unwrap();

    assert_eq!(summary.state, RunState::Finished);
    assert_eq!(summary.total_changed, 4);
    assert_eq!(summary.performance.recipe_run, "PT12S");
    assert_eq!(
        summary.repository,
        Repository::new("github.com", "acme/widgets", "main")
    );
}

#[test]
fn test_recipe_run_status_equality_includes_totals() {
    let status = RecipeRunStatus {
        id: "run-1".to_string(),
        state: RunState::Running,
        totals: RecipeRunTotals::default(),
    };
    let mut progressed = status.clone();
    progressed.totals.total_results = 7;

    assert_eq!(status, status.clone());
    assert_ne!(status, progressed);
}

#[test]
fn test_recipe_run_totals_repositories_searched() {
    let totals = RecipeRunTotals {
        total_repositories_successful: 1,
        total_repositories_with_errors: 2,
        total_repositories_with_results: 3,
        total_repositories_with_no_changes: 4,
        ..Default::default()
    };

    assert_eq!(totals.repositories_searched(), 10);
}

#[test]
fn test_commit_deserializes_with_missing_optional_fields() {
    let node = json!({
        "repository": { "origin": "github.com", "path": "acme/widgets", "branch": "main" },
        "state": "NO_CHANGES"
    });

    let commit: Commit = serde_json::from_value(node).unwrap();

    assert_eq!(commit.state, CommitState::NoChanges);
    assert!(commit.result_link.is_none());
    assert_eq!(commit.state.to_string(), "NO_CHANGES");
}

#[test]
fn test_commit_job_summary_without_state() {
    let job = json!({
        "id": "job-1",
        "completed": 3,
        "summaryResults": {
            "count": 5,
            "failedCount": 1,
            "noChangeCount": 1,
            "successfulCount": 1
        }
    });

    let summary: CommitJobSummary = serde_json::from_value(job).unwrap();

    assert_eq!(summary.state, None);
    assert_eq!(summary.summary_results.count, 5);
}

#[test]
fn test_gpg_key_debug_hides_key_material() {
    let key = GpgKey {
        passphrase: "secret-passphrase".to_string(),
        private_key: "PRIVATE".to_string(),
        public_key: "PUBLIC".to_string(),
    };

    let rendered = format!("{:?}", key);

    assert!(!rendered.contains("secret-passphrase"));
    assert!(!rendered.contains("PRIVATE"));
}

#[test]
fn test_gpg_key_serializes_camel_case() {
    let key = GpgKey {
        passphrase: "p".to_string(),
        private_key: "a".to_string(),
        public_key: "b".to_string(),
    };

    let value = serde_json::to_value(&key).unwrap();

    assert_eq!(value, json!({ "passphrase": "p", "privateKey": "a", "publicKey": "b" }));
}
