//! Persistence guarantees of the hook store, exercised through the public API

use std::fs;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use tempfile::TempDir;
use webhook_admin::hooks::{self, MatchType, TriggerRule};
use webhook_admin::{AppError, CommitStage, ConfigStore};

mod fixtures {
    pub const DEPLOY_HOOK: &str = r#"- id: deploy
  execute-command: /srv/scripts/deploy.sh
  trigger-rule:
    match: {type: value, value: refs/heads/main, parameter: {source: payload, name: ref}}
"#;

    pub const TWO_NEW_HOOKS: &str = r#"- id: deploy
  execute-command: /srv/scripts/deploy.sh
- id: build
  execute-command: /srv/scripts/build.sh
  trigger-rule:
    and:
      - match: {type: value, value: main, parameter: {source: payload, name: ref}}
      - match: {type: regex, regex: "^v[0-9]+", parameter: {source: query, name: tag}}
- id: notify
  execute-command: /srv/scripts/notify.sh
"#;
}

fn store_in(dir: &TempDir) -> ConfigStore {
    ConfigStore::new(dir.path().join("hooks.yaml"))
}

fn dir_entries(dir: &TempDir) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[test]
fn test_first_run_then_commit() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);

    assert!(store.load().unwrap().is_empty());
    store.commit(fixtures::DEPLOY_HOOK).unwrap();

    let hooks = store.load().unwrap();
    assert_eq!(hooks.ids().collect::<Vec<_>>(), vec!["deploy"]);
    assert_eq!(store.read_raw().unwrap(), fixtures::DEPLOY_HOOK);
}

#[test]
fn test_commit_keeps_document_order() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    store.commit(fixtures::DEPLOY_HOOK).unwrap();

    store.commit(fixtures::TWO_NEW_HOOKS).unwrap();

    let hooks = store.load().unwrap();
    assert_eq!(
        hooks.ids().collect::<Vec<_>>(),
        vec!["deploy", "build", "notify"]
    );

    let build = hooks.find("build").unwrap();
    let Some(TriggerRule::And(rules)) = &build.trigger_rule else {
        panic!("Expected and rule on build hook");
    };
    let types: Vec<_> = rules
        .iter()
        .map(|rule| match rule {
            TriggerRule::Match(m) => m.match_type.clone(),
            _ => None,
        })
        .collect();
    assert_eq!(types, vec![Some(MatchType::Value), Some(MatchType::Regex)]);
}

#[test]
fn test_interrupted_commit_leaves_previous_document() {
    for interrupt_at in [
        CommitStage::Received,
        CommitStage::Validated,
        CommitStage::TempWritten,
        CommitStage::Synced,
    ] {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.commit(fixtures::DEPLOY_HOOK).unwrap();

        let mut observer = |stage: CommitStage| {
            if stage == interrupt_at {
                Err(io::Error::new(io::ErrorKind::Other, "simulated crash"))
            } else {
                Ok(())
            }
        };
        let err = store
            .commit_observed(fixtures::TWO_NEW_HOOKS, &mut observer)
            .unwrap_err();

        match err {
            AppError::Commit { stage, .. } => assert_eq!(stage, interrupt_at),
            other => panic!("Expected commit error at {}, got {:?}", interrupt_at, other),
        }
        assert_eq!(store.read_raw().unwrap(), fixtures::DEPLOY_HOOK);
        assert_eq!(dir_entries(&dir), vec!["hooks.yaml".to_string()]);
    }
}

#[test]
fn test_rejected_input_never_reaches_disk() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);

    assert!(matches!(store.commit("").unwrap_err(), AppError::EmptyInput));
    assert!(matches!(
        store.commit("- id: [oops\n").unwrap_err(),
        AppError::Validation { .. }
    ));
    assert!(dir_entries(&dir).is_empty());
}

#[test]
fn test_reader_never_sees_partial_document() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);

    let small = "- id: small\n".to_string();
    let large: String = (0..500)
        .map(|i| format!("- id: hook-{i}\n  execute-command: /srv/run-{i}.sh\n"))
        .collect();
    store.commit(&small).unwrap();

    let done = Arc::new(AtomicBool::new(false));
    let reader = {
        let path = store.path().to_path_buf();
        let done = Arc::clone(&done);
        let (small, large) = (small.clone(), large.clone());
        thread::spawn(move || {
            let mut reads = 0usize;
            loop {
                let seen = fs::read_to_string(&path).unwrap();
                assert!(seen == small || seen == large, "torn read of {} bytes", seen.len());
                reads += 1;
                if done.load(Ordering::Relaxed) {
                    return reads;
                }
            }
        })
    };

    for round in 0..50 {
        let next = if round % 2 == 0 { &large } else { &small };
        store.commit(next).unwrap();
    }
    done.store(true, Ordering::Relaxed);

    assert!(reader.join().unwrap() > 0);
    assert_eq!(store.load().unwrap().len(), 1);
}

#[test]
fn test_canonical_form_round_trips_through_store() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    store.commit(fixtures::TWO_NEW_HOOKS).unwrap();

    let loaded = store.load().unwrap();
    store.commit(&hooks::serialize(&loaded).unwrap()).unwrap();

    assert_eq!(store.load().unwrap(), loaded);
}

#[test]
fn test_multi_document_file_loads_first_document() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    let raw = "- id: a\n---\n- id: b\n";

    store.validate(raw).unwrap();
    store.commit(raw).unwrap();

    assert_eq!(store.read_raw().unwrap(), raw);
    assert_eq!(store.load().unwrap().ids().collect::<Vec<_>>(), vec!["a"]);
}
