use migrun::{FileStore, Migration, Migrator, PersistentStore};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::tempdir;

fn counting(name: &'static str, runs: &Arc<AtomicUsize>) -> Migration {
    let up_runs = runs.clone();
    Migration::reversible(
        name,
        move || {
            let runs = up_runs.clone();
            async move {
                runs.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        },
        || async { Ok(()) },
    )
}

#[tokio::test]
async fn progress_survives_a_new_migrator_instance() {
    let dir = tempdir().unwrap();
    let state_path = dir.path().join(".migration");
    let runs = Arc::new(AtomicUsize::new(0));
    let crash = Arc::new(AtomicBool::new(true));

    let build = |crash: Arc<AtomicBool>| {
        vec![
            counting("0-create-users", &runs),
            counting("1-insert-users", &runs),
            Migration::new("2-trim-user-names", move || {
                let crash = crash.clone();
                async move {
                    if crash.load(Ordering::SeqCst) {
                        return Err(anyhow::anyhow!("process killed"));
                    }
                    Ok(())
                }
            }),
            counting("3-capitalize-user-names", &runs),
        ]
    };

    {
        let migrator = Migrator::open(&state_path, build(crash.clone())).unwrap();
        migrator.up(None).await.unwrap_err();
    }
    assert_eq!(
        std::fs::read_to_string(&state_path).unwrap(),
        "1-insert-users"
    );
    assert_eq!(runs.load(Ordering::SeqCst), 2);

    crash.store(false, Ordering::SeqCst);
    let migrator = Migrator::open(&state_path, build(crash.clone())).unwrap();
    let report = migrator.up(None).await.unwrap();
    assert_eq!(
        report.executed,
        vec!["2-trim-user-names", "3-capitalize-user-names"]
    );
    assert_eq!(runs.load(Ordering::SeqCst), 3);
    assert_eq!(
        std::fs::read_to_string(&state_path).unwrap(),
        "3-capitalize-user-names"
    );
}

#[tokio::test]
async fn reverting_everything_removes_the_state_file() {
    let dir = tempdir().unwrap();
    let store = FileStore::new(dir.path().join("state"));
    let runs = Arc::new(AtomicUsize::new(0));
    let migrator = Migrator::new(
        store.clone(),
        vec![counting("a", &runs), counting("b", &runs)],
    )
    .unwrap();

    migrator.up(None).await.unwrap();
    assert_eq!(store.load().await.unwrap().as_deref(), Some("b"));

    migrator.down(None).await.unwrap();
    assert_eq!(store.load().await.unwrap(), None);
    assert!(!store.path().exists());
}
