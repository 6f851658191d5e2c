//! Property-based tests for notebook versioning

use std::collections::HashMap;

use notecollab::backend::collab::{CasOutcome, InMemoryNotebookStore, NotebookStore};
use notecollab::shared::NotebookRecord;
use proptest::prelude::*;

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .expect("runtime builds")
}

proptest! {
    /// Writers submit versions lagging the current one by `lag`; only
    /// up-to-date writes land, each landing bumps the version by one, and no
    /// version is ever attached to two different contents.
    #[test]
    fn test_versions_are_monotonic_and_unique(
        start in 1i64..1_000,
        lags in prop::collection::vec(0i64..3, 1..40),
    ) {
        runtime().block_on(async {
            let store = InMemoryNotebookStore::new();
            let record = NotebookRecord::new("owner", "T").with_version(start);
            let id = record.id;
            store.insert_notebook(record).await.unwrap();

            let mut seen: HashMap<i64, String> = HashMap::new();
            seen.insert(start, String::new());
            let mut current = start;

            for (step, lag) in lags.into_iter().enumerate() {
                let content = format!("step {}", step);
                let outcome = store
                    .compare_and_set_version(id, current - lag, None, Some(content.clone()))
                    .await
                    .unwrap();

                match outcome {
                    CasOutcome::Applied(updated) => {
                        prop_assert_eq!(lag, 0);
                        prop_assert_eq!(updated.version, current + 1);
                        prop_assert!(seen.insert(updated.version, content).is_none());
                        current = updated.version;
                    }
                    CasOutcome::VersionConflict(server) => {
                        prop_assert!(lag > 0);
                        prop_assert_eq!(server.version, current);
                        prop_assert_eq!(seen.get(&server.version), Some(&server.content));
                    }
                }
            }
            Ok(())
        })?;
    }
}
