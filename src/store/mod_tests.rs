// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for the zone store

#[cfg(test)]
mod tests {
    use super::super::*;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn store(tmp: &TempDir) -> ZoneStore {
        ZoneStore::with_paths(
            &tmp.path().join("zones"),
            &tmp.path().join("zones.conf"),
            Duration::from_secs(5),
        )
    }

    #[test]
    fn test_zone_path() {
        let tmp = TempDir::new().unwrap();
        let store = store(&tmp);
        assert_eq!(
            store.zone_path("example.test").unwrap(),
            tmp.path().join("zones").join("example.test.zone")
        );
    }

    #[test]
    fn test_zone_path_rejects_traversal() {
        let tmp = TempDir::new().unwrap();
        let store = store(&tmp);
        for bad in ["", "../etc", "a/b", ".hidden", "a..b"] {
            assert!(
                matches!(store.zone_path(bad), Err(ZoneError::Validation { .. })),
                "{bad} accepted"
            );
        }
    }

    #[tokio::test]
    async fn test_commit_writes_and_registers() {
        let tmp = TempDir::new().unwrap();
        let store = store(&tmp);

        let receipt = store.commit("example.test", "zone text\n").await.unwrap();
        assert_eq!(receipt.zone, "example.test");
        assert_eq!(receipt.bytes, 10);
        assert_eq!(receipt.digest.len(), 64);
        assert!(receipt.newly_registered);
        assert_eq!(
            store.read_zone("example.test").await.unwrap().as_deref(),
            Some("zone text\n")
        );

        let entries = store.registry().entries().await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].zonefile, receipt.path);

        let again = store.commit("example.test", "zone text v2\n").await.unwrap();
        assert!(!again.newly_registered);
        assert_ne!(again.digest, receipt.digest);
    }

    #[tokio::test]
    async fn test_zone_list_failure_keeps_previous_file() {
        let tmp = TempDir::new().unwrap();
        let store = store(&tmp);
        store.commit("example.test", "serial 1\n").await.unwrap();

        // A directory in place of the zone list makes the registry unreadable
        std::fs::remove_file(tmp.path().join("zones.conf")).unwrap();
        std::fs::create_dir(tmp.path().join("zones.conf")).unwrap();

        let err = store.commit("example.test", "serial 2\n").await.unwrap_err();
        assert!(matches!(err, ZoneError::Io { .. }));
        assert!(!err.data_saved());
        assert_eq!(
            store.read_zone("example.test").await.unwrap().as_deref(),
            Some("serial 1\n")
        );
    }

    #[tokio::test]
    async fn test_failed_write_withdraws_new_registration() {
        let tmp = TempDir::new().unwrap();
        let store = store(&tmp);

        // A plain file where the zone directory should be
        std::fs::write(tmp.path().join("zones"), "not a directory").unwrap();

        let err = store.commit("example.test", "zone text\n").await.unwrap_err();
        assert!(matches!(err, ZoneError::Io { .. }));
        assert!(store.registry().entries().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        let store = store(&tmp);
        store.commit("example.test", "x").await.unwrap();

        assert!(store.delete("example.test").await.unwrap());
        assert!(store.read_zone("example.test").await.unwrap().is_none());
        assert!(store.registry().entries().await.unwrap().is_empty());

        assert!(!store.delete("example.test").await.unwrap());
        assert!(!store.delete("never.test").await.unwrap());
    }

    #[tokio::test]
    async fn test_list_zone_files() {
        let tmp = TempDir::new().unwrap();
        let store = store(&tmp);
        assert!(store.list_zone_files().await.unwrap().is_empty());

        store.commit("b.test", "bbbb").await.unwrap();
        store.commit("a.test", "aa").await.unwrap();
        std::fs::write(tmp.path().join("zones").join("notes.txt"), "ignored").unwrap();

        let files = store.list_zone_files().await.unwrap();
        let names: Vec<&str> = files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["a.test", "b.test"]);
        assert_eq!(files[0].size, 2);
        assert_eq!(files[1].size, 4);
        assert!(files[0].modified.is_some());
    }

    #[tokio::test]
    async fn test_commit_held_lease_blocks_other_writers() {
        let tmp = TempDir::new().unwrap();
        let store = ZoneStore::with_paths(
            &tmp.path().join("zones"),
            &tmp.path().join("zones.conf"),
            Duration::from_millis(50),
        );

        let lease = store.lock("example.test").await.unwrap();
        let err = store.commit("example.test", "x").await.unwrap_err();
        assert_eq!(err.status_reason(), "LockTimeout");

        store.commit_locked(&lease, "held").await.unwrap();
        drop(lease);
        store.commit("example.test", "after").await.unwrap();
        assert_eq!(
            store.read_zone("example.test").await.unwrap().as_deref(),
            Some("after")
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_commits_never_tear() {
        let tmp = TempDir::new().unwrap();
        let store = Arc::new(store(&tmp));
        let big_a = "a".repeat(64 * 1024);
        let big_b = "b".repeat(64 * 1024);

        let mut tasks = Vec::new();
        for i in 0..20 {
            let store = Arc::clone(&store);
            let text = if i % 2 == 0 { big_a.clone() } else { big_b.clone() };
            tasks.push(tokio::spawn(async move {
                store.commit("example.test", &text).await.unwrap();
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        let text = store.read_zone("example.test").await.unwrap().unwrap();
        assert!(text == big_a || text == big_b);
        let leftovers = std::fs::read_dir(tmp.path().join("zones"))
            .unwrap()
            .filter_map(Result::ok)
            .count();
        assert_eq!(leftovers, 1);
    }

    #[test]
    fn test_zone_digest_is_stable() {
        assert_eq!(zone_digest("abc"), zone_digest("abc"));
        assert_eq!(
            zone_digest(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
