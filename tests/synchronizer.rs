use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use cvssync::{ChangeSet, FolderSync, ModificationState, Resource, SyncChangeListener, Synchronizer};
use tempfile::tempdir;

fn entries_path(root: &std::path::Path, project: &str) -> std::path::PathBuf {
    root.join(project).join("CVS").join("Entries")
}

// S1: fresh folder gets a folder-sync and one file sync; on batch close the
// control directory reflects both.
#[test]
fn fresh_folder_and_file_write_control_directory() {
    let dir = tempdir().unwrap();
    let sync = Synchronizer::new(dir.path());

    let project = Resource::project("a");
    sync.set_folder_sync(&project, FolderSync::new("repo", "a").with_tag("HEAD"))
        .unwrap();
    sync.set_sync_bytes(&Resource::file("a/f.txt"), b"f.txt/1.1//-kb/".to_vec())
        .unwrap();

    let cvs_dir = dir.path().join("a").join("CVS");
    assert_eq!(fs::read_to_string(cvs_dir.join("Root")).unwrap(), "repo\n");
    assert_eq!(fs::read_to_string(cvs_dir.join("Repository")).unwrap(), "a\n");
    assert_eq!(fs::read_to_string(cvs_dir.join("Tag")).unwrap(), "THEAD\n");
    assert_eq!(
        fs::read_to_string(entries_path(dir.path(), "a")).unwrap(),
        "/f.txt/1.1//-kb/\n"
    );
}

// S2: add_ignored rewrites .cvsignore and reports every previously
// unmanaged child as changed.
#[test]
fn add_ignored_rewrites_ignore_file_and_reports_unmanaged_children() {
    let dir = tempdir().unwrap();
    let sync = Synchronizer::new(dir.path());
    let project = Resource::project("a");
    fs::create_dir_all(dir.path().join("a")).unwrap();
    fs::write(dir.path().join("a/debug.log"), b"x").unwrap();
    sync.set_folder_sync(&project, FolderSync::new("repo", "a"))
        .unwrap();

    let seen = Arc::new(Mutex::new(Vec::new()));
    sync.add_listener(Arc::new(CollectingListener(seen.clone())));

    sync.add_ignored(&project, "*.log").unwrap();

    let ignore_contents = fs::read_to_string(dir.path().join("a/CVS/.cvsignore")).unwrap();
    assert_eq!(ignore_contents, "*.log\n");

    let changed = seen.lock().unwrap();
    assert!(changed
        .iter()
        .flat_map(|cs| cs.changed_resources.iter())
        .any(|r| r.path() == std::path::Path::new("a/debug.log")));
}

// S3: prepare_for_deletion on a managed, non-addition file that has
// already vanished from disk moves its sync into the phantom cache in
// deletion form, and the folder still reports it as a member.
#[test]
fn prepare_for_deletion_preserves_sync_in_phantom_cache() {
    let dir = tempdir().unwrap();
    let sync = Synchronizer::new(dir.path());
    let project = Resource::project("a");
    fs::create_dir_all(dir.path().join("a")).unwrap();
    fs::write(dir.path().join("a/f.txt"), b"hello").unwrap();

    sync.set_folder_sync(&project, FolderSync::new("repo", "a"))
        .unwrap();
    let file = Resource::file("a/f.txt");
    sync.set_sync_bytes(&file, b"f.txt/1.1//-kb/".to_vec()).unwrap();

    fs::remove_file(dir.path().join("a/f.txt")).unwrap();
    sync.prepare_for_deletion(&file).unwrap();

    let bytes = sync.get_sync_bytes(&file).unwrap().expect("phantom sync present");
    assert!(cvssync::codec::is_deletion(&bytes));

    let members = sync.members(&project).unwrap();
    assert!(members.iter().any(|m| m.path() == std::path::Path::new("a/f.txt")));
}

// S4: dirtying a file reports DIRTY up the chain; clearing it collapses
// the ancestor to UNKNOWN until something recomputes it.
#[test]
fn dirty_propagation_through_the_facade() {
    let dir = tempdir().unwrap();
    let sync = Synchronizer::new(dir.path());
    let file = Resource::file("a/f.txt");
    let project = Resource::project("a");

    sync.mark_dirty(&file);
    assert_eq!(sync.modification_state(&project), ModificationState::Dirty);

    sync.mark_not_dirty(&file);
    assert_eq!(sync.modification_state(&project), ModificationState::Unknown);
}

// S5: a disk write failure during flush is reported as a multi-status
// and purges that folder's session cache so the next read re-consults
// disk rather than silently trusting stale cached state.
#[cfg(unix)]
#[test]
fn flush_failure_is_reported_and_cache_is_purged() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempdir().unwrap();
    let sync = Synchronizer::new(dir.path());
    let project = Resource::project("a");
    sync.set_folder_sync(&project, FolderSync::new("repo", "a"))
        .unwrap();
    sync.set_sync_bytes(&Resource::file("a/f.txt"), b"f.txt/1.1//-kb/".to_vec())
        .unwrap();

    let cvs_dir = dir.path().join("a/CVS");
    let mut perms = fs::metadata(&cvs_dir).unwrap().permissions();
    perms.set_mode(0o555);
    fs::set_permissions(&cvs_dir, perms.clone()).unwrap();

    let result = sync.set_sync_bytes(&Resource::file("a/g.txt"), b"g.txt/1.1//-kb/".to_vec());

    perms.set_mode(0o755);
    fs::set_permissions(&cvs_dir, perms).unwrap();

    assert!(result.is_err(), "write under a read-only control dir must fail");

    // The folder's session cache was purged on failure; a fresh read
    // re-consults disk rather than returning the failed in-memory state.
    let reloaded = Synchronizer::new(dir.path());
    let members = reloaded.members(&project).unwrap();
    assert!(members.iter().any(|m| m.path() == std::path::Path::new("a/f.txt")));
}

// S6: two threads batching on disjoint projects never observe each
// other's changes in a single broadcast.
#[test]
fn disjoint_project_batches_broadcast_independently() {
    let dir = tempdir().unwrap();
    let sync = Arc::new(Synchronizer::new(dir.path()));
    let seen = Arc::new(Mutex::new(Vec::new()));
    sync.add_listener(Arc::new(CollectingListener(seen.clone())));

    std::thread::scope(|scope| {
        let sync_a = sync.clone();
        let sync_b = sync.clone();
        scope.spawn(move || {
            sync_a
                .set_folder_sync(&Resource::project("a"), FolderSync::new("repo", "a"))
                .unwrap();
            sync_a
                .set_sync_bytes(&Resource::file("a/f.txt"), b"f.txt/1.1//-kb/".to_vec())
                .unwrap();
        });
        scope.spawn(move || {
            sync_b
                .set_folder_sync(&Resource::project("b"), FolderSync::new("repo", "b"))
                .unwrap();
            sync_b
                .set_sync_bytes(&Resource::file("b/g.txt"), b"g.txt/1.1//-kb/".to_vec())
                .unwrap();
        });
    });

    let batches = seen.lock().unwrap();
    for batch in batches.iter() {
        let under_a = batch.changed_resources.iter().all(|r| r.path().starts_with("a"));
        let under_b = batch.changed_resources.iter().all(|r| r.path().starts_with("b"));
        assert!(
            under_a || under_b,
            "a single broadcast must not mix resources from disjoint projects: {batch:?}"
        );
    }
}

struct CollectingListener(Arc<Mutex<Vec<ChangeSet>>>);

impl SyncChangeListener for CollectingListener {
    fn sync_changed(&self, change_set: &ChangeSet) {
        self.0.lock().unwrap().push(change_set.clone());
    }
}
