use cvssync::config::SynchronizerConfig;
use cvssync::disk::{DiskStore, RealDiskStore};
use cvssync::{FolderSync, Resource};
use tempfile::tempdir;

fn store(root: &std::path::Path) -> RealDiskStore {
    RealDiskStore::new(root.to_path_buf(), SynchronizerConfig::default())
}

// Property 2: after a write, the Entries file parses back to the same
// multiset of sync bytes, file and folder entries alike.
#[test]
fn entries_file_round_trips_through_write_and_read() {
    let dir = tempdir().unwrap();
    let disk = store(dir.path());
    let folder = Resource::project("a");

    let entries = vec![
        b"f.txt/1.1//-kb/".to_vec(),
        b"sub////".to_vec(),
        b"g.txt/1.2/ts//Tbranch".to_vec(),
    ];
    disk.write_all_resource_sync(&folder, &entries, false).unwrap();

    let (read_back, is_static) = disk.read_all_resource_sync(&folder).unwrap().unwrap();
    assert!(!is_static);
    let mut expected = entries.clone();
    let mut actual = read_back.clone();
    expected.sort();
    actual.sort();
    assert_eq!(expected, actual);
}

#[test]
fn static_marker_round_trips() {
    let dir = tempdir().unwrap();
    let disk = store(dir.path());
    let folder = Resource::project("a");

    disk.write_all_resource_sync(&folder, &[b"f.txt/1.1///".to_vec()], true)
        .unwrap();
    let (_, is_static) = disk.read_all_resource_sync(&folder).unwrap().unwrap();
    assert!(is_static);
}

#[test]
fn folder_sync_round_trips_through_root_repository_and_tag_files() {
    let dir = tempdir().unwrap();
    let disk = store(dir.path());
    let folder = Resource::project("a");

    let info = FolderSync::new(":pserver:example.com:/cvsroot", "module/a").with_tag("release-1");
    disk.write_folder_sync(&folder, &info).unwrap();

    let read_back = disk.read_folder_sync(&folder).unwrap().unwrap();
    assert_eq!(read_back.repository, info.repository);
    assert_eq!(read_back.repository_relative_path, info.repository_relative_path);
    assert_eq!(read_back.tag, info.tag);
}

// Property 6: a linked folder is never written to or read from disk.
#[test]
fn linked_folder_is_never_written_to_disk() {
    let dir = tempdir().unwrap();
    let outside = tempdir().unwrap();
    let disk = store(dir.path());
    let folder = Resource::project("linked");
    disk.register_linked_folder(&folder, outside.path().to_path_buf());

    assert!(disk.is_linked(&folder));
    assert!(disk.read_all_resource_sync(&folder).unwrap().is_none());
    assert!(disk
        .write_all_resource_sync(&folder, &[b"f.txt/1.1///".to_vec()], false)
        .is_err());

    assert!(!dir.path().join("linked").exists());
}

#[test]
fn is_edited_tracks_base_copy_lifecycle() {
    let dir = tempdir().unwrap();
    let disk = store(dir.path());
    std::fs::create_dir_all(dir.path().join("a")).unwrap();
    std::fs::write(dir.path().join("a/f.txt"), b"working copy").unwrap();
    let file = Resource::file("a/f.txt");

    assert!(!disk.is_edited(&file));
    disk.copy_to_base(&file).unwrap();
    assert!(disk.is_edited(&file));

    std::fs::write(dir.path().join("a/f.txt"), b"changed").unwrap();
    disk.restore_from_base(&file).unwrap();
    assert_eq!(
        std::fs::read_to_string(dir.path().join("a/f.txt")).unwrap(),
        "working copy"
    );

    disk.delete_base(&file).unwrap();
    assert!(!disk.is_edited(&file));
}
