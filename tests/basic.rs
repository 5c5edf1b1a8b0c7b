//! Volume format, path resolution, and create/remove behavior.

mod common;

use std::sync::Arc;

use common::{RamDisk, init_logging};
use quark::{DIR_ENTRY_SIZE, FileSystem, FsError, MAX_FILES, ROOT_INODE_ID, resolve};

fn fresh_fs() -> FileSystem<RamDisk> {
    init_logging();
    FileSystem::format(Arc::new(RamDisk::new())).unwrap()
}

fn inode_of(fs: &FileSystem<RamDisk>, path: &str) -> u32 {
    let device = fs.device();
    resolve(&*device, path).unwrap().child.unwrap()
}

#[test]
fn root_resolves_to_itself() {
    let fs = fresh_fs();
    let device = fs.device();
    let resolved = resolve(&*device, "/").unwrap();
    assert_eq!(resolved.parent, ROOT_INODE_ID);
    assert_eq!(resolved.child, Some(ROOT_INODE_ID));
}

#[test]
fn missing_final_component_is_an_absent_child() {
    let fs = fresh_fs();
    let device = fs.device();
    let resolved = resolve(&*device, "/ghost").unwrap();
    assert_eq!(resolved.parent, ROOT_INODE_ID);
    assert_eq!(resolved.child, None);
    assert_eq!(resolved.name, "ghost");
}

#[test]
fn missing_intermediate_component_is_invalid() {
    let fs = fresh_fs();
    let device = fs.device();
    assert_eq!(resolve(&*device, "/ghost/file"), Err(FsError::InvalidPath));
    assert_eq!(resolve(&*device, "relative"), Err(FsError::InvalidPath));
    assert_eq!(resolve(&*device, "/bad name"), Err(FsError::InvalidPath));
}

#[test]
fn file_component_in_the_middle_is_invalid() {
    let mut fs = fresh_fs();
    fs.create_file("/plain").unwrap();
    let device = fs.device();
    assert_eq!(resolve(&*device, "/plain/below"), Err(FsError::InvalidPath));
}

#[test]
fn repeated_separators_collapse() {
    let mut fs = fresh_fs();
    fs.create_dir("/d").unwrap();
    fs.create_file("/d/f").unwrap();
    let device = fs.device();
    let a = resolve(&*device, "/d/f").unwrap();
    let b = resolve(&*device, "//d///f").unwrap();
    assert_eq!(a, b);
}

#[test]
fn create_then_lookup() {
    let mut fs = fresh_fs();
    fs.create_file("/notes.txt").unwrap();
    fs.create_dir("/docs").unwrap();
    fs.create_file("/docs/inner").unwrap();

    let device = fs.device();
    assert!(resolve(&*device, "/notes.txt").unwrap().child.is_some());
    assert!(resolve(&*device, "/docs/inner").unwrap().child.is_some());
}

#[test]
fn create_existing_fails() {
    let mut fs = fresh_fs();
    fs.create_file("/a").unwrap();
    assert_eq!(fs.create_file("/a"), Err(FsError::AlreadyExists));
    assert_eq!(fs.create_dir("/a"), Err(FsError::AlreadyExists));
    assert_eq!(fs.create_dir("/"), Err(FsError::AlreadyExists));
}

#[test]
fn create_under_missing_parent_fails() {
    let mut fs = fresh_fs();
    assert_eq!(fs.create_file("/nodir/x"), Err(FsError::InvalidPath));
}

#[test]
fn unlink_then_recreate_reuses_the_inode() {
    let mut fs = fresh_fs();
    fs.create_file("/a").unwrap();
    let first = inode_of(&fs, "/a");
    fs.unlink("/a").unwrap();
    fs.create_file("/a").unwrap();
    assert_eq!(inode_of(&fs, "/a"), first);
}

#[test]
fn unlink_missing_file() {
    let mut fs = fresh_fs();
    assert_eq!(fs.unlink("/ghost"), Err(FsError::NoSuchFile));
    assert_eq!(fs.unlink("/bad name"), Err(FsError::NoSuchFile));
}

#[test]
fn unlink_a_directory_is_a_type_mismatch() {
    let mut fs = fresh_fs();
    fs.create_dir("/d").unwrap();
    assert_eq!(fs.unlink("/d"), Err(FsError::TypeMismatch));
    assert_eq!(fs.remove_dir("/d"), Ok(()));
}

#[test]
fn remove_dir_errors() {
    let mut fs = fresh_fs();
    assert_eq!(fs.remove_dir("/"), Err(FsError::RootDirectoryProtected));
    assert_eq!(fs.remove_dir("/ghost"), Err(FsError::NoSuchDirectory));

    fs.create_file("/f").unwrap();
    assert_eq!(fs.remove_dir("/f"), Err(FsError::TypeMismatch));

    fs.create_dir("/d").unwrap();
    fs.create_file("/d/f").unwrap();
    assert_eq!(fs.remove_dir("/d"), Err(FsError::DirectoryNotEmpty));
}

#[test]
fn all_tombstone_directory_stays_non_empty() {
    // slot counts never shrink, so a directory that lost every entry is
    // still reported non-empty (known limitation of the format)
    let mut fs = fresh_fs();
    fs.create_dir("/d").unwrap();
    fs.create_file("/d/f").unwrap();
    fs.unlink("/d/f").unwrap();
    assert_eq!(fs.remove_dir("/d"), Err(FsError::DirectoryNotEmpty));
    assert_eq!(fs.dir_size("/d").unwrap(), DIR_ENTRY_SIZE);
}

#[test]
fn inode_table_exhaustion() {
    let mut fs = fresh_fs();
    // inode 0 is the root, leaving MAX_FILES - 1 allocatable
    for i in 0..MAX_FILES - 1 {
        fs.create_file(&format!("/f{i}")).unwrap();
    }
    assert_eq!(fs.create_file("/one-too-many"), Err(FsError::InodeTableFull));
}

#[test]
fn dir_size_counts_tombstones() {
    let mut fs = fresh_fs();
    fs.create_dir("/d").unwrap();
    fs.create_file("/d/a").unwrap();
    fs.create_file("/d/b").unwrap();
    assert_eq!(fs.dir_size("/d").unwrap(), 2 * DIR_ENTRY_SIZE);

    fs.unlink("/d/a").unwrap();
    // the slot lingers as a tombstone
    assert_eq!(fs.dir_size("/d").unwrap(), 2 * DIR_ENTRY_SIZE);

    fs.create_file("/d/c").unwrap();
    assert_eq!(fs.dir_size("/d").unwrap(), 3 * DIR_ENTRY_SIZE);
}

#[test]
fn read_dir_returns_slots_verbatim() {
    let mut fs = fresh_fs();
    fs.create_dir("/d").unwrap();
    fs.create_file("/d/a").unwrap();
    fs.create_file("/d/b").unwrap();
    fs.unlink("/d/a").unwrap();

    let size = fs.dir_size("/d").unwrap();
    let entries = fs.read_dir("/d", size).unwrap();
    assert_eq!(entries.len(), 2);
    assert!(entries[0].is_tombstone());
    assert_eq!(entries[1].name(), b"b");
}

#[test]
fn read_dir_buffer_too_small() {
    let mut fs = fresh_fs();
    fs.create_dir("/d").unwrap();
    fs.create_file("/d/a").unwrap();
    let size = fs.dir_size("/d").unwrap();
    assert_eq!(fs.read_dir("/d", size - 1), Err(FsError::BufferTooSmall));
    assert!(fs.read_dir("/d", size).is_ok());
}

#[test]
fn read_dir_on_a_file_is_no_such_directory() {
    let mut fs = fresh_fs();
    fs.create_file("/f").unwrap();
    assert_eq!(fs.dir_size("/f"), Err(FsError::NoSuchDirectory));
    assert_eq!(fs.read_dir("/f", 4096), Err(FsError::NoSuchDirectory));
    assert_eq!(fs.dir_size("/ghost"), Err(FsError::NoSuchDirectory));
}

#[test]
fn directory_entries_spill_across_sectors() {
    let mut fs = fresh_fs();
    fs.create_dir("/d").unwrap();
    // more entries than one sector's worth of dirent slots
    let per_sector = quark::SECTOR_SIZE / DIR_ENTRY_SIZE;
    for i in 0..per_sector + 3 {
        fs.create_file(&format!("/d/f{i}")).unwrap();
    }
    assert_eq!(fs.dir_size("/d").unwrap(), (per_sector + 3) * DIR_ENTRY_SIZE);
    let entries = fs.read_dir("/d", fs.dir_size("/d").unwrap()).unwrap();
    assert_eq!(entries.len(), per_sector + 3);
    // the entry past the sector boundary is intact
    assert_eq!(entries[per_sector].name(), format!("f{per_sector}").as_bytes());
}

#[test]
fn scenario_end_to_end() {
    let mut fs = fresh_fs();
    fs.create_file("/a").unwrap();
    fs.create_dir("/d").unwrap();
    fs.create_file("/d/b").unwrap();
    assert_eq!(fs.dir_size("/d").unwrap(), DIR_ENTRY_SIZE);

    let freed = inode_of(&fs, "/a");
    fs.unlink("/a").unwrap();
    fs.create_file("/a").unwrap();
    assert_eq!(inode_of(&fs, "/a"), freed);
}

#[test]
fn root_is_empty_after_format() {
    let fs = fresh_fs();
    assert_eq!(fs.dir_size("/").unwrap(), 0);
    assert_eq!(fs.read_dir("/", 0).unwrap().len(), 0);
}
