use savepolicy::constraints::SaveLayoutConstraints;
use savepolicy::layout::{CandidateSaveLayout, MemberEntry};
use savepolicy::validator::{validate, ViolationCode, Warning};
use savepolicy::size::{blocks_to_bytes, BLOCK_SIZE};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn mandatory_only(declared_size: u64) -> CandidateSaveLayout {
    CandidateSaveLayout::new(declared_size)
        .with_member(MemberEntry::new("param.sfo", 0x9000))
        .with_member(MemberEntry::new("keystone", 0x60))
}

fn icon_png(width: u32, height: u32, total_len: usize) -> Vec<u8> {
    let mut png = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
    png.extend_from_slice(&13u32.to_be_bytes());
    png.extend_from_slice(b"IHDR");
    png.extend_from_slice(&width.to_be_bytes());
    png.extend_from_slice(&height.to_be_bytes());
    png.resize(total_len, 0);
    png
}

fn write_file(root: &Path, rel: &str, data: &[u8]) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, data).unwrap();
}

#[test]
fn test_mandatory_members_only_pass_cleanly() {
    let c = SaveLayoutConstraints::default();
    let result = validate(&mandatory_only(c.min_save_bytes()), &c);
    assert!(result.passed(), "{:?}", result.violations);
    assert!(result.warnings.is_empty());
}

#[test]
fn test_missing_keystone_is_named() {
    let c = SaveLayoutConstraints::default();
    let layout = CandidateSaveLayout::new(c.min_save_bytes())
        .with_member(MemberEntry::new("param.sfo", 0x9000));
    let result = validate(&layout, &c);
    assert!(!result.passed());
    assert_eq!(result.subjects(ViolationCode::MissingMandatoryMember), vec!["keystone"]);
}

#[test]
fn test_missing_optional_member_still_passes() {
    let c = SaveLayoutConstraints::default();
    // No icon0.png, no backups: all optional.
    let result = validate(&mandatory_only(c.min_save_bytes()), &c);
    assert!(result.passed());
    assert!(c.is_known("icon0.png") && !c.is_mandatory("icon0.png"));
}

#[test]
fn test_unexpected_member_is_only_a_warning() {
    let c = SaveLayoutConstraints::default();
    let layout = mandatory_only(c.min_save_bytes())
        .with_member(MemberEntry::new("eboot.bin", 0x100));
    let result = validate(&layout, &c);
    assert!(result.passed());
    assert_eq!(result.warnings, vec![Warning::UnexpectedMember("eboot.bin".into())]);
}

#[test]
fn test_size_bounds_are_inclusive() {
    let c = SaveLayoutConstraints::default();
    let at = |blocks: u64| validate(&mandatory_only(blocks * BLOCK_SIZE), &c);

    assert!(at(c.min_blocks()).passed());
    assert!(at(c.max_blocks()).passed());
    assert!(at((c.min_blocks() + c.max_blocks()) / 2).passed());

    let below = at(c.min_blocks() - 1);
    assert_eq!(below.subjects(ViolationCode::SizeOutOfRange), vec!["savegame"]);
    let above = at(c.max_blocks() + 1);
    assert_eq!(above.subjects(ViolationCode::SizeOutOfRange), vec!["savegame"]);
}

#[test]
fn test_partial_block_rounds_up() {
    let c = SaveLayoutConstraints::default();
    // One byte past the maximum needs one more block.
    let layout = mandatory_only(c.max_save_bytes() + 1);
    assert!(validate(&layout, &c).has(ViolationCode::SizeOutOfRange));
}

#[test]
fn test_max_blocks_in_bytes() {
    assert_eq!(blocks_to_bytes(32768).unwrap(), 32768u64 * (1u64 << 15));
}

#[test]
fn test_layout_from_directory() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write_file(root, "sce_sys/param.sfo", &[0u8; 0x600]);
    write_file(root, "sce_sys/keystone", &[0u8; 0x60]);
    write_file(root, "sce_sys/icon0.png", &icon_png(228, 128, 0x400));
    write_file(root, "data0000", &[1u8; 64]);
    write_file(root, "slots/slot1.dat", &[2u8; 32]);

    let layout = CandidateSaveLayout::from_dir(root).unwrap();
    let names: Vec<&str> = layout.members.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, vec!["icon0.png", "keystone", "param.sfo"]);
    assert_eq!(layout.member("icon0.png").unwrap().pixel_format.unwrap().width, 228);
    assert_eq!(layout.user_files, vec!["data0000".to_string(), "slots/slot1.dat".to_string()]);
    assert_eq!(layout.declared_size, 0x600 + 0x60 + 0x400 + 64 + 32);

    // Real saves are padded to at least the minimum; this one is tiny.
    let result = validate(&layout, &SaveLayoutConstraints::default());
    assert_eq!(result.subjects(ViolationCode::SizeOutOfRange), vec!["savegame"]);
    assert!(!result.has(ViolationCode::FormatMismatch));
}

#[test]
fn test_wrong_icon_format_from_directory() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "sce_sys/param.sfo", b"sfo");
    write_file(dir.path(), "sce_sys/keystone", &[0u8; 0x60]);
    write_file(dir.path(), "sce_sys/icon0.png", &icon_png(512, 512, 64));

    let layout = CandidateSaveLayout::from_dir(dir.path()).unwrap();
    let result = validate(&layout, &SaveLayoutConstraints::default());
    assert_eq!(result.subjects(ViolationCode::FormatMismatch), vec!["icon0.png"]);
}

#[test]
fn test_missing_directory_is_an_error() {
    let dir = TempDir::new().unwrap();
    assert!(CandidateSaveLayout::from_dir(dir.path().join("nope")).is_err());
}
