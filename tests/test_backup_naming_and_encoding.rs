//! Custom `namer` override and the `UnicodeErrorPolicy` knobs.

use std::sync::Arc;

use concurrent_log_writer::{ConcurrentFileWriterBuilder, UnicodeErrorPolicy, WriterError};
use temp_dir::TempDir;

#[test]
fn custom_namer_is_applied_to_rotated_backups() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("app.log");
    let namer: concurrent_log_writer::Namer = Arc::new(|default_name: &std::path::Path| {
        let mut s = default_name.as_os_str().to_os_string();
        s.push(".bak");
        std::path::PathBuf::from(s)
    });

    let writer = ConcurrentFileWriterBuilder::new(&path)
        .max_bytes(10)
        .backup_count(1)
        .namer(namer)
        .try_build()
        .unwrap();

    for _ in 0..5 {
        writer.write_record(b"0123456789").unwrap();
    }

    assert!(dir.path().join("app.log.1.bak").exists());
    assert!(!dir.path().join("app.log.1").exists());
}

#[test]
fn ignore_policy_drops_unmappable_characters_silently() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("app.log");
    let writer = ConcurrentFileWriterBuilder::new(&path)
        .encoding(encoding_rs::WINDOWS_1252)
        .unicode_error_policy(UnicodeErrorPolicy::Ignore)
        .try_build()
        .unwrap();

    writer.write_str("emoji \u{1f600} not in latin-1").unwrap();
    let contents = std::fs::read_to_string(&path).unwrap();
    assert_eq!(contents, "emoji  not in latin-1\n");
}

#[test]
fn strict_policy_surfaces_an_encoding_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("app.log");
    let writer = ConcurrentFileWriterBuilder::new(&path)
        .encoding(encoding_rs::WINDOWS_1252)
        .unicode_error_policy(UnicodeErrorPolicy::Strict)
        .try_build()
        .unwrap();

    let err = writer.write_str("emoji \u{1f600} not in latin-1").unwrap_err();
    assert!(matches!(err, WriterError::Encoding));
}

#[test]
fn configuration_error_when_parent_directory_cannot_be_created() {
    // A path whose parent traverses through a regular file can never be
    // created; this must surface as a `Configuration` error at
    // construction time, not during emit.
    let dir = TempDir::new().unwrap();
    let blocking_file = dir.path().join("not_a_directory");
    std::fs::write(&blocking_file, b"x").unwrap();
    let path = blocking_file.join("nested").join("app.log");

    let err = ConcurrentFileWriterBuilder::new(&path).try_build().unwrap_err();
    assert!(matches!(err, WriterError::Configuration(_)));
}
