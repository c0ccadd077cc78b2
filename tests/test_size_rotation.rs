//! Size-triggered rotation, cross-process semantics stood in for by
//! multi-thread fan-out against a single shared writer (real separate
//! process binaries aren't practical inside a single `#[test]`).

use std::sync::Arc;
use std::thread;

use concurrent_log_writer::ConcurrentFileWriterBuilder;
use temp_dir::TempDir;

#[test]
fn rotates_when_next_write_would_cross_max_bytes() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("app.log");
    let writer = ConcurrentFileWriterBuilder::new(&path)
        .max_bytes(100)
        .backup_count(2)
        .try_build()
        .unwrap();

    for i in 0..60 {
        writer.write_record(format!("{i:02}").as_bytes()).unwrap();
    }

    assert!(path.exists());
    assert!(dir.path().join("app.log.1").exists());
}

#[test]
fn backup_count_bounds_historical_files_on_disk() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("app.log");
    let writer = ConcurrentFileWriterBuilder::new(&path)
        .max_bytes(20)
        .backup_count(2)
        .try_build()
        .unwrap();

    for i in 0..200 {
        writer.write_record(format!("line-{i}").as_bytes()).unwrap();
    }

    assert!(dir.path().join("app.log.1").exists());
    assert!(dir.path().join("app.log.2").exists());
    assert!(!dir.path().join("app.log.3").exists());
}

#[test]
fn concurrent_threads_never_interleave_or_lose_records() {
    const THREADS: usize = 5;
    const LINES_PER_THREAD: usize = 2_000;

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("app.log");
    let writer = Arc::new(
        ConcurrentFileWriterBuilder::new(&path)
            .max_bytes(50_000)
            .backup_count(100)
            .try_build()
            .unwrap(),
    );

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let writer = Arc::clone(&writer);
            thread::spawn(move || {
                for i in 0..LINES_PER_THREAD {
                    writer.write_record(format!("t{t}-{i:06}").as_bytes()).unwrap();
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    let mut total_lines = 0usize;
    for entry in std::fs::read_dir(dir.path()).unwrap() {
        let path = entry.unwrap().path();
        let is_log_file = path.file_name().and_then(|n| n.to_str()).is_some_and(|n| n.starts_with("app.log"));
        if !is_log_file {
            continue;
        }
        let contents = std::fs::read_to_string(&path).unwrap();
        for line in contents.lines() {
            assert!(line.starts_with('t'), "found a malformed/interleaved line: {line:?}");
        }
        total_lines += contents.lines().count();
    }
    assert_eq!(total_lines, THREADS * LINES_PER_THREAD);
}

#[test]
fn second_writer_instance_observing_same_file_does_not_double_rotate() {
    // Two independently constructed writer instances against the same path
    // model two processes, each with its own sentinel and in-memory rotator
    // state. Only one of them should win the race to rotate a file already
    // past `max_bytes`; the other must re-stat under its own lock and see
    // rotation is no longer due.
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("app.log");
    std::fs::write(&path, vec![b'x'; 90]).unwrap();

    let writer_a = ConcurrentFileWriterBuilder::new(&path)
        .max_bytes(100)
        .backup_count(5)
        .try_build()
        .unwrap();
    let writer_b = ConcurrentFileWriterBuilder::new(&path)
        .max_bytes(100)
        .backup_count(5)
        .try_build()
        .unwrap();

    writer_a.write_record(b"a-0").unwrap();
    assert!(dir.path().join("app.log.1").exists());

    // writer_b's rotator still thinks the file is near-empty (its own
    // running baseline), but size-rotation re-stats the file directly
    // rather than trusting an in-memory running total, so it observes the
    // post-rotation file writer_a already produced and must not rotate it
    // a second time just because writer_a's rotation happened concurrently.
    writer_b.write_record(b"b-0").unwrap();
    assert!(!dir.path().join("app.log.2").exists());
}
