// Copyright 2024 FastLabs Developers
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::fs;
use std::path::Path;
use std::path::PathBuf;

use logstream::Append;
use logstream::Logger;
use logstream::Record;
use logstream::append::RotatingFile;
use logstream::layout::CustomLayout;
use tempfile::TempDir;

/// Renders just the payload, so line length is `payload.len() + 1`.
fn payload_layout() -> CustomLayout {
    CustomLayout::new(|record: &Record| Ok(record.payload().to_string().into_bytes()))
}

fn backup(path: &Path, index: usize) -> PathBuf {
    let mut os = path.as_os_str().to_os_string();
    os.push(format!(".{index}"));
    PathBuf::from(os)
}

fn file_size(path: &Path) -> u64 {
    fs::metadata(path).map(|m| m.len()).unwrap_or(0)
}

#[test]
fn test_first_rotation_creates_single_backup() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("app.log");
    let file = RotatingFile::builder(&path)
        .max_bytes(100)
        .backup_count(3)
        .layout(payload_layout())
        .build()
        .unwrap();

    // 40-byte lines: the third write crosses the 100-byte threshold.
    for _ in 0..3 {
        file.append(&Record::builder().payload("x".repeat(39)).build())
            .unwrap();
    }
    file.close().unwrap();

    assert_eq!(file_size(&path), 40);
    assert_eq!(file_size(&backup(&path, 1)), 80);
    assert!(!backup(&path, 2).exists());
}

#[test]
fn test_backup_retention_is_capped() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("app.log");
    let file = RotatingFile::builder(&path)
        .max_bytes(50)
        .backup_count(3)
        .layout(payload_layout())
        .build()
        .unwrap();

    // Every 45-byte line triggers a rotation; far more than three of them.
    for _ in 0..8 {
        file.append(&Record::builder().payload("y".repeat(44)).build())
            .unwrap();
    }
    file.close().unwrap();

    assert!(backup(&path, 1).exists());
    assert!(backup(&path, 2).exists());
    assert!(backup(&path, 3).exists());
    assert!(!backup(&path, 4).exists());
}

#[test]
fn test_active_file_stays_below_threshold_across_emits() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("app.log");
    let logger = Logger::new("rotating").append(
        RotatingFile::builder(&path)
            .max_bytes(100)
            .backup_count(2)
            .layout(payload_layout())
            .build()
            .unwrap(),
    );

    for i in 0..20 {
        logger.info(format!("{i:0>29}"));
        assert!(file_size(&path) < 100);
    }
    logger.close().unwrap();
}

#[test]
fn test_close_is_idempotent_and_append_after_close_errors() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("app.log");
    let file = RotatingFile::builder(&path)
        .layout(payload_layout())
        .build()
        .unwrap();

    file.append(&Record::builder().payload("hello").build())
        .unwrap();
    file.close().unwrap();
    file.close().unwrap();

    let err = file
        .append(&Record::builder().payload("late").build())
        .unwrap_err();
    assert!(err.to_string().contains("already closed"));
    assert_eq!(file_size(&path), 6);
}
