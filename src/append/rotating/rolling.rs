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
use std::fs::File;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;

use crate::Error;

/// The state behind a [`RotatingFile`](super::RotatingFile) appender.
///
/// `written` always reflects the bytes written to the currently open file; it
/// is initialized from the on-disk length when the file is opened in append
/// mode, and reset to zero after a rotation.
#[derive(Debug)]
pub(crate) struct RotatingFileWriter {
    path: PathBuf,
    max_bytes: usize,
    backup_count: usize,
    file: Option<File>,
    written: usize,
    closed: bool,
}

impl RotatingFileWriter {
    pub(crate) fn new(
        path: PathBuf,
        max_bytes: usize,
        backup_count: usize,
    ) -> Result<Self, Error> {
        let mut writer = Self {
            path,
            max_bytes,
            backup_count,
            file: None,
            written: 0,
            closed: false,
        };
        writer.open()?;
        Ok(writer)
    }

    /// Write one formatted line, rotating first if the line would push the
    /// active file to `max_bytes` or beyond.
    ///
    /// `line` must include its terminator; the full length counts toward the
    /// rotation threshold, so `written` always equals the on-disk size.
    pub(crate) fn write_line(&mut self, line: &[u8]) -> Result<(), Error> {
        if self.closed {
            return Err(Error::new("rotating file appender already closed")
                .with_context("path", self.path.display()));
        }

        // A failed rotation leaves no open handle; recover by reopening.
        if self.file.is_none() {
            self.open()?;
        }

        if self.written + line.len() >= self.max_bytes {
            self.rotate()?;
        }

        let file = self
            .file
            .as_mut()
            .ok_or_else(|| Error::new("rotating file appender has no open file"))?;
        file.write_all(line).map_err(Error::from_io_error)?;
        file.flush().map_err(Error::from_io_error)?;
        self.written += line.len();
        Ok(())
    }

    pub(crate) fn flush(&mut self) -> Result<(), Error> {
        match self.file.as_mut() {
            Some(file) => file.flush().map_err(Error::from_io_error),
            None => Ok(()),
        }
    }

    /// Flush and release the file handle. Idempotent.
    pub(crate) fn close(&mut self) -> Result<(), Error> {
        self.closed = true;
        match self.file.take() {
            Some(mut file) => file.flush().map_err(Error::from_io_error),
            None => Ok(()),
        }
    }

    fn open(&mut self) -> Result<(), Error> {
        let file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.path)
            .map_err(|err| {
                Error::new("failed to open log file")
                    .with_context("path", self.path.display())
                    .with_source(err)
            })?;
        self.written = file
            .metadata()
            .map_err(Error::from_io_error)?
            .len() as usize;
        self.file = Some(file);
        Ok(())
    }

    /// Archive the active file and start a fresh one.
    ///
    /// Renames are best-effort: a failure partway may leave backup numbering
    /// inconsistent, and the error is surfaced once without retry.
    fn rotate(&mut self) -> Result<(), Error> {
        // Close the current handle before renaming.
        self.file = None;

        for i in (1..self.backup_count).rev() {
            let src = backup_path(&self.path, i);
            if src.exists() {
                let dst = backup_path(&self.path, i + 1);
                fs::rename(&src, &dst).map_err(|err| {
                    Error::new("failed to renumber backup log file")
                        .with_context("from", src.display())
                        .with_context("to", dst.display())
                        .with_source(err)
                })?;
            }
        }

        let first = backup_path(&self.path, 1);
        fs::rename(&self.path, &first).map_err(|err| {
            Error::new("failed to archive active log file")
                .with_context("from", self.path.display())
                .with_context("to", first.display())
                .with_source(err)
        })?;

        self.open()
    }
}

fn backup_path(path: &Path, index: usize) -> PathBuf {
    let mut os = path.as_os_str().to_os_string();
    os.push(format!(".{index}"));
    PathBuf::from(os)
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn line(len: usize) -> Vec<u8> {
        let mut line = vec![b'x'; len - 1];
        line.push(b'\n');
        line
    }

    fn file_size(path: &Path) -> u64 {
        fs::metadata(path).map(|m| m.len()).unwrap_or(0)
    }

    #[test]
    fn test_rotation_archives_and_resets_counter() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.log");
        let mut writer = RotatingFileWriter::new(path.clone(), 100, 3).unwrap();

        writer.write_line(&line(40)).unwrap();
        writer.write_line(&line(40)).unwrap();
        assert_eq!(file_size(&path), 80);
        assert!(!backup_path(&path, 1).exists());

        // 80 + 40 >= 100: rotation is taken before the write.
        writer.write_line(&line(40)).unwrap();
        assert_eq!(file_size(&path), 40);
        assert_eq!(file_size(&backup_path(&path, 1)), 80);
    }

    #[test]
    fn test_backup_renumbering_caps_at_backup_count() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.log");
        let mut writer = RotatingFileWriter::new(path.clone(), 50, 3).unwrap();

        // Each 45-byte line fills the active file; the next one rotates it.
        for _ in 0..5 {
            writer.write_line(&line(45)).unwrap();
        }

        assert!(backup_path(&path, 1).exists());
        assert!(backup_path(&path, 2).exists());
        assert!(backup_path(&path, 3).exists());
        assert!(!backup_path(&path, 4).exists());
    }

    #[test]
    fn test_active_file_never_rests_above_max_bytes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.log");
        let mut writer = RotatingFileWriter::new(path.clone(), 100, 2).unwrap();

        for _ in 0..20 {
            writer.write_line(&line(30)).unwrap();
            assert!(file_size(&path) < 100);
        }
    }

    #[test]
    fn test_oversized_line_rotates_then_writes_in_full() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.log");
        let mut writer = RotatingFileWriter::new(path.clone(), 100, 3).unwrap();

        writer.write_line(&line(40)).unwrap();
        writer.write_line(&line(150)).unwrap();

        assert_eq!(file_size(&path), 150);
        assert_eq!(file_size(&backup_path(&path, 1)), 40);
    }

    #[test]
    fn test_append_mode_resumes_existing_size() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.log");

        {
            let mut writer = RotatingFileWriter::new(path.clone(), 100, 3).unwrap();
            writer.write_line(&line(60)).unwrap();
            writer.close().unwrap();
        }

        // Reopening must pick up the 60 bytes already on disk: 60 + 50 >= 100.
        let mut writer = RotatingFileWriter::new(path.clone(), 100, 3).unwrap();
        writer.write_line(&line(50)).unwrap();
        assert_eq!(file_size(&path), 50);
        assert_eq!(file_size(&backup_path(&path, 1)), 60);
    }

    #[test]
    fn test_close_is_idempotent_and_write_after_close_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.log");
        let mut writer = RotatingFileWriter::new(path, 100, 3).unwrap();

        writer.write_line(&line(10)).unwrap();
        writer.close().unwrap();
        writer.close().unwrap();

        let err = writer.write_line(&line(10)).unwrap_err();
        assert!(err.to_string().contains("already closed"));
    }
}
