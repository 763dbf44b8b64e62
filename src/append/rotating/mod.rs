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

//! Appender for writing log records to a size-rotated file.

use std::path::Path;
use std::path::PathBuf;
use std::sync::Mutex;

use crate::Error;
use crate::Layout;
use crate::append::Append;
use crate::layout::TextLayout;
use crate::record::Record;

mod rolling;

use self::rolling::RotatingFileWriter;

/// An appender that writes log records to a file, rotating it by size.
///
/// When the next write would push the active file to `max_bytes` or beyond,
/// the file is archived: `path.i` is renamed to `path.(i+1)` for every
/// existing backup from `backup_count - 1` down to `1`, the active file
/// becomes `path.1`, and a fresh file is opened at `path`. The oldest backup
/// is silently dropped once its index would exceed `backup_count`.
///
/// # Examples
///
/// ```no_run
/// use logstream::append::RotatingFile;
///
/// let file = RotatingFile::builder("app.log")
///     .max_bytes(1024 * 1024)
///     .backup_count(3)
///     .build()
///     .unwrap();
/// ```
#[derive(Debug)]
pub struct RotatingFile {
    layout: Box<dyn Layout>,
    writer: Mutex<RotatingFileWriter>,
}

impl RotatingFile {
    /// Create a new [`RotatingFileBuilder`] for the given path.
    pub fn builder(path: impl AsRef<Path>) -> RotatingFileBuilder {
        RotatingFileBuilder::new(path)
    }

    fn with_writer<T>(
        &self,
        f: impl FnOnce(&mut RotatingFileWriter) -> Result<T, Error>,
    ) -> Result<T, Error> {
        let mut writer = self
            .writer
            .lock()
            .map_err(|_| Error::new("rotating file writer mutex poisoned"))?;
        f(&mut writer)
    }
}

impl Append for RotatingFile {
    fn append(&self, record: &Record) -> Result<(), Error> {
        let mut bytes = self.layout.format(record)?;
        bytes.push(b'\n');
        self.with_writer(|writer| writer.write_line(&bytes))
    }

    fn flush(&self) -> Result<(), Error> {
        self.with_writer(|writer| writer.flush())
    }

    fn close(&self) -> Result<(), Error> {
        self.with_writer(|writer| writer.close())
    }
}

/// A builder for configuring [`RotatingFile`].
#[derive(Debug)]
pub struct RotatingFileBuilder {
    path: PathBuf,
    max_bytes: usize,
    backup_count: usize,
    layout: Box<dyn Layout>,
}

impl RotatingFileBuilder {
    fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            max_bytes: 1_000_000,
            backup_count: 3,
            layout: Box::new(TextLayout::default()),
        }
    }

    /// Set the size threshold in bytes at which the file is rotated.
    ///
    /// The threshold is checked before each write: a line whose length would
    /// push the active file to `max_bytes` or beyond triggers a rotation
    /// first. A single line larger than `max_bytes` is still written in full
    /// into the freshly rotated file, so the threshold is not a hard cap for
    /// oversized records.
    pub fn max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    /// Set the number of rotated backup files to keep.
    pub fn backup_count(mut self, backup_count: usize) -> Self {
        self.backup_count = backup_count;
        self
    }

    /// Set the layout used to format log records.
    ///
    /// Default to [`TextLayout`].
    pub fn layout(mut self, layout: impl Into<Box<dyn Layout>>) -> Self {
        self.layout = layout.into();
        self
    }

    /// Build the [`RotatingFile`], opening the file in append mode.
    pub fn build(self) -> Result<RotatingFile, Error> {
        let Self {
            path,
            max_bytes,
            backup_count,
            layout,
        } = self;

        let writer = RotatingFileWriter::new(path, max_bytes, backup_count)?;
        Ok(RotatingFile {
            layout,
            writer: Mutex::new(writer),
        })
    }
}
