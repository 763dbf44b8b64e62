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

//! Log record and levels.

use std::fmt;
use std::str::FromStr;

use jiff::Timestamp;

/// The payload of a log message.
///
/// A record is immutable once built: its creation time is assigned by
/// [`RecordBuilder::build`] (or defaulted at builder construction) and never
/// changes afterwards. Appenders only ever read records; buffering appenders
/// own clones.
#[derive(Clone, Debug)]
pub struct Record {
    // the observed time
    time: Timestamp,

    // the origin
    logger_name: String,
    level: Level,
    file: Option<String>,
    line: Option<u32>,
    function: Option<String>,
    thread: String,

    // the payload
    payload: String,
}

impl Record {
    /// Create a new [`RecordBuilder`].
    pub fn builder() -> RecordBuilder {
        RecordBuilder::default()
    }

    /// The observed time.
    pub fn time(&self) -> Timestamp {
        self.time
    }

    /// The name of the logger that produced the record.
    pub fn logger_name(&self) -> &str {
        &self.logger_name
    }

    /// The verbosity level of the message.
    pub fn level(&self) -> Level {
        self.level
    }

    /// The source file containing the message.
    pub fn file(&self) -> Option<&str> {
        self.file.as_deref()
    }

    /// The line containing the message.
    pub fn line(&self) -> Option<u32> {
        self.line
    }

    /// The function containing the message, if known.
    pub fn function(&self) -> Option<&str> {
        self.function.as_deref()
    }

    /// The name of the emitting thread, or its id when unnamed.
    pub fn thread(&self) -> &str {
        &self.thread
    }

    /// The message body.
    pub fn payload(&self) -> &str {
        &self.payload
    }
}

/// Builder for [`Record`].
#[derive(Debug)]
pub struct RecordBuilder {
    record: Record,
}

impl Default for RecordBuilder {
    fn default() -> Self {
        RecordBuilder {
            record: Record {
                time: Timestamp::now(),
                logger_name: String::new(),
                level: Level::Info,
                file: None,
                line: None,
                function: None,
                thread: current_thread_name(),
                payload: String::new(),
            },
        }
    }
}

impl RecordBuilder {
    /// Set [`logger_name`](Record::logger_name).
    pub fn logger_name(mut self, name: impl Into<String>) -> Self {
        self.record.logger_name = name.into();
        self
    }

    /// Set [`level`](Record::level).
    pub fn level(mut self, level: Level) -> Self {
        self.record.level = level;
        self
    }

    /// Set [`file`](Record::file).
    pub fn file(mut self, file: impl Into<String>) -> Self {
        self.record.file = Some(file.into());
        self
    }

    /// Set [`line`](Record::line).
    pub fn line(mut self, line: u32) -> Self {
        self.record.line = Some(line);
        self
    }

    /// Set [`function`](Record::function).
    pub fn function(mut self, function: impl Into<String>) -> Self {
        self.record.function = Some(function.into());
        self
    }

    /// Set [`thread`](Record::thread).
    pub fn thread(mut self, thread: impl Into<String>) -> Self {
        self.record.thread = thread.into();
        self
    }

    /// Set [`payload`](Record::payload).
    pub fn payload(mut self, payload: impl Into<String>) -> Self {
        self.record.payload = payload.into();
        self
    }

    /// Invoke the builder and return a [`Record`].
    pub fn build(self) -> Record {
        self.record
    }
}

pub(crate) fn current_thread_name() -> String {
    let current = std::thread::current();
    match current.name() {
        Some(name) => name.to_string(),
        None => format!("{:?}", current.id()),
    }
}

/// An enum representing the available verbosity levels of a record.
///
/// Levels are totally ordered by severity; comparison is ordinal, not lexical
/// on the symbolic name.
#[repr(usize)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Hash)]
pub enum Level {
    /// The "debug" level.
    ///
    /// Designates lower priority information.
    Debug = 0,
    /// The "info" level.
    ///
    /// Designates useful information.
    Info = 1,
    /// The "warning" level.
    ///
    /// Designates hazardous situations.
    Warning = 2,
    /// The "error" level.
    ///
    /// Designates very serious errors.
    Error = 3,
    /// The "critical" level.
    ///
    /// Designates unrecoverable failures.
    Critical = 4,
}

impl Level {
    /// Return the string representation of the `Level`.
    ///
    /// This returns the same string as the `fmt::Display` implementation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warning => "WARNING",
            Level::Error => "ERROR",
            Level::Critical => "CRITICAL",
        }
    }

    pub(crate) fn from_usize(rank: usize) -> Level {
        match rank {
            0 => Level::Debug,
            1 => Level::Info,
            2 => Level::Warning,
            3 => Level::Error,
            _ => Level::Critical,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// The type returned by `from_str` when the string doesn't match any of the
/// log levels.
#[derive(Debug, PartialEq, Eq)]
#[non_exhaustive]
pub struct ParseLevelError {}

impl fmt::Display for ParseLevelError {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.write_str("malformed log level")
    }
}

impl std::error::Error for ParseLevelError {}

impl FromStr for Level {
    type Err = ParseLevelError;

    fn from_str(s: &str) -> Result<Level, Self::Err> {
        for (name, level) in [
            ("debug", Level::Debug),
            ("info", Level::Info),
            ("warning", Level::Warning),
            ("error", Level::Error),
            ("critical", Level::Critical),
        ] {
            if s.eq_ignore_ascii_case(name) {
                return Ok(level);
            }
        }

        Err(ParseLevelError {})
    }
}
