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

use std::panic::Location;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

use crate::Error;
use crate::Trap;
use crate::append::Append;
use crate::record::Level;
use crate::record::Record;
use crate::trap::DefaultTrap;

/// A named logger that fans leveled records out to its appenders.
///
/// A record is delivered iff its level is at or above the logger's threshold.
/// Delivery happens in attachment order, and a failure in one appender is
/// routed to the logger's [`Trap`] without aborting delivery to the
/// remaining appenders.
///
/// # Examples
///
/// ```
/// use logstream::Level;
/// use logstream::Logger;
/// use logstream::append::Stdout;
///
/// let mut logger = Logger::new("app");
/// logger.add_append(Stdout::default());
/// logger.set_level(Level::Info);
///
/// logger.info("service started");
/// logger.debug("this is filtered out");
///
/// logger.close().unwrap();
/// ```
#[derive(Debug)]
pub struct Logger {
    name: String,
    level: AtomicUsize,
    appends: Vec<Box<dyn Append>>,
    trap: Box<dyn Trap>,
}

impl Logger {
    /// Create a new logger with the given name and a [`Level::Debug`]
    /// threshold.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            level: AtomicUsize::new(Level::Debug as usize),
            appends: vec![],
            trap: Box::new(DefaultTrap::default()),
        }
    }

    /// Add an appender, builder style.
    pub fn append(mut self, append: impl Into<Box<dyn Append>>) -> Self {
        self.add_append(append);
        self
    }

    /// Set the trap that receives delivery errors, builder style.
    pub fn trap(mut self, trap: impl Into<Box<dyn Trap>>) -> Self {
        self.trap = trap.into();
        self
    }

    /// The name of the logger, stamped on every record it produces.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Append an appender to the fan-out list.
    pub fn add_append(&mut self, append: impl Into<Box<dyn Append>>) {
        self.appends.push(append.into());
    }

    /// The current level threshold.
    pub fn level(&self) -> Level {
        Level::from_usize(self.level.load(Ordering::Relaxed))
    }

    /// Change the level threshold for subsequent calls.
    ///
    /// The change has no retroactive effect on records already queued
    /// downstream. Name-based configuration goes through
    /// [`Level::from_str`](std::str::FromStr), which rejects unknown names at
    /// the call site.
    pub fn set_level(&self, level: Level) {
        self.level.store(level as usize, Ordering::Relaxed);
    }

    /// Whether a record at the given level would be delivered.
    pub fn enabled(&self, level: Level) -> bool {
        level >= self.level()
    }

    /// Log a message at the given level.
    ///
    /// Builds a record with a snapshot of the call context (source location
    /// and thread) and delivers it to each appender in attachment order.
    #[track_caller]
    pub fn log(&self, level: Level, message: impl Into<String>) {
        if !self.enabled(level) {
            return;
        }

        let caller = Location::caller();
        let record = Record::builder()
            .logger_name(self.name.as_str())
            .level(level)
            .file(caller.file())
            .line(caller.line())
            .payload(message)
            .build();
        self.deliver(&record);
    }

    /// Log a message at [`Level::Debug`].
    #[track_caller]
    pub fn debug(&self, message: impl Into<String>) {
        self.log(Level::Debug, message);
    }

    /// Log a message at [`Level::Info`].
    #[track_caller]
    pub fn info(&self, message: impl Into<String>) {
        self.log(Level::Info, message);
    }

    /// Log a message at [`Level::Warning`].
    #[track_caller]
    pub fn warning(&self, message: impl Into<String>) {
        self.log(Level::Warning, message);
    }

    /// Log a message at [`Level::Error`].
    #[track_caller]
    pub fn error(&self, message: impl Into<String>) {
        self.log(Level::Error, message);
    }

    /// Log a message at [`Level::Critical`].
    #[track_caller]
    pub fn critical(&self, message: impl Into<String>) {
        self.log(Level::Critical, message);
    }

    /// Flush all appenders; failures go to the trap.
    pub fn flush(&self) {
        for append in &self.appends {
            if let Err(err) = append.flush() {
                self.trap.trap(&err);
            }
        }
    }

    /// Close all appenders.
    ///
    /// Every appender is closed even when an earlier one fails; the failures
    /// are aggregated into the returned error.
    pub fn close(&self) -> Result<(), Error> {
        let mut failures = vec![];
        for append in &self.appends {
            if let Err(err) = append.close() {
                failures.push(err);
            }
        }

        if failures.is_empty() {
            return Ok(());
        }
        let mut err = Error::new("failed to close logger appenders")
            .with_context("logger", &self.name);
        for failure in failures {
            err = err.with_source(failure);
        }
        Err(err)
    }

    pub(crate) fn deliver(&self, record: &Record) {
        for append in &self.appends {
            if let Err(err) = append.append(record) {
                self.trap.trap(&err);
            }
        }
    }
}
