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

use crate::Logger;
use crate::record::Level;
use crate::record::Record;

impl From<log::Level> for Level {
    fn from(level: log::Level) -> Self {
        match level {
            log::Level::Error => Self::Error,
            log::Level::Warn => Self::Warning,
            log::Level::Info => Self::Info,
            log::Level::Debug => Self::Debug,
            log::Level::Trace => Self::Debug,
        }
    }
}

impl Logger {
    /// Install this logger as the global [`log`] facade backend.
    ///
    /// Level filtering stays with this logger's own threshold, so the facade
    /// maximum is left wide open. `Critical` has no facade equivalent and is
    /// only reachable through the native API.
    ///
    /// # Errors
    ///
    /// Return an error if a global logger has already been set.
    pub fn apply(self) -> Result<(), log::SetLoggerError> {
        log::set_boxed_logger(Box::new(self))?;
        log::set_max_level(log::LevelFilter::Trace);
        Ok(())
    }
}

impl log::Log for Logger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        Logger::enabled(self, metadata.level().into())
    }

    fn log(&self, record: &log::Record) {
        let level = Level::from(record.level());
        if !Logger::enabled(self, level) {
            return;
        }

        let mut builder = Record::builder()
            .logger_name(record.target())
            .level(level)
            .payload(record.args().to_string());
        if let Some(file) = record.file() {
            builder = builder.file(file);
        }
        if let Some(line) = record.line() {
            builder = builder.line(line);
        }
        if let Some(module_path) = record.module_path() {
            builder = builder.function(module_path);
        }

        self.deliver(&builder.build());
    }

    fn flush(&self) {
        Logger::flush(self);
    }
}
