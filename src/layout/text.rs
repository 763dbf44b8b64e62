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

use std::fmt::Write;

#[cfg(feature = "colored")]
use colored::Color;
#[cfg(feature = "colored")]
use colored::ColoredString;
#[cfg(feature = "colored")]
use colored::Colorize;

use crate::Error;
use crate::layout::Layout;
#[cfg(feature = "colored")]
use crate::record::Level;
use crate::record::Record;

/// A layout that formats log records as a single line of text.
///
/// Output format:
///
/// ```text
/// 2024-08-11T14:44:57.172105Z  WARNING app: src/main.rs:52 [main] disk almost full
/// 2024-08-11T14:44:57.172219Z    ERROR app: src/main.rs:53 [main] disk full
/// ```
///
/// With the `colored` feature enabled, [`TextLayout::colored`] renders the
/// level name in a per-level color.
#[derive(Debug, Clone, Default)]
#[non_exhaustive]
pub struct TextLayout {
    #[cfg(feature = "colored")]
    colors: Option<LevelColor>,
}

/// Customize the color of each log level.
#[cfg(feature = "colored")]
#[derive(Debug, Clone)]
pub struct LevelColor {
    pub debug: Color,
    pub info: Color,
    pub warning: Color,
    pub error: Color,
    pub critical: Color,
}

#[cfg(feature = "colored")]
impl Default for LevelColor {
    fn default() -> Self {
        Self {
            debug: Color::Blue,
            info: Color::Green,
            warning: Color::Yellow,
            error: Color::Red,
            critical: Color::Magenta,
        }
    }
}

impl TextLayout {
    /// Render level names with the default per-level colors.
    #[cfg(feature = "colored")]
    pub fn colored(self) -> Self {
        self.with_colors(LevelColor::default())
    }

    /// Render level names with the given per-level colors.
    #[cfg(feature = "colored")]
    pub fn with_colors(mut self, colors: LevelColor) -> Self {
        self.colors = Some(colors);
        self
    }

    fn level_display(&self, record: &Record) -> String {
        #[cfg(feature = "colored")]
        if let Some(colors) = &self.colors {
            let color = match record.level() {
                Level::Debug => colors.debug,
                Level::Info => colors.info,
                Level::Warning => colors.warning,
                Level::Error => colors.error,
                Level::Critical => colors.critical,
            };
            return ColoredString::from(record.level().as_str())
                .color(color)
                .to_string();
        }

        record.level().as_str().to_string()
    }
}

impl Layout for TextLayout {
    fn format(&self, record: &Record) -> Result<Vec<u8>, Error> {
        let mut text = String::new();

        let time = record.time();
        let level = self.level_display(record);
        let name = record.logger_name();
        let file = record.file().unwrap_or_default();
        let line = record.line().unwrap_or_default();
        let thread = record.thread();
        let message = record.payload();

        // SAFETY: write to a string always succeeds
        write!(
            &mut text,
            "{time} {level:>8} {name}: {file}:{line} [{thread}] {message}"
        )
        .unwrap();

        Ok(text.into_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Level;

    #[test]
    fn test_text_layout_contains_record_parts() {
        let record = Record::builder()
            .logger_name("app")
            .level(Level::Warning)
            .file("src/main.rs")
            .line(52)
            .thread("main")
            .payload("disk almost full")
            .build();

        let bytes = TextLayout::default().format(&record).unwrap();
        let line = String::from_utf8(bytes).unwrap();

        assert!(line.contains("WARNING"));
        assert!(line.contains("app:"));
        assert!(line.contains("src/main.rs:52"));
        assert!(line.contains("[main]"));
        assert!(line.ends_with("disk almost full"));
    }
}
