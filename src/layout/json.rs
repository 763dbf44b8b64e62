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

use crate::Error;
use crate::layout::Layout;
use crate::record::Record;

/// A layout that formats log records as JSON objects.
///
/// Output format:
///
/// ```json
/// {"timestamp":"2024-08-11T14:44:57.172105Z","level":"INFO","logger":"app","message":"ready","context":{"file":"src/main.rs","line":12,"function":null,"thread":"main"}}
/// ```
#[derive(Debug, Clone, Default)]
#[non_exhaustive]
pub struct JsonLayout {}

impl Layout for JsonLayout {
    fn format(&self, record: &Record) -> Result<Vec<u8>, Error> {
        let value = serde_json::json!({
            "timestamp": record.time().to_string(),
            "level": record.level().as_str(),
            "logger": record.logger_name(),
            "message": record.payload(),
            "context": {
                "file": record.file(),
                "line": record.line(),
                "function": record.function(),
                "thread": record.thread(),
            },
        });

        serde_json::to_vec(&value)
            .map_err(|err| Error::new("failed to serialize log record").with_source(err))
    }
}
