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

//! Appenders that deliver log records to their destination.
//!
//! Appenders come in two shapes: terminal sinks ([`Stdout`], [`Stderr`],
//! [`RotatingFile`]) and decorators ([`Async`], [`Batch`]) that wrap another
//! appender and change how records reach it. Decorators exclusively own the
//! appender they wrap, so a chain is never shared between two loggers.

use std::fmt;

use crate::Error;
use crate::record::Record;

mod asynchronous;
mod batch;
mod rotating;
mod stdio;

pub use self::asynchronous::Async;
pub use self::asynchronous::AsyncBuilder;
pub use self::batch::Batch;
pub use self::batch::BatchBuilder;
pub use self::rotating::RotatingFile;
pub use self::rotating::RotatingFileBuilder;
pub use self::stdio::Stderr;
pub use self::stdio::Stdout;

/// An appender that can process log records.
pub trait Append: fmt::Debug + Send + Sync + 'static {
    /// Dispatch a log record to the append target.
    fn append(&self, record: &Record) -> Result<(), Error>;

    /// Flush any buffered records.
    ///
    /// Default to a no-op.
    fn flush(&self) -> Result<(), Error> {
        Ok(())
    }

    /// Flush and release the append target.
    ///
    /// Close is idempotent; calling it again after the first close is a no-op.
    /// Appending after close is an error, never a silent drop.
    ///
    /// Default to a no-op.
    fn close(&self) -> Result<(), Error> {
        Ok(())
    }
}

impl<T: Append> From<T> for Box<dyn Append> {
    fn from(value: T) -> Self {
        Box::new(value)
    }
}
