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

//! Logstream is a composable logging pipeline: named loggers emit leveled
//! records through a chain of appenders, each rendering records via a
//! pluggable layout.
//!
//! # Overview
//!
//! Appenders compose by decoration: [`append::Async`] offloads delivery to a
//! background worker, [`append::Batch`] groups records before handing them
//! downstream, and both terminate in a direct sink such as
//! [`append::Stdout`] or the size-rotated [`append::RotatingFile`].
//!
//! # Examples
//!
//! Console logging with a level threshold:
//!
//! ```
//! use logstream::Level;
//! use logstream::Logger;
//! use logstream::append::Stdout;
//!
//! let logger = Logger::new("app").append(Stdout::default());
//! logger.set_level(Level::Info);
//!
//! logger.info("service started");
//! logger.close().unwrap();
//! ```
//!
//! Asynchronous delivery to a rotating file:
//!
//! ```no_run
//! use logstream::Logger;
//! use logstream::append::Async;
//! use logstream::append::RotatingFile;
//!
//! let file = RotatingFile::builder("app.log")
//!     .max_bytes(1024 * 1024)
//!     .backup_count(3)
//!     .build()
//!     .unwrap();
//!
//! let logger = Logger::new("app").append(Async::new(file));
//! logger.error("disk full");
//! logger.close().unwrap();
//! ```

#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub mod append;
pub mod layout;
pub mod record;

mod bridge;
mod error;
mod logger;
mod trap;

pub use self::append::Append;
pub use self::error::Error;
pub use self::layout::Layout;
pub use self::logger::Logger;
pub use self::record::Level;
pub use self::record::Record;
pub use self::trap::DefaultTrap;
pub use self::trap::Trap;
