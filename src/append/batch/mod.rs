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

//! Decorator that flushes records to the wrapped appender in batches.

use std::sync::Mutex;
use std::sync::MutexGuard;
use std::time::Duration;

use jiff::Timestamp;

use crate::Error;
use crate::append::Append;
use crate::record::Record;

mod clock;

use self::clock::Clock;

/// A decorator that accumulates records and hands them to the wrapped
/// appender together.
///
/// A flush is triggered from `append` when the buffer reaches `batch_size`
/// or when `flush_interval` has elapsed since the last flush. There is no
/// background timer: the time check only fires on `append`, so a partial
/// batch whose interval has elapsed waits for the next record. Wrap the
/// decorator in [`Async`](crate::append::Async) if emit latency matters.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use logstream::append::Batch;
/// use logstream::append::Stdout;
///
/// let batched = Batch::builder(Stdout::default())
///     .batch_size(10)
///     .flush_interval(Duration::from_secs(5))
///     .build()
///     .unwrap();
/// ```
#[derive(Debug)]
pub struct Batch {
    append: Box<dyn Append>,
    batch_size: usize,
    flush_interval_ms: i64,
    inner: Mutex<Inner>,
}

#[derive(Debug)]
struct Inner {
    buffer: Vec<Record>,
    last_flush: Timestamp,
    clock: Clock,
}

impl Batch {
    /// Create a new [`Batch`] decorating the given appender, with defaults.
    pub fn new(append: impl Into<Box<dyn Append>>) -> Self {
        // The default configuration is always valid.
        BatchBuilder::new(append).build().unwrap()
    }

    /// Create a new [`BatchBuilder`] decorating the given appender.
    pub fn builder(append: impl Into<Box<dyn Append>>) -> BatchBuilder {
        BatchBuilder::new(append)
    }

    fn lock_inner(&self) -> Result<MutexGuard<'_, Inner>, Error> {
        self.inner
            .lock()
            .map_err(|_| Error::new("batch buffer mutex poisoned"))
    }

    /// Deliver the buffered records in order and clear the buffer.
    ///
    /// On a delivery failure the undelivered suffix, including the failing
    /// record, stays in the buffer; already-delivered records are not
    /// re-sent. `last_flush` is reset either way so a broken sink does not
    /// turn every subsequent `append` into an immediate retry.
    fn flush_buffer(&self, inner: &mut Inner) -> Result<(), Error> {
        let records = std::mem::take(&mut inner.buffer);

        let mut failure = None;
        for (delivered, record) in records.iter().enumerate() {
            if let Err(err) = self.append.append(record) {
                failure = Some((delivered, err));
                break;
            }
        }

        inner.last_flush = inner.clock.now();

        match failure {
            None => Ok(()),
            Some((delivered, err)) => {
                inner.buffer = records[delivered..].to_vec();
                Err(Error::new("failed to flush batched records")
                    .with_context("delivered", delivered)
                    .with_context("retained", inner.buffer.len())
                    .with_source(err))
            }
        }
    }
}

impl Append for Batch {
    fn append(&self, record: &Record) -> Result<(), Error> {
        let mut inner = self.lock_inner()?;
        inner.buffer.push(record.clone());

        let now = inner.clock.now();
        let elapsed_ms = now.as_millisecond() - inner.last_flush.as_millisecond();
        if inner.buffer.len() >= self.batch_size || elapsed_ms >= self.flush_interval_ms {
            self.flush_buffer(&mut inner)?;
        }
        Ok(())
    }

    fn flush(&self) -> Result<(), Error> {
        let mut inner = self.lock_inner()?;
        self.flush_buffer(&mut inner)?;
        drop(inner);
        self.append.flush()
    }

    fn close(&self) -> Result<(), Error> {
        match self.flush() {
            Ok(()) => self.append.close(),
            Err(flush_err) => {
                let mut err = Error::new("failed to close batch appender").with_source(flush_err);
                if let Err(close_err) = self.append.close() {
                    err = err.with_source(close_err);
                }
                Err(err)
            }
        }
    }
}

/// A builder for configuring [`Batch`].
#[derive(Debug)]
pub struct BatchBuilder {
    append: Box<dyn Append>,
    batch_size: usize,
    flush_interval: Duration,
    clock: Clock,
}

impl BatchBuilder {
    fn new(append: impl Into<Box<dyn Append>>) -> Self {
        Self {
            append: append.into(),
            batch_size: 10,
            flush_interval: Duration::from_secs(5),
            clock: Clock::DefaultClock,
        }
    }

    /// Set the number of buffered records that triggers a flush.
    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Set the interval after which the next `append` triggers a flush.
    pub fn flush_interval(mut self, flush_interval: Duration) -> Self {
        self.flush_interval = flush_interval;
        self
    }

    #[cfg(test)]
    fn clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Build the [`Batch`].
    ///
    /// # Errors
    ///
    /// Returns an error if `batch_size` is zero or `flush_interval` does not
    /// fit the millisecond trigger arithmetic.
    pub fn build(self) -> Result<Batch, Error> {
        let Self {
            append,
            batch_size,
            flush_interval,
            clock,
        } = self;

        if batch_size == 0 {
            return Err(Error::new("batch size must be at least 1"));
        }
        let flush_interval_ms = i64::try_from(flush_interval.as_millis())
            .map_err(|_| Error::new("flush interval out of range"))?;

        let last_flush = clock.now();
        Ok(Batch {
            append,
            batch_size,
            flush_interval_ms,
            inner: Mutex::new(Inner {
                buffer: vec![],
                last_flush,
                clock,
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;
    use std::sync::Arc;
    use std::sync::atomic::AtomicBool;
    use std::sync::atomic::Ordering;

    use super::*;
    use crate::append::batch::clock::ManualClock;

    #[derive(Debug, Default)]
    struct Collecting {
        records: Arc<Mutex<Vec<String>>>,
        closed: Arc<AtomicBool>,
    }

    impl Append for Collecting {
        fn append(&self, record: &Record) -> Result<(), Error> {
            self.records.lock().unwrap().push(record.payload().to_string());
            Ok(())
        }

        fn close(&self) -> Result<(), Error> {
            self.closed.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    /// Fails every delivery after the first.
    #[derive(Debug, Default)]
    struct FailingSecond {
        deliveries: Arc<Mutex<Vec<String>>>,
    }

    impl Append for FailingSecond {
        fn append(&self, record: &Record) -> Result<(), Error> {
            let mut deliveries = self.deliveries.lock().unwrap();
            if deliveries.is_empty() {
                deliveries.push(record.payload().to_string());
                Ok(())
            } else {
                Err(Error::new("sink unwritable"))
            }
        }
    }

    fn record(payload: &str) -> Record {
        Record::builder().payload(payload).build()
    }

    #[test]
    fn test_size_trigger_flushes_full_batch() {
        let records = Arc::new(Mutex::new(vec![]));
        let collecting = Collecting {
            records: records.clone(),
            closed: Arc::new(AtomicBool::new(false)),
        };
        let batch = Batch::builder(collecting)
            .batch_size(3)
            .flush_interval(Duration::from_secs(3600))
            .build()
            .unwrap();

        batch.append(&record("a")).unwrap();
        batch.append(&record("b")).unwrap();
        assert!(records.lock().unwrap().is_empty());

        batch.append(&record("c")).unwrap();
        assert_eq!(*records.lock().unwrap(), vec!["a", "b", "c"]);
        assert!(batch.inner.lock().unwrap().buffer.is_empty());
    }

    #[test]
    fn test_time_trigger_flushes_partial_batch() {
        let t0 = Timestamp::from_str("2024-01-01T12:00:00Z").unwrap();
        let records = Arc::new(Mutex::new(vec![]));
        let collecting = Collecting {
            records: records.clone(),
            closed: Arc::new(AtomicBool::new(false)),
        };
        let batch = Batch::builder(collecting)
            .batch_size(10)
            .flush_interval(Duration::from_secs(5))
            .clock(Clock::ManualClock(ManualClock::new(t0)))
            .build()
            .unwrap();

        batch.append(&record("a")).unwrap();
        batch.append(&record("b")).unwrap();
        assert!(records.lock().unwrap().is_empty());

        // The time check only fires on append: advancing the clock alone
        // must not flush anything.
        let t1 = Timestamp::from_str("2024-01-01T12:00:06Z").unwrap();
        batch.inner.lock().unwrap().clock.set_now(t1);
        assert!(records.lock().unwrap().is_empty());

        batch.append(&record("c")).unwrap();
        assert_eq!(*records.lock().unwrap(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_close_flushes_remainder_then_closes_wrapped() {
        let records = Arc::new(Mutex::new(vec![]));
        let closed = Arc::new(AtomicBool::new(false));
        let collecting = Collecting {
            records: records.clone(),
            closed: closed.clone(),
        };
        let batch = Batch::builder(collecting)
            .batch_size(10)
            .flush_interval(Duration::from_secs(3600))
            .build()
            .unwrap();

        batch.append(&record("a")).unwrap();
        batch.close().unwrap();

        assert_eq!(*records.lock().unwrap(), vec!["a"]);
        assert!(closed.load(Ordering::SeqCst));
    }

    #[test]
    fn test_failed_flush_retains_undelivered_records() {
        let deliveries = Arc::new(Mutex::new(vec![]));
        let failing = FailingSecond {
            deliveries: deliveries.clone(),
        };
        let batch = Batch::builder(failing)
            .batch_size(3)
            .flush_interval(Duration::from_secs(3600))
            .build()
            .unwrap();

        batch.append(&record("a")).unwrap();
        batch.append(&record("b")).unwrap();
        let err = batch.append(&record("c")).unwrap_err();
        assert!(err.to_string().contains("failed to flush"));

        // "a" was delivered; "b" failed and stays buffered with "c".
        assert_eq!(*deliveries.lock().unwrap(), vec!["a"]);
        let inner = batch.inner.lock().unwrap();
        let retained: Vec<&str> = inner.buffer.iter().map(|r| r.payload()).collect();
        assert_eq!(retained, vec!["b", "c"]);
    }

    #[test]
    fn test_zero_batch_size_is_a_configuration_error() {
        let err = Batch::builder(Collecting::default())
            .batch_size(0)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("batch size"));
    }
}
