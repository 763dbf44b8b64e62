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

use std::sync::Mutex;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::thread::JoinHandle;

use crossbeam_channel::Receiver;
use crossbeam_channel::Sender;

use crate::Error;
use crate::Trap;
use crate::append::Append;
use crate::record::Record;
use crate::trap::DefaultTrap;

/// A decorator that delivers records to the wrapped appender asynchronously.
///
/// `append` enqueues the record on a FIFO channel and returns immediately,
/// decoupling the logging call site from downstream I/O latency. Exactly one
/// worker thread drains the channel and drives the wrapped appender, so
/// delivery order equals emit order.
///
/// [`Async::close`] enqueues a shutdown sentinel and blocks until the worker
/// has drained the channel, closed the wrapped appender, and exited. Emitting
/// after close returns an error; records are never silently dropped.
///
/// # Examples
///
/// ```
/// use logstream::append::Async;
/// use logstream::append::Stdout;
///
/// let stdout = Async::new(Stdout::default());
/// ```
#[derive(Debug)]
pub struct Async {
    sender: Sender<Message>,
    closed: AtomicBool,
    handle: Mutex<Option<JoinHandle<()>>>,
}

#[derive(Debug)]
enum Message {
    Record(Box<Record>),
    Flush,
    Shutdown,
}

impl Async {
    /// Create a new [`Async`] decorating the given appender, with defaults.
    pub fn new(append: impl Into<Box<dyn Append>>) -> Self {
        AsyncBuilder::new(append).build()
    }

    /// Create a new [`AsyncBuilder`] decorating the given appender.
    pub fn builder(append: impl Into<Box<dyn Append>>) -> AsyncBuilder {
        AsyncBuilder::new(append)
    }

    fn send(&self, message: Message) -> Result<(), Error> {
        if self.closed.load(Ordering::Acquire) {
            return Err(Error::new("async appender already closed"));
        }

        self.sender
            .send(message)
            .map_err(|_| Error::new("failed to send log record to async appender"))
    }
}

impl Append for Async {
    fn append(&self, record: &Record) -> Result<(), Error> {
        self.send(Message::Record(Box::new(record.clone())))
    }

    fn flush(&self) -> Result<(), Error> {
        self.send(Message::Flush)
    }

    fn close(&self) -> Result<(), Error> {
        self.closed.store(true, Ordering::Release);

        let handle = self
            .handle
            .lock()
            .map_err(|_| Error::new("async appender handle mutex poisoned"))?
            .take();
        let Some(handle) = handle else {
            return Ok(());
        };

        // The channel is FIFO: every record enqueued before the sentinel is
        // delivered before the worker sees it and exits.
        let _ = self.sender.send(Message::Shutdown);
        handle
            .join()
            .map_err(|_| Error::new("async appender worker panicked"))
    }
}

impl Drop for Async {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

/// A builder for configuring [`Async`].
#[derive(Debug)]
pub struct AsyncBuilder {
    thread_name: String,
    append: Box<dyn Append>,
    buffered_lines_limit: Option<usize>,
    trap: Box<dyn Trap>,
}

impl AsyncBuilder {
    fn new(append: impl Into<Box<dyn Append>>) -> Self {
        Self {
            thread_name: "logstream-async".to_string(),
            append: append.into(),
            buffered_lines_limit: None,
            trap: Box::new(DefaultTrap::default()),
        }
    }

    /// Set the name of the worker thread.
    pub fn thread_name(mut self, thread_name: impl Into<String>) -> Self {
        self.thread_name = thread_name.into();
        self
    }

    /// Set the buffer size of pending messages.
    ///
    /// The queue is unbounded by default; setting a limit switches to a
    /// bounded channel on which `append` blocks when full.
    pub fn buffered_lines_limit(mut self, buffered_lines_limit: Option<usize>) -> Self {
        self.buffered_lines_limit = buffered_lines_limit;
        self
    }

    /// Set the trap that receives delivery errors from the worker.
    pub fn trap(mut self, trap: impl Into<Box<dyn Trap>>) -> Self {
        self.trap = trap.into();
        self
    }

    /// Build the [`Async`], spawning its worker thread.
    pub fn build(self) -> Async {
        let Self {
            thread_name,
            append,
            buffered_lines_limit,
            trap,
        } = self;

        let (sender, receiver) = match buffered_lines_limit {
            Some(limit) => crossbeam_channel::bounded(limit),
            None => crossbeam_channel::unbounded(),
        };

        let worker = Worker {
            receiver,
            append,
            trap,
        };
        let handle = std::thread::Builder::new()
            .name(thread_name)
            .spawn(move || worker.run())
            .expect("failed to spawn async appender thread");

        Async {
            sender,
            closed: AtomicBool::new(false),
            handle: Mutex::new(Some(handle)),
        }
    }
}

struct Worker {
    receiver: Receiver<Message>,
    append: Box<dyn Append>,
    trap: Box<dyn Trap>,
}

impl Worker {
    fn run(self) {
        let Self {
            receiver,
            append,
            trap,
        } = self;

        loop {
            match receiver.recv() {
                Ok(Message::Record(record)) => {
                    if let Err(err) = append.append(&record) {
                        trap.trap(
                            &Error::new("failed to append record asynchronously").with_source(err),
                        );
                    }
                }
                Ok(Message::Flush) => {
                    if let Err(err) = append.flush() {
                        trap.trap(
                            &Error::new("failed to flush wrapped appender").with_source(err),
                        );
                    }
                }
                Ok(Message::Shutdown) | Err(_) => break,
            }
        }

        if let Err(err) = append.close() {
            trap.trap(&Error::new("failed to close wrapped appender").with_source(err));
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::Mutex;
    use std::sync::atomic::AtomicBool;
    use std::sync::atomic::Ordering;

    use super::*;

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

    #[test]
    fn test_delivery_order_and_close_joins() {
        let records = Arc::new(Mutex::new(vec![]));
        let closed = Arc::new(AtomicBool::new(false));
        let collecting = Collecting {
            records: records.clone(),
            closed: closed.clone(),
        };

        let asynchronous = Async::new(collecting);
        for i in 0..100 {
            asynchronous
                .append(&Record::builder().payload(format!("msg-{i}")).build())
                .unwrap();
        }
        asynchronous.close().unwrap();

        // close() must not return before the last record is delivered.
        let delivered = records.lock().unwrap();
        let expected: Vec<String> = (0..100).map(|i| format!("msg-{i}")).collect();
        assert_eq!(*delivered, expected);
        assert!(closed.load(Ordering::SeqCst));
    }

    #[test]
    fn test_append_after_close_fails_loudly() {
        let asynchronous = Async::new(Collecting::default());
        asynchronous.close().unwrap();

        let err = asynchronous
            .append(&Record::builder().payload("late").build())
            .unwrap_err();
        assert!(err.to_string().contains("already closed"));
    }

    #[test]
    fn test_close_is_idempotent() {
        let asynchronous = Async::new(Collecting::default());
        asynchronous.close().unwrap();
        asynchronous.close().unwrap();
    }

    #[test]
    fn test_drop_drains_pending_records() {
        let records = Arc::new(Mutex::new(vec![]));
        let collecting = Collecting {
            records: records.clone(),
            closed: Arc::new(AtomicBool::new(false)),
        };

        {
            let asynchronous = Async::new(collecting);
            for i in 0..10 {
                asynchronous
                    .append(&Record::builder().payload(format!("msg-{i}")).build())
                    .unwrap();
            }
        }

        assert_eq!(records.lock().unwrap().len(), 10);
    }
}
