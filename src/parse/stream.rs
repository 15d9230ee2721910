use std::io::BufRead;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, Sender, TryRecvError};
pub use crossbeam_channel::RecvTimeoutError;
use tracing::{debug, warn};

use crate::error::{NagiosError, NagiosResult, ParseError};
use crate::object::ConfigObject;

use super::reader::ObjectReader;

const PRODUCER_THREAD: &str = "nagioscfg-reader";

/// Objects pushed by a background parser thread.
///
/// The stream ends when the producer reaches end of input or hits a parse
/// error. Parse errors are logged by the producer and are not delivered.
/// Dropping the stream makes the producer stop at its next send.
#[derive(Debug)]
pub struct ObjectStream {
    rx: Receiver<ConfigObject>,
    producer: JoinHandle<()>,
}

/// How a producer stopped reading one source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Pump {
    Exhausted,
    Failed,
    Disconnected,
}

impl ObjectStream {
    pub(crate) fn spawn<F>(capacity: usize, produce: F) -> NagiosResult<Self>
    where
        F: FnOnce(Sender<ConfigObject>) + Send + 'static,
    {
        let (tx, rx) = bounded(capacity);
        let producer = thread::Builder::new()
            .name(PRODUCER_THREAD.to_string())
            .spawn(move || produce(tx))
            .map_err(|e| NagiosError::io("spawn reader thread", e))?;
        Ok(Self { rx, producer })
    }

    /// Blocks for the next object; `None` once the stream is closed and
    /// drained.
    pub fn recv(&self) -> Option<ConfigObject> {
        self.rx.recv().ok()
    }

    /// Waits up to `timeout` for the next object.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<ConfigObject, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }

    /// Returns an object if one is ready. `Ok(None)` means nothing is ready
    /// yet; `Err` means the stream is closed and drained.
    pub fn try_recv(&self) -> Result<Option<ConfigObject>, RecvTimeoutError> {
        match self.rx.try_recv() {
            Ok(obj) => Ok(Some(obj)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(RecvTimeoutError::Disconnected),
        }
    }

    /// Stops consuming and waits for the producer thread to exit.
    pub fn close(self) {
        let Self { rx, producer } = self;
        drop(rx);
        if producer.join().is_err() {
            warn!("reader thread panicked");
        }
    }
}

impl Iterator for ObjectStream {
    type Item = ConfigObject;

    fn next(&mut self) -> Option<Self::Item> {
        self.recv()
    }
}

/// Sends every object of `reader` into `tx` until end of input, a parse
/// error, or the consumer going away.
pub(crate) fn pump<R: BufRead>(reader: &mut ObjectReader<R>, tx: &Sender<ConfigObject>) -> Pump {
    loop {
        match reader.read_object() {
            Ok(obj) => {
                if tx.send(obj).is_err() {
                    debug!(partition = reader.partition_key(), "object stream dropped by consumer");
                    return Pump::Disconnected;
                }
            }
            Err(ParseError::EndOfInput) => return Pump::Exhausted,
            Err(err) => {
                warn!(partition = reader.partition_key(), %err, "closing object stream on parse error");
                return Pump::Failed;
            }
        }
    }
}

impl<R: BufRead + Send + 'static> ObjectReader<R> {
    /// Moves the reader onto a background thread that pushes objects into a
    /// bounded channel of `capacity` slots.
    pub fn into_channel(mut self, capacity: usize) -> NagiosResult<ObjectStream> {
        ObjectStream::spawn(capacity, move |tx| {
            pump(&mut self, &tx);
        })
    }

    /// Like [`into_channel`](Self::into_channel) with the configured
    /// `channel_capacity`.
    pub fn into_stream(self) -> NagiosResult<ObjectStream> {
        let capacity = self.config().channel_capacity;
        self.into_channel(capacity)
    }
}
