//! # Flush thread
//!
//! The recording pipeline. Producers hand [`FlushEntry`]s to a [`FlushQueue`], which owns the
//! sending end of a bounded channel. A single writer thread owns every open [`Sink`] and
//! processes entries in submission order, so all entries for one sink are written in the order
//! they were submitted and a sink is only closed once every entry before its close entry has
//! been written.
//!
//! Frame data never blocks the producer: if the queue is full the frame is dropped and counted.
//! Attaching and closing a sink block until there is room in the queue, so a session is never
//! left half open.
//!
//! Dropping every [`FlushQueue`] shuts the writer down once it has drained the queue. Any sinks
//! still open at that point are flushed and closed.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use crossbeam::channel::{self, Receiver, Sender, TrySendError};
use log::{debug, info, warn};
use std::{
    collections::HashMap,
    fmt,
    io::{self, Write},
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    thread::{self, JoinHandle},
};

use super::sink::Sink;

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// Accepts recording entries on behalf of an asynchronous writer.
pub trait RecordingPipeline: Send + Sync {
    /// Submit an entry, transferring ownership of any buffer it carries.
    fn submit(&self, entry: FlushEntry) -> Result<(), PipelineError>;
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Identifies a sink within the pipeline.
///
/// Once a sink has been closed its identifier may be reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SinkId(pub u32);

/// Producer side of the pipeline.
#[derive(Clone)]
pub struct FlushQueue {
    sender: Sender<FlushEntry>,
    dropped: Arc<AtomicU64>,
}

/// Handle on the writer thread.
pub struct FlushThread {
    handle: JoinHandle<FlushStats>,
    dropped: Arc<AtomicU64>,
}

/// Totals reported by the writer when it exits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FlushStats {
    /// Data entries written in full
    pub entries_written: u64,

    pub bytes_written: u64,

    /// Data entries dropped because the queue was full
    pub entries_dropped: u64,

    /// Data entries lost to write errors or because their sink wasn't open
    pub entries_lost: u64,

    pub sinks_closed: u64,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// An entry for the writer.
pub enum FlushEntry {
    /// Start writing to a newly opened sink.
    Attach(SinkId, Sink),

    /// Write a buffer to a sink. The writer releases the buffer once it has been written.
    Data(SinkId, Vec<u8>),

    /// Flush and close a sink once everything before this entry has been written.
    Close(SinkId),
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PipelineError {
    #[error("The flush queue is full, the entry was dropped")]
    QueueFull,

    #[error("The flush thread has stopped")]
    Disconnected,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl fmt::Debug for FlushEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlushEntry::Attach(id, sink) => f
                .debug_tuple("Attach")
                .field(id)
                .field(&if sink.is_stdout() { "stdout" } else { "file" })
                .finish(),
            FlushEntry::Data(id, buf) => f
                .debug_tuple("Data")
                .field(id)
                .field(&buf.len())
                .finish(),
            FlushEntry::Close(id) => f.debug_tuple("Close").field(id).finish(),
        }
    }
}

impl FlushEntry {
    pub fn sink_id(&self) -> SinkId {
        match self {
            FlushEntry::Attach(id, _) | FlushEntry::Data(id, _) | FlushEntry::Close(id) => *id
        }
    }
}

impl RecordingPipeline for FlushQueue {
    fn submit(&self, entry: FlushEntry) -> Result<(), PipelineError> {
        match entry {
            FlushEntry::Data(..) => match self.sender.try_send(entry) {
                Ok(()) => Ok(()),
                Err(TrySendError::Full(_)) => {
                    self.dropped.fetch_add(1, Ordering::Relaxed);
                    Err(PipelineError::QueueFull)
                },
                Err(TrySendError::Disconnected(_)) => Err(PipelineError::Disconnected),
            },
            _ => self.sender.send(entry).map_err(|_| PipelineError::Disconnected),
        }
    }
}

impl FlushQueue {
    /// Number of data entries dropped so far because the queue was full.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl FlushThread {
    /// Start the writer thread with a queue of `depth` entries.
    pub fn spawn(depth: usize) -> io::Result<(FlushQueue, FlushThread)> {
        let (sender, receiver) = channel::bounded(depth);
        let dropped = Arc::new(AtomicU64::new(0));

        let handle = thread::Builder::new()
            .name("flush".into())
            .spawn(move || writer_loop(receiver))?;

        info!("Flush thread started with a queue of {} entries", depth);

        Ok((
            FlushQueue {
                sender,
                dropped: dropped.clone(),
            },
            FlushThread {
                handle,
                dropped,
            }
        ))
    }

    /// Wait for the writer to drain the queue and exit.
    ///
    /// This only returns once every [`FlushQueue`] has been dropped.
    pub fn join(self) -> thread::Result<FlushStats> {
        let mut stats = self.handle.join()?;
        stats.entries_dropped = self.dropped.load(Ordering::Relaxed);
        Ok(stats)
    }
}

// ------------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ------------------------------------------------------------------------------------------------

fn writer_loop(receiver: Receiver<FlushEntry>) -> FlushStats {
    let mut sinks: HashMap<SinkId, Sink> = HashMap::new();
    let mut stats = FlushStats::default();

    for entry in receiver.iter() {
        match entry {
            FlushEntry::Attach(id, sink) => {
                debug!("Attaching sink {:?}", id);
                if let Some(old) = sinks.insert(id, sink) {
                    warn!("Sink {:?} attached while still open, closing the previous sink", id);
                    close_sink(id, old, &mut stats);
                }
            },
            FlushEntry::Data(id, buf) => match sinks.get_mut(&id) {
                Some(sink) => match sink.write_all(&buf) {
                    Ok(()) => {
                        stats.entries_written += 1;
                        stats.bytes_written += buf.len() as u64;
                    },
                    Err(e) => {
                        warn!("Could not write {} bytes to sink {:?}: {}", buf.len(), id, e);
                        stats.entries_lost += 1;
                    }
                },
                None => {
                    warn!("Data for sink {:?} which isn't open, dropping it", id);
                    stats.entries_lost += 1;
                }
            },
            FlushEntry::Close(id) => match sinks.remove(&id) {
                Some(sink) => close_sink(id, sink, &mut stats),
                None => warn!("Close for sink {:?} which isn't open", id)
            }
        }
    }

    for (id, sink) in sinks.drain() {
        warn!("Sink {:?} still open at shutdown", id);
        close_sink(id, sink, &mut stats);
    }

    info!(
        "Flush thread stopped, {} entries ({} bytes) written",
        stats.entries_written, stats.bytes_written
    );

    stats
}

fn close_sink(id: SinkId, mut sink: Sink, stats: &mut FlushStats) {
    if let Err(e) = sink.flush() {
        warn!("Could not flush sink {:?}: {}", id, e);
    }
    stats.sinks_closed += 1;
    debug!("Closed sink {:?}", id);
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("drive_flush_{}_{}.rec", name, std::process::id()))
    }

    #[test]
    fn test_entries_written_in_order() {
        let path = temp_path("order");
        let (queue, thread) = FlushThread::spawn(16).unwrap();

        let id = SinkId(0);
        queue.submit(FlushEntry::Attach(id, Sink::open(&path).unwrap())).unwrap();
        for i in 0..5u8 {
            queue.submit(FlushEntry::Data(id, vec![i; 3])).unwrap();
        }
        queue.submit(FlushEntry::Close(id)).unwrap();
        drop(queue);

        let stats = thread.join().unwrap();
        assert_eq!(stats.entries_written, 5);
        assert_eq!(stats.bytes_written, 15);
        assert_eq!(stats.sinks_closed, 1);
        assert_eq!(stats.entries_dropped, 0);

        assert_eq!(
            std::fs::read(&path).unwrap(),
            vec![0, 0, 0, 1, 1, 1, 2, 2, 2, 3, 3, 3, 4, 4, 4]
        );
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_open_sinks_closed_at_shutdown() {
        let path = temp_path("shutdown");
        let (queue, thread) = FlushThread::spawn(4).unwrap();

        queue.submit(FlushEntry::Attach(SinkId(3), Sink::open(&path).unwrap())).unwrap();
        queue.submit(FlushEntry::Data(SinkId(3), b"abc".to_vec())).unwrap();
        queue.submit(FlushEntry::Data(SinkId(4), b"lost".to_vec())).unwrap();
        drop(queue);

        let stats = thread.join().unwrap();
        assert_eq!(stats.sinks_closed, 1);
        assert_eq!(stats.entries_lost, 1);
        assert_eq!(std::fs::read(&path).unwrap(), b"abc");
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_full_queue_drops_data() {
        // Build the queue without a writer so nothing is consumed
        let (sender, receiver) = channel::bounded(2);
        let queue = FlushQueue {
            sender,
            dropped: Arc::new(AtomicU64::new(0)),
        };

        assert_eq!(queue.submit(FlushEntry::Data(SinkId(0), vec![1])), Ok(()));
        assert_eq!(queue.submit(FlushEntry::Data(SinkId(0), vec![2])), Ok(()));
        assert_eq!(
            queue.submit(FlushEntry::Data(SinkId(0), vec![3])),
            Err(PipelineError::QueueFull)
        );
        assert_eq!(queue.dropped(), 1);

        // The dropped entry never reaches the writer
        let received: Vec<_> = receiver.try_iter().collect();
        assert_eq!(received.len(), 2);
        assert!(matches!(&received[1], FlushEntry::Data(_, b) if b == &vec![2]));

        drop(receiver);
        assert_eq!(
            queue.submit(FlushEntry::Close(SinkId(0))),
            Err(PipelineError::Disconnected)
        );
    }
}
