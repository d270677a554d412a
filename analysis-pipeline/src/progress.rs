//! Progress emitter - the streamed phase-event protocol
//!
//! Converts internal stage transitions into an ordered, push-only event
//! sequence. The sender also keeps an append-only log which becomes the
//! run's phase-event record; the pipeline is the single producer.

use common::{Phase, PhaseEvent};
use std::sync::Mutex;
use tokio::sync::mpsc;
use tracing::debug;

/// Buffer size for the phase-event channel
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Single-producer phase-event emitter
pub struct ProgressSender {
    tx: mpsc::Sender<PhaseEvent>,
    log: Mutex<Vec<PhaseEvent>>,
}

impl ProgressSender {
    /// Create an emitter and the receiver the caller consumes
    pub fn channel() -> (Self, mpsc::Receiver<PhaseEvent>) {
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        (
            Self {
                tx,
                log: Mutex::new(Vec::new()),
            },
            rx,
        )
    }

    /// Emit one phase event: stamp it, log it, push it to the consumer.
    /// A dropped receiver only silences the stream; the run continues.
    pub async fn emit(&self, event: PhaseEvent) {
        if let Ok(mut log) = self.log.lock() {
            log.push(event.clone());
        }
        if self.tx.send(event).await.is_err() {
            debug!("phase-event receiver dropped, continuing without stream");
        }
    }

    pub async fn emit_phase(&self, phase: Phase) {
        self.emit(PhaseEvent::now(phase)).await;
    }

    /// Drain the accumulated event log (called once at run finalization)
    pub fn take_log(&self) -> Vec<PhaseEvent> {
        self.log.lock().map(|mut log| std::mem::take(&mut *log)).unwrap_or_default()
    }
}
