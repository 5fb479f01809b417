///
/// mock_can.rs
///
/// In-memory CanDriver for tests and demos. Supports frame injection,
/// immediate or delayed, and an optional responder that simulates an ECU
/// reacting to written frames.
///
use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::CanDriver;
use crate::can::UnifiedFrame;

/// Depth of the inbound frame queue.
const RX_QUEUE_DEPTH: usize = 16;

type Responder = Arc<dyn Fn(u32, Vec<u8>) + Send + Sync>;

/// A simulated CAN/CAN-FD bus.
///
/// Cloning yields another handle to the same bus, so a test can keep
/// injecting frames after the adapter has taken ownership of the driver.
#[derive(Clone)]
pub struct MockCan {
    shared: Arc<Shared>,
}

struct Shared {
    tx: Mutex<Option<mpsc::Sender<UnifiedFrame>>>,
    rx: Mutex<Option<mpsc::Receiver<UnifiedFrame>>>,
    cancel: CancellationToken,
    responder: Mutex<Option<Responder>>,
}

impl MockCan {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel(RX_QUEUE_DEPTH);
        Self {
            shared: Arc::new(Shared {
                tx: Mutex::new(Some(tx)),
                rx: Mutex::new(Some(rx)),
                cancel: CancellationToken::new(),
                responder: Mutex::new(None),
            }),
        }
    }

    /// Registers a callback that plays the part of an ECU on the far side of
    /// the bus: every written frame is handed to it, off the writer's task.
    pub fn set_responder<F>(&self, responder: F)
    where
        F: Fn(u32, Vec<u8>) + Send + Sync + 'static,
    {
        *self.shared.responder.lock().unwrap() = Some(Arc::new(responder));
    }

    /// Pushes one frame onto the receive queue. `dlc` is taken verbatim and
    /// may disagree with the payload length, which is how corrupt driver
    /// data is simulated. The push is abandoned silently once the driver is
    /// stopped; a full queue drops the frame with a warning.
    pub fn inject_rx(&self, id: u32, dlc: i32, data: &[u8], is_fd: bool) {
        if self.shared.cancel.is_cancelled() {
            return;
        }
        let Some(tx) = self.shared.tx.lock().unwrap().clone() else {
            return;
        };

        let mut frame = UnifiedFrame::new(id, data, is_fd);
        frame.dlc = dlc;
        if let Err(mpsc::error::TrySendError::Full(_)) = tx.try_send(frame) {
            tracing::warn!("mock rx queue full, dropping frame id={:#X}", id);
        }
    }

    /// Schedules an `inject_rx` after `delay`, detached from the calling
    /// task. Convenient for simulating slow ECU responses in timing tests.
    pub fn inject_rx_after(&self, delay: Duration, id: u32, data: &[u8], is_fd: bool) {
        let bus = self.clone();
        let data = data.to_vec();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            bus.inject_rx(id, data.len() as i32, &data, is_fd);
        });
    }
}

impl Default for MockCan {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CanDriver for MockCan {
    fn init(&mut self) -> io::Result<()> {
        Ok(())
    }

    fn start(&mut self) {}

    fn stop(&mut self) {
        self.shared.cancel.cancel();
        // Dropping the sender closes the channel for the adapter's reader.
        self.shared.tx.lock().unwrap().take();
    }

    fn rx_chan(&mut self) -> mpsc::Receiver<UnifiedFrame> {
        self.shared
            .rx
            .lock()
            .unwrap()
            .take()
            .expect("receive channel already handed out")
    }

    fn cancellation(&self) -> CancellationToken {
        self.shared.cancel.clone()
    }

    async fn write(&mut self, id: u32, data: &[u8]) -> io::Result<()> {
        let responder = self.shared.responder.lock().unwrap().clone();
        if let Some(responder) = responder {
            // The responder gets its own copy and runs on its own task, so
            // the writer can reuse its buffer immediately and cannot
            // deadlock against the queue the responder may inject into.
            let data = data.to_vec();
            tokio::spawn(async move { responder(id, data) });
        }
        Ok(())
    }
}
