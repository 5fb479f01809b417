///
/// adapter.rs
///
/// Bridges a CanDriver to the transmit/receive-with-timeout pair an ISO-TP
/// style transport layer expects: an async stream of inbound frames becomes a
/// bounded-wait, cancellable, single-frame receive call.
///
use std::io;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::CanDriver;
use crate::can::{CanMessage, UnifiedFrame};

/// Errors that can occur while constructing a `TransportAdapter`.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// The underlying driver failed to initialize.
    #[error("failed to initialize CAN driver: {0}")]
    DriverInit(#[source] io::Error),
}

/// Wraps a started driver and adapts it to the transport layer's call shape.
pub struct TransportAdapter<D: CanDriver> {
    driver: D,
    rx: mpsc::Receiver<UnifiedFrame>,
    cancel: CancellationToken,
}

impl<D: CanDriver> TransportAdapter<D> {
    /// Initializes and starts `driver`, capturing its receive channel and
    /// cancellation token. Performs exactly one init/start pair, no retries.
    pub fn new(mut driver: D) -> Result<Self, AdapterError> {
        driver.init().map_err(AdapterError::DriverInit)?;
        driver.start();
        let rx = driver.rx_chan();
        let cancel = driver.cancellation();
        tracing::info!("transport adapter created, driver started");
        Ok(Self { driver, rx, cancel })
    }

    /// Stops the driver. Consumes the adapter, so a stopped adapter cannot be
    /// closed again or asked for further frames.
    pub fn close(mut self) {
        tracing::info!("closing transport adapter");
        self.driver.stop();
    }

    /// Forwards one message to the driver. `None` is a silent no-op. A write
    /// failure is logged and not returned: the transport layer's transmit
    /// hook has no error slot, and it treats transport hiccups as retryable.
    pub async fn transmit(&mut self, msg: Option<&CanMessage>) {
        let Some(msg) = msg else { return };
        if let Err(e) = self.driver.write(msg.arbitration_id, &msg.data).await {
            tracing::error!("failed to send frame id={:#X}: {}", msg.arbitration_id, e);
        }
    }

    /// Waits up to `timeout_secs` for one inbound frame.
    ///
    /// A timeout of zero or less polls: if the driver is already cancelled or
    /// no frame is queued, returns `None` without waiting. A positive timeout
    /// races shutdown, the deadline and frame arrival, returning `None` on
    /// the first two. Cancellation takes priority over a frame that is ready
    /// at the same moment, so a stopped driver never re-delivers buffered
    /// frames. A closed channel reads as "no frame", not as an error.
    pub async fn receive(&mut self, timeout_secs: f64) -> Option<CanMessage> {
        if !(timeout_secs > 0.0) {
            if self.cancel.is_cancelled() {
                return None;
            }
            return match self.rx.try_recv() {
                Ok(frame) => translate(frame),
                Err(_) => None,
            };
        }

        let timeout = Duration::try_from_secs_f64(timeout_secs).unwrap_or(Duration::MAX);
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => None,
            frame = self.rx.recv() => frame.and_then(translate),
            _ = tokio::time::sleep(timeout) => None,
        }
    }
}

/// Converts a driver-level frame into a protocol-facing message owning a
/// fresh copy of the payload.
///
/// A negative declared length marks the frame as corrupt and drops it. A
/// length beyond the buffer is a data-integrity warning and truncates.
fn translate(frame: UnifiedFrame) -> Option<CanMessage> {
    if frame.dlc < 0 {
        return None;
    }

    let mut len = frame.dlc as usize;
    if len > frame.data.len() {
        tracing::warn!(
            "frame id={:#X} declares dlc {} beyond the {}-byte payload buffer, truncating",
            frame.id,
            frame.dlc,
            frame.data.len(),
        );
        len = frame.data.len();
    }

    Some(CanMessage {
        arbitration_id: frame.id,
        dlc: len,
        data: frame.data[..len].to_vec(),
        extended_id: false,
        is_fd: frame.is_fd,
        bitrate_switch: false,
    })
}
