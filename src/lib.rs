pub mod adapter;
pub mod can;
pub mod mock_can;

use async_trait::async_trait;
use can::UnifiedFrame;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Capability contract any CAN/CAN-FD driver (hardware or simulated) must
/// satisfy to be wrapped by the transport adapter.
#[async_trait]
pub trait CanDriver: Send {
    /// Prepares hardware or simulation state. Called at most once, before
    /// `start`.
    fn init(&mut self) -> std::io::Result<()>;

    /// Begins delivering inbound frames. Failures past this point surface
    /// only through the cancellation token or the receive channel closing.
    fn start(&mut self);

    /// Stops delivery, cancels the token and closes the receive channel.
    fn stop(&mut self);

    /// Hands over the consumer end of the bounded inbound frame queue.
    /// Callable once per driver.
    fn rx_chan(&mut self) -> mpsc::Receiver<UnifiedFrame>;

    /// A clone of the driver's cancellation token. Fires exactly once, at
    /// `stop`, and stays set.
    fn cancellation(&self) -> CancellationToken;

    /// Sends a single frame on the bus.
    async fn write(&mut self, id: u32, data: &[u8]) -> std::io::Result<()>;
}
