//! Timing, cancellation and round-trip behavior of the transport adapter
//! running against the mock driver.

use std::time::{Duration, Instant};

use canbridge::CanDriver;
use canbridge::adapter::TransportAdapter;
use canbridge::can::CanMessage;
use canbridge::mock_can::MockCan;

#[tokio::test]
async fn poll_on_idle_driver_returns_none_immediately() {
    let mut adapter = TransportAdapter::new(MockCan::new()).unwrap();

    let start = Instant::now();
    assert_eq!(adapter.receive(0.0).await, None);
    assert!(start.elapsed() < Duration::from_millis(50));
}

#[tokio::test]
async fn poll_returns_already_queued_frame() {
    let bus = MockCan::new();
    bus.inject_rx(0x123, 3, &[0x11, 0x22, 0x33], true);

    let mut adapter = TransportAdapter::new(bus).unwrap();
    let msg = adapter.receive(0.0).await.expect("frame was queued");

    assert_eq!(msg.arbitration_id, 0x123);
    assert_eq!(msg.dlc, 3);
    assert_eq!(msg.data, vec![0x11, 0x22, 0x33]);
    assert!(msg.is_fd);
    assert!(!msg.extended_id);
    assert!(!msg.bitrate_switch);
}

#[tokio::test]
async fn frames_are_delivered_in_fifo_order() {
    let bus = MockCan::new();
    for id in [0x10, 0x20, 0x30] {
        bus.inject_rx(id, 1, &[id as u8], false);
    }

    let mut adapter = TransportAdapter::new(bus).unwrap();
    for id in [0x10u32, 0x20, 0x30] {
        let msg = adapter.receive(0.0).await.unwrap();
        assert_eq!(msg.arbitration_id, id);
    }
    assert_eq!(adapter.receive(0.0).await, None);
}

#[tokio::test]
async fn timeout_fires_on_silent_bus() {
    let mut adapter = TransportAdapter::new(MockCan::new()).unwrap();

    let start = Instant::now();
    assert_eq!(adapter.receive(0.05).await, None);
    let elapsed = start.elapsed();

    assert!(elapsed >= Duration::from_millis(50), "returned early: {elapsed:?}");
    assert!(elapsed < Duration::from_millis(500), "returned late: {elapsed:?}");
}

#[tokio::test]
async fn delayed_frame_beats_timeout() {
    let bus = MockCan::new();
    bus.inject_rx_after(Duration::from_millis(20), 0x456, &[0xAB, 0xCD], false);

    let mut adapter = TransportAdapter::new(bus).unwrap();
    let start = Instant::now();
    let msg = adapter.receive(1.0).await.expect("frame arrives before the deadline");

    assert_eq!(msg.arbitration_id, 0x456);
    assert_eq!(msg.data, vec![0xAB, 0xCD]);
    assert!(start.elapsed() < Duration::from_millis(500));
}

#[tokio::test]
async fn stop_unblocks_pending_receive() {
    let bus = MockCan::new();
    let mut handle = bus.clone();
    let mut adapter = TransportAdapter::new(bus).unwrap();

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        handle.stop();
    });

    let start = Instant::now();
    assert_eq!(adapter.receive(5.0).await, None);
    assert!(start.elapsed() < Duration::from_secs(1));
}

#[tokio::test]
async fn oversized_dlc_is_truncated_to_buffer_length() {
    let payload: Vec<u8> = (0..100).collect();
    let bus = MockCan::new();
    bus.inject_rx(0x700, 200, &payload, false);

    let mut adapter = TransportAdapter::new(bus).unwrap();
    let msg = adapter.receive(0.0).await.expect("truncated, not dropped");

    assert_eq!(msg.dlc, 64);
    assert_eq!(msg.data, payload[..64].to_vec());
}

#[tokio::test]
async fn negative_dlc_frame_is_dropped() {
    let bus = MockCan::new();
    bus.inject_rx(0x701, -1, &[1, 2, 3], false);

    let mut adapter = TransportAdapter::new(bus).unwrap();
    assert_eq!(adapter.receive(0.0).await, None);
}

#[tokio::test]
async fn receive_after_stop_never_redelivers() {
    let bus = MockCan::new();
    let mut handle = bus.clone();
    bus.inject_rx(0x1, 1, &[0x01], false);
    bus.inject_rx(0x2, 1, &[0x02], false);

    let mut adapter = TransportAdapter::new(bus).unwrap();
    handle.stop();

    let start = Instant::now();
    assert_eq!(adapter.receive(0.0).await, None);
    assert_eq!(adapter.receive(0.05).await, None);
    assert_eq!(adapter.receive(5.0).await, None);
    assert!(start.elapsed() < Duration::from_secs(1));
}

#[tokio::test]
async fn transmit_none_is_a_noop() {
    let mut adapter = TransportAdapter::new(MockCan::new()).unwrap();
    adapter.transmit(None).await;
    adapter.close();
}

#[tokio::test]
async fn responder_echo_round_trip() {
    let bus = MockCan::new();
    let ecu = bus.clone();
    bus.set_responder(move |id, data| {
        ecu.inject_rx(id + 8, data.len() as i32, &data, false);
    });

    let mut adapter = TransportAdapter::new(bus).unwrap();
    let request = CanMessage::new(0x7E0, &[0x02, 0x10, 0x01]);
    adapter.transmit(Some(&request)).await;

    let reply = adapter.receive(1.0).await.expect("responder echoes the write");
    assert_eq!(reply.arbitration_id, 0x7E8);
    assert_eq!(reply.data, vec![0x02, 0x10, 0x01]);
}

#[tokio::test]
async fn panicking_responder_does_not_block_transmit() {
    let bus = MockCan::new();
    bus.set_responder(|_, _| panic!("simulated ECU fault"));

    let mut adapter = TransportAdapter::new(bus).unwrap();
    adapter.transmit(Some(&CanMessage::new(0x7E0, &[0x3E, 0x00]))).await;

    // The fault stays confined to the responder's task; nothing comes back.
    assert_eq!(adapter.receive(0.05).await, None);
}
