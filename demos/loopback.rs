use canbridge::adapter::TransportAdapter;
use canbridge::can::CanMessage;
use canbridge::mock_can::MockCan;

#[tokio::main]
async fn main() {
    let bus = MockCan::new();

    // Play the part of a diagnostic ECU: echo every request back on id + 8.
    let ecu = bus.clone();
    bus.set_responder(move |id, data| {
        ecu.inject_rx(id + 8, data.len() as i32, &data, false);
    });

    let mut adapter = TransportAdapter::new(bus).expect("mock driver always initializes");

    let request = CanMessage::new(0x7E0, &[0x02, 0x10, 0x01]);
    println!("-> ID=0x{:X} {:02X?}", request.arbitration_id, request.data);
    adapter.transmit(Some(&request)).await;

    match adapter.receive(1.0).await {
        Some(reply) => println!("<- ID=0x{:X} {:02X?}", reply.arbitration_id, reply.data),
        None => println!("no reply within timeout"),
    }

    adapter.close();
}
