use std::net::Ipv4Addr;
use std::time::Duration;

use e131_core::{
    Destination, PacketBuilder, ReceiveOutcome, Receiver, Sender, Transport, UdpTransport,
};

fn bound_receiver() -> (Receiver<UdpTransport>, u16) {
    let mut transport = UdpTransport::open().with_read_timeout(Duration::from_secs(5));
    transport.bind(0).expect("bind receiver");
    let port = transport.local_addr().expect("local addr").port();
    (Receiver::new(transport), port)
}

fn sender_to(port: u16, universe: u16) -> Sender<UdpTransport> {
    let mut transport = UdpTransport::open();
    transport.ensure_bound().expect("bind sender");
    let dest = Destination::unicast(&Ipv4Addr::LOCALHOST.to_string(), port).expect("dest");
    let packet = PacketBuilder::new(universe, 8)
        .source_name("loopback")
        .build()
        .expect("packet");
    Sender::new(transport, dest, packet)
}

#[test]
fn sent_packets_arrive_in_order() {
    let (mut receiver, port) = bound_receiver();
    let sender = sender_to(port, 12);

    for level in 1..=3u8 {
        sender.send(&[level; 8]).expect("send");
    }
    for expected in 1..=3u8 {
        let received = receiver.next_accepted().expect("recv");
        assert_eq!(received.packet.universe(), 12);
        assert_eq!(received.packet.sequence_number(), expected - 1);
        assert_eq!(received.packet.channels(), &[expected; 8]);
        assert_eq!(received.packet.frame.source_name.as_str(), "loopback");
    }

    let summary = receiver.summary();
    assert_eq!(summary.streams.len(), 1);
    assert_eq!(summary.streams[0].stats.accepted, 3);
}

#[test]
fn garbage_datagrams_do_not_stop_the_stream() {
    let (mut receiver, port) = bound_receiver();
    let sender = sender_to(port, 1);
    let dest = *sender.destination();

    sender.transport().send(b"not e1.31", &dest).expect("send garbage");
    sender.send(&[9; 8]).expect("send packet");

    assert!(matches!(
        receiver.recv_once().expect("recv"),
        ReceiveOutcome::Invalid(_)
    ));
    let received = receiver.next_accepted().expect("recv");
    assert_eq!(received.packet.channels(), &[9; 8]);
    assert_eq!(receiver.summary().invalid, 1);
}
