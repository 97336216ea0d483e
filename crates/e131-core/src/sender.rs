use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::address::Destination;
use crate::error::{Error, InvalidArgument};
use crate::packet::{Packet, PacketOption, encode};
use crate::transport::Transport;

/// Number of terminated packets sent when a stream ends.
pub const TERMINATE_REPEAT: usize = 3;

/// Outbound stream of one universe to one destination.
///
/// The packet template and its sequence number sit behind a single lock, so
/// fill-stamp-encode-send-increment runs as one critical section even when
/// several threads share a sender.
pub struct Sender<T> {
    transport: T,
    destination: Destination,
    packet: Mutex<Packet>,
}

impl<T: Transport> Sender<T> {
    pub fn new(transport: T, destination: Destination, packet: Packet) -> Self {
        Self {
            transport,
            destination,
            packet: Mutex::new(packet),
        }
    }

    pub fn destination(&self) -> &Destination {
        &self.destination
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Sequence number the next packet will carry.
    pub fn next_sequence(&self) -> u8 {
        self.lock().sequence_number()
    }

    /// Copy of the current template, e.g. for dumping.
    pub fn snapshot(&self) -> Packet {
        self.lock().clone()
    }

    /// Sends `levels` starting at channel 1; channels past `levels` keep
    /// their previous values.
    pub fn send(&self, levels: &[u8]) -> Result<usize, Error> {
        self.send_with(|packet| {
            let channels = packet.channels_mut();
            let target = channels
                .get_mut(..levels.len())
                .ok_or(InvalidArgument::ChannelCount(levels.len()))?;
            target.copy_from_slice(levels);
            Ok(())
        })
    }

    /// Applies `update` to a copy of the template and sends it, all under
    /// the lock.
    ///
    /// The template (levels, options and sequence number) is only replaced
    /// once the transport accepted the datagram.
    pub fn send_with<F>(&self, update: F) -> Result<usize, Error>
    where
        F: FnOnce(&mut Packet) -> Result<(), InvalidArgument>,
    {
        let mut template = self.lock();
        let mut packet = template.clone();
        update(&mut packet)?;
        let bytes = encode(&packet);
        let sent = self.transport.send(&bytes, &self.destination)?;
        log::trace!(
            "tx: universe {} seq {} -> {}",
            packet.universe(),
            packet.sequence_number(),
            self.destination
        );
        let next = packet.sequence_number().wrapping_add(1);
        packet.set_sequence_number(next);
        *template = packet;
        Ok(sent)
    }

    /// Marks the stream as terminated and sends it [`TERMINATE_REPEAT`] times.
    pub fn terminate(&self) -> Result<(), Error> {
        for _ in 0..TERMINATE_REPEAT {
            self.send_with(|packet| {
                packet.set_option(PacketOption::Terminated, true);
                Ok(())
            })?;
        }
        log::debug!("tx: terminated stream to {}", self.destination);
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, Packet> {
        self.packet.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::net::{Ipv4Addr, SocketAddr};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex};
    use std::thread;

    use super::Sender;
    use crate::address::Destination;
    use crate::error::{Error, InvalidArgument};
    use crate::packet::{PacketBuilder, PacketOption, decode};
    use crate::transport::{Transport, TransportError};

    #[derive(Default)]
    struct Recording {
        sent: Mutex<Vec<Vec<u8>>>,
        unreachable: AtomicBool,
    }

    impl Transport for Arc<Recording> {
        fn bind(&mut self, _port: u16) -> Result<(), TransportError> {
            Ok(())
        }

        fn join_multicast(&self, _universe: u16, _iface: Ipv4Addr) -> Result<(), TransportError> {
            Ok(())
        }

        fn send(&self, bytes: &[u8], _dest: &Destination) -> Result<usize, TransportError> {
            if self.unreachable.load(Ordering::SeqCst) {
                return Err(io::Error::from(io::ErrorKind::ConnectionRefused).into());
            }
            self.sent.lock().unwrap().push(bytes.to_vec());
            Ok(bytes.len())
        }

        fn recv(&self, _buf: &mut [u8]) -> Result<(usize, SocketAddr), TransportError> {
            Err(TransportError::NotBound)
        }
    }

    fn sender(channels: usize) -> (Sender<Arc<Recording>>, Arc<Recording>) {
        let recording = Arc::new(Recording::default());
        let packet = PacketBuilder::new(1, channels).build().unwrap();
        let dest = Destination::multicast(1, 5568).unwrap();
        (Sender::new(recording.clone(), dest, packet), recording)
    }

    #[test]
    fn increments_sequence_after_each_send() {
        let (sender, recording) = sender(4);
        assert_eq!(sender.send(&[1, 2]).unwrap(), 130);
        sender.send(&[3]).unwrap();

        let sent = recording.sent.lock().unwrap();
        let first = decode(&sent[0]).unwrap();
        let second = decode(&sent[1]).unwrap();
        assert_eq!(first.sequence_number(), 0);
        assert_eq!(first.channels(), &[1, 2, 0, 0]);
        assert_eq!(second.sequence_number(), 1);
        assert_eq!(second.channels(), &[3, 2, 0, 0]);
        assert_eq!(sender.next_sequence(), 2);
    }

    #[test]
    fn too_many_levels_is_rejected_without_sending() {
        let (sender, recording) = sender(2);
        let err = sender.send(&[1, 2, 3]).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidArgument(InvalidArgument::ChannelCount(3))
        ));
        assert!(recording.sent.lock().unwrap().is_empty());
        assert_eq!(sender.next_sequence(), 0);
    }

    #[test]
    fn failed_send_leaves_template_untouched() {
        let (sender, recording) = sender(2);
        sender.send(&[1, 1]).unwrap();
        recording.unreachable.store(true, Ordering::SeqCst);

        let err = sender.send(&[9, 9]).unwrap_err();
        assert!(matches!(err, Error::Transport(TransportError::Io(_))));
        assert_eq!(sender.next_sequence(), 1);
        assert_eq!(sender.snapshot().channels(), &[1, 1]);

        assert!(sender.terminate().is_err());
        assert!(!sender.snapshot().option(PacketOption::Terminated));

        recording.unreachable.store(false, Ordering::SeqCst);
        sender.send(&[2, 2]).unwrap();
        let sent = recording.sent.lock().unwrap();
        let seqs: Vec<u8> = sent
            .iter()
            .map(|bytes| decode(bytes).unwrap().sequence_number())
            .collect();
        assert_eq!(seqs, vec![0, 1]);
        assert!(!decode(&sent[1]).unwrap().option(PacketOption::Terminated));
    }

    #[test]
    fn terminate_sends_flagged_packets() {
        let (sender, recording) = sender(1);
        sender.terminate().unwrap();
        let sent = recording.sent.lock().unwrap();
        assert_eq!(sent.len(), 3);
        assert!(
            sent.iter()
                .all(|bytes| decode(bytes).unwrap().option(PacketOption::Terminated))
        );
    }

    #[test]
    fn concurrent_senders_never_reuse_a_sequence_number() {
        let (sender, recording) = sender(1);
        let sender = Arc::new(sender);
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let sender = Arc::clone(&sender);
                thread::spawn(move || {
                    for _ in 0..50 {
                        sender.send(&[7]).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let sent = recording.sent.lock().unwrap();
        let mut seqs: Vec<u8> = sent
            .iter()
            .map(|bytes| decode(bytes).unwrap().sequence_number())
            .collect();
        assert_eq!(seqs.len(), 200);
        seqs.sort_unstable();
        seqs.dedup();
        assert_eq!(seqs.len(), 200);
    }
}
