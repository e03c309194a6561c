//! Transaction multiplexer: allocates transaction numbers and waits for the
//! response belonging to a specific one, transparently servicing unrelated
//! traffic that arrives in the meantime ([1] section 1.5).

use std::sync::atomic::{AtomicU8, Ordering};
use std::time::{Duration, Instant};

use super::constant::{MSG_HELLO_CMD, PROTO_PAKCTRL};
use super::error::Error;
use super::framer;
use super::header::Header;
use super::message::{self, MessageBody};
use super::transport::Transport;

/// Owns the 8-bit, wraparound transaction-number counter for one client.
/// Not a module-global: each [`crate::client::Client`] holds its own.
#[derive(Debug, Default)]
pub struct TranCounter(AtomicU8);

impl TranCounter {
    pub fn new() -> TranCounter {
        TranCounter(AtomicU8::new(0))
    }

    /// Allocate the next transaction number, wrapping silently at 256.
    pub fn next(&self) -> u8 {
        self.0.fetch_add(1, Ordering::Relaxed)
    }
}

/// Wait for the response to transaction `tran_nbr` from `peer_node_id`,
/// addressed to `my_node_id`.
///
/// Packets for a different (src, dst) pair are silently discarded. An
/// unsolicited Hello command is answered transparently and does not count
/// as the awaited response. A `PleaseWait` response extends the deadline by
/// the peer's requested `WaitSec` and does not count either. The initial
/// deadline is `0.9 * timeout_s` (spec §4.3 design note: the logger's own
/// timeout runs slightly longer, so an honest 1.0x budget on our side risks
/// racing it).
pub fn wait<T: Transport>(
    transport: &mut T,
    my_node_id: u16,
    peer_node_id: u16,
    tran_nbr: u8,
    timeout_s: f64,
) -> Result<(Header, MessageBody), Error> {
    let mut current_timeout = timeout_s;
    let mut deadline = Instant::now() + Duration::from_secs_f64(0.9 * timeout_s);

    loop {
        if Instant::now() >= deadline {
            return Err(Error::Timeout);
        }
        transport.set_timeout(current_timeout)?;

        let packet = match framer::recv_frame(transport) {
            Ok(p) => p,
            Err(Error::Timeout) => continue,
            Err(e) => return Err(e),
        };
        if packet.len() < 10 {
            continue;
        }
        let header = match Header::unpack(&packet[0..8]) {
            Some(h) => h,
            None => continue,
        };
        if header.dst_node_id != my_node_id || header.src_node_id != peer_node_id {
            continue;
        }

        let msg_type = packet[8];
        let this_tran = packet[9];

        if header.hi_proto_code == PROTO_PAKCTRL && msg_type == MSG_HELLO_CMD {
            let reply =
                message::build_hello_response(header.src_node_id, header.dst_node_id, this_tran, 0x00, 0x02, 1800);
            framer::send_frame(transport, &reply)?;
            continue;
        }

        if this_tran != tran_nbr {
            continue;
        }

        let body = message::decode_body(header.hi_proto_code, msg_type, &packet[8..])?;
        if let MessageBody::PleaseWait { wait_sec, .. } = body {
            current_timeout = wait_sec as f64;
            deadline += Duration::from_secs_f64(wait_sec as f64);
            continue;
        }

        return Ok((header, body));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{self, PrimitiveType, Value};
    use crate::constant::{MSG_CLOCK_RESP, MSG_PLEASE_WAIT, PROTO_BMP5};
    use std::collections::VecDeque;

    struct MockTransport {
        inbound: VecDeque<u8>,
        outbound: Vec<u8>,
    }

    impl MockTransport {
        fn new() -> Self {
            MockTransport {
                inbound: VecDeque::new(),
                outbound: Vec::new(),
            }
        }

        fn push_frame(&mut self, packet: &[u8]) {
            let mut sink = MockTransport::new();
            framer::send_frame(&mut sink, packet).unwrap();
            self.inbound.extend(sink.outbound);
        }
    }

    impl Transport for MockTransport {
        fn send(&mut self, bytes: &[u8]) -> Result<(), Error> {
            self.outbound.extend_from_slice(bytes);
            Ok(())
        }
        fn read_byte(&mut self) -> Result<u8, Error> {
            self.inbound.pop_front().ok_or(Error::Timeout)
        }
        fn set_timeout(&mut self, _secs: f64) -> Result<(), Error> {
            Ok(())
        }
        fn close(&mut self) -> Result<(), Error> {
            Ok(())
        }
    }

    fn clock_response_packet(dst: u16, src: u16, tran_nbr: u8) -> Vec<u8> {
        let hdr = Header::default_for(dst, src, PROTO_BMP5);
        let body = codec::encode(
            &[
                PrimitiveType::Byte,
                PrimitiveType::Byte,
                PrimitiveType::Byte,
                PrimitiveType::NSec,
            ],
            &[
                Value::U8(MSG_CLOCK_RESP),
                Value::U8(tran_nbr),
                Value::U8(MSG_CLOCK_RESP),
                Value::Time(1, 0),
            ],
        )
        .unwrap();
        let mut pkt = hdr.pack().to_vec();
        pkt.extend_from_slice(&body);
        pkt
    }

    #[test]
    fn returns_matching_transaction() {
        let mut t = MockTransport::new();
        t.push_frame(&clock_response_packet(0x002, 0x001, 5));

        let (_, body) = wait(&mut t, 0x002, 0x001, 5, 2.0).unwrap();
        assert_eq!(
            body,
            MessageBody::ClockResponse {
                resp_code: MSG_CLOCK_RESP,
                time: (1, 0),
            }
        );
    }

    #[test]
    fn discards_unrelated_peer_then_returns_match() {
        let mut t = MockTransport::new();
        t.push_frame(&clock_response_packet(0x002, 0x999, 5)); // wrong src
        t.push_frame(&clock_response_packet(0x002, 0x001, 5));

        let (_, body) = wait(&mut t, 0x002, 0x001, 5, 2.0).unwrap();
        assert!(matches!(body, MessageBody::ClockResponse { .. }));
    }

    #[test]
    fn extends_deadline_on_please_wait() {
        let mut t = MockTransport::new();
        let hdr = Header::default_for(0x002, 0x001, PROTO_BMP5);
        let body = codec::encode(
            &[
                PrimitiveType::Byte,
                PrimitiveType::Byte,
                PrimitiveType::Byte,
                PrimitiveType::UInt2,
            ],
            &[
                Value::U8(MSG_PLEASE_WAIT),
                Value::U8(7),
                Value::U8(MSG_CLOCK_RESP),
                Value::U16(1),
            ],
        )
        .unwrap();
        let mut pkt = hdr.pack().to_vec();
        pkt.extend_from_slice(&body);
        t.push_frame(&pkt);
        t.push_frame(&clock_response_packet(0x002, 0x001, 7));

        let (_, body) = wait(&mut t, 0x002, 0x001, 7, 1.0).unwrap();
        assert!(matches!(body, MessageBody::ClockResponse { .. }));
    }

    #[test]
    fn answers_unsolicited_hello_and_keeps_waiting() {
        let mut t = MockTransport::new();
        let hello = message::build_hello_cmd(0x002, 0x001, 3, 0x00, 0x02, 1800);
        t.push_frame(&hello);
        t.push_frame(&clock_response_packet(0x002, 0x001, 9));

        let (_, body) = wait(&mut t, 0x002, 0x001, 9, 2.0).unwrap();
        assert!(matches!(body, MessageBody::ClockResponse { .. }));
        // a Hello Response should have been sent back transparently
        assert!(!t.outbound.is_empty());
    }

    #[test]
    fn tran_counter_wraps() {
        let counter = TranCounter::new();
        for i in 0..256 {
            assert_eq!(counter.next(), i as u8);
        }
        assert_eq!(counter.next(), 0);
    }
}
