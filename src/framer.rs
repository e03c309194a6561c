//! Byte stuffing, framing delimiters, signature computation and
//! verification, and nullifier generation ([1] section 1.4).

use super::constant::{FRAME, QUOTE};
use super::error::Error;
use super::transport::Transport;
use log::trace;

/// Compute the 16-bit PakBus signature of `buf`, seeded with `seed`
/// (default `0xAAAA`). A valid received packet is one whose signature over
/// `header || body || nullifier` is zero.
///
/// The shift-and-carry steps below look unusual but are intentional; do not
/// "clean up" this algorithm (spec §9 design note).
pub fn signature(buf: &[u8], seed: u16) -> u16 {
    let mut sig = seed as u32;
    for &x in buf {
        let j = sig;
        sig = (sig << 1) & 0x1FF;
        if sig >= 0x100 {
            sig += 1;
        }
        sig = ((sig + (j >> 8) + x as u32) & 0xFF) | (j << 8 & 0xFF00);
    }
    sig as u16
}

/// Seed used for whole-packet signature computation.
pub const SIGNATURE_SEED: u16 = 0xAAAA;

/// Compute the two-byte nullifier that, appended to a packet already
/// carrying signature `sig0`, makes the signature of the whole packet zero.
pub fn nullifier(sig0: u16) -> [u8; 2] {
    let mut sig = sig0;
    let mut out = [0u8; 2];
    for b in out.iter_mut() {
        // Advance by one step using the previously emitted nullifier byte
        // as input (there is none for the first byte, so this step is a
        // zero-length "advance" via `signature`, matching the reference
        // `calcSigFor(nulb, sig)` call with `nulb` empty on the first
        // iteration).
        let sig2 = (sig as u32) << 1 & 0x1FF;
        let sig2 = if sig2 >= 0x100 { sig2 + 1 } else { sig2 };
        let emitted = ((0x100u32.wrapping_sub(sig2 + ((sig as u32) >> 8))) & 0xFF) as u8;
        *b = emitted;
        sig = signature(&[emitted], sig);
    }
    out
}

/// Quote `\xBC` and `\xBD` bytes for transmission inside a frame.
pub fn quote(buf: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(buf.len());
    for &b in buf {
        match b {
            QUOTE => {
                out.push(QUOTE);
                out.push(0xDC);
            }
            FRAME => {
                out.push(QUOTE);
                out.push(0xDD);
            }
            _ => out.push(b),
        }
    }
    out
}

/// Reverse [`quote`]. Fails if a `QUOTE` byte is not followed by `0xDC` or
/// `0xDD`, or a raw `FRAME` byte appears unescaped.
pub fn unquote(buf: &[u8]) -> Result<Vec<u8>, Error> {
    let mut out = Vec::with_capacity(buf.len());
    let mut i = 0;
    while i < buf.len() {
        match buf[i] {
            QUOTE => {
                let escape = buf.get(i + 1).copied();
                match escape {
                    Some(0xDC) => out.push(QUOTE),
                    Some(0xDD) => out.push(FRAME),
                    _ => return Err(Error::FrameCorrupt),
                }
                i += 2;
            }
            FRAME => return Err(Error::FrameCorrupt),
            b => {
                out.push(b);
                i += 1;
            }
        }
    }
    Ok(out)
}

/// Frame, quote, and send `packet` (unquoted, unframed header + body).
pub fn send_frame<T: Transport>(transport: &mut T, packet: &[u8]) -> Result<(), Error> {
    let sig = signature(packet, SIGNATURE_SEED);
    let null = nullifier(sig);
    let mut with_null = packet.to_vec();
    with_null.extend_from_slice(&null);

    let framed = quote(&with_null);
    trace!("send_frame: {} raw bytes, {} framed bytes", packet.len(), framed.len() + 2);

    let mut out = Vec::with_capacity(framed.len() + 2);
    out.push(FRAME);
    out.extend_from_slice(&framed);
    out.push(FRAME);
    transport.send(&out)
}

/// Receive, unquote, and signature-verify the next frame, returning the
/// packet with its trailing signature nullifier stripped.
pub fn recv_frame<T: Transport>(transport: &mut T) -> Result<Vec<u8>, Error> {
    // Read until the first FRAME byte.
    loop {
        if transport.read_byte()? == FRAME {
            break;
        }
    }
    // Skip any run of back-to-back FRAME bytes.
    let mut byte = loop {
        let b = transport.read_byte()?;
        if b != FRAME {
            break b;
        }
    };

    let mut raw = Vec::new();
    while byte != FRAME {
        raw.push(byte);
        byte = transport.read_byte()?;
    }

    let unquoted = unquote(&raw)?;
    if signature(&unquoted, SIGNATURE_SEED) != 0 {
        return Err(Error::FrameCorrupt);
    }
    if unquoted.len() < 2 {
        return Err(Error::FrameCorrupt);
    }
    let body_len = unquoted.len() - 2;
    trace!("recv_frame: {} raw bytes", body_len);
    Ok(unquoted[..body_len].to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    struct MockTransport {
        inbound: VecDeque<u8>,
        outbound: Vec<u8>,
    }

    impl MockTransport {
        fn new(inbound: &[u8]) -> Self {
            MockTransport {
                inbound: inbound.iter().copied().collect(),
                outbound: Vec::new(),
            }
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

    #[test]
    fn quote_contains_no_frame_byte() {
        for b in 0u8..=255 {
            let buf = [b, 0xBD, 0xBC, b];
            let quoted = quote(&buf);
            assert!(!quoted.contains(&FRAME));
        }
    }

    #[test]
    fn unquote_quote_round_trip() {
        for seed in 0u8..=255 {
            let buf: Vec<u8> = (0..16).map(|i| seed.wrapping_add(i)).collect();
            let quoted = quote(&buf);
            let unquoted = unquote(&quoted).unwrap();
            assert_eq!(unquoted, buf);
        }
    }

    #[test]
    fn nullifier_zeroes_signature() {
        for seed in 0u16..500 {
            let packet = [0x01, 0x02, (seed & 0xFF) as u8, (seed >> 8) as u8];
            let sig0 = signature(&packet, SIGNATURE_SEED);
            let null = nullifier(sig0);
            let mut full = packet.to_vec();
            full.extend_from_slice(&null);
            assert_eq!(signature(&full, SIGNATURE_SEED), 0);
        }
    }

    #[test]
    fn framing_round_trip_scenario() {
        // §8 scenario 1: body 0xBD 0xBC 0x01 0x02.
        let body = [0xBDu8, 0xBC, 0x01, 0x02];
        let sig0 = signature(&body, SIGNATURE_SEED);
        let null = nullifier(sig0);
        let mut with_null = body.to_vec();
        with_null.extend_from_slice(&null);

        let quoted = quote(&with_null);
        // Quoting: 0xBD -> 0xBC 0xDD, 0xBC -> 0xBC 0xDC (leading two bytes).
        assert_eq!(&quoted[0..4], &[0xBC, 0xDD, 0xBC, 0xDC]);

        let mut stream = Vec::new();
        stream.push(FRAME);
        stream.extend_from_slice(&quoted);
        stream.push(FRAME);

        let mut transport = MockTransport::new(&stream);
        let recovered = recv_frame(&mut transport).unwrap();
        assert_eq!(recovered, body);
    }

    #[test]
    fn send_then_recv_round_trip() {
        let packet = b"hello pakbus".to_vec();
        let mut transport = MockTransport::new(&[]);
        send_frame(&mut transport, &packet).unwrap();

        let mut loopback = MockTransport::new(&transport.outbound);
        let recovered = recv_frame(&mut loopback).unwrap();
        assert_eq!(recovered, packet);
    }

    #[test]
    fn recv_skips_back_to_back_frame_bytes() {
        let packet = b"abc".to_vec();
        let mut transport = MockTransport::new(&[]);
        send_frame(&mut transport, &packet).unwrap();

        let mut stream = vec![FRAME, FRAME, FRAME];
        stream.extend_from_slice(&transport.outbound);
        let mut loopback = MockTransport::new(&stream);
        let recovered = recv_frame(&mut loopback).unwrap();
        assert_eq!(recovered, packet);
    }

    #[test]
    fn bad_quoting_is_frame_corrupt() {
        // A QUOTE byte not followed by 0xDC/0xDD.
        let err = unquote(&[QUOTE, 0x01]).unwrap_err();
        assert!(matches!(err, Error::FrameCorrupt));
    }

    #[test]
    fn nonzero_signature_is_frame_corrupt() {
        let mut stream = vec![FRAME];
        stream.extend_from_slice(&[0x01, 0x02, 0x03, 0x04]); // no valid nullifier
        stream.push(FRAME);
        let mut transport = MockTransport::new(&stream);
        let err = recv_frame(&mut transport).unwrap_err();
        assert!(matches!(err, Error::FrameCorrupt));
    }
}
