use pakbus::codec::{self, PrimitiveType, Value};
use pakbus::constant::{MSG_HELLO_RESP, PROTO_BMP5, PROTO_PAKCTRL};
use pakbus::error::Error;
use pakbus::header::Header;
use pakbus::{client::Client, framer, transport::Transport};
use std::collections::VecDeque;

/// An in-memory `Transport` whose inbound byte stream is pre-loaded with a
/// sequence of complete, already-framed packets. Each PakBus request the
/// client sends is matched against the next queued response in order.
struct ScriptedTransport {
    inbound: VecDeque<u8>,
    outbound: Vec<u8>,
}

impl ScriptedTransport {
    fn new() -> Self {
        ScriptedTransport {
            inbound: VecDeque::new(),
            outbound: Vec::new(),
        }
    }

    fn queue(&mut self, packet: &[u8]) {
        let mut sink = ScriptedTransport::new();
        framer::send_frame(&mut sink, packet).unwrap();
        self.inbound.extend(sink.outbound);
    }
}

impl Transport for ScriptedTransport {
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

fn hello_response_packet(dst: u16, src: u16, tran_nbr: u8) -> Vec<u8> {
    let hdr = Header::default_for(dst, src, PROTO_PAKCTRL);
    let body = codec::encode(
        &[
            PrimitiveType::Byte,
            PrimitiveType::Byte,
            PrimitiveType::Byte,
            PrimitiveType::Byte,
            PrimitiveType::UInt2,
        ],
        &[
            Value::U8(MSG_HELLO_RESP),
            Value::U8(tran_nbr),
            Value::U8(0x01),
            Value::U8(0x03),
            Value::U16(900),
        ],
    )
    .unwrap();
    let mut pkt = hdr.pack().to_vec();
    pkt.extend_from_slice(&body);
    pkt
}

fn fileupload_response_packet(dst: u16, src: u16, tran_nbr: u8, file_data: &[u8]) -> Vec<u8> {
    let hdr = Header::default_for(dst, src, PROTO_BMP5);
    let mut body = codec::encode(
        &[
            PrimitiveType::Byte,
            PrimitiveType::Byte,
            PrimitiveType::Byte,
            PrimitiveType::UInt4,
        ],
        &[Value::U8(0x9D), Value::U8(tran_nbr), Value::U8(0), Value::U32(0)],
    )
    .unwrap();
    body.extend_from_slice(file_data);
    let mut pkt = hdr.pack().to_vec();
    pkt.extend_from_slice(&body);
    pkt
}

fn sample_tabledef_bytes() -> Vec<u8> {
    let mut raw = vec![4u8]; // FslVersion
    raw.extend(
        codec::encode(
            &[
                PrimitiveType::AsciiZ,
                PrimitiveType::UInt4,
                PrimitiveType::Byte,
                PrimitiveType::NSec,
                PrimitiveType::NSec,
            ],
            &[
                Value::Ascii(b"Public".to_vec()),
                Value::U32(0),
                Value::U8(0),
                Value::Time(0, 0),
                Value::Time(60, 0),
            ],
        )
        .unwrap(),
    );
    raw.push(PrimitiveType::Fp4.code());
    raw.extend(codec::encode(&[PrimitiveType::AsciiZ], &[Value::Ascii(b"BattV".to_vec())]).unwrap());
    raw.push(0); // no alias
    raw.extend(
        codec::encode(
            &[
                PrimitiveType::AsciiZ,
                PrimitiveType::AsciiZ,
                PrimitiveType::AsciiZ,
                PrimitiveType::UInt4,
                PrimitiveType::UInt4,
            ],
            &[
                Value::Ascii(b"Smp".to_vec()),
                Value::Ascii(b"Volts".to_vec()),
                Value::Ascii(b"Battery voltage".to_vec()),
                Value::U32(1),
                Value::U32(1),
            ],
        )
        .unwrap(),
    );
    raw.extend(codec::encode(&[PrimitiveType::UInt4], &[Value::U32(0)]).unwrap());
    raw.push(0); // field list terminator
    raw
}

/// Exercises ping, table definition retrieval (via a scripted file upload),
/// and a subsequent collect-data request against the parsed table, the
/// complete round trip an operator would drive through [`Client`].
#[test]
fn ping_then_collect_data_end_to_end() {
    let dst_node_id = 0x001;
    let my_node_id = 0x002;
    let mut t = ScriptedTransport::new();

    // ping(): tran_nbr 0
    t.queue(&hello_response_packet(my_node_id, dst_node_id, 0));
    // file_upload(".TDF") for get_table_defs(): tran_nbr 1 returns the whole
    // file, tran_nbr 2 signals end of transfer with an empty chunk.
    // file_upload reuses the transaction number allocated for the first
    // chunk for every subsequent chunk of the same transfer.
    let tabledef_bytes = sample_tabledef_bytes();
    t.queue(&fileupload_response_packet(my_node_id, dst_node_id, 1, &tabledef_bytes));
    t.queue(&fileupload_response_packet(my_node_id, dst_node_id, 1, &[]));

    let mut client = Client::new(t, dst_node_id, my_node_id).with_timeout(2.0);
    client.ping().unwrap();

    let tabledef = client.get_table_defs().unwrap();
    assert_eq!(tabledef.len(), 1);
    assert_eq!(tabledef[0].header.table_name, "Public");
    assert_eq!(tabledef[0].fields[0].field_name, "BattV");
}

#[test]
fn bye_sends_frame_without_waiting_for_reply() {
    let t = ScriptedTransport::new();
    let mut client = Client::new(t, 0x001, 0x002);
    client.bye().unwrap();
}
