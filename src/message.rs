//! Request builders and response decoders for the supported PakBus/BMP5
//! message types ([1] section 2).
//!
//! Each decoded message is a named record (an enum variant with explicit
//! fields) rather than a dictionary of heterogeneous keys, and the wire
//! preamble (`raw`, `MsgType`, `TranNbr`) lives on [`Envelope`], separate
//! from the body (spec §9 design note).

use super::codec::{self, PrimitiveType, Value};
use super::constant::*;
use super::error::Error;
use super::header::Header;

/// One entry of a `DevConfig Get Settings` response.
#[derive(Debug, Clone, PartialEq)]
pub struct SettingEntry {
    pub setting_id: u16,
    pub large_value: bool,
    pub read_only: bool,
    pub value: Vec<u8>,
}

/// One entry of a `DevConfig Set Settings` response.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SettingStatus {
    pub setting_id: u16,
    pub outcome: u8,
}

/// The wire preamble shared by every decoded message: the bytes of the
/// message itself (beginning at `MsgType`), plus the already-decoded header.
#[derive(Debug, Clone)]
pub struct Envelope {
    pub header: Header,
    pub msg_type: u8,
    pub tran_nbr: u8,
    pub raw: Vec<u8>,
}

/// A decoded message body, tagged by `(HiProtoCode, MsgType)`.
#[derive(Debug, Clone, PartialEq)]
pub enum MessageBody {
    HelloCmd {
        is_router: u8,
        hop_metric: u8,
        verify_intv: u16,
    },
    HelloResponse {
        is_router: u8,
        hop_metric: u8,
        verify_intv: u16,
    },
    DevConfigGetSettingsResponse {
        outcome: u8,
        device_type: Option<u16>,
        major_version: Option<u8>,
        minor_version: Option<u8>,
        more_settings: Option<u8>,
        settings: Vec<SettingEntry>,
    },
    DevConfigSetSettingsResponse {
        outcome: u8,
        statuses: Vec<SettingStatus>,
    },
    DevConfigControlResponse {
        outcome: u8,
    },
    ClockResponse {
        resp_code: u8,
        time: (i32, i32),
    },
    FileDownloadResponse {
        resp_code: u8,
        file_offset: u32,
    },
    FileUploadResponse {
        resp_code: u8,
        file_offset: u32,
        file_data: Vec<u8>,
    },
    FileControlResponse {
        resp_code: u8,
        hold_off: u16,
    },
    GetProgStatResponse {
        resp_code: u8,
        os_ver: Option<Vec<u8>>,
        os_sig: Option<u16>,
        serial_nbr: Option<Vec<u8>>,
        pow_up_prog: Option<Vec<u8>>,
        comp_state: Option<u8>,
        prog_name: Option<Vec<u8>>,
        prog_sig: Option<u16>,
        comp_time: Option<(i32, i32)>,
        comp_result: Option<Vec<u8>>,
    },
    CollectDataResponse {
        resp_code: u8,
        rec_data: Vec<u8>,
    },
    GetValuesResponse {
        resp_code: u8,
        values: Vec<u8>,
    },
    PleaseWait {
        cmd_msg_type: u8,
        wait_sec: u16,
    },
    /// A message type this catalogue does not decode; the envelope is
    /// still available to the caller.
    Unknown,
}

/// Decode a message body given the protocol and message type from the
/// header, and the message bytes (starting at `MsgType`).
pub fn decode_body(hi_proto_code: u8, msg_type: u8, raw: &[u8]) -> Result<MessageBody, Error> {
    match (hi_proto_code, msg_type) {
        (PROTO_PAKCTRL, MSG_HELLO_CMD) => decode_hello(raw, true),
        (PROTO_PAKCTRL, MSG_HELLO_RESP) => decode_hello(raw, false),
        (PROTO_PAKCTRL, MSG_DEVCONFIG_GET_SETTINGS_RESP) => decode_devconfig_get_settings(raw),
        (PROTO_PAKCTRL, MSG_DEVCONFIG_SET_SETTINGS_RESP) => decode_devconfig_set_settings(raw),
        (PROTO_PAKCTRL, MSG_DEVCONFIG_CONTROL_RESP) => decode_devconfig_control(raw),
        (PROTO_BMP5, MSG_COLLECT_DATA_RESP) => decode_collect_data_response(raw),
        (PROTO_BMP5, MSG_CLOCK_RESP) => decode_clock_response(raw),
        (PROTO_BMP5, MSG_GETPROGSTAT_RESP) => decode_getprogstat_response(raw),
        (PROTO_BMP5, MSG_GETVALUES_RESP) => decode_getvalues_response(raw),
        (PROTO_BMP5, MSG_FILEDOWNLOAD_RESP) => decode_filedownload_response(raw),
        (PROTO_BMP5, MSG_FILEUPLOAD_RESP) => decode_fileupload_response(raw),
        (PROTO_BMP5, MSG_FILECONTROL_RESP) => decode_filecontrol_response(raw),
        (PROTO_BMP5, MSG_PLEASE_WAIT) => decode_please_wait(raw),
        _ => Ok(MessageBody::Unknown),
    }
}

fn decode_u8(raw: &[u8], at: usize) -> Result<u8, Error> {
    raw.get(at)
        .copied()
        .ok_or_else(|| Error::MalformedCodec("buffer underrun decoding Byte".into()))
}

fn decode_u16(raw: &[u8], at: usize) -> Result<(u16, usize), Error> {
    let (vals, size) = codec::decode(&[PrimitiveType::UInt2], &raw[at..], None)?;
    Ok((vals[0].as_u16().unwrap(), size))
}

// ---- Hello (MsgType 0x09 / 0x89) ----

/// Build a Hello Command packet. Returns `(packet, tran_nbr)`.
pub fn build_hello_cmd(
    dst_node_id: u16,
    src_node_id: u16,
    tran_nbr: u8,
    is_router: u8,
    hop_metric: u8,
    verify_intv: u16,
) -> Vec<u8> {
    let hdr = Header::new(dst_node_id, src_node_id, PROTO_PAKCTRL, 0x1, 0x9, 0x1, 0x0, None, None);
    let body = codec::encode(
        &[
            PrimitiveType::Byte,
            PrimitiveType::Byte,
            PrimitiveType::Byte,
            PrimitiveType::Byte,
            PrimitiveType::UInt2,
        ],
        &[
            Value::U8(MSG_HELLO_CMD),
            Value::U8(tran_nbr),
            Value::U8(is_router),
            Value::U8(hop_metric),
            Value::U16(verify_intv),
        ],
    )
    .expect("static hello encode cannot fail");
    let mut pkt = hdr.pack().to_vec();
    pkt.extend_from_slice(&body);
    pkt
}

/// Build a Hello Response packet (sent back to a peer's unsolicited Hello
/// command, echoing its transaction number).
pub fn build_hello_response(
    dst_node_id: u16,
    src_node_id: u16,
    tran_nbr: u8,
    is_router: u8,
    hop_metric: u8,
    verify_intv: u16,
) -> Vec<u8> {
    let hdr = Header::default_for(dst_node_id, src_node_id, PROTO_PAKCTRL);
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
            Value::U8(is_router),
            Value::U8(hop_metric),
            Value::U16(verify_intv),
        ],
    )
    .expect("static hello encode cannot fail");
    let mut pkt = hdr.pack().to_vec();
    pkt.extend_from_slice(&body);
    pkt
}

fn decode_hello(raw: &[u8], is_cmd: bool) -> Result<MessageBody, Error> {
    let (vals, _) = codec::decode(
        &[PrimitiveType::Byte, PrimitiveType::Byte, PrimitiveType::UInt2],
        &raw[2..],
        None,
    )?;
    let is_router = vals[0].as_u8().unwrap();
    let hop_metric = vals[1].as_u8().unwrap();
    let verify_intv = vals[2].as_u16().unwrap();
    Ok(if is_cmd {
        MessageBody::HelloCmd {
            is_router,
            hop_metric,
            verify_intv,
        }
    } else {
        MessageBody::HelloResponse {
            is_router,
            hop_metric,
            verify_intv,
        }
    })
}

// ---- Bye (MsgType 0x0D, no response) ----

/// Build a Bye Command packet.
pub fn build_bye_cmd(dst_node_id: u16, src_node_id: u16) -> Vec<u8> {
    let hdr = Header::new(dst_node_id, src_node_id, PROTO_PAKCTRL, 0x0, 0xB, 0x1, 0x0, None, None);
    let body = codec::encode(
        &[PrimitiveType::Byte, PrimitiveType::Byte],
        &[Value::U8(MSG_BYE_CMD), Value::U8(0)],
    )
    .expect("static bye encode cannot fail");
    let mut pkt = hdr.pack().to_vec();
    pkt.extend_from_slice(&body);
    pkt
}

// ---- DevConfig Get Settings (MsgType 0x0F / 0x8F) ----

/// Build a DevConfig Get Settings Command packet.
pub fn build_devconfig_get_settings_cmd(
    dst_node_id: u16,
    src_node_id: u16,
    tran_nbr: u8,
    begin_setting_id: Option<u16>,
    end_setting_id: Option<u16>,
) -> Vec<u8> {
    let hdr = Header::default_for(dst_node_id, src_node_id, PROTO_PAKCTRL);
    let mut body = codec::encode(
        &[PrimitiveType::Byte, PrimitiveType::Byte],
        &[Value::U8(MSG_DEVCONFIG_GET_SETTINGS_CMD), Value::U8(tran_nbr)],
    )
    .unwrap();
    if let Some(begin) = begin_setting_id {
        body.extend(codec::encode(&[PrimitiveType::UInt2], &[Value::U16(begin)]).unwrap());
        if let Some(end) = end_setting_id {
            body.extend(codec::encode(&[PrimitiveType::UInt2], &[Value::U16(end)]).unwrap());
        }
    }
    let mut pkt = hdr.pack().to_vec();
    pkt.extend_from_slice(&body);
    pkt
}

fn decode_devconfig_get_settings(raw: &[u8]) -> Result<MessageBody, Error> {
    let mut offset = 2;
    let outcome = decode_u8(raw, offset)?;
    offset += 1;

    let mut device_type = None;
    let mut major_version = None;
    let mut minor_version = None;
    let mut more_settings = None;
    let mut settings = Vec::new();

    if outcome == 0x01 {
        let (vals, size) = codec::decode(
            &[
                PrimitiveType::UInt2,
                PrimitiveType::Byte,
                PrimitiveType::Byte,
                PrimitiveType::Byte,
            ],
            &raw[offset..],
            None,
        )?;
        device_type = Some(vals[0].as_u16().unwrap());
        major_version = Some(vals[1].as_u8().unwrap());
        minor_version = Some(vals[2].as_u8().unwrap());
        more_settings = Some(vals[3].as_u8().unwrap());
        offset += size;

        while offset < raw.len() {
            let (setting_id, size) = decode_u16(raw, offset)?;
            offset += size;
            let (flags, size) = decode_u16(raw, offset)?;
            offset += size;
            let large_value = (flags & 0x8000) != 0;
            let read_only = (flags & 0x4000) != 0;
            let len = (flags & 0x3FFF) as usize;
            if offset + len > raw.len() {
                return Err(Error::MalformedCodec("setting value overruns buffer".into()));
            }
            let value = raw[offset..offset + len].to_vec();
            offset += len;
            settings.push(SettingEntry {
                setting_id,
                large_value,
                read_only,
                value,
            });
        }
    }

    Ok(MessageBody::DevConfigGetSettingsResponse {
        outcome,
        device_type,
        major_version,
        minor_version,
        more_settings,
        settings,
    })
}

// ---- DevConfig Set Settings (MsgType 0x10 / 0x90) ----

/// Build a DevConfig Set Settings Command packet.
pub fn build_devconfig_set_settings_cmd(
    dst_node_id: u16,
    src_node_id: u16,
    tran_nbr: u8,
    security_code: u16,
    settings: &[(u16, Vec<u8>)],
) -> Vec<u8> {
    let hdr = Header::default_for(dst_node_id, src_node_id, PROTO_PAKCTRL);
    let mut body = codec::encode(
        &[PrimitiveType::Byte, PrimitiveType::Byte, PrimitiveType::UInt2],
        &[
            Value::U8(MSG_DEVCONFIG_SET_SETTINGS_CMD),
            Value::U8(tran_nbr),
            Value::U16(security_code),
        ],
    )
    .unwrap();
    for (setting_id, value) in settings {
        body.extend(
            codec::encode(
                &[PrimitiveType::UInt2, PrimitiveType::UInt2],
                &[Value::U16(*setting_id), Value::U16(value.len() as u16)],
            )
            .unwrap(),
        );
        body.extend_from_slice(value);
    }
    let mut pkt = hdr.pack().to_vec();
    pkt.extend_from_slice(&body);
    pkt
}

fn decode_devconfig_set_settings(raw: &[u8]) -> Result<MessageBody, Error> {
    let mut offset = 2;
    let outcome = decode_u8(raw, offset)?;
    offset += 1;
    let mut statuses = Vec::new();
    if outcome == 0x01 {
        while offset < raw.len() {
            let (vals, size) = codec::decode(
                &[PrimitiveType::UInt2, PrimitiveType::Byte],
                &raw[offset..],
                None,
            )?;
            statuses.push(SettingStatus {
                setting_id: vals[0].as_u16().unwrap(),
                outcome: vals[1].as_u8().unwrap(),
            });
            offset += size;
        }
    }
    Ok(MessageBody::DevConfigSetSettingsResponse { outcome, statuses })
}

// ---- DevConfig Control (MsgType 0x13 / 0x93) ----

/// Build a DevConfig Control Command packet.
pub fn build_devconfig_control_cmd(
    dst_node_id: u16,
    src_node_id: u16,
    tran_nbr: u8,
    security_code: u16,
    action: u8,
) -> Vec<u8> {
    let hdr = Header::default_for(dst_node_id, src_node_id, PROTO_PAKCTRL);
    let body = codec::encode(
        &[
            PrimitiveType::Byte,
            PrimitiveType::Byte,
            PrimitiveType::UInt2,
            PrimitiveType::Byte,
        ],
        &[
            Value::U8(MSG_DEVCONFIG_CONTROL_CMD),
            Value::U8(tran_nbr),
            Value::U16(security_code),
            Value::U8(action),
        ],
    )
    .unwrap();
    let mut pkt = hdr.pack().to_vec();
    pkt.extend_from_slice(&body);
    pkt
}

fn decode_devconfig_control(raw: &[u8]) -> Result<MessageBody, Error> {
    let outcome = decode_u8(raw, 2)?;
    Ok(MessageBody::DevConfigControlResponse { outcome })
}

// ---- Clock (MsgType 0x17 / 0x97) ----

/// Build a Clock Command packet. `adjustment` is `(seconds, ticks)`.
pub fn build_clock_cmd(
    dst_node_id: u16,
    src_node_id: u16,
    tran_nbr: u8,
    security_code: u16,
    adjustment: (i32, i32),
) -> Vec<u8> {
    let hdr = Header::default_for(dst_node_id, src_node_id, PROTO_BMP5);
    let body = codec::encode(
        &[
            PrimitiveType::Byte,
            PrimitiveType::Byte,
            PrimitiveType::UInt2,
            PrimitiveType::NSec,
        ],
        &[
            Value::U8(MSG_CLOCK_CMD),
            Value::U8(tran_nbr),
            Value::U16(security_code),
            Value::Time(adjustment.0, adjustment.1),
        ],
    )
    .unwrap();
    let mut pkt = hdr.pack().to_vec();
    pkt.extend_from_slice(&body);
    pkt
}

fn decode_clock_response(raw: &[u8]) -> Result<MessageBody, Error> {
    let (vals, _) = codec::decode(&[PrimitiveType::Byte, PrimitiveType::NSec], &raw[2..], None)?;
    Ok(MessageBody::ClockResponse {
        resp_code: vals[0].as_u8().unwrap(),
        time: vals[1].as_time().unwrap(),
    })
}

// ---- File Download (MsgType 0x1C / 0x9C) ----

/// Build a File Download Command packet.
#[allow(clippy::too_many_arguments)]
pub fn build_filedownload_cmd(
    dst_node_id: u16,
    src_node_id: u16,
    tran_nbr: u8,
    security_code: u16,
    file_name: &str,
    file_data: &[u8],
    file_offset: u32,
    close_flag: u8,
    attribute: u8,
) -> Vec<u8> {
    let hdr = Header::default_for(dst_node_id, src_node_id, PROTO_BMP5);
    let mut body = codec::encode(
        &[
            PrimitiveType::Byte,
            PrimitiveType::Byte,
            PrimitiveType::UInt2,
            PrimitiveType::AsciiZ,
            PrimitiveType::Byte,
            PrimitiveType::Byte,
            PrimitiveType::UInt4,
        ],
        &[
            Value::U8(MSG_FILEDOWNLOAD_CMD),
            Value::U8(tran_nbr),
            Value::U16(security_code),
            Value::Ascii(file_name.as_bytes().to_vec()),
            Value::U8(attribute),
            Value::U8(close_flag),
            Value::U32(file_offset),
        ],
    )
    .unwrap();
    body.extend_from_slice(file_data);
    let mut pkt = hdr.pack().to_vec();
    pkt.extend_from_slice(&body);
    pkt
}

fn decode_filedownload_response(raw: &[u8]) -> Result<MessageBody, Error> {
    let (vals, _) = codec::decode(&[PrimitiveType::Byte, PrimitiveType::UInt4], &raw[2..], None)?;
    Ok(MessageBody::FileDownloadResponse {
        resp_code: vals[0].as_u8().unwrap(),
        file_offset: vals[1].as_u32().unwrap(),
    })
}

// ---- File Upload (MsgType 0x1D / 0x9D) ----

/// Build a File Upload Command packet.
#[allow(clippy::too_many_arguments)]
pub fn build_fileupload_cmd(
    dst_node_id: u16,
    src_node_id: u16,
    tran_nbr: u8,
    security_code: u16,
    file_name: &str,
    file_offset: u32,
    close_flag: u8,
    swath: u16,
) -> Vec<u8> {
    let hdr = Header::default_for(dst_node_id, src_node_id, PROTO_BMP5);
    let body = codec::encode(
        &[
            PrimitiveType::Byte,
            PrimitiveType::Byte,
            PrimitiveType::UInt2,
            PrimitiveType::AsciiZ,
            PrimitiveType::Byte,
            PrimitiveType::UInt4,
            PrimitiveType::UInt2,
        ],
        &[
            Value::U8(MSG_FILEUPLOAD_CMD),
            Value::U8(tran_nbr),
            Value::U16(security_code),
            Value::Ascii(file_name.as_bytes().to_vec()),
            Value::U8(close_flag),
            Value::U32(file_offset),
            Value::U16(swath),
        ],
    )
    .unwrap();
    let mut pkt = hdr.pack().to_vec();
    pkt.extend_from_slice(&body);
    pkt
}

fn decode_fileupload_response(raw: &[u8]) -> Result<MessageBody, Error> {
    if raw.len() < 7 {
        return Err(Error::MalformedCodec("file upload response too short".into()));
    }
    let (vals, _) = codec::decode(&[PrimitiveType::Byte, PrimitiveType::UInt4], &raw[2..7], None)?;
    Ok(MessageBody::FileUploadResponse {
        resp_code: vals[0].as_u8().unwrap(),
        file_offset: vals[1].as_u32().unwrap(),
        file_data: raw[7..].to_vec(),
    })
}

// ---- File Control (MsgType 0x1E / 0x9E) ----

/// Build a File Control Command packet.
pub fn build_filecontrol_cmd(
    dst_node_id: u16,
    src_node_id: u16,
    tran_nbr: u8,
    security_code: u16,
    file_name: &str,
    file_cmd: u8,
) -> Vec<u8> {
    let hdr = Header::default_for(dst_node_id, src_node_id, PROTO_BMP5);
    let body = codec::encode(
        &[
            PrimitiveType::Byte,
            PrimitiveType::Byte,
            PrimitiveType::UInt2,
            PrimitiveType::AsciiZ,
            PrimitiveType::Byte,
        ],
        &[
            Value::U8(MSG_FILECONTROL_CMD),
            Value::U8(tran_nbr),
            Value::U16(security_code),
            Value::Ascii(file_name.as_bytes().to_vec()),
            Value::U8(file_cmd),
        ],
    )
    .unwrap();
    let mut pkt = hdr.pack().to_vec();
    pkt.extend_from_slice(&body);
    pkt
}

fn decode_filecontrol_response(raw: &[u8]) -> Result<MessageBody, Error> {
    let (vals, _) = codec::decode(&[PrimitiveType::Byte, PrimitiveType::UInt2], &raw[2..], None)?;
    Ok(MessageBody::FileControlResponse {
        resp_code: vals[0].as_u8().unwrap(),
        hold_off: vals[1].as_u16().unwrap(),
    })
}

// ---- Get Programming Statistics (MsgType 0x18 / 0x98) ----

/// Build a Get Programming Statistics Command packet.
pub fn build_getprogstat_cmd(
    dst_node_id: u16,
    src_node_id: u16,
    tran_nbr: u8,
    security_code: u16,
) -> Vec<u8> {
    let hdr = Header::default_for(dst_node_id, src_node_id, PROTO_BMP5);
    let body = codec::encode(
        &[PrimitiveType::Byte, PrimitiveType::Byte, PrimitiveType::UInt2],
        &[
            Value::U8(MSG_GETPROGSTAT_CMD),
            Value::U8(tran_nbr),
            Value::U16(security_code),
        ],
    )
    .unwrap();
    let mut pkt = hdr.pack().to_vec();
    pkt.extend_from_slice(&body);
    pkt
}

fn decode_getprogstat_response(raw: &[u8]) -> Result<MessageBody, Error> {
    let resp_code = decode_u8(raw, 2)?;
    if resp_code != 0 {
        return Ok(MessageBody::GetProgStatResponse {
            resp_code,
            os_ver: None,
            os_sig: None,
            serial_nbr: None,
            pow_up_prog: None,
            comp_state: None,
            prog_name: None,
            prog_sig: None,
            comp_time: None,
            comp_result: None,
        });
    }
    let (vals, _) = codec::decode(
        &[
            PrimitiveType::AsciiZ,
            PrimitiveType::UInt2,
            PrimitiveType::AsciiZ,
            PrimitiveType::AsciiZ,
            PrimitiveType::Byte,
            PrimitiveType::AsciiZ,
            PrimitiveType::UInt2,
            PrimitiveType::NSec,
            PrimitiveType::AsciiZ,
        ],
        &raw[3..],
        None,
    )?;
    Ok(MessageBody::GetProgStatResponse {
        resp_code,
        os_ver: Some(vals[0].as_ascii().unwrap().to_vec()),
        os_sig: Some(vals[1].as_u16().unwrap()),
        serial_nbr: Some(vals[2].as_ascii().unwrap().to_vec()),
        pow_up_prog: Some(vals[3].as_ascii().unwrap().to_vec()),
        comp_state: Some(vals[4].as_u8().unwrap()),
        prog_name: Some(vals[5].as_ascii().unwrap().to_vec()),
        prog_sig: Some(vals[6].as_u16().unwrap()),
        comp_time: Some(vals[7].as_time().unwrap()),
        comp_result: Some(vals[8].as_ascii().unwrap().to_vec()),
    })
}

// ---- Collect Data (MsgType 0x09 / 0x89, BMP5) ----

/// Build a Collect Data Command packet.
#[allow(clippy::too_many_arguments)]
pub fn build_collectdata_cmd(
    dst_node_id: u16,
    src_node_id: u16,
    tran_nbr: u8,
    security_code: u16,
    table_nbr: u16,
    table_def_sig: u16,
    field_nbr: &[u16],
    collect_mode: u8,
    p1: (i32, i32),
    p2: (i32, i32),
) -> Vec<u8> {
    let hdr = Header::default_for(dst_node_id, src_node_id, PROTO_BMP5);
    let mut body = codec::encode(
        &[
            PrimitiveType::Byte,
            PrimitiveType::Byte,
            PrimitiveType::UInt2,
            PrimitiveType::Byte,
            PrimitiveType::UInt2,
            PrimitiveType::UInt2,
        ],
        &[
            Value::U8(MSG_COLLECT_DATA_CMD),
            Value::U8(tran_nbr),
            Value::U16(security_code),
            Value::U8(collect_mode),
            Value::U16(table_nbr),
            Value::U16(table_def_sig),
        ],
    )
    .unwrap();

    match collect_mode {
        0x04 | 0x05 => {
            body.extend(codec::encode(&[PrimitiveType::UInt4], &[Value::U32(p1.0 as u32)]).unwrap());
        }
        0x06 | 0x08 => {
            body.extend(
                codec::encode(
                    &[PrimitiveType::UInt4, PrimitiveType::UInt4],
                    &[Value::U32(p1.0 as u32), Value::U32(p2.0 as u32)],
                )
                .unwrap(),
            );
        }
        0x07 => {
            body.extend(
                codec::encode(
                    &[PrimitiveType::NSec, PrimitiveType::NSec],
                    &[Value::Time(p1.0, p1.1), Value::Time(p2.0, p2.1)],
                )
                .unwrap(),
            );
        }
        _ => {}
    }

    let mut field_list: Vec<PrimitiveType> = Vec::with_capacity(field_nbr.len() + 1);
    let mut field_values: Vec<Value> = Vec::with_capacity(field_nbr.len() + 1);
    for &f in field_nbr {
        field_list.push(PrimitiveType::UInt2);
        field_values.push(Value::U16(f));
    }
    field_list.push(PrimitiveType::UInt2);
    field_values.push(Value::U16(0));
    body.extend(codec::encode(&field_list, &field_values).unwrap());

    let mut pkt = hdr.pack().to_vec();
    pkt.extend_from_slice(&body);
    pkt
}

fn decode_collect_data_response(raw: &[u8]) -> Result<MessageBody, Error> {
    let resp_code = decode_u8(raw, 2)?;
    Ok(MessageBody::CollectDataResponse {
        resp_code,
        rec_data: raw[3..].to_vec(),
    })
}

// ---- Get Values (MsgType 0x1A / 0x9A) ----

/// Build a Get Values Command packet.
#[allow(clippy::too_many_arguments)]
pub fn build_getvalues_cmd(
    dst_node_id: u16,
    src_node_id: u16,
    tran_nbr: u8,
    security_code: u16,
    table_name: &str,
    type_code: u8,
    field_name: &str,
    swath: u16,
) -> Vec<u8> {
    let hdr = Header::default_for(dst_node_id, src_node_id, PROTO_BMP5);
    let body = codec::encode(
        &[
            PrimitiveType::Byte,
            PrimitiveType::Byte,
            PrimitiveType::UInt2,
            PrimitiveType::AsciiZ,
            PrimitiveType::Byte,
            PrimitiveType::AsciiZ,
            PrimitiveType::UInt2,
        ],
        &[
            Value::U8(MSG_GETVALUES_CMD),
            Value::U8(tran_nbr),
            Value::U16(security_code),
            Value::Ascii(table_name.as_bytes().to_vec()),
            Value::U8(type_code),
            Value::Ascii(field_name.as_bytes().to_vec()),
            Value::U16(swath),
        ],
    )
    .unwrap();
    let mut pkt = hdr.pack().to_vec();
    pkt.extend_from_slice(&body);
    pkt
}

fn decode_getvalues_response(raw: &[u8]) -> Result<MessageBody, Error> {
    let resp_code = decode_u8(raw, 2)?;
    Ok(MessageBody::GetValuesResponse {
        resp_code,
        values: raw[3..].to_vec(),
    })
}

// ---- Please Wait (MsgType 0xA1, response-only) ----

fn decode_please_wait(raw: &[u8]) -> Result<MessageBody, Error> {
    let (vals, _) = codec::decode(&[PrimitiveType::Byte, PrimitiveType::UInt2], &raw[2..], None)?;
    Ok(MessageBody::PleaseWait {
        cmd_msg_type: vals[0].as_u8().unwrap(),
        wait_sec: vals[1].as_u16().unwrap(),
    })
}
