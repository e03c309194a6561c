//! High-level PakBus operations built on top of the transaction multiplexer
//! and message catalogue: ping, file transfer, table definitions, data
//! collection, and clock synchronization ([1] sections 2.3.3-2.3.4).

use log::{debug, info};

use super::constant::{PROTO_BMP5, PROTO_PAKCTRL, TABLE_DEFINITION_FILE};
use super::error::Error;
use super::framer;
use super::message::{self, MessageBody};
use super::mux::{self, TranCounter};
use super::codec::{self, PrimitiveType, Value};
use super::tabledef::{self, RecordFragment, TableDef};
use super::transport::Transport;

const DEFAULT_SWATH: u16 = 0x0200;

/// A PakBus client addressing one datalogger (`dst_node_id`) from a fixed
/// identity (`my_node_id`).
pub struct Client<T: Transport> {
    transport: T,
    my_node_id: u16,
    dst_node_id: u16,
    security_code: u16,
    timeout_s: f64,
    tran_counter: TranCounter,
}

/// A peer's reply to a Hello command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HelloResponse {
    pub is_router: u8,
    pub hop_metric: u8,
    pub verify_intv: u16,
}

/// Reported programming statistics, decoded from a successful
/// `GetProgStat` response.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgStat {
    pub os_ver: String,
    pub os_sig: u16,
    pub serial_nbr: String,
    pub pow_up_prog: String,
    pub comp_state: u8,
    pub prog_name: String,
    pub prog_sig: u16,
    pub comp_time: (i32, i32),
    pub comp_result: String,
}

impl<T: Transport> Client<T> {
    /// # Examples
    ///
    /// ```no_run
    /// use pakbus::{client, tcp};
    ///
    /// let t = tcp::Transport::connect(tcp::Options::new("10.0.0.5")).unwrap();
    /// let mut cl = client::Client::new(t, 0x001, 0x002);
    /// cl.ping().unwrap();
    /// ```
    pub fn new(transport: T, dst_node_id: u16, my_node_id: u16) -> Client<T> {
        Client {
            transport,
            my_node_id,
            dst_node_id,
            security_code: 0x0000,
            timeout_s: 5.0,
            tran_counter: TranCounter::new(),
        }
    }

    pub fn with_security_code(mut self, security_code: u16) -> Client<T> {
        self.security_code = security_code;
        self
    }

    pub fn with_timeout(mut self, timeout_s: f64) -> Client<T> {
        self.timeout_s = timeout_s;
        self
    }

    fn wait(&mut self, tran_nbr: u8) -> Result<MessageBody, Error> {
        let (_, body) = mux::wait(
            &mut self.transport,
            self.my_node_id,
            self.dst_node_id,
            tran_nbr,
            self.timeout_s,
        )?;
        Ok(body)
    }

    /// Send a Hello command and wait for its reply, confirming the peer is
    /// reachable and recording its routing metrics. Mirrors `ping_node`:
    /// a missing reply is not an error, it simply yields `None`.
    pub fn ping(&mut self) -> Result<Option<HelloResponse>, Error> {
        let tran_nbr = self.tran_counter.next();
        let pkt = message::build_hello_cmd(self.dst_node_id, self.my_node_id, tran_nbr, 0x00, 0x02, 1800);
        framer::send_frame(&mut self.transport, &pkt)?;
        match self.wait(tran_nbr) {
            Ok(MessageBody::HelloResponse {
                is_router,
                hop_metric,
                verify_intv,
            }) => Ok(Some(HelloResponse {
                is_router,
                hop_metric,
                verify_intv,
            })),
            Ok(other) => Err(unexpected(other)),
            Err(Error::Timeout) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Close the logical session with a Bye command. Bye has no response
    /// ([1] section 2.3.1.2); the frame is fire-and-forget.
    pub fn bye(&mut self) -> Result<(), Error> {
        let pkt = message::build_bye_cmd(self.dst_node_id, self.my_node_id);
        framer::send_frame(&mut self.transport, &pkt)?;
        self.transport.close()
    }

    pub fn get_progstat(&mut self) -> Result<ProgStat, Error> {
        let tran_nbr = self.tran_counter.next();
        let pkt = message::build_getprogstat_cmd(self.dst_node_id, self.my_node_id, tran_nbr, self.security_code);
        framer::send_frame(&mut self.transport, &pkt)?;
        match self.wait(tran_nbr)? {
            MessageBody::GetProgStatResponse {
                resp_code,
                os_ver,
                os_sig,
                serial_nbr,
                pow_up_prog,
                comp_state,
                prog_name,
                prog_sig,
                comp_time,
                comp_result,
            } => {
                if resp_code != 0 {
                    return Err(Error::PeerError(resp_code as i32));
                }
                Ok(ProgStat {
                    os_ver: ascii(os_ver),
                    os_sig: os_sig.unwrap_or(0),
                    serial_nbr: ascii(serial_nbr),
                    pow_up_prog: ascii(pow_up_prog),
                    comp_state: comp_state.unwrap_or(0),
                    prog_name: ascii(prog_name),
                    prog_sig: prog_sig.unwrap_or(0),
                    comp_time: comp_time.unwrap_or((0, 0)),
                    comp_result: ascii(comp_result),
                })
            }
            other => Err(unexpected(other)),
        }
    }

    /// Upload a complete file, issuing successive File Upload commands that
    /// all reuse the transaction number allocated for the first chunk ([1]
    /// section 2.3.3.2). The loop ends when the peer returns an empty
    /// `FileData`; it never sets `CloseFlag` itself, since the peer signals
    /// completion on its own.
    pub fn file_upload(&mut self, file_name: &str) -> Result<Vec<u8>, Error> {
        let mut file_data = Vec::new();
        let mut file_offset: u32 = 0;
        let tran_nbr = self.tran_counter.next();

        loop {
            let pkt = message::build_fileupload_cmd(
                self.dst_node_id,
                self.my_node_id,
                tran_nbr,
                self.security_code,
                file_name,
                file_offset,
                0x00,
                DEFAULT_SWATH,
            );
            framer::send_frame(&mut self.transport, &pkt)?;
            match self.wait(tran_nbr)? {
                MessageBody::FileUploadResponse {
                    resp_code,
                    file_data: chunk,
                    ..
                } => {
                    if resp_code != 0 {
                        return Err(Error::PeerError(resp_code as i32));
                    }
                    if chunk.is_empty() {
                        break;
                    }
                    file_offset += chunk.len() as u32;
                    file_data.extend(chunk);
                }
                other => return Err(unexpected(other)),
            }
        }

        debug!("file_upload({}): {} bytes", file_name, file_data.len());
        Ok(file_data)
    }

    /// Download a complete file, chunked at `swath` bytes per packet,
    /// reusing the first chunk's transaction number for every subsequent
    /// chunk ([1] section 2.3.3.1).
    pub fn file_download(&mut self, file_name: &str, file_data: &[u8], swath: u16) -> Result<(), Error> {
        let mut file_offset: u32 = 0;
        let mut tran_nbr: Option<u8> = None;

        loop {
            let this_tran = tran_nbr.unwrap_or_else(|| self.tran_counter.next());
            let end = (file_offset as usize + swath as usize).min(file_data.len());
            let close_flag = if end >= file_data.len() { 0x01 } else { 0x00 };

            let pkt = message::build_filedownload_cmd(
                self.dst_node_id,
                self.my_node_id,
                this_tran,
                self.security_code,
                file_name,
                &file_data[file_offset as usize..end],
                file_offset,
                close_flag,
                0x00,
            );
            framer::send_frame(&mut self.transport, &pkt)?;
            match self.wait(this_tran)? {
                MessageBody::FileDownloadResponse { resp_code, .. } => {
                    if resp_code != 0 {
                        return Err(Error::PeerError(resp_code as i32));
                    }
                    file_offset = end as u32;
                }
                other => return Err(unexpected(other)),
            }
            tran_nbr = Some(this_tran);
            if close_flag == 0x01 {
                break;
            }
        }
        Ok(())
    }

    /// Issue a File Control command (e.g. delete, run program, compile and
    /// run) and return its response code and hold-off seconds.
    pub fn file_control(&mut self, file_name: &str, file_cmd: u8) -> Result<(u8, u16), Error> {
        let tran_nbr = self.tran_counter.next();
        let pkt = message::build_filecontrol_cmd(
            self.dst_node_id,
            self.my_node_id,
            tran_nbr,
            self.security_code,
            file_name,
            file_cmd,
        );
        framer::send_frame(&mut self.transport, &pkt)?;
        match self.wait(tran_nbr)? {
            MessageBody::FileControlResponse { resp_code, hold_off } => Ok((resp_code, hold_off)),
            other => Err(unexpected(other)),
        }
    }

    /// Upload and parse the logger's Table Definition File.
    pub fn get_table_defs(&mut self) -> Result<Vec<TableDef>, Error> {
        let raw = self.file_upload(TABLE_DEFINITION_FILE)?;
        tabledef::parse_tabledef(&raw)
    }

    /// Request and parse one Get Values response for a single field,
    /// decoding the raw payload as `swath` back-to-back values of
    /// `type_code` ([1] section 2.3.3.4, mirroring `parse_values`).
    pub fn get_values(
        &mut self,
        table_name: &str,
        type_code: u8,
        field_name: &str,
        swath: u16,
    ) -> Result<Vec<Value>, Error> {
        let field_type = PrimitiveType::from_code(type_code)
            .ok_or_else(|| Error::MalformedCodec(format!("unknown type code {}", type_code)))?;
        let tran_nbr = self.tran_counter.next();
        let pkt = message::build_getvalues_cmd(
            self.dst_node_id,
            self.my_node_id,
            tran_nbr,
            self.security_code,
            table_name,
            type_code,
            field_name,
            swath,
        );
        framer::send_frame(&mut self.transport, &pkt)?;
        match self.wait(tran_nbr)? {
            MessageBody::GetValuesResponse { resp_code, values } => {
                if resp_code != 0 {
                    return Err(Error::PeerError(resp_code as i32));
                }
                let types = vec![field_type; swath as usize];
                let (parsed, _) = codec::decode(&types, &values, None)?;
                Ok(parsed)
            }
            other => Err(unexpected(other)),
        }
    }

    /// Collect data from a table, resolving `field_names` against
    /// `tabledef` (empty means all fields, in table order).
    pub fn collect_data(
        &mut self,
        tabledef: &[TableDef],
        table_name: &str,
        field_names: &[&str],
        collect_mode: u8,
        p1: (i32, i32),
        p2: (i32, i32),
    ) -> Result<(Vec<RecordFragment>, bool), Error> {
        let table_nbr = tabledef::get_table_nbr(tabledef, table_name)
            .ok_or_else(|| Error::TableNotFound(table_name.to_string()))?;
        let table = &tabledef[table_nbr as usize - 1];
        let table_def_sig = table.signature;

        let mut remaining: Vec<&str> = field_names.to_vec();
        let mut field_nbr = Vec::new();
        for (idx, field) in table.fields.iter().enumerate() {
            if let Some(pos) = remaining.iter().position(|&n| n == field.field_name) {
                field_nbr.push((idx + 1) as u16);
                remaining.remove(pos);
            }
            if remaining.is_empty() {
                break;
            }
        }
        if !remaining.is_empty() {
            return Err(Error::FieldNotResolved(remaining.iter().map(|s| s.to_string()).collect()));
        }

        let tran_nbr = self.tran_counter.next();
        let pkt = message::build_collectdata_cmd(
            self.dst_node_id,
            self.my_node_id,
            tran_nbr,
            self.security_code,
            table_nbr,
            table_def_sig,
            &field_nbr,
            collect_mode,
            p1,
            p2,
        );
        framer::send_frame(&mut self.transport, &pkt)?;
        match self.wait(tran_nbr)? {
            MessageBody::CollectDataResponse { resp_code, rec_data } => {
                if resp_code != 0 {
                    return Err(Error::PeerError(resp_code as i32));
                }
                tabledef::parse_collectdata(&rec_data, tabledef, &field_nbr)
            }
            other => Err(unexpected(other)),
        }
    }

    /// Estimate and optionally correct the clock offset against the local
    /// clock, sampling the logger's clock 10 times and discarding the
    /// shortest and longest round-trip-adjusted readings before averaging
    /// ([1] section 2.3.2.3). `now_fn` supplies the local reference time in
    /// seconds so this stays independent of any wall-clock source; `offset`
    /// is a known constant offset of the logger's clock from UTC.
    pub fn clock_sync(
        &mut self,
        mut now_fn: impl FnMut() -> f64,
        offset: f64,
        min_adjust: f64,
        max_adjust: f64,
    ) -> Result<(Option<f64>, f64), Error> {
        let mut samples = Vec::new();

        for _ in 0..10 {
            let tran_nbr = self.tran_counter.next();
            let pkt = message::build_clock_cmd(self.dst_node_id, self.my_node_id, tran_nbr, self.security_code, (0, 0));
            let t1 = now_fn();
            framer::send_frame(&mut self.transport, &pkt)?;
            let reftime = now_fn();
            let body = match self.wait(tran_nbr) {
                Ok(b) => b,
                Err(_) => break,
            };
            let t2 = now_fn();

            if let MessageBody::ClockResponse { time, .. } = body {
                let logtime = time.0 as f64 + time.1 as f64 * 1e-9 - offset;
                let delay = (t2 - t1) / 2.0;
                samples.push(logtime - reftime + delay);
            } else {
                break;
            }
        }

        if samples.len() <= 2 {
            return Ok((None, 0.0));
        }

        samples.sort_by(|a, b| a.partial_cmp(b).unwrap());
        samples.remove(0);
        samples.pop();
        let tdiff: f64 = samples.iter().sum::<f64>() / samples.len() as f64;

        let mut adjust = 0.0;
        if tdiff.abs() > min_adjust {
            adjust = (-tdiff).clamp(-max_adjust, max_adjust);
            let sec = adjust.trunc() as i32;
            let tick = ((adjust.fract()) * 1e9) as i32;
            let tran_nbr = self.tran_counter.next();
            let pkt =
                message::build_clock_cmd(self.dst_node_id, self.my_node_id, tran_nbr, self.security_code, (sec, tick));
            framer::send_frame(&mut self.transport, &pkt)?;
            self.wait(tran_nbr)?;
            info!("clock adjusted by {:.3}s", adjust);
        }

        Ok((Some(tdiff), adjust))
    }
}

fn ascii(field: Option<Vec<u8>>) -> String {
    String::from_utf8_lossy(&field.unwrap_or_default()).into_owned()
}

fn unexpected(body: MessageBody) -> Error {
    Error::MalformedCodec(format!("unexpected response: {:?}", body))
}

#[allow(dead_code)]
fn proto_for(hi: u8) -> &'static str {
    match hi {
        PROTO_PAKCTRL => "PakCtrl",
        PROTO_BMP5 => "BMP5",
        _ => "unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constant::{MSG_GETVALUES_RESP, MSG_HELLO_RESP};
    use crate::header::Header;
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

    #[test]
    fn ping_succeeds_on_hello_response() {
        let mut t = MockTransport::new();
        let hdr = Header::default_for(0x002, 0x001, PROTO_PAKCTRL);
        let body = crate::codec::encode(
            &[
                crate::codec::PrimitiveType::Byte,
                crate::codec::PrimitiveType::Byte,
                crate::codec::PrimitiveType::Byte,
                crate::codec::PrimitiveType::Byte,
                crate::codec::PrimitiveType::UInt2,
            ],
            &[
                crate::codec::Value::U8(MSG_HELLO_RESP),
                crate::codec::Value::U8(0),
                crate::codec::Value::U8(1),
                crate::codec::Value::U8(3),
                crate::codec::Value::U16(900),
            ],
        )
        .unwrap();
        let mut pkt = hdr.pack().to_vec();
        pkt.extend_from_slice(&body);

        // client allocates tran_nbr 0 for its first request
        t.push_frame(&pkt);
        let mut client = Client::new(t, 0x001, 0x002);
        let hello = client.ping().unwrap();
        assert_eq!(
            hello,
            Some(HelloResponse {
                is_router: 1,
                hop_metric: 3,
                verify_intv: 900,
            })
        );
    }

    #[test]
    fn ping_times_out_reports_none() {
        let t = MockTransport::new();
        let mut client = Client::new(t, 0x001, 0x002).with_timeout(0.01);
        assert_eq!(client.ping().unwrap(), None);
    }

    #[test]
    fn get_values_decodes_swath_of_fields() {
        let mut t = MockTransport::new();
        let hdr = Header::default_for(0x002, 0x001, PROTO_BMP5);
        let mut body = codec::encode(
            &[PrimitiveType::Byte, PrimitiveType::Byte, PrimitiveType::Byte],
            &[Value::U8(MSG_GETVALUES_RESP), Value::U8(0), Value::U8(0)],
        )
        .unwrap();
        body.extend(codec::encode(&[PrimitiveType::Ieee4B, PrimitiveType::Ieee4B], &[Value::F32(1.5), Value::F32(2.5)]).unwrap());
        let mut pkt = hdr.pack().to_vec();
        pkt.extend_from_slice(&body);
        t.push_frame(&pkt);

        let mut client = Client::new(t, 0x001, 0x002);
        let values = client
            .get_values("Public", PrimitiveType::Ieee4B.code(), "BattV", 2)
            .unwrap();
        assert_eq!(values, vec![Value::F32(1.5), Value::F32(2.5)]);
    }

    #[test]
    fn clock_sync_with_no_responses_reports_no_estimate() {
        let t = MockTransport::new();
        let mut client = Client::new(t, 0x001, 0x002).with_timeout(0.01);
        let (tdiff, adjust) = client.clock_sync(|| 0.0, 0.0, 0.1, 3.0).unwrap();
        assert_eq!(tdiff, None);
        assert_eq!(adjust, 0.0);
    }
}
