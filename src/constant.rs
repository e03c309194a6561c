//! Wire constants: framing delimiters, higher-level protocol codes, and
//! BMP5/PakCtrl message type bytes. See [1] Appendix A and section 2 for the
//! authoritative tables this mirrors.

/// Frame delimiter byte.
pub const FRAME: u8 = 0xBD;
/// Quote escape byte.
pub const QUOTE: u8 = 0xBC;

/// Default TCP port for PakBus.
pub const DEFAULT_PORT: u16 = 6785;

/// `HiProtoCode` for PakBus Control (PakCtrl) packets.
pub const PROTO_PAKCTRL: u8 = 0x0;
/// `HiProtoCode` for BMP5 application packets.
pub const PROTO_BMP5: u8 = 0x1;

// PakCtrl message types (HiProtoCode == PROTO_PAKCTRL)
pub const MSG_HELLO_CMD: u8 = 0x09;
pub const MSG_HELLO_RESP: u8 = 0x89;
pub const MSG_BYE_CMD: u8 = 0x0D;
pub const MSG_DEVCONFIG_GET_SETTINGS_CMD: u8 = 0x0F;
pub const MSG_DEVCONFIG_GET_SETTINGS_RESP: u8 = 0x8F;
pub const MSG_DEVCONFIG_SET_SETTINGS_CMD: u8 = 0x10;
pub const MSG_DEVCONFIG_SET_SETTINGS_RESP: u8 = 0x90;
pub const MSG_DEVCONFIG_CONTROL_CMD: u8 = 0x13;
pub const MSG_DEVCONFIG_CONTROL_RESP: u8 = 0x93;

// BMP5 message types (HiProtoCode == PROTO_BMP5)
pub const MSG_COLLECT_DATA_CMD: u8 = 0x09;
pub const MSG_COLLECT_DATA_RESP: u8 = 0x89;
pub const MSG_CLOCK_CMD: u8 = 0x17;
pub const MSG_CLOCK_RESP: u8 = 0x97;
pub const MSG_GETPROGSTAT_CMD: u8 = 0x18;
pub const MSG_GETPROGSTAT_RESP: u8 = 0x98;
pub const MSG_GETVALUES_CMD: u8 = 0x1A;
pub const MSG_GETVALUES_RESP: u8 = 0x9A;
pub const MSG_FILEDOWNLOAD_CMD: u8 = 0x1C;
pub const MSG_FILEDOWNLOAD_RESP: u8 = 0x9C;
pub const MSG_FILEUPLOAD_CMD: u8 = 0x1D;
pub const MSG_FILEUPLOAD_RESP: u8 = 0x9D;
pub const MSG_FILECONTROL_CMD: u8 = 0x1E;
pub const MSG_FILECONTROL_RESP: u8 = 0x9E;
pub const MSG_PLEASE_WAIT: u8 = 0xA1;

/// Reserved file name for the table definition file, transferred over the
/// ordinary file-upload path.
pub const TABLE_DEFINITION_FILE: &str = ".TDF";
