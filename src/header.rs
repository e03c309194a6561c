//! PakBus packet header: four big-endian 16-bit words packed with the
//! layout from [1] section 1.3.

use byteorder::{BigEndian, ByteOrder};

/// A decoded PakBus packet header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub link_state: u8,
    pub dst_phy_addr: u16,
    pub exp_more_code: u8,
    pub priority: u8,
    pub src_phy_addr: u16,
    pub hi_proto_code: u8,
    pub dst_node_id: u16,
    pub hop_cnt: u8,
    pub src_node_id: u16,
}

impl Header {
    /// Build a header, defaulting physical addresses to the logical node
    /// ids when not given (per [1] section 1.3).
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        dst_node_id: u16,
        src_node_id: u16,
        hi_proto_code: u8,
        exp_more_code: u8,
        link_state: u8,
        priority: u8,
        hop_cnt: u8,
        dst_phy_addr: Option<u16>,
        src_phy_addr: Option<u16>,
    ) -> Header {
        Header {
            link_state,
            dst_phy_addr: dst_phy_addr.unwrap_or(dst_node_id),
            exp_more_code,
            priority,
            src_phy_addr: src_phy_addr.unwrap_or(src_node_id),
            hi_proto_code,
            dst_node_id,
            hop_cnt,
            src_node_id,
        }
    }

    /// Default header for ordinary application packets: `ExpMoreCode=0x2,
    /// LinkState=0xA, Priority=0x1, HopCnt=0x0`.
    pub fn default_for(dst_node_id: u16, src_node_id: u16, hi_proto_code: u8) -> Header {
        Header::new(
            dst_node_id,
            src_node_id,
            hi_proto_code,
            0x2,
            0xA,
            0x1,
            0x0,
            None,
            None,
        )
    }

    /// Pack into the four big-endian 16-bit words of the wire header.
    pub fn pack(&self) -> [u8; 8] {
        let w0 = ((self.link_state as u16 & 0xF) << 12) | (self.dst_phy_addr & 0xFFF);
        let w1 = ((self.exp_more_code as u16 & 0x3) << 14)
            | ((self.priority as u16 & 0x3) << 12)
            | (self.src_phy_addr & 0xFFF);
        let w2 = ((self.hi_proto_code as u16 & 0xF) << 12) | (self.dst_node_id & 0xFFF);
        let w3 = ((self.hop_cnt as u16 & 0xF) << 12) | (self.src_node_id & 0xFFF);

        let mut buf = [0u8; 8];
        BigEndian::write_u16(&mut buf[0..2], w0);
        BigEndian::write_u16(&mut buf[2..4], w1);
        BigEndian::write_u16(&mut buf[4..6], w2);
        BigEndian::write_u16(&mut buf[6..8], w3);
        buf
    }

    /// Unpack from the 8-byte wire header. Returns `None` if `buf` is
    /// shorter than 8 bytes.
    pub fn unpack(buf: &[u8]) -> Option<Header> {
        if buf.len() < 8 {
            return None;
        }
        let w0 = BigEndian::read_u16(&buf[0..2]);
        let w1 = BigEndian::read_u16(&buf[2..4]);
        let w2 = BigEndian::read_u16(&buf[4..6]);
        let w3 = BigEndian::read_u16(&buf[6..8]);

        Some(Header {
            link_state: (w0 >> 12) as u8,
            dst_phy_addr: w0 & 0xFFF,
            exp_more_code: (w1 >> 14) as u8 & 0x3,
            priority: (w1 >> 12) as u8 & 0x3,
            src_phy_addr: w1 & 0xFFF,
            hi_proto_code: (w2 >> 12) as u8,
            dst_node_id: w2 & 0xFFF,
            hop_cnt: (w3 >> 12) as u8,
            src_node_id: w3 & 0xFFF,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pack_unpack_is_bijective() {
        let hdr = Header::new(0x001, 0x002, 0x1, 0x2, 0x9, 0x3, 0xF, Some(0xABC), Some(0xDEF));
        let packed = hdr.pack();
        let unpacked = Header::unpack(&packed).unwrap();
        assert_eq!(hdr, unpacked);
    }

    #[test]
    fn hello_command_header_layout() {
        // Hello command packet: DstNodeId=0x001, SrcNodeId=0x002,
        // HiProtoCode=0x0 (PakCtrl), ExpMoreCode=0x1, LinkState=0x9,
        // default Priority=0x1 and HopCnt=0x0, physical addrs default to
        // the node ids.
        let hdr = Header::new(0x001, 0x002, 0x0, 0x1, 0x9, 0x1, 0x0, None, None);
        let packed = hdr.pack();
        assert_eq!(
            &packed,
            &[0x90, 0x01, 0x50, 0x02, 0x00, 0x01, 0x00, 0x02]
        );
    }

    #[test]
    fn unpack_rejects_short_buffer() {
        assert!(Header::unpack(&[0u8; 4]).is_none());
    }
}
