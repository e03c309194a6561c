//! Typed binary codec for the PakBus primitive data types.
//!
//! See [1] Appendix A for the canonical type summary table. The table is a
//! compile-time match rather than a runtime hash map (spec design note:
//! "the primitive table is static").

use super::error::Error;
use byteorder::{BigEndian, ByteOrder, LittleEndian};

/// One of the ~25 PakBus wire primitive types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    Byte,
    UInt2,
    UInt4,
    Int1,
    Int2,
    Int4,
    Fp2,
    Fp3,
    Fp4,
    Ieee4B,
    Ieee8B,
    Bool8,
    Bool,
    Bool2,
    Bool4,
    Sec,
    USec,
    NSec,
    Ascii,
    AsciiZ,
    Short,
    Long,
    UShort,
    ULong,
    Ieee4L,
    Ieee8L,
    SecNano,
}

impl PrimitiveType {
    /// Wire type code, per [1] Appendix A.
    pub fn code(self) -> u8 {
        use PrimitiveType::*;
        match self {
            Byte => 1,
            UInt2 => 2,
            UInt4 => 3,
            Int1 => 4,
            Int2 => 5,
            Int4 => 6,
            Fp2 => 7,
            Fp4 => 8,
            Ieee4B => 9,
            Bool => 10,
            Ascii => 11,
            Sec => 12,
            USec => 13,
            NSec => 14,
            Fp3 => 15,
            AsciiZ => 16,
            Bool8 => 17,
            Ieee8B => 18,
            Short => 19,
            Long => 20,
            UShort => 21,
            ULong => 22,
            SecNano => 23,
            Ieee4L => 24,
            Ieee8L => 25,
            Bool2 => 27,
            Bool4 => 28,
        }
    }

    /// Fixed encoded size in bytes, or `None` for the variable-length
    /// string types (`ASCII`, `ASCIIZ`).
    pub fn fixed_size(self) -> Option<usize> {
        use PrimitiveType::*;
        match self {
            Byte | Int1 | Bool | Bool8 => Some(1),
            UInt2 | Int2 | Fp2 | Short | UShort | Bool2 => Some(2),
            Fp3 => Some(3),
            UInt4 | Int4 | Fp4 | Ieee4B | Long | ULong | Ieee4L | Bool4 | Sec => Some(4),
            USec => Some(6),
            NSec | Ieee8B | SecNano | Ieee8L => Some(8),
            Ascii | AsciiZ => None,
        }
    }

    /// Look up the primitive type by its setting-response / table-definition
    /// wire code, as used by `FieldType` bytes in a Table Definition File.
    pub fn from_code(code: u8) -> Option<PrimitiveType> {
        use PrimitiveType::*;
        let all = [
            Byte, UInt2, UInt4, Int1, Int2, Int4, Fp2, Fp3, Fp4, Ieee4B, Ieee8B, Bool8, Bool,
            Bool2, Bool4, Sec, USec, NSec, Ascii, AsciiZ, Short, Long, UShort, ULong, Ieee4L,
            Ieee8L, SecNano,
        ];
        all.iter().copied().find(|t| t.code() == code)
    }
}

/// A decoded scalar or composite PakBus value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    U8(u8),
    U16(u16),
    U32(u32),
    I8(i8),
    I16(i16),
    I32(i32),
    F32(f32),
    F64(f64),
    Bool(bool),
    /// `FP2`, decoded per §4.1; never produced by `encode` (decode-only).
    Fp2(f64),
    /// Opaque bytes for `FP3`, `FP4`, `USec`, which the catalogue never
    /// interprets numerically.
    Bytes(Vec<u8>),
    Ascii(Vec<u8>),
    /// `(seconds, ticks)` pair shared by `NSec` and `SecNano`.
    Time(i32, i32),
}

impl Value {
    pub fn as_u8(&self) -> Option<u8> {
        match self {
            Value::U8(v) => Some(*v),
            _ => None,
        }
    }
    pub fn as_u16(&self) -> Option<u16> {
        match self {
            Value::U16(v) => Some(*v),
            _ => None,
        }
    }
    pub fn as_u32(&self) -> Option<u32> {
        match self {
            Value::U32(v) => Some(*v),
            _ => None,
        }
    }
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }
    pub fn as_ascii(&self) -> Option<&[u8]> {
        match self {
            Value::Ascii(v) => Some(v),
            _ => None,
        }
    }
    pub fn as_time(&self) -> Option<(i32, i32)> {
        match self {
            Value::Time(s, t) => Some((*s, *t)),
            _ => None,
        }
    }
}

/// Decode the custom 2-byte Campbell float. Decode-only: the source never
/// encodes `FP2` (spec §4.1).
fn decode_fp2(w: u16) -> f64 {
    let mant = (w & 0x1FFF) as f64;
    let exp = (w >> 13) & 0x3;
    let sign = w >> 15;
    let value = mant / 10f64.powi(exp as i32);
    if sign == 1 {
        -value
    } else {
        value
    }
}

/// Encode a list of values against a matching list of types.
///
/// `ASCII` values are encoded at their own length (the caller supplies a
/// `Value::Ascii` of the exact wire length desired); `ASCIIZ` values have a
/// single trailing NUL appended.
pub fn encode(types: &[PrimitiveType], values: &[Value]) -> Result<Vec<u8>, Error> {
    if types.len() != values.len() {
        return Err(Error::MalformedCodec(format!(
            "encode: {} types but {} values",
            types.len(),
            values.len()
        )));
    }

    let mut buf = Vec::new();
    for (ty, val) in types.iter().zip(values.iter()) {
        encode_one(*ty, val, &mut buf)?;
    }
    Ok(buf)
}

fn encode_one(ty: PrimitiveType, val: &Value, buf: &mut Vec<u8>) -> Result<(), Error> {
    use PrimitiveType::*;
    match ty {
        Byte | Bool | Bool8 => buf.push(expect_u8(ty, val)?),
        Int1 => buf.push(expect_i8(ty, val)? as u8),
        UInt2 => {
            let mut b = [0u8; 2];
            BigEndian::write_u16(&mut b, expect_u16(ty, val)?);
            buf.extend_from_slice(&b);
        }
        Int2 => {
            let mut b = [0u8; 2];
            BigEndian::write_i16(&mut b, expect_i16(ty, val)?);
            buf.extend_from_slice(&b);
        }
        Bool2 => {
            let mut b = [0u8; 2];
            BigEndian::write_u16(&mut b, expect_u16(ty, val)?);
            buf.extend_from_slice(&b);
        }
        UInt4 => {
            let mut b = [0u8; 4];
            BigEndian::write_u32(&mut b, expect_u32(ty, val)?);
            buf.extend_from_slice(&b);
        }
        Int4 => {
            let mut b = [0u8; 4];
            BigEndian::write_i32(&mut b, expect_i32(ty, val)?);
            buf.extend_from_slice(&b);
        }
        Bool4 => {
            let mut b = [0u8; 4];
            BigEndian::write_u32(&mut b, expect_u32(ty, val)?);
            buf.extend_from_slice(&b);
        }
        Ieee4B => {
            let mut b = [0u8; 4];
            BigEndian::write_f32(&mut b, expect_f32(ty, val)?);
            buf.extend_from_slice(&b);
        }
        Ieee8B => {
            let mut b = [0u8; 8];
            BigEndian::write_f64(&mut b, expect_f64(ty, val)?);
            buf.extend_from_slice(&b);
        }
        Short => {
            let mut b = [0u8; 2];
            LittleEndian::write_i16(&mut b, expect_i16(ty, val)?);
            buf.extend_from_slice(&b);
        }
        UShort => {
            let mut b = [0u8; 2];
            LittleEndian::write_u16(&mut b, expect_u16(ty, val)?);
            buf.extend_from_slice(&b);
        }
        Long => {
            let mut b = [0u8; 4];
            LittleEndian::write_i32(&mut b, expect_i32(ty, val)?);
            buf.extend_from_slice(&b);
        }
        ULong => {
            let mut b = [0u8; 4];
            LittleEndian::write_u32(&mut b, expect_u32(ty, val)?);
            buf.extend_from_slice(&b);
        }
        Ieee4L => {
            let mut b = [0u8; 4];
            LittleEndian::write_f32(&mut b, expect_f32(ty, val)?);
            buf.extend_from_slice(&b);
        }
        Ieee8L => {
            let mut b = [0u8; 8];
            LittleEndian::write_f64(&mut b, expect_f64(ty, val)?);
            buf.extend_from_slice(&b);
        }
        NSec => {
            let (sec, tick) = expect_time(ty, val)?;
            let mut b = [0u8; 8];
            BigEndian::write_i32(&mut b[0..4], sec);
            BigEndian::write_i32(&mut b[4..8], tick);
            buf.extend_from_slice(&b);
        }
        SecNano => {
            let (sec, tick) = expect_time(ty, val)?;
            let mut b = [0u8; 8];
            LittleEndian::write_i32(&mut b[0..4], sec);
            LittleEndian::write_i32(&mut b[4..8], tick);
            buf.extend_from_slice(&b);
        }
        Sec => {
            let mut b = [0u8; 4];
            BigEndian::write_i32(&mut b, expect_i32(ty, val)?);
            buf.extend_from_slice(&b);
        }
        AsciiZ => {
            let bytes = expect_ascii(ty, val)?;
            buf.extend_from_slice(bytes);
            buf.push(0);
        }
        Ascii => {
            let bytes = expect_ascii(ty, val)?;
            buf.extend_from_slice(bytes);
        }
        Fp2 => {
            return Err(Error::MalformedCodec(
                "FP2 is decode-only, cannot encode".into(),
            ))
        }
        Fp3 | Fp4 | USec => {
            let bytes = expect_bytes(ty, val)?;
            let size = ty.fixed_size().unwrap();
            if bytes.len() != size {
                return Err(Error::MalformedCodec(format!(
                    "{:?}: expected {} opaque bytes, got {}",
                    ty,
                    size,
                    bytes.len()
                )));
            }
            buf.extend_from_slice(bytes);
        }
    }
    Ok(())
}

fn expect_u8(ty: PrimitiveType, val: &Value) -> Result<u8, Error> {
    match val {
        Value::U8(v) => Ok(*v),
        Value::Bool(v) => Ok(if *v { 1 } else { 0 }),
        _ => Err(type_mismatch(ty, val)),
    }
}
fn expect_i8(ty: PrimitiveType, val: &Value) -> Result<i8, Error> {
    match val {
        Value::I8(v) => Ok(*v),
        _ => Err(type_mismatch(ty, val)),
    }
}
fn expect_u16(ty: PrimitiveType, val: &Value) -> Result<u16, Error> {
    match val {
        Value::U16(v) => Ok(*v),
        _ => Err(type_mismatch(ty, val)),
    }
}
fn expect_i16(ty: PrimitiveType, val: &Value) -> Result<i16, Error> {
    match val {
        Value::I16(v) => Ok(*v),
        _ => Err(type_mismatch(ty, val)),
    }
}
fn expect_u32(ty: PrimitiveType, val: &Value) -> Result<u32, Error> {
    match val {
        Value::U32(v) => Ok(*v),
        _ => Err(type_mismatch(ty, val)),
    }
}
fn expect_i32(ty: PrimitiveType, val: &Value) -> Result<i32, Error> {
    match val {
        Value::I32(v) => Ok(*v),
        _ => Err(type_mismatch(ty, val)),
    }
}
fn expect_f32(ty: PrimitiveType, val: &Value) -> Result<f32, Error> {
    match val {
        Value::F32(v) => Ok(*v),
        _ => Err(type_mismatch(ty, val)),
    }
}
fn expect_f64(ty: PrimitiveType, val: &Value) -> Result<f64, Error> {
    match val {
        Value::F64(v) => Ok(*v),
        _ => Err(type_mismatch(ty, val)),
    }
}
fn expect_time(ty: PrimitiveType, val: &Value) -> Result<(i32, i32), Error> {
    match val {
        Value::Time(s, t) => Ok((*s, *t)),
        _ => Err(type_mismatch(ty, val)),
    }
}
fn expect_ascii(ty: PrimitiveType, val: &Value) -> Result<&[u8], Error> {
    match val {
        Value::Ascii(v) => Ok(v),
        _ => Err(type_mismatch(ty, val)),
    }
}
fn expect_bytes(ty: PrimitiveType, val: &Value) -> Result<&[u8], Error> {
    match val {
        Value::Bytes(v) => Ok(v),
        _ => Err(type_mismatch(ty, val)),
    }
}
fn type_mismatch(ty: PrimitiveType, val: &Value) -> Error {
    Error::MalformedCodec(format!("value {:?} does not match type {:?}", val, ty))
}

/// Decode a list of types from `buf`, returning the decoded values and the
/// number of bytes consumed.
///
/// `ascii_len` supplies the fixed length of any `ASCII` type encountered
/// (dimension or remaining-buffer length, at the caller's discretion).
pub fn decode(
    types: &[PrimitiveType],
    buf: &[u8],
    ascii_len: Option<usize>,
) -> Result<(Vec<Value>, usize), Error> {
    let mut offset = 0usize;
    let mut values = Vec::with_capacity(types.len());

    for ty in types {
        let (value, consumed) = decode_one(*ty, &buf[offset..], ascii_len)?;
        values.push(value);
        offset += consumed;
    }
    Ok((values, offset))
}

fn need(buf: &[u8], n: usize) -> Result<(), Error> {
    if buf.len() < n {
        Err(Error::MalformedCodec(format!(
            "buffer underrun: need {} bytes, have {}",
            n,
            buf.len()
        )))
    } else {
        Ok(())
    }
}

fn decode_one(
    ty: PrimitiveType,
    buf: &[u8],
    ascii_len: Option<usize>,
) -> Result<(Value, usize), Error> {
    use PrimitiveType::*;
    match ty {
        Byte => {
            need(buf, 1)?;
            Ok((Value::U8(buf[0]), 1))
        }
        Bool => {
            need(buf, 1)?;
            Ok((Value::Bool(buf[0] != 0), 1))
        }
        Bool8 => {
            need(buf, 1)?;
            Ok((Value::U8(buf[0]), 1))
        }
        Int1 => {
            need(buf, 1)?;
            Ok((Value::I8(buf[0] as i8), 1))
        }
        UInt2 => {
            need(buf, 2)?;
            Ok((Value::U16(BigEndian::read_u16(buf)), 2))
        }
        Int2 => {
            need(buf, 2)?;
            Ok((Value::I16(BigEndian::read_i16(buf)), 2))
        }
        Bool2 => {
            need(buf, 2)?;
            Ok((Value::U16(BigEndian::read_u16(buf)), 2))
        }
        UInt4 => {
            need(buf, 4)?;
            Ok((Value::U32(BigEndian::read_u32(buf)), 4))
        }
        Int4 => {
            need(buf, 4)?;
            Ok((Value::I32(BigEndian::read_i32(buf)), 4))
        }
        Bool4 => {
            need(buf, 4)?;
            Ok((Value::U32(BigEndian::read_u32(buf)), 4))
        }
        Ieee4B => {
            need(buf, 4)?;
            Ok((Value::F32(BigEndian::read_f32(buf)), 4))
        }
        Ieee8B => {
            need(buf, 8)?;
            Ok((Value::F64(BigEndian::read_f64(buf)), 8))
        }
        Short => {
            need(buf, 2)?;
            Ok((Value::I16(LittleEndian::read_i16(buf)), 2))
        }
        UShort => {
            need(buf, 2)?;
            Ok((Value::U16(LittleEndian::read_u16(buf)), 2))
        }
        Long => {
            need(buf, 4)?;
            Ok((Value::I32(LittleEndian::read_i32(buf)), 4))
        }
        ULong => {
            need(buf, 4)?;
            Ok((Value::U32(LittleEndian::read_u32(buf)), 4))
        }
        Ieee4L => {
            need(buf, 4)?;
            Ok((Value::F32(LittleEndian::read_f32(buf)), 4))
        }
        Ieee8L => {
            need(buf, 8)?;
            Ok((Value::F64(LittleEndian::read_f64(buf)), 8))
        }
        Sec => {
            need(buf, 4)?;
            Ok((Value::I32(BigEndian::read_i32(buf)), 4))
        }
        NSec => {
            need(buf, 8)?;
            let sec = BigEndian::read_i32(&buf[0..4]);
            let tick = BigEndian::read_i32(&buf[4..8]);
            Ok((Value::Time(sec, tick), 8))
        }
        SecNano => {
            need(buf, 8)?;
            let sec = LittleEndian::read_i32(&buf[0..4]);
            let tick = LittleEndian::read_i32(&buf[4..8]);
            Ok((Value::Time(sec, tick), 8))
        }
        Fp2 => {
            need(buf, 2)?;
            let w = BigEndian::read_u16(buf);
            Ok((Value::Fp2(decode_fp2(w)), 2))
        }
        Fp3 | Fp4 | USec => {
            let size = ty.fixed_size().unwrap();
            need(buf, size)?;
            Ok((Value::Bytes(buf[..size].to_vec()), size))
        }
        AsciiZ => {
            let nul = buf
                .iter()
                .position(|&b| b == 0)
                .ok_or_else(|| Error::MalformedCodec("ASCIIZ: no terminating NUL".into()))?;
            Ok((Value::Ascii(buf[..nul].to_vec()), nul + 1))
        }
        Ascii => {
            let size = ascii_len.unwrap_or(buf.len());
            need(buf, size)?;
            Ok((Value::Ascii(buf[..size].to_vec()), size))
        }
    }
}
