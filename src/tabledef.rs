//! Structural parsers that depend on earlier-parsed context: the Table
//! Definition File, the file directory listing, and Collect-Data record
//! streams, which can only be decoded once the table's field layout is
//! known ([1] sections 2.3.4.2-2.3.4.3).

use super::codec::{self, PrimitiveType, Value};
use super::error::Error;
use super::framer::{signature, SIGNATURE_SEED};

/// Header fields common to every table in a Table Definition File.
#[derive(Debug, Clone, PartialEq)]
pub struct TableHeader {
    pub table_name: String,
    pub table_size: u32,
    pub time_type: u8,
    pub tbl_time_into: (i32, i32),
    pub tbl_interval: (i32, i32),
}

/// One field definition within a table.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDef {
    pub read_only: bool,
    pub field_type: PrimitiveType,
    pub field_name: String,
    pub alias_name: Vec<String>,
    pub processing: String,
    pub units: String,
    pub description: String,
    pub beg_idx: u32,
    pub dimension: u32,
    pub sub_dim: Vec<u32>,
}

/// One parsed table, with the byte-range signature computed over its own
/// definition bytes (used to detect on-logger table redefinition).
#[derive(Debug, Clone, PartialEq)]
pub struct TableDef {
    pub header: TableHeader,
    pub fields: Vec<FieldDef>,
    pub signature: u16,
}

fn ascii_string(v: &Value) -> Result<String, Error> {
    let bytes = v
        .as_ascii()
        .ok_or_else(|| Error::MalformedCodec("expected ASCIIZ field".into()))?;
    Ok(String::from_utf8_lossy(bytes).into_owned())
}

fn decode_asciiz(buf: &[u8]) -> Result<(String, usize), Error> {
    let (vals, size) = codec::decode(&[PrimitiveType::AsciiZ], buf, None)?;
    Ok((ascii_string(&vals[0])?, size))
}

/// Parse a complete Table Definition File (the `.TDF` file uploaded from a
/// logger), returning one [`TableDef`] per table in file order.
pub fn parse_tabledef(raw: &[u8]) -> Result<Vec<TableDef>, Error> {
    let mut offset = 1usize; // first byte is FslVersion, not otherwise used
    if raw.is_empty() {
        return Err(Error::MalformedCodec("empty table definition file".into()));
    }
    let mut tables = Vec::new();

    while offset < raw.len() {
        let start = offset;

        let (vals, size) = codec::decode(
            &[
                PrimitiveType::AsciiZ,
                PrimitiveType::UInt4,
                PrimitiveType::Byte,
                PrimitiveType::NSec,
                PrimitiveType::NSec,
            ],
            &raw[offset..],
            None,
        )?;
        offset += size;
        let header = TableHeader {
            table_name: ascii_string(&vals[0])?,
            table_size: vals[1].as_u32().unwrap(),
            time_type: vals[2].as_u8().unwrap(),
            tbl_time_into: vals[3].as_time().unwrap(),
            tbl_interval: vals[4].as_time().unwrap(),
        };

        let mut fields = Vec::new();
        loop {
            let field_type_byte = *raw
                .get(offset)
                .ok_or_else(|| Error::MalformedCodec("truncated field list".into()))?;
            offset += 1;
            if field_type_byte == 0 {
                break;
            }

            let read_only = field_type_byte >> 7 != 0;
            let type_code = field_type_byte & 0x7F;
            let field_type = PrimitiveType::from_code(type_code).ok_or_else(|| {
                Error::MalformedCodec(format!("unknown field type code {}", type_code))
            })?;

            let (field_name, size) = decode_asciiz(&raw[offset..])?;
            offset += size;

            let mut alias_name = Vec::new();
            loop {
                let (alias, size) = decode_asciiz(&raw[offset..])?;
                offset += size;
                if alias.is_empty() {
                    break;
                }
                alias_name.push(alias);
            }

            let (vals, size) = codec::decode(
                &[
                    PrimitiveType::AsciiZ,
                    PrimitiveType::AsciiZ,
                    PrimitiveType::AsciiZ,
                    PrimitiveType::UInt4,
                    PrimitiveType::UInt4,
                ],
                &raw[offset..],
                None,
            )?;
            offset += size;
            let processing = ascii_string(&vals[0])?;
            let units = ascii_string(&vals[1])?;
            let description = ascii_string(&vals[2])?;
            let beg_idx = vals[3].as_u32().unwrap();
            let dimension = vals[4].as_u32().unwrap();

            let mut sub_dim = Vec::new();
            loop {
                let (vals, size) = codec::decode(&[PrimitiveType::UInt4], &raw[offset..], None)?;
                offset += size;
                let d = vals[0].as_u32().unwrap();
                if d == 0 {
                    break;
                }
                sub_dim.push(d);
            }

            fields.push(FieldDef {
                read_only,
                field_type,
                field_name,
                alias_name,
                processing,
                units,
                description,
                beg_idx,
                dimension,
                sub_dim,
            });
        }

        let table_signature = signature(&raw[start..offset], SIGNATURE_SEED);
        tables.push(TableDef {
            header,
            fields,
            signature: table_signature,
        });
    }

    Ok(tables)
}

/// Look up a 1-based table number by name.
pub fn get_table_nbr(tabledef: &[TableDef], table_name: &str) -> Option<u16> {
    tabledef
        .iter()
        .position(|t| t.header.table_name == table_name)
        .map(|i| (i + 1) as u16)
}

/// One entry of a file directory listing.
#[derive(Debug, Clone, PartialEq)]
pub struct FileEntry {
    pub file_name: String,
    pub file_size: u32,
    pub last_update: String,
    pub attribute: Vec<u8>,
}

/// A parsed file directory listing (the logger's `\` file, an ordinary
/// file upload).
#[derive(Debug, Clone, PartialEq)]
pub struct FileDirectory {
    pub dir_version: u8,
    pub files: Vec<FileEntry>,
}

/// Parse a file directory listing.
pub fn parse_filedir(raw: &[u8]) -> Result<FileDirectory, Error> {
    let mut offset = 0usize;
    let dir_version = *raw
        .first()
        .ok_or_else(|| Error::MalformedCodec("empty file directory".into()))?;
    offset += 1;

    let mut files = Vec::new();
    loop {
        let (file_name, size) = decode_asciiz(&raw[offset..])?;
        offset += size;
        if file_name.is_empty() {
            break;
        }

        let (vals, size) = codec::decode(
            &[PrimitiveType::UInt4, PrimitiveType::AsciiZ],
            &raw[offset..],
            None,
        )?;
        offset += size;
        let file_size = vals[0].as_u32().unwrap();
        let last_update = ascii_string(&vals[1])?;

        let mut attribute = Vec::new();
        for _ in 0..12 {
            let a = *raw
                .get(offset)
                .ok_or_else(|| Error::MalformedCodec("truncated attribute list".into()))?;
            offset += 1;
            if a == 0 {
                break;
            }
            attribute.push(a);
        }

        files.push(FileEntry {
            file_name,
            file_size,
            last_update,
            attribute,
        });
    }

    Ok(FileDirectory { dir_version, files })
}

/// A single decoded data record.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub rec_nbr: u32,
    pub time_of_rec: (i32, i32),
    pub fields: Vec<(String, Vec<Value>)>,
}

/// One fragment of a Collect Data response: either a complete run of
/// records, or (when `is_offset` is set) a raw byte range of a partial
/// transfer that the caller must reassemble.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordFragment {
    pub table_nbr: u16,
    pub beg_rec_nbr: u32,
    pub table_name: String,
    pub is_offset: bool,
    pub byte_offset: Option<u32>,
    pub records: Vec<Record>,
    pub raw_frag: Option<Vec<u8>>,
}

/// Parse the `RecData` payload of a Collect Data response against the
/// already-parsed table definitions. Returns the record fragments and the
/// `MoreRecsExist` flag.
pub fn parse_collectdata(
    raw: &[u8],
    tabledef: &[TableDef],
    field_nbr: &[u16],
) -> Result<(Vec<RecordFragment>, bool), Error> {
    let mut offset = 0usize;
    let mut recdata = Vec::new();

    while offset + 1 < raw.len() {
        let (vals, size) = codec::decode(
            &[PrimitiveType::UInt2, PrimitiveType::UInt4],
            &raw[offset..],
            None,
        )?;
        offset += size;
        let table_nbr = vals[0].as_u16().unwrap();
        let beg_rec_nbr = vals[1].as_u32().unwrap();

        let table = tabledef
            .get(table_nbr as usize - 1)
            .ok_or_else(|| Error::TableNotFound(format!("table #{}", table_nbr)))?;
        let table_name = table.header.table_name.clone();

        let isoffset_byte = *raw
            .get(offset)
            .ok_or_else(|| Error::MalformedCodec("truncated record fragment".into()))?;
        let is_offset = isoffset_byte >> 7 != 0;

        let mut frag = RecordFragment {
            table_nbr,
            beg_rec_nbr,
            table_name,
            is_offset,
            byte_offset: None,
            records: Vec::new(),
            raw_frag: None,
        };

        if is_offset {
            let (vals, size) = codec::decode(&[PrimitiveType::UInt4], &raw[offset..], None)?;
            offset += size;
            let byteoffset = vals[0].as_u32().unwrap() & 0x7FFF_FFFF;
            frag.byte_offset = Some(byteoffset);
            // Remaining bytes (minus the trailing MoreRecsExist byte) are an
            // opaque partial transfer the caller must reassemble.
            frag.raw_frag = Some(raw[offset..raw.len() - 1].to_vec());
            offset = raw.len() - 1;
        } else {
            let (vals, size) = codec::decode(&[PrimitiveType::UInt2], &raw[offset..], None)?;
            offset += size;
            let nbr_of_recs = vals[0].as_u16().unwrap() & 0x7FFF;

            let interval = table.header.tbl_interval;
            let event_driven = interval == (0, 0);
            let mut timeofrec: Option<(i32, i32)> = None;
            if !event_driven {
                let (vals, size) = codec::decode(&[PrimitiveType::NSec], &raw[offset..], None)?;
                offset += size;
                timeofrec = Some(vals[0].as_time().unwrap());
            }

            let field_list: Vec<u16> = if field_nbr.is_empty() {
                (1..=table.fields.len() as u16).collect()
            } else {
                field_nbr.to_vec()
            };

            for n in 0..nbr_of_recs {
                let time_of_rec = match timeofrec {
                    Some((s, t)) => (
                        s + n as i32 * interval.0,
                        t + n as i32 * interval.1,
                    ),
                    None => {
                        let (vals, size) =
                            codec::decode(&[PrimitiveType::NSec], &raw[offset..], None)?;
                        offset += size;
                        vals[0].as_time().unwrap()
                    }
                };

                let mut fields = Vec::with_capacity(field_list.len());
                for &f in &field_list {
                    let def = table
                        .fields
                        .get(f as usize - 1)
                        .ok_or_else(|| Error::FieldNotResolved(vec![f.to_string()]))?;
                    let (values, size) = if def.field_type == PrimitiveType::Ascii {
                        codec::decode(&[PrimitiveType::Ascii], &raw[offset..], Some(def.dimension as usize))?
                    } else {
                        let types = vec![def.field_type; def.dimension as usize];
                        codec::decode(&types, &raw[offset..], None)?
                    };
                    offset += size;
                    fields.push((def.field_name.clone(), values));
                }

                frag.records.push(Record {
                    rec_nbr: beg_rec_nbr + n as u32,
                    time_of_rec,
                    fields,
                });
            }
        }

        recdata.push(frag);
    }

    let (vals, _) = codec::decode(&[PrimitiveType::Bool], &raw[offset..], None)?;
    let more_recs_exist = vals[0].as_bool().unwrap();

    Ok((recdata, more_recs_exist))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tabledef_bytes() -> Vec<u8> {
        let mut raw = vec![4u8]; // FslVersion
        raw.extend(codec::encode(
            &[
                PrimitiveType::AsciiZ,
                PrimitiveType::UInt4,
                PrimitiveType::Byte,
                PrimitiveType::NSec,
                PrimitiveType::NSec,
            ],
            &[
                Value::Ascii(b"Table1".to_vec()),
                Value::U32(0),
                Value::U8(0),
                Value::Time(0, 0),
                Value::Time(60, 0),
            ],
        )
        .unwrap());

        // one field: FP4, named "Temp", no alias, one dimension
        raw.push(PrimitiveType::Fp4.code()); // not read-only
        raw.extend(codec::encode(&[PrimitiveType::AsciiZ], &[Value::Ascii(b"Temp".to_vec())]).unwrap());
        raw.push(0); // alias terminator
        raw.extend(codec::encode(
            &[
                PrimitiveType::AsciiZ,
                PrimitiveType::AsciiZ,
                PrimitiveType::AsciiZ,
                PrimitiveType::UInt4,
                PrimitiveType::UInt4,
            ],
            &[
                Value::Ascii(b"Smp".to_vec()),
                Value::Ascii(b"Deg C".to_vec()),
                Value::Ascii(b"Air temperature".to_vec()),
                Value::U32(1),
                Value::U32(1),
            ],
        )
        .unwrap());
        raw.extend(codec::encode(&[PrimitiveType::UInt4], &[Value::U32(0)]).unwrap()); // subdim terminator
        raw.push(0); // field list terminator

        raw
    }

    #[test]
    fn parse_tabledef_single_table() {
        let raw = sample_tabledef_bytes();
        let tables = parse_tabledef(&raw).unwrap();
        assert_eq!(tables.len(), 1);
        let t = &tables[0];
        assert_eq!(t.header.table_name, "Table1");
        assert_eq!(t.header.tbl_interval, (60, 0));
        assert_eq!(t.fields.len(), 1);
        assert_eq!(t.fields[0].field_name, "Temp");
        assert_eq!(t.fields[0].field_type, PrimitiveType::Fp4);
        assert!(!t.fields[0].read_only);
    }

    #[test]
    fn parse_filedir_lists_files() {
        let mut raw = vec![1u8]; // DirVersion
        raw.extend(codec::encode(&[PrimitiveType::AsciiZ], &[Value::Ascii(b"CPU:prog.cr1".to_vec())]).unwrap());
        raw.extend(codec::encode(
            &[PrimitiveType::UInt4, PrimitiveType::AsciiZ],
            &[Value::U32(4096), Value::Ascii(b"2020-01-01".to_vec())],
        )
        .unwrap());
        raw.push(0); // no attributes
        raw.push(0); // directory terminator (empty file name)

        let fd = parse_filedir(&raw).unwrap();
        assert_eq!(fd.dir_version, 1);
        assert_eq!(fd.files.len(), 1);
        assert_eq!(fd.files[0].file_name, "CPU:prog.cr1");
        assert_eq!(fd.files[0].file_size, 4096);
    }

    #[test]
    fn parse_collectdata_event_driven_table() {
        let raw = sample_tabledef_bytes();
        let tables = parse_tabledef(&raw).unwrap();
        assert_eq!(get_table_nbr(&tables, "Table1"), Some(1));

        // event-driven variant: zero interval forces per-record timestamps
        let mut event_tables = tables.clone();
        event_tables[0].header.tbl_interval = (0, 0);

        let mut rec = vec![];
        rec.extend(codec::encode(
            &[PrimitiveType::UInt2, PrimitiveType::UInt4],
            &[Value::U16(1), Value::U32(100)],
        )
        .unwrap());
        rec.extend(codec::encode(&[PrimitiveType::UInt2], &[Value::U16(1)]).unwrap()); // NbrOfRecs=1, IsOffset=0
        rec.extend(codec::encode(&[PrimitiveType::NSec], &[Value::Time(10, 0)]).unwrap());
        rec.extend(codec::encode(&[PrimitiveType::Fp4], &[Value::Bytes(vec![0x00, 0x00, 0x15, 0x50])]).unwrap());
        rec.extend(codec::encode(&[PrimitiveType::Bool], &[Value::Bool(false)]).unwrap());

        let (frags, more) = parse_collectdata(&rec, &event_tables, &[]).unwrap();
        assert_eq!(frags.len(), 1);
        assert!(!more);
        let frag = &frags[0];
        assert_eq!(frag.table_name, "Table1");
        assert_eq!(frag.records.len(), 1);
        assert_eq!(frag.records[0].rec_nbr, 100);
        assert_eq!(frag.records[0].time_of_rec, (10, 0));
        assert_eq!(frag.records[0].fields[0].0, "Temp");
    }

    #[test]
    fn parse_collectdata_interval_table_derives_timestamps() {
        let raw = sample_tabledef_bytes();
        let tables = parse_tabledef(&raw).unwrap(); // TblInterval = (60, 0)

        let mut rec = vec![];
        rec.extend(codec::encode(
            &[PrimitiveType::UInt2, PrimitiveType::UInt4],
            &[Value::U16(1), Value::U32(1)],
        )
        .unwrap());
        rec.extend(codec::encode(&[PrimitiveType::UInt2], &[Value::U16(2)]).unwrap()); // NbrOfRecs=2
        rec.extend(codec::encode(&[PrimitiveType::NSec], &[Value::Time(1000, 0)]).unwrap());
        rec.extend(codec::encode(&[PrimitiveType::Fp4], &[Value::Bytes(vec![0x00, 0x00, 0x01, 0x00])]).unwrap());
        rec.extend(codec::encode(&[PrimitiveType::Fp4], &[Value::Bytes(vec![0x00, 0x00, 0x02, 0x00])]).unwrap());
        rec.extend(codec::encode(&[PrimitiveType::Bool], &[Value::Bool(false)]).unwrap());

        let (frags, _) = parse_collectdata(&rec, &tables, &[]).unwrap();
        assert_eq!(frags[0].records[0].time_of_rec, (1000, 0));
        assert_eq!(frags[0].records[1].time_of_rec, (1060, 0));
    }
}
