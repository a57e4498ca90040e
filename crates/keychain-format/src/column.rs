//! Column extraction: interprets a record-relative column pointer as one of
//! the four wire encodings.

use log::debug;

use crate::view::{round_up_4, BinaryView};

/// A decoded column value, or absence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnValue {
    Absent,
    Int(i32),
    FourCc([u8; 4]),
    Time(String),
    Bytes(Vec<u8>),
}

impl ColumnValue {
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            ColumnValue::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_fourcc(&self) -> Option<[u8; 4]> {
        match self {
            ColumnValue::FourCc(f) => Some(*f),
            _ => None,
        }
    }
}

/// Extract the column at `record_start + (pointer & !1)`, one of
/// `{absent, i32, FourCC, keychain-time, length-value}`.
///
/// `kind` selects which of the four wire encodings applies; the on-disk
/// format does not self-describe this, callers must know it from the
/// record's schema (this mirrors how the original reads a fixed struct
/// field by its statically-known type).
pub fn extract(view: &BinaryView, record_start: usize, record_size: usize, pointer: u32, kind: ColumnKind) -> ColumnValue {
    if pointer == 0 {
        return ColumnValue::Absent;
    }
    let offset = record_start + (pointer & !1) as usize;
    let record_end = record_start + record_size;

    match kind {
        ColumnKind::Int => match view.i32_be(offset) {
            Ok(v) if offset + 4 <= record_end => ColumnValue::Int(v),
            _ => {
                debug!("int column at {offset:#x} escapes record bounds");
                ColumnValue::Absent
            }
        },
        ColumnKind::FourCc => match view.array4(offset) {
            Ok(v) if offset + 4 <= record_end => ColumnValue::FourCc(v),
            _ => {
                debug!("FourCC column at {offset:#x} escapes record bounds");
                ColumnValue::Absent
            }
        },
        ColumnKind::Time => match view.bytes_at(offset, 16) {
            Ok(v) if offset + 16 <= record_end => {
                String::from_utf8(v.to_vec()).map(ColumnValue::Time).unwrap_or_else(|_| {
                    debug!("keychain time column at {offset:#x} is not valid UTF-8");
                    ColumnValue::Absent
                })
            }
            _ => {
                debug!("time column at {offset:#x} escapes record bounds");
                ColumnValue::Absent
            }
        },
        ColumnKind::LengthValue => extract_lv(view, offset, record_end),
    }
}

/// Which of the four wire encodings a column pointer should be read as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Int,
    FourCc,
    Time,
    LengthValue,
}

fn extract_lv(view: &BinaryView, offset: usize, record_end: usize) -> ColumnValue {
    let declared_len = match view.u32_be(offset) {
        Ok(v) => v as usize,
        Err(_) => return ColumnValue::Absent,
    };
    let payload_start = offset + 4;
    let padded_len = round_up_4(declared_len);
    let padded_end = match payload_start.checked_add(padded_len) {
        Some(e) => e,
        None => return ColumnValue::Absent,
    };
    if padded_end > record_end {
        debug!("padded LV span at {offset:#x} (len {declared_len}) escapes record");
        return ColumnValue::Absent;
    }
    match view.bytes_at(payload_start, declared_len) {
        Ok(bytes) => ColumnValue::Bytes(bytes.to_vec()),
        Err(_) => ColumnValue::Absent,
    }
}
