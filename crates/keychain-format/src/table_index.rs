//! `table_id -> absolute table offset` resolution.

use std::collections::HashMap;

use log::warn;

use crate::error::{ContainerError, Result};
use crate::header::{ApplicationHeader, Schema, TableHeader};
use crate::view::BinaryView;

/// The record-bearing table kinds, plus the two bookkeeping tables
/// (`Schema`, `Meta`) that are never user-dumpable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableKind {
    Schema,
    Meta,
    GenericPassword,
    InternetPassword,
    AppleSharePassword,
    X509Certificate,
    PublicKey,
    PrivateKey,
    SymmetricKey,
}

impl TableKind {
    fn from_table_id(id: u32) -> Option<Self> {
        match id {
            0x0000_0000 => Some(TableKind::Schema),
            0x0000_0001 => Some(TableKind::Meta),
            0x0000_0010 => Some(TableKind::GenericPassword),
            0x0000_0011 => Some(TableKind::InternetPassword),
            0x0000_0012 => Some(TableKind::AppleSharePassword),
            0x0000_0013 => Some(TableKind::X509Certificate),
            0x0000_0014 => Some(TableKind::PublicKey),
            0x0000_0015 => Some(TableKind::PrivateKey),
            0x0000_0016 => Some(TableKind::SymmetricKey),
            _ => None,
        }
    }
}

/// Maps table kinds present in this file to their absolute byte offset.
pub struct TableIndex {
    offsets: HashMap<TableKind, usize>,
}

impl TableIndex {
    /// Walk the schema's table-offset array, reading each table's header just
    /// far enough to learn its `table_id`, and record the absolute offset of
    /// every recognized kind. Unrecognized table ids are skipped, not fatal.
    pub fn build(view: &BinaryView, app_header: &ApplicationHeader, schema: &Schema) -> Result<Self> {
        let mut offsets = HashMap::new();
        for &relative in &schema.table_offsets {
            let absolute = app_header.header_size as usize + relative as usize;
            let header = match TableHeader::decode(view, absolute) {
                Ok(h) => h,
                Err(err) => {
                    warn!("skipping malformed table at {absolute:#x}: {err}");
                    continue;
                }
            };
            match TableKind::from_table_id(header.table_id) {
                Some(kind) => {
                    offsets.insert(kind, absolute);
                }
                None => warn!("unrecognized table_id {:#x} at {absolute:#x}", header.table_id),
            }
        }
        Ok(Self { offsets })
    }

    pub fn offset(&self, kind: TableKind) -> Result<usize> {
        self.offsets.get(&kind).copied().ok_or(ContainerError::TableAbsent)
    }

    pub fn contains(&self, kind: TableKind) -> bool {
        self.offsets.contains_key(&kind)
    }
}
