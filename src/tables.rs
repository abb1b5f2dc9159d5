use serde::Serialize;
use tracing::{debug, warn};

use crate::layout::FlashLayout;
use crate::reader::{FlashError, FlashReader};

/// One entry of the firmware's memory-remapping table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MemoryMapEntry {
    /// Absolute address of the 16-byte record itself.
    pub record_addr: u32,
    pub src: u32,
    pub length: u32,
    pub dst: u32,
    /// `None` when the record stores the `-1` "no checksum" sentinel.
    pub crc: Option<u32>,
}

/// One entry of the firmware's checksum table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChecksumEntry {
    /// Absolute address of the 16-byte record itself.
    pub record_addr: u32,
    pub offset: u32,
    /// Absolute address of the protected data region.
    pub mapped_offset: u32,
    pub length: u32,
    /// Stored dword truncated to its two significant bytes.
    pub stored_checksum: u16,
}

/// A table scan keeps whatever parsed before the first fatal read error,
/// so a malformed count still yields a partial listing for diagnostics.
#[derive(Debug, Clone, Serialize)]
pub struct Scan<T> {
    pub entries: Vec<T>,
    pub error: Option<FlashError>,
}

impl<T> Scan<T> {
    pub fn is_clean(&self) -> bool {
        self.error.is_none()
    }
}

fn record_addr(table: u32, stride: u32, index: u32) -> Result<u32, FlashError> {
    index
        .checked_mul(stride)
        .and_then(|off| table.checked_add(off))
        .ok_or(FlashError::OutOfBounds {
            addr: table,
            base: table,
            end: table,
        })
}

fn scan_table<T>(
    r: &mut FlashReader<'_>,
    count_addr: u32,
    table_addr: u32,
    stride: u32,
    parse: impl Fn(&mut FlashReader<'_>, u32) -> Result<T, FlashError>,
) -> Scan<T> {
    let count = match r.read_u32_at(count_addr) {
        Ok(n) => n,
        Err(e) => {
            warn!(%e, count_addr, "table count unreadable");
            return Scan {
                entries: Vec::new(),
                error: Some(e),
            };
        }
    };
    debug!(count, table_addr, "scanning table");
    let mut entries = Vec::new();
    for i in 0..count {
        let res = record_addr(table_addr, stride, i).and_then(|addr| {
            r.seek(addr)?;
            parse(r, addr)
        });
        match res {
            Ok(entry) => entries.push(entry),
            Err(e) => {
                warn!(%e, record = i, "table scan aborted");
                return Scan {
                    entries,
                    error: Some(e),
                };
            }
        }
    }
    Scan {
        entries,
        error: None,
    }
}

/// Parse the memory-remapping table. Entries are opaque data; no
/// cross-entry validation happens here.
pub fn parse_memory_map(r: &mut FlashReader<'_>, layout: &FlashLayout) -> Scan<MemoryMapEntry> {
    scan_table(
        r,
        layout.memmap_count_addr,
        layout.memmap_table_addr,
        layout.record_stride,
        |r, record_addr| {
            let src = r.read_u32()?;
            let length = r.read_u32()?;
            let dst = r.read_u32()?;
            let crc = match r.read_i32()? {
                -1 => None,
                v => Some(v as u32),
            };
            Ok(MemoryMapEntry {
                record_addr,
                src,
                length,
                dst,
                crc,
            })
        },
    )
}

/// Parse the checksum table. Validation happens separately, over the
/// parsed entries.
pub fn parse_checksum_table(r: &mut FlashReader<'_>, layout: &FlashLayout) -> Scan<ChecksumEntry> {
    scan_table(
        r,
        layout.checksum_count_addr,
        layout.checksum_table_addr,
        layout.record_stride,
        |r, record_addr| {
            let offset = r.read_u32()?;
            let mapped_offset = r.read_u32()?;
            let length = r.read_u32()?;
            let stored_checksum = r.read_u32()? as u16;
            Ok(ChecksumEntry {
                record_addr,
                offset,
                mapped_offset,
                length,
                stored_checksum,
            })
        },
    )
}
