use serde::Serialize;
use tracing::{debug, warn};

use crate::checksum::crc16;
use crate::layout::FlashLayout;
use crate::reader::FlashReader;
use crate::tables::{ChecksumEntry, Scan};

/// Initial CRC register value the firmware uses when verifying sections.
pub const SECTION_CRC_INIT: u16 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ChecksumStatus {
    Matched,
    Mismatched,
    /// The mapped offset points outside the flash window (RAM or an
    /// external bus); the region is not locally addressable, so no
    /// checksum is computed.
    OutOfRange,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    pub entry: ChecksumEntry,
    pub computed: Option<u16>,
    pub status: ChecksumStatus,
}

/// Recompute every in-window entry's checksum and classify it. A read
/// failure stops validation and is reported in the scan error; results up
/// to that point are kept.
pub fn validate_entries(
    r: &mut FlashReader<'_>,
    layout: &FlashLayout,
    entries: &[ChecksumEntry],
) -> Scan<ValidationResult> {
    let mut results = Vec::with_capacity(entries.len());
    for entry in entries {
        if !layout.in_flash_window(entry.mapped_offset) {
            results.push(ValidationResult {
                entry: *entry,
                computed: None,
                status: ChecksumStatus::OutOfRange,
            });
            continue;
        }
        // A zero-length region checksums to the init value itself.
        let data = match r.read_bytes_at(entry.mapped_offset, entry.length as usize) {
            Ok(d) => d,
            Err(e) => {
                warn!(%e, record_addr = entry.record_addr, "section read failed");
                return Scan {
                    entries: results,
                    error: Some(e),
                };
            }
        };
        let computed = crc16(data, SECTION_CRC_INIT);
        let status = if computed == entry.stored_checksum {
            ChecksumStatus::Matched
        } else {
            ChecksumStatus::Mismatched
        };
        debug!(
            record_addr = entry.record_addr,
            stored = entry.stored_checksum,
            computed,
            ?status,
            "section checked"
        );
        results.push(ValidationResult {
            entry: *entry,
            computed: Some(computed),
            status,
        });
    }
    Scan {
        entries: results,
        error: None,
    }
}
