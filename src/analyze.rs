use serde::Serialize;
use tracing::debug;

use crate::layout::FlashLayout;
use crate::patch::PatchSet;
use crate::reader::FlashReader;
use crate::tables::{parse_checksum_table, parse_memory_map, ChecksumEntry, MemoryMapEntry, Scan};
use crate::validate::{validate_entries, ChecksumStatus, ValidationResult};

/// Everything one pass over a capture produces, as pure data. Formatting
/// and any decision to write a corrected file belong to the caller.
#[derive(Debug, Clone, Serialize)]
pub struct Analysis {
    pub memory_map: Scan<MemoryMapEntry>,
    pub checksum_table: Scan<ChecksumEntry>,
    pub validation: Scan<ValidationResult>,
    pub patches: PatchSet,
}

impl Analysis {
    pub fn mismatch_count(&self) -> usize {
        self.validation
            .entries
            .iter()
            .filter(|r| r.status == ChecksumStatus::Mismatched)
            .count()
    }
}

/// Parse both tables, validate every checksum entry, and plan the
/// corrections. Deterministic: the same buffer and layout always yield the
/// same report.
pub fn analyze(image: &[u8], layout: &FlashLayout) -> Analysis {
    let mut r = FlashReader::new(image, layout.flash_base);
    let memory_map = parse_memory_map(&mut r, layout);
    let checksum_table = parse_checksum_table(&mut r, layout);
    let validation = validate_entries(&mut r, layout, &checksum_table.entries);
    let patches = PatchSet::plan(&validation.entries);
    debug!(
        memmap = memory_map.entries.len(),
        checksums = checksum_table.entries.len(),
        patches = patches.len(),
        "analysis complete"
    );
    Analysis {
        memory_map,
        checksum_table,
        validation,
        patches,
    }
}
