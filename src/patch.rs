use serde::Serialize;

use crate::layout::{FlashLayout, CRC_FIELD_OFFSET};
use crate::reader::{FlashError, FlashWriter};
use crate::validate::{ChecksumStatus, ValidationResult};

/// A two-byte overwrite of a checksum-table record's stored-CRC field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PatchOp {
    /// Absolute address of the stored-CRC field, not of the data region.
    pub address: u32,
    /// Little-endian encoding of the recomputed checksum.
    pub bytes: [u8; 2],
}

/// Ordered set of corrections, one per mismatched record, in table scan
/// order. Addresses are unique because each record is visited once.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PatchSet {
    ops: Vec<PatchOp>,
}

impl PatchSet {
    /// Plan one PatchOp per `Mismatched` result.
    pub fn plan(results: &[ValidationResult]) -> Self {
        let mut ops = Vec::new();
        for r in results {
            if r.status != ChecksumStatus::Mismatched {
                continue;
            }
            if let Some(computed) = r.computed {
                ops.push(PatchOp {
                    address: r.entry.record_addr + CRC_FIELD_OFFSET,
                    bytes: computed.to_le_bytes(),
                });
            }
        }
        Self { ops }
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn ops(&self) -> &[PatchOp] {
        &self.ops
    }

    /// Produce a corrected copy of `image`. The input buffer is never
    /// mutated; applying the same set to the result again is a no-op.
    pub fn apply(&self, image: &[u8], layout: &FlashLayout) -> Result<Vec<u8>, FlashError> {
        let mut w = FlashWriter::new(image.to_vec(), layout.flash_base);
        for op in &self.ops {
            w.write_u16(op.address, u16::from_le_bytes(op.bytes))?;
        }
        Ok(w.into_inner())
    }
}
