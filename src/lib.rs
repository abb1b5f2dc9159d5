pub mod analyze;
pub mod checksum;
pub mod info;
pub mod layout;
pub mod patch;
pub mod reader;
pub mod tables;
pub mod validate;

pub use analyze::{analyze, Analysis};
pub use checksum::crc16;
pub use info::{read_device_info, BleAdName, DeviceInfo};
pub use layout::{FlashLayout, CRC_FIELD_OFFSET};
pub use patch::{PatchOp, PatchSet};
pub use reader::{FlashError, FlashReader, FlashWriter};
pub use tables::{ChecksumEntry, MemoryMapEntry, Scan};
pub use validate::{ChecksumStatus, ValidationResult, SECTION_CRC_INIT};
