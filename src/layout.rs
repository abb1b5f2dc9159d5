use serde::{Deserialize, Serialize};

/// Offset of the stored-CRC dword inside a 16-byte checksum-table record
/// (fourth field; only the low two bytes are significant).
pub const CRC_FIELD_OFFSET: u32 = 12;

/// Device-model layout constants. Defaults match the PHY62xx/ST17H66
/// firmware layout; other models can load overrides from JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FlashLayout {
    /// Absolute address of the first byte of the capture.
    pub flash_base: u32,
    pub memmap_count_addr: u32,
    pub memmap_table_addr: u32,
    pub checksum_count_addr: u32,
    pub checksum_table_addr: u32,
    /// Byte distance between consecutive table records.
    pub record_stride: u32,
    /// Window of addresses that are locally checksum-verifiable. A mapped
    /// offset outside it points at RAM or an external bus.
    pub flash_window_start: u32,
    pub flash_window_end: u32,
    pub adc_calibration_addr: u32,
    pub mac_addr: u32,
    /// How far from the base the BLE advertising-name scan looks.
    pub name_scan_len: u32,
}

impl Default for FlashLayout {
    fn default() -> Self {
        Self {
            flash_base: 0x1100_0000,
            memmap_count_addr: 0x1100_2000,
            memmap_table_addr: 0x1100_2100,
            checksum_count_addr: 0x1100_3000,
            checksum_table_addr: 0x1100_3010,
            record_stride: 0x10,
            flash_window_start: 0x1100_0000,
            flash_window_end: 0x1108_0000,
            adc_calibration_addr: 0x1100_1000,
            mac_addr: 0x1100_4000,
            name_scan_len: 0x3_0000,
        }
    }
}

impl FlashLayout {
    pub fn in_flash_window(&self, addr: u32) -> bool {
        addr >= self.flash_window_start && addr < self.flash_window_end
    }
}
