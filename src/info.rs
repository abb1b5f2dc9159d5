use memchr::memmem;
use serde::Serialize;

use crate::layout::FlashLayout;
use crate::reader::{FlashError, FlashReader};

/// Marker string the firmware places right after the BLE advertising name.
const BLE_NAME_MARKER: &[u8] = b"multiConfigLink_status";
/// Fixed width of the NUL-padded advertising-name field.
const BLE_NAME_LEN: u32 = 0x15;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BleAdName {
    pub address: u32,
    pub name: String,
}

/// Identity fields the firmware keeps at fixed addresses, plus the BLE
/// advertising name located by marker scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceInfo {
    pub adc_calibration: u32,
    pub mac: [u8; 6],
    pub ble_ad_names: Vec<BleAdName>,
}

impl DeviceInfo {
    pub fn mac_string(&self) -> String {
        self.mac
            .iter()
            .map(|b| format!("{b:02X}"))
            .collect::<Vec<_>>()
            .join(":")
    }
}

/// Read the fixed-address identity fields and scan the first
/// `layout.name_scan_len` bytes for the advertising name. The name sits
/// `0x15` bytes before the marker; its first other occurrence in the scan
/// window is reported as well.
pub fn read_device_info(
    r: &mut FlashReader<'_>,
    layout: &FlashLayout,
) -> Result<DeviceInfo, FlashError> {
    let adc_calibration = r.read_u32_at(layout.adc_calibration_addr)?;
    let mac_bytes = r.read_bytes_at(layout.mac_addr, 6)?;
    let mut mac = [0u8; 6];
    mac.copy_from_slice(mac_bytes);

    let mut ble_ad_names = Vec::new();
    r.seek(layout.flash_base)?;
    let window = match r.read_bytes(layout.name_scan_len as usize) {
        Ok(w) => w,
        // Short captures scan whatever is there.
        Err(FlashError::TruncatedRead { available, .. }) => {
            r.seek(layout.flash_base)?;
            r.read_bytes(available)?
        }
        Err(e) => return Err(e),
    };
    if let Some(marker_off) = memmem::find(window, BLE_NAME_MARKER) {
        if let Some(name_off) = (marker_off as u32).checked_sub(BLE_NAME_LEN) {
            let addr = layout.flash_base + name_off;
            let raw = r.read_bytes_at(addr, BLE_NAME_LEN as usize)?;
            let trimmed = trim_nuls(raw);
            ble_ad_names.push(BleAdName {
                address: addr,
                name: String::from_utf8_lossy(trimmed).into_owned(),
            });
            if !trimmed.is_empty() {
                if let Some(other) = memmem::find(window, trimmed) {
                    let other_addr = layout.flash_base + other as u32;
                    if other_addr != addr {
                        ble_ad_names.push(BleAdName {
                            address: other_addr,
                            name: String::from_utf8_lossy(trimmed).into_owned(),
                        });
                    }
                }
            }
        }
    }

    Ok(DeviceInfo {
        adc_calibration,
        mac,
        ble_ad_names,
    })
}

fn trim_nuls(buf: &[u8]) -> &[u8] {
    let end = buf.iter().rposition(|&b| b != 0).map_or(0, |p| p + 1);
    &buf[..end]
}
