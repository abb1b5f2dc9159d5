/// Reflected CRC-16/MODBUS polynomial.
const POLY: u16 = 0xA001;

/// CRC-16/MODBUS over `data`, no final XOR. The firmware's section
/// verifier runs this with `init = 0`; the conventional MODBUS init is
/// `0xFFFF`.
pub fn crc16(data: &[u8], init: u16) -> u16 {
    let mut crc = init;
    for &b in data {
        crc ^= b as u16;
        for _ in 0..8 {
            crc = if crc & 1 != 0 {
                (crc >> 1) ^ POLY
            } else {
                crc >> 1
            };
        }
    }
    crc
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modbus_check_value() {
        assert_eq!(crc16(b"123456789", 0xFFFF), 0x4B37);
    }

    #[test]
    fn empty_input_yields_init() {
        for init in [0u16, 1, 0x1234, 0xFFFF] {
            assert_eq!(crc16(b"", init), init);
        }
    }

    #[test]
    fn zero_init_fixpoints() {
        // A zero register never picks up set bits from zero input.
        assert_eq!(crc16(&[0u8; 64], 0), 0);
        assert_eq!(crc16(&[0xFF], 0), 0x4040);
    }

    #[test]
    fn byte_at_a_time_matches_whole_slice() {
        let data = b"phyflash";
        let mut crc = 0u16;
        for &b in data.iter() {
            crc = crc16(&[b], crc);
        }
        assert_eq!(crc, crc16(data, 0));
    }
}
