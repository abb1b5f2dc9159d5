use serde::Serialize;

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FlashError {
    #[error("address {addr:#010x} outside image {base:#010x}..{end:#010x}")]
    OutOfBounds { addr: u32, base: u32, end: u32 },
    #[error("truncated read at {addr:#010x}: wanted {wanted} bytes, {available} available")]
    TruncatedRead {
        addr: u32,
        wanted: usize,
        available: usize,
    },
}

/// Cursor over a borrowed flash capture. All positions are absolute device
/// addresses, translated to buffer offsets against `base`.
pub struct FlashReader<'a> {
    data: &'a [u8],
    base: u32,
    pos: usize,
}

impl<'a> FlashReader<'a> {
    pub fn new(data: &'a [u8], base: u32) -> Self {
        Self { data, base, pos: 0 }
    }

    /// Absolute address of the cursor.
    pub fn addr(&self) -> u32 {
        self.base.wrapping_add(self.pos as u32)
    }

    fn end(&self) -> u32 {
        self.base.saturating_add(self.data.len() as u32)
    }

    fn oob(&self, addr: u32) -> FlashError {
        FlashError::OutOfBounds {
            addr,
            base: self.base,
            end: self.end(),
        }
    }

    pub fn seek(&mut self, addr: u32) -> Result<(), FlashError> {
        let off = addr.checked_sub(self.base).ok_or_else(|| self.oob(addr))? as usize;
        if off > self.data.len() {
            return Err(self.oob(addr));
        }
        self.pos = off;
        Ok(())
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], FlashError> {
        let available = self.data.len() - self.pos;
        if available < len {
            return Err(FlashError::TruncatedRead {
                addr: self.addr(),
                wanted: len,
                available,
            });
        }
        let out = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(out)
    }

    pub fn read_bytes_at(&mut self, addr: u32, len: usize) -> Result<&'a [u8], FlashError> {
        self.seek(addr)?;
        self.read_bytes(len)
    }

    pub fn read_u16(&mut self) -> Result<u16, FlashError> {
        let b = self.read_bytes(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    pub fn read_u16_at(&mut self, addr: u32) -> Result<u16, FlashError> {
        self.seek(addr)?;
        self.read_u16()
    }

    pub fn read_u32(&mut self) -> Result<u32, FlashError> {
        let b = self.read_bytes(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn read_u32_at(&mut self, addr: u32) -> Result<u32, FlashError> {
        self.seek(addr)?;
        self.read_u32()
    }

    /// Signed reinterpretation of a dword; the memory-map table stores `-1`
    /// as a "no checksum" sentinel.
    pub fn read_i32(&mut self) -> Result<i32, FlashError> {
        Ok(self.read_u32()? as i32)
    }

    pub fn read_i32_at(&mut self, addr: u32) -> Result<i32, FlashError> {
        self.seek(addr)?;
        self.read_i32()
    }
}

/// Owns a copy of a capture for patch application. The original buffer a
/// `FlashReader` borrows is never touched.
pub struct FlashWriter {
    data: Vec<u8>,
    base: u32,
}

impl FlashWriter {
    pub fn new(data: Vec<u8>, base: u32) -> Self {
        Self { data, base }
    }

    fn offset(&self, addr: u32, len: usize) -> Result<usize, FlashError> {
        let end = self.base.saturating_add(self.data.len() as u32);
        let off = addr
            .checked_sub(self.base)
            .ok_or(FlashError::OutOfBounds {
                addr,
                base: self.base,
                end,
            })? as usize;
        if off + len > self.data.len() {
            return Err(FlashError::OutOfBounds {
                addr,
                base: self.base,
                end,
            });
        }
        Ok(off)
    }

    pub fn write_u16(&mut self, addr: u32, val: u16) -> Result<(), FlashError> {
        let off = self.offset(addr, 2)?;
        self.data[off..off + 2].copy_from_slice(&val.to_le_bytes());
        Ok(())
    }

    pub fn write_u32(&mut self, addr: u32, val: u32) -> Result<(), FlashError> {
        let off = self.offset(addr, 4)?;
        self.data[off..off + 4].copy_from_slice(&val.to_le_bytes());
        Ok(())
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.data
    }
}
