use byteorder::{BigEndian, LittleEndian, WriteBytesExt};
use encoding_rs::WINDOWS_1252;

use crate::error::{Result, WsgError};
use crate::platform::ByteOrder;
use crate::reader::MAX_STRING_BYTES;

pub struct SaveWriter {
    out: Vec<u8>,
    order: ByteOrder,
}

impl SaveWriter {
    pub fn new(order: ByteOrder) -> Self {
        Self {
            out: Vec::with_capacity(16 * 1024),
            order,
        }
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.order
    }

    pub fn position(&self) -> u64 {
        self.out.len() as u64
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.out
    }

    pub fn write_u8(&mut self, v: u8) -> Result<()> {
        self.out.write_u8(v)?;
        Ok(())
    }

    pub fn write_i16(&mut self, v: i16) -> Result<()> {
        match self.order {
            ByteOrder::Little => self.out.write_i16::<LittleEndian>(v)?,
            ByteOrder::Big => self.out.write_i16::<BigEndian>(v)?,
        }
        Ok(())
    }

    pub fn write_u16(&mut self, v: u16) -> Result<()> {
        match self.order {
            ByteOrder::Little => self.out.write_u16::<LittleEndian>(v)?,
            ByteOrder::Big => self.out.write_u16::<BigEndian>(v)?,
        }
        Ok(())
    }

    pub fn write_i32(&mut self, v: i32) -> Result<()> {
        match self.order {
            ByteOrder::Little => self.out.write_i32::<LittleEndian>(v)?,
            ByteOrder::Big => self.out.write_i32::<BigEndian>(v)?,
        }
        Ok(())
    }

    pub fn write_u32(&mut self, v: u32) -> Result<()> {
        match self.order {
            ByteOrder::Little => self.out.write_u32::<LittleEndian>(v)?,
            ByteOrder::Big => self.out.write_u32::<BigEndian>(v)?,
        }
        Ok(())
    }

    pub fn write_f32(&mut self, v: f32) -> Result<()> {
        match self.order {
            ByteOrder::Little => self.out.write_f32::<LittleEndian>(v)?,
            ByteOrder::Big => self.out.write_f32::<BigEndian>(v)?,
        }
        Ok(())
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.out.extend_from_slice(bytes);
        Ok(())
    }

    pub fn write_count(&mut self, count: usize, what: &str) -> Result<()> {
        let count = i32::try_from(count).map_err(|_| {
            WsgError::format(self.position(), format!("{what} count {count} overflows i32"))
        })?;
        self.write_i32(count)
    }

    /// Write a length-prefixed string, picking UTF-16 only when the text has
    /// characters outside Windows-1252.
    pub fn write_string(&mut self, s: &str) -> Result<()> {
        if s.is_empty() {
            return self.write_i32(0);
        }
        if s.contains('\0') {
            return Err(WsgError::format(
                self.position(),
                format!("string {s:?} contains an embedded NUL"),
            ));
        }

        let (narrow, _, unmappable) = WINDOWS_1252.encode(s);
        if !unmappable {
            let byte_len = narrow.len() + 1;
            self.check_string_len(byte_len)?;
            self.write_i32(byte_len as i32)?;
            self.write_bytes(&narrow)?;
            return self.write_u8(0);
        }

        let units: Vec<u16> = s.encode_utf16().collect();
        let unit_len = units.len() + 1;
        self.check_string_len(unit_len * 2)?;
        self.write_i32(-(unit_len as i32))?;
        for unit in units {
            self.write_u16(unit)?;
        }
        self.write_u16(0)
    }

    fn check_string_len(&self, byte_len: usize) -> Result<()> {
        if byte_len as u64 > MAX_STRING_BYTES {
            return Err(WsgError::format(
                self.position(),
                format!("string of {byte_len} bytes exceeds {MAX_STRING_BYTES} bytes"),
            ));
        }
        Ok(())
    }

    /// Overwrite a previously written i32, used for back-patched lengths.
    pub fn patch_i32(&mut self, at: u64, v: i32) -> Result<()> {
        let at = at as usize;
        let bytes = match self.order {
            ByteOrder::Little => v.to_le_bytes(),
            ByteOrder::Big => v.to_be_bytes(),
        };
        let slot = self.out.get_mut(at..at + 4).ok_or_else(|| {
            WsgError::format(at as u64, "length patch outside written output")
        })?;
        slot.copy_from_slice(&bytes);
        Ok(())
    }
}
