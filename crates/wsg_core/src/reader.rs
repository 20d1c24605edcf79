use std::io::{Cursor, Read, Seek, SeekFrom};

use byteorder::{BigEndian, LittleEndian, ReadBytesExt};
use encoding_rs::{UTF_16BE, UTF_16LE, WINDOWS_1252};

use crate::error::{Result, WsgError};
use crate::platform::ByteOrder;

/// Largest string payload, in bytes, either encoding may carry.
pub const MAX_STRING_BYTES: u64 = 4096;

pub struct SaveReader<R> {
    inner: R,
    order: ByteOrder,
    len: u64,
}

impl<R: Read + Seek> SaveReader<R> {
    pub fn new(mut inner: R, order: ByteOrder) -> Result<Self> {
        let cur = inner.stream_position()?;
        let len = inner.seek(SeekFrom::End(0))?;
        inner.seek(SeekFrom::Start(cur))?;
        Ok(Self { inner, order, len })
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.order
    }

    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn position(&mut self) -> Result<u64> {
        Ok(self.inner.stream_position()?)
    }

    pub fn remaining(&mut self) -> Result<u64> {
        Ok(self.len.saturating_sub(self.position()?))
    }

    pub fn is_at_end(&mut self) -> Result<bool> {
        Ok(self.remaining()? == 0)
    }

    pub fn seek_to(&mut self, pos: u64) -> Result<()> {
        self.inner.seek(SeekFrom::Start(pos))?;
        Ok(())
    }

    pub fn rewind(&mut self, n: u64) -> Result<()> {
        let pos = self.position()?;
        let target = pos.checked_sub(n).ok_or_else(|| {
            WsgError::format(pos, format!("cannot rewind {n} bytes from offset {pos}"))
        })?;
        self.seek_to(target)
    }

    pub fn skip(&mut self, n: u64) -> Result<()> {
        self.ensure(n)?;
        self.inner.seek(SeekFrom::Current(n as i64))?;
        Ok(())
    }

    fn ensure(&mut self, needed: u64) -> Result<()> {
        let offset = self.position()?;
        let available = self.len.saturating_sub(offset);
        if available < needed {
            return Err(WsgError::Truncated {
                offset,
                needed,
                available,
            });
        }
        Ok(())
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        self.ensure(1)?;
        Ok(self.inner.read_u8()?)
    }

    pub fn peek_u8(&mut self) -> Result<u8> {
        let value = self.read_u8()?;
        self.rewind(1)?;
        Ok(value)
    }

    pub fn read_i16(&mut self) -> Result<i16> {
        self.ensure(2)?;
        Ok(match self.order {
            ByteOrder::Little => self.inner.read_i16::<LittleEndian>()?,
            ByteOrder::Big => self.inner.read_i16::<BigEndian>()?,
        })
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        self.ensure(2)?;
        Ok(match self.order {
            ByteOrder::Little => self.inner.read_u16::<LittleEndian>()?,
            ByteOrder::Big => self.inner.read_u16::<BigEndian>()?,
        })
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        self.ensure(4)?;
        Ok(match self.order {
            ByteOrder::Little => self.inner.read_i32::<LittleEndian>()?,
            ByteOrder::Big => self.inner.read_i32::<BigEndian>()?,
        })
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        self.ensure(4)?;
        Ok(match self.order {
            ByteOrder::Little => self.inner.read_u32::<LittleEndian>()?,
            ByteOrder::Big => self.inner.read_u32::<BigEndian>()?,
        })
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        self.ensure(4)?;
        Ok(match self.order {
            ByteOrder::Little => self.inner.read_f32::<LittleEndian>()?,
            ByteOrder::Big => self.inner.read_f32::<BigEndian>()?,
        })
    }

    /// Read a count prefix, rejecting negative values.
    pub fn read_count(&mut self, what: &str) -> Result<usize> {
        let offset = self.position()?;
        let count = self.read_i32()?;
        usize::try_from(count)
            .map_err(|_| WsgError::format(offset, format!("negative {what} count {count}")))
    }

    pub fn read_bytes(&mut self, n: usize) -> Result<Vec<u8>> {
        self.ensure(n as u64)?;
        let mut buf = vec![0u8; n];
        self.inner.read_exact(&mut buf)?;
        Ok(buf)
    }

    pub fn read_to_end(&mut self) -> Result<Vec<u8>> {
        let n = self.remaining()? as usize;
        self.read_bytes(n)
    }

    /// Split the next `n` bytes off into their own reader with the same
    /// byte order. Offsets reported by the sub-reader are relative to it.
    pub fn read_sub_stream(&mut self, n: usize) -> Result<SaveReader<Cursor<Vec<u8>>>> {
        let bytes = self.read_bytes(n)?;
        SaveReader::new(Cursor::new(bytes), self.order)
    }

    /// Read an exact literal, failing with a format error on mismatch.
    pub fn expect_literal(&mut self, literal: &[u8]) -> Result<()> {
        let offset = self.position()?;
        let found = self.read_bytes(literal.len())?;
        if found != literal {
            return Err(WsgError::format(
                offset,
                format!(
                    "expected {:?}, found {:?}",
                    String::from_utf8_lossy(literal),
                    String::from_utf8_lossy(&found)
                ),
            ));
        }
        Ok(())
    }

    /// Read a length-prefixed string.
    ///
    /// Positive lengths are Windows-1252 bytes, negative lengths UTF-16 code
    /// units; both include the trailing NUL, which is not returned.
    pub fn read_string(&mut self) -> Result<String> {
        let offset = self.position()?;
        let raw_len = self.read_i32()?;
        if raw_len == 0 {
            return Ok(String::new());
        }

        let wide = raw_len < 0;
        let byte_len = if wide {
            i64::from(raw_len).unsigned_abs() * 2
        } else {
            raw_len as u64
        };
        if byte_len > MAX_STRING_BYTES {
            return Err(WsgError::format(
                offset,
                format!("string length {byte_len} exceeds {MAX_STRING_BYTES} bytes"),
            ));
        }

        let payload = self.read_bytes(byte_len as usize)?;
        if wide {
            decode_wide(&payload, self.order, offset)
        } else {
            decode_narrow(&payload, offset)
        }
    }

    /// Check, without consuming anything, whether a well-formed string
    /// starts at the current offset.
    pub fn peek_is_string(&mut self) -> Result<bool> {
        let start = self.position()?;
        let valid = self.read_string().is_ok_and(|s| !s.is_empty());
        self.seek_to(start)?;
        Ok(valid)
    }
}

fn decode_narrow(payload: &[u8], offset: u64) -> Result<String> {
    if payload.iter().position(|&b| b == 0) != Some(payload.len() - 1) {
        return Err(WsgError::format(
            offset,
            "string terminator is not the last character",
        ));
    }
    let (text, _) = WINDOWS_1252.decode_without_bom_handling(&payload[..payload.len() - 1]);
    Ok(text.into_owned())
}

fn decode_wide(payload: &[u8], order: ByteOrder, offset: u64) -> Result<String> {
    let terminator = payload
        .chunks_exact(2)
        .position(|unit| unit == [0, 0])
        .map(|unit| unit * 2);
    if terminator != Some(payload.len() - 2) {
        return Err(WsgError::format(
            offset,
            "UTF-16 string terminator is not the last character",
        ));
    }

    let body = &payload[..payload.len() - 2];
    let encoding = match order {
        ByteOrder::Little => UTF_16LE,
        ByteOrder::Big => UTF_16BE,
    };
    encoding
        .decode_without_bom_handling_and_without_replacement(body)
        .map(|text| text.into_owned())
        .ok_or_else(|| WsgError::format(offset, "malformed UTF-16 string"))
}
