//! Bank storage entries.
//!
//! Bank records are not plain inventory objects: each starts with a one-byte
//! type, stores part names as dot-separated components behind a marker byte,
//! and ends with a byte-packed footer whose width follows the revision gate.
//!
//! Older writers produced bank lists whose footers are narrower than the
//! revision says. When a type byte comes out invalid, the reader rewinds and
//! tries the legacy footer, then falls back to scanning for the next part
//! marker. This is a best-effort resynchronisation: it keeps the rest of the
//! file readable but does not guarantee the repaired fields are attributed
//! correctly.

use std::io::{Read, Seek};

use log::warn;
use serde::{Deserialize, Serialize};

use crate::context::{DecodeContext, EncodeContext, FooterWidth};
use crate::error::{Result, WsgError};
use crate::inventory::{
    ITEM_PART_COUNT, WEAPON_PART_COUNT, pack_quality_level, unpack_quality_level,
};
use crate::reader::SaveReader;
use crate::writer::SaveWriter;

pub const BANK_TYPE_WEAPON: u8 = 1;
pub const BANK_TYPE_ITEM: u8 = 2;

pub const PART_MARKER_EMPTY: u8 = 0x00;
pub const PART_MARKER_PRESENT: u8 = 0x20;
pub const PART_DELIMITER: u8 = b'.';
pub const EMPTY_PART_PADDING: u64 = 4;
pub const EMPTY_PART_NAME: &str = "None";

/// Part slot that also carries the packed quality/level word.
pub const QUALITY_LEVEL_SLOT: usize = 2;

const LEGACY_FOOTER_LEN: u64 = 5;
const MODERN_FOOTER_LEN: u64 = 7;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankFlags {
    pub junk: u8,
    pub locked: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankEntry {
    /// 1 for ammo-bearing weapons, 2 for everything else.
    pub type_id: u8,
    pub parts: Vec<String>,
    pub quality: i16,
    pub level: i16,
    /// Ammo for weapons, quantity for items.
    pub amount: i32,
    pub equipped: u8,
    pub flags: Option<BankFlags>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankSection {
    pub capacity: i32,
    pub entries: Vec<BankEntry>,
}

#[derive(Debug, Clone, Copy)]
struct Footer {
    amount: i32,
    equipped: u8,
    flags: Option<BankFlags>,
}

pub fn part_count(type_id: u8) -> Option<usize> {
    match type_id {
        BANK_TYPE_WEAPON => Some(WEAPON_PART_COUNT),
        BANK_TYPE_ITEM => Some(ITEM_PART_COUNT),
        _ => None,
    }
}

fn footer_len(width: FooterWidth) -> u64 {
    match width {
        FooterWidth::Legacy => LEGACY_FOOTER_LEN,
        FooterWidth::Modern => MODERN_FOOTER_LEN,
    }
}

impl BankEntry {
    fn apply_footer(&mut self, footer: Footer) {
        self.amount = footer.amount;
        self.equipped = footer.equipped;
        self.flags = footer.flags;
    }
}

pub fn parse_bank_section<R: Read + Seek>(
    r: &mut SaveReader<R>,
    ctx: &DecodeContext,
) -> Result<BankSection> {
    let capacity = r.read_i32()?;
    let count = r.read_count("bank entry")?;
    let entries = parse_bank_entries(r, count, ctx)?;
    Ok(BankSection { capacity, entries })
}

pub fn parse_bank_entries<R: Read + Seek>(
    r: &mut SaveReader<R>,
    count: usize,
    ctx: &DecodeContext,
) -> Result<Vec<BankEntry>> {
    let mut width = ctx.footer();
    let mut entries: Vec<BankEntry> = Vec::with_capacity(count.min(1024));

    for _ in 0..count {
        let type_offset = r.position()?;
        let mut type_id = r.read_u8()?;
        if part_count(type_id).is_none() {
            type_id = resynchronise(r, type_offset, type_id, entries.last_mut(), width)?;
            width = FooterWidth::Legacy;
        }
        entries.push(parse_entry_body(r, type_id, width)?);
    }

    Ok(entries)
}

/// Find a usable type byte after `raw` at `corrupt_at` turned out invalid.
/// Leaves the reader just past the recovered type byte.
fn resynchronise<R: Read + Seek>(
    r: &mut SaveReader<R>,
    corrupt_at: u64,
    raw: u8,
    previous: Option<&mut BankEntry>,
    width: FooterWidth,
) -> Result<u8> {
    warn!("invalid bank entry type 0x{raw:02X} at 0x{corrupt_at:X}, resynchronising");

    let mut scan_from = corrupt_at;
    if let Some(previous) = previous {
        // The previous footer was probably read one format too wide.
        let footer_start = corrupt_at.checked_sub(footer_len(width)).ok_or_else(|| {
            WsgError::format(corrupt_at, "bank footer rewind before start of section")
        })?;
        r.seek_to(footer_start)?;
        previous.apply_footer(read_footer(r, FooterWidth::Legacy)?);

        let type_offset = r.position()?;
        let type_id = r.read_u8()?;
        if part_count(type_id).is_some() {
            warn!("bank entry resynchronised at 0x{type_offset:X} using the legacy footer");
            return Ok(type_id);
        }
        scan_from = footer_start;
    }

    r.seek_to(scan_from)?;
    let marker_at = loop {
        if r.is_at_end()? {
            return Err(WsgError::format(
                corrupt_at,
                format!("cannot resynchronise bank entry with type 0x{raw:02X}"),
            ));
        }
        let pos = r.position()?;
        if r.read_u8()? == PART_MARKER_PRESENT && pos > scan_from {
            break pos;
        }
    };

    r.seek_to(marker_at - 1)?;
    let type_id = r.read_u8()?;
    if part_count(type_id).is_none() {
        return Err(WsgError::format(
            marker_at - 1,
            format!("bank entry type 0x{type_id:02X} still invalid after resynchronising"),
        ));
    }
    warn!(
        "bank entry resynchronised at 0x{:X}, skipped {} bytes",
        marker_at - 1,
        marker_at - 1 - scan_from
    );
    Ok(type_id)
}

fn parse_entry_body<R: Read + Seek>(
    r: &mut SaveReader<R>,
    type_id: u8,
    width: FooterWidth,
) -> Result<BankEntry> {
    let count = part_count(type_id).ok_or_else(|| {
        WsgError::format(0, format!("invalid bank entry type 0x{type_id:02X}"))
    })?;

    let mut parts = Vec::with_capacity(count);
    let mut quality_level = 0;
    for slot in 0..count {
        let marker_offset = r.position()?;
        let marker = r.read_u8()?;
        if slot == QUALITY_LEVEL_SLOT {
            quality_level = r.read_i32()?;
        }
        match marker {
            PART_MARKER_EMPTY => {
                r.skip(EMPTY_PART_PADDING)?;
                parts.push(EMPTY_PART_NAME.to_string());
            }
            PART_MARKER_PRESENT => parts.push(read_part_name(r)?),
            other => {
                return Err(WsgError::format(
                    marker_offset,
                    format!("unknown bank part marker 0x{other:02X}"),
                ));
            }
        }
    }

    let (quality, level) = unpack_quality_level(quality_level);
    let footer = read_footer(r, width)?;
    Ok(BankEntry {
        type_id,
        parts,
        quality,
        level,
        amount: footer.amount,
        equipped: footer.equipped,
        flags: footer.flags,
    })
}

fn read_part_name<R: Read + Seek>(r: &mut SaveReader<R>) -> Result<String> {
    let mut components = Vec::with_capacity(4);
    components.push(r.read_string()?);
    for _ in 1..3 {
        expect_delimiter(r)?;
        components.push(r.read_string()?);
    }
    if has_fourth_component(r)? {
        expect_delimiter(r)?;
        components.push(r.read_string()?);
    }
    Ok(components.join("."))
}

fn expect_delimiter<R: Read + Seek>(r: &mut SaveReader<R>) -> Result<()> {
    let offset = r.position()?;
    let byte = r.read_u8()?;
    if byte != PART_DELIMITER {
        return Err(WsgError::format(
            offset,
            format!("expected part delimiter, found 0x{byte:02X}"),
        ));
    }
    Ok(())
}

/// A fourth component is a delimiter byte followed by a well-formed string.
fn has_fourth_component<R: Read + Seek>(r: &mut SaveReader<R>) -> Result<bool> {
    if r.remaining()? < 1 || r.peek_u8()? != PART_DELIMITER {
        return Ok(false);
    }
    let start = r.position()?;
    r.skip(1)?;
    let found = r.peek_is_string()?;
    r.seek_to(start)?;
    Ok(found)
}

fn read_footer<R: Read + Seek>(r: &mut SaveReader<R>, width: FooterWidth) -> Result<Footer> {
    let amount = r.read_i32()?;
    let equipped = r.read_u8()?;
    let flags = match width {
        FooterWidth::Modern => Some(BankFlags {
            junk: r.read_u8()?,
            locked: r.read_u8()?,
        }),
        FooterWidth::Legacy => None,
    };
    Ok(Footer {
        amount,
        equipped,
        flags,
    })
}

/// Footers are written at the revision's width, so the list reads back
/// without resynchronising.
pub fn emit_bank_section(
    w: &mut SaveWriter,
    bank: &BankSection,
    ctx: &EncodeContext,
) -> Result<()> {
    w.write_i32(bank.capacity)?;
    w.write_count(bank.entries.len(), "bank entry")?;
    for entry in &bank.entries {
        emit_entry(w, entry, ctx.footer())?;
    }
    Ok(())
}

fn emit_entry(w: &mut SaveWriter, entry: &BankEntry, width: FooterWidth) -> Result<()> {
    let count = part_count(entry.type_id).ok_or_else(|| {
        WsgError::format(
            w.position(),
            format!("cannot write bank entry with type {}", entry.type_id),
        )
    })?;
    if entry.parts.len() != count {
        return Err(WsgError::format(
            w.position(),
            format!(
                "bank entry of type {} has {} parts, expected {count}",
                entry.type_id,
                entry.parts.len()
            ),
        ));
    }

    w.write_u8(entry.type_id)?;
    for (slot, part) in entry.parts.iter().enumerate() {
        let empty = part.is_empty() || part == EMPTY_PART_NAME;
        w.write_u8(if empty {
            PART_MARKER_EMPTY
        } else {
            PART_MARKER_PRESENT
        })?;
        if slot == QUALITY_LEVEL_SLOT {
            w.write_i32(pack_quality_level(entry.quality, entry.level))?;
        }
        if empty {
            w.write_bytes(&[0; EMPTY_PART_PADDING as usize])?;
        } else {
            emit_part_name(w, part)?;
        }
    }

    w.write_i32(entry.amount)?;
    w.write_u8(entry.equipped)?;
    if width == FooterWidth::Modern {
        let flags = entry.flags.unwrap_or_default();
        w.write_u8(flags.junk)?;
        w.write_u8(flags.locked)?;
    }
    Ok(())
}

fn emit_part_name(w: &mut SaveWriter, name: &str) -> Result<()> {
    let components: Vec<&str> = name.split('.').collect();
    if !(3..=4).contains(&components.len()) || components.iter().any(|c| c.is_empty()) {
        return Err(WsgError::format(
            w.position(),
            format!("bank part name {name:?} must have 3 or 4 dot-separated components"),
        ));
    }
    for (i, component) in components.iter().enumerate() {
        if i > 0 {
            w.write_u8(PART_DELIMITER)?;
        }
        w.write_string(component)?;
    }
    Ok(())
}
