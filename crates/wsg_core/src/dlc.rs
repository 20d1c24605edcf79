//! Tagged, length-delimited DLC sections.
//!
//! `total_size, { id, length, body }*`. Known bodies are parsed from their
//! own bounded sub-stream; whatever the schema leaves unread is kept as
//! `trailing` and written back unchanged. Unknown ids keep their whole body
//! that way.

use std::io::{Cursor, Read, Seek};

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::bank::{BankSection, emit_bank_section, parse_bank_section};
use crate::context::{DecodeContext, EncodeContext};
use crate::error::{Result, WsgError};
use crate::inventory::{InventoryObject, ObjectKind, decode_list, encode_list};
use crate::reader::SaveReader;
use crate::writer::SaveWriter;

pub const DLC_BANK_ID: u32 = 0x4321_1234;
pub const DLC_FLAGS_ID: u32 = 0x0215_1984;
pub const DLC_LEVEL_CAP_ID: u32 = 0x3223_5947;
pub const DLC_SECONDARY_PACK_ID: u32 = 0x234B_A901;

/// `id` + `length`
const RECORD_HEADER_LEN: usize = 8;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DlcFlags {
    pub unknown1: u8,
    pub unknown2: u8,
    pub unknown3: u8,
    pub skip_intro: i32,
    pub unknown4: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DlcData {
    Bank(BankSection),
    Flags(DlcFlags),
    LevelCap { unlocked: u8 },
    /// The pack's items and weapons live in the save's own lists.
    SecondaryPack { enabled: u8 },
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DlcSection {
    pub id: u32,
    pub data: DlcData,
    pub trailing: Vec<u8>,
}

impl DlcSection {
    pub fn new(data: DlcData) -> Self {
        let id = match &data {
            DlcData::Bank(_) => DLC_BANK_ID,
            DlcData::Flags(_) => DLC_FLAGS_ID,
            DlcData::LevelCap { .. } => DLC_LEVEL_CAP_ID,
            DlcData::SecondaryPack { .. } => DLC_SECONDARY_PACK_ID,
            DlcData::Unknown => 0,
        };
        Self {
            id,
            data,
            trailing: Vec::new(),
        }
    }

    pub fn unknown(id: u32, body: Vec<u8>) -> Self {
        Self {
            id,
            data: DlcData::Unknown,
            trailing: body,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DlcBlock {
    pub sections: Vec<DlcSection>,
}

impl DlcBlock {
    /// Whether a secondary pack exists and is switched on.
    pub fn secondary_pack_enabled(&self) -> bool {
        self.sections
            .iter()
            .any(|s| matches!(s.data, DlcData::SecondaryPack { enabled } if enabled != 0))
    }

    pub fn bank(&self) -> Option<&BankSection> {
        self.sections.iter().find_map(|s| match &s.data {
            DlcData::Bank(bank) => Some(bank),
            _ => None,
        })
    }
}

/// A decoded block plus the secondary-pack objects pulled out of it.
#[derive(Debug, Default)]
pub struct DecodedDlc {
    pub block: DlcBlock,
    pub pack_items: Vec<InventoryObject>,
    pub pack_weapons: Vec<InventoryObject>,
}

pub fn parse_dlc_block<R: Read + Seek>(
    r: &mut SaveReader<R>,
    ctx: &mut DecodeContext,
) -> Result<DecodedDlc> {
    let block_offset = r.position()?;
    let total_size = r.read_count("DLC block size")?;
    let mut decoded = DecodedDlc::default();

    let mut consumed = 0usize;
    while consumed < total_size {
        let record_offset = r.position()?;
        if consumed + RECORD_HEADER_LEN > total_size {
            return Err(WsgError::format(
                record_offset,
                format!("DLC record header overruns block of {total_size} bytes"),
            ));
        }
        let id = r.read_u32()?;
        let length = r.read_count("DLC section length")?;
        consumed += RECORD_HEADER_LEN;
        if consumed + length > total_size {
            return Err(WsgError::format(
                record_offset,
                format!(
                    "DLC section 0x{id:08X} of {length} bytes overruns block of {total_size} bytes"
                ),
            ));
        }

        let mut body = r.read_sub_stream(length)?;
        consumed += length;
        debug!("DLC section 0x{id:08X} at 0x{record_offset:X}, {length} bytes");

        let section = parse_section(&mut body, id, ctx, &mut decoded)?;
        decoded.block.sections.push(section);
    }

    debug!(
        "DLC block at 0x{block_offset:X}: {} sections",
        decoded.block.sections.len()
    );
    Ok(decoded)
}

fn parse_section(
    body: &mut SaveReader<Cursor<Vec<u8>>>,
    id: u32,
    ctx: &mut DecodeContext,
    decoded: &mut DecodedDlc,
) -> Result<DlcSection> {
    let data = match id {
        DLC_BANK_ID => DlcData::Bank(parse_bank_section(body, ctx)?),
        DLC_FLAGS_ID => DlcData::Flags(DlcFlags {
            unknown1: body.read_u8()?,
            unknown2: body.read_u8()?,
            unknown3: body.read_u8()?,
            skip_intro: body.read_i32()?,
            unknown4: body.read_u8()?,
        }),
        DLC_LEVEL_CAP_ID => DlcData::LevelCap {
            unlocked: body.read_u8()?,
        },
        DLC_SECONDARY_PACK_ID => {
            let enabled = body.read_u8()?;
            if !parse_secondary_lists(body, id, ctx, decoded)? {
                return Ok(DlcSection {
                    id,
                    data: DlcData::SecondaryPack { enabled },
                    trailing: Vec::new(),
                });
            }
            DlcData::SecondaryPack { enabled }
        }
        _ => DlcData::Unknown,
    };

    Ok(DlcSection {
        id,
        data,
        trailing: body.read_to_end()?,
    })
}

/// Read the pack's item and weapon lists into `decoded`. Returns false when
/// auto-repair dropped a list, in which case the rest of the body is gone.
fn parse_secondary_lists(
    body: &mut SaveReader<Cursor<Vec<u8>>>,
    id: u32,
    ctx: &mut DecodeContext,
    decoded: &mut DecodedDlc,
) -> Result<bool> {
    let items = match decode_list(body, ObjectKind::Item, ctx) {
        Ok(items) => items,
        Err(err) => {
            discard_list(ctx, id, ObjectKind::Item, err)?;
            return Ok(false);
        }
    };
    decoded.pack_items.extend(items);

    let weapons = match decode_list(body, ObjectKind::Weapon, ctx) {
        Ok(weapons) => weapons,
        Err(err) => {
            discard_list(ctx, id, ObjectKind::Weapon, err)?;
            return Ok(false);
        }
    };
    decoded.pack_weapons.extend(weapons);
    Ok(true)
}

fn discard_list(ctx: &mut DecodeContext, id: u32, kind: ObjectKind, err: WsgError) -> Result<()> {
    if !ctx.auto_repair {
        return Err(WsgError::Section {
            id,
            source: Box::new(err),
        });
    }
    warn!("discarding unreadable secondary pack {} list: {err}", kind.as_str());
    ctx.required_repair = true;
    Ok(())
}

pub fn emit_dlc_block(
    w: &mut SaveWriter,
    block: &DlcBlock,
    pack_items: &[&InventoryObject],
    pack_weapons: &[&InventoryObject],
    ctx: &EncodeContext,
) -> Result<()> {
    let total_at = w.position();
    w.write_i32(0)?;

    let mut pack_written = false;
    for section in &block.sections {
        w.write_u32(section.id)?;
        let length_at = w.position();
        w.write_i32(0)?;

        match &section.data {
            DlcData::Bank(bank) => emit_bank_section(w, bank, ctx)?,
            DlcData::Flags(flags) => {
                w.write_u8(flags.unknown1)?;
                w.write_u8(flags.unknown2)?;
                w.write_u8(flags.unknown3)?;
                w.write_i32(flags.skip_intro)?;
                w.write_u8(flags.unknown4)?;
            }
            DlcData::LevelCap { unlocked } => w.write_u8(*unlocked)?,
            DlcData::SecondaryPack { enabled } => {
                w.write_u8(*enabled)?;
                // Only the first pack section carries the split-off objects.
                let none: &[&InventoryObject] = &[];
                let (items, weapons) = if pack_written {
                    (none, none)
                } else {
                    (pack_items, pack_weapons)
                };
                encode_list(w, items.iter().copied(), ctx)?;
                encode_list(w, weapons.iter().copied(), ctx)?;
                pack_written = true;
            }
            DlcData::Unknown => {}
        }
        w.write_bytes(&section.trailing)?;
        patch_length(w, length_at)?;
    }

    patch_length(w, total_at)
}

/// Back-patch the i32 at `at` with the number of bytes written after it.
fn patch_length(w: &mut SaveWriter, at: u64) -> Result<()> {
    let len = w.position() - at - 4;
    let len = i32::try_from(len)
        .map_err(|_| WsgError::format(at, format!("length {len} overflows i32")))?;
    w.patch_i32(at, len)
}
