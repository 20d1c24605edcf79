use std::io::{Read, Seek};

use serde::{Deserialize, Serialize};

use crate::context::{DecodeContext, EncodeContext, FooterWidth};
use crate::error::{Result, WsgError};
use crate::reader::SaveReader;
use crate::writer::SaveWriter;

pub const ITEM_PART_COUNT: usize = 9;
pub const WEAPON_PART_COUNT: usize = 14;

/// Prefix of part names that live in the DLC backpack.
pub const DLC_PART_PREFIX: &str = "dlc";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObjectKind {
    Item,
    Weapon,
}

impl ObjectKind {
    pub fn part_count(self) -> usize {
        match self {
            Self::Item => ITEM_PART_COUNT,
            Self::Weapon => WEAPON_PART_COUNT,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Item => "item",
            Self::Weapon => "weapon",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectFlags {
    pub junk: i32,
    pub locked: i32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectValues {
    /// Quantity for items, loaded ammo for weapons.
    pub quantity: i32,
    pub quality: i16,
    pub equipped_slot: i32,
    pub level: i16,
    /// Present only for objects read at `ENHANCED_VERSION` or later.
    pub flags: Option<ObjectFlags>,
}

impl ObjectValues {
    /// Number of values stored on disk: 4 or 6.
    pub fn value_count(&self) -> usize {
        if self.flags.is_some() {
            FooterWidth::Modern.value_count()
        } else {
            FooterWidth::Legacy.value_count()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryObject {
    pub kind: ObjectKind,
    pub parts: Vec<String>,
    pub values: ObjectValues,
}

pub fn pack_quality_level(quality: i16, level: i16) -> i32 {
    i32::from(quality).wrapping_add(i32::from(level).wrapping_mul(0x10000))
}

pub fn unpack_quality_level(word: i32) -> (i16, i16) {
    ((word % 0x10000) as i16, (word / 0x10000) as i16)
}

impl InventoryObject {
    pub fn new(kind: ObjectKind, parts: Vec<String>, values: ObjectValues) -> Self {
        Self {
            kind,
            parts,
            values,
        }
    }

    pub fn decode<R: Read + Seek>(
        r: &mut SaveReader<R>,
        kind: ObjectKind,
        ctx: &DecodeContext,
    ) -> Result<Self> {
        let mut parts = Vec::with_capacity(kind.part_count());
        for _ in 0..kind.part_count() {
            parts.push(r.read_string()?);
        }

        let quantity = r.read_i32()?;
        let (quality, level) = unpack_quality_level(r.read_i32()?);
        let equipped_slot = r.read_i32()?;
        let flags = if ctx.footer() == FooterWidth::Modern {
            let junk = read_tolerant_flag(r)?;
            let locked = read_tolerant_flag(r)?;
            Some(ObjectFlags { junk, locked })
        } else {
            None
        };

        Ok(Self {
            kind,
            parts,
            values: ObjectValues {
                quantity,
                quality,
                equipped_slot,
                level,
                flags,
            },
        })
    }

    pub fn encode(&self, w: &mut SaveWriter, ctx: &EncodeContext) -> Result<()> {
        if self.parts.len() != self.kind.part_count() {
            return Err(WsgError::format(
                w.position(),
                format!(
                    "{} has {} parts, expected {}",
                    self.kind.as_str(),
                    self.parts.len(),
                    self.kind.part_count()
                ),
            ));
        }
        for part in &self.parts {
            w.write_string(part)?;
        }

        let v = &self.values;
        w.write_i32(v.quantity)?;
        w.write_i32(pack_quality_level(v.quality, v.level))?;
        w.write_i32(v.equipped_slot)?;
        if ctx.footer() == FooterWidth::Modern {
            let flags = v.flags.unwrap_or_default();
            w.write_i32(flags.junk)?;
            w.write_i32(flags.locked)?;
        }
        Ok(())
    }

    /// Whether pack splitting routes this object to the DLC backpack.
    pub fn belongs_in_secondary_pack(&self) -> bool {
        self.values.level != 0
            || self
                .parts
                .first()
                .is_some_and(|part| part.starts_with(DLC_PART_PREFIX))
    }
}

/// Junk/locked are only trusted as 0 or 1. Anything else means the field
/// was never written, so the read is undone and 0 is used.
fn read_tolerant_flag<R: Read + Seek>(r: &mut SaveReader<R>) -> Result<i32> {
    let value = r.read_i32()?;
    if value == 0 || value == 1 {
        return Ok(value);
    }
    r.rewind(4)?;
    Ok(0)
}

pub fn decode_list<R: Read + Seek>(
    r: &mut SaveReader<R>,
    kind: ObjectKind,
    ctx: &DecodeContext,
) -> Result<Vec<InventoryObject>> {
    let count = r.read_count(kind.as_str())?;
    let mut objects = Vec::with_capacity(count.min(1024));
    for _ in 0..count {
        objects.push(InventoryObject::decode(r, kind, ctx)?);
    }
    Ok(objects)
}

pub fn encode_list<'a, I>(w: &mut SaveWriter, objects: I, ctx: &EncodeContext) -> Result<()>
where
    I: ExactSizeIterator<Item = &'a InventoryObject>,
{
    w.write_count(objects.len(), "inventory")?;
    for object in objects {
        object.encode(w, ctx)?;
    }
    Ok(())
}

/// Route objects to the primary list or the DLC backpack, preserving order.
pub fn split_packs(
    objects: &[InventoryObject],
    secondary_enabled: bool,
) -> (Vec<&InventoryObject>, Vec<&InventoryObject>) {
    if !secondary_enabled {
        return (objects.iter().collect(), Vec::new());
    }
    objects
        .iter()
        .partition(|object| !object.belongs_in_secondary_pack())
}
