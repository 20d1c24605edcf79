pub mod sections;
pub mod types;

use std::io::{Cursor, Read, Seek, SeekFrom};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::context::{DecodeContext, DecodeOptions, EncodeContext};
use crate::dlc::{DecodedDlc, DlcBlock, emit_dlc_block, parse_dlc_block};
use crate::error::{Result, WsgError};
use crate::inventory::{InventoryObject, ObjectKind, decode_list, encode_list, split_packs};
use crate::layout::{Capture, FileLayout, SectionId};
use crate::platform::{ByteOrder, CON_MAGIC, Platform, WSG_MAGIC, WSG_VERSION, detect};
use crate::reader::SaveReader;
use crate::writer::SaveWriter;
use sections::{
    AmmoPool, ChallengeBlock, EchoTable, QuestTable, Skill, emit_ammo_pools, emit_challenge_block,
    emit_echo_tables, emit_int_list, emit_quest_tables, emit_skills, emit_string_list,
    parse_ammo_pools, parse_challenge_block, parse_echo_tables, parse_int_list, parse_quest_tables,
    parse_skills, parse_string_list,
};
use types::{
    CharacterStats, PLAYER_MAGIC, Profile, SaveInfo, UNKNOWN_BLOCK_LEN, VehicleCustomization,
};

/// `"WSG"` plus the version word.
const HEAD_LEN: usize = 7;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveGame {
    pub platform: Platform,
    pub byte_order: ByteOrder,
    pub version: i32,
    pub revision: i32,
    pub character: CharacterStats,
    pub skills: Vec<Skill>,
    pub vehicles: VehicleCustomization,
    pub ammo_pools: Vec<AmmoPool>,
    /// Primary items followed by any secondary-pack items.
    pub items: Vec<InventoryObject>,
    pub backpack_size: i32,
    pub equip_slots: i32,
    /// Primary weapons followed by any secondary-pack weapons.
    pub weapons: Vec<InventoryObject>,
    pub challenges: ChallengeBlock,
    pub locations: Vec<String>,
    pub current_location: String,
    pub save_info: SaveInfo,
    pub quests: Vec<QuestTable>,
    pub profile: Profile,
    pub unknown_block: Option<Vec<u8>>,
    pub promo_codes: Vec<i32>,
    pub new_promo_codes: Vec<i32>,
    pub echoes: Vec<EchoTable>,
    pub dlc: Option<DlcBlock>,
    pub padding: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decoded {
    pub save: SaveGame,
    /// Auto-repair discarded at least one unreadable list.
    pub required_repair: bool,
}

impl SaveGame {
    pub fn decode<R: Read + Seek>(reader: R, options: DecodeOptions) -> Result<Decoded> {
        parse_internal(reader, options, None)
    }

    pub fn decode_with_layout<R: Read + Seek>(
        mut reader: R,
        options: DecodeOptions,
    ) -> Result<(Decoded, FileLayout)> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        let file_len = bytes.len();

        let mut capture = Capture::default();
        let decoded = parse_internal(Cursor::new(bytes), options, Some(&mut capture))?;

        let layout = FileLayout {
            file_len,
            sections: capture.sections,
        };
        layout.validate()?;
        Ok((decoded, layout))
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        emit_internal(self)
    }

    pub fn bank_entry_count(&self) -> usize {
        self.dlc
            .as_ref()
            .and_then(DlcBlock::bank)
            .map_or(0, |bank| bank.entries.len())
    }

    pub fn quest_count(&self) -> usize {
        self.quests.iter().map(|t| t.entries.len()).sum()
    }
}

fn record(capture: &mut Option<&mut Capture>, id: SectionId, start: u64, end: u64) {
    debug!("{} section 0x{start:X}..0x{end:X}", id.as_str());
    if let Some(c) = capture.as_deref_mut() {
        c.record(id, start, end);
    }
}

fn read_head<R: Read + Seek>(reader: &mut R) -> Result<[u8; HEAD_LEN]> {
    let start = reader.stream_position()?;
    let mut head = Vec::with_capacity(HEAD_LEN);
    reader.by_ref().take(HEAD_LEN as u64).read_to_end(&mut head)?;
    reader.seek(SeekFrom::Start(start))?;

    if head.starts_with(CON_MAGIC) {
        return Err(WsgError::Unsupported(
            "Xbox 360 container must be unwrapped before decoding".to_string(),
        ));
    }
    head.try_into().map_err(|head: Vec<u8>| WsgError::Truncated {
        offset: start,
        needed: HEAD_LEN as u64,
        available: head.len() as u64,
    })
}

fn parse_internal<R: Read + Seek>(
    mut reader: R,
    options: DecodeOptions,
    mut capture: Option<&mut Capture>,
) -> Result<Decoded> {
    let head = read_head(&mut reader)?;
    let detection = detect(&head)?;
    let mut r = SaveReader::new(reader, detection.byte_order)?;

    // Header: magic, version, PLYR, revision, character scalars
    let header_start = r.position()?;
    r.expect_literal(WSG_MAGIC)?;
    let version_offset = r.position()?;
    let version = r.read_i32()?;
    if version != WSG_VERSION {
        return Err(WsgError::format(
            version_offset,
            format!("unsupported WSG version {version}"),
        ));
    }
    r.expect_literal(PLAYER_MAGIC)?;
    let revision = r.read_i32()?;
    let mut ctx = DecodeContext::new(revision, options);
    debug!("revision 0x{revision:X}, enhanced: {}", ctx.is_enhanced());

    let character = CharacterStats {
        class: r.read_string()?,
        level: r.read_i32()?,
        experience: r.read_i32()?,
        skill_points: r.read_i32()?,
        unknown1: r.read_i32()?,
        cash: r.read_i32()?,
        finished_playthrough: r.read_i32()?,
    };
    record(&mut capture, SectionId::Header, header_start, r.position()?);

    let start = r.position()?;
    let skills = parse_skills(&mut r)?;
    record(&mut capture, SectionId::Skills, start, r.position()?);

    let start = r.position()?;
    let vehicles = VehicleCustomization {
        color1: r.read_i32()?,
        color2: r.read_i32()?,
        type1: r.read_i32()?,
        type2: r.read_i32()?,
    };
    record(&mut capture, SectionId::Vehicles, start, r.position()?);

    let start = r.position()?;
    let ammo_pools = parse_ammo_pools(&mut r)?;
    record(&mut capture, SectionId::AmmoPools, start, r.position()?);

    // Items, then the two backpack scalars
    let start = r.position()?;
    let mut items = decode_list(&mut r, ObjectKind::Item, &ctx)?;
    let backpack_size = r.read_i32()?;
    let equip_slots = r.read_i32()?;
    record(&mut capture, SectionId::Items, start, r.position()?);

    let start = r.position()?;
    let mut weapons = decode_list(&mut r, ObjectKind::Weapon, &ctx)?;
    record(&mut capture, SectionId::Weapons, start, r.position()?);

    let start = r.position()?;
    let challenges = parse_challenge_block(&mut r)?;
    record(&mut capture, SectionId::Challenges, start, r.position()?);

    let start = r.position()?;
    let locations = parse_string_list(&mut r, "location")?;
    let current_location = r.read_string()?;
    record(&mut capture, SectionId::Locations, start, r.position()?);

    let start = r.position()?;
    let mut save_info = SaveInfo::default();
    for value in &mut save_info.values {
        *value = r.read_i32()?;
    }
    save_info.save_number = r.read_i32()?;
    for value in &mut save_info.tail {
        *value = r.read_i32()?;
    }
    record(&mut capture, SectionId::SaveInfo, start, r.position()?);

    let start = r.position()?;
    let quests = parse_quest_tables(&mut r)?;
    record(&mut capture, SectionId::Quests, start, r.position()?);

    let start = r.position()?;
    let profile = Profile {
        play_time: r.read_i32()?,
        last_played: r.read_string()?,
        character_name: r.read_string()?,
        color1: r.read_i32()?,
        color2: r.read_i32()?,
        color3: r.read_i32()?,
        head: r.read_i32()?,
    };
    record(&mut capture, SectionId::Profile, start, r.position()?);

    let start = r.position()?;
    let unknown_block = if ctx.is_enhanced() {
        Some(r.read_bytes(UNKNOWN_BLOCK_LEN)?)
    } else {
        None
    };
    record(&mut capture, SectionId::Unknown, start, r.position()?);

    let start = r.position()?;
    let promo_codes = parse_int_list(&mut r, "promo code")?;
    let new_promo_codes = parse_int_list(&mut r, "promo code")?;
    record(&mut capture, SectionId::PromoCodes, start, r.position()?);

    let start = r.position()?;
    let echoes = parse_echo_tables(&mut r)?;
    record(&mut capture, SectionId::Echoes, start, r.position()?);

    let start = r.position()?;
    let dlc = if r.is_at_end()? {
        None
    } else {
        let DecodedDlc {
            block,
            pack_items,
            pack_weapons,
        } = parse_dlc_block(&mut r, &mut ctx)?;
        items.extend(pack_items);
        weapons.extend(pack_weapons);
        Some(block)
    };
    record(&mut capture, SectionId::Dlc, start, r.position()?);

    let start = r.position()?;
    let padding = if ctx.is_enhanced() {
        r.read_to_end()?
    } else if !r.is_at_end()? {
        return Err(WsgError::format(
            start,
            format!("{} unexpected bytes after the DLC block", r.remaining()?),
        ));
    } else {
        Vec::new()
    };
    record(&mut capture, SectionId::Padding, start, r.position()?);

    Ok(Decoded {
        save: SaveGame {
            platform: detection.platform,
            byte_order: detection.byte_order,
            version,
            revision,
            character,
            skills,
            vehicles,
            ammo_pools,
            items,
            backpack_size,
            equip_slots,
            weapons,
            challenges,
            locations,
            current_location,
            save_info,
            quests,
            profile,
            unknown_block,
            promo_codes,
            new_promo_codes,
            echoes,
            dlc,
            padding,
        },
        required_repair: ctx.required_repair,
    })
}

fn emit_internal(save: &SaveGame) -> Result<Vec<u8>> {
    let ctx = EncodeContext::new(save.revision);
    let mut w = SaveWriter::new(save.byte_order);

    let secondary = save
        .dlc
        .as_ref()
        .is_some_and(DlcBlock::secondary_pack_enabled);
    let (items, pack_items) = split_packs(&save.items, secondary);
    let (weapons, pack_weapons) = split_packs(&save.weapons, secondary);

    w.write_bytes(WSG_MAGIC)?;
    w.write_i32(WSG_VERSION)?;
    w.write_bytes(PLAYER_MAGIC)?;
    w.write_i32(save.revision)?;

    let c = &save.character;
    w.write_string(&c.class)?;
    w.write_i32(c.level)?;
    w.write_i32(c.experience)?;
    w.write_i32(c.skill_points)?;
    w.write_i32(c.unknown1)?;
    w.write_i32(c.cash)?;
    w.write_i32(c.finished_playthrough)?;

    emit_skills(&mut w, &save.skills)?;

    let v = &save.vehicles;
    w.write_i32(v.color1)?;
    w.write_i32(v.color2)?;
    w.write_i32(v.type1)?;
    w.write_i32(v.type2)?;

    emit_ammo_pools(&mut w, &save.ammo_pools)?;

    encode_list(&mut w, items.iter().copied(), &ctx)?;
    w.write_i32(save.backpack_size)?;
    w.write_i32(save.equip_slots)?;
    encode_list(&mut w, weapons.iter().copied(), &ctx)?;

    emit_challenge_block(&mut w, &save.challenges)?;

    emit_string_list(&mut w, &save.locations, "location")?;
    w.write_string(&save.current_location)?;

    let info = &save.save_info;
    for value in info.values {
        w.write_i32(value)?;
    }
    w.write_i32(info.save_number)?;
    for value in info.tail {
        w.write_i32(value)?;
    }

    emit_quest_tables(&mut w, &save.quests)?;

    let p = &save.profile;
    w.write_i32(p.play_time)?;
    w.write_string(&p.last_played)?;
    w.write_string(&p.character_name)?;
    w.write_i32(p.color1)?;
    w.write_i32(p.color2)?;
    w.write_i32(p.color3)?;
    w.write_i32(p.head)?;

    if ctx.is_enhanced() {
        match &save.unknown_block {
            Some(block) if block.len() != UNKNOWN_BLOCK_LEN => {
                return Err(WsgError::format(
                    w.position(),
                    format!(
                        "unknown block is {} bytes, expected {UNKNOWN_BLOCK_LEN}",
                        block.len()
                    ),
                ));
            }
            Some(block) => w.write_bytes(block)?,
            None => w.write_bytes(&[0; UNKNOWN_BLOCK_LEN])?,
        }
    }

    emit_int_list(&mut w, &save.promo_codes, "promo code")?;
    emit_int_list(&mut w, &save.new_promo_codes, "promo code")?;

    emit_echo_tables(&mut w, &save.echoes)?;

    match &save.dlc {
        Some(block) => emit_dlc_block(&mut w, block, &pack_items, &pack_weapons, &ctx)?,
        None if !save.padding.is_empty() => {
            return Err(WsgError::format(
                w.position(),
                "padding cannot be written without a DLC block",
            ));
        }
        None => {}
    }

    if !save.padding.is_empty() {
        if !ctx.is_enhanced() {
            return Err(WsgError::format(
                w.position(),
                format!("revision 0x{:X} saves carry no padding", save.revision),
            ));
        }
        w.write_bytes(&save.padding)?;
    }

    Ok(w.into_bytes())
}
