use std::io::{Read, Seek};

use serde::{Deserialize, Serialize};

use crate::error::{Result, WsgError};
use crate::reader::SaveReader;
use crate::writer::SaveWriter;

/// Quest name stored when a playthrough has no active quest.
pub const NO_QUEST: &str = "None";

// --- Skills ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Skill {
    pub name: String,
    pub level: i32,
    pub experience: i32,
    pub in_use: i32,
}

pub fn parse_skills<R: Read + Seek>(r: &mut SaveReader<R>) -> Result<Vec<Skill>> {
    let count = r.read_count("skill")?;
    let mut skills = Vec::with_capacity(count.min(256));
    for _ in 0..count {
        skills.push(Skill {
            name: r.read_string()?,
            level: r.read_i32()?,
            experience: r.read_i32()?,
            in_use: r.read_i32()?,
        });
    }
    Ok(skills)
}

pub fn emit_skills(w: &mut SaveWriter, skills: &[Skill]) -> Result<()> {
    w.write_count(skills.len(), "skill")?;
    for skill in skills {
        w.write_string(&skill.name)?;
        w.write_i32(skill.level)?;
        w.write_i32(skill.experience)?;
        w.write_i32(skill.in_use)?;
    }
    Ok(())
}

// --- Ammo pools ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmmoPool {
    pub resource: String,
    pub name: String,
    pub remaining: f32,
    pub level: i32,
}

pub fn parse_ammo_pools<R: Read + Seek>(r: &mut SaveReader<R>) -> Result<Vec<AmmoPool>> {
    let count = r.read_count("ammo pool")?;
    let mut pools = Vec::with_capacity(count.min(256));
    for _ in 0..count {
        pools.push(AmmoPool {
            resource: r.read_string()?,
            name: r.read_string()?,
            remaining: r.read_f32()?,
            level: r.read_i32()?,
        });
    }
    Ok(pools)
}

pub fn emit_ammo_pools(w: &mut SaveWriter, pools: &[AmmoPool]) -> Result<()> {
    w.write_count(pools.len(), "ammo pool")?;
    for pool in pools {
        w.write_string(&pool.resource)?;
        w.write_string(&pool.name)?;
        w.write_f32(pool.remaining)?;
        w.write_i32(pool.level)?;
    }
    Ok(())
}

// --- Plain lists ---

pub fn parse_string_list<R: Read + Seek>(
    r: &mut SaveReader<R>,
    what: &str,
) -> Result<Vec<String>> {
    let count = r.read_count(what)?;
    let mut out = Vec::with_capacity(count.min(1024));
    for _ in 0..count {
        out.push(r.read_string()?);
    }
    Ok(out)
}

pub fn emit_string_list(w: &mut SaveWriter, list: &[String], what: &str) -> Result<()> {
    w.write_count(list.len(), what)?;
    for s in list {
        w.write_string(s)?;
    }
    Ok(())
}

pub fn parse_int_list<R: Read + Seek>(r: &mut SaveReader<R>, what: &str) -> Result<Vec<i32>> {
    let count = r.read_count(what)?;
    let mut out = Vec::with_capacity(count.min(1024));
    for _ in 0..count {
        out.push(r.read_i32()?);
    }
    Ok(out)
}

pub fn emit_int_list(w: &mut SaveWriter, list: &[i32], what: &str) -> Result<()> {
    w.write_count(list.len(), what)?;
    for v in list {
        w.write_i32(*v)?;
    }
    Ok(())
}

// --- Challenges ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChallengeEntry {
    pub id: i16,
    pub type_id: u8,
    pub value: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChallengeBlock {
    pub id: i32,
    pub entries: Vec<ChallengeEntry>,
    /// Bytes left in the data region after the last entry.
    pub trailing: Vec<u8>,
}

/// `block_len, { block_id, data_len, { count:i16, entries.. } }`
pub fn parse_challenge_block<R: Read + Seek>(r: &mut SaveReader<R>) -> Result<ChallengeBlock> {
    let block_offset = r.position()?;
    let block_len = r.read_count("challenge block length")?;
    let mut block = r.read_sub_stream(block_len)?;

    let id = block.read_i32()?;
    let data_len = block.read_count("challenge data length")?;
    let mut data = block.read_sub_stream(data_len)?;
    if !block.is_at_end()? {
        return Err(WsgError::format(
            block_offset,
            format!(
                "challenge block has {} bytes past its data region",
                block.remaining()?
            ),
        ));
    }

    let count = data.read_i16()?;
    let count = usize::try_from(count).map_err(|_| {
        WsgError::format(block_offset, format!("negative challenge count {count}"))
    })?;
    let mut entries = Vec::with_capacity(count);
    for _ in 0..count {
        entries.push(ChallengeEntry {
            id: data.read_i16()?,
            type_id: data.read_u8()?,
            value: data.read_i32()?,
        });
    }
    let trailing = data.read_to_end()?;

    Ok(ChallengeBlock {
        id,
        entries,
        trailing,
    })
}

pub fn emit_challenge_block(w: &mut SaveWriter, block: &ChallengeBlock) -> Result<()> {
    let count = i16::try_from(block.entries.len()).map_err(|_| {
        WsgError::format(
            w.position(),
            format!("{} challenges overflow i16", block.entries.len()),
        )
    })?;

    let block_len_at = w.position();
    w.write_i32(0)?;
    w.write_i32(block.id)?;
    let data_len_at = w.position();
    w.write_i32(0)?;

    w.write_i16(count)?;
    for entry in &block.entries {
        w.write_i16(entry.id)?;
        w.write_u8(entry.type_id)?;
        w.write_i32(entry.value)?;
    }
    w.write_bytes(&block.trailing)?;

    let end = w.position();
    w.patch_i32(data_len_at, (end - data_len_at - 4) as i32)?;
    w.patch_i32(block_len_at, (end - block_len_at - 4) as i32)
}

// --- Quests ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestObjective {
    pub description: String,
    pub progress: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestEntry {
    pub name: String,
    pub progress: i32,
    pub dlc_value_1: i32,
    pub dlc_value_2: i32,
    pub objectives: Vec<QuestObjective>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestTable {
    pub index: i32,
    pub current_quest: String,
    pub entries: Vec<QuestEntry>,
}

pub fn parse_quest_tables<R: Read + Seek>(r: &mut SaveReader<R>) -> Result<Vec<QuestTable>> {
    let count = r.read_count("quest table")?;
    let mut tables = Vec::with_capacity(count.min(16));
    for _ in 0..count {
        tables.push(parse_quest_table(r)?);
    }
    Ok(tables)
}

fn parse_quest_table<R: Read + Seek>(r: &mut SaveReader<R>) -> Result<QuestTable> {
    let index = r.read_i32()?;
    let mut current_quest = r.read_string()?;

    let count = r.read_count("quest")?;
    let mut entries = Vec::with_capacity(count.min(1024));
    for _ in 0..count {
        let name = r.read_string()?;
        let progress = r.read_i32()?;
        let dlc_value_1 = r.read_i32()?;
        let dlc_value_2 = r.read_i32()?;

        let objective_count = r.read_count("quest objective")?;
        let mut objectives = Vec::with_capacity(objective_count.min(64));
        for _ in 0..objective_count {
            objectives.push(QuestObjective {
                description: r.read_string()?,
                progress: r.read_i32()?,
            });
        }

        entries.push(QuestEntry {
            name,
            progress,
            dlc_value_1,
            dlc_value_2,
            objectives,
        });
    }

    // Saves written with no active quest still expect the first listed one.
    if current_quest == NO_QUEST
        && let Some(first) = entries.first()
    {
        current_quest = first.name.clone();
    }

    Ok(QuestTable {
        index,
        current_quest,
        entries,
    })
}

pub fn emit_quest_tables(w: &mut SaveWriter, tables: &[QuestTable]) -> Result<()> {
    w.write_count(tables.len(), "quest table")?;
    for table in tables {
        w.write_i32(table.index)?;
        w.write_string(&table.current_quest)?;
        w.write_count(table.entries.len(), "quest")?;
        for entry in &table.entries {
            w.write_string(&entry.name)?;
            w.write_i32(entry.progress)?;
            w.write_i32(entry.dlc_value_1)?;
            w.write_i32(entry.dlc_value_2)?;
            w.write_count(entry.objectives.len(), "quest objective")?;
            for objective in &entry.objectives {
                w.write_string(&objective.description)?;
                w.write_i32(objective.progress)?;
            }
        }
    }
    Ok(())
}

// --- Echoes ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EchoEntry {
    pub name: String,
    pub dlc_value_1: i32,
    pub dlc_value_2: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EchoTable {
    pub index: i32,
    pub entries: Vec<EchoEntry>,
}

pub fn parse_echo_tables<R: Read + Seek>(r: &mut SaveReader<R>) -> Result<Vec<EchoTable>> {
    let count = r.read_count("echo table")?;
    let mut tables = Vec::with_capacity(count.min(16));
    for _ in 0..count {
        let index = r.read_i32()?;
        let entry_count = r.read_count("echo")?;
        let mut entries = Vec::with_capacity(entry_count.min(1024));
        for _ in 0..entry_count {
            entries.push(EchoEntry {
                name: r.read_string()?,
                dlc_value_1: r.read_i32()?,
                dlc_value_2: r.read_i32()?,
            });
        }
        tables.push(EchoTable { index, entries });
    }
    Ok(tables)
}

pub fn emit_echo_tables(w: &mut SaveWriter, tables: &[EchoTable]) -> Result<()> {
    w.write_count(tables.len(), "echo table")?;
    for table in tables {
        w.write_i32(table.index)?;
        w.write_count(table.entries.len(), "echo")?;
        for entry in &table.entries {
            w.write_string(&entry.name)?;
            w.write_i32(entry.dlc_value_1)?;
            w.write_i32(entry.dlc_value_2)?;
        }
    }
    Ok(())
}
