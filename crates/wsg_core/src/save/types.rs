use serde::{Deserialize, Serialize};

pub const PLAYER_MAGIC: &[u8; 4] = b"PLYR";

/// Opaque block present from `ENHANCED_VERSION` on.
pub const UNKNOWN_BLOCK_LEN: usize = 0x55;

pub const SAVE_INFO_COUNT: usize = 5;
pub const SAVE_INFO_TAIL_COUNT: usize = 2;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterStats {
    pub class: String,
    pub level: i32,
    pub experience: i32,
    pub skill_points: i32,
    pub unknown1: i32,
    pub cash: i32,
    pub finished_playthrough: i32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleCustomization {
    pub color1: i32,
    pub color2: i32,
    pub type1: i32,
    pub type2: i32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveInfo {
    pub values: [i32; SAVE_INFO_COUNT],
    pub save_number: i32,
    pub tail: [i32; SAVE_INFO_TAIL_COUNT],
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// Seconds.
    pub play_time: i32,
    pub last_played: String,
    pub character_name: String,
    pub color1: i32,
    pub color2: i32,
    pub color3: i32,
    pub head: i32,
}
