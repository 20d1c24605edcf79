use serde::{Deserialize, Serialize};

use crate::platform::Platform;
use crate::save::SaveGame;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub platform: Platform,
    pub revision: i32,
    pub class: String,
    pub character_name: String,
    pub level: i32,
    pub experience: i32,
    pub cash: i32,
    pub skill_points: i32,
    pub play_time: i32,
    pub last_played: String,
    pub current_location: String,
    pub skill_count: usize,
    pub item_count: usize,
    pub weapon_count: usize,
    pub bank_entry_count: usize,
    pub quest_count: usize,
}

impl Snapshot {
    pub(crate) fn from_save(save: &SaveGame) -> Self {
        Self {
            platform: save.platform,
            revision: save.revision,
            class: save.character.class.clone(),
            character_name: save.profile.character_name.clone(),
            level: save.character.level,
            experience: save.character.experience,
            cash: save.character.cash,
            skill_points: save.character.skill_points,
            play_time: save.profile.play_time,
            last_played: save.profile.last_played.clone(),
            current_location: save.current_location.clone(),
            skill_count: save.skills.len(),
            item_count: save.items.len(),
            weapon_count: save.weapons.len(),
            bank_entry_count: save.bank_entry_count(),
            quest_count: save.quest_count(),
        }
    }
}
