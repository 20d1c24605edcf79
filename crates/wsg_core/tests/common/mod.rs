#![allow(dead_code)]

use wsg_core::bank::{BANK_TYPE_ITEM, BANK_TYPE_WEAPON, BankEntry, BankFlags, BankSection};
use wsg_core::dlc::{DlcBlock, DlcData, DlcFlags, DlcSection};
use wsg_core::inventory::{
    ITEM_PART_COUNT, InventoryObject, ObjectFlags, ObjectKind, ObjectValues, WEAPON_PART_COUNT,
};
use wsg_core::save::sections::{
    AmmoPool, ChallengeBlock, ChallengeEntry, EchoEntry, EchoTable, QuestEntry, QuestObjective,
    QuestTable, Skill,
};
use wsg_core::save::types::{
    CharacterStats, Profile, SaveInfo, UNKNOWN_BLOCK_LEN, VehicleCustomization,
};
use wsg_core::{ENHANCED_VERSION, Platform, SaveGame};

pub const OLD_REVISION: i32 = 0x26;
pub const NEW_REVISION: i32 = 0x27;

fn flags_for(revision: i32) -> Option<ObjectFlags> {
    (revision >= ENHANCED_VERSION).then_some(ObjectFlags::default())
}

fn parts(count: usize, first: &str) -> Vec<String> {
    let mut parts: Vec<String> = (0..count).map(|i| format!("gd_parts.Part.p{i}")).collect();
    parts[0] = first.to_string();
    parts
}

pub fn item(first_part: &str, level: i16, revision: i32) -> InventoryObject {
    InventoryObject::new(
        ObjectKind::Item,
        parts(ITEM_PART_COUNT, first_part),
        ObjectValues {
            quantity: 1,
            quality: 3,
            equipped_slot: 0,
            level,
            flags: flags_for(revision),
        },
    )
}

pub fn weapon(first_part: &str, level: i16, revision: i32) -> InventoryObject {
    InventoryObject::new(
        ObjectKind::Weapon,
        parts(WEAPON_PART_COUNT, first_part),
        ObjectValues {
            quantity: 96,
            quality: 5,
            equipped_slot: 1,
            level,
            flags: flags_for(revision),
        },
    )
}

pub fn bank_entry(type_id: u8, first_part: &str, revision: i32) -> BankEntry {
    let count = if type_id == BANK_TYPE_WEAPON {
        WEAPON_PART_COUNT
    } else {
        ITEM_PART_COUNT
    };
    let mut parts = vec!["None".to_string(); count];
    parts[0] = first_part.to_string();
    parts[1] = "gd_weap_shared.Body.body1.Body_Balanced".to_string();
    parts[2] = "gd_manufacturers.Manufacturers.Dahl".to_string();
    BankEntry {
        type_id,
        parts,
        quality: 2,
        level: 31,
        amount: 1,
        equipped: 0,
        flags: (revision >= ENHANCED_VERSION).then_some(BankFlags { junk: 0, locked: 1 }),
    }
}

fn quest(name: &str, objectives: usize) -> QuestEntry {
    QuestEntry {
        name: name.to_string(),
        progress: 2,
        dlc_value_1: 0,
        dlc_value_2: 1,
        objectives: (0..objectives)
            .map(|i| QuestObjective {
                description: format!("{name}.Objective{i}"),
                progress: i as i32,
            })
            .collect(),
    }
}

/// A populated save with every section in use.
pub fn sample_save(platform: Platform, revision: i32) -> SaveGame {
    let enhanced = revision >= ENHANCED_VERSION;

    let mut dlc_sections = vec![
        DlcSection::new(DlcData::Flags(DlcFlags {
            unknown1: 1,
            unknown2: 0,
            unknown3: 1,
            skip_intro: 1,
            unknown4: 0,
        })),
        DlcSection::new(DlcData::LevelCap { unlocked: 1 }),
        DlcSection::new(DlcData::SecondaryPack { enabled: 1 }),
        DlcSection::unknown(0x5EED_F00D, vec![0x01, 0x02, 0x03, 0xFF]),
    ];
    let mut bank = DlcSection::new(DlcData::Bank(BankSection {
        capacity: 35,
        entries: vec![
            bank_entry(
                BANK_TYPE_WEAPON,
                "gd_weap_assault_shotgun.A_Weapon.WeaponType_assault_shotgun",
                revision,
            ),
            bank_entry(BANK_TYPE_ITEM, "gd_shields.A_Item.Item_Shield", revision),
        ],
    }));
    bank.trailing = vec![0xAA, 0xBB];
    dlc_sections.insert(0, bank);

    SaveGame {
        platform,
        byte_order: platform.byte_order(),
        version: 2,
        revision,
        character: CharacterStats {
            class: "gd_Roland.Character.CharacterClass_Roland".to_string(),
            level: 50,
            experience: 3_429_728,
            skill_points: 3,
            unknown1: 0,
            cash: 1_234_567,
            finished_playthrough: 1,
        },
        skills: vec![
            Skill {
                name: "gd_Skills2_Roland.Weapon.Impact".to_string(),
                level: 5,
                experience: 0,
                in_use: -1,
            },
            Skill {
                name: "gd_skills_common.Basic.Melee".to_string(),
                level: 1,
                experience: 12,
                in_use: 0,
            },
        ],
        vehicles: VehicleCustomization {
            color1: 3,
            color2: 7,
            type1: 1,
            type2: 0,
        },
        ammo_pools: vec![AmmoPool {
            resource: "d_resources.AmmoResources.Ammo_Combat_Shotgun".to_string(),
            name: "d_resourcepools.AmmoPools.Ammo_Combat_Shotgun_Pool".to_string(),
            remaining: 120.5,
            level: 4,
        }],
        // Primary objects first, then the ones routed to the DLC backpack.
        items: vec![
            item("gd_shields.A_Item.Item_Shield", 0, revision),
            item("gd_grenades.A_Item.Grenade", 0, revision),
            item("dlc3_gd_customizations.Items.Head", 0, revision),
            item("gd_artifacts.A_Item.Artifact", 48, revision),
        ],
        backpack_size: 42,
        equip_slots: 4,
        weapons: vec![
            weapon("gd_weap_combat_shotgun.A_Weapon.WeaponType_combat_shotgun", 0, revision),
            weapon("dlc3_gd_weap_UniqueParts.Shotgun.Hydra", 0, revision),
        ],
        challenges: ChallengeBlock {
            id: 3,
            entries: vec![
                ChallengeEntry {
                    id: 1,
                    type_id: 1,
                    value: 150,
                },
                ChallengeEntry {
                    id: 42,
                    type_id: 5,
                    value: 9,
                },
            ],
            trailing: vec![0x10],
        },
        locations: vec![
            "Fyrestone".to_string(),
            "New Haven".to_string(),
            "T-Bone Junction".to_string(),
        ],
        current_location: "Fyrestone".to_string(),
        save_info: SaveInfo {
            values: [1, 2, 3, 4, 5],
            save_number: 7,
            tail: [0, 1],
        },
        quests: vec![
            QuestTable {
                index: 0,
                current_quest: "Z1_Missions.M_FindingTheKey".to_string(),
                entries: vec![
                    quest("Z0_Missions.M_IntroStateSaver", 0),
                    quest("Z1_Missions.M_FindingTheKey", 3),
                ],
            },
            QuestTable {
                index: 1,
                current_quest: "None".to_string(),
                entries: Vec::new(),
            },
        ],
        profile: Profile {
            play_time: 98_765,
            last_played: "20100217152301".to_string(),
            character_name: "Ролaнд".to_string(),
            color1: -1,
            color2: 0x00FF_00FF,
            color3: 12,
            head: 2,
        },
        unknown_block: enhanced.then(|| (0..UNKNOWN_BLOCK_LEN as u8).collect()),
        promo_codes: vec![1, 4],
        new_promo_codes: vec![9],
        echoes: vec![EchoTable {
            index: 0,
            entries: vec![EchoEntry {
                name: "Z1_EchoLogs.Echo_Tannis1".to_string(),
                dlc_value_1: 0,
                dlc_value_2: 1,
            }],
        }],
        dlc: Some(DlcBlock {
            sections: dlc_sections,
        }),
        padding: if enhanced { vec![0; 12] } else { Vec::new() },
    }
}

/// The sample with no DLC block at all.
pub fn minimal_save(platform: Platform, revision: i32) -> SaveGame {
    let mut save = sample_save(platform, revision);
    save.dlc = None;
    save.padding = Vec::new();
    save
}
