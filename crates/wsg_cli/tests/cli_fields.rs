use std::fs;
use std::io::Cursor;
use std::path::PathBuf;
use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

use serde_json::Value;
use wsg_core::dlc::{DlcBlock, DlcData, DlcSection};
use wsg_core::inventory::{ITEM_PART_COUNT, InventoryObject, ObjectKind, ObjectValues};
use wsg_core::save::sections::{ChallengeBlock, QuestEntry, QuestTable, Skill};
use wsg_core::save::types::{CharacterStats, Profile, SaveInfo, VehicleCustomization};
use wsg_core::{DecodeOptions, Platform, SaveGame, decode, encode};

fn fixture() -> SaveGame {
    let platform = Platform::Pc;
    SaveGame {
        platform,
        byte_order: platform.byte_order(),
        version: 2,
        revision: 0x26,
        character: CharacterStats {
            class: "gd_lilith.Character.CharacterClass_Lilith".to_string(),
            level: 23,
            experience: 312_004,
            skill_points: 2,
            unknown1: 0,
            cash: 45_210,
            finished_playthrough: 0,
        },
        skills: vec![Skill {
            name: "gd_Skills2_Lilith.Elemental.Radiance".to_string(),
            level: 3,
            experience: 0,
            in_use: -1,
        }],
        vehicles: VehicleCustomization::default(),
        ammo_pools: Vec::new(),
        items: vec![InventoryObject::new(
            ObjectKind::Item,
            vec!["gd_shields.A_Item.Item_Shield".to_string(); ITEM_PART_COUNT],
            ObjectValues {
                quantity: 1,
                quality: 2,
                equipped_slot: 1,
                level: 0,
                flags: None,
            },
        )],
        backpack_size: 24,
        equip_slots: 2,
        weapons: Vec::new(),
        challenges: ChallengeBlock::default(),
        locations: vec!["Fyrestone".to_string()],
        current_location: "Fyrestone".to_string(),
        save_info: SaveInfo::default(),
        quests: vec![QuestTable {
            index: 0,
            current_quest: "Z1_Missions.M_FindingTheKey".to_string(),
            entries: vec![QuestEntry {
                name: "Z1_Missions.M_FindingTheKey".to_string(),
                progress: 1,
                dlc_value_1: 0,
                dlc_value_2: 0,
                objectives: Vec::new(),
            }],
        }],
        profile: Profile {
            play_time: 3_725,
            last_played: "20091027201500".to_string(),
            character_name: "Lilith".to_string(),
            color1: 0,
            color2: 0,
            color3: 0,
            head: 0,
        },
        unknown_block: None,
        promo_codes: Vec::new(),
        new_promo_codes: Vec::new(),
        echoes: Vec::new(),
        dlc: Some(DlcBlock {
            sections: vec![DlcSection::new(DlcData::LevelCap { unlocked: 0 })],
        }),
        padding: Vec::new(),
    }
}

fn run_cli(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_wsg-edit"))
        .args(args)
        .output()
        .expect("failed to run wsg-edit CLI")
}

fn temp_path(prefix: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system time before unix epoch")
        .as_nanos();
    std::env::temp_dir().join(format!("{prefix}_{}_{}.sav", std::process::id(), nanos))
}

fn write_fixture(prefix: &str) -> PathBuf {
    let path = temp_path(prefix);
    fs::write(&path, encode(&fixture()).expect("fixture encodes")).expect("write fixture");
    path
}

#[test]
fn cli_prints_requested_fields_in_fixed_order() {
    let path = write_fixture("wsg_fields");
    let path_str = path.to_string_lossy().to_string();

    let output = run_cli(&["--xp", "--name", "--level", &path_str]);
    let _ = fs::remove_file(&path);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines, vec!["name=Lilith", "level=23", "xp=312004"]);
}

#[test]
fn cli_prints_list_fields() {
    let path = write_fixture("wsg_lists");
    let path_str = path.to_string_lossy().to_string();

    let output = run_cli(&["--skills", "--quests", "--play-time", &path_str]);
    let _ = fs::remove_file(&path);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(
        lines,
        vec![
            "play_time=1:02:05",
            "skill=gd_Skills2_Lilith.Elemental.Radiance=3",
            "quest=0:Z1_Missions.M_FindingTheKey=1",
        ]
    );
}

#[test]
fn cli_json_summary_reports_counts() {
    let path = write_fixture("wsg_json");
    let path_str = path.to_string_lossy().to_string();

    let output = run_cli(&["--json", &path_str]);
    let _ = fs::remove_file(&path);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    let json: Value = serde_json::from_str(&stdout).expect("stdout should be valid JSON");
    assert_eq!(json["platform"], "PC");
    assert_eq!(json["name"], "Lilith");
    assert_eq!(json["cash"], 45_210);
    assert_eq!(json["item_count"], 1);
    assert_eq!(json["bank_entry_count"], 0);
    assert_eq!(json["required_repair"], false);
}

#[test]
fn cli_layout_json_reports_sections() {
    let path = write_fixture("wsg_layout");
    let path_str = path.to_string_lossy().to_string();
    let file_len = fs::metadata(&path).expect("fixture metadata").len();

    let output = run_cli(&["--layout", "--json", &path_str]);
    let _ = fs::remove_file(&path);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    let json: Value = serde_json::from_str(&stdout).expect("stdout should be valid JSON");
    assert_eq!(json["validation_ok"], true);
    assert_eq!(json["file_len"].as_u64(), Some(file_len));

    let sections = json["sections"]
        .as_array()
        .expect("sections should be an array");
    assert_eq!(sections[0]["id"], "header");
    assert_eq!(sections[0]["start"], 0);
    let last_end = sections.last().and_then(|s| s["end"].as_u64());
    assert_eq!(last_end, Some(file_len));
}

#[test]
fn cli_writes_edited_save() {
    let input = write_fixture("wsg_edit_in");
    let output_path = temp_path("wsg_edit_out");
    let input_str = input.to_string_lossy().to_string();
    let output_str = output_path.to_string_lossy().to_string();

    let output = run_cli(&[
        "--set-level",
        "40",
        "--set-cash",
        "7",
        "--set-name",
        "Brick",
        "--output",
        &output_str,
        &input_str,
    ]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let bytes = fs::read(&output_path).expect("edited save written");
    let _ = fs::remove_file(&input);
    let _ = fs::remove_file(&output_path);

    let decoded =
        decode(Cursor::new(bytes), DecodeOptions::default()).expect("edited save decodes");
    assert_eq!(decoded.save.character.level, 40);
    assert_eq!(decoded.save.character.cash, 7);
    assert_eq!(decoded.save.profile.character_name, "Brick");

    let mut expected = fixture();
    expected.character.level = 40;
    expected.character.cash = 7;
    expected.profile.character_name = "Brick".to_string();
    assert_eq!(decoded.save, expected);
}

#[test]
fn cli_rejects_edit_without_output() {
    let path = write_fixture("wsg_no_output");
    let path_str = path.to_string_lossy().to_string();

    let output = run_cli(&["--set-level", "5", &path_str]);
    let _ = fs::remove_file(&path);
    assert_eq!(output.status.code(), Some(2));

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("--output"));
}

#[test]
fn cli_rejects_invalid_edit_value() {
    let input = write_fixture("wsg_bad_edit");
    let output_path = temp_path("wsg_bad_edit_out");
    let input_str = input.to_string_lossy().to_string();
    let output_str = output_path.to_string_lossy().to_string();

    let output = run_cli(&["--set-level", "0", "--output", &output_str, &input_str]);
    let _ = fs::remove_file(&input);
    assert_eq!(output.status.code(), Some(1));
    assert!(!output_path.exists());
}

#[test]
fn cli_reports_non_save_input() {
    let path = temp_path("wsg_garbage");
    fs::write(&path, b"not a save at all").expect("write garbage");
    let path_str = path.to_string_lossy().to_string();

    let output = run_cli(&[&path_str]);
    let _ = fs::remove_file(&path);
    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Error parsing save file"));
}
