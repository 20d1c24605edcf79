use std::fs;
use std::path::PathBuf;
use std::process;

use clap::Parser;
use log::{LevelFilter, debug};
use serde_json::{Map as JsonMap, Value as JsonValue};
use wsg_core::core_api::{Engine, Session};
use wsg_core::inventory::InventoryObject;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Cli {
    #[arg(value_name = "SAVE.sav")]
    path: PathBuf,
    #[arg(long)]
    platform: bool,
    #[arg(long)]
    revision: bool,
    #[arg(long)]
    class: bool,
    #[arg(long)]
    name: bool,
    #[arg(long)]
    level: bool,
    #[arg(long)]
    xp: bool,
    #[arg(long)]
    cash: bool,
    #[arg(long = "skill-points")]
    skill_points: bool,
    #[arg(long = "play-time")]
    play_time: bool,
    #[arg(long = "last-played")]
    last_played: bool,
    #[arg(long)]
    location: bool,
    #[arg(long)]
    skills: bool,
    #[arg(long)]
    items: bool,
    #[arg(long)]
    weapons: bool,
    #[arg(long)]
    bank: bool,
    #[arg(long)]
    quests: bool,
    #[arg(long)]
    json: bool,
    /// Print the decoded section byte ranges.
    #[arg(long, conflicts_with = "dump")]
    layout: bool,
    /// Print the whole decoded model as JSON.
    #[arg(long)]
    dump: bool,
    /// Drop unreadable DLC backpack lists instead of failing.
    #[arg(long = "auto-repair")]
    auto_repair: bool,
    #[arg(short, long)]
    verbose: bool,
    #[arg(long = "set-level")]
    set_level: Option<i32>,
    #[arg(long = "set-xp")]
    set_xp: Option<i32>,
    #[arg(long = "set-cash")]
    set_cash: Option<i32>,
    #[arg(long = "set-skill-points")]
    set_skill_points: Option<i32>,
    #[arg(long = "set-name")]
    set_name: Option<String>,
    #[arg(long = "set-backpack-size")]
    set_backpack_size: Option<i32>,
    #[arg(long = "set-equip-slots")]
    set_equip_slots: Option<i32>,
    #[arg(long)]
    output: Option<PathBuf>,
}

impl Cli {
    fn has_edits(&self) -> bool {
        self.set_level.is_some()
            || self.set_xp.is_some()
            || self.set_cash.is_some()
            || self.set_skill_points.is_some()
            || self.set_name.is_some()
            || self.set_backpack_size.is_some()
            || self.set_equip_slots.is_some()
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct FieldSelection {
    platform: bool,
    revision: bool,
    class: bool,
    name: bool,
    level: bool,
    xp: bool,
    cash: bool,
    skill_points: bool,
    play_time: bool,
    last_played: bool,
    location: bool,
    skills: bool,
    items: bool,
    weapons: bool,
    bank: bool,
    quests: bool,
}

impl FieldSelection {
    fn from_cli(cli: &Cli) -> Self {
        Self {
            platform: cli.platform,
            revision: cli.revision,
            class: cli.class,
            name: cli.name,
            level: cli.level,
            xp: cli.xp,
            cash: cli.cash,
            skill_points: cli.skill_points,
            play_time: cli.play_time,
            last_played: cli.last_played,
            location: cli.location,
            skills: cli.skills,
            items: cli.items,
            weapons: cli.weapons,
            bank: cli.bank,
            quests: cli.quests,
        }
    }

    fn is_field_mode(&self) -> bool {
        self.platform
            || self.revision
            || self.class
            || self.name
            || self.level
            || self.xp
            || self.cash
            || self.skill_points
            || self.play_time
            || self.last_played
            || self.location
            || self.skills
            || self.items
            || self.weapons
            || self.bank
            || self.quests
    }

    fn selected_pairs(&self, session: &Session) -> Vec<(&'static str, String)> {
        let snapshot = session.snapshot();
        let save = session.save();
        let mut out = Vec::new();

        if self.platform {
            out.push(("platform", snapshot.platform.to_string()));
        }
        if self.revision {
            out.push(("revision", format!("0x{:X}", snapshot.revision)));
        }
        if self.class {
            out.push(("class", snapshot.class.clone()));
        }
        if self.name {
            out.push(("name", snapshot.character_name.clone()));
        }
        if self.level {
            out.push(("level", snapshot.level.to_string()));
        }
        if self.xp {
            out.push(("xp", snapshot.experience.to_string()));
        }
        if self.cash {
            out.push(("cash", snapshot.cash.to_string()));
        }
        if self.skill_points {
            out.push(("skill_points", snapshot.skill_points.to_string()));
        }
        if self.play_time {
            out.push(("play_time", format_play_time(snapshot.play_time)));
        }
        if self.last_played {
            out.push(("last_played", snapshot.last_played.clone()));
        }
        if self.location {
            out.push(("location", snapshot.current_location.clone()));
        }
        if self.skills {
            for s in &save.skills {
                out.push(("skill", format!("{}={}", s.name, s.level)));
            }
        }
        if self.items {
            for item in &save.items {
                out.push(("item", format_object(item)));
            }
        }
        if self.weapons {
            for weapon in &save.weapons {
                out.push(("weapon", format_object(weapon)));
            }
        }
        if self.bank {
            if let Some(bank) = save.dlc.as_ref().and_then(|dlc| dlc.bank()) {
                for entry in &bank.entries {
                    out.push((
                        "bank",
                        format!(
                            "{} level={} quality={}",
                            entry.parts.first().map_or("None", String::as_str),
                            entry.level,
                            entry.quality
                        ),
                    ));
                }
            }
        }
        if self.quests {
            for table in &save.quests {
                for quest in &table.entries {
                    out.push((
                        "quest",
                        format!("{}:{}={}", table.index, quest.name, quest.progress),
                    ));
                }
            }
        }

        out
    }

    fn selected_json(&self, session: &Session) -> JsonMap<String, JsonValue> {
        let snapshot = session.snapshot();
        let save = session.save();
        let mut out = JsonMap::new();

        if self.platform {
            out.insert(
                "platform".to_string(),
                JsonValue::String(snapshot.platform.to_string()),
            );
        }
        if self.revision {
            out.insert("revision".to_string(), JsonValue::from(snapshot.revision));
        }
        if self.class {
            out.insert(
                "class".to_string(),
                JsonValue::String(snapshot.class.clone()),
            );
        }
        if self.name {
            out.insert(
                "name".to_string(),
                JsonValue::String(snapshot.character_name.clone()),
            );
        }
        if self.level {
            out.insert("level".to_string(), JsonValue::from(snapshot.level));
        }
        if self.xp {
            out.insert("xp".to_string(), JsonValue::from(snapshot.experience));
        }
        if self.cash {
            out.insert("cash".to_string(), JsonValue::from(snapshot.cash));
        }
        if self.skill_points {
            out.insert(
                "skill_points".to_string(),
                JsonValue::from(snapshot.skill_points),
            );
        }
        if self.play_time {
            out.insert("play_time".to_string(), JsonValue::from(snapshot.play_time));
        }
        if self.last_played {
            out.insert(
                "last_played".to_string(),
                JsonValue::String(snapshot.last_played.clone()),
            );
        }
        if self.location {
            out.insert(
                "location".to_string(),
                JsonValue::String(snapshot.current_location.clone()),
            );
        }
        if self.skills {
            out.insert("skills".to_string(), to_json(&save.skills));
        }
        if self.items {
            out.insert("items".to_string(), to_json(&save.items));
        }
        if self.weapons {
            out.insert("weapons".to_string(), to_json(&save.weapons));
        }
        if self.bank {
            let entries = save
                .dlc
                .as_ref()
                .and_then(|dlc| dlc.bank())
                .map(|bank| to_json(&bank.entries))
                .unwrap_or_else(|| JsonValue::Array(Vec::new()));
            out.insert("bank".to_string(), entries);
        }
        if self.quests {
            out.insert("quests".to_string(), to_json(&save.quests));
        }

        out
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let fields = FieldSelection::from_cli(&cli);
    let has_edits = cli.has_edits();

    if has_edits && cli.output.is_none() {
        eprintln!("--set-* flags require --output <PATH>");
        process::exit(2);
    }
    if !has_edits && cli.output.is_some() {
        eprintln!("--output requires at least one --set-* flag");
        process::exit(2);
    }

    let bytes = fs::read(&cli.path).unwrap_or_else(|e| {
        eprintln!("Error reading {}: {e}", cli.path.display());
        process::exit(1);
    });
    debug!("read {} bytes from {}", bytes.len(), cli.path.display());

    let engine = Engine::new().with_auto_repair(cli.auto_repair);
    let mut session = engine.open_bytes(bytes).unwrap_or_else(|e| {
        eprintln!("Error parsing save file: {}", cli.path.display());
        eprintln!("  {}", e);
        process::exit(1);
    });
    if session.required_repair() {
        eprintln!("Warning: unreadable DLC backpack data was discarded");
    }

    apply_edits(&cli, &mut session);

    if let Some(out_path) = &cli.output {
        let edited_bytes = session.to_bytes().unwrap_or_else(|e| {
            eprintln!("Error creating modified save bytes: {e}");
            process::exit(1);
        });
        fs::write(out_path, edited_bytes).unwrap_or_else(|e| {
            eprintln!("Error writing {}: {e}", out_path.display());
            process::exit(1);
        });
    }

    if cli.dump {
        print_json(&to_json(session.save()));
        return;
    }

    if cli.layout {
        if cli.json {
            print_json(&layout_json(&session));
        } else {
            print_layout(&session);
        }
        return;
    }

    if cli.json {
        let json = if fields.is_field_mode() {
            JsonValue::Object(fields.selected_json(&session))
        } else {
            JsonValue::Object(default_json(&session))
        };
        print_json(&json);
        return;
    }

    if fields.is_field_mode() {
        for (key, value) in fields.selected_pairs(&session) {
            println!("{key}={value}");
        }
        return;
    }

    if let Some(out_path) = &cli.output {
        println!("Wrote edited save to {}", out_path.display());
        return;
    }

    print_summary(&session);
}

fn init_logging(verbose: bool) {
    let mut builder = env_logger::Builder::new();
    builder.filter_level(if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    });
    // RUST_LOG overrides the flag when set.
    builder.parse_default_env();
    builder.init();
}

fn apply_edits(cli: &Cli, session: &mut Session) {
    if let Some(level) = cli.set_level {
        session.set_level(level).unwrap_or_else(|e| {
            eprintln!("Error applying level edit: {e}");
            process::exit(1);
        });
    }
    if let Some(experience) = cli.set_xp {
        session.set_experience(experience).unwrap_or_else(|e| {
            eprintln!("Error applying xp edit: {e}");
            process::exit(1);
        });
    }
    if let Some(cash) = cli.set_cash {
        session.set_cash(cash).unwrap_or_else(|e| {
            eprintln!("Error applying cash edit: {e}");
            process::exit(1);
        });
    }
    if let Some(skill_points) = cli.set_skill_points {
        session.set_skill_points(skill_points).unwrap_or_else(|e| {
            eprintln!("Error applying skill points edit: {e}");
            process::exit(1);
        });
    }
    if let Some(name) = &cli.set_name {
        session.set_character_name(name).unwrap_or_else(|e| {
            eprintln!("Error applying name edit: {e}");
            process::exit(1);
        });
    }
    if let Some(size) = cli.set_backpack_size {
        session.set_backpack_size(size).unwrap_or_else(|e| {
            eprintln!("Error applying backpack size edit: {e}");
            process::exit(1);
        });
    }
    if let Some(slots) = cli.set_equip_slots {
        session.set_equip_slots(slots).unwrap_or_else(|e| {
            eprintln!("Error applying equip slots edit: {e}");
            process::exit(1);
        });
    }
}

// ---------------------------------------------------------------------------
// JSON output
// ---------------------------------------------------------------------------

fn print_json(json: &JsonValue) {
    let rendered = serde_json::to_string_pretty(json).unwrap_or_else(|e| {
        eprintln!("Error rendering JSON output: {e}");
        process::exit(1);
    });
    println!("{rendered}");
}

fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> JsonValue {
    serde_json::to_value(value).unwrap_or_else(|e| {
        eprintln!("Error rendering JSON output: {e}");
        process::exit(1);
    })
}

fn default_json(session: &Session) -> JsonMap<String, JsonValue> {
    let snapshot = session.snapshot();
    let mut out = JsonMap::new();

    out.insert(
        "platform".to_string(),
        JsonValue::String(snapshot.platform.to_string()),
    );
    out.insert("revision".to_string(), JsonValue::from(snapshot.revision));
    out.insert(
        "class".to_string(),
        JsonValue::String(snapshot.class.clone()),
    );
    out.insert(
        "name".to_string(),
        JsonValue::String(snapshot.character_name.clone()),
    );
    out.insert("level".to_string(), JsonValue::from(snapshot.level));
    out.insert("xp".to_string(), JsonValue::from(snapshot.experience));
    out.insert("cash".to_string(), JsonValue::from(snapshot.cash));
    out.insert(
        "skill_points".to_string(),
        JsonValue::from(snapshot.skill_points),
    );
    out.insert("play_time".to_string(), JsonValue::from(snapshot.play_time));
    out.insert(
        "last_played".to_string(),
        JsonValue::String(snapshot.last_played.clone()),
    );
    out.insert(
        "location".to_string(),
        JsonValue::String(snapshot.current_location.clone()),
    );
    out.insert(
        "skill_count".to_string(),
        JsonValue::from(snapshot.skill_count),
    );
    out.insert("item_count".to_string(), JsonValue::from(snapshot.item_count));
    out.insert(
        "weapon_count".to_string(),
        JsonValue::from(snapshot.weapon_count),
    );
    out.insert(
        "bank_entry_count".to_string(),
        JsonValue::from(snapshot.bank_entry_count),
    );
    out.insert(
        "quest_count".to_string(),
        JsonValue::from(snapshot.quest_count),
    );
    out.insert(
        "required_repair".to_string(),
        JsonValue::Bool(session.required_repair()),
    );

    out
}

fn layout_json(session: &Session) -> JsonValue {
    let layout = session.layout();
    let sections = layout
        .sections
        .iter()
        .map(|s| {
            let mut section = JsonMap::new();
            section.insert("id".to_string(), JsonValue::from(s.id.as_str()));
            section.insert("start".to_string(), JsonValue::from(s.range.start));
            section.insert("end".to_string(), JsonValue::from(s.range.end));
            section.insert("len".to_string(), JsonValue::from(s.range.len()));
            JsonValue::Object(section)
        })
        .collect();

    let mut out = JsonMap::new();
    out.insert(
        "platform".to_string(),
        JsonValue::String(session.platform().to_string()),
    );
    out.insert("file_len".to_string(), JsonValue::from(layout.file_len));
    out.insert(
        "validation_ok".to_string(),
        JsonValue::Bool(layout.validate().is_ok()),
    );
    out.insert("sections".to_string(), JsonValue::Array(sections));
    JsonValue::Object(out)
}

// ---------------------------------------------------------------------------
// Text output
// ---------------------------------------------------------------------------

fn print_layout(session: &Session) {
    let layout = session.layout();
    println!("{} payload, {} bytes", session.platform(), layout.file_len);
    for s in &layout.sections {
        println!(
            "  {:<12} 0x{:06X}..0x{:06X} {:>8} bytes",
            s.id.as_str(),
            s.range.start,
            s.range.end,
            s.range.len()
        );
    }
}

fn print_summary(session: &Session) {
    let snapshot = session.snapshot();
    let save = session.save();

    println!(
        "{} ({}), level {}",
        snapshot.character_name, snapshot.class, snapshot.level
    );
    println!(
        "  Platform:     {} (revision 0x{:X})",
        snapshot.platform, snapshot.revision
    );
    println!("  Experience:   {}", format_number_with_commas(snapshot.experience));
    println!("  Cash:         ${}", format_number_with_commas(snapshot.cash));
    println!("  Skill points: {}", snapshot.skill_points);
    println!("  Play time:    {}", format_play_time(snapshot.play_time));
    println!("  Last played:  {}", snapshot.last_played);
    println!("  Location:     {}", snapshot.current_location);
    println!();
    println!(
        "  Backpack:     {} items, {} weapons ({} slots, {} equip slots)",
        snapshot.item_count, snapshot.weapon_count, save.backpack_size, save.equip_slots
    );
    println!("  Bank:         {} entries", snapshot.bank_entry_count);
    println!(
        "  Skills:       {}, quests: {}",
        snapshot.skill_count, snapshot.quest_count
    );
}

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

fn format_object(object: &InventoryObject) -> String {
    format!(
        "{} level={} quality={} qty={}",
        object.parts.first().map_or("None", String::as_str),
        object.values.level,
        object.values.quality,
        object.values.quantity
    )
}

fn format_play_time(seconds: i32) -> String {
    let seconds = seconds.max(0);
    format!(
        "{}:{:02}:{:02}",
        seconds / 3600,
        (seconds / 60) % 60,
        seconds % 60
    )
}

fn format_number_with_commas(n: i32) -> String {
    if n < 0 {
        return format!("-{}", format_number_with_commas(n.saturating_neg()));
    }
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    for (i, c) in s.chars().enumerate() {
        if i > 0 && (s.len() - i).is_multiple_of(3) {
            result.push(',');
        }
        result.push(c);
    }
    result
}
