use std::fmt;
use std::io::Cursor;
use std::sync::Arc;

use log::info;

use crate::container::{ContainerAdapter, ContainerInfo};
use crate::context::DecodeOptions;
use crate::inventory::{InventoryObject, ObjectKind};
use crate::layout::FileLayout;
use crate::platform::{Platform, detect};
use crate::save::SaveGame;
use crate::writer::SaveWriter;

use super::error::{CoreError, CoreErrorCode};
use super::types::Snapshot;

#[derive(Default, Clone)]
pub struct Engine {
    adapter: Option<Arc<dyn ContainerAdapter>>,
    options: DecodeOptions,
}

pub struct Session {
    save: SaveGame,
    snapshot: Snapshot,
    layout: FileLayout,
    required_repair: bool,
    container: Option<ContainerInfo>,
    adapter: Option<Arc<dyn ContainerAdapter>>,
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("has_adapter", &self.adapter.is_some())
            .field("options", &self.options)
            .finish()
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("snapshot", &self.snapshot)
            .field("required_repair", &self.required_repair)
            .field("container", &self.container)
            .finish_non_exhaustive()
    }
}

impl Engine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_container_adapter(mut self, adapter: Box<dyn ContainerAdapter>) -> Self {
        self.adapter = Some(Arc::from(adapter));
        self
    }

    pub fn with_auto_repair(mut self, auto_repair: bool) -> Self {
        self.options.auto_repair = auto_repair;
        self
    }

    pub fn open_bytes<B: AsRef<[u8]>>(&self, bytes: B) -> Result<Session, CoreError> {
        let bytes = bytes.as_ref();
        let detection =
            detect(bytes).map_err(|e| CoreError::from_codec("failed to detect save format", e))?;

        let (payload, container) = match detection.platform.title_variant() {
            Some(title) => {
                let adapter = self.adapter.as_ref().ok_or_else(|| {
                    CoreError::new(
                        CoreErrorCode::UnsupportedOperation,
                        format!(
                            "{} saves need a container adapter to unwrap",
                            detection.platform
                        ),
                    )
                })?;
                let unwrapped = adapter
                    .unwrap(bytes)
                    .map_err(|e| CoreError::from_codec("failed to unwrap container", e))?;
                let info = ContainerInfo {
                    profile_id: unwrapped.profile_id,
                    device_id: unwrapped.device_id,
                    title,
                };
                (unwrapped.payload, Some(info))
            }
            None => (bytes.to_vec(), None),
        };

        let (decoded, layout) = SaveGame::decode_with_layout(Cursor::new(payload), self.options)
            .map_err(|e| CoreError::from_codec("failed to parse save", e))?;

        let mut save = decoded.save;
        save.platform = detection.platform;
        if decoded.required_repair {
            info!("save opened with auto-repair applied");
        }

        Ok(Session {
            snapshot: Snapshot::from_save(&save),
            save,
            layout,
            required_repair: decoded.required_repair,
            container,
            adapter: self.adapter.clone(),
        })
    }
}

impl Session {
    pub fn platform(&self) -> Platform {
        self.save.platform
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn save(&self) -> &SaveGame {
        &self.save
    }

    pub fn required_repair(&self) -> bool {
        self.required_repair
    }

    /// Section ranges of the payload as it was loaded.
    pub fn layout(&self) -> &FileLayout {
        &self.layout
    }

    pub fn container(&self) -> Option<&ContainerInfo> {
        self.container.as_ref()
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, CoreError> {
        let payload = self
            .save
            .encode()
            .map_err(|e| CoreError::from_codec("failed to encode save", e))?;

        let Some(info) = &self.container else {
            return Ok(payload);
        };
        let adapter = self.adapter.as_ref().ok_or_else(|| {
            CoreError::new(
                CoreErrorCode::UnsupportedOperation,
                "no container adapter to rewrap the save",
            )
        })?;
        adapter
            .wrap(&payload, info.profile_id, &info.device_id, info.title)
            .map_err(|e| CoreError::from_codec("failed to wrap container", e))
    }

    pub fn set_level(&mut self, level: i32) -> Result<(), CoreError> {
        if level < 1 {
            return Err(invalid_edit(format!("level must be at least 1, got {level}")));
        }
        self.save.character.level = level;
        self.snapshot.level = level;
        Ok(())
    }

    pub fn set_experience(&mut self, experience: i32) -> Result<(), CoreError> {
        require_non_negative("experience", experience)?;
        self.save.character.experience = experience;
        self.snapshot.experience = experience;
        Ok(())
    }

    pub fn set_skill_points(&mut self, skill_points: i32) -> Result<(), CoreError> {
        require_non_negative("skill points", skill_points)?;
        self.save.character.skill_points = skill_points;
        self.snapshot.skill_points = skill_points;
        Ok(())
    }

    pub fn set_cash(&mut self, cash: i32) -> Result<(), CoreError> {
        require_non_negative("cash", cash)?;
        self.save.character.cash = cash;
        self.snapshot.cash = cash;
        Ok(())
    }

    pub fn set_character_name(&mut self, name: &str) -> Result<(), CoreError> {
        if name.is_empty() {
            return Err(invalid_edit("character name must not be empty"));
        }
        // Reject names the string codec could not write back.
        SaveWriter::new(self.save.byte_order)
            .write_string(name)
            .map_err(|e| invalid_edit(format!("invalid character name: {e}")))?;

        self.save.profile.character_name = name.to_string();
        self.snapshot.character_name = name.to_string();
        Ok(())
    }

    pub fn set_backpack_size(&mut self, size: i32) -> Result<(), CoreError> {
        require_non_negative("backpack size", size)?;
        self.save.backpack_size = size;
        Ok(())
    }

    pub fn set_equip_slots(&mut self, slots: i32) -> Result<(), CoreError> {
        require_non_negative("equip slots", slots)?;
        self.save.equip_slots = slots;
        Ok(())
    }

    pub fn set_object_level(
        &mut self,
        kind: ObjectKind,
        index: usize,
        level: i16,
    ) -> Result<(), CoreError> {
        if level < 0 {
            return Err(invalid_edit(format!("{} level must not be negative", kind.as_str())));
        }
        self.object_mut(kind, index)?.values.level = level;
        Ok(())
    }

    pub fn set_object_quality(
        &mut self,
        kind: ObjectKind,
        index: usize,
        quality: i16,
    ) -> Result<(), CoreError> {
        if quality < 0 {
            return Err(invalid_edit(format!(
                "{} quality must not be negative",
                kind.as_str()
            )));
        }
        self.object_mut(kind, index)?.values.quality = quality;
        Ok(())
    }

    fn object_mut(
        &mut self,
        kind: ObjectKind,
        index: usize,
    ) -> Result<&mut InventoryObject, CoreError> {
        let list = match kind {
            ObjectKind::Item => &mut self.save.items,
            ObjectKind::Weapon => &mut self.save.weapons,
        };
        let len = list.len();
        list.get_mut(index).ok_or_else(|| {
            invalid_edit(format!(
                "{} index {index} out of range ({len} present)",
                kind.as_str()
            ))
        })
    }
}

fn invalid_edit(message: impl Into<String>) -> CoreError {
    CoreError::new(CoreErrorCode::InvalidEdit, message)
}

fn require_non_negative(what: &str, value: i32) -> Result<(), CoreError> {
    if value < 0 {
        return Err(invalid_edit(format!("{what} must not be negative, got {value}")));
    }
    Ok(())
}
