use serde::Serialize;

use crate::error::{Result, WsgError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ByteRange {
    pub start: usize,
    pub end: usize,
}

impl ByteRange {
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SectionId {
    Header,
    Skills,
    Vehicles,
    AmmoPools,
    Items,
    Weapons,
    Challenges,
    Locations,
    SaveInfo,
    Quests,
    Profile,
    Unknown,
    PromoCodes,
    Echoes,
    Dlc,
    Padding,
}

impl SectionId {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Header => "header",
            Self::Skills => "skills",
            Self::Vehicles => "vehicles",
            Self::AmmoPools => "ammo_pools",
            Self::Items => "items",
            Self::Weapons => "weapons",
            Self::Challenges => "challenges",
            Self::Locations => "locations",
            Self::SaveInfo => "save_info",
            Self::Quests => "quests",
            Self::Profile => "profile",
            Self::Unknown => "unknown",
            Self::PromoCodes => "promo_codes",
            Self::Echoes => "echoes",
            Self::Dlc => "dlc",
            Self::Padding => "padding",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SectionLayout {
    pub id: SectionId,
    pub range: ByteRange,
}

#[derive(Debug, Clone, Serialize)]
pub struct FileLayout {
    pub file_len: usize,
    pub sections: Vec<SectionLayout>,
}

impl FileLayout {
    pub fn section(&self, id: SectionId) -> Option<&SectionLayout> {
        self.sections.iter().find(|s| s.id == id)
    }

    pub fn validate(&self) -> Result<()> {
        let Some(first) = self.sections.first() else {
            return Err(WsgError::format(0, "file layout must contain at least one section"));
        };

        if first.range.start != 0 {
            return Err(WsgError::format(0, "layout does not start at byte 0"));
        }

        let mut expected = 0usize;
        for section in &self.sections {
            if section.range.start != expected {
                return Err(WsgError::format(
                    expected as u64,
                    format!(
                        "layout gap/overlap around section {:?}: expected start {}, got {}",
                        section.id, expected, section.range.start
                    ),
                ));
            }
            if section.range.end < section.range.start {
                return Err(WsgError::format(
                    section.range.start as u64,
                    format!(
                        "invalid section range {:?}: {}..{}",
                        section.id, section.range.start, section.range.end
                    ),
                ));
            }
            expected = section.range.end;
        }

        if expected != self.file_len {
            return Err(WsgError::format(
                expected as u64,
                format!(
                    "layout does not cover file: ended at {}, file length {}",
                    expected, self.file_len
                ),
            ));
        }

        Ok(())
    }
}

/// Collects section ranges while a save is decoded.
#[derive(Debug, Default)]
pub(crate) struct Capture {
    pub(crate) sections: Vec<SectionLayout>,
}

impl Capture {
    pub(crate) fn record(&mut self, id: SectionId, start: u64, end: u64) {
        self.sections.push(SectionLayout {
            id,
            range: ByteRange {
                start: start as usize,
                end: end as usize,
            },
        });
    }
}
