use std::fmt;

use log::info;
use serde::{Deserialize, Serialize};

use crate::error::{Result, WsgError};

pub const WSG_MAGIC: &[u8; 3] = b"WSG";
pub const CON_MAGIC: &[u8; 4] = b"CON ";
pub const WSG_VERSION: i32 = 2;

pub const XBOX_TITLE_ID_OFFSET: usize = 0x360;
pub const XBOX_PAYLOAD_OFFSET: usize = 0xD000;
pub const XBOX_TITLE_ID: u32 = 0x5454_07E7;
pub const XBOX_JP_TITLE_ID: u32 = 0x5454_07F2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ByteOrder {
    Little,
    Big,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TitleVariant {
    Standard,
    Japanese,
}

impl TitleVariant {
    pub fn title_id(self) -> u32 {
        match self {
            Self::Standard => XBOX_TITLE_ID,
            Self::Japanese => XBOX_JP_TITLE_ID,
        }
    }

    pub fn from_title_id(id: u32) -> Option<Self> {
        match id {
            XBOX_TITLE_ID => Some(Self::Standard),
            XBOX_JP_TITLE_ID => Some(Self::Japanese),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Platform {
    Pc,
    Ps3,
    Xbox360,
    Xbox360Jp,
}

impl Platform {
    pub fn byte_order(self) -> ByteOrder {
        match self {
            Self::Pc => ByteOrder::Little,
            Self::Ps3 | Self::Xbox360 | Self::Xbox360Jp => ByteOrder::Big,
        }
    }

    pub fn title_variant(self) -> Option<TitleVariant> {
        match self {
            Self::Xbox360 => Some(TitleVariant::Standard),
            Self::Xbox360Jp => Some(TitleVariant::Japanese),
            Self::Pc | Self::Ps3 => None,
        }
    }

    pub fn from_title_variant(variant: TitleVariant) -> Self {
        match variant {
            TitleVariant::Standard => Self::Xbox360,
            TitleVariant::Japanese => Self::Xbox360Jp,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pc => "PC",
            Self::Ps3 => "PS3",
            Self::Xbox360 => "X360",
            Self::Xbox360Jp => "X360JP",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Detection {
    pub platform: Platform,
    pub byte_order: ByteOrder,
}

/// Sniff the head of a save file. `head` may be the whole file.
pub fn detect(head: &[u8]) -> Result<Detection> {
    let detection = if head.starts_with(WSG_MAGIC) {
        detect_wsg(head)?
    } else if head.starts_with(CON_MAGIC) {
        detect_container(head)?
    } else {
        return Err(WsgError::format(0, "not a WSG save: unrecognised magic"));
    };

    info!(
        "detected {} save ({:?} endian)",
        detection.platform, detection.byte_order
    );
    Ok(detection)
}

fn detect_wsg(head: &[u8]) -> Result<Detection> {
    let version = version_word(head, WSG_MAGIC.len())?;

    if i32::from_le_bytes(version) == WSG_VERSION {
        Ok(Detection {
            platform: Platform::Pc,
            byte_order: ByteOrder::Little,
        })
    } else if i32::from_be_bytes(version) == WSG_VERSION {
        Ok(Detection {
            platform: Platform::Ps3,
            byte_order: ByteOrder::Big,
        })
    } else {
        Err(WsgError::format(
            WSG_MAGIC.len() as u64,
            format!("unknown WSG version word {:02X?}", version),
        ))
    }
}

fn detect_container(head: &[u8]) -> Result<Detection> {
    let payload = head
        .get(XBOX_PAYLOAD_OFFSET..XBOX_PAYLOAD_OFFSET + WSG_MAGIC.len())
        .ok_or_else(|| {
            WsgError::format(
                XBOX_PAYLOAD_OFFSET as u64,
                "container too short to hold a WSG payload",
            )
        })?;
    if payload != WSG_MAGIC {
        return Err(WsgError::format(
            XBOX_PAYLOAD_OFFSET as u64,
            "container does not hold a WSG payload",
        ));
    }

    let title_id = version_word(head, XBOX_TITLE_ID_OFFSET).map(u32::from_be_bytes)?;
    let variant = TitleVariant::from_title_id(title_id).ok_or_else(|| {
        WsgError::format(
            XBOX_TITLE_ID_OFFSET as u64,
            format!("unknown Xbox 360 title id 0x{title_id:08X}"),
        )
    })?;

    let platform = Platform::from_title_variant(variant);
    Ok(Detection {
        platform,
        byte_order: platform.byte_order(),
    })
}

fn version_word(head: &[u8], offset: usize) -> Result<[u8; 4]> {
    head.get(offset..offset + 4)
        .and_then(|bytes| bytes.try_into().ok())
        .ok_or_else(|| WsgError::Truncated {
            offset: offset as u64,
            needed: 4,
            available: head.len().saturating_sub(offset) as u64,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn container(title_id: u32, payload: &[u8]) -> Vec<u8> {
        let mut bytes = vec![0u8; XBOX_PAYLOAD_OFFSET];
        bytes[..4].copy_from_slice(CON_MAGIC);
        bytes[XBOX_TITLE_ID_OFFSET..XBOX_TITLE_ID_OFFSET + 4]
            .copy_from_slice(&title_id.to_be_bytes());
        bytes.extend_from_slice(payload);
        bytes
    }

    #[test]
    fn little_endian_version_is_pc() {
        let d = detect(b"WSG\x02\x00\x00\x00PLYR").expect("pc header");
        assert_eq!(d.platform, Platform::Pc);
        assert_eq!(d.byte_order, ByteOrder::Little);
    }

    #[test]
    fn big_endian_version_is_ps3() {
        let d = detect(b"WSG\x00\x00\x00\x02PLYR").expect("ps3 header");
        assert_eq!(d.platform, Platform::Ps3);
        assert_eq!(d.byte_order, ByteOrder::Big);
    }

    #[test]
    fn container_title_ids_select_variant() {
        let d = detect(&container(XBOX_TITLE_ID, b"WSG\x00\x00\x00\x02")).expect("x360");
        assert_eq!(d.platform, Platform::Xbox360);
        assert_eq!(d.byte_order, ByteOrder::Big);

        let d = detect(&container(XBOX_JP_TITLE_ID, b"WSG\x00\x00\x00\x02")).expect("x360jp");
        assert_eq!(d.platform, Platform::Xbox360Jp);
    }

    #[test]
    fn container_with_unknown_title_is_rejected() {
        let err = detect(&container(0x1234_5678, b"WSG")).unwrap_err();
        assert!(err.is_format());
    }

    #[test]
    fn container_without_payload_marker_is_rejected() {
        let err = detect(&container(XBOX_TITLE_ID, b"XYZ")).unwrap_err();
        assert!(err.is_format());
    }

    #[test]
    fn garbage_and_bad_versions_are_rejected() {
        assert!(detect(b"FALLOUT SAVE FILE").unwrap_err().is_format());
        assert!(detect(b"WSG\x03\x00\x00\x00").unwrap_err().is_format());
        assert!(detect(b"WSG\x02").unwrap_err().is_truncated());
    }
}
