pub mod bank;
pub mod container;
pub mod context;
pub mod core_api;
pub mod dlc;
pub mod error;
pub mod inventory;
pub mod layout;
pub mod platform;
pub mod reader;
pub mod save;
pub mod writer;

use std::io::{Read, Seek};

pub use container::{ContainerAdapter, ContainerInfo, Unwrapped};
pub use context::{DecodeOptions, ENHANCED_VERSION};
pub use error::{Result, WsgError};
pub use platform::{ByteOrder, Platform, TitleVariant};
pub use save::{Decoded, SaveGame};

/// Decode an unwrapped WSG stream.
pub fn decode<R: Read + Seek>(reader: R, options: DecodeOptions) -> Result<Decoded> {
    SaveGame::decode(reader, options)
}

pub fn encode(save: &SaveGame) -> Result<Vec<u8>> {
    save.encode()
}
