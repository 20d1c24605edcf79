//! Xbox 360 container seam.
//!
//! Console saves wrap the WSG payload in a signed STFS package. Building and
//! signing that package is left to an adapter supplied by the caller; the
//! codec only needs the payload out and a new package back.

use crate::error::Result;
use crate::platform::TitleVariant;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unwrapped {
    pub payload: Vec<u8>,
    pub profile_id: u64,
    pub device_id: Vec<u8>,
}

/// Identity of the package a payload came from, needed to rewrap it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerInfo {
    pub profile_id: u64,
    pub device_id: Vec<u8>,
    pub title: TitleVariant,
}

pub trait ContainerAdapter {
    fn unwrap(&self, container: &[u8]) -> Result<Unwrapped>;

    fn wrap(
        &self,
        payload: &[u8],
        profile_id: u64,
        device_id: &[u8],
        title: TitleVariant,
    ) -> Result<Vec<u8>>;
}
