mod common;

use std::cell::RefCell;
use std::rc::Rc;

use pretty_assertions::assert_eq;
use wsg_core::core_api::{CoreErrorCode, Engine};
use wsg_core::inventory::ObjectKind;
use wsg_core::platform::{CON_MAGIC, XBOX_PAYLOAD_OFFSET, XBOX_TITLE_ID_OFFSET};
use wsg_core::{ContainerAdapter, Platform, Result, TitleVariant, Unwrapped, WsgError, encode};

use common::{NEW_REVISION, OLD_REVISION, sample_save};

const PROFILE_ID: u64 = 0xE000_0123_4567_89AB;

/// Stand-in container: a zeroed header carrying the title id, then the
/// payload at the fixed offset. Records what it was asked to wrap.
#[derive(Default)]
struct FakeContainer {
    wrapped: Rc<RefCell<Vec<(u64, Vec<u8>, TitleVariant)>>>,
}

fn build_container(title: TitleVariant, payload: &[u8]) -> Vec<u8> {
    let mut bytes = vec![0u8; XBOX_PAYLOAD_OFFSET];
    bytes[..4].copy_from_slice(CON_MAGIC);
    bytes[XBOX_TITLE_ID_OFFSET..XBOX_TITLE_ID_OFFSET + 4]
        .copy_from_slice(&title.title_id().to_be_bytes());
    bytes.extend_from_slice(payload);
    bytes
}

impl ContainerAdapter for FakeContainer {
    fn unwrap(&self, container: &[u8]) -> Result<Unwrapped> {
        let payload = container
            .get(XBOX_PAYLOAD_OFFSET..)
            .ok_or_else(|| WsgError::Container("short container".to_string()))?;
        Ok(Unwrapped {
            payload: payload.to_vec(),
            profile_id: PROFILE_ID,
            device_id: vec![7; 20],
        })
    }

    fn wrap(
        &self,
        payload: &[u8],
        profile_id: u64,
        device_id: &[u8],
        title: TitleVariant,
    ) -> Result<Vec<u8>> {
        self.wrapped
            .borrow_mut()
            .push((profile_id, device_id.to_vec(), title));
        Ok(build_container(title, payload))
    }
}

fn pc_bytes() -> Vec<u8> {
    encode(&sample_save(Platform::Pc, NEW_REVISION)).unwrap()
}

#[test]
fn engine_opens_pc_save_and_reports_snapshot() {
    let session = Engine::new().open_bytes(pc_bytes()).expect("pc save opens");

    assert_eq!(session.platform(), Platform::Pc);
    let snapshot = session.snapshot();
    assert_eq!(snapshot.level, 50);
    assert_eq!(snapshot.character_name, "Ролaнд");
    assert_eq!(snapshot.class, "gd_Roland.Character.CharacterClass_Roland");
    assert_eq!(snapshot.item_count, 4);
    assert_eq!(snapshot.weapon_count, 2);
    assert_eq!(snapshot.bank_entry_count, 2);
    assert_eq!(snapshot.quest_count, 2);
    assert!(!session.required_repair());
    assert!(session.layout().validate().is_ok());
    assert!(session.container().is_none());
}

#[test]
fn unmodified_session_reencodes_identically() {
    let bytes = pc_bytes();
    let session = Engine::new().open_bytes(&bytes).unwrap();
    assert_eq!(session.to_bytes().unwrap(), bytes);
}

#[test]
fn edits_roundtrip_through_bytes() {
    let mut session = Engine::new().open_bytes(pc_bytes()).unwrap();
    session.set_level(12).unwrap();
    session.set_experience(45_000).unwrap();
    session.set_cash(99).unwrap();
    session.set_skill_points(0).unwrap();
    session.set_character_name("Mordecai").unwrap();
    session.set_backpack_size(60).unwrap();
    session.set_equip_slots(2).unwrap();
    session.set_object_level(ObjectKind::Weapon, 0, 30).unwrap();
    session.set_object_quality(ObjectKind::Item, 1, 6).unwrap();
    assert_eq!(session.snapshot().level, 12);

    let edited = session.to_bytes().unwrap();
    let reopened = Engine::new().open_bytes(edited).unwrap();
    let save = reopened.save();
    assert_eq!(save.character.level, 12);
    assert_eq!(save.character.experience, 45_000);
    assert_eq!(save.character.cash, 99);
    assert_eq!(save.character.skill_points, 0);
    assert_eq!(save.profile.character_name, "Mordecai");
    assert_eq!(save.backpack_size, 60);
    assert_eq!(save.equip_slots, 2);
    assert_eq!(save.items[1].values.quality, 6);
    // Both weapons now live in the DLC backpack, in their original order.
    assert_eq!(save.weapons[0].values.level, 30);
    assert_eq!(save.weapons.len(), 2);
}

#[test]
fn invalid_edits_are_rejected() {
    let mut session = Engine::new().open_bytes(pc_bytes()).unwrap();

    let err = session.set_level(0).unwrap_err();
    assert_eq!(err.code, CoreErrorCode::InvalidEdit);
    assert_eq!(
        session.set_cash(-5).unwrap_err().code,
        CoreErrorCode::InvalidEdit
    );
    assert_eq!(
        session.set_character_name("bad\0name").unwrap_err().code,
        CoreErrorCode::InvalidEdit
    );
    assert_eq!(
        session
            .set_object_level(ObjectKind::Item, 99, 1)
            .unwrap_err()
            .code,
        CoreErrorCode::InvalidEdit
    );
    assert_eq!(session.snapshot().level, 50);
}

#[test]
fn garbage_is_a_parse_error() {
    let err = Engine::new().open_bytes(b"definitely not a save").unwrap_err();
    assert_eq!(err.code, CoreErrorCode::Parse);
}

#[test]
fn xbox_save_without_adapter_is_unsupported() {
    let payload = encode(&sample_save(Platform::Ps3, NEW_REVISION)).unwrap();
    let container = build_container(TitleVariant::Standard, &payload);
    let err = Engine::new().open_bytes(container).unwrap_err();
    assert_eq!(err.code, CoreErrorCode::UnsupportedOperation);
}

#[test]
fn xbox_save_unwraps_and_rewraps_through_adapter() {
    let adapter = FakeContainer::default();
    let wrapped = Rc::clone(&adapter.wrapped);
    let engine = Engine::new().with_container_adapter(Box::new(adapter));

    let payload = encode(&sample_save(Platform::Ps3, OLD_REVISION)).unwrap();
    let container = build_container(TitleVariant::Japanese, &payload);
    let mut session = engine.open_bytes(&container).expect("xbox save opens");

    assert_eq!(session.platform(), Platform::Xbox360Jp);
    assert_eq!(session.snapshot().platform, Platform::Xbox360Jp);
    assert_eq!(session.container().map(|c| c.profile_id), Some(PROFILE_ID));

    assert_eq!(session.to_bytes().unwrap(), container);

    session.set_cash(1).unwrap();
    let rewrapped = session.to_bytes().unwrap();
    let reopened = engine.open_bytes(rewrapped).unwrap();
    assert_eq!(reopened.snapshot().cash, 1);

    let calls = wrapped.borrow();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0], (PROFILE_ID, vec![7; 20], TitleVariant::Japanese));
}
