use std::fs;

use hger_core::core_api::{
    CapabilityIssue, CoreError, CoreErrorCode, Engine, GameTables, OpenOptions,
};
use hger_core::crypto::{ShuffleResolver, crc16};
use hger_core::gender::Gender;
use hger_core::layout::BlockSide;
use hger_core::pk4::RecordWarning;
use hger_core::sav4::blocks::{
    FOOTER_SIZE, GENERAL_A_BASE, GENERAL_B_BASE, SAVE_SIZE, STORAGE_A_BASE, STORAGE_B_BASE,
};
use hger_core::sav4::SlotRef;

const GENERAL_SIZE: usize = 0xF700;
const STORAGE_SIZE: usize = 0x1F000;

fn write_footer(raw: &mut [u8], base: usize, size: usize, count: u32) {
    let footer = base + size - FOOTER_SIZE;
    raw[footer..footer + 4].copy_from_slice(&count.to_le_bytes());
    raw[footer + 4..footer + 8].copy_from_slice(&(size as u32).to_le_bytes());
    let crc = crc16(&raw[base..footer]);
    raw[footer + 0xE..footer + 0x10].copy_from_slice(&crc.to_le_bytes());
}

fn valid_image() -> Vec<u8> {
    let mut raw = vec![0u8; SAVE_SIZE];
    write_footer(&mut raw, GENERAL_A_BASE, GENERAL_SIZE, 2);
    write_footer(&mut raw, STORAGE_A_BASE, STORAGE_SIZE, 2);
    write_footer(&mut raw, GENERAL_B_BASE, GENERAL_SIZE, 1);
    write_footer(&mut raw, STORAGE_B_BASE, STORAGE_SIZE, 1);
    raw
}

fn data_dir() -> tempfile::TempDir {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    fs::write(dir.path().join("species.txt"), "-----\nBulbasaur\nIvysaur\n")
        .expect("species.txt");
    fs::write(dir.path().join("moves.txt"), "-\nPound\nKarate Chop\n").expect("moves.txt");
    fs::write(dir.path().join("basestats.csv"), "1,45,49,49,65,65,45\n").expect("basestats");
    fs::write(dir.path().join("growth_rates.csv"), "1,Medium Slow\n").expect("growth");
    fs::write(dir.path().join("locations.txt"), "126\tNew Bark Town\n").expect("locations");
    dir
}

#[test]
fn session_reports_trainer_and_layout() {
    let session = Engine::default()
        .open_bytes(valid_image(), OpenOptions::default())
        .expect("image should open");

    let snapshot = session.snapshot();
    assert_eq!(snapshot.layout.active, BlockSide::Primary);
    assert_eq!(snapshot.layout.general.size(), GENERAL_SIZE);
    assert_eq!(snapshot.party_count, 0);
    assert_eq!(snapshot.gender, Gender::Male);
    assert!(session.capabilities().is_confident());
    assert!(session.capabilities().can_apply_edits);
}

#[test]
fn fallback_layout_is_flagged() {
    let session = Engine::default()
        .open_bytes(vec![0u8; SAVE_SIZE], OpenOptions::default())
        .expect("image should open");
    assert_eq!(
        session.capabilities().issues,
        vec![
            CapabilityIssue::GeneralBlockFallback,
            CapabilityIssue::StorageBlockFallback
        ]
    );
}

#[test]
fn tables_load_from_a_data_directory() {
    let dir = data_dir();
    let tables = GameTables::load_from_dir(dir.path()).expect("tables should load");
    assert_eq!(tables.species_name(2), "Ivysaur");
    assert_eq!(tables.species_by_name("bulbasaur"), Some(1));
    assert_eq!(tables.move_name(2), "Karate Chop");
    assert_eq!(tables.location_name(126), "New Bark Town");
    assert_eq!(tables.item_name(5), "Item #5");
    assert_eq!(tables.data_dir(), Some(dir.path()));
}

#[test]
fn missing_data_directory_is_an_io_error() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let err = GameTables::load_from_dir(&dir.path().join("nope")).expect_err("missing dir");
    assert_eq!(err.code, CoreErrorCode::Io);
}

#[test]
fn record_edits_round_trip_through_bytes() {
    let dir = data_dir();
    let tables = GameTables::load_from_dir(dir.path()).expect("tables should load");
    let engine = Engine::new(tables);
    let mut session = engine
        .open_bytes(valid_image(), OpenOptions::default())
        .expect("image should open");

    session
        .edit_record(SlotRef::Party(0), |pk, tables| {
            pk.set_pid(0x0000_0100);
            pk.set_species(1);
            pk.set_level(5, tables);
            pk.set_move(0, 1);
            pk.set_ability(65);
            pk.set_met_level(5);
            pk.set_nickname(tables.chars(), "BULBA");
            Ok(())
        })
        .expect("edit should apply");
    session.set_money(1_500_000);
    session.set_trainer_name("LYRA").expect("name");
    assert!(session.is_modified());
    assert_eq!(session.snapshot().party_count, 1);
    assert_eq!(session.snapshot().money, 999_999);

    let bytes = session.to_bytes_modified();
    let reopened = engine
        .open_bytes(&bytes, OpenOptions::default())
        .expect("edited image should open");
    assert!(reopened.capabilities().is_confident());
    assert_eq!(reopened.snapshot().trainer_name, "LYRA");

    let party = reopened.party();
    assert_eq!(party.len(), 1);
    let bulba = &party[0];
    assert_eq!(bulba.slot, "party:1");
    assert_eq!(bulba.species_name, "Bulbasaur");
    assert_eq!(bulba.nickname, "BULBA");
    assert_eq!(bulba.level, 5);
    assert_eq!(bulba.exp, 135);
    assert_eq!(bulba.moves.len(), 1);
    assert_eq!(bulba.moves[0].name, "Pound");
    assert!(bulba.warnings.is_empty());
    assert!(bulba.checksum_valid);
    // HP 45 base at level 5 with zero IVs/EVs: 45*2*5/100 + 5 + 10
    assert_eq!(bulba.stats.map(|s| s[0]), Some(19));
}

#[test]
fn failed_edits_leave_the_slot_alone() {
    let mut session = Engine::default()
        .open_bytes(valid_image(), OpenOptions::default())
        .expect("image should open");
    let err = session
        .edit_record(SlotRef::Box { box_index: 0, slot: 0 }, |_, _| {
            Err(CoreError::new(CoreErrorCode::InvalidInput, "rejected"))
        })
        .expect_err("edit should fail");
    assert_eq!(err.code, CoreErrorCode::InvalidInput);
    assert!(!session.is_modified());
}

#[test]
fn deleting_the_only_member_is_refused() {
    let mut session = Engine::default()
        .open_bytes(valid_image(), OpenOptions::default())
        .expect("image should open");
    session
        .edit_record(SlotRef::Party(0), |pk, _| {
            pk.set_pid(7);
            pk.set_species(1);
            Ok(())
        })
        .expect("edit");
    let err = session
        .delete_slot(SlotRef::Party(0))
        .expect_err("last member");
    assert_eq!(err.code, CoreErrorCode::UnsupportedOperation);

    session
        .copy_slot(SlotRef::Party(0), SlotRef::Box { box_index: 1, slot: 0 })
        .expect("copy");
    let boxed = session.box_contents(1).expect("box 2");
    assert_eq!(boxed.len(), 1);
    assert_eq!(boxed[0].slot, "box:2:1");
    assert_eq!(boxed[0].stats, None);
    assert!(boxed[0].warnings.contains(&RecordWarning::NoNickname));
    assert_eq!(session.boxes()[1].occupied, 1);
}

#[test]
fn heuristic_resolver_is_opt_in() {
    let session = Engine::default()
        .open_bytes(
            valid_image(),
            OpenOptions {
                resolver: ShuffleResolver::Heuristic,
            },
        )
        .expect("image should open");
    assert_eq!(session.save().resolver(), ShuffleResolver::Heuristic);
    assert_eq!(
        Engine::default()
            .open_bytes(valid_image(), OpenOptions::default())
            .expect("image should open")
            .save()
            .resolver(),
        ShuffleResolver::Fixed
    );
}
