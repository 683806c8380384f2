use hger_core::core_api::{CoreErrorCode, GameTables};
use hger_core::crypto::{SIZE_PARTY, crc16};
use hger_core::game_data::{BaseStats, Stat};
use hger_core::layout::{BlockFamily, BlockSide};
use hger_core::pk4::{Pk4, RecordKind};
use hger_core::sav4::blocks::{
    FOOTER_SIZE, GENERAL_A_BASE, GENERAL_B_BASE, SAVE_SIZE, STORAGE_A_BASE, STORAGE_B_BASE,
    detect_block_size,
};
use hger_core::sav4::{SaveFile, SlotRef};
use hger_core::text::CharTable;

const GENERAL_SIZE: usize = 0xF700;
const STORAGE_SIZE: usize = 0x1F000;
const OFS_TID: usize = 0x74;
const OFS_PARTY: usize = 0x98;
const OFS_PLAYTIME_HOURS: usize = 0x86;
const OFS_PLAYTIME_MINUTES: usize = 0x88;
const OFS_PLAYTIME_SECONDS: usize = 0x89;
const OFS_BOX_NAMES: usize = 0x1E000;
const BOX_NAME_STRIDE: usize = 40;
const BOX_NAME_HEADER: usize = 12;
const OFS_CURRENT_BOX: usize = 0x1E4B0;

fn write_footer(raw: &mut [u8], base: usize, size: usize, count: u32) {
    let footer = base + size - FOOTER_SIZE;
    raw[footer..footer + 4].copy_from_slice(&count.to_le_bytes());
    raw[footer + 4..footer + 8].copy_from_slice(&(size as u32).to_le_bytes());
    let crc = crc16(&raw[base..footer]);
    raw[footer + 0xE..footer + 0x10].copy_from_slice(&crc.to_le_bytes());
}

/// Both sides valid, with the given save counters and distinct TIDs.
fn two_sided_image(count_a: u32, count_b: u32) -> Vec<u8> {
    let mut raw = vec![0u8; SAVE_SIZE];
    raw[GENERAL_A_BASE + OFS_TID..GENERAL_A_BASE + OFS_TID + 2]
        .copy_from_slice(&111u16.to_le_bytes());
    raw[GENERAL_B_BASE + OFS_TID..GENERAL_B_BASE + OFS_TID + 2]
        .copy_from_slice(&222u16.to_le_bytes());
    write_footer(&mut raw, GENERAL_A_BASE, GENERAL_SIZE, count_a);
    write_footer(&mut raw, STORAGE_A_BASE, STORAGE_SIZE, count_a);
    write_footer(&mut raw, GENERAL_B_BASE, GENERAL_SIZE, count_b);
    write_footer(&mut raw, STORAGE_B_BASE, STORAGE_SIZE, count_b);
    raw
}

fn tables() -> GameTables {
    let mut tables = GameTables::new();
    tables.insert_base_stats(
        25,
        0,
        BaseStats {
            hp: 35,
            atk: 55,
            def: 30,
            spa: 50,
            spd: 40,
            spe: 90,
        },
    );
    tables
}

fn member(species: u16, pid: u32) -> Pk4 {
    let mut pk = Pk4::blank(RecordKind::Party);
    pk.set_pid(pid);
    pk.set_species(species);
    pk.set_exp(125_000);
    pk.set_move(0, 84);
    pk.set_nickname(&CharTable::basic_latin(), "Mon");
    pk
}

#[test]
fn higher_counter_selects_the_backup_side() {
    let save = SaveFile::from_bytes(two_sided_image(5, 7));
    let layout = save.block_layout();
    assert_eq!(layout.active, BlockSide::Backup);
    assert_eq!(layout.general.base(), GENERAL_B_BASE);
    assert_eq!(layout.general.size(), GENERAL_SIZE);
    assert_eq!(layout.storage.base(), STORAGE_B_BASE);
    assert_eq!(layout.storage.size(), STORAGE_SIZE);
    assert_eq!(layout.general.save_count, 7);
    assert_eq!(save.tid(), 222);
}

#[test]
fn equal_counters_prefer_the_primary_side() {
    let save = SaveFile::from_bytes(two_sided_image(4, 4));
    assert_eq!(save.block_layout().active, BlockSide::Primary);
    assert_eq!(save.tid(), 111);
}

#[test]
fn corrupt_backup_loses_despite_higher_counter() {
    let mut raw = two_sided_image(5, 7);
    raw[GENERAL_B_BASE + 0x200] ^= 0x01;
    let save = SaveFile::from_bytes(raw);
    assert_eq!(save.block_layout().active, BlockSide::Primary);
    assert!(save.block_layout().is_fully_detected());
    assert!(!save.probe_block(BlockFamily::General, BlockSide::Backup).detected);
}

fn write_codes(raw: &mut [u8], offset: usize, codes: &[u16]) {
    for (i, code) in codes.iter().enumerate() {
        raw[offset + i * 2..offset + i * 2 + 2].copy_from_slice(&code.to_le_bytes());
    }
}

fn read_code(raw: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([raw[offset], raw[offset + 1]])
}

#[test]
fn trainer_extras_are_read_from_the_active_backup_blocks() {
    let mut raw = two_sided_image(5, 7);
    // B, o, x, terminator
    let name_b = STORAGE_B_BASE + OFS_BOX_NAMES + 2 * BOX_NAME_STRIDE + BOX_NAME_HEADER;
    write_codes(&mut raw, name_b, &[0x012C, 0x0153, 0x015C, 0xFFFF]);
    let name_a = STORAGE_A_BASE + OFS_BOX_NAMES + 2 * BOX_NAME_STRIDE + BOX_NAME_HEADER;
    write_codes(&mut raw, name_a, &[0x012B, 0xFFFF]);

    raw[GENERAL_B_BASE + OFS_PLAYTIME_HOURS..GENERAL_B_BASE + OFS_PLAYTIME_HOURS + 2]
        .copy_from_slice(&312u16.to_le_bytes());
    raw[GENERAL_B_BASE + OFS_PLAYTIME_MINUTES] = 45;
    raw[GENERAL_B_BASE + OFS_PLAYTIME_SECONDS] = 9;
    raw[GENERAL_A_BASE + OFS_PLAYTIME_HOURS] = 1;

    raw[STORAGE_B_BASE + OFS_CURRENT_BOX] = 13;
    raw[STORAGE_A_BASE + OFS_CURRENT_BOX] = 4;

    write_footer(&mut raw, GENERAL_B_BASE, GENERAL_SIZE, 7);
    write_footer(&mut raw, STORAGE_B_BASE, STORAGE_SIZE, 7);
    write_footer(&mut raw, GENERAL_A_BASE, GENERAL_SIZE, 5);
    write_footer(&mut raw, STORAGE_A_BASE, STORAGE_SIZE, 5);

    let save = SaveFile::from_bytes(raw);
    assert_eq!(save.block_layout().active, BlockSide::Backup);
    let chars = CharTable::basic_latin();
    assert_eq!(save.box_name(2, &chars).expect("box 3 name"), "Box");
    let playtime = save.playtime();
    assert_eq!(playtime.hours, 312);
    assert_eq!(playtime.minutes, 45);
    assert_eq!(playtime.seconds, 9);
    assert_eq!(playtime.to_string(), "312:45:09");
    assert_eq!(save.current_box(), 13);
}

#[test]
fn renaming_a_box_writes_the_active_name_field() {
    let chars = CharTable::basic_latin();
    let mut save = SaveFile::from_bytes(two_sided_image(1, 0));
    save.set_box_name(17, &chars, "Gold").expect("rename box 18");
    assert_eq!(save.box_name(17, &chars).expect("box 18 name"), "Gold");

    let offset = STORAGE_A_BASE + OFS_BOX_NAMES + 17 * BOX_NAME_STRIDE + BOX_NAME_HEADER;
    let raw = save.as_bytes();
    assert_eq!(read_code(raw, offset), 0x0131);
    assert_eq!(read_code(raw, offset + 2), 0x0153);
    assert_eq!(read_code(raw, offset + 8), 0xFFFF);
    assert_eq!(read_code(raw, offset - 2), 0);

    let err = save
        .set_box_name(30, &chars, "Nope")
        .expect_err("there are only thirty boxes");
    assert_eq!(err.code, CoreErrorCode::InvalidInput);
}

#[test]
fn party_count_grows_and_shrinks_with_writes() {
    let tables = tables();
    let mut save = SaveFile::from_bytes(two_sided_image(1, 0));
    assert_eq!(save.party_count(), 0);

    save.set_party_slot(0, member(25, 0x10), &tables).expect("slot 0");
    assert_eq!(save.party_count(), 1);
    save.set_party_slot(2, member(25, 0x30), &tables).expect("slot 2");
    assert_eq!(save.party_count(), 3);
    save.set_party_slot(1, member(25, 0x20), &tables).expect("slot 1");
    assert_eq!(save.party_count(), 3);

    save.set_party_slot(2, Pk4::blank(RecordKind::Party), &tables)
        .expect("clearing slot 2");
    assert_eq!(save.party_count(), 2);
}

#[test]
fn party_writes_refresh_battle_stats() {
    let tables = tables();
    let mut save = SaveFile::from_bytes(two_sided_image(1, 0));
    let mut boxed = member(25, 0x1234_5678).to_stored();
    for stat in Stat::ALL {
        boxed.set_iv(stat, 31);
    }

    save.set_party_slot(0, boxed, &tables).expect("party write");
    let read = save.party_slot(0).expect("party read");
    assert!(read.is_party());
    assert!(read.is_checksum_valid());
    assert_eq!(read.current_level(), 50);
    assert_eq!(read.battle_stats(), [110, 75, 45, 110, 70, 66]);
    assert_eq!(read.current_hp(), 110);
}

#[test]
fn deleting_compacts_the_party() {
    let tables = tables();
    let mut save = SaveFile::from_bytes(two_sided_image(1, 0));
    for (i, pid) in [0x10u32, 0x20, 0x30].into_iter().enumerate() {
        save.set_party_slot(i, member(25, pid), &tables).expect("fill");
    }

    save.delete_party_slot(0, &tables).expect("delete first");
    assert_eq!(save.party_count(), 2);
    assert_eq!(save.party_slot(0).expect("slot 0").pid(), 0x20);
    assert_eq!(save.party_slot(1).expect("slot 1").pid(), 0x30);
    assert!(save.party_slot(2).expect("slot 2").is_empty());

    save.delete_party_slot(1, &tables).expect("delete second");
    let err = save
        .delete_party_slot(0, &tables)
        .expect_err("last member stays");
    assert_eq!(err.code, CoreErrorCode::UnsupportedOperation);
    assert_eq!(save.party_count(), 1);

    let err = save
        .delete_party_slot(4, &tables)
        .expect_err("slot beyond the party");
    assert_eq!(err.code, CoreErrorCode::InvalidInput);
}

#[test]
fn box_writes_drop_the_battle_tail() {
    let tables = tables();
    let mut save = SaveFile::from_bytes(two_sided_image(1, 0));
    let slot = SlotRef::Box {
        box_index: 3,
        slot: 17,
    };
    save.set_slot(slot, member(25, 0x99), &tables).expect("box write");

    let read = save.slot(slot).expect("box read");
    assert!(!read.is_party());
    assert_eq!(read.species(), 25);
    assert_eq!(read.pid(), 0x99);

    save.copy_slot(slot, SlotRef::Party(0), &tables).expect("copy to party");
    assert_eq!(save.party_count(), 1);
    assert_eq!(save.party_slot(0).expect("party").species(), 25);

    let err = save
        .copy_slot(SlotRef::Box { box_index: 0, slot: 0 }, SlotRef::Party(1), &tables)
        .expect_err("empty source");
    assert_eq!(err.code, CoreErrorCode::InvalidInput);
}

#[test]
fn persisting_touches_only_the_active_footers() {
    let tables = tables();
    let original = two_sided_image(3, 8);
    let mut save = SaveFile::from_bytes(original.clone());
    save.set_money(4321);
    save.set_party_slot(0, member(25, 0x42), &tables).expect("party write");

    let out = save.to_bytes();
    assert_eq!(out.len(), SAVE_SIZE);
    assert!(!save.is_modified());
    assert_eq!(&out[..GENERAL_B_BASE], &original[..GENERAL_B_BASE]);
    assert_eq!(detect_block_size(&out, GENERAL_B_BASE, 0x10000), Some(GENERAL_SIZE));
    assert_eq!(detect_block_size(&out, STORAGE_B_BASE, 0x30000), Some(STORAGE_SIZE));

    let reopened = SaveFile::from_bytes(out);
    assert_eq!(reopened.block_layout().active, BlockSide::Backup);
    assert_eq!(reopened.block_layout().general.save_count, 8);
    assert_eq!(reopened.money(), 4321);
    assert_eq!(reopened.party_count(), 1);
}

#[test]
fn untouched_party_slot_bytes_survive_a_persist() {
    let tables = tables();
    let mut save = SaveFile::from_bytes(two_sided_image(1, 0));
    save.set_party_slot(0, member(25, 0x77), &tables).expect("party write");
    let before = save.as_bytes()[OFS_PARTY..OFS_PARTY + SIZE_PARTY].to_vec();

    let out = save.to_bytes();
    assert_eq!(&out[OFS_PARTY..OFS_PARTY + SIZE_PARTY], before.as_slice());
}

#[test]
fn trailing_bytes_are_kept() {
    let mut raw = two_sided_image(1, 0);
    raw.extend_from_slice(&[0xAB; 0x7A]);
    let mut save = SaveFile::from_bytes(raw);
    let out = save.to_bytes();
    assert_eq!(out.len(), SAVE_SIZE + 0x7A);
    assert_eq!(&out[SAVE_SIZE..], &[0xAB; 0x7A]);
}
