use std::fmt;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::process;

use clap::{ArgGroup, Parser, ValueEnum};
use hger_core::core_api::{CoreError, CoreErrorCode, Engine, GameTables, OpenOptions, Session};
use hger_core::crypto::ShuffleResolver;
use hger_core::game_data::{MAX_LEVEL, MIN_LEVEL, NATURE_COUNT, Stat, nature_from_name};
use hger_core::gender::Gender;
use hger_core::pk4::{MAX_IV, MAX_SPECIES, Pk4};
use hger_core::sav4::{BOX_COUNT, SlotRef};
use hger_render::{
    FieldSelection, JsonStyle, render_json_full, render_json_selected, render_text,
    selected_pairs,
};
use tracing_subscriber::EnvFilter;

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum GenderArg {
    Male,
    Female,
}

/// `--set-mint` value: a nature, or `none` to clear the override.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
struct MintArg(Option<u8>);

#[derive(Debug, Parser)]
#[command(author, version, about)]
#[command(group(
    ArgGroup::new("record_edits").multiple(true).args([
        "set_species",
        "set_level",
        "set_nickname",
        "set_held_item",
        "set_ivs",
        "set_evs",
        "set_mint",
        "set_friendship",
    ])
))]
struct Cli {
    #[arg(value_name = "SAVE")]
    path: PathBuf,
    #[arg(long = "data-dir", value_name = "DIR")]
    data_dir: Option<PathBuf>,
    #[arg(long = "heuristic-shuffle")]
    heuristic_shuffle: bool,
    #[arg(long = "trainer-name")]
    trainer_name: bool,
    #[arg(long)]
    tid: bool,
    #[arg(long)]
    sid: bool,
    #[arg(long)]
    money: bool,
    #[arg(long)]
    gender: bool,
    #[arg(long)]
    playtime: bool,
    #[arg(long)]
    party: bool,
    #[arg(
        long = "box",
        value_name = "N",
        value_parser = clap::value_parser!(u8).range(1..=BOX_COUNT as i64)
    )]
    box_number: Option<u8>,
    #[arg(long = "box-names")]
    box_names: bool,
    #[arg(long)]
    blocks: bool,
    #[arg(long)]
    json: bool,
    #[arg(long = "set-trainer-name", value_name = "NAME")]
    set_trainer_name: Option<String>,
    #[arg(long = "set-tid")]
    set_tid: Option<u16>,
    #[arg(long = "set-sid")]
    set_sid: Option<u16>,
    #[arg(long = "set-money")]
    set_money: Option<u32>,
    #[arg(long = "set-gender")]
    set_gender: Option<GenderArg>,
    #[arg(long, value_name = "party:N|box:B:S", requires = "record_edits")]
    slot: Option<SlotRef>,
    #[arg(long = "set-species", value_name = "ID|NAME", requires = "slot")]
    set_species: Option<String>,
    #[arg(
        long = "set-level",
        requires = "slot",
        value_parser = clap::value_parser!(u8).range(i64::from(MIN_LEVEL)..=i64::from(MAX_LEVEL))
    )]
    set_level: Option<u8>,
    #[arg(long = "set-nickname", value_name = "NAME", requires = "slot")]
    set_nickname: Option<String>,
    #[arg(long = "set-held-item", value_name = "ITEM", requires = "slot")]
    set_held_item: Option<u16>,
    #[arg(
        long = "set-ivs",
        value_name = "HP,ATK,DEF,SPE,SPA,SPD",
        requires = "slot",
        value_parser = parse_ivs
    )]
    set_ivs: Option<[u8; 6]>,
    #[arg(
        long = "set-evs",
        value_name = "HP,ATK,DEF,SPE,SPA,SPD",
        requires = "slot",
        value_parser = parse_evs
    )]
    set_evs: Option<[u8; 6]>,
    #[arg(
        long = "set-mint",
        value_name = "NATURE|none",
        requires = "slot",
        value_parser = parse_mint
    )]
    set_mint: Option<MintArg>,
    #[arg(long = "set-friendship", requires = "slot")]
    set_friendship: Option<u8>,
    #[arg(long, value_name = "FROM", requires = "to")]
    copy: Option<SlotRef>,
    #[arg(long, value_name = "TO", requires = "copy")]
    to: Option<SlotRef>,
    #[arg(long, value_name = "SLOT")]
    delete: Option<SlotRef>,
    #[arg(long)]
    output: Option<PathBuf>,
}

impl Cli {
    fn fields(&self) -> FieldSelection {
        FieldSelection {
            trainer_name: self.trainer_name,
            tid: self.tid,
            sid: self.sid,
            money: self.money,
            gender: self.gender,
            playtime: self.playtime,
            party: self.party,
            box_index: self.box_number.map(|n| usize::from(n) - 1),
            box_names: self.box_names,
            blocks: self.blocks,
        }
    }

    fn has_trainer_edits(&self) -> bool {
        self.set_trainer_name.is_some()
            || self.set_tid.is_some()
            || self.set_sid.is_some()
            || self.set_money.is_some()
            || self.set_gender.is_some()
    }

    fn has_record_edits(&self) -> bool {
        self.set_species.is_some()
            || self.set_level.is_some()
            || self.set_nickname.is_some()
            || self.set_held_item.is_some()
            || self.set_ivs.is_some()
            || self.set_evs.is_some()
            || self.set_mint.is_some()
            || self.set_friendship.is_some()
    }

    fn has_edits(&self) -> bool {
        self.has_trainer_edits()
            || self.has_record_edits()
            || self.copy.is_some()
            || self.delete.is_some()
    }
}

/// Record edits with names already resolved to IDs.
#[derive(Debug, Default)]
struct RecordEdits {
    species: Option<u16>,
    level: Option<u8>,
    nickname: Option<String>,
    held_item: Option<u16>,
    ivs: Option<[u8; 6]>,
    evs: Option<[u8; 6]>,
    mint: Option<MintArg>,
    friendship: Option<u8>,
}

impl RecordEdits {
    fn from_cli(cli: &Cli, tables: &GameTables) -> Result<Self, CoreError> {
        let species = cli
            .set_species
            .as_deref()
            .map(|value| resolve_species(value, tables))
            .transpose()?;
        Ok(Self {
            species,
            level: cli.set_level,
            nickname: cli.set_nickname.clone(),
            held_item: cli.set_held_item,
            ivs: cli.set_ivs,
            evs: cli.set_evs,
            mint: cli.set_mint,
            friendship: cli.set_friendship,
        })
    }

    /// Species goes first so the level lookup uses the new growth rate.
    fn apply(&self, pk: &mut Pk4, tables: &GameTables) -> Result<(), CoreError> {
        if let Some(species) = self.species {
            pk.set_species(species);
        }
        if pk.species() == 0 {
            return Err(CoreError::new(
                CoreErrorCode::InvalidInput,
                "slot is empty; use --set-species to create a record",
            ));
        }
        if let Some(level) = self.level {
            pk.set_level(level, tables);
        }
        if let Some(nickname) = &self.nickname {
            pk.set_nickname(tables.chars(), nickname);
            pk.set_nicknamed(true);
        }
        if let Some(item) = self.held_item {
            pk.set_held_item(item);
        }
        if let Some(ivs) = self.ivs {
            for stat in Stat::ALL {
                pk.set_iv(stat, ivs[stat.index()]);
            }
        }
        if let Some(evs) = self.evs {
            for stat in Stat::ALL {
                pk.set_ev(stat, evs[stat.index()]);
            }
        }
        if let Some(MintArg(nature)) = self.mint {
            pk.set_mint_nature(nature);
        }
        if let Some(friendship) = self.friendship {
            pk.set_friendship(friendship);
        }
        Ok(())
    }
}

fn resolve_species(value: &str, tables: &GameTables) -> Result<u16, CoreError> {
    let species = match value.trim().parse::<u16>() {
        Ok(id) => Some(id),
        Err(_) => tables.species_by_name(value),
    };
    match species {
        Some(id) if id > MAX_SPECIES => Err(CoreError::new(
            CoreErrorCode::InvalidInput,
            format!("species {id} is above the highest storable ID {MAX_SPECIES}"),
        )),
        Some(id) if id > 0 => Ok(id),
        _ => Err(CoreError::new(
            CoreErrorCode::InvalidInput,
            format!("unknown species '{value}'"),
        )),
    }
}

fn parse_six(value: &str, max: u8) -> Result<[u8; 6], String> {
    let parts: Vec<&str> = value.split(',').map(str::trim).collect();
    if parts.len() != 6 {
        return Err(format!("expected 6 comma-separated values, got {}", parts.len()));
    }
    let mut out = [0u8; 6];
    for (slot, part) in out.iter_mut().zip(parts) {
        let parsed: u8 = part
            .parse()
            .map_err(|_| format!("'{part}' is not a number between 0 and {max}"))?;
        if parsed > max {
            return Err(format!("{parsed} is above the maximum of {max}"));
        }
        *slot = parsed;
    }
    Ok(out)
}

fn parse_ivs(value: &str) -> Result<[u8; 6], String> {
    parse_six(value, MAX_IV)
}

fn parse_evs(value: &str) -> Result<[u8; 6], String> {
    parse_six(value, u8::MAX)
}

fn parse_mint(value: &str) -> Result<MintArg, String> {
    if value.eq_ignore_ascii_case("none") {
        return Ok(MintArg(None));
    }
    if let Ok(index) = value.parse::<u8>() {
        if index < NATURE_COUNT {
            return Ok(MintArg(Some(index)));
        }
        return Err(format!("nature index must be below {NATURE_COUNT}"));
    }
    nature_from_name(value)
        .map(|nature| MintArg(Some(nature)))
        .ok_or_else(|| format!("unknown nature '{value}'"))
}

fn to_core_gender(gender: GenderArg) -> Gender {
    match gender {
        GenderArg::Male => Gender::Male,
        GenderArg::Female => Gender::Female,
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn exit_with(context: impl fmt::Display, err: impl fmt::Display) -> ! {
    eprintln!("Error {context}: {err}");
    process::exit(1);
}

fn main() {
    init_tracing();
    let cli = Cli::parse();
    let fields = cli.fields();
    let has_edits = cli.has_edits();

    if has_edits && cli.output.is_none() {
        eprintln!("edit flags require --output <PATH>");
        process::exit(2);
    }
    if !has_edits && cli.output.is_some() {
        eprintln!("--output requires at least one edit flag");
        process::exit(2);
    }

    let tables = match &cli.data_dir {
        Some(dir) => GameTables::load_from_dir(dir)
            .unwrap_or_else(|e| exit_with(format!("loading {}", dir.display()), e)),
        None => GameTables::default(),
    };
    let record_edits = RecordEdits::from_cli(&cli, &tables)
        .unwrap_or_else(|e| exit_with("resolving record edits", e));

    let bytes = fs::read(&cli.path)
        .unwrap_or_else(|e| exit_with(format!("reading {}", cli.path.display()), e));

    let options = OpenOptions {
        resolver: if cli.heuristic_shuffle {
            ShuffleResolver::Heuristic
        } else {
            ShuffleResolver::Fixed
        },
    };
    let engine = Engine::new(tables);
    let mut session = engine
        .open_bytes(bytes, options)
        .unwrap_or_else(|e| exit_with(format!("opening {}", cli.path.display()), e));

    apply_trainer_edits(&cli, &mut session);
    if let Some(slot) = cli.slot {
        session
            .edit_record(slot, |pk, tables| record_edits.apply(pk, tables))
            .unwrap_or_else(|e| exit_with(format!("editing {slot}"), e));
    }
    if let (Some(from), Some(to)) = (cli.copy, cli.to) {
        session
            .copy_slot(from, to)
            .unwrap_or_else(|e| exit_with(format!("copying {from} to {to}"), e));
    }
    if let Some(slot) = cli.delete {
        session
            .delete_slot(slot)
            .unwrap_or_else(|e| exit_with(format!("deleting {slot}"), e));
    }

    if let Some(out_path) = cli.output.as_ref() {
        let edited_bytes = session.to_bytes_modified();
        fs::write(out_path, edited_bytes)
            .unwrap_or_else(|e| exit_with(format!("writing {}", out_path.display()), e));
        tracing::info!(path = %out_path.display(), "wrote edited save");
    }

    if cli.json {
        let json = if fields.is_any_selected() {
            render_json_selected(&session, &fields, JsonStyle::CanonicalV1)
                .unwrap_or_else(|e| exit_with("rendering selection", e))
        } else {
            render_json_full(&session, JsonStyle::CanonicalV1)
        };
        let rendered = serde_json::to_string_pretty(&json)
            .unwrap_or_else(|e| exit_with("rendering JSON output", e));
        println!("{rendered}");
        return;
    }

    if fields.is_any_selected() {
        let pairs = selected_pairs(&session, &fields)
            .unwrap_or_else(|e| exit_with("rendering selection", e));
        for (key, value) in pairs {
            println!("{key}={value}");
        }
        return;
    }

    if let Some(out_path) = cli.output.as_ref() {
        println!("Wrote edited save to {}", out_path.display());
        return;
    }

    print!("{}", render_text(&session));
}

fn apply_trainer_edits(cli: &Cli, session: &mut Session) {
    if let Some(name) = &cli.set_trainer_name {
        session
            .set_trainer_name(name)
            .unwrap_or_else(|e| exit_with("applying trainer name edit", e));
    }
    if let Some(tid) = cli.set_tid {
        session.set_tid(tid);
    }
    if let Some(sid) = cli.set_sid {
        session.set_sid(sid);
    }
    if let Some(money) = cli.set_money {
        session.set_money(money);
    }
    if let Some(gender) = cli.set_gender {
        session
            .set_gender(to_core_gender(gender))
            .unwrap_or_else(|e| exit_with("applying gender edit", e));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn six_value_lists_are_bounded() {
        assert_eq!(parse_ivs("31,0,15,31,31,2"), Ok([31, 0, 15, 31, 31, 2]));
        assert!(parse_ivs("32,0,0,0,0,0").is_err());
        assert!(parse_ivs("1,2,3").is_err());
        assert_eq!(parse_evs("252, 0, 4, 252, 0, 0"), Ok([252, 0, 4, 252, 0, 0]));
        assert!(parse_evs("256,0,0,0,0,0").is_err());
    }

    #[test]
    fn mint_accepts_names_indices_and_none() {
        assert_eq!(parse_mint("adamant"), Ok(MintArg(Some(3))));
        assert_eq!(parse_mint("24"), Ok(MintArg(Some(24))));
        assert_eq!(parse_mint("None"), Ok(MintArg(None)));
        assert!(parse_mint("25").is_err());
        assert!(parse_mint("grumpy").is_err());
    }

    #[test]
    fn species_resolves_by_id() {
        let tables = GameTables::default();
        assert_eq!(resolve_species("152", &tables).ok(), Some(152));
        assert!(resolve_species("0", &tables).is_err());
        assert!(resolve_species("Chikorita", &tables).is_err());
        assert_eq!(resolve_species("65485", &tables).ok(), Some(MAX_SPECIES));
        let err = resolve_species("65500", &tables).expect_err("above the storable range");
        assert_eq!(err.code, CoreErrorCode::InvalidInput);
    }
}
