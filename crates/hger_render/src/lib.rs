use std::fmt::{self, Write as _};

use hger_core::core_api::{CoreError, CoreErrorCode, CreatureSummary, Session};
use hger_core::game_data::Stat;
use hger_core::layout::BlockRegion;
use hger_core::sav4::BOX_COUNT;
use serde_json::{Map as JsonMap, Value as JsonValue};

const NAME_COL_WIDTH: usize = 14;
const NICK_COL_WIDTH: usize = 13;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonStyle {
    #[default]
    CanonicalV1,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FieldSelection {
    pub trainer_name: bool,
    pub tid: bool,
    pub sid: bool,
    pub money: bool,
    pub gender: bool,
    pub playtime: bool,
    pub party: bool,
    /// Zero-based box whose contents are listed.
    pub box_index: Option<usize>,
    pub box_names: bool,
    pub blocks: bool,
}

impl FieldSelection {
    pub fn is_any_selected(&self) -> bool {
        self.trainer_name
            || self.tid
            || self.sid
            || self.money
            || self.gender
            || self.playtime
            || self.party
            || self.box_index.is_some()
            || self.box_names
            || self.blocks
    }
}

pub fn render_json_full(session: &Session, style: JsonStyle) -> JsonValue {
    match style {
        JsonStyle::CanonicalV1 => JsonValue::Object(default_json(session)),
    }
}

pub fn render_json_selected(
    session: &Session,
    fields: &FieldSelection,
    style: JsonStyle,
) -> Result<JsonValue, CoreError> {
    match style {
        JsonStyle::CanonicalV1 => selected_json(fields, session).map(JsonValue::Object),
    }
}

/// `key=value` lines for the selected fields, one entry per line. List
/// fields repeat their key.
pub fn selected_pairs(
    session: &Session,
    fields: &FieldSelection,
) -> Result<Vec<(&'static str, String)>, CoreError> {
    let snapshot = session.snapshot();
    let mut out = Vec::new();

    if fields.trainer_name {
        out.push(("trainer_name", snapshot.trainer_name.clone()));
    }
    if fields.tid {
        out.push(("tid", snapshot.tid.to_string()));
    }
    if fields.sid {
        out.push(("sid", snapshot.sid.to_string()));
    }
    if fields.money {
        out.push(("money", snapshot.money.to_string()));
    }
    if fields.gender {
        out.push(("gender", snapshot.gender.to_string()));
    }
    if fields.playtime {
        out.push(("playtime", snapshot.playtime.to_string()));
    }
    if fields.party {
        for creature in session.party() {
            out.push(("party", creature_line(&creature)));
        }
    }
    if let Some(box_index) = fields.box_index {
        check_box_index(box_index)?;
        for creature in session.box_contents(box_index)? {
            out.push(("box", creature_line(&creature)));
        }
    }
    if fields.box_names {
        for summary in session.boxes() {
            out.push(("box_name", format!("{}:{}", summary.index, summary.name)));
        }
    }
    if fields.blocks {
        out.push(("layout", snapshot.layout.to_string()));
        for region in session.probe_blocks() {
            out.push(("block", region_line(&region)));
        }
    }

    Ok(out)
}

pub fn render_text(session: &Session) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = write_summary(&mut out, session);
    out
}

pub fn creature_to_json(creature: &CreatureSummary) -> JsonValue {
    let mut out = JsonMap::new();
    out.insert("slot".to_string(), JsonValue::String(creature.slot.clone()));
    out.insert("species".to_string(), JsonValue::from(creature.species));
    out.insert(
        "species_name".to_string(),
        JsonValue::String(creature.species_name.clone()),
    );
    out.insert("form".to_string(), JsonValue::from(creature.form));
    out.insert(
        "form_name".to_string(),
        match &creature.form_name {
            Some(name) => JsonValue::String(name.clone()),
            None => JsonValue::Null,
        },
    );
    out.insert(
        "nickname".to_string(),
        JsonValue::String(creature.nickname.clone()),
    );
    out.insert("level".to_string(), JsonValue::from(creature.level));
    out.insert("nature".to_string(), JsonValue::String(creature.nature.clone()));
    out.insert(
        "mint_nature".to_string(),
        match &creature.mint_nature {
            Some(name) => JsonValue::String(name.clone()),
            None => JsonValue::Null,
        },
    );
    out.insert(
        "gender".to_string(),
        JsonValue::String(creature.gender.to_string()),
    );
    out.insert("shiny".to_string(), JsonValue::Bool(creature.shiny));
    out.insert("egg".to_string(), JsonValue::Bool(creature.egg));
    out.insert(
        "held_item".to_string(),
        JsonValue::String(creature.held_item.clone()),
    );
    out.insert(
        "ability".to_string(),
        JsonValue::String(creature.ability.clone()),
    );
    out.insert("ot_name".to_string(), JsonValue::String(creature.ot_name.clone()));
    out.insert("tid".to_string(), JsonValue::from(creature.tid));
    out.insert("sid".to_string(), JsonValue::from(creature.sid));
    out.insert("exp".to_string(), JsonValue::from(creature.exp));
    out.insert("friendship".to_string(), JsonValue::from(creature.friendship));
    out.insert("ball".to_string(), JsonValue::String(creature.ball.clone()));
    out.insert(
        "met_location".to_string(),
        JsonValue::String(creature.met_location.clone()),
    );
    out.insert("met_level".to_string(), JsonValue::from(creature.met_level));
    out.insert(
        "language".to_string(),
        JsonValue::String(creature.language.clone()),
    );
    out.insert(
        "moves".to_string(),
        JsonValue::Array(
            creature
                .moves
                .iter()
                .map(|m| {
                    let mut entry = JsonMap::new();
                    entry.insert("id".to_string(), JsonValue::from(m.id));
                    entry.insert("name".to_string(), JsonValue::String(m.name.clone()));
                    entry.insert("pp".to_string(), JsonValue::from(m.pp));
                    entry.insert("pp_ups".to_string(), JsonValue::from(m.pp_ups));
                    JsonValue::Object(entry)
                })
                .collect(),
        ),
    );
    out.insert("ivs".to_string(), stat_block_to_json(&creature.ivs.map(u16::from)));
    out.insert("evs".to_string(), stat_block_to_json(&creature.evs.map(u16::from)));
    out.insert(
        "stats".to_string(),
        match &creature.stats {
            Some(stats) => stat_block_to_json(stats),
            None => JsonValue::Null,
        },
    );
    out.insert(
        "current_hp".to_string(),
        match creature.current_hp {
            Some(hp) => JsonValue::from(hp),
            None => JsonValue::Null,
        },
    );
    out.insert(
        "checksum_valid".to_string(),
        JsonValue::Bool(creature.checksum_valid),
    );
    out.insert(
        "warnings".to_string(),
        JsonValue::Array(
            creature
                .warnings
                .iter()
                .map(|w| JsonValue::String(w.as_str().to_string()))
                .collect(),
        ),
    );
    JsonValue::Object(out)
}

fn check_box_index(box_index: usize) -> Result<(), CoreError> {
    if box_index < BOX_COUNT {
        return Ok(());
    }
    Err(CoreError::new(
        CoreErrorCode::InvalidInput,
        format!("box {} out of range (1-{BOX_COUNT})", box_index + 1),
    ))
}

fn selected_json(
    fields: &FieldSelection,
    session: &Session,
) -> Result<JsonMap<String, JsonValue>, CoreError> {
    let snapshot = session.snapshot();
    let mut out = JsonMap::new();

    if fields.trainer_name {
        out.insert(
            "trainer_name".to_string(),
            JsonValue::String(snapshot.trainer_name.clone()),
        );
    }
    if fields.tid {
        out.insert("tid".to_string(), JsonValue::from(snapshot.tid));
    }
    if fields.sid {
        out.insert("sid".to_string(), JsonValue::from(snapshot.sid));
    }
    if fields.money {
        out.insert("money".to_string(), JsonValue::from(snapshot.money));
    }
    if fields.gender {
        out.insert(
            "gender".to_string(),
            JsonValue::String(snapshot.gender.to_string()),
        );
    }
    if fields.playtime {
        out.insert(
            "playtime".to_string(),
            JsonValue::String(snapshot.playtime.to_string()),
        );
    }
    if fields.party {
        out.insert("party".to_string(), party_to_json(session));
    }
    if let Some(box_index) = fields.box_index {
        check_box_index(box_index)?;
        let contents = session.box_contents(box_index)?;
        out.insert(
            "box".to_string(),
            JsonValue::Array(contents.iter().map(creature_to_json).collect()),
        );
    }
    if fields.box_names {
        out.insert("box_names".to_string(), box_names_to_json(session));
    }
    if fields.blocks {
        out.insert("blocks".to_string(), blocks_to_json(session));
    }

    Ok(out)
}

fn default_json(session: &Session) -> JsonMap<String, JsonValue> {
    let snapshot = session.snapshot();
    let mut out = JsonMap::new();

    out.insert(
        "trainer_name".to_string(),
        JsonValue::String(snapshot.trainer_name.clone()),
    );
    out.insert("tid".to_string(), JsonValue::from(snapshot.tid));
    out.insert("sid".to_string(), JsonValue::from(snapshot.sid));
    out.insert("money".to_string(), JsonValue::from(snapshot.money));
    out.insert(
        "gender".to_string(),
        JsonValue::String(snapshot.gender.to_string()),
    );
    out.insert(
        "playtime".to_string(),
        JsonValue::String(snapshot.playtime.to_string()),
    );
    out.insert(
        "party_count".to_string(),
        JsonValue::from(snapshot.party_count),
    );
    out.insert(
        "current_box".to_string(),
        JsonValue::from(snapshot.current_box),
    );
    out.insert("blocks".to_string(), blocks_to_json(session));
    out.insert("party".to_string(), party_to_json(session));
    out.insert("boxes".to_string(), box_names_to_json(session));

    out
}

fn party_to_json(session: &Session) -> JsonValue {
    JsonValue::Array(session.party().iter().map(creature_to_json).collect())
}

fn box_names_to_json(session: &Session) -> JsonValue {
    JsonValue::Array(
        session
            .boxes()
            .into_iter()
            .map(|summary| {
                let mut entry = JsonMap::new();
                entry.insert("index".to_string(), JsonValue::from(summary.index));
                entry.insert("name".to_string(), JsonValue::String(summary.name));
                entry.insert("occupied".to_string(), JsonValue::from(summary.occupied));
                JsonValue::Object(entry)
            })
            .collect(),
    )
}

fn blocks_to_json(session: &Session) -> JsonValue {
    let layout = session.block_layout();
    let mut out = JsonMap::new();
    out.insert(
        "active".to_string(),
        JsonValue::String(layout.active.as_str().to_string()),
    );
    out.insert("general".to_string(), region_to_json(&layout.general));
    out.insert("storage".to_string(), region_to_json(&layout.storage));
    out.insert(
        "probes".to_string(),
        JsonValue::Array(session.probe_blocks().iter().map(region_to_json).collect()),
    );
    out.insert(
        "issues".to_string(),
        JsonValue::Array(
            session
                .capabilities()
                .issues
                .iter()
                .map(|issue| JsonValue::String(format!("{issue:?}")))
                .collect(),
        ),
    );
    JsonValue::Object(out)
}

fn region_to_json(region: &BlockRegion) -> JsonValue {
    let mut out = JsonMap::new();
    out.insert(
        "family".to_string(),
        JsonValue::String(region.family.as_str().to_string()),
    );
    out.insert(
        "side".to_string(),
        JsonValue::String(region.side.as_str().to_string()),
    );
    out.insert("base".to_string(), JsonValue::from(region.base()));
    out.insert("size".to_string(), JsonValue::from(region.size()));
    out.insert("save_count".to_string(), JsonValue::from(region.save_count));
    out.insert("detected".to_string(), JsonValue::Bool(region.detected));
    JsonValue::Object(out)
}

fn stat_block_to_json(values: &[u16; 6]) -> JsonValue {
    let mut out = JsonMap::new();
    for stat in Stat::ALL {
        out.insert(
            stat_key(stat).to_string(),
            JsonValue::from(values[stat.index()]),
        );
    }
    JsonValue::Object(out)
}

fn stat_key(stat: Stat) -> &'static str {
    match stat {
        Stat::Hp => "hp",
        Stat::Attack => "atk",
        Stat::Defense => "def",
        Stat::Speed => "spe",
        Stat::SpAttack => "spa",
        Stat::SpDefense => "spd",
    }
}

fn creature_line(creature: &CreatureSummary) -> String {
    let mut line = format!(
        "{} {} Lv.{}",
        creature.slot, creature.species_name, creature.level
    );
    if !creature.nickname.is_empty() && creature.nickname != creature.species_name {
        let _ = write!(line, " \"{}\"", creature.nickname);
    }
    if creature.shiny {
        line.push_str(" *");
    }
    line
}

fn region_line(region: &BlockRegion) -> String {
    format!(
        "{}:{} base=0x{:05X} size=0x{:X} count={} valid={}",
        region.family,
        region.side,
        region.base(),
        region.size(),
        region.save_count,
        region.detected
    )
}

fn join_stats(values: &[u16; 6]) -> String {
    values
        .iter()
        .map(u16::to_string)
        .collect::<Vec<_>>()
        .join("/")
}

fn write_summary(out: &mut String, session: &Session) -> fmt::Result {
    let snapshot = session.snapshot();

    writeln!(out, "Trainer:  {}", snapshot.trainer_name)?;
    writeln!(out, "TID/SID:  {:05} / {:05}", snapshot.tid, snapshot.sid)?;
    writeln!(out, "Gender:   {}", snapshot.gender)?;
    writeln!(out, "Money:    {}", snapshot.money)?;
    writeln!(out, "Playtime: {}", snapshot.playtime)?;
    writeln!(out, "Blocks:   {}", snapshot.layout)?;
    for issue in &session.capabilities().issues {
        writeln!(out, "  warning: {issue:?}")?;
    }
    writeln!(out)?;

    let party = session.party();
    writeln!(out, "Party ({}):", party.len())?;
    for creature in &party {
        write_creature(out, creature)?;
    }
    Ok(())
}

fn write_creature(out: &mut String, creature: &CreatureSummary) -> fmt::Result {
    let shiny = if creature.shiny { " *" } else { "" };
    writeln!(
        out,
        "  {:<9}{:<width$}{:<nick$}Lv.{:<4}{:<9}{}{}",
        creature.slot,
        creature.species_name,
        creature.nickname,
        creature.level,
        creature.nature,
        creature.gender,
        shiny,
        width = NAME_COL_WIDTH,
        nick = NICK_COL_WIDTH,
    )?;

    if let Some(mint) = &creature.mint_nature {
        writeln!(out, "           Mint:  {mint}")?;
    }
    writeln!(
        out,
        "           Item:  {}   Ability: {}",
        creature.held_item, creature.ability
    )?;
    let moves: Vec<&str> = creature.moves.iter().map(|m| m.name.as_str()).collect();
    writeln!(out, "           Moves: {}", moves.join(", "))?;
    writeln!(
        out,
        "           IVs:   {}   EVs: {}",
        join_stats(&creature.ivs.map(u16::from)),
        join_stats(&creature.evs.map(u16::from))
    )?;
    if let Some(stats) = &creature.stats {
        writeln!(out, "           Stats: {}", join_stats(stats))?;
    }
    if !creature.warnings.is_empty() {
        let warnings: Vec<&str> = creature.warnings.iter().map(|w| w.as_str()).collect();
        writeln!(out, "           Warnings: {}", warnings.join(", "))?;
    }
    Ok(())
}
