use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::game_data::{BaseStats, GameData, GrowthRate};
use crate::text::CharTable;

use super::error::{CoreError, CoreErrorCode};

const DEFAULT_GENDER_RATIO: u8 = 127;
const GENDERLESS_RATIO: u8 = 255;

/// Lookup tables read from a data directory.
///
/// Every file is optional. A missing `charmap.txt` leaves the built-in
/// basic-Latin table in place; missing name lists fall back to numbered
/// placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameTables {
    data_dir: Option<PathBuf>,
    chars: CharTable,
    species_names: Vec<String>,
    move_names: Vec<String>,
    item_names: Vec<String>,
    ability_names: Vec<String>,
    ball_names: Vec<String>,
    locations: BTreeMap<u16, String>,
    forms: BTreeMap<(u16, u8), String>,
    base_stats: BTreeMap<(u16, u8), BaseStats>,
    growth_rates: BTreeMap<u16, GrowthRate>,
    gender_ratios: BTreeMap<u16, u8>,
}

impl Default for GameTables {
    fn default() -> Self {
        Self {
            data_dir: None,
            chars: CharTable::basic_latin(),
            species_names: Vec::new(),
            move_names: Vec::new(),
            item_names: Vec::new(),
            ability_names: Vec::new(),
            ball_names: Vec::new(),
            locations: BTreeMap::new(),
            forms: BTreeMap::new(),
            base_stats: BTreeMap::new(),
            growth_rates: BTreeMap::new(),
            gender_ratios: BTreeMap::new(),
        }
    }
}

impl GameTables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load_from_dir(dir: &Path) -> Result<Self, CoreError> {
        if !dir.is_dir() {
            return Err(CoreError::new(
                CoreErrorCode::Io,
                format!("data directory {} does not exist", dir.display()),
            ));
        }

        let mut tables = Self {
            data_dir: Some(dir.to_path_buf()),
            ..Self::default()
        };

        if let Some(text) = read_optional(&dir.join("charmap.txt"))? {
            let chars = CharTable::parse(&text);
            if chars.is_empty() {
                tracing::warn!(dir = %dir.display(), "charmap.txt has no usable entries");
            } else {
                tables.chars = chars;
            }
        }
        if let Some(text) = read_optional(&dir.join("species.txt"))? {
            tables.species_names = parse_name_list(&text);
        }
        if let Some(text) = read_optional(&dir.join("moves.txt"))? {
            tables.move_names = parse_name_list(&text);
        }
        if let Some(text) = read_optional(&dir.join("items.txt"))? {
            tables.item_names = parse_name_list(&text);
        }
        if let Some(text) = read_optional(&dir.join("abilities.txt"))? {
            tables.ability_names = parse_name_list(&text);
        }
        if let Some(text) = read_optional(&dir.join("balls.txt"))? {
            tables.ball_names = parse_name_list(&text);
        }
        if let Some(text) = read_optional(&dir.join("locations.txt"))? {
            tables.locations = parse_locations(&text);
        }
        if let Some(text) = read_optional(&dir.join("genderless.txt"))? {
            for species in parse_genderless(&text) {
                tables.gender_ratios.insert(species, GENDERLESS_RATIO);
            }
        }
        if let Some(text) = read_optional(&dir.join("basestats.csv"))? {
            tables.base_stats = parse_base_stats(&text);
        }
        if let Some(text) = read_optional(&dir.join("growth_rates.csv"))? {
            tables.growth_rates = parse_growth_rates(&text);
        }
        if let Some(text) = read_optional(&dir.join("forms.txt"))? {
            tables.forms = parse_forms(&text);
        }

        tracing::debug!(
            dir = %dir.display(),
            chars = tables.chars.len(),
            species = tables.species_names.len(),
            base_stats = tables.base_stats.len(),
            "loaded game tables"
        );
        Ok(tables)
    }

    pub fn with_chars(mut self, chars: CharTable) -> Self {
        self.chars = chars;
        self
    }

    pub fn insert_base_stats(&mut self, species: u16, form: u8, stats: BaseStats) {
        self.base_stats.insert((species, form), stats);
    }

    pub fn set_growth_rate(&mut self, species: u16, rate: GrowthRate) {
        self.growth_rates.insert(species, rate);
    }

    pub fn set_gender_ratio(&mut self, species: u16, ratio: u8) {
        self.gender_ratios.insert(species, ratio);
    }

    pub fn data_dir(&self) -> Option<&Path> {
        self.data_dir.as_deref()
    }

    pub fn chars(&self) -> &CharTable {
        &self.chars
    }

    pub fn species_name(&self, species: u16) -> String {
        lookup_name(&self.species_names, species, "Species")
    }

    /// Species ID for a name, ignoring ASCII case.
    pub fn species_by_name(&self, name: &str) -> Option<u16> {
        let name = name.trim();
        self.species_names
            .iter()
            .position(|candidate| !candidate.is_empty() && candidate.eq_ignore_ascii_case(name))
            .and_then(|idx| u16::try_from(idx).ok())
            .filter(|&id| id != 0)
    }

    pub fn move_name(&self, move_id: u16) -> String {
        lookup_name(&self.move_names, move_id, "Move")
    }

    pub fn item_name(&self, item: u16) -> String {
        lookup_name(&self.item_names, item, "Item")
    }

    pub fn ability_name(&self, ability: u8) -> String {
        lookup_name(&self.ability_names, u16::from(ability), "Ability")
    }

    pub fn ball_name(&self, ball: u8) -> String {
        lookup_name(&self.ball_names, u16::from(ball), "Ball")
    }

    pub fn location_name(&self, location: u16) -> String {
        self.locations
            .get(&location)
            .cloned()
            .unwrap_or_else(|| format!("Location #{location}"))
    }

    pub fn form_name(&self, species: u16, form: u8) -> Option<&str> {
        self.forms.get(&(species, form)).map(String::as_str)
    }
}

impl GameData for GameTables {
    fn base_stats(&self, species: u16, form: u8) -> Option<BaseStats> {
        if species == 0 {
            return None;
        }
        self.base_stats
            .get(&(species, form))
            .or_else(|| self.base_stats.get(&(species, 0)))
            .copied()
    }

    fn growth_rate(&self, species: u16) -> GrowthRate {
        self.growth_rates.get(&species).copied().unwrap_or_default()
    }

    fn gender_ratio(&self, species: u16) -> u8 {
        self.gender_ratios
            .get(&species)
            .copied()
            .unwrap_or(DEFAULT_GENDER_RATIO)
    }
}

pub fn language_name(language: u8) -> String {
    match language {
        1 => "JPN".to_string(),
        2 => "ENG".to_string(),
        3 => "FRE".to_string(),
        4 => "ITA".to_string(),
        5 => "GER".to_string(),
        7 => "SPA".to_string(),
        8 => "KOR".to_string(),
        other => format!("Lang{other}"),
    }
}

fn lookup_name(names: &[String], id: u16, kind: &str) -> String {
    if id == 0 {
        return "None".to_string();
    }
    match names.get(usize::from(id)) {
        Some(name) if !name.is_empty() => name.clone(),
        _ => format!("{kind} #{id}"),
    }
}

fn read_optional(path: &Path) -> Result<Option<String>, CoreError> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(String::from_utf8_lossy(&bytes).into_owned())),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(CoreError::new(
            CoreErrorCode::Io,
            format!("failed to read {}: {e}", path.display()),
        )),
    }
}

/// One name per line; the line number is the ID.
fn parse_name_list(text: &str) -> Vec<String> {
    text.lines().map(str::to_string).collect()
}

fn parse_locations(text: &str) -> BTreeMap<u16, String> {
    text.lines()
        .filter_map(|line| {
            let (id, name) = line.split_once('\t')?;
            let id = id.trim().parse().ok()?;
            Some((id, name.to_string()))
        })
        .collect()
}

fn parse_genderless(text: &str) -> Vec<u16> {
    text.lines()
        .filter_map(|line| line.trim().parse::<u16>().ok())
        .filter(|&id| id > 0)
        .collect()
}

fn parse_growth_rates(text: &str) -> BTreeMap<u16, GrowthRate> {
    text.lines()
        .filter_map(|line| {
            let (id, name) = line.split_once(',')?;
            let id: u16 = id.trim().parse().ok()?;
            (id > 0).then(|| (id, GrowthRate::from_name(name)))
        })
        .collect()
}

/// `id,hp,atk,def,spa,spd,spe` or `id,form,hp,atk,def,spa,spd,spe`.
fn parse_base_stats(text: &str) -> BTreeMap<(u16, u8), BaseStats> {
    let mut stats = BTreeMap::new();
    for line in text.lines() {
        let parts: Vec<&str> = line.split(',').map(str::trim).collect();
        if parts.len() < 7 {
            continue;
        }
        let Ok(species) = parts[0].parse::<u16>() else {
            continue;
        };
        if species == 0 {
            continue;
        }

        let (form, values) = match parts.get(1).and_then(|p| p.parse::<u8>().ok()) {
            Some(form) if parts.len() >= 8 => (form, &parts[2..8]),
            _ => (0, &parts[1..7]),
        };
        let parsed: Option<Vec<u8>> = values.iter().map(|v| v.parse().ok()).collect();
        let Some([hp, atk, def, spa, spd, spe]) = parsed.and_then(|v| <[u8; 6]>::try_from(v).ok())
        else {
            continue;
        };

        stats.insert(
            (species, form),
            BaseStats {
                hp,
                atk,
                def,
                spa,
                spd,
                spe,
            },
        );
    }
    stats
}

fn parse_forms(text: &str) -> BTreeMap<(u16, u8), String> {
    text.lines()
        .filter_map(|line| {
            let mut parts = line.splitn(3, '\t');
            let species = parts.next()?.trim().parse().ok()?;
            let form = parts.next()?.trim().parse().ok()?;
            let name = parts.next()?;
            Some(((species, form), name.to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_stats_accept_both_row_shapes() {
        let stats = parse_base_stats(
            "id,hp,atk,def,spa,spd,spe\n25,35,55,30,50,40,90\n479,1,50,65,107,105,107,86\nbad,1,2\n",
        );
        assert_eq!(stats.len(), 2);
        assert_eq!(stats[&(25, 0)].spe, 90);
        assert_eq!(stats[&(479, 1)].hp, 50);
    }

    #[test]
    fn form_lookup_falls_back_to_base_form() {
        let mut tables = GameTables::new();
        tables.insert_base_stats(
            479,
            0,
            BaseStats {
                hp: 50,
                atk: 50,
                def: 77,
                spa: 95,
                spd: 77,
                spe: 91,
            },
        );
        assert_eq!(tables.base_stats(479, 3).map(|s| s.def), Some(77));
        assert_eq!(tables.base_stats(0, 0), None);
        assert_eq!(tables.base_stats(480, 0), None);
    }

    #[test]
    fn defaults_for_unknown_species() {
        let tables = GameTables::new();
        assert_eq!(tables.gender_ratio(25), 127);
        assert_eq!(tables.growth_rate(25), GrowthRate::MediumFast);
        assert_eq!(tables.species_name(0), "None");
        assert_eq!(tables.species_name(25), "Species #25");
        assert_eq!(tables.location_name(126), "Location #126");
        assert_eq!(language_name(6), "Lang6");
    }

    #[test]
    fn line_oriented_tables_parse() {
        assert_eq!(parse_genderless("81\n 100 \n0\nx\n"), vec![81, 100]);

        let rates = parse_growth_rates("1,Medium Slow\r\n0,Fast\n4,Erratic\n");
        assert_eq!(rates.get(&1), Some(&GrowthRate::MediumSlow));
        assert_eq!(rates.get(&4), Some(&GrowthRate::Erratic));
        assert!(!rates.contains_key(&0));

        let locations = parse_locations("126\tNew Bark Town\nno tab here\n");
        assert_eq!(locations.get(&126).map(String::as_str), Some("New Bark Town"));

        let forms = parse_forms("479\t1\tHeat\n479\tx\tWash\n");
        assert_eq!(forms.get(&(479, 1)).map(String::as_str), Some("Heat"));
        assert_eq!(forms.len(), 1);
    }

    #[test]
    fn species_lookup_by_name() {
        let mut tables = GameTables::new();
        tables.species_names = parse_name_list("-----\nBulbasaur\n\nVenusaur\n");
        assert_eq!(tables.species_by_name("venusaur"), Some(3));
        assert_eq!(tables.species_by_name("-----"), None);
        assert_eq!(tables.species_by_name("Mew"), None);
        assert_eq!(tables.species_name(1), "Bulbasaur");
        assert_eq!(tables.species_name(2), "Species #2");
    }
}
