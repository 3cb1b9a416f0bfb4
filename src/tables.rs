//! The four flat input tables.
//!
//! Only the columns the solver needs are read; everything else in the files
//! (titles, character ids, icon names) is ignored. A missing required column
//! or a value that does not parse is fatal.

use std::path::Path;

use tracing::debug;

use crate::config::InputPaths;
use crate::error::{Result, SolveError};

pub type CardId = u32;
pub type TraitId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CardRow {
    pub id: CardId,
    pub rarity: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraitRow {
    pub id: TraitId,
    /// Owning category, 1..=5.
    pub color: u32,
    /// Tier marker; only one tier takes part in the puzzle.
    pub tier: u8,
    pub title: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CardTraitRow {
    pub card_id: CardId,
    pub trait_id: TraitId,
}

/// Raw contents of the four input tables.
#[derive(Debug, Clone, Default)]
pub struct Tables {
    pub cards: Vec<CardRow>,
    pub traits: Vec<TraitRow>,
    pub base_mapping: Vec<CardTraitRow>,
    pub grow_mapping: Vec<CardTraitRow>,
}

impl Tables {
    pub fn load(paths: &InputPaths) -> Result<Self> {
        let tables = Self {
            cards: read_cards(&paths.cards)?,
            traits: read_traits(&paths.traits)?,
            base_mapping: read_mapping(&paths.base_mapping, "base mapping")?,
            grow_mapping: read_mapping(&paths.grow_mapping, "grow mapping")?,
        };
        debug!(
            cards = tables.cards.len(),
            traits = tables.traits.len(),
            base = tables.base_mapping.len(),
            grow = tables.grow_mapping.len(),
            "tables loaded"
        );
        Ok(tables)
    }

    /// Base and grow mappings, in that order.
    pub fn mappings(&self) -> impl Iterator<Item = &CardTraitRow> {
        self.base_mapping.iter().chain(self.grow_mapping.iter())
    }
}

struct Sheet {
    table: &'static str,
    headers: csv::StringRecord,
    rows: Vec<csv::StringRecord>,
}

impl Sheet {
    fn open(path: &Path, table: &'static str) -> Result<Self> {
        let file = std::fs::File::open(path).map_err(SolveError::io(path))?;
        Self::from_reader(file, table)
    }

    fn from_reader<R: std::io::Read>(reader: R, table: &'static str) -> Result<Self> {
        let csv_err = |source| SolveError::Csv { table, source };
        let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let headers = reader.headers().map_err(csv_err)?.clone();
        let rows = reader
            .records()
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(csv_err)?;
        Ok(Self {
            table,
            headers,
            rows,
        })
    }

    fn column(&self, column: &'static str) -> Result<usize> {
        self.headers
            .iter()
            .position(|h| h == column)
            .ok_or(SolveError::MissingColumn {
                table: self.table,
                column,
            })
    }

    fn optional_column(&self, column: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == column)
    }

    fn parse<T: std::str::FromStr>(
        &self,
        row: usize,
        col: usize,
        column: &'static str,
    ) -> Result<T> {
        let value = self.rows[row].get(col).unwrap_or("");
        value.parse().map_err(|_| SolveError::InvalidValue {
            table: self.table,
            // 1-based, counting the header line.
            row: row + 2,
            column,
            value: value.to_string(),
        })
    }
}

fn read_cards(path: &Path) -> Result<Vec<CardRow>> {
    cards_from_sheet(&Sheet::open(path, "card table")?)
}

fn read_traits(path: &Path) -> Result<Vec<TraitRow>> {
    traits_from_sheet(&Sheet::open(path, "trait table")?)
}

fn read_mapping(path: &Path, table: &'static str) -> Result<Vec<CardTraitRow>> {
    mapping_from_sheet(&Sheet::open(path, table)?)
}

fn cards_from_sheet(sheet: &Sheet) -> Result<Vec<CardRow>> {
    let id = sheet.column("id")?;
    let rarity = sheet.column("rarity")?;
    (0..sheet.rows.len())
        .map(|r| {
            Ok(CardRow {
                id: sheet.parse(r, id, "id")?,
                rarity: sheet.parse(r, rarity, "rarity")?,
            })
        })
        .collect()
}

fn traits_from_sheet(sheet: &Sheet) -> Result<Vec<TraitRow>> {
    let id = sheet.column("id")?;
    let color = sheet.column("color")?;
    let tier = sheet.column("rarity")?;
    let title = sheet.optional_column("title");
    (0..sheet.rows.len())
        .map(|r| {
            Ok(TraitRow {
                id: sheet.parse(r, id, "id")?,
                color: sheet.parse(r, color, "color")?,
                tier: sheet.parse(r, tier, "rarity")?,
                title: title
                    .and_then(|c| sheet.rows[r].get(c))
                    .map(str::to_string),
            })
        })
        .collect()
}

fn mapping_from_sheet(sheet: &Sheet) -> Result<Vec<CardTraitRow>> {
    let card = sheet.column("card_id")?;
    let tr = sheet.column("characteristic_id")?;
    (0..sheet.rows.len())
        .map(|r| {
            Ok(CardTraitRow {
                card_id: sheet.parse(r, card, "card_id")?,
                trait_id: sheet.parse(r, tr, "characteristic_id")?,
            })
        })
        .collect()
}
