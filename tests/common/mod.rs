#![allow(dead_code)]

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use shoot300k::{DatasetConfig, InputPaths, OutputConfig, SolveConfig};

/// A card: id, traits from the base mapping, traits from the grow mapping.
pub struct Card {
    pub id: u32,
    pub base: Vec<u32>,
    pub grow: Vec<u32>,
}

/// Trait id of bit `bit` in `category`: `category * 100 + 1 + bit`.
pub fn t(category: u32, bit: u32) -> u32 {
    category * 100 + 1 + bit
}

/// A card granted `bits` in each listed category.
pub fn card(id: u32, bits: &[(u32, &[u32])]) -> Card {
    Card {
        id,
        base: bits
            .iter()
            .flat_map(|&(cat, bs)| bs.iter().map(move |&b| t(cat, b)))
            .collect(),
        grow: Vec::new(),
    }
}

/// Cross-context set over categories 1 and 2: card 1 anchors traits
/// 101/201 and cards 2..=5 cover everything else exactly once.
pub fn cross_cards() -> Vec<Card> {
    vec![
        card(1, &[(1, &[0]), (2, &[0])]),
        card(2, &[(1, &[1, 2]), (2, &[5])]),
        card(3, &[(1, &[3, 4]), (2, &[6])]),
        card(4, &[(1, &[5]), (2, &[1, 2])]),
        card(5, &[(1, &[6]), (2, &[3, 4])]),
    ]
}

/// Writes the four tables with seven tier-3 traits in each of `categories`.
pub fn write_dataset(dir: &Path, categories: &[u32], cards: &[Card]) -> InputPaths {
    let mut traits = String::from("id,color,rarity,title\n");
    for &cat in categories {
        for bit in 0..7 {
            let _ = writeln!(traits, "{},{cat},3,trait {cat}-{bit}", t(cat, bit));
        }
    }
    // A non-qualifying trait that must never take a bit.
    let _ = writeln!(traits, "999,1,2,bronze");

    let mut card_table = String::from("id,rarity,name\n");
    let mut base = String::from("card_id,characteristic_id\n");
    let mut grow = String::from("card_id,characteristic_id\n");
    for c in cards {
        let _ = writeln!(card_table, "{},3,card {}", c.id, c.id);
        for tr in &c.base {
            let _ = writeln!(base, "{},{tr}", c.id);
        }
        for tr in &c.grow {
            let _ = writeln!(grow, "{},{tr}", c.id);
        }
        let _ = writeln!(base, "{},999", c.id);
    }

    let paths = InputPaths {
        cards: dir.join("character_card.csv"),
        traits: dir.join("characteristics_normal.csv"),
        base_mapping: dir.join("card_give_characteristic.csv"),
        grow_mapping: dir.join("card_give_characteristic_grow_list.csv"),
    };
    fs::write(&paths.cards, card_table).unwrap();
    fs::write(&paths.traits, traits).unwrap();
    fs::write(&paths.base_mapping, base).unwrap();
    fs::write(&paths.grow_mapping, grow).unwrap();
    paths
}

pub fn config(dir: &Path, categories: &[u32], cards: &[Card]) -> SolveConfig {
    let inputs = write_dataset(dir, categories, cards);
    SolveConfig {
        inputs,
        dataset: DatasetConfig::default(),
        output: OutputConfig::new(dir.join("out")),
        threads: None,
    }
}
