mod common;

use std::collections::BTreeSet;

use common::{card, config, cross_cards, t};
use proptest::prelude::*;
use proptest::sample::Index;
use shoot300k::tables::{CardRow, CardTraitRow, TraitRow};
use shoot300k::{run, DatasetConfig, Solver, SolveError, Tables};

#[test]
fn cross_quad_is_found_once() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path(), &[1, 2], &cross_cards());
    let solver = shoot300k::prepare(&config).unwrap();
    let index = solver.solve();

    assert_eq!(index.len(), 1);
    let record = &index.records[0];
    assert_eq!(record.quad, [2, 3, 4, 5]);
    assert_eq!(record.anchors, vec![1]);
    assert_eq!(record.category_pair.to_string(), "1,2");
    assert_eq!(record.trait_pair.to_string(), "101,201");
}

#[test]
fn every_anchor_candidate_is_kept() {
    let dir = tempfile::tempdir().unwrap();
    let mut cards = cross_cards();
    cards.push(card(6, &[(1, &[0]), (2, &[0])]));
    let solver = shoot300k::prepare(&config(dir.path(), &[1, 2], &cards)).unwrap();
    let index = solver.solve();

    assert_eq!(index.len(), 1);
    assert_eq!(index.records[0].anchors, vec![1, 6]);
    assert_eq!(index.quintet_count(), 2);
}

#[test]
fn interchangeable_cards_expand_into_several_quads() {
    let dir = tempfile::tempdir().unwrap();
    let mut cards = cross_cards();
    // Same codes as card 4.
    cards.push(card(7, &[(1, &[5]), (2, &[1, 2])]));
    let solver = shoot300k::prepare(&config(dir.path(), &[1, 2], &cards)).unwrap();
    let quads: Vec<_> = solver.solve().records.iter().map(|r| r.quad).collect();
    assert_eq!(quads, vec![[2, 3, 4, 5], [2, 3, 5, 7]]);
}

#[test]
fn same_category_pair_is_solved() {
    let dir = tempfile::tempdir().unwrap();
    let cards = vec![
        card(10, &[(1, &[0, 1])]),
        card(11, &[(1, &[2, 3]), (2, &[6])]),
        card(12, &[(1, &[4]), (2, &[0, 1])]),
        card(13, &[(1, &[5]), (2, &[2, 3])]),
        card(14, &[(1, &[6]), (2, &[4, 5])]),
    ];
    let solver = shoot300k::prepare(&config(dir.path(), &[1, 2], &cards)).unwrap();
    let index = solver.solve();

    assert_eq!(index.len(), 1);
    let record = &index.records[0];
    assert_eq!(record.quad, [11, 12, 13, 14]);
    assert_eq!(record.anchors, vec![10]);
    assert_eq!(record.category_pair.to_string(), "1,2");
    assert_eq!(record.trait_pair.to_string(), "101,102");
}

#[test]
fn quintet_reached_from_two_category_pairs_is_emitted_once() {
    let dir = tempfile::tempdir().unwrap();
    // Category 3 mirrors category 2, so (1,3) rediscovers the (1,2) quintet.
    let cards: Vec<_> = cross_cards()
        .into_iter()
        .map(|mut c| {
            let mirrored: Vec<u32> = c
                .base
                .iter()
                .filter(|&&tr| tr / 100 == 2)
                .map(|&tr| tr + 100)
                .collect();
            c.base.extend(mirrored);
            c
        })
        .collect();
    let solver = shoot300k::prepare(&config(dir.path(), &[1, 2, 3], &cards)).unwrap();
    let index = solver.solve();

    assert_eq!(index.len(), 1);
    assert_eq!(index.records[0].category_pair.to_string(), "1,2");
}

#[test]
fn grow_mapping_contributes_traits() {
    let dir = tempfile::tempdir().unwrap();
    let mut cards = cross_cards();
    let c5 = &mut cards[4];
    c5.base.retain(|&tr| tr / 100 != 2);
    c5.grow = vec![t(2, 3), t(2, 4)];
    let solver = shoot300k::prepare(&config(dir.path(), &[1, 2], &cards)).unwrap();
    assert_eq!(solver.solve().len(), 1);
}

#[test]
fn no_shared_holder_means_no_records() {
    let dir = tempfile::tempdir().unwrap();
    let mut cards = cross_cards();
    // Split the anchor across two cards.
    cards[0] = card(1, &[(1, &[0])]);
    cards.push(card(6, &[(2, &[0])]));
    let solver = shoot300k::prepare(&config(dir.path(), &[1, 2], &cards)).unwrap();
    assert!(solver.solve().is_empty());
}

#[test]
fn excluded_and_ineligible_cards_drop_out() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config(dir.path(), &[1, 2], &cross_cards());
    config.dataset.excluded_cards = vec![3];
    assert!(shoot300k::prepare(&config).unwrap().solve().is_empty());

    config.dataset.excluded_cards.clear();
    config.dataset.eligible_rarities = vec![4];
    assert!(shoot300k::prepare(&config).unwrap().solve().is_empty());

    config.dataset.rarity_overrides = (1..=5)
        .map(|card| shoot300k::config::RarityOverride { card, rarity: 4 })
        .collect();
    assert_eq!(shoot300k::prepare(&config).unwrap().solve().len(), 1);
}

#[test]
fn thread_count_does_not_change_output() {
    let dir = tempfile::tempdir().unwrap();
    let mut cards = cross_cards();
    cards.push(card(6, &[(1, &[0]), (2, &[0])]));
    cards.push(card(7, &[(1, &[5]), (2, &[1, 2])]));
    let mut config = config(dir.path(), &[1, 2], &cards);

    config.threads = Some(1);
    run(&config, |_| {}).unwrap();
    let single = std::fs::read(config.output.dir.join("full_solution.json")).unwrap();

    config.threads = Some(4);
    run(&config, |_| {}).unwrap();
    let many = std::fs::read(config.output.dir.join("full_solution.json")).unwrap();
    assert_eq!(single, many);
}

#[test]
fn progress_reaches_every_context() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path(), &[1, 2], &cross_cards());
    let solver = shoot300k::prepare(&config).unwrap();
    let total = solver.contexts().len();
    let last = std::sync::atomic::AtomicUsize::new(0);
    solver.solve_with_progress(|p| {
        assert_eq!(p.total, total);
        last.fetch_max(p.done, std::sync::atomic::Ordering::Relaxed);
    });
    assert_eq!(last.into_inner(), total);
}

#[test]
fn missing_column_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path(), &[1, 2], &cross_cards());
    std::fs::write(&config.inputs.cards, "id,stars\n1,3\n").unwrap();
    match shoot300k::prepare(&config) {
        Err(SolveError::MissingColumn { column, .. }) => assert_eq!(column, "rarity"),
        other => panic!("expected a missing column, got {other:?}"),
    }
}

#[test]
fn trait_with_bad_color_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path(), &[1, 2], &cross_cards());
    let mut traits = std::fs::read_to_string(&config.inputs.traits).unwrap();
    traits.push_str("900,6,3,stray\n");
    std::fs::write(&config.inputs.traits, traits).unwrap();
    let tables = Tables::load(&config.inputs).unwrap();
    assert!(matches!(
        Solver::build(&tables, &config.dataset),
        Err(SolveError::InvalidCategory { trait_id: 900, category: 6 })
    ));
}

/// Trait masks of one card in categories 1, 2 and 3.
type Masks = [u8; 3];

const PAIRS: [(usize, usize); 3] = [(0, 1), (0, 2), (1, 2)];

fn bits(positions: &[u8]) -> u8 {
    positions.iter().fold(0, |m, &b| m | 1 << b)
}

fn tables_for(pool: &[Masks]) -> Tables {
    let traits = (1..=3u32)
        .flat_map(|c| {
            (0..7).map(move |b| TraitRow {
                id: t(c, b),
                color: c,
                tier: 3,
                title: None,
            })
        })
        .collect();
    let mut base_mapping = Vec::new();
    for (i, masks) in pool.iter().enumerate() {
        for (c, &mask) in (1..=3u32).zip(masks.iter()) {
            for b in (0..7u32).filter(|b| mask & 1 << b != 0) {
                base_mapping.push(CardTraitRow {
                    card_id: i as u32 + 1,
                    trait_id: t(c, b),
                });
            }
        }
    }
    Tables {
        cards: (1..=pool.len() as u32).map(|id| CardRow { id, rarity: 3 }).collect(),
        traits,
        base_mapping,
        grow_mapping: Vec::new(),
    }
}

/// Whether `quad` covers both categories of `(a, b)` exactly once apart from
/// the traits `anchor` holds, with three traits per card.
fn completes(quad: &[Masks], anchor: &Masks, (a, b): (usize, usize)) -> bool {
    let (mut first, mut second) = (0u8, 0u8);
    for card in quad {
        let (x, y) = (card[a], card[b]);
        let (nx, ny) = (x.count_ones(), y.count_ones());
        if nx == 0 || ny == 0 || nx + ny != 3 || first & x != 0 || second & y != 0 {
            return false;
        }
        first |= x;
        second |= y;
    }
    let (rest_a, rest_b) = (0x7f ^ first, 0x7f ^ second);
    matches!(
        (rest_a.count_ones(), rest_b.count_ones()),
        (1, 1) | (2, 0) | (0, 2)
    ) && anchor[a] & rest_a == rest_a
        && anchor[b] & rest_b == rest_b
}

/// Every five-card set that solves some puzzle, by exhaustive search.
fn brute_force(pool: &[Masks]) -> BTreeSet<[u32; 5]> {
    let n = pool.len();
    let mut out = BTreeSet::new();
    for i in 0..n {
        for j in i + 1..n {
            for k in j + 1..n {
                for l in k + 1..n {
                    for m in l + 1..n {
                        let five = [i, j, k, l, m];
                        let solved = (0..5).any(|x| {
                            let quad: Vec<Masks> =
                                five.iter().filter(|&&c| c != five[x]).map(|&c| pool[c]).collect();
                            PAIRS.iter().any(|&p| completes(&quad, &pool[five[x]], p))
                        });
                        if solved {
                            out.insert(five.map(|c| c as u32 + 1));
                        }
                    }
                }
            }
        }
    }
    out
}

fn permutation() -> impl Strategy<Value = Vec<u8>> {
    Just((0u8..7).collect::<Vec<_>>()).prop_shuffle()
}

/// Five cards forming one solution: kind 0 splits the trait pair across the
/// categories, kinds 1 and 2 put it inside the first or second category.
fn planted() -> impl Strategy<Value = Vec<Masks>> {
    (
        0usize..3,
        0usize..3,
        permutation(),
        permutation(),
        prop::array::uniform5(0u8..128),
    )
        .prop_map(|(kind, pair, p, q, third)| {
            let heavy = |p: &[u8], q: &[u8]| {
                vec![
                    (bits(&p[0..2]), 0),
                    (bits(&p[2..4]), bits(&q[6..7])),
                    (bits(&p[4..5]), bits(&q[0..2])),
                    (bits(&p[5..6]), bits(&q[2..4])),
                    (bits(&p[6..7]), bits(&q[4..6])),
                ]
            };
            let cards: Vec<(u8, u8)> = match kind {
                0 => vec![
                    (bits(&p[0..1]), bits(&q[0..1])),
                    (bits(&p[1..3]), bits(&q[5..6])),
                    (bits(&p[3..5]), bits(&q[6..7])),
                    (bits(&p[5..6]), bits(&q[1..3])),
                    (bits(&p[6..7]), bits(&q[3..5])),
                ],
                1 => heavy(&p, &q),
                _ => heavy(&p, &q).into_iter().map(|(x, y)| (y, x)).collect(),
            };
            let (a, b) = PAIRS[pair];
            cards
                .into_iter()
                .zip(third)
                .map(|((x, y), z)| {
                    let mut masks = [z; 3];
                    masks[a] = x;
                    masks[b] = y;
                    masks
                })
                .collect()
        })
}

fn sparse_mask() -> impl Strategy<Value = u8> {
    prop::collection::btree_set(0u8..7, 0..=2).prop_map(|s| bits(&s.into_iter().collect::<Vec<_>>()))
}

/// Planted solutions, sparse noise cards, and copies of random cards so that
/// some codes are held by several cards.
fn pool() -> impl Strategy<Value = Vec<Masks>> {
    (
        prop::collection::vec(planted(), 1..=3),
        prop::collection::vec(prop::array::uniform3(sparse_mask()), 0..=4),
        prop::collection::vec(any::<Index>(), 0..=3),
    )
        .prop_map(|(planted, noise, copies)| {
            let mut pool: Vec<Masks> = planted.into_iter().flatten().chain(noise).collect();
            for copy in copies {
                let masks = pool[copy.index(pool.len())];
                pool.push(masks);
            }
            pool
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn emitted_quintets_are_exactly_the_solutions(pool in pool()) {
        let solver = Solver::build(&tables_for(&pool), &DatasetConfig::default()).unwrap();
        let index = solver.solve();

        let emitted: Vec<[u32; 5]> = index
            .records
            .iter()
            .flat_map(|r| {
                r.anchors.iter().map(move |&x| {
                    let mut five = [r.quad[0], r.quad[1], r.quad[2], r.quad[3], x];
                    five.sort_unstable();
                    five
                })
            })
            .collect();
        let distinct: BTreeSet<[u32; 5]> = emitted.iter().copied().collect();
        prop_assert_eq!(distinct.len(), emitted.len(), "a quintet was emitted twice");
        prop_assert!(!distinct.is_empty());
        prop_assert_eq!(distinct, brute_force(&pool));
    }
}
