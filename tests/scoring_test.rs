use mahjong_core::game::config::RegionalConfig;
use mahjong_core::game::pattern::{Pattern, PatternDef, PatternMatch};
use mahjong_core::{
    evaluate_win, Decomposer, Disqualification, EngineConfig, Hand, Meld, NationalRules, Player, RegionalRules,
    RuleVariant, ScoreResult, Settlement, Suit, Tile, WinContext, WinRecord,
};
use proptest::prelude::*;

fn player(seat: u8, s: &str, melds: Vec<Meld>) -> Player {
    Player::with_tiles(seat, Hand::parse(s).unwrap(), melds)
}

fn record(winner: u8, discarder: Option<u8>, total: u32) -> WinRecord {
    WinRecord {
        winner,
        discarder,
        tile: Tile::Wan(1),
        score: ScoreResult {
            total,
            ..ScoreResult::default()
        },
        turn: 1,
    }
}

/// 血战：清一色七对自摸只计七对 2 番，每家付 2 × 2^2
#[test]
fn test_regional_seven_pairs_self_draw() {
    let rules = RegionalRules::default();
    let p = player(0, "11223344556677m", vec![]);
    let ctx = WinContext::self_draw(0, Tile::Wan(7)).with_missing_suit(Some(Suit::Tong));
    let evaluation = evaluate_win(&rules, &mut Decomposer::new(), &p, &ctx).unwrap();
    assert!(evaluation.score.has_pattern(Pattern::SevenPairs));
    assert!(!evaluation.score.has_pattern(Pattern::FullFlush));
    assert_eq!(evaluation.score.total, 2);

    let win = WinRecord {
        winner: 0,
        discarder: None,
        tile: Tile::Wan(7),
        score: evaluation.score,
        turn: 9,
    };
    let result = rules.settle(&win, &[1, 2, 3]);
    assert_eq!(result.payments[&0], 24);
    for seat in 1..4 {
        assert_eq!(result.payments[&seat], -8);
    }
    assert_eq!(result.net(), 0);
}

#[test]
fn test_regional_missing_suit_blocks_win() {
    let rules = RegionalRules::default();
    let p = player(0, "123m456m789m123p55s", vec![]);
    let ctx = WinContext::discard(0, Tile::Tiao(5)).with_missing_suit(Some(Suit::Tiao));
    assert_eq!(
        evaluate_win(&rules, &mut Decomposer::new(), &p, &ctx).unwrap_err(),
        Disqualification::MissingSuitHeld(Suit::Tiao)
    );
    assert_eq!(
        evaluate_win(&rules, &mut Decomposer::new(), &p, &WinContext::discard(0, Tile::Tiao(5))).unwrap_err(),
        Disqualification::MissingSuitUndeclared
    );
}

#[test]
fn test_regional_cap() {
    let rules = RegionalRules::default();
    let matched = [
        PatternMatch { pattern: Pattern::SevenPairs, points: 2, count: 1 },
        PatternMatch { pattern: Pattern::BigThreeDragons, points: 8, count: 1 },
    ];
    assert_eq!(rules.total_for(&matched), 8);

    let uncapped = RegionalRules::new(RegionalConfig { max_fan: None, ..RegionalConfig::default() });
    assert_eq!(uncapped.total_for(&matched), 10);
}

/// 国标：大三元点和 96 番，放铳者全付
#[test]
fn test_national_discard_win() {
    let rules = NationalRules::default();
    let p = player(1, "555666777z234m99m", vec![]);
    let ctx = WinContext::discard(1, Tile::Wan(9));
    let evaluation = evaluate_win(&rules, &mut Decomposer::new(), &p, &ctx).unwrap();
    assert_eq!(evaluation.score.total, 96);

    let win = WinRecord {
        winner: 1,
        discarder: Some(0),
        tile: Tile::Wan(9),
        score: evaluation.score,
        turn: 3,
    };
    let result = rules.settle(&win, &[0, 2, 3]);
    assert_eq!(result.payments[&0], -96);
    assert_eq!(result.payments[&1], 96);
    assert!(!result.payments.contains_key(&2));
}

#[test]
fn test_national_below_floor_is_not_a_win() {
    let rules = NationalRules::default();
    let p = player(0, "234m456m678p345s88s", vec![]);
    let err = evaluate_win(&rules, &mut Decomposer::new(), &p, &WinContext::discard(0, Tile::Tiao(8))).unwrap_err();
    assert_eq!(err, Disqualification::BelowMinimumPoints { points: 6, floor: 8 });

    // 自摸得自摸 1 番但不再计门前清
    let err = evaluate_win(&rules, &mut Decomposer::new(), &p, &WinContext::self_draw(0, Tile::Tiao(8))).unwrap_err();
    assert_eq!(err, Disqualification::BelowMinimumPoints { points: 5, floor: 8 });
}

#[test]
fn test_national_melded_kong_counts() {
    let rules = NationalRules::default();
    let p = player(2, "234m567m888m55m", vec![Meld::exposed_kong(Tile::Wan(9), 1)]);
    let score = evaluate_win(&rules, &mut Decomposer::new(), &p, &WinContext::discard(2, Tile::Wan(5)))
        .unwrap()
        .score;
    assert!(score.has_pattern(Pattern::FullFlush));
    assert!(score.has_pattern(Pattern::MeldedKong));
    assert!(!score.has_pattern(Pattern::ConcealedHand));
}

#[test]
fn test_national_self_draw_split() {
    let result = Settlement::national(&record(0, None, 97), &[1, 2, 3]);
    assert_eq!(result.payments[&1], -33);
    assert_eq!(result.payments[&2], -32);
    assert_eq!(result.payments[&3], -32);
    assert_eq!(result.payments[&0], 97);
    assert_eq!(result.net(), 0);
}

#[test]
fn test_regional_discard_only_discarder_pays() {
    let result = Settlement::regional(&record(2, Some(3), 2), &[0, 1, 3]);
    assert_eq!(result.payments.len(), 2);
    assert_eq!(result.payments[&3], -4);
    assert_eq!(result.payments[&2], 4);
}

/// 不封顶的番种表：极大番数不会让计分或结算溢出
#[test]
fn test_uncapped_catalogue_from_json() {
    let config = EngineConfig::from_json_str(
        r#"{"regional": {
            "catalogue": [{"pattern": "SelfDrawn", "points": 40}],
            "kong_bonus": 4294967295,
            "max_fan": null
        }}"#,
    )
    .unwrap();
    let rules = RegionalRules::new(config.regional);
    let p = player(0, "111m234m567m99m", vec![Meld::exposed_kong(Tile::Wan(8), 2)]);
    let ctx = WinContext::self_draw(0, Tile::Wan(9)).with_missing_suit(Some(Suit::Tiao));
    let score = evaluate_win(&rules, &mut Decomposer::new(), &p, &ctx).unwrap().score;
    assert!(score.has_pattern(Pattern::SelfDrawn));
    assert_eq!(score.total, u32::MAX);

    let win = WinRecord {
        winner: 0,
        discarder: None,
        tile: Tile::Wan(9),
        score,
        turn: 5,
    };
    let result = rules.settle(&win, &[1, 2, 3]);
    assert_eq!(result.net(), 0);
    assert!(result.payments[&0] > 0);
    assert_eq!(result.payments[&1], -(i32::MAX / 3));
}

const REGIONAL_HANDS: [&str; 4] = [
    "123m456m789m111p55p",
    "111m222m333m999m55p",
    "11223344556677m",
    "123m789m123p789p99m",
];

fn regional_total(catalogue: Vec<PatternDef>, hand: &str) -> u32 {
    let rules = RegionalRules::new(RegionalConfig {
        catalogue,
        kong_bonus: 0,
        max_fan: None,
        ..RegionalConfig::default()
    });
    let p = player(0, hand, vec![]);
    let ctx = WinContext::self_draw(0, Tile::Wan(9)).with_missing_suit(Some(Suit::Tiao));
    evaluate_win(&rules, &mut Decomposer::new(), &p, &ctx).unwrap().score.total
}

proptest! {
    /// 向番种表加入一个番种，总分不会下降
    #[test]
    fn prop_adding_pattern_never_lowers_total(
        mask in 0u16..(1 << 11),
        extra in 0usize..11,
        hand in 0usize..REGIONAL_HANDS.len(),
    ) {
        let full = RegionalConfig::default().catalogue;
        let subset: Vec<PatternDef> = full
            .iter()
            .enumerate()
            .filter(|(i, _)| mask & (1 << i) != 0 && *i != extra)
            .map(|(_, def)| def.clone())
            .collect();
        let mut extended = subset.clone();
        extended.push(full[extra].clone());

        let before = regional_total(subset, REGIONAL_HANDS[hand]);
        let after = regional_total(extended, REGIONAL_HANDS[hand]);
        prop_assert!(after >= before);
    }
}
