use crossbeam::channel::{unbounded, Receiver};
use mahjong_core::game::kong::KongType;
use mahjong_core::{
    parse_tiles, Action, ChannelSink, ClaimIntent, ClaimKind, ClaimRejection, ClaimResponse, DecisionContext,
    EngineConfig, ExchangeDirection, FirstLegalPolicy, FnPolicy, GameEngine, GameError, GameEvent, GreedyPolicy,
    MeldKind, Pattern, Phase, PlayerView, Policy, RandomPolicy, ResolvedClaim, Suit, Tile, TileExchange, Wall,
};
use std::time::Duration;

/// 按座位顺序发 13 张，之后按 `draws` 顺序摸牌
fn scripted(config: EngineConfig, hands: [&str; 4], draws: &str) -> (GameEngine, Receiver<GameEvent>) {
    let mut sequence = Vec::new();
    for hand in hands {
        let tiles = parse_tiles(hand).unwrap();
        assert_eq!(tiles.len(), 13, "{}", hand);
        sequence.extend(tiles);
    }
    sequence.extend(parse_tiles(draws).unwrap());

    let mut engine = GameEngine::with_deck(config, Box::new(Wall::from_sequence(sequence)));
    let (sink, events) = ChannelSink::bounded(1024);
    engine.add_sink(Box::new(sink));
    engine.start().unwrap();
    (engine, events)
}

/// 脚本化的血战对局不换三张，发到的手牌即为定缺时的手牌
fn regional() -> EngineConfig {
    EngineConfig::regional().with_tile_exchange(TileExchange::Off)
}

fn declare(engine: &mut GameEngine, suits: [Suit; 4]) {
    for (seat, suit) in suits.into_iter().enumerate() {
        engine.declare_suit(seat as u8, suit).unwrap();
    }
    assert_eq!(engine.phase(), Phase::AwaitingDraw);
}

/// 所有未响应的座位都过，然后裁决
fn pass_all(engine: &mut GameEngine) -> Option<ResolvedClaim> {
    let pending: Vec<u8> = engine.state().window().unwrap().pending.to_vec();
    for seat in pending {
        engine.decline(seat).unwrap();
    }
    engine.resolve_claims().unwrap()
}

fn drain(events: &Receiver<GameEvent>) -> Vec<GameEvent> {
    events.try_iter().collect()
}

const TONG_5: Tile = Tile::Tong(5);

/// 血战：一炮双响
///
/// 座位 0 打出 5p，座位 1、2 同时和，放铳者各付 1 分，之后从座位 3 继续
#[test]
fn test_regional_double_win_continues() {
    let (mut engine, events) = scripted(
        regional(),
        ["123456789m5p119s", "234m567m22m46p789p", "345m678m999m33p55p", "667788p8899s567m"],
        "9p1m2s",
    );
    declare(&mut engine, [Suit::Tong, Suit::Tiao, Suit::Tiao, Suit::Tiao]);

    assert_eq!(engine.draw().unwrap(), Tile::Tong(9));
    // 手里还有缺门牌，不能打万
    assert_eq!(engine.discard(0, Tile::Wan(1)).unwrap_err(), GameError::IllegalDiscard(Tile::Wan(1)));
    engine.discard(0, TONG_5).unwrap();

    let legal = engine.legal_actions(1);
    assert!(legal.contains(&Action::Claim(ClaimIntent::win(1, 0, TONG_5))));
    engine.submit_claim(ClaimIntent::win(1, 0, TONG_5)).unwrap();
    // 允许一炮多响，不会提前关闭窗口
    assert_eq!(engine.phase(), Phase::CollectingClaims);
    engine.submit_claim(ClaimIntent::win(2, 0, TONG_5)).unwrap();
    engine.decline(3).unwrap();

    let resolved = engine.resolve_claims().unwrap();
    assert!(matches!(resolved, Some(ResolvedClaim::Win(ref ws)) if ws.len() == 2));
    assert_eq!(engine.wins().iter().map(|w| w.winner).collect::<Vec<_>>(), vec![1, 2]);
    assert_eq!(engine.scores(), [-2, 1, 1, 0]);
    assert_eq!(engine.phase(), Phase::AwaitingDraw);
    assert_eq!(engine.current_player(), 3);
    assert!(engine.state().discards()[0].claimed);

    let won: Vec<_> = drain(&events)
        .into_iter()
        .filter_map(|e| match e {
            GameEvent::PlayerWon { record, payments } => Some((record.winner, payments)),
            _ => None,
        })
        .collect();
    assert_eq!(won, vec![(1, vec![(0, -1), (1, 1)]), (2, vec![(0, -1), (2, 1)])]);

    // 和牌者不再参与鸣牌窗口
    engine.draw().unwrap();
    engine.discard(3, Tile::Tiao(8)).unwrap();
    assert_eq!(engine.state().window().unwrap().pending.as_slice(), &[0]);
    assert_eq!(engine.decline(1).unwrap_err(), GameError::PlayerOut(1));
    assert!(pass_all(&mut engine).is_none());
    assert_eq!(engine.current_player(), 0);
}

const NATIONAL_WINDOW_HANDS: [&str; 4] = [
    "123456789p1234s",
    "555666777z234m9m",
    "111222333444z9m",
    "123456789s5678p",
];

/// 国标：下家和牌立即关闭窗口，本局结束
#[test]
fn test_national_nearest_win_closes_window() {
    let (mut engine, events) = scripted(EngineConfig::national(), NATIONAL_WINDOW_HANDS, "9m1p");
    engine.draw().unwrap();
    engine.discard(0, Tile::Wan(9)).unwrap();

    engine.submit_claim(ClaimIntent::win(1, 0, Tile::Wan(9))).unwrap();
    assert_eq!(engine.phase(), Phase::ResolvingClaim);
    engine.resolve_claims().unwrap();

    assert_eq!(engine.phase(), Phase::RoundEnd);
    let outcome = engine.outcome().unwrap();
    assert_eq!(outcome.winners(), vec![1]);
    assert!(!outcome.drawn);
    assert_eq!(outcome.wins[0].score.total, 96);
    assert_eq!(outcome.scores, [-96, 96, 0, 0]);
    assert!(drain(&events)
        .iter()
        .any(|e| matches!(e, GameEvent::RoundEnded { winners, drawn: false, .. } if winners == &vec![1])));
}

/// 国标：远家先报和，仍要等近家响应；近家也和时近家截和
#[test]
fn test_national_farther_claim_waits_for_nearer_seat() {
    let (mut engine, _events) = scripted(EngineConfig::national(), NATIONAL_WINDOW_HANDS, "9m1p");
    engine.draw().unwrap();
    engine.discard(0, Tile::Wan(9)).unwrap();

    engine.submit_claim(ClaimIntent::win(2, 0, Tile::Wan(9))).unwrap();
    assert_eq!(engine.phase(), Phase::CollectingClaims);
    engine.decline(3).unwrap();
    assert_eq!(engine.phase(), Phase::CollectingClaims);
    engine.submit_claim(ClaimIntent::win(1, 0, Tile::Wan(9))).unwrap();
    assert_eq!(engine.phase(), Phase::ResolvingClaim);

    engine.resolve_claims().unwrap();
    assert_eq!(engine.outcome().unwrap().winners(), vec![1]);
    assert_eq!(engine.scores()[2], 0);
}

/// 血战：暗杠后杠上开花
///
/// 杠上开花 1 + 清一色 1 + 杠 1 = 3 番，自摸每家付 2 × 2^3
#[test]
fn test_regional_kong_replacement_self_win() {
    let (mut engine, events) = scripted(
        regional(),
        ["1111m234m456m88m9m", "234567p234567s9p", "223344p556677s9s", "667788p8899s567m"],
        "8m9m3p",
    );
    declare(&mut engine, [Suit::Tong, Suit::Wan, Suit::Wan, Suit::Wan]);

    engine.draw().unwrap();
    assert!(engine.legal_actions(0).contains(&Action::ConcealedKong { tile: Tile::Wan(1) }));
    assert!(!engine.legal_actions(0).contains(&Action::SelfWin));
    engine.declare_concealed_kong(0, Tile::Wan(1)).unwrap();
    assert_eq!(engine.phase(), Phase::AwaitingDraw);
    assert_eq!(engine.current_player(), 0);
    assert_eq!(engine.state().kongs()[0].kind, KongType::Concealed);

    assert_eq!(engine.draw().unwrap(), Tile::Wan(9));
    assert!(engine.legal_actions(0).contains(&Action::SelfWin));
    let record = engine.declare_self_win(0).unwrap();
    assert!(record.score.has_pattern(Pattern::KongReplacement));
    assert!(record.score.has_pattern(Pattern::FullFlush));
    assert!(record.score.has_pattern(Pattern::KongBonus));
    assert_eq!(record.score.total, 3);
    assert_eq!(engine.scores(), [48, -16, -16, -16]);

    // 血战继续，下家接着摸牌
    assert_eq!(engine.phase(), Phase::AwaitingDraw);
    assert_eq!(engine.current_player(), 1);

    let replacement_draws: Vec<bool> = drain(&events)
        .into_iter()
        .filter_map(|e| match e {
            GameEvent::TileDrawn { replacement, .. } => Some(replacement),
            _ => None,
        })
        .collect();
    assert_eq!(replacement_draws, vec![false, true]);
}

/// 血战：明杠别人打出的牌，杠后补牌
#[test]
fn test_regional_direct_kong_claim() {
    let (mut engine, events) = scripted(
        regional(),
        ["123456789m5p119s", "234m567m22m46p789p", "345m678m999m33p55p", "667788p8899s567m"],
        "9p1p",
    );
    declare(&mut engine, [Suit::Wan, Suit::Tiao, Suit::Tiao, Suit::Tiao]);
    engine.draw().unwrap();
    engine.discard(0, Tile::Wan(9)).unwrap();

    let legal = engine.legal_actions(2);
    assert!(legal.contains(&Action::Claim(ClaimIntent::kong(2, 0, Tile::Wan(9)))));
    assert!(legal.contains(&Action::Claim(ClaimIntent::pong(2, 0, Tile::Wan(9)))));

    engine.submit_claim(ClaimIntent::kong(2, 0, Tile::Wan(9))).unwrap();
    let resolved = pass_all(&mut engine);
    assert!(matches!(resolved, Some(ResolvedClaim::Meld(i)) if i.kind == ClaimKind::Kong && i.player == 2));
    assert_eq!(engine.phase(), Phase::AwaitingDraw);
    assert_eq!(engine.current_player(), 2);
    assert_eq!(engine.player(2).unwrap().melds[0].kind, MeldKind::Kong);
    assert_eq!(engine.state().kongs()[0].kind, KongType::Direct);

    assert_eq!(engine.draw().unwrap(), Tile::Tong(1));
    let last = drain(&events).into_iter().rev().find(|e| matches!(e, GameEvent::TileDrawn { .. }));
    assert_eq!(
        last,
        Some(GameEvent::TileDrawn {
            player: 2,
            tile: Tile::Tong(1),
            replacement: true
        })
    );
}

const ROB_HANDS: [&str; 4] = [
    "123456789m119p5s",
    "234p678p55s12349s",
    "123p456p789p34s55p",
    "1166778899s123p",
];

/// 打到座位 1 摸到第四张 5s 并宣布加杠为止
fn to_added_kong() -> (GameEngine, Receiver<GameEvent>, u64) {
    let (mut engine, events) = scripted(regional(), ROB_HANDS, "9p1m2m3m5s4m6m");
    declare(&mut engine, [Suit::Tiao, Suit::Wan, Suit::Wan, Suit::Wan]);

    engine.draw().unwrap();
    engine.discard(0, Tile::Tiao(5)).unwrap();
    engine.submit_claim(ClaimIntent::pong(1, 0, Tile::Tiao(5))).unwrap();
    pass_all(&mut engine);
    assert_eq!(engine.phase(), Phase::AwaitingDiscard);
    assert_eq!(engine.current_player(), 1);
    engine.discard(1, Tile::Tiao(9)).unwrap();
    pass_all(&mut engine);

    for (seat, tile) in [(2, Tile::Wan(1)), (3, Tile::Wan(2)), (0, Tile::Wan(3))] {
        assert_eq!(engine.current_player(), seat);
        assert_eq!(engine.draw().unwrap(), tile);
        engine.discard(seat, tile).unwrap();
        assert!(pass_all(&mut engine).is_none());
    }

    assert_eq!(engine.draw().unwrap(), Tile::Tiao(5));
    assert!(engine.legal_actions(1).contains(&Action::AddedKong { tile: Tile::Tiao(5) }));
    let seq = engine.declare_added_kong(1, Tile::Tiao(5)).unwrap();
    assert_eq!(engine.phase(), Phase::CollectingClaims);
    (engine, events, seq)
}

#[test]
fn test_added_kong_robbed() {
    let (mut engine, events, _) = to_added_kong();

    let legal = engine.legal_actions(2);
    assert!(legal.contains(&Action::Claim(ClaimIntent::win(2, 1, Tile::Tiao(5)))));
    assert!(!legal.iter().any(|a| matches!(a, Action::Claim(i) if i.kind != ClaimKind::Win)));

    engine.submit_claim(ClaimIntent::win(2, 1, Tile::Tiao(5))).unwrap();
    let resolved = pass_all(&mut engine);
    assert!(matches!(resolved, Some(ResolvedClaim::Win(_))));

    let record = &engine.wins()[0];
    assert_eq!(record.winner, 2);
    assert_eq!(record.discarder, Some(1));
    assert!(record.score.has_pattern(Pattern::RobbingKong));
    assert_eq!(engine.scores(), [0, -2, 2, 0]);

    // 被抢的牌离开加杠者的手，碰仍是碰
    let robbed = engine.player(1).unwrap();
    assert!(!robbed.hand.has_tile(Tile::Tiao(5)));
    assert_eq!(robbed.melds[0].kind, MeldKind::Pong);
    assert_eq!(robbed.effective_count(), 13);
    assert!(engine.state().kongs().is_empty());

    assert_eq!(engine.phase(), Phase::AwaitingDraw);
    assert_eq!(engine.current_player(), 3);
    assert!(drain(&events).contains(&GameEvent::KongRobbed {
        player: 1,
        tile: Tile::Tiao(5)
    }));
}

#[test]
fn test_added_kong_completes_when_nobody_robs() {
    let (mut engine, events, _) = to_added_kong();
    // 加杠窗口只接受和
    assert_eq!(
        engine.submit_claim(ClaimIntent::pong(3, 1, Tile::Tiao(5))).unwrap_err(),
        GameError::InvalidClaim {
            player: 3,
            reason: ClaimRejection::OnlyWinAllowed
        }
    );
    assert!(pass_all(&mut engine).is_none());

    assert_eq!(engine.player(1).unwrap().melds[0].kind, MeldKind::Kong);
    assert_eq!(engine.state().kongs()[0].kind, KongType::Added);
    assert_eq!(engine.phase(), Phase::AwaitingDraw);
    assert_eq!(engine.current_player(), 1);
    assert_eq!(engine.draw().unwrap(), Tile::Wan(4));
    assert!(drain(&events).contains(&GameEvent::TileDrawn {
        player: 1,
        tile: Tile::Wan(4),
        replacement: true
    }));
}

const NATIONAL_HANDS: [&str; 4] = [
    "123456789m1234p",
    "11p234567m88s555z",
    "2345p6789s12399m",
    "1112345678999s",
];

/// 通道收集：过期响应被丢弃，超时后未响应的座位视为过
#[test]
fn test_collect_claims_timeout_and_stale() {
    let (mut engine, _events) = scripted(EngineConfig::national(), NATIONAL_HANDS, "1z2z");
    engine.draw().unwrap();
    let seq = engine.discard(0, "1z".parse().unwrap()).unwrap();

    let (tx, rx) = unbounded();
    tx.send(ClaimResponse::pass(1, seq)).unwrap();
    tx.send(ClaimResponse::pass(2, seq + 7)).unwrap();
    engine.collect_claims(&rx, Some(Duration::from_millis(50))).unwrap();

    assert_eq!(engine.phase(), Phase::ResolvingClaim);
    assert!(engine.resolve_claims().unwrap().is_none());
    assert_eq!(engine.current_player(), 1);
    drop(tx);
}

/// 通道收集：无效鸣牌视为过并发出拒绝事件，合法的碰照常执行
#[test]
fn test_collect_claims_invalid_claim_is_a_pass() {
    let (mut engine, events) = scripted(EngineConfig::national(), NATIONAL_HANDS, "1z2z");
    engine.draw().unwrap();
    let seq = engine.discard(0, Tile::Tong(1)).unwrap();

    let (tx, rx) = unbounded();
    tx.send(ClaimResponse::claim(ClaimIntent::pong(2, 0, Tile::Tong(1)), seq)).unwrap();
    tx.send(ClaimResponse::claim(ClaimIntent::pong(1, 0, Tile::Tong(1)), seq)).unwrap();
    tx.send(ClaimResponse::pass(3, seq)).unwrap();
    drop(tx);
    engine.collect_claims(&rx, None).unwrap();

    let resolved = engine.resolve_claims().unwrap();
    assert!(matches!(resolved, Some(ResolvedClaim::Meld(i)) if i.player == 1));
    assert!(drain(&events).contains(&GameEvent::ClaimRejected {
        player: 2,
        reason: ClaimRejection::IllegalTiles
    }));
}

/// 血战：换三张（顺时针）后再定缺
#[test]
fn test_regional_tile_exchange_clockwise() {
    let config = EngineConfig::regional().with_tile_exchange(TileExchange::Fixed(ExchangeDirection::Clockwise));
    let (mut engine, events) = scripted(
        config,
        ["123456789m5p119s", "234m567m22m46p789p", "345m678m999m33p55p", "667788p8899s567m"],
        "9p",
    );
    assert_eq!(engine.phase(), Phase::ExchangingTiles);
    assert_eq!(engine.snapshot().exchange_direction, Some(ExchangeDirection::Clockwise));
    let legal = engine.legal_actions(0);
    assert!(legal.iter().all(|a| matches!(a, Action::Exchange { .. })));
    assert!(legal.contains(&Action::Exchange { tiles: [Tile::Tiao(1), Tile::Tiao(1), Tile::Tiao(9)] }));

    assert_eq!(
        engine.declare_suit(0, Suit::Wan).unwrap_err(),
        GameError::IllegalActionForPhase {
            phase: Phase::ExchangingTiles,
            action: "declare_suit"
        }
    );
    let before = engine.snapshot();
    assert_eq!(
        engine.exchange_tiles(0, [Tile::Wan(1), Tile::Wan(2), TONG_5]).unwrap_err(),
        GameError::InvalidExchange
    );
    assert_eq!(engine.exchange_tiles(0, [TONG_5; 3]).unwrap_err(), GameError::TileNotHeld(TONG_5));
    assert_eq!(engine.snapshot(), before);

    engine.exchange_tiles(0, [Tile::Tiao(9), Tile::Tiao(1), Tile::Tiao(1)]).unwrap();
    assert_eq!(
        engine.exchange_tiles(0, [Tile::Wan(1), Tile::Wan(2), Tile::Wan(3)]).unwrap_err(),
        GameError::AlreadyResponded(0)
    );
    engine
        .apply(1, Action::Exchange { tiles: [Tile::Tong(7), Tile::Tong(8), Tile::Tong(9)] })
        .unwrap();
    engine.exchange_tiles(2, [Tile::Wan(9); 3]).unwrap();
    // 最后一家提交前谁的手牌都不变
    assert_eq!(engine.player(0).unwrap().hand.tile_count(Tile::Tiao(1)), 2);
    engine.exchange_tiles(3, [Tile::Wan(5), Tile::Wan(6), Tile::Wan(7)]).unwrap();

    assert_eq!(engine.phase(), Phase::DeclaringSuits);
    let hand = |seat: u8| engine.player(seat).unwrap().hand.clone();
    assert_eq!(hand(0).tile_count(Tile::Tiao(1)), 0);
    assert_eq!(hand(0).tile_count(Tile::Wan(5)), 2);
    assert_eq!(hand(1).tile_count(Tile::Tiao(1)), 2);
    assert_eq!(hand(1).tile_count(Tile::Tiao(9)), 1);
    assert_eq!(hand(2).tile_count(Tile::Tong(8)), 1);
    assert_eq!(hand(3).tile_count(Tile::Wan(9)), 3);
    for player in engine.players() {
        assert_eq!(player.effective_count(), 13);
    }
    assert_eq!(
        engine.exchange_tiles(0, [Tile::Wan(5), Tile::Wan(6), Tile::Wan(7)]).unwrap_err(),
        GameError::IllegalActionForPhase {
            phase: Phase::DeclaringSuits,
            action: "exchange_tiles"
        }
    );

    let events = drain(&events);
    let submitted = events.iter().filter(|e| matches!(e, GameEvent::ExchangeSubmitted { .. })).count();
    assert_eq!(submitted, 4);
    assert!(events.contains(&GameEvent::TilesExchanged { direction: ExchangeDirection::Clockwise }));

    declare(&mut engine, [Suit::Tiao, Suit::Tiao, Suit::Tiao, Suit::Tiao]);
}

#[test]
fn test_snapshot_serializes() {
    let (mut engine, _events) = scripted(EngineConfig::national(), NATIONAL_HANDS, "1z2z");
    engine.draw().unwrap();
    engine.discard(0, "1z".parse().unwrap()).unwrap();

    let json = serde_json::to_value(engine.snapshot()).unwrap();
    assert_eq!(json["phase"], "CollectingClaims");
    assert_eq!(json["seats"].as_array().unwrap().len(), 4);
    assert_eq!(json["window"]["seq"], 1);
    assert_eq!(json["remaining_draws"], 1);
}

fn policies(make: impl Fn(u8) -> Box<dyn Policy>) -> [Box<dyn Policy>; 4] {
    [make(0), make(1), make(2), make(3)]
}

fn assert_finished(engine: &GameEngine, outcome: &mahjong_core::RoundOutcome) {
    assert_eq!(engine.phase(), Phase::RoundEnd);
    assert_eq!(outcome.scores.iter().sum::<i32>(), 0);
    assert!(outcome.drawn || !outcome.wins.is_empty());
    for win in &outcome.wins {
        assert!(win.score.is_qualified());
    }
}

#[test]
fn test_run_round_greedy_regional() {
    for seed in 0..4 {
        let mut engine = GameEngine::with_seed(EngineConfig::regional(), seed);
        let mut ps = policies(|_| Box::new(GreedyPolicy));
        let outcome = engine.run_round(&mut ps).unwrap();
        assert_finished(&engine, &outcome);
        // 默认先换三张再定缺
        assert!(engine.state().exchange_direction().is_some());
        // 定缺后和牌的人手里没有缺门
        for win in &outcome.wins {
            let suit = engine.state().missing_suit(win.winner).unwrap();
            assert!(!engine.player(win.winner).unwrap().holds_suit(suit));
        }
    }
}

#[test]
fn test_run_round_greedy_national() {
    for seed in 0..4 {
        let mut engine = GameEngine::with_seed(EngineConfig::national(), seed);
        let mut ps = policies(|_| Box::new(GreedyPolicy));
        let outcome = engine.run_round(&mut ps).unwrap();
        assert_finished(&engine, &outcome);
        assert!(outcome.wins.len() <= 1);
        for win in &outcome.wins {
            assert!(win.score.total >= 8);
        }
    }
}

#[test]
fn test_run_round_random_and_first_legal() {
    for seed in 0..3 {
        let config = EngineConfig::regional().with_claim_timeout(Duration::from_secs(5));
        let mut engine = GameEngine::with_seed(config, seed);
        let mut ps = policies(|seat| Box::new(RandomPolicy::with_seed(seed * 10 + seat as u64)));
        let outcome = engine.run_round(&mut ps).unwrap();
        assert_finished(&engine, &outcome);
    }

    let mut engine = GameEngine::with_seed(EngineConfig::national(), 11);
    let mut ps = policies(|_| Box::new(FirstLegalPolicy));
    let outcome = engine.run_round(&mut ps).unwrap();
    // 只出牌、从不鸣牌也不和，一定流局
    assert!(outcome.drawn);
    assert!(outcome.wins.is_empty());
    assert_eq!(engine.remaining_draws(), 0);
}

/// 总给非法动作的策略会在重试后被替换为第一个合法动作
#[test]
fn test_run_round_survives_illegal_policy() {
    let mut config = EngineConfig::regional();
    config.max_policy_retries = 1;
    let mut engine = GameEngine::with_seed(config, 3);
    let mut ps = policies(|_| {
        Box::new(FnPolicy::new(|_: &[Action], _: &PlayerView, _: &DecisionContext| {
            Action::DeclareSuit { suit: Suit::Wind }
        }))
    });
    let outcome = engine.run_round(&mut ps).unwrap();
    assert_eq!(engine.phase(), Phase::RoundEnd);
    assert_eq!(outcome.scores.iter().sum::<i32>(), 0);
}
