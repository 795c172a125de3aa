use crate::game::chow::ChowHandler;
use crate::game::constants::NUM_PLAYERS;
use crate::game::kong::KongHandler;
use crate::game::player::Player;
use crate::game::pong::PongHandler;
use crate::game::scoring::Disqualification;
use crate::game::variant::{evaluate_win, RuleVariant, WinContext, WinEvaluation};
use crate::tile::{Decomposer, Meld, MeldKind, Suit, Tile};
use std::cmp::Reverse;

/// 鸣牌类型
///
/// 派生的 `Ord` 即优先级：和 > 杠 > 碰 > 吃。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub enum ClaimKind {
    Chow,
    Pong,
    Kong,
    Win,
}

/// 鸣牌意图，只在一次鸣牌窗口内有效
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ClaimIntent {
    pub player: u8,
    pub discarder: u8,
    pub tile: Tile,
    pub kind: ClaimKind,
    /// 碰/杠/吃形成的副露
    pub meld: Option<Meld>,
}

impl ClaimIntent {
    pub fn win(player: u8, discarder: u8, tile: Tile) -> Self {
        Self {
            player,
            discarder,
            tile,
            kind: ClaimKind::Win,
            meld: None,
        }
    }

    pub fn pong(player: u8, discarder: u8, tile: Tile) -> Self {
        Self {
            player,
            discarder,
            tile,
            kind: ClaimKind::Pong,
            meld: Some(Meld::pong(tile, discarder)),
        }
    }

    pub fn kong(player: u8, discarder: u8, tile: Tile) -> Self {
        Self {
            player,
            discarder,
            tile,
            kind: ClaimKind::Kong,
            meld: Some(Meld::exposed_kong(tile, discarder)),
        }
    }

    /// 吃：`start` 为顺子最小的一张
    pub fn chow(player: u8, discarder: u8, tile: Tile, start: Tile) -> Self {
        Self {
            player,
            discarder,
            tile,
            kind: ClaimKind::Chow,
            meld: Some(Meld::chow(start, discarder)),
        }
    }
}

/// 鸣牌被过滤的原因
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, thiserror::Error)]
pub enum ClaimRejection {
    #[error("players cannot claim their own discard")]
    SelfClaim,
    #[error("claim names {got} but the discarded tile is {expected}")]
    WrongTile { expected: Tile, got: Tile },
    #[error("player is no longer in the round")]
    PlayerInactive,
    #[error("seat id is out of range")]
    InvalidSeat,
    #[error("player already responded in this window")]
    Duplicate,
    #[error("chow is not allowed by this rule variant")]
    ChowNotAllowed,
    #[error("chow may only be claimed by the next seat")]
    ChowNotAdjacent,
    #[error("only win claims are accepted while robbing a kong")]
    OnlyWinAllowed,
    #[error("hand does not hold the tiles for this claim")]
    IllegalTiles,
    #[error("hand is not complete with the claimed tile")]
    Incomplete,
    #[error("win not legal: {0}")]
    NotLegal(Disqualification),
}

/// 顺时针座位距离（出牌者下家为 1）
pub fn seat_distance(discarder: u8, player: u8) -> u8 {
    (player % NUM_PLAYERS + NUM_PLAYERS - discarder % NUM_PLAYERS) % NUM_PLAYERS
}

/// 鸣牌的牌面检查
///
/// 座位关系、持牌张数、顺子形状；和牌只检查座位与牌张，完整性由拆牌判断。
pub fn check_claim_tiles(
    allows_chow: bool,
    player: &Player,
    intent: &ClaimIntent,
) -> Result<(), ClaimRejection> {
    if intent.player >= NUM_PLAYERS || intent.discarder >= NUM_PLAYERS {
        return Err(ClaimRejection::InvalidSeat);
    }
    if intent.player == intent.discarder || player.id == intent.discarder {
        return Err(ClaimRejection::SelfClaim);
    }
    let ok = match intent.kind {
        ClaimKind::Win => true,
        ClaimKind::Pong => PongHandler::can_pong(player, intent.tile),
        ClaimKind::Kong => KongHandler::can_direct_kong(player, intent.tile),
        ClaimKind::Chow => {
            if !allows_chow {
                return Err(ClaimRejection::ChowNotAllowed);
            }
            if seat_distance(intent.discarder, intent.player) != 1 {
                return Err(ClaimRejection::ChowNotAdjacent);
            }
            match intent.meld {
                Some(meld) if meld.kind == MeldKind::Chow => {
                    ChowHandler::can_chow(player, intent.tile, meld.tile)
                }
                _ => false,
            }
        }
    };
    if ok {
        Ok(())
    } else {
        Err(ClaimRejection::IllegalTiles)
    }
}

/// `RuleVariant::validate_claim` 的默认实现
pub fn validate_claim_tiles(allows_chow: bool, player: &Player, intent: &ClaimIntent) -> bool {
    check_claim_tiles(allows_chow, player, intent).is_ok()
}

/// 鸣牌窗口的来源
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum ClaimSource {
    /// 打出的牌
    Discard,
    /// 加杠的牌（只能抢杠和）
    AddedKong,
}

/// 裁决时需要的局面信息
#[derive(Debug, Clone, Copy)]
pub struct ClaimContext {
    pub source: ClaimSource,
    /// 各座位定缺
    pub missing_suits: [Option<Suit>; NUM_PLAYERS as usize],
    /// 已和牌或离场的座位
    pub inactive: [bool; NUM_PLAYERS as usize],
    /// 牌墙已空（河底）
    pub last_tile: bool,
}

impl ClaimContext {
    pub fn new(source: ClaimSource) -> Self {
        Self {
            source,
            missing_suits: [None; NUM_PLAYERS as usize],
            inactive: [false; NUM_PLAYERS as usize],
            last_tile: false,
        }
    }
}

/// 合法的和牌
#[derive(Debug, Clone)]
pub struct WinningClaim {
    pub intent: ClaimIntent,
    pub evaluation: WinEvaluation,
}

/// 裁决结果
#[derive(Debug, Clone)]
pub enum ResolvedClaim {
    /// 一家或多家和牌，按座位距离排序
    Win(Vec<WinningClaim>),
    /// 碰、杠或吃
    Meld(ClaimIntent),
}

#[derive(Debug, Clone, Default)]
pub struct ResolveOutcome {
    pub resolved: Option<ResolvedClaim>,
    pub rejected: Vec<(u8, ClaimRejection)>,
}

/// 鸣牌裁决器
///
/// 先过滤不合法的鸣牌，再按优先级（和 > 杠 > 碰 > 吃）与座位距离排序。
pub struct ClaimResolver;

impl ClaimResolver {
    /// 检查单个鸣牌
    ///
    /// # 返回
    ///
    /// - `Ok(Some(_))`：合法和牌及其评估
    /// - `Ok(None)`：合法的碰、杠、吃
    /// - `Err(_)`：被过滤的原因
    pub fn check_intent(
        rule: &dyn RuleVariant,
        decomposer: &mut Decomposer,
        players: &[Player],
        intent: &ClaimIntent,
        discarded: Tile,
        discarder: u8,
        ctx: &ClaimContext,
    ) -> Result<Option<WinEvaluation>, ClaimRejection> {
        let seat = intent.player as usize;
        let player = players.get(seat).ok_or(ClaimRejection::PlayerInactive)?;
        if ctx.inactive.get(seat).copied().unwrap_or(true) {
            return Err(ClaimRejection::PlayerInactive);
        }
        if intent.player == discarder || intent.discarder != discarder {
            return Err(ClaimRejection::SelfClaim);
        }
        if intent.tile != discarded {
            return Err(ClaimRejection::WrongTile {
                expected: discarded,
                got: intent.tile,
            });
        }
        if ctx.source == ClaimSource::AddedKong && intent.kind != ClaimKind::Win {
            return Err(ClaimRejection::OnlyWinAllowed);
        }
        if !rule.validate_claim(player, intent) {
            let reason = check_claim_tiles(rule.allows_chow(), player, intent)
                .err()
                .unwrap_or(ClaimRejection::IllegalTiles);
            return Err(reason);
        }
        if intent.kind != ClaimKind::Win {
            return Ok(None);
        }

        let mut candidate = player.clone();
        if !candidate.hand.add_tile(discarded) {
            return Err(ClaimRejection::Incomplete);
        }
        let mut win_ctx =
            WinContext::discard(intent.player, discarded).with_missing_suit(ctx.missing_suits[seat]);
        win_ctx.robbing_kong = ctx.source == ClaimSource::AddedKong;
        win_ctx.last_tile = ctx.last_tile;

        match evaluate_win(rule, decomposer, &candidate, &win_ctx) {
            Ok(evaluation) => Ok(Some(evaluation)),
            Err(Disqualification::Incomplete) => Err(ClaimRejection::Incomplete),
            Err(reason) => Err(ClaimRejection::NotLegal(reason)),
        }
    }

    /// 裁决一次鸣牌窗口内的全部意图
    pub fn resolve(
        rule: &dyn RuleVariant,
        decomposer: &mut Decomposer,
        players: &[Player],
        intents: &[ClaimIntent],
        discarded: Tile,
        discarder: u8,
        ctx: &ClaimContext,
    ) -> ResolveOutcome {
        let mut rejected = Vec::new();
        let mut seen = [false; NUM_PLAYERS as usize];
        let mut valid: Vec<(ClaimIntent, Option<WinEvaluation>)> = Vec::new();

        for intent in intents {
            if let Some(flag) = seen.get_mut(intent.player as usize) {
                if *flag {
                    rejected.push((intent.player, ClaimRejection::Duplicate));
                    continue;
                }
                *flag = true;
            }
            match Self::check_intent(rule, decomposer, players, intent, discarded, discarder, ctx) {
                Ok(evaluation) => valid.push((*intent, evaluation)),
                Err(reason) => {
                    log::warn!("玩家 {} 的鸣牌 {:?} 被拒绝: {}", intent.player, intent.kind, reason);
                    rejected.push((intent.player, reason));
                }
            }
        }

        valid.sort_by_key(|(intent, _)| {
            (Reverse(intent.kind), seat_distance(discarder, intent.player))
        });

        let resolved = match valid.first().map(|(intent, _)| intent.kind) {
            None => None,
            Some(ClaimKind::Win) => {
                let limit = if rule.allows_multi_win() { usize::MAX } else { 1 };
                let winners: Vec<WinningClaim> = valid
                    .into_iter()
                    .filter_map(|(intent, evaluation)| {
                        evaluation.map(|evaluation| WinningClaim { intent, evaluation })
                    })
                    .take(limit)
                    .collect();
                Some(ResolvedClaim::Win(winners))
            }
            Some(_) => valid.first().map(|(intent, _)| ResolvedClaim::Meld(*intent)),
        };

        ResolveOutcome { resolved, rejected }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::national::NationalRules;
    use crate::game::regional::RegionalRules;
    use crate::tile::Hand;

    fn players(hands: [&str; 4]) -> Vec<Player> {
        hands
            .iter()
            .enumerate()
            .map(|(i, s)| Player::with_tiles(i as u8, Hand::parse(s).unwrap(), vec![]))
            .collect()
    }

    fn regional_ctx() -> ClaimContext {
        let mut ctx = ClaimContext::new(ClaimSource::Discard);
        ctx.missing_suits = [Some(Suit::Tiao); 4];
        ctx
    }

    #[test]
    fn test_seat_distance() {
        assert_eq!(seat_distance(0, 1), 1);
        assert_eq!(seat_distance(3, 0), 1);
        assert_eq!(seat_distance(2, 1), 3);
        assert_eq!(seat_distance(0, 253), 1);
    }

    #[test]
    fn test_out_of_range_seat_rejected() {
        let player = Player::with_tiles(0, Hand::parse("34m").unwrap(), vec![]);
        let intent = ClaimIntent::chow(252, 251, Tile::Wan(2), Tile::Wan(2));
        assert_eq!(check_claim_tiles(true, &player, &intent), Err(ClaimRejection::InvalidSeat));
        assert!(!NationalRules::default().validate_claim(&player, &intent));
    }

    #[test]
    fn test_kong_beats_pong_regardless_of_seat() {
        let rule = NationalRules::default();
        let ps = players(["", "55p", "555p", ""]);
        let intents = [ClaimIntent::pong(1, 0, Tile::Tong(5)), ClaimIntent::kong(2, 0, Tile::Tong(5))];
        let outcome = ClaimResolver::resolve(
            &rule,
            &mut Decomposer::new(),
            &ps,
            &intents,
            Tile::Tong(5),
            0,
            &ClaimContext::new(ClaimSource::Discard),
        );
        match outcome.resolved {
            Some(ResolvedClaim::Meld(intent)) => assert_eq!(intent.player, 2),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_illegal_claim_never_outranks_legal() {
        let rule = NationalRules::default();
        // 玩家 1 谎报和牌，玩家 2 合法碰
        let ps = players(["", "1m", "55p", ""]);
        let intents = [ClaimIntent::win(1, 0, Tile::Tong(5)), ClaimIntent::pong(2, 0, Tile::Tong(5))];
        let outcome = ClaimResolver::resolve(
            &rule,
            &mut Decomposer::new(),
            &ps,
            &intents,
            Tile::Tong(5),
            0,
            &ClaimContext::new(ClaimSource::Discard),
        );
        assert_eq!(outcome.rejected, vec![(1, ClaimRejection::Incomplete)]);
        assert!(matches!(outcome.resolved, Some(ResolvedClaim::Meld(i)) if i.kind == ClaimKind::Pong));
    }

    #[test]
    fn test_chow_requires_next_seat() {
        let rule = NationalRules::default();
        let ps = players(["", "34m", "34m", ""]);
        assert!(rule.validate_claim(&ps[1], &ClaimIntent::chow(1, 0, Tile::Wan(2), Tile::Wan(2))));
        assert_eq!(
            check_claim_tiles(true, &ps[2], &ClaimIntent::chow(2, 0, Tile::Wan(2), Tile::Wan(2))),
            Err(ClaimRejection::ChowNotAdjacent)
        );
        // 血战不能吃
        let chow = ClaimIntent::chow(1, 0, Tile::Wan(2), Tile::Wan(2));
        assert!(!RegionalRules::default().validate_claim(&ps[1], &chow));
    }

    #[test]
    fn test_regional_multi_win() {
        let rule = RegionalRules::default();
        // 玩家 1、3 都和 5p
        let ps = players(["", "123m456m789m111m5p", "", "111m222m333m999m5p"]);
        let intents = [ClaimIntent::win(3, 0, Tile::Tong(5)), ClaimIntent::win(1, 0, Tile::Tong(5))];
        let outcome = ClaimResolver::resolve(
            &rule,
            &mut Decomposer::new(),
            &ps,
            &intents,
            Tile::Tong(5),
            0,
            &regional_ctx(),
        );
        match outcome.resolved {
            Some(ResolvedClaim::Win(winners)) => {
                let seats: Vec<u8> = winners.iter().map(|w| w.intent.player).collect();
                assert_eq!(seats, vec![1, 3]);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_missing_suit_rejection() {
        let rule = RegionalRules::default();
        let ps = players(["", "123m456m789m111s5p", "", ""]);
        let intents = [ClaimIntent::win(1, 0, Tile::Tong(5))];
        let outcome = ClaimResolver::resolve(
            &rule,
            &mut Decomposer::new(),
            &ps,
            &intents,
            Tile::Tong(5),
            0,
            &regional_ctx(),
        );
        assert!(outcome.resolved.is_none());
        assert_eq!(
            outcome.rejected,
            vec![(1, ClaimRejection::NotLegal(Disqualification::MissingSuitHeld(Suit::Tiao)))]
        );
    }

    #[test]
    fn test_rob_kong_window_only_accepts_wins() {
        let rule = NationalRules::default();
        let ps = players(["", "55p", "", ""]);
        let intents = [ClaimIntent::pong(1, 0, Tile::Tong(5))];
        let ctx = ClaimContext::new(ClaimSource::AddedKong);
        let outcome = ClaimResolver::resolve(
            &rule,
            &mut Decomposer::new(),
            &ps,
            &intents,
            Tile::Tong(5),
            0,
            &ctx,
        );
        assert!(outcome.resolved.is_none());
        assert_eq!(outcome.rejected, vec![(1, ClaimRejection::OnlyWinAllowed)]);
    }

    #[test]
    fn test_duplicate_and_inactive() {
        let rule = NationalRules::default();
        let ps = players(["", "55p", "55p", ""]);
        let mut ctx = ClaimContext::new(ClaimSource::Discard);
        ctx.inactive[2] = true;
        let intents = [
            ClaimIntent::pong(1, 0, Tile::Tong(5)),
            ClaimIntent::pong(1, 0, Tile::Tong(5)),
            ClaimIntent::pong(2, 0, Tile::Tong(5)),
        ];
        let outcome = ClaimResolver::resolve(
            &rule,
            &mut Decomposer::new(),
            &ps,
            &intents,
            Tile::Tong(5),
            0,
            &ctx,
        );
        assert_eq!(
            outcome.rejected,
            vec![(1, ClaimRejection::Duplicate), (2, ClaimRejection::PlayerInactive)]
        );
        assert!(matches!(outcome.resolved, Some(ResolvedClaim::Meld(i)) if i.player == 1));
    }
}
