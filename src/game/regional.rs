use crate::game::config::RegionalConfig;
use crate::game::pattern::{evaluate_catalogue, Pattern, PatternInput, PatternMatch};
use crate::game::player::Player;
use crate::game::scoring::{Disqualification, ScoreResult};
use crate::game::settlement::{Settlement, SettlementResult, WinRecord};
use crate::game::variant::{RuleVariant, VariantKind, WinContext};
use crate::tile::wall::tile_set;
use crate::tile::{Decomposition, Suit, Tile};

/// 血战到底规则
///
/// - 定缺：和牌时暗牌与副露中不能有缺门的牌
/// - 不能吃
/// - 和牌后其余玩家继续，直到只剩一人
/// - 一炮多响
pub struct RegionalRules {
    config: RegionalConfig,
}

impl RegionalRules {
    pub fn new(config: RegionalConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RegionalConfig {
        &self.config
    }

    /// 加番合计并封顶
    pub fn total_for(&self, matched: &[PatternMatch]) -> u32 {
        let sum = ScoreResult::sum_points(matched);
        match self.config.max_fan {
            Some(cap) => sum.min(cap),
            None => sum,
        }
    }

    fn score_one(&self, player: &Player, decomposition: &Decomposition, ctx: &WinContext, index: usize) -> ScoreResult {
        let input = PatternInput::new(decomposition, player, ctx);
        let mut matched = evaluate_catalogue(&self.config.catalogue, &input);

        let kongs = player.kong_count() as u32;
        if kongs > 0 && self.config.kong_bonus > 0 {
            matched.push(PatternMatch {
                pattern: Pattern::KongBonus,
                points: self.config.kong_bonus,
                count: kongs,
            });
        }

        ScoreResult {
            total: self.total_for(&matched),
            matched,
            decomposition: Some(index),
            disqualification: None,
        }
    }
}

impl Default for RegionalRules {
    fn default() -> Self {
        Self::new(RegionalConfig::default())
    }
}

/// 检查缺一门
///
/// # 返回
///
/// 定缺门已打完返回 `None`，否则返回原因
pub fn check_missing_suit(player: &Player, missing_suit: Option<Suit>) -> Option<Disqualification> {
    match missing_suit {
        None => Some(Disqualification::MissingSuitUndeclared),
        Some(suit) if player.holds_suit(suit) => Some(Disqualification::MissingSuitHeld(suit)),
        Some(_) => None,
    }
}

impl RuleVariant for RegionalRules {
    fn kind(&self) -> VariantKind {
        VariantKind::Regional
    }

    fn check_win(&self, player: &Player, _decomposition: &Decomposition, ctx: &WinContext) -> Option<Disqualification> {
        check_missing_suit(player, ctx.missing_suit)
    }

    fn score(&self, player: &Player, decompositions: &[Decomposition], ctx: &WinContext) -> ScoreResult {
        let best = ScoreResult::best_of(
            decompositions
                .iter()
                .enumerate()
                .map(|(i, d)| self.score_one(player, d, ctx, i)),
        );
        best.unwrap_or_else(|| ScoreResult::disqualified(Disqualification::Incomplete))
    }

    fn allows_chow(&self) -> bool {
        false
    }

    fn allows_multi_win(&self) -> bool {
        true
    }

    fn continues_after_win(&self) -> bool {
        true
    }

    fn requires_missing_suit(&self) -> bool {
        true
    }

    /// 手中还有缺门牌时必须先打缺门
    fn can_discard(&self, player: &Player, missing_suit: Option<Suit>, tile: Tile) -> bool {
        if !player.hand.has_tile(tile) {
            return false;
        }
        match missing_suit {
            Some(suit) if player.hand.suit_count(suit) > 0 => tile.suit() == suit,
            _ => true,
        }
    }

    fn settle(&self, win: &WinRecord, payers: &[u8]) -> SettlementResult {
        Settlement::regional(win, payers)
    }

    fn tile_set(&self) -> Vec<Tile> {
        tile_set(false)
    }
}
