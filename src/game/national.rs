use crate::game::config::NationalConfig;
use crate::game::pattern::{evaluate_catalogue, PatternInput};
use crate::game::player::Player;
use crate::game::scoring::{Disqualification, ScoreResult};
use crate::game::settlement::{Settlement, SettlementResult, WinRecord};
use crate::game::variant::{RuleVariant, VariantKind, WinContext};
use crate::tile::wall::tile_set;
use crate::tile::{Decomposition, Tile};

/// 国标麻将规则
///
/// 番种表由配置注入，番数之和须达到起和番。一家和牌即结束本局，
/// 同一张牌多人可和时只取离放铳者最近的一家（截和）。
pub struct NationalRules {
    config: NationalConfig,
}

impl NationalRules {
    pub fn new(config: NationalConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &NationalConfig {
        &self.config
    }

    fn score_one(&self, player: &Player, decomposition: &Decomposition, ctx: &WinContext, index: usize) -> ScoreResult {
        let input = PatternInput::new(decomposition, player, ctx);
        let matched = evaluate_catalogue(&self.config.catalogue, &input);
        let total = ScoreResult::sum_points(&matched);
        ScoreResult {
            matched,
            total,
            decomposition: Some(index),
            disqualification: self.below_floor(total),
        }
    }

    fn below_floor(&self, points: u32) -> Option<Disqualification> {
        (points < self.config.min_points).then_some(Disqualification::BelowMinimumPoints {
            points,
            floor: self.config.min_points,
        })
    }
}

impl Default for NationalRules {
    fn default() -> Self {
        Self::new(NationalConfig::default())
    }
}

impl RuleVariant for NationalRules {
    fn kind(&self) -> VariantKind {
        VariantKind::National
    }

    fn check_win(&self, player: &Player, decomposition: &Decomposition, ctx: &WinContext) -> Option<Disqualification> {
        self.score_one(player, decomposition, ctx, 0).disqualification
    }

    fn score(&self, player: &Player, decompositions: &[Decomposition], ctx: &WinContext) -> ScoreResult {
        ScoreResult::best_of(
            decompositions
                .iter()
                .enumerate()
                .map(|(i, d)| self.score_one(player, d, ctx, i)),
        )
        .unwrap_or_else(|| ScoreResult::disqualified(Disqualification::Incomplete))
    }

    fn allows_chow(&self) -> bool {
        true
    }

    fn allows_multi_win(&self) -> bool {
        false
    }

    fn continues_after_win(&self) -> bool {
        false
    }

    fn requires_missing_suit(&self) -> bool {
        false
    }

    fn settle(&self, win: &WinRecord, payers: &[u8]) -> SettlementResult {
        Settlement::national(win, payers)
    }

    fn tile_set(&self) -> Vec<Tile> {
        tile_set(true)
    }
}
