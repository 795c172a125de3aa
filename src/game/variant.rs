use crate::game::claim::{validate_claim_tiles, ClaimIntent};
use crate::game::config::EngineConfig;
use crate::game::national::NationalRules;
use crate::game::player::Player;
use crate::game::regional::RegionalRules;
use crate::game::scoring::{Disqualification, ScoreResult};
use crate::game::settlement::{SettlementResult, WinRecord};
use crate::tile::{Decomposer, Decomposition, Suit, Tile};

/// 规则变体
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum VariantKind {
    /// 血战到底（定缺、和后继续、一炮多响）
    Regional,
    /// 国标麻将（番种表、起和番）
    National,
}

/// 和牌时的上下文
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WinContext {
    /// 和牌者座位
    pub seat: u8,
    /// 定缺花色
    pub missing_suit: Option<Suit>,
    /// 和牌张
    pub win_tile: Tile,
    pub self_drawn: bool,
    /// 杠后补牌自摸
    pub kong_replacement: bool,
    /// 牌墙最后一张
    pub last_tile: bool,
    /// 抢杠
    pub robbing_kong: bool,
}

impl WinContext {
    /// 点和（别人打出的牌）
    pub fn discard(seat: u8, win_tile: Tile) -> Self {
        Self {
            seat,
            missing_suit: None,
            win_tile,
            self_drawn: false,
            kong_replacement: false,
            last_tile: false,
            robbing_kong: false,
        }
    }

    /// 自摸
    pub fn self_draw(seat: u8, win_tile: Tile) -> Self {
        Self {
            self_drawn: true,
            ..Self::discard(seat, win_tile)
        }
    }

    pub fn with_missing_suit(mut self, suit: Option<Suit>) -> Self {
        self.missing_suit = suit;
        self
    }
}

/// 规则变体接口
///
/// 实现无内部可变状态，只持有各自的配置（番种表、起和番等）。
pub trait RuleVariant: Send + Sync {
    fn kind(&self) -> VariantKind;

    /// 检查某种拆法能否和牌，返回不能和的原因
    fn check_win(&self, player: &Player, decomposition: &Decomposition, ctx: &WinContext) -> Option<Disqualification>;

    /// 某种拆法是否合法和牌
    fn is_legal_win(&self, player: &Player, decomposition: &Decomposition, ctx: &WinContext) -> bool {
        self.check_win(player, decomposition, ctx).is_none()
    }

    /// 在全部拆法中取最高分
    fn score(&self, player: &Player, decompositions: &[Decomposition], ctx: &WinContext) -> ScoreResult;

    /// 鸣牌的牌面合法性检查（座位、张数、顺子形状）
    fn validate_claim(&self, player: &Player, intent: &ClaimIntent) -> bool {
        validate_claim_tiles(self.allows_chow(), player, intent)
    }

    fn allows_chow(&self) -> bool;

    /// 同一张牌能否多人同时和
    fn allows_multi_win(&self) -> bool;

    /// 有人和牌后本局是否继续
    fn continues_after_win(&self) -> bool;

    /// 是否需要定缺
    fn requires_missing_suit(&self) -> bool;

    /// 出牌限制
    fn can_discard(&self, player: &Player, _missing_suit: Option<Suit>, tile: Tile) -> bool {
        player.hand.has_tile(tile)
    }

    /// 和牌结算
    ///
    /// # 参数
    ///
    /// - `win`: 和牌记录
    /// - `payers`: 仍在局中、可能需要付分的座位（不含和牌者）
    fn settle(&self, win: &WinRecord, payers: &[u8]) -> SettlementResult;

    /// 本规则使用的整副牌
    fn tile_set(&self) -> Vec<Tile>;
}

/// 按配置构造规则
pub fn build_variant(config: &EngineConfig) -> Box<dyn RuleVariant> {
    match config.variant {
        VariantKind::Regional => Box::new(RegionalRules::new(config.regional.clone())),
        VariantKind::National => Box::new(NationalRules::new(config.national.clone())),
    }
}

/// 和牌评估结果
#[derive(Debug, Clone)]
pub struct WinEvaluation {
    /// 合法的拆法
    pub decompositions: Vec<Decomposition>,
    pub score: ScoreResult,
}

/// 拆牌、过滤不合法拆法、计分
///
/// `player` 的暗牌应已包含和牌张。
pub fn evaluate_win(
    rule: &dyn RuleVariant,
    decomposer: &mut Decomposer,
    player: &Player,
    ctx: &WinContext,
) -> Result<WinEvaluation, Disqualification> {
    let all = decomposer.decompose(&player.hand, &player.melds);
    if all.is_empty() {
        return Err(Disqualification::Incomplete);
    }

    let mut first_reason = None;
    let legal: Vec<Decomposition> = all
        .into_iter()
        .filter(|d| match rule.check_win(player, d, ctx) {
            None => true,
            Some(reason) => {
                first_reason.get_or_insert(reason);
                false
            }
        })
        .collect();
    if legal.is_empty() {
        return Err(first_reason.unwrap_or(Disqualification::Incomplete));
    }

    let score = rule.score(player, &legal, ctx);
    match score.disqualification {
        Some(reason) => Err(reason),
        None => Ok(WinEvaluation {
            decompositions: legal,
            score,
        }),
    }
}
