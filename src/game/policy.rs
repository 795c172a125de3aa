use crate::game::action::Action;
use crate::game::claim::ClaimKind;
use crate::game::state::{DiscardRecord, Phase};
use crate::tile::{Hand, Meld, Suit, Tile};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// 决策时玩家可见的信息（引擎状态的拷贝）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerView {
    pub seat: u8,
    pub phase: Phase,
    pub hand: Hand,
    pub melds: Vec<Meld>,
    pub missing_suit: Option<Suit>,
    /// 所有座位的副露
    pub table_melds: Vec<Vec<Meld>>,
    pub discards: Vec<DiscardRecord>,
    /// 鸣牌窗口中的牌
    pub claim_tile: Option<Tile>,
    pub remaining_draws: usize,
    pub scores: [i32; 4],
}

/// 决策上下文
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecisionContext {
    /// 第几次尝试（0 为首次）
    pub attempt: u8,
    /// 鸣牌窗口序号
    pub window_seq: Option<u64>,
    /// 上一次选择被拒绝的原因
    pub previous_error: Option<String>,
}

/// 决策策略
///
/// 每次决策都拿到自己的快照，不持有引擎引用。鸣牌窗口中各家的策略会并发执行。
pub trait Policy: Send {
    /// 从合法动作中选择一个
    ///
    /// # 参数
    ///
    /// - `legal`: 当前合法动作（非空）
    /// - `view`: 玩家视角
    /// - `ctx`: 决策上下文
    ///
    /// # 返回
    ///
    /// 选择的动作；不在 `legal` 中会被要求重选
    fn decide(&mut self, legal: &[Action], view: &PlayerView, ctx: &DecisionContext) -> Action;
}

/// 函数式策略适配器
///
/// 将闭包转换为 `Policy`
pub struct FnPolicy<F> {
    callback: F,
}

impl<F> FnPolicy<F>
where
    F: FnMut(&[Action], &PlayerView, &DecisionContext) -> Action + Send,
{
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> Policy for FnPolicy<F>
where
    F: FnMut(&[Action], &PlayerView, &DecisionContext) -> Action + Send,
{
    fn decide(&mut self, legal: &[Action], view: &PlayerView, ctx: &DecisionContext) -> Action {
        (self.callback)(legal, view, ctx)
    }
}

/// 总是选第一个合法动作（出牌、过）
#[derive(Debug, Default, Clone, Copy)]
pub struct FirstLegalPolicy;

impl Policy for FirstLegalPolicy {
    fn decide(&mut self, legal: &[Action], _view: &PlayerView, _ctx: &DecisionContext) -> Action {
        legal.first().copied().unwrap_or(Action::Pass)
    }
}

/// 随机策略（用于测试对局流程）
pub struct RandomPolicy {
    rng: StdRng,
}

impl RandomPolicy {
    pub fn new() -> Self {
        Self { rng: StdRng::from_entropy() }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self { rng: StdRng::seed_from_u64(seed) }
    }
}

impl Default for RandomPolicy {
    fn default() -> Self {
        Self::new()
    }
}

impl Policy for RandomPolicy {
    fn decide(&mut self, legal: &[Action], _view: &PlayerView, _ctx: &DecisionContext) -> Action {
        legal.choose(&mut self.rng).copied().unwrap_or(Action::Pass)
    }
}

/// 简单贪心策略
///
/// - 能和就和
/// - 能鸣牌就鸣（杠 > 碰 > 吃）
/// - 换三张换出最短一门中最孤立的三张
/// - 定缺选手中最少的一门
/// - 先打缺门，其次打孤张，字牌优先
#[derive(Debug, Default, Clone, Copy)]
pub struct GreedyPolicy;

impl GreedyPolicy {
    fn pick_discard(view: &PlayerView, candidates: &[Tile]) -> Option<Tile> {
        if let Some(suit) = view.missing_suit {
            if let Some(&tile) = candidates.iter().find(|t| t.suit() == suit) {
                return Some(tile);
            }
        }
        candidates
            .iter()
            .copied()
            .min_by_key(|&tile| (Self::connectivity(&view.hand, tile), !tile.is_honor(), !tile.is_terminal()))
    }

    fn pick_exchange(view: &PlayerView, options: &[[Tile; 3]]) -> Option<[Tile; 3]> {
        options.iter().copied().min_by_key(|tiles| {
            let isolation: u32 = tiles.iter().map(|&t| u32::from(Self::connectivity(&view.hand, t))).sum();
            (view.hand.suit_count(tiles[0].suit()), isolation)
        })
    }

    /// 与该牌相关联的手牌张数（同牌与相邻两张以内的同门牌）
    fn connectivity(hand: &Hand, tile: Tile) -> u8 {
        let same = hand.tile_count(tile).saturating_sub(1);
        if !tile.is_numeral() {
            return same * 2;
        }
        let rank = tile.rank();
        let near: u8 = (rank.saturating_sub(2).max(1)..=(rank + 2).min(9))
            .filter(|&r| r != rank)
            .filter_map(|r| Tile::new(tile.suit(), r))
            .map(|t| hand.tile_count(t).min(1))
            .sum();
        same * 2 + near
    }
}

impl Policy for GreedyPolicy {
    fn decide(&mut self, legal: &[Action], view: &PlayerView, _ctx: &DecisionContext) -> Action {
        if legal.contains(&Action::SelfWin) {
            return Action::SelfWin;
        }

        let best_claim = legal
            .iter()
            .filter_map(|a| match a {
                Action::Claim(intent) => Some(*intent),
                _ => None,
            })
            .filter(|intent| intent.kind == ClaimKind::Win || view.missing_suit != Some(intent.tile.suit()))
            .max_by_key(|intent| intent.kind);
        if let Some(intent) = best_claim {
            return Action::Claim(intent);
        }

        let exchanges: Vec<[Tile; 3]> = legal
            .iter()
            .filter_map(|a| match a {
                Action::Exchange { tiles } => Some(*tiles),
                _ => None,
            })
            .collect();
        if let Some(tiles) = Self::pick_exchange(view, &exchanges) {
            return Action::Exchange { tiles };
        }

        let suits: Vec<Suit> = legal
            .iter()
            .filter_map(|a| match a {
                Action::DeclareSuit { suit } => Some(*suit),
                _ => None,
            })
            .collect();
        if let Some(&suit) = suits.iter().min_by_key(|&&s| view.hand.suit_count(s)) {
            return Action::DeclareSuit { suit };
        }

        if let Some(Action::ConcealedKong { tile }) = legal.iter().find(|a| matches!(a, Action::ConcealedKong { .. })) {
            if view.missing_suit != Some(tile.suit()) {
                return Action::ConcealedKong { tile: *tile };
            }
        }

        let discards: Vec<Tile> = legal
            .iter()
            .filter_map(|a| match a {
                Action::Discard { tile } => Some(*tile),
                _ => None,
            })
            .collect();
        if let Some(tile) = Self::pick_discard(view, &discards) {
            return Action::Discard { tile };
        }

        legal.first().copied().unwrap_or(Action::Pass)
    }
}
