use crate::game::claim::ClaimIntent;
use crate::tile::{Suit, Tile};

/// 动作类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Action {
    /// 换三张（同一门的三张）
    Exchange { tiles: [Tile; 3] },
    /// 定缺（血战，三门数牌选一门）
    DeclareSuit { suit: Suit },
    /// 摸牌
    Draw,
    /// 出牌
    Discard { tile: Tile },
    /// 自摸和
    SelfWin,
    /// 暗杠
    ConcealedKong { tile: Tile },
    /// 加杠
    AddedKong { tile: Tile },
    /// 对别人打出的牌（或加杠的牌）鸣牌
    Claim(ClaimIntent),
    /// 过（放弃）
    Pass,
}

impl Action {
    /// 动作名，用于错误信息
    pub fn name(&self) -> &'static str {
        match self {
            Action::Exchange { .. } => "exchange_tiles",
            Action::DeclareSuit { .. } => "declare_suit",
            Action::Draw => "draw",
            Action::Discard { .. } => "discard",
            Action::SelfWin => "self_win",
            Action::ConcealedKong { .. } => "concealed_kong",
            Action::AddedKong { .. } => "added_kong",
            Action::Claim(_) => "claim",
            Action::Pass => "pass",
        }
    }

    pub fn is_claim(&self) -> bool {
        matches!(self, Action::Claim(_))
    }
}
