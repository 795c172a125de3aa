use crate::game::pattern::{Pattern, PatternMatch};
use crate::tile::Suit;

/// 不能和牌的原因
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, thiserror::Error)]
pub enum Disqualification {
    #[error("hand does not decompose into a complete shape")]
    Incomplete,
    #[error("no missing suit declared")]
    MissingSuitUndeclared,
    #[error("still holding tiles of the missing suit {0:?}")]
    MissingSuitHeld(Suit),
    #[error("{points} points is below the minimum of {floor}")]
    BelowMinimumPoints { points: u32, floor: u32 },
}

/// 计分结果
#[derive(Debug, Clone, PartialEq, Eq, Default, serde::Serialize)]
pub struct ScoreResult {
    /// 命中的番种
    pub matched: Vec<PatternMatch>,
    /// 总分（血战为番数，已封顶；国标为番数之和）
    pub total: u32,
    /// 取得该分数的拆法下标
    pub decomposition: Option<usize>,
    /// 不能和牌时的原因
    pub disqualification: Option<Disqualification>,
}

impl ScoreResult {
    pub fn disqualified(reason: Disqualification) -> Self {
        Self {
            disqualification: Some(reason),
            ..Self::default()
        }
    }

    pub fn is_qualified(&self) -> bool {
        self.disqualification.is_none()
    }

    pub fn has_pattern(&self, pattern: Pattern) -> bool {
        self.matched.iter().any(|m| m.pattern == pattern)
    }

    /// 番种分值之和
    ///
    /// 分值均非负，所以向命中集合里加入番种不会使总和下降。
    pub fn sum_points(matched: &[PatternMatch]) -> u32 {
        matched.iter().map(PatternMatch::value).fold(0, u32::saturating_add)
    }

    /// 从多个候选中取总分最高的一个，分数相同时取靠前者
    pub fn best_of(candidates: impl IntoIterator<Item = ScoreResult>) -> Option<ScoreResult> {
        candidates.into_iter().fold(None, |best, candidate| match best {
            Some(b) if b.total >= candidate.total => Some(b),
            _ => Some(candidate),
        })
    }
}
