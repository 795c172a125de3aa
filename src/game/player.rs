use crate::game::constants::NUM_TILE_TYPES;
use crate::tile::{Hand, Meld, MeldKind, Suit, Tile};

/// 玩家手牌：暗牌 + 副露
///
/// 决策点上满足 `暗牌 + 3 × 副露 ∈ {13, 14}`（杠占一个面子位）。
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Player {
    /// 座位号（0-3）
    pub id: u8,
    /// 暗手牌
    pub hand: Hand,
    /// 已碰/杠/吃的牌组，按形成顺序
    pub melds: Vec<Meld>,
}

impl Player {
    pub fn new(id: u8) -> Self {
        Self {
            id,
            hand: Hand::new(),
            melds: Vec::new(),
        }
    }

    /// 用于测试和复盘：直接指定暗牌与副露
    pub fn with_tiles(id: u8, hand: Hand, melds: Vec<Meld>) -> Self {
        Self { id, hand, melds }
    }

    /// 有效牌数：暗牌 + 3 × 副露
    pub fn effective_count(&self) -> usize {
        self.hand.total_count() + 3 * self.melds.len()
    }

    /// 暗牌与副露中是否有某花色的牌
    pub fn holds_suit(&self, suit: Suit) -> bool {
        self.hand.suit_count(suit) > 0 || self.melds.iter().any(|m| m.tile.suit() == suit)
    }

    /// 暗牌 + 副露的全部牌计数
    pub fn all_tile_counts(&self) -> [u8; NUM_TILE_TYPES] {
        let mut counts = *self.hand.counts();
        for meld in &self.melds {
            for tile in meld.tiles() {
                counts[tile.to_index()] += 1;
            }
        }
        counts
    }

    /// 杠的数量（明杠 + 暗杠）
    pub fn kong_count(&self) -> usize {
        self.melds.iter().filter(|m| m.is_kong()).count()
    }

    /// 门前清：没有明副露（暗杠不破门清）
    pub fn is_concealed(&self) -> bool {
        self.melds.iter().all(|m| m.concealed)
    }

    /// 是否有某张牌的碰
    pub fn has_pong(&self, tile: Tile) -> bool {
        self.melds
            .iter()
            .any(|m| m.kind == MeldKind::Pong && m.tile == tile)
    }
}
