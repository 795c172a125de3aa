use crate::game::player::Player;
use crate::tile::{Meld, Tile};
use smallvec::SmallVec;

/// 吃牌操作器
pub struct ChowHandler;

impl ChowHandler {
    /// 包含 `tile` 的顺子中，其余两张都在手里的那些
    ///
    /// # 返回
    ///
    /// 各顺子最小的一张（最多 3 种）
    pub fn chow_options(player: &Player, tile: Tile) -> SmallVec<[Tile; 3]> {
        let mut options = SmallVec::new();
        if !tile.is_numeral() {
            return options;
        }
        let rank = tile.rank();
        for start_rank in rank.saturating_sub(2).max(1)..=rank.min(7) {
            if let Some(start) = Tile::new(tile.suit(), start_rank) {
                if Self::can_chow(player, tile, start) {
                    options.push(start);
                }
            }
        }
        options
    }

    /// 以 `start` 开头的顺子能否吃 `tile`
    pub fn can_chow(player: &Player, tile: Tile, start: Tile) -> bool {
        if !start.is_numeral() || start.suit() != tile.suit() || start.rank() > 7 {
            return false;
        }
        if tile.rank() < start.rank() || tile.rank() > start.rank() + 2 {
            return false;
        }
        Meld::chow(start, 0)
            .tiles()
            .into_iter()
            .filter(|&t| t != tile)
            .all(|t| player.hand.has_tile(t))
    }

    /// 执行吃牌
    pub fn chow(player: &mut Player, tile: Tile, start: Tile, from: u8) -> bool {
        if !Self::can_chow(player, tile, start) {
            return false;
        }
        for t in Meld::chow(start, from).tiles() {
            if t != tile {
                player.hand.remove_tile(t);
            }
        }
        player.melds.push(Meld::chow(start, from));
        true
    }
}
