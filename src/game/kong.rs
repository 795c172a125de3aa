use crate::game::player::Player;
use crate::tile::{Meld, MeldKind, Tile};
use smallvec::SmallVec;

/// 杠类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum KongType {
    /// 直杠（别人打出的牌，你杠）
    Direct,
    /// 加杠/补杠（你已经碰了三张，摸到第四张补杠）
    Added,
    /// 暗杠（手牌中有四张相同的牌，自己杠）
    Concealed,
}

/// 杠操作器
pub struct KongHandler;

impl KongHandler {
    /// 加杠：已有该牌的碰，且手中有第四张
    pub fn can_add_kong(player: &Player, tile: Tile) -> bool {
        player.has_pong(tile) && player.hand.has_tile(tile)
    }

    /// 直杠：手中有三张，别人打出第四张
    pub fn can_direct_kong(player: &Player, tile: Tile) -> bool {
        player.hand.tile_count(tile) >= 3
    }

    /// 暗杠：手中有四张
    pub fn can_concealed_kong(player: &Player, tile: Tile) -> bool {
        player.hand.tile_count(tile) == 4
    }

    /// 所有可以暗杠的牌
    pub fn concealed_kong_candidates(player: &Player) -> SmallVec<[Tile; 3]> {
        player
            .hand
            .distinct_tiles()
            .into_iter()
            .filter(|&t| Self::can_concealed_kong(player, t))
            .collect()
    }

    /// 所有可以加杠的牌
    pub fn added_kong_candidates(player: &Player) -> SmallVec<[Tile; 4]> {
        player
            .melds
            .iter()
            .filter(|m| m.kind == MeldKind::Pong && player.hand.has_tile(m.tile))
            .map(|m| m.tile)
            .collect()
    }

    /// 执行加杠，碰转为明杠并保留来源座位
    pub fn add_kong(player: &mut Player, tile: Tile) -> bool {
        if !Self::can_add_kong(player, tile) {
            return false;
        }
        let Some(meld) = player
            .melds
            .iter_mut()
            .find(|m| m.kind == MeldKind::Pong && m.tile == tile)
        else {
            return false;
        };
        meld.kind = MeldKind::Kong;
        player.hand.remove_tile(tile)
    }

    /// 执行直杠
    pub fn direct_kong(player: &mut Player, tile: Tile, from: u8) -> bool {
        if !player.hand.remove_n(tile, 3) {
            return false;
        }
        player.melds.push(Meld::exposed_kong(tile, from));
        true
    }

    /// 执行暗杠
    pub fn concealed_kong(player: &mut Player, tile: Tile) -> bool {
        if !Self::can_concealed_kong(player, tile) || !player.hand.remove_n(tile, 4) {
            return false;
        }
        player.melds.push(Meld::concealed_kong(tile));
        true
    }
}
