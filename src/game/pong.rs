use crate::game::player::Player;
use crate::tile::{Meld, Tile};

/// 碰牌操作器
pub struct PongHandler;

impl PongHandler {
    /// 手牌中有两张相同的牌即可碰
    pub fn can_pong(player: &Player, tile: Tile) -> bool {
        player.hand.tile_count(tile) >= 2
    }

    /// 执行碰牌
    ///
    /// # 参数
    ///
    /// - `player`: 碰牌玩家
    /// - `tile`: 别人打出的牌
    /// - `from`: 出牌者座位
    ///
    /// # 返回
    ///
    /// 是否成功碰牌（失败时手牌不变）
    pub fn pong(player: &mut Player, tile: Tile, from: u8) -> bool {
        if !player.hand.remove_n(tile, 2) {
            return false;
        }
        player.melds.push(Meld::pong(tile, from));
        true
    }
}
