use crate::game::constants::NUM_PLAYERS;
use crate::game::player::Player;
use crate::tile::{Suit, Tile};
use rand::Rng;

/// 换三张的方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ExchangeDirection {
    /// 换给下家
    Clockwise,
    /// 换给上家
    CounterClockwise,
}

impl ExchangeDirection {
    /// 随机选一个方向
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        if rng.gen_bool(0.5) {
            ExchangeDirection::Clockwise
        } else {
            ExchangeDirection::CounterClockwise
        }
    }

    /// `seat` 换出的三张交给哪个座位
    pub fn target(self, seat: u8) -> u8 {
        match self {
            ExchangeDirection::Clockwise => (seat + 1) % NUM_PLAYERS,
            ExchangeDirection::CounterClockwise => (seat + NUM_PLAYERS - 1) % NUM_PLAYERS,
        }
    }
}

/// 是否换三张
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub enum TileExchange {
    /// 不换，发牌后直接定缺
    Off,
    /// 每局随机方向
    #[default]
    Random,
    /// 固定方向
    Fixed(ExchangeDirection),
}

/// 换三张操作器
pub struct ExchangeHandler;

impl ExchangeHandler {
    /// 三张是否同一门数牌
    pub fn is_same_suit(tiles: &[Tile; 3]) -> bool {
        let suit = tiles[0].suit();
        suit.is_numeral() && tiles.iter().all(|t| t.suit() == suit)
    }

    /// 手里缺的那张牌（同一张选了多次时按张数计）
    ///
    /// # 返回
    ///
    /// 三张都在手里时为 `None`
    pub fn missing_tile(player: &Player, tiles: &[Tile; 3]) -> Option<Tile> {
        tiles.iter().copied().find(|&tile| {
            let wanted = tiles.iter().filter(|&&t| t == tile).count();
            (player.hand.tile_count(tile) as usize) < wanted
        })
    }

    /// 某玩家所有可换出的组合，每种组合按牌序排好
    pub fn options(player: &Player) -> Vec<[Tile; 3]> {
        let mut options = Vec::new();
        for suit in Suit::numerals() {
            let kinds: Vec<(Tile, u8)> = player
                .hand
                .distinct_tiles()
                .into_iter()
                .filter(|t| t.suit() == suit)
                .map(|t| (t, player.hand.tile_count(t)))
                .collect();

            for i in 0..kinds.len() {
                for j in i..kinds.len() {
                    for k in j..kinds.len() {
                        let picked = [i, j, k];
                        let enough = picked.iter().all(|&idx| {
                            let n = picked.iter().filter(|&&x| x == idx).count();
                            usize::from(kinds[idx].1) >= n
                        });
                        if enough {
                            options.push([kinds[i].0, kinds[j].0, kinds[k].0]);
                        }
                    }
                }
            }
        }
        options
    }

    /// 按方向交换各家选出的牌
    ///
    /// # 参数
    ///
    /// - `players`: 全部座位
    /// - `picks`: 每个座位换出的三张，下标为座位
    /// - `direction`: 交换方向
    ///
    /// # 返回
    ///
    /// 是否成功（失败时各家手牌不变）
    pub fn execute(players: &mut [Player], picks: &[[Tile; 3]], direction: ExchangeDirection) -> bool {
        if players.len() != picks.len() {
            return false;
        }
        let mut next = players.to_vec();
        for (player, pick) in next.iter_mut().zip(picks) {
            if !pick.iter().all(|&t| player.hand.remove_tile(t)) {
                return false;
            }
        }
        for (seat, pick) in picks.iter().enumerate() {
            let Some(target) = next.get_mut(direction.target(seat as u8) as usize) else {
                return false;
            };
            if !pick.iter().all(|&t| target.hand.add_tile(t)) {
                return false;
            }
        }
        players.clone_from_slice(&next);
        true
    }
}
