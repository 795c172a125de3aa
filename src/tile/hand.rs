use super::tile::{parse_tiles, ParseTileError, Suit, Tile};
use crate::game::constants::{COPIES_PER_TILE, NUM_TILE_TYPES};
use smallvec::SmallVec;

/// 暗手牌（不含已亮出的副露）
///
/// 以 34 种牌的计数数组存储，添加、移除、查询均为 O(1)，
/// 并可导出规范签名供拆牌记忆化使用。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Hand {
    /// 每种牌的数量（0-4），按 [`Tile::to_index`] 索引
    counts: [u8; NUM_TILE_TYPES],
    total_count: usize,
}

impl Hand {
    /// 创建空手牌
    pub fn new() -> Self {
        Self {
            counts: [0; NUM_TILE_TYPES],
            total_count: 0,
        }
    }

    /// 从牌列表创建手牌，超过 4 张的部分被忽略
    pub fn from_tiles(tiles: &[Tile]) -> Self {
        let mut hand = Self::new();
        for &tile in tiles {
            hand.add_tile(tile);
        }
        hand
    }

    /// 从紧凑牌串创建手牌，例如 `"1112345678999m"`
    pub fn parse(s: &str) -> Result<Self, ParseTileError> {
        Ok(Self::from_tiles(&parse_tiles(s)?))
    }

    /// 添加一张牌
    ///
    /// # 返回
    ///
    /// - `true`：成功添加
    /// - `false`：该牌已有 4 张
    pub fn add_tile(&mut self, tile: Tile) -> bool {
        let count = &mut self.counts[tile.to_index()];
        if *count >= COPIES_PER_TILE {
            return false;
        }
        *count += 1;
        self.total_count += 1;
        true
    }

    /// 移除一张牌
    ///
    /// # 返回
    ///
    /// - `true`：成功移除
    /// - `false`：手牌中没有该牌
    pub fn remove_tile(&mut self, tile: Tile) -> bool {
        let count = &mut self.counts[tile.to_index()];
        if *count == 0 {
            return false;
        }
        *count -= 1;
        self.total_count -= 1;
        true
    }

    /// 移除 n 张同种牌；不足 n 张时不做任何修改
    pub fn remove_n(&mut self, tile: Tile, n: u8) -> bool {
        let count = &mut self.counts[tile.to_index()];
        if *count < n {
            return false;
        }
        *count -= n;
        self.total_count -= n as usize;
        true
    }

    pub fn has_tile(&self, tile: Tile) -> bool {
        self.tile_count(tile) > 0
    }

    /// 查询某张牌的数量
    pub fn tile_count(&self, tile: Tile) -> u8 {
        self.counts[tile.to_index()]
    }

    /// 获取总牌数
    pub fn total_count(&self) -> usize {
        self.total_count
    }

    /// 某花色的牌数
    pub fn suit_count(&self, suit: Suit) -> usize {
        let base = suit.base_index();
        self.counts[base..base + suit.kinds()]
            .iter()
            .map(|&c| c as usize)
            .sum()
    }

    /// 计数数组视图
    pub fn counts(&self) -> &[u8; NUM_TILE_TYPES] {
        &self.counts
    }

    /// 规范签名：每种牌 3 位，共 102 位，打包进 u128
    ///
    /// 相同多重集的手牌签名相同。
    pub fn signature(&self) -> u128 {
        signature_of(&self.counts)
    }

    /// 转换为排序后的牌向量（万、筒、条、风、箭，各自按点数）
    pub fn to_sorted_vec(&self) -> Vec<Tile> {
        let mut result = Vec::with_capacity(self.total_count);
        for tile in Tile::all_kinds() {
            for _ in 0..self.tile_count(tile) {
                result.push(tile);
            }
        }
        result
    }

    pub fn is_empty(&self) -> bool {
        self.total_count == 0
    }

    /// 清空手牌
    pub fn clear(&mut self) {
        self.counts = [0; NUM_TILE_TYPES];
        self.total_count = 0;
    }

    /// 所有不同的牌种（按索引顺序）
    pub fn distinct_tiles(&self) -> SmallVec<[Tile; 14]> {
        Tile::all_kinds()
            .filter(|&t| self.tile_count(t) > 0)
            .collect()
    }
}

impl Default for Hand {
    fn default() -> Self {
        Self::new()
    }
}

/// 计数数组的规范签名
pub(crate) fn signature_of(counts: &[u8; NUM_TILE_TYPES]) -> u128 {
    counts
        .iter()
        .fold(0u128, |acc, &c| (acc << 3) | (c as u128 & 0b111))
}
