use super::tile::{Suit, Tile};
use crate::game::constants::COPIES_PER_TILE;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{thread_rng, SeedableRng};

/// 牌堆接口
///
/// 引擎只通过这个接口取牌，不关心牌堆如何生成或洗牌。
pub trait Deck {
    /// 抽取一张牌，牌堆已空时返回 `None`
    fn draw(&mut self) -> Option<Tile>;

    /// 剩余牌数
    fn remaining_count(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.remaining_count() == 0
    }
}

/// 牌墙
///
/// 从末尾抽牌，`Box<[Tile]>` 固定大小。
#[derive(Debug, Clone)]
pub struct Wall {
    tiles: Box<[Tile]>,
    /// 已抽取的牌数
    drawn_count: usize,
}

impl Wall {
    /// 按给定牌集合创建牌墙（不洗牌）
    pub fn from_tiles(tiles: Vec<Tile>) -> Self {
        Self {
            tiles: tiles.into_boxed_slice(),
            drawn_count: 0,
        }
    }

    /// 按给定顺序抽牌的牌墙：第一张最先被抽出
    pub fn from_sequence(sequence: Vec<Tile>) -> Self {
        let mut tiles = sequence;
        tiles.reverse();
        Self::from_tiles(tiles)
    }

    /// 血战到底的 108 张牌（三门数牌各 4 张）
    pub fn regional() -> Self {
        Self::from_tiles(tile_set(false))
    }

    /// 国标麻将的 136 张牌（含风牌与箭牌）
    pub fn national() -> Self {
        Self::from_tiles(tile_set(true))
    }

    /// 洗牌（Fisher-Yates）
    pub fn shuffle(&mut self) {
        self.tiles.shuffle(&mut thread_rng());
        self.drawn_count = 0;
    }

    /// 用固定种子洗牌，结果可复现
    pub fn shuffle_with_seed(&mut self, seed: u64) {
        let mut rng = StdRng::seed_from_u64(seed);
        self.tiles.shuffle(&mut rng);
        self.drawn_count = 0;
    }

    pub fn drawn_count(&self) -> usize {
        self.drawn_count
    }

    pub fn total_count(&self) -> usize {
        self.tiles.len()
    }
}

impl Deck for Wall {
    fn draw(&mut self) -> Option<Tile> {
        if self.drawn_count >= self.tiles.len() {
            return None;
        }
        let index = self.tiles.len() - 1 - self.drawn_count;
        self.drawn_count += 1;
        Some(self.tiles[index])
    }

    fn remaining_count(&self) -> usize {
        self.tiles.len().saturating_sub(self.drawn_count)
    }
}

/// 生成一副完整牌：每种 4 张
///
/// - `with_honors = false`：108 张
/// - `with_honors = true`：136 张
pub fn tile_set(with_honors: bool) -> Vec<Tile> {
    let mut tiles = Vec::with_capacity(if with_honors { 136 } else { 108 });
    for tile in Tile::all_kinds() {
        if tile.suit().is_numeral() || with_honors {
            for _ in 0..COPIES_PER_TILE {
                tiles.push(tile);
            }
        }
    }
    tiles
}

/// 某花色在牌集合中的张数
pub fn count_suit(tiles: &[Tile], suit: Suit) -> usize {
    tiles.iter().filter(|t| t.suit() == suit).count()
}
