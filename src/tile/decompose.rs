use super::hand::{signature_of, Hand};
use super::meld::{Group, Meld};
use super::tile::Tile;
use crate::game::constants::{DEFAULT_DECOMPOSE_CACHE_SIZE, MAX_MELDS, NUM_TILE_TYPES, WINNING_HAND_SIZE};
use smallvec::SmallVec;
use std::collections::HashMap;
use std::sync::Arc;

/// 一种完整的拆牌结果
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize)]
pub enum Decomposition {
    /// 4 面子 + 1 雀头
    ///
    /// `groups` 来自暗手牌，`melds` 为已有的副露，两者合计 4 个面子位。
    Standard {
        pair: Tile,
        groups: SmallVec<[Group; 4]>,
        melds: SmallVec<[Meld; 4]>,
    },
    /// 七个不同的对子
    SevenPairs { pairs: SmallVec<[Tile; 7]> },
    /// 十三幺，`duplicate` 为成对的那一张
    ThirteenOrphans { duplicate: Tile },
}

impl Decomposition {
    /// 全部面子（手牌中的牌组 + 副露），特殊牌型返回空
    pub fn all_groups(&self) -> SmallVec<[Group; 4]> {
        match self {
            Decomposition::Standard { groups, melds, .. } => groups
                .iter()
                .copied()
                .chain(melds.iter().map(Meld::to_group))
                .collect(),
            _ => SmallVec::new(),
        }
    }

    /// 副露（特殊牌型没有副露）
    pub fn melds(&self) -> &[Meld] {
        match self {
            Decomposition::Standard { melds, .. } => melds,
            _ => &[],
        }
    }

    pub fn pair(&self) -> Option<Tile> {
        match self {
            Decomposition::Standard { pair, .. } => Some(*pair),
            _ => None,
        }
    }

    pub fn is_standard(&self) -> bool {
        matches!(self, Decomposition::Standard { .. })
    }
}

/// 拆牌统计（用于测试和性能观察）
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecomposeStats {
    /// 进入回溯搜索的次数
    pub searches: u64,
    /// 实际展开的搜索节点数
    pub nodes: u64,
    /// 记忆化命中次数
    pub memo_hits: u64,
    /// 特殊牌型直接命中次数
    pub special_hits: u64,
}

/// 剩余多重集的一种拆法
#[derive(Debug, Clone, Default)]
struct Partial {
    pair: Option<Tile>,
    groups: SmallVec<[Group; 4]>,
}

/// 记忆化键：剩余牌的规范签名 + 是否已选雀头
type MemoKey = (u128, bool);

/// 拆牌器
///
/// 以最小的牌为锚点递归回溯（雀头 / 刻子 / 顺子三个分支），
/// 对每个剩余多重集缓存其全部拆法。缓存跨调用保留，达到上限后整体清空。
pub struct Decomposer {
    memo: HashMap<MemoKey, Arc<Vec<Partial>>>,
    max_cache_size: usize,
    stats: DecomposeStats,
}

impl Decomposer {
    pub fn new() -> Self {
        Self::with_cache_size(DEFAULT_DECOMPOSE_CACHE_SIZE)
    }

    /// 自定义缓存上限
    pub fn with_cache_size(max_cache_size: usize) -> Self {
        Self {
            memo: HashMap::new(),
            max_cache_size: max_cache_size.max(1),
            stats: DecomposeStats::default(),
        }
    }

    pub fn stats(&self) -> DecomposeStats {
        self.stats
    }

    pub fn cache_len(&self) -> usize {
        self.memo.len()
    }

    pub fn clear_cache(&mut self) {
        self.memo.clear();
    }

    /// 列出手牌的全部拆法
    ///
    /// # 参数
    ///
    /// - `hand`: 暗手牌（应含和牌张）
    /// - `melds`: 已有副露
    ///
    /// # 返回
    ///
    /// 全部拆牌结果；不成和或牌数不满足 `暗牌 + 3 × 副露 = 14` 时为空。
    /// 七对、十三幺命中时直接返回，不进入回溯。
    pub fn decompose(&mut self, hand: &Hand, melds: &[Meld]) -> Vec<Decomposition> {
        if melds.len() > MAX_MELDS || hand.total_count() + 3 * melds.len() != WINNING_HAND_SIZE {
            return Vec::new();
        }

        if melds.is_empty() {
            if let Some(special) = seven_pairs(hand).or_else(|| thirteen_orphans(hand)) {
                self.stats.special_hits += 1;
                return vec![special];
            }
        }

        self.stats.searches += 1;
        let mut counts = *hand.counts();
        let partials = self.search(&mut counts, false);
        let melds: SmallVec<[Meld; 4]> = melds.iter().copied().collect();
        partials
            .iter()
            .filter_map(|p| {
                p.pair.map(|pair| Decomposition::Standard {
                    pair,
                    groups: p.groups.clone(),
                    melds: melds.clone(),
                })
            })
            .collect()
    }

    /// 是否成和
    pub fn is_complete(&mut self, hand: &Hand, melds: &[Meld]) -> bool {
        !self.decompose(hand, melds).is_empty()
    }

    fn search(&mut self, counts: &mut [u8; NUM_TILE_TYPES], pair_chosen: bool) -> Arc<Vec<Partial>> {
        let key = (signature_of(counts), pair_chosen);
        if let Some(hit) = self.memo.get(&key) {
            self.stats.memo_hits += 1;
            return Arc::clone(hit);
        }
        self.stats.nodes += 1;

        let mut found = Vec::new();
        match counts.iter().position(|&c| c > 0) {
            None => {
                if pair_chosen {
                    found.push(Partial::default());
                }
            }
            Some(idx) => {
                if let Some(tile) = Tile::from_index(idx) {
                    self.expand(counts, idx, tile, pair_chosen, &mut found);
                }
            }
        }

        let found = Arc::new(found);
        if self.memo.len() >= self.max_cache_size {
            self.memo.clear();
        }
        self.memo.insert(key, Arc::clone(&found));
        found
    }

    /// 以 `tile`（当前最小的牌）为锚点展开三个分支
    fn expand(
        &mut self,
        counts: &mut [u8; NUM_TILE_TYPES],
        idx: usize,
        tile: Tile,
        pair_chosen: bool,
        found: &mut Vec<Partial>,
    ) {
        // 雀头
        if !pair_chosen && counts[idx] >= 2 {
            counts[idx] -= 2;
            let rest = self.search(counts, true);
            counts[idx] += 2;
            found.extend(rest.iter().map(|p| Partial {
                pair: Some(tile),
                groups: p.groups.clone(),
            }));
        }

        // 刻子
        if counts[idx] >= 3 {
            counts[idx] -= 3;
            let rest = self.search(counts, pair_chosen);
            counts[idx] += 3;
            found.extend(rest.iter().map(|p| prepend(Group::Triplet { tile }, p)));
        }

        // 顺子（rank <= 7 保证 idx + 2 仍在同一花色内）
        if tile.is_numeral() && tile.rank() <= 7 && counts[idx + 1] > 0 && counts[idx + 2] > 0 {
            for offset in 0..3 {
                counts[idx + offset] -= 1;
            }
            let rest = self.search(counts, pair_chosen);
            for offset in 0..3 {
                counts[idx + offset] += 1;
            }
            found.extend(rest.iter().map(|p| prepend(Group::Sequence { start: tile }, p)));
        }
    }
}

impl Default for Decomposer {
    fn default() -> Self {
        Self::new()
    }
}

fn prepend(group: Group, partial: &Partial) -> Partial {
    let mut groups = SmallVec::with_capacity(partial.groups.len() + 1);
    groups.push(group);
    groups.extend(partial.groups.iter().copied());
    Partial {
        pair: partial.pair,
        groups,
    }
}

/// 七对：七个不同的对子（不接受四张拆两对）
pub fn seven_pairs(hand: &Hand) -> Option<Decomposition> {
    if hand.total_count() != WINNING_HAND_SIZE {
        return None;
    }
    let mut pairs = SmallVec::new();
    for tile in Tile::all_kinds() {
        match hand.tile_count(tile) {
            0 => {}
            2 => pairs.push(tile),
            _ => return None,
        }
    }
    (pairs.len() == 7).then_some(Decomposition::SevenPairs { pairs })
}

/// 十三幺：13 种幺九字牌各一张，其中一种成对
pub fn thirteen_orphans(hand: &Hand) -> Option<Decomposition> {
    if hand.total_count() != WINNING_HAND_SIZE {
        return None;
    }
    let mut duplicate = None;
    for tile in Tile::all_kinds() {
        let count = hand.tile_count(tile);
        if !tile.is_terminal_or_honor() {
            if count > 0 {
                return None;
            }
            continue;
        }
        match count {
            1 => {}
            2 if duplicate.is_none() => duplicate = Some(tile),
            _ => return None,
        }
    }
    duplicate.map(|duplicate| Decomposition::ThirteenOrphans { duplicate })
}
