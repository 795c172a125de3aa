use super::tile::Tile;
use smallvec::SmallVec;

/// 副露类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum MeldKind {
    /// 吃（顺子）
    Chow,
    /// 碰（刻子）
    Pong,
    /// 杠（四张）
    Kong,
}

/// 已亮出或已声明的副露
///
/// 每个副露（包括杠）占一个面子位。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Meld {
    pub kind: MeldKind,
    /// 刻/杠为该牌，顺子为最小的一张
    pub tile: Tile,
    /// 暗杠为 true
    pub concealed: bool,
    /// 来源座位（由他人打出的牌组成时）
    pub claimed_from: Option<u8>,
}

impl Meld {
    /// 吃：`start` 为顺子最小的一张
    pub fn chow(start: Tile, claimed_from: u8) -> Self {
        Self {
            kind: MeldKind::Chow,
            tile: start,
            concealed: false,
            claimed_from: Some(claimed_from),
        }
    }

    pub fn pong(tile: Tile, claimed_from: u8) -> Self {
        Self {
            kind: MeldKind::Pong,
            tile,
            concealed: false,
            claimed_from: Some(claimed_from),
        }
    }

    /// 明杠（直杠）
    pub fn exposed_kong(tile: Tile, claimed_from: u8) -> Self {
        Self {
            kind: MeldKind::Kong,
            tile,
            concealed: false,
            claimed_from: Some(claimed_from),
        }
    }

    /// 暗杠
    pub fn concealed_kong(tile: Tile) -> Self {
        Self {
            kind: MeldKind::Kong,
            tile,
            concealed: true,
            claimed_from: None,
        }
    }

    pub fn is_kong(&self) -> bool {
        self.kind == MeldKind::Kong
    }

    /// 副露包含的所有牌
    pub fn tiles(&self) -> SmallVec<[Tile; 4]> {
        self.to_group().tiles()
    }

    /// 实际占用的牌数（杠为 4）
    pub fn tile_count(&self) -> usize {
        if self.is_kong() {
            4
        } else {
            3
        }
    }

    /// 转换为拆牌中的牌组
    pub fn to_group(&self) -> Group {
        match self.kind {
            MeldKind::Chow => Group::Sequence { start: self.tile },
            MeldKind::Pong => Group::Triplet { tile: self.tile },
            MeldKind::Kong => Group::Kong { tile: self.tile },
        }
    }
}

/// 牌组（顺子、刻子或杠）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Group {
    /// 顺子，`start` 为最小的一张
    Sequence { start: Tile },
    /// 刻子
    Triplet { tile: Tile },
    /// 杠
    Kong { tile: Tile },
}

impl Group {
    pub fn tiles(&self) -> SmallVec<[Tile; 4]> {
        let mut tiles = SmallVec::new();
        match *self {
            Group::Sequence { start } => {
                let mut current = Some(start);
                for _ in 0..3 {
                    if let Some(tile) = current {
                        tiles.push(tile);
                        current = tile.next();
                    }
                }
            }
            Group::Triplet { tile } => tiles.extend([tile; 3]),
            Group::Kong { tile } => tiles.extend([tile; 4]),
        }
        tiles
    }

    /// 代表牌（顺子为首张）
    pub fn tile(&self) -> Tile {
        match *self {
            Group::Sequence { start } => start,
            Group::Triplet { tile } | Group::Kong { tile } => tile,
        }
    }

    /// 刻子或杠
    pub fn is_triplet_like(&self) -> bool {
        !matches!(self, Group::Sequence { .. })
    }

    pub fn contains_terminal_or_honor(&self) -> bool {
        self.tiles().iter().any(|t| t.is_terminal_or_honor())
    }
}
