use std::fmt;
use std::str::FromStr;

use crate::game::constants::NUM_TILE_TYPES;

/// 麻将牌
///
/// 数牌三门（万、筒、条，各 1-9），字牌两类（风牌 4 种、箭牌 3 种），共 34 种。
/// 派生的 `Ord` 与 [`Tile::to_index`] 的顺序一致：万 < 筒 < 条 < 风 < 箭。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub enum Tile {
    /// 万子（1-9）
    Wan(u8),
    /// 筒子（1-9）
    Tong(u8),
    /// 条子（1-9）
    Tiao(u8),
    /// 风牌
    Wind(Wind),
    /// 箭牌
    Dragon(Dragon),
}

/// 风牌
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub enum Wind {
    East = 0,
    South = 1,
    West = 2,
    North = 3,
}

/// 箭牌（中、发、白）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub enum Dragon {
    Red = 0,
    Green = 1,
    White = 2,
}

impl Wind {
    pub fn all() -> [Wind; 4] {
        [Wind::East, Wind::South, Wind::West, Wind::North]
    }
}

impl Dragon {
    pub fn all() -> [Dragon; 3] {
        [Dragon::Red, Dragon::Green, Dragon::White]
    }
}

/// 花色
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub enum Suit {
    Wan = 0,
    Tong = 1,
    Tiao = 2,
    Wind = 3,
    Dragon = 4,
}

impl Suit {
    /// 三门数牌花色（定缺只能选这三种）
    pub fn numerals() -> [Suit; 3] {
        [Suit::Wan, Suit::Tong, Suit::Tiao]
    }

    /// 是否为数牌花色
    pub fn is_numeral(self) -> bool {
        matches!(self, Suit::Wan | Suit::Tong | Suit::Tiao)
    }

    /// 该花色在 34 种牌索引中的起始位置
    pub fn base_index(self) -> usize {
        match self {
            Suit::Wan => 0,
            Suit::Tong => 9,
            Suit::Tiao => 18,
            Suit::Wind => 27,
            Suit::Dragon => 31,
        }
    }

    /// 该花色的牌种数
    pub fn kinds(self) -> usize {
        match self {
            Suit::Wan | Suit::Tong | Suit::Tiao => 9,
            Suit::Wind => 4,
            Suit::Dragon => 3,
        }
    }
}

impl Tile {
    pub const MIN_RANK: u8 = 1;
    pub const MAX_RANK: u8 = 9;

    /// 创建一张牌，验证输入有效性
    ///
    /// 字牌的 rank 为 1 起的序号：风牌 1-4（东南西北），箭牌 1-3（中发白）。
    pub fn new(suit: Suit, rank: u8) -> Option<Self> {
        if rank < Self::MIN_RANK || rank as usize > suit.kinds() {
            return None;
        }
        Some(match suit {
            Suit::Wan => Tile::Wan(rank),
            Suit::Tong => Tile::Tong(rank),
            Suit::Tiao => Tile::Tiao(rank),
            Suit::Wind => Tile::Wind(Wind::all()[(rank - 1) as usize]),
            Suit::Dragon => Tile::Dragon(Dragon::all()[(rank - 1) as usize]),
        })
    }

    /// 获取花色
    pub fn suit(&self) -> Suit {
        match self {
            Tile::Wan(_) => Suit::Wan,
            Tile::Tong(_) => Suit::Tong,
            Tile::Tiao(_) => Suit::Tiao,
            Tile::Wind(_) => Suit::Wind,
            Tile::Dragon(_) => Suit::Dragon,
        }
    }

    /// 获取点数（数牌 1-9，字牌为序号）
    pub fn rank(&self) -> u8 {
        match self {
            Tile::Wan(r) | Tile::Tong(r) | Tile::Tiao(r) => *r,
            Tile::Wind(w) => *w as u8 + 1,
            Tile::Dragon(d) => *d as u8 + 1,
        }
    }

    /// 转换为 0-33 的种类索引
    ///
    /// - 万：0-8
    /// - 筒：9-17
    /// - 条：18-26
    /// - 风：27-30
    /// - 箭：31-33
    pub fn to_index(&self) -> usize {
        self.suit().base_index() + (self.rank() - 1) as usize
    }

    /// 从 0-33 的种类索引创建牌
    pub fn from_index(index: usize) -> Option<Self> {
        if index >= NUM_TILE_TYPES {
            return None;
        }
        let suit = match index {
            0..=8 => Suit::Wan,
            9..=17 => Suit::Tong,
            18..=26 => Suit::Tiao,
            27..=30 => Suit::Wind,
            _ => Suit::Dragon,
        };
        Tile::new(suit, (index - suit.base_index()) as u8 + 1)
    }

    /// 全部 34 种牌，按索引顺序
    pub fn all_kinds() -> impl Iterator<Item = Tile> {
        (0..NUM_TILE_TYPES).filter_map(Tile::from_index)
    }

    pub fn is_numeral(&self) -> bool {
        self.suit().is_numeral()
    }

    pub fn is_honor(&self) -> bool {
        !self.is_numeral()
    }

    /// 幺九（数牌的 1 和 9）
    pub fn is_terminal(&self) -> bool {
        self.is_numeral() && (self.rank() == 1 || self.rank() == 9)
    }

    /// 幺九牌或字牌
    pub fn is_terminal_or_honor(&self) -> bool {
        self.is_terminal() || self.is_honor()
    }

    /// 同花色下一张数牌（9 和字牌没有下一张）
    pub fn next(&self) -> Option<Tile> {
        if self.is_numeral() && self.rank() < Self::MAX_RANK {
            Tile::new(self.suit(), self.rank() + 1)
        } else {
            None
        }
    }

    /// 检查是否可以组成顺子（同一门数牌的连续三张）
    pub fn can_form_sequence(&self, other1: &Tile, other2: &Tile) -> bool {
        if !self.is_numeral() || self.suit() != other1.suit() || self.suit() != other2.suit() {
            return false;
        }
        let mut ranks = [self.rank(), other1.rank(), other2.rank()];
        ranks.sort_unstable();
        ranks[0] + 1 == ranks[1] && ranks[1] + 1 == ranks[2]
    }
}

impl fmt::Display for Tile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tile::Wan(r) => write!(f, "{}m", r),
            Tile::Tong(r) => write!(f, "{}p", r),
            Tile::Tiao(r) => write!(f, "{}s", r),
            Tile::Wind(_) | Tile::Dragon(_) => write!(f, "{}z", self.to_index() - 26),
        }
    }
}

/// 牌串解析错误
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseTileError {
    #[error("unexpected character '{0}' in tile string")]
    UnexpectedChar(char),
    #[error("digits without a suit suffix in tile string")]
    MissingSuffix,
    #[error("rank {rank} out of range for suffix '{suffix}'")]
    RankOutOfRange { rank: u8, suffix: char },
}

/// 解析紧凑牌串，例如 `"1112345678999m5p"`、`"11z55z"`
///
/// 后缀 `m`/`p`/`s` 对应万/筒/条；`z` 的 1-4 为东南西北，5-7 为中发白。
/// 空白被忽略。
pub fn parse_tiles(s: &str) -> Result<Vec<Tile>, ParseTileError> {
    let mut tiles = Vec::new();
    let mut pending: Vec<u8> = Vec::new();
    for c in s.chars() {
        if c.is_whitespace() {
            continue;
        }
        if let Some(d) = c.to_digit(10) {
            pending.push(d as u8);
            continue;
        }
        if pending.is_empty() {
            return Err(ParseTileError::UnexpectedChar(c));
        }
        for rank in pending.drain(..) {
            let tile = match c {
                'm' => Tile::new(Suit::Wan, rank),
                'p' => Tile::new(Suit::Tong, rank),
                's' => Tile::new(Suit::Tiao, rank),
                'z' if (1..=4).contains(&rank) => Tile::new(Suit::Wind, rank),
                'z' if (5..=7).contains(&rank) => Tile::new(Suit::Dragon, rank - 4),
                'z' => None,
                other => return Err(ParseTileError::UnexpectedChar(other)),
            };
            tiles.push(tile.ok_or(ParseTileError::RankOutOfRange { rank, suffix: c })?);
        }
    }
    if !pending.is_empty() {
        return Err(ParseTileError::MissingSuffix);
    }
    Ok(tiles)
}

impl FromStr for Tile {
    type Err = ParseTileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut tiles = parse_tiles(s)?;
        match (tiles.pop(), tiles.is_empty()) {
            (Some(tile), true) => Ok(tile),
            _ => Err(ParseTileError::MissingSuffix),
        }
    }
}
