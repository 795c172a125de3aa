/// 牌相关模块
///
/// 牌（Tile）、手牌（Hand）、副露（Meld）、牌堆（Deck / Wall）与拆牌（Decomposer）

pub mod tile;
pub mod hand;
pub mod meld;
pub mod wall;
pub mod decompose;

// 重新导出常用类型
pub use tile::{parse_tiles, Dragon, ParseTileError, Suit, Tile, Wind};
pub use hand::Hand;
pub use meld::{Group, Meld, MeldKind};
pub use wall::{Deck, Wall};
pub use decompose::{DecomposeStats, Decomposer, Decomposition};
