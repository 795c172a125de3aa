/// 游戏常量定义
///
/// 集中管理所有魔法数字

/// 玩家数量
pub const NUM_PLAYERS: u8 = 4;

/// 牌的种类数（27 种数牌 + 4 种风牌 + 3 种箭牌）
pub const NUM_TILE_TYPES: usize = 34;

/// 每种牌的数量
pub const COPIES_PER_TILE: u8 = 4;

/// 血战到底牌数（仅数牌）
pub const REGIONAL_TILE_COUNT: usize = 108;

/// 国标麻将牌数
pub const NATIONAL_TILE_COUNT: usize = 136;

/// 起手牌数
pub const INITIAL_HAND_SIZE: usize = 13;

/// 和牌时的有效牌数（暗牌 + 3 × 副露）
pub const WINNING_HAND_SIZE: usize = 14;

/// 面子位数
pub const MAX_MELDS: usize = 4;

/// 拆牌记忆化缓存默认上限
pub const DEFAULT_DECOMPOSE_CACHE_SIZE: usize = 4096;

/// 最大回合数限制（防止策略出错时无限循环）
pub const MAX_TURNS: u32 = 500;

/// 策略给出非法动作时的默认重试次数
pub const DEFAULT_POLICY_RETRIES: u8 = 3;
