/// 麻将和牌判定与鸣牌裁决引擎
///
/// 拆牌、两种规则变体（血战到底、国标）的计分、鸣牌优先级裁决与回合状态机

pub mod tile;
pub mod game;
pub mod engine;

// 重新导出常用类型
pub use tile::{parse_tiles, Deck, Decomposer, Decomposition, Hand, Meld, MeldKind, Suit, Tile, Wall};
pub use game::action::Action;
pub use game::claim::{ClaimIntent, ClaimKind, ClaimRejection, ClaimResolver, ResolvedClaim};
pub use game::config::{EngineConfig, NationalConfig, RegionalConfig};
pub use game::events::{ChannelSink, EventSink, GameEvent, LogSink, NullSink};
pub use game::exchange::{ExchangeDirection, TileExchange};
pub use game::game_engine::{ClaimResponse, GameEngine, GameError, RoundOutcome};
pub use game::national::NationalRules;
pub use game::pattern::Pattern;
pub use game::player::Player;
pub use game::policy::{DecisionContext, FirstLegalPolicy, FnPolicy, GreedyPolicy, PlayerView, Policy, RandomPolicy};
pub use game::regional::RegionalRules;
pub use game::scoring::{Disqualification, ScoreResult};
pub use game::settlement::{Settlement, SettlementResult, WinRecord};
pub use game::state::{Phase, Snapshot};
pub use game::variant::{evaluate_win, RuleVariant, VariantKind, WinContext};
pub use engine::action_mask::ActionMask;
