/// 游戏逻辑模块
///
/// 包含规则变体、计分、鸣牌裁决、回合状态机与结算逻辑

pub mod constants;
pub mod player;
pub mod pattern;
pub mod scoring;
pub mod variant;
pub mod regional;
pub mod national;
pub mod config;
pub mod settlement;
pub mod pong;
pub mod kong;
pub mod chow;
pub mod exchange;
pub mod claim;
pub mod action;
pub mod state;
pub mod events;
pub mod policy;
pub mod game_engine;
