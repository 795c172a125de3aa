/// 引擎辅助模块
///
/// 动作掩码（合法动作生成）

pub mod action_mask;

pub use action_mask::{ActionMask, MaskInput};
