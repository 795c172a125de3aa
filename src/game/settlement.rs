use crate::game::constants::NUM_PLAYERS;
use crate::game::scoring::ScoreResult;
use crate::tile::Tile;
use std::collections::HashMap;

/// 和牌记录
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct WinRecord {
    pub winner: u8,
    /// 放铳者（自摸为 `None`）
    pub discarder: Option<u8>,
    pub tile: Tile,
    pub score: ScoreResult,
    /// 第几回合和牌
    pub turn: u32,
}

impl WinRecord {
    pub fn is_self_drawn(&self) -> bool {
        self.discarder.is_none()
    }
}

/// 结算结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettlementResult {
    /// 玩家 ID -> 结算金额（正数表示收入，负数表示支出）
    pub payments: HashMap<u8, i32>,
    /// 结算说明
    pub description: String,
}

impl SettlementResult {
    /// 收支之和（应为 0）
    pub fn net(&self) -> i64 {
        self.payments.values().map(|&v| i64::from(v)).sum()
    }

    /// 累加到各家总分
    pub fn apply_to(&self, totals: &mut [i32; NUM_PLAYERS as usize]) {
        for (&seat, &amount) in &self.payments {
            if let Some(total) = totals.get_mut(seat as usize) {
                *total = total.saturating_add(amount);
            }
        }
    }
}

/// 和牌结算器
pub struct Settlement;

impl Settlement {
    /// 血战到底结算
    ///
    /// 底分 1（自摸加 1），乘以 2^番数。
    /// 自摸时所有未和的在局玩家各付一份；点和时只由放铳者付。
    ///
    /// # 参数
    ///
    /// - `win`: 和牌记录
    /// - `payers`: 仍在局中的其他座位
    pub fn regional(win: &WinRecord, payers: &[u8]) -> SettlementResult {
        let base: i32 = if win.is_self_drawn() { 2 } else { 1 };
        let mut amount = base.saturating_mul(1i32 << win.score.total.min(30));
        let mut payments = HashMap::new();

        match win.discarder {
            Some(discarder) => {
                payments.insert(discarder, -amount);
                payments.insert(win.winner, amount);
            }
            None => {
                let others: Vec<u8> = payers.iter().copied().filter(|&s| s != win.winner).collect();
                let n = others.len().max(1) as i32;
                // 收入不能超过 i32 上限，每家的份额随之封顶
                amount = amount.min(i32::MAX / n);
                for &seat in &others {
                    payments.insert(seat, -amount);
                }
                payments.insert(win.winner, amount.saturating_mul(others.len() as i32));
            }
        }

        SettlementResult {
            payments,
            description: format!(
                "玩家 {} {}，{} 番，每家 {} 分",
                win.winner,
                if win.is_self_drawn() { "自摸" } else { "点和" },
                win.score.total,
                amount
            ),
        }
    }

    /// 国标结算
    ///
    /// 点和时放铳者付全部番数；自摸时其余在局玩家平分，余数由座位靠前者补足。
    pub fn national(win: &WinRecord, payers: &[u8]) -> SettlementResult {
        let total = i32::try_from(win.score.total).unwrap_or(i32::MAX);
        let mut payments = HashMap::new();

        match win.discarder {
            Some(discarder) => {
                payments.insert(discarder, -total);
            }
            None => {
                let others: Vec<u8> = payers.iter().copied().filter(|&s| s != win.winner).collect();
                if !others.is_empty() {
                    let n = others.len() as i32;
                    let share = total / n;
                    let remainder = total % n;
                    for (i, &seat) in others.iter().enumerate() {
                        let extra = if (i as i32) < remainder { 1 } else { 0 };
                        payments.insert(seat, -(share + extra));
                    }
                }
            }
        }
        let income: i32 = -payments.values().sum::<i32>();
        payments.insert(win.winner, income);

        SettlementResult {
            payments,
            description: format!("玩家 {} 和牌，{} 番", win.winner, win.score.total),
        }
    }
}
