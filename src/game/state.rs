use crate::game::claim::{ClaimContext, ClaimIntent, ClaimSource};
use crate::game::constants::NUM_PLAYERS;
use crate::game::exchange::ExchangeDirection;
use crate::game::kong::KongType;
use crate::game::variant::WinContext;
use crate::tile::{Meld, Suit, Tile};
use smallvec::SmallVec;
use std::fmt;

/// 回合阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
pub enum Phase {
    /// 尚未发牌
    Dealing,
    /// 换三张（仅血战）
    ExchangingTiles,
    /// 定缺（仅血战）
    DeclaringSuits,
    AwaitingDraw,
    AwaitingDiscard,
    /// 鸣牌窗口开放中
    CollectingClaims,
    ResolvingClaim,
    RoundEnd,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Dealing => "dealing",
            Phase::ExchangingTiles => "exchanging-tiles",
            Phase::DeclaringSuits => "declaring-suits",
            Phase::AwaitingDraw => "awaiting-draw",
            Phase::AwaitingDiscard => "awaiting-discard",
            Phase::CollectingClaims => "collecting-claims",
            Phase::ResolvingClaim => "resolving-claim",
            Phase::RoundEnd => "round-end",
        };
        f.write_str(name)
    }
}

/// 弃牌记录
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct DiscardRecord {
    /// 弃牌玩家 ID
    pub player: u8,
    pub tile: Tile,
    /// 弃牌回合数
    pub turn: u32,
    /// 是否被碰/杠/吃/和走
    pub claimed: bool,
}

/// 杠牌记录
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct KongRecord {
    pub player: u8,
    pub tile: Tile,
    pub kind: KongType,
    pub turn: u32,
}

/// 鸣牌窗口
///
/// 每个待响应座位至多响应一次；`seq` 用于丢弃过期的响应。
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ClaimWindow {
    pub seq: u64,
    pub tile: Tile,
    /// 出牌者（加杠时为加杠者）
    pub discarder: u8,
    pub source: ClaimSource,
    /// 尚未响应的座位，按离出牌者的距离排序
    pub pending: SmallVec<[u8; 3]>,
    /// 已收到的鸣牌（不含放弃）
    pub responses: Vec<ClaimIntent>,
}

impl ClaimWindow {
    pub fn is_pending(&self, seat: u8) -> bool {
        self.pending.contains(&seat)
    }

    /// 标记座位已响应，返回其原先是否在待响应列表中
    pub(crate) fn take(&mut self, seat: u8) -> bool {
        match self.pending.iter().position(|&s| s == seat) {
            Some(pos) => {
                self.pending.remove(pos);
                true
            }
            None => false,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.pending.is_empty()
    }
}

/// 回合状态
///
/// 只有引擎的状态转换方法会修改这里的字段。
#[derive(Debug, Clone)]
pub struct TurnState {
    pub(crate) phase: Phase,
    pub(crate) current_player: u8,
    /// 当前回合数（每次摸牌加一）
    pub(crate) turn: u32,
    /// 已和牌或离场的座位
    pub(crate) out: [bool; NUM_PLAYERS as usize],
    pub(crate) missing_suits: [Option<Suit>; NUM_PLAYERS as usize],
    /// 各座位已提交的换三张
    pub(crate) exchanges: [Option<[Tile; 3]>; NUM_PLAYERS as usize],
    pub(crate) exchange_direction: Option<ExchangeDirection>,
    pub(crate) discards: Vec<DiscardRecord>,
    pub(crate) kongs: Vec<KongRecord>,
    pub(crate) window: Option<ClaimWindow>,
    pub(crate) next_seq: u64,
    /// 下一次（或刚刚的）摸牌是杠后补牌
    pub(crate) replacement_draw: bool,
    /// 本回合摸到的牌，碰/吃后为 `None`
    pub(crate) last_draw: Option<Tile>,
}

impl TurnState {
    pub fn new() -> Self {
        Self {
            phase: Phase::Dealing,
            current_player: 0,
            turn: 0,
            out: [false; NUM_PLAYERS as usize],
            missing_suits: [None; NUM_PLAYERS as usize],
            exchanges: [None; NUM_PLAYERS as usize],
            exchange_direction: None,
            discards: Vec::new(),
            kongs: Vec::new(),
            window: None,
            next_seq: 0,
            replacement_draw: false,
            last_draw: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn current_player(&self) -> u8 {
        self.current_player
    }

    pub fn turn(&self) -> u32 {
        self.turn
    }

    pub fn is_out(&self, seat: u8) -> bool {
        self.out.get(seat as usize).copied().unwrap_or(true)
    }

    pub fn missing_suit(&self, seat: u8) -> Option<Suit> {
        self.missing_suits.get(seat as usize).copied().flatten()
    }

    pub fn missing_suits(&self) -> [Option<Suit>; NUM_PLAYERS as usize] {
        self.missing_suits
    }

    /// 本局换三张的方向，不换时为 `None`
    pub fn exchange_direction(&self) -> Option<ExchangeDirection> {
        self.exchange_direction
    }

    pub fn has_exchanged(&self, seat: u8) -> bool {
        self.exchanges.get(seat as usize).map_or(true, Option::is_some)
    }

    pub fn discards(&self) -> &[DiscardRecord] {
        &self.discards
    }

    pub fn kongs(&self) -> &[KongRecord] {
        &self.kongs
    }

    pub fn window(&self) -> Option<&ClaimWindow> {
        self.window.as_ref()
    }

    pub fn last_draw(&self) -> Option<Tile> {
        self.last_draw
    }

    /// 仍在局中的座位
    pub fn active_players(&self) -> SmallVec<[u8; 4]> {
        (0..NUM_PLAYERS).filter(|&s| !self.out[s as usize]).collect()
    }

    pub fn active_count(&self) -> usize {
        self.out.iter().filter(|&&o| !o).count()
    }

    /// `seat` 之后（不含自己）第一个仍在局中的座位
    pub fn next_active_after(&self, seat: u8) -> Option<u8> {
        (1..=NUM_PLAYERS)
            .map(|i| (seat + i) % NUM_PLAYERS)
            .find(|&s| !self.out[s as usize] && s != seat)
    }

    /// 开启鸣牌窗口，返回窗口序号
    pub(crate) fn open_window(&mut self, tile: Tile, discarder: u8, source: ClaimSource) -> u64 {
        self.next_seq += 1;
        let pending = (1..NUM_PLAYERS)
            .map(|i| (discarder + i) % NUM_PLAYERS)
            .filter(|&s| !self.out[s as usize])
            .collect();
        self.window = Some(ClaimWindow {
            seq: self.next_seq,
            tile,
            discarder,
            source,
            pending,
            responses: Vec::new(),
        });
        self.phase = Phase::CollectingClaims;
        self.next_seq
    }

    /// 构造裁决用的局面信息
    pub fn claim_context(&self, source: ClaimSource, last_tile: bool) -> ClaimContext {
        ClaimContext {
            source,
            missing_suits: self.missing_suits,
            inactive: self.out,
            last_tile,
        }
    }

    /// 自摸和的上下文
    pub fn self_draw_context(&self, seat: u8, tile: Tile, last_tile: bool) -> WinContext {
        let mut ctx = WinContext::self_draw(seat, tile).with_missing_suit(self.missing_suit(seat));
        ctx.kong_replacement = self.replacement_draw;
        ctx.last_tile = last_tile;
        ctx
    }

    /// 把最近一次弃牌标记为被鸣走
    pub(crate) fn mark_last_discard_claimed(&mut self) {
        if let Some(record) = self.discards.last_mut() {
            record.claimed = true;
        }
    }
}

impl Default for TurnState {
    fn default() -> Self {
        Self::new()
    }
}

/// 某个座位的公开信息
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct SeatSnapshot {
    pub seat: u8,
    pub hand: Vec<Tile>,
    pub melds: Vec<Meld>,
    pub missing_suit: Option<Suit>,
    pub out: bool,
    pub score: i32,
}

/// 引擎只读快照
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Snapshot {
    pub phase: Phase,
    pub current_player: u8,
    pub turn: u32,
    pub exchange_direction: Option<ExchangeDirection>,
    pub seats: Vec<SeatSnapshot>,
    pub discards: Vec<DiscardRecord>,
    /// 已和牌的座位，按和牌顺序
    pub winners: Vec<u8>,
    pub remaining_draws: usize,
    pub window: Option<ClaimWindow>,
}
