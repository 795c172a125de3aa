use crate::game::claim::ClaimRejection;
use crate::game::exchange::ExchangeDirection;
use crate::game::kong::KongType;
use crate::game::settlement::WinRecord;
use crate::game::variant::VariantKind;
use crate::tile::{Meld, Suit, Tile};
use crossbeam::channel::{bounded, Receiver, Sender, TrySendError};

/// 对局事件
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub enum GameEvent {
    RoundStarted { variant: VariantKind, dealer: u8 },
    /// 换出的牌不公开，只通知谁已提交
    ExchangeSubmitted { player: u8 },
    TilesExchanged { direction: ExchangeDirection },
    SuitDeclared { player: u8, suit: Suit },
    TileDrawn { player: u8, tile: Tile, replacement: bool },
    TileDiscarded { player: u8, tile: Tile, seq: u64 },
    ClaimRejected { player: u8, reason: ClaimRejection },
    MeldClaimed { player: u8, meld: Meld },
    KongDeclared { player: u8, tile: Tile, kind: KongType },
    KongRobbed { player: u8, tile: Tile },
    PlayerWon { record: WinRecord, payments: Vec<(u8, i32)> },
    RoundEnded { winners: Vec<u8>, drawn: bool, scores: [i32; 4] },
}

/// 事件投递失败
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("event channel is full")]
    Full,
    #[error("event channel is disconnected")]
    Disconnected,
    #[error("failed to encode event: {0}")]
    Encode(#[from] serde_json::Error),
}

/// 事件订阅接口
///
/// 投递失败只会被记录，不影响对局状态。
pub trait EventSink: Send {
    fn emit(&mut self, event: &GameEvent) -> Result<(), SinkError>;
}

/// 丢弃所有事件
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&mut self, _event: &GameEvent) -> Result<(), SinkError> {
        Ok(())
    }
}

/// 以 JSON 形式写入日志
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl EventSink for LogSink {
    fn emit(&mut self, event: &GameEvent) -> Result<(), SinkError> {
        let line = serde_json::to_string(event)?;
        log::info!(target: "mahjong_core::events", "{}", line);
        Ok(())
    }
}

/// 有界通道投递
///
/// 通道满时丢弃事件，不会阻塞引擎。
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: Sender<GameEvent>,
}

impl ChannelSink {
    /// 创建容量为 `capacity` 的通道
    ///
    /// # 返回
    ///
    /// `(sink, receiver)`，接收端交给观察者
    pub fn bounded(capacity: usize) -> (Self, Receiver<GameEvent>) {
        let (tx, rx) = bounded(capacity);
        (Self { tx }, rx)
    }
}

impl EventSink for ChannelSink {
    fn emit(&mut self, event: &GameEvent) -> Result<(), SinkError> {
        self.tx.try_send(event.clone()).map_err(|e| match e {
            TrySendError::Full(_) => SinkError::Full,
            TrySendError::Disconnected(_) => SinkError::Disconnected,
        })
    }
}
