use crate::engine::action_mask::{ActionMask, MaskInput};
use crate::game::action::Action;
use crate::game::chow::ChowHandler;
use crate::game::claim::{
    seat_distance, ClaimIntent, ClaimKind, ClaimRejection, ClaimResolver, ClaimSource, ResolvedClaim, WinningClaim,
};
use crate::game::config::EngineConfig;
use crate::game::constants::{INITIAL_HAND_SIZE, MAX_TURNS, NUM_PLAYERS};
use crate::game::events::{EventSink, GameEvent};
use crate::game::exchange::{ExchangeDirection, ExchangeHandler, TileExchange};
use crate::game::kong::{KongHandler, KongType};
use crate::game::player::Player;
use crate::game::policy::{DecisionContext, PlayerView, Policy};
use crate::game::pong::PongHandler;
use crate::game::scoring::{Disqualification, ScoreResult};
use crate::game::settlement::WinRecord;
use crate::game::state::{ClaimWindow, DiscardRecord, KongRecord, Phase, SeatSnapshot, Snapshot, TurnState};
use crate::game::variant::{build_variant, evaluate_win, RuleVariant};
use crate::tile::{Deck, DecomposeStats, Decomposer, Suit, Tile, Wall};
use crossbeam::channel::{unbounded, Receiver, RecvTimeoutError};
use rand::rngs::StdRng;
use rand::SeedableRng;
use smallvec::SmallVec;
use std::time::{Duration, Instant};

/// 游戏错误
///
/// 除 `DeckExhausted`（同时进入流局）外，返回错误时状态不变。
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    #[error("{action} is not allowed during {phase}")]
    IllegalActionForPhase { phase: Phase, action: &'static str },
    #[error("invalid claim from player {player}: {reason}")]
    InvalidClaim { player: u8, reason: ClaimRejection },
    #[error("player {player} does not hold a complete hand")]
    IncompleteHandDecomposition { player: u8 },
    #[error("deck exhausted")]
    DeckExhausted,
    #[error("invalid player id: {0}")]
    InvalidPlayer(u8),
    #[error("not player {player}'s turn")]
    NotYourTurn { player: u8 },
    #[error("player {0} is out of the round")]
    PlayerOut(u8),
    #[error("tile {0} is not in hand")]
    TileNotHeld(Tile),
    #[error("discarding {0} is not allowed")]
    IllegalDiscard(Tile),
    #[error("player {0} already responded")]
    AlreadyResponded(u8),
    #[error("stale claim response: expected window {expected}, got {got}")]
    StaleClaim { expected: u64, got: u64 },
    #[error("{0:?} cannot be declared as the missing suit")]
    InvalidSuit(Suit),
    #[error("exchange must be three numeral tiles of one suit")]
    InvalidExchange,
}

/// 鸣牌窗口中的一条响应，`intent` 为 `None` 表示过
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ClaimResponse {
    pub player: u8,
    pub seq: u64,
    pub intent: Option<ClaimIntent>,
}

impl ClaimResponse {
    pub fn pass(player: u8, seq: u64) -> Self {
        Self { player, seq, intent: None }
    }

    pub fn claim(intent: ClaimIntent, seq: u64) -> Self {
        Self {
            player: intent.player,
            seq,
            intent: Some(intent),
        }
    }
}

/// 一局的结果
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct RoundOutcome {
    /// 和牌记录，按和牌顺序
    pub wins: Vec<WinRecord>,
    /// 是否因牌墙摸完而结束
    pub drawn: bool,
    /// 本局累计得分
    pub scores: [i32; 4],
    pub turns: u32,
}

impl RoundOutcome {
    pub fn winners(&self) -> Vec<u8> {
        self.wins.iter().map(|w| w.winner).collect()
    }
}

/// 游戏引擎
///
/// 单线程状态机，唯一修改对局状态的地方。策略只拿到快照。
pub struct GameEngine {
    config: EngineConfig,
    rule: Box<dyn RuleVariant>,
    deck: Box<dyn Deck + Send>,
    decomposer: Decomposer,
    players: [Player; 4],
    state: TurnState,
    scores: [i32; 4],
    wins: Vec<WinRecord>,
    drawn: bool,
    sinks: Vec<Box<dyn EventSink>>,
    /// 换三张方向等局内随机
    rng: StdRng,
}

impl GameEngine {
    /// 按配置创建引擎，牌墙随机洗牌
    pub fn new(config: EngineConfig) -> Self {
        let rule = build_variant(&config);
        let mut wall = Wall::from_tiles(rule.tile_set());
        wall.shuffle();
        Self::from_parts(config, rule, Box::new(wall))
    }

    /// 用固定种子洗牌，对局可复现
    pub fn with_seed(config: EngineConfig, seed: u64) -> Self {
        let rule = build_variant(&config);
        let mut wall = Wall::from_tiles(rule.tile_set());
        wall.shuffle_with_seed(seed);
        let mut engine = Self::from_parts(config, rule, Box::new(wall));
        engine.rng = StdRng::seed_from_u64(seed);
        engine
    }

    /// 使用指定牌堆（如 `Wall::from_sequence`）
    pub fn with_deck(config: EngineConfig, deck: Box<dyn Deck + Send>) -> Self {
        let rule = build_variant(&config);
        Self::from_parts(config, rule, deck)
    }

    /// 使用自定义规则与牌堆
    pub fn from_parts(config: EngineConfig, rule: Box<dyn RuleVariant>, deck: Box<dyn Deck + Send>) -> Self {
        Self {
            decomposer: Decomposer::with_cache_size(config.decompose_cache_size),
            config,
            rule,
            deck,
            players: [Player::new(0), Player::new(1), Player::new(2), Player::new(3)],
            state: TurnState::new(),
            scores: [0; 4],
            wins: Vec::new(),
            drawn: false,
            sinks: Vec::new(),
            rng: StdRng::from_entropy(),
        }
    }

    pub fn add_sink(&mut self, sink: Box<dyn EventSink>) {
        self.sinks.push(sink);
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn rule(&self) -> &dyn RuleVariant {
        self.rule.as_ref()
    }

    pub fn state(&self) -> &TurnState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn current_player(&self) -> u8 {
        self.state.current_player
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn player(&self, seat: u8) -> Option<&Player> {
        self.players.get(seat as usize)
    }

    pub fn scores(&self) -> [i32; 4] {
        self.scores
    }

    pub fn wins(&self) -> &[WinRecord] {
        &self.wins
    }

    pub fn remaining_draws(&self) -> usize {
        self.deck.remaining_count()
    }

    pub fn decompose_stats(&self) -> DecomposeStats {
        self.decomposer.stats()
    }

    /// 本局已结束时返回结果
    pub fn outcome(&self) -> Option<RoundOutcome> {
        (self.state.phase == Phase::RoundEnd).then(|| self.round_outcome())
    }

    fn round_outcome(&self) -> RoundOutcome {
        RoundOutcome {
            wins: self.wins.clone(),
            drawn: self.drawn,
            scores: self.scores,
            turns: self.state.turn,
        }
    }

    fn emit(&mut self, event: GameEvent) {
        for sink in &mut self.sinks {
            if let Err(e) = sink.emit(&event) {
                log::warn!("事件投递失败: {}", e);
            }
        }
    }

    fn require_phase(&self, expected: Phase, action: &'static str) -> Result<(), GameError> {
        if self.state.phase != expected {
            return Err(GameError::IllegalActionForPhase {
                phase: self.state.phase,
                action,
            });
        }
        Ok(())
    }

    fn check_seat(&self, seat: u8) -> Result<(), GameError> {
        if seat >= NUM_PLAYERS {
            return Err(GameError::InvalidPlayer(seat));
        }
        if self.state.is_out(seat) {
            return Err(GameError::PlayerOut(seat));
        }
        Ok(())
    }

    /// 当前玩家在摸牌后的回合检查
    fn require_turn(&self, seat: u8, action: &'static str) -> Result<(), GameError> {
        self.require_phase(Phase::AwaitingDiscard, action)?;
        self.check_seat(seat)?;
        if seat != self.state.current_player {
            return Err(GameError::NotYourTurn { player: seat });
        }
        Ok(())
    }

    fn give_tile(&mut self, seat: u8, tile: Tile) {
        let added = self.players[seat as usize].hand.add_tile(tile);
        debug_assert!(added, "玩家 {} 的 {} 已有 4 张", seat, tile);
    }

    /// 决策点上每个玩家满足 暗牌 + 3 × 副露 ∈ {13, 14}
    fn debug_check_counts(&self) {
        for player in &self.players {
            let n = player.effective_count();
            debug_assert!(n == 13 || n == 14, "玩家 {} 牌数异常: {}", player.id, n);
        }
    }

    fn end_round(&mut self, drawn: bool) {
        self.state.phase = Phase::RoundEnd;
        self.state.window = None;
        self.drawn = drawn;
        let winners: Vec<u8> = self.wins.iter().map(|w| w.winner).collect();
        log::info!("本局结束: 和牌 {:?}，流局 {}，得分 {:?}", winners, drawn, self.scores);
        self.emit(GameEvent::RoundEnded {
            winners,
            drawn,
            scores: self.scores,
        });
    }

    /// 发牌：按座位顺序每家 13 张
    pub fn start(&mut self) -> Result<(), GameError> {
        self.require_phase(Phase::Dealing, "start")?;
        for seat in 0..NUM_PLAYERS {
            for _ in 0..INITIAL_HAND_SIZE {
                let Some(tile) = self.deck.draw() else {
                    log::warn!("发牌时牌墙不足");
                    self.end_round(true);
                    return Err(GameError::DeckExhausted);
                };
                self.give_tile(seat, tile);
            }
        }

        self.state.current_player = 0;
        let exchange = if self.rule.requires_missing_suit() {
            match self.config.regional.tile_exchange {
                TileExchange::Off => None,
                TileExchange::Random => Some(ExchangeDirection::random(&mut self.rng)),
                TileExchange::Fixed(direction) => Some(direction),
            }
        } else {
            None
        };
        self.state.exchange_direction = exchange;
        self.state.phase = match exchange {
            Some(_) => Phase::ExchangingTiles,
            None if self.rule.requires_missing_suit() => Phase::DeclaringSuits,
            None => Phase::AwaitingDraw,
        };
        log::info!("开局: {:?}，剩余 {} 张", self.rule.kind(), self.deck.remaining_count());
        self.emit(GameEvent::RoundStarted {
            variant: self.rule.kind(),
            dealer: 0,
        });
        if let Some(direction) = exchange {
            log::debug!("换三张方向: {:?}", direction);
        }
        self.debug_check_counts();
        Ok(())
    }

    /// 换三张
    ///
    /// 全部座位提交后按本局方向交换，然后进入定缺。
    ///
    /// # 参数
    ///
    /// - `player`: 座位
    /// - `tiles`: 同一门数牌中的三张，必须都在手里
    pub fn exchange_tiles(&mut self, player: u8, tiles: [Tile; 3]) -> Result<(), GameError> {
        self.require_phase(Phase::ExchangingTiles, "exchange_tiles")?;
        self.check_seat(player)?;
        if self.state.has_exchanged(player) {
            return Err(GameError::AlreadyResponded(player));
        }
        if !ExchangeHandler::is_same_suit(&tiles) {
            return Err(GameError::InvalidExchange);
        }
        if let Some(tile) = ExchangeHandler::missing_tile(&self.players[player as usize], &tiles) {
            return Err(GameError::TileNotHeld(tile));
        }

        let mut sorted = tiles;
        sorted.sort();
        let mut submitted = self.state.exchanges;
        submitted[player as usize] = Some(sorted);
        let picks: Vec<[Tile; 3]> = submitted.iter().flatten().copied().collect();

        if picks.len() < NUM_PLAYERS as usize {
            self.state.exchanges = submitted;
            log::debug!("玩家 {} 提交换三张", player);
            self.emit(GameEvent::ExchangeSubmitted { player });
            return Ok(());
        }

        let Some(direction) = self.state.exchange_direction else {
            return Err(GameError::IllegalActionForPhase {
                phase: self.state.phase,
                action: "exchange_tiles",
            });
        };
        if !ExchangeHandler::execute(&mut self.players, &picks, direction) {
            return Err(GameError::InvalidExchange);
        }
        self.state.exchanges = submitted;
        self.emit(GameEvent::ExchangeSubmitted { player });

        log::info!("换三张完成: {:?}", direction);
        self.emit(GameEvent::TilesExchanged { direction });
        self.state.phase = Phase::DeclaringSuits;
        self.debug_check_counts();
        Ok(())
    }

    /// 定缺
    ///
    /// 全部在局玩家定缺后进入摸牌阶段，由庄家（座位 0）先摸。
    pub fn declare_suit(&mut self, player: u8, suit: Suit) -> Result<(), GameError> {
        self.require_phase(Phase::DeclaringSuits, "declare_suit")?;
        self.check_seat(player)?;
        if !suit.is_numeral() {
            return Err(GameError::InvalidSuit(suit));
        }
        if self.state.missing_suits[player as usize].is_some() {
            return Err(GameError::AlreadyResponded(player));
        }

        self.state.missing_suits[player as usize] = Some(suit);
        log::debug!("玩家 {} 定缺 {:?}", player, suit);
        self.emit(GameEvent::SuitDeclared { player, suit });

        let all_declared = self
            .state
            .active_players()
            .iter()
            .all(|&s| self.state.missing_suits[s as usize].is_some());
        if all_declared {
            self.state.phase = Phase::AwaitingDraw;
            self.state.current_player = 0;
        }
        Ok(())
    }

    /// 当前玩家摸牌
    ///
    /// # 返回
    ///
    /// 摸到的牌；牌墙已空时进入流局并返回 `DeckExhausted`
    pub fn draw(&mut self) -> Result<Tile, GameError> {
        self.require_phase(Phase::AwaitingDraw, "draw")?;
        let seat = self.state.current_player;
        let Some(tile) = self.deck.draw() else {
            log::info!("牌墙已空，流局");
            self.end_round(true);
            return Err(GameError::DeckExhausted);
        };

        self.give_tile(seat, tile);
        self.state.turn += 1;
        self.state.last_draw = Some(tile);
        self.state.phase = Phase::AwaitingDiscard;
        let replacement = self.state.replacement_draw;
        log::debug!("玩家 {} 摸牌 {}{}", seat, tile, if replacement { "（杠后补牌）" } else { "" });
        self.emit(GameEvent::TileDrawn {
            player: seat,
            tile,
            replacement,
        });
        self.debug_check_counts();
        Ok(tile)
    }

    /// 出牌并开启鸣牌窗口
    ///
    /// # 返回
    ///
    /// 鸣牌窗口序号
    pub fn discard(&mut self, player: u8, tile: Tile) -> Result<u64, GameError> {
        self.require_turn(player, "discard")?;
        let p = &self.players[player as usize];
        if !p.hand.has_tile(tile) {
            return Err(GameError::TileNotHeld(tile));
        }
        if !self.rule.can_discard(p, self.state.missing_suit(player), tile) {
            return Err(GameError::IllegalDiscard(tile));
        }

        self.players[player as usize].hand.remove_tile(tile);
        self.state.discards.push(DiscardRecord {
            player,
            tile,
            turn: self.state.turn,
            claimed: false,
        });
        self.state.replacement_draw = false;
        self.state.last_draw = None;

        let seq = self.state.open_window(tile, player, ClaimSource::Discard);
        if self.state.window.as_ref().map_or(true, ClaimWindow::is_complete) {
            self.state.phase = Phase::ResolvingClaim;
        }
        log::debug!("玩家 {} 出牌 {}（窗口 {}）", player, tile, seq);
        self.emit(GameEvent::TileDiscarded { player, tile, seq });
        self.debug_check_counts();
        Ok(seq)
    }

    fn record_kong(&mut self, player: u8, tile: Tile, kind: KongType) {
        self.state.kongs.push(KongRecord {
            player,
            tile,
            kind,
            turn: self.state.turn,
        });
        log::info!("玩家 {} {:?} 杠 {}", player, kind, tile);
        self.emit(GameEvent::KongDeclared { player, tile, kind });
    }

    /// 暗杠，之后同一玩家杠后补牌
    pub fn declare_concealed_kong(&mut self, player: u8, tile: Tile) -> Result<(), GameError> {
        self.require_turn(player, "concealed_kong")?;
        if self.state.last_draw.is_none() {
            return Err(GameError::IllegalActionForPhase {
                phase: self.state.phase,
                action: "concealed_kong",
            });
        }
        if !KongHandler::concealed_kong(&mut self.players[player as usize], tile) {
            return Err(GameError::TileNotHeld(tile));
        }

        self.record_kong(player, tile, KongType::Concealed);
        self.state.replacement_draw = true;
        self.state.last_draw = None;
        self.state.phase = Phase::AwaitingDraw;
        self.debug_check_counts();
        Ok(())
    }

    /// 加杠
    ///
    /// 先开启只接受抢杠和的鸣牌窗口，无人抢杠才真正成杠。
    ///
    /// # 返回
    ///
    /// 鸣牌窗口序号
    pub fn declare_added_kong(&mut self, player: u8, tile: Tile) -> Result<u64, GameError> {
        self.require_turn(player, "added_kong")?;
        if self.state.last_draw.is_none() {
            return Err(GameError::IllegalActionForPhase {
                phase: self.state.phase,
                action: "added_kong",
            });
        }
        if !KongHandler::can_add_kong(&self.players[player as usize], tile) {
            return Err(GameError::TileNotHeld(tile));
        }

        self.state.last_draw = None;
        let seq = self.state.open_window(tile, player, ClaimSource::AddedKong);
        if self.state.window.as_ref().map_or(true, ClaimWindow::is_complete) {
            self.state.phase = Phase::ResolvingClaim;
        }
        log::debug!("玩家 {} 加杠 {}，等待抢杠（窗口 {}）", player, tile, seq);
        Ok(seq)
    }

    /// 自摸和
    pub fn declare_self_win(&mut self, player: u8) -> Result<WinRecord, GameError> {
        self.require_turn(player, "self_win")?;
        let Some(tile) = self.state.last_draw else {
            return Err(GameError::IllegalActionForPhase {
                phase: self.state.phase,
                action: "self_win",
            });
        };

        let ctx = self.state.self_draw_context(player, tile, self.deck.is_empty());
        let winner = &self.players[player as usize];
        let evaluation = match evaluate_win(self.rule.as_ref(), &mut self.decomposer, winner, &ctx) {
            Ok(evaluation) => evaluation,
            Err(Disqualification::Incomplete) => return Err(GameError::IncompleteHandDecomposition { player }),
            Err(reason) => {
                return Err(GameError::InvalidClaim {
                    player,
                    reason: ClaimRejection::NotLegal(reason),
                })
            }
        };

        let record = self.settle_win(player, None, tile, evaluation.score);
        self.state.out[player as usize] = true;
        self.state.last_draw = None;
        self.state.replacement_draw = false;
        self.after_wins(player);
        Ok(record)
    }

    /// 结算一次和牌并记录
    fn settle_win(&mut self, winner: u8, discarder: Option<u8>, tile: Tile, score: ScoreResult) -> WinRecord {
        let record = WinRecord {
            winner,
            discarder,
            tile,
            score,
            turn: self.state.turn,
        };
        let payers: SmallVec<[u8; 4]> = self.state.active_players().into_iter().filter(|&s| s != winner).collect();
        let settlement = self.rule.settle(&record, &payers);
        settlement.apply_to(&mut self.scores);
        log::info!("玩家 {} 和牌 {}: {}", winner, tile, settlement.description);

        let mut payments: Vec<(u8, i32)> = settlement.payments.into_iter().collect();
        payments.sort_unstable();
        self.emit(GameEvent::PlayerWon {
            record: record.clone(),
            payments,
        });
        self.wins.push(record.clone());
        record
    }

    /// 和牌后：继续（血战）或结束本局
    fn after_wins(&mut self, last_winner: u8) {
        if !self.rule.continues_after_win() || self.state.active_count() <= 1 {
            self.end_round(false);
            return;
        }
        match self.state.next_active_after(last_winner) {
            Some(next) => {
                self.state.current_player = next;
                self.state.phase = Phase::AwaitingDraw;
            }
            None => self.end_round(false),
        }
    }

    /// 提交鸣牌
    ///
    /// 提交时即检查合法性；非法鸣牌返回错误，该座位仍可重新响应。
    /// 不允许一炮多响时，若合法和牌者比所有未响应座位都更靠近出牌者，窗口立即关闭。
    pub fn submit_claim(&mut self, intent: ClaimIntent) -> Result<(), GameError> {
        self.require_phase(Phase::CollectingClaims, "claim")?;
        let player = intent.player;
        if player >= NUM_PLAYERS {
            return Err(GameError::InvalidPlayer(player));
        }
        let Some(window) = self.state.window.as_ref() else {
            return Err(GameError::IllegalActionForPhase {
                phase: self.state.phase,
                action: "claim",
            });
        };
        if player == window.discarder {
            return Err(GameError::InvalidClaim {
                player,
                reason: ClaimRejection::SelfClaim,
            });
        }
        if !window.is_pending(player) {
            return Err(if self.state.is_out(player) {
                GameError::PlayerOut(player)
            } else {
                GameError::AlreadyResponded(player)
            });
        }

        let (tile, discarder, source) = (window.tile, window.discarder, window.source);
        let ctx = self.state.claim_context(source, self.deck.is_empty());
        let checked = ClaimResolver::check_intent(
            self.rule.as_ref(),
            &mut self.decomposer,
            &self.players,
            &intent,
            tile,
            discarder,
            &ctx,
        );
        let legal_win = match checked {
            Ok(evaluation) => evaluation.is_some(),
            Err(ClaimRejection::Incomplete) => return Err(GameError::IncompleteHandDecomposition { player }),
            Err(reason) => return Err(GameError::InvalidClaim { player, reason }),
        };

        let multi_win = self.rule.allows_multi_win();
        let Some(window) = self.state.window.as_mut() else {
            return Ok(());
        };
        window.take(player);
        window.responses.push(intent);
        log::debug!("玩家 {} 鸣牌 {:?} {}", player, intent.kind, tile);

        let distance = seat_distance(discarder, player);
        if legal_win && !multi_win && window.pending.iter().all(|&s| seat_distance(discarder, s) > distance) {
            log::debug!("玩家 {} 截和，关闭窗口 {}", player, window.seq);
            window.pending.clear();
        }
        if window.is_complete() {
            self.state.phase = Phase::ResolvingClaim;
        }
        Ok(())
    }

    /// 放弃鸣牌
    pub fn decline(&mut self, player: u8) -> Result<(), GameError> {
        self.require_phase(Phase::CollectingClaims, "pass")?;
        if player >= NUM_PLAYERS {
            return Err(GameError::InvalidPlayer(player));
        }
        let out = self.state.is_out(player);
        let Some(window) = self.state.window.as_mut() else {
            return Err(GameError::IllegalActionForPhase {
                phase: Phase::CollectingClaims,
                action: "pass",
            });
        };
        if !window.take(player) {
            return Err(if window.discarder == player {
                GameError::NotYourTurn { player }
            } else if out {
                GameError::PlayerOut(player)
            } else {
                GameError::AlreadyResponded(player)
            });
        }
        if window.is_complete() {
            self.state.phase = Phase::ResolvingClaim;
        }
        Ok(())
    }

    /// 处理一条带窗口序号的响应
    pub fn submit_response(&mut self, response: ClaimResponse) -> Result<(), GameError> {
        self.require_phase(Phase::CollectingClaims, "claim")?;
        let expected = self.state.window.as_ref().map_or(0, |w| w.seq);
        if response.seq != expected {
            return Err(GameError::StaleClaim {
                expected,
                got: response.seq,
            });
        }
        match response.intent {
            Some(intent) if intent.player != response.player => Err(GameError::NotYourTurn {
                player: response.player,
            }),
            Some(intent) => self.submit_claim(intent),
            None => self.decline(response.player),
        }
    }

    /// 无效响应按“过”处理
    fn force_decline(&mut self, player: u8) {
        if let Some(window) = self.state.window.as_mut() {
            if window.take(player) && window.is_complete() {
                self.state.phase = Phase::ResolvingClaim;
            }
        }
    }

    /// 从通道收集鸣牌响应
    ///
    /// 过期响应被丢弃；无效鸣牌视为过。超时或所有发送端断开后，未响应的座位视为过。
    ///
    /// # 参数
    ///
    /// - `rx`: 响应通道（唯一消费者）
    /// - `timeout`: 收集时限，`None` 表示一直等待
    pub fn collect_claims(&mut self, rx: &Receiver<ClaimResponse>, timeout: Option<Duration>) -> Result<(), GameError> {
        self.require_phase(Phase::CollectingClaims, "collect_claims")?;
        let deadline = timeout.map(|t| Instant::now() + t);

        while self.state.phase == Phase::CollectingClaims {
            let received = match deadline {
                Some(deadline) => rx.recv_deadline(deadline),
                None => rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
            };
            match received {
                Ok(response) => {
                    let player = response.player;
                    match self.submit_response(response) {
                        Ok(()) => {}
                        Err(GameError::StaleClaim { expected, got }) => {
                            log::warn!("丢弃玩家 {} 的过期响应: 窗口 {}，收到 {}", player, expected, got);
                        }
                        Err(e) => {
                            log::warn!("玩家 {} 的响应无效，视为过: {}", player, e);
                            if let GameError::InvalidClaim { player, reason } = e {
                                self.emit(GameEvent::ClaimRejected { player, reason });
                            }
                            self.force_decline(player);
                        }
                    }
                }
                Err(RecvTimeoutError::Timeout) => {
                    log::warn!("鸣牌超时，未响应的座位视为过");
                    self.close_pending();
                }
                Err(RecvTimeoutError::Disconnected) => {
                    log::debug!("响应通道已断开，未响应的座位视为过");
                    self.close_pending();
                }
            }
        }
        Ok(())
    }

    fn close_pending(&mut self) {
        if let Some(window) = self.state.window.as_mut() {
            window.pending.clear();
        }
        self.state.phase = Phase::ResolvingClaim;
    }

    /// 裁决鸣牌窗口并执行结果
    ///
    /// # 返回
    ///
    /// 裁决结果，`None` 表示无人鸣牌
    pub fn resolve_claims(&mut self) -> Result<Option<ResolvedClaim>, GameError> {
        self.require_phase(Phase::ResolvingClaim, "resolve_claims")?;
        let Some(window) = self.state.window.take() else {
            return Err(GameError::IllegalActionForPhase {
                phase: self.state.phase,
                action: "resolve_claims",
            });
        };

        let ctx = self.state.claim_context(window.source, self.deck.is_empty());
        let outcome = ClaimResolver::resolve(
            self.rule.as_ref(),
            &mut self.decomposer,
            &self.players,
            &window.responses,
            window.tile,
            window.discarder,
            &ctx,
        );
        for &(player, reason) in &outcome.rejected {
            self.emit(GameEvent::ClaimRejected { player, reason });
        }

        match &outcome.resolved {
            Some(ResolvedClaim::Win(winners)) => self.apply_wins(&window, winners),
            Some(ResolvedClaim::Meld(intent)) => {
                if !self.apply_meld(&window, intent) {
                    log::warn!("玩家 {} 的 {:?} 无法执行，按无人鸣牌处理", intent.player, intent.kind);
                    self.pass_window(&window);
                }
            }
            None => self.pass_window(&window),
        }
        if self.state.phase != Phase::RoundEnd {
            self.debug_check_counts();
        }
        Ok(outcome.resolved)
    }

    fn apply_wins(&mut self, window: &ClaimWindow, winners: &[WinningClaim]) {
        let (tile, discarder) = (window.tile, window.discarder);
        match window.source {
            ClaimSource::Discard => self.state.mark_last_discard_claimed(),
            ClaimSource::AddedKong => {
                let robbed = self.players[discarder as usize].hand.remove_tile(tile);
                debug_assert!(robbed, "被抢杠的牌不在手中");
                log::info!("玩家 {} 的加杠 {} 被抢", discarder, tile);
                self.emit(GameEvent::KongRobbed { player: discarder, tile });
            }
        }

        for winner in winners {
            let seat = winner.intent.player;
            self.give_tile(seat, tile);
            self.settle_win(seat, Some(discarder), tile, winner.evaluation.score.clone());
        }
        let mut last = discarder;
        for winner in winners {
            self.state.out[winner.intent.player as usize] = true;
            last = winner.intent.player;
        }

        if winners.len() >= 2 && self.rule.continues_after_win() && self.config.regional.retire_discarder_on_multi_win {
            log::info!("一炮多响，放铳者 {} 离场", discarder);
            self.state.out[discarder as usize] = true;
        }
        self.state.replacement_draw = false;
        self.after_wins(last);
    }

    fn apply_meld(&mut self, window: &ClaimWindow, intent: &ClaimIntent) -> bool {
        let (tile, discarder, seat) = (window.tile, window.discarder, intent.player);
        let player = &mut self.players[seat as usize];
        let applied = match (intent.kind, intent.meld) {
            (ClaimKind::Kong, _) => KongHandler::direct_kong(player, tile, discarder),
            (ClaimKind::Pong, _) => PongHandler::pong(player, tile, discarder),
            (ClaimKind::Chow, Some(meld)) => ChowHandler::chow(player, tile, meld.tile, discarder),
            _ => false,
        };
        if !applied {
            return false;
        }

        self.state.mark_last_discard_claimed();
        if let Some(meld) = self.players[seat as usize].melds.last().copied() {
            log::debug!("玩家 {} {:?} {}", seat, intent.kind, tile);
            self.emit(GameEvent::MeldClaimed { player: seat, meld });
        }
        self.state.current_player = seat;
        self.state.last_draw = None;
        if intent.kind == ClaimKind::Kong {
            self.record_kong(seat, tile, KongType::Direct);
            self.state.replacement_draw = true;
            self.state.phase = Phase::AwaitingDraw;
        } else {
            self.state.replacement_draw = false;
            self.state.phase = Phase::AwaitingDiscard;
        }
        true
    }

    fn pass_window(&mut self, window: &ClaimWindow) {
        let (tile, discarder) = (window.tile, window.discarder);
        match window.source {
            ClaimSource::Discard => match self.state.next_active_after(discarder) {
                Some(next) => {
                    self.state.current_player = next;
                    self.state.phase = Phase::AwaitingDraw;
                }
                None => self.end_round(false),
            },
            ClaimSource::AddedKong => {
                if KongHandler::add_kong(&mut self.players[discarder as usize], tile) {
                    self.record_kong(discarder, tile, KongType::Added);
                } else {
                    log::warn!("玩家 {} 加杠 {} 失败", discarder, tile);
                }
                self.state.current_player = discarder;
                self.state.replacement_draw = true;
                self.state.phase = Phase::AwaitingDraw;
            }
        }
    }

    /// 某个座位当前的动作掩码
    pub fn action_mask(&mut self, seat: u8) -> ActionMask {
        let input = MaskInput {
            rule: self.rule.as_ref(),
            players: &self.players,
            state: &self.state,
            deck_empty: self.deck.is_empty(),
        };
        ActionMask::build(&input, &mut self.decomposer, seat)
    }

    /// 某个座位当前的合法动作
    pub fn legal_actions(&mut self, seat: u8) -> Vec<Action> {
        self.action_mask(seat).to_actions()
    }

    /// 执行动作
    pub fn apply(&mut self, seat: u8, action: Action) -> Result<(), GameError> {
        match action {
            Action::Exchange { tiles } => self.exchange_tiles(seat, tiles),
            Action::DeclareSuit { suit } => self.declare_suit(seat, suit),
            Action::Draw => {
                if seat != self.state.current_player {
                    return Err(GameError::NotYourTurn { player: seat });
                }
                self.draw().map(|_| ())
            }
            Action::Discard { tile } => self.discard(seat, tile).map(|_| ()),
            Action::SelfWin => self.declare_self_win(seat).map(|_| ()),
            Action::ConcealedKong { tile } => self.declare_concealed_kong(seat, tile),
            Action::AddedKong { tile } => self.declare_added_kong(seat, tile).map(|_| ()),
            Action::Claim(intent) => {
                if intent.player != seat {
                    return Err(GameError::NotYourTurn { player: seat });
                }
                self.submit_claim(intent)
            }
            Action::Pass => self.decline(seat),
        }
    }

    /// 某个座位的玩家视角
    pub fn player_view(&self, seat: u8) -> Option<PlayerView> {
        let player = self.players.get(seat as usize)?;
        Some(PlayerView {
            seat,
            phase: self.state.phase,
            hand: player.hand.clone(),
            melds: player.melds.clone(),
            missing_suit: self.state.missing_suit(seat),
            table_melds: self.players.iter().map(|p| p.melds.clone()).collect(),
            discards: self.state.discards.clone(),
            claim_tile: self.state.window.as_ref().map(|w| w.tile),
            remaining_draws: self.deck.remaining_count(),
            scores: self.scores,
        })
    }

    /// 只读快照
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            phase: self.state.phase,
            current_player: self.state.current_player,
            turn: self.state.turn,
            exchange_direction: self.state.exchange_direction,
            seats: self
                .players
                .iter()
                .map(|p| SeatSnapshot {
                    seat: p.id,
                    hand: p.hand.to_sorted_vec(),
                    melds: p.melds.clone(),
                    missing_suit: self.state.missing_suit(p.id),
                    out: self.state.is_out(p.id),
                    score: self.scores[p.id as usize],
                })
                .collect(),
            discards: self.state.discards.clone(),
            winners: self.wins.iter().map(|w| w.winner).collect(),
            remaining_draws: self.deck.remaining_count(),
            window: self.state.window.clone(),
        }
    }

    /// 用策略跑完一局
    ///
    /// 策略给出非法动作时重新询问，超过 `max_policy_retries` 次后采用第一个合法动作。
    /// 鸣牌窗口中各家策略在线程中并发决策，响应经同一通道由引擎收集。
    pub fn run_round(&mut self, policies: &mut [Box<dyn Policy>; 4]) -> Result<RoundOutcome, GameError> {
        loop {
            if self.state.phase != Phase::RoundEnd && self.state.turn > MAX_TURNS {
                log::warn!("超过最大回合数 {}，强制结束", MAX_TURNS);
                self.end_round(true);
            }
            match self.state.phase {
                Phase::RoundEnd => break,
                Phase::Dealing => match self.start() {
                    Ok(()) | Err(GameError::DeckExhausted) => {}
                    Err(e) => return Err(e),
                },
                Phase::ExchangingTiles => {
                    for seat in 0..NUM_PLAYERS {
                        if self.state.phase == Phase::ExchangingTiles && !self.state.has_exchanged(seat) {
                            self.drive_seat(seat, policies[seat as usize].as_mut())?;
                        }
                    }
                }
                Phase::DeclaringSuits => {
                    for seat in 0..NUM_PLAYERS {
                        if !self.state.is_out(seat) && self.state.missing_suit(seat).is_none() {
                            self.drive_seat(seat, policies[seat as usize].as_mut())?;
                        }
                    }
                }
                Phase::AwaitingDraw => match self.draw() {
                    Ok(_) | Err(GameError::DeckExhausted) => {}
                    Err(e) => return Err(e),
                },
                Phase::AwaitingDiscard => {
                    let seat = self.state.current_player;
                    self.drive_seat(seat, policies[seat as usize].as_mut())?;
                }
                Phase::CollectingClaims => self.run_claim_window(policies)?,
                Phase::ResolvingClaim => {
                    self.resolve_claims()?;
                }
            }
        }
        Ok(self.round_outcome())
    }

    /// 询问单个座位并执行
    fn drive_seat(&mut self, seat: u8, policy: &mut dyn Policy) -> Result<(), GameError> {
        let legal = self.legal_actions(seat);
        let Some(&fallback) = legal.first() else {
            return Ok(());
        };
        let view = self.player_view(seat).ok_or(GameError::InvalidPlayer(seat))?;
        let mut ctx = DecisionContext {
            window_seq: self.state.window.as_ref().map(|w| w.seq),
            ..DecisionContext::default()
        };

        for attempt in 0..=self.config.max_policy_retries {
            ctx.attempt = attempt;
            let action = policy.decide(&legal, &view, &ctx);
            if !legal.contains(&action) {
                log::warn!("玩家 {} 选择了非法动作 {:?}", seat, action);
                ctx.previous_error = Some(format!("{:?} is not a legal action", action));
                continue;
            }
            match self.apply(seat, action) {
                Ok(()) | Err(GameError::DeckExhausted) => return Ok(()),
                Err(e) => {
                    log::warn!("玩家 {} 的动作 {:?} 被拒绝: {}", seat, action, e);
                    ctx.previous_error = Some(e.to_string());
                }
            }
        }

        log::warn!("玩家 {} 的策略多次给出非法动作，改用 {:?}", seat, fallback);
        match self.apply(seat, fallback) {
            Ok(()) | Err(GameError::DeckExhausted) => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// 并发询问鸣牌窗口中的各家
    fn run_claim_window(&mut self, policies: &mut [Box<dyn Policy>; 4]) -> Result<(), GameError> {
        let Some(window) = self.state.window.as_ref() else {
            return Err(GameError::IllegalActionForPhase {
                phase: self.state.phase,
                action: "collect_claims",
            });
        };
        let seq = window.seq;
        let pending = window.pending.clone();

        let mut jobs: Vec<(u8, Vec<Action>, PlayerView)> = Vec::with_capacity(pending.len());
        for seat in pending {
            let legal = self.legal_actions(seat);
            let view = self.player_view(seat).ok_or(GameError::InvalidPlayer(seat))?;
            jobs.push((seat, legal, view));
        }

        let retries = self.config.max_policy_retries;
        let timeout = self.config.claim_timeout();
        let (tx, rx) = unbounded();

        std::thread::scope(|scope| {
            for (seat, policy) in policies.iter_mut().enumerate() {
                let Some((_, legal, view)) = jobs.iter().find(|(s, _, _)| *s as usize == seat) else {
                    continue;
                };
                let tx = tx.clone();
                scope.spawn(move || {
                    let intent = decide_claim(policy.as_mut(), legal, view, seq, retries);
                    let response = ClaimResponse {
                        player: seat as u8,
                        seq,
                        intent,
                    };
                    if tx.send(response).is_err() {
                        log::debug!("玩家 {} 的响应无人接收", seat);
                    }
                });
            }
            drop(tx);
            self.collect_claims(&rx, timeout)
        })
    }
}

/// 鸣牌窗口中的策略决策，非法选择超过重试次数后视为过
fn decide_claim(
    policy: &mut dyn Policy,
    legal: &[Action],
    view: &PlayerView,
    seq: u64,
    retries: u8,
) -> Option<ClaimIntent> {
    let mut ctx = DecisionContext {
        window_seq: Some(seq),
        ..DecisionContext::default()
    };
    for attempt in 0..=retries {
        ctx.attempt = attempt;
        match policy.decide(legal, view, &ctx) {
            Action::Pass => return None,
            Action::Claim(intent) if legal.contains(&Action::Claim(intent)) => return Some(intent),
            other => {
                log::warn!("玩家 {} 在鸣牌窗口选择了非法动作 {:?}", view.seat, other);
                ctx.previous_error = Some(format!("{:?} is not a legal action", other));
            }
        }
    }
    None
}
