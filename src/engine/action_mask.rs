use crate::game::action::Action;
use crate::game::chow::ChowHandler;
use crate::game::claim::{ClaimIntent, ClaimResolver, ClaimSource};
use crate::game::exchange::ExchangeHandler;
use crate::game::kong::KongHandler;
use crate::game::player::Player;
use crate::game::state::{Phase, TurnState};
use crate::game::variant::{evaluate_win, RuleVariant};
use crate::tile::{Decomposer, Suit, Tile};
use smallvec::SmallVec;

/// 动作掩码
///
/// 某个座位在当前阶段的全部合法动作
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionMask {
    pub seat: u8,
    /// 可以换出的三张（已排序）
    pub exchanges: Vec<[Tile; 3]>,
    /// 可以定缺的花色
    pub declarable_suits: SmallVec<[Suit; 3]>,
    pub can_draw: bool,
    /// 可以出的牌
    pub can_discard: Vec<Tile>,
    /// 可以自摸和
    pub can_self_win: bool,
    /// 可以暗杠的牌
    pub concealed_kongs: SmallVec<[Tile; 3]>,
    /// 可以加杠的牌
    pub added_kongs: SmallVec<[Tile; 4]>,
    /// 鸣牌窗口中合法的鸣牌
    pub claims: Vec<ClaimIntent>,
    pub can_pass: bool,
}

/// 构造掩码需要的只读局面
pub struct MaskInput<'a> {
    pub rule: &'a dyn RuleVariant,
    pub players: &'a [Player],
    pub state: &'a TurnState,
    /// 牌墙已空
    pub deck_empty: bool,
}

impl ActionMask {
    pub fn new(seat: u8) -> Self {
        Self {
            seat,
            ..Self::default()
        }
    }

    /// 计算某个座位的合法动作
    ///
    /// # 参数
    ///
    /// - `input`: 局面
    /// - `decomposer`: 拆牌器（判断能否和牌）
    /// - `seat`: 座位
    pub fn build(input: &MaskInput<'_>, decomposer: &mut Decomposer, seat: u8) -> Self {
        let mut mask = Self::new(seat);
        let state = input.state;
        let Some(player) = input.players.get(seat as usize) else {
            return mask;
        };
        if state.is_out(seat) {
            return mask;
        }

        match state.phase() {
            Phase::ExchangingTiles => {
                if !state.has_exchanged(seat) {
                    mask.exchanges = ExchangeHandler::options(player);
                }
            }
            Phase::DeclaringSuits => {
                if state.missing_suit(seat).is_none() {
                    mask.declarable_suits.extend(Suit::numerals());
                }
            }
            Phase::AwaitingDraw => {
                mask.can_draw = state.current_player() == seat;
            }
            Phase::AwaitingDiscard if state.current_player() == seat => {
                mask.fill_turn_actions(input, decomposer, player);
            }
            Phase::CollectingClaims => {
                mask.fill_claims(input, decomposer);
            }
            _ => {}
        }
        mask
    }

    fn fill_turn_actions(&mut self, input: &MaskInput<'_>, decomposer: &mut Decomposer, player: &Player) {
        let state = input.state;
        let missing_suit = state.missing_suit(self.seat);

        self.can_discard = player
            .hand
            .distinct_tiles()
            .into_iter()
            .filter(|&t| input.rule.can_discard(player, missing_suit, t))
            .collect();

        // 杠与自摸只在摸牌之后
        let Some(drawn) = state.last_draw() else {
            return;
        };
        self.concealed_kongs = KongHandler::concealed_kong_candidates(player);
        self.added_kongs = KongHandler::added_kong_candidates(player);

        let ctx = state.self_draw_context(self.seat, drawn, input.deck_empty);
        self.can_self_win = evaluate_win(input.rule, decomposer, player, &ctx).is_ok();
    }

    fn fill_claims(&mut self, input: &MaskInput<'_>, decomposer: &mut Decomposer) {
        let state = input.state;
        let Some(window) = state.window() else {
            return;
        };
        if !window.is_pending(self.seat) {
            return;
        }
        self.can_pass = true;

        let (seat, from, tile) = (self.seat, window.discarder, window.tile);
        let mut candidates = vec![ClaimIntent::win(seat, from, tile)];
        if window.source == ClaimSource::Discard {
            candidates.push(ClaimIntent::kong(seat, from, tile));
            candidates.push(ClaimIntent::pong(seat, from, tile));
            if let Some(player) = input.players.get(seat as usize) {
                for start in ChowHandler::chow_options(player, tile) {
                    candidates.push(ClaimIntent::chow(seat, from, tile, start));
                }
            }
        }

        let ctx = state.claim_context(window.source, input.deck_empty);
        for intent in candidates {
            let checked =
                ClaimResolver::check_intent(input.rule, decomposer, input.players, &intent, tile, from, &ctx);
            if checked.is_ok() {
                self.claims.push(intent);
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.exchanges.is_empty()
            && self.declarable_suits.is_empty()
            && !self.can_draw
            && self.can_discard.is_empty()
            && !self.can_self_win
            && self.concealed_kongs.is_empty()
            && self.added_kongs.is_empty()
            && self.claims.is_empty()
            && !self.can_pass
    }

    /// 展开为动作列表
    ///
    /// 出牌和过排在最前，第一个动作总是安全的默认选择。
    pub fn to_actions(&self) -> Vec<Action> {
        let mut actions = Vec::new();
        actions.extend(self.exchanges.iter().map(|&tiles| Action::Exchange { tiles }));
        actions.extend(self.declarable_suits.iter().map(|&suit| Action::DeclareSuit { suit }));
        if self.can_draw {
            actions.push(Action::Draw);
        }
        if self.can_pass {
            actions.push(Action::Pass);
        }
        actions.extend(self.can_discard.iter().map(|&tile| Action::Discard { tile }));
        actions.extend(self.concealed_kongs.iter().map(|&tile| Action::ConcealedKong { tile }));
        actions.extend(self.added_kongs.iter().map(|&tile| Action::AddedKong { tile }));
        actions.extend(self.claims.iter().map(|&intent| Action::Claim(intent)));
        if self.can_self_win {
            actions.push(Action::SelfWin);
        }
        actions
    }

    pub fn allows(&self, action: &Action) -> bool {
        match action {
            Action::Exchange { tiles } => {
                let mut sorted = *tiles;
                sorted.sort();
                self.exchanges.contains(&sorted)
            }
            Action::DeclareSuit { suit } => self.declarable_suits.contains(suit),
            Action::Draw => self.can_draw,
            Action::Discard { tile } => self.can_discard.contains(tile),
            Action::SelfWin => self.can_self_win,
            Action::ConcealedKong { tile } => self.concealed_kongs.contains(tile),
            Action::AddedKong { tile } => self.added_kongs.contains(tile),
            Action::Claim(intent) => self.claims.contains(intent),
            Action::Pass => self.can_pass,
        }
    }
}
