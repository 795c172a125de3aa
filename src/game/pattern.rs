use crate::game::constants::NUM_TILE_TYPES;
use crate::game::player::Player;
use crate::game::variant::WinContext;
use crate::tile::{Decomposition, Group, Suit, Tile};
use std::collections::HashSet;

/// 番种
///
/// 每个番种是一个只读谓词，返回其在某种拆法下出现的次数（0 表示不成立）。
/// 分值不在这里定义，由各规则的番种表注入。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Pattern {
    /// 大四喜
    BigFourWinds,
    /// 大三元
    BigThreeDragons,
    /// 九莲宝灯
    NineGates,
    /// 十三幺
    ThirteenOrphans,
    /// 字一色
    AllHonors,
    /// 七对
    SevenPairs,
    /// 清一色
    FullFlush,
    /// 碰碰和 / 大对子
    AllTriplets,
    /// 混一色
    HalfFlush,
    /// 全带幺
    OutsideHand,
    /// 杠上开花
    KongReplacement,
    /// 海底捞月
    LastTile,
    /// 抢杠和
    RobbingKong,
    /// 箭刻（每组计一次）
    DragonPung,
    /// 门前清
    ConcealedHand,
    /// 平和
    AllChows,
    /// 断幺
    AllSimples,
    /// 暗杠（每个计一次）
    ConcealedKong,
    /// 自摸
    SelfDrawn,
    /// 明杠（每个计一次）
    MeldedKong,
    /// 无字
    NoHonors,
    /// 缺一门
    OneVoidedSuit,
    /// 杠加番（血战到底每个杠加番，与拆法无关）
    KongBonus,
}

/// 番种判定所需的输入
pub struct PatternInput<'a> {
    pub decomposition: &'a Decomposition,
    pub player: &'a Player,
    pub ctx: &'a WinContext,
    /// 暗牌 + 副露的全部牌计数
    pub counts: [u8; NUM_TILE_TYPES],
}

impl<'a> PatternInput<'a> {
    pub fn new(decomposition: &'a Decomposition, player: &'a Player, ctx: &'a WinContext) -> Self {
        Self {
            decomposition,
            player,
            ctx,
            counts: player.all_tile_counts(),
        }
    }

    fn tiles(&self) -> impl Iterator<Item = Tile> + '_ {
        Tile::all_kinds().filter(move |t| self.counts[t.to_index()] > 0)
    }

    fn numeral_suits(&self) -> HashSet<Suit> {
        self.tiles().filter(Tile::is_numeral).map(|t| t.suit()).collect()
    }

    fn has_honor(&self) -> bool {
        self.tiles().any(|t| t.is_honor())
    }

    fn triplet_like_count(&self, suit: Suit) -> u32 {
        self.decomposition
            .all_groups()
            .iter()
            .filter(|g| g.is_triplet_like() && g.tile().suit() == suit)
            .count() as u32
    }
}

impl Pattern {
    /// 中文名称
    pub fn name(&self) -> &'static str {
        match self {
            Pattern::BigFourWinds => "大四喜",
            Pattern::BigThreeDragons => "大三元",
            Pattern::NineGates => "九莲宝灯",
            Pattern::ThirteenOrphans => "十三幺",
            Pattern::AllHonors => "字一色",
            Pattern::SevenPairs => "七对",
            Pattern::FullFlush => "清一色",
            Pattern::AllTriplets => "碰碰和",
            Pattern::HalfFlush => "混一色",
            Pattern::OutsideHand => "全带幺",
            Pattern::KongReplacement => "杠上开花",
            Pattern::LastTile => "海底捞月",
            Pattern::RobbingKong => "抢杠和",
            Pattern::DragonPung => "箭刻",
            Pattern::ConcealedHand => "门前清",
            Pattern::AllChows => "平和",
            Pattern::AllSimples => "断幺",
            Pattern::ConcealedKong => "暗杠",
            Pattern::SelfDrawn => "自摸",
            Pattern::MeldedKong => "明杠",
            Pattern::NoHonors => "无字",
            Pattern::OneVoidedSuit => "缺一门",
            Pattern::KongBonus => "杠",
        }
    }

    /// 该番种在给定拆法下出现的次数
    pub fn occurrences(&self, input: &PatternInput<'_>) -> u32 {
        let d = input.decomposition;
        let groups = d.all_groups();
        let hit = |b: bool| b as u32;
        match self {
            Pattern::BigFourWinds => hit(input.triplet_like_count(Suit::Wind) == 4),
            Pattern::BigThreeDragons => hit(input.triplet_like_count(Suit::Dragon) == 3),
            Pattern::NineGates => hit(is_nine_gates(input)),
            Pattern::ThirteenOrphans => hit(matches!(d, Decomposition::ThirteenOrphans { .. })),
            Pattern::AllHonors => hit(input.tiles().all(|t| t.is_honor())),
            Pattern::SevenPairs => hit(matches!(d, Decomposition::SevenPairs { .. })),
            Pattern::FullFlush => hit(!input.has_honor() && input.numeral_suits().len() == 1),
            Pattern::AllTriplets => hit(d.is_standard() && groups.iter().all(Group::is_triplet_like)),
            Pattern::HalfFlush => hit(input.has_honor() && input.numeral_suits().len() == 1),
            Pattern::OutsideHand => hit(
                d.is_standard()
                    && groups.iter().all(Group::contains_terminal_or_honor)
                    && d.pair().map_or(false, |p| p.is_terminal_or_honor()),
            ),
            Pattern::KongReplacement => hit(input.ctx.kong_replacement),
            Pattern::LastTile => hit(input.ctx.last_tile),
            Pattern::RobbingKong => hit(input.ctx.robbing_kong),
            Pattern::DragonPung => input.triplet_like_count(Suit::Dragon),
            Pattern::ConcealedHand => hit(input.player.is_concealed() && !input.ctx.self_drawn),
            Pattern::AllChows => hit(
                d.is_standard()
                    && groups.iter().all(|g| !g.is_triplet_like())
                    && d.pair().map_or(false, |p| p.is_numeral()),
            ),
            Pattern::AllSimples => hit(input.tiles().all(|t| !t.is_terminal_or_honor())),
            Pattern::ConcealedKong => input
                .player
                .melds
                .iter()
                .filter(|m| m.is_kong() && m.concealed)
                .count() as u32,
            Pattern::SelfDrawn => hit(input.ctx.self_drawn),
            Pattern::MeldedKong => input
                .player
                .melds
                .iter()
                .filter(|m| m.is_kong() && !m.concealed)
                .count() as u32,
            Pattern::NoHonors => hit(!input.has_honor()),
            Pattern::OneVoidedSuit => hit(input.numeral_suits().len() == 2),
            Pattern::KongBonus => input.player.kong_count() as u32,
        }
    }
}

/// 九莲宝灯：门清，同一门数牌 1112345678999 再加任意一张
fn is_nine_gates(input: &PatternInput<'_>) -> bool {
    if !input.player.melds.is_empty() || input.has_honor() {
        return false;
    }
    let suits = input.numeral_suits();
    let Some(&suit) = suits.iter().next() else {
        return false;
    };
    if suits.len() != 1 {
        return false;
    }
    let base = suit.base_index();
    let c = &input.counts[base..base + 9];
    c[0] >= 3 && c[8] >= 3 && c[1..8].iter().all(|&n| n >= 1)
}

/// 番种表中的一项
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PatternDef {
    pub pattern: Pattern,
    /// 每次出现的分值（国标为番数，血战为加番）
    pub points: u32,
    /// 成立时不再计算的番种
    #[serde(default)]
    pub excludes: Vec<Pattern>,
}

impl PatternDef {
    pub fn new(pattern: Pattern, points: u32) -> Self {
        Self {
            pattern,
            points,
            excludes: Vec::new(),
        }
    }

    pub fn excluding(mut self, patterns: &[Pattern]) -> Self {
        self.excludes.extend_from_slice(patterns);
        self
    }
}

/// 命中的番种
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct PatternMatch {
    pub pattern: Pattern,
    /// 每次的分值
    pub points: u32,
    /// 出现次数
    pub count: u32,
}

impl PatternMatch {
    pub fn value(&self) -> u32 {
        self.points.saturating_mul(self.count)
    }
}

/// 用番种表评估一种拆法，已应用互斥关系
pub fn evaluate_catalogue(catalogue: &[PatternDef], input: &PatternInput<'_>) -> Vec<PatternMatch> {
    let hits: Vec<(&PatternDef, u32)> = catalogue
        .iter()
        .map(|def| (def, def.pattern.occurrences(input)))
        .filter(|(_, count)| *count > 0)
        .collect();

    let excluded: HashSet<Pattern> = hits
        .iter()
        .flat_map(|(def, _)| def.excludes.iter().copied())
        .collect();

    hits.into_iter()
        .filter(|(def, _)| !excluded.contains(&def.pattern))
        .map(|(def, count)| PatternMatch {
            pattern: def.pattern,
            points: def.points,
            count,
        })
        .collect()
}
