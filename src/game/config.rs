use crate::game::constants::{DEFAULT_DECOMPOSE_CACHE_SIZE, DEFAULT_POLICY_RETRIES};
use crate::game::exchange::TileExchange;
use crate::game::pattern::{Pattern, PatternDef};
use crate::game::variant::VariantKind;
use std::time::Duration;

/// 配置解析错误
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid engine config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("catalogue lists {0:?} more than once")]
    DuplicatePattern(Pattern),
}

/// 引擎配置
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub variant: VariantKind,
    pub regional: RegionalConfig,
    pub national: NationalConfig,
    /// 鸣牌收集超时（毫秒），`None` 表示一直等待
    pub claim_timeout_ms: Option<u64>,
    /// 拆牌记忆化缓存上限
    pub decompose_cache_size: usize,
    /// 策略给出非法动作时的重试次数
    pub max_policy_retries: u8,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            variant: VariantKind::Regional,
            regional: RegionalConfig::default(),
            national: NationalConfig::default(),
            claim_timeout_ms: None,
            decompose_cache_size: DEFAULT_DECOMPOSE_CACHE_SIZE,
            max_policy_retries: DEFAULT_POLICY_RETRIES,
        }
    }
}

impl EngineConfig {
    pub fn regional() -> Self {
        Self::default()
    }

    pub fn national() -> Self {
        Self {
            variant: VariantKind::National,
            ..Self::default()
        }
    }

    /// 从 JSON 读取配置，缺省字段取默认值
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(s)?;
        check_catalogue(&config.regional.catalogue)?;
        check_catalogue(&config.national.catalogue)?;
        Ok(config)
    }

    pub fn claim_timeout(&self) -> Option<Duration> {
        self.claim_timeout_ms.map(Duration::from_millis)
    }

    pub fn with_claim_timeout(mut self, timeout: Duration) -> Self {
        self.claim_timeout_ms = Some(timeout.as_millis() as u64);
        self
    }

    pub fn with_tile_exchange(mut self, exchange: TileExchange) -> Self {
        self.regional.tile_exchange = exchange;
        self
    }
}

fn check_catalogue(catalogue: &[PatternDef]) -> Result<(), ConfigError> {
    for (i, def) in catalogue.iter().enumerate() {
        if catalogue[..i].iter().any(|d| d.pattern == def.pattern) {
            return Err(ConfigError::DuplicatePattern(def.pattern));
        }
    }
    Ok(())
}

/// 血战到底配置
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RegionalConfig {
    /// 加番表
    pub catalogue: Vec<PatternDef>,
    /// 每个杠加番
    pub kong_bonus: u32,
    /// 封顶番数
    pub max_fan: Option<u32>,
    /// 一炮多响时放铳者是否一并离场
    pub retire_discarder_on_multi_win: bool,
    /// 定缺前的换三张
    pub tile_exchange: TileExchange,
}

impl Default for RegionalConfig {
    fn default() -> Self {
        use Pattern::*;
        Self {
            catalogue: vec![
                PatternDef::new(AllSimples, 1),
                PatternDef::new(AllTriplets, 1),
                PatternDef::new(KongReplacement, 1),
                PatternDef::new(LastTile, 1),
                PatternDef::new(RobbingKong, 1),
                // 七对、清一色、大对子只取一个，依次优先
                PatternDef::new(SevenPairs, 2).excluding(&[FullFlush, AllTriplets]),
                PatternDef::new(FullFlush, 1).excluding(&[AllTriplets]),
                PatternDef::new(OutsideHand, 2),
                // 108 张牌中不会出现字牌，保留以便替换牌堆时使用
                PatternDef::new(BigThreeDragons, 8),
                PatternDef::new(BigFourWinds, 8),
                PatternDef::new(ThirteenOrphans, 8),
            ],
            kong_bonus: 1,
            max_fan: Some(8),
            retire_discarder_on_multi_win: false,
            tile_exchange: TileExchange::Random,
        }
    }
}

/// 国标配置
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct NationalConfig {
    /// 番种表
    pub catalogue: Vec<PatternDef>,
    /// 起和番
    pub min_points: u32,
}

impl Default for NationalConfig {
    fn default() -> Self {
        Self {
            catalogue: default_national_catalogue(),
            min_points: 8,
        }
    }
}

/// 国标番种表（81 番种中的 22 种）
pub fn default_national_catalogue() -> Vec<PatternDef> {
    use Pattern::*;
    vec![
        PatternDef::new(BigFourWinds, 88).excluding(&[AllTriplets]),
        PatternDef::new(BigThreeDragons, 88).excluding(&[DragonPung]),
        PatternDef::new(NineGates, 88).excluding(&[FullFlush, ConcealedHand, NoHonors]),
        PatternDef::new(ThirteenOrphans, 88).excluding(&[ConcealedHand]),
        PatternDef::new(AllHonors, 64).excluding(&[AllTriplets, OutsideHand]),
        PatternDef::new(SevenPairs, 24).excluding(&[ConcealedHand]),
        PatternDef::new(FullFlush, 24).excluding(&[NoHonors]),
        PatternDef::new(KongReplacement, 8).excluding(&[SelfDrawn]),
        PatternDef::new(LastTile, 8).excluding(&[SelfDrawn]),
        PatternDef::new(RobbingKong, 8),
        PatternDef::new(AllTriplets, 6),
        PatternDef::new(HalfFlush, 6),
        PatternDef::new(OutsideHand, 4),
        PatternDef::new(DragonPung, 2),
        PatternDef::new(ConcealedHand, 2),
        PatternDef::new(AllChows, 2).excluding(&[NoHonors]),
        PatternDef::new(AllSimples, 2).excluding(&[NoHonors]),
        PatternDef::new(ConcealedKong, 2),
        PatternDef::new(SelfDrawn, 1),
        PatternDef::new(MeldedKong, 1),
        PatternDef::new(NoHonors, 1),
        PatternDef::new(OneVoidedSuit, 1),
    ]
}
