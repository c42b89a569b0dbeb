//! 游戏规则设置
//!
//! 设置由外部存储持久化，核心只读取不可变的快照。

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;
use tracing::warn;

use crate::scoring::SINGLE_FIVE_POINTS;

/// 读取或校验设置时的错误
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("读取设置文件失败: {0}")]
    Io(#[from] std::io::Error),
    #[error("解析设置 JSON 失败: {0}")]
    Json(#[from] serde_json::Error),
    #[error("设置无效: {0}")]
    Invalid(String),
}

/// 单局游戏的规则快照
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSettings {
    /// 首次入账至少需要的回合得分
    #[serde(default = "default_opening_score")]
    pub opening_score: u32,
    /// 获胜所需总分
    #[serde(default = "default_victory_score")]
    pub victory_score: u32,
    /// 必须恰好达到获胜分数，超出则本回合作废
    #[serde(default)]
    pub must_win_on_exact_score: bool,
    /// 与对手同分时清零对手（暂未实现）
    #[serde(default)]
    pub cancel_opponent_score: bool,
    /// 是否允许以 50 结尾的入账
    #[serde(default = "default_true")]
    pub allow_fifty_point_scores: bool,
    /// 三条命规则（暂未实现）
    #[serde(default)]
    pub three_lives_rule: bool,
    /// 过牌时下家可接手（暂未实现）
    #[serde(default)]
    pub steal_on_pass: bool,
}

fn default_opening_score() -> u32 {
    500
}

fn default_victory_score() -> u32 {
    5000
}

fn default_true() -> bool {
    true
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            opening_score: default_opening_score(),
            victory_score: default_victory_score(),
            must_win_on_exact_score: false,
            cancel_opponent_score: false,
            allow_fifty_point_scores: true,
            three_lives_rule: false,
            steal_on_pass: false,
        }
    }
}

impl GameSettings {
    /// 从 JSON 字符串读取，缺省字段取默认值
    pub fn from_json_str(s: &str) -> Result<Self, SettingsError> {
        let settings: GameSettings = serde_json::from_str(s)?;
        settings.validate()?;
        Ok(settings)
    }

    /// 从 JSON 文件读取
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let content = fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.victory_score == 0 {
            return Err(SettingsError::Invalid("获胜分数必须大于 0".into()));
        }
        if self.opening_score > self.victory_score {
            return Err(SettingsError::Invalid(format!(
                "开局分数 {} 不能高于获胜分数 {}",
                self.opening_score, self.victory_score
            )));
        }
        for (name, value) in [("opening_score", self.opening_score), ("victory_score", self.victory_score)] {
            if value % SINGLE_FIVE_POINTS != 0 {
                return Err(SettingsError::Invalid(format!("{} 必须是 50 的倍数: {}", name, value)));
            }
        }
        Ok(())
    }
}

// --- 设置来源 ---

/// 每个决策点提供一份设置快照
pub trait SettingsProvider {
    fn snapshot(&self) -> GameSettings;
}

/// 固定不变的设置
impl SettingsProvider for GameSettings {
    fn snapshot(&self) -> GameSettings {
        self.clone()
    }
}

/// 每次取快照时重新读取 JSON 文件
///
/// 文件读取或解析失败时沿用上一份有效的快照。
#[derive(Debug)]
pub struct JsonSettingsFile {
    path: PathBuf,
    last_good: Mutex<GameSettings>,
}

impl JsonSettingsFile {
    /// 首次读取失败直接返回错误
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, SettingsError> {
        let path = path.into();
        let settings = GameSettings::load(&path)?;
        Ok(Self { path, last_good: Mutex::new(settings) })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SettingsProvider for JsonSettingsFile {
    fn snapshot(&self) -> GameSettings {
        let mut last_good = self.last_good.lock().unwrap_or_else(|e| e.into_inner());
        match GameSettings::load(&self.path) {
            Ok(settings) => {
                *last_good = settings.clone();
                settings
            }
            Err(e) => {
                warn!("重新读取设置 {} 失败，沿用上一份设置: {}", self.path.display(), e);
                last_good.clone()
            }
        }
    }
}

// --- 单元测试 ---
