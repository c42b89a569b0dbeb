use crate::dice::DieId;
use thiserror::Error;

/// 调用方违反前置条件时的错误
///
/// 这些都是集成错误。"选中的骰子不得分"、"开局分数不够"之类的规则性拒绝
/// 不在这里，它们通过 [`crate::TurnMessage`] 随新状态一起返回。
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("至少需要一名玩家")]
    NoPlayers,
    #[error("玩家人数 {0} 超过上限 {max}", max = crate::state::MAX_PLAYERS)]
    TooManyPlayers(usize),
    #[error("玩家名字不能为空")]
    EmptyName,
    #[error("没有选中任何骰子")]
    EmptySelection,
    #[error("骰池中没有骰子 {0:?}")]
    UnknownDie(DieId),
    #[error("骰子 {0:?} 已锁定，不能再选")]
    DieNotAvailable(DieId),
    #[error("骰子 {0:?} 被重复选中")]
    DuplicateDie(DieId),
}
