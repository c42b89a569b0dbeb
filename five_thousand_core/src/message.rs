use crate::dice::POOL_SIZE;
use crate::state::{GameState, PlayerId};
use serde::{Deserialize, Serialize};
use std::fmt;

// --- 状态转移的结果 ---
// 每个操作都返回新的状态，以及一条可以直接展示给玩家的消息。
// 规则性的拒绝（选错骰子、开局失败等）也在这里，调用方对消息做模式匹配即可。

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    pub state: GameState,
    pub message: TurnMessage,
}

impl Transition {
    pub fn new(state: GameState, message: TurnMessage) -> Self {
        Transition { state, message }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TurnMessage {
    /// 掷骰完成，还有得分的可能
    Rolled {
        faces: [u8; POOL_SIZE],
        /// 可用骰子全部锁定时能拿到的分数
        potential: u32,
        /// 这一掷是否换了一整组新骰子
        fresh_set: bool,
    },
    /// 可用骰子无一得分，本回合累计分数作废，轮到下一名玩家
    Busted {
        player_id: PlayerId,
        faces: [u8; POOL_SIZE],
        forfeited: u32,
    },
    /// 锁定成功
    Held {
        points: u32,
        turn_score: u32,
        /// 五颗骰子全部得分，已换上一组新骰子
        hot_dice: bool,
    },
    /// 选中的骰子不得分，状态未变
    InvalidSelection,
    /// 这组骰子还没掷过，不能锁定，状态未变
    NothingRolled,
    /// 当前不能掷骰，状态未变
    IllegalRoll(IllegalRollReason),
    /// 回合分数已入账
    Banked {
        player_id: PlayerId,
        banked: u32,
        total: u32,
    },
    /// 尚未开局且回合分数不够，本回合分数作废
    FailedOpening {
        player_id: PlayerId,
        needed: u32,
        turn_score: u32,
    },
    /// 必须恰好达到获胜分数，而这次入账会超出，本回合作废
    ScoreNotExact {
        player_id: PlayerId,
        turn_score: u32,
        victory_score: u32,
    },
    /// 玩家达到获胜分数，游戏结束
    Won {
        player_id: PlayerId,
        total: u32,
    },
    /// 游戏已经结束，操作被忽略
    GameOver,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IllegalRollReason {
    GameOver,
    /// 上一掷之后还没有锁定骰子
    HoldPending,
}

impl TurnMessage {
    /// 操作是否被拒绝（状态原样返回）
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            TurnMessage::InvalidSelection
                | TurnMessage::NothingRolled
                | TurnMessage::IllegalRoll(_)
                | TurnMessage::GameOver
        )
    }

    /// 本条消息之后是否已轮到下一名玩家
    pub fn ends_turn(&self) -> bool {
        matches!(
            self,
            TurnMessage::Busted { .. }
                | TurnMessage::Banked { .. }
                | TurnMessage::FailedOpening { .. }
                | TurnMessage::ScoreNotExact { .. }
        )
    }
}

impl fmt::Display for TurnMessage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TurnMessage::Rolled { faces, potential, .. } => {
                write!(f, "掷出 {:?}，最多可得 {} 分", faces, potential)
            }
            TurnMessage::Busted { forfeited, .. } => {
                write!(f, "爆了！本回合的 {} 分作废", forfeited)
            }
            TurnMessage::Held { points, turn_score, hot_dice } => {
                write!(f, "锁定 {} 分，本回合共 {} 分", points, turn_score)?;
                if *hot_dice {
                    write!(f, "，五颗全中，换一组新骰子")?;
                }
                Ok(())
            }
            TurnMessage::InvalidSelection => write!(f, "这些骰子不得分"),
            TurnMessage::NothingRolled => write!(f, "请先掷骰"),
            TurnMessage::IllegalRoll(IllegalRollReason::GameOver) => write!(f, "游戏已结束，不能再掷"),
            TurnMessage::IllegalRoll(IllegalRollReason::HoldPending) => write!(f, "请先锁定得分的骰子"),
            TurnMessage::Banked { banked, total, .. } => write!(f, "入账 {} 分，总分 {}", banked, total),
            TurnMessage::FailedOpening { needed, .. } => write!(f, "需要 {} 分才能开局", needed),
            TurnMessage::ScoreNotExact { victory_score, .. } => {
                write!(f, "分数不精确：必须恰好达到 {} 分", victory_score)
            }
            TurnMessage::Won { total, .. } => write!(f, "以 {} 分获胜！", total),
            TurnMessage::GameOver => write!(f, "游戏已结束"),
        }
    }
}
