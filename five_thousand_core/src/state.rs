use crate::dice::{DicePool, DieId, POOL_SIZE};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type PlayerId = Uuid;

/// 一局最多的玩家数
pub const MAX_PLAYERS: usize = 5;
/// 三条命规则下每名玩家的初始命数
pub const STARTING_LIVES: u8 = 3;

/// 整局游戏的唯一状态
/// 每次状态转移都返回一份新的 GameState，而不是在原处修改。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    pub players: Vec<Player>, // 按行动顺序排列
    pub current_player_idx: usize,
    pub turn: TurnState,
    pub game_over: bool,
    // 下一颗新骰子使用的标识
    pub next_die_id: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub total_score: u32, // 已入账的总分
    // 每次入账后的总分，按时间顺序
    pub history: Vec<BankEvent>,
    pub lives: u8,
}

/// 一次入账记录
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankEvent {
    pub banked: u32,
    pub total_after: u32,
}

/// 当前回合的进度
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnState {
    /// 本回合已锁定、尚未入账的分数
    pub score: u32,
    pub pool: DicePool,
    pub phase: TurnPhase,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TurnPhase {
    /// 一组新骰子还没掷过（回合开始，或五颗全中之后）
    Unrolled,
    /// 刚掷过骰，必须先锁定得分骰子才能再掷
    Rolled,
    /// 这一掷之后已经锁定过骰子，可以继续锁定、再掷或入账
    Held,
}

// --- Player 的实现方法 ---

impl Player {
    pub fn new(name: impl Into<String>) -> Player {
        Player {
            id: Uuid::new_v4(),
            name: name.into(),
            total_score: 0,
            history: Vec::new(),
            lives: STARTING_LIVES,
        }
    }

    /// 是否已经开局（有过一次成功入账）
    pub fn has_opened(&self) -> bool {
        self.history.iter().any(|e| e.total_after > 0)
    }

    pub(crate) fn bank(&mut self, points: u32) {
        self.total_score += points;
        self.history.push(BankEvent { banked: points, total_after: self.total_score });
    }
}

// --- GameState 的实现方法 ---

impl GameState {
    pub fn current_player(&self) -> &Player {
        &self.players[self.current_player_idx]
    }

    pub fn current_player_id(&self) -> PlayerId {
        self.current_player().id
    }

    pub fn player(&self, id: &PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == *id)
    }

    /// 游戏结束时，赢家就是最后行动的玩家
    pub fn winner(&self) -> Option<&Player> {
        self.game_over.then(|| self.current_player())
    }

    /// 按总分从高到低排列，同分保持座次
    pub fn standings(&self) -> Vec<&Player> {
        let mut ranked: Vec<&Player> = self.players.iter().collect();
        ranked.sort_by(|a, b| b.total_score.cmp(&a.total_score));
        ranked
    }

    /// 发出五颗新骰子
    pub(crate) fn fresh_pool(&mut self) -> DicePool {
        let base = self.next_die_id;
        self.next_die_id += POOL_SIZE as u32;
        DicePool::fresh(std::array::from_fn(|i| DieId(base + i as u32)))
    }

    /// 为下一名玩家准备新回合
    pub(crate) fn reset_turn(&mut self) {
        let pool = self.fresh_pool();
        self.turn = TurnState { score: 0, pool, phase: TurnPhase::Unrolled };
    }
}
