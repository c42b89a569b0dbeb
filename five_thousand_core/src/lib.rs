//! # 5000 骰子游戏核心逻辑库
//!
//! 这个 `core` crate 包含了 5000 骰子游戏的全部规则：掷骰、计分、
//! 锁定骰子、爆掉、开局门槛以及回合结算。
//! 它与具体实现（如界面、设置存储、随机数来源）解耦，
//! 所有状态转移都是 (旧状态, 操作, 设置) -> 新状态 的纯函数。

mod dice;
mod error;
mod logic;
mod message;
mod scoring;
mod session;
mod settings;
mod state;

pub use dice::*;

pub use error::EngineError;

pub use logic::{best_selection, end_turn, evaluate_selection, hold, new_game, roll};

pub use message::*;

pub use scoring::*;

pub use session::Session;

pub use settings::*;

pub use state::*;
