//! 单局游戏的持有者
//!
//! 一个 [`Session`] 独占一局游戏的状态、设置来源和点数来源，所有操作都经由它串行执行。

use crate::dice::{DiceSource, DieId};
use crate::error::EngineError;
use crate::logic;
use crate::message::TurnMessage;
use crate::settings::SettingsProvider;
use crate::state::GameState;
use std::mem;
use tracing::debug;

pub struct Session<S: SettingsProvider, D: DiceSource> {
    state: GameState,
    // 之前的状态，用于撤销
    past: Vec<GameState>,
    settings: S,
    dice: D,
}

impl<S: SettingsProvider, D: DiceSource> Session<S, D> {
    pub fn new<N: AsRef<str>>(names: &[N], settings: S, dice: D) -> Result<Self, EngineError> {
        Ok(Session { state: logic::new_game(names)?, past: Vec::new(), settings, dice })
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn settings(&self) -> &S {
        &self.settings
    }

    /// 重新开一局，之前的状态和撤销记录全部丢弃
    pub fn new_game<N: AsRef<str>>(&mut self, names: &[N]) -> Result<(), EngineError> {
        self.state = logic::new_game(names)?;
        self.past.clear();
        Ok(())
    }

    pub fn roll(&mut self) -> TurnMessage {
        let t = logic::roll(self.state.clone(), &mut self.dice);
        self.apply(t.state, t.message)
    }

    pub fn evaluate_selection(&self, selected: &[DieId]) -> Result<u32, EngineError> {
        logic::evaluate_selection(&self.state, selected)
    }

    pub fn hold(&mut self, selected: &[DieId]) -> Result<TurnMessage, EngineError> {
        let t = logic::hold(self.state.clone(), selected)?;
        Ok(self.apply(t.state, t.message))
    }

    /// 结束回合，使用此刻的设置快照结算
    pub fn end_turn(&mut self) -> TurnMessage {
        let settings = self.settings.snapshot();
        let t = logic::end_turn(self.state.clone(), &settings);
        self.apply(t.state, t.message)
    }

    /// 回到上一个状态，没有可撤销的操作时返回 false
    pub fn undo(&mut self) -> bool {
        match self.past.pop() {
            Some(previous) => {
                self.state = previous;
                true
            }
            None => false,
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    fn apply(&mut self, next: GameState, message: TurnMessage) -> TurnMessage {
        // 被拒绝的操作状态不变，不记入撤销
        if !message.is_rejection() {
            self.past.push(mem::replace(&mut self.state, next));
        }
        debug!(%message, "状态更新");
        message
    }
}
