use crate::dice::*;
use crate::error::EngineError;
use crate::message::*;
use crate::scoring::{classify, score, Combination};
use crate::settings::GameSettings;
use crate::state::*;
use tracing::{debug, info};

// --- 核心游戏流程函数 ---

/// 开始新的一局游戏
///
/// 所有玩家总分为 0，第一名玩家先行动，骰池是五颗尚未掷过的新骰子。
pub fn new_game<S: AsRef<str>>(names: &[S]) -> Result<GameState, EngineError> {
    if names.is_empty() {
        return Err(EngineError::NoPlayers);
    }
    if names.len() > MAX_PLAYERS {
        return Err(EngineError::TooManyPlayers(names.len()));
    }

    let players = names
        .iter()
        .map(|name| {
            let name = name.as_ref().trim();
            if name.is_empty() { Err(EngineError::EmptyName) } else { Ok(Player::new(name)) }
        })
        .collect::<Result<Vec<_>, _>>()?;

    let pool = DicePool::fresh(std::array::from_fn(|i| DieId(i as u32)));
    let state = GameState {
        players,
        current_player_idx: 0,
        turn: TurnState { score: 0, pool, phase: TurnPhase::Unrolled },
        game_over: false,
        next_die_id: POOL_SIZE as u32,
    };

    info!(players = state.players.len(), "新的一局开始");
    Ok(state)
}

/// 掷骰
///
/// - 骰池中没有可用骰子时，换上五颗新骰子全部掷出（累计分数保留）。
/// - 否则只重掷可用的骰子。
/// - 掷完后若可用骰子无一得分，则本回合爆掉：累计分数全部作废，轮到下一名玩家。
///
/// 游戏已结束，或上一掷之后还没锁定骰子时，状态原样返回。
pub fn roll(mut state: GameState, source: &mut impl DiceSource) -> Transition {
    assert_playable(&state);
    if state.game_over {
        return Transition::new(state, TurnMessage::IllegalRoll(IllegalRollReason::GameOver));
    }
    if state.turn.phase == TurnPhase::Rolled {
        return Transition::new(state, TurnMessage::IllegalRoll(IllegalRollReason::HoldPending));
    }

    let fresh_set = state.turn.pool.available_count() == 0;
    if fresh_set {
        state.turn.pool = state.fresh_pool();
    }
    state.turn.pool.reroll_available(source);

    let faces = state.turn.pool.faces();
    let potential = score(&state.turn.pool.available_faces());
    if potential == 0 {
        let player_id = state.current_player_id();
        let forfeited = state.turn.score;
        info!(player = %state.current_player().name, ?faces, forfeited, "爆了");
        advance_to_next_player(&mut state);
        return Transition::new(state, TurnMessage::Busted { player_id, faces, forfeited });
    }

    state.turn.phase = TurnPhase::Rolled;
    debug!(player = %state.current_player().name, ?faces, potential, fresh_set, "掷骰");
    Transition::new(state, TurnMessage::Rolled { faces, potential, fresh_set })
}

/// 计算选中骰子的得分，不修改状态
pub fn evaluate_selection(state: &GameState, selected: &[DieId]) -> Result<u32, EngineError> {
    let faces = selected_faces(state, selected)?;
    Ok(score(&faces))
}

/// 锁定选中的骰子
///
/// 得分为 0 的选择被拒绝，状态不变。锁定成功后分数计入本回合；
/// 若五颗骰子全部锁定，立刻换上一组新骰子（"五颗全中"），本回合分数保留。
/// 锁定五个 1 直接获胜：本回合分数入账，游戏结束，不受开局门槛和恰好获胜限制。
pub fn hold(mut state: GameState, selected: &[DieId]) -> Result<Transition, EngineError> {
    assert_playable(&state);
    if state.game_over {
        return Ok(Transition::new(state, TurnMessage::GameOver));
    }
    let faces = selected_faces(&state, selected)?;
    if state.turn.phase == TurnPhase::Unrolled {
        return Ok(Transition::new(state, TurnMessage::NothingRolled));
    }

    let points = score(&faces);
    if points == 0 {
        return Ok(Transition::new(state, TurnMessage::InvalidSelection));
    }

    state.turn.pool.hold_all(selected);
    state.turn.score += points;
    state.turn.phase = TurnPhase::Held;

    if classify(&faces) == Combination::FiveOnes {
        return Ok(win_with_five_ones(state));
    }

    let hot_dice = state.turn.pool.all_held();
    if hot_dice {
        state.turn.pool = state.fresh_pool();
        state.turn.phase = TurnPhase::Unrolled;
    }

    let turn_score = state.turn.score;
    debug!(player = %state.current_player().name, ?faces, points, turn_score, hot_dice, "锁定");
    Ok(Transition::new(state, TurnMessage::Held { points, turn_score, hot_dice }))
}

/// 主动结束回合，由回合结算决定是否入账
pub fn end_turn(state: GameState, settings: &GameSettings) -> Transition {
    assert_playable(&state);
    if state.game_over {
        return Transition::new(state, TurnMessage::GameOver);
    }
    finalize_turn(state, settings)
}

/// 在已掷出的可用骰子中找出得分最高的组合
///
/// 同分时选骰子更少的组合，留下更多骰子可以继续掷。没有已掷出的骰子或全都不得分时返回 None。
pub fn best_selection(state: &GameState) -> Option<(Vec<DieId>, u32)> {
    if state.game_over || state.turn.phase == TurnPhase::Unrolled {
        return None;
    }
    let available: Vec<&Die> = state.turn.pool.dice.iter().filter(|d| d.available).collect();

    let mut best: Option<(u32, u32)> = None; // (得分, 掩码)
    for mask in 1u32..(1 << available.len()) {
        let faces: Vec<u8> = available
            .iter()
            .enumerate()
            .filter(|(i, _)| mask & (1 << i) != 0)
            .map(|(_, d)| d.face)
            .collect();
        let points = score(&faces);
        let better = match best {
            None => points > 0,
            Some((best_points, best_mask)) => {
                points > best_points || (points == best_points && mask.count_ones() < best_mask.count_ones())
            }
        };
        if better {
            best = Some((points, mask));
        }
    }

    best.map(|(points, mask)| {
        let ids = available
            .iter()
            .enumerate()
            .filter(|(i, _)| mask & (1 << i) != 0)
            .map(|(_, d)| d.id)
            .collect();
        (ids, points)
    })
}

// --- 辅助逻辑函数 ---

/// 状态必须来自 `new_game`：至少一名玩家，当前玩家下标有效
fn assert_playable(state: &GameState) {
    assert!(!state.players.is_empty(), "游戏状态中没有玩家");
    assert!(
        state.current_player_idx < state.players.len(),
        "当前玩家下标 {} 越界（共 {} 名玩家）",
        state.current_player_idx,
        state.players.len()
    );
}

/// 锁定五个 1：本回合分数全部入账，当前玩家直接获胜
fn win_with_five_ones(mut state: GameState) -> Transition {
    let player_id = state.current_player_id();
    let turn_score = state.turn.score;
    let idx = state.current_player_idx;
    let player = &mut state.players[idx];
    player.bank(turn_score);
    let total = player.total_score;
    info!(player = %player.name, turn_score, total, "五个 1，直接获胜");

    state.game_over = true;
    state.turn.score = 0;
    Transition::new(state, TurnMessage::Won { player_id, total })
}

/// 校验选中的骰子并取出它们的点数
fn selected_faces(state: &GameState, selected: &[DieId]) -> Result<Vec<u8>, EngineError> {
    if selected.is_empty() {
        return Err(EngineError::EmptySelection);
    }
    let mut faces = Vec::with_capacity(selected.len());
    for (i, id) in selected.iter().enumerate() {
        if selected[..i].contains(id) {
            return Err(EngineError::DuplicateDie(*id));
        }
        let die = state.turn.pool.get(*id).ok_or(EngineError::UnknownDie(*id))?;
        if !die.available {
            return Err(EngineError::DieNotAvailable(*id));
        }
        faces.push(die.face);
    }
    Ok(faces)
}

/// 入账结算的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Settlement {
    FailedOpening,
    NotExact,
    Banked { points: u32, won: bool },
}

/// 根据规则决定本回合分数如何处理，不修改状态
fn settle(player: &Player, turn_score: u32, settings: &GameSettings) -> Settlement {
    // 1. 尚未开局：必须达到开局分数
    if !player.has_opened() && turn_score < settings.opening_score {
        return Settlement::FailedOpening;
    }

    // 2. 已开局（或本回合足以开局）：分数直接加上
    let total = player.total_score + turn_score;

    // 3. 必须恰好获胜时，超出即作废
    if settings.must_win_on_exact_score && total > settings.victory_score {
        return Settlement::NotExact;
    }

    // 4. 胜负判定
    let won = if settings.must_win_on_exact_score {
        total == settings.victory_score
    } else {
        total >= settings.victory_score
    };
    Settlement::Banked { points: turn_score, won }
}

/// 回合结算
///
/// 处理开局门槛、恰好获胜和胜负判定。没有获胜时轮到下一名玩家，获胜的玩家保持为当前玩家。
fn finalize_turn(mut state: GameState, settings: &GameSettings) -> Transition {
    let idx = state.current_player_idx;
    let player_id = state.players[idx].id;

    let mut turn_score = state.turn.score;
    if !settings.allow_fifty_point_scores {
        turn_score -= turn_score % 100;
    }

    let message = match settle(&state.players[idx], turn_score, settings) {
        Settlement::FailedOpening => {
            info!(player = %state.players[idx].name, turn_score, needed = settings.opening_score, "开局失败");
            TurnMessage::FailedOpening { player_id, needed: settings.opening_score, turn_score }
        }
        Settlement::NotExact => {
            info!(player = %state.players[idx].name, turn_score, "超出获胜分数，本回合作废");
            TurnMessage::ScoreNotExact { player_id, turn_score, victory_score: settings.victory_score }
        }
        Settlement::Banked { points, won } => {
            let player = &mut state.players[idx];
            if points > 0 {
                player.bank(points);
            }
            let total = player.total_score;
            info!(player = %player.name, banked = points, total, "入账");
            if won {
                info!(player = %player.name, total, "获胜");
                state.game_over = true;
                state.turn.score = 0;
                return Transition::new(state, TurnMessage::Won { player_id, total });
            }
            TurnMessage::Banked { player_id, banked: points, total }
        }
    };

    advance_to_next_player(&mut state);
    Transition::new(state, message)
}

/// 将行动权交给下一名玩家，并准备一个新回合
fn advance_to_next_player(state: &mut GameState) {
    state.current_player_idx = (state.current_player_idx + 1) % state.players.len();
    state.reset_turn();
}

// --- 单元测试 ---

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    // 辅助函数：按下标取当前骰池中骰子的标识
    fn ids_at(state: &GameState, positions: &[usize]) -> Vec<DieId> {
        positions.iter().map(|&i| state.turn.pool.dice[i].id).collect()
    }

    fn two_players() -> GameState {
        new_game(&["Alice", "Bob"]).unwrap()
    }

    fn roll_faces(state: GameState, faces: &[u8]) -> Transition {
        roll(state, &mut ScriptedDice::new(faces))
    }

    fn exact_settings() -> GameSettings {
        GameSettings { must_win_on_exact_score: true, ..GameSettings::default() }
    }

    #[test]
    fn test_new_game() {
        let state = two_players();
        assert_eq!(state.players.len(), 2);
        assert_eq!(state.current_player_idx, 0);
        assert!(!state.game_over);
        assert_eq!(state.turn.score, 0);
        assert_eq!(state.turn.phase, TurnPhase::Unrolled);
        assert!(state.players.iter().all(|p| p.total_score == 0 && p.history.is_empty()));
        assert_eq!(state.turn.pool.available_count(), POOL_SIZE);
    }

    #[test]
    fn test_new_game_rejects_bad_players() {
        let none: [&str; 0] = [];
        assert_eq!(new_game(&none), Err(EngineError::NoPlayers));
        assert_eq!(new_game(&["a", "b", "c", "d", "e", "f"]), Err(EngineError::TooManyPlayers(6)));
        assert_eq!(new_game(&["a", "  "]), Err(EngineError::EmptyName));
        assert!(new_game(&["solo"]).is_ok());
    }

    #[test]
    fn test_scenario_open_and_pass() {
        // 双人局，默认设置；玩家一掷出 1,1,1,2,3，锁定三个 1 后入账
        let state = two_players();
        let t = roll_faces(state, &[1, 1, 1, 2, 3]);
        assert_eq!(t.message, TurnMessage::Rolled { faces: [1, 1, 1, 2, 3], potential: 1000, fresh_set: false });

        let ones = ids_at(&t.state, &[0, 1, 2]);
        let t = hold(t.state, &ones).unwrap();
        assert_eq!(t.message, TurnMessage::Held { points: 1000, turn_score: 1000, hot_dice: false });

        let p1 = t.state.players[0].id;
        let t = end_turn(t.state, &GameSettings::default());
        assert_eq!(t.message, TurnMessage::Banked { player_id: p1, banked: 1000, total: 1000 });
        assert_eq!(t.state.players[0].total_score, 1000);
        assert_eq!(t.state.current_player_idx, 1);
        assert_eq!(t.state.turn.score, 0);
        assert_eq!(t.state.turn.phase, TurnPhase::Unrolled);
    }

    #[test]
    fn test_scenario_bust_keeps_total() {
        // 已开局（600 分）的玩家掷出 2,3,4,6,6，立即爆掉
        let mut state = two_players();
        state.players[0].bank(600);
        let p1 = state.players[0].id;

        let t = roll_faces(state, &[2, 3, 4, 6, 6]);
        assert_eq!(t.message, TurnMessage::Busted { player_id: p1, faces: [2, 3, 4, 6, 6], forfeited: 0 });
        assert!(t.message.ends_turn());
        assert_eq!(t.state.players[0].total_score, 600);
        assert_eq!(t.state.current_player_idx, 1);
        assert_eq!(t.state.turn.score, 0);
    }

    #[test]
    fn test_scenario_exact_score_voids_overshoot() {
        let mut state = two_players();
        state.players[0].bank(4800);
        let p1 = state.players[0].id;

        let t = roll_faces(state, &[3, 3, 3, 2, 4]);
        let threes = ids_at(&t.state, &[0, 1, 2]);
        let t = hold(t.state, &threes).unwrap();
        assert_eq!(t.state.turn.score, 300);

        let t = end_turn(t.state, &exact_settings());
        assert_eq!(t.message, TurnMessage::ScoreNotExact { player_id: p1, turn_score: 300, victory_score: 5000 });
        assert_eq!(t.state.players[0].total_score, 4800);
        assert_eq!(t.state.players[0].history.len(), 1);
        assert!(!t.state.game_over);
        assert_eq!(t.state.current_player_idx, 1);
    }

    #[test]
    fn test_scenario_overshoot_wins_without_exact_rule() {
        let mut state = two_players();
        state.players[0].bank(4800);
        let p1 = state.players[0].id;

        let t = roll_faces(state, &[3, 3, 3, 2, 4]);
        let threes = ids_at(&t.state, &[0, 1, 2]);
        let t = hold(t.state, &threes).unwrap();

        let t = end_turn(t.state, &GameSettings::default());
        assert_eq!(t.message, TurnMessage::Won { player_id: p1, total: 5100 });
        assert!(t.state.game_over);
        assert_eq!(t.state.current_player_idx, 0);
        assert_eq!(t.state.winner().map(|p| p.id), Some(p1));
    }

    #[test]
    fn test_exact_score_win() {
        let mut state = two_players();
        state.players[0].bank(4700);
        let t = roll_faces(state, &[3, 3, 3, 2, 4]);
        let threes = ids_at(&t.state, &[0, 1, 2]);
        let t = hold(t.state, &threes).unwrap();

        let t = end_turn(t.state, &exact_settings());
        assert!(matches!(t.message, TurnMessage::Won { total: 5000, .. }));
        assert!(t.state.game_over);
    }

    #[test]
    fn test_failed_opening_discards_score() {
        let state = two_players();
        let t = roll_faces(state, &[1, 5, 2, 3, 4]);
        // 1-2-3-4-5 是顺子，这里只锁定 1 和 5
        let dice = ids_at(&t.state, &[0, 1]);
        let t = hold(t.state, &dice).unwrap();
        assert_eq!(t.state.turn.score, 150);

        let p1 = t.state.players[0].id;
        let t = end_turn(t.state, &GameSettings::default());
        assert_eq!(t.message, TurnMessage::FailedOpening { player_id: p1, needed: 500, turn_score: 150 });
        assert_eq!(t.message.to_string(), "需要 500 分才能开局");
        assert_eq!(t.state.players[0].total_score, 0);
        assert!(!t.state.players[0].has_opened());
        assert_eq!(t.state.current_player_idx, 1);
    }

    #[test]
    fn test_opened_player_banks_any_score() {
        let mut state = two_players();
        state.players[0].bank(500);
        let t = roll_faces(state, &[5, 2, 3, 4, 6]);
        let five = ids_at(&t.state, &[0]);
        let t = hold(t.state, &five).unwrap();
        let t = end_turn(t.state, &GameSettings::default());
        assert!(matches!(t.message, TurnMessage::Banked { banked: 50, total: 550, .. }));
        assert_eq!(t.state.players[0].history.len(), 2);
    }

    #[test]
    fn test_fifty_point_remainder_dropped_when_disallowed() {
        let mut state = two_players();
        state.players[0].bank(500);
        let t = roll_faces(state, &[1, 5, 2, 2, 3]);
        let dice = ids_at(&t.state, &[0, 1]);
        let t = hold(t.state, &dice).unwrap();
        assert_eq!(t.state.turn.score, 150);

        let settings = GameSettings { allow_fifty_point_scores: false, ..GameSettings::default() };
        let t = end_turn(t.state, &settings);
        assert!(matches!(t.message, TurnMessage::Banked { banked: 100, total: 600, .. }));
    }

    #[test]
    fn test_fifty_point_rounding_applies_before_opening() {
        // 550 分向下取整为 500，仍然够开局
        let t = roll_faces(two_players(), &[5, 5, 5, 5, 2]);
        let fives = ids_at(&t.state, &[0, 1, 2, 3]);
        let t = hold(t.state, &fives).unwrap();
        assert_eq!(t.state.turn.score, 550);

        let settings = GameSettings { allow_fifty_point_scores: false, ..GameSettings::default() };
        let t = end_turn(t.state, &settings);
        assert!(matches!(t.message, TurnMessage::Banked { banked: 500, total: 500, .. }));
        assert!(t.state.players[0].has_opened());
        assert_eq!(t.state.current_player_idx, 1);
    }

    #[test]
    fn test_fifty_point_rounding_applies_before_win_check() {
        // 4950 + 50：取整后入账 0 分，不能凭这 50 分获胜
        let mut state = two_players();
        state.players[0].bank(4950);
        let t = roll_faces(state, &[5, 2, 3, 4, 6]);
        let five = ids_at(&t.state, &[0]);
        let t = hold(t.state, &five).unwrap();
        assert_eq!(t.state.turn.score, 50);

        let settings = GameSettings { allow_fifty_point_scores: false, ..GameSettings::default() };
        let t = end_turn(t.state, &settings);
        assert!(matches!(t.message, TurnMessage::Banked { banked: 0, total: 4950, .. }));
        assert!(!t.state.game_over);
        assert_eq!(t.state.players[0].history.len(), 1);
        assert_eq!(t.state.current_player_idx, 1);
    }

    #[test]
    fn test_invalid_selection_leaves_state_unchanged() {
        let state = two_players();
        let t = roll_faces(state, &[1, 2, 3, 4, 6]);
        let before = t.state.clone();

        let junk = ids_at(&t.state, &[1, 2]);
        let t = hold(t.state, &junk).unwrap();
        assert_eq!(t.message, TurnMessage::InvalidSelection);
        assert!(t.message.is_rejection());
        assert_eq!(t.state, before);

        // 再来一次结果相同
        let t = hold(t.state, &junk).unwrap();
        assert_eq!(t.message, TurnMessage::InvalidSelection);
        assert_eq!(t.state, before);
    }

    #[test]
    fn test_selection_errors() {
        let state = two_players();
        let t = roll_faces(state, &[1, 1, 2, 3, 4]);
        let one = ids_at(&t.state, &[0]);

        assert_eq!(evaluate_selection(&t.state, &[]), Err(EngineError::EmptySelection));
        assert_eq!(evaluate_selection(&t.state, &[DieId(99)]), Err(EngineError::UnknownDie(DieId(99))));
        assert_eq!(evaluate_selection(&t.state, &[one[0], one[0]]), Err(EngineError::DuplicateDie(one[0])));
        assert_eq!(evaluate_selection(&t.state, &one), Ok(100));

        let t = hold(t.state, &one).unwrap();
        assert_eq!(evaluate_selection(&t.state, &one), Err(EngineError::DieNotAvailable(one[0])));
        assert_eq!(hold(t.state, &one).unwrap_err(), EngineError::DieNotAvailable(one[0]));
    }

    #[test]
    fn test_evaluate_selection_is_read_only() {
        let t = roll_faces(two_players(), &[1, 1, 1, 5, 5]);
        let before = t.state.clone();
        let all = ids_at(&t.state, &[0, 1, 2, 3, 4]);
        assert_eq!(evaluate_selection(&t.state, &all), Ok(1100));
        assert_eq!(t.state, before);
    }

    #[test]
    fn test_hold_before_roll_rejected() {
        let state = two_players();
        let before = state.clone();
        let all = ids_at(&state, &[0, 1, 2, 3, 4]);
        let t = hold(state, &all).unwrap();
        assert_eq!(t.message, TurnMessage::NothingRolled);
        assert_eq!(t.state, before);
    }

    #[test]
    fn test_roll_requires_hold_in_between() {
        let t = roll_faces(two_players(), &[1, 2, 3, 4, 6]);
        let before = t.state.clone();
        let t = roll(t.state, &mut ScriptedDice::default());
        assert_eq!(t.message, TurnMessage::IllegalRoll(IllegalRollReason::HoldPending));
        assert_eq!(t.state, before);
    }

    #[test]
    fn test_reroll_only_available_dice() {
        let t = roll_faces(two_players(), &[1, 2, 3, 4, 6]);
        let one = ids_at(&t.state, &[0]);
        let t = hold(t.state, &one).unwrap();

        let mut source = ScriptedDice::new(&[5, 5, 5, 2]);
        let t = roll(t.state, &mut source);
        assert_eq!(source.remaining(), 0);
        assert_eq!(t.state.turn.pool.faces(), [1, 5, 5, 5, 2]);
        assert!(t.state.turn.pool.dice[0].held);
        assert_eq!(t.message, TurnMessage::Rolled { faces: [1, 5, 5, 5, 2], potential: 500, fresh_set: false });
    }

    #[test]
    fn test_hot_dice_resets_pool_and_keeps_score() {
        let t = roll_faces(two_players(), &[1, 2, 3, 4, 5]);
        let old_ids = ids_at(&t.state, &[0, 1, 2, 3, 4]);
        let t = hold(t.state, &old_ids).unwrap();
        assert_eq!(t.message, TurnMessage::Held { points: 1500, turn_score: 1500, hot_dice: true });
        assert_eq!(t.state.turn.pool.available_count(), POOL_SIZE);
        assert!(t.state.turn.pool.dice.iter().all(|d| !d.held && !old_ids.contains(&d.id)));
        assert_eq!(t.state.turn.phase, TurnPhase::Unrolled);

        let t = roll_faces(t.state, &[1, 2, 2, 3, 4]);
        let one = ids_at(&t.state, &[0]);
        let t = hold(t.state, &one).unwrap();
        assert_eq!(t.state.turn.score, 1600);
    }

    #[test]
    fn test_roll_with_no_available_dice_takes_fresh_set() {
        let mut state = roll_faces(two_players(), &[1, 1, 1, 5, 5]).state;
        let all = ids_at(&state, &[0, 1, 2, 3, 4]);
        state.turn.pool.hold_all(&all);
        state.turn.phase = TurnPhase::Held;

        let t = roll_faces(state, &[2, 2, 2, 3, 4]);
        assert!(matches!(t.message, TurnMessage::Rolled { fresh_set: true, potential: 200, .. }));
        let pool = &t.state.turn.pool;
        assert_eq!(pool.dice.len(), POOL_SIZE);
        assert!(pool.dice.iter().all(|d| d.available && !d.held));
        assert!(pool.dice.iter().all(|d| !all.contains(&d.id)));
    }

    #[test]
    fn test_bust_forfeits_whole_turn() {
        let mut state = two_players();
        state.players[0].bank(1000);
        let p1 = state.players[0].id;

        let t = roll_faces(state, &[1, 1, 1, 2, 3]);
        let ones = ids_at(&t.state, &[0, 1, 2]);
        let t = hold(t.state, &ones).unwrap();
        let t = roll_faces(t.state, &[4, 6]);
        assert_eq!(t.message, TurnMessage::Busted { player_id: p1, faces: [1, 1, 1, 4, 6], forfeited: 1000 });
        assert_eq!(t.state.players[0].total_score, 1000);
        assert_eq!(t.state.current_player_idx, 1);
        assert_eq!(t.state.turn.score, 0);
    }

    #[test]
    fn test_turn_rotation_wraps() {
        let mut state = new_game(&["a", "b", "c"]).unwrap();
        for expected in [1, 2, 0, 1] {
            state = end_turn(state, &GameSettings::default()).state;
            assert_eq!(state.current_player_idx, expected);
        }
    }

    #[test]
    fn test_single_player_rotation() {
        let state = new_game(&["solo"]).unwrap();
        let t = roll_faces(state, &[2, 3, 4, 6, 6]);
        assert!(matches!(t.message, TurnMessage::Busted { .. }));
        assert_eq!(t.state.current_player_idx, 0);
        assert_eq!(t.state.turn.phase, TurnPhase::Unrolled);
    }

    #[test]
    fn test_five_ones_wins_immediately() {
        let state = two_players();
        let p1 = state.players[0].id;

        let t = roll_faces(state, &[1, 1, 1, 1, 1]);
        assert!(!t.state.game_over);
        let all = ids_at(&t.state, &[0, 1, 2, 3, 4]);
        let t = hold(t.state, &all).unwrap();
        assert_eq!(t.message, TurnMessage::Won { player_id: p1, total: 5000 });
        assert!(t.state.game_over);
        assert_eq!(t.state.winner().map(|p| p.id), Some(p1));
        assert_eq!(t.state.turn.score, 0);

        // 不会再有掷骰把 5000 分爆掉
        let t = roll_faces(t.state, &[2, 3, 4, 6, 6]);
        assert_eq!(t.message, TurnMessage::IllegalRoll(IllegalRollReason::GameOver));
        assert_eq!(t.state.players[0].total_score, 5000);
    }

    #[test]
    fn test_five_ones_win_past_victory_score() {
        // 已有 1000 分，五个 1 直接获胜，不经过恰好获胜的结算
        let mut state = two_players();
        state.players[0].bank(1000);
        let t = roll_faces(state, &[1, 1, 1, 1, 1]);
        let all = ids_at(&t.state, &[0, 1, 2, 3, 4]);
        let t = hold(t.state, &all).unwrap();
        assert!(matches!(t.message, TurnMessage::Won { total: 6000, .. }));
        assert!(t.state.game_over);

        let t = end_turn(t.state, &exact_settings());
        assert_eq!(t.message, TurnMessage::GameOver);
        assert_eq!(t.state.players[0].total_score, 6000);
    }

    #[test]
    #[should_panic(expected = "游戏状态中没有玩家")]
    fn test_state_without_players_is_rejected() {
        let mut state = two_players();
        state.players.clear();
        roll_faces(state, &[1, 2, 3, 4, 6]);
    }

    #[test]
    fn test_actions_after_game_over_are_ignored() {
        let mut state = two_players();
        state.game_over = true;
        let before = state.clone();

        let t = roll(state, &mut ScriptedDice::new(&[1, 1, 1, 1, 1]));
        assert_eq!(t.message, TurnMessage::IllegalRoll(IllegalRollReason::GameOver));
        assert_eq!(t.state, before);

        let ids = ids_at(&t.state, &[0]);
        let t = hold(t.state, &ids).unwrap();
        assert_eq!(t.message, TurnMessage::GameOver);

        let t = end_turn(t.state, &GameSettings::default());
        assert_eq!(t.message, TurnMessage::GameOver);
        assert_eq!(t.state, before);
    }

    #[test]
    fn test_best_selection() {
        let state = two_players();
        assert!(best_selection(&state).is_none());

        let t = roll_faces(state, &[1, 5, 5, 3, 1]);
        let (ids, points) = best_selection(&t.state).unwrap();
        assert_eq!(points, 300);
        assert_eq!(ids, ids_at(&t.state, &[0, 1, 2, 4]));

        // 同分时选骰子更少的组合：5,5,5 与 5,5,5,2 都是 500
        let t = roll_faces(two_players(), &[5, 2, 5, 5, 3]);
        let (ids, points) = best_selection(&t.state).unwrap();
        assert_eq!(points, 500);
        assert_eq!(ids, ids_at(&t.state, &[0, 2, 3]));
    }

    #[test]
    fn test_random_playouts_keep_invariants() {
        let settings = GameSettings::default();
        let mut source = RngDice(ChaCha8Rng::seed_from_u64(42));

        for _ in 0..20 {
            let mut state = new_game(&["a", "b", "c"]).unwrap();
            let mut steps = 0;
            while !state.game_over {
                steps += 1;
                assert!(steps < 100_000, "游戏没有结束");

                let t = roll(state, &mut source);
                state = t.state;
                if t.message.ends_turn() {
                    continue;
                }
                let (ids, _) = best_selection(&state).expect("没爆就一定有得分组合");
                state = hold(state, &ids).unwrap().state;

                for die in &state.turn.pool.dice {
                    assert!(!(die.held && die.available));
                    assert!((1..=6).contains(&die.face));
                }
                assert_eq!(state.turn.score % 50, 0);

                if state.turn.score >= 600 {
                    state = end_turn(state, &settings).state;
                }
            }
            let winner = state.winner().unwrap();
            assert!(winner.total_score >= settings.victory_score);
        }
    }
}
