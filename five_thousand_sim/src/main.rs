use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use five_thousand_core::{
    best_selection, DiceSource, GameSettings, GameState, JsonSettingsFile, RngDice, Session, SettingsProvider,
};

/// 用简单策略自动对局，统计各玩家胜率
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// 玩家名字，逗号分隔
    #[arg(short, long, value_delimiter = ',', default_value = "Alice,Bob")]
    players: Vec<String>,

    #[arg(short, long, default_value_t = 100)]
    games: u32,

    #[arg(short, long, default_value_t = 42)]
    seed: u64,

    /// 规则设置 JSON 文件，缺省使用默认规则
    #[arg(long)]
    settings: Option<PathBuf>,

    /// 回合分数达到多少就入账
    #[arg(long, default_value_t = 350)]
    bank_at: u32,

    /// 单局最多回合数，超过则判为未完成
    #[arg(long, default_value_t = 10_000)]
    max_turns: u32,
}

#[derive(Debug, Serialize)]
struct Summary {
    games: u32,
    seed: u64,
    settings: GameSettings,
    unfinished_games: u32,
    average_turns: f64,
    players: Vec<PlayerSummary>,
}

#[derive(Debug, Serialize)]
struct PlayerSummary {
    name: String,
    wins: u32,
    average_score: f64,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let summary = match &args.settings {
        Some(path) => {
            let provider = JsonSettingsFile::open(path)
                .with_context(|| format!("failed to load settings from {}", path.display()))?;
            run(&args, provider)?
        }
        None => run(&args, GameSettings::default())?,
    };

    println!("{}", serde_json::to_string_pretty(&summary).context("failed to encode summary")?);
    Ok(())
}

fn run<S: SettingsProvider>(args: &Args, provider: S) -> anyhow::Result<Summary> {
    let dice = RngDice(ChaCha8Rng::seed_from_u64(args.seed));
    let mut session = Session::new(args.players.as_slice(), provider, dice).context("invalid player list")?;

    let mut wins = vec![0u32; args.players.len()];
    let mut score_sums = vec![0u64; args.players.len()];
    let mut unfinished_games = 0;
    let mut total_turns = 0u64;

    for game in 0..args.games {
        session.new_game(args.players.as_slice())?;
        let turns = play_game(&mut session, args)?;
        total_turns += turns as u64;

        let state = session.state();
        for (i, player) in state.players.iter().enumerate() {
            score_sums[i] += player.total_score as u64;
        }
        match state.winner() {
            Some(winner) => {
                wins[state.current_player_idx] += 1;
                info!(game, winner = %winner.name, total = winner.total_score, turns, "对局结束");
            }
            None => {
                unfinished_games += 1;
                warn!(game, turns, "达到回合上限，对局未完成");
            }
        }
    }

    let games = args.games.max(1) as f64;
    let players = args
        .players
        .iter()
        .enumerate()
        .map(|(i, name)| PlayerSummary {
            name: name.trim().to_string(),
            wins: wins[i],
            average_score: score_sums[i] as f64 / games,
        })
        .collect();

    Ok(Summary {
        games: args.games,
        seed: args.seed,
        settings: session.settings().snapshot(),
        unfinished_games,
        average_turns: total_turns as f64 / games,
        players,
    })
}

/// 进行一局，返回用掉的回合数
fn play_game<S: SettingsProvider, D: DiceSource>(
    session: &mut Session<S, D>,
    args: &Args,
) -> anyhow::Result<u32> {
    let mut turns = 0;
    while !session.state().game_over {
        if turns >= args.max_turns {
            break;
        }

        let message = session.roll();
        if message.ends_turn() {
            turns += 1;
            continue;
        }

        let (ids, _) = best_selection(session.state()).context("no scoring dice after a successful roll")?;
        // 五个 1 在锁定时直接获胜
        session.hold(&ids)?;
        if session.state().game_over {
            turns += 1;
            break;
        }

        let settings = session.settings().snapshot();
        if should_bank(session.state(), &settings, args.bank_at) {
            let message = session.end_turn();
            debug!(%message, "回合结束");
            turns += 1;
        }
    }
    Ok(turns)
}

/// 入账策略：达到目标分数就停
///
/// 恰好获胜模式下正好凑够就停，超出时不入账而是继续掷。
fn should_bank(state: &GameState, settings: &GameSettings, bank_at: u32) -> bool {
    let player = state.current_player();
    let turn_score = state.turn.score;
    let total = player.total_score + turn_score;

    if !player.has_opened() && turn_score < settings.opening_score {
        return false;
    }
    if settings.must_win_on_exact_score {
        if total == settings.victory_score {
            return true;
        }
        if total > settings.victory_score {
            return false;
        }
    } else if total >= settings.victory_score {
        return true;
    }
    turn_score >= bank_at
}
