use serde::{Deserialize, Serialize};
use std::fmt;

// --- 计分常量 ---

/// 五颗 1 的得分，直接赢得整局
pub const FIVE_ONES_POINTS: u32 = 5000;
/// 顺子 1-2-3-4-5 或 2-3-4-5-6
pub const STRAIGHT_POINTS: u32 = 1500;
/// 单颗 1
pub const SINGLE_ONE_POINTS: u32 = 100;
/// 单颗 5，也是最小的计分单位
pub const SINGLE_FIVE_POINTS: u32 = 50;

/// 提取三条时依次检查的点数顺序
pub const TRIPLE_PRIORITY: [u8; 6] = [1, 6, 5, 4, 3, 2];

const LOW_STRAIGHT: [u8; 5] = [1, 2, 3, 4, 5];
const HIGH_STRAIGHT: [u8; 5] = [2, 3, 4, 5, 6];

/// 每个点数出现的次数，下标即点数（下标 0 不用）
type FaceCounts = [u8; 7];

// --- 牌型定义 ---

/// 五颗骰子能组成的整体组合
/// 前三种只对恰好五颗骰子成立，一次吃掉全部五颗；其余情况都走逐项累加。
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub enum Combination {
    FiveOnes,
    Straight,
    FullHouse(FullHouse),
    Additive,
}

/// 葫芦 (三条 + 一对) 的各种计分情形
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub enum FullHouse {
    /// 三个 1 带一对 5：1000 + 100
    OnesOverFives,
    /// 三个 1 带其他对子：对子不另计分
    OnesOverPair { pair: u8 },
    /// 其他三条带一对 1：对 1 按例外记 200
    TripleOverOnes { triple: u8 },
    /// 一般情况：三条点数 × 对子点数 × 100
    General { triple: u8, pair: u8 },
}

impl FullHouse {
    pub fn of(triple: u8, pair: u8) -> FullHouse {
        match (triple, pair) {
            (1, 5) => FullHouse::OnesOverFives,
            (1, pair) => FullHouse::OnesOverPair { pair },
            (triple, 1) => FullHouse::TripleOverOnes { triple },
            (triple, pair) => FullHouse::General { triple, pair },
        }
    }

    pub fn points(&self) -> u32 {
        match *self {
            FullHouse::OnesOverFives => 1100,
            FullHouse::OnesOverPair { .. } => 1000,
            FullHouse::TripleOverOnes { triple } => triple as u32 * 100 + 200,
            FullHouse::General { triple, pair } => triple as u32 * pair as u32 * 100,
        }
    }
}

impl fmt::Display for Combination {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Combination::FiveOnes => write!(f, "五个1"),
            Combination::Straight => write!(f, "顺子"),
            Combination::FullHouse(fh) => write!(f, "葫芦({}分)", fh.points()),
            Combination::Additive => write!(f, "散点"),
        }
    }
}

// --- 计分逻辑 ---

/// 计算一组骰子的得分
///
/// 输入可以是 0 到 5 颗骰子，顺序无关。没有任何骰子得分时返回 0。
///
/// # Panics
/// 骰子多于 5 颗或点数不在 1..=6 时 panic。
pub fn score(dice: &[u8]) -> u32 {
    let counts = count_faces(dice);
    match classify_counts(&counts, dice.len()) {
        Combination::FiveOnes => FIVE_ONES_POINTS,
        Combination::Straight => STRAIGHT_POINTS,
        Combination::FullHouse(fh) => fh.points(),
        Combination::Additive => additive_points(counts),
    }
}

/// 判断一组骰子属于哪种组合
pub fn classify(dice: &[u8]) -> Combination {
    classify_counts(&count_faces(dice), dice.len())
}

fn count_faces(dice: &[u8]) -> FaceCounts {
    assert!(dice.len() <= 5, "最多只能计算 5 颗骰子: {}", dice.len());
    let mut counts = [0u8; 7];
    for &face in dice {
        assert!((1..=6).contains(&face), "骰子点数必须在 1 到 6 之间: {}", face);
        counts[face as usize] += 1;
    }
    counts
}

fn classify_counts(counts: &FaceCounts, len: usize) -> Combination {
    if len != 5 {
        return Combination::Additive;
    }
    if counts[1] == 5 {
        return Combination::FiveOnes;
    }
    if is_straight(counts) {
        return Combination::Straight;
    }
    if let Some(fh) = full_house(counts) {
        return Combination::FullHouse(fh);
    }
    Combination::Additive
}

fn is_straight(counts: &FaceCounts) -> bool {
    let matches = |run: &[u8; 5]| run.iter().all(|&face| counts[face as usize] == 1);
    matches(&LOW_STRAIGHT) || matches(&HIGH_STRAIGHT)
}

/// 恰好两种点数，一种三颗、一种两颗
fn full_house(counts: &FaceCounts) -> Option<FullHouse> {
    let triple = (1..=6u8).find(|&f| counts[f as usize] == 3)?;
    let pair = (1..=6u8).find(|&f| counts[f as usize] == 2)?;
    Some(FullHouse::of(triple, pair))
}

/// 逐项累加：先按优先顺序提取三条，剩下的 1 和 5 单独计分
fn additive_points(mut counts: FaceCounts) -> u32 {
    let mut points = 0;
    for face in TRIPLE_PRIORITY {
        let slot = face as usize;
        if counts[slot] >= 3 {
            points += triple_points(face);
            counts[slot] -= 3;
        }
    }
    points
        + counts[1] as u32 * SINGLE_ONE_POINTS
        + counts[5] as u32 * SINGLE_FIVE_POINTS
}

fn triple_points(face: u8) -> u32 {
    if face == 1 { 1000 } else { face as u32 * 100 }
}

// --- 单元测试 ---
