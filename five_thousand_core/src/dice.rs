use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
// --- 核心数据结构定义 ---

/// 骰池中骰子的数量，整局游戏保持不变
pub const POOL_SIZE: usize = 5;

/// 新一局开始时骰子显示的默认点数（尚未掷出）
pub const DEFAULT_FACE: u8 = 1;

/// 骰子的标识
/// 只用于界面对应同一颗骰子，对规则本身没有意义。
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy, Serialize, Deserialize)]
pub struct DieId(pub u32);

/// 单颗骰子 (Die)
///
/// `held` 为真时 `available` 一定为假：已经计入本回合得分的骰子不能再掷，也不能再选。
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub struct Die {
    pub id: DieId,
    pub face: u8,
    pub available: bool, // 本回合还能掷/选
    pub held: bool,      // 已锁定并计入本回合得分
}

impl Die {
    pub fn new(id: DieId, face: u8) -> Die {
        assert_face(face);
        Die { id, face, available: true, held: false }
    }

    fn hold(&mut self) {
        self.held = true;
        self.available = false;
    }
}

/// 骰池 (DicePool)
/// 固定五颗骰子，顺序稳定。即使"全部得分后换一组新骰子"，大小也始终为 5。
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct DicePool {
    pub dice: [Die; POOL_SIZE],
}

impl DicePool {
    /// 用给定的标识创建五颗全部可用、显示默认点数的骰子
    pub fn fresh(ids: [DieId; POOL_SIZE]) -> DicePool {
        DicePool { dice: ids.map(|id| Die::new(id, DEFAULT_FACE)) }
    }

    pub fn faces(&self) -> [u8; POOL_SIZE] {
        self.dice.map(|d| d.face)
    }

    /// 仍可掷/可选的骰子点数
    pub fn available_faces(&self) -> Vec<u8> {
        self.dice.iter().filter(|d| d.available).map(|d| d.face).collect()
    }

    pub fn available_count(&self) -> usize {
        self.dice.iter().filter(|d| d.available).count()
    }

    pub fn all_held(&self) -> bool {
        self.dice.iter().all(|d| d.held)
    }

    pub fn get(&self, id: DieId) -> Option<&Die> {
        self.dice.iter().find(|d| d.id == id)
    }

    /// 只重掷可用的骰子，已锁定的骰子保持点数和状态不变
    pub(crate) fn reroll_available(&mut self, source: &mut impl DiceSource) {
        for die in self.dice.iter_mut().filter(|d| d.available) {
            die.face = draw_face(source);
        }
    }

    /// 将选中的骰子锁定。调用方负责事先校验标识。
    pub(crate) fn hold_all(&mut self, ids: &[DieId]) {
        for die in self.dice.iter_mut().filter(|d| ids.contains(&d.id)) {
            die.hold();
        }
    }
}

// --- 实现辅助功能 ---

impl fmt::Display for Die {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.held {
            write!(f, "[{}]", self.face)
        } else {
            write!(f, "{}", self.face)
        }
    }
}

impl fmt::Display for DicePool {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let parts: Vec<String> = self.dice.iter().map(|d| d.to_string()).collect();
        write!(f, "{}", parts.join(" "))
    }
}

// --- 随机点数来源 ---

/// 均匀产生 1..=6 点数的来源
///
/// 熵的来源由调用方注入，核心逻辑因此是确定的、可测试的。
pub trait DiceSource {
    fn next_face(&mut self) -> u8;
}

/// 基于任意 `rand::Rng` 的点数来源
#[derive(Debug, Clone)]
pub struct RngDice<R>(pub R);

impl<R: Rng> DiceSource for RngDice<R> {
    fn next_face(&mut self) -> u8 {
        self.0.random_range(1..=6)
    }
}

impl RngDice<rand::rngs::ThreadRng> {
    /// 使用线程本地随机数生成器
    pub fn thread() -> Self {
        RngDice(rand::rng())
    }
}

/// 按预定顺序给出点数，用于测试和复盘
#[derive(Debug, Clone, Default)]
pub struct ScriptedDice {
    faces: VecDeque<u8>,
}

impl ScriptedDice {
    pub fn new(faces: &[u8]) -> Self {
        ScriptedDice { faces: faces.iter().copied().collect() }
    }

    pub fn push(&mut self, faces: &[u8]) {
        self.faces.extend(faces.iter().copied());
    }

    pub fn remaining(&self) -> usize {
        self.faces.len()
    }
}

impl DiceSource for ScriptedDice {
    /// # Panics
    /// 预设点数用完时 panic，说明测试脚本写错了。
    fn next_face(&mut self) -> u8 {
        self.faces.pop_front().expect("ScriptedDice 的预设点数已用完")
    }
}

/// 从来源取一个点数并检查范围
fn draw_face(source: &mut impl DiceSource) -> u8 {
    let face = source.next_face();
    assert_face(face);
    face
}

fn assert_face(face: u8) {
    assert!((1..=6).contains(&face), "骰子点数必须在 1 到 6 之间: {}", face);
}

// --- 单元测试 ---
