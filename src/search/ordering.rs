use cozy_chess::{Move, Square};

use crate::board::moves::MoveInfo;
use crate::search::eval::piece_value;

pub const MAX_PLY: usize = 128;

const CAPTURE_BASE: i32 = 10_000;
const PROMOTION_BASE: i32 = 9_000;
const CHECK_BONUS: i32 = 1_500;
const CASTLE_BONUS: i32 = 700;
const KILLER_PRIMARY: i32 = 900;
const KILLER_SECONDARY: i32 = 800;
const HISTORY_CAP: i32 = 500;
const HASH_MOVE: i32 = 1_000_000;

/// Two quiet cutoff moves per ply, most recent in slot 0. Compared by
/// origin and destination only.
#[derive(Clone, Debug)]
pub struct KillerTable {
    slots: Vec<[Option<(Square, Square)>; 2]>,
}

impl Default for KillerTable {
    fn default() -> Self { Self::new() }
}

impl KillerTable {
    pub fn new() -> Self { Self { slots: vec![[None, None]; MAX_PLY] } }

    pub fn clear(&mut self) {
        for s in &mut self.slots { *s = [None, None]; }
    }

    pub fn update(&mut self, ply: usize, m: Move) {
        let Some(slot) = self.slots.get_mut(ply) else { return };
        let key = Some((m.from, m.to));
        if slot[0] == key { return; }
        slot[1] = slot[0];
        slot[0] = key;
    }

    pub fn bonus(&self, ply: usize, m: Move) -> i32 {
        let Some(slot) = self.slots.get(ply) else { return 0 };
        let key = Some((m.from, m.to));
        if slot[0] == key { KILLER_PRIMARY } else if slot[1] == key { KILLER_SECONDARY } else { 0 }
    }
}

/// Quiet-move success counters indexed by origin and destination square.
#[derive(Clone, Debug)]
pub struct HistoryTable {
    scores: Box<[[i32; 64]; 64]>,
}

impl Default for HistoryTable {
    fn default() -> Self { Self::new() }
}

impl HistoryTable {
    pub fn new() -> Self { Self { scores: Box::new([[0; 64]; 64]) } }

    pub fn clear(&mut self) {
        for row in self.scores.iter_mut() { row.fill(0); }
    }

    pub fn add(&mut self, m: Move, depth: u32) {
        let d = depth as i32;
        let v = &mut self.scores[m.from as usize][m.to as usize];
        *v = v.saturating_add(d * d);
    }

    pub fn get(&self, m: Move) -> i32 { self.scores[m.from as usize][m.to as usize] }
}

/// Destination-square centrality: 24 on the four center squares, -24 in the
/// corners.
pub fn centrality(sq: Square) -> i32 {
    let f = sq.file() as i32;
    let r = sq.rank() as i32;
    32 - 4 * ((7 - 2 * f).abs() + (7 - 2 * r).abs())
}

pub fn score_move(info: &MoveInfo, ply: usize, killers: &KillerTable, history: &HistoryTable) -> i32 {
    let mut score = 0;
    if let Some(victim) = info.captured {
        score += CAPTURE_BASE + piece_value(victim) * 10 - piece_value(info.piece);
    }
    if let Some(p) = info.promotion() {
        score += PROMOTION_BASE + piece_value(p);
    }
    if info.gives_check { score += CHECK_BONUS; }
    if info.castle { score += CASTLE_BONUS; }
    if !info.is_capture() {
        score += killers.bonus(ply, info.mv);
        score += history.get(info.mv).min(HISTORY_CAP);
    }
    score + centrality(info.to())
}

/// Sort `moves` best first. The sort is stable so equal scores keep
/// generation order; `hash_move` (the stored best move) always leads.
pub fn order_moves(
    moves: &mut [MoveInfo],
    ply: usize,
    killers: &KillerTable,
    history: &HistoryTable,
    hash_move: Option<Move>,
) {
    moves.sort_by_cached_key(|info| {
        let s = if Some(info.mv) == hash_move { HASH_MOVE } else { score_move(info, ply, killers, history) };
        std::cmp::Reverse(s)
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn killer_slots_shift_and_ignore_repeats() {
        let mut k = KillerTable::new();
        let a: Move = "e2e4".parse().unwrap();
        let b: Move = "d2d4".parse().unwrap();
        k.update(3, a);
        k.update(3, a);
        assert_eq!(k.bonus(3, a), KILLER_PRIMARY);
        k.update(3, b);
        assert_eq!(k.bonus(3, b), KILLER_PRIMARY);
        assert_eq!(k.bonus(3, a), KILLER_SECONDARY);
        assert_eq!(k.bonus(4, a), 0);
        k.update(MAX_PLY + 5, a);
    }

    #[test]
    fn centrality_extremes() {
        assert_eq!(centrality(Square::E4), 24);
        assert_eq!(centrality(Square::A1), -24);
    }
}
