use cozy_chess::{Color, Move, Piece};
use rand::seq::SliceRandom;
use rand::Rng;

use crate::board::moves::{CoordMove, MoveInfo};
use crate::search::eval::piece_value;

const CAPTURE_POOL: usize = 3;
const QUIET_POOL: usize = 5;

/// Greedy priority: victim value, destination centrality and pawn progress.
pub fn priority(info: &MoveInfo, side: Color) -> i32 {
    let c = CoordMove::from_info(info);
    let capture = info.captured.map_or(0, piece_value);
    let (tr, tc) = (i32::from(c.to_row), i32::from(c.to_col));
    let centrality = 8 - (7 - 2 * tc).abs() - (7 - 2 * tr).abs();
    let advance = match (info.piece, side) {
        (Piece::Pawn, Color::White) => i32::from(c.from_row) - tr,
        (Piece::Pawn, Color::Black) => tr - i32::from(c.from_row),
        _ => 0,
    };
    capture * 3 + centrality + advance * 5
}

fn ranked(moves: impl Iterator<Item = MoveInfo>, side: Color) -> Vec<MoveInfo> {
    let mut v: Vec<MoveInfo> = moves.collect();
    v.sort_by_cached_key(|m| std::cmp::Reverse(priority(m, side)));
    v
}

fn pick_top<R: Rng + ?Sized>(ranked: &[MoveInfo], pool: usize, aggressive: bool, rng: &mut R) -> Option<MoveInfo> {
    if aggressive {
        return ranked.first().copied();
    }
    ranked[..ranked.len().min(pool)].choose(rng).copied()
}

/// Captures first, otherwise quiet moves. Aggressive play takes the single
/// best-ranked move; otherwise one of the top few at random.
pub fn heuristic_pick<R: Rng + ?Sized>(moves: &[MoveInfo], side: Color, aggressive: bool, rng: &mut R) -> Option<MoveInfo> {
    let captures = ranked(moves.iter().copied().filter(MoveInfo::is_capture), side);
    if !captures.is_empty() {
        return pick_top(&captures, CAPTURE_POOL, aggressive, rng);
    }
    let quiet = ranked(moves.iter().copied(), side);
    pick_top(&quiet, QUIET_POOL, aggressive, rng)
}

pub fn random_pick<R: Rng + ?Sized>(moves: &[MoveInfo], rng: &mut R) -> Option<MoveInfo> {
    moves.choose(rng).copied()
}

/// True with probability `chance`, clamped to [0, 1].
pub fn roll<R: Rng + ?Sized>(rng: &mut R, chance: f64) -> bool {
    chance > 0.0 && rng.gen_bool(chance.min(1.0))
}

/// A deliberately weaker choice than `original`: a random move with
/// probability `random_chance`, otherwise the heuristic pick. Never returns
/// `original` while some other move exists.
pub fn imperfect_pick<R: Rng + ?Sized>(
    moves: &[MoveInfo],
    side: Color,
    original: Option<Move>,
    aggressive: bool,
    random_chance: f64,
    rng: &mut R,
) -> Option<MoveInfo> {
    let others: Vec<MoveInfo> = moves.iter().copied().filter(|m| Some(m.mv) != original).collect();
    let pool = if others.is_empty() { moves } else { &others };
    if roll(rng, random_chance) {
        return random_pick(pool, rng);
    }
    heuristic_pick(pool, side, aggressive, rng).or_else(|| random_pick(pool, rng))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::position::legal_moves;
    use cozy_chess::Board;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[test]
    fn aggressive_takes_biggest_capture() {
        // Black can take the queen on d4 or the knight on f4
        let b = Board::from_fen("4k3/8/8/4p3/3Q1N2/8/8/4K3 b - - 0 1", false).unwrap();
        let mut rng = SmallRng::seed_from_u64(1);
        let m = heuristic_pick(&legal_moves(&b), Color::Black, true, &mut rng).unwrap();
        assert_eq!(m.uci(), "e5d4");
    }

    #[test]
    fn pawn_push_outranks_sideways_king_step() {
        let b = Board::from_fen("4k3/8/8/8/8/8/4P3/4K3 w - - 0 1", false).unwrap();
        let moves = legal_moves(&b);
        let push = moves.iter().find(|m| m.uci() == "e2e4").unwrap();
        let king = moves.iter().find(|m| m.uci() == "e1d1").unwrap();
        assert!(priority(push, Color::White) > priority(king, Color::White));
    }

    #[test]
    fn imperfect_avoids_original_when_possible() {
        let b = Board::default();
        let moves = legal_moves(&b);
        let mut rng = SmallRng::seed_from_u64(7);
        for _ in 0..50 {
            let orig = moves[0].mv;
            let m = imperfect_pick(&moves, Color::White, Some(orig), false, 0.5, &mut rng).unwrap();
            assert_ne!(m.mv, orig);
        }
    }
}
