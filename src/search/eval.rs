use cozy_chess::{BitBoard, Board, Color, Piece, Square};

use crate::board::position::is_insufficient_material;

const PAWN: i32 = 100;
const KNIGHT: i32 = 320;
const BISHOP: i32 = 330;
const ROOK: i32 = 500;
const QUEEN: i32 = 900;
const KING: i32 = 20_000;

// Mate scoring helpers
pub const MATE_SCORE: i32 = 30_000;
/// Anything at or beyond this magnitude is a forced mate.
pub const MATE_THRESHOLD: i32 = MATE_SCORE - 1_000;
pub const DRAW_SCORE: i32 = 0;

/// Non-king material (both sides) below which the endgame king table is used
/// and king safety is ignored.
pub const ENDGAME_MATERIAL: i32 = 2_400;

const MOBILITY_WEIGHT: i32 = 5;
const IN_CHECK_PENALTY: i32 = 40;
const TEMPO_BONUS: i32 = 15;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EvalOptions {
    /// Adds a small tempo bonus for the side to move.
    pub aggressive: bool,
}

pub fn piece_value(piece: Piece) -> i32 {
    match piece {
        Piece::Pawn => PAWN,
        Piece::Knight => KNIGHT,
        Piece::Bishop => BISHOP,
        Piece::Rook => ROOK,
        Piece::Queen => QUEEN,
        Piece::King => KING,
    }
}

// Tables are written rank 8 first from White's point of view.
#[rustfmt::skip]
const PST_PAWN: [i32; 64] = [
     0,  0,   0,   0,   0,   0,  0,  0,
    50, 50,  50,  50,  50,  50, 50, 50,
    10, 10,  20,  35,  35,  20, 10, 10,
     5,  5,  15,  30,  30,  15,  5,  5,
     0,  0,   5,  28,  28,   5,  0,  0,
     5, -5, -10,   0,   0, -10, -5,  5,
     5, 10,  10, -30, -30,  10, 10,  5,
     0,  0,   0,   0,   0,   0,  0,  0,
];

#[rustfmt::skip]
const PST_KNIGHT: [i32; 64] = [
    -50, -40, -30, -30, -30, -30, -40, -50,
    -40, -20,   0,   5,   5,   0, -20, -40,
    -30,   5,  15,  20,  20,  15,   5, -30,
    -30,   0,  20,  25,  25,  20,   0, -30,
    -30,   5,  20,  25,  25,  20,   5, -30,
    -30,   0,  15,  20,  20,  15,   0, -30,
    -40, -20,   0,   5,   5,   0, -20, -40,
    -50, -40, -30, -30, -30, -30, -40, -50,
];

#[rustfmt::skip]
const PST_BISHOP: [i32; 64] = [
    -20, -10, -10, -10, -10, -10, -10, -20,
    -10,   5,   0,   0,   0,   0,   5, -10,
    -10,  10,  10,  10,  10,  10,  10, -10,
    -10,   0,  15,  15,  15,  15,   0, -10,
    -10,   5,  15,  15,  15,  15,   5, -10,
    -10,   0,  15,  15,  15,  15,   0, -10,
    -10,   5,   0,   0,   0,   0,   5, -10,
    -20, -10, -10, -10, -10, -10, -10, -20,
];

#[rustfmt::skip]
const PST_ROOK: [i32; 64] = [
     0,  0,  0,  5,  5,  0,  0,  0,
    10, 15, 15, 15, 15, 15, 15, 10,
    -5,  0,  0,  0,  0,  0,  0, -5,
    -5,  0,  0,  0,  0,  0,  0, -5,
    -5,  0,  0,  0,  0,  0,  0, -5,
    -5,  0,  0,  0,  0,  0,  0, -5,
    -5,  0,  0,  0,  0,  0,  0, -5,
     0,  0,  5, 10, 10,  5,  0,  0,
];

#[rustfmt::skip]
const PST_QUEEN: [i32; 64] = [
    -20, -10, -10, -5, -5, -10, -10, -20,
    -10,   0,   5,  0,  0,   0,   0, -10,
    -10,   5,   5,  5,  5,   5,   0, -10,
     -5,   0,   5, 10, 10,   5,   0,  -5,
      0,   0,   5, 10, 10,   5,   0,  -5,
    -10,   0,   5,  5,  5,   5,   0, -10,
    -10,   0,   0,  0,  0,   0,   0, -10,
    -20, -10, -10, -5, -5, -10, -10, -20,
];

#[rustfmt::skip]
const PST_KING_MIDDLE: [i32; 64] = [
    -30, -40, -40, -50, -50, -40, -40, -30,
    -30, -40, -40, -50, -50, -40, -40, -30,
    -30, -40, -40, -50, -50, -40, -40, -30,
    -30, -40, -40, -50, -50, -40, -40, -30,
    -20, -30, -30, -40, -40, -30, -30, -20,
    -10, -20, -20, -20, -20, -20, -20, -10,
     20,  20,   0,   0,   0,   0,  20,  20,
     20,  35,  15,   0,   0,  15,  35,  20,
];

#[rustfmt::skip]
const PST_KING_END: [i32; 64] = [
    -50, -30, -30, -30, -30, -30, -30, -50,
    -30, -10,   0,   0,   0,   0, -10, -30,
    -30,   0,  20,  30,  30,  20,   0, -30,
    -30,   0,  30,  45,  45,  30,   0, -30,
    -30,   0,  30,  45,  45,  30,   0, -30,
    -30,   0,  20,  30,  30,  20,   0, -30,
    -30, -20, -10,   0,   0, -10, -20, -30,
    -50, -40, -30, -20, -20, -30, -40, -50,
];

fn rank_of(sq: Square) -> i32 { sq.rank() as i32 }
fn file_of(sq: Square) -> i32 { sq.file() as i32 }

/// Rank counted from `color`'s own back rank (0..=7).
fn relative_rank(color: Color, sq: Square) -> i32 {
    if color == Color::White { rank_of(sq) } else { 7 - rank_of(sq) }
}

pub fn pst_value(color: Color, piece: Piece, sq: Square, endgame: bool) -> i32 {
    let row = 7 - relative_rank(color, sq);
    let idx = (row * 8 + file_of(sq)) as usize;
    let table = match piece {
        Piece::Pawn => &PST_PAWN,
        Piece::Knight => &PST_KNIGHT,
        Piece::Bishop => &PST_BISHOP,
        Piece::Rook => &PST_ROOK,
        Piece::Queen => &PST_QUEEN,
        Piece::King if endgame => &PST_KING_END,
        Piece::King => &PST_KING_MIDDLE,
    };
    table[idx]
}

/// Total non-king material of both sides.
pub fn non_king_material(board: &Board) -> i32 {
    [Piece::Pawn, Piece::Knight, Piece::Bishop, Piece::Rook, Piece::Queen]
        .into_iter()
        .map(|p| board.pieces(p).len() as i32 * piece_value(p))
        .sum()
}

pub fn is_endgame(board: &Board) -> bool { non_king_material(board) < ENDGAME_MATERIAL }

/// Material plus piece-square terms, White-relative, with the phase supplied
/// by the caller.
pub fn material_and_pst(board: &Board, endgame: bool) -> i32 {
    let mut score = 0;
    for color in Color::ALL {
        let sign = if color == Color::White { 1 } else { -1 };
        for piece in Piece::ALL {
            for sq in board.colored_pieces(color, piece) {
                score += sign * (piece_value(piece) + pst_value(color, piece, sq, endgame));
            }
        }
    }
    score
}

fn pawns_on_file(pawns: BitBoard, file: i32) -> bool {
    pawns.into_iter().any(|sq| file_of(sq) == file)
}

fn is_passed(color: Color, sq: Square, enemy_pawns: BitBoard) -> bool {
    let rel = relative_rank(color, sq);
    !enemy_pawns.into_iter().any(|e| (file_of(e) - file_of(sq)).abs() <= 1 && relative_rank(color, e) > rel)
}

/// Pawn structure, rook placement, bishop pair and king shelter for one side.
fn structure(board: &Board, color: Color, endgame: bool) -> i32 {
    let own_pawns = board.colored_pieces(color, Piece::Pawn);
    let enemy_pawns = board.colored_pieces(!color, Piece::Pawn);
    let all_pawns = board.pieces(Piece::Pawn);
    let mut score = 0;

    for sq in own_pawns {
        if is_passed(color, sq, enemy_pawns) {
            score += (relative_rank(color, sq) - 1) * 20 + 30;
        }
        if own_pawns.into_iter().any(|o| o != sq && file_of(o) == file_of(sq)) {
            score -= 15;
        }
    }

    for sq in board.colored_pieces(color, Piece::Rook) {
        let own = pawns_on_file(own_pawns, file_of(sq));
        let theirs = pawns_on_file(enemy_pawns, file_of(sq));
        if !own && !theirs {
            score += 25;
        } else if !own {
            score += 15;
        }
        if relative_rank(color, sq) == 6 { score += 30; }
    }

    let bishops = board.colored_pieces(color, Piece::Bishop);
    for sq in bishops {
        let shade = (rank_of(sq) + file_of(sq)) % 2;
        if bishops.into_iter().any(|o| (rank_of(o) + file_of(o)) % 2 != shade) {
            score += 25;
        }
    }

    if !endgame {
        let king = board.king(color);
        let (kr, kf) = (rank_of(king), file_of(king));
        let shield_rank = if color == Color::White { kr + 1 } else { kr - 1 };
        for f in (kf - 1).max(0)..=(kf + 1).min(7) {
            if (0..8).contains(&shield_rank)
                && own_pawns.into_iter().any(|p| rank_of(p) == shield_rank && file_of(p) == f)
            {
                score += 15;
            }
            if !pawns_on_file(all_pawns, f) { score -= 20; }
        }
    }
    score
}

/// Every positional term that does not depend on the side to move, White-relative.
pub fn static_eval_white(board: &Board) -> i32 {
    let endgame = is_endgame(board);
    material_and_pst(board, endgame) + structure(board, Color::White, endgame) - structure(board, Color::Black, endgame)
}

/// Full evaluation from the side to move's point of view. Returns
/// `-MATE_SCORE` when the side to move is checkmated and `DRAW_SCORE` for
/// stalemate, insufficient material and the fifty-move rule.
pub fn evaluate(board: &Board, opts: EvalOptions) -> i32 {
    let mut mobility = 0i32;
    board.generate_moves(|ml| { mobility += ml.len() as i32; false });
    let in_check = !board.checkers().is_empty();
    if mobility == 0 {
        return if in_check { -MATE_SCORE } else { DRAW_SCORE };
    }
    if board.halfmove_clock() >= 100 || is_insufficient_material(board) {
        return DRAW_SCORE;
    }

    let white = static_eval_white(board);
    let mut score = if board.side_to_move() == Color::White { white } else { -white };
    score += mobility * MOBILITY_WEIGHT;
    if in_check { score -= IN_CHECK_PENALTY; }
    if opts.aggressive { score += TEMPO_BONUS; }
    score
}

/// Evaluation from `perspective`'s point of view (positive favors that side).
pub fn evaluate_for(board: &Board, opts: EvalOptions, perspective: Color) -> i32 {
    let s = evaluate(board, opts);
    if board.side_to_move() == perspective { s } else { -s }
}

pub fn eval_cp(board: &Board) -> i32 { evaluate(board, EvalOptions::default()) }

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pst_mirrors_between_colors() {
        assert_eq!(
            pst_value(Color::White, Piece::Knight, Square::F3, false),
            pst_value(Color::Black, Piece::Knight, Square::F6, false)
        );
        assert_eq!(pst_value(Color::White, Piece::Pawn, Square::E2, false), -30);
        assert_eq!(pst_value(Color::White, Piece::Pawn, Square::E7, false), 50);
    }

    #[test]
    fn startpos_is_balanced_apart_from_mobility() {
        let b = Board::default();
        assert_eq!(static_eval_white(&b), 0);
        assert_eq!(eval_cp(&b), 20 * MOBILITY_WEIGHT);
    }

    #[test]
    fn checkmated_side_scores_mate() {
        let b = Board::from_fen("6k1/5ppp/8/8/8/8/5PPP/r5K1 w - - 0 1", false).unwrap();
        assert_eq!(eval_cp(&b), -MATE_SCORE);
        assert_eq!(evaluate_for(&b, EvalOptions::default(), Color::Black), MATE_SCORE);
    }
}
