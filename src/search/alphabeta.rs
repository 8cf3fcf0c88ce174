use cozy_chess::{Board, Color, Move, Piece};
use log::debug;
use std::time::{Duration, Instant};

use crate::board::moves::MoveInfo;
use crate::board::position::{is_insufficient_material, Position};
use crate::search::control::{SearchControl, StopReason};
use crate::search::eval::{evaluate, piece_value, EvalOptions, DRAW_SCORE, MATE_SCORE, MATE_THRESHOLD};
use crate::search::ordering::{order_moves, HistoryTable, KillerTable};
use crate::search::tt::{Bound, Entry, Tt};

const INF: i32 = MATE_SCORE + 1;
/// Nodes between cooperative checkpoints.
pub const YIELD_INTERVAL: u64 = 800;
pub const MAX_QSEARCH_DEPTH: u32 = 6;
const MAX_DEPTH: u32 = 64;
const NULL_REDUCTION: u32 = 3;
const DELTA_MARGIN: i32 = 200;
/// A deeper iteration replaces the current best unless it scores this much worse.
const ACCEPT_MARGIN: i32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchParams {
    /// Deepest iteration. Zero means "until the deadline" when `movetime` is set.
    pub depth: u32,
    pub movetime: Option<Duration>,
    pub use_tt: bool,
    pub use_quiescence: bool,
    pub use_nullmove: bool,
    pub aggressive: bool,
    /// Node budget, checked at checkpoints.
    pub max_nodes: Option<u64>,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            depth: 3,
            movetime: None,
            use_tt: true,
            use_quiescence: true,
            use_nullmove: false,
            aggressive: false,
            max_nodes: None,
        }
    }
}

#[derive(Default, Debug, Clone)]
pub struct SearchResult {
    /// Best move of the last accepted iteration. `None` when aborted or when
    /// the side to move has no legal move.
    pub bestmove: Option<Move>,
    pub score_cp: i32,
    /// Deepest fully completed iteration.
    pub depth: u32,
    pub nodes: u64,
    pub aborted: bool,
    pub stopped: Option<StopReason>,
}

/// Per-game caches: the transposition table survives between turns, killers
/// and history are reset by every top-level search.
#[derive(Debug, Default)]
pub struct SearchTables {
    pub tt: Tt,
    pub killers: KillerTable,
    pub history: HistoryTable,
}

impl SearchTables {
    pub fn new() -> Self { Self::default() }

    pub fn clear(&mut self) {
        self.tt.clear();
        self.reset_heuristics();
    }

    pub fn reset_heuristics(&mut self) {
        self.killers.clear();
        self.history.clear();
    }
}

fn non_pawn_pieces(board: &Board, color: Color) -> u32 {
    let pieces = board.pieces(Piece::Knight) | board.pieces(Piece::Bishop) | board.pieces(Piece::Rook) | board.pieces(Piece::Queen);
    (pieces & board.colors(color)).len()
}

// Mate scores are stored relative to the node, not the root.
fn score_to_tt(score: i32, ply: u32) -> i32 {
    if score >= MATE_THRESHOLD { score + ply as i32 } else if score <= -MATE_THRESHOLD { score - ply as i32 } else { score }
}

fn score_from_tt(score: i32, ply: u32) -> i32 {
    if score >= MATE_THRESHOLD { score - ply as i32 } else if score <= -MATE_THRESHOLD { score + ply as i32 } else { score }
}

/// Whether a finished iteration replaces the current best result.
fn accept_iteration(prev: Option<i32>, score: i32) -> bool {
    prev.map_or(true, |p| score > p - ACCEPT_MARGIN)
}

fn is_quiet(info: &MoveInfo) -> bool { !info.is_capture() && info.promotion().is_none() }

pub struct Searcher<'a> {
    tables: &'a mut SearchTables,
    control: SearchControl,
    params: SearchParams,
    opts: EvalOptions,
    nodes: u64,
}

impl<'a> Searcher<'a> {
    pub fn new(tables: &'a mut SearchTables, control: SearchControl) -> Self {
        Self { tables, control, params: SearchParams::default(), opts: EvalOptions::default(), nodes: 0 }
    }

    fn stopped(&self) -> bool { self.control.stopped().is_some() }

    fn tick(&mut self) -> bool {
        self.nodes += 1;
        self.nodes % YIELD_INTERVAL == 0 && self.control.checkpoint(self.nodes)
    }

    /// Quiescence value of `board` with an open window, side-to-move relative.
    pub fn qsearch_eval_cp(&mut self, board: &Board) -> i32 {
        self.control.arm(None, None);
        let mut pos = Position::from_board(board.clone());
        self.qsearch(&mut pos, -INF, INF, 0, 0)
    }

    /// Iterative deepening from depth 1 to `params.depth`. The position is
    /// returned unchanged.
    pub fn search(&mut self, pos: &mut Position, params: SearchParams) -> SearchResult {
        self.params = params;
        self.opts = EvalOptions { aggressive: params.aggressive };
        self.nodes = 0;
        self.tables.reset_heuristics();
        let start = Instant::now();
        self.control.arm(params.movetime.map(|t| start + t), params.max_nodes);

        let mut root = pos.legal_moves();
        if root.is_empty() {
            let score = if pos.in_check() { -MATE_SCORE } else { DRAW_SCORE };
            return SearchResult { score_cp: score, ..SearchResult::default() };
        }
        let hash_move = if params.use_tt { self.tables.tt.get(pos.key()).and_then(|e| e.best) } else { None };
        order_moves(&mut root, 0, &self.tables.killers, &self.tables.history, hash_move);

        let max_depth = match (params.depth, params.movetime) {
            (0, Some(_)) => MAX_DEPTH,
            (0, None) => 1,
            (d, _) => d.min(MAX_DEPTH),
        };
        let mut best: Option<(Move, i32)> = None;
        let mut completed = 0;
        for depth in 1..=max_depth {
            let Some((mv, score)) = self.search_root(pos, &root, depth) else { break };
            completed = depth;
            if accept_iteration(best.map(|(_, s)| s), score) {
                best = Some((mv, score));
            } else {
                debug!("depth {depth}: {mv} scored {score}, keeping previous");
            }
            let Some((best_mv, best_score)) = best else { break };
            debug!("depth {depth} score {best_score} nodes {} best {best_mv} elapsed {:?}", self.nodes, start.elapsed());
            if let Some(i) = root.iter().position(|m| m.mv == best_mv) {
                let m = root.remove(i);
                root.insert(0, m);
            }
            if best_score.abs() >= MATE_THRESHOLD { break; }
            if depth < max_depth && self.control.checkpoint(self.nodes) { break; }
        }

        let aborted = self.control.aborted();
        if aborted {
            debug!("search aborted after {} nodes", self.nodes);
            return SearchResult { nodes: self.nodes, depth: completed, aborted: true, stopped: Some(StopReason::Aborted), ..SearchResult::default() };
        }
        let (bestmove, score_cp) = match best {
            Some((mv, s)) => (Some(mv), s),
            None => (root.first().map(|m| m.mv), evaluate(pos.board(), self.opts)),
        };
        SearchResult { bestmove, score_cp, depth: completed, nodes: self.nodes, aborted: false, stopped: self.control.stopped() }
    }

    /// One full-window iteration over the root moves. `None` when stopped
    /// before the iteration finished.
    fn search_root(&mut self, pos: &mut Position, root: &[MoveInfo], depth: u32) -> Option<(Move, i32)> {
        let mut alpha = -INF;
        let beta = INF;
        let mut best: Option<(Move, i32)> = None;
        for (i, info) in root.iter().enumerate() {
            pos.make_unchecked(info.mv);
            let score = if i == 0 {
                -self.alphabeta(pos, depth - 1, -beta, -alpha, 1, false)
            } else {
                let s = -self.alphabeta(pos, depth - 1, -alpha - 1, -alpha, 1, false);
                if s > alpha && s < beta { -self.alphabeta(pos, depth - 1, -beta, -alpha, 1, false) } else { s }
            };
            pos.undo();
            if self.stopped() { return None; }
            if best.map_or(true, |(_, b)| score > b) { best = Some((info.mv, score)); }
            if score > alpha { alpha = score; }
        }
        let (mv, score) = best?;
        if self.params.use_tt {
            self.tables.tt.put(Entry { key: pos.key(), depth, score: score_to_tt(score, 0), best: Some(mv), bound: Bound::Exact });
        }
        Some((mv, score))
    }

    fn alphabeta(&mut self, pos: &mut Position, depth: u32, mut alpha: i32, beta: i32, ply: u32, after_null: bool) -> i32 {
        if self.tick() { return 0; }
        if depth == 0 {
            return if self.params.use_quiescence { self.qsearch(pos, alpha, beta, ply, 0) } else { self.leaf(pos, ply) };
        }

        let key = pos.key();
        let mut hash_move = None;
        if self.params.use_tt {
            if let Some(en) = self.tables.tt.get(key) {
                hash_move = en.best;
                if en.depth >= depth {
                    let s = score_from_tt(en.score, ply);
                    match en.bound {
                        Bound::Exact => return s,
                        Bound::Lower if s >= beta => return s,
                        Bound::Upper if s <= alpha => return s,
                        _ => {}
                    }
                }
            }
        }

        let in_check = pos.in_check();
        if self.params.use_nullmove && !after_null && depth >= NULL_REDUCTION && !in_check
            && non_pawn_pieces(pos.board(), pos.side_to_move()) >= 2
            && pos.make_null()
        {
            let score = -self.alphabeta(pos, depth - NULL_REDUCTION, -beta, -beta + 1, ply + 1, true);
            pos.undo();
            if self.stopped() { return 0; }
            if score >= beta { return beta; }
        }

        let mut moves = pos.legal_moves();
        if moves.is_empty() {
            return if in_check { -MATE_SCORE + ply as i32 } else { DRAW_SCORE };
        }
        if pos.board().halfmove_clock() >= 100 || is_insufficient_material(pos.board()) {
            return DRAW_SCORE;
        }
        order_moves(&mut moves, ply as usize, &self.tables.killers, &self.tables.history, hash_move);

        let orig_alpha = alpha;
        let mut best = -INF;
        let mut best_move = None;
        for (i, info) in moves.iter().enumerate() {
            pos.make_unchecked(info.mv);
            let score = if i == 0 {
                -self.alphabeta(pos, depth - 1, -beta, -alpha, ply + 1, false)
            } else {
                let s = -self.alphabeta(pos, depth - 1, -alpha - 1, -alpha, ply + 1, false);
                if s > alpha && s < beta { -self.alphabeta(pos, depth - 1, -beta, -alpha, ply + 1, false) } else { s }
            };
            pos.undo();
            if self.stopped() { return 0; }

            if score > best {
                best = score;
                best_move = Some(info.mv);
            }
            if score > alpha {
                alpha = score;
                if is_quiet(info) { self.tables.history.add(info.mv, depth); }
            }
            if alpha >= beta {
                if is_quiet(info) { self.tables.killers.update(ply as usize, info.mv); }
                break;
            }
        }

        if self.params.use_tt {
            let bound = if best <= orig_alpha { Bound::Upper } else if best >= beta { Bound::Lower } else { Bound::Exact };
            self.tables.tt.put(Entry { key, depth, score: score_to_tt(best, ply), best: best_move, bound });
        }
        best
    }

    fn leaf(&self, pos: &Position, ply: u32) -> i32 {
        match evaluate(pos.board(), self.opts) {
            s if s == -MATE_SCORE => -MATE_SCORE + ply as i32,
            s => s,
        }
    }

    fn qsearch(&mut self, pos: &mut Position, mut alpha: i32, beta: i32, ply: u32, qdepth: u32) -> i32 {
        if self.tick() { return 0; }
        let moves = pos.legal_moves();
        let in_check = pos.in_check();
        if moves.is_empty() {
            return if in_check { -MATE_SCORE + ply as i32 } else { DRAW_SCORE };
        }

        // Stand pat
        let stand = evaluate(pos.board(), self.opts);
        if qdepth >= MAX_QSEARCH_DEPTH { return stand; }
        if stand >= beta { return beta; }
        if stand > alpha { alpha = stand; }

        let mut tactical: Vec<MoveInfo> = moves.into_iter().filter(MoveInfo::is_tactical).collect();
        order_moves(&mut tactical, ply as usize, &self.tables.killers, &self.tables.history, None);
        for info in &tactical {
            // Delta pruning: even winning the victim outright cannot reach alpha
            if !in_check && info.promotion().is_none() {
                if let Some(victim) = info.captured {
                    if stand + piece_value(victim) + DELTA_MARGIN < alpha { continue; }
                }
            }
            pos.make_unchecked(info.mv);
            let score = -self.qsearch(pos, -beta, -alpha, ply + 1, qdepth + 1);
            pos.undo();
            if self.stopped() { return 0; }
            if score >= beta { return beta; }
            if score > alpha { alpha = score; }
        }
        alpha
    }
}

/// Convenience for callers that own nothing but a board: fresh tables, no
/// hook, never aborted.
pub fn search_board(board: &Board, params: SearchParams) -> SearchResult {
    let mut tables = SearchTables::new();
    let mut searcher = Searcher::new(&mut tables, SearchControl::default());
    let mut pos = Position::from_board(board.clone());
    searcher.search(&mut pos, params)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tt_mate_scores_are_ply_relative() {
        let s = MATE_SCORE - 5;
        assert_eq!(score_from_tt(score_to_tt(s, 3), 3), s);
        assert_eq!(score_to_tt(s, 3), MATE_SCORE - 2);
        assert_eq!(score_to_tt(-s, 3), -(MATE_SCORE - 2));
        assert_eq!(score_to_tt(120, 7), 120);
    }

    #[test]
    fn iteration_acceptance_margin() {
        assert!(accept_iteration(None, -500));
        assert!(accept_iteration(Some(40), 40 - 99));
        assert!(!accept_iteration(Some(40), 40 - 100));
        assert!(accept_iteration(Some(40), 300));
    }

    #[test]
    fn null_move_needs_two_pieces() {
        let b = Board::from_fen("4k3/pppp4/8/8/8/8/PPPP4/3NK2R w K - 0 1", false).unwrap();
        assert_eq!(non_pawn_pieces(&b, Color::White), 2);
        assert_eq!(non_pawn_pieces(&b, Color::Black), 0);
    }
}
