use cozy_chess::{Board, Color, GameStatus, Move, Piece};

use crate::board::moves::MoveInfo;
use crate::error::{EngineError, Result};
use crate::search::zobrist;

/// Terminal classification reported to the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Ongoing,
    Checkmate,
    Stalemate,
    InsufficientMaterial,
    FiftyMoveRule,
}

/// Oracle board plus an undo stack. Every `make` pushes the previous board,
/// so `undo` restores it bit-for-bit including castling and en passant rights.
#[derive(Clone, Debug)]
pub struct Position {
    board: Board,
    stack: Vec<Board>,
}

impl Position {
    pub fn startpos() -> Self {
        Self::from_board(Board::default())
    }

    pub fn from_board(board: Board) -> Self {
        Self { board, stack: Vec::with_capacity(64) }
    }

    pub fn from_fen(fen: &str) -> Result<Self> {
        Board::from_fen(fen.trim(), false)
            .map(Self::from_board)
            .map_err(|e| EngineError::InvalidFen { fen: fen.to_string(), reason: format!("{e:?}") })
    }

    pub fn board(&self) -> &Board { &self.board }

    pub fn fen(&self) -> String { format!("{}", self.board) }

    pub fn side_to_move(&self) -> Color { self.board.side_to_move() }

    /// Half-moves played since the initial position, derived from the FEN counters.
    pub fn game_ply(&self) -> u32 {
        let full = u32::from(self.board.fullmove_number().max(1));
        (full - 1) * 2 + u32::from(self.board.side_to_move() == Color::Black)
    }

    pub fn key(&self) -> u64 { zobrist::compute(&self.board) }

    pub fn in_check(&self) -> bool { !self.board.checkers().is_empty() }

    /// Depth of the make/undo stack.
    pub fn ply(&self) -> usize { self.stack.len() }

    pub fn legal_moves(&self) -> Vec<MoveInfo> {
        legal_moves(&self.board)
    }

    pub fn legal_moves_count(&self) -> usize {
        let mut ct = 0usize;
        self.board.generate_moves(|moves| { ct += moves.len(); false });
        ct
    }

    pub fn find_uci(&self, mv_uci: &str) -> Option<Move> {
        find_uci(&self.board, mv_uci)
    }

    /// Checked make: rejects moves the oracle considers illegal.
    pub fn make(&mut self, mv: Move) -> Result<()> {
        let prev = self.board.clone();
        self.board.try_play(mv).map_err(|_| EngineError::IllegalMove(format!("{mv}")))?;
        self.stack.push(prev);
        Ok(())
    }

    /// Make for moves that came out of the oracle's own generator.
    pub fn make_unchecked(&mut self, mv: Move) {
        self.stack.push(self.board.clone());
        self.board.play_unchecked(mv);
    }

    /// Pass the turn. Returns false (and changes nothing) when in check.
    pub fn make_null(&mut self) -> bool {
        match self.board.null_move() {
            Some(next) => {
                let prev = std::mem::replace(&mut self.board, next);
                self.stack.push(prev);
                true
            }
            None => false,
        }
    }

    pub fn undo(&mut self) -> bool {
        match self.stack.pop() {
            Some(prev) => { self.board = prev; true }
            None => false,
        }
    }

    pub fn make_move_uci(&mut self, mv_uci: &str) -> Result<()> {
        let mv = self.find_uci(mv_uci).ok_or_else(|| EngineError::IllegalMove(mv_uci.to_string()))?;
        self.make(mv)
    }

    pub fn outcome(&self) -> Outcome {
        match self.board.status() {
            GameStatus::Won => Outcome::Checkmate,
            GameStatus::Drawn if self.in_check() || self.legal_moves_count() > 0 => Outcome::FiftyMoveRule,
            GameStatus::Drawn => Outcome::Stalemate,
            GameStatus::Ongoing if is_insufficient_material(&self.board) => Outcome::InsufficientMaterial,
            GameStatus::Ongoing => Outcome::Ongoing,
        }
    }
}

/// All legal moves for the side to move, in generation order.
pub fn legal_moves(board: &Board) -> Vec<MoveInfo> {
    let mut out = Vec::with_capacity(64);
    board.generate_moves(|ml| {
        let piece = ml.piece;
        for m in ml { out.push(MoveInfo::new(board, piece, m)); }
        false
    });
    out
}

/// Locate a legal move by its UCI text. Accepts standard castling (`e1g1`) as
/// well as the king-takes-rook form the oracle uses internally.
pub fn find_uci(board: &Board, mv_uci: &str) -> Option<Move> {
    let mut found = None;
    board.generate_moves(|ml| {
        let piece = ml.piece;
        for m in ml {
            if format!("{}", m) == mv_uci || (piece == Piece::King && standard_castle_text(board, m).as_deref() == Some(mv_uci)) {
                found = Some(m);
                break;
            }
        }
        found.is_some()
    });
    found
}

fn standard_castle_text(board: &Board, m: Move) -> Option<String> {
    if board.color_on(m.to) != Some(board.side_to_move()) { return None; }
    let file = if m.to.file() as usize > m.from.file() as usize { 'g' } else { 'c' };
    let from = format!("{}", m.from);
    Some(format!("{from}{file}{}", &from[1..]))
}

/// Bare kings, or a single minor piece against a bare king.
pub fn is_insufficient_material(board: &Board) -> bool {
    let heavy = board.pieces(Piece::Pawn) | board.pieces(Piece::Rook) | board.pieces(Piece::Queen);
    if !heavy.is_empty() { return false; }
    let minors = board.pieces(Piece::Knight) | board.pieces(Piece::Bishop);
    minors.len() <= 1
}
