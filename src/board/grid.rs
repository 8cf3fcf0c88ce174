//! The host's own board and the simplified rules it enforces for the human
//! player: piece movement and path clearance only. There is no castling, no en
//! passant and no check safety; pawns always promote to a queen and the game
//! ends when a king is captured.

use cozy_chess::{Color, Move, Piece};

use crate::board::moves::{coord_to_square, MoveInfo};
use crate::error::{EngineError, Result};

pub type Cell = Option<(Color, Piece)>;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grid {
    cells: [[Cell; 8]; 8],
    plies: usize,
}

/// What happened when a move was applied to the grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Applied {
    pub captured: Cell,
    pub promoted: bool,
    /// Set once a king has been taken.
    pub winner: Option<Color>,
}

const BACK_RANK: [Piece; 8] = [
    Piece::Rook, Piece::Knight, Piece::Bishop, Piece::Queen,
    Piece::King, Piece::Bishop, Piece::Knight, Piece::Rook,
];

impl Default for Grid {
    fn default() -> Self { Self::starting() }
}

impl Grid {
    pub fn starting() -> Self {
        let mut cells = [[None; 8]; 8];
        for col in 0..8 {
            cells[0][col] = Some((Color::Black, BACK_RANK[col]));
            cells[1][col] = Some((Color::Black, Piece::Pawn));
            cells[6][col] = Some((Color::White, Piece::Pawn));
            cells[7][col] = Some((Color::White, BACK_RANK[col]));
        }
        Self { cells, plies: 0 }
    }

    pub fn empty() -> Self { Self { cells: [[None; 8]; 8], plies: 0 } }

    /// Build from the placement field of a FEN string (rank 8 first).
    pub fn from_placement(placement: &str) -> Result<Self> {
        let bad = |reason: &str| EngineError::InvalidFen { fen: placement.to_string(), reason: reason.to_string() };
        let field = placement.split_whitespace().next().unwrap_or("");
        let rows: Vec<&str> = field.split('/').collect();
        if rows.len() != 8 { return Err(bad("expected 8 ranks")); }
        let mut grid = Self::empty();
        for (r, row) in rows.iter().enumerate() {
            let mut c = 0usize;
            for ch in row.chars() {
                if let Some(n) = ch.to_digit(10) {
                    c += n as usize;
                    continue;
                }
                let piece = piece_from_char(ch).ok_or_else(|| bad("unknown piece letter"))?;
                if c >= 8 { return Err(bad("rank too long")); }
                let color = if ch.is_ascii_uppercase() { Color::White } else { Color::Black };
                grid.cells[r][c] = Some((color, piece));
                c += 1;
            }
            if c != 8 { return Err(bad("rank does not have 8 files")); }
        }
        Ok(grid)
    }

    pub fn get(&self, row: u8, col: u8) -> Cell {
        self.cells.get(row as usize).and_then(|r| r.get(col as usize)).copied().flatten()
    }

    pub fn set(&mut self, row: u8, col: u8, cell: Cell) {
        if row < 8 && col < 8 { self.cells[row as usize][col as usize] = cell; }
    }

    /// Half-moves applied through [`Grid::apply`].
    pub fn plies(&self) -> usize { self.plies }

    pub fn set_plies(&mut self, plies: usize) { self.plies = plies; }

    pub fn is_valid_move(&self, side: Color, from: (u8, u8), to: (u8, u8)) -> bool {
        if from.0 > 7 || from.1 > 7 || to.0 > 7 || to.1 > 7 || from == to { return false; }
        let Some((color, piece)) = self.get(from.0, from.1) else { return false };
        if color != side { return false; }
        if let Some((target, _)) = self.get(to.0, to.1) {
            if target == side { return false; }
        }
        let dr = to.0 as i32 - from.0 as i32;
        let dc = to.1 as i32 - from.1 as i32;
        match piece {
            Piece::Pawn => self.pawn_ok(side, from, to, dr, dc),
            Piece::Rook => (dr == 0 || dc == 0) && self.path_clear(from, to),
            Piece::Knight => matches!((dr.abs(), dc.abs()), (2, 1) | (1, 2)),
            Piece::Bishop => dr.abs() == dc.abs() && self.path_clear(from, to),
            Piece::Queen => (dr.abs() == dc.abs() || dr == 0 || dc == 0) && self.path_clear(from, to),
            Piece::King => dr.abs() <= 1 && dc.abs() <= 1,
        }
    }

    fn pawn_ok(&self, side: Color, from: (u8, u8), to: (u8, u8), dr: i32, dc: i32) -> bool {
        let (dir, start) = if side == Color::White { (-1, 6) } else { (1, 1) };
        let target = self.get(to.0, to.1);
        if dc == 0 && target.is_none() {
            if dr == dir { return true; }
            if from.0 == start && dr == 2 * dir {
                let mid = (from.0 as i32 + dir) as u8;
                return self.get(mid, from.1).is_none();
            }
        }
        dc.abs() == 1 && dr == dir && target.is_some()
    }

    fn path_clear(&self, from: (u8, u8), to: (u8, u8)) -> bool {
        let step_r = (to.0 as i32 - from.0 as i32).signum();
        let step_c = (to.1 as i32 - from.1 as i32).signum();
        let (mut r, mut c) = (from.0 as i32 + step_r, from.1 as i32 + step_c);
        while (r, c) != (to.0 as i32, to.1 as i32) {
            if self.get(r as u8, c as u8).is_some() { return false; }
            r += step_r;
            c += step_c;
        }
        true
    }

    /// Destination squares for the piece on `from`, used for move hints.
    pub fn valid_targets(&self, side: Color, from: (u8, u8)) -> Vec<(u8, u8)> {
        let mut out = Vec::new();
        for r in 0..8 {
            for c in 0..8 {
                if self.is_valid_move(side, from, (r, c)) { out.push((r, c)); }
            }
        }
        out
    }

    /// Every move `side` may make under the simplified rules, row-major order.
    pub fn moves_for(&self, side: Color) -> Vec<MoveInfo> {
        let mut out = Vec::new();
        for fr in 0..8u8 {
            for fc in 0..8u8 {
                let Some((color, piece)) = self.get(fr, fc) else { continue };
                if color != side { continue; }
                for (tr, tc) in self.valid_targets(side, (fr, fc)) {
                    let (Some(from), Some(to)) = (coord_to_square(fr, fc), coord_to_square(tr, tc)) else { continue };
                    let promotion = (piece == Piece::Pawn && (tr == 0 || tr == 7)).then_some(Piece::Queen);
                    out.push(MoveInfo {
                        mv: Move { from, to, promotion },
                        piece,
                        captured: self.get(tr, tc).map(|(_, p)| p),
                        gives_check: false,
                        castle: false,
                    });
                }
            }
        }
        out
    }

    /// Move a piece without validation. Pawns reaching the far rank become queens.
    pub fn apply(&mut self, from: (u8, u8), to: (u8, u8)) -> Applied {
        let moving = self.get(from.0, from.1);
        let captured = self.get(to.0, to.1);
        let mut promoted = false;
        let placed = match moving {
            Some((color, Piece::Pawn)) if (color == Color::White && to.0 == 0) || (color == Color::Black && to.0 == 7) => {
                promoted = true;
                Some((color, Piece::Queen))
            }
            other => other,
        };
        self.set(to.0, to.1, placed);
        self.set(from.0, from.1, None);
        self.plies += 1;
        Applied { captured, promoted, winner: self.winner() }
    }

    pub fn find_king(&self, color: Color) -> Option<(u8, u8)> {
        (0..8u8)
            .flat_map(|r| (0..8u8).map(move |c| (r, c)))
            .find(|&(r, c)| self.get(r, c) == Some((color, Piece::King)))
    }

    /// The side whose king is still on the board once the other one is gone.
    pub fn winner(&self) -> Option<Color> {
        match (self.find_king(Color::White), self.find_king(Color::Black)) {
            (Some(_), None) => Some(Color::White),
            (None, Some(_)) => Some(Color::Black),
            _ => None,
        }
    }

    /// Export for the rules oracle. Castling rights are inferred from kings and
    /// rooks on their home squares; en passant is never set.
    pub fn to_fen(&self, side_to_move: Color) -> String {
        let mut fen = String::with_capacity(90);
        for r in 0..8u8 {
            let mut empty = 0;
            for c in 0..8u8 {
                match self.get(r, c) {
                    None => empty += 1,
                    Some((color, piece)) => {
                        if empty > 0 { fen.push_str(&empty.to_string()); empty = 0; }
                        fen.push(piece_char(color, piece));
                    }
                }
            }
            if empty > 0 { fen.push_str(&empty.to_string()); }
            if r < 7 { fen.push('/'); }
        }
        fen.push_str(if side_to_move == Color::White { " w " } else { " b " });
        let mut castling = String::new();
        let has = |r: u8, c: u8, cell: (Color, Piece)| self.get(r, c) == Some(cell);
        if has(7, 4, (Color::White, Piece::King)) {
            if has(7, 7, (Color::White, Piece::Rook)) { castling.push('K'); }
            if has(7, 0, (Color::White, Piece::Rook)) { castling.push('Q'); }
        }
        if has(0, 4, (Color::Black, Piece::King)) {
            if has(0, 7, (Color::Black, Piece::Rook)) { castling.push('k'); }
            if has(0, 0, (Color::Black, Piece::Rook)) { castling.push('q'); }
        }
        if castling.is_empty() { castling.push('-'); }
        fen.push_str(&castling);
        fen.push_str(&format!(" - 0 {}", self.plies / 2 + 1));
        fen
    }
}

fn piece_from_char(ch: char) -> Option<Piece> {
    match ch.to_ascii_lowercase() {
        'p' => Some(Piece::Pawn),
        'n' => Some(Piece::Knight),
        'b' => Some(Piece::Bishop),
        'r' => Some(Piece::Rook),
        'q' => Some(Piece::Queen),
        'k' => Some(Piece::King),
        _ => None,
    }
}

fn piece_char(color: Color, piece: Piece) -> char {
    let c = match piece {
        Piece::Pawn => 'p',
        Piece::Knight => 'n',
        Piece::Bishop => 'b',
        Piece::Rook => 'r',
        Piece::Queen => 'q',
        Piece::King => 'k',
    };
    if color == Color::White { c.to_ascii_uppercase() } else { c }
}
