use cozy_chess::{Board, File, Move, Piece, Rank, Square};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Verbose move descriptor: the oracle's move plus everything the orderer and
/// the pickers need to know about it without touching the board again.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MoveInfo {
    pub mv: Move,
    pub piece: Piece,
    pub captured: Option<Piece>,
    pub gives_check: bool,
    pub castle: bool,
}

impl MoveInfo {
    /// Describe a legal move of `piece` in `board`.
    pub fn new(board: &Board, piece: Piece, mv: Move) -> Self {
        let stm = board.side_to_move();
        // cozy encodes castling as the king capturing its own rook
        let castle = piece == Piece::King && board.color_on(mv.to) == Some(stm);
        let captured = if castle {
            None
        } else {
            board.piece_on(mv.to).or_else(|| {
                let en_passant = piece == Piece::Pawn && mv.from.file() != mv.to.file();
                en_passant.then_some(Piece::Pawn)
            })
        };
        let mut child = board.clone();
        child.play_unchecked(mv);
        let gives_check = !child.checkers().is_empty();
        Self { mv, piece, captured, gives_check, castle }
    }

    pub fn from(&self) -> Square { self.mv.from }
    pub fn to(&self) -> Square { self.mv.to }
    pub fn promotion(&self) -> Option<Piece> { self.mv.promotion }

    pub fn is_capture(&self) -> bool { self.captured.is_some() }

    /// Captures, promotions and checks: the moves quiescence looks at.
    pub fn is_tactical(&self) -> bool {
        self.captured.is_some() || self.mv.promotion.is_some() || self.gives_check
    }

    pub fn uci(&self) -> String { format!("{}", self.mv) }
}

impl fmt::Display for MoveInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.mv)?;
        if self.gives_check { write!(f, "+")?; }
        Ok(())
    }
}

/// Move in the host's board coordinates: row 0 is rank 8, column 0 is file a.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoordMove {
    pub from_row: u8,
    pub from_col: u8,
    pub to_row: u8,
    pub to_col: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promotion: Option<char>,
}

impl CoordMove {
    /// Castling becomes the plain two-square king step the host understands.
    pub fn from_info(info: &MoveInfo) -> Self {
        let (from_row, from_col) = square_to_coord(info.from());
        let (mut to_row, mut to_col) = square_to_coord(info.to());
        if info.castle {
            to_row = from_row;
            to_col = if info.to().file() as usize > info.from().file() as usize { 6 } else { 2 };
        }
        Self { from_row, from_col, to_row, to_col, promotion: info.promotion().map(promotion_char) }
    }

    /// Parse long algebraic text such as `e7e5` or `b7b8q`.
    pub fn from_uci(text: &str) -> Option<Self> {
        let b = text.as_bytes();
        if b.len() != 4 && b.len() != 5 { return None; }
        let from = parse_square(&b[0..2])?;
        let to = parse_square(&b[2..4])?;
        let promotion = match b.get(4) {
            None => None,
            Some(&c) if matches!(c, b'q' | b'r' | b'b' | b'n') => Some(c as char),
            Some(_) => return None,
        };
        let (from_row, from_col) = square_to_coord(from);
        let (to_row, to_col) = square_to_coord(to);
        Some(Self { from_row, from_col, to_row, to_col, promotion })
    }

    pub fn from_square(&self) -> Option<Square> { coord_to_square(self.from_row, self.from_col) }
    pub fn to_square(&self) -> Option<Square> { coord_to_square(self.to_row, self.to_col) }
}

impl fmt::Display for CoordMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.from_square(), self.to_square()) {
            (Some(a), Some(b)) => {
                write!(f, "{a}{b}")?;
                if let Some(p) = self.promotion { write!(f, "{p}")?; }
                Ok(())
            }
            _ => write!(f, "({},{})->({},{})", self.from_row, self.from_col, self.to_row, self.to_col),
        }
    }
}

pub fn square_to_coord(sq: Square) -> (u8, u8) {
    ((7 - sq.rank() as usize) as u8, sq.file() as u8)
}

pub fn coord_to_square(row: u8, col: u8) -> Option<Square> {
    if row > 7 || col > 7 { return None; }
    Some(Square::new(File::index_const(col as usize), Rank::index_const(7 - row as usize)))
}

fn parse_square(b: &[u8]) -> Option<Square> {
    let (f, r) = (b[0], b[1]);
    if !(b'a'..=b'h').contains(&f) || !(b'1'..=b'8').contains(&r) { return None; }
    Some(Square::new(File::index_const((f - b'a') as usize), Rank::index_const((r - b'1') as usize)))
}

pub fn promotion_char(piece: Piece) -> char {
    match piece {
        Piece::Knight => 'n',
        Piece::Bishop => 'b',
        Piece::Rook => 'r',
        _ => 'q',
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coord_round_trip_corner_squares() {
        assert_eq!(square_to_coord(Square::A8), (0, 0));
        assert_eq!(square_to_coord(Square::H1), (7, 7));
        assert_eq!(coord_to_square(0, 0), Some(Square::A8));
        assert_eq!(coord_to_square(8, 0), None);
    }

    #[test]
    fn castle_maps_to_king_step() {
        let board = Board::from_fen("r3k2r/8/8/8/8/8/8/4K3 b kq - 0 1", false).unwrap();
        let mv: Move = "e8h8".parse().unwrap();
        let info = MoveInfo::new(&board, Piece::King, mv);
        assert!(info.castle);
        assert_eq!(info.captured, None);
        let c = CoordMove::from_info(&info);
        assert_eq!((c.from_row, c.from_col, c.to_row, c.to_col), (0, 4, 0, 6));
    }

    #[test]
    fn en_passant_reports_pawn_capture() {
        let board = Board::from_fen("4k3/8/8/8/3pP3/8/8/4K3 b - e3 0 1", false).unwrap();
        let mv: Move = "d4e3".parse().unwrap();
        let info = MoveInfo::new(&board, Piece::Pawn, mv);
        assert_eq!(info.captured, Some(Piece::Pawn));
    }

    #[test]
    fn uci_text_parses_with_promotion() {
        let c = CoordMove::from_uci("b7b8q").unwrap();
        assert_eq!((c.from_row, c.from_col, c.to_row, c.to_col, c.promotion), (1, 1, 0, 1, Some('q')));
        assert!(CoordMove::from_uci("z9a1").is_none());
        assert_eq!(c.to_string(), "b7b8q");
    }
}
