use cozy_chess::{Board, Color, Piece};
use std::sync::OnceLock;

// 12 piece kinds x 64 squares, then 4 castling files-present flags, 8 en passant files
const PIECE_KEYS: usize = 12 * 64;
const CASTLE_OFFSET: usize = PIECE_KEYS;
const EP_OFFSET: usize = CASTLE_OFFSET + 4;
const TABLE_LEN: usize = EP_OFFSET + 8;

fn piece_index(color: Color, piece: Piece) -> usize {
    let c = if color == Color::White { 0 } else { 1 };
    c * 6 + piece as usize
}

fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9E3779B97F4A7C15);
    let mut z = x;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
    z ^ (z >> 31)
}

static TABLE: OnceLock<[u64; TABLE_LEN]> = OnceLock::new();
static SIDE_KEY: OnceLock<u64> = OnceLock::new();

fn init_table() -> &'static [u64; TABLE_LEN] {
    TABLE.get_or_init(|| {
        let mut t = [0u64; TABLE_LEN];
        let mut seed = 0xC0FF_EE00_5EED_CAFE;
        for v in &mut t {
            seed = splitmix64(seed);
            *v = seed;
        }
        t
    })
}

fn init_side() -> u64 {
    *SIDE_KEY.get_or_init(|| splitmix64(0x0123_4567_89AB_CDEF))
}

/// Position fingerprint for the transposition table. Covers placement, side to
/// move, castling rights and the en passant file; move counters are left out so
/// transpositions reached at different move numbers share an entry.
pub fn compute(board: &Board) -> u64 {
    let table = init_table();
    let mut key = 0u64;
    for color in Color::ALL {
        for piece in Piece::ALL {
            for sq in board.colored_pieces(color, piece) {
                key ^= table[piece_index(color, piece) * 64 + sq as usize];
            }
        }
        let rights = board.castle_rights(color);
        let base = CASTLE_OFFSET + if color == Color::White { 0 } else { 2 };
        if rights.short.is_some() { key ^= table[base]; }
        if rights.long.is_some() { key ^= table[base + 1]; }
    }
    if let Some(file) = board.en_passant() {
        key ^= table[EP_OFFSET + file as usize];
    }
    if board.side_to_move() == Color::Black { key ^= init_side(); }
    key
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transposed_move_orders_share_a_key() {
        let mut a = Board::default();
        for m in ["g1f3", "g8f6", "b1c3"] { a.play(m.parse().unwrap()); }
        let mut b = Board::default();
        for m in ["b1c3", "g8f6", "g1f3"] { b.play(m.parse().unwrap()); }
        assert_eq!(compute(&a), compute(&b));
    }

    #[test]
    fn side_to_move_changes_key() {
        let w = Board::from_fen("4k3/8/8/8/8/8/8/4K3 w - - 0 1", false).unwrap();
        let b = Board::from_fen("4k3/8/8/8/8/8/8/4K3 b - - 0 1", false).unwrap();
        assert_ne!(compute(&w), compute(&b));
    }
}
