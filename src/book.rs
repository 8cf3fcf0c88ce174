//! Small fixed book of Black replies in common openings, keyed by piece
//! placement plus side to move (the first two FEN fields).

use cozy_chess::{Board, Move};
use log::trace;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::board::position::find_uci;

/// Book moves are only considered while the game is younger than this.
pub const BOOK_MAX_PLY: u32 = 20;

#[derive(Debug, Clone, Copy)]
pub struct BookEntry {
    pub name: &'static str,
    pub key: &'static str,
    pub replies: &'static [&'static str],
}

pub const BOOK: &[BookEntry] = &[
    BookEntry {
        name: "King's Pawn",
        key: "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b",
        replies: &["e7e5", "c7c5", "e7e6", "c7c6"],
    },
    BookEntry {
        name: "Queen's Pawn",
        key: "rnbqkbnr/pppppppp/8/8/3P4/8/PPP1PPPP/RNBQKBNR b",
        replies: &["d7d5", "g8f6", "e7e6"],
    },
    BookEntry {
        name: "Reti",
        key: "rnbqkbnr/pppppppp/8/8/8/5N2/PPPPPPPP/RNBQKB1R b",
        replies: &["d7d5", "g8f6", "c7c5"],
    },
    BookEntry {
        name: "English",
        key: "rnbqkbnr/pppppppp/8/8/2P5/8/PP1PPPPP/RNBQKBNR b",
        replies: &["e7e5", "c7c5", "g8f6"],
    },
    BookEntry {
        name: "King's Knight",
        key: "rnbqkbnr/pppp1ppp/8/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R b",
        replies: &["b8c6", "g8f6"],
    },
    BookEntry {
        name: "Sicilian, 2.Nf3",
        key: "rnbqkbnr/pp1ppppp/8/2p5/4P3/5N2/PPPP1PPP/RNBQKB1R b",
        replies: &["d7d6", "b8c6", "e7e6"],
    },
    BookEntry {
        name: "Queen's Gambit",
        key: "rnbqkbnr/ppp1pppp/8/3p4/2PP4/8/PP2PPPP/RNBQKBNR b",
        replies: &["e7e6", "c7c6", "d5c4"],
    },
    BookEntry {
        name: "Indian, 2.c4",
        key: "rnbqkb1r/pppppppp/5n2/8/2PP4/8/PP2PPPP/RNBQKBNR b",
        replies: &["e7e6", "g7g6", "c7c5"],
    },
    BookEntry {
        name: "Italian",
        key: "r1bqkbnr/pppp1ppp/2n5/4p3/2B1P3/5N2/PPPP1PPP/RNBQK2R b",
        replies: &["g8f6", "f8c5"],
    },
    BookEntry {
        name: "Ruy Lopez",
        key: "r1bqkbnr/pppp1ppp/2n5/1B2p3/4P3/5N2/PPPP1PPP/RNBQK2R b",
        replies: &["a7a6", "g8f6", "f8c5"],
    },
];

/// Placement and side to move of a full FEN.
pub fn fen_prefix(fen: &str) -> String {
    fen.split_whitespace().take(2).collect::<Vec<_>>().join(" ")
}

pub fn lookup(prefix: &str) -> Option<&'static BookEntry> {
    BOOK.iter().find(|e| e.key == prefix)
}

/// Random book reply for `board`, if its position is in the book and the
/// chosen reply is legal there.
pub fn pick<R: Rng + ?Sized>(board: &Board, rng: &mut R) -> Option<Move> {
    let prefix = fen_prefix(&board.to_string());
    let Some(entry) = lookup(&prefix) else {
        trace!("book miss: {prefix}");
        return None;
    };
    let reply = entry.replies.choose(rng)?;
    let mv = find_uci(board, reply)?;
    trace!("book hit: {} -> {reply}", entry.name);
    Some(mv)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_reply_is_legal_in_its_position() {
        for entry in BOOK {
            let board = Board::from_fen(&format!("{} KQkq - 0 1", entry.key), false)
                .unwrap_or_else(|e| panic!("{}: {e:?}", entry.name));
            for r in entry.replies {
                assert!(find_uci(&board, r).is_some(), "{}: {r} illegal", entry.name);
            }
        }
    }

    #[test]
    fn prefix_drops_counters() {
        assert_eq!(fen_prefix("8/8/8/8/8/8/8/K6k w - - 3 40"), "8/8/8/8/8/8/8/K6k w");
    }
}
