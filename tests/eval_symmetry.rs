use cozy_chess::{Board, Color};
use panelbot::search::eval::{evaluate, evaluate_for, is_endgame, material_and_pst, static_eval_white, EvalOptions};

/// Flip the board vertically and swap colors.
fn mirror_fen(fen: &str) -> String {
    let parts: Vec<&str> = fen.split_whitespace().collect();
    let swap = |s: &str| -> String {
        s.chars().map(|c| if c.is_ascii_uppercase() { c.to_ascii_lowercase() } else { c.to_ascii_uppercase() }).collect()
    };
    let placement: Vec<String> = parts[0].split('/').rev().map(swap).collect();
    let side = if parts[1] == "w" { "b" } else { "w" };
    let castling = if parts[2] == "-" {
        "-".to_string()
    } else {
        let mut c: Vec<char> = swap(parts[2]).chars().collect();
        c.sort_by_key(|ch| (ch.is_ascii_lowercase(), *ch != 'K' && *ch != 'k'));
        c.into_iter().collect()
    };
    let ep = if parts[3] == "-" {
        "-".to_string()
    } else {
        let b = parts[3].as_bytes();
        format!("{}{}", b[0] as char, (b'1' + b'8' - b[1]) as char)
    };
    format!("{} {} {} {} {} {}", placement.join("/"), side, castling, ep, parts[4], parts[5])
}

const POSITIONS: &[&str] = &[
    "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
    "r1bqkbnr/pppp1ppp/2n5/4p3/2B1P3/5N2/PPPP1PPP/RNBQK2R b KQkq - 3 3",
    "r3k2r/pppq1ppp/2n2n2/3pp3/3PP3/2N2N2/PPPQ1PPP/R3K2R w KQkq - 0 8",
    "8/5k2/3p4/1p1Pp2p/pP2Pp1P/P4P1K/8/8 b - - 99 50",
    "4k3/1R6/8/3P4/8/8/5PPP/6K1 w - - 0 30",
    "2r3k1/1q3ppp/p3p3/1p1nP3/3P4/P2B1N2/1P3PPP/2RQ2K1 w - - 4 24",
];

#[test]
fn mirror_helper_round_trips() {
    for fen in POSITIONS {
        assert_eq!(mirror_fen(&mirror_fen(fen)), *fen);
    }
}

#[test]
fn material_and_pst_negate_under_mirror() {
    for fen in POSITIONS {
        let b = Board::from_fen(fen, false).unwrap();
        let m = Board::from_fen(&mirror_fen(fen), false).unwrap();
        for endgame in [false, true] {
            assert_eq!(material_and_pst(&b, endgame), -material_and_pst(&m, endgame), "{fen}");
        }
        assert_eq!(is_endgame(&b), is_endgame(&m));
        assert_eq!(static_eval_white(&b), -static_eval_white(&m), "{fen}");
    }
}

#[test]
fn side_to_move_eval_is_mirror_invariant() {
    for fen in POSITIONS {
        let b = Board::from_fen(fen, false).unwrap();
        let m = Board::from_fen(&mirror_fen(fen), false).unwrap();
        for aggressive in [false, true] {
            let opts = EvalOptions { aggressive };
            assert_eq!(evaluate(&b, opts), evaluate(&m, opts), "{fen}");
            assert_eq!(evaluate_for(&b, opts, Color::White), evaluate_for(&m, opts, Color::Black), "{fen}");
        }
    }
}

#[test]
fn extra_material_is_good_for_its_owner() {
    let b = Board::from_fen("4k3/8/8/8/8/8/8/Q3K3 b - - 0 1", false).unwrap();
    let opts = EvalOptions::default();
    assert!(evaluate_for(&b, opts, Color::White) > 800);
    assert!(evaluate(&b, opts) < -800);
}

#[test]
fn dead_draws_score_zero() {
    let opts = EvalOptions { aggressive: true };
    let bare = Board::from_fen("4k3/8/8/8/8/8/8/3BK3 w - - 0 1", false).unwrap();
    assert_eq!(evaluate(&bare, opts), 0);
    let fifty = Board::from_fen("4k3/8/8/8/8/8/8/Q3K3 w - - 100 80", false).unwrap();
    assert_eq!(evaluate(&fifty, opts), 0);
}
