use cozy_chess::{Board, Move};
use panelbot::board::position::legal_moves;
use panelbot::search::ordering::{order_moves, score_move, HistoryTable, KillerTable};
use pretty_assertions::assert_eq;

fn uci_order(fen: &str, killers: &KillerTable, history: &HistoryTable, hash: Option<Move>) -> Vec<String> {
    let b = Board::from_fen(fen, false).unwrap();
    let mut moves = legal_moves(&b);
    order_moves(&mut moves, 2, killers, history, hash);
    moves.iter().map(|m| m.uci()).collect()
}

#[test]
fn captures_lead_by_victim_then_attacker() {
    // Pawn and queen can both take the rook on d5
    let fen = "4k3/8/5n2/3r4/4P3/8/8/3QK3 w - - 0 1";
    let order = uci_order(fen, &KillerTable::new(), &HistoryTable::new(), None);
    assert_eq!(order[..2].to_vec(), vec!["e4d5".to_string(), "d1d5".to_string()]);
}

#[test]
fn hash_move_goes_first() {
    let fen = "4k3/8/5n2/3r4/4P3/8/8/3QK3 w - - 0 1";
    let hash: Move = "e1f2".parse().unwrap();
    let order = uci_order(fen, &KillerTable::new(), &HistoryTable::new(), Some(hash));
    assert_eq!(order[0], "e1f2");
}

#[test]
fn killers_rank_above_plain_quiet_moves() {
    let b = Board::default();
    let mut killers = KillerTable::new();
    let a2a3: Move = "a2a3".parse().unwrap();
    let h2h3: Move = "h2h3".parse().unwrap();
    killers.update(2, a2a3);
    killers.update(2, h2h3);
    let history = HistoryTable::new();
    let mut moves = legal_moves(&b);
    order_moves(&mut moves, 2, &killers, &history, None);
    let first: Vec<String> = moves.iter().take(2).map(|m| m.uci()).collect();
    assert_eq!(first, vec!["h2h3".to_string(), "a2a3".to_string()]);

    // killers are per ply
    let mut moves = legal_moves(&b);
    order_moves(&mut moves, 3, &killers, &history, None);
    assert_ne!(moves[0].uci(), "h2h3");
}

#[test]
fn history_bonus_is_capped() {
    let b = Board::default();
    let info = legal_moves(&b).into_iter().find(|m| m.uci() == "b1c3").unwrap();
    let killers = KillerTable::new();
    let mut history = HistoryTable::new();
    let base = score_move(&info, 0, &killers, &history);
    history.add(info.mv, 3);
    assert_eq!(score_move(&info, 0, &killers, &history), base + 9);
    for _ in 0..100 { history.add(info.mv, 10); }
    assert_eq!(score_move(&info, 0, &killers, &history), base + 500);
}

#[test]
fn equal_scores_keep_generation_order() {
    let b = Board::from_fen("7k/8/8/8/8/8/8/K7 w - - 0 1", false).unwrap();
    let mut moves = legal_moves(&b);
    let generated: Vec<String> = moves.iter().map(|m| m.uci()).collect();
    order_moves(&mut moves, 0, &KillerTable::new(), &HistoryTable::new(), None);
    let ordered: Vec<String> = moves.iter().map(|m| m.uci()).collect();
    // a2 and b1 are equally central, b2 is more central
    assert_eq!(ordered[0], "a1b2");
    let a2 = generated.iter().position(|m| m == "a1a2").unwrap();
    let b1 = generated.iter().position(|m| m == "a1b1").unwrap();
    let oa2 = ordered.iter().position(|m| m == "a1a2").unwrap();
    let ob1 = ordered.iter().position(|m| m == "a1b1").unwrap();
    assert_eq!(a2 < b1, oa2 < ob1);
}
