use panelbot::profile::{choose_move, MoveSource, SearchProfile, SearchSettings, Strategy, TurnOutcome};
use panelbot::search::{SearchControl, SearchTables};
use panelbot::{ChosenMove, EngineError, Position};
use rand::rngs::SmallRng;
use rand::SeedableRng;

const POSITIONS: &[&str] = &[
    "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
    "r3k2r/pppq1ppp/2n2n2/3pp3/3PP3/2N2N2/PPPQ1PPP/R3K2R b KQkq - 0 8",
    "4k3/8/8/4p3/3Q1N2/8/8/4K3 b - - 0 1",
    "8/P6k/8/8/8/8/6p1/K7 w - - 0 60",
    "r3k2r/8/8/8/4pP2/8/8/R3K2R b KQkq f3 0 1",
];

const SINGLE_REPLY: &str = "k7/2Q5/8/7p/8/8/8/7K b - - 0 1";

fn shallow() -> SearchSettings {
    SearchSettings { depth: 2, time_limit: None, quiescence: true, ..SearchSettings::default() }
}

fn run(fen: &str, profile: &SearchProfile, seed: u64) -> ChosenMove {
    let mut pos = Position::from_fen(fen).unwrap();
    let mut tables = SearchTables::new();
    let mut rng = SmallRng::seed_from_u64(seed);
    match choose_move(&mut pos, profile, &mut tables, SearchControl::default(), &mut rng).unwrap() {
        TurnOutcome::Move(c) => c,
        TurnOutcome::Aborted => panic!("unexpected abort"),
    }
}

fn profiles() -> Vec<SearchProfile> {
    vec![
        SearchProfile::random(),
        SearchProfile::random().with_mistakes(1.0),
        SearchProfile::heuristic(false),
        SearchProfile::heuristic(true).with_mistakes(0.5),
        SearchProfile::search(shallow()),
        SearchProfile::search(SearchSettings { mix_randomness: 1.0, ..shallow() }),
        SearchProfile::search(SearchSettings { null_move: true, aggressive: true, ..shallow() }).with_mistakes(1.0),
    ]
}

#[test]
fn every_strategy_returns_a_legal_move() {
    for fen in POSITIONS {
        let legal: Vec<String> = Position::from_fen(fen).unwrap().legal_moves().iter().map(|m| m.uci()).collect();
        for profile in profiles() {
            for seed in 0..4 {
                let c = run(fen, &profile, seed);
                assert!(legal.contains(&c.info.uci()), "{fen}: {} from {:?}", c.info.uci(), profile.strategy);
            }
        }
    }
}

#[test]
fn random_with_one_legal_move_returns_it() {
    for seed in 0..50 {
        assert_eq!(run(SINGLE_REPLY, &SearchProfile::random(), seed).info.uci(), "h5h4");
        assert_eq!(run(SINGLE_REPLY, &SearchProfile::random().with_mistakes(1.0), seed).info.uci(), "h5h4");
    }
}

#[test]
fn certain_mistake_changes_the_heuristic_choice() {
    let fen = "4k3/8/8/4p3/3Q1N2/8/8/4K3 b - - 0 1";
    for seed in 0..20 {
        let clean = run(fen, &SearchProfile::heuristic(true), seed);
        assert_eq!(clean.info.uci(), "e5d4");
        let worse = run(fen, &SearchProfile::heuristic(true).with_mistakes(1.0), seed);
        assert_ne!(worse.info.mv, clean.info.mv);
        assert_eq!(worse.source, MoveSource::Mistake);
    }
}

#[test]
fn certain_mistake_changes_the_searched_choice() {
    let fen = "r5k1/5ppp/8/8/8/8/5PPP/6K1 b - - 0 1";
    let clean = run(fen, &SearchProfile::search(shallow()), 1);
    assert_eq!(clean.info.uci(), "a8a1");
    assert_eq!(clean.source, MoveSource::Search);
    assert!(clean.score.is_some());
    for seed in 0..10 {
        let worse = run(fen, &SearchProfile::search(shallow()).with_mistakes(1.0), seed);
        assert_ne!(worse.info.uci(), "a8a1");
    }
}

#[test]
fn searched_choice_is_deterministic_without_randomness() {
    let fen = POSITIONS[1];
    let profile = SearchProfile::search(shallow());
    let a = run(fen, &profile, 3);
    let b = run(fen, &profile, 99);
    assert_eq!(a, b);
}

#[test]
fn full_mixing_uses_the_heuristic() {
    let profile = SearchProfile::search(SearchSettings { mix_randomness: 1.0, ..shallow() });
    let c = run(POSITIONS[2], &profile, 5);
    assert_eq!(c.source, MoveSource::Heuristic);
    assert!(matches!(profile.strategy, Strategy::Search(_)));
}

#[test]
fn no_legal_move_is_an_error() {
    let mut pos = Position::from_fen("6k1/5ppp/8/8/8/8/5PPP/r5K1 w - - 0 1").unwrap();
    let mut tables = SearchTables::new();
    let mut rng = SmallRng::seed_from_u64(0);
    for profile in profiles() {
        let err = choose_move(&mut pos, &profile, &mut tables, SearchControl::default(), &mut rng).unwrap_err();
        assert!(matches!(err, EngineError::NoLegalMoves(cozy_chess::Color::White)));
    }
}

#[test]
fn castling_reaches_the_host_as_a_king_step() {
    // cozy reports O-O as e1h1
    let fen = "4k3/8/8/8/8/8/3PPPPP/3QK2R w K - 0 1";
    let legal = Position::from_fen(fen).unwrap().legal_moves();
    let castle = legal.iter().find(|m| m.castle).expect("short castle available");
    let c = ChosenMove::new(*castle, MoveSource::Search, None);
    assert_eq!(c.coord.to_string(), "e1g1");
}
