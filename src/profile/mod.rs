//! Difficulty levels, the strategy each one maps to, and the single dispatch
//! that turns a profile into a committed move.

pub mod heuristic;

use cozy_chess::Color;
use log::{debug, info};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::board::moves::{CoordMove, MoveInfo};
use crate::board::position::Position;
use crate::book::{self, BOOK_MAX_PLY};
use crate::error::{EngineError, Result};
use crate::search::{SearchControl, SearchParams, SearchTables, Searcher};
use heuristic::{heuristic_pick, imperfect_pick, random_pick, roll};

/// Search deadlines shorter than this are raised to it.
pub const MIN_TIME_LIMIT: Duration = Duration::from_millis(500);
const DEFAULT_TIME_LIMIT_MS: u64 = 200;
const EASY_RANDOM_DOWNGRADE: f64 = 0.6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    #[default]
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for Difficulty {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        Difficulty::ALL
            .into_iter()
            .find(|d| d.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| EngineError::UnknownLevel(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LevelKind {
    Random,
    Heuristic,
    Engine,
}

/// One entry of the difficulty table as the host configures it. Unset
/// options fall back to per-level defaults in [`profile_for`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelConfig {
    #[serde(rename = "type")]
    pub kind: LevelKind,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub depth: Option<u32>,
    #[serde(default)]
    pub max_time_ms: Option<u64>,
    #[serde(default)]
    pub mix_randomness: Option<f64>,
    #[serde(default)]
    pub allow_heuristic_fallback: Option<bool>,
    #[serde(default)]
    pub prefer_aggressive: Option<bool>,
    #[serde(default)]
    pub mistake_chance: Option<f64>,
    #[serde(default)]
    pub use_quiescence: Option<bool>,
    #[serde(default)]
    pub use_null_move: Option<bool>,
    #[serde(default)]
    pub use_opening_book: Option<bool>,
}

impl LevelConfig {
    fn new(kind: LevelKind, label: &str) -> Self {
        Self {
            kind,
            label: Some(label.to_string()),
            depth: None,
            max_time_ms: None,
            mix_randomness: None,
            allow_heuristic_fallback: None,
            prefer_aggressive: None,
            mistake_chance: None,
            use_quiescence: None,
            use_null_move: None,
            use_opening_book: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DifficultyTable {
    pub easy: LevelConfig,
    pub medium: LevelConfig,
    pub hard: LevelConfig,
}

impl Default for DifficultyTable {
    fn default() -> Self {
        let easy = LevelConfig { max_time_ms: Some(200), ..LevelConfig::new(LevelKind::Random, "Easy") };
        let medium = LevelConfig {
            depth: Some(3),
            max_time_ms: Some(800),
            mix_randomness: Some(0.2),
            allow_heuristic_fallback: Some(true),
            prefer_aggressive: Some(false),
            ..LevelConfig::new(LevelKind::Engine, "Medium")
        };
        let hard = LevelConfig {
            depth: Some(5),
            max_time_ms: Some(2200),
            mix_randomness: Some(0.0),
            allow_heuristic_fallback: Some(true),
            prefer_aggressive: Some(true),
            ..LevelConfig::new(LevelKind::Engine, "Hard")
        };
        Self { easy, medium, hard }
    }
}

impl DifficultyTable {
    /// Parse a table; levels missing from the JSON keep their defaults.
    pub fn load_from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn level(&self, d: Difficulty) -> &LevelConfig {
        match d {
            Difficulty::Easy => &self.easy,
            Difficulty::Medium => &self.medium,
            Difficulty::Hard => &self.hard,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchSettings {
    pub depth: u32,
    /// `None` searches until `depth` is done.
    pub time_limit: Option<Duration>,
    pub mix_randomness: f64,
    pub allow_heuristic_fallback: bool,
    pub aggressive: bool,
    pub quiescence: bool,
    pub null_move: bool,
    pub opening_book: bool,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            depth: 3,
            time_limit: Some(MIN_TIME_LIMIT),
            mix_randomness: 0.0,
            allow_heuristic_fallback: true,
            aggressive: false,
            quiescence: false,
            null_move: false,
            opening_book: false,
        }
    }
}

impl SearchSettings {
    pub fn params(&self) -> SearchParams {
        SearchParams {
            depth: self.depth.max(1),
            movetime: self.time_limit.map(|t| t.max(MIN_TIME_LIMIT)),
            use_tt: true,
            use_quiescence: self.quiescence,
            use_nullmove: self.null_move,
            aggressive: self.aggressive,
            max_nodes: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Strategy {
    Random,
    Heuristic { aggressive: bool },
    Search(SearchSettings),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchProfile {
    pub strategy: Strategy,
    pub mistake_chance: f64,
    /// Share of mistakes that are plain random moves rather than heuristic ones.
    pub random_downgrade_chance: f64,
    pub label: String,
}

impl SearchProfile {
    pub fn random() -> Self {
        Self { strategy: Strategy::Random, mistake_chance: 0.0, random_downgrade_chance: 0.0, label: "Random".into() }
    }

    pub fn heuristic(aggressive: bool) -> Self {
        Self { strategy: Strategy::Heuristic { aggressive }, mistake_chance: 0.0, random_downgrade_chance: 0.0, label: "Heuristic".into() }
    }

    pub fn search(settings: SearchSettings) -> Self {
        Self { strategy: Strategy::Search(settings), mistake_chance: 0.0, random_downgrade_chance: 0.0, label: "Engine".into() }
    }

    pub fn with_mistakes(mut self, chance: f64) -> Self {
        self.mistake_chance = clamp_chance(Some(chance), 0.0);
        self
    }

    fn aggressive(&self) -> bool {
        match self.strategy {
            Strategy::Random => false,
            Strategy::Heuristic { aggressive } => aggressive,
            Strategy::Search(s) => s.aggressive,
        }
    }
}

fn clamp_chance(value: Option<f64>, fallback: f64) -> f64 {
    match value {
        Some(v) if v.is_finite() => v.clamp(0.0, 1.0),
        _ => fallback,
    }
}

/// Resolve a configured level into the immutable profile for one turn.
pub fn profile_for(level: Difficulty, config: &LevelConfig) -> SearchProfile {
    let hard = level == Difficulty::Hard;
    let medium = level == Difficulty::Medium;
    let label = config.label.clone().unwrap_or_else(|| "AI".to_string());
    let random_downgrade_chance = if level == Difficulty::Easy { EASY_RANDOM_DOWNGRADE } else { 0.0 };
    let strategy = match config.kind {
        LevelKind::Random => {
            return SearchProfile { strategy: Strategy::Random, mistake_chance: clamp_chance(config.mistake_chance, 0.65), random_downgrade_chance, label };
        }
        LevelKind::Heuristic => {
            let aggressive = config.prefer_aggressive.unwrap_or(false);
            return SearchProfile { strategy: Strategy::Heuristic { aggressive }, mistake_chance: clamp_chance(config.mistake_chance, 0.05), random_downgrade_chance, label };
        }
        LevelKind::Engine => Strategy::Search(SearchSettings {
            depth: config.depth.unwrap_or(if hard { 6 } else { 3 }),
            time_limit: Some(Duration::from_millis(config.max_time_ms.unwrap_or(DEFAULT_TIME_LIMIT_MS))),
            mix_randomness: clamp_chance(config.mix_randomness, if medium { 0.15 } else { 0.0 }),
            allow_heuristic_fallback: config.allow_heuristic_fallback.unwrap_or(true),
            aggressive: config.prefer_aggressive.unwrap_or(hard),
            quiescence: config.use_quiescence.unwrap_or(hard),
            null_move: config.use_null_move.unwrap_or(hard),
            opening_book: config.use_opening_book.unwrap_or(hard),
        }),
    };
    SearchProfile { strategy, mistake_chance: clamp_chance(config.mistake_chance, if medium { 0.08 } else { 0.0 }), random_downgrade_chance, label }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveSource {
    Random,
    Heuristic,
    Book,
    Search,
    Mistake,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChosenMove {
    pub info: MoveInfo,
    pub coord: CoordMove,
    pub source: MoveSource,
    /// Search score, side-to-move relative, when the move came from the engine.
    pub score: Option<i32>,
}

impl ChosenMove {
    pub fn new(info: MoveInfo, source: MoveSource, score: Option<i32>) -> Self {
        Self { info, coord: CoordMove::from_info(&info), source, score }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    Move(ChosenMove),
    /// The turn was cancelled; nothing may be committed.
    Aborted,
}

impl TurnOutcome {
    pub fn chosen(&self) -> Option<&ChosenMove> {
        match self {
            TurnOutcome::Move(c) => Some(c),
            TurnOutcome::Aborted => None,
        }
    }
}

/// Pick a move for the side to move in `pos` according to `profile`.
///
/// The chain is: primary strategy (book, search or greedy pick), then the
/// heuristic pick when the strategy produced nothing and fallback is allowed,
/// then the once-per-turn mistake roll, then any random legal move. A side
/// with no legal move is an error for the host to turn into game over.
pub fn choose_move<R: Rng + ?Sized>(
    pos: &mut Position,
    profile: &SearchProfile,
    tables: &mut SearchTables,
    control: SearchControl,
    rng: &mut R,
) -> Result<TurnOutcome> {
    let side = pos.side_to_move();
    let moves = pos.legal_moves();
    if moves.is_empty() {
        return Err(EngineError::NoLegalMoves(side));
    }
    let token = control.token().clone();
    let aggressive = profile.aggressive();

    let (primary, allow_fallback) = match profile.strategy {
        Strategy::Random => (random_pick(&moves, rng).map(|m| ChosenMove::new(m, MoveSource::Random, None)), true),
        Strategy::Heuristic { aggressive } => {
            (heuristic_pick(&moves, side, aggressive, rng).map(|m| ChosenMove::new(m, MoveSource::Heuristic, None)), true)
        }
        Strategy::Search(settings) => {
            let mut primary = None;
            if roll(rng, settings.mix_randomness) {
                debug!("mixing in a heuristic move");
                primary = heuristic_pick(&moves, side, aggressive, rng).map(|m| ChosenMove::new(m, MoveSource::Heuristic, None));
            }
            if primary.is_none() && settings.opening_book && pos.game_ply() < BOOK_MAX_PLY {
                primary = book::pick(pos.board(), rng)
                    .and_then(|mv| moves.iter().find(|m| m.mv == mv).copied())
                    .map(|m| ChosenMove::new(m, MoveSource::Book, None));
            }
            if primary.is_none() {
                let mut searcher = Searcher::new(tables, control);
                let res = searcher.search(pos, settings.params());
                if res.aborted {
                    return Ok(TurnOutcome::Aborted);
                }
                debug!("search depth {} score {} nodes {}", res.depth, res.score_cp, res.nodes);
                primary = res
                    .bestmove
                    .and_then(|mv| moves.iter().find(|m| m.mv == mv).copied())
                    .map(|m| ChosenMove::new(m, MoveSource::Search, Some(res.score_cp)));
            }
            (primary, settings.allow_heuristic_fallback)
        }
    };

    let mut chosen = primary;
    if chosen.is_none() && allow_fallback {
        chosen = heuristic_pick(&moves, side, aggressive, rng).map(|m| ChosenMove::new(m, MoveSource::Heuristic, None));
    }
    if roll(rng, profile.mistake_chance) {
        let original = chosen.map(|c| c.info.mv);
        if let Some(m) = imperfect_pick(&moves, side, original, aggressive, profile.random_downgrade_chance, rng) {
            debug!("mistake: {} replaces {:?}", m.uci(), original.map(|mv| mv.to_string()));
            chosen = Some(ChosenMove::new(m, MoveSource::Mistake, None));
        }
    }
    let chosen = match chosen.or_else(|| random_pick(&moves, rng).map(|m| ChosenMove::new(m, MoveSource::Random, None))) {
        Some(c) => c,
        None => return Err(EngineError::NoLegalMoves(side)),
    };

    if token.is_aborted() {
        return Ok(TurnOutcome::Aborted);
    }
    let score = chosen.score.map(|s| format!(", score {s}")).unwrap_or_default();
    info!("{} plays {} ({:?}{score})", color_name(side), chosen.info, chosen.source);
    Ok(TurnOutcome::Move(chosen))
}

/// Imperfect pick for callers that only have a move list, such as the host
/// grid when the oracle could not read it.
pub fn fallback_pick<R: Rng + ?Sized>(moves: &[MoveInfo], side: Color, profile: &SearchProfile, rng: &mut R) -> Option<ChosenMove> {
    imperfect_pick(moves, side, None, profile.aggressive(), profile.random_downgrade_chance, rng)
        .map(|m| ChosenMove::new(m, MoveSource::Heuristic, None))
}

pub(crate) fn color_name(c: Color) -> &'static str {
    if c == Color::White { "White" } else { "Black" }
}
