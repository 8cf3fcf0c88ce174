use cozy_chess::Color;
use log::{info, warn};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};

use crate::board::grid::Grid;
use crate::board::position::Position;
use crate::error::{EngineError, Result};
use crate::profile::{choose_move, fallback_pick, profile_for, Difficulty, DifficultyTable, SearchProfile, TurnOutcome};
use crate::search::{AbortToken, SearchControl, SearchTables, YieldHook};

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    // A panicked search leaves the tables usable; at worst some entries are stale.
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Which turn is current and whether it is still running. Turns are numbered
/// so a finishing turn only clears the flag if no newer turn has started.
#[derive(Debug, Default)]
struct TurnState {
    current: u64,
    thinking: bool,
}

fn finish_turn(state: &Mutex<TurnState>, turn: u64) -> bool {
    let mut st = lock(state);
    if st.current != turn {
        return false;
    }
    st.thinking = false;
    true
}

/// One game's worth of engine state: caches, the current level, the RNG and
/// the token of the turn in flight. At most one search runs per session.
pub struct GameSession {
    tables: Arc<Mutex<SearchTables>>,
    active: Option<AbortToken>,
    level: Difficulty,
    config: DifficultyTable,
    rng: SmallRng,
    turns: Arc<Mutex<TurnState>>,
    game_over: bool,
}

impl GameSession {
    pub fn new(level: Difficulty) -> Self {
        Self::build(level, DifficultyTable::default(), SmallRng::from_entropy())
    }

    pub fn with_seed(level: Difficulty, seed: u64) -> Self {
        Self::build(level, DifficultyTable::default(), SmallRng::seed_from_u64(seed))
    }

    fn build(level: Difficulty, config: DifficultyTable, rng: SmallRng) -> Self {
        Self {
            tables: Arc::new(Mutex::new(SearchTables::new())),
            active: None,
            level,
            config,
            rng,
            turns: Arc::new(Mutex::new(TurnState::default())),
            game_over: false,
        }
    }

    pub fn with_config(mut self, config: DifficultyTable) -> Self {
        self.config = config;
        self
    }

    /// Resize the transposition table. Existing entries are dropped if they
    /// no longer fit.
    pub fn with_tt_mb(self, mb: usize) -> Self {
        lock(&self.tables).tt.set_capacity_mb(mb);
        self
    }

    pub fn tt_capacity(&self) -> usize { lock(&self.tables).tt.capacity() }

    pub fn difficulty(&self) -> Difficulty { self.level }

    pub fn config(&self) -> &DifficultyTable { &self.config }

    pub fn profile(&self) -> SearchProfile { profile_for(self.level, self.config.level(self.level)) }

    /// Switching level mid-think cancels the running search; the host starts
    /// a new turn afterwards.
    pub fn set_difficulty(&mut self, level: Difficulty) {
        if level != self.level {
            info!("difficulty {} -> {}", self.level, level);
        }
        self.level = level;
        self.abort();
    }

    /// Forget everything learned in the previous game.
    pub fn new_game(&mut self) {
        self.abort();
        lock(&self.tables).clear();
        self.game_over = false;
    }

    /// Cancel the turn in flight, if any.
    pub fn abort(&mut self) {
        if let Some(t) = self.active.take() {
            t.abort();
        }
        lock(&self.turns).thinking = false;
    }

    /// Invalidate the previous turn's token and issue a fresh one.
    pub fn begin_turn(&mut self) -> AbortToken {
        self.start_turn().0
    }

    fn start_turn(&mut self) -> (AbortToken, u64) {
        if let Some(prev) = self.active.take() {
            prev.abort();
        }
        let token = AbortToken::new();
        self.active = Some(token.clone());
        let mut st = lock(&self.turns);
        st.current += 1;
        st.thinking = true;
        (token, st.current)
    }

    pub fn is_thinking(&self) -> bool { lock(&self.turns).thinking }

    pub fn is_game_over(&self) -> bool { self.game_over }

    pub fn set_game_over(&mut self, over: bool) { self.game_over = over; }

    pub fn status_text(&self) -> String {
        if self.is_thinking() {
            format!("AI Thinking ({})...", self.profile().label)
        } else if self.game_over {
            "Game Over".to_string()
        } else {
            "Your Turn (White)".to_string()
        }
    }

    /// Run one turn on the calling thread, yielding to the OS scheduler at
    /// every checkpoint.
    pub fn think(&mut self, pos: &mut Position) -> Result<TurnOutcome> {
        self.think_with(pos, Box::new(thread::yield_now))
    }

    /// Run one turn on the calling thread with a host-supplied yield hook.
    pub fn think_with(&mut self, pos: &mut Position, hook: YieldHook) -> Result<TurnOutcome> {
        let res = self.run_turn(pos, hook);
        if matches!(res, Err(EngineError::NoLegalMoves(_))) {
            self.game_over = true;
        }
        res
    }

    fn run_turn(&mut self, pos: &mut Position, hook: YieldHook) -> Result<TurnOutcome> {
        let (token, turn) = self.start_turn();
        let profile = self.profile();
        let control = SearchControl::new(token).with_hook(hook);
        let res = {
            let mut tables = lock(&self.tables);
            choose_move(pos, &profile, &mut tables, control, &mut self.rng)
        };
        if finish_turn(&self.turns, turn) {
            self.active = None;
        }
        res
    }

    /// Run one turn on a worker thread. The position is moved in; the
    /// caller keeps the handle's token to cancel. Tables stay locked by the
    /// worker until it finishes or observes its abort at a checkpoint.
    pub fn spawn_think(&mut self, pos: Position) -> Result<ThinkHandle> {
        let (token, turn) = self.start_turn();
        let profile = self.profile();
        let tables = Arc::clone(&self.tables);
        let turns = Arc::clone(&self.turns);
        let mut rng = SmallRng::seed_from_u64(self.rng.gen());
        let worker_token = token.clone();
        let handle = thread::Builder::new().name("panelbot-search".into()).spawn(move || {
            let mut pos = pos;
            let control = SearchControl::new(worker_token).with_hook(Box::new(thread::yield_now));
            let res = {
                let mut guard = lock(&tables);
                choose_move(&mut pos, &profile, &mut guard, control, &mut rng)
            };
            finish_turn(&turns, turn);
            res
        })?;
        Ok(ThinkHandle { token, turn, turns: Arc::clone(&self.turns), handle })
    }

    /// Pick a move on the host's grid. The grid is handed to the oracle as
    /// FEN; if the oracle cannot read it, or proposes a move the grid rules
    /// reject (castling, for one), an imperfect pick over the grid's own moves
    /// is used instead.
    pub fn think_grid(&mut self, grid: &Grid, side: Color) -> Result<TurnOutcome> {
        let grid_moves = grid.moves_for(side);
        if grid_moves.is_empty() {
            self.game_over = true;
            return Err(EngineError::NoLegalMoves(side));
        }
        let fen = grid.to_fen(side);
        let searched = match Position::from_fen(&fen) {
            Ok(mut pos) => self.run_turn(&mut pos, Box::new(thread::yield_now)),
            Err(e) => Err(e),
        };
        match searched {
            Ok(TurnOutcome::Aborted) => return Ok(TurnOutcome::Aborted),
            Ok(TurnOutcome::Move(c)) => {
                let from = (c.coord.from_row, c.coord.from_col);
                let to = (c.coord.to_row, c.coord.to_col);
                if grid.is_valid_move(side, from, to) {
                    return Ok(TurnOutcome::Move(c));
                }
                warn!("{} is not playable on the board, picking another move", c.coord);
            }
            Err(e) => warn!("engine unavailable for {fen}: {e}"),
        }
        let profile = self.profile();
        fallback_pick(&grid_moves, side, &profile, &mut self.rng)
            .map(TurnOutcome::Move)
            .ok_or(EngineError::NoLegalMoves(side))
    }
}

/// A turn running on a worker thread.
pub struct ThinkHandle {
    token: AbortToken,
    turn: u64,
    turns: Arc<Mutex<TurnState>>,
    handle: JoinHandle<Result<TurnOutcome>>,
}

impl ThinkHandle {
    pub fn token(&self) -> &AbortToken { &self.token }

    pub fn abort(&self) { self.token.abort(); }

    pub fn is_finished(&self) -> bool { self.handle.is_finished() }

    /// Wait for the worker. A turn aborted before it finished reports
    /// `Aborted` even if the worker had produced a move. The session stops
    /// reporting this turn as thinking, unless a newer turn has started.
    pub fn join(self) -> Result<TurnOutcome> {
        let joined = self.handle.join();
        finish_turn(&self.turns, self.turn);
        let res = joined.map_err(|_| EngineError::WorkerPanicked)?;
        if self.token.is_aborted() {
            return Ok(TurnOutcome::Aborted);
        }
        res
    }
}
