use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt;
use rand::Rng;
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::*;

/// Valid transitions:
/// - Initialized -> Playing
/// - Playing -> Completed
/// - Playing -> Dead
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameState {
    /// Board allocated, no mines placed yet
    #[default]
    Initialized,
    /// First tile opened, clock running
    Playing,
    /// Every safe tile opened
    Completed,
    /// A mine was opened
    Dead,
}

impl GameState {
    pub const fn is_started(self) -> bool {
        !matches!(self, Self::Initialized)
    }

    pub const fn is_ended(self) -> bool {
        matches!(self, Self::Completed | Self::Dead)
    }
}

/// Notifications sent to the session listener.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum GameEvent {
    Started,
    Ended { won: bool },
}

type Listener = Box<dyn FnMut(GameEvent)>;

/// One game from the first click to the end, including the timers it owns.
///
/// Dropping the session drops every timer handle, so nothing scheduled by it
/// can fire afterwards.
pub struct GameSession<S: Scheduler, R = SmallRng> {
    board: Board,
    state: GameState,
    elapsed_secs: u32,
    frozen: bool,
    scheduler: S,
    random: R,
    ticker: Option<S::Handle>,
    reveal_timers: Vec<(Coord2, S::Handle)>,
    listener: Option<Listener>,
}

impl<S: Scheduler, R: Rng> GameSession<S, R> {
    pub fn new(config: GameConfig, scheduler: S, random: R) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            board: Board::new(config),
            state: GameState::Initialized,
            elapsed_secs: 0,
            frozen: false,
            scheduler,
            random,
            ticker: None,
            reveal_timers: Vec::new(),
            listener: None,
        })
    }

    pub fn set_listener(&mut self, listener: impl FnMut(GameEvent) + 'static) {
        self.listener = Some(Box::new(listener));
    }

    pub fn config(&self) -> GameConfig {
        self.board.config()
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    /// All tiles in `x + y * width` order.
    pub fn tiles(&self) -> &[Tile] {
        self.board.tiles()
    }

    pub fn tile_at(&self, coords: Coord2) -> Option<&Tile> {
        self.board.get(coords)
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn is_started(&self) -> bool {
        self.state.is_started()
    }

    pub fn is_ended(&self) -> bool {
        self.state.is_ended()
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// While frozen every player command is ignored, timers keep running.
    pub fn set_frozen(&mut self, frozen: bool) {
        self.frozen = frozen;
    }

    pub fn elapsed_secs(&self) -> u32 {
        self.elapsed_secs
    }

    pub fn remaining_safe_count(&self) -> CellCount {
        self.board.remaining_safe_count()
    }

    /// How many mines have not been flagged yet, negative when over-flagged.
    pub fn mines_left(&self) -> i32 {
        i32::from(self.board.config().mines) - i32::from(self.board.flagged_count())
    }

    /// End-of-game reveals that are scheduled but have not fired yet.
    pub fn pending_reveals(&self) -> usize {
        self.reveal_timers.len()
    }

    pub fn open(&mut self, coords: Coord2) -> Result<RevealOutcome> {
        let coords = self.config().validate_coords(coords)?;

        if self.frozen || self.state.is_ended() || self.board[coords].opened {
            return Ok(RevealOutcome::NoChange);
        }

        if self.state == GameState::Initialized {
            self.start(coords)?;
        }

        let opened = self.board.flood_open(coords);
        log::debug!("Open tile at {:?}, opened {} tiles", coords, opened);

        Ok(if self.board[coords].has_mine {
            self.die();
            RevealOutcome::HitMine
        } else if self.board.remaining_safe_count() == 0 {
            self.complete();
            RevealOutcome::Won
        } else {
            RevealOutcome::Revealed
        })
    }

    /// Sets the flag to `value`, or inverts it when `value` is `None`.
    pub fn toggle_flag(&mut self, coords: Coord2, value: Option<bool>) -> Result<MarkOutcome> {
        let coords = self.config().validate_coords(coords)?;

        let tile = &mut self.board[coords];
        if self.frozen || self.state.is_ended() || tile.opened {
            return Ok(MarkOutcome::NoChange);
        }

        let flagged = value.unwrap_or(!tile.flagged);
        if flagged == tile.flagged {
            return Ok(MarkOutcome::NoChange);
        }
        tile.flagged = flagged;
        log::debug!("Flag tile at {:?}: {}", coords, flagged);
        Ok(MarkOutcome::Changed)
    }

    /// Moves every mine that sits under an unopened tile, keeping opened tiles
    /// as they are. Clears all flags.
    pub fn reshuffle(&mut self) -> Result<MarkOutcome> {
        if self.frozen || self.state != GameState::Playing {
            return Ok(MarkOutcome::NoChange);
        }

        self.board.place_mines(&mut self.random, None)?;
        self.board.clear_flags();
        log::debug!(
            "Reshuffled mines, {} safe tiles left",
            self.board.remaining_safe_count()
        );
        Ok(MarkOutcome::Changed)
    }

    /// Replaces the board with a fresh one, cancelling every timer of the old game.
    pub fn reconfigure(&mut self, config: GameConfig) -> Result<()> {
        config.validate()?;
        self.cancel_timers();
        self.board = Board::new(config);
        self.state = GameState::Initialized;
        self.elapsed_secs = 0;
        log::debug!("New board {:?} with {} mines", config.size, config.mines);
        Ok(())
    }

    /// Stops the ticker and drops every pending reveal, safe to call repeatedly.
    pub fn cancel_timers(&mut self) {
        self.stop_ticker();
        if !self.reveal_timers.is_empty() {
            log::trace!("Cancelling {} pending reveals", self.reveal_timers.len());
            self.reveal_timers.clear();
        }
    }

    /// Entry point for events coming back from the [`Scheduler`].
    pub fn handle_timer(&mut self, event: TimerEvent) {
        match event {
            TimerEvent::Tick => {
                if self.state == GameState::Playing {
                    self.elapsed_secs = self.elapsed_secs.saturating_add(1);
                }
            }
            TimerEvent::Reveal(coords) => {
                let Some(index) = self.reveal_timers.iter().position(|&(pos, _)| pos == coords)
                else {
                    log::trace!("Ignoring stale reveal at {:?}", coords);
                    return;
                };
                self.reveal_timers.swap_remove(index);
                self.board[coords].opened = true;
            }
        }
    }

    fn start(&mut self, first: Coord2) -> Result<()> {
        self.board.place_mines(&mut self.random, Some(first))?;
        self.state = GameState::Playing;
        self.elapsed_secs = 0;
        self.ticker = Some(self.scheduler.repeat(TICK_PERIOD_MS, TimerEvent::Tick));
        log::debug!("Game started at {:?}", first);
        self.notify(GameEvent::Started);
        Ok(())
    }

    fn die(&mut self) {
        self.state = GameState::Dead;
        self.stop_ticker();

        let mut to_reveal = self
            .board
            .coords_where(|tile| tile.has_mine || tile.flagged);
        to_reveal.shuffle(&mut self.random);

        let mut delay_ms = 0u32;
        for coords in to_reveal {
            delay_ms = delay_ms.saturating_add(REVEAL_STEP_MS);
            let handle = self.scheduler.once(delay_ms, TimerEvent::Reveal(coords));
            self.reveal_timers.push((coords, handle));
        }
        log::debug!(
            "Game lost after {}s, revealing {} tiles",
            self.elapsed_secs,
            self.reveal_timers.len()
        );
        self.notify(GameEvent::Ended { won: false });
    }

    fn complete(&mut self) {
        self.state = GameState::Completed;
        self.stop_ticker();
        self.board.flag_unopened();
        log::debug!("Game won after {}s", self.elapsed_secs);
        self.notify(GameEvent::Ended { won: true });
    }

    fn stop_ticker(&mut self) {
        if self.ticker.take().is_some() {
            log::trace!("Ticker stopped at {}s", self.elapsed_secs);
        }
    }

    fn notify(&mut self, event: GameEvent) {
        if let Some(listener) = self.listener.as_mut() {
            listener(event);
        }
    }
}

impl<S: Scheduler, R> fmt::Debug for GameSession<S, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GameSession")
            .field("board", &self.board)
            .field("state", &self.state)
            .field("elapsed_secs", &self.elapsed_secs)
            .field("frozen", &self.frozen)
            .field("ticking", &self.ticker.is_some())
            .field("pending_reveals", &self.reveal_timers.len())
            .finish_non_exhaustive()
    }
}
