//! Core game state and logic
//!
//! The game is driven from outside: the caller forwards player actions to
//! `process_action` and elapsed time to `update`. Nothing here reads a clock.
//!
//! After a piece settles, matches resolve in passes. Each pass shows its
//! blast zone for a moment, removes it, lets the columns fall, waits, and
//! checks again. No piece is in play until the chain ends, so movement and
//! gravity cannot touch a grid that is still resolving.

use crate::board::{Cell, Grid, GRID_HEIGHT, GRID_WIDTH};
use crate::collapse;
use crate::color::BlockColor;
use crate::generator::PieceGenerator;
use crate::matcher::{find_blast_zone, BlastZone};
use crate::piece::{Piece, PIECE_LEN};
use crate::score::Score;
use crate::speed::{SpeedController, Timing};
use std::time::Duration;

/// Overall game status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameStatus {
    NotStarted,
    Running,
    Over,
}

/// Input actions the game can process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    MoveLeft,
    MoveRight,
    Rotate,
    /// Switch to the fast drop interval until `SoftDropStop`
    SoftDropStart,
    SoftDropStop,
    /// Move down a single row
    SoftDropStep,
    HardDrop,
    /// Start a new game (from the title or game over screen)
    Start,
    Pause,
    /// Leave the game screen; the driver handles it and the game ignores it
    Quit,
}

/// Things that happened during the last actions and updates
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameEvent {
    Started,
    PieceSettled { row: i32, col: i32 },
    BlastDetected { cells: usize, points: u64, chain: u32 },
    ChainFinished { passes: u32 },
    PieceSpawned { colors: [BlockColor; PIECE_LEN] },
    SpeedUp { interval: Duration },
    GameOver { score: u64 },
}

/// What happens between one piece settling and the next spawning
#[derive(Debug, Clone)]
enum Phase {
    /// A piece is under player control
    Falling,
    /// Blast zone highlighted, removed when the timer runs out
    Clearing { zone: BlastZone, remaining: Duration },
    /// Columns have fallen; matches are checked again when the timer runs out
    Settling { remaining: Duration },
}

/// A cell as the renderer should draw it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayCell {
    Empty,
    Block(BlockColor),
    Falling(BlockColor),
    Ghost(BlockColor),
    Clearing(BlockColor),
}

/// True if any spawn cell is already taken
pub fn spawn_collision(grid: &Grid) -> bool {
    (0..PIECE_LEN as i32).any(|row| grid.is_occupied(row, Piece::SPAWN_COL))
}

/// The main game struct
pub struct Game {
    /// The game grid
    pub grid: Grid,
    /// Current falling piece
    pub current_piece: Option<Piece>,
    /// Piece that spawns after the current one settles
    pub next_piece: Option<Piece>,
    generator: PieceGenerator,
    /// Score tracking
    pub score: Score,
    /// Current game status
    pub status: GameStatus,
    /// Gravity, speed-up and chain timers are frozen while paused
    pub paused: bool,
    phase: Phase,
    speed: SpeedController,
    /// Soft drop key held
    soft_drop: bool,
    /// Time since the last gravity step
    fall_timer: Duration,
    /// Passes in the chain being resolved
    chain: u32,
    /// Resolve passes with visible delays instead of all at once
    animate_clears: bool,
    /// Running time of this game
    pub elapsed: Duration,
    /// Last action text to display
    pub last_action: Option<String>,
    events: Vec<GameEvent>,
}

impl Game {
    /// Create a new game waiting for the start command
    pub fn new(timing: Timing) -> Self {
        Self::with_generator(timing, PieceGenerator::new())
    }

    /// Create a new game with a fixed piece sequence
    pub fn with_seed(timing: Timing, seed: u64) -> Self {
        Self::with_generator(timing, PieceGenerator::with_seed(seed))
    }

    fn with_generator(timing: Timing, generator: PieceGenerator) -> Self {
        Self {
            grid: Grid::new(),
            current_piece: None,
            next_piece: None,
            generator,
            score: Score::new(),
            status: GameStatus::NotStarted,
            paused: false,
            phase: Phase::Falling,
            speed: SpeedController::new(timing),
            soft_drop: false,
            fall_timer: Duration::ZERO,
            chain: 0,
            animate_clears: true,
            elapsed: Duration::ZERO,
            last_action: None,
            events: Vec::new(),
        }
    }

    /// Choose between phased (animated) and instant chain resolution
    pub fn set_clear_animation(&mut self, enabled: bool) {
        self.animate_clears = enabled;
    }

    /// Current gravity interval, taking soft drop into account
    pub fn drop_interval(&self) -> Duration {
        self.speed.drop_interval(self.soft_drop)
    }

    pub fn is_soft_dropping(&self) -> bool {
        self.soft_drop
    }

    /// True while a chain is being resolved
    pub fn is_resolving(&self) -> bool {
        !matches!(self.phase, Phase::Falling)
    }

    /// Drain the events produced since the last call
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Process an action
    pub fn process_action(&mut self, action: Action) {
        match self.status {
            GameStatus::NotStarted | GameStatus::Over => {
                if action == Action::Start {
                    self.start();
                }
            }
            GameStatus::Running if self.paused => {
                if action == Action::Pause {
                    self.paused = false;
                }
            }
            GameStatus::Running => match action {
                Action::MoveLeft => self.with_piece(|piece, grid| piece.move_left(grid)),
                Action::MoveRight => self.with_piece(|piece, grid| piece.move_right(grid)),
                Action::Rotate => self.with_piece(|piece, grid| piece.rotate(grid)),
                Action::SoftDropStart => self.soft_drop = true,
                Action::SoftDropStop => self.soft_drop = false,
                Action::SoftDropStep => self.soft_drop_step(),
                Action::HardDrop => self.hard_drop(),
                Action::Pause => {
                    self.paused = true;
                    self.soft_drop = false;
                }
                Action::Start | Action::Quit => {}
            },
        }
    }

    /// Advance the game by `dt` of wall-clock time
    pub fn update(&mut self, dt: Duration) {
        if self.status != GameStatus::Running || self.paused {
            return;
        }

        self.elapsed += dt;
        if self.speed.advance(dt) {
            self.events.push(GameEvent::SpeedUp {
                interval: self.speed.interval(),
            });
        }

        let mut budget = dt;
        while self.status == GameStatus::Running {
            match &mut self.phase {
                Phase::Falling => {
                    self.apply_gravity(budget);
                    return;
                }
                Phase::Clearing { remaining, .. } | Phase::Settling { remaining } => {
                    if budget < *remaining {
                        *remaining -= budget;
                        return;
                    }
                    budget -= *remaining;
                }
            }
            self.finish_phase();
        }
    }

    /// Reset everything and put the first piece in play
    fn start(&mut self) {
        self.grid = Grid::new();
        self.score = Score::new();
        self.status = GameStatus::Running;
        self.paused = false;
        self.phase = Phase::Falling;
        self.speed.reset();
        self.soft_drop = false;
        self.fall_timer = Duration::ZERO;
        self.chain = 0;
        self.elapsed = Duration::ZERO;
        self.last_action = None;
        self.current_piece = Some(self.generator.generate());
        self.next_piece = Some(self.generator.generate());
        self.events.push(GameEvent::Started);
    }

    /// Called on spawn collision, the only way a game ends
    fn end(&mut self) {
        self.status = GameStatus::Over;
        self.current_piece = None;
        self.soft_drop = false;
        self.events.push(GameEvent::GameOver {
            score: self.score.points,
        });
    }

    /// Apply a movement to the current piece, if there is one
    fn with_piece(&mut self, movement: impl FnOnce(&mut Piece, &Grid) -> bool) {
        if let Some(piece) = &mut self.current_piece {
            movement(piece, &self.grid);
        }
    }

    fn soft_drop_step(&mut self) {
        if let Some(piece) = &mut self.current_piece {
            if piece.move_down(&self.grid) {
                self.fall_timer = Duration::ZERO;
            }
        }
    }

    fn hard_drop(&mut self) {
        if let Some(piece) = &mut self.current_piece {
            piece.hard_drop(&self.grid);
            self.settle();
        }
    }

    fn apply_gravity(&mut self, dt: Duration) {
        self.fall_timer += dt;
        loop {
            let interval = self.drop_interval();
            if interval.is_zero() || self.fall_timer < interval {
                return;
            }
            self.fall_timer -= interval;
            let Some(piece) = &mut self.current_piece else {
                return;
            };
            if !piece.move_down(&self.grid) {
                self.settle();
                return;
            }
        }
    }

    /// Write the current piece into the grid and start resolving matches
    fn settle(&mut self) {
        let Some(piece) = self.current_piece.take() else {
            return;
        };
        self.grid.place(&piece);
        self.score.add_piece();
        self.events.push(GameEvent::PieceSettled {
            row: piece.row,
            col: piece.col,
        });
        self.chain = 0;
        self.resolve();
    }

    /// Look for the next pass of the chain
    fn resolve(&mut self) {
        if !self.animate_clears {
            let chain = collapse::resolve_chain(std::mem::take(&mut self.grid));
            for &cells in &chain.passes {
                self.record_pass(cells);
            }
            self.grid = chain.grid;
            self.finish_chain();
            return;
        }

        let zone = find_blast_zone(&self.grid);
        if zone.is_empty() {
            self.finish_chain();
            return;
        }
        self.record_pass(zone.len());
        self.phase = Phase::Clearing {
            zone,
            remaining: self.speed.timing().clear_flash,
        };
    }

    fn record_pass(&mut self, cells: usize) {
        self.chain += 1;
        let points = self.score.add_pass(cells);
        self.events.push(GameEvent::BlastDetected {
            cells,
            points,
            chain: self.chain,
        });
    }

    /// Move on once a timed phase has run out
    fn finish_phase(&mut self) {
        match std::mem::replace(&mut self.phase, Phase::Falling) {
            Phase::Clearing { zone, .. } => {
                collapse::apply_pass(&mut self.grid, &zone);
                self.phase = Phase::Settling {
                    remaining: self.speed.timing().chain_delay,
                };
            }
            Phase::Settling { .. } => self.resolve(),
            Phase::Falling => {}
        }
    }

    fn finish_chain(&mut self) {
        if self.chain > 0 {
            self.events.push(GameEvent::ChainFinished { passes: self.chain });
            self.last_action = self.score.finish_chain(self.chain);
        } else {
            self.last_action = None;
        }
        self.chain = 0;
        self.spawn_next();
    }

    /// Promote the next piece, or end the game if its cells are taken
    fn spawn_next(&mut self) {
        let Some(piece) = self.next_piece.take() else {
            return;
        };
        self.next_piece = Some(self.generator.generate());
        self.fall_timer = Duration::ZERO;

        if spawn_collision(&self.grid) {
            self.end();
            return;
        }
        self.current_piece = Some(piece);
        self.events.push(GameEvent::PieceSpawned {
            colors: piece.colors,
        });
    }

    /// The grid as it should be drawn: settled blocks, the clearing
    /// highlight, the optional ghost and the falling piece on top
    pub fn display_cells(&self, show_ghost: bool) -> [[DisplayCell; GRID_WIDTH]; GRID_HEIGHT] {
        let mut cells = [[DisplayCell::Empty; GRID_WIDTH]; GRID_HEIGHT];

        for (row, grid_row) in self.grid.rows().enumerate() {
            for (col, cell) in grid_row.iter().enumerate() {
                if let Cell::Filled(color) = cell {
                    cells[row][col] = DisplayCell::Block(*color);
                }
            }
        }

        if let Phase::Clearing { zone, .. } = &self.phase {
            for (row, col) in zone.iter() {
                if let DisplayCell::Block(color) = cells[row][col] {
                    cells[row][col] = DisplayCell::Clearing(color);
                }
            }
        }

        let Some(piece) = &self.current_piece else {
            return cells;
        };

        let in_bounds = |row: i32, col: i32| {
            (0..GRID_HEIGHT as i32).contains(&row) && (0..GRID_WIDTH as i32).contains(&col)
        };

        if show_ghost {
            let ghost = Piece {
                row: piece.landing_row(&self.grid),
                ..*piece
            };
            for (row, col, color) in ghost.cells() {
                if in_bounds(row, col) && cells[row as usize][col as usize] == DisplayCell::Empty {
                    cells[row as usize][col as usize] = DisplayCell::Ghost(color);
                }
            }
        }

        for (row, col, color) in piece.cells() {
            if in_bounds(row, col) {
                cells[row as usize][col as usize] = DisplayCell::Falling(color);
            }
        }

        cells
    }
}
