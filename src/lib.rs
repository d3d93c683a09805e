//! Liquid-sorting tube puzzles: the puzzle model, a breadth-first solver, puzzle files and a
//! generator of solvable puzzles.

pub mod generator;
pub mod model;
pub mod palette;
pub mod puzzle_file;
pub mod solver;
pub mod state;

pub use generator::{GeneratorConfig, GeneratorError, generate};
pub use model::{Color, PourError, Slot, Tube, TubeId};
pub use puzzle_file::{PuzzleFileError, load_puzzle, parse_puzzle};
pub use solver::{NotSolvable, NotSolvableReason, PourPair, SearchStats, Solver, solve_all};
pub use state::{LegalMoves, Move, NoLegalMoves, PuzzleError, PuzzleState};
