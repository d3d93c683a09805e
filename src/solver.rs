use std::collections::{HashSet, VecDeque};
use std::fmt;

use macroquad::prelude::{debug, info, warn};
use rayon::prelude::*;

use crate::model::TubeId;
use crate::state::PuzzleState;

/// A (source, destination) pour as replayed through [`PuzzleState::push_move`].
pub type PourPair = (TubeId, TubeId);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NotSolvableReason {
    /// Every reachable state was explored.
    Exhausted,
    /// The node budget ran out first.
    BudgetExhausted(usize),
    /// Some color cannot fill whole tubes, so no solved layout exists.
    Infeasible,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NotSolvable {
    pub reason: NotSolvableReason,
    pub explored: usize,
}

impl fmt::Display for NotSolvable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.reason {
            NotSolvableReason::Exhausted => {
                write!(f, "no solution after exploring {} states", self.explored)
            }
            NotSolvableReason::BudgetExhausted(budget) => {
                write!(f, "no solution within a budget of {budget} states")
            }
            NotSolvableReason::Infeasible => {
                f.write_str("color counts cannot be sorted into whole tubes")
            }
        }
    }
}

impl std::error::Error for NotSolvable {}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SearchStats {
    pub explored: usize,
    pub enqueued: usize,
    pub max_queue: usize,
    pub depth: usize,
}

#[derive(Clone)]
struct GameStateWithHistory {
    state: PuzzleState,
    history: Vec<PourPair>,
}

impl GameStateWithHistory {
    fn successor(&self, pair: PourPair) -> Option<GameStateWithHistory> {
        let mut state = self.state.clone();
        state.push_move(pair.0, pair.1).ok()?;
        let mut history = self.history.clone();
        history.push(pair);
        Some(GameStateWithHistory { state, history })
    }
}

/// Breadth-first search from a starting puzzle to the first solved state found.
pub struct Solver {
    starting_state: PuzzleState,
    considering_states: VecDeque<GameStateWithHistory>,
    visited_states: HashSet<u64>,
    node_budget: Option<usize>,
    stats: SearchStats,
}

impl Solver {
    pub fn new(starting_state: PuzzleState) -> Solver {
        Solver {
            starting_state,
            considering_states: VecDeque::new(),
            visited_states: HashSet::new(),
            node_budget: None,
            stats: SearchStats::default(),
        }
    }

    /// Gives up after dequeuing `budget` states.
    pub fn with_node_budget(mut self, budget: usize) -> Solver {
        self.node_budget = Some(budget);
        self
    }

    pub fn stats(&self) -> &SearchStats {
        &self.stats
    }

    /// Searches from `initial` with no node budget.
    pub fn solve(initial: &PuzzleState) -> Result<Vec<PourPair>, NotSolvable> {
        Solver::new(initial.clone()).run()
    }

    pub fn run(&mut self) -> Result<Vec<PourPair>, NotSolvable> {
        self.considering_states.clear();
        self.visited_states.clear();
        self.stats = SearchStats::default();

        if !self.starting_state.is_arrangeable() {
            warn!("Color counts do not fill whole tubes, skipping search.");
            return Err(self.fail(NotSolvableReason::Infeasible));
        }

        self.consider_state(GameStateWithHistory {
            state: self.starting_state.clone(),
            history: Vec::new(),
        });

        while let Some(mut node) = self.considering_states.pop_front() {
            if !self.visited_states.insert(node.state.content_hash()) {
                continue;
            }
            if let Some(budget) = self.node_budget
                && self.stats.explored >= budget
            {
                info!("Node budget of {} exhausted.", budget);
                return Err(self.fail(NotSolvableReason::BudgetExhausted(budget)));
            }
            self.stats.explored += 1;
            self.stats.depth = self.stats.depth.max(node.history.len());

            if node.state.is_solved() {
                return Ok(self.finish(node));
            }

            let pairs: Vec<PourPair> = match node.state.forecast() {
                Ok(legal_moves) => legal_moves.keys().copied().collect(),
                Err(_) => {
                    debug!("Dead end at depth {}.", node.history.len());
                    continue;
                }
            };

            for pair in pairs {
                let Some(next) = node.successor(pair) else {
                    continue;
                };
                if next.state.is_solved() {
                    return Ok(self.finish(next));
                }
                if !self.visited_states.contains(&next.state.content_hash()) {
                    self.consider_state(next);
                }
            }
            debug!(
                "Explored {} states, {} waiting.",
                self.stats.explored,
                self.considering_states.len()
            );
        }
        Err(self.fail(NotSolvableReason::Exhausted))
    }

    fn consider_state(&mut self, state_with_history: GameStateWithHistory) {
        self.considering_states.push_back(state_with_history);
        self.stats.enqueued += 1;
        self.stats.max_queue = self.stats.max_queue.max(self.considering_states.len());
    }

    fn finish(&mut self, node: GameStateWithHistory) -> Vec<PourPair> {
        self.stats.depth = self.stats.depth.max(node.history.len());
        info!(
            "Solved in {} moves after exploring {} states (peak queue {}).",
            node.history.len(),
            self.stats.explored,
            self.stats.max_queue
        );
        info!("Moves: {:?}", node.history);
        debug!("Solved state:\n{}", node.state);
        self.considering_states.clear();
        node.history
    }

    fn fail(&mut self, reason: NotSolvableReason) -> NotSolvable {
        let failure = NotSolvable {
            reason,
            explored: self.stats.explored,
        };
        info!("Not solvable: {}", failure);
        self.considering_states.clear();
        failure
    }
}

/// Solves independent puzzles in parallel. Each search runs on one thread.
pub fn solve_all(puzzles: &[PuzzleState], node_budget: Option<usize>) -> Vec<Result<Vec<PourPair>, NotSolvable>> {
    puzzles
        .par_iter()
        .map(|puzzle| {
            let mut solver = Solver::new(puzzle.clone());
            if let Some(budget) = node_budget {
                solver = solver.with_node_budget(budget);
            }
            solver.run()
        })
        .collect()
}

impl PuzzleState {
    /// Whether the units of every color could fill whole tubes. Without that no solved
    /// layout exists, whatever the moves.
    pub fn is_arrangeable(&self) -> bool {
        let capacity = self.slot_count();
        self.color_counts()
            .values()
            .all(|&count| count % capacity == 0)
    }
}
