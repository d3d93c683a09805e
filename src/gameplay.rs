use clipboard_rs::{Clipboard, ClipboardContext};
use macroquad::prelude::{info, warn};
use tube_sort::palette::FLUID_COLORS;
use tube_sort::{NotSolvable, PourPair, PuzzleState, Solver, TubeId, parse_puzzle};

use crate::controls::{Button, ControlAction, HitItem};
use crate::renderer::{Highlights, Renderer};

/// A puzzle as loaded, with the solution found for its starting layout.
pub struct LoadedPuzzle {
    pub name: String,
    pub initial: PuzzleState,
    pub solution: Result<Vec<PourPair>, NotSolvable>,
}

pub struct GameEngine {
    puzzles: Vec<LoadedPuzzle>,
    current: usize,
    state: PuzzleState,
    plan: Vec<PourPair>,
    plan_step: usize,
    buttons: Vec<Button>,
    renderer: Renderer,
    selected: Option<TubeId>,
    node_budget: Option<usize>,
    message: String,
}

impl GameEngine {
    /// `puzzles` must not be empty.
    pub fn new(puzzles: Vec<LoadedPuzzle>, node_budget: Option<usize>) -> Option<Self> {
        let first = puzzles.first()?;
        let state = first.initial.clone();
        let button_color = |index: usize| FLUID_COLORS[index].1;
        let buttons = vec![
            Button::new("Back", ControlAction::StepBack, button_color(1)),
            Button::new("Step", ControlAction::StepForward, button_color(3)),
            Button::new("Solve", ControlAction::Solve, button_color(4)),
            Button::new("Undo", ControlAction::Undo, button_color(7)),
            Button::new("Reset", ControlAction::Reset, button_color(0)),
            Button::new("Copy", ControlAction::CopyState, button_color(5)),
            Button::new("Paste", ControlAction::PasteState, button_color(11)),
            Button::new("Next", ControlAction::NextPuzzle, button_color(16)),
        ];
        let mut engine = Self {
            puzzles,
            current: 0,
            state,
            plan: Vec::new(),
            plan_step: 0,
            buttons,
            renderer: Renderer::new(),
            selected: None,
            node_budget,
            message: String::new(),
        };
        engine.load_puzzle(0);
        Some(engine)
    }

    pub fn render(&mut self) {
        self.renderer.autoset_viewport();
        let highlights = Highlights {
            selected: self.selected,
            next_move: self.plan.get(self.plan_step).copied(),
        };
        let status = self.status_lines();
        self.renderer
            .render_game(self.state.tubes(), &self.buttons, highlights, &status);
    }

    fn status_lines(&self) -> Vec<String> {
        let puzzle = &self.puzzles[self.current];
        let breakdown: Vec<String> = self
            .state
            .segment_breakdown()
            .iter()
            .map(|(color, score)| format!("{color} {score}"))
            .collect();
        let plan = match &puzzle.solution {
            Err(failure) if self.plan.is_empty() => failure.to_string(),
            _ => format!("solution step {}/{}", self.plan_step, self.plan.len()),
        };
        vec![
            format!(
                "{} ({}/{})  moves {}  {}{}",
                puzzle.name,
                self.current + 1,
                self.puzzles.len(),
                self.state.moves().len(),
                plan,
                if self.state.is_solved() { "  SOLVED" } else { "" }
            ),
            format!("score {}: {}", self.state.segment_score(), breakdown.join(", ")),
            self.message.clone(),
        ]
    }

    pub fn handle_click(&mut self, x: f32, y: f32) {
        if let Some(hit) = self.renderer.get_hit_test_registry().hit_test(x, y) {
            let item = hit.item;
            self.handle_hit_item(item);
        }
    }

    fn handle_hit_item(&mut self, item: HitItem) {
        let action = match item {
            HitItem::Button { action } => action,
            HitItem::Tube { id } => match self.selected {
                Some(from) if from == id => ControlAction::Deselect,
                Some(from) => ControlAction::Pour(from, id),
                None => ControlAction::SelectTube(id),
            },
        };
        self.handle_game_action(action);
    }

    pub fn handle_game_action(&mut self, action: ControlAction) {
        match action {
            ControlAction::SelectTube(id) => {
                self.selected = Some(id);
            }
            ControlAction::Deselect => {
                self.selected = None;
            }
            ControlAction::Pour(from, to) => match self.state.push_move(from, to) {
                Ok(record) => {
                    self.message = format!(
                        "poured {} {} from {} into {}",
                        record.count, record.color, from, to
                    );
                    self.selected = None;
                    self.drop_plan();
                }
                Err(err) => {
                    self.message = err.to_string();
                    self.selected = Some(to);
                }
            },
            ControlAction::Undo => {
                if self.state.pop_move().is_some() {
                    self.drop_plan();
                }
                self.selected = None;
            }
            ControlAction::Solve => self.solve_from_here(),
            ControlAction::StepForward => {
                if let Some(&(from, to)) = self.plan.get(self.plan_step) {
                    match self.state.push_move(from, to) {
                        Ok(_) => self.plan_step += 1,
                        Err(err) => self.message = err.to_string(),
                    }
                }
            }
            ControlAction::StepBack => {
                if self.plan_step > 0 && self.state.pop_move().is_some() {
                    self.plan_step -= 1;
                }
            }
            ControlAction::Reset => self.load_puzzle(self.current),
            ControlAction::CopyState => {
                let repr = self.state.get_text_representation();
                self.set_clipboard(&repr);
            }
            ControlAction::PasteState => self.paste_puzzle(),
            ControlAction::NextPuzzle => {
                let next = (self.current + 1) % self.puzzles.len();
                self.load_puzzle(next);
            }
        }
    }

    fn load_puzzle(&mut self, index: usize) {
        self.current = index;
        let puzzle = &self.puzzles[index];
        self.state = puzzle.initial.clone();
        self.plan = puzzle.solution.clone().unwrap_or_default();
        self.plan_step = 0;
        self.selected = None;
        self.message = String::new();
    }

    fn drop_plan(&mut self) {
        self.plan.clear();
        self.plan_step = 0;
    }

    fn solver_for(&self, state: &PuzzleState) -> Solver {
        let solver = Solver::new(state.clone());
        match self.node_budget {
            Some(budget) => solver.with_node_budget(budget),
            None => solver,
        }
    }

    fn solve_from_here(&mut self) {
        let mut solver = self.solver_for(&self.state);
        match solver.run() {
            Ok(moves) => {
                self.message = format!(
                    "found {} moves after exploring {} states",
                    moves.len(),
                    solver.stats().explored
                );
                // Steps replay on top of the current history.
                self.plan = moves;
                self.plan_step = 0;
            }
            Err(failure) => {
                self.message = failure.to_string();
                self.drop_plan();
            }
        }
    }

    fn paste_puzzle(&mut self) {
        let text = self.get_clipboard();
        match parse_puzzle(&text) {
            Ok(initial) => self.add_puzzle("pasted", initial),
            Err(err) => {
                warn!("Clipboard does not hold a puzzle: {}", err);
                self.message = err.to_string();
            }
        }
    }

    /// Solves `initial` within the node budget and switches to it.
    fn add_puzzle(&mut self, name: &str, initial: PuzzleState) {
        let solution = self.solver_for(&initial).run();
        self.puzzles.push(LoadedPuzzle {
            name: name.to_string(),
            initial,
            solution,
        });
        self.load_puzzle(self.puzzles.len() - 1);
    }

    fn get_clipboard(&self) -> String {
        match ClipboardContext::new() {
            Ok(ctx) => ctx.get_text().unwrap_or_default(),
            Err(err) => {
                warn!("Clipboard unavailable: {}", err);
                String::new()
            }
        }
    }

    fn set_clipboard(&mut self, content: &str) {
        let copied = ClipboardContext::new().and_then(|ctx| ctx.set_text(content.to_string()));
        match copied {
            Ok(()) => {
                info!("Copied puzzle to clipboard.");
                self.message = "copied puzzle text".to_string();
            }
            Err(err) => {
                warn!("Clipboard unavailable: {}", err);
                self.message = err.to_string();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tube_sort::NotSolvableReason;

    // Tops swapped: solved by (1,3), (2,1), (2,3).
    fn swap() -> PuzzleState {
        PuzzleState::new([
            [Some("blue"), Some("red"), Some("red"), Some("red")],
            [Some("red"), Some("blue"), Some("blue"), Some("blue")],
            [None, None, None, None],
        ])
        .unwrap()
    }

    fn engine(node_budget: Option<usize>) -> GameEngine {
        let initial = swap();
        let solution = Solver::solve(&initial);
        let loaded = LoadedPuzzle {
            name: "swap".to_string(),
            initial,
            solution,
        };
        GameEngine::new(vec![loaded], node_budget).unwrap()
    }

    #[test]
    fn starts_on_the_loaded_solution() {
        let engine = engine(None);
        assert_eq!(engine.plan, vec![(1, 3), (2, 1), (2, 3)]);
        assert_eq!(engine.plan_step, 0);
        assert_eq!(engine.state, swap());
        assert!(GameEngine::new(Vec::new(), None).is_none());
    }

    #[test]
    fn steps_stop_at_the_end_of_the_plan() {
        let mut engine = engine(None);
        for _ in 0..5 {
            engine.handle_game_action(ControlAction::StepForward);
        }
        assert_eq!(engine.plan_step, 3);
        assert_eq!(engine.state.moves().len(), 3);
        assert!(engine.state.is_solved());
    }

    #[test]
    fn back_walks_the_plan_and_stops_at_the_start() {
        let mut engine = engine(None);
        engine.handle_game_action(ControlAction::StepBack);
        assert_eq!(engine.plan_step, 0);
        assert_eq!(engine.state, swap());

        engine.handle_game_action(ControlAction::StepForward);
        engine.handle_game_action(ControlAction::StepForward);
        engine.handle_game_action(ControlAction::StepBack);
        assert_eq!(engine.plan_step, 1);
        assert_eq!(engine.state.moves().len(), 1);
        assert_eq!(engine.state.moves()[0].pair(), (1, 3));

        engine.handle_game_action(ControlAction::StepBack);
        engine.handle_game_action(ControlAction::StepBack);
        assert_eq!(engine.plan_step, 0);
        assert_eq!(engine.state, swap());
        assert!(engine.state.moves().is_empty());
    }

    #[test]
    fn manual_pour_and_undo_drop_the_plan() {
        let mut engine = engine(None);
        engine.handle_game_action(ControlAction::Undo);
        assert_eq!(engine.plan.len(), 3, "nothing to undo keeps the plan");

        engine.handle_game_action(ControlAction::SelectTube(2));
        engine.handle_game_action(ControlAction::Pour(2, 3));
        assert!(engine.plan.is_empty());
        assert_eq!(engine.selected, None);
        assert_eq!(engine.state.moves().len(), 1);

        engine.handle_game_action(ControlAction::StepForward);
        engine.handle_game_action(ControlAction::Undo);
        assert_eq!(engine.state, swap());
        assert!(engine.plan.is_empty());
        assert_eq!(engine.plan_step, 0);
    }

    #[test]
    fn refused_pour_keeps_state_and_plan() {
        let mut engine = engine(None);
        engine.handle_game_action(ControlAction::Pour(1, 2));
        assert_eq!(engine.state, swap());
        assert_eq!(engine.plan.len(), 3);
        assert_eq!(engine.selected, Some(2));
        assert!(!engine.message.is_empty());
    }

    #[test]
    fn reset_restores_the_loaded_solution() {
        let mut engine = engine(None);
        engine.handle_game_action(ControlAction::Pour(1, 3));
        engine.handle_game_action(ControlAction::Reset);
        assert_eq!(engine.state, swap());
        assert!(engine.state.moves().is_empty());
        assert_eq!(engine.plan, vec![(1, 3), (2, 1), (2, 3)]);
        assert_eq!(engine.plan_step, 0);
    }

    #[test]
    fn solve_from_here_replays_to_a_solved_state() {
        let mut engine = engine(None);
        engine.handle_game_action(ControlAction::Pour(2, 3));
        assert!(engine.plan.is_empty());

        engine.handle_game_action(ControlAction::Solve);
        assert!(!engine.plan.is_empty());
        assert_eq!(engine.plan_step, 0);
        let steps = engine.plan.len();
        for _ in 0..steps {
            engine.handle_game_action(ControlAction::StepForward);
        }
        assert!(engine.state.is_solved());
        assert_eq!(engine.state.moves().len(), steps + 1);
    }

    #[test]
    fn solve_respects_the_node_budget() {
        let mut engine = engine(Some(1));
        engine.handle_game_action(ControlAction::Solve);
        assert!(engine.plan.is_empty());
        assert!(engine.message.contains("budget of 1"));
    }

    #[test]
    fn added_puzzles_are_solved_within_the_node_budget() {
        let mut engine = engine(Some(1));
        engine.add_puzzle("pasted", swap());
        assert_eq!(engine.current, 1);
        assert_eq!(engine.puzzles.len(), 2);
        let failure = engine.puzzles[1].solution.as_ref().unwrap_err();
        assert_eq!(failure.reason, NotSolvableReason::BudgetExhausted(1));
        assert!(engine.plan.is_empty());

        engine.handle_game_action(ControlAction::NextPuzzle);
        assert_eq!(engine.current, 0);
        assert_eq!(engine.plan.len(), 3);
    }
}
