use std::fmt;

use macroquad::prelude::debug;
use rand::Rng;
use rand::seq::IndexedRandom;

use crate::palette::{FLUID_COLORS, color_names};
use crate::state::PuzzleState;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GeneratorConfig {
    pub colors: usize,
    pub capacity: usize,
    pub empty_tubes: usize,
    pub scramble_moves: usize,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            colors: 4,
            capacity: 4,
            empty_tubes: 2,
            scramble_moves: 40,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GeneratorError {
    NoColors,
    TooManyColors { requested: usize, available: usize },
    ZeroCapacity,
}

impl fmt::Display for GeneratorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeneratorError::NoColors => f.write_str("at least one color is needed"),
            GeneratorError::TooManyColors { requested, available } => {
                write!(f, "{requested} colors requested, the palette has {available}")
            }
            GeneratorError::ZeroCapacity => f.write_str("tubes need at least one slot"),
        }
    }
}

impl std::error::Error for GeneratorError {}

/// Every state one reverse pour away from `state`, such that pouring forward leads back.
fn reverse_pours(state: &PuzzleState) -> Vec<PuzzleState> {
    let ids: Vec<_> = state.tube_ids().collect();
    let mut found = Vec::new();
    for &from in &ids {
        let depth = state.tube(from).map_or(0, |tube| tube.get_top_fluid_depth());
        for &onto in &ids {
            if from == onto {
                continue;
            }
            for amount in 1..=depth {
                let mut candidate = state.clone();
                if candidate.reverse_pour(from, onto, amount) != amount {
                    break;
                }
                let mut check = candidate.clone();
                if check.push_move(onto, from).is_ok() && check == *state {
                    found.push(candidate);
                }
            }
        }
    }
    found
}

/// Builds a solvable puzzle by scrambling a sorted one with random reverse pours.
pub fn generate<R: Rng + ?Sized>(rng: &mut R, config: &GeneratorConfig) -> Result<PuzzleState, GeneratorError> {
    if config.colors == 0 {
        return Err(GeneratorError::NoColors);
    }
    if config.colors > FLUID_COLORS.len() {
        return Err(GeneratorError::TooManyColors {
            requested: config.colors,
            available: FLUID_COLORS.len(),
        });
    }
    if config.capacity == 0 {
        return Err(GeneratorError::ZeroCapacity);
    }

    let mut rows: Vec<Vec<Option<&str>>> = color_names()
        .take(config.colors)
        .map(|name| vec![Some(name); config.capacity])
        .collect();
    rows.extend((0..config.empty_tubes).map(|_| vec![None; config.capacity]));
    let Ok(mut state) = PuzzleState::new(rows) else {
        return Err(GeneratorError::ZeroCapacity);
    };

    let mut previous: Option<PuzzleState> = None;
    for step in 0..config.scramble_moves {
        let mut candidates = reverse_pours(&state);
        if candidates.len() > 1
            && let Some(undo) = &previous
        {
            candidates.retain(|candidate| candidate != undo);
        }
        let Some(next) = candidates.choose(rng).cloned() else {
            debug!("No reverse pour left after {} steps.", step);
            break;
        };
        previous = Some(std::mem::replace(&mut state, next));
    }
    debug!("Generated puzzle:\n{}", state.get_text_representation());
    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::Solver;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn small() -> GeneratorConfig {
        GeneratorConfig {
            colors: 3,
            capacity: 4,
            empty_tubes: 2,
            scramble_moves: 12,
        }
    }

    #[test]
    fn generated_puzzles_keep_full_tubes_of_each_color() {
        let mut rng = StdRng::seed_from_u64(7);
        let game = generate(&mut rng, &small()).unwrap();
        assert_eq!(game.tubes().len(), 5);
        assert_eq!(game.slot_count(), 4);
        assert!(game.moves().is_empty());
        let counts = game.color_counts();
        assert_eq!(counts.len(), 3);
        assert!(counts.values().all(|&count| count == 4));
        assert!(game.tubes().iter().all(|tube| tube.is_settled()));
    }

    #[test]
    fn same_seed_same_puzzle() {
        let first = generate(&mut StdRng::seed_from_u64(11), &small()).unwrap();
        let second = generate(&mut StdRng::seed_from_u64(11), &small()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn generated_puzzles_are_solvable() {
        let mut rng = StdRng::seed_from_u64(3);
        let game = generate(&mut rng, &small()).unwrap();
        let moves = Solver::solve(&game).unwrap();
        let mut replay = game.clone();
        for (source, destination) in moves {
            replay.push_move(source, destination).unwrap();
        }
        assert!(replay.is_solved());
    }

    #[test]
    fn every_reverse_pour_can_be_poured_back() {
        let game = PuzzleState::new([
            [None, None, Some("red"), Some("red")],
            [None, None, Some("red"), Some("red")],
            [None, None, None, None],
        ])
        .unwrap();
        let candidates = reverse_pours(&game);
        assert!(!candidates.is_empty());
        for candidate in candidates {
            assert_eq!(candidate.color_counts(), game.color_counts());
        }
    }

    #[test]
    fn rejects_bad_configs() {
        let mut rng = StdRng::seed_from_u64(1);
        let config = GeneratorConfig { colors: 0, ..small() };
        assert_eq!(generate(&mut rng, &config), Err(GeneratorError::NoColors));
        let config = GeneratorConfig { colors: 40, ..small() };
        assert!(matches!(
            generate(&mut rng, &config),
            Err(GeneratorError::TooManyColors { requested: 40, .. })
        ));
        let config = GeneratorConfig { capacity: 0, ..small() };
        assert_eq!(generate(&mut rng, &config), Err(GeneratorError::ZeroCapacity));
    }
}
