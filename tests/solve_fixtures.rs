use std::path::PathBuf;

use tube_sort::{
    NotSolvableReason, PourPair, PuzzleError, PuzzleFileError, PuzzleState, Solver, load_puzzle,
};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures").join(name)
}

fn replay(initial: &PuzzleState, moves: &[PourPair]) -> PuzzleState {
    let mut game = initial.clone();
    let counts = game.color_counts();
    for &(source, destination) in moves {
        game.push_move(source, destination).unwrap();
        assert_eq!(game.color_counts(), counts);
    }
    game
}

#[test]
fn solves_level_three_from_file() {
    let game = load_puzzle(fixture("lvl3.yml")).unwrap();
    assert_eq!(game.tubes().len(), 3);
    let moves = Solver::solve(&game).unwrap();
    assert!(replay(&game, &moves).is_solved());
}

#[test]
fn swapped_tops_need_three_moves() {
    let game = load_puzzle(fixture("swap.yml")).unwrap();
    let moves = Solver::solve(&game).unwrap();
    assert_eq!(moves.len(), 3);
    let solved = replay(&game, &moves);
    assert!(solved.is_solved());
    assert_eq!(solved.moves().len(), 3);
    assert_eq!(moves, vec![(1, 3), (2, 1), (2, 3)]);
}

#[test]
fn gaps_are_settled_and_solved_in_one_move() {
    let game = load_puzzle(fixture("gaps.yml")).unwrap();
    assert!(game.tubes().iter().all(|tube| tube.is_settled()));
    assert_eq!(Solver::solve(&game).unwrap(), vec![(1, 2)]);
}

#[test]
fn dead_end_is_not_solvable() {
    let mut game = load_puzzle(fixture("dead_end.yml")).unwrap();
    assert!(game.forecast().is_err());
    let failure = Solver::solve(&game).unwrap_err();
    assert_eq!(failure.reason, NotSolvableReason::Exhausted);
}

#[test]
fn uneven_tubes_are_rejected() {
    assert!(matches!(
        load_puzzle(fixture("uneven.yml")),
        Err(PuzzleFileError::Puzzle(PuzzleError::UnevenTubes { tube: 2, expected: 4, found: 3 }))
    ));
}

#[test]
fn undo_walks_back_to_the_start() {
    let game = load_puzzle(fixture("lvl3.yml")).unwrap();
    let moves = Solver::solve(&game).unwrap();
    let mut solved = replay(&game, &moves);
    while solved.pop_move().is_some() {}
    assert_eq!(solved, game);
    assert_eq!(solved.content_hash(), game.content_hash());
}
