mod controls;
mod gameplay;
mod renderer;

use std::env;
use std::path::Path;

use macroquad::prelude::{
    KeyCode, MouseButton, info, is_key_pressed, is_mouse_button_pressed, mouse_position, next_frame,
    warn,
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tube_sort::{GeneratorConfig, PuzzleState, generate, load_puzzle, solve_all};

use crate::controls::ControlAction;
use crate::gameplay::{GameEngine, LoadedPuzzle};

const USAGE: &str = "usage: tube-sort [--budget STATES] [--generate COLORS] [--seed N] [PUZZLE_FILE ...]";

struct Options {
    files: Vec<String>,
    node_budget: Option<usize>,
    generate_colors: Option<usize>,
    seed: Option<u64>,
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Options, String> {
    let mut options = Options {
        files: Vec::new(),
        node_budget: None,
        generate_colors: None,
        seed: None,
    };
    while let Some(arg) = args.next() {
        let mut value = |flag: &str| {
            args.next()
                .ok_or_else(|| format!("{flag} needs a value"))
        };
        match arg.as_str() {
            "--budget" => {
                let raw = value("--budget")?;
                options.node_budget = Some(raw.parse().map_err(|_| format!("bad budget: {raw}"))?);
            }
            "--generate" => {
                let raw = value("--generate")?;
                options.generate_colors = Some(raw.parse().map_err(|_| format!("bad color count: {raw}"))?);
            }
            "--seed" => {
                let raw = value("--seed")?;
                options.seed = Some(raw.parse().map_err(|_| format!("bad seed: {raw}"))?);
            }
            "-h" | "--help" => return Err(USAGE.to_string()),
            flag if flag.starts_with("--") => return Err(format!("unknown option: {flag}\n{USAGE}")),
            _ => options.files.push(arg),
        }
    }
    Ok(options)
}

fn gather_puzzles(options: &Options) -> Vec<(String, PuzzleState)> {
    let mut puzzles = Vec::new();
    for file in &options.files {
        match load_puzzle(file) {
            Ok(state) => {
                let name = Path::new(file)
                    .file_stem()
                    .map_or_else(|| file.clone(), |stem| stem.to_string_lossy().into_owned());
                puzzles.push((name, state));
            }
            Err(err) => warn!("Skipping {}: {}", file, err),
        }
    }
    if puzzles.is_empty() || options.generate_colors.is_some() {
        let config = GeneratorConfig {
            colors: options.generate_colors.unwrap_or(GeneratorConfig::default().colors),
            ..GeneratorConfig::default()
        };
        let mut rng = match options.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        match generate(&mut rng, &config) {
            Ok(state) => puzzles.push(("generated".to_string(), state)),
            Err(err) => warn!("Cannot generate a puzzle: {}", err),
        }
    }
    puzzles
}

#[macroquad::main("Tube Sort")]
async fn main() {
    let options = match parse_args(env::args().skip(1)) {
        Ok(options) => options,
        Err(message) => {
            eprintln!("{message}");
            return;
        }
    };

    let puzzles = gather_puzzles(&options);
    let states: Vec<PuzzleState> = puzzles.iter().map(|(_, state)| state.clone()).collect();
    info!("Solving {} puzzles.", states.len());
    let solutions = solve_all(&states, options.node_budget);
    let loaded = puzzles
        .into_iter()
        .zip(solutions)
        .map(|((name, initial), solution)| LoadedPuzzle { name, initial, solution })
        .collect();

    let Some(mut engine) = GameEngine::new(loaded, options.node_budget) else {
        eprintln!("no puzzle to show\n{USAGE}");
        return;
    };
    loop {
        engine.render();
        if is_mouse_button_pressed(MouseButton::Left) {
            let (x, y) = mouse_position();
            engine.handle_click(x, y);
        }
        let shortcuts = [
            (KeyCode::Right, ControlAction::StepForward),
            (KeyCode::Left, ControlAction::StepBack),
            (KeyCode::S, ControlAction::Solve),
            (KeyCode::U, ControlAction::Undo),
            (KeyCode::R, ControlAction::Reset),
            (KeyCode::N, ControlAction::NextPuzzle),
            (KeyCode::Escape, ControlAction::Deselect),
        ];
        for (key, action) in shortcuts {
            if is_key_pressed(key) {
                engine.handle_game_action(action);
            }
        }
        next_frame().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> impl Iterator<Item = String> {
        list.iter().map(|s| s.to_string()).collect::<Vec<_>>().into_iter()
    }

    #[test]
    fn parses_flags_and_files() {
        let options = parse_args(args(&["--budget", "500", "a.yml", "--seed", "9", "b.yml"])).unwrap();
        assert_eq!(options.files, vec!["a.yml", "b.yml"]);
        assert_eq!(options.node_budget, Some(500));
        assert_eq!(options.seed, Some(9));
        assert_eq!(options.generate_colors, None);
    }

    #[test]
    fn rejects_missing_or_bad_values() {
        assert!(parse_args(args(&["--budget"])).is_err());
        assert!(parse_args(args(&["--generate", "many"])).is_err());
    }

    #[test]
    fn rejects_unknown_options() {
        let message = parse_args(args(&["--bugdet", "5", "a.yml"])).err().unwrap();
        assert!(message.starts_with("unknown option: --bugdet"));
        assert!(message.ends_with(USAGE));
    }

    #[test]
    fn generates_when_no_file_loads() {
        let options = parse_args(args(&["--seed", "5", "missing.yml"])).unwrap();
        let puzzles = gather_puzzles(&options);
        assert_eq!(puzzles.len(), 1);
        assert_eq!(puzzles[0].0, "generated");
    }
}
