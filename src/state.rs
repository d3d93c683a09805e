use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::hash::{DefaultHasher, Hash, Hasher};

use macroquad::prelude::debug;

use crate::model::{Color, PourError, Tube, TubeId};

/// Segment score keyed by (source, destination), in generation order.
pub type LegalMoves = BTreeMap<(TubeId, TubeId), u32>;

/// A completed pour, with everything needed to undo it.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Move {
    pub source: TubeId,
    pub destination: TubeId,
    pub color: Color,
    pub count: usize,
    pub source_slots: Vec<usize>,
    pub destination_slots: Vec<usize>,
}

impl Move {
    pub fn pair(&self) -> (TubeId, TubeId) {
        (self.source, self.destination)
    }
}

/// Forecasting found no legal pour from this state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NoLegalMoves;

impl fmt::Display for NoLegalMoves {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("no legal moves left")
    }
}

impl std::error::Error for NoLegalMoves {}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PuzzleError {
    NoTubes,
    ZeroSlots(TubeId),
    UnevenTubes {
        tube: TubeId,
        expected: usize,
        found: usize,
    },
}

impl fmt::Display for PuzzleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PuzzleError::NoTubes => f.write_str("puzzle has no tubes"),
            PuzzleError::ZeroSlots(tube) => write!(f, "tube {tube} has no slots"),
            PuzzleError::UnevenTubes { tube, expected, found } => write!(
                f,
                "tube {tube} has {found} slots but the puzzle uses {expected}"
            ),
        }
    }
}

impl std::error::Error for PuzzleError {}

#[derive(Clone, Debug)]
pub struct PuzzleState {
    tubes: Vec<Tube>,
    slot_count: usize,
    moves: Vec<Move>,
    legal_moves: LegalMoves,
}

// Equality and hashing look at tube contents only, never at history.
impl PartialEq for PuzzleState {
    fn eq(&self, other: &Self) -> bool {
        self.tubes == other.tubes
    }
}

impl Eq for PuzzleState {}

impl Hash for PuzzleState {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.tubes.hash(state);
    }
}

impl PuzzleState {
    /// Builds a puzzle from per-tube slot contents, opening first. Tubes get ids 1, 2, ...
    /// in the given order. Liquid written with gaps beneath it is settled to the bottom.
    pub fn new<R, S>(rows: impl IntoIterator<Item = R>) -> Result<Self, PuzzleError>
    where
        R: IntoIterator<Item = Option<S>>,
        S: Into<Color>,
    {
        let mut tubes = Vec::new();
        let mut slot_count = None;
        for (index, row) in rows.into_iter().enumerate() {
            let id = index + 1;
            let mut tube = Tube::from_names(row);
            let capacity = tube.get_capacity();
            if capacity == 0 {
                return Err(PuzzleError::ZeroSlots(id));
            }
            match slot_count {
                None => slot_count = Some(capacity),
                Some(expected) if expected != capacity => {
                    return Err(PuzzleError::UnevenTubes {
                        tube: id,
                        expected,
                        found: capacity,
                    });
                }
                Some(_) => {}
            }
            if !tube.is_settled() {
                debug!("Settling tube {} to the bottom: {}", id, tube.get_text_representation());
                tube.settle();
            }
            tube.set_id(id);
            tubes.push(tube);
        }
        let slot_count = slot_count.ok_or(PuzzleError::NoTubes)?;
        Ok(Self {
            tubes,
            slot_count,
            moves: Vec::new(),
            legal_moves: LegalMoves::new(),
        })
    }

    pub fn tubes(&self) -> &[Tube] {
        &self.tubes
    }

    pub fn tube(&self, id: TubeId) -> Option<&Tube> {
        self.index_of(id).map(|index| &self.tubes[index])
    }

    pub fn tube_ids(&self) -> impl Iterator<Item = TubeId> + '_ {
        self.tubes.iter().filter_map(Tube::id)
    }

    pub fn slot_count(&self) -> usize {
        self.slot_count
    }

    pub fn moves(&self) -> &[Move] {
        &self.moves
    }

    /// Table filled by the last [`forecast`](Self::forecast); emptied by every push and pop.
    pub fn legal_moves(&self) -> &LegalMoves {
        &self.legal_moves
    }

    fn index_of(&self, id: TubeId) -> Option<usize> {
        self.tubes.iter().position(|tube| tube.id() == Some(id))
    }

    fn tube_pair_mut(
        &mut self,
        source: TubeId,
        destination: TubeId,
    ) -> Result<(&mut Tube, &mut Tube), PourError> {
        let from = self.index_of(source).ok_or(PourError::UnknownTube(source))?;
        let to = self
            .index_of(destination)
            .ok_or(PourError::UnknownTube(destination))?;
        if from == to {
            return Err(PourError::SameTube(source));
        }
        if from < to {
            let (left, right) = self.tubes.split_at_mut(to);
            Ok((&mut left[from], &mut right[0]))
        } else {
            let (left, right) = self.tubes.split_at_mut(from);
            Ok((&mut right[0], &mut left[to]))
        }
    }

    pub fn colors(&self) -> HashSet<Color> {
        self.tubes.iter().flat_map(Tube::colors).collect()
    }

    pub fn color_counts(&self) -> BTreeMap<Color, usize> {
        let mut counts = BTreeMap::new();
        for color in self.tubes.iter().flat_map(|tube| tube.get_slots().iter().flatten()) {
            *counts.entry(color.clone()).or_insert(0) += 1;
        }
        counts
    }

    pub fn is_solved(&self) -> bool {
        self.tubes.iter().all(Tube::is_solved)
    }

    /// Per-color segment credit. Walking each tube from the opening, a color change raises
    /// the level by one and credits the run that just ended; the run touching the bottom
    /// is always credited at the level reached.
    pub fn segment_breakdown(&self) -> BTreeMap<Color, u32> {
        let mut tally = BTreeMap::new();
        for tube in &self.tubes {
            tally_segments(tube, &mut tally);
        }
        tally
    }

    pub fn segment_score(&self) -> u32 {
        self.segment_breakdown().values().sum()
    }

    fn candidate_pairs(&self) -> Vec<(TubeId, TubeId)> {
        let ids: Vec<TubeId> = self.tube_ids().collect();
        let mut pairs = Vec::with_capacity(ids.len() * ids.len().saturating_sub(1));
        for &source in &ids {
            for &destination in &ids {
                if source != destination {
                    pairs.push((source, destination));
                }
            }
        }
        pairs
    }

    /// Every ordered (source, destination) pair that can be poured right now.
    pub fn legal_source_destination_pairs(&self) -> Vec<(TubeId, TubeId)> {
        self.candidate_pairs()
            .into_iter()
            .filter(|&(source, destination)| {
                match (self.tube(source), self.tube(destination)) {
                    (Some(from), Some(to)) => to.can_receive_from(from).is_ok(),
                    _ => false,
                }
            })
            .collect()
    }

    /// Tries every ordered pair, scoring the state each legal pour leads to, and leaves the
    /// state exactly as it found it.
    pub fn forecast(&mut self) -> Result<&LegalMoves, NoLegalMoves> {
        let mut table = LegalMoves::new();
        for (source, destination) in self.candidate_pairs() {
            if self.push_move(source, destination).is_err() {
                continue;
            }
            let score = self.segment_score();
            self.pop_move();
            table.insert((source, destination), score);
        }
        self.legal_moves = table;
        if self.legal_moves.is_empty() {
            return Err(NoLegalMoves);
        }
        Ok(&self.legal_moves)
    }

    /// Pours from `source` into `destination` as many units of the top run as fit, and
    /// records the pour so it can be undone.
    pub fn push_move(&mut self, source: TubeId, destination: TubeId) -> Result<Move, PourError> {
        let (from, to) = self.tube_pair_mut(source, destination)?;
        if from.is_empty() {
            return Err(PourError::SourceEmpty);
        }
        if to.is_full() {
            return Err(PourError::DestinationFull);
        }
        to.can_receive_from(from)?;
        let color = from.top_color().cloned().ok_or(PourError::SourceEmpty)?;

        let mut source_slots = from.pourable_run();
        let count = source_slots.len().min(to.get_empty_space());
        source_slots.truncate(count);

        let receiving = to.receiving_slot().ok_or(PourError::DestinationFull)?;
        let destination_slots = (0..count)
            .map(|offset| {
                receiving
                    .checked_sub(offset)
                    .ok_or(PourError::SlotOutOfRange(offset))
            })
            .collect::<Result<Vec<_>, _>>()?;

        to.accept_pour(from, &source_slots)?;

        let record = Move {
            source,
            destination,
            color,
            count,
            source_slots,
            destination_slots,
        };
        self.moves.push(record.clone());
        self.legal_moves.clear();
        Ok(record)
    }

    /// Undoes the latest pour. `None` when nothing has been poured.
    pub fn pop_move(&mut self) -> Option<Move> {
        let Some(undo) = self.moves.pop() else {
            debug!("No moves made, nothing to undo.");
            return None;
        };
        self.legal_moves.clear();
        if let Some(index) = self.index_of(undo.source) {
            for &position in &undo.source_slots {
                self.tubes[index].set_slot(position, Some(undo.color.clone()));
            }
        }
        if let Some(index) = self.index_of(undo.destination) {
            for &position in &undo.destination_slots {
                self.tubes[index].set_slot(position, None);
            }
        }
        Some(undo)
    }

    /// Moves up to `amount` units of `from`'s top run onto `onto` without the color rule and
    /// without recording a move. Returns the units moved.
    pub(crate) fn reverse_pour(&mut self, from: TubeId, onto: TubeId, amount: usize) -> usize {
        self.legal_moves.clear();
        match self.tube_pair_mut(from, onto) {
            Ok((source, destination)) => source.reverse_pour_into(destination, amount),
            Err(_) => 0,
        }
    }

    /// Structural hash of the tube contents, used as the search's visited key.
    pub fn content_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.hash(&mut hasher);
        hasher.finish()
    }

    pub fn get_text_representation(&self) -> String {
        let mut lines = Vec::with_capacity(self.tubes.len());
        for (index, tube) in self.tubes.iter().enumerate() {
            let id = tube.id().unwrap_or(index + 1);
            lines.push(format!("tube_{}: {}", id, tube.get_text_representation()));
        }
        lines.join("\n") + "\n"
    }
}

fn tally_segments(tube: &Tube, tally: &mut BTreeMap<Color, u32>) {
    let last = tube.get_capacity().saturating_sub(1);
    let mut previous: Option<&Color> = None;
    let mut current: Option<&Color> = None;
    let mut level = 1;
    for (position, slot) in tube.get_slots().iter().enumerate() {
        let Some(color) = slot else {
            previous = current;
            continue;
        };
        current = Some(color);
        let Some(prev) = previous else {
            if position == last {
                *tally.entry(color.clone()).or_insert(0) += level;
            } else {
                previous = current;
            }
            continue;
        };
        if prev != color {
            *tally.entry(prev.clone()).or_insert(0) += level;
            level += 1;
            previous = current;
            if position == last {
                *tally.entry(color.clone()).or_insert(0) += level;
            }
        } else if position == last {
            *tally.entry(color.clone()).or_insert(0) += level;
        }
    }
}

/// Score, per-color breakdown, then one row per slot across all tubes.
impl fmt::Display for PuzzleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "score {}", self.segment_score())?;
        let breakdown: Vec<String> = self
            .segment_breakdown()
            .iter()
            .map(|(color, score)| format!("{color}: {score}"))
            .collect();
        writeln!(f, "{{{}}}", breakdown.join(", "))?;
        let width = self
            .colors()
            .iter()
            .map(|color| color.name().len())
            .max()
            .unwrap_or(0)
            .max(4)
            + 2;
        for position in 0..self.slot_count {
            for tube in &self.tubes {
                let cell = tube.slot(position).map_or("None", Color::name);
                write!(f, "|{cell:^width$}|")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
