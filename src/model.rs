use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::iter;
use std::sync::Arc;

/// Identity of a tube inside a puzzle, assigned sequentially from 1.
pub type TubeId = usize;

/// One unit of liquid, or nothing.
pub type Slot = Option<Color>;

/// A liquid color, identified by its name.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Color(Arc<str>);

impl Color {
    pub fn new(name: &str) -> Self {
        Color(Arc::from(name))
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<Color: {}>", self.0)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Color {
    fn from(name: &str) -> Self {
        Color::new(name)
    }
}

impl From<String> for Color {
    fn from(name: String) -> Self {
        Color(Arc::from(name))
    }
}

/// Why a pour was refused.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PourError {
    UnknownTube(TubeId),
    SameTube(TubeId),
    DestinationFull,
    SourceEmpty,
    ColorMismatch,
    /// A requested source slot does not exist or holds no liquid.
    SlotOutOfRange(usize),
}

impl fmt::Display for PourError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PourError::UnknownTube(id) => write!(f, "no tube with id {id}"),
            PourError::SameTube(id) => write!(f, "cannot pour tube {id} into itself"),
            PourError::DestinationFull => f.write_str("destination tube is full"),
            PourError::SourceEmpty => f.write_str("source tube is empty"),
            PourError::ColorMismatch => f.write_str("top colors are not the same"),
            PourError::SlotOutOfRange(position) => {
                write!(f, "slot {position} is not a filled slot of the source tube")
            }
        }
    }
}

impl std::error::Error for PourError {}

/// A fixed-capacity tube. Slot 0 is the opening, the last slot is the bottom.
#[derive(Clone, Debug)]
pub struct Tube {
    slots: Vec<Slot>,
    id: Option<TubeId>,
}

// Identity is only a lookup key; two tubes are the same when their contents are.
impl PartialEq for Tube {
    fn eq(&self, other: &Self) -> bool {
        self.slots == other.slots
    }
}

impl Eq for Tube {}

impl Hash for Tube {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.slots.hash(state);
    }
}

impl Tube {
    pub fn new(slots: Vec<Slot>) -> Self {
        Self { slots, id: None }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self::new(vec![None; capacity])
    }

    pub fn from_names<S: Into<Color>>(names: impl IntoIterator<Item = Option<S>>) -> Self {
        Self::new(names.into_iter().map(|name| name.map(Into::into)).collect())
    }

    pub fn id(&self) -> Option<TubeId> {
        self.id
    }

    pub(crate) fn set_id(&mut self, id: TubeId) {
        self.id = Some(id);
    }

    pub fn get_capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn get_slots(&self) -> &[Slot] {
        &self.slots
    }

    /// Color held at `position`, `None` when the slot is empty or does not exist.
    pub fn slot(&self, position: usize) -> Option<&Color> {
        self.slots.get(position).and_then(Option::as_ref)
    }

    pub(crate) fn set_slot(&mut self, position: usize, value: Slot) {
        if let Some(slot) = self.slots.get_mut(position) {
            *slot = value;
        }
    }

    pub fn is_full(&self) -> bool {
        self.slots.iter().all(Option::is_some)
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    pub fn get_empty_space(&self) -> usize {
        self.slots.iter().filter(|s| s.is_none()).count()
    }

    /// Empty slots above the liquid, the room a pour can use. Equals the empty space once
    /// the tube is settled; gaps beneath the liquid are not counted.
    pub fn get_headroom(&self) -> usize {
        self.first_filled().unwrap_or(self.slots.len())
    }

    pub fn get_filled_amount(&self) -> usize {
        self.get_capacity() - self.get_empty_space()
    }

    pub fn colors(&self) -> HashSet<Color> {
        self.slots.iter().flatten().cloned().collect()
    }

    /// Every slot holds the same value, counting "empty" as a value.
    pub fn is_solved(&self) -> bool {
        !self.slots.is_empty() && self.slots.windows(2).all(|pair| pair[0] == pair[1])
    }

    pub fn top_color(&self) -> Option<&Color> {
        self.slots.iter().flatten().next()
    }

    fn first_filled(&self) -> Option<usize> {
        self.slots.iter().position(Option::is_some)
    }

    /// Positions of the contiguous same-color run starting at the top of the liquid.
    pub fn pourable_run(&self) -> Vec<usize> {
        let Some(start) = self.first_filled() else {
            return Vec::new();
        };
        let top = &self.slots[start];
        (start..self.slots.len())
            .take_while(|&position| self.slots[position] == *top)
            .collect()
    }

    pub fn get_top_fluid_depth(&self) -> usize {
        self.pourable_run().len()
    }

    /// The slot an incoming pour fills next.
    pub fn receiving_slot(&self) -> Option<usize> {
        if self.is_full() {
            return None;
        }
        match self.first_filled() {
            None => Some(self.slots.len() - 1),
            Some(top) => top.checked_sub(1),
        }
    }

    /// Whether liquid rests on the bottom with no gaps beneath it.
    pub fn is_settled(&self) -> bool {
        match self.first_filled() {
            None => true,
            Some(top) => self.slots[top..].iter().all(Option::is_some),
        }
    }

    /// Drops every unit toward the bottom, keeping their order.
    pub fn settle(&mut self) {
        let filled: Vec<Slot> = self.slots.iter().filter(|s| s.is_some()).cloned().collect();
        let gap = self.slots.len() - filled.len();
        self.slots = iter::repeat_n(None, gap).chain(filled).collect();
    }

    pub fn can_receive_from(&self, source: &Tube) -> Result<(), PourError> {
        if self.get_headroom() == 0 {
            return Err(PourError::DestinationFull);
        }
        if source.is_empty() {
            return Err(PourError::SourceEmpty);
        }
        if !self.is_empty() && self.top_color() != source.top_color() {
            return Err(PourError::ColorMismatch);
        }
        Ok(())
    }

    /// Moves the units at `slots_to_take` out of `source` and stacks them here, one slot at a
    /// time toward the opening. The request is validated in full before anything moves.
    pub fn accept_pour(&mut self, source: &mut Tube, slots_to_take: &[usize]) -> Result<(), PourError> {
        self.can_receive_from(source)?;
        for (i, &position) in slots_to_take.iter().enumerate() {
            if source.slot(position).is_none() || slots_to_take[..i].contains(&position) {
                return Err(PourError::SlotOutOfRange(position));
            }
        }
        if slots_to_take.len() > self.get_headroom() {
            return Err(PourError::DestinationFull);
        }
        for &position in slots_to_take {
            let target = self.receiving_slot().ok_or(PourError::DestinationFull)?;
            self.slots[target] = source.slots[position].take();
        }
        Ok(())
    }

    /// Pours as much of the source's top run as fits. Returns the number of units moved.
    pub fn pour_from(&mut self, source: &mut Tube) -> Result<usize, PourError> {
        self.can_receive_from(source)?;
        let mut run = source.pourable_run();
        run.truncate(self.get_headroom());
        self.accept_pour(source, &run)?;
        Ok(run.len())
    }

    /// Moves up to `amount` units of the top run onto `other` regardless of its top color.
    pub fn reverse_pour_into(&mut self, other: &mut Tube, amount: usize) -> usize {
        let transfer_amount = self
            .get_top_fluid_depth()
            .min(other.get_headroom())
            .min(amount);
        for _ in 0..transfer_amount {
            let (Some(from), Some(to)) = (self.first_filled(), other.receiving_slot()) else {
                break;
            };
            other.slots[to] = self.slots[from].take();
        }
        transfer_amount
    }

    pub fn get_text_representation(&self) -> String {
        let repr: Vec<&str> = self
            .slots
            .iter()
            .map(|slot| slot.as_ref().map_or(".", Color::name))
            .collect();
        format!("[{}]", repr.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tube(names: [Option<&str>; 4]) -> Tube {
        Tube::from_names(names)
    }

    fn full() -> Tube {
        tube([Some("red"), Some("green"), Some("blue"), Some("yellow")])
    }

    fn three_full() -> Tube {
        tube([None, Some("green"), Some("blue"), Some("yellow")])
    }

    fn half_full() -> Tube {
        tube([None, None, Some("blue"), Some("yellow")])
    }

    fn one_full() -> Tube {
        tube([None, None, None, Some("yellow")])
    }

    fn empty() -> Tube {
        Tube::with_capacity(4)
    }

    #[test]
    fn color_equality_is_by_name() {
        assert_eq!(Color::new("blue"), Color::from("blue".to_string()));
        assert_ne!(Color::new("blue"), Color::new("green"));
        assert_eq!(format!("{:?}", Color::new("blue")), "<Color: blue>");
    }

    #[test]
    fn full_and_empty() {
        assert!(full().is_full());
        for t in [three_full(), half_full(), one_full(), empty()] {
            assert!(!t.is_full());
        }
        assert!(empty().is_empty());
        for t in [full(), three_full(), half_full(), one_full()] {
            assert!(!t.is_empty());
            assert!(!(t.is_full() && t.is_empty()));
        }
    }

    #[test]
    fn top_color_and_pourable_run() {
        assert_eq!(full().top_color(), Some(&Color::new("red")));
        assert_eq!(half_full().top_color(), Some(&Color::new("blue")));
        assert_eq!(empty().top_color(), None);

        assert_eq!(full().pourable_run(), vec![0]);
        assert_eq!(three_full().pourable_run(), vec![1]);
        assert_eq!(one_full().pourable_run(), vec![3]);
        assert!(empty().pourable_run().is_empty());
        assert_eq!(
            tube([Some("red"), Some("red"), Some("blue"), Some("yellow")]).pourable_run(),
            vec![0, 1]
        );
        assert_eq!(
            tube([Some("red"), Some("red"), Some("red"), Some("red")]).pourable_run(),
            vec![0, 1, 2, 3]
        );
    }

    #[test]
    fn receiving_slot_is_above_the_liquid() {
        assert_eq!(full().receiving_slot(), None);
        assert_eq!(three_full().receiving_slot(), Some(0));
        assert_eq!(half_full().receiving_slot(), Some(1));
        assert_eq!(one_full().receiving_slot(), Some(2));
        assert_eq!(empty().receiving_slot(), Some(3));
    }

    #[test]
    fn solved_tubes() {
        assert!(!full().is_solved());
        assert!(!half_full().is_solved());
        assert!(!one_full().is_solved());
        assert!(empty().is_solved());
        assert!(tube([Some("red"), Some("red"), Some("red"), Some("red")]).is_solved());
        for t in [full(), three_full(), half_full(), one_full(), empty()] {
            if t.is_solved() {
                assert!(t.colors().len() <= 1);
            }
        }
    }

    #[test]
    fn colors_present() {
        assert_eq!(full().colors().len(), 4);
        assert_eq!(
            half_full().colors(),
            HashSet::from([Color::new("blue"), Color::new("yellow")])
        );
        assert!(empty().colors().is_empty());
    }

    #[test]
    fn refuses_illegal_pours() {
        assert_eq!(full().accept_pour(&mut half_full(), &[2]), Err(PourError::DestinationFull));
        assert_eq!(half_full().accept_pour(&mut empty(), &[]), Err(PourError::SourceEmpty));
        let mut blue = tube([None, None, None, Some("blue")]);
        let mut green_on_blue = tube([None, None, Some("green"), Some("blue")]);
        assert_eq!(blue.pour_from(&mut green_on_blue), Err(PourError::ColorMismatch));
        assert_eq!(
            empty().accept_pour(&mut half_full(), &[1]),
            Err(PourError::SlotOutOfRange(1))
        );
        assert_eq!(
            empty().accept_pour(&mut full(), &[0, 0]),
            Err(PourError::SlotOutOfRange(0))
        );
    }

    #[test]
    fn pours_top_run() {
        let mut target = tube([None, None, None, Some("green")]);
        let mut source = tube([None, None, Some("green"), Some("blue")]);
        assert_eq!(target.pour_from(&mut source), Ok(1));
        assert_eq!(target, tube([None, None, Some("green"), Some("green")]));
        assert_eq!(source, tube([None, None, None, Some("blue")]));

        let mut target = tube([None, None, Some("green"), Some("green")]);
        let mut source = tube([None, None, Some("green"), Some("green")]);
        target.pour_from(&mut source).unwrap();
        assert!(target.is_full() && target.is_solved());
        assert!(source.is_empty());

        let mut target = empty();
        let mut source = tube([Some("green"), Some("green"), Some("green"), Some("green")]);
        assert_eq!(target.pour_from(&mut source), Ok(4));
        assert_eq!(target.get_filled_amount(), 4);
        assert!(source.is_empty());
    }

    #[test]
    fn pour_stops_at_capacity() {
        let mut target = three_full();
        let mut source = tube([None, Some("green"), Some("green"), Some("red")]);
        assert_eq!(target.pour_from(&mut source), Ok(1));
        assert!(target.is_full());
        assert_eq!(source, tube([None, None, Some("green"), Some("red")]));
    }

    #[test]
    fn pours_only_fill_the_room_above_the_liquid() {
        let gapped = || tube([None, Some("green"), None, Some("red")]);
        let source = || tube([None, None, Some("green"), Some("green")]);
        assert_eq!(gapped().get_empty_space(), 2);
        assert_eq!(gapped().get_headroom(), 1);

        let (mut target, mut from) = (gapped(), source());
        assert_eq!(target.accept_pour(&mut from, &[2, 3]), Err(PourError::DestinationFull));
        assert_eq!(target, gapped());
        assert_eq!(from, source());

        assert_eq!(target.pour_from(&mut from), Ok(1));
        assert_eq!(target, tube([Some("green"), Some("green"), None, Some("red")]));
        assert_eq!(from, tube([None, None, None, Some("green")]));
        assert_eq!(target.can_receive_from(&from), Err(PourError::DestinationFull));
    }

    #[test]
    fn settle_packs_to_the_bottom() {
        let mut t = tube([Some("green"), None, Some("red"), None]);
        assert!(!t.is_settled());
        t.settle();
        assert!(t.is_settled());
        assert_eq!(t, tube([None, None, Some("green"), Some("red")]));
    }

    #[test]
    fn reverse_pour_ignores_colors() {
        let mut from = tube([None, Some("red"), Some("red"), Some("blue")]);
        let mut to = one_full();
        assert_eq!(from.reverse_pour_into(&mut to, 1), 1);
        assert_eq!(to, tube([None, None, Some("red"), Some("yellow")]));
        assert_eq!(from, tube([None, None, Some("red"), Some("blue")]));
    }

    #[test]
    fn identity_does_not_affect_equality() {
        let mut a = half_full();
        a.set_id(1);
        let mut b = half_full();
        b.set_id(2);
        assert_eq!(a, b);
        assert_eq!(a.get_text_representation(), "[., ., blue, yellow]");
    }
}
