/// Direction the snake can move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Returns the delta (dx, dy) for moving in this direction
    ///
    /// The y axis grows downward, so `Up` is (0, -1).
    pub fn delta(&self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }

    /// Returns the heading after applying a relative action
    pub fn rotated(self, action: Action) -> Direction {
        match action {
            Action::Straight => self,
            Action::TurnRight => self.clockwise(),
            Action::TurnLeft => self.counter_clockwise(),
        }
    }

    fn clockwise(self) -> Direction {
        match self {
            Direction::Up => Direction::Right,
            Direction::Right => Direction::Down,
            Direction::Down => Direction::Left,
            Direction::Left => Direction::Up,
        }
    }

    fn counter_clockwise(self) -> Direction {
        match self {
            Direction::Up => Direction::Left,
            Direction::Left => Direction::Down,
            Direction::Down => Direction::Right,
            Direction::Right => Direction::Up,
        }
    }
}

/// Number of distinct actions the policy chooses between
pub const NUM_ACTIONS: usize = 3;

/// Action relative to the snake's current heading
///
/// Relative actions keep the action space at three choices regardless of
/// heading, and make a 180-degree reversal impossible to express.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Keep the current heading
    Straight,
    /// Turn 90 degrees clockwise
    TurnRight,
    /// Turn 90 degrees counter-clockwise
    TurnLeft,
}

impl Action {
    /// Maps a policy output index to an action
    ///
    /// Index 0 is straight, 1 is turn right, 2 is turn left. Out-of-range
    /// indices fall back to `Straight`.
    pub fn from_index(index: usize) -> Action {
        match index {
            1 => Action::TurnRight,
            2 => Action::TurnLeft,
            _ => Action::Straight,
        }
    }

    /// Returns the policy output index for this action
    pub fn index(&self) -> usize {
        match self {
            Action::Straight => 0,
            Action::TurnRight => 1,
            Action::TurnLeft => 2,
        }
    }
}
