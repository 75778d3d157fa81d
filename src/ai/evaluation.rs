use std::fmt;

use crate::game::Side;

/// Value of a position from the engine's point of view.
///
/// Variant order gives the ordering used by the search:
/// `ForcedLoss < Heuristic(_) < ForcedWin`. A node that has not been resolved
/// yet carries `Option::<Evaluation>::None` instead of a sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Evaluation {
    /// The opponent can force a win.
    ForcedLoss,
    /// Static or backed-up estimate; positive favours the engine.
    Heuristic(i32),
    /// The engine can force a win.
    ForcedWin,
}

impl Evaluation {
    pub const DRAW: Evaluation = Evaluation::Heuristic(0);

    /// The forced result in favour of `side`.
    pub fn win_for(side: Side) -> Self {
        match side {
            Side::Engine => Evaluation::ForcedWin,
            Side::Opponent => Evaluation::ForcedLoss,
        }
    }

    pub fn is_win_for(self, side: Side) -> bool {
        self == Self::win_for(side)
    }

    pub fn is_forced(self) -> bool {
        !matches!(self, Evaluation::Heuristic(_))
    }

    /// Shift a heuristic value one point up. Forced values are left alone.
    pub fn nudged_up(self) -> Self {
        match self {
            Evaluation::Heuristic(v) => Evaluation::Heuristic(v.saturating_add(1)),
            forced => forced,
        }
    }

    /// Shift a heuristic value one point down. Forced values are left alone.
    pub fn nudged_down(self) -> Self {
        match self {
            Evaluation::Heuristic(v) => Evaluation::Heuristic(v.saturating_sub(1)),
            forced => forced,
        }
    }

    /// Whether `self` is strictly preferable to `other` for `side`.
    pub fn better_for(self, other: Evaluation, side: Side) -> bool {
        match side {
            Side::Engine => self > other,
            Side::Opponent => self < other,
        }
    }
}

impl fmt::Display for Evaluation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Evaluation::ForcedLoss => write!(f, "forced loss"),
            Evaluation::Heuristic(v) => write!(f, "{v:+}"),
            Evaluation::ForcedWin => write!(f, "forced win"),
        }
    }
}
