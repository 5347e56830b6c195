//! Progress aggregation over a user's practice sessions.
//!
//! Everything here is a pure function of its inputs and is recomputed on
//! every call.

mod category;
mod overview;
mod streak;

pub use category::{CategoryStat, category_stats};
pub use overview::{PracticeOverview, practice_overview};
pub use streak::{StreakStat, compute_streak};
