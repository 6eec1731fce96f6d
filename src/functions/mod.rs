// Numeric algorithms, independent of any particular series kind
pub mod adaptive;
pub mod discretize;
pub mod domain_coloring;
pub mod poles;
pub mod seeds;
pub mod streamline;

pub use adaptive::{AdaptiveGoal, LossFn, Region};
pub use domain_coloring::{colorize, Coloring};
pub use seeds::{PolyData, SeedMode, Seeds};
pub use streamline::Trajectory;
