pub mod solver;
pub mod trace;

pub use solver::{irr, IrrSolution, IrrSolver, SolveStatus, Termination, TracedSolution};
pub use trace::{IterationLog, IterationObserver, IterationStep};
