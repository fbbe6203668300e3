pub mod cost_engine;
pub mod scheduler;

pub use cost_engine::{CostEngine, WEEKS_PER_TERM, allocate};
pub use scheduler::TermCalendarRefresher;
