pub mod scheduler;
pub mod session;

pub use scheduler::SearchScheduler;
pub use session::SearchSession;
