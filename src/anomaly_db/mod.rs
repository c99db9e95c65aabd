mod maintenance;
mod model;
mod paths;
mod read;
mod write;

#[cfg(test)]
mod tests;

pub use maintenance::run_maintenance;
pub use read::replay_journal;
pub use write::append_events;
