mod step;
mod tick;

pub use step::Simulator;
pub use tick::FixedTimestep;
