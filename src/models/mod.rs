pub mod cohort;
pub mod month;
pub mod trend;

pub use cohort::*;
pub use month::*;
pub use trend::*;
