pub mod control;
pub mod logistic;
pub mod stoch;
pub mod trend;

pub use control::*;
pub use logistic::*;
pub use stoch::*;
pub use trend::*;
