pub mod features;
pub mod model;
pub mod odds_fetcher;
pub mod predictor;

pub use features::*;
pub use model::*;
pub use odds_fetcher::*;
pub use predictor::*;
