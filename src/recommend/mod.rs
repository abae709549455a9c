pub mod features;
pub mod model;
pub mod neighbors;
pub mod predictor;
pub mod scaler;
pub mod table;


pub use features::*;
pub use model::*;
pub use predictor::*;
pub use table::*;
