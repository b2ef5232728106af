pub mod candle;
pub mod indicators;
pub mod signals;

pub use candle::*;
pub use indicators::*;
pub use signals::*;
