mod basic;
mod interface;
mod lock;
mod pool;

pub use basic::*;
pub use interface::*;
pub use lock::*;
pub use pool::*;
