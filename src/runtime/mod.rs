mod execution;
mod future;
mod gate;
mod work;

pub use execution::Builder;
pub use future::Future;
