mod base;
mod catalog;
mod refresher;
mod retry;
mod sentry;
mod server;

pub use base::*;
pub use catalog::*;
pub use refresher::*;
pub use retry::*;
pub use sentry::*;
pub use server::*;
