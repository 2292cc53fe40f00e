mod port;
mod server;
mod session_hub;

pub use port::*;
pub use server::*;
pub use session_hub::*;
