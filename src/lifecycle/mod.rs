//! Process lifecycle: signal handling and graceful shutdown.

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
pub use signals::trigger_on_ctrl_c;
