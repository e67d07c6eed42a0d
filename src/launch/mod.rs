//! Launch dispatch and shutdown sequencing

pub mod dispatcher;
pub mod shutdown;

pub use dispatcher::{
    BatchDriver, CommandRunner, CommandStatus, DispatchOutcome, Dispatcher, LaunchMode,
    NO_RESTART_EXIT_CODE,
};
pub use shutdown::{register_shutdown_hook, ShutdownHandle};
