mod pid;

pub use pid::{PIDError, PID};
