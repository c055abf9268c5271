//! Terminal feedback while waiting on the server.

mod spinner;

pub use spinner::{with_spinner, Spinner, SpinnerConfig, SpinnerHandle};
