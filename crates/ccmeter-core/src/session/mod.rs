//! Interactive terminal session driving - spawn the target CLI inside a
//! pseudo-terminal, script the keystrokes that open the `/usage` screen, and
//! capture everything it renders.

pub mod driver;
pub mod script;

pub use driver::{run_session, SessionConfig, SessionError};
pub use script::{usage_script, Input, Phase};
