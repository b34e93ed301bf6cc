//! Scripted input phases for the terminal session.
//!
//! The target CLI renders live: typing a slash command character by character
//! triggers its autocomplete dropdown, and Enter selects the highlighted
//! item. The script below reproduces the observed working sequence for the
//! `/usage` screen.

use std::time::Duration;

/// What one phase sends to the pty master.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// Type text one character at a time with an inter-character delay, so
    /// the target's autocomplete renders between keystrokes.
    Type { text: String, char_delay: Duration },
    /// Send control bytes atomically in a single write (Enter, Escape,
    /// interrupt, end-of-transmission).
    Raw(Vec<u8>),
}

/// One scripted step: input to send, then a read-until-idle wait.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Phase {
    pub input: Input,
    /// Overrides the session-wide idle timeout for the read that follows
    /// this phase's input. Slow-rendering screens need a longer window.
    pub idle_timeout: Option<Duration>,
}

impl Phase {
    pub fn type_text(text: impl Into<String>, char_delay: Duration) -> Self {
        Self {
            input: Input::Type {
                text: text.into(),
                char_delay,
            },
            idle_timeout: None,
        }
    }

    pub fn raw(bytes: &[u8]) -> Self {
        Self {
            input: Input::Raw(bytes.to_vec()),
            idle_timeout: None,
        }
    }

    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = Some(timeout);
        self
    }
}

/// The keystroke sequence that opens the `/usage` screen and then exits the
/// target cleanly: type `/usage`, Enter to select it from the dropdown, wait
/// for the screen to render, Escape twice to close the overlay, then ^C and
/// ^D to leave the session.
pub fn usage_script(char_delay: Duration) -> Vec<Phase> {
    vec![
        Phase::type_text("/usage", char_delay).with_idle_timeout(Duration::from_millis(500)),
        // The usage screen takes several seconds to render fully
        Phase::raw(b"\r").with_idle_timeout(Duration::from_secs(3)),
        Phase::raw(b"\x1b").with_idle_timeout(Duration::from_secs(1)),
        Phase::raw(b"\x1b").with_idle_timeout(Duration::from_millis(500)),
        Phase::raw(b"\x03").with_idle_timeout(Duration::from_millis(300)),
        Phase::raw(b"\x04").with_idle_timeout(Duration::from_secs(1)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usage_script_shape() {
        let script = usage_script(Duration::from_millis(30));
        assert_eq!(script.len(), 6);
        assert_eq!(
            script[0].input,
            Input::Type {
                text: "/usage".to_string(),
                char_delay: Duration::from_millis(30),
            }
        );
        assert_eq!(script[1].input, Input::Raw(b"\r".to_vec()));
        // Every control phase carries an explicit idle window
        assert!(script.iter().all(|p| p.idle_timeout.is_some()));
    }

    #[test]
    fn test_phase_builder() {
        let phase = Phase::raw(b"\x1b").with_idle_timeout(Duration::from_secs(2));
        assert_eq!(phase.input, Input::Raw(vec![0x1b]));
        assert_eq!(phase.idle_timeout, Some(Duration::from_secs(2)));
    }
}
