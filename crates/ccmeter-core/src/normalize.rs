//! Terminal capture normalization - strip ANSI escape sequences and control
//! bytes so the parser only ever sees plain text.

use once_cell::sync::Lazy;
use regex::Regex;

/// Matches every escape form the target CLI has been observed to emit:
/// CSI (colors, cursor movement, mode set/reset), OSC (window title, both
/// BEL- and ST-terminated), DCS/SOS/PM/APC strings, keypad-mode shifts,
/// and charset selection.
static ESCAPE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"\x1b\[[0-?]*[ -/]*[@-~]",
        r"|\x1b\][^\x07\x1b]*(?:\x07|\x1b\\)?",
        r"|\x1b[PX^_][^\x1b]*(?:\x1b\\)?",
        r"|\x1b[()][0-9A-Za-z]",
        r"|\x1b[@-Z\\-_=><]",
    ))
    .expect("invalid ESCAPE_PATTERN regex")
});

/// Decode captured bytes permissively and strip all terminal control data.
///
/// Total function: invalid UTF-8 is replaced, never rejected. The result
/// contains only visible glyphs and line feeds; box-drawing and block-element
/// characters (the progress bars) carry no escape prefix and pass through
/// verbatim.
pub fn normalize(raw: &[u8]) -> String {
    strip_ansi(&String::from_utf8_lossy(raw))
}

/// Strip escape sequences, carriage returns, and C0/C1 control characters
/// (except line feed) from already-decoded text. Idempotent.
pub fn strip_ansi(text: &str) -> String {
    let stripped = ESCAPE_PATTERN.replace_all(text, "");
    stripped.chars().filter(|&c| c == '\n' || !c.is_control()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_strips_csi_color_codes() {
        assert_eq!(strip_ansi("\x1b[1;32mhello\x1b[0m world"), "hello world");
    }

    #[test]
    fn test_strips_cursor_movement() {
        assert_eq!(strip_ansi("\x1b[2Aup\x1b[10;20Hmoved\x1b[K"), "upmoved");
    }

    #[test]
    fn test_strips_private_mode_sequences() {
        // Alternate screen enter/leave and cursor hide/show
        assert_eq!(
            strip_ansi("\x1b[?1049hscreen\x1b[?25l\x1b[?1049l"),
            "screen"
        );
    }

    #[test]
    fn test_strips_osc_title() {
        assert_eq!(strip_ansi("\x1b]0;my title\x07text"), "text");
        assert_eq!(strip_ansi("\x1b]8;;http://x\x1b\\link"), "link");
    }

    #[test]
    fn test_strips_dcs_and_keypad() {
        assert_eq!(strip_ansi("\x1bPq#0data\x1b\\after"), "after");
        assert_eq!(strip_ansi("\x1b=keypad\x1b>"), "keypad");
    }

    #[test]
    fn test_preserves_bar_glyphs() {
        let line = "██████▌ 13% used";
        assert_eq!(strip_ansi(line), line);
    }

    #[test]
    fn test_removes_carriage_returns_and_c0() {
        assert_eq!(strip_ansi("a\r\nb\x00\x08c\td"), "a\nbcd");
    }

    #[test]
    fn test_keeps_line_feeds() {
        assert_eq!(strip_ansi("one\ntwo\n"), "one\ntwo\n");
    }

    #[test]
    fn test_idempotent() {
        let raw = "\x1b[31m██▌\x1b[0m 42% used\r\n\x1b]0;t\x07Resets 4pm";
        let once = strip_ansi(raw);
        assert_eq!(strip_ansi(&once), once);
    }

    #[test]
    fn test_normalize_replaces_invalid_utf8() {
        let raw = b"ok \xff\xfe bytes";
        let text = normalize(raw);
        assert!(text.starts_with("ok "));
        assert!(text.ends_with(" bytes"));
    }

    #[test]
    fn test_lone_escape_removed() {
        // A bare ESC with no recognizable sequence body is still control data
        assert_eq!(strip_ansi("before\x1bafter"), "beforeafter");
    }

    #[test]
    fn test_relative_order_preserved() {
        let raw = "a\x1b[1mb\x1b[0mc";
        assert_eq!(strip_ansi(raw), "abc");
    }
}
