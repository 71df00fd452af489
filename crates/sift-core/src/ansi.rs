//! SGR escape-sequence parsing.
//!
//! Providers may embed `\x1b[..m` styling in labels (typically output of an
//! external command). The worker strips those codes once per item and keeps
//! the styling as byte-range highlights on the clean text.

use crate::item::Highlight;

const FOREGROUND: &[(u8, &str)] = &[
    (30, "Black"),
    (31, "Red"),
    (32, "Green"),
    (33, "Yellow"),
    (34, "Blue"),
    (35, "Magenta"),
    (36, "Cyan"),
    (37, "White"),
    (90, "Grey"),
];

const BACKGROUND: &[(u8, &str)] = &[
    (40, "Black"),
    (41, "Red"),
    (42, "Green"),
    (43, "Yellow"),
    (44, "Blue"),
    (45, "Magenta"),
    (46, "Cyan"),
    (47, "White"),
];

/// Result of stripping ANSI codes from a label.
#[derive(Debug, Default, PartialEq)]
pub struct Parsed {
    pub text: String,
    pub highlights: Vec<Highlight>,
}

fn color_name(table: &'static [(u8, &'static str)], code: u8) -> Option<&'static str> {
    table.iter().find(|(c, _)| *c == code).map(|(_, n)| n).copied()
}

fn group_for(fg: Option<&str>, bg: Option<&str>) -> Option<String> {
    match (fg, bg) {
        (Some(f), Some(b)) => Some(format!("Sift{f}{b}")),
        (Some(f), None) => Some(format!("SiftFg{f}")),
        (None, Some(b)) => Some(format!("SiftBg{b}")),
        (None, None) => None,
    }
}

/// Strip SGR sequences from `input`, emitting one highlight per styled run.
/// Unknown escape sequences are dropped; unknown SGR parameters are ignored.
pub fn parse_highlights(input: &str) -> Parsed {
    let mut out = Parsed::default();
    let mut fg: Option<&'static str> = None;
    let mut bg: Option<&'static str> = None;
    // start of the current styled run in `out.text`, if any
    let mut run_start: Option<usize> = None;

    let mut close_run = |out: &mut Parsed, run_start: &mut Option<usize>, fg, bg| {
        if let Some(start) = run_start.take() {
            let end = out.text.len();
            if end > start {
                if let Some(group) = group_for(fg, bg) {
                    out.highlights.push(Highlight {
                        start,
                        end,
                        group: Some(group),
                    });
                }
            }
        }
    };

    let mut chars = input.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch != '\x1b' {
            out.text.push(ch);
            continue;
        }
        if chars.peek() != Some(&'[') {
            // lone escape, drop it
            continue;
        }
        chars.next();
        let mut params = String::new();
        let mut terminator = None;
        for c in chars.by_ref() {
            if c.is_ascii_digit() || c == ';' {
                params.push(c);
            } else {
                terminator = Some(c);
                break;
            }
        }
        if terminator != Some('m') {
            // CSI other than SGR, ignore the whole sequence
            continue;
        }
        close_run(&mut out, &mut run_start, fg, bg);
        if params.is_empty() {
            fg = None;
            bg = None;
        }
        for part in params.split(';') {
            match part.parse::<u8>() {
                Ok(0) => {
                    fg = None;
                    bg = None;
                }
                Ok(n) if (30..=37).contains(&n) || n == 90 => fg = color_name(FOREGROUND, n),
                Ok(n) if (40..=47).contains(&n) => bg = color_name(BACKGROUND, n),
                Ok(39) => fg = None,
                Ok(49) => bg = None,
                _ => {}
            }
        }
        if fg.is_some() || bg.is_some() {
            run_start = Some(out.text.len());
        }
    }
    close_run(&mut out, &mut run_start, fg, bg);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_passes_through() {
        let parsed = parse_highlights("hello");
        assert_eq!(parsed.text, "hello");
        assert!(parsed.highlights.is_empty());
    }

    #[test]
    fn foreground_run_highlighted() {
        let parsed = parse_highlights("\x1b[31mred\x1b[0m rest");
        assert_eq!(parsed.text, "red rest");
        assert_eq!(parsed.highlights.len(), 1);
        let h = &parsed.highlights[0];
        assert_eq!((h.start, h.end), (0, 3));
        assert_eq!(h.group.as_deref(), Some("SiftFgRed"));
    }

    #[test]
    fn combined_fg_bg_group_name() {
        let parsed = parse_highlights("\x1b[31;44mx\x1b[m");
        assert_eq!(parsed.highlights[0].group.as_deref(), Some("SiftRedBlue"));
    }

    #[test]
    fn background_only() {
        let parsed = parse_highlights("\x1b[42mok\x1b[0m");
        assert_eq!(parsed.highlights[0].group.as_deref(), Some("SiftBgGreen"));
    }

    #[test]
    fn reset_without_params_ends_run() {
        let parsed = parse_highlights("a\x1b[31mb\x1b[mc");
        assert_eq!(parsed.text, "abc");
        assert_eq!(parsed.highlights.len(), 1);
        assert_eq!((parsed.highlights[0].start, parsed.highlights[0].end), (1, 2));
    }

    #[test]
    fn non_sgr_sequences_are_dropped() {
        let parsed = parse_highlights("a\x1b[2Kb");
        assert_eq!(parsed.text, "ab");
        assert!(parsed.highlights.is_empty());
    }

    #[test]
    fn unknown_params_ignored() {
        let parsed = parse_highlights("\x1b[1mbold\x1b[0m");
        assert_eq!(parsed.text, "bold");
        assert!(parsed.highlights.is_empty());
    }

    #[test]
    fn spans_are_byte_ranges() {
        let parsed = parse_highlights("é\x1b[31mé\x1b[0m");
        assert_eq!(parsed.text, "éé");
        assert_eq!((parsed.highlights[0].start, parsed.highlights[0].end), (2, 4));
    }
}
