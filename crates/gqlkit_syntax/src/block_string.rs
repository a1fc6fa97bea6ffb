//! Block string (`"""..."""`) value computation.

/// Splits on `\r\n`, `\n` and lone `\r`.
fn split_lines(raw: &str) -> Vec<&str> {
    let mut lines = Vec::new();
    let bytes = raw.as_bytes();
    let mut start = 0;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\r' => {
                lines.push(&raw[start..i]);
                if bytes.get(i + 1) == Some(&b'\n') {
                    i += 1;
                }
                start = i + 1;
            }
            b'\n' => {
                lines.push(&raw[start..i]);
                start = i + 1;
            }
            _ => {}
        }
        i += 1;
    }
    lines.push(&raw[start..]);
    lines
}

fn leading_whitespace(line: &str) -> usize {
    line.bytes().take_while(|b| *b == b' ' || *b == b'\t').count()
}

fn is_blank(line: &str) -> bool {
    leading_whitespace(line) == line.len()
}

/// Computes the value of a block string from its raw content.
///
/// The indentation shared by every non-blank line is removed, then leading
/// and trailing blank lines are dropped. Lines are joined with `\n`.
/// The first line counts toward the shared indentation, which makes the
/// result a fixed point: dedenting it again changes nothing.
/// `raw` must already have `\"""` unescaped.
#[must_use]
pub fn dedent(raw: &str) -> String {
    let lines = split_lines(raw);

    let Some(first) = lines.iter().position(|line| !is_blank(line)) else {
        return String::new();
    };
    let last = lines
        .iter()
        .rposition(|line| !is_blank(line))
        .unwrap_or(first);

    let common_indent = lines[first..=last]
        .iter()
        .filter(|line| !is_blank(line))
        .map(|line| leading_whitespace(line))
        .min()
        .unwrap_or(0);

    lines[first..=last]
        .iter()
        .map(|line| &line[common_indent.min(line.len())..])
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dedent_common_indent() {
        let raw = "\n    Hello,\n      World!\n\n    Yours,\n      GraphQL.\n  ";
        assert_eq!(dedent(raw), "Hello,\n  World!\n\nYours,\n  GraphQL.");
    }

    #[test]
    fn test_first_line_counts_toward_indent() {
        assert_eq!(dedent("  first\n    second\n    third"), "first\n  second\n  third");
        assert_eq!(dedent("first\n    second"), "first\n    second");
    }

    #[test]
    fn test_blank_only() {
        assert_eq!(dedent("  \n\t\n   "), "");
        assert_eq!(dedent(""), "");
    }

    #[test]
    fn test_crlf_and_cr_terminators() {
        assert_eq!(dedent("\r\n  a\r  b\r\n"), "a\nb");
    }

    #[test]
    fn test_dedent_is_idempotent() {
        let corpus = [
            "\n    Hello,\n      World!\n  ",
            "  first\n    second",
            "no indent",
            "\n\t\ttabbed\n\t\t  mixed\n",
            "\n  a\n\n      \n  b\n",
            "\n  a\n    b",
            "\n      deep\n    shallow\n        deeper\n",
        ];
        assert_eq!(dedent("\n  a\n    b"), "a\n  b");
        for raw in corpus {
            let once = dedent(raw);
            assert_eq!(dedent(&once), once, "not idempotent for {raw:?}");
        }
    }
}
