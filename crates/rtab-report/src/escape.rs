//! Escaping of table cells for LaTeX output
//!
//! `escape_text` is for plain data such as term labels. `escape_markup`
//! is for cells the formatter may already have wrapped in markup (bold
//! p-values): it leaves control sequences alone and escapes only stray
//! reserved characters, so running it twice changes nothing.

/// Characters escaped by prefixing a backslash
const RESERVED: [char; 5] = ['#', '$', '%', '&', '_'];

fn push_escaped(out: &mut String, c: char) {
    match c {
        c if RESERVED.contains(&c) => {
            out.push('\\');
            out.push(c);
        }
        '~' => out.push_str("\\textasciitilde{}"),
        '^' => out.push_str("\\textasciicircum{}"),
        '<' => out.push_str("\\textless{}"),
        '>' => out.push_str("\\textgreater{}"),
        c => out.push(c),
    }
}

/// Escape reserved characters in plain text
///
/// Backslashes and braces pass through untouched.
pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        push_escaped(&mut out, c);
    }
    out
}

/// Escape a cell that may contain markup
///
/// Control words (`\textbf`) and escaped symbols (`\_`, `\%`) are copied
/// as they are; everything else is escaped as in `escape_text`.
pub fn escape_markup(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            push_escaped(&mut out, c);
            continue;
        }

        out.push('\\');
        match chars.peek().copied() {
            Some(next) if next.is_ascii_alphabetic() => {
                while let Some(&letter) = chars.peek() {
                    if !letter.is_ascii_alphabetic() {
                        break;
                    }
                    out.push(letter);
                    chars.next();
                }
            }
            Some(next) if RESERVED.contains(&next) || matches!(next, '\\' | '{' | '}' | ' ') => {
                out.push(next);
                chars.next();
            }
            _ => {}
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reserved_characters() {
        assert_eq!(escape_text("Income_2"), "Income\\_2");
        assert_eq!(escape_text("50% & #1 for $5"), "50\\% \\& \\#1 for \\$5");
    }

    #[test]
    fn test_glyph_sequences() {
        assert_eq!(escape_text("A<B"), "A\\textless{}B");
        assert_eq!(escape_text("A>B"), "A\\textgreater{}B");
        assert_eq!(escape_text("~x^2"), "\\textasciitilde{}x\\textasciicircum{}2");
    }

    #[test]
    fn test_structural_characters_pass_through() {
        assert_eq!(escape_text("\\textbf{x}"), "\\textbf{x}");
        assert_eq!(escape_text("{}"), "{}");
    }

    #[test]
    fn test_clean_text_unchanged() {
        assert_eq!(escape_text("Climate Change"), "Climate Change");
        assert_eq!(escape_markup("[0.50, 1.90]"), "[0.50, 1.90]");
        assert_eq!(escape_markup("-0.45"), "-0.45");
    }

    #[test]
    fn test_markup_keeps_emphasis() {
        assert_eq!(escape_markup("\\textbf{.004}"), "\\textbf{.004}");
        assert_eq!(escape_markup("\\emph{.004}"), "\\emph{.004}");
        assert_eq!(escape_markup("< .001"), "\\textless{} .001");
    }

    #[test]
    fn test_markup_escapes_stray_characters() {
        assert_eq!(escape_markup("\\textbf{5%}"), "\\textbf{5\\%}");
        assert_eq!(escape_markup("a_b"), "a\\_b");
    }

    #[test]
    fn test_markup_is_idempotent() {
        for input in [
            "\\textbf{.004}",
            "< .001",
            "Income_2",
            "50% ~ x^2 > y",
            "\\textbf{a_b}",
            "\\_ already",
        ] {
            let once = escape_markup(input);
            assert_eq!(escape_markup(&once), once, "input {:?}", input);
        }
    }
}
