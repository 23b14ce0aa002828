//! Clause segmentation.
//!
//! A step sentence may hold several instructions separated by `.`, `,` or a
//! newline. Separators inside a double-quoted span or a `{{...}}` token
//! belong to that text and never end a clause. A `.` directly followed by a
//! letter or digit (`3.14`, `globalEnv.NAME`) is part of a word. A quote
//! preceded by a backslash does not toggle the quoted state.

/// Characters that end a clause when they appear outside quotes
const SEPARATORS: [char; 3] = ['.', ',', '\n'];

/// Split a raw step sentence into independent clauses.
///
/// Each returned clause is trimmed and terminated with a single `.`;
/// blank clauses are dropped.
#[must_use]
pub fn split_clauses(input: &str) -> Vec<String> {
    let mut clauses = Vec::new();
    let mut current = String::new();
    let mut in_quote = false;
    let mut escaped = false;
    let mut braces = 0usize;
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if escaped {
            current.push(ch);
            escaped = false;
            continue;
        }

        match ch {
            '\\' => {
                escaped = true;
                current.push(ch);
            }
            '"' => {
                in_quote = !in_quote;
                current.push(ch);
            }
            '{' if !in_quote => {
                braces += 1;
                current.push(ch);
            }
            '}' if !in_quote => {
                braces = braces.saturating_sub(1);
                current.push(ch);
            }
            '.' if !in_quote && chars.peek().is_some_and(|next| next.is_alphanumeric()) => current.push(ch),
            c if !in_quote && braces == 0 && SEPARATORS.contains(&c) => flush(&mut current, &mut clauses),
            '\r' if !in_quote => {}
            c => current.push(c),
        }
    }
    flush(&mut current, &mut clauses);

    clauses
}

fn flush(current: &mut String, clauses: &mut Vec<String>) {
    let trimmed = current.trim();
    if !trimmed.is_empty() {
        clauses.push(format!("{trimmed}."));
    }
    current.clear();
}

/// Count the double quotes in `text` that are not escaped with a backslash.
#[must_use]
pub fn unescaped_quotes(text: &str) -> usize {
    let mut count = 0;
    let mut escaped = false;
    for ch in text.chars() {
        match ch {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            '"' => count += 1,
            _ => {}
        }
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_clause_gets_period() {
        assert_eq!(split_clauses("Click \"Submit\" button"), vec![
            "Click \"Submit\" button."
        ]);
    }

    #[test]
    fn test_splits_on_unquoted_separators() {
        let clauses = split_clauses("Click \"A\" link, hover \"B\" button.\nFill \"C\" input with \"x\"");
        assert_eq!(clauses, vec![
            "Click \"A\" link.",
            "hover \"B\" button.",
            "Fill \"C\" input with \"x\".",
        ]);
    }

    #[test]
    fn test_quoted_separators_are_kept() {
        let clauses = split_clauses("Fill \"Address\" input with value \"1 Main St., Springfield\".");
        assert_eq!(clauses.len(), 1);
        assert!(clauses[0].contains("1 Main St., Springfield"));
    }

    #[test]
    fn test_escaped_quote_does_not_toggle() {
        let clauses = split_clauses(r#"Ensure "Quote" element to contain text "say \"hi, there\"", click "B" button"#);
        assert_eq!(clauses.len(), 2);
        assert!(clauses[0].ends_with(r#"\"hi, there\""."#));
    }

    #[test]
    fn test_inner_period_is_part_of_word() {
        assert_eq!(split_clauses("Fill \"Price\" input with value 3.14. Click \"A\" link"), vec![
            "Fill \"Price\" input with value 3.14.",
            "Click \"A\" link.",
        ]);
    }

    #[test]
    fn test_global_token_is_never_split() {
        let clauses = split_clauses("Ensure \"Count\" element to have value {{globalEnv.COUNT}}.");
        assert_eq!(clauses, vec!["Ensure \"Count\" element to have value {{globalEnv.COUNT}}."]);

        let clauses = split_clauses("Fill \"Name\" input with {{ globalEnv.A, B }}, click \"Go\" button");
        assert_eq!(clauses.len(), 2);
        assert!(clauses[0].ends_with("{{ globalEnv.A, B }}."));
    }

    #[test]
    fn test_blank_clauses_dropped() {
        assert!(split_clauses(" .. , \n").is_empty());
        assert_eq!(split_clauses("Click \"A\" link..").len(), 1);
    }

    #[test]
    fn test_unescaped_quote_count() {
        assert_eq!(unescaped_quotes(r#""abc""#), 2);
        assert_eq!(unescaped_quotes(r#"\"abc\""#), 0);
        assert_eq!(unescaped_quotes(r#""say \"hi\"""#), 2);
    }
}
