//! Splits REPL input into statements.
//!
//! A `;` ends a statement unless it sits inside a quoted string, a comment or
//! an unclosed JSON object/array. Single quotes escape by doubling (`''`),
//! double quotes by backslash, as in JSON.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitResult {
    pub statements: Vec<String>,
    pub remainder: String,
    /// A string, block comment or JSON value is still open at the end of input.
    pub open: bool,
}

impl SplitResult {
    /// Treats a pending remainder as complete when nothing is left open, so a
    /// statement may end at the end of a line without a `;`.
    pub fn finish_line(&mut self) {
        if !self.open && !self.remainder.trim().is_empty() {
            let statement = std::mem::take(&mut self.remainder);
            self.statements.push(statement.trim().to_string());
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    Normal,
    SingleQuote,
    DoubleQuote,
    LineComment,
    BlockComment,
}

pub fn split_statements(input: &str) -> SplitResult {
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut state = ScanState::Normal;
    let mut depth = 0usize;
    let mut statement_start = 0;
    let mut iter = input.char_indices().peekable();

    while let Some((idx, ch)) = iter.next() {
        match state {
            ScanState::Normal => match ch {
                '\'' => {
                    current.push(ch);
                    state = ScanState::SingleQuote;
                }
                '"' => {
                    current.push(ch);
                    state = ScanState::DoubleQuote;
                }
                '{' | '[' => {
                    current.push(ch);
                    depth += 1;
                }
                '}' | ']' => {
                    current.push(ch);
                    depth = depth.saturating_sub(1);
                }
                '-' => {
                    if let Some((_, next)) = iter.peek()
                        && *next == '-'
                    {
                        iter.next();
                        state = ScanState::LineComment;
                        continue;
                    }
                    current.push(ch);
                }
                '/' => {
                    if let Some((_, next)) = iter.peek()
                        && *next == '*'
                    {
                        iter.next();
                        state = ScanState::BlockComment;
                        continue;
                    }
                    current.push(ch);
                }
                ';' if depth == 0 => {
                    let statement = current.trim();
                    if !statement.is_empty() {
                        statements.push(statement.to_string());
                    }
                    current.clear();
                    statement_start = idx + ch.len_utf8();
                }
                _ => current.push(ch),
            },
            ScanState::SingleQuote => {
                current.push(ch);
                if ch == '\'' {
                    if let Some((_, next)) = iter.peek()
                        && *next == '\''
                    {
                        current.push(*next);
                        iter.next();
                        continue;
                    }
                    state = ScanState::Normal;
                }
            }
            ScanState::DoubleQuote => {
                current.push(ch);
                match ch {
                    '\\' => {
                        if let Some((_, escaped)) = iter.next() {
                            current.push(escaped);
                        }
                    }
                    '"' => state = ScanState::Normal,
                    _ => {}
                }
            }
            ScanState::LineComment => {
                if ch == '\n' {
                    current.push(ch);
                    state = ScanState::Normal;
                }
            }
            ScanState::BlockComment => {
                if ch == '*'
                    && let Some((_, next)) = iter.peek()
                    && *next == '/'
                {
                    iter.next();
                    push_space_if_needed(&mut current);
                    state = ScanState::Normal;
                }
            }
        }
    }

    let open = depth > 0
        || matches!(
            state,
            ScanState::SingleQuote | ScanState::DoubleQuote | ScanState::BlockComment
        );
    let remainder = if state == ScanState::BlockComment {
        input[statement_start..].to_string()
    } else if open || !current.trim().is_empty() {
        current
    } else {
        String::new()
    };

    SplitResult {
        statements,
        remainder,
        open,
    }
}

fn push_space_if_needed(current: &mut String) {
    if current.chars().last().is_some_and(|ch| !ch.is_whitespace()) {
        current.push(' ');
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_multiple_statements() {
        let result = split_statements("SELECT * FROM a; SELECT * FROM b;");
        assert_eq!(result.statements, vec!["SELECT * FROM a", "SELECT * FROM b"]);
        assert!(result.remainder.is_empty());
        assert!(!result.open);
    }

    #[test]
    fn ignores_semicolons_in_strings() {
        let result = split_statements("SELECT * FROM t WHERE a = 'x; y';");
        assert_eq!(result.statements, vec!["SELECT * FROM t WHERE a = 'x; y'"]);
    }

    #[test]
    fn ignores_semicolons_inside_json() {
        let input = r#"INSERT INTO t {"note": "a; b", "list": [1, 2]};"#;
        let result = split_statements(input);
        assert_eq!(
            result.statements,
            vec![r#"INSERT INTO t {"note": "a; b", "list": [1, 2]}"#]
        );
    }

    #[test]
    fn escaped_quotes_do_not_close_json_strings() {
        let result = split_statements(r#"INSERT INTO t {"q": "say \"hi\"; ok"};"#);
        assert_eq!(
            result.statements,
            vec![r#"INSERT INTO t {"q": "say \"hi\"; ok"}"#]
        );
    }

    #[test]
    fn open_json_object_keeps_statement_pending() {
        let mut result = split_statements("INSERT INTO t {\n  \"name\": \"bob\",\n");
        assert!(result.statements.is_empty());
        assert!(result.open);
        result.finish_line();
        assert!(result.statements.is_empty());
        assert!(result.remainder.starts_with("INSERT INTO t {"));
    }

    #[test]
    fn finish_line_completes_statement_without_semicolon() {
        let mut result = split_statements("SELECT * FROM users\n");
        assert!(result.statements.is_empty());
        assert!(!result.open);
        result.finish_line();
        assert_eq!(result.statements, vec!["SELECT * FROM users"]);
        assert!(result.remainder.is_empty());
    }

    #[test]
    fn tracks_open_string() {
        let result = split_statements("SELECT * FROM t WHERE a = 'unterminated");
        assert!(result.statements.is_empty());
        assert!(result.open);
    }

    #[test]
    fn line_comment_after_statement() {
        let result = split_statements("SELECT * FROM t; -- comment;");
        assert_eq!(result.statements, vec!["SELECT * FROM t"]);
        assert!(result.remainder.is_empty());
    }

    #[test]
    fn block_comment_with_semicolon() {
        let result = split_statements("SELECT * FROM a /* x; */; SELECT * FROM b;");
        assert_eq!(result.statements, vec!["SELECT * FROM a", "SELECT * FROM b"]);
    }

    #[test]
    fn unterminated_block_comment_keeps_raw_remainder() {
        let input = "SELECT * FROM a /* comment";
        let result = split_statements(input);
        assert!(result.statements.is_empty());
        assert_eq!(result.remainder, input);
        assert!(result.open);
    }

    #[test]
    fn doubled_single_quotes_stay_in_string() {
        let result = split_statements("UPDATE t SET a = 'it''s; fine';");
        assert_eq!(result.statements, vec!["UPDATE t SET a = 'it''s; fine'"]);
    }
}
