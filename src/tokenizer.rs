//! Quote-aware splitting of the configured tool argument string.

/// Split one configuration string into discrete argument tokens.
///
/// Single and double quotes toggle an in-quote mode and are retained in
/// the emitted token; there is no escape character. Spaces flush the
/// current token only outside quotes, and runs of spaces never produce
/// empty tokens. An unterminated quote runs to the end of input, which
/// still flushes whatever accumulated. Every input has a defined
/// tokenization.
pub fn split_args(input: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quote: Option<char> = None;

    for c in input.chars() {
        match in_quote {
            None => {
                if c == '\'' || c == '"' {
                    in_quote = Some(c);
                    current.push(c);
                } else if c == ' ' {
                    if !current.is_empty() {
                        tokens.push(std::mem::take(&mut current));
                    }
                } else {
                    current.push(c);
                }
            }
            Some(quote) if quote == c => {
                in_quote = None;
                current.push(c);
            }
            Some(_) => current.push(c),
        }
    }

    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}
