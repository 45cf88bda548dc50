//! Depth-counted scanning helpers shared by the literal parsers, the call
//! resolver, and the statement executor's block discovery. All three
//! collapse `( [ {` / `) ] }` into one aggregate depth counter rather than
//! tracking each bracket kind separately — equivalent to per-kind counters
//! for any well-formed (balanced) input, which is the only input these
//! scanners are ever asked to handle.

use crate::error::TourmalineError;

fn opens(token: &str) -> bool {
    matches!(token, "(" | "[" | "{")
}

fn closes(token: &str) -> bool {
    matches!(token, ")" | "]" | "}")
}

/// Given `tokens[open_idx]` is an opening bracket, return the index of its
/// matching close.
pub fn find_matching_close(
    tokens: &[String],
    open_idx: usize,
) -> Result<usize, TourmalineError> {
    let mut depth = 0usize;
    for (offset, tok) in tokens[open_idx..].iter().enumerate() {
        if opens(tok) {
            depth += 1;
        } else if closes(tok) {
            depth -= 1;
            if depth == 0 {
                return Ok(open_idx + offset);
            }
        }
    }
    Err(TourmalineError::Parse(format!(
        "unmatched '{}'",
        tokens[open_idx]
    )))
}

/// Split `tokens[start..end]` on top-level (depth-0 relative to `start`)
/// occurrences of `sep`, returning the `(start, end)` bounds of each
/// piece. Used for comma-separated list/argument elements and `key:value`
/// pairs in map literals.
pub fn split_top_level(
    tokens: &[String],
    start: usize,
    end: usize,
    sep: &str,
) -> Vec<(usize, usize)> {
    let mut pieces = Vec::new();
    let mut depth = 0i32;
    let mut piece_start = start;

    let mut i = start;
    while i < end {
        let tok = tokens[i].as_str();
        if opens(tok) {
            depth += 1;
        } else if closes(tok) {
            depth -= 1;
        } else if tok == sep && depth == 0 {
            pieces.push((piece_start, i));
            piece_start = i + 1;
        }
        i += 1;
    }
    pieces.push((piece_start, end));
    pieces
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toks(s: &str) -> Vec<String> {
        s.split_whitespace().map(str::to_string).collect()
    }

    #[test]
    fn finds_matching_bracket_across_nesting() {
        let tokens = toks("[ 1 , [ 2 , 3 ] , 4 ]");
        assert_eq!(find_matching_close(&tokens, 0).unwrap(), tokens.len() - 1);
    }

    #[test]
    fn splits_top_level_commas_only() {
        let tokens = toks("1 , [ 2 , 3 ] , 4");
        let pieces = split_top_level(&tokens, 0, tokens.len(), ",");
        assert_eq!(pieces.len(), 3);
        assert_eq!(pieces[1], (2, 7));
    }
}
