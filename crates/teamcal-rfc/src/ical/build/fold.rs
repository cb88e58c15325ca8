//! Content line folding (RFC 5545 §3.1).

/// Maximum octets per physical line, excluding CRLF.
const MAX_LINE_OCTETS: usize = 75;

/// ## Summary
/// Folds a logical line into CRLF-terminated physical lines of at most 75
/// octets. Continuation lines start with a single space, which counts
/// toward their limit. Multi-byte characters are never split.
#[must_use]
pub fn fold_line(line: &str) -> String {
    let mut out = String::with_capacity(line.len() + line.len() / MAX_LINE_OCTETS * 3 + 2);
    let mut used = 0;

    for c in line.chars() {
        let width = c.len_utf8();
        if used + width > MAX_LINE_OCTETS {
            out.push_str("\r\n ");
            used = 1;
        }
        out.push(c);
        used += width;
    }

    out.push_str("\r\n");
    out
}
