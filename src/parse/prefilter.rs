//! Textual pre-filter for compiler extensions.
//!
//! Preprocessed kernel sources still carry gcc/clang extension tokens that
//! a C grammar has no production for. The filter strips them before
//! parsing; standard C passes through byte-identical (modulo the removed
//! tokens' whitespace).

use regex::Regex;

/// Strip extension tokens the parser cannot digest.
pub fn strip_extensions(source: &str) -> String {
    let mut out = strip_call_like(source, "__attribute__", false);
    out = strip_call_like(&out, "__attribute", false);
    for keyword in ["__asm__", "__asm", "asm"] {
        out = strip_call_like(&out, keyword, true);
    }
    let bare = Regex::new(
        r"\b(?:__extension__|__restrict__|__restrict|__volatile__|__inline__|__inline|__signed__|__const__)\b",
    )
    .expect("static pattern compiles");
    bare.replace_all(&out, "").into_owned()
}

/// Remove every `keyword ( ... )` span, parens balanced. With
/// `qualifiers`, `volatile`/`goto` between keyword and parens is eaten too
/// (asm statements). A keyword without a following paren is left alone.
fn strip_call_like(source: &str, keyword: &str, qualifiers: bool) -> String {
    let mut out = String::with_capacity(source.len());
    let bytes = source.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if source[i..].starts_with(keyword)
            && !prev_is_ident(bytes, i)
            && !next_is_ident(bytes, i + keyword.len())
        {
            let mut j = i + keyword.len();
            j += leading_ws(&source[j..]);
            if qualifiers {
                for q in ["volatile", "__volatile__", "goto"] {
                    if source[j..].starts_with(q) && !next_is_ident(bytes, j + q.len()) {
                        j += q.len();
                        j += leading_ws(&source[j..]);
                    }
                }
            }
            if bytes.get(j) == Some(&b'(') {
                if let Some(end) = skip_balanced(bytes, j) {
                    out.push(' ');
                    i = end;
                    continue;
                }
            }
        }
        // Advance one UTF-8 character.
        let ch = source[i..].chars().next().unwrap_or('\0');
        out.push(ch);
        i += ch.len_utf8().max(1);
    }
    out
}

fn leading_ws(s: &str) -> usize {
    s.len() - s.trim_start().len()
}

fn is_ident_byte(b: u8) -> bool {
    b == b'_' || b.is_ascii_alphanumeric()
}

fn prev_is_ident(bytes: &[u8], i: usize) -> bool {
    i > 0 && is_ident_byte(bytes[i - 1])
}

fn next_is_ident(bytes: &[u8], i: usize) -> bool {
    bytes.get(i).copied().is_some_and(is_ident_byte)
}

/// Index one past the paren that closes the one at `open`, ignoring parens
/// inside string and character literals.
fn skip_balanced(bytes: &[u8], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut quote: Option<u8> = None;
    let mut i = open;
    while i < bytes.len() {
        let b = bytes[i];
        match quote {
            Some(q) => {
                if b == b'\\' {
                    i += 1;
                } else if b == q {
                    quote = None;
                }
            }
            None => match b {
                b'"' | b'\'' => quote = Some(b),
                b'(' => depth += 1,
                b')' => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(i + 1);
                    }
                }
                _ => {}
            },
        }
        i += 1;
    }
    None
}
