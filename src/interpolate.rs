use std::borrow::Cow;

use crate::model::EnvMap;

/// Replace every `${NAME}` in `input` with `NAME`'s value in `values`.
///
/// `NAME` is one or more ASCII letters, digits or underscores. Unknown names
/// expand to the empty string. The input is scanned once; text produced by a
/// replacement is never scanned again. Anything that is not a complete
/// placeholder (`${`, `${}`, `${A-B}`, `$NAME`) is copied as is.
pub fn interpolate<'a>(input: &'a str, values: &EnvMap) -> Cow<'a, str> {
    let bytes = input.as_bytes();
    let mut out: Option<String> = None;
    let mut cursor = 0usize;
    let mut idx = 0usize;

    while idx < bytes.len() {
        if bytes[idx] != b'$' {
            idx += 1;
            continue;
        }

        let Some((name_start, name_end)) = parse_placeholder(bytes, idx) else {
            idx += 1;
            continue;
        };

        let out = out.get_or_insert_with(|| String::with_capacity(input.len()));
        out.push_str(&input[cursor..idx]);
        if let Some(value) = values.get(&input[name_start..name_end]) {
            out.push_str(value);
        }

        // name_end points at the closing brace
        cursor = name_end + 1;
        idx = cursor;
    }

    match out {
        Some(mut out) => {
            out.push_str(&input[cursor..]);
            Cow::Owned(out)
        }
        None => Cow::Borrowed(input),
    }
}

fn parse_placeholder(bytes: &[u8], start: usize) -> Option<(usize, usize)> {
    if bytes.get(start + 1) != Some(&b'{') {
        return None;
    }

    let name_start = start + 2;
    let mut name_end = name_start;
    while name_end < bytes.len() && is_word_byte(bytes[name_end]) {
        name_end += 1;
    }

    if name_end == name_start || bytes.get(name_end) != Some(&b'}') {
        return None;
    }

    Some((name_start, name_end))
}

fn is_word_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'_'
}
