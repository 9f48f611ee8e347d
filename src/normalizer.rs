//! Text normalization shared by the index builder and the query processor.
//!
//! Indexing and querying must see exactly the same term forms, so both go
//! through [`normalize`]. The term alphabet is lowercase ASCII letters and
//! digits; hyphens join their surrounding fragments into one term.

/// Named character references expanded before any other processing.
/// Unknown references are left as-is.
const ENTITIES: [(&str, char); 5] = [
    ("&amp;", '&'),
    ("&lt;", '<'),
    ("&gt;", '>'),
    ("&quot;", '"'),
    ("&apos;", '\''),
];

/// Expands the known named character references in a single pass, so an
/// expansion is never re-interpreted as the start of another reference.
fn expand_entities(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        match ENTITIES.iter().find(|(name, _)| tail.starts_with(name)) {
            Some((name, expansion)) => {
                out.push(*expansion);
                rest = &tail[name.len()..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Maps a raw text body to its ordered term sequence.
///
/// Character references are expanded, ASCII letters are folded to lowercase,
/// and every character outside the term alphabet is deleted. Deleting (rather
/// than blanking) means hyphenated and punctuated fragments fuse:
/// `state-of-the-art` becomes the single term `stateoftheart`. The remainder
/// is split on whitespace runs; empty fragments are dropped.
pub fn normalize(text: &str) -> Vec<String> {
    let expanded = expand_entities(text);

    let mut scrubbed = String::with_capacity(expanded.len());
    for c in expanded.chars() {
        if c.is_ascii_alphanumeric() {
            scrubbed.push(c.to_ascii_lowercase());
        } else if c.is_whitespace() {
            scrubbed.push(' ');
        }
        // anything else, hyphens included, is deleted
    }

    scrubbed.split_whitespace().map(str::to_owned).collect()
}
