/// Normalize a header field: spaces to underscores, trailing whitespace
/// stripped, lower-cased. Idempotent.
pub fn normalize_header(raw: &str) -> String {
    raw.replace(' ', "_").trim_end().to_lowercase()
}

/// Split a raw report payload into normalized headers and data rows.
///
/// The gateway emits plain comma-separated text with no quoting or escaping,
/// so this is a straight split on `\n` and `,`. A field containing a literal
/// comma will misalign its row; that matches the upstream format and is not
/// corrected here.
///
/// The last field of each data row is trailing-trimmed (the feed pads rows
/// with trailing spaces); the other fields are passed through untouched to
/// keep output byte-compatible with the source payload.
///
/// An empty or whitespace-only payload yields zero rows, which callers treat
/// as a valid empty result.
pub fn tokenize(payload: &str) -> (Vec<String>, Vec<Vec<String>>) {
    let mut lines = payload.split('\n');

    let headers: Vec<String> = match lines.next() {
        Some(header_line) => header_line.split(',').map(normalize_header).collect(),
        None => Vec::new(),
    };

    let rows: Vec<Vec<String>> = lines
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            let mut fields: Vec<String> = line.split(',').map(str::to_string).collect();
            if let Some(last) = fields.last_mut() {
                *last = last.trim_end().to_string();
            }
            fields
        })
        .collect();

    (headers, rows)
}
