use news_core::SentimentReport;

const SECTIONS: usize = 4;

/// Split a model response into the four report sections.
///
/// A marker is a section digit at a token boundary, a `.` not followed by
/// another digit, an optional label on the same line, then `:`. A label that
/// reaches another section marker before its colon does not count. Markers are
/// located in ascending order. A section runs from its colon to the next
/// later-numbered `N.` (labelled or not), or to the end of the text. Missing
/// markers and blank sections come back as `None`.
pub fn parse_report(text: &str) -> SentimentReport {
    // Byte offset just past each located marker's colon
    let mut bodies: [Option<usize>; SECTIONS] = [None; SECTIONS];
    let mut cursor = 0;

    for (index, slot) in bodies.iter_mut().enumerate() {
        if let Some(body_start) = find_marker(text, b'1' + index as u8, cursor) {
            cursor = body_start;
            *slot = Some(body_start);
        }
    }

    let section = |index: usize| -> Option<String> {
        let start = bodies[index]?;
        let end = next_boundary(text, index, start);
        clean_section(&text[start..end])
    };

    SentimentReport {
        summary: section(0),
        advice: section(1),
        outlook: section(2),
        sentiment: section(3),
    }
}

fn find_marker(text: &str, digit: u8, from: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut i = from;

    while i < bytes.len() {
        if bytes[i] == digit && is_marker_at(text, i) {
            if let Some(colon) = label_end(text, i + 2) {
                return Some(colon + 1);
            }
        }
        i += 1;
    }

    None
}

/// Offset of the first later section number after `from`, colon or not.
fn next_boundary(text: &str, index: usize, from: usize) -> usize {
    let bytes = text.as_bytes();
    let first_later = b'1' + index as u8 + 1;

    (from..bytes.len())
        .find(|&pos| (first_later..=b'4').contains(&bytes[pos]) && is_marker_at(text, pos))
        .unwrap_or(text.len())
}

/// `digit` at `i` starts a token and is followed by a `.` that is not a
/// decimal point.
fn is_marker_at(text: &str, i: usize) -> bool {
    let bytes = text.as_bytes();
    let boundary = text[..i]
        .chars()
        .next_back()
        .map_or(true, |c| !c.is_alphanumeric() && c != '.');
    let dot = bytes.get(i + 1) == Some(&b'.');
    let decimal = bytes.get(i + 2).is_some_and(|b| b.is_ascii_digit());

    boundary && dot && !decimal
}

/// Index of the colon closing the label, if it sits on the marker's line
/// and no other section marker comes first.
fn label_end(text: &str, from: usize) -> Option<usize> {
    let bytes = text.as_bytes();

    for (pos, &b) in bytes.iter().enumerate().skip(from) {
        match b {
            b':' => return Some(pos),
            b'\n' => return None,
            b'1'..=b'4' if is_marker_at(text, pos) => return None,
            _ => {}
        }
    }

    None
}

/// Trim, then drop markdown bold delimiters left around the section.
fn clean_section(raw: &str) -> Option<String> {
    let mut cleaned = raw.trim();
    for delimiter in ["**", "__"] {
        cleaned = cleaned.strip_prefix(delimiter).unwrap_or(cleaned).trim_start();
        cleaned = cleaned.strip_suffix(delimiter).unwrap_or(cleaned).trim_end();
    }

    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned.to_string())
    }
}
