#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum State {
    Normal,
    Quoted(u8),
}

impl State {
    /// Advance the quote state over byte `b`. Returns `true` when `b` opened or closed a region.
    pub(super) fn step(&mut self, b: u8) -> bool {
        match *self {
            State::Quoted(quote) if b == quote => {
                *self = State::Normal;
                true
            }
            State::Normal if is_quote(b) => {
                *self = State::Quoted(b);
                true
            }
            _ => false,
        }
    }
}

fn is_quote(b: u8) -> bool {
    matches!(b, b'\'' | b'"' | b'`')
}

pub(super) fn is_placeholder_start(bytes: &[u8], idx: usize) -> bool {
    bytes.get(idx) == Some(&b'$') && bytes.get(idx + 1) == Some(&b'(')
}

/// Find the `)` closing the placeholder whose key starts at `start`.
pub(super) fn scan_key_end(bytes: &[u8], start: usize) -> Option<usize> {
    bytes
        .get(start..)?
        .iter()
        .position(|&b| b == b')')
        .map(|offset| start + offset)
}
