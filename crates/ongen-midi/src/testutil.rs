//! Byte-level SMF builders for tests.

/// Variable-length quantity encoding of `value`.
pub(crate) fn vlq(mut value: u32) -> Vec<u8> {
    let mut out = vec![(value & 0x7f) as u8];
    value >>= 7;
    while value > 0 {
        out.insert(0, (value & 0x7f) as u8 | 0x80);
        value >>= 7;
    }
    out
}

/// One track event: delta time followed by raw event bytes.
pub(crate) fn event(delta: u32, bytes: &[u8]) -> Vec<u8> {
    let mut out = vlq(delta);
    out.extend_from_slice(bytes);
    out
}

/// A marker meta event carrying `text`.
pub(crate) fn marker(delta: u32, text: &[u8]) -> Vec<u8> {
    let mut body = vec![0xff, 0x06, text.len() as u8];
    body.extend_from_slice(text);
    event(delta, &body)
}

/// A tempo meta event in microseconds per quarter note.
pub(crate) fn tempo(delta: u32, micros: u32) -> Vec<u8> {
    let [_, a, b, c] = micros.to_be_bytes();
    event(delta, &[0xff, 0x51, 0x03, a, b, c])
}

/// A complete file; each track body gets an end-of-track event appended.
pub(crate) fn smf(ticks_per_beat: u16, tracks: &[Vec<u8>]) -> Vec<u8> {
    let format: u16 = if tracks.len() == 1 { 0 } else { 1 };
    let mut out = b"MThd".to_vec();
    out.extend_from_slice(&6u32.to_be_bytes());
    out.extend_from_slice(&format.to_be_bytes());
    out.extend_from_slice(&(tracks.len() as u16).to_be_bytes());
    out.extend_from_slice(&ticks_per_beat.to_be_bytes());
    for track in tracks {
        let mut body = track.clone();
        body.extend_from_slice(&[0x00, 0xff, 0x2f, 0x00]);
        out.extend_from_slice(b"MTrk");
        out.extend_from_slice(&(body.len() as u32).to_be_bytes());
        out.extend_from_slice(&body);
    }
    out
}

#[test]
fn test_vlq() {
    assert_eq!(vlq(0), vec![0x00]);
    assert_eq!(vlq(0x7f), vec![0x7f]);
    assert_eq!(vlq(0x80), vec![0x81, 0x00]);
    assert_eq!(vlq(0x3fff), vec![0xff, 0x7f]);
}
