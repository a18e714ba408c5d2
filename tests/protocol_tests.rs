// Integration tests for the event wire protocol.
//
// The reader must produce the same ordered event sequence no matter
// how the transport chunks the bytes.

use avatar_chat::expression::Expression;
use avatar_chat::protocol::{Event, Frame, FrameReader};

fn sample_stream() -> Vec<Event> {
    vec![
        Event::Text("G'day".to_string()),
        Event::Text(" mate".to_string()),
        Event::Expression(Expression::Smile),
        Event::AudioStart,
        Event::Audio("c29tZSBhdWRpbw==".to_string()),
        Event::Done,
    ]
}

fn encode_all(events: &[Event]) -> Vec<u8> {
    events.iter().map(|e| e.encode()).collect::<String>().into_bytes()
}

fn parse_all(reader: &mut FrameReader, chunks: &[&[u8]]) -> Vec<Event> {
    let mut events = Vec::new();
    for chunk in chunks {
        for frame in reader.push(chunk) {
            if let Some(event) = Event::from_frame(&frame) {
                events.push(event);
            }
        }
    }
    events
}

#[test]
fn whole_stream_parses_in_order() {
    let events = sample_stream();
    let bytes = encode_all(&events);

    let mut reader = FrameReader::new();
    let parsed = parse_all(&mut reader, &[&bytes]);

    assert_eq!(parsed, events);
    assert!(reader.pending().is_empty());
}

#[test]
fn every_split_boundary_yields_identical_events() {
    let events = sample_stream();
    let bytes = encode_all(&events);

    for split in 0..=bytes.len() {
        let mut reader = FrameReader::new();
        let parsed = parse_all(&mut reader, &[&bytes[..split], &bytes[split..]]);
        assert_eq!(parsed, events, "diverged when split at byte {}", split);
    }
}

#[test]
fn byte_at_a_time_yields_identical_events() {
    let events = sample_stream();
    let bytes = encode_all(&events);

    let mut reader = FrameReader::new();
    let mut parsed = Vec::new();
    for byte in &bytes {
        for frame in reader.push(std::slice::from_ref(byte)) {
            if let Some(event) = Event::from_frame(&frame) {
                parsed.push(event);
            }
        }
    }

    assert_eq!(parsed, events);
}

#[test]
fn multibyte_payload_survives_every_split() {
    let events = vec![
        Event::Text("G\u{2019}day \u{1F98A}".to_string()),
        Event::Done,
    ];
    let bytes = encode_all(&events);

    for split in 0..=bytes.len() {
        let mut reader = FrameReader::new();
        let parsed = parse_all(&mut reader, &[&bytes[..split], &bytes[split..]]);
        assert_eq!(parsed, events, "diverged when split at byte {}", split);
    }
}

#[test]
fn multiline_text_survives_framing() {
    let events = vec![
        Event::Text("G'day.\n\nDuck pancakes.".to_string()),
        Event::Text("back\\slash and\r\nCRLF".to_string()),
        Event::Done,
    ];
    let bytes = encode_all(&events);

    // The payload's own line breaks must never terminate a frame.
    for split in 0..=bytes.len() {
        let mut reader = FrameReader::new();
        let parsed = parse_all(&mut reader, &[&bytes[..split], &bytes[split..]]);
        assert_eq!(parsed, events, "diverged when split at byte {}", split);
    }
}

#[test]
fn unknown_event_names_are_skipped_by_typing() {
    let mut reader = FrameReader::new();
    let frames = reader.push(b"event: heartbeat\ndata: x\n\nevent: done\ndata: \n\n");
    assert_eq!(frames.len(), 2);

    let typed: Vec<Event> = frames.iter().filter_map(Event::from_frame).collect();
    assert_eq!(typed, vec![Event::Done]);
}

#[test]
fn frame_without_event_line_defaults_to_generic() {
    let mut reader = FrameReader::new();
    let frames = reader.push(b"data: ping\n\n");
    assert_eq!(
        frames,
        vec![Frame {
            event: "message".to_string(),
            data: "ping".to_string(),
        }]
    );
    assert!(Event::from_frame(&frames[0]).is_none());
}

#[test]
fn expression_event_round_trips_label() {
    let mut reader = FrameReader::new();
    let frames = reader.push(Event::Expression(Expression::Angry).encode().as_bytes());
    assert_eq!(
        Event::from_frame(&frames[0]),
        Some(Event::Expression(Expression::Angry))
    );
}

#[test]
fn unknown_expression_label_falls_back_to_default() {
    let mut reader = FrameReader::new();
    let frames = reader.push(b"event: expression\ndata: bewildered\n\n");
    assert_eq!(
        Event::from_frame(&frames[0]),
        Some(Event::Expression(Expression::Smile))
    );
}
