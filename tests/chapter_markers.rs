//! Chapter marker timing and metadata rendering through the public API.

use bookvox::encode::{build_markers, write_ffmetadata};

#[test]
fn two_measured_sections_round_trip_into_markers() {
    // Durations measured from the cow-bell and rooster fixtures.
    let markers = build_markers(&[
        ("Cow".to_string(), 2115),
        ("Rooster".to_string(), 1800),
    ]);

    assert_eq!(markers.len(), 2);

    assert_eq!(markers[0].title, "Cow");
    assert_eq!(markers[0].start_ms, 0);
    assert_eq!(markers[0].end_ms, 2115);

    // Displayed start sits 500ms before the true boundary; the end is the
    // unmodified cumulative boundary.
    assert_eq!(markers[1].title, "Rooster");
    assert_eq!(markers[1].start_ms, 1615);
    assert_eq!(markers[1].end_ms, 3915);
}

#[test]
fn untitled_sections_get_positional_names() {
    let markers = build_markers(&[(String::new(), 900), ("  ".to_string(), 1100)]);

    assert_eq!(markers[0].title, "Chapter 1");
    assert_eq!(markers[1].title, "Chapter 2");
}

#[test]
fn metadata_document_is_player_compatible() {
    let markers = build_markers(&[
        ("Cow".to_string(), 2115),
        ("Rooster".to_string(), 1800),
    ]);

    let mut rendered = Vec::new();
    write_ffmetadata(&mut rendered, &markers).unwrap();
    let text = String::from_utf8(rendered).unwrap();

    // Fixed header token, then one chapter block per surviving section with
    // a millisecond timebase.
    assert!(text.starts_with(";FFMETADATA1\n"));
    assert_eq!(text.matches("[CHAPTER]").count(), 2);
    assert_eq!(text.matches("TIMEBASE=1/1000").count(), 2);
    assert!(text.contains("START=0\nEND=2115\ntitle=Cow"));
    assert!(text.contains("START=1615\nEND=3915\ntitle=Rooster"));
}
