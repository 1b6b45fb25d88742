use super::*;
use crate::host::PageDom;
use crate::mutator::ApplyOutcome;

fn editable_fixture(parts: &[&str]) -> Fixture {
    let mut page = MemoryPage::new();
    let root = page.root();
    let region = page.add_editable(root, parts);
    page.set_measure_char_width(Some(10.0));
    let mut session = CorrectionSession::new(page, Settings::default());
    let surface = session.install(root)[0];
    Fixture {
        session,
        input: region,
        surface,
        t0: Instant::now(),
    }
}

#[test]
fn test_editable_region_round_trip() {
    let mut f = editable_fixture(&["<b>", ""]);
    f.session.host_mut().set_cursor(f.input, 3);
    let t = f.type_and_settle("வநக்கம் ", f.t0);
    f.respond_fallback(t);
    assert_eq!(f.state(), Some(SuggestionState::Shown));

    assert!(matches!(
        f.session.accept(f.surface, t),
        Some(ApplyOutcome::Replaced { start: 3, .. })
    ));
    assert_eq!(f.text(), "<b>வணக்கம் ");
    assert_eq!(f.session.host().cursor(f.input), 10);
}

#[test]
fn test_overlay_anchors_to_word_in_region() {
    let mut f = editable_fixture(&["அது ", ""]);
    let t = f.type_and_settle("வநக்கம் ", f.t0);
    f.respond_fallback(t);
    let view = f
        .session
        .host()
        .overlays()
        .find(|v| matches!(v.content, OverlayContent::Suggestion { .. }))
        .cloned()
        .unwrap();
    // Region box starts at 20; the word starts after four 10 px chars.
    assert_eq!(view.placement.anchor.left, 60.0);
    assert_eq!(view.placement.anchor.width, 70.0);
    match view.content {
        OverlayContent::Suggestion {
            original,
            corrected,
            ..
        } => {
            assert_eq!(original, "வநக்கம்");
            assert_eq!(corrected, "வணக்கம்");
        }
        other => panic!("unexpected overlay {other:?}"),
    }
    // Text nodes were not merged by typing.
    assert_eq!(f.session.host().text_nodes(f.input).len(), 2);
}
