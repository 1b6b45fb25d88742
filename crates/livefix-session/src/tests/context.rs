use super::*;
use crate::mutator::{ApplyOutcome, ReplaceVia};

fn two_fields() -> (Fixture, NodeId, SurfaceId) {
    let mut f = fixture();
    let root = f.session.host().root();
    let second = f.session.host_mut().add_textarea(root);
    let delta = f.session.handle_mutation(&crate::host::MutationRecord {
        added: vec![second],
        removed: vec![],
    });
    (f, second, delta.attached[0])
}

#[test]
fn test_correction_lands_in_focused_field() {
    let (mut f, second, second_id) = two_fields();
    f.type_str("நான் போறேன்", f.t0);
    f.type_into(second, "அவன் போறேன்", f.t0);
    assert_eq!(f.session.focused_surface(), Some(second_id));

    let applied = f
        .session
        .apply_correction("போறேன்", "போகிறேன்", f.t0 + ms(10));
    assert_eq!(
        applied,
        Some((
            second_id,
            ApplyOutcome::Replaced {
                start: 5,
                via: ReplaceVia::Fallback
            }
        ))
    );
    assert_eq!(f.session.host().text(second), "அவன் போகிறேன்");
    assert_eq!(f.text(), "நான் போறேன்");
    assert_eq!(f.feedback_overlays(), 1);
    assert_eq!(
        f.session.host().dispatched(second),
        vec![crate::host::ChangeEvent::Input, crate::host::ChangeEvent::Change]
    );
}

#[test]
fn test_correction_falls_back_to_other_fields() {
    let (mut f, second, second_id) = two_fields();
    f.type_str("இன்று வநக்கம் சொன்னேன்", f.t0);
    f.type_into(second, "அது", f.t0);
    let before = f.session.surface_generation(f.surface).unwrap();

    let applied = f
        .session
        .apply_correction("வநக்கம் சொன்னேன்", "வணக்கம் சொன்னேன்", f.t0);
    assert!(matches!(applied, Some((id, ApplyOutcome::Replaced { start: 6, .. })) if id == f.surface));
    assert_ne!(f.surface, second_id);
    assert_eq!(f.text(), "இன்று வணக்கம் சொன்னேன்");
    assert_eq!(f.session.surface_generation(f.surface), Some(before + 1));
}

#[test]
fn test_correction_miss_changes_nothing() {
    let (mut f, second, _) = two_fields();
    f.type_str("வநக்கம்பா", f.t0);
    f.type_into(second, "அது", f.t0);

    // Only bounded occurrences count.
    assert_eq!(f.session.apply_correction("வநக்கம்", "வணக்கம்", f.t0), None);
    assert_eq!(f.text(), "வநக்கம்பா");
    assert_eq!(f.session.host().text(second), "அது");
    assert_eq!(f.feedback_overlays(), 0);
    assert_eq!(f.session.apply_correction("  ", "x", f.t0), None);
}

#[test]
fn test_correction_supersedes_stale_accept_offsets() {
    let mut f = fixture();
    let t = f.type_and_settle("போறேன் வநக்கம் ", f.t0);
    f.respond_fallback(t);
    assert_eq!(f.state(), Some(SuggestionState::Shown));

    f.session.apply_correction("போறேன்", "போகிறேன்", t + ms(5));
    assert_eq!(f.text(), "போகிறேன் வநக்கம் ");
    // The live suggestion now relocates its word instead of trusting offsets.
    let outcome = f.session.accept(f.surface, t + ms(10));
    assert!(matches!(
        outcome,
        Some(ApplyOutcome::Replaced {
            via: ReplaceVia::Fallback,
            ..
        })
    ));
    assert_eq!(f.text(), "போகிறேன் வணக்கம் ");
}
