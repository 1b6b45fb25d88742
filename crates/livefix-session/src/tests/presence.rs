use super::*;
use crate::host::MutationRecord;

fn indicators(f: &Fixture) -> Vec<SurfaceId> {
    f.session
        .host()
        .overlays()
        .filter_map(|v| match v.content {
            OverlayContent::ScriptIndicator { surface } => Some(surface),
            _ => None,
        })
        .collect()
}

#[test]
fn test_indicator_follows_field_text() {
    let mut f = fixture();
    f.type_str("hello", f.t0);
    assert!(indicators(&f).is_empty());

    f.type_str(" அ", f.t0);
    assert_eq!(indicators(&f), vec![f.surface]);
    assert!(f.session.has_indicator(f.surface));
    // Still one badge after more typing.
    f.type_str("து", f.t0);
    assert_eq!(indicators(&f).len(), 1);

    for _ in 0..3 {
        let ev = f.session.host_mut().backspace(f.input);
        f.session.handle_input(f.input, &ev, f.t0);
    }
    assert_eq!(f.text(), "hello ");
    assert!(indicators(&f).is_empty());
}

#[test]
fn test_indicator_for_prefilled_fields() {
    let mut page = MemoryPage::new();
    let root = page.root();
    let input = page.add_text_input(root, "text");
    page.set_value_and_cursor(input, "வணக்கம்", 7);
    page.add_editable(root, &["plain"]);
    let mut session = CorrectionSession::new(page, Settings::default());
    let ids = session.install(root);
    assert!(session.has_indicator(ids[0]));
    assert!(!session.has_indicator(ids[1]));

    let late = session.host_mut().add_editable(root, &["அது"]);
    let delta = session.handle_mutation(&MutationRecord {
        added: vec![late],
        removed: vec![],
    });
    assert!(session.has_indicator(delta.attached[0]));
}

#[test]
fn test_indicator_removed_on_detach() {
    let mut f = fixture();
    f.type_str("அது", f.t0);
    f.session.host_mut().remove(f.input);
    f.session.handle_mutation(&MutationRecord {
        added: vec![],
        removed: vec![f.input],
    });
    assert!(!f.session.has_indicator(f.surface));
    assert_eq!(f.session.host().overlay_count(), 0);
}

#[test]
fn test_indicator_hidden_while_disabled() {
    let mut f = fixture();
    f.type_str("அது", f.t0);
    f.session.set_enabled(false);
    assert!(indicators(&f).is_empty());
    f.type_str(" இது", f.t0);
    assert!(indicators(&f).is_empty());

    f.session.set_enabled(true);
    assert_eq!(indicators(&f), vec![f.surface]);
}

#[test]
fn test_indicator_removed_on_teardown() {
    let mut f = fixture();
    f.type_str("அது", f.t0);
    f.session.teardown();
    assert_eq!(f.session.host().overlay_count(), 0);
    assert!(!f.session.has_indicator(f.surface));
}

#[test]
fn test_selected_tamil_text() {
    let mut f = fixture();
    f.type_str("hello  நான் போறேன் ", f.t0);
    assert_eq!(f.session.selected_target_text(f.surface), None);

    f.session.host_mut().select(f.input, 5, 12);
    assert_eq!(
        f.session.selected_target_text(f.surface).as_deref(),
        Some("நான்")
    );

    // Latin-only selections are not relayed.
    f.session.host_mut().select(f.input, 0, 5);
    assert_eq!(f.session.selected_target_text(f.surface), None);
}

#[test]
fn test_selected_text_in_editable_region() {
    let mut page = MemoryPage::new();
    let root = page.root();
    let region = page.add_editable(root, &["அது ", "இது"]);
    let mut session = CorrectionSession::new(page, Settings::default());
    let surface = session.install(root)[0];
    // Spans both text nodes.
    session.host_mut().select(region, 0, 7);
    assert_eq!(
        session.selected_target_text(surface).as_deref(),
        Some("அது இது")
    );
}
