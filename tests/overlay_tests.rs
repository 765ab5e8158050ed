mod common;

use common::utils::{all, first, laid_out};
use page_anchor::dom::{Document, Rect};
use page_anchor::overlay::style::{LABEL_CLASS, OVERLAY_ATTR};
use page_anchor::overlay::{hex_to_rgba, FrameClock, Glow, OverlayManager, OverlayOptions, OverlaySettings};
use page_anchor::page::events::Subscriber;
use page_anchor::page::{EventHub, EventKind, EventTarget};

fn options(label: &str) -> OverlayOptions {
    OverlayOptions::new("#2196F3", Some(label.to_string()))
}

fn inputs_page(count: usize) -> Document {
    let html: String = (0..count)
        .map(|i| format!(r#"<input name="f{}">"#, i))
        .collect();
    laid_out(&html)
}

// ============================================================================
// Frame clock
// ============================================================================

#[test]
fn clock_runs_frames_immediately_and_timeouts_on_deadline() {
    let mut clock: FrameClock<&str> = FrameClock::new();
    clock.set_timeout(100, "late");
    clock.request_frame("frame");
    clock.set_timeout(50, "early");

    assert_eq!(clock.advance(10), vec!["frame"]);
    assert_eq!(clock.advance(60), vec!["early"]);
    assert_eq!(clock.pending(), 1);
    assert_eq!(clock.advance(100), vec!["late"]);
    assert_eq!(clock.pending(), 0);
}

#[test]
fn clock_cancel_and_monotonic_time() {
    let mut clock: FrameClock<u8> = FrameClock::new();
    clock.advance(500);
    let handle = clock.set_timeout(100, 1);
    assert!(clock.is_pending(handle));
    assert!(clock.cancel(handle));
    assert!(!clock.cancel(handle));

    clock.advance(200);
    assert_eq!(clock.now(), 500);

    // Deadline is relative to the clock, not to the argument of `advance`.
    clock.set_timeout(10, 2);
    assert!(clock.advance(505).is_empty());
    assert_eq!(clock.advance(510), vec![2]);
}

// ============================================================================
// Creation
// ============================================================================

#[test]
fn overlay_is_appended_to_body_with_marker_and_label() {
    let mut doc = inputs_page(1);
    let input = first(&doc, "input");
    let mut manager = OverlayManager::default();

    let node = manager.create(&mut doc, "scan-0", input, options("#0")).unwrap();

    assert_eq!(doc.parent_element(node), doc.body());
    assert!(doc.has_attr(node, OVERLAY_ATTR));
    assert_eq!(doc.closest(node, "input").unwrap(), None);

    let state = manager.get("scan-0").unwrap();
    let label = state.label_node.unwrap();
    assert!(doc.has_class(label, LABEL_CLASS));
    assert_eq!(doc.text_content(label), "#0");
    assert_eq!(state.style.rect, doc.bounding_client_rect(input));

    let css = doc.attr(node, "style").unwrap();
    assert!(css.contains("position: fixed"));
    assert!(css.contains("pointer-events: none"));
    assert!(css.contains("z-index: 2147483647"));
}

#[test]
fn creating_with_existing_id_replaces_the_overlay() {
    let mut doc = inputs_page(2);
    let inputs = all(&doc, "input");
    let mut manager = OverlayManager::default();

    manager.create(&mut doc, "highlight", inputs[0], options("a")).unwrap();
    let new = manager.create(&mut doc, "highlight", inputs[1], options("b")).unwrap();

    assert_eq!(manager.count(), 1);
    assert_eq!(all(&doc, "[data-page-anchor-id]"), vec![new]);
    assert_eq!(doc.text_content(new), "b");
    assert_eq!(manager.get("highlight").unwrap().target, inputs[1]);
}

#[test]
fn degenerate_target_uses_visible_editor_sibling() {
    let mut doc = laid_out(
        r#"<div class="wrap"><textarea name="body"></textarea><div contenteditable="true">hi</div></div>"#,
    );
    let textarea = first(&doc, "textarea");
    let editor = first(&doc, "[contenteditable]");
    doc.set_rect(textarea, Rect::default());

    let mut manager = OverlayManager::default();
    assert!(manager.create(&mut doc, "x", textarea, options("1")).is_some());
    assert_eq!(
        manager.get("x").unwrap().style.rect,
        doc.bounding_client_rect(editor)
    );
}

#[test]
fn degenerate_target_with_role_textbox_sibling() {
    let mut doc = laid_out(r#"<div><input name="q"><div role="textbox"></div></div>"#);
    let input = first(&doc, "input");
    doc.set_rect(input, Rect::default());

    let mut manager = OverlayManager::default();
    assert!(manager.create(&mut doc, "x", input, options("1")).is_some());
}

#[test]
fn invisible_target_without_stand_in_draws_nothing() {
    let mut doc = laid_out(r#"<div><input name="q"><span>plain</span></div>"#);
    let input = first(&doc, "input");
    doc.set_rect(input, Rect::default());
    let before = doc.elements().len();

    let mut manager = OverlayManager::default();
    assert_eq!(manager.create(&mut doc, "x", input, options("1")), None);
    assert_eq!(manager.count(), 0);
    assert_eq!(doc.elements().len(), before);
}

// ============================================================================
// Animation
// ============================================================================

#[test]
fn single_overlay_pulses_frame_by_frame() {
    let mut doc = inputs_page(1);
    let input = first(&doc, "input");
    let mut manager = OverlayManager::default();
    manager.create(&mut doc, "a", input, options("1"));

    assert_eq!(manager.animation_count(), 1);
    assert_eq!(manager.pending_tasks(), 1);

    manager.advance(&mut doc, 500);
    let glow = manager.get("a").unwrap().style.glow;
    assert_eq!(glow, Glow::pulse_at(500, 2000));
    assert_eq!(manager.animation_count(), 1);
    assert_eq!(manager.pending_tasks(), 1);
}

#[test]
fn exceeding_animation_limit_makes_every_overlay_static() {
    let mut doc = inputs_page(21);
    let inputs = all(&doc, "input");
    let mut manager = OverlayManager::default();

    for (i, input) in inputs.iter().take(20).enumerate() {
        manager.create(&mut doc, &format!("scan-{}", i), *input, options("n"));
    }
    assert_eq!(manager.animation_count(), 20);

    manager.create(&mut doc, "scan-20", inputs[20], options("n"));
    assert_eq!(manager.count(), 21);
    assert_eq!(manager.animation_count(), 0);
    assert_eq!(manager.pending_tasks(), 0);
    for id in manager.ids() {
        assert_eq!(
            manager.get(id).unwrap().style.glow,
            Glow::Static { blur: 20.0 },
            "{} should be static",
            id
        );
    }

    manager.remove_overlay(&mut doc, "scan-20");
    assert_eq!(manager.animation_count(), 20);
    assert!(manager.get("scan-0").unwrap().style.glow.is_animated());
}

#[test]
fn animation_limit_is_configurable() {
    let mut doc = inputs_page(3);
    let inputs = all(&doc, "input");
    let mut manager = OverlayManager::new(OverlaySettings {
        animation_limit: 2,
        ..OverlaySettings::default()
    });
    for (i, input) in inputs.iter().enumerate() {
        manager.create(&mut doc, &i.to_string(), *input, options("n"));
    }
    assert_eq!(manager.animation_count(), 0);
}

// ============================================================================
// Updates and removal
// ============================================================================

#[test]
fn positions_follow_scroll_and_hide_lost_targets() {
    let mut doc = inputs_page(2);
    let inputs = all(&doc, "input");
    let mut manager = OverlayManager::default();
    manager.create(&mut doc, "a", inputs[0], options("a"));
    manager.create(&mut doc, "b", inputs[1], options("b"));
    let y_before = manager.get("a").unwrap().style.rect.y;

    doc.scroll_window_to(0.0, 100.0);
    assert_eq!(manager.update_all_positions(&mut doc), 0);
    assert_eq!(manager.get("a").unwrap().style.rect.y, y_before - 100.0);

    doc.set_rect(inputs[1], Rect::default());
    assert_eq!(manager.update_all_positions(&mut doc), 1);
    let hidden = manager.get("b").unwrap();
    assert!(!hidden.style.visible);
    assert!(doc.attr(hidden.node, "style").unwrap().contains("display: none"));
    assert_eq!(manager.count(), 2);
}

#[test]
fn recolouring_updates_label_and_state() {
    let mut doc = inputs_page(1);
    let input = first(&doc, "input");
    let mut manager = OverlayManager::default();
    manager.create(&mut doc, "a", input, options("1"));

    assert!(manager.update_overlay_color(&mut doc, "a", "#4CAF50"));
    assert!(!manager.update_overlay_color(&mut doc, "missing", "#4CAF50"));

    let state = manager.get("a").unwrap();
    assert_eq!(state.style.color, "#4CAF50");
    assert_eq!(state.options.color, "#4CAF50");
    let label_css = doc.attr(state.label_node.unwrap(), "style").unwrap();
    assert!(label_css.contains("#4CAF50"));
    assert_eq!(manager.animation_count(), 1);
}

#[test]
fn scheduled_removal_fires_on_deadline() {
    let mut doc = inputs_page(1);
    let input = first(&doc, "input");
    let mut manager = OverlayManager::default();
    let node = manager.create(&mut doc, "highlight", input, options("h")).unwrap();

    assert!(manager.schedule_removal("highlight", 1000).is_some());
    assert!(manager.schedule_removal("nope", 1000).is_none());

    manager.advance(&mut doc, 999);
    assert_eq!(manager.count(), 1);
    manager.advance(&mut doc, 1000);
    assert_eq!(manager.count(), 0);
    assert!(!doc.is_connected(node));
    assert_eq!(manager.pending_tasks(), 0);
}

#[test]
fn clear_all_cancels_every_handle() {
    let mut doc = inputs_page(3);
    let inputs = all(&doc, "input");
    let mut manager = OverlayManager::default();
    for (i, input) in inputs.iter().enumerate() {
        manager.create(&mut doc, &i.to_string(), *input, options("n"));
    }
    manager.schedule_removal("0", 500);

    manager.clear_all(&mut doc);
    assert_eq!(manager.count(), 0);
    assert_eq!(manager.animation_count(), 0);
    assert_eq!(manager.pending_tasks(), 0);
    assert!(doc.query_selector_all(None, "[data-page-anchor-overlay]").unwrap().is_empty());
}

#[test]
fn repeated_create_and_clear_cycles_keep_the_arena_flat() {
    let mut doc = inputs_page(5);
    let inputs = all(&doc, "input");
    let baseline = doc.live_node_count();
    let mut manager = OverlayManager::default();

    let mut sizes = Vec::new();
    for _ in 0..50 {
        for (i, input) in inputs.iter().enumerate() {
            manager.create(&mut doc, &format!("scan-{}", i), *input, options("n"));
        }
        manager.remove_overlay(&mut doc, "scan-0");
        manager.clear_all(&mut doc);
        sizes.push(doc.arena_len());
        assert_eq!(doc.live_node_count(), baseline);
    }

    assert!(sizes.windows(2).all(|w| w[0] == w[1]));
}

// ============================================================================
// Event subscription
// ============================================================================

#[test]
fn init_subscribes_once_and_destroy_unsubscribes() {
    let mut doc = inputs_page(1);
    let input = first(&doc, "input");
    let mut hub = EventHub::new();
    let mut manager = OverlayManager::default();

    manager.init(&mut hub);
    manager.init(&mut hub);
    assert_eq!(hub.listener_count(), 2);

    manager.create(&mut doc, "a", input, options("1"));
    manager.destroy(&mut doc, &mut hub);
    assert_eq!(hub.listener_count(), 0);
    assert_eq!(manager.count(), 0);
}

#[test]
fn nested_scroll_reaches_only_capture_listeners() {
    let doc = inputs_page(1);
    let input = first(&doc, "input");
    let mut hub = EventHub::new();
    hub.add_listener(EventKind::Scroll, Subscriber::OverlayPositions, false);

    assert!(hub.dispatch(EventKind::Scroll, EventTarget::Element(input)).is_empty());
    assert_eq!(hub.dispatch(EventKind::Scroll, EventTarget::Window).len(), 1);

    let mut manager = OverlayManager::default();
    manager.init(&mut hub);
    assert_eq!(
        hub.dispatch(EventKind::Scroll, EventTarget::Element(input)),
        vec![Subscriber::OverlayPositions]
    );
    assert_eq!(hub.dispatch(EventKind::Resize, EventTarget::Window).len(), 1);
}

#[test]
fn hex_colours_expand_to_rgba() {
    assert_eq!(hex_to_rgba("#2196F3", 0.5), "rgba(33, 150, 243, 0.5)");
    assert_eq!(hex_to_rgba("#fff", 1.0), "rgba(255, 255, 255, 1)");
}
