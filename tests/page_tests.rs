mod common;

use common::utils::{city_form, entry, first, laid_out};
use page_anchor::channel::{LocalChannel, PageChannel};
use page_anchor::dom::PageSnapshot;
use page_anchor::error::ChannelError;
use page_anchor::page::message::{GET_OVERLAYS, RESIZE, SCROLL, TICK};
use page_anchor::page::{ContextSettings, Message, PageContext, Response};
use page_anchor::resolve::FoundBy;
use page_anchor::screen::ElementType;
use serde_json::{json, Value};

fn city_context() -> PageContext {
    PageContext::new(
        laid_out(&city_form("f_1", "f_2")),
        ContextSettings::default(),
    )
}

fn city_channel() -> LocalChannel {
    LocalChannel::new(city_context())
}

fn overlay_ids(channel: &LocalChannel) -> Vec<String> {
    channel
        .context()
        .unwrap()
        .overlays()
        .ids()
        .map(str::to_string)
        .collect()
}

fn tick(channel: &mut LocalChannel, now: u64) -> Value {
    channel.request(&Message::new(TICK, json!({ "now": now }))).unwrap()
}

// ============================================================================
// Scan / save / extract
// ============================================================================

#[test]
fn scan_draws_numbered_overlays() {
    let mut channel = city_channel();
    let scanned = channel.scan_all().unwrap();

    assert_eq!(scanned.len(), 2);
    assert_eq!(scanned[0].index, 0);
    assert_eq!(scanned[1].label.as_deref(), Some("Billing City"));
    assert_eq!(overlay_ids(&channel), vec!["scan-0", "scan-1"]);

    let overlays = channel.context().unwrap().overlays();
    assert_eq!(overlays.get("scan-1").unwrap().options.label.as_deref(), Some("#1"));
    assert_eq!(overlays.get("scan-0").unwrap().options.color, "#00bfff");
}

#[test]
fn rescanning_replaces_the_previous_generation() {
    let mut channel = city_channel();
    channel.scan_all().unwrap();
    let again = channel.scan_all().unwrap();
    assert_eq!(again.len(), 2);
    assert_eq!(channel.context().unwrap().overlays().count(), 2);
}

#[test]
fn save_recolours_chosen_overlays_and_skips_unknown_indexes() {
    let mut channel = city_channel();
    channel.scan_all().unwrap();

    let saved = channel.save_by_indexes(&[1, 7]).unwrap();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].index, 1);
    assert_eq!(saved[0].fallback_name.as_deref(), Some("city"));

    let context = channel.context().unwrap();
    assert_eq!(context.saved_config().len(), 1);
    assert_eq!(context.overlays().get("scan-1").unwrap().options.color, "#4caf50");
    assert_eq!(context.overlays().get("scan-0").unwrap().options.color, "#00bfff");
}

#[test]
fn save_without_payload_saves_nothing() {
    let mut channel = city_channel();
    channel.scan_all().unwrap();
    let reply = channel.request(&Message::bare("SAVE_BY_INDEXES")).unwrap();
    assert_eq!(reply, json!([]));
}

#[test]
fn extract_replaces_scan_overlays_with_result_overlays() {
    let mut channel = city_channel();
    channel.scan_all().unwrap();
    let config = channel.save_by_indexes(&[0, 1]).unwrap();

    let results = channel.extract_by_config(&config).unwrap();
    let values: Vec<&str> = results.iter().map(|r| r.value.as_str()).collect();
    assert_eq!(values, vec!["Hangzhou", "Shanghai"]);
    assert!(results.iter().all(|r| r.found_by == FoundBy::ContainerLabel));

    assert_eq!(overlay_ids(&channel), vec!["extract-0", "extract-1"]);
    let overlays = channel.context().unwrap().overlays();
    assert_eq!(
        overlays.get("extract-1").unwrap().options.label.as_deref(),
        Some("\u{2713}1")
    );
}

#[test]
fn extract_with_empty_config_keeps_overlays() {
    let mut channel = city_channel();
    channel.scan_all().unwrap();
    assert!(channel.extract_by_config(&[]).unwrap().is_empty());
    assert_eq!(channel.context().unwrap().overlays().count(), 2);
}

#[test]
fn replica_data_over_the_channel() {
    let mut channel = city_channel();
    channel.scan_all().unwrap();
    let config = channel.save_by_indexes(&[1]).unwrap();

    let replica = channel.generate_replica_data(&config).unwrap();
    assert_eq!(replica.len(), 1);
    assert_eq!(replica[0].value, "Shanghai");
    assert_eq!(replica[0].element_type, ElementType::Input);
    assert!(replica[0].x > 0.0 && replica[0].x < 1.0);
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn unknown_message_type_is_an_error_reply() {
    let mut context = city_context();
    let response = context.handle(&Message::bare("DANCE"));
    assert_eq!(
        response,
        Response::Error("Unknown message type: DANCE".to_string())
    );
    assert_eq!(
        response.into_json(),
        json!({ "error": "Unknown message type: DANCE" })
    );
}

#[test]
fn error_reply_becomes_remote_channel_error() {
    let mut channel = city_channel();
    match channel.request(&Message::bare("DANCE")) {
        Err(ChannelError::Remote { message, error }) => {
            assert_eq!(message, "DANCE");
            assert_eq!(error, "Unknown message type: DANCE");
        }
        other => panic!("expected remote error, got {:?}", other),
    }
}

#[test]
fn malformed_payload_is_reported_not_panicked() {
    let mut context = city_context();
    let response = context.handle(&Message::bare("HIGHLIGHT_BY_CONFIG_ENTRY"));
    assert!(response.is_error());

    let response = context.handle(&Message::new(SCROLL, json!({ "node": 9999, "x": 0, "y": 0 })));
    assert_eq!(response, Response::Error("no element with node id 9999".to_string()));
}

#[test]
fn destroyed_context_rejects_requests() {
    let mut channel = city_channel();
    channel.scan_all().unwrap();
    channel.destroy();

    assert!(channel.context().is_none());
    assert!(matches!(
        channel.scan_all(),
        Err(ChannelError::ContextDestroyed(_))
    ));
}

// ============================================================================
// Highlights and time
// ============================================================================

#[test]
fn index_highlight_expires_after_one_second() {
    let mut channel = city_channel();
    channel.scan_all().unwrap();
    channel.highlight_by_index(0).unwrap();
    assert!(overlay_ids(&channel).contains(&"highlight".to_string()));

    tick(&mut channel, 999);
    assert!(overlay_ids(&channel).contains(&"highlight".to_string()));
    assert_eq!(tick(&mut channel, 1000), json!({ "now": 1000 }));
    assert!(!overlay_ids(&channel).contains(&"highlight".to_string()));
    assert_eq!(channel.context().unwrap().overlays().count(), 2);
}

#[test]
fn highlight_of_unknown_index_is_ignored() {
    let mut channel = city_channel();
    channel.highlight_by_index(5).unwrap();
    assert_eq!(channel.context().unwrap().overlays().count(), 0);
}

#[test]
fn entry_highlight_resolves_afresh_and_expires_after_two_seconds() {
    let mut channel = city_channel();
    let mut saved = entry(ElementType::Input, "#gone");
    saved.fallback_name = Some("city".into());
    saved.label = Some("Billing City".into());

    channel.highlight_by_config_entry(3, &saved).unwrap();
    let context = channel.context().unwrap();
    let state = context.overlays().get("highlight-entry").unwrap();
    assert_eq!(state.target, first(context.document(), "#f_2"));
    assert_eq!(state.options.label.as_deref(), Some("\u{2713}3"));

    tick(&mut channel, 1999);
    assert_eq!(overlay_ids(&channel), vec!["highlight-entry"]);
    tick(&mut channel, 2000);
    assert!(overlay_ids(&channel).is_empty());
}

#[test]
fn clear_highlight_removes_everything() {
    let mut channel = city_channel();
    channel.scan_all().unwrap();
    channel.highlight_by_index(1).unwrap();
    channel.clear_highlight().unwrap();

    let overlays = channel.context().unwrap().overlays();
    assert_eq!(overlays.count(), 0);
    assert_eq!(overlays.pending_tasks(), 0);
}

// ============================================================================
// Page lifecycle and events
// ============================================================================

#[test]
fn loading_a_page_drops_the_scan_generation() {
    let mut channel = city_channel();
    channel.scan_all().unwrap();

    let snapshot = PageSnapshot {
        html: r#"<input name="other">"#.to_string(),
        ..Default::default()
    };
    channel.load_page(&snapshot).unwrap();

    let context = channel.context().unwrap();
    assert!(context.scanned().is_empty());
    assert_eq!(context.overlays().count(), 0);
    assert!(context.document().query_selector(None, "[name=other]").unwrap().is_some());

    channel.highlight_by_index(0).unwrap();
    assert_eq!(channel.context().unwrap().overlays().count(), 0);
}

#[test]
fn window_scroll_moves_overlays() {
    let mut channel = city_channel();
    channel.scan_all().unwrap();
    let before = channel.context().unwrap().overlays().get("scan-0").unwrap().style.rect.y;

    channel
        .request(&Message::new(SCROLL, json!({ "x": 0, "y": 50 })))
        .unwrap();
    let after = channel.context().unwrap().overlays().get("scan-0").unwrap().style.rect.y;
    assert_eq!(after, before - 50.0);
}

#[test]
fn nested_container_scroll_moves_overlays_inside_it() {
    let mut channel = city_channel();
    channel.scan_all().unwrap();

    let context = channel.context().unwrap();
    let doc = context.document();
    let form = first(doc, "form");
    let before = context.overlays().get("scan-1").unwrap().style.rect.y;

    channel
        .request(&Message::new(SCROLL, json!({ "node": form, "x": 0, "y": 20 })))
        .unwrap();
    let after = channel.context().unwrap().overlays().get("scan-1").unwrap().style.rect.y;
    assert_eq!(after, before - 20.0);
}

#[test]
fn scroll_takes_the_node_handle_extraction_returns() {
    let mut channel = city_channel();
    channel.scan_all().unwrap();
    let config = channel.save_by_indexes(&[0]).unwrap();
    let results = channel.extract_by_config(&config).unwrap();
    let input = results[0].element.node;

    channel
        .request(&Message::new(SCROLL, json!({ "node": input, "x": 0, "y": 5 })))
        .unwrap();
    let doc = channel.context().unwrap().document();
    assert_eq!(doc.layout().element_scroll(input).y, 5.0);

    // The document root is a node but not an element.
    let root = doc.root();
    match channel.request(&Message::new(SCROLL, json!({ "node": root, "x": 0, "y": 0 }))) {
        Err(ChannelError::Remote { error, .. }) => {
            assert_eq!(error, format!("no element with node id {}", root.0));
        }
        other => panic!("expected remote error, got {:?}", other),
    }
}

#[test]
fn resize_updates_viewport() {
    let mut channel = city_channel();
    let reply = channel
        .request(&Message::new(RESIZE, json!({ "width": 640, "height": 480 })))
        .unwrap();
    assert_eq!(reply, Value::Null);

    let viewport = channel.context().unwrap().document().layout().viewport();
    assert_eq!((viewport.width, viewport.height), (640.0, 480.0));
}

#[test]
fn get_overlays_reports_state() {
    let mut channel = city_channel();
    channel.scan_all().unwrap();

    let reply = channel.request(&Message::bare(GET_OVERLAYS)).unwrap();
    let overlays = reply.as_array().unwrap();
    assert_eq!(overlays.len(), 2);
    assert_eq!(overlays[0]["id"], "scan-0");
    assert_eq!(overlays[0]["visible"], true);
    assert_eq!(overlays[0]["animated"], true);
    assert_eq!(overlays[0]["label"], "#0");
}

#[test]
fn context_from_snapshot_uses_measured_layout() {
    let snapshot = PageSnapshot::from_json(
        r#"{
            "html": "<input name=\"q\">",
            "viewport": {"width": 800, "height": 600},
            "layout": [{"node": 3, "x": 5, "y": 5, "width": 100, "height": 20}]
        }"#,
    )
    .unwrap();
    let context = PageContext::from_snapshot(snapshot, ContextSettings::default()).unwrap();
    assert_eq!(context.document().layout().viewport().width, 800.0);
}
