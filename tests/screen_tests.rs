mod common;

use common::utils::{all, first};
use page_anchor::dom::Document;
use page_anchor::overlay::style::OVERLAY_ATTR;
use page_anchor::screen::classifier::is_scan_candidate;
use page_anchor::screen::container::{container_label, find_container, form_group_label};
use page_anchor::screen::stability::PathCombinator;
use page_anchor::screen::{
    classify, generate_stable_selector, ElementScanner, ElementType, SavedConfigEntry,
    SelectorPathBuilder, StabilityPolicy,
};

// ============================================================================
// Classifier
// ============================================================================

const CLASSIFY_PAGE: &str = r##"
<button id="native">Go</button>
<input id="submit" type="submit" value="Send">
<input id="reset" type="RESET">
<input id="plain">
<input id="check" type="checkbox">
<textarea id="notes"></textarea>
<a id="btn-link" class="btn-primary" href="#">Save</a>
<a id="role-link" role="button">Open</a>
<a id="action-link" data-action="delete">Delete</a>
<a id="nav" href="/home">Home</a>
<p id="select" xtype="select">Option A</p>
<div id="static" class="bh-form-static" data-name="XB">Male</div>
<span id="named" data-name="XM">Zhang San</span>
<div id="plain-div">text</div>
"##;

#[test]
fn classify_follows_priority_order() {
    let doc = Document::parse(CLASSIFY_PAGE).unwrap();
    let cases = [
        ("native", ElementType::Button),
        ("submit", ElementType::Button),
        ("reset", ElementType::Button),
        ("plain", ElementType::Input),
        ("check", ElementType::Input),
        ("notes", ElementType::Input),
        ("btn-link", ElementType::Button),
        ("role-link", ElementType::Button),
        ("action-link", ElementType::Button),
        ("nav", ElementType::TextDisplay),
        ("select", ElementType::SelectDisplay),
        ("static", ElementType::SelectDisplay),
        ("named", ElementType::TextDisplay),
        ("plain-div", ElementType::TextDisplay),
    ];
    for (id, expected) in cases {
        let node = first(&doc, &format!("#{}", id));
        assert_eq!(classify(&doc, node), expected, "element #{}", id);
    }
}

#[test]
fn classify_is_total_and_deterministic() {
    let doc = Document::parse(CLASSIFY_PAGE).unwrap();
    for node in doc.elements() {
        let once = classify(&doc, node);
        let again = classify(&doc, node);
        assert_eq!(once, again);
    }
}

#[test]
fn select_marker_beats_name_attribute() {
    let doc = Document::parse(r#"<p xtype="select" data-name="XB">A</p>"#).unwrap();
    assert_eq!(classify(&doc, first(&doc, "p")), ElementType::SelectDisplay);
}

#[test]
fn element_type_wire_names() {
    let json = serde_json::to_string(&[
        ElementType::Input,
        ElementType::Button,
        ElementType::SelectDisplay,
        ElementType::TextDisplay,
    ])
    .unwrap();
    assert_eq!(json, r#"["input","button","select-display","text-display"]"#);
}

#[test]
fn scan_candidates_skip_hidden_inputs_and_plain_links() {
    let doc = Document::parse(CLASSIFY_PAGE).unwrap();
    let hidden = Document::parse(r#"<input type="hidden" name="token">"#).unwrap();
    assert!(!is_scan_candidate(&hidden, first(&hidden, "input")));
    assert!(!is_scan_candidate(&doc, first(&doc, "#nav")));
    assert!(!is_scan_candidate(&doc, first(&doc, "#plain-div")));
    assert!(is_scan_candidate(&doc, first(&doc, "#btn-link")));
    assert!(is_scan_candidate(&doc, first(&doc, "#named")));
}

// ============================================================================
// Stability policy
// ============================================================================

#[test]
fn volatility_heuristics() {
    let policy = StabilityPolicy::default();
    assert!(policy.is_stable_id("profile"));
    assert!(policy.is_stable_id("field_12345"));
    assert!(!policy.is_stable_id("field_123456"));
    assert!(!policy.is_stable_id("jqxWidget"));
    assert!(!policy.is_stable_id("randomId"));
    assert!(!policy.is_stable_id("DynamicPanel"));
    assert!(!policy.is_stable_id(""));

    assert!(policy.is_stable_class("col-1234"));
    assert!(!policy.is_stable_class("css-12345"));
}

#[test]
fn policy_overrides_from_yaml() {
    let policy: StabilityPolicy = serde_yaml::from_str(
        "volatile_markers: [tmp]\nid_digit_run: 3\ncombinator: child\n",
    )
    .unwrap();
    assert!(!policy.is_stable_id("user123"));
    assert!(!policy.is_stable_id("tmp-panel"));
    assert!(policy.is_stable_id("jqxWidget"));
    assert_eq!(policy.class_digit_run, 5);
    assert_eq!(policy.combinator, PathCombinator::Child);
}

// ============================================================================
// Selector paths
// ============================================================================

const PATH_PAGE: &str = r#"
<div class="page">
  <form class="profile">
    <div class="row"><span class="cell">A</span><span class="cell">B</span></div>
    <div class="row"><span class="cell">C</span><span class="cell">D</span></div>
    <fieldset data-field="contact"><input name="email"><input name="phone"></fieldset>
  </form>
</div>"#;

#[test]
fn generated_path_resolves_back_to_the_same_element() {
    let doc = Document::parse(PATH_PAGE).unwrap();
    let body = doc.body().unwrap();
    for node in doc.descendants(body) {
        let path = generate_stable_selector(&doc, node);
        assert!(!path.is_empty());
        assert_eq!(all(&doc, &path), vec![node], "path {}", path);
    }
}

#[test]
fn identical_siblings_differ_only_in_position() {
    let doc = Document::parse(PATH_PAGE).unwrap();
    let cells = all(&doc, "span.cell");
    let a = generate_stable_selector(&doc, cells[0]);
    let b = generate_stable_selector(&doc, cells[1]);

    assert_eq!(
        a,
        "div.page form.profile div.row:nth-child(1) span.cell:nth-child(1)"
    );
    assert_ne!(a, b);
    assert_eq!(
        a.strip_suffix(":nth-child(1)"),
        b.strip_suffix(":nth-child(2)")
    );
}

#[test]
fn anchor_attribute_replaces_position() {
    let doc = Document::parse(PATH_PAGE).unwrap();
    let phone = first(&doc, "[name=phone]");
    assert_eq!(
        generate_stable_selector(&doc, phone),
        r#"div.page form.profile fieldset[data-field="contact"] input:nth-child(2)"#
    );
}

#[test]
fn volatile_ids_and_classes_are_dropped() {
    let doc = Document::parse(
        r#"<div id="jqxGrid123"><input id="field_1234567" class="c-ab12345 name-input"></div>"#,
    )
    .unwrap();
    let path = generate_stable_selector(&doc, first(&doc, "input"));
    assert_eq!(path, "div input.name-input");
}

#[test]
fn stable_id_ends_the_walk() {
    let doc = Document::parse(
        r#"<div class="outer"><section id="profile"><div><input name="a"></div></section></div>"#,
    )
    .unwrap();
    let input = first(&doc, "input");
    assert_eq!(
        generate_stable_selector(&doc, input),
        "section#profile div input"
    );

    let child_paths = SelectorPathBuilder::new(StabilityPolicy {
        combinator: PathCombinator::Child,
        ..StabilityPolicy::default()
    });
    assert_eq!(
        child_paths.generate_stable_selector(&doc, input),
        "section#profile > div > input"
    );
}

#[test]
fn leading_digit_id_is_escaped() {
    let doc = Document::parse(r#"<div id="123abc"><input></div>"#).unwrap();
    let div = first(&doc, "div");
    let path = generate_stable_selector(&doc, div);
    assert!(path.starts_with("div#\\31 "), "path {}", path);
    assert_eq!(all(&doc, &path), vec![div]);
}

#[test]
fn at_most_two_classes_per_level() {
    let doc = Document::parse(r#"<div class="a b c d"></div>"#).unwrap();
    assert_eq!(generate_stable_selector(&doc, first(&doc, "div")), "div.a.b");
}

#[test]
fn walk_is_capped_at_five_levels() {
    let doc = Document::parse(
        "<div><div><div><div><div><div><div><input name=\"deep\"></div></div></div></div></div></div></div>",
    )
    .unwrap();
    let path = generate_stable_selector(&doc, first(&doc, "input"));
    assert_eq!(path.split(' ').count(), 5);
    assert!(path.ends_with("input"));
}

// ============================================================================
// Containers and scanning
// ============================================================================

const SCAN_PAGE: &str = r##"
<form class="main">
  <div class="bh-form-group">
    <label class="bh-form-label">Name</label>
    <input name="xm" id="t1" placeholder="Your name">
  </div>
  <div class="bh-form-group" data-name="XB">
    <label class="bh-form-label"> Gender </label>
    <div class="bh-form-static" data-name="XB">Male</div>
  </div>
  <input type="hidden" name="token" value="x">
  <p data-name="BZ">note</p>
  <a class="btn" href="#">Save</a>
  <button type="submit" disabled>Submit</button>
</form>"##;

#[test]
fn container_prefers_semantic_wrapper_then_form_group() {
    let doc = Document::parse(SCAN_PAGE).unwrap();
    let input = first(&doc, "[name=xm]");
    let static_value = first(&doc, "div.bh-form-static");

    assert_eq!(
        find_container(&doc, input),
        Some(first(&doc, "div.bh-form-group:nth-child(1)"))
    );
    assert_eq!(
        find_container(&doc, static_value),
        Some(first(&doc, r#"div.bh-form-group[data-name="XB"]"#))
    );
    assert_eq!(
        find_container(&doc, first(&doc, "p")),
        Some(first(&doc, "form"))
    );
}

#[test]
fn labels_are_trimmed_and_empty_means_none() {
    let doc = Document::parse(SCAN_PAGE).unwrap();
    let group = first(&doc, r#"div[data-name="XB"]"#);
    assert_eq!(container_label(&doc, group).as_deref(), Some("Gender"));
    assert_eq!(
        form_group_label(&doc, first(&doc, "[name=xm]")).as_deref(),
        Some("Name")
    );

    let empty = Document::parse(r#"<div class="form"><label> </label><input></div>"#).unwrap();
    assert_eq!(container_label(&empty, first(&empty, "div")), None);
}

#[test]
fn scan_describes_candidates_in_document_order() {
    let doc = Document::parse(SCAN_PAGE).unwrap();
    let scanned = ElementScanner::default().scan(&doc);
    let types: Vec<ElementType> = scanned.iter().map(|s| s.descriptor.element_type).collect();
    assert_eq!(
        types,
        vec![
            ElementType::Input,
            ElementType::SelectDisplay,
            ElementType::TextDisplay,
            ElementType::Button,
            ElementType::Button,
        ]
    );
    let indexes: Vec<usize> = scanned.iter().map(|s| s.descriptor.index).collect();
    assert_eq!(indexes, vec![0, 1, 2, 3, 4]);

    let name = &scanned[0].descriptor;
    assert_eq!(name.label.as_deref(), Some("Name"));
    assert_eq!(name.name.as_deref(), Some("xm"));
    assert_eq!(name.id.as_deref(), Some("t1"));
    assert_eq!(name.kind, "text");
    assert_eq!(name.placeholder.as_deref(), Some("Your name"));
    assert_eq!(name.button_text, None);
    assert_eq!(
        name.container_path,
        "form.main div.bh-form-group:nth-child(1)"
    );

    let gender = &scanned[1].descriptor;
    assert_eq!(gender.label.as_deref(), Some("Gender"));
    assert_eq!(gender.data_name.as_deref(), Some("XB"));
    assert_eq!(gender.kind, "div");
    assert_eq!(
        gender.container_path,
        r#"form.main div.bh-form-group[data-name="XB"]"#
    );

    assert_eq!(scanned[3].descriptor.button_text.as_deref(), Some("Save"));
    let submit = &scanned[4].descriptor;
    assert_eq!(submit.button_text.as_deref(), Some("Submit"));
    assert!(submit.disabled);
    assert_eq!(submit.kind, "button");
}

#[test]
fn scan_handles_very_deep_nesting() {
    const DEPTH: usize = 100_000;
    let html = format!(
        "{}<input name=\"x\">{}",
        "<div>".repeat(DEPTH),
        "</div>".repeat(DEPTH)
    );
    let doc = Document::parse(&html).unwrap();

    let scanned = ElementScanner::default().scan(&doc);
    assert_eq!(scanned.len(), 1);
    let descriptor = &scanned[0].descriptor;
    assert_eq!(descriptor.name.as_deref(), Some("x"));
    assert_eq!(descriptor.container_path, "div div div div div");
    assert_eq!(
        doc.query_selector_all(None, &format!("{} > input", descriptor.container_path))
            .unwrap(),
        vec![scanned[0].node]
    );
}

#[test]
fn scan_skips_overlay_owned_nodes() {
    let mut doc = Document::parse(r#"<input name="real">"#).unwrap();
    let body = doc.body().unwrap();
    let overlay = doc.create_element("div", vec![(OVERLAY_ATTR.to_string(), "true".to_string())]);
    let fake = doc.create_element("input", vec![("name".to_string(), "fake".to_string())]);
    doc.append_child(overlay, fake);
    doc.append_child(body, overlay);

    let scanned = ElementScanner::default().scan(&doc);
    assert_eq!(scanned.len(), 1);
    assert_eq!(scanned[0].descriptor.name.as_deref(), Some("real"));
}

#[test]
fn descriptor_serialises_with_wire_names() {
    let doc = Document::parse(SCAN_PAGE).unwrap();
    let scanned = ElementScanner::default().scan(&doc);
    let json = serde_json::to_value(&scanned[1].descriptor).unwrap();
    assert_eq!(json["elementType"], "select-display");
    assert_eq!(json["type"], "div");
    assert_eq!(json["dataName"], "XB");
    assert!(json.get("containerPath").is_some());
    assert!(json.get("buttonText").is_none());
}

#[test]
fn saved_entry_keeps_the_durable_fields() {
    let doc = Document::parse(SCAN_PAGE).unwrap();
    let scanned = ElementScanner::default().scan(&doc);
    let entry = SavedConfigEntry::from(&scanned[0].descriptor);
    assert_eq!(entry.container_selector, scanned[0].descriptor.container_path);
    assert_eq!(entry.fallback_name.as_deref(), Some("xm"));
    assert_eq!(entry.lookup_name(), Some("xm"));
    assert_eq!(entry.display_name(), "Name");

    let json = serde_json::to_value(&entry).unwrap();
    assert_eq!(json["containerSelector"], entry.container_selector.as_str());
    assert!(json.get("foundBy").is_none());
}
