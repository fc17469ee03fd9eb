//! Comprehensive tests for fos-html
//!
//! Parsing of binding markup, fragment insertion and serialization.

use fos_html::{HtmlParser, inner_html, outer_html, parse, set_inner_html};

#[test]
fn test_parse_minimal_html() {
    let doc = parse("").unwrap();
    assert!(doc.body().is_valid(), "Even empty HTML gets a body");
    assert!(doc.children(doc.body()).is_empty());
}

#[test]
fn test_parse_drops_whitespace_text() {
    let doc = parse("<ul>\n  <li>a</li>\n  <li>b</li>\n</ul>").unwrap();
    let ul = doc.element_children(doc.body())[0];
    assert_eq!(doc.children(ul).len(), 2);
}

#[test]
fn test_parse_foreach_template_markup() {
    let doc = parse(r#"<ul><li foreach="items" data-id="${item.id}" onclick="remove">${index}: ${item.name}</li></ul>"#).unwrap();
    let ul = doc.element_children(doc.body())[0];
    let li = doc.element_children(ul)[0];

    assert_eq!(doc.get_attribute(li, "foreach").as_deref(), Some("items"));
    assert_eq!(doc.get_attribute(li, "data-id").as_deref(), Some("${item.id}"));
    assert_eq!(doc.text_content(li), "${index}: ${item.name}");
}

#[test]
fn test_parse_opt_in_attribute_is_lowercased() {
    let doc = parse(r#"<div reactiveDom if="shown"></div>"#).unwrap();
    let div = doc.element_children(doc.body())[0];
    assert!(doc.has_attribute(div, "reactivedom"));
    assert!(doc.has_attribute_ignore_case(div, "reactiveDom"));
}

#[test]
fn test_parse_entities() {
    let doc = parse("<p>&lt;b&gt; &amp; &quot;</p>").unwrap();
    assert_eq!(doc.text_content(doc.body()), "<b> & \"");
}

#[test]
fn test_parse_comments_are_kept() {
    let doc = parse("<div><!-- anchor --></div>").unwrap();
    let div = doc.element_children(doc.body())[0];
    assert_eq!(inner_html(&doc, div), "<!-- anchor -->");
}

#[test]
fn test_set_inner_html_replaces_children() {
    let doc = parse(r#"<div id="out"><span>old</span></div>"#).unwrap();
    let div = doc.get_element_by_id("out").unwrap();

    set_inner_html(&doc, div, "<b>new</b> text").unwrap();
    assert_eq!(inner_html(&doc, div), "<b>new</b> text");

    set_inner_html(&doc, div, "").unwrap();
    assert!(doc.children(div).is_empty());
}

#[test]
fn test_outer_html_round_trip() {
    let markup = r#"<label class="x"><input type="checkbox" bind:group="picked" value="a" /></label>"#;
    let doc = parse(markup).unwrap();
    let label = doc.element_children(doc.body())[0];
    assert_eq!(outer_html(&doc, label), markup);
}

#[test]
fn test_parse_fragment_into_detached_parent() {
    let doc = parse("").unwrap();
    let holder = doc.create_element("div");
    let added = HtmlParser::new()
        .parse_fragment_into(&doc, holder, "<i>1</i><i>2</i>")
        .unwrap();
    assert_eq!(added.len(), 2);
    assert!(!doc.is_connected(holder));
    assert_eq!(doc.text_content(holder), "12");
}

#[test]
fn test_parse_large_list() {
    let items: String = (0..500).map(|i| format!("<li>{i}</li>")).collect();
    let doc = parse(&format!("<ul>{items}</ul>")).unwrap();
    let ul = doc.element_children(doc.body())[0];
    assert_eq!(doc.element_children(ul).len(), 500);
}

#[test]
fn test_set_inner_html_uses_target_as_context() {
    let doc = parse(r#"<table><tbody id="rows"></tbody></table><select id="pick"></select>"#).unwrap();
    let rows = doc.get_element_by_id("rows").unwrap();
    set_inner_html(&doc, rows, "<tr><td>1</td></tr><tr><td>2</td></tr>").unwrap();
    assert_eq!(inner_html(&doc, rows), "<tr><td>1</td></tr><tr><td>2</td></tr>");

    let pick = doc.get_element_by_id("pick").unwrap();
    set_inner_html(&doc, pick, r#"<option value="a">A</option>"#).unwrap();
    assert_eq!(doc.element_children(pick).len(), 1);
    assert_eq!(doc.tag_name(doc.element_children(pick)[0]).as_deref(), Some("option"));
}
