//! Edge case tests for pl-dom
//!
//! Selector synthesis and matching against trees that change shape.

use pl_dom::{synthesize_selector, Document, DomTree, NodeId, Selector};

fn table_tree() -> (DomTree, NodeId, Vec<NodeId>) {
    let mut tree = DomTree::new();
    let html = tree.create_element("html");
    tree.append_child(NodeId::ROOT, html);
    let table = tree.create_element("table");
    tree.set_attribute(table, "id", "Orders");
    tree.append_child(html, table);

    let rows = (0..4)
        .map(|i| {
            let tr = tree.create_element("tr");
            tree.append_child(table, tr);
            if i % 2 == 0 {
                let ws = tree.create_text("  ");
                tree.append_child(table, ws);
            }
            tr
        })
        .collect();
    (tree, table, rows)
}

// ============================================================================
// SELECTOR SYNTHESIS
// ============================================================================

#[test]
fn test_synthesized_selector_matches_its_node_only() {
    let (tree, _, rows) = table_tree();
    for &row in &rows {
        let selector = Selector::parse(&synthesize_selector(&tree, row)).unwrap();
        let matching: Vec<NodeId> = rows
            .iter()
            .copied()
            .filter(|&r| selector.matches(&tree, r))
            .collect();
        assert_eq!(matching, vec![row]);
    }
}

#[test]
fn test_selector_tracks_position_after_removal() {
    let (mut tree, _, rows) = table_tree();
    assert_eq!(synthesize_selector(&tree, rows[2]), "#orders > tr:nth-child(3)");

    tree.detach(rows[0]);
    assert_eq!(synthesize_selector(&tree, rows[2]), "#orders > tr:nth-child(2)");
}

#[test]
fn test_own_id_wins_over_anchor() {
    let (mut tree, _, rows) = table_tree();
    tree.set_attribute(rows[1], "id", "Row-B");
    assert_eq!(synthesize_selector(&tree, rows[1]), "#row-b");
}

#[test]
fn test_escaped_id_round_trips_through_matcher() {
    let mut doc = Document::new("about:blank");
    let body = doc.body();
    let tree = doc.tree_mut();
    let div = tree.create_element("div");
    tree.set_attribute(div, "id", "2024.report");
    tree.append_child(body, div);

    let selector = synthesize_selector(doc.tree(), div);
    assert_eq!(selector, "#\\32 024\\.report");
    assert_eq!(doc.query_selector(&selector).unwrap(), Some(div));
}

#[test]
fn test_fragment_root_stops_walk() {
    let mut tree = DomTree::new();
    let ul = tree.create_element("ul");
    let li = tree.create_element("li");
    tree.append_child(ul, li);

    // `ul` is detached, so the path is relative to it
    assert_eq!(synthesize_selector(&tree, li), "li:nth-child(1)");
}

// ============================================================================
// MATCHING
// ============================================================================

#[test]
fn test_select_all_document_order() {
    let mut doc = Document::new("about:blank");
    let body = doc.body();
    let tree = doc.tree_mut();
    let outer = tree.create_element("div");
    let inner = tree.create_element("div");
    tree.append_child(body, outer);
    tree.append_child(outer, inner);

    let selector = Selector::parse("div").unwrap();
    assert_eq!(doc.select_all(&selector), vec![outer, inner]);
}

#[test]
fn test_whitespace_around_combinator_is_optional() {
    let (tree, _, rows) = table_tree();
    let tight = Selector::parse("#orders>tr:nth-child(1)").unwrap();
    let loose = Selector::parse("  #orders   >   tr:nth-child(1)  ").unwrap();
    assert_eq!(tight, loose);
    assert!(tight.matches(&tree, rows[0]));
}
