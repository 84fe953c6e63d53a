//! End-to-end inlining scenarios against complete documents.

use mailcss::{inline, inline_additional_only, inline_with_css, Specificity};

#[test]
fn test_table_cells_inlined_without_corruption() {
    let html = r#"<table><tr><td class="a">X</td><td class="b">Y</td></tr></table><style>.a{color:red}.b{color:blue}</style>"#;
    let out = inline(html);
    assert!(out.contains(r#"<td class="a" style="color: red;">X</td>"#), "{}", out);
    assert!(out.contains(r#"<td class="b" style="color: blue;">Y</td>"#), "{}", out);
    assert!(out.starts_with("<table><tr>"), "{}", out);
    assert!(out.ends_with("</table>"), "{}", out);
    assert!(!out.contains("<style"), "{}", out);
}

#[test]
fn test_full_email_document() {
    let html = concat!(
        "<!DOCTYPE html>\n",
        "<html>\n",
        "<head>\n",
        "<style>\n",
        "  body { margin: 0; }\n",
        "  .header { background: #333; color: white; }\n",
        "  #cta { font-weight: bold; }\n",
        "  a:hover { text-decoration: underline; }\n",
        "</style>\n",
        "</head>\n",
        "<body>\n",
        "<div class=\"header\"><h1>Hi</h1></div>\n",
        "<a id=\"cta\" href=\"https://example.com\">Go</a>\n",
        "</body>\n",
        "</html>"
    );
    let out = inline(html);
    assert!(
        out.contains(r#"<body style="margin: 0;">"#),
        "{}",
        out
    );
    assert!(
        out.contains(r#"<div class="header" style="background: #333; color: white;">"#),
        "{}",
        out
    );
    assert!(
        out.contains(r#"<a id="cta" href="https://example.com" style="font-weight: bold;">"#),
        "{}",
        out
    );
    // The hover rule survives in a preserved block inside head.
    assert!(out.contains("<style type=\"text/css\">"), "{}", out);
    assert!(out.contains("a:hover { text-decoration: underline; }"), "{}", out);
    assert!(out.find("<style type=").unwrap() < out.find("</head>").unwrap());
}

#[test]
fn test_combinator_scenarios() {
    let html = r#"<style>div > p { color: red } .y + p { color: blue }</style><div class="x"><p>T</p></div>"#;
    let out = inline(html);
    assert!(out.contains(r#"<p style="color: red;">T</p>"#), "{}", out);
    assert!(!out.contains("blue"), "{}", out);
}

#[test]
fn test_general_sibling_ignores_adjacency() {
    let html = r#"<style>.y ~ p { color: blue }</style><div><i class="y">a</i><b>b</b><p>c</p></div>"#;
    let out = inline(html);
    assert!(out.contains(r#"<p style="color: blue;">c</p>"#), "{}", out);
}

#[test]
fn test_attribute_operator_prefix() {
    let html = r#"<style>[data-x^="ab"] { color: red }</style><p data-x="abcdef">1</p><p data-x="xab">2</p>"#;
    let out = inline(html);
    assert!(out.contains(r#"<p data-x="abcdef" style="color: red;">1</p>"#), "{}", out);
    assert!(out.contains(r#"<p data-x="xab">2</p>"#), "{}", out);
}

#[test]
fn test_self_closing_insertion_point() {
    let html = r#"<style>img{border:0}</style><img src="a.png">"#;
    let out = inline(html);
    assert!(out.contains(r#"<img src="a.png" style="border: 0;">"#), "{}", out);
}

#[test]
fn test_merge_precedence_important_beats_later() {
    let html = "<style>p { color: red !important } p { color: blue }</style><p>x</p>";
    let out = inline(html);
    assert!(out.contains("color: red !important;"), "{}", out);
}

#[test]
fn test_merge_precedence_specificity_beats_order() {
    let html = r#"<style>#a { color: blue } p { color: red }</style><p id="a">x</p>"#;
    let out = inline(html);
    assert!(out.contains("color: blue;"), "{}", out);
}

#[test]
fn test_specificity_aggregate_ordering() {
    let id = mailcss::parse_selector("#a").unwrap().specificity();
    let classes = mailcss::parse_selector(".a.b.c").unwrap().specificity();
    let types = mailcss::parse_selector("div span p").unwrap().specificity();
    assert!(id > classes);
    assert!(classes > types);
    assert_eq!(id, Specificity::new(1, 0, 0));
}

#[test]
fn test_idempotence_of_fully_inlined_output() {
    let html = r#"<html><head><style>p { color: red } .a { margin: 0 }</style></head><body><p class="a">x</p></body></html>"#;
    let once = inline(html);
    let twice = inline(&once);
    assert_eq!(once, twice);
}

#[test]
fn test_inline_with_additional_css() {
    let html = "<html><body><p>x</p></body></html>";
    let out = inline_with_css(html, Some("p { color: red }"));
    assert!(out.contains(r#"<p style="color: red;">x</p>"#), "{}", out);
}

#[test]
fn test_additional_only_leaves_resets_visible() {
    let html = "<head><style>body { margin: 0 }</style></head><body><p>x</p></body>";
    let out = inline_additional_only(html, "p { color: red }");
    assert!(out.contains("<style>body { margin: 0 }</style>"), "{}", out);
    assert!(out.contains(r#"<p style="color: red;">x</p>"#), "{}", out);
}

#[test]
fn test_selector_list_inlines_each_member() {
    let html = "<style>h1, h2 { margin: 0 }</style><h1>a</h1><h2>b</h2><h3>c</h3>";
    let out = inline(html);
    assert!(out.contains(r#"<h1 style="margin: 0;">a</h1>"#), "{}", out);
    assert!(out.contains(r#"<h2 style="margin: 0;">b</h2>"#), "{}", out);
    assert!(out.contains("<h3>c</h3>"), "{}", out);
}

#[test]
fn test_conditional_comments_untouched() {
    let html = concat!(
        "<style>td { color: red }</style>",
        "<!--[if mso]><table><tr><td>mso only</td></tr></table><![endif]-->",
        "<table><tr><td>real</td></tr></table>"
    );
    let out = inline(html);
    assert!(
        out.contains("<!--[if mso]><table><tr><td>mso only</td></tr></table><![endif]-->"),
        "{}",
        out
    );
    assert!(out.contains(r#"<td style="color: red;">real</td>"#), "{}", out);
}

#[test]
fn test_multibyte_content_not_corrupted() {
    let html = "<style>p { color: red }</style><p>héllo — wörld 日本語</p>";
    let out = inline(html);
    assert!(out.contains(r#"<p style="color: red;">héllo — wörld 日本語</p>"#), "{}", out);
}

#[test]
fn test_concurrent_invocations() {
    let html = std::sync::Arc::new(format!(
        "<html><head><style>{}</style></head><body>{}</body></html>",
        ".item { padding: 4px; } #first { color: red; } div > p:hover { color: blue; }",
        "<div id=\"first\" class=\"item\"><p class=\"item\">x</p></div>".repeat(50),
    ));

    let expected = inline(&html);
    let handles: Vec<_> = (0..32)
        .map(|_| {
            let html = std::sync::Arc::clone(&html);
            std::thread::spawn(move || inline(&html))
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), expected);
    }
}
