// ABOUTME: Owned article-body tree and the flattener that turns it into plain text.
// ABOUTME: Scripts vanish, paragraphs end with a newline, images become [img url] marker lines.

use ego_tree::iter::Edge;
use ego_tree::NodeRef;
use scraper::{ElementRef, Node};
use serde::{Deserialize, Serialize};

/// Deepest element level copied as structure. Subtrees below it are kept as
/// one text node holding their flattened rendering.
pub const MAX_COPY_DEPTH: usize = 256;

/// A node of a retained article body.
///
/// Only elements and text survive the copy out of the parsed page; comments,
/// doctypes and processing instructions are dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContentNode {
    Element {
        tag: String,
        attrs: Vec<(String, String)>,
        children: Vec<ContentNode>,
    },
    Text(String),
}

impl ContentNode {
    pub fn element(
        tag: impl Into<String>,
        attrs: Vec<(String, String)>,
        children: Vec<ContentNode>,
    ) -> Self {
        ContentNode::Element {
            tag: tag.into(),
            attrs,
            children,
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        ContentNode::Text(text.into())
    }

    /// Copy the subtree rooted at `el` out of the parsed document.
    ///
    /// Nesting is cut at [`MAX_COPY_DEPTH`]; `flatten` gives the same text
    /// either way.
    pub fn from_element(el: ElementRef<'_>) -> Self {
        Self::copy_element(el, MAX_COPY_DEPTH)
    }

    fn copy_element(el: ElementRef<'_>, depth_left: usize) -> Self {
        let children = el
            .children()
            .filter_map(|child| Self::copy_node(child, depth_left))
            .collect();
        let value = el.value();
        ContentNode::Element {
            tag: value.name().to_string(),
            attrs: value
                .attrs()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            children,
        }
    }

    fn copy_node(node: NodeRef<'_, Node>, depth_left: usize) -> Option<Self> {
        match node.value() {
            Node::Text(t) => Some(ContentNode::Text(t.text.to_string())),
            Node::Element(_) if depth_left == 0 => {
                let mut text = String::new();
                flatten_subtree(node, &mut text);
                (!text.is_empty()).then_some(ContentNode::Text(text))
            }
            Node::Element(_) => {
                ElementRef::wrap(node).map(|el| Self::copy_element(el, depth_left - 1))
            }
            _ => None,
        }
    }
}

/// Render a retained body as plain text.
///
/// Rules, checked in order at each node:
/// 1. `script` elements are skipped with their whole subtree.
/// 2. `p` elements emit their children, then `\n`.
/// 3. `img` elements emit `[img <data-src>]\n` for each `data-src` attribute
///    and their children are not visited.
/// 4. Text is appended verbatim.
/// 5. Any other element just descends.
pub fn flatten(node: &ContentNode) -> String {
    let mut out = String::new();
    flatten_into(node, &mut out);
    out
}

fn flatten_into(node: &ContentNode, out: &mut String) {
    match node {
        ContentNode::Text(text) => out.push_str(text),
        ContentNode::Element {
            tag,
            attrs,
            children,
        } => match tag.as_str() {
            "script" => {}
            "p" => {
                for child in children {
                    flatten_into(child, out);
                }
                out.push('\n');
            }
            "img" => {
                for (_, src) in attrs.iter().filter(|(name, _)| name == "data-src") {
                    out.push_str("[img ");
                    out.push_str(src);
                    out.push_str("]\n");
                }
            }
            _ => {
                for child in children {
                    flatten_into(child, out);
                }
            }
        },
    }
}

// Same rules as `flatten_into`, walked over the parsed tree without recursion.
fn flatten_subtree(root: NodeRef<'_, Node>, out: &mut String) {
    // Open elements inside a script or img being skipped.
    let mut skipping = 0usize;
    for edge in root.traverse() {
        match edge {
            Edge::Open(node) => match node.value() {
                Node::Element(_) if skipping > 0 => skipping += 1,
                _ if skipping > 0 => {}
                Node::Text(t) => out.push_str(&t.text),
                Node::Element(el) => match el.name() {
                    "script" => skipping = 1,
                    "img" => {
                        for (_, src) in el.attrs().filter(|(name, _)| *name == "data-src") {
                            out.push_str("[img ");
                            out.push_str(src);
                            out.push_str("]\n");
                        }
                        skipping = 1;
                    }
                    _ => {}
                },
                _ => {}
            },
            Edge::Close(node) => {
                if let Node::Element(el) = node.value() {
                    if skipping > 0 {
                        skipping -= 1;
                    } else if el.name() == "p" {
                        out.push('\n');
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query;
    use pretty_assertions::assert_eq;
    use scraper::Html;

    fn body_of(html: &str) -> ContentNode {
        let doc = Html::parse_document(html);
        let el = query::first(doc.root_element(), "#js_content").unwrap();
        ContentNode::from_element(el)
    }

    #[test]
    fn plain_text_is_concatenated_without_newlines() {
        let body = body_of(
            r#"<div id="js_content"><span>Hello</span>, <section><em>big</em> world</section></div>"#,
        );
        assert_eq!(flatten(&body), "Hello, big world");
    }

    #[test]
    fn each_paragraph_ends_with_one_newline() {
        let body = body_of(
            r#"<div id="js_content"><p>one</p><section><div><p>two <b>bold</b></p></div></section><p></p></div>"#,
        );
        assert_eq!(flatten(&body), "one\ntwo bold\n\n");
    }

    #[test]
    fn nested_paragraph_break_is_post_order() {
        let body = ContentNode::element(
            "p",
            vec![],
            vec![
                ContentNode::text("outer "),
                ContentNode::element("p", vec![], vec![ContentNode::text("inner")]),
                ContentNode::text(" tail"),
            ],
        );
        assert_eq!(flatten(&body), "outer inner\n tail\n");
    }

    #[test]
    fn image_becomes_marker_line() {
        let body = body_of(
            r#"<div id="js_content"><p>before<img data-src="https://mmbiz.qpic.cn/x.png" src="data:">after</p></div>"#,
        );
        assert_eq!(
            flatten(&body),
            "before[img https://mmbiz.qpic.cn/x.png]\nafter\n"
        );
    }

    #[test]
    fn image_children_are_not_visited() {
        let img = ContentNode::element(
            "img",
            vec![
                ("data-src".to_string(), "a.png".to_string()),
                ("data-src".to_string(), "b.png".to_string()),
            ],
            vec![ContentNode::text("hidden")],
        );
        assert_eq!(flatten(&img), "[img a.png]\n[img b.png]\n");
    }

    #[test]
    fn image_without_data_src_emits_nothing() {
        let body = body_of(r#"<div id="js_content"><img src="x.png"></div>"#);
        assert_eq!(flatten(&body), "");
    }

    #[test]
    fn script_subtree_contributes_nothing() {
        let script = ContentNode::element(
            "script",
            vec![],
            vec![
                ContentNode::text("var a = 1;"),
                ContentNode::element(
                    "p",
                    vec![],
                    vec![ContentNode::element(
                        "img",
                        vec![("data-src".to_string(), "x".to_string())],
                        vec![],
                    )],
                ),
            ],
        );
        let body = ContentNode::element(
            "div",
            vec![],
            vec![ContentNode::text("a"), script, ContentNode::text("b")],
        );
        assert_eq!(flatten(&body), "ab");
    }

    #[test]
    fn comments_are_dropped_from_the_copy() {
        let body = body_of(r#"<div id="js_content">a<!-- hidden -->b</div>"#);
        assert_eq!(
            body,
            ContentNode::element(
                "div",
                vec![("id".to_string(), "js_content".to_string())],
                vec![ContentNode::text("a"), ContentNode::text("b")],
            )
        );
    }

    #[test]
    fn text_is_verbatim() {
        let body = body_of("<div id=\"js_content\">  a &amp; b\n\t</div>");
        assert_eq!(flatten(&body), "  a & b\n\t");
    }

    fn depth(node: &ContentNode) -> usize {
        match node {
            ContentNode::Text(_) => 0,
            ContentNode::Element { children, .. } => {
                1 + children.iter().map(depth).max().unwrap_or(0)
            }
        }
    }

    #[test]
    fn collapsed_subtree_flattens_the_same() {
        let html = r#"<div id="js_content">a<section><p>one <b>two</b><img data-src="x.png"><!-- c --></p><script>no</script><div><p></p>tail</div></section>z</div>"#;
        let doc = Html::parse_document(html);
        let el = query::first(doc.root_element(), "#js_content").unwrap();
        let full = ContentNode::from_element(el);
        for depth_left in 0..4 {
            assert_eq!(
                flatten(&ContentNode::copy_element(el, depth_left)),
                flatten(&full)
            );
        }
        assert_eq!(flatten(&full), "aone two[img x.png]\n\n\ntailz");
    }

    #[test]
    fn deeply_nested_body_is_copied_without_overflow() {
        let levels = 50_000;
        let html = format!(
            r#"<div id="js_content">{}<p>deep<img data-src="d.png"></p>{}</div>"#,
            "<span>".repeat(levels),
            "</span>".repeat(levels)
        );
        let body = body_of(&html);
        assert!(depth(&body) <= MAX_COPY_DEPTH + 1);
        assert_eq!(flatten(&body), "deep[img d.png]\n");
    }

    #[test]
    fn flatten_is_idempotent() {
        let body = body_of(
            r#"<div id="js_content"><p>x<img data-src="y"></p><script>z</script></div>"#,
        );
        let first = flatten(&body);
        assert_eq!(first, flatten(&body));
        assert_eq!(first, "x[img y]\n\n");
    }
}
