//! # Layout Tree
//!
//! A printable document is a tree of a few fixed primitives. The same tree
//! renders two ways:
//!
//! | Node | [`RenderMode::Print`] | [`RenderMode::Css`] |
//! |------|-----------------------|---------------------|
//! | page | `<Page size="LETTER">` | `<div class="page">` |
//! | section | `<View style="section">` | `<section>` |
//! | field | `<Text style="field">` | `<div class="field">` |
//! | checkbox | `<Text>☒ label</Text>` | `<input type="checkbox">` |
//! | signature | `<Image>` | `<img>` |
//!
//! Print markup is what the PDF layout engine consumes; CSS markup is for
//! inspecting the layout in a browser.

use serde::{Deserialize, Serialize};

/// Output flavor of [`Document::to_markup`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderMode {
    #[default]
    Print,
    Css,
}

/// One layout element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum Node {
    Heading {
        text: String,
    },
    Section {
        title: String,
        children: Vec<Node>,
    },
    /// Children laid out side by side.
    Row {
        children: Vec<Node>,
    },
    Field {
        label: String,
        value: String,
    },
    Checkbox {
        label: String,
        checked: bool,
    },
    /// Base64 image data; an empty line when absent.
    Signature {
        label: String,
        image: Option<String>,
    },
    Text {
        text: String,
    },
}

impl Node {
    pub fn heading(text: impl Into<String>) -> Self {
        Self::Heading { text: text.into() }
    }

    pub fn section(title: impl Into<String>, children: Vec<Node>) -> Self {
        Self::Section {
            title: title.into(),
            children,
        }
    }

    pub fn row(children: Vec<Node>) -> Self {
        Self::Row { children }
    }

    pub fn field(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Field {
            label: label.into(),
            value: value.into(),
        }
    }

    pub fn checkbox(label: impl Into<String>, checked: bool) -> Self {
        Self::Checkbox {
            label: label.into(),
            checked,
        }
    }

    pub fn signature(label: impl Into<String>, image: Option<&str>) -> Self {
        Self::Signature {
            label: label.into(),
            image: image.filter(|s| !s.trim().is_empty()).map(String::from),
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }
}

/// A single-page printable document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub title: String,
    pub body: Vec<Node>,
}

impl Document {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: Vec::new(),
        }
    }

    pub fn push(&mut self, node: Node) -> &mut Self {
        self.body.push(node);
        self
    }

    /// Depth-first walk over every node.
    pub fn nodes(&self) -> Vec<&Node> {
        fn walk<'a>(nodes: &'a [Node], out: &mut Vec<&'a Node>) {
            for node in nodes {
                out.push(node);
                if let Node::Section { children, .. } | Node::Row { children } = node {
                    walk(children, out);
                }
            }
        }
        let mut out = Vec::new();
        walk(&self.body, &mut out);
        out
    }

    /// Whether a section titled `title` is present at any depth.
    pub fn has_section(&self, title: &str) -> bool {
        self.nodes()
            .iter()
            .any(|n| matches!(n, Node::Section { title: t, .. } if t == title))
    }

    /// State of the checkbox labelled `label`, if present.
    pub fn checkbox(&self, label: &str) -> Option<bool> {
        self.nodes().iter().find_map(|n| match n {
            Node::Checkbox { label: l, checked } if l == label => Some(*checked),
            _ => None,
        })
    }

    /// Value of the field labelled `label`, if present.
    pub fn field(&self, label: &str) -> Option<&str> {
        self.nodes().iter().find_map(|n| match n {
            Node::Field { label: l, value } if l == label => Some(value.as_str()),
            _ => None,
        })
    }

    pub fn to_markup(&self, mode: RenderMode) -> String {
        let mut out = Markup::default();
        match mode {
            RenderMode::Print => {
                out.open("<Document>");
                out.open(r#"<Page size="LETTER" style="page">"#);
                out.line(&format!(r#"<Text style="title">{}</Text>"#, escape(&self.title)));
                for node in &self.body {
                    print_node(&mut out, node);
                }
                out.close("</Page>");
                out.close("</Document>");
            }
            RenderMode::Css => {
                out.open(r#"<div class="page">"#);
                out.line(&format!(r#"<h1 class="title">{}</h1>"#, escape(&self.title)));
                for node in &self.body {
                    css_node(&mut out, node);
                }
                out.close("</div>");
            }
        }
        out.finish()
    }
}

#[derive(Default)]
struct Markup {
    buf: String,
    depth: usize,
}

impl Markup {
    fn line(&mut self, s: &str) {
        for _ in 0..self.depth {
            self.buf.push_str("  ");
        }
        self.buf.push_str(s);
        self.buf.push('\n');
    }

    fn open(&mut self, s: &str) {
        self.line(s);
        self.depth += 1;
    }

    fn close(&mut self, s: &str) {
        self.depth = self.depth.saturating_sub(1);
        self.line(s);
    }

    fn finish(self) -> String {
        self.buf
    }
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

const BOX_CHECKED: char = '☒';
const BOX_EMPTY: char = '☐';

fn print_node(out: &mut Markup, node: &Node) {
    match node {
        Node::Heading { text } => {
            out.line(&format!(r#"<Text style="heading">{}</Text>"#, escape(text)))
        }
        Node::Section { title, children } => {
            out.open(r#"<View style="section">"#);
            out.line(&format!(r#"<Text style="sectionTitle">{}</Text>"#, escape(title)));
            for child in children {
                print_node(out, child);
            }
            out.close("</View>");
        }
        Node::Row { children } => {
            out.open(r#"<View style="row">"#);
            for child in children {
                print_node(out, child);
            }
            out.close("</View>");
        }
        Node::Field { label, value } => out.line(&format!(
            r#"<Text style="field"><Text style="label">{}:</Text> {}</Text>"#,
            escape(label),
            escape(value)
        )),
        Node::Checkbox { label, checked } => {
            let mark = if *checked { BOX_CHECKED } else { BOX_EMPTY };
            out.line(&format!(r#"<Text style="checkbox">{mark} {}</Text>"#, escape(label)))
        }
        Node::Signature { label, image } => {
            out.open(r#"<View style="signature">"#);
            match image {
                Some(src) => out.line(&format!(r#"<Image src="{}" />"#, escape(src))),
                None => out.line(r#"<View style="signatureLine" />"#),
            }
            out.line(&format!(r#"<Text style="label">{}</Text>"#, escape(label)));
            out.close("</View>");
        }
        Node::Text { text } => out.line(&format!("<Text>{}</Text>", escape(text))),
    }
}

fn css_node(out: &mut Markup, node: &Node) {
    match node {
        Node::Heading { text } => out.line(&format!("<h2>{}</h2>", escape(text))),
        Node::Section { title, children } => {
            out.open("<section>");
            out.line(&format!("<h3>{}</h3>", escape(title)));
            for child in children {
                css_node(out, child);
            }
            out.close("</section>");
        }
        Node::Row { children } => {
            out.open(r#"<div class="row">"#);
            for child in children {
                css_node(out, child);
            }
            out.close("</div>");
        }
        Node::Field { label, value } => out.line(&format!(
            r#"<div class="field"><span class="label">{}:</span> {}</div>"#,
            escape(label),
            escape(value)
        )),
        Node::Checkbox { label, checked } => out.line(&format!(
            r#"<label class="checkbox"><input type="checkbox" disabled{} /> {}</label>"#,
            if *checked { " checked" } else { "" },
            escape(label)
        )),
        Node::Signature { label, image } => {
            out.open(r#"<figure class="signature">"#);
            if let Some(src) = image {
                out.line(&format!(r#"<img src="{}" alt="{}" />"#, escape(src), escape(label)));
            }
            out.line(&format!("<figcaption>{}</figcaption>", escape(label)));
            out.close("</figure>");
        }
        Node::Text { text } => out.line(&format!("<p>{}</p>", escape(text))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Document {
        let mut doc = Document::new("Sample & Co");
        doc.push(Node::section(
            "Applicant",
            vec![
                Node::field("Name", "Dana <Rivera>"),
                Node::row(vec![Node::checkbox("Yes", true), Node::checkbox("No", false)]),
            ],
        ))
        .push(Node::signature("Inspector", None));
        doc
    }

    #[test]
    fn lookup_walks_nested_nodes() {
        let doc = sample();
        assert!(doc.has_section("Applicant"));
        assert_eq!(doc.checkbox("Yes"), Some(true));
        assert_eq!(doc.checkbox("No"), Some(false));
        assert_eq!(doc.field("Name"), Some("Dana <Rivera>"));
        assert_eq!(doc.checkbox("Maybe"), None);
    }

    #[test]
    fn print_markup_uses_print_primitives() {
        let markup = sample().to_markup(RenderMode::Print);
        assert!(markup.starts_with("<Document>\n"));
        assert!(markup.contains(r#"<Page size="LETTER""#));
        assert!(markup.contains("☒ Yes"));
        assert!(markup.contains("☐ No"));
        assert!(markup.contains("signatureLine"));
        assert!(!markup.contains("<div"));
    }

    #[test]
    fn css_markup_uses_plain_elements() {
        let markup = sample().to_markup(RenderMode::Css);
        assert!(markup.contains(r#"<input type="checkbox" disabled checked /> Yes"#));
        assert!(markup.contains(r#"<input type="checkbox" disabled /> No"#));
        assert!(!markup.contains("<Page"));
    }

    #[test]
    fn text_is_escaped() {
        let markup = sample().to_markup(RenderMode::Css);
        assert!(markup.contains("Sample &amp; Co"));
        assert!(markup.contains("Dana &lt;Rivera&gt;"));
    }

    #[test]
    fn signature_image_is_kept_when_present() {
        let node = Node::signature("Applicant", Some("data:image/png;base64,AA"));
        assert!(matches!(node, Node::Signature { image: Some(_), .. }));
        assert!(matches!(
            Node::signature("Applicant", Some("  ")),
            Node::Signature { image: None, .. }
        ));
    }
}
