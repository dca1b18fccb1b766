//! Visible-text extraction from HTML-wrapped input, backed by `scraper`.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Node, Selector};

static BODY: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("body").expect("static selector must parse"));

static RE_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<.*?>").unwrap());

/// Elements whose text never reaches the reader.
const HIDDEN_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

/// Text of `<body>` with script and style content removed.
///
/// Plain text without markup parses into an implicit body and comes back
/// as-is. Input without a body element is returned unchanged.
pub fn visible_text(input: &str) -> String {
    let document = Html::parse_document(input);
    let Some(body) = document.select(&BODY).next() else {
        return input.to_string();
    };

    let mut out = String::with_capacity(input.len());
    for node in body.descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };
        let hidden = node.ancestors().any(|a| match a.value() {
            Node::Element(el) => HIDDEN_ELEMENTS.contains(&el.name()),
            _ => false,
        });
        if !hidden {
            out.push_str(text);
        }
    }
    out
}

/// Split on whitespace runs and rejoin with single spaces.
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Remove every `<...>` tag from a span.
pub fn strip_tags(s: &str) -> String {
    RE_TAG.replace_all(s, "").into_owned()
}
