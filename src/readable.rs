//! Readable extraction: a page's short title and its main content as plain text.
//!
//! Links keep only their text, images are dropped and emphasis markup
//! disappears. Navigation, scripts and other page furniture are skipped.

use scraper::{node::Node, ElementRef, Html, Selector};

/// Containers that usually hold the article body, most specific first.
const CONTENT_SELECTORS: [&str; 6] = [
    "article",
    "main",
    "[role=main]",
    ".entry-content",
    ".post-content",
    "#content",
];

const SKIPPED: [&str; 19] = [
    "script", "style", "noscript", "template", "nav", "footer", "aside", "form",
    "button", "input", "select", "textarea", "iframe", "img", "picture", "svg", "video",
    "audio", "canvas",
];

const BLOCKS: [&str; 16] = [
    "p", "div", "section", "article", "main", "blockquote", "ul", "ol", "dl", "dt", "dd",
    "table", "tr", "figure", "figcaption", "hr",
];

const TITLE_SEPARATORS: [&str; 6] = [" | ", " - ", " \u{2013} ", " \u{2014} ", " :: ", " \u{bb} "];

pub struct Document {
    html: Html,
}

impl Document {
    pub fn parse(markup: &str) -> Self {
        Self {
            html: Html::parse_document(markup),
        }
    }

    pub fn title(&self) -> String {
        let title = self
            .first("title")
            .map(|el| collapse(&el.text().collect::<String>()))
            .filter(|t| !t.is_empty());

        title
            .or_else(|| {
                self.first("meta[property=\"og:title\"]")
                    .and_then(|el| el.value().attr("content"))
                    .map(collapse)
            })
            .or_else(|| {
                self.first("h1")
                    .map(|el| collapse(&el.text().collect::<String>()))
            })
            .unwrap_or_default()
    }

    /// The title without the site name, when the site name is split off
    /// by a separator such as `|` or `-`.
    pub fn short_title(&self) -> String {
        shorten_title(&self.title())
    }

    /// The main content rendered as plain text.
    pub fn summary(&self) -> String {
        let root = self
            .content_root()
            .unwrap_or_else(|| self.html.root_element());
        // Inside a content container a header carries the byline; at page
        // level it is the site banner.
        let mut renderer = Renderer {
            keep_header: !matches!(root.value().name(), "body" | "html"),
            ..Renderer::default()
        };
        renderer.children(root);
        renderer.finish()
    }

    fn first(&self, css: &str) -> Option<ElementRef<'_>> {
        let selector = Selector::parse(css).ok()?;
        self.html.select(&selector).next()
    }

    fn content_root(&self) -> Option<ElementRef<'_>> {
        let explicit = CONTENT_SELECTORS
            .iter()
            .filter_map(|css| self.first(css))
            .find(|el| paragraph_len(*el) > 0);
        if explicit.is_some() {
            return explicit;
        }

        // Otherwise the container with the most paragraph text.
        let selector = Selector::parse("div, section, td, body").ok()?;
        let mut best = None;
        let mut best_len = 0;
        for el in self.html.select(&selector) {
            let len = paragraph_len(el);
            if len > best_len {
                best = Some(el);
                best_len = len;
            }
        }
        best.or_else(|| self.first("body"))
    }
}

/// Text length of the direct `<p>` children of `element`.
fn paragraph_len(element: ElementRef) -> usize {
    element
        .children()
        .filter_map(ElementRef::wrap)
        .filter(|child| child.value().name() == "p")
        .map(|p| p.text().map(|t| t.trim().len()).sum::<usize>())
        .sum()
}

fn shorten_title(title: &str) -> String {
    let parts: Vec<&str> = TITLE_SEPARATORS
        .iter()
        .fold(vec![title], |parts, sep| {
            parts.into_iter().flat_map(|part| part.split(*sep)).collect()
        });

    if parts.len() < 2 {
        return title.to_string();
    }

    parts
        .into_iter()
        .map(str::trim)
        .max_by_key(|part| part.len())
        .filter(|part| part.split_whitespace().count() >= 2)
        .unwrap_or(title)
        .to_string()
}

fn collapse(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[derive(Default)]
struct Renderer {
    out: String,
    space_pending: bool,
    keep_header: bool,
}

impl Renderer {
    fn children(&mut self, element: ElementRef) {
        for child in element.children() {
            match child.value() {
                Node::Text(text) => self.text(text),
                Node::Element(_) => {
                    if let Some(el) = ElementRef::wrap(child) {
                        self.element(el);
                    }
                }
                _ => {}
            }
        }
    }

    fn element(&mut self, el: ElementRef) {
        let name = el.value().name();
        if SKIPPED.contains(&name) || (name == "header" && !self.keep_header) {
            return;
        }

        match name {
            "br" => self.line_break(),
            "pre" => {
                self.block();
                self.raw(el.text().collect::<String>().trim_end());
                self.block();
            }
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                let level = name[1..].parse::<usize>().unwrap_or(1);
                self.block();
                self.raw(&format!("{} ", "#".repeat(level)));
                self.children(el);
                self.block();
            }
            "li" => {
                self.line_break();
                self.raw("  * ");
                self.children(el);
                self.line_break();
            }
            _ if name == "header" || BLOCKS.contains(&name) => {
                self.block();
                self.children(el);
                self.block();
            }
            // Inline markup (links, emphasis, spans) contributes only its text.
            _ => self.children(el),
        }
    }

    fn at_line_start(&self) -> bool {
        self.out.is_empty() || self.out.ends_with('\n')
    }

    fn text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if text.starts_with(char::is_whitespace) {
            self.space_pending = true;
        }

        for word in text.split_whitespace() {
            if self.space_pending && !self.at_line_start() && !self.out.ends_with(' ') {
                self.out.push(' ');
            }
            self.out.push_str(word);
            self.space_pending = true;
        }

        self.space_pending = text.ends_with(char::is_whitespace);
    }

    fn raw(&mut self, text: &str) {
        self.out.push_str(text);
        self.space_pending = false;
    }

    fn line_break(&mut self) {
        self.trim_spaces();
        if !self.at_line_start() {
            self.out.push('\n');
        }
        self.space_pending = false;
    }

    fn block(&mut self) {
        self.trim_spaces();
        if !self.out.is_empty() {
            while !self.out.ends_with("\n\n") {
                self.out.push('\n');
            }
        }
        self.space_pending = false;
    }

    fn trim_spaces(&mut self) {
        let trimmed = self.out.trim_end_matches(' ').len();
        self.out.truncate(trimmed);
    }

    fn finish(self) -> String {
        let mut text = self.out.trim().to_string();
        text.push('\n');
        text
    }
}
