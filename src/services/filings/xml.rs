/// Minimal XML document builder for the filing envelopes. The documents are
/// small and fully generated, so a tree plus a pretty writer covers every
/// need without a streaming serializer.
#[derive(Debug, Clone)]
pub struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<Node>,
}

#[derive(Debug, Clone)]
enum Node {
    Element(Element),
    Text(String),
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

impl Element {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attributes.push((name.to_string(), value.to_string()));
        self
    }

    /// Appends a child element and returns a handle to it for nesting.
    pub fn push(&mut self, name: &str) -> &mut Element {
        self.children.push(Node::Element(Element::new(name)));
        match self.children.last_mut() {
            Some(Node::Element(element)) => element,
            _ => unreachable!(),
        }
    }

    pub fn push_child(&mut self, child: Element) {
        self.children.push(Node::Element(child));
    }

    /// Appends `<name>text</name>` as a leaf.
    pub fn push_text(&mut self, name: &str, text: impl AsRef<str>) {
        let mut leaf = Element::new(name);
        leaf.children.push(Node::Text(text.as_ref().to_string()));
        self.children.push(Node::Element(leaf));
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    pub fn to_pretty_string(&self) -> String {
        let mut out = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        self.write(&mut out, 0);
        out
    }

    fn write(&self, out: &mut String, depth: usize) {
        let indent = "  ".repeat(depth);
        out.push_str(&indent);
        out.push('<');
        out.push_str(&self.name);
        for (name, value) in &self.attributes {
            out.push(' ');
            out.push_str(name);
            out.push_str("=\"");
            out.push_str(&escape(value));
            out.push('"');
        }

        if self.children.is_empty() {
            out.push_str(" />\n");
            return;
        }

        // a single text node stays on one line
        if let [Node::Text(text)] = self.children.as_slice() {
            out.push('>');
            out.push_str(&escape(text));
            out.push_str("</");
            out.push_str(&self.name);
            out.push_str(">\n");
            return;
        }

        out.push_str(">\n");
        for child in &self.children {
            match child {
                Node::Element(element) => element.write(out, depth + 1),
                Node::Text(text) => {
                    out.push_str(&"  ".repeat(depth + 1));
                    out.push_str(&escape(text));
                    out.push('\n');
                }
            }
        }
        out.push_str(&indent);
        out.push_str("</");
        out.push_str(&self.name);
        out.push_str(">\n");
    }
}
