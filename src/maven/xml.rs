use crate::error::{CopilotError, Result};
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

/// Node of a parsed XML document. Text, comments and attribute values are kept
/// in their escaped form so they are written back exactly as read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
    Comment(String),
    CData(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_text(name: impl Into<String>, text: &str) -> Self {
        let mut element = Self::new(name);
        element.set_text(text);
        element
    }

    fn from_start(start: &BytesStart<'_>) -> Result<Self> {
        let mut element = Self::new(String::from_utf8_lossy(start.name().as_ref()));
        for attribute in start.attributes() {
            let attribute = attribute.map_err(quick_xml::Error::from)?;
            element.attributes.push((
                String::from_utf8_lossy(attribute.key.as_ref()).into_owned(),
                String::from_utf8_lossy(&attribute.value).into_owned(),
            ));
        }
        Ok(element)
    }

    pub fn child(&self, name: &str) -> Option<&Element> {
        self.elements().find(|e| e.name == name)
    }

    pub fn child_mut(&mut self, name: &str) -> Option<&mut Element> {
        self.elements_mut().find(|e| e.name == name)
    }

    /// Follows a path of child names, taking the first match at each level.
    pub fn descendant(&self, path: &[&str]) -> Option<&Element> {
        path.iter()
            .try_fold(self, |element, name| element.child(name))
    }

    pub fn descendant_mut(&mut self, path: &[&str]) -> Option<&mut Element> {
        let mut current = self;
        for name in path {
            current = current.child_mut(name)?;
        }
        Some(current)
    }

    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(e) => Some(e),
            _ => None,
        })
    }

    pub fn elements_mut(&mut self) -> impl Iterator<Item = &mut Element> {
        self.children.iter_mut().filter_map(|node| match node {
            Node::Element(e) => Some(e),
            _ => None,
        })
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> {
        self.elements().filter(move |e| e.name == name)
    }

    /// Returns the child with the given name, appending an empty one if absent.
    pub fn ensure_child(&mut self, name: &str) -> &mut Element {
        self.ensure_child_before(name, &[])
    }

    /// Like `ensure_child`, but a new child goes in front of the first of
    /// `successors` present, along with the comments directly above it.
    pub fn ensure_child_before(&mut self, name: &str, successors: &[&str]) -> &mut Element {
        let index = match self
            .children
            .iter()
            .position(|node| matches!(node, Node::Element(e) if e.name == name))
        {
            Some(index) => index,
            None => {
                let successor = self.children.iter().position(|node| {
                    matches!(node, Node::Element(e) if successors.contains(&e.name.as_str()))
                });
                let mut position = successor.unwrap_or(self.children.len());
                if successor.is_some() {
                    while position > 0 && matches!(self.children[position - 1], Node::Comment(_)) {
                        position -= 1;
                    }
                }
                self.children.insert(position, Node::Element(Element::new(name)));
                position
            }
        };

        if let Node::Element(element) = &mut self.children[index] {
            return element;
        }
        unreachable!("index points at an element node")
    }

    /// Trimmed text content in escaped form, `None` for elements without text.
    pub fn text(&self) -> Option<&str> {
        self.children.iter().find_map(|node| match node {
            Node::Text(text) => Some(text.trim()),
            _ => None,
        })
    }

    pub fn child_text(&self, name: &str) -> Option<&str> {
        self.child(name).and_then(Element::text)
    }

    /// Replaces all content with the given (unescaped) text.
    pub fn set_text(&mut self, value: &str) {
        self.children = vec![Node::Text(quick_xml::escape::escape(value).into_owned())];
    }

    /// Visits every text node and attribute value below this element.
    pub fn visit_text<'a>(&'a self, visitor: &mut dyn FnMut(&'a str)) {
        for (_, value) in &self.attributes {
            visitor(value);
        }
        for node in &self.children {
            match node {
                Node::Element(e) => e.visit_text(visitor),
                Node::Text(text) | Node::CData(text) => visitor(text),
                Node::Comment(_) => {}
            }
        }
    }

    fn push_raw_text(&mut self, raw: &str) {
        if let Some(Node::Text(existing)) = self.children.last_mut() {
            existing.push_str(raw);
        } else {
            self.children.push(Node::Text(raw.to_string()));
        }
    }

    /// Drops formatting whitespace so the writer can re-indent.
    fn normalize_whitespace(&mut self) {
        self.children.retain(|node| match node {
            Node::Text(text) => !text.trim().is_empty(),
            _ => true,
        });
        for node in &mut self.children {
            if let Node::Text(text) = node {
                *text = text.trim().to_string();
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlDocument {
    /// Comments appearing before the root element.
    pub prolog: Vec<Node>,
    pub root: Element,
}

impl XmlDocument {
    pub fn parse(content: &str) -> Result<Self> {
        let mut reader = Reader::from_str(content);
        let mut stack: Vec<Element> = Vec::new();
        let mut prolog = Vec::new();
        let mut root: Option<Element> = None;

        loop {
            match reader.read_event()? {
                Event::Start(start) => stack.push(Element::from_start(&start)?),
                Event::Empty(start) => {
                    let element = Element::from_start(&start)?;
                    attach(&mut stack, &mut root, element)?;
                }
                Event::End(_) => {
                    let mut element = stack.pop().ok_or_else(|| {
                        CopilotError::DescriptorParsing("unexpected closing tag".into())
                    })?;
                    element.normalize_whitespace();
                    attach(&mut stack, &mut root, element)?;
                }
                Event::Text(text) => {
                    if let Some(parent) = stack.last_mut() {
                        parent.push_raw_text(&String::from_utf8_lossy(&text));
                    }
                }
                Event::GeneralRef(reference) => {
                    if let Some(parent) = stack.last_mut() {
                        parent.push_raw_text(&format!("&{};", String::from_utf8_lossy(&reference)));
                    }
                }
                Event::CData(data) => {
                    if let Some(parent) = stack.last_mut() {
                        parent
                            .children
                            .push(Node::CData(String::from_utf8_lossy(&data).into_owned()));
                    }
                }
                Event::Comment(comment) => {
                    let node = Node::Comment(String::from_utf8_lossy(&comment).into_owned());
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(node),
                        None if root.is_none() => prolog.push(node),
                        None => {}
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if let Some(open) = stack.last() {
            return Err(CopilotError::DescriptorParsing(format!(
                "element <{}> is never closed",
                open.name
            )));
        }

        let root = root
            .ok_or_else(|| CopilotError::DescriptorParsing("document has no root element".into()))?;

        Ok(Self { prolog, root })
    }

    /// Serializes with an XML declaration and four space indentation.
    pub fn to_xml(&self) -> Result<String> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 4);
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        for node in &self.prolog {
            write_node(&mut writer, node)?;
        }
        write_element(&mut writer, &self.root)?;

        let mut bytes = writer.into_inner();
        bytes.push(b'\n');
        String::from_utf8(bytes).map_err(|e| CopilotError::DescriptorParsing(e.to_string()))
    }
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, element: Element) -> Result<()> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(Node::Element(element)),
        None if root.is_none() => *root = Some(element),
        None => {
            return Err(CopilotError::DescriptorParsing(format!(
                "unexpected second root element <{}>",
                element.name
            )));
        }
    }
    Ok(())
}

fn write_node(writer: &mut Writer<Vec<u8>>, node: &Node) -> Result<()> {
    match node {
        Node::Element(element) => write_element(writer, element)?,
        Node::Text(text) => writer.write_event(Event::Text(BytesText::from_escaped(text.as_str())))?,
        Node::Comment(comment) => {
            writer.write_event(Event::Comment(BytesText::from_escaped(comment.as_str())))?
        }
        Node::CData(data) => writer.write_event(Event::CData(BytesCData::new(data.as_str())))?,
    }
    Ok(())
}

fn write_element(writer: &mut Writer<Vec<u8>>, element: &Element) -> Result<()> {
    let mut start = BytesStart::new(element.name.as_str());
    for (key, value) in &element.attributes {
        start.push_attribute((key.as_bytes(), value.as_bytes()));
    }

    if element.children.is_empty() {
        writer.write_event(Event::Empty(start))?;
        return Ok(());
    }

    writer.write_event(Event::Start(start))?;
    for child in &element.children {
        write_node(writer, child)?;
    }
    writer.write_event(Event::End(BytesEnd::new(element.name.as_str())))?;
    Ok(())
}
