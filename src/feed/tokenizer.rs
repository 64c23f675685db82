//! Pull-based XML event source backed by `quick-xml`.
//!
//! The feed engine only understands three kinds of events: element open,
//! element close and character data. [`XmlTokenizer`] reduces the richer
//! `quick-xml` event stream to those three, resolving every element and
//! attribute name against the in-scope namespace declarations.

use std::io::BufRead;

use quick_xml::events::{BytesStart, Event};
use quick_xml::name::ResolveResult;
use quick_xml::reader::NsReader;

use super::parser::FeedError;

/// An element or attribute name as it appeared in the document.
///
/// `namespace` holds the resolved namespace URI (not the prefix), or an
/// empty string when the name is not bound to any namespace.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlName {
    pub local: String,
    pub namespace: String,
}

impl XmlName {
    pub fn new(local: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            local: local.into(),
            namespace: namespace.into(),
        }
    }

    /// A name outside of any namespace.
    pub fn unqualified(local: impl Into<String>) -> Self {
        Self::new(local, "")
    }
}

/// A single attribute of an element-open event, value already unescaped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlAttribute {
    pub name: XmlName,
    pub value: String,
}

impl XmlAttribute {
    pub fn new(name: XmlName, value: impl Into<String>) -> Self {
        Self {
            name,
            value: value.into(),
        }
    }
}

/// The event vocabulary consumed by the feed engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlEvent {
    /// Element open. Attributes keep document order.
    Start {
        name: XmlName,
        attributes: Vec<XmlAttribute>,
    },
    /// Element close.
    End { name: XmlName },
    /// Character data (plain text or CDATA), unescaped.
    Text(String),
}

/// Adapts a `quick-xml` namespace-aware reader into an iterator of
/// [`XmlEvent`]s.
///
/// Self-closing elements (`<link href="..."/>`) are reported as a `Start`
/// immediately followed by an `End`. Comments, processing instructions,
/// declarations and doctypes are skipped.
///
/// The iterator is fused: after it yields an error or reaches end of
/// input it only returns `None`.
///
/// # Security
///
/// SEC-002: `quick-xml` (0.37) never expands `<!ENTITY>` declarations.
/// Only the five predefined entities and character references are
/// resolved when unescaping; anything else fails with an error.
pub struct XmlTokenizer<R> {
    reader: NsReader<R>,
    buf: Vec<u8>,
    pending_end: Option<XmlName>,
    finished: bool,
}

impl<R: BufRead> XmlTokenizer<R> {
    pub fn new(source: R) -> Self {
        Self {
            reader: NsReader::from_reader(source),
            buf: Vec::new(),
            pending_end: None,
            finished: false,
        }
    }

    fn read_next(&mut self) -> Result<Option<XmlEvent>, FeedError> {
        if let Some(name) = self.pending_end.take() {
            return Ok(Some(XmlEvent::End { name }));
        }

        loop {
            self.buf.clear();
            let (namespace, event) = {
                let (resolved, event) = self.reader.read_resolved_event_into(&mut self.buf)?;
                (namespace_uri(&resolved), event)
            };

            match event {
                Event::Start(e) => {
                    let name = XmlName::new(lossy(e.local_name().as_ref()), namespace);
                    let attributes = read_attributes(&self.reader, &e)?;
                    return Ok(Some(XmlEvent::Start { name, attributes }));
                }
                Event::Empty(e) => {
                    let name = XmlName::new(lossy(e.local_name().as_ref()), namespace);
                    let attributes = read_attributes(&self.reader, &e)?;
                    self.pending_end = Some(name.clone());
                    return Ok(Some(XmlEvent::Start { name, attributes }));
                }
                Event::End(e) => {
                    let name = XmlName::new(lossy(e.local_name().as_ref()), namespace);
                    return Ok(Some(XmlEvent::End { name }));
                }
                Event::Text(e) => {
                    let text = e.unescape()?;
                    return Ok(Some(XmlEvent::Text(text.into_owned())));
                }
                Event::CData(e) => {
                    let text = lossy(&e.into_inner());
                    return Ok(Some(XmlEvent::Text(text)));
                }
                Event::Eof => return Ok(None),
                _ => {}
            }
        }
    }
}

impl<R: BufRead> Iterator for XmlTokenizer<R> {
    type Item = Result<XmlEvent, FeedError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.read_next() {
            Ok(Some(event)) => Some(Ok(event)),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}

fn read_attributes<R>(
    reader: &NsReader<R>,
    start: &BytesStart<'_>,
) -> Result<Vec<XmlAttribute>, FeedError> {
    let mut attributes = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        // xmlns / xmlns:prefix declarations are consumed by the resolver
        if attr.key.as_namespace_binding().is_some() {
            continue;
        }
        let (resolved, local) = reader.resolve_attribute(attr.key);
        let name = XmlName::new(lossy(local.as_ref()), namespace_uri(&resolved));
        let value = attr.decode_and_unescape_value(reader.decoder())?;
        attributes.push(XmlAttribute::new(name, value));
    }
    Ok(attributes)
}

fn namespace_uri(resolved: &ResolveResult<'_>) -> String {
    match resolved {
        ResolveResult::Bound(ns) => lossy(ns.as_ref()),
        ResolveResult::Unbound | ResolveResult::Unknown(_) => String::new(),
    }
}

fn lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}
