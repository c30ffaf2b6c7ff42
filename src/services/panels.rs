//! Part descriptor rewriting.
//!
//! Each `.xml` job file describes a project and its panels. Before a file goes onto the
//! work list, every panel's `Name` attribute is recomputed from its dimensions as
//! `LENGTH_WIDTH_THICKNESS` (no decimals). The document is streamed event by event so
//! machining data, edge groups and anything else we do not model survive untouched.

use crate::services::manifest::XML_HEADER;
use camino::Utf8Path;
use quick_xml::events::attributes::Attribute;
use quick_xml::events::{BytesDecl, BytesStart, Event};
use quick_xml::{Reader, Writer};
use std::fs;
use thiserror::Error;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

#[derive(Error, Debug)]
pub enum PanelError {
    #[error("Malformed part document: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Failed to serialize part document: {0}")]
    Io(#[from] std::io::Error),

    #[error("Part document is not valid UTF-8: {0}")]
    NotUtf8(#[from] std::str::Utf8Error),

    #[error("Part document declares encoding '{0}', only UTF-8 is supported")]
    UnsupportedEncoding(String),

    #[error("Failed to read part file {path}: {source}")]
    ReadFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write part file {path}: {source}")]
    WriteFile {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// One panel as found in the document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PanelRecord {
    pub id: String,
    /// Name after the rewrite (unchanged if the panel was skipped)
    pub name: String,
    pub width: String,
    pub length: String,
    pub thickness: String,
}

/// Projection of a part descriptor: project metadata plus its panels in order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartDescriptor {
    pub project_name: String,
    pub project_flag: String,
    pub panels: Vec<PanelRecord>,
}

/// Result of rewriting one document
#[derive(Debug, Clone)]
pub struct PanelRewrite {
    /// Complete document, starting with the UTF-8 header
    pub document: Vec<u8>,
    /// True if at least one panel name changed
    pub dirty: bool,
    /// Panels left alone because a dimension did not parse
    pub skipped_panels: usize,
    pub descriptor: PartDescriptor,
}

/// Parse a dimension, accepting `,` as the decimal separator.
pub fn parse_dimension(raw: &str) -> Option<f64> {
    raw.replacen(',', ".", 1).parse::<f64>().ok()
}

/// Computed panel name: the three dimensions rounded to whole numbers.
pub fn panel_name(length: f64, width: f64, thickness: f64) -> String {
    format!("{:.0}_{:.0}_{:.0}", length, width, thickness)
}

fn computed_name(panel: &PanelRecord) -> Option<String> {
    let width = parse_dimension(&panel.width)?;
    let length = parse_dimension(&panel.length)?;
    let thickness = parse_dimension(&panel.thickness)?;
    Some(panel_name(length, width, thickness))
}

fn attribute_value(attributes: &[Attribute<'_>], key: &[u8]) -> Option<String> {
    attributes
        .iter()
        .find(|attr| attr.key.as_ref() == key)
        .and_then(|attr| attr.unescape_value().ok())
        .map(|value| value.into_owned())
}

fn collect_attributes<'a>(start: &'a BytesStart<'_>) -> Result<Vec<Attribute<'a>>, PanelError> {
    let mut attributes = Vec::new();
    for attr in start.attributes() {
        attributes.push(attr.map_err(quick_xml::Error::from)?);
    }
    Ok(attributes)
}

enum ElementKind {
    Project,
    Panel,
    Other,
}

/// Streaming state for one document
#[derive(Default)]
struct Rewriter {
    stack: Vec<Vec<u8>>,
    descriptor: PartDescriptor,
    dirty: bool,
    skipped_panels: usize,
}

impl Rewriter {
    /// Record what we model about `start` and return the element to write.
    fn visit<'i>(&mut self, start: BytesStart<'i>) -> Result<BytesStart<'i>, PanelError> {
        let kind = match (start.name().as_ref(), self.stack.last().map(Vec::as_slice)) {
            (b"Project", _) => ElementKind::Project,
            (b"Panel", Some(b"Panels")) => ElementKind::Panel,
            _ => ElementKind::Other,
        };

        match kind {
            ElementKind::Project => {
                self.read_project(&start)?;
                Ok(start)
            }
            ElementKind::Panel => match self.rewrite_panel(&start)? {
                Some(patched) => Ok(patched),
                None => Ok(start),
            },
            ElementKind::Other => Ok(start),
        }
    }

    fn read_project(&mut self, start: &BytesStart<'_>) -> Result<(), PanelError> {
        let attributes = collect_attributes(start)?;
        self.descriptor.project_name = attribute_value(&attributes, b"Name").unwrap_or_default();
        self.descriptor.project_flag = attribute_value(&attributes, b"Flag").unwrap_or_default();
        Ok(())
    }

    /// Returns the patched element, or `None` when the panel stays as it is.
    fn rewrite_panel(
        &mut self,
        start: &BytesStart<'_>,
    ) -> Result<Option<BytesStart<'static>>, PanelError> {
        let attributes = collect_attributes(start)?;
        let mut panel = PanelRecord {
            id: attribute_value(&attributes, b"ID").unwrap_or_default(),
            name: attribute_value(&attributes, b"Name").unwrap_or_default(),
            width: attribute_value(&attributes, b"Width").unwrap_or_default(),
            length: attribute_value(&attributes, b"Length").unwrap_or_default(),
            thickness: attribute_value(&attributes, b"Thickness").unwrap_or_default(),
        };
        let has_name = attributes.iter().any(|attr| attr.key.as_ref() == b"Name");

        let Some(new_name) = computed_name(&panel) else {
            tracing::warn!(
                "Panel ID='{}': cannot parse Length ('{}'), Width ('{}') or Thickness ('{}'); name left unchanged",
                panel.id,
                panel.length,
                panel.width,
                panel.thickness
            );
            self.skipped_panels += 1;
            self.descriptor.panels.push(panel);
            return Ok(None);
        };

        if has_name && new_name == panel.name {
            self.descriptor.panels.push(panel);
            return Ok(None);
        }

        let mut patched = start.clone().into_owned();
        patched.clear_attributes();
        for attr in &attributes {
            if attr.key.as_ref() == b"Name" {
                patched.push_attribute(("Name", new_name.as_str()));
            } else {
                patched.push_attribute(attr.clone());
            }
        }
        if !has_name {
            patched.push_attribute(("Name", new_name.as_str()));
        }

        tracing::debug!("Panel ID='{}': '{}' -> '{}'", panel.id, panel.name, new_name);
        panel.name = new_name;
        self.descriptor.panels.push(panel);
        self.dirty = true;
        Ok(Some(patched))
    }
}

/// The output header says UTF-8, so anything declared otherwise is refused.
fn check_declared_encoding(decl: &BytesDecl<'_>) -> Result<(), PanelError> {
    if let Some(Ok(encoding)) = decl.encoding() {
        let encoding = String::from_utf8_lossy(&encoding);
        if !encoding.eq_ignore_ascii_case("utf-8") && !encoding.eq_ignore_ascii_case("utf8") {
            return Err(PanelError::UnsupportedEncoding(encoding.into_owned()));
        }
    }
    Ok(())
}

/// Recompute panel names in a part descriptor document.
///
/// The returned document always carries the fixed header; the input's own XML
/// declaration is dropped. Input that is not UTF-8, or declares another encoding, is
/// an error and nothing is rewritten.
pub fn rewrite_part_document(input: &[u8]) -> Result<PanelRewrite, PanelError> {
    let input = input.strip_prefix(UTF8_BOM).unwrap_or(input);
    std::str::from_utf8(input)?;
    let mut reader = Reader::from_reader(input);
    let mut writer = Writer::new(Vec::with_capacity(input.len() + XML_HEADER.len() + 1));
    let mut rewriter = Rewriter::default();
    let mut after_declaration = false;

    loop {
        let event = reader.read_event()?;
        let skip_blank = std::mem::take(&mut after_declaration);

        match event {
            Event::Eof => break,
            Event::Decl(decl) => {
                check_declared_encoding(&decl)?;
                after_declaration = true;
            }
            Event::Text(ref text) if skip_blank && text.iter().all(u8::is_ascii_whitespace) => {}
            Event::Start(start) => {
                let element_name = start.name().as_ref().to_vec();
                let element = rewriter.visit(start)?;
                rewriter.stack.push(element_name);
                writer.write_event(Event::Start(element))?;
            }
            Event::Empty(start) => {
                let element = rewriter.visit(start)?;
                writer.write_event(Event::Empty(element))?;
            }
            Event::End(end) => {
                rewriter.stack.pop();
                writer.write_event(Event::End(end))?;
            }
            other => writer.write_event(other)?,
        }
    }

    let mut document = Vec::with_capacity(input.len() + XML_HEADER.len() + 1);
    document.extend_from_slice(XML_HEADER.as_bytes());
    document.push(b'\n');
    document.extend_from_slice(&writer.into_inner());

    Ok(PanelRewrite {
        document,
        dirty: rewriter.dirty,
        skipped_panels: rewriter.skipped_panels,
        descriptor: rewriter.descriptor,
    })
}

/// Rewrite a part file in place. The file is only written when a name changed.
pub fn rewrite_part_file(path: &Utf8Path) -> Result<PanelRewrite, PanelError> {
    let bytes = fs::read(path).map_err(|source| PanelError::ReadFile {
        path: path.to_string(),
        source,
    })?;

    let rewrite = rewrite_part_document(&bytes)?;

    if rewrite.dirty {
        fs::write(path, &rewrite.document).map_err(|source| PanelError::WriteFile {
            path: path.to_string(),
            source,
        })?;
        tracing::info!("Updated panel names in {}", path);
    } else {
        tracing::debug!("Panel names already up to date in {}", path);
    }

    Ok(rewrite)
}
