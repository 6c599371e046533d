//! SVG document holding the label text as a `<text>` element.
//!
//! The outlining tool turns this into paths; the text itself is written
//! through quick-xml so markup characters in labels are escaped.

use std::io::Cursor;

use quick_xml::Writer;
use quick_xml::escape::partial_escape;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use crate::config::LabelOptions;
use crate::error::{LabelError, LabelResult};

/// Family name used for an embedded font file
const EMBEDDED_FAMILY: &str = "LabelFont";

/// Build the input SVG for the outlining tool (200mm x 50mm, 1 unit = 1mm)
pub fn text_svg(text: &str, options: &LabelOptions) -> LabelResult<String> {
    let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);

    let family = match &options.font_file {
        Some(_) => EMBEDDED_FAMILY.to_string(),
        None => options.font_family.clone(),
    };
    let font_size = format!("{}", options.font_size);

    let mut svg = BytesStart::new("svg");
    svg.push_attribute(("xmlns", "http://www.w3.org/2000/svg"));
    svg.push_attribute(("version", "1.1"));
    svg.push_attribute(("width", "200mm"));
    svg.push_attribute(("height", "50mm"));
    svg.push_attribute(("viewBox", "0 0 200 50"));

    let mut text_el = BytesStart::new("text");
    text_el.push_attribute(("x", "10"));
    text_el.push_attribute(("y", "35"));
    text_el.push_attribute(("xml:space", "preserve"));
    text_el.push_attribute(("font-family", family.as_str()));
    text_el.push_attribute(("font-size", font_size.as_str()));
    text_el.push_attribute(("fill", "black"));

    let mut events = vec![
        Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)),
        Event::Start(svg),
    ];

    if let Some(font_file) = &options.font_file {
        let absolute = std::path::absolute(font_file).unwrap_or_else(|_| font_file.clone());
        let css = format!(
            "@font-face {{ font-family: '{}'; src: url('file://{}'); }}",
            EMBEDDED_FAMILY,
            absolute.display()
        );
        let mut style = BytesStart::new("style");
        style.push_attribute(("type", "text/css"));
        events.push(Event::Start(BytesStart::new("defs")));
        events.push(Event::Start(style));
        events.push(Event::Text(
            BytesText::from_escaped(partial_escape(&css)).into_owned(),
        ));
        events.push(Event::End(BytesEnd::new("style")));
        events.push(Event::End(BytesEnd::new("defs")));
    }

    events.push(Event::Start(text_el));
    events.push(Event::Text(BytesText::new(text)));
    events.push(Event::End(BytesEnd::new("text")));
    events.push(Event::End(BytesEnd::new("svg")));

    for event in events {
        writer
            .write_event(event)
            .map_err(|e| LabelError::TextSvg(e.to_string()))?;
    }

    String::from_utf8(writer.into_inner().into_inner())
        .map_err(|e| LabelError::TextSvg(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_text_element() {
        let svg = text_svg("Socket Wrenches", &LabelOptions::default()).unwrap();
        assert!(svg.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(svg.contains(r#"viewBox="0 0 200 50""#));
        assert!(svg.contains(r#"font-size="16""#));
        assert!(svg.contains(r#"font-family="sans-serif""#));
        assert!(svg.contains(">Socket Wrenches</text>"));
        assert!(!svg.contains("@font-face"));
    }

    #[test]
    fn test_markup_is_escaped() {
        let svg = text_svg("Nuts & <Bolts>", &LabelOptions::default()).unwrap();
        assert!(svg.contains("Nuts &amp; &lt;Bolts&gt;"));
        // Still parses as SVG
        assert!(usvg::Tree::from_str(&svg, &usvg::Options::default()).is_ok());
    }

    #[test]
    fn test_font_file_embedded() {
        let options = LabelOptions {
            font_file: Some(PathBuf::from("/fonts/Inter.ttf")),
            ..Default::default()
        };
        let svg = text_svg("M8", &options).unwrap();
        assert!(svg.contains("@font-face"));
        assert!(svg.contains("url('file:///fonts/Inter.ttf')"));
        assert!(svg.contains(r#"font-family="LabelFont""#));
    }
}
