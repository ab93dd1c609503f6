//! Small helpers over roxmltree shared by the XML dialects.

use std::str::FromStr;

use roxmltree::Node;

use super::error::ParseError;

/// Text of the first child element named `tag`.
pub(crate) fn child_text<'a>(node: Node<'a, '_>, tag: &str) -> Option<&'a str> {
    node.children()
        .find(|n| n.has_tag_name(tag))
        .and_then(|n| n.text())
        .map(str::trim)
}

/// Parse the text of a required child element.
pub(crate) fn parse_child<T: FromStr>(
    node: Node<'_, '_>,
    tag: &'static str,
) -> Result<T, ParseError> {
    let text = child_text(node, tag).ok_or(ParseError::MissingField(tag))?;
    text.parse().map_err(|_| ParseError::invalid(tag, text))
}

/// Parse a required attribute.
pub(crate) fn parse_attr<T: FromStr>(
    node: Node<'_, '_>,
    name: &'static str,
) -> Result<T, ParseError> {
    let value = node.attribute(name).ok_or(ParseError::MissingField(name))?;
    value.trim().parse().map_err(|_| ParseError::invalid(name, value))
}

/// Require the document root to be `<tag>`.
pub(crate) fn expect_root<'a, 'input>(
    doc: &'a roxmltree::Document<'input>,
    tag: &'static str,
) -> Result<Node<'a, 'input>, ParseError> {
    let root = doc.root_element();
    if root.has_tag_name(tag) {
        Ok(root)
    } else {
        Err(ParseError::MissingField(tag))
    }
}
