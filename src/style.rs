//! Inline style parsing for content nodes.
//!
//! Han-Ji pages encode paragraph structure in `text-indent` and
//! `padding-left` declarations on each line's `<div>`. Only the numeric
//! magnitude matters: `2em`, `2px` and `2` all read as 2. Values are rounded
//! to the nearest integer.

use cssparser::{
    AtRuleParser, DeclarationParser, ParseError, Parser, ParserInput, QualifiedRuleParser,
    RuleBodyItemParser, RuleBodyParser, Token,
};

/// Indentation cues of one content node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Layout {
    pub indent: i32,
    pub padding: i32,
}

impl Layout {
    pub const fn new(indent: i32, padding: i32) -> Self {
        Self { indent, padding }
    }

    /// Parse an inline `style` attribute value.
    ///
    /// Missing or unparseable properties read as 0. When a property is
    /// declared more than once, the last declaration wins.
    pub fn from_style(style: &str) -> Self {
        let mut layout = Layout::default();
        let mut input = ParserInput::new(style);
        let mut parser = Parser::new(&mut input);
        let mut decl_parser = LayoutParser {
            layout: &mut layout,
        };

        for result in RuleBodyParser::new(&mut parser, &mut decl_parser) {
            // Ignore errors - lenient parsing
            let _ = result;
        }

        layout
    }

    /// `text-indent: 2; padding-left: 0` opens a new paragraph.
    pub fn opens_paragraph(&self) -> bool {
        self.indent == 2 && self.padding == 0
    }

    /// `text-indent: 0; padding-left: 0` is a flush line, the kind a page
    /// divider splits a paragraph into.
    pub fn is_flush(&self) -> bool {
        self.indent == 0 && self.padding == 0
    }
}

struct LayoutParser<'a> {
    layout: &'a mut Layout,
}

impl<'i> AtRuleParser<'i> for LayoutParser<'_> {
    type Prelude = ();
    type AtRule = ();
    type Error = ();

    fn parse_prelude<'t>(
        &mut self,
        _name: cssparser::CowRcStr<'i>,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::Prelude, ParseError<'i, Self::Error>> {
        Err(input.new_custom_error(()))
    }

    fn parse_block<'t>(
        &mut self,
        _prelude: Self::Prelude,
        _start: &cssparser::ParserState,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::AtRule, ParseError<'i, Self::Error>> {
        Err(input.new_custom_error(()))
    }
}

impl<'i> QualifiedRuleParser<'i> for LayoutParser<'_> {
    type Prelude = ();
    type QualifiedRule = ();
    type Error = ();

    fn parse_prelude<'t>(
        &mut self,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::Prelude, ParseError<'i, Self::Error>> {
        Err(input.new_custom_error(()))
    }

    fn parse_block<'t>(
        &mut self,
        _prelude: Self::Prelude,
        _start: &cssparser::ParserState,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::QualifiedRule, ParseError<'i, Self::Error>> {
        Err(input.new_custom_error(()))
    }
}

impl<'i> DeclarationParser<'i> for LayoutParser<'_> {
    type Declaration = ();
    type Error = ();

    fn parse_value<'t>(
        &mut self,
        name: cssparser::CowRcStr<'i>,
        input: &mut Parser<'i, 't>,
        _start: &cssparser::ParserState,
    ) -> Result<Self::Declaration, ParseError<'i, Self::Error>> {
        let slot = match name.to_ascii_lowercase().as_str() {
            "text-indent" => Some(&mut self.layout.indent),
            "padding-left" => Some(&mut self.layout.padding),
            _ => None,
        };

        if let Some(slot) = slot {
            *slot = parse_magnitude(input).unwrap_or(0);
        }

        // Unknown properties and trailing `!important` are skipped
        while input.next().is_ok() {}
        Ok(())
    }
}

impl<'i> RuleBodyItemParser<'i, (), ()> for LayoutParser<'_> {
    fn parse_declarations(&self) -> bool {
        true
    }
    fn parse_qualified(&self) -> bool {
        false
    }
}

/// Read a length-like value as a bare number, whatever its unit.
fn parse_magnitude(input: &mut Parser<'_, '_>) -> Option<i32> {
    let value = match input.next().ok()? {
        Token::Dimension { value, .. } => *value,
        Token::Number { value, .. } => *value,
        Token::Percentage { unit_value, .. } => *unit_value * 100.0,
        _ => return None,
    };

    value.is_finite().then(|| value.round() as i32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_han_ji_style() {
        let layout = Layout::from_style("text-indent:2em;padding-left:0em;");
        assert_eq!(layout, Layout::new(2, 0));
        assert!(layout.opens_paragraph());
        assert!(!layout.is_flush());
    }

    #[test]
    fn test_order_and_spacing_do_not_matter() {
        assert_eq!(
            Layout::from_style(" padding-left : 3em ; text-indent : -1em "),
            Layout::new(-1, 3)
        );
    }

    #[test]
    fn test_missing_properties_default_to_zero() {
        let layout = Layout::from_style("color:red");
        assert_eq!(layout, Layout::default());
        assert!(layout.is_flush());
    }

    #[test]
    fn test_units_are_opaque() {
        assert_eq!(Layout::from_style("text-indent:2px").indent, 2);
        assert_eq!(Layout::from_style("text-indent:2").indent, 2);
        assert_eq!(Layout::from_style("text-indent:1.6em").indent, 2);
    }

    #[test]
    fn test_garbage_values_read_as_zero() {
        let layout = Layout::from_style("text-indent:auto;padding-left:;width:;");
        assert_eq!(layout, Layout::default());
    }

    #[test]
    fn test_last_declaration_wins() {
        assert_eq!(
            Layout::from_style("text-indent:4em;text-indent:2em").indent,
            2
        );
    }

    #[test]
    fn test_important_is_ignored() {
        assert_eq!(
            Layout::from_style("text-indent:2em !important;padding-left:0"),
            Layout::new(2, 0)
        );
    }
}
