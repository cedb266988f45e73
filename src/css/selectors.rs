//! CSS selector support
//!
//! Implements selector parsing and matching using the selectors crate.

use super::types::CssString;
use crate::error::ParseError;
use crate::error::Result;
use cssparser::{ParseError as CssParseError, Parser, ParserInput, ToCss, Token};
use selectors::parser::{ParseRelative, SelectorImpl, SelectorList, SelectorParseErrorKind};
use std::fmt;

/// Our custom SelectorImpl for elemsnap
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapSelectorImpl;

impl SelectorImpl for SnapSelectorImpl {
  type ExtraMatchingData<'a> = ();
  type AttrValue = CssString;
  type Identifier = CssString;
  type LocalName = CssString;
  type NamespacePrefix = CssString;
  type NamespaceUrl = CssString;
  type BorrowedLocalName = str;
  type BorrowedNamespaceUrl = str;

  type NonTSPseudoClass = PseudoClass;
  type PseudoElement = PseudoElement;
}

/// Pseudo-classes we support
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PseudoClass {
  Root,
  FirstChild,
  LastChild,
  NthChild(i32, i32), // an + b
  NthLastChild(i32, i32),
  OnlyChild,
  Hover,
  Active,
  Focus,
  Link,
  Visited,
}

impl selectors::parser::NonTSPseudoClass for PseudoClass {
  type Impl = SnapSelectorImpl;

  fn is_active_or_hover(&self) -> bool {
    matches!(self, PseudoClass::Active | PseudoClass::Hover)
  }

  fn is_user_action_state(&self) -> bool {
    matches!(
      self,
      PseudoClass::Hover | PseudoClass::Active | PseudoClass::Focus
    )
  }
}

impl ToCss for PseudoClass {
  fn to_css<W>(&self, dest: &mut W) -> fmt::Result
  where
    W: fmt::Write,
  {
    match self {
      PseudoClass::Root => dest.write_str(":root"),
      PseudoClass::FirstChild => dest.write_str(":first-child"),
      PseudoClass::LastChild => dest.write_str(":last-child"),
      PseudoClass::NthChild(a, b) => write!(dest, ":nth-child({}n+{})", a, b),
      PseudoClass::NthLastChild(a, b) => write!(dest, ":nth-last-child({}n+{})", a, b),
      PseudoClass::OnlyChild => dest.write_str(":only-child"),
      PseudoClass::Hover => dest.write_str(":hover"),
      PseudoClass::Active => dest.write_str(":active"),
      PseudoClass::Focus => dest.write_str(":focus"),
      PseudoClass::Link => dest.write_str(":link"),
      PseudoClass::Visited => dest.write_str(":visited"),
    }
  }
}

/// Pseudo-elements we recognize; rules targeting them never match the
/// snapshot target itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PseudoElement {
  Before,
  After,
  Marker,
}

impl selectors::parser::PseudoElement for PseudoElement {
  type Impl = SnapSelectorImpl;
}

impl ToCss for PseudoElement {
  fn to_css<W>(&self, dest: &mut W) -> fmt::Result
  where
    W: fmt::Write,
  {
    match self {
      PseudoElement::Before => dest.write_str("::before"),
      PseudoElement::After => dest.write_str("::after"),
      PseudoElement::Marker => dest.write_str("::marker"),
    }
  }
}

/// Custom parser for pseudo-classes
pub(crate) struct PseudoClassParser;

impl<'i> selectors::parser::Parser<'i> for PseudoClassParser {
  type Impl = SnapSelectorImpl;
  type Error = SelectorParseErrorKind<'i>;

  fn parse_non_ts_pseudo_class(
    &self,
    location: cssparser::SourceLocation,
    name: cssparser::CowRcStr<'i>,
  ) -> std::result::Result<PseudoClass, CssParseError<'i, Self::Error>> {
    match &*name {
      "root" => Ok(PseudoClass::Root),
      "first-child" => Ok(PseudoClass::FirstChild),
      "last-child" => Ok(PseudoClass::LastChild),
      "only-child" => Ok(PseudoClass::OnlyChild),
      "hover" => Ok(PseudoClass::Hover),
      "active" => Ok(PseudoClass::Active),
      "focus" => Ok(PseudoClass::Focus),
      "link" => Ok(PseudoClass::Link),
      "visited" => Ok(PseudoClass::Visited),
      _ => Err(CssParseError {
        kind: cssparser::ParseErrorKind::Basic(cssparser::BasicParseErrorKind::UnexpectedToken(
          Token::Ident(name),
        )),
        location,
      }),
    }
  }

  fn parse_non_ts_functional_pseudo_class<'t>(
    &self,
    name: cssparser::CowRcStr<'i>,
    parser: &mut Parser<'i, 't>,
    _after_part: bool,
  ) -> std::result::Result<PseudoClass, CssParseError<'i, Self::Error>> {
    match &*name {
      "nth-child" => {
        let (a, b) = parse_nth(parser).map_err(|_| {
          parser.new_custom_error(SelectorParseErrorKind::UnsupportedPseudoClassOrElement(
            name.clone(),
          ))
        })?;
        Ok(PseudoClass::NthChild(a, b))
      }
      "nth-last-child" => {
        let (a, b) = parse_nth(parser).map_err(|_| {
          parser.new_custom_error(SelectorParseErrorKind::UnsupportedPseudoClassOrElement(
            name.clone(),
          ))
        })?;
        Ok(PseudoClass::NthLastChild(a, b))
      }
      _ => Err(parser.new_custom_error(
        SelectorParseErrorKind::UnsupportedPseudoClassOrElement(name),
      )),
    }
  }

  fn parse_pseudo_element(
    &self,
    location: cssparser::SourceLocation,
    name: cssparser::CowRcStr<'i>,
  ) -> std::result::Result<PseudoElement, CssParseError<'i, Self::Error>> {
    match &*name {
      "before" => Ok(PseudoElement::Before),
      "after" => Ok(PseudoElement::After),
      "marker" => Ok(PseudoElement::Marker),
      _ => Err(CssParseError {
        kind: cssparser::ParseErrorKind::Basic(cssparser::BasicParseErrorKind::UnexpectedToken(
          Token::Ident(name),
        )),
        location,
      }),
    }
  }

  fn parse_is_and_where(&self) -> bool {
    true
  }
}

/// Parses a selector list from text, e.g. a scanner or CLI target selector.
pub fn parse_selector_list(text: &str) -> Result<SelectorList<SnapSelectorImpl>> {
  let mut input = ParserInput::new(text);
  let mut parser = Parser::new(&mut input);
  SelectorList::parse(&PseudoClassParser, &mut parser, ParseRelative::No).map_err(|_| {
    ParseError::InvalidSelector {
      selector: text.to_string(),
    }
    .into()
  })
}

/// Parse nth-child/nth-last-child expressions.
///
/// Handles `<an+b>` in its common forms: a bare number, `odd`/`even`, and
/// `<a>n+<b>` written as dimension tokens (`2n`, `2n+1`, `-n+3`).
fn parse_nth<'i, 't>(
  parser: &mut Parser<'i, 't>,
) -> std::result::Result<(i32, i32), CssParseError<'i, ()>> {
  let location = parser.current_source_location();
  let token = parser.next()?.clone();
  match &token {
    Token::Number {
      int_value: Some(b), ..
    } => Ok((0, *b)),
    Token::Ident(ident) => match &**ident {
      "odd" => Ok((2, 1)),
      "even" => Ok((2, 0)),
      "n" => Ok((1, parse_nth_tail(parser)?)),
      _ => {
        if let Some(rest) = ident.strip_prefix("-n") {
          // "-n-3" style; "-n" alone means a=-1 b=0
          let b = if rest.is_empty() {
            parse_nth_tail(parser)?
          } else {
            rest
              .parse::<i32>()
              .map_err(|_| location.new_unexpected_token_error(token.clone()))?
          };
          Ok((-1, b))
        } else {
          Err(location.new_unexpected_token_error(token.clone()))
        }
      }
    },
    Token::Dimension {
      int_value: Some(a),
      unit,
      ..
    } => {
      // "2n", "2n+1" (sign folded into the following number token), "2n-1"
      if unit.eq_ignore_ascii_case("n") {
        Ok((*a, parse_nth_tail(parser)?))
      } else if let Some(rest) = unit.strip_prefix('n').or_else(|| unit.strip_prefix('N')) {
        let b = rest
          .parse::<i32>()
          .map_err(|_| location.new_unexpected_token_error(token.clone()))?;
        Ok((*a, b))
      } else {
        Err(location.new_unexpected_token_error(token.clone()))
      }
    }
    _ => Err(location.new_unexpected_token_error(token)),
  }
}

/// Consumes the optional `+ b` / `- b` after an `an` term.
fn parse_nth_tail<'i, 't>(
  parser: &mut Parser<'i, 't>,
) -> std::result::Result<i32, CssParseError<'i, ()>> {
  if parser.is_exhausted() {
    return Ok(0);
  }
  let location = parser.current_source_location();
  let token = parser.next()?.clone();
  match &token {
    Token::Number {
      int_value: Some(b), ..
    } => Ok(*b),
    Token::Delim(sign @ ('+' | '-')) => {
      let next = parser.next()?.clone();
      match next {
        Token::Number {
          int_value: Some(b), ..
        } => Ok(if *sign == '-' { -b } else { b }),
        other => Err(location.new_unexpected_token_error(other)),
      }
    }
    other => Err(location.new_unexpected_token_error(other.clone())),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_simple_selector_lists() {
    assert!(parse_selector_list(".foo").is_ok());
    assert!(parse_selector_list("div > span, #id[attr=\"v\"]").is_ok());
    assert!(parse_selector_list("li:nth-child(2n+1)").is_ok());
  }

  #[test]
  fn rejects_unsupported_pseudo_class() {
    assert!(parse_selector_list("div:unknown-pseudo").is_err());
  }

  #[test]
  fn parses_pseudo_elements() {
    assert!(parse_selector_list("p::before").is_ok());
  }
}
