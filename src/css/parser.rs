//! CSS parsing
//!
//! Parses stylesheets into style rules, keeping the authored text of each
//! rule so matched rules can be exported verbatim. Declaration values stay
//! raw strings; the exporter never interprets them.

use super::selectors::{PseudoClassParser, SnapSelectorImpl};
use super::types::{Declaration, StyleRule, StyleSheet};
use cssparser::{ParseError, Parser, ParserInput, Token};
use selectors::parser::{ParseRelative, SelectorList, SelectorParseErrorKind};

/// Parse a CSS stylesheet.
///
/// At-rules are skipped entirely; malformed rules are recovered from by
/// skipping to the end of their block, with a logged warning.
pub fn parse_stylesheet(css: &str) -> StyleSheet {
  let mut input = ParserInput::new(css);
  let mut parser = Parser::new(&mut input);

  let mut rules = Vec::new();

  while !parser.is_exhausted() {
    parser.skip_whitespace();
    if parser.is_exhausted() {
      break;
    }

    let start = parser.position();
    match parse_rule(&mut parser) {
      Ok(Some((selectors, declarations))) => {
        let css_text = parser.slice_from(start).trim().to_string();
        rules.push(StyleRule {
          selectors,
          declarations,
          css_text,
        });
      }
      Ok(None) => {} // At-rule or comment, skipped
      Err(e) => {
        log::warn!("CSS parse error: {:?}", e);
        // Recover by skipping to the end of the next block
        while !parser.is_exhausted() {
          if let Ok(Token::CurlyBracketBlock) = parser.next() {
            let _: std::result::Result<(), ParseError<()>> =
              parser.parse_nested_block(|_| Ok(()));
            break;
          }
        }
      }
    }
  }

  StyleSheet { rules }
}

type RuleParts = (SelectorList<SnapSelectorImpl>, Vec<Declaration>);

fn parse_rule<'i, 't>(
  parser: &mut Parser<'i, 't>,
) -> std::result::Result<Option<RuleParts>, ParseError<'i, SelectorParseErrorKind<'i>>> {
  parser.skip_whitespace();

  // At-rules carry no selector the target could match; skip their prelude
  // and block (or trailing semicolon for block-less ones like @import).
  let is_at_rule = parser
    .try_parse(|p| match p.next_including_whitespace()? {
      Token::AtKeyword(_) => Ok(()),
      _ => Err(p.new_error_for_next_token::<()>()),
    })
    .is_ok();

  if is_at_rule {
    loop {
      match parser.next() {
        Ok(Token::CurlyBracketBlock) => {
          let _: std::result::Result<(), ParseError<SelectorParseErrorKind>> =
            parser.parse_nested_block(|_| Ok(()));
          break;
        }
        Ok(Token::Semicolon) => break,
        Err(_) => break,
        Ok(_) => continue,
      }
    }
    return Ok(None);
  }

  // Parse selectors up to the opening curly brace
  let selectors = parser.parse_until_before(cssparser::Delimiter::CurlyBracketBlock, |parser| {
    SelectorList::parse(&PseudoClassParser, parser, ParseRelative::No)
  })?;

  parser.expect_curly_bracket_block().map_err(|_| {
    parser.new_custom_error(SelectorParseErrorKind::UnexpectedIdent("expected".into()))
  })?;
  let declarations = parser.parse_nested_block(|parser| {
    Ok::<_, ParseError<SelectorParseErrorKind>>(parse_declaration_list(parser))
  })?;

  Ok(Some((selectors, declarations)))
}

/// Parses a declaration block, recovering per declaration: a malformed
/// declaration is skipped up to its terminating semicolon and the rest of
/// the block still parses, browser-style. Stray semicolons are ignored.
fn parse_declaration_list(parser: &mut Parser) -> Vec<Declaration> {
  let mut declarations = Vec::new();

  while !parser.is_exhausted() {
    parser.skip_whitespace();
    if parser.is_exhausted() {
      break;
    }
    if parser.try_parse(|p| p.expect_semicolon()).is_ok() {
      continue;
    }

    match parse_declaration(parser) {
      Ok(Some(decl)) => declarations.push(decl),
      Ok(None) => {}
      Err(()) => {
        // Drop tokens up to the next semicolon; only this declaration
        // is lost.
        while let Ok(token) = parser.next() {
          if matches!(token, Token::Semicolon) {
            break;
          }
        }
      }
    }
  }

  declarations
}

/// One `property: value` declaration, consumed through its semicolon.
/// `Ok(None)` means a declaration with an empty value, dropped silently.
fn parse_declaration(parser: &mut Parser) -> std::result::Result<Option<Declaration>, ()> {
  let property = parser.expect_ident().map_err(|_| ())?.to_string();
  parser.expect_colon().map_err(|_| ())?;
  parser.skip_whitespace();

  let value_start = parser.position();
  let mut important = false;

  loop {
    match parser.next() {
      Ok(Token::Semicolon) | Err(_) => break,
      // `!important` stays part of the token stream until the
      // semicolon; the raw slice is trimmed below.
      Ok(Token::Delim('!')) => {
        if parser
          .try_parse(|p| p.expect_ident_matching("important"))
          .is_ok()
        {
          important = true;
        }
      }
      Ok(Token::Function(_)) => {
        // Consume the entire function including its contents
        let _ = parser.parse_nested_block(|p| {
          while !p.is_exhausted() {
            let _ = p.next();
          }
          Ok::<_, ParseError<()>>(())
        });
      }
      Ok(_) => {}
    }
  }

  let full_slice = parser.slice_from(value_start).trim();
  let value = if important {
    full_slice
      .trim_end_matches(';')
      .trim_end()
      .trim_end_matches("important")
      .trim_end()
      .trim_end_matches('!')
      .trim_end()
  } else {
    full_slice.trim_end_matches(';').trim_end()
  };

  if value.is_empty() {
    return Ok(None);
  }
  Ok(Some(Declaration {
    property,
    value: value.to_string(),
    important,
  }))
}

/// Parse declarations from an inline style attribute.
pub fn parse_declarations(declarations_str: &str) -> Vec<Declaration> {
  let mut input = ParserInput::new(declarations_str);
  let mut parser = Parser::new(&mut input);
  parse_declaration_list(&mut parser)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_rules_and_keeps_authored_text() {
    let sheet = parse_stylesheet(".foo { color: red; }\n.bar { margin: 0 }");
    assert_eq!(sheet.rules.len(), 2);
    assert_eq!(sheet.rules[0].css_text, ".foo { color: red; }");
    assert_eq!(sheet.rules[1].css_text, ".bar { margin: 0 }");
    assert_eq!(sheet.rules[0].declarations[0].property, "color");
    assert_eq!(sheet.rules[0].declarations[0].value, "red");
  }

  #[test]
  fn skips_at_rules() {
    let sheet = parse_stylesheet(
      "@import url(\"other.css\");\n@media (min-width: 600px) { .m { color: blue; } }\n.foo { color: red; }",
    );
    assert_eq!(sheet.rules.len(), 1);
    assert_eq!(sheet.rules[0].css_text, ".foo { color: red; }");
  }

  #[test]
  fn parses_important_flag() {
    let sheet = parse_stylesheet(".foo { color: red !important; margin: 0; }");
    let decls = &sheet.rules[0].declarations;
    assert!(decls[0].important);
    assert_eq!(decls[0].value, "red");
    assert!(!decls[1].important);
  }

  #[test]
  fn keeps_function_values_intact() {
    let sheet = parse_stylesheet(".foo { background: url(a.png) no-repeat; }");
    let decl = &sheet.rules[0].declarations[0];
    assert_eq!(decl.value, "url(a.png) no-repeat");
  }

  #[test]
  fn inline_declarations_parse() {
    let decls = parse_declarations("color: red; outline: 2px dashed red");
    assert_eq!(decls.len(), 2);
    assert_eq!(decls[1].property, "outline");
    assert_eq!(decls[1].value, "2px dashed red");
  }

  #[test]
  fn stray_semicolons_are_ignored() {
    let sheet = parse_stylesheet(".a { color: red;; }");
    assert_eq!(sheet.rules.len(), 1);
    let decls = &sheet.rules[0].declarations;
    assert_eq!(decls.len(), 1);
    assert_eq!(decls[0].property, "color");
    assert_eq!(decls[0].value, "red");
  }

  #[test]
  fn malformed_declaration_drops_only_itself() {
    let sheet = parse_stylesheet(".a { color red; margin: 0; }");
    assert_eq!(sheet.rules.len(), 1);
    let decls = &sheet.rules[0].declarations;
    assert_eq!(decls.len(), 1);
    assert_eq!(decls[0].property, "margin");
    assert_eq!(decls[0].value, "0");
  }

  #[test]
  fn leading_semicolon_does_not_swallow_the_next_declaration() {
    let decls = parse_declarations("; color: red");
    assert_eq!(decls.len(), 1);
    assert_eq!(decls[0].property, "color");
  }

  #[test]
  fn recovers_after_malformed_rule() {
    let sheet = parse_stylesheet("??? { broken }\n.ok { color: green; }");
    assert_eq!(sheet.rules.len(), 1);
    assert_eq!(sheet.rules[0].css_text, ".ok { color: green; }");
  }
}
