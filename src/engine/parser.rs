//! Clause classification and assertion checks.
//!
//! Parsing runs in three steps:
//!
//! ```text
//! text ── split_clauses ──> [clause] ── tokenize ──> [Token] ── classify ──> Clause
//!                                                                   │
//!                          Assertion <── check references ──────────┘
//! ```
//!
//! A clause is a definition when it starts with `name =`, otherwise it must
//! be a bare predicate call. Everything that can be decided without looking
//! at a device is decided here: entity kinds, constructor keys and literal
//! types, operator names and arity, field names, and whether every variable
//! used by a predicate is defined somewhere in the assertion. A run that gets
//! past parsing can only fail because of its snapshots.

use super::lexer::{ClauseText, Token, TokenKind, split_clauses, tokenize};
use super::registry::OperatorSet;
use crate::error::{Error, ParseError, Result};
use crate::{Argument, Assertion, Clause, Definition, EntityKind, Literal, Operand, Predicate};
use std::collections::HashMap;

/// Parse and check an assertion against `operators`.
pub(crate) fn parse(text: &str, operators: &OperatorSet) -> Result<Assertion> {
    let mut clauses = Vec::new();
    let mut spans = Vec::new();
    for clause_text in split_clauses(text)? {
        let tokens = tokenize(clause_text)?;
        clauses.push(ClauseParser::new(clause_text, &tokens).clause()?);
        spans.push(clause_text);
    }
    check(&clauses, &spans, operators)?;
    Ok(Assertion::new(clauses))
}

struct ClauseParser<'a> {
    clause: ClauseText<'a>,
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> ClauseParser<'a> {
    fn new(clause: ClauseText<'a>, tokens: &'a [Token]) -> Self {
        Self { clause, tokens, pos: 0 }
    }

    fn error(&self, offset: usize, reason: impl Into<String>) -> ParseError {
        ParseError::new(self.clause.text, offset, reason)
    }

    fn end_offset(&self) -> usize {
        self.clause.offset + self.clause.text.len()
    }

    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self, expected: &str) -> std::result::Result<&'a Token, ParseError> {
        let token = self
            .tokens
            .get(self.pos)
            .ok_or_else(|| self.error(self.end_offset(), format!("expected {expected}, found end of clause")))?;
        self.pos += 1;
        Ok(token)
    }

    fn expect(&mut self, kind: TokenKind, expected: &str) -> std::result::Result<(), ParseError> {
        let token = self.next(expected)?;
        if token.kind == kind {
            return Ok(());
        }
        if token.kind == TokenKind::LParen {
            return Err(self.error(token.offset, "nested calls are not supported"));
        }
        Err(self.error(token.offset, format!("expected {expected}, found {}", token.kind.describe())))
    }

    fn ident(&mut self, expected: &str) -> std::result::Result<(&'a str, usize), ParseError> {
        let token = self.next(expected)?;
        match &token.kind {
            TokenKind::Ident(name) => Ok((name, token.offset)),
            other => Err(self.error(token.offset, format!("expected {expected}, found {}", other.describe()))),
        }
    }

    fn finish(&self) -> std::result::Result<(), ParseError> {
        match self.peek() {
            None => Ok(()),
            Some(token) => Err(self.error(
                token.offset,
                format!("unexpected {} after the closing `)`; join clauses with `AND`", token.kind.describe()),
            )),
        }
    }

    fn clause(mut self) -> Result<Clause> {
        let is_definition = matches!(
            (self.tokens.first().map(|t| &t.kind), self.tokens.get(1).map(|t| &t.kind)),
            (Some(TokenKind::Ident(_)), Some(TokenKind::Eq))
        );
        if is_definition { self.definition().map(Clause::Definition) } else { self.predicate().map(Clause::Predicate) }
    }

    fn definition(&mut self) -> Result<Definition> {
        let (name, _) = self.ident("a variable name")?;
        self.expect(TokenKind::Eq, "`=`")?;
        let (kind_name, _) = self.ident("an entity type")?;
        let kind = EntityKind::from_name(kind_name).ok_or_else(|| Error::UnknownEntityKind {
            name: kind_name.to_string(),
            clause: self.clause.text.to_string(),
        })?;
        self.expect(TokenKind::LParen, "`(`")?;

        let mut args: Vec<Argument> = Vec::new();
        if !self.at(&TokenKind::RParen) {
            loop {
                let (key, key_offset) = self.ident("an argument name")?;
                self.expect(TokenKind::Eq, "`=`")?;
                let value_offset = self.peek().map_or(self.end_offset(), |t| t.offset);
                let value = self.literal()?;
                if args.iter().any(|a| a.key == key) {
                    return Err(self.error(key_offset, format!("argument `{key}` is given twice")).into());
                }
                if kind == EntityKind::Widget && key == "bounds" {
                    if let Literal::Str(bounds) = &value {
                        bounds.parse::<crate::layout::Bounds>()?;
                    }
                }
                kind.check_argument(key, &value).map_err(|reason| {
                    let offset = if reason.contains("does not accept") { key_offset } else { value_offset };
                    self.error(offset, reason)
                })?;
                args.push(Argument { key: key.to_string(), value });
                if !self.at(&TokenKind::Comma) {
                    break;
                }
                self.pos += 1;
            }
        }
        self.expect(TokenKind::RParen, "`,` or `)`")?;
        self.finish()?;
        Ok(Definition { name: name.to_string(), kind, args })
    }

    fn predicate(&mut self) -> Result<Predicate> {
        let (operator, _) = self.ident("`name = Type(...)` or `operator(...)`")?;
        self.expect(TokenKind::LParen, "`(` after the operator name")?;
        let mut operands = Vec::new();
        if !self.at(&TokenKind::RParen) {
            loop {
                operands.push(self.operand()?);
                if !self.at(&TokenKind::Comma) {
                    break;
                }
                self.pos += 1;
            }
        }
        self.expect(TokenKind::RParen, "`,` or `)`")?;
        self.finish()?;
        Ok(Predicate { operator: operator.to_string(), operands })
    }

    fn at(&self, kind: &TokenKind) -> bool {
        self.peek().is_some_and(|t| &t.kind == kind)
    }

    fn operand(&mut self) -> std::result::Result<Operand, ParseError> {
        if let Some(Token { kind: TokenKind::Ident(name), .. }) = self.peek() {
            if !is_bool_word(name) {
                self.pos += 1;
                if !self.at(&TokenKind::Dot) {
                    return Ok(Operand::Variable(name.clone()));
                }
                self.pos += 1;
                let (field, _) = self.ident("a field name")?;
                return Ok(Operand::Field { var: name.clone(), field: field.to_string() });
            }
        }
        self.literal().map(Operand::Literal)
    }

    fn literal(&mut self) -> std::result::Result<Literal, ParseError> {
        let token = self.next("a literal")?;
        match &token.kind {
            TokenKind::Str(s) => Ok(Literal::Str(s.clone())),
            TokenKind::Int(i) => Ok(Literal::Int(*i)),
            TokenKind::Float(x) => Ok(Literal::Float(*x)),
            TokenKind::Ident(word) if word == "true" || word == "True" => Ok(Literal::Bool(true)),
            TokenKind::Ident(word) if word == "false" || word == "False" => Ok(Literal::Bool(false)),
            TokenKind::LParen => Err(self.error(token.offset, "nested calls are not supported")),
            other => Err(self.error(token.offset, format!("expected a literal, found {}", other.describe()))),
        }
    }
}

fn is_bool_word(word: &str) -> bool {
    matches!(word, "true" | "false" | "True" | "False")
}

/// Cross-clause checks: unique names, known operators, arity, defined
/// variables and known fields.
fn check(clauses: &[Clause], spans: &[ClauseText<'_>], operators: &OperatorSet) -> Result<()> {
    let mut kinds: HashMap<&str, EntityKind> = HashMap::new();
    for (clause, span) in clauses.iter().zip(spans) {
        if let Clause::Definition(def) = clause {
            if kinds.insert(&def.name, def.kind).is_some() {
                let reason = format!("variable `{}` is defined more than once", def.name);
                return Err(ParseError::new(span.text, span.offset, reason).into());
            }
        }
    }

    for (clause, span) in clauses.iter().zip(spans) {
        let Clause::Predicate(pred) = clause else {
            continue;
        };
        let op = operators.get(&pred.operator).ok_or_else(|| Error::UnknownOperator {
            name: pred.operator.clone(),
            clause: span.text.to_string(),
        })?;
        if !op.accepts(pred.operands.len()) {
            let reason =
                format!("`{}` takes {} argument(s), {} given", pred.operator, op.arity(), pred.operands.len());
            return Err(ParseError::new(span.text, span.offset, reason).into());
        }
        for operand in &pred.operands {
            let Some(var) = operand.variable() else {
                continue;
            };
            let kind = *kinds.get(var).ok_or_else(|| Error::UndeclaredVariable {
                name: var.to_string(),
                clause: span.text.to_string(),
            })?;
            if let Operand::Field { field, .. } = operand {
                if !kind.has_field(field) {
                    let reason = format!("{kind} has no field `{field}` (fields: {})", kind.fields().join(", "));
                    return Err(ParseError::new(span.text, span.offset, reason).into());
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse_default(text: &str) -> Result<Assertion> {
        parse(text, &OperatorSet::default())
    }

    fn parse_error(text: &str) -> ParseError {
        match parse_default(text) {
            Err(Error::Parse(err)) => err,
            other => panic!("expected a parse error for {text:?}, got {other:?}"),
        }
    }

    #[test]
    fn classifies_definitions_and_predicates() {
        let assertion =
            parse_default(r#"s = Screen() AND w = Widget(resource_id="btn_ok", clickable=true) AND in_screen(w, s)"#)
                .unwrap();
        assert_eq!(assertion.clauses(), &[
            Clause::Definition(Definition { name: "s".into(), kind: EntityKind::Screen, args: vec![] }),
            Clause::Definition(Definition {
                name: "w".into(),
                kind: EntityKind::Widget,
                args: vec![
                    Argument { key: "resource_id".into(), value: Literal::Str("btn_ok".into()) },
                    Argument { key: "clickable".into(), value: Literal::Bool(true) },
                ],
            }),
            Clause::Predicate(Predicate {
                operator: "in_screen".into(),
                operands: vec![Operand::Variable("w".into()), Operand::Variable("s".into())],
            }),
        ]);
    }

    #[test]
    fn definitions_may_follow_their_use() {
        let assertion = parse_default("less_than(d.volume, 5) AND d = Device()").unwrap();
        let pred = assertion.predicates().next().unwrap();
        assert_eq!(pred.operands, vec![
            Operand::Field { var: "d".into(), field: "volume".into() },
            Operand::Literal(Literal::Int(5)),
        ]);
    }

    #[test]
    fn boolean_spellings() {
        let assertion = parse_default("d = Device(is_crash=True) AND equal(d.audio, false)").unwrap();
        assert_eq!(assertion.definition("d").unwrap().arg("is_crash"), Some(&Literal::Bool(true)));
        let pred = assertion.predicates().next().unwrap();
        assert_eq!(pred.operands[1], Operand::Literal(Literal::Bool(false)));
    }

    #[test]
    fn unknown_names_have_their_own_errors() {
        assert!(matches!(
            parse_default("x = Toast()"),
            Err(Error::UnknownEntityKind { ref name, .. }) if name == "Toast"
        ));
        assert!(matches!(
            parse_default("s = Screen() AND in_widget(s, s)"),
            Err(Error::UnknownOperator { ref name, .. }) if name == "in_widget"
        ));
        assert!(matches!(
            parse_default("s = Screen() AND in_screen(w, s)"),
            Err(Error::UndeclaredVariable { ref name, .. }) if name == "w"
        ));
    }

    #[test]
    fn malformed_clauses_name_the_clause() {
        let err = parse_error("s = Screen() AND keyboard_on s");
        assert_eq!(err.clause, "keyboard_on s");
        assert_eq!(err.offset, 29);

        let err = parse_error("s = Screen(package=\"a\", package=\"b\")");
        assert_eq!(err.reason, "argument `package` is given twice");

        let err = parse_error("w = Widget(text=Screen())");
        assert_eq!(err.reason, "expected a literal, found `Screen`");

        let err = parse_error("s = Screen() AND keyboard_on(s) extra");
        assert!(err.reason.starts_with("unexpected `extra`"));
    }

    #[test]
    fn nested_calls_are_rejected() {
        let err = parse_error("s = Screen() AND keyboard_on(f(s))");
        assert_eq!(err.reason, "nested calls are not supported");
        assert_eq!(err.offset, 30);
    }

    #[test]
    fn constructor_keys_and_types_are_checked() {
        assert!(parse_error("d = Device(volume=\"7\")").reason.contains("expects an integer"));
        assert!(parse_error("s = Screen(volume=3)").reason.contains("does not accept argument `volume`"));
        assert!(parse_error("d = Device(orientation=\"sideways\")").reason.contains("unknown orientation"));
        assert!(matches!(
            parse_default("w = Widget(bounds=\"[0,0][10]\")"),
            Err(Error::AmbiguousGeometry { ref input }) if input == "[0,0][10]"
        ));
    }

    #[test]
    fn operator_arity_and_fields_are_checked() {
        assert!(parse_error("s = Screen() AND keyboard_on(s, s)").reason.contains("takes 1 argument(s), 2 given"));
        assert!(parse_error("w = Widget() AND text_similar(w)").reason.contains("takes 2 to 3 argument(s)"));
        assert!(parse_error("d = Device() AND equal(d.brightness, 3)").reason.contains("no field `brightness`"));
    }

    #[test]
    fn duplicate_definitions_are_rejected() {
        let err = parse_error("s = Screen() AND s = Screen()");
        assert_eq!(err.reason, "variable `s` is defined more than once");
        assert_eq!(err.offset, 17);
    }
}
