use crate::error::{QueryError, Result};
use crate::query::node::{CompareOp, QueryNode};
use std::fmt;

/// How deeply expressions may nest, counting every parenthesis, `!` and
/// chained boolean operator. Deeper queries are rejected before they can
/// exhaust the stack.
pub const MAX_NESTING_DEPTH: usize = 256;

/// A normalized token as the parser sees it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token<'a> {
    And,
    Or,
    Not,
    LParen,
    RParen,
    Colon,
    /// `^`, opens an exact tag
    Caret,
    /// `$`, closes an exact tag
    Dollar,
    Compare(CompareOp),
    Tag(&'a str),
}

impl<'a> Token<'a> {
    fn classify(raw: &'a str) -> Self {
        match raw {
            "&&" => Token::And,
            "||" => Token::Or,
            "!" => Token::Not,
            "(" => Token::LParen,
            ")" => Token::RParen,
            ":" => Token::Colon,
            "^" => Token::Caret,
            "$" => Token::Dollar,
            other => match CompareOp::from_symbol(other) {
                Some(op) => Token::Compare(op),
                None => Token::Tag(other),
            },
        }
    }
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::And => f.write_str("&&"),
            Token::Or => f.write_str("||"),
            Token::Not => f.write_str("!"),
            Token::LParen => f.write_str("("),
            Token::RParen => f.write_str(")"),
            Token::Colon => f.write_str(":"),
            Token::Caret => f.write_str("^"),
            Token::Dollar => f.write_str("$"),
            Token::Compare(op) => write!(f, "{op}"),
            Token::Tag(tag) => write!(f, "tag {tag:?}"),
        }
    }
}

/// Parse normalized tokens into an expression tree.
///
/// The whole token stream must be consumed; leftovers such as an
/// unmatched `)` are a syntax error.
pub fn parse(tokens: &[String]) -> Result<QueryNode> {
    if tokens.is_empty() {
        return Err(QueryError::syntax("empty query"));
    }

    let mut parser = Parser::new(tokens);
    let root = parser.parse_expr(true)?;

    match parser.peek() {
        None => Ok(root),
        Some(extra) => Err(QueryError::syntax(format!("unexpected {extra}"))),
    }
}

/// Recursive-descent parser with one token of lookahead
struct Parser<'a> {
    tokens: &'a [String],
    pos: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [String]) -> Self {
        Self {
            tokens,
            pos: 0,
            depth: 0,
        }
    }

    fn peek(&self) -> Option<Token<'a>> {
        self.tokens.get(self.pos).map(|raw| Token::classify(raw))
    }

    fn read(&mut self) -> Option<Token<'a>> {
        let token = self.peek()?;
        self.pos += 1;
        Some(token)
    }

    /// `greedy` lets the expression bind a trailing comparison and
    /// boolean operators. The right-hand side of a comparison is parsed
    /// non-greedily, so `a==b&&c` is `(a==b) && c`.
    fn parse_expr(&mut self, greedy: bool) -> Result<QueryNode> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(QueryError::syntax("query nested too deeply"));
        }
        self.depth += 1;
        let expr = self.parse_nested_expr(greedy);
        self.depth -= 1;
        expr
    }

    fn parse_nested_expr(&mut self, greedy: bool) -> Result<QueryNode> {
        let left = match self.read() {
            None => return Err(QueryError::syntax("unexpected end of query")),
            Some(Token::Not) => {
                if self.peek().is_none() {
                    return Err(QueryError::syntax("expected expression after !"));
                }
                // `!` takes everything that follows: `!a && b` is `!(a && b)`
                let operand = self.parse_expr(true)?;
                return Ok(QueryNode::not(operand));
            }
            Some(Token::LParen) => {
                let inner = self.parse_expr(true)?;
                match self.read() {
                    Some(Token::RParen) => inner,
                    Some(other) => {
                        return Err(QueryError::syntax(format!("expected ), got {other}")));
                    }
                    None => return Err(QueryError::syntax("expected ), got end of query")),
                }
            }
            Some(Token::Caret) => self.parse_exact_tag()?,
            Some(Token::Tag(tag)) => self.parse_tag(tag)?,
            Some(other) => return Err(QueryError::syntax(format!("unexpected {other}"))),
        };

        if !greedy {
            return Ok(left);
        }

        // Comparisons bind before booleans: `year<2005 && foo` is
        // `(year<2005) && foo`.
        let left = match self.peek() {
            Some(Token::Compare(op)) => {
                self.read();
                let right = self.parse_expr(false)?;
                QueryNode::compare(op, left, right)
            }
            _ => left,
        };

        match self.peek() {
            // a closing paren belongs to the caller
            None | Some(Token::RParen) => Ok(left),
            Some(Token::And) => {
                self.read();
                let right = self.parse_expr(true)?;
                Ok(QueryNode::and(left, right))
            }
            Some(Token::Or) => {
                self.read();
                let right = self.parse_expr(true)?;
                Ok(QueryNode::or(left, right))
            }
            Some(other) => Err(QueryError::syntax(format!(
                "unexpected {other} after {left}"
            ))),
        }
    }

    /// A bare tag, or `tag:value` which becomes an exact match on the
    /// joined text.
    fn parse_tag(&mut self, tag: &str) -> Result<QueryNode> {
        if self.peek() != Some(Token::Colon) {
            return Ok(QueryNode::tag(tag));
        }
        self.read();

        match self.read() {
            Some(Token::Tag(value)) => {
                let joined = format!("{tag}:{value}");
                Ok(QueryNode::alias(joined.clone(), QueryNode::equals(joined)))
            }
            _ => Err(QueryError::syntax(format!("expected tag after {tag}:"))),
        }
    }

    /// `^tag$`, the caret already consumed
    fn parse_exact_tag(&mut self) -> Result<QueryNode> {
        let tag = match self.read() {
            Some(Token::Tag(tag)) => tag,
            _ => return Err(QueryError::syntax("expected tag after ^")),
        };

        match self.read() {
            Some(Token::Dollar) => Ok(QueryNode::equals(tag)),
            _ => Err(QueryError::syntax(format!("expected $ after ^{tag}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::Query;

    fn parse_str(input: &str) -> Result<QueryNode> {
        Query::new(input)?.parse()
    }

    fn parse_ok(input: &str) -> QueryNode {
        parse_str(input).unwrap_or_else(|e| panic!("parse of {input:?} failed: {e}"))
    }

    fn syntax_error(input: &str) -> String {
        match parse_str(input) {
            Err(QueryError::Syntax(msg)) => msg,
            other => panic!("expected syntax error for {input:?}, got {other:?}"),
        }
    }

    fn tag(t: &str) -> QueryNode {
        QueryNode::tag(t)
    }

    #[test]
    fn test_parse_simple() {
        assert_eq!(parse_ok("a"), tag("a"));
        assert_eq!(parse_ok("\"a\""), tag("a"));
        assert_eq!(parse_ok("(a)"), parse_ok("a"));
        assert_eq!(parse_ok("!a"), QueryNode::not(tag("a")));
        assert_eq!(parse_ok("a&&b"), QueryNode::and(tag("a"), tag("b")));
        assert_eq!(parse_ok("a||b"), QueryNode::or(tag("a"), tag("b")));
    }

    #[test]
    fn test_parse_comparisons() {
        let cases = [
            ("a>5", CompareOp::Greater),
            ("a>=5", CompareOp::GreaterEqual),
            ("a<5", CompareOp::Less),
            ("a<=5", CompareOp::LessEqual),
            ("a==5", CompareOp::Equal),
        ];
        for (input, op) in cases {
            assert_eq!(parse_ok(input), QueryNode::compare(op, tag("a"), tag("5")), "{input}");
        }
    }

    #[test]
    fn test_parse_typed_tag() {
        assert_eq!(
            parse_ok("a:5"),
            QueryNode::alias("a:5", QueryNode::equals("a:5"))
        );
    }

    #[test]
    fn test_parse_exact_tag() {
        assert_eq!(parse_ok("^ab$"), QueryNode::equals("ab"));
        assert_eq!(
            parse_ok("(^a$ || ^b$)"),
            QueryNode::or(QueryNode::equals("a"), QueryNode::equals("b"))
        );
    }

    #[test]
    fn test_comparison_binds_before_boolean() {
        assert_eq!(
            parse_ok("year<2005 && foo"),
            QueryNode::and(
                QueryNode::compare(CompareOp::Less, tag("year"), tag("2005")),
                tag("foo")
            )
        );
        assert_eq!(
            parse_ok("a==b&&c"),
            QueryNode::and(
                QueryNode::compare(CompareOp::Equal, tag("a"), tag("b")),
                tag("c")
            )
        );
        assert_eq!(
            parse_ok("foo && year>=2004"),
            QueryNode::and(
                tag("foo"),
                QueryNode::compare(CompareOp::GreaterEqual, tag("year"), tag("2004"))
            )
        );
    }

    #[test]
    fn test_boolean_operators_nest_to_the_right() {
        assert_eq!(
            parse_ok("a && b || c"),
            QueryNode::and(tag("a"), QueryNode::or(tag("b"), tag("c")))
        );
        assert_eq!(
            parse_ok("(a && b) || c"),
            QueryNode::or(QueryNode::and(tag("a"), tag("b")), tag("c"))
        );
    }

    #[test]
    fn test_not_is_greedy() {
        assert_eq!(
            parse_ok("!a && b"),
            QueryNode::not(QueryNode::and(tag("a"), tag("b")))
        );
        assert_eq!(
            parse_ok("all && !(2 || 3)"),
            QueryNode::and(
                tag("all"),
                QueryNode::not(QueryNode::or(tag("2"), tag("3")))
            )
        );
    }

    #[test]
    fn test_unexpected_tokens() {
        assert_eq!(syntax_error(")"), "unexpected )");
        assert_eq!(syntax_error("<"), "unexpected <");
        assert_eq!(syntax_error(">"), "unexpected >");
        assert_eq!(syntax_error("&& a"), "unexpected &&");
        assert_eq!(syntax_error("|| a"), "unexpected ||");
        assert!(syntax_error("a b").starts_with("unexpected tag \"b\""));
    }

    #[test]
    fn test_unbalanced_parens() {
        assert_eq!(syntax_error("(a"), "expected ), got end of query");
        assert_eq!(syntax_error("a)"), "unexpected )");
        assert_eq!(syntax_error("(a))"), "unexpected )");
    }

    #[test]
    fn test_incomplete_input() {
        assert_eq!(syntax_error(""), "empty query");
        assert_eq!(syntax_error("   "), "empty query");
        assert_eq!(syntax_error("!"), "expected expression after !");
        assert_eq!(syntax_error("a &&"), "unexpected end of query");
        assert_eq!(syntax_error("year <"), "unexpected end of query");
        assert_eq!(syntax_error("a:"), "expected tag after a:");
        assert_eq!(syntax_error("^a"), "expected $ after ^a");
        assert_eq!(syntax_error("^"), "expected tag after ^");
    }

    #[test]
    fn test_nesting_depth_is_limited() {
        let deep = format!("{}a{}", "(".repeat(50_000), ")".repeat(50_000));
        assert_eq!(syntax_error(&deep), "query nested too deeply");

        let negations = format!("{}a", "!".repeat(50_000));
        assert_eq!(syntax_error(&negations), "query nested too deeply");

        let chain = vec!["a"; 1_000].join(" && ");
        assert_eq!(syntax_error(&chain), "query nested too deeply");

        let shallow = 100;
        let ok = format!("{}a{}", "(".repeat(shallow), ")".repeat(shallow));
        assert_eq!(parse_ok(&ok), tag("a"));
    }

    #[test]
    fn test_display_reparses_to_same_tree() {
        for input in [
            "a && !(b || c)",
            "year<2005 && foo",
            "x:1 || ^\"ab cd\"$",
            "(a || b) && (c || d)",
            "(!a) && b",
            "\"new york\":2011 && !x",
        ] {
            let tree = parse_ok(input);
            assert_eq!(parse_ok(&tree.to_string()), tree, "{input}");
        }
    }
}
