//! Regular expressions over the tagged label alphabet, text parsing, and
//! Thompson construction into an epsilon-NFA [`Fa`](crate::automaton::Fa).
//!
//! Grammar:
//! ```text
//! expr   := term ('|' term)*
//! term   := factor*
//! factor := atom ('*' | '+')?
//! atom   := '(' expr ')' | '$' | SYMBOL
//! SYMBOL := one non-meta char | '<' name '>'
//! ```
//! `$` denotes epsilon, matching the ECFG `$`-for-epsilon convention. A bare
//! `SYMBOL` is a single-character terminal by default (so `"abc"` is three
//! concatenated one-character symbols); a `<name>` bracket names a
//! multi-character symbol, used when a regex body references a nonterminal
//! by name (ECFG recursive calls).
//!
//! Parsing produces an untyped [`Ast`] (bare interned [`Symbol`]s, neither
//! terminal nor variable yet); [`Regex::parse`]/[`Regex::parse_with_variables`]
//! resolve it into a [`Regex`] whose leaves carry the tagged [`Label`], since
//! only the caller (a bare RPQ regex vs. an ECFG production body) knows which
//! names are recursive calls.

use nom::branch::alt;
use nom::character::complete::{char, none_of};
use nom::combinator::{opt, recognize, value};
use nom::multi::many1;
use nom::sequence::delimited;
use nom::{IResult, Parser};

use ahash::AHashSet;

use crate::automaton::{Fa, State};
use crate::error::GrammarError;
use crate::symbol::{Label, Symbol, SymbolTable};

/// An unresolved regex AST: leaves are bare interned symbol names.
#[derive(Clone, Debug)]
enum Ast {
    Epsilon,
    Sym(Symbol),
    Star(Box<Ast>),
    Plus(Box<Ast>),
    Concat(Box<Ast>, Box<Ast>),
    Alt(Box<Ast>, Box<Ast>),
}

/// A regex whose leaves have been resolved into the tagged [`Label`]
/// alphabet, ready for Thompson construction.
#[derive(Clone, Debug)]
enum Resolved {
    Epsilon,
    Sym(Label),
    Star(Box<Resolved>),
    Plus(Box<Resolved>),
    Concat(Box<Resolved>, Box<Resolved>),
    Alt(Box<Resolved>, Box<Resolved>),
}

/// A parsed, resolved regex. Values are immutable; [`Regex::to_fa`] builds a
/// fresh epsilon-NFA every call.
#[derive(Clone, Debug)]
pub struct Regex(Resolved);

impl Regex {
    /// Parses `text` as a regex over a plain terminal alphabet (the
    /// `regular_query`/`find_accessible` entry points): every bare or
    /// bracketed symbol resolves to [`Label::Terminal`].
    pub fn parse(text: &str, table: &mut SymbolTable) -> Result<Regex, GrammarError> {
        Regex::parse_with_variables(text, table, &AHashSet::default())
    }

    /// Parses `text`, resolving any symbol whose interned name is in
    /// `variables` to [`Label::Variable`] instead of [`Label::Terminal`];
    /// used for ECFG production bodies, where a regex may recursively call
    /// another head.
    pub fn parse_with_variables(
        text: &str,
        table: &mut SymbolTable,
        variables: &AHashSet<Symbol>,
    ) -> Result<Regex, GrammarError> {
        let ast = parse_ast(text, table)?;
        Ok(Regex(resolve(&ast, variables)))
    }

    /// Thompson construction: builds an epsilon-NFA accepting exactly the
    /// language of this regex, with a single start state and a single final
    /// state.
    pub fn to_fa(&self) -> Fa {
        let mut builder = ThompsonBuilder::default();
        let (start, end) = builder.build(&self.0);
        let mut fa = Fa::new(builder.num_states);
        for (from, label, to) in builder.edges {
            fa.add_edge(State(from), label, State(to));
        }
        fa.add_start(State(start));
        fa.add_final(State(end));
        fa
    }
}

fn resolve(ast: &Ast, variables: &AHashSet<Symbol>) -> Resolved {
    match ast {
        Ast::Epsilon => Resolved::Epsilon,
        Ast::Sym(s) => {
            let label = if variables.contains(s) {
                Label::Variable(*s)
            } else {
                Label::Terminal(*s)
            };
            Resolved::Sym(label)
        }
        Ast::Star(a) => Resolved::Star(Box::new(resolve(a, variables))),
        Ast::Plus(a) => Resolved::Plus(Box::new(resolve(a, variables))),
        Ast::Concat(a, b) => {
            Resolved::Concat(Box::new(resolve(a, variables)), Box::new(resolve(b, variables)))
        }
        Ast::Alt(a, b) => Resolved::Alt(Box::new(resolve(a, variables)), Box::new(resolve(b, variables))),
    }
}

#[derive(Default)]
struct ThompsonBuilder {
    num_states: usize,
    edges: Vec<(usize, Label, usize)>,
}

impl ThompsonBuilder {
    fn fresh(&mut self) -> usize {
        let id = self.num_states;
        self.num_states += 1;
        id
    }

    /// Builds a fragment for `ast`, returning its (start, end) state pair.
    fn build(&mut self, ast: &Resolved) -> (usize, usize) {
        match ast {
            Resolved::Epsilon => {
                let s = self.fresh();
                let e = self.fresh();
                self.edges.push((s, Label::Epsilon, e));
                (s, e)
            }
            Resolved::Sym(label) => {
                let s = self.fresh();
                let e = self.fresh();
                self.edges.push((s, *label, e));
                (s, e)
            }
            Resolved::Star(inner) => {
                let (is, ie) = self.build(inner);
                let s = self.fresh();
                let e = self.fresh();
                self.edges.push((s, Label::Epsilon, is));
                self.edges.push((ie, Label::Epsilon, is));
                self.edges.push((s, Label::Epsilon, e));
                self.edges.push((ie, Label::Epsilon, e));
                (s, e)
            }
            Resolved::Plus(inner) => {
                // One mandatory pass through `inner`, then loop back for
                // zero or more further passes: accepts at least one rep.
                let (is, ie) = self.build(inner);
                let s = self.fresh();
                let e = self.fresh();
                self.edges.push((s, Label::Epsilon, is));
                self.edges.push((ie, Label::Epsilon, e));
                self.edges.push((ie, Label::Epsilon, is));
                (s, e)
            }
            Resolved::Concat(a, b) => {
                let (as_, ae) = self.build(a);
                let (bs, be) = self.build(b);
                self.edges.push((ae, Label::Epsilon, bs));
                (as_, be)
            }
            Resolved::Alt(a, b) => {
                let (as_, ae) = self.build(a);
                let (bs, be) = self.build(b);
                let s = self.fresh();
                let e = self.fresh();
                self.edges.push((s, Label::Epsilon, as_));
                self.edges.push((s, Label::Epsilon, bs));
                self.edges.push((ae, Label::Epsilon, e));
                self.edges.push((be, Label::Epsilon, e));
                (s, e)
            }
        }
    }
}

fn parse_ast(text: &str, table: &mut SymbolTable) -> Result<Ast, GrammarError> {
    let (rest, ast) = expr(text, table).map_err(|e| GrammarError::Parse(format!("{e}")))?;
    if !rest.trim().is_empty() {
        return Err(GrammarError::Parse(format!(
            "unconsumed trailing input: {rest:?}"
        )));
    }
    Ok(ast)
}

fn expr<'a>(input: &'a str, table: &mut SymbolTable) -> IResult<&'a str, Ast> {
    let (mut input, first) = term(input, table)?;
    let mut result = first;
    while let Ok((rest, _)) = char::<_, nom::error::Error<&str>>('|').parse(input) {
        let (rest, next) = term(rest, table)?;
        result = Ast::Alt(Box::new(result), Box::new(next));
        input = rest;
    }
    Ok((input, result))
}

fn term<'a>(input: &'a str, table: &mut SymbolTable) -> IResult<&'a str, Ast> {
    let mut input = input;
    let mut result: Option<Ast> = None;
    while let Ok((rest, next)) = factor(input, table) {
        result = Some(match result {
            None => next,
            Some(prev) => Ast::Concat(Box::new(prev), Box::new(next)),
        });
        input = rest;
    }
    Ok((input, result.unwrap_or(Ast::Epsilon)))
}

fn factor<'a>(input: &'a str, table: &mut SymbolTable) -> IResult<&'a str, Ast> {
    let (input, a) = atom(input, table)?;
    let (input, rep) = opt(alt((char('*'), char('+')))).parse(input)?;
    let ast = match rep {
        Some('*') => Ast::Star(Box::new(a)),
        Some('+') => Ast::Plus(Box::new(a)),
        _ => a,
    };
    Ok((input, ast))
}

fn atom<'a>(input: &'a str, table: &mut SymbolTable) -> IResult<&'a str, Ast> {
    if let Ok((rest, _)) = char::<_, nom::error::Error<&str>>('(').parse(input) {
        let (rest, inner) = expr(rest, table)?;
        let (rest, _) = char(')').parse(rest)?;
        return Ok((rest, inner));
    }
    if let Ok((rest, _)) = value((), char::<_, nom::error::Error<&str>>('$')).parse(input) {
        return Ok((rest, Ast::Epsilon));
    }
    if let Ok((rest, name)) =
        delimited(char::<_, nom::error::Error<&str>>('<'), recognize(many1(none_of("<>"))), char('>'))
            .parse(input)
    {
        return Ok((rest, Ast::Sym(table.intern(name))));
    }
    let (rest, ch) = none_of("()|*+$<>")(input)?;
    let mut buf = [0u8; 4];
    let s = ch.encode_utf8(&mut buf);
    Ok((rest, Ast::Sym(table.intern(s))))
}
