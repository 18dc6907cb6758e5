//! TeX-subset structural parser. Expressions become root-to-leaf subpaths
//! (`frac/num/var_a`, `sup/script/num_2`) so the math index can answer
//! partial structural matches. Covers groups, `\frac`, `\sqrt`, `^`/`_`
//! scripts, single-letter variables, digit runs and operator symbols;
//! anything outside the subset is a parse error, which the ingestion layer
//! degrades to offset-only bookkeeping.

use anyhow::{bail, Result};

use mathdex_core::traits::TexParser;
use mathdex_core::types::Subpath;

pub struct SubpathParser;

impl TexParser for SubpathParser {
    fn parse(&self, tex: &str) -> Result<Vec<Subpath>> {
        let tokens = scan(tex)?;
        let mut parser = Parser { tokens, at: 0 };
        let nodes = parser.parse_sequence()?;
        if parser.at < parser.tokens.len() {
            bail!("unbalanced '}}'");
        }
        if nodes.is_empty() {
            bail!("empty expression");
        }
        let mut paths = Vec::new();
        for node in &nodes {
            collect_paths(node, "", &mut paths);
        }
        Ok(paths)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Tok {
    Cmd(String),
    LBrace,
    RBrace,
    Caret,
    Under,
    Sym(String),
}

const OPERATORS: &str = "+-*/=<>(),.!|:;";

fn scan(tex: &str) -> Result<Vec<Tok>> {
    let chars: Vec<char> = tex.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() {
            i += 1;
        } else if c == '\\' {
            let start = i + 1;
            let mut end = start;
            while end < chars.len() && chars[end].is_ascii_alphabetic() {
                end += 1;
            }
            if end == start {
                bail!("stray backslash");
            }
            tokens.push(Tok::Cmd(chars[start..end].iter().collect()));
            i = end;
        } else if c == '{' {
            tokens.push(Tok::LBrace);
            i += 1;
        } else if c == '}' {
            tokens.push(Tok::RBrace);
            i += 1;
        } else if c == '^' {
            tokens.push(Tok::Caret);
            i += 1;
        } else if c == '_' {
            tokens.push(Tok::Under);
            i += 1;
        } else if c.is_ascii_digit() {
            let start = i;
            while i < chars.len() && chars[i].is_ascii_digit() {
                i += 1;
            }
            let run: String = chars[start..i].iter().collect();
            tokens.push(Tok::Sym(format!("num_{run}")));
        } else if c.is_ascii_alphabetic() {
            tokens.push(Tok::Sym(format!("var_{c}")));
            i += 1;
        } else if OPERATORS.contains(c) {
            tokens.push(Tok::Sym(format!("op_{c}")));
            i += 1;
        } else {
            bail!("unexpected character `{c}`");
        }
    }
    Ok(tokens)
}

#[derive(Debug)]
enum Node {
    Sym(String),
    Group(Vec<Node>),
    Frac(Box<Node>, Box<Node>),
    Sqrt(Box<Node>),
    Sup(Box<Node>, Box<Node>),
    Sub(Box<Node>, Box<Node>),
}

struct Parser {
    tokens: Vec<Tok>,
    at: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Tok> {
        self.tokens.get(self.at)
    }

    fn next(&mut self) -> Option<Tok> {
        let tok = self.tokens.get(self.at).cloned();
        if tok.is_some() {
            self.at += 1;
        }
        tok
    }

    // A sequence runs until a closing brace or the end of input.
    fn parse_sequence(&mut self) -> Result<Vec<Node>> {
        let mut nodes = Vec::new();
        while !matches!(self.peek(), None | Some(Tok::RBrace)) {
            nodes.push(self.parse_scripted()?);
        }
        Ok(nodes)
    }

    // A primary with any number of trailing ^/_ scripts attached.
    fn parse_scripted(&mut self) -> Result<Node> {
        let mut base = self.parse_primary()?;
        loop {
            if matches!(self.peek(), Some(Tok::Caret)) {
                self.at += 1;
                let script = self.parse_primary()?;
                base = Node::Sup(Box::new(base), Box::new(script));
            } else if matches!(self.peek(), Some(Tok::Under)) {
                self.at += 1;
                let script = self.parse_primary()?;
                base = Node::Sub(Box::new(base), Box::new(script));
            } else {
                return Ok(base);
            }
        }
    }

    fn parse_primary(&mut self) -> Result<Node> {
        match self.next() {
            Some(Tok::Cmd(name)) => match name.as_str() {
                "frac" => {
                    let num = self.parse_primary()?;
                    let den = self.parse_primary()?;
                    Ok(Node::Frac(Box::new(num), Box::new(den)))
                }
                "sqrt" => Ok(Node::Sqrt(Box::new(self.parse_primary()?))),
                other => bail!("unsupported command \\{other}"),
            },
            Some(Tok::LBrace) => {
                let nodes = self.parse_sequence()?;
                match self.next() {
                    Some(Tok::RBrace) => Ok(Node::Group(nodes)),
                    _ => bail!("unbalanced '{{'"),
                }
            }
            Some(Tok::Sym(s)) => Ok(Node::Sym(s)),
            Some(Tok::RBrace) => bail!("unexpected '}}'"),
            Some(Tok::Caret | Tok::Under) => bail!("dangling script"),
            None => bail!("unexpected end of expression"),
        }
    }
}

fn collect_paths(node: &Node, prefix: &str, out: &mut Vec<Subpath>) {
    let join = |label: &str| {
        if prefix.is_empty() {
            label.to_string()
        } else {
            format!("{prefix}/{label}")
        }
    };
    match node {
        Node::Sym(s) => out.push(join(s)),
        // groups are structurally transparent
        Node::Group(children) => {
            for child in children {
                collect_paths(child, prefix, out);
            }
        }
        Node::Frac(num, den) => {
            collect_paths(num, &join("frac/num"), out);
            collect_paths(den, &join("frac/den"), out);
        }
        Node::Sqrt(radicand) => collect_paths(radicand, &join("sqrt"), out),
        Node::Sup(base, script) => {
            collect_paths(base, &join("sup/base"), out);
            collect_paths(script, &join("sup/script"), out);
        }
        Node::Sub(base, script) => {
            collect_paths(base, &join("sub/base"), out);
            collect_paths(script, &join("sub/script"), out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(tex: &str) -> Result<Vec<Subpath>> {
        SubpathParser.parse(tex)
    }

    #[test]
    fn superscript_paths() {
        let paths = parse("x^2").expect("parse");
        assert_eq!(paths, vec!["sup/base/var_x", "sup/script/num_2"]);
    }

    #[test]
    fn fraction_paths_reach_through_groups() {
        let paths = parse("\\frac{a}{b}").expect("parse");
        assert_eq!(paths, vec!["frac/num/var_a", "frac/den/var_b"]);
    }

    #[test]
    fn nested_structure_composes() {
        let paths = parse("\\sqrt{x^2+1}").expect("parse");
        assert_eq!(
            paths,
            vec![
                "sqrt/sup/base/var_x",
                "sqrt/sup/script/num_2",
                "sqrt/op_+",
                "sqrt/num_1",
            ]
        );
    }

    #[test]
    fn rejects_out_of_subset_input() {
        assert!(parse("").is_err());
        assert!(parse("\\frac{a}{").is_err());
        assert!(parse("\\foo{x}").is_err());
        assert!(parse("x^").is_err());
        assert!(parse("a}").is_err());
        assert!(parse("\u{222b} f").is_err());
    }
}
