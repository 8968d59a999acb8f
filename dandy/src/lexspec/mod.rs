//! # Lexical specifications and the tokenizer
//!
//! A [LexSpec] is the data model of spec.md §3/§6: an ordered list of reserved keywords, an
//! ordered list of named regex definitions (substituted into later definitions/tokens but never
//! themselves emitted as tokens), and an ordered list of named token rules (declaration order is
//! tie-break precedence). [LexSpec::build] resolves it into a [Lexer] — a single composed,
//! labeled DFA plus the keyword list — which [Lexer::tokenize] drives over a source text to
//! produce a [Token] stream (spec.md §4.4).
//!
//! ## Usage
//!
//! ```
//! use dandy::lexspec::LexSpec;
//! use std::rc::Rc;
//!
//! let spec = LexSpec {
//!     reserved: vec![Rc::from("if"), Rc::from("else")],
//!     definitions: vec![(Rc::from("digit"), Rc::from("0|1|2|3|4|5|6|7|8|9"))],
//!     tokens: vec![
//!         (Rc::from("number"), Rc::from("digit+")),
//!         (Rc::from("ident"), Rc::from("(a|b|c)+")),
//!     ],
//! };
//!
//! let lexer = spec.build().unwrap();
//! let tokens = lexer.tokenize("if 42 abc").unwrap();
//! assert_eq!(tokens[0].class.as_ref(), "keyword");
//! assert_eq!(tokens[1].class.as_ref(), "number");
//! assert_eq!(tokens[2].class.as_ref(), "ident");
//! ```

use crate::dfa::Dfa;
use crate::nfa::Nfa;
use std::rc::Rc;
use thiserror::Error;
use unicode_segmentation::UnicodeSegmentation;

/// The class name emitted for any reserved keyword, regardless of which keyword it is (spec.md
/// §4.4: "emit `(keyword, word)`" — `original_source`'s `Lexico.run` hard-codes this name, and
/// this crate follows it verbatim).
pub const KEYWORD_CLASS: &str = "keyword";

/// The five lexical-spec-related error shapes of spec.md §7 (spec-load and regex-parse are fatal
/// at build time; the lexical error carries the offending word and its 1-based source line).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LexError {
    #[error("lexical specification declares no tokens")]
    NoTokens,
    #[error("failed to parse the regular expression for '{name}': {message}")]
    RegexParse { name: Rc<str>, message: String },
    #[error("lexical error: '{word}' (line {line})")]
    UnrecognizedWord { word: String, line: usize },
}

/// A lexical specification: reserved keywords, named regex definitions (substitution only), and
/// named token rules (spec.md §3, §6).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexSpec {
    pub reserved: Vec<Rc<str>>,
    pub definitions: Vec<(Rc<str>, Rc<str>)>,
    pub tokens: Vec<(Rc<str>, Rc<str>)>,
}

/// A single recognized lexeme: its token class and the matched text (spec.md §3).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub class: Rc<str>,
    pub lexeme: Rc<str>,
}

/// A built lexer: the composed, labeled DFA plus the reserved-keyword list, ready to tokenize
/// source text (spec.md §4.4).
#[derive(Debug, Clone)]
pub struct Lexer {
    dfa: Dfa,
    reserved: Vec<Rc<str>>,
}

impl LexSpec {
    /// Resolves definitions and tokens (textual substitution, §6), parses and Thompson-constructs
    /// every token regex, composes them into a single labeled DFA (§4.3's labeling policy,
    /// earliest-declared-token-wins) and minimizes it, yielding a [Lexer].
    pub fn build(self) -> Result<Lexer, LexError> {
        let mut resolved: Vec<(Rc<str>, String)> = Vec::with_capacity(self.definitions.len());
        for (name, expression) in &self.definitions {
            let substituted = Self::substitute(expression, &resolved, &[]);
            resolved.push((name.clone(), substituted));
        }

        let mut token_exprs: Vec<(Rc<str>, String)> = Vec::with_capacity(self.tokens.len());
        for (name, expression) in &self.tokens {
            let substituted = Self::substitute(expression, &resolved, &token_exprs);
            token_exprs.push((name.clone(), substituted));
        }

        if token_exprs.is_empty() {
            return Err(LexError::NoTokens);
        }

        let mut component_nfas = Vec::with_capacity(token_exprs.len());
        for (name, expression) in &token_exprs {
            let regex = crate::parser::regex(expression).map_err(|e| LexError::RegexParse {
                name: name.clone(),
                message: e.to_string(),
            })?;
            component_nfas.push((name.clone(), regex.to_nfa()));
        }

        let union = Nfa::labeled_union(component_nfas);
        let mut dfa = union.to_dfa();
        dfa.minimize();

        Ok(Lexer {
            dfa,
            reserved: self.reserved,
        })
    }

    /// Replaces every occurrence of a previously-declared name by its own expression,
    /// parenthesized, in declaration order (spec.md §6: "Definitions are textually substituted
    /// into later definitions and into token expressions ... tokens may likewise reference
    /// earlier tokens by name"), exactly as `autome.interface.lexico.Lexico.build_lexer` does.
    fn substitute(expression: &str, definitions: &[(Rc<str>, String)], earlier_tokens: &[(Rc<str>, String)]) -> String {
        let mut result = expression.to_string();
        for (name, resolved) in definitions.iter().chain(earlier_tokens.iter()) {
            if result.contains(name.as_ref()) {
                result = result.replace(name.as_ref(), &format!("({resolved})"));
            }
        }
        result
    }
}

impl Lexer {
    /// The composed, labeled DFA backing this lexer.
    pub fn dfa(&self) -> &Dfa {
        &self.dfa
    }

    /// Tokenizes `source` (spec.md §4.4): splits on whitespace/newlines (blank lines skipped),
    /// matches each word against `reserved` first, then runs the composed DFA over its
    /// graphemes. Single pass, never backtracks; fails on the first lexical error.
    pub fn tokenize(&self, source: &str) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();

        for (line_idx, line) in source.lines().enumerate() {
            for word in line.split_whitespace() {
                if self.reserved.iter().any(|k| k.as_ref() == word) {
                    tokens.push(Token {
                        class: Rc::from(KEYWORD_CLASS),
                        lexeme: Rc::from(word),
                    });
                    continue;
                }

                let mut evaluator = self.dfa.evaluator();
                let graphemes: Vec<&str> = word.graphemes(true).collect();
                evaluator.step_multiple(&graphemes);

                if !evaluator.is_accepting() {
                    return Err(LexError::UnrecognizedWord {
                        word: word.to_string(),
                        line: line_idx + 1,
                    });
                }

                let label = evaluator
                    .current_state()
                    .and_then(|s| s.label())
                    .expect("accepting composed-DFA state must carry a token label");

                tokens.push(Token {
                    class: Rc::from(label),
                    lexeme: Rc::from(word),
                });
            }
        }

        Ok(tokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec_with(tokens: Vec<(&str, &str)>, reserved: Vec<&str>) -> LexSpec {
        LexSpec {
            reserved: reserved.into_iter().map(Rc::from).collect(),
            definitions: vec![],
            tokens: tokens
                .into_iter()
                .map(|(n, e)| (Rc::from(n), Rc::from(e)))
                .collect(),
        }
    }

    #[test]
    fn symbol_automaton_accepts_only_the_exact_word() {
        let lexer = spec_with(vec![("a", "a")], vec![]).build().unwrap();
        assert!(lexer.tokenize("a").is_ok());
        assert!(lexer.tokenize("aa").is_err());
        assert!(lexer.tokenize("b").is_err());
    }

    #[test]
    fn union_and_kleene_star() {
        let lexer = spec_with(vec![("t", "(a|b)*(c|d)*")], vec![])
            .build()
            .unwrap();
        for word in ["a", "b", "abcd", "ccccc", "aaaabbbb"] {
            assert!(lexer.tokenize(word).is_ok(), "{word} should be accepted");
        }
        for word in ["acbd", "ddddbbbccccaaaa"] {
            assert!(lexer.tokenize(word).is_err(), "{word} should be rejected");
        }
    }

    #[test]
    fn escape_metacharacter() {
        let lexer = spec_with(vec![("t", r"(\*|\()*(c|d)*")], vec![])
            .build()
            .unwrap();
        assert!(lexer.tokenize("*(cd").is_ok());
    }

    #[test]
    fn concatenation_semantics() {
        let lexer = spec_with(vec![("t", "ab")], vec![]).build().unwrap();
        assert!(lexer.tokenize("ab").is_ok());
        for word in ["aab", "ba", "a", "b"] {
            assert!(lexer.tokenize(word).is_err());
        }
    }

    #[test]
    fn reserved_keywords_take_precedence_over_token_rules() {
        let lexer = spec_with(vec![("ident", "(i|f)+")], vec!["if"])
            .build()
            .unwrap();
        let tokens = lexer.tokenize("if fi").unwrap();
        assert_eq!(tokens[0].class.as_ref(), KEYWORD_CLASS);
        assert_eq!(tokens[1].class.as_ref(), "ident");
    }

    #[test]
    fn definitions_are_substituted_but_never_emitted_as_tokens() {
        let spec = LexSpec {
            reserved: vec![],
            definitions: vec![(Rc::from("digit"), Rc::from("0|1|2|3|4|5|6|7|8|9"))],
            tokens: vec![(Rc::from("number"), Rc::from("digit+"))],
        };
        let lexer = spec.build().unwrap();
        let tokens = lexer.tokenize("123").unwrap();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].class.as_ref(), "number");
        assert!(lexer.tokenize("digit").is_err());
    }

    #[test]
    fn earliest_declared_token_wins_ties() {
        // Both "a" tokens match the same word; the earlier-declared one's label should win.
        let spec = spec_with(vec![("first", "a"), ("second", "a")], vec![]);
        let lexer = spec.build().unwrap();
        let tokens = lexer.tokenize("a").unwrap();
        assert_eq!(tokens[0].class.as_ref(), "first");
    }

    #[test]
    fn unknown_symbol_reports_the_word_and_line() {
        let lexer = spec_with(vec![("t", "a")], vec![]).build().unwrap();
        let err = lexer.tokenize("a\nb\na").unwrap_err();
        assert_eq!(
            err,
            LexError::UnrecognizedWord {
                word: "b".to_string(),
                line: 2
            }
        );
    }

    #[test]
    fn empty_source_yields_no_tokens() {
        let lexer = spec_with(vec![("t", "a")], vec![]).build().unwrap();
        assert_eq!(lexer.tokenize("").unwrap(), vec![]);
        assert_eq!(lexer.tokenize("\n\n  \n").unwrap(), vec![]);
    }
}
