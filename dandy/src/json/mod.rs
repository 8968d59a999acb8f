//! # JSON (de)serialization for the three file formats of spec.md §6
//!
//! `dandy`'s core has no I/O (spec.md §5): these functions take and return JSON text, leaving
//! reading/writing files to callers such as `dandy-cli`. `serde`/`serde_json` is the natural
//! ecosystem choice here, used pervasively for this kind of data-model (de)serialization.

use crate::cfg::Grammar;
use crate::dfa::{Dfa, DfaState};
use crate::error::DandyError;
use crate::lexspec::LexSpec;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::rc::Rc;

#[derive(Deserialize)]
struct LexSpecFile {
    #[serde(rename = "reserved-keywords")]
    reserved_keywords: Vec<String>,
    definitions: Vec<NamedExpression>,
    tokens: Vec<NamedExpression>,
}

#[derive(Deserialize)]
struct NamedExpression {
    name: String,
    expression: String,
}

/// Loads a [LexSpec] from the `{"reserved-keywords": [...], "definitions": [...], "tokens":
/// [...]}` shape of spec.md §6.
pub fn load_lex_spec(json: &str) -> Result<LexSpec, DandyError> {
    let file: LexSpecFile = serde_json::from_str(json)?;
    Ok(LexSpec {
        reserved: file.reserved_keywords.into_iter().map(Rc::from).collect(),
        definitions: file
            .definitions
            .into_iter()
            .map(|d| (Rc::from(d.name), Rc::from(d.expression)))
            .collect(),
        tokens: file
            .tokens
            .into_iter()
            .map(|d| (Rc::from(d.name), Rc::from(d.expression)))
            .collect(),
    })
}

#[derive(Deserialize)]
struct GrammarFileWrapper {
    grammar: GrammarFile,
}

#[derive(Deserialize)]
struct GrammarFile {
    nonterminals: Vec<String>,
    terminals: Vec<String>,
    initial: String,
    productions: Vec<ProductionEntry>,
}

#[derive(Deserialize)]
struct ProductionEntry {
    head: String,
    body: String,
}

/// Loads a [Grammar] from the `{"grammar": {"nonterminals": ..., "terminals": ..., "initial":
/// ..., "productions": [{"head", "body"}]}}` shape of spec.md §6. `body` is `|`-separated
/// alternatives of whitespace-separated symbols, per spec.md §6, ported from `CFG.parse`.
/// Rejects `initial ∉ nonterminals` as a spec-load error (spec.md §6, §7.1).
pub fn load_grammar(json: &str) -> Result<Grammar, DandyError> {
    let GrammarFileWrapper { grammar } = serde_json::from_str(json)?;

    let nonterminals: Vec<Rc<str>> = grammar.nonterminals.into_iter().map(Rc::from).collect();
    let terminals: Vec<Rc<str>> = grammar.terminals.into_iter().map(Rc::from).collect();
    let initial: Rc<str> = Rc::from(grammar.initial);

    let mut productions: HashMap<Rc<str>, Vec<Vec<Rc<str>>>> = HashMap::new();
    for entry in grammar.productions {
        let head: Rc<str> = Rc::from(entry.head);
        let alternatives = entry
            .body
            .split('|')
            .map(|alt| alt.split_whitespace().map(Rc::from).collect::<Vec<Rc<str>>>())
            .collect();
        productions.insert(head, alternatives);
    }

    Grammar::new(nonterminals, terminals, initial, productions).map_err(DandyError::from)
}

/// A single state in the persisted-automaton JSON format of spec.md §6.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedState {
    pub uid: String,
    pub name: String,
    pub initial: bool,
    pub accept: bool,
    #[serde(rename = "type")]
    pub label: Option<String>,
}

/// A single transition in the persisted-automaton JSON format of spec.md §6.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedTransition {
    #[serde(rename = "origin-uid")]
    pub origin_uid: String,
    #[serde(rename = "destiny-uid")]
    pub destiny_uid: String,
    pub symbol: String,
}

/// A persisted automaton: `{ "states": [...], "transitions": [...] }` (spec.md §6). `uid` is an
/// opaque stable string (here, the state's index in the originating DFA's state array).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedDfa {
    pub states: Vec<PersistedState>,
    pub transitions: Vec<PersistedTransition>,
}

impl From<&Dfa> for PersistedDfa {
    fn from(dfa: &Dfa) -> Self {
        let states = dfa
            .states()
            .iter()
            .enumerate()
            .map(|(idx, state)| PersistedState {
                uid: idx.to_string(),
                name: state.name().to_string(),
                initial: state.is_initial(),
                accept: state.is_accepting(),
                label: state.label().map(str::to_string),
            })
            .collect();

        let transitions = dfa
            .states()
            .iter()
            .enumerate()
            .flat_map(|(idx, state)| {
                state
                    .transitions()
                    .iter()
                    .enumerate()
                    .map(move |(symbol_idx, &dest)| PersistedTransition {
                        origin_uid: idx.to_string(),
                        destiny_uid: dest.to_string(),
                        symbol: dfa.alphabet()[symbol_idx].to_string(),
                    })
            })
            .collect();

        PersistedDfa {
            states,
            transitions,
        }
    }
}

impl TryFrom<PersistedDfa> for Dfa {
    type Error = String;

    fn try_from(value: PersistedDfa) -> Result<Self, Self::Error> {
        let uid_to_idx: HashMap<&str, usize> = value
            .states
            .iter()
            .enumerate()
            .map(|(idx, s)| (s.uid.as_str(), idx))
            .collect();

        let mut alphabet: Vec<Rc<str>> = Vec::new();
        let mut alphabet_idx: HashMap<String, usize> = HashMap::new();
        for t in &value.transitions {
            if !alphabet_idx.contains_key(&t.symbol) {
                alphabet_idx.insert(t.symbol.clone(), alphabet.len());
                alphabet.push(Rc::from(t.symbol.as_str()));
            }
        }

        let mut transitions: Vec<Vec<Option<usize>>> =
            vec![vec![None; alphabet.len()]; value.states.len()];

        for t in &value.transitions {
            let origin = *uid_to_idx
                .get(t.origin_uid.as_str())
                .ok_or_else(|| format!("transition origin '{}' does not exist", t.origin_uid))?;
            let destiny = *uid_to_idx
                .get(t.destiny_uid.as_str())
                .ok_or_else(|| format!("transition destination '{}' does not exist", t.destiny_uid))?;
            let symbol_idx = *alphabet_idx
                .get(&t.symbol)
                .ok_or_else(|| format!("unknown symbol '{}'", t.symbol))?;
            transitions[origin][symbol_idx] = Some(destiny);
        }

        let mut initial_state = None;
        let mut states = Vec::with_capacity(value.states.len());
        for (idx, s) in value.states.iter().enumerate() {
            if s.initial {
                if initial_state.is_some() {
                    return Err("more than one initial state".to_string());
                }
                initial_state = Some(idx);
            }
            let resolved: Result<Vec<usize>, String> = transitions[idx]
                .iter()
                .enumerate()
                .map(|(symbol_idx, t)| {
                    t.ok_or_else(|| {
                        format!(
                            "state '{}' is missing a transition on '{}'",
                            s.name, alphabet[symbol_idx]
                        )
                    })
                })
                .collect();
            states.push(DfaState {
                name: Rc::from(s.name.as_str()),
                initial: s.initial,
                accepting: s.accept,
                label: s.label.as_deref().map(Rc::from),
                transitions: resolved?,
            });
        }

        let initial_state = initial_state.ok_or("no initial state")?;

        Ok(Dfa {
            alphabet: alphabet.into(),
            states,
            initial_state,
        })
    }
}

/// Serializes a DFA to the persisted-automaton JSON format (spec.md §6), suitable for the
/// `lexico --output` target.
pub fn dfa_to_json(dfa: &Dfa) -> Result<String, DandyError> {
    let persisted = PersistedDfa::from(dfa);
    Ok(serde_json::to_string_pretty(&persisted)?)
}

/// Parses a DFA back out of the persisted-automaton JSON format.
pub fn dfa_from_json(json: &str) -> Result<Dfa, DandyError> {
    let persisted: PersistedDfa = serde_json::from_str(json)?;
    Dfa::try_from(persisted).map_err(|e| DandyError::Json(serde::de::Error::custom(e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lex_spec_round_trips_through_json() {
        let json = r#"{
            "reserved-keywords": ["if", "else"],
            "definitions": [{"name": "digit", "expression": "0|1"}],
            "tokens": [{"name": "number", "expression": "digit+"}]
        }"#;
        let spec = load_lex_spec(json).unwrap();
        assert_eq!(spec.reserved.len(), 2);
        assert_eq!(spec.definitions.len(), 1);
        assert_eq!(spec.tokens.len(), 1);
    }

    #[test]
    fn grammar_rejects_initial_not_in_nonterminals() {
        let json = r#"{ "grammar": {
            "nonterminals": ["A"],
            "terminals": ["a"],
            "initial": "S",
            "productions": [{"head": "A", "body": "a"}]
        }}"#;
        assert!(load_grammar(json).is_err());
    }

    #[test]
    fn grammar_parses_pipe_separated_alternatives() {
        let json = r#"{ "grammar": {
            "nonterminals": ["S"],
            "terminals": ["a", "b"],
            "initial": "S",
            "productions": [{"head": "S", "body": "a S | b"}]
        }}"#;
        let grammar = load_grammar(json).unwrap();
        assert_eq!(grammar.productions_of("S").len(), 2);
    }

    #[test]
    fn dfa_round_trips_through_persisted_json() {
        let src = "
               a  b
            -> * s0 s1 s0
                 s1 s1 s1
        ";
        let parsed = crate::parser::dfa(src).unwrap();
        let dfa: Dfa = parsed.try_into().unwrap();
        let json = dfa_to_json(&dfa).unwrap();
        let reloaded = dfa_from_json(&json).unwrap();
        assert!(dfa.equivalent_to(&reloaded));
    }
}
