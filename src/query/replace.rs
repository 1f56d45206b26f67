use serde::{Deserialize, Serialize};

/// Upper bound on splices in a single [`replace`] call. Rule sets whose
/// replacement re-creates their own search sequence never reach a fixed
/// point; they are cut off here.
pub const MAX_REPLACEMENT_ROUNDS: usize = 10_000;

/// A search-and-replace rule over the token stream.
///
/// Besides fusing operators, rules can expand domain shortcuts. Rewriting
/// `with:friends` into `alice && bob`:
///
/// ```
/// use tagq::query::TokenReplacement;
///
/// let rule = TokenReplacement::new(["with", ":", "friends"], ["alice", "&&", "bob"]);
/// assert_eq!(rule.search.len(), 3);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenReplacement {
    pub search: Vec<String>,
    pub replace: Vec<String>,
}

impl TokenReplacement {
    pub fn new<S, R>(search: S, replace: R) -> Self
    where
        S: IntoIterator,
        S::Item: Into<String>,
        R: IntoIterator,
        R::Item: Into<String>,
    {
        Self {
            search: search.into_iter().map(Into::into).collect(),
            replace: replace.into_iter().map(Into::into).collect(),
        }
    }

    fn matches_at(&self, tokens: &[String], pos: usize) -> bool {
        !self.search.is_empty()
            && tokens
                .get(pos..pos + self.search.len())
                .is_some_and(|window| window == self.search.as_slice())
    }
}

/// Rules that fuse single-character tokens into the real operators.
pub fn builtin_rules() -> Vec<TokenReplacement> {
    vec![
        TokenReplacement::new(["<", "="], ["<="]),
        TokenReplacement::new([">", "="], [">="]),
        TokenReplacement::new(["=", "="], ["=="]),
        TokenReplacement::new(["&", "&"], ["&&"]),
        TokenReplacement::new(["|", "|"], ["||"]),
    ]
}

/// Rewrite `tokens` until no rule applies.
///
/// Scans left to right; at the first position where a rule's search
/// sequence matches, the replacement is spliced in and scanning restarts
/// from the beginning. When several rules match at one position the
/// first-listed one wins.
pub fn replace(rules: &[TokenReplacement], tokens: &[String]) -> Vec<String> {
    let mut tokens = tokens.to_vec();
    let mut rounds = 0;

    'scan: loop {
        for pos in 0..tokens.len() {
            for rule in rules {
                if !rule.matches_at(&tokens, pos) {
                    continue;
                }

                tokens.splice(pos..pos + rule.search.len(), rule.replace.iter().cloned());

                rounds += 1;
                if rounds >= MAX_REPLACEMENT_ROUNDS {
                    tracing::warn!(
                        rounds,
                        "token replacement did not reach a fixed point, giving up"
                    );
                    return tokens;
                }
                continue 'scan;
            }
        }

        return tokens;
    }
}
