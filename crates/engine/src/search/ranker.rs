//! Relevance ranking of matched items
//!
//! Heuristic score, accumulated per item:
//! - phrase bonus when a field contains the whole query text
//! - positional bonus `10 - i` when query token `i` equals name token `i`
//! - per-field bonus for each query token present in that field
//! - penalty of 0.5 per field token beyond the query length (multi-token
//!   queries only)
//! - bonus when every query token appears in some field
//!
//! The score is floored at 0.

use super::tokenizer::tokenize;
use quarry_core::{Item, ItemId};

/// Phrase bonus: name
pub const NAME_PHRASE_BONUS: f64 = 100.0;
/// Phrase bonus: address
pub const ADDRESS_PHRASE_BONUS: f64 = 50.0;
/// Phrase bonus: description
pub const DESCRIPTION_PHRASE_BONUS: f64 = 30.0;
/// Phrase bonus: city
pub const CITY_PHRASE_BONUS: f64 = 40.0;

/// Word bonus: name
pub const NAME_WORD_BONUS: f64 = 5.0;
/// Word bonus: address
pub const ADDRESS_WORD_BONUS: f64 = 3.0;
/// Word bonus: description
pub const DESCRIPTION_WORD_BONUS: f64 = 2.0;
/// Word bonus: city
pub const CITY_WORD_BONUS: f64 = 3.0;

/// Positional bonus at position 0; decreases by one per position
pub const POSITION_BONUS_BASE: f64 = 10.0;
/// Penalty per extra field token
pub const EXTRA_WORD_PENALTY: f64 = 0.5;
/// Bonus when every query token is found
pub const ALL_TOKENS_BONUS: f64 = 20.0;

/// A query prepared once and scored against many items
#[derive(Debug, Clone)]
pub struct RankQuery {
    phrase: String,
    tokens: Vec<String>,
}

struct Field {
    text: String,
    tokens: Vec<String>,
    phrase_bonus: f64,
    word_bonus: f64,
}

impl Field {
    fn new(raw: &str, phrase_bonus: f64, word_bonus: f64) -> Self {
        Field {
            text: raw.to_lowercase(),
            tokens: tokenize(raw),
            phrase_bonus,
            word_bonus,
        }
    }

    fn has_token(&self, token: &str) -> bool {
        self.tokens.iter().any(|t| t == token)
    }
}

impl RankQuery {
    /// Prepare `query` for scoring
    pub fn new(query: &str) -> Self {
        RankQuery {
            phrase: query.trim().to_lowercase(),
            tokens: tokenize(query),
        }
    }

    /// Score one item. Pure, deterministic and never negative.
    pub fn score(&self, item: &Item) -> f64 {
        let fields = [
            Field::new(&item.name, NAME_PHRASE_BONUS, NAME_WORD_BONUS),
            Field::new(&item.address, ADDRESS_PHRASE_BONUS, ADDRESS_WORD_BONUS),
            Field::new(&item.description, DESCRIPTION_PHRASE_BONUS, DESCRIPTION_WORD_BONUS),
            Field::new(&item.city, CITY_PHRASE_BONUS, CITY_WORD_BONUS),
        ];
        let name = &fields[0];

        let mut score = 0.0;

        if !self.phrase.is_empty() {
            for field in &fields {
                if field.text.contains(&self.phrase) {
                    score += field.phrase_bonus;
                }
            }
        }

        for (i, token) in self.tokens.iter().enumerate() {
            if name.tokens.get(i) == Some(token) {
                score += POSITION_BONUS_BASE - i as f64;
            }
            for field in &fields {
                if field.has_token(token) {
                    score += field.word_bonus;
                }
            }
        }

        if self.tokens.len() > 1 {
            let field_tokens: usize = fields.iter().map(|f| f.tokens.len()).sum();
            let extra = field_tokens.saturating_sub(self.tokens.len());
            score -= EXTRA_WORD_PENALTY * extra as f64;
        }

        if !self.tokens.is_empty()
            && self
                .tokens
                .iter()
                .all(|token| fields.iter().any(|f| f.has_token(token)))
        {
            score += ALL_TOKENS_BONUS;
        }

        score.max(0.0)
    }
}

/// Score `item` against `query`.
pub fn score(item: &Item, query: &str) -> f64 {
    RankQuery::new(query).score(item)
}

/// Sort `ids` by descending score.
///
/// Ids are resolved as `items[id - 1]`; an id with no item scores 0. The
/// sort is stable, so equal scores keep the input order.
pub fn rank(ids: Vec<ItemId>, items: &[Item], query: &str) -> Vec<ItemId> {
    let query = RankQuery::new(query);
    let mut scored: Vec<(ItemId, f64)> = ids
        .into_iter()
        .map(|id| {
            let score = Item::slot(id)
                .and_then(|slot| items.get(slot))
                .map(|item| query.score(item))
                .unwrap_or(0.0);
            (id, score)
        })
        .collect();
    scored.sort_by(|a, b| b.1.total_cmp(&a.1));
    scored.into_iter().map(|(id, _)| id).collect()
}
