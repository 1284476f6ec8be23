//! Token compacter for abstracted predicate strings.
//!
//! Abstracted predicates repeat long node-type words (`binary_expression`,
//! `parenthesized_expression`, ...) hundreds of times across a corpus. The
//! compacter maps every such word to a small decimal id, turning
//! `"(parenthesized_expression (binary_expression ("%") (identifier)))"` into
//! something like `"(0 (1 ("%") (2)))"` while keeping the structural
//! punctuation verbatim. All tries and search engines operate on the
//! compacted form.

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::error::{Error, Result};

/// Bijective word-to-id interner shared by training and scanning.
///
/// Ids are dense, assigned in discovery order starting at 0, and never
/// reassigned, so compacted output is stable for the lifetime of the
/// instance. A single instance must be shared by every trie and scanner
/// thread that exchanges compacted patterns; it is passed explicitly rather
/// than held in global state.
///
/// Both direction maps live behind one readers-writer lock so a reader can
/// never observe an id without its reverse mapping.
#[derive(Debug, Default)]
pub struct Compacter {
    maps: RwLock<Maps>,
}

#[derive(Debug, Default)]
struct Maps {
    token_to_id: FxHashMap<String, u64>,
    /// Dense reverse map: `id_to_token[id]` is the token for `id`.
    id_to_token: Vec<String>,
}

fn is_word_byte(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'_'
}

impl Compacter {
    /// Create an empty compacter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct tokens interned so far.
    pub fn len(&self) -> usize {
        self.maps.read().id_to_token.len()
    }

    /// True if no token has been interned yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Return the id for `token`, assigning the next free id on first sight.
    pub fn token_to_id(&self, token: &str) -> u64 {
        if let Some(&id) = self.maps.read().token_to_id.get(token) {
            return id;
        }
        let mut maps = self.maps.write();
        // Racing assigner may have won between the locks.
        if let Some(&id) = maps.token_to_id.get(token) {
            return id;
        }
        let id = maps.id_to_token.len() as u64;
        maps.token_to_id.insert(token.to_string(), id);
        maps.id_to_token.push(token.to_string());
        id
    }

    /// Return the token recorded for `id`.
    ///
    /// # Errors
    ///
    /// Expanding an id that was never assigned is a caller bug and returns
    /// [`Error::UnknownTokenId`].
    pub fn id_to_token(&self, id: u64) -> Result<String> {
        self.maps
            .read()
            .id_to_token
            .get(id as usize)
            .cloned()
            .ok_or(Error::UnknownTokenId(id))
    }

    /// Shorten `source` by replacing every maximal run of word characters
    /// (`[A-Za-z0-9_]`) with its decimal id. Delimiter characters are copied
    /// through unchanged.
    pub fn compact(&self, source: &str) -> String {
        let mut result = String::with_capacity(source.len());
        let mut token_start = None;
        for (i, &c) in source.as_bytes().iter().enumerate() {
            if is_word_byte(c) {
                token_start.get_or_insert(i);
            } else {
                if let Some(start) = token_start.take() {
                    let id = self.token_to_id(&source[start..i]);
                    result.push_str(&id.to_string());
                }
                result.push(c as char);
            }
        }
        if let Some(start) = token_start {
            let id = self.token_to_id(&source[start..]);
            result.push_str(&id.to_string());
        }
        result
    }

    /// Inverse of [`compact`](Self::compact): replace every maximal run of
    /// decimal digits with the token recorded for that id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownTokenId`] if a digit run names an id this
    /// compacter never assigned.
    pub fn expand(&self, source: &str) -> Result<String> {
        let mut result = String::with_capacity(source.len() * 4);
        let mut id_start = None;
        for (i, &c) in source.as_bytes().iter().enumerate() {
            if c.is_ascii_digit() {
                id_start.get_or_insert(i);
            } else {
                if let Some(start) = id_start.take() {
                    result.push_str(&self.expand_id(&source[start..i])?);
                }
                result.push(c as char);
            }
        }
        if let Some(start) = id_start {
            result.push_str(&self.expand_id(&source[start..])?);
        }
        Ok(result)
    }

    fn expand_id(&self, digits: &str) -> Result<String> {
        let id: u64 = digits
            .parse()
            .map_err(|_| Error::UnknownTokenId(u64::MAX))?;
        self.id_to_token(id)
    }
}
