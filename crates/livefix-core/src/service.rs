//! Wire types and the correction-service seam.
//!
//! The service is a black box: a text plus an operation goes in, a corrected
//! text comes back. Transport, status and decoding problems are all
//! `ServiceFailure`s; none of them is fatal to the engine.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::unicode::is_word_boundary;

/// Operation requested from the service (`operation` on the wire).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// Grammar pass used for live, in-field checking.
    LiveGrammar,
    /// Spelling-only pass for a single word.
    SpellCheck,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::LiveGrammar => "live_grammar",
            Operation::SpellCheck => "spell_check",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrectionRequest {
    pub text: String,
    pub operation: Operation,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CorrectionResponse {
    #[serde(default)]
    pub original_text: String,
    pub corrected_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestions: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<serde_json::Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ServiceFailure {
    #[error("network error: {0}")]
    Network(String),
    #[error("service returned status {0}")]
    Status(u16),
    #[error("request timed out")]
    Timeout,
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl ServiceFailure {
    pub fn kind(&self) -> &'static str {
        match self {
            ServiceFailure::Network(_) => "network",
            ServiceFailure::Status(_) => "status",
            ServiceFailure::Timeout => "timeout",
            ServiceFailure::Malformed(_) => "malformed",
        }
    }
}

/// A correction backend. Calls block; the engine runs them on worker threads.
pub trait CorrectionService: Send + Sync {
    fn correct(&self, request: &CorrectionRequest) -> Result<CorrectionResponse, ServiceFailure>;
}

/// Offline service backed by a fixed `wrong → right` word table.
///
/// Multi-word text is corrected word by word; everything else, including
/// separators, passes through untouched.
pub struct StaticCorrections {
    table: HashMap<String, String>,
}

/// Common colloquial/misspelt forms and their standard spelling.
const FALLBACK_TABLE: &[(&str, &str)] = &[
    ("வநக்கம்", "வணக்கம்"),
    ("போறேன்", "போகிறேன்"),
    ("செல்றேன்", "செல்கிறேன்"),
    ("வர்றேன்", "வருகிறேன்"),
    ("படிக்க்றேன்", "படிக்கிறேன்"),
    ("எழுத்றேன்", "எழுதுகிறேன்"),
    ("கேட்ட்றேன்", "கேட்டேன்"),
    ("சொன்ன்றேன்", "சொன்னேன்"),
    ("வந்த்றேன்", "வந்தேன்"),
    ("போன்றேன்", "போனேன்"),
];

impl StaticCorrections {
    pub fn new<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            table: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// The built-in fallback spelling table.
    pub fn fallback() -> Self {
        Self::new(FALLBACK_TABLE.iter().copied())
    }

    /// Parse a JSON object of `{ "wrong": "right" }` pairs.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let table: HashMap<String, String> = serde_json::from_str(json)?;
        Ok(Self { table })
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    fn correct_text(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        let mut word = String::new();
        for c in text.chars() {
            if is_word_boundary(c) {
                self.flush_word(&mut word, &mut out);
                out.push(c);
            } else {
                word.push(c);
            }
        }
        self.flush_word(&mut word, &mut out);
        out
    }

    fn flush_word(&self, word: &mut String, out: &mut String) {
        if word.is_empty() {
            return;
        }
        match self.table.get(word.as_str()) {
            Some(fixed) => out.push_str(fixed),
            None => out.push_str(word),
        }
        word.clear();
    }
}

impl CorrectionService for StaticCorrections {
    fn correct(&self, request: &CorrectionRequest) -> Result<CorrectionResponse, ServiceFailure> {
        let corrected_text = self.correct_text(&request.text);
        let suggestions = (corrected_text != request.text).then(|| vec![corrected_text.clone()]);
        Ok(CorrectionResponse {
            original_text: request.text.clone(),
            corrected_text,
            suggestions,
            errors: None,
            confidence: None,
        })
    }
}
