// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Inbound text normalization and pass/fail token classification.

use oc_core::AttemptOutcome;

/// Decode a raw chunk as text: lossy UTF-8, trimmed, lower-cased.
///
/// The controller sends unframed ASCII; anything undecodable is replaced
/// rather than rejected.
pub fn normalize(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).trim().to_lowercase()
}

/// Classification of a consumed result text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Pass,
    Fail,
    Unknown,
}

impl From<Verdict> for AttemptOutcome {
    fn from(verdict: Verdict) -> Self {
        match verdict {
            Verdict::Pass => AttemptOutcome::Pass,
            Verdict::Fail => AttemptOutcome::Fail,
            Verdict::Unknown => AttemptOutcome::Unknown,
        }
    }
}

/// The configured pass/fail tokens, held lower-cased so a substring scan
/// over normalized text is case-insensitive end to end.
#[derive(Debug, Clone)]
pub struct Tokens {
    pass: String,
    fail: String,
}

impl Tokens {
    pub fn new(pass: &str, fail: &str) -> Self {
        Self {
            pass: pass.to_lowercase(),
            fail: fail.to_lowercase(),
        }
    }

    /// Scan normalized text for a token. The pass token wins when both
    /// appear, matching the source installations' check order.
    pub fn classify(&self, text: &str) -> Verdict {
        if text.contains(&self.pass) {
            Verdict::Pass
        } else if text.contains(&self.fail) {
            Verdict::Fail
        } else {
            Verdict::Unknown
        }
    }

    /// How many trailing characters of a chunk the reader must carry so a
    /// token split across two reads still classifies. One short of a full
    /// token: carried text alone can never re-form one.
    pub fn carry_len(&self) -> usize {
        self.pass.len().max(self.fail.len()).saturating_sub(1)
    }
}

impl Default for Tokens {
    fn default() -> Self {
        Self::new("true", "false")
    }
}

#[cfg(test)]
#[path = "classify_tests.rs"]
mod tests;
