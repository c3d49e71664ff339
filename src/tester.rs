//! Live pattern testing.
//!
//! A user-controlled pattern is compiled with the `regex` engine and run once
//! against a user-controlled subject. Every failure mode is folded into a
//! `MatchOutcome`; nothing here can panic or hang on hostile input, since the
//! engine matches in linear time and compilation is bounded by a size limit.
//!
//! The `\d`, `\w` shorthands (and their negations) are ASCII-only, as in
//! browser regexes: `\d` does not match Arabic-Indic or fullwidth digits.

use std::borrow::Cow;

use regex::RegexBuilder;
use tracing::{debug, instrument};

use crate::domain::MatchOutcome;
use crate::util::trunc_for_log;

/// Upper bound on the compiled program size (bytes) for user patterns.
const COMPILED_SIZE_LIMIT: usize = 1 << 20;
/// Upper bound on the lazy DFA cache per compiled pattern.
const DFA_SIZE_LIMIT: usize = 1 << 21;

/// Test `pattern` against `subject` with first-match semantics.
#[instrument(level = "debug", skip_all, fields(pattern_len = pattern.len(), subject_len = subject.len()))]
pub fn test(pattern: &str, subject: &str) -> MatchOutcome {
  if subject.is_empty() {
    return MatchOutcome::NoInput;
  }

  let re = match RegexBuilder::new(&ascii_shorthands(pattern))
    .size_limit(COMPILED_SIZE_LIMIT)
    .dfa_size_limit(DFA_SIZE_LIMIT)
    .build()
  {
    Ok(re) => re,
    Err(e) => {
      debug!(target: "calendar", pattern = %trunc_for_log(pattern, 80), error = %e, "Pattern failed to compile");
      return MatchOutcome::PatternError { message: e.to_string() };
    }
  };

  match re.captures(subject) {
    Some(caps) => {
      let full_match = caps.get(0).map(|m| m.as_str().to_string()).unwrap_or_default();
      let groups = caps
        .iter()
        .skip(1)
        .map(|g| g.map(|m| m.as_str().to_string()))
        .collect();
      MatchOutcome::Matched { full_match, groups }
    }
    None => MatchOutcome::NotMatched,
  }
}

/// Rewrite `\d \D \w \W` to explicit ASCII classes. Nested classes are
/// legal, so this also works inside `[...]`.
fn ascii_shorthands(pattern: &str) -> Cow<'_, str> {
  if !pattern.contains('\\') {
    return Cow::Borrowed(pattern);
  }
  let mut out = String::with_capacity(pattern.len() + 16);
  let mut chars = pattern.chars();
  while let Some(c) = chars.next() {
    if c != '\\' {
      out.push(c);
      continue;
    }
    match chars.next() {
      Some('d') => out.push_str("[0-9]"),
      Some('D') => out.push_str("[^0-9]"),
      Some('w') => out.push_str("[0-9A-Za-z_]"),
      Some('W') => out.push_str("[^0-9A-Za-z_]"),
      Some(other) => {
        out.push('\\');
        out.push(other);
      }
      None => out.push('\\'),
    }
  }
  Cow::Owned(out)
}

/// User-facing rendering of an outcome.
pub fn describe(outcome: &MatchOutcome) -> String {
  match outcome {
    MatchOutcome::NoInput => "Please enter some text to test.".into(),
    MatchOutcome::NotMatched => "✗ No match found.".into(),
    MatchOutcome::PatternError { message } => format!("Error: {}", message),
    MatchOutcome::Matched { full_match, groups } => {
      let mut out = format!("✓ Match found! Full match: \"{}\"", full_match);
      if !groups.is_empty() {
        let parts: Vec<String> = groups
          .iter()
          .enumerate()
          .map(|(i, g)| match g {
            Some(text) => format!("Group {}: \"{}\"", i + 1, text),
            None => format!("Group {}: (unset)", i + 1),
          })
          .collect();
        out.push_str(&format!(". Captured groups: {}", parts.join(", ")));
      }
      out
    }
  }
}
