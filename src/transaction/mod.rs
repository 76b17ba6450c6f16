// src/transaction/mod.rs

//! Transaction ordering
//!
//! Reduced headers are submitted to a [`TransactionOrderer`] one by one,
//! ordered once, and read back as a [`TransactionPlan`]: the sequence of
//! package keys in install order.

mod ordering;

pub use ordering::OrderingTransactionSet;

use crate::error::Result;
use crate::header::ReducedHeader;
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::Path;

/// How a header enters the transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InstallMode {
    #[default]
    Install,
}

impl InstallMode {
    /// rpm's single-letter mode code
    pub fn code(&self) -> char {
        match self {
            Self::Install => 'i',
        }
    }
}

/// Accumulates install actions and computes their order
pub trait TransactionOrderer {
    /// Queue one pending install action under `key`
    fn add_install(&mut self, header: ReducedHeader, key: &str, mode: InstallMode) -> Result<()>;

    /// Order all queued actions by their dependency edges
    fn order(&mut self) -> Result<()>;

    /// Keys in their current order (install order once ordered)
    fn keys(&self) -> Vec<String>;
}

/// Package keys in install order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionPlan {
    keys: Vec<String>,
}

impl TransactionPlan {
    pub fn new(keys: Vec<String>) -> Self {
        Self { keys }
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Position of a key in the plan
    pub fn position(&self, key: &str) -> Option<usize> {
        self.keys.iter().position(|k| k == key)
    }

    /// Whether `first` is installed before `second`
    pub fn precedes(&self, first: &str, second: &str) -> bool {
        match (self.position(first), self.position(second)) {
            (Some(a), Some(b)) => a < b,
            _ => false,
        }
    }

    /// One key per line, newline terminated
    pub fn to_lines(&self) -> String {
        let mut out = String::new();
        for key in &self.keys {
            out.push_str(key);
            out.push('\n');
        }
        out
    }

    /// Parse a plan from its line form, skipping blank lines
    pub fn from_lines(text: &str) -> Self {
        Self {
            keys: text
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }

    pub fn write_to(&self, path: &Path) -> Result<()> {
        let mut file = fs::File::create(path)?;
        file.write_all(self.to_lines().as_bytes())?;
        Ok(())
    }

    pub fn read_from(path: &Path) -> Result<Self> {
        Ok(Self::from_lines(&fs::read_to_string(path)?))
    }
}

impl fmt::Display for TransactionPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_lines())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_lines() {
        let plan = TransactionPlan::new(vec!["a".into(), "b".into()]);
        assert_eq!(plan.to_lines(), "a\nb\n");
        assert_eq!(TransactionPlan::from_lines("a\n\nb\n"), plan);
        assert!(plan.precedes("a", "b"));
        assert!(!plan.precedes("b", "a"));
        assert!(!plan.precedes("a", "zzz"));
    }

    #[test]
    fn test_plan_file_round_trip() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("rts_input.txt");
        let plan = TransactionPlan::new(vec!["glibc".into(), "bash".into()]);

        plan.write_to(&path).unwrap();
        assert_eq!(TransactionPlan::read_from(&path).unwrap(), plan);
    }
}
