// 🪪 Identity Extractor
//
// Page 1 of the form prints label/value pairs for the filer and, when
// declared, the spouse. The text layer gives no structure beyond order, so
// values are taken as "the token after the label".
//
// Known limit: a name that itself contains a label word ("ΟΝΟΜΑ", "ΕΠΩΝΥΜΟ",
// "ΠΑΤΡΟΣ") is read as an empty spouse block.

use crate::normalize::{normalize_markup, to_uppercase_fold};
use crate::profile::IdentityLabels;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IdentityRecord {
    pub given_name: String,
    pub surname: String,
    pub fathers_name: String,
    pub spouse_given_name: String,
    pub spouse_surname: String,
    pub spouse_fathers_name: String,
}

impl IdentityRecord {
    pub fn has_spouse(&self) -> bool {
        !self.spouse_given_name.is_empty()
            || !self.spouse_surname.is_empty()
            || !self.spouse_fathers_name.is_empty()
    }
}

/// Text-layer fragments → comparable tokens (colon dropped, folded, no blanks)
pub fn tokenize<S: AsRef<str>>(fragments: &[S]) -> Vec<String> {
    fragments
        .iter()
        .map(|f| to_uppercase_fold(&normalize_markup(&f.as_ref().replacen(':', "", 1))))
        .filter(|t| !t.is_empty())
        .collect()
}

struct Block {
    given_name: String,
    surname: String,
    fathers_name: String,
    /// Index of the father's-name label, where the next block search starts
    fathers_label: Option<usize>,
}

fn value_after(tokens: &[String], label: Option<usize>) -> String {
    label
        .and_then(|idx| tokens.get(idx + 1))
        .cloned()
        .unwrap_or_default()
}

fn read_block(tokens: &[String], labels: &IdentityLabels) -> Block {
    let given = tokens.iter().position(|t| t == labels.given_name);
    let surname = tokens.iter().position(|t| t == labels.surname);
    let fathers = tokens.iter().position(|t| t.contains(labels.fathers_name));

    Block {
        given_name: value_after(tokens, given),
        surname: value_after(tokens, surname),
        fathers_name: value_after(tokens, fathers),
        fathers_label: fathers,
    }
}

/// Recover filer and spouse names from page-1 tokens (see [`tokenize`])
pub fn extract_identity(tokens: &[String], labels: &IdentityLabels) -> IdentityRecord {
    let filer = read_block(tokens, labels);

    let mut record = IdentityRecord {
        given_name: filer.given_name,
        surname: filer.surname,
        fathers_name: filer.fathers_name,
        ..IdentityRecord::default()
    };

    // Spouse block starts past the filer's father's-name value
    let Some(fathers_label) = filer.fathers_label else {
        return record;
    };
    let tail = tokens.get(fathers_label + 2..).unwrap_or(&[]);

    let spouse_given = tail
        .iter()
        .position(|t| t == labels.given_name)
        .and_then(|idx| tail.get(idx + 1));

    match spouse_given {
        // An unfilled block prints the next label where the value would be
        Some(value) if !labels.is_label(value) => {
            let spouse = read_block(tail, labels);
            record.spouse_given_name = spouse.given_name;
            record.spouse_surname = spouse.surname;
            record.spouse_fathers_name = spouse.fathers_name;
        }
        _ => {}
    }

    record
}
