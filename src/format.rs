use crate::error::{Result, VocabularyError};

use std::collections::HashMap;
use std::fmt::Display;
use std::hash::Hash;
use std::str::FromStr;


/// Textual vocabulary file formats, one entry per non-blank line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VocabularyFormat {
    /// `<word>`, each word in its own class
    Words,
    /// `<word> <int-class-id>`
    Classes,
    /// `<class-name> <membership-prob> <word>`
    SrilmClasses,
}

impl VocabularyFormat {
    fn num_fields(&self) -> usize {
        match self {
            VocabularyFormat::Words => 1,
            VocabularyFormat::Classes => 2,
            VocabularyFormat::SrilmClasses => 3
        }
    }
}

impl FromStr for VocabularyFormat {
    type Err = VocabularyError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "words" => Ok(VocabularyFormat::Words),
            "classes" => Ok(VocabularyFormat::Classes),
            "srilm-classes" => Ok(VocabularyFormat::SrilmClasses),
            other => Err(VocabularyError::UnknownFormat(other.to_string()))
        }
    }
}

impl Display for VocabularyFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VocabularyFormat::Words => write!(f, "words"),
            VocabularyFormat::Classes => write!(f, "classes"),
            VocabularyFormat::SrilmClasses => write!(f, "srilm-classes")
        }
    }
}


/// The class a parsed line asks for: either a fresh class of its own or the
/// class named by an id in the file.
#[derive(Clone, Debug, PartialEq)]
pub enum FileClassId {
    Own,
    Numeric(i64),
    Named(String),
}

/// One parsed entry of a vocabulary file.
#[derive(Clone, Debug, PartialEq)]
pub struct Entry {
    pub word: String,
    pub class: FileClassId,
    pub prob: f64,
}

/// Parses one line. Returns `None` for blank lines.
pub fn parse_line(line: &str, format: VocabularyFormat) -> Result<Option<Entry>> {

    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.is_empty() {
        return Ok(None)
    }
    if fields.len() != format.num_fields() {
        return Err(VocabularyError::InputFormat { num_fields: fields.len(), line: line.trim().to_string() });
    }

    let entry = match format {
        VocabularyFormat::Words => Entry {
            word: fields[0].to_string(),
            class: FileClassId::Own,
            prob: 1.0
        },
        VocabularyFormat::Classes => {
            let file_id = fields[1].parse::<i64>().map_err(|_| {
                VocabularyError::InvalidField { field: "class id", line: line.trim().to_string() }
            })?;
            Entry {
                word: fields[0].to_string(),
                class: FileClassId::Numeric(file_id),
                prob: 1.0
            }
        },
        VocabularyFormat::SrilmClasses => {
            let prob = fields[1].parse::<f64>().map_err(|_| {
                VocabularyError::InvalidField { field: "membership probability", line: line.trim().to_string() }
            })?;
            Entry {
                word: fields[2].to_string(),
                class: FileClassId::Named(fields[0].to_string()),
                prob: prob
            }
        }
    };

    Ok(Some(entry))
}


/// Maps class ids found in a file to consecutive internal class ids, in
/// order of first appearance.
#[derive(Clone, Debug)]
pub struct ClassIdRemap<K: Hash + Eq> {
    file_id_to_class_id: HashMap<K, usize>,
}

impl<K: Hash + Eq> ClassIdRemap<K> {

    pub fn new() -> Self {
        Self { file_id_to_class_id: HashMap::new() }
    }

    pub fn get(&self, file_id: &K) -> Option<usize> {
        self.file_id_to_class_id.get(file_id).copied()
    }

    /// Records `class_id` for `file_id` unless the file id is already known.
    /// Returns the internal id the file id maps to.
    pub fn assign(&mut self, file_id: K, class_id: usize) -> usize {
        *self.file_id_to_class_id.entry(file_id).or_insert(class_id)
    }

    pub fn len(&self) -> usize {
        self.file_id_to_class_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.file_id_to_class_id.is_empty()
    }

}

impl<K: Hash + Eq> Default for ClassIdRemap<K> {
    fn default() -> Self {
        Self::new()
    }
}


#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn parse_each_format() {
        let entry = parse_line("dog", VocabularyFormat::Words).unwrap().unwrap();
        assert_eq!(entry, Entry { word: "dog".to_string(), class: FileClassId::Own, prob: 1.0 });

        let entry = parse_line("  the\t12 ", VocabularyFormat::Classes).unwrap().unwrap();
        assert_eq!(entry, Entry { word: "the".to_string(), class: FileClassId::Numeric(12), prob: 1.0 });

        let entry = parse_line("CLASS-01 0.25 cat", VocabularyFormat::SrilmClasses).unwrap().unwrap();
        assert_eq!(entry, Entry { word: "cat".to_string(), class: FileClassId::Named("CLASS-01".to_string()), prob: 0.25 });
    }

    #[test]
    fn blank_lines_are_skipped() {
        assert!(parse_line("", VocabularyFormat::Classes).unwrap().is_none());
        assert!(parse_line("   \t ", VocabularyFormat::Words).unwrap().is_none());
    }

    #[test]
    fn wrong_field_count_fails() {
        let result = parse_line("the 0 extra", VocabularyFormat::Classes);
        match result {
            Err(VocabularyError::InputFormat { num_fields, line }) => {
                assert_eq!(num_fields, 3);
                assert_eq!(line, "the 0 extra");
            },
            other => panic!("unexpected result {:?}", other)
        }
        assert!(parse_line("a b", VocabularyFormat::Words).is_err());
        assert!(parse_line("a 0.5", VocabularyFormat::SrilmClasses).is_err());
    }

    #[test]
    fn unparsable_fields_fail() {
        assert!(matches!(parse_line("the x", VocabularyFormat::Classes), Err(VocabularyError::InvalidField { .. })));
        assert!(matches!(parse_line("C x the", VocabularyFormat::SrilmClasses), Err(VocabularyError::InvalidField { .. })));
    }

    #[test]
    fn format_names() {
        assert_eq!("srilm-classes".parse::<VocabularyFormat>().unwrap(), VocabularyFormat::SrilmClasses);
        assert_eq!(VocabularyFormat::Classes.to_string(), "classes");
        assert!(matches!("arpa".parse::<VocabularyFormat>(), Err(VocabularyError::UnknownFormat(_))));
    }

    #[test]
    fn remap_in_order_of_first_appearance() {
        let mut remap: ClassIdRemap<i64> = ClassIdRemap::new();
        assert_eq!(remap.assign(40, 0), 0);
        assert_eq!(remap.assign(7, 1), 1);
        assert_eq!(remap.assign(40, 2), 0);
        assert_eq!(remap.get(&7), Some(1));
        assert_eq!(remap.get(&8), None);
        assert_eq!(remap.len(), 2);

        let mut named: ClassIdRemap<String> = ClassIdRemap::default();
        assert_eq!(named.assign("CLASS-A".to_string(), 0), 0);
        assert_eq!(named.get(&"CLASS-A".to_string()), Some(0));
    }

}
