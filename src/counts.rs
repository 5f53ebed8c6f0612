// imports
use crate::error::Result;
use crate::vocabulary::{SENTENCE_END, SENTENCE_START};

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{debug, info};


/// Occurrence counts of words in a corpus.
#[derive(Clone, Debug, Default)]
pub struct WordCounts {
    word2count: HashMap<String, u64>,
    num_sentences: usize,
}

impl WordCounts {

    pub fn new() -> WordCounts {
        Self::default()
    }

    fn parse_line(line: &str, use_os: bool) -> Vec<String> {

        // line is trimmed and split on whitespace. As default the sentence is wrapped
        // with start-of-sentence and end-of-sentence tokens, but can be set to false.
        let mut sequence: Vec<String> = WordCounts::tokenize(line.trim());
        if use_os {
            sequence.insert(0, SENTENCE_START.to_string());
            sequence.push(SENTENCE_END.to_string());
        }
        sequence
    }

    /// Counts the words of one sentence. Blank lines are ignored.
    pub fn accumulate(&mut self, line: &str, use_os: bool) {

        if line.trim().is_empty() {
            return
        }

        for tok in WordCounts::parse_line(line, use_os) {
            let val = self.word2count.entry(tok).or_insert(0);
            *val += 1;
        }
        self.num_sentences += 1;
    }

    pub fn load(&mut self, file_path: &Path, use_os: bool) -> Result<()> {

        // read corpus lines and count appearences of tokens
        let lines = BufReader::new(File::open(file_path)?).lines();
        for line in lines {
            self.accumulate(&line?, use_os);
        }

        info!("counted {} distinct words in {} sentences from {}", self.word2count.len(), self.num_sentences, file_path.display());
        Ok(())
    }

    pub fn from_files(file_paths: &[&Path], use_os: bool) -> Result<WordCounts> {
        let mut counts = WordCounts::new();
        for file_path in file_paths {
            counts.load(file_path, use_os)?;
        }
        Ok(counts)
    }

    pub fn get(&self, word: &str) -> u64 {
        self.word2count.get(word).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.word2count.len()
    }

    pub fn is_empty(&self) -> bool {
        self.word2count.is_empty()
    }

    pub fn num_sentences(&self) -> usize {
        self.num_sentences
    }

    pub fn as_map(&self) -> &HashMap<String, u64> {
        &self.word2count
    }

    pub fn into_map(self) -> HashMap<String, u64> {
        self.word2count
    }

    /// Splits the counts into the `n` most frequent words and the rest. Ties
    /// are broken alphabetically so the split does not depend on hash order.
    pub fn split_most_common(&self, n: usize) -> (HashMap<String, u64>, Vec<String>) {

        let mut tup = self.word2count
        .iter()
        .map(|(k, v)| (k.as_str(), *v))
        .collect::<Vec<(&str, u64)>>();
        tup.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

        let n = n.min(tup.len());
        let rest = tup[n..].iter().map(|(k, _)| k.to_string()).collect::<Vec<String>>();
        let common = tup.into_iter().take(n).map(|(k, v)| (k.to_string(), v)).collect::<HashMap<String, u64>>();

        debug!("using {} most common words out of {}, {} left out", common.len(), self.word2count.len(), rest.len());
        (common, rest)
    }

}

impl From<HashMap<String, u64>> for WordCounts {
    fn from(word2count: HashMap<String, u64>) -> Self {
        Self { word2count: word2count, num_sentences: 0 }
    }
}


// defines the behavior needed for tokenizing a corpus
trait Tokenizer {
    fn tokenize(sequence: &str) -> Vec<String>;
}

impl Tokenizer for WordCounts {
    // simple tokenizer by split on whitespace
    fn tokenize(sequence: &str) -> Vec<String> {
        sequence.split_whitespace().map(|x| x.to_string()).collect()
    }
}


#[cfg(test)]
mod tests {

    use super::WordCounts;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn accumulate_counts_with_sentence_markers() {
        let mut counts = WordCounts::new();
        counts.accumulate("the dog saw the cat", true);
        counts.accumulate("  ", true);
        counts.accumulate("a dog", true);

        assert_eq!(counts.num_sentences(), 2);
        assert_eq!(counts.get("the"), 2);
        assert_eq!(counts.get("dog"), 2);
        assert_eq!(counts.get("<s>"), 2);
        assert_eq!(counts.get("</s>"), 2);
        assert_eq!(counts.get("horse"), 0);
    }

    #[test]
    fn accumulate_without_sentence_markers() {
        let mut counts = WordCounts::new();
        counts.accumulate("a b a", false);
        assert_eq!(counts.len(), 2);
        assert_eq!(counts.get("a"), 2);
        assert_eq!(counts.get("<s>"), 0);
    }

    #[test]
    fn load_from_files() {
        let mut first = NamedTempFile::new().unwrap();
        writeln!(first, "one two").unwrap();
        writeln!(first, "two").unwrap();
        let mut second = NamedTempFile::new().unwrap();
        writeln!(second, "three two").unwrap();

        let counts = WordCounts::from_files(&[first.path(), second.path()], false).unwrap();
        assert_eq!(counts.get("two"), 3);
        assert_eq!(counts.get("one"), 1);
        assert_eq!(counts.num_sentences(), 3);
    }

    #[test]
    fn split_most_common_is_deterministic() {
        let mut counts = WordCounts::new();
        counts.accumulate("c c c b b a d", false);
        let (common, rest) = counts.split_most_common(2);
        assert_eq!(common.len(), 2);
        assert_eq!(common.get("c"), Some(&3));
        assert_eq!(common.get("b"), Some(&2));
        assert_eq!(rest, vec!["a".to_string(), "d".to_string()]);

        let (common, rest) = counts.split_most_common(10);
        assert_eq!(common.len(), 4);
        assert!(rest.is_empty());
    }

}
