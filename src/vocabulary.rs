// imports
use crate::error::{Result, VocabularyError};
use crate::format::{self, ClassIdRemap, FileClassId, VocabularyFormat};
use crate::state::{Dataset, Group, NetworkState};
use crate::wordclass::WordClass;

use std::collections::HashMap;
use std::fmt::Display;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use ndarray::{Array, Array1, ArrayBase, Data, Dimension};
use rand::Rng;
use tracing::{debug, info};


pub const SENTENCE_START: &str = "<s>";
pub const SENTENCE_END: &str = "</s>";
pub const UNKNOWN_WORD: &str = "<unk>";

// words starting with this character are special tokens
const SPECIAL_PREFIX: char = '<';


/// Word or class vocabulary.
///
/// Maps words to word ids and shortlist word ids to classes. Every shortlist
/// word belongs to exactly one class; without class compression each class
/// holds a single word. Words after the shortlist are out-of-shortlist words:
/// they have an id but no class, and the network never predicts them.
#[derive(Clone, Debug)]
pub struct Vocabulary {
    id_to_word: Vec<String>,
    word_to_id: HashMap<String, usize>,
    word_id_to_class_id: Vec<usize>,
    word_classes: Vec<WordClass>,
    num_normal_classes: usize,
    unigram_probs: Option<Array1<f64>>,
    sos_id: usize,
    eos_id: usize,
    unk_id: usize,
}

impl Vocabulary {

    /// Constructs a vocabulary from a word-to-class mapping.
    ///
    /// `id_to_word` and `word_id_to_class_id` have to be equal-sized; they
    /// define the shortlist. `<s>`, `</s>` and `<unk>` are added in their own
    /// classes if the shortlist lacks them. Words in `oos_words` that are not
    /// yet in the vocabulary are appended as out-of-shortlist words. Class
    /// membership probabilities are normalized.
    pub fn new(id_to_word: Vec<String>,
        word_id_to_class_id: Vec<usize>,
        word_classes: Vec<WordClass>,
        oos_words: Option<&[String]>) -> Result<Vocabulary> {

        Vocabulary::build(id_to_word, word_id_to_class_id, word_classes, oos_words, true)
    }

    fn build(mut id_to_word: Vec<String>,
        mut word_id_to_class_id: Vec<usize>,
        mut word_classes: Vec<WordClass>,
        oos_words: Option<&[String]>,
        normalize: bool) -> Result<Vocabulary> {

        if id_to_word.len() != word_id_to_class_id.len() {
            return Err(VocabularyError::SizeMismatch { words: id_to_word.len(), classes: word_id_to_class_id.len() });
        }
        Vocabulary::check_classes(&word_id_to_class_id, &word_classes)?;

        let mut word_to_id: HashMap<String, usize> = HashMap::with_capacity(id_to_word.len());
        for (word_id, word) in id_to_word.iter().enumerate() {
            if word_to_id.insert(word.to_owned(), word_id).is_some() {
                return Err(VocabularyError::DuplicateWord(word.to_owned()));
            }
        }

        // special tokens go to the end of the shortlist, each in a class of its own
        for token in [SENTENCE_START, SENTENCE_END, UNKNOWN_WORD] {
            if word_to_id.contains_key(token) {
                continue
            }
            let word_id = id_to_word.len();
            let class_id = word_classes.len();
            id_to_word.push(token.to_string());
            word_to_id.insert(token.to_string(), word_id);
            word_id_to_class_id.push(class_id);
            word_classes.push(WordClass::new(class_id, word_id, 1.0));
            debug!("added special token {} as word {} in class {}", token, word_id, class_id);
        }

        if let Some(oos_words) = oos_words {
            for word in oos_words {
                if !word_to_id.contains_key(word) {
                    word_to_id.insert(word.to_owned(), id_to_word.len());
                    id_to_word.push(word.to_owned());
                }
            }
        }

        let num_normal_classes = Vocabulary::count_normal_classes(&id_to_word, &word_classes);

        if normalize {
            word_classes.iter_mut().for_each(|word_class| word_class.normalize_probs());
        }

        // the special tokens were guaranteed above
        let sos_id = word_to_id[SENTENCE_START];
        let eos_id = word_to_id[SENTENCE_END];
        let unk_id = word_to_id[UNKNOWN_WORD];

        let vocabulary = Self {
            id_to_word: id_to_word,
            word_to_id: word_to_id,
            word_id_to_class_id: word_id_to_class_id,
            word_classes: word_classes,
            num_normal_classes: num_normal_classes,
            unigram_probs: None,
            sos_id: sos_id,
            eos_id: eos_id,
            unk_id: unk_id
        };
        info!("{}", vocabulary);
        Ok(vocabulary)
    }

    fn check_classes(word_id_to_class_id: &[usize], word_classes: &[WordClass]) -> Result<()> {

        for (class_id, word_class) in word_classes.iter().enumerate() {
            if word_class.id() != class_id {
                return Err(VocabularyError::InconsistentClasses(
                    format!("class at index {} has id {}", class_id, word_class.id())));
            }
            if word_class.is_empty() {
                return Err(VocabularyError::InconsistentClasses(format!("class {} has no words", class_id)));
            }
        }

        for (word_id, &class_id) in word_id_to_class_id.iter().enumerate() {
            let word_class = word_classes.get(class_id).ok_or(VocabularyError::UnknownClass(class_id))?;
            if !word_class.contains(word_id) {
                return Err(VocabularyError::UnknownMember { class_id: class_id, word_id: word_id });
            }
        }

        // every member was matched to its own shortlist word, so equal totals rule out strays
        let num_members: usize = word_classes.iter().map(WordClass::len).sum();
        if num_members != word_id_to_class_id.len() {
            return Err(VocabularyError::InconsistentClasses(
                format!("{} class members for {} shortlist words", num_members, word_id_to_class_id.len())));
        }
        Ok(())
    }

    // Classes at the end that hold a single special token are not normal classes.
    fn count_normal_classes(id_to_word: &[String], word_classes: &[WordClass]) -> usize {

        let mut num_normal_classes = word_classes.len();
        while num_normal_classes > 0 {
            let word_class = &word_classes[num_normal_classes - 1];
            let is_special = word_class.len() == 1 && word_class.iter().all(|(word_id, _)| {
                id_to_word[word_id].starts_with(SPECIAL_PREFIX)
            });
            if !is_special {
                break
            }
            num_normal_classes -= 1;
        }
        num_normal_classes
    }

    /// Reads the shortlist words, and possibly word classes, from a
    /// vocabulary file. Words in `oos_words` that are missing from the file
    /// are added as out-of-shortlist words.
    pub fn from_file<R: BufRead>(input_file: R,
        input_format: VocabularyFormat,
        oos_words: Option<&[String]>) -> Result<Vocabulary> {

        let mut id_to_word: Vec<String> = Vec::new();
        let mut word_to_id: HashMap<String, usize> = HashMap::new();
        let mut word_id_to_class_id: Vec<usize> = Vec::new();
        let mut word_classes: Vec<WordClass> = Vec::new();

        // class ids in the file are translated to consecutive numbers
        let mut numeric_ids: ClassIdRemap<i64> = ClassIdRemap::new();
        let mut named_ids: ClassIdRemap<String> = ClassIdRemap::new();

        for line in input_file.lines() {

            let entry = match format::parse_line(&line?, input_format)? {
                Some(entry) => entry,
                None => continue
            };

            if word_to_id.contains_key(&entry.word) {
                return Err(VocabularyError::DuplicateWord(entry.word));
            }
            let word_id = id_to_word.len();
            word_to_id.insert(entry.word.to_owned(), word_id);
            id_to_word.push(entry.word);

            let next_class_id = word_classes.len();
            let class_id = match entry.class {
                FileClassId::Own => next_class_id,
                FileClassId::Numeric(file_id) => numeric_ids.assign(file_id, next_class_id),
                FileClassId::Named(file_id) => named_ids.assign(file_id, next_class_id)
            };
            if class_id == next_class_id {
                word_classes.push(WordClass::new(class_id, word_id, entry.prob));
            } else {
                word_classes[class_id].add(word_id, entry.prob)?;
            }
            word_id_to_class_id.push(class_id);
        }

        debug!("read {} words in {} classes from a {} vocabulary file", id_to_word.len(), word_classes.len(), input_format);
        Vocabulary::new(id_to_word, word_id_to_class_id, word_classes, oos_words)
    }

    pub fn from_path(path: &Path, input_format: VocabularyFormat, oos_words: Option<&[String]>) -> Result<Vocabulary> {
        let f = BufReader::new(File::open(path)?);
        Vocabulary::from_file(f, input_format, oos_words)
    }

    /// Creates a vocabulary and classes from word counts. All the words will be
    /// in the shortlist.
    ///
    /// `num_classes` is the number of classes to create in addition to the
    /// special classes, or `None` for one class per word.
    pub fn from_word_counts(word_counts: &HashMap<String, u64>, num_classes: Option<usize>) -> Result<Vocabulary> {
        Vocabulary::from_word_counts_with_oos(word_counts, num_classes, None)
    }

    pub fn from_word_counts_with_oos(word_counts: &HashMap<String, u64>,
        num_classes: Option<usize>,
        oos_words: Option<&[String]>) -> Result<Vocabulary> {

        // the special tokens are created by the constructor, leave them out of the classes
        let mut tup = word_counts
        .iter()
        .filter(|(word, _)| ![SENTENCE_START, SENTENCE_END, UNKNOWN_WORD].contains(&word.as_str()))
        .map(|(word, count)| (word.as_str(), *count))
        .collect::<Vec<(&str, u64)>>();

        // ascending counts, so that the rare words are spread over all the classes
        tup.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(b.0)));

        let num_classes = num_classes.unwrap_or(tup.len());
        if num_classes == 0 && !tup.is_empty() {
            return Err(VocabularyError::InconsistentClasses("number of classes has to be positive".to_string()));
        }

        let mut id_to_word: Vec<String> = Vec::with_capacity(tup.len());
        let mut word_id_to_class_id: Vec<usize> = Vec::with_capacity(tup.len());
        let mut word_classes: Vec<WordClass> = Vec::new();

        let mut class_id = 0;
        for (word, _) in tup {
            let word_id = id_to_word.len();
            id_to_word.push(word.to_string());

            if class_id < word_classes.len() {
                word_classes[class_id].add(word_id, 1.0)?;
            } else {
                word_classes.push(WordClass::new(class_id, word_id, 1.0));
            }

            word_id_to_class_id.push(class_id);
            class_id = (class_id + 1) % num_classes;
        }

        Vocabulary::new(id_to_word, word_id_to_class_id, word_classes, oos_words)
    }

    /// Reads the vocabulary from a network state. The stored membership
    /// probabilities are used as they are.
    pub fn from_state(state: &NetworkState) -> Result<Vocabulary> {

        let record = VocabularyRecord::read(state)?;
        let num_shortlist_words = record.classes.len();
        if record.probs.len() != num_shortlist_words || record.words.len() < num_shortlist_words {
            return Err(VocabularyError::IncompatibleState(format!(
                "vocabulary has {} words, {} class ids and {} probabilities",
                record.words.len(), num_shortlist_words, record.probs.len())));
        }

        let mut word_id_to_class_id: Vec<usize> = Vec::with_capacity(num_shortlist_words);
        for class_id in &record.classes {
            let class_id = usize::try_from(*class_id).map_err(|_| {
                VocabularyError::IncompatibleState(format!("negative class id {} in vocabulary", class_id))
            })?;
            word_id_to_class_id.push(class_id);
        }

        let num_classes = word_id_to_class_id.iter().max().map_or(0, |max| max + 1);
        let mut word_classes: Vec<Option<WordClass>> = vec![None; num_classes];
        for (word_id, (&class_id, &prob)) in word_id_to_class_id.iter().zip(&record.probs).enumerate() {
            let slot = &mut word_classes[class_id];
            match slot {
                Some(word_class) => word_class.add(word_id, prob)?,
                None => *slot = Some(WordClass::new(class_id, word_id, prob))
            }
        }
        let word_classes = word_classes
        .into_iter()
        .enumerate()
        .map(|(class_id, word_class)| word_class.ok_or_else(|| {
            VocabularyError::IncompatibleState(format!("class {} of the vocabulary has no words", class_id))
        }))
        .collect::<Result<Vec<WordClass>>>()?;

        let mut words = record.words;
        let oos_words = words.split_off(num_shortlist_words);
        let mut vocabulary = Vocabulary::build(words, word_id_to_class_id, word_classes, Some(&oos_words), false)?;

        if let Some(unigram_probs) = record.unigram_probs {
            if unigram_probs.len() != vocabulary.num_words() {
                return Err(VocabularyError::IncompatibleState(format!(
                    "{} unigram probabilities for {} words", unigram_probs.len(), vocabulary.num_words())));
            }
            vocabulary.unigram_probs = Some(Array1::from(unigram_probs));
        }

        Ok(vocabulary)
    }

    /// Saves the vocabulary in a network state. An existing vocabulary is
    /// overwritten, so it has to have the same number of words.
    pub fn get_state(&self, state: &mut NetworkState) -> Result<()> {

        let mut probs: Vec<f64> = Vec::with_capacity(self.num_shortlist_words());
        for word_id in 0..self.num_shortlist_words() {
            probs.push(self.get_word_prob(word_id)?);
        }

        let record = VocabularyRecord {
            words: self.id_to_word.clone(),
            classes: self.word_id_to_class_id.iter().map(|class_id| *class_id as i64).collect(),
            probs: probs,
            unigram_probs: self.unigram_probs.as_ref().map(|probs| probs.to_vec())
        };
        record.write(state)
    }

    /// Computes word unigram probabilities and, if `update_class_probs` is
    /// set, recomputes the class membership probabilities from word counts.
    ///
    /// The special tokens always get a nonzero membership probability. A class
    /// whose words never occur gets a uniform distribution.
    pub fn compute_probs(&mut self, word_counts: &HashMap<String, u64>, update_class_probs: bool) -> Result<()> {

        let num_words = self.num_words();
        let mut counts: Array1<u64> = Array1::zeros(num_words);
        for (word, count) in word_counts {
            if let Some(&word_id) = self.word_to_id.get(word) {
                counts[word_id] = *count;
            }
        }

        let total = counts.sum();
        let unigram_probs = if total > 0 {
            counts.mapv(|count| count as f64 / total as f64)
        } else {
            Array1::from_elem(num_words, 1.0 / num_words as f64)
        };
        self.unigram_probs = Some(unigram_probs);

        if !update_class_probs {
            return Ok(())
        }

        for word_id in [self.sos_id, self.eos_id, self.unk_id] {
            counts[word_id] = counts[word_id].max(1);
        }

        for word_class in self.word_classes.iter_mut() {
            let cls_total: u64 = word_class.iter().map(|(word_id, _)| counts[word_id]).sum();
            let member_ids: Vec<usize> = word_class.iter().map(|(word_id, _)| word_id).collect();
            for word_id in member_ids {
                let prob = if cls_total > 0 {
                    counts[word_id] as f64 / cls_total as f64
                } else {
                    1.0 / word_class.len() as f64
                };
                word_class.set_prob(word_id, prob)?;
            }
        }

        debug!("computed probabilities from {} corpus words", total);
        Ok(())
    }

    /// Number of words, including out-of-shortlist words.
    pub fn num_words(&self) -> usize {
        self.id_to_word.len()
    }

    pub fn num_shortlist_words(&self) -> usize {
        self.word_id_to_class_id.len()
    }

    pub fn num_classes(&self) -> usize {
        self.word_classes.len()
    }

    pub fn num_normal_classes(&self) -> usize {
        self.num_normal_classes
    }

    pub fn sos_id(&self) -> usize {
        self.sos_id
    }

    pub fn eos_id(&self) -> usize {
        self.eos_id
    }

    pub fn unk_id(&self) -> usize {
        self.unk_id
    }

    pub fn word_to_id(&self, word: &str) -> Option<usize> {
        self.word_to_id.get(word).copied()
    }

    pub fn id_to_word(&self, word_id: usize) -> Option<&str> {
        self.id_to_word.get(word_id).map(String::as_str)
    }

    pub fn word_id_to_class_id(&self, word_id: usize) -> Option<usize> {
        self.word_id_to_class_id.get(word_id).copied()
    }

    pub fn word_class(&self, class_id: usize) -> Option<&WordClass> {
        self.word_classes.get(class_id)
    }

    /// Iterates over the words in word id order.
    pub fn words(&self) -> impl Iterator<Item = &str> {
        self.id_to_word.iter().map(String::as_str)
    }

    pub fn contains(&self, word: &str) -> bool {
        self.word_to_id.contains_key(word)
    }

    /// Translates words into word ids. Unknown words map to `<unk>`.
    pub fn words_to_ids<S: AsRef<str>>(&self, words: &[S]) -> Array1<usize> {
        words
        .iter()
        .map(|word| self.word_to_id(word.as_ref()).unwrap_or(self.unk_id))
        .collect()
    }

    /// Samples a word from the membership distribution of each class.
    pub fn class_ids_to_word_ids<R: Rng + ?Sized>(&self, class_ids: &[usize], rng: &mut R) -> Result<Vec<usize>> {
        class_ids
        .iter()
        .map(|&class_id| match self.word_classes.get(class_id) {
            Some(word_class) => Ok(word_class.sample(rng)),
            None => Err(VocabularyError::UnknownClass(class_id))
        })
        .collect()
    }

    /// Class membership probability of a shortlist word.
    pub fn get_word_prob(&self, word_id: usize) -> Result<f64> {
        let (_, prob) = self.membership(word_id)?;
        Ok(prob)
    }

    fn membership(&self, word_id: usize) -> Result<(usize, f64)> {
        let class_id = self.word_id_to_class_id(word_id).ok_or(VocabularyError::NotInShortlist(word_id))?;
        let prob = self.word_classes[class_id].get_prob(word_id)?;
        Ok((class_id, prob))
    }

    /// Finds the class ids and class membership probabilities of an array of
    /// word ids. Words that are not in the shortlist are treated as `<unk>`.
    pub fn get_class_memberships<S, D>(&self, word_ids: &ArrayBase<S, D>) -> Result<(Array<usize, D>, Array<f64, D>)>
    where
        S: Data<Elem = usize>,
        D: Dimension {

            let mut class_ids: Array<usize, D> = Array::zeros(word_ids.raw_dim());
            let mut probs: Array<f64, D> = Array::zeros(word_ids.raw_dim());

            for ((class_id, prob), &word_id) in class_ids.iter_mut().zip(probs.iter_mut()).zip(word_ids.iter()) {
                let word_id = if self.in_shortlist(word_id) { word_id } else { self.unk_id };
                let (found_class_id, found_prob) = self.membership(word_id)?;
                *class_id = found_class_id;
                *prob = found_prob;
            }

            Ok((class_ids, probs))
    }

    pub fn in_shortlist(&self, word_id: usize) -> bool {
        word_id < self.num_shortlist_words()
    }

    /// Whether unigram probabilities exist and `get_oos_logprobs()` can be called.
    pub fn has_unigram_probs(&self) -> bool {
        self.unigram_probs.is_some()
    }

    pub fn unigram_probs(&self) -> Option<&Array1<f64>> {
        self.unigram_probs.as_ref()
    }

    /// Returns the log probability to add to the network output of each word.
    ///
    /// It is zero for shortlist words. Out-of-shortlist words share the
    /// probability mass of `<unk>` according to their unigram probabilities,
    /// so their exponentials sum to one.
    pub fn get_oos_logprobs(&self) -> Result<Array1<f64>> {

        let unigram_probs = self.unigram_probs.as_ref().ok_or(VocabularyError::NoUnigramProbs)?;
        let shortlist_size = self.num_shortlist_words();

        let mut oos_probs = unigram_probs.clone();
        let total_oos_prob: f64 = oos_probs.iter().skip(shortlist_size).sum();
        for (word_id, prob) in oos_probs.iter_mut().enumerate() {
            if word_id < shortlist_size {
                *prob = 1.0;
            } else if total_oos_prob > 0.0 {
                *prob /= total_oos_prob;
            }
        }
        Ok(oos_probs.mapv(f64::ln))
    }

}

impl Display for Vocabulary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "vocabulary of {} words, {} in the shortlist, {} classes ({} normal)",
        self.num_words(), self.num_shortlist_words(), self.num_classes(), self.num_normal_classes)
    }
}


// The `vocabulary` group of a network state. Required keys are checked
// eagerly, so a missing field is reported by name before anything is built.
struct VocabularyRecord {
    words: Vec<String>,
    classes: Vec<i64>,
    probs: Vec<f64>,
    unigram_probs: Option<Vec<f64>>,
}

impl VocabularyRecord {

    const GROUP: &'static str = "vocabulary";
    const WORDS: &'static str = "words";
    const CLASSES: &'static str = "classes";
    const PROBS: &'static str = "probs";
    const UNIGRAM_PROBS: &'static str = "unigram_probs";

    fn read(state: &NetworkState) -> Result<VocabularyRecord> {

        let group = state.group(Self::GROUP).ok_or_else(|| {
            VocabularyError::IncompatibleState("vocabulary is missing from neural network state".to_string())
        })?;

        let words = match Self::required(group, Self::WORDS)? {
            Dataset::Strings(words) => words.clone(),
            other => return Err(Self::wrong_kind(Self::WORDS, other))
        };
        let classes = match Self::required(group, Self::CLASSES)? {
            Dataset::Ints(classes) => classes.clone(),
            other => return Err(Self::wrong_kind(Self::CLASSES, other))
        };
        let probs = match Self::required(group, Self::PROBS)? {
            Dataset::Floats(probs) => probs.clone(),
            other => return Err(Self::wrong_kind(Self::PROBS, other))
        };
        let unigram_probs = match group.get(Self::UNIGRAM_PROBS) {
            Some(Dataset::Floats(unigram_probs)) => Some(unigram_probs.clone()),
            Some(other) => return Err(Self::wrong_kind(Self::UNIGRAM_PROBS, other)),
            None => None
        };

        debug!("read vocabulary of {} words from network state", words.len());
        Ok(Self { words: words, classes: classes, probs: probs, unigram_probs: unigram_probs })
    }

    fn required<'a>(group: &'a Group, key: &str) -> Result<&'a Dataset> {
        group.get(key).ok_or_else(|| {
            VocabularyError::IncompatibleState(format!("vocabulary parameter `{}' is missing from neural network state", key))
        })
    }

    fn wrong_kind(key: &str, found: &Dataset) -> VocabularyError {
        VocabularyError::IncompatibleState(format!("vocabulary parameter `{}' holds {}", key, found.kind()))
    }

    fn write(self, state: &mut NetworkState) -> Result<()> {

        let mut datasets = vec![
            (Self::WORDS, Dataset::Strings(self.words)),
            (Self::CLASSES, Dataset::Ints(self.classes)),
            (Self::PROBS, Dataset::Floats(self.probs)),
        ];
        if let Some(unigram_probs) = self.unigram_probs {
            datasets.push((Self::UNIGRAM_PROBS, Dataset::Floats(unigram_probs)));
        }

        // validate every dataset before the first write
        if let Some(group) = state.group(Self::GROUP) {
            for (key, data) in &datasets {
                group.check_write(key, data)?;
            }
        }

        let group = state.require_group(Self::GROUP);
        for (key, data) in datasets {
            group.write(key, data)?;
        }
        debug!("wrote vocabulary to network state");
        Ok(())
    }

}
