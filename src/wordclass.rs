use crate::error::{Result, VocabularyError};

use std::collections::HashMap;
use rand::Rng;
use rand::distributions::{Distribution, WeightedIndex};


// A set of words sharing one class id. Members are kept in insertion order,
// `index` maps a word id to its position in `members`.
#[derive(Clone, Debug)]
pub struct WordClass {
    id: usize,
    members: Vec<(usize, f64)>,
    index: HashMap<usize, usize>,
}

impl WordClass {

    /// Creates a class with one seed word.
    pub fn new(id: usize, word_id: usize, prob: f64) -> WordClass {
        let mut index = HashMap::new();
        index.insert(word_id, 0);
        Self {
            id: id,
            members: vec![(word_id, prob)],
            index: index
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn contains(&self, word_id: usize) -> bool {
        self.index.contains_key(&word_id)
    }

    pub fn add(&mut self, word_id: usize, prob: f64) -> Result<()> {
        if self.index.contains_key(&word_id) {
            return Err(VocabularyError::DuplicateMember { class_id: self.id, word_id: word_id });
        }
        self.index.insert(word_id, self.members.len());
        self.members.push((word_id, prob));
        Ok(())
    }

    pub fn set_prob(&mut self, word_id: usize, prob: f64) -> Result<()> {
        let position = self.position(word_id)?;
        self.members[position].1 = prob;
        Ok(())
    }

    pub fn get_prob(&self, word_id: usize) -> Result<f64> {
        let position = self.position(word_id)?;
        Ok(self.members[position].1)
    }

    /// Scales the member probabilities so that they sum to one. A class whose
    /// probabilities sum to zero gets a uniform distribution instead.
    pub fn normalize_probs(&mut self) {
        let total: f64 = self.members.iter().map(|(_, prob)| prob).sum();
        if total > 0.0 {
            self.members.iter_mut().for_each(|(_, prob)| *prob /= total);
        } else {
            let uniform = 1.0 / self.members.len() as f64;
            self.members.iter_mut().for_each(|(_, prob)| *prob = uniform);
        }
    }

    /// Draws one member word id, weighted by the member probabilities.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {

        // WeightedIndex rejects an all-zero or non-finite weight vector, fall back to a uniform draw then
        match WeightedIndex::new(self.members.iter().map(|(_, prob)| *prob)) {
            Ok(dist) => self.members[dist.sample(rng)].0,
            Err(_) => self.members[rng.gen_range(0..self.members.len())].0
        }
    }

    /// Iterates over `(word_id, prob)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.members.iter().copied()
    }

    fn position(&self, word_id: usize) -> Result<usize> {
        match self.index.get(&word_id) {
            Some(position) => Ok(*position),
            None => Err(VocabularyError::UnknownMember { class_id: self.id, word_id: word_id })
        }
    }

}
