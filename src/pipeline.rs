// imports
use crate::config::{files_handling, Config, VocabParams};
use crate::counts::WordCounts;
use crate::error::{Result, VocabularyError};
use crate::state::NetworkState;
use crate::vocabulary::Vocabulary;

use std::env;
use std::path::Path;
use std::time::Instant;
use rand::{Rng, SeedableRng};
use rand::rngs::StdRng;
use tracing::info;

pub struct Pipeline {}

impl Pipeline {

    // runs the main procedure of 3 steps -
    // -> configuration of arguments
    // -> word counting and vocabulary building
    // -> probabilities and saving the state

    pub fn run() -> Result<()> {

        info!("entering program...");
        let args: Vec<String> = env::args().collect();

        info!("building parameters...");
        let params = Config::new(&args)?.get_params();
        info!("{}", params);

        Pipeline::build(&params)?;
        Ok(())
    }

    pub fn build(params: &VocabParams) -> Result<Vocabulary> {

        let timer = Instant::now();

        // count the corpus words if a corpus was given
        let counts = match &params.corpus_file {
            Some(corpus_file) => Some(WordCounts::from_files(&[Path::new(corpus_file)], true)?),
            None => None
        };

        info!("starting vocabulary building...");
        let mut vocabulary = match (&params.vocabulary_file, &counts) {
            (Some(vocabulary_file), counts) => {
                // corpus words missing from the vocabulary file become out-of-shortlist words
                let oos_words = counts.as_ref().map(Pipeline::sorted_words);
                Vocabulary::from_path(Path::new(vocabulary_file), params.vocabulary_format, oos_words.as_deref())?
            },
            (None, Some(counts)) => match params.shortlist_size {
                Some(shortlist_size) => {
                    let (shortlist, oos_words) = counts.split_most_common(shortlist_size);
                    Vocabulary::from_word_counts_with_oos(&shortlist, params.num_classes, Some(&oos_words))?
                },
                None => Vocabulary::from_word_counts(counts.as_map(), params.num_classes)?
            },
            (None, None) => {
                return Err(VocabularyError::Config("either corpus_file or vocabulary_file has to be supplied".to_string()));
            }
        };

        if let Some(counts) = &counts {
            vocabulary.compute_probs(counts.as_map(), params.update_class_probs)?;
        }
        info!("finished vocabulary creation, took {} seconds ...", timer.elapsed().as_secs());

        // save the vocabulary and the out-of-shortlist corrections
        let mut state = NetworkState::new();
        vocabulary.get_state(&mut state)?;
        files_handling::save_output(&params.output_dir, "state", &state)?;
        if vocabulary.has_unigram_probs() {
            files_handling::save_output(&params.output_dir, "oos_logprobs", &vocabulary.get_oos_logprobs()?)?;
        }
        info!("saved vocabulary to {}", params.output_dir);

        if params.num_samples > 0 {
            Pipeline::log_samples(&vocabulary, params.num_samples, params.seed)?;
        }

        Ok(vocabulary)
    }

    fn sorted_words(counts: &WordCounts) -> Vec<String> {
        let mut words = counts.as_map().keys().cloned().collect::<Vec<String>>();
        words.sort();
        words
    }

    // draws random classes and realizes each as a word, as a sanity check of the class distributions
    fn log_samples(vocabulary: &Vocabulary, num_samples: usize, seed: u64) -> Result<()> {

        let mut rng = StdRng::seed_from_u64(seed);
        let class_ids = (0..num_samples)
        .map(|_| rng.gen_range(0..vocabulary.num_classes()))
        .collect::<Vec<usize>>();
        let word_ids = vocabulary.class_ids_to_word_ids(&class_ids, &mut rng)?;

        for (class_id, word_id) in class_ids.iter().zip(word_ids) {
            info!("class {} -> {}", class_id, vocabulary.id_to_word(word_id).unwrap_or("?"));
        }
        Ok(())
    }

}


#[cfg(test)]
mod tests {

    use super::Pipeline;
    use crate::config::files_handling::read_input;
    use crate::config::VocabParams;
    use crate::format::VocabularyFormat;
    use crate::state::NetworkState;
    use crate::vocabulary::Vocabulary;
    use std::fs;
    use tempfile::tempdir;

    fn params(output_dir: String) -> VocabParams {
        VocabParams {
            output_dir: output_dir,
            corpus_file: None,
            vocabulary_file: None,
            vocabulary_format: VocabularyFormat::Words,
            num_classes: None,
            shortlist_size: None,
            update_class_probs: true,
            seed: 1,
            num_samples: 4
        }
    }

    #[test]
    fn corpus_with_shortlist() {
        let dir = tempdir().unwrap();
        let corpus = dir.path().join("corpus.txt");
        fs::write(&corpus, "the cat sat\nthe dog sat\nthe end\n").unwrap();

        let mut params = params(dir.path().join("out").display().to_string());
        params.corpus_file = Some(corpus.display().to_string());
        params.shortlist_size = Some(5);
        params.num_classes = Some(2);

        let vocabulary = Pipeline::build(&params).unwrap();
        assert!(vocabulary.num_words() > vocabulary.num_shortlist_words());
        assert!(vocabulary.in_shortlist(vocabulary.word_to_id("the").unwrap()));
        assert!(vocabulary.has_unigram_probs());

        let state: NetworkState = read_input(&(params.output_dir.clone() + "/state")).unwrap();
        let restored = Vocabulary::from_state(&state).unwrap();
        assert_eq!(restored.num_words(), vocabulary.num_words());
        assert!(restored.has_unigram_probs());
        assert!(dir.path().join("out").join("oos_logprobs.npy").exists());
    }

    #[test]
    fn vocabulary_file_with_corpus_oos() {
        let dir = tempdir().unwrap();
        let vocabulary_file = dir.path().join("vocab.txt");
        fs::write(&vocabulary_file, "the 0\na 0\ndog 1\n").unwrap();
        let corpus = dir.path().join("corpus.txt");
        fs::write(&corpus, "the dog barked\na dog\n").unwrap();

        let mut params = params(dir.path().join("out").display().to_string());
        params.vocabulary_file = Some(vocabulary_file.display().to_string());
        params.vocabulary_format = VocabularyFormat::Classes;
        params.corpus_file = Some(corpus.display().to_string());

        let vocabulary = Pipeline::build(&params).unwrap();
        assert_eq!(vocabulary.num_shortlist_words(), 6);
        let barked = vocabulary.word_to_id("barked").unwrap();
        assert!(!vocabulary.in_shortlist(barked));
        assert_eq!(vocabulary.get_oos_logprobs().unwrap()[barked], 0.0);
    }

    #[test]
    fn no_input_fails() {
        let dir = tempdir().unwrap();
        let params = params(dir.path().join("out").display().to_string());
        assert!(Pipeline::build(&params).is_err());
    }

    #[test]
    fn missing_corpus_fails() {
        let dir = tempdir().unwrap();
        let mut params = params(dir.path().join("out").display().to_string());
        params.corpus_file = Some(dir.path().join("absent.txt").display().to_string());
        assert!(Pipeline::build(&params).is_err());
    }

}
