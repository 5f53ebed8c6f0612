use std::{env, fs::File, io::{self, BufRead}, path::Path, process};
use rand::SeedableRng;
use rand::rngs::StdRng;
extern crate classlm_vocab;
use classlm_vocab::{NetworkState, Vocabulary, VocabularyError};


// this executable checks a saved vocabulary:
// translating words to word ids and classes,
// sampling words from given classes.
// treated as binary executable so it can be ran independantly from main

fn main() {

    // arguments to this executable should be:
    // a letter selector: "w" for word lookup, "s" for class sampling
    // path to input based on selector (words or class ids, one per line)
    // path to saved state (bin.gz)
    // example: ... w Input/words.txt Output/state.bin.gz
    let args: Vec<String> = env::args().collect();
    if args.len() != 4 {
        eprintln!("usage: inspect <w|s> <input file> <state file>");
        process::exit(2);
    }

    if let Err(e) = run(&args[1], &args[2], &args[3]) {
        eprintln!("{}", e);
        process::exit(1);
    }
}

fn run(selector: &str, input_path: &str, state_path: &str) -> Result<(), VocabularyError> {

    // read inputs file
    let lines = io::BufReader::new(File::open(input_path)?)
    .lines()
    .collect::<Result<Vec<String>, io::Error>>()?;
    let inputs = lines.iter().map(|line| line.trim()).filter(|line| !line.is_empty()).collect::<Vec<&str>>();

    let state = NetworkState::load(Path::new(state_path))?;
    let vocabulary = Vocabulary::from_state(&state)?;
    println!("{}", vocabulary);

    // match the input selector
    match selector {
        "w" => run_lookup(&inputs, &vocabulary),
        "s" => run_sampling(&inputs, &vocabulary),
        other => Err(VocabularyError::InvalidArgument(format!("unrecognized pattern in first argument {}", other)))
    }
}

fn run_lookup(inputs: &[&str], vocabulary: &Vocabulary) -> Result<(), VocabularyError> {

    // each input is a word, unknown words show up as <unk>
    let word_ids = vocabulary.words_to_ids(inputs);
    let (class_ids, probs) = vocabulary.get_class_memberships(&word_ids)?;

    for (i, word) in inputs.iter().enumerate() {
        let shortlist = if vocabulary.in_shortlist(word_ids[i]) { "shortlist" } else { "out-of-shortlist" };
        println!("{} : id {} ({}), class {}, p(word|class) = {}", word, word_ids[i], shortlist, class_ids[i], probs[i]);
    }
    Ok(())
}

fn run_sampling(inputs: &[&str], vocabulary: &Vocabulary) -> Result<(), VocabularyError> {

    // each input is a class id, a word is drawn from each
    let class_ids = inputs
    .iter()
    .map(|input| input.parse::<usize>().map_err(|_| VocabularyError::InvalidArgument(format!("not a class id: {}", input))))
    .collect::<Result<Vec<usize>, VocabularyError>>()?;

    let mut rng = StdRng::from_entropy();
    let word_ids = vocabulary.class_ids_to_word_ids(&class_ids, &mut rng)?;
    for (class_id, word_id) in class_ids.iter().zip(word_ids) {
        println!("class {} : {}", class_id, vocabulary.id_to_word(word_id).unwrap_or("?"));
    }
    Ok(())
}
