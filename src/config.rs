use crate::error::{Result, VocabularyError};
use crate::format::VocabularyFormat;

use serde_json::Value;
use std::fmt::Display;
use std::fs::File;
use std::io::BufReader;


#[derive(Clone, Debug)]
pub struct VocabParams {
    pub output_dir: String,
    pub corpus_file: Option<String>,
    pub vocabulary_file: Option<String>,
    pub vocabulary_format: VocabularyFormat,
    pub num_classes: Option<usize>,
    pub shortlist_size: Option<usize>,
    pub update_class_probs: bool,
    pub seed: u64,
    pub num_samples: usize,
}

impl Display for VocabParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "using params:
        output_dir: {}
        corpus_file: {:?}
        vocabulary_file: {:?}
        vocabulary_format: {}
        num_classes: {:?}
        shortlist_size: {:?}
        update_class_probs: {}
        seed: {}
        num_samples: {}",
        self.output_dir, self.corpus_file, self.vocabulary_file, self.vocabulary_format, self.num_classes,
        self.shortlist_size, self.update_class_probs, self.seed, self.num_samples)
    }
}

pub struct Config {
    params: VocabParams
}

impl Config {

    pub fn get_params(&self) -> VocabParams {
        self.params.clone()
    }

    pub fn new(args: &[String]) -> Result<Config> {

        if args.len() != 2 {
            return Err(VocabularyError::Config("input should be a path to json file only".to_string()));
        }

        // parse input json
        let f = BufReader::new(File::open(&args[1])?);
        let json: Value = serde_json::from_reader(f).map_err(|e| {
            VocabularyError::Config(format!("cannot read json file {}: {}", &args[1], e))
        })?;

        Config::from_json(&json)
    }

    pub fn from_json(json: &Value) -> Result<Config> {

        // validate output in json
        let output_dir = match json.get("output_dir") {
            Some(output_dir) => as_string(output_dir, "output_dir")?,
            None => return Err(VocabularyError::Config("output_dir was not supplied through json".to_string()))
        };

        // handle default vs input parameters
        let corpus_file = match json.get("corpus_file") {
            Some(corpus_file) => Some(as_string(corpus_file, "corpus_file")?),
            None => None
        };
        let vocabulary_file = match json.get("vocabulary_file") {
            Some(vocabulary_file) => Some(as_string(vocabulary_file, "vocabulary_file")?),
            None => None
        };
        let vocabulary_format = match json.get("vocabulary_format") {
            Some(vocabulary_format) => as_string(vocabulary_format, "vocabulary_format")?.parse::<VocabularyFormat>()?,
            None => VocabularyFormat::Words
        };
        let num_classes = match json.get("num_classes") {
            Some(num_classes) => Some(as_usize(num_classes, "num_classes")?),
            None => None
        };
        let shortlist_size = match json.get("shortlist_size") {
            Some(shortlist_size) => Some(as_usize(shortlist_size, "shortlist_size")?),
            None => None
        };
        let update_class_probs = match json.get("update_class_probs") {
            Some(update_class_probs) => update_class_probs.as_bool().ok_or_else(|| {
                VocabularyError::Config("given update_class_probs is not boolean".to_string())
            })?,
            None => true
        };
        let seed = match json.get("seed") {
            Some(seed) => as_usize(seed, "seed")? as u64,
            None => 0
        };
        let num_samples = match json.get("num_samples") {
            Some(num_samples) => as_usize(num_samples, "num_samples")?,
            None => 0
        };

        if corpus_file.is_none() && vocabulary_file.is_none() {
            return Err(VocabularyError::Config("either corpus_file or vocabulary_file has to be supplied".to_string()));
        }
        if num_classes == Some(0) {
            return Err(VocabularyError::Config("num_classes has to be positive".to_string()));
        }

        let params = VocabParams {
            output_dir: output_dir,
            corpus_file: corpus_file,
            vocabulary_file: vocabulary_file,
            vocabulary_format: vocabulary_format,
            num_classes: num_classes,
            shortlist_size: shortlist_size,
            update_class_probs: update_class_probs,
            seed: seed,
            num_samples: num_samples
        };

        Ok (
            Self {
                params: params
            }
        )
    }

}

fn as_string(value: &Value, key: &str) -> Result<String> {
    match value.as_str() {
        Some(s) => Ok(s.to_owned()),
        None => Err(VocabularyError::Config(format!("cannot cast {} to string", key)))
    }
}

fn as_usize(value: &Value, key: &str) -> Result<usize> {
    match value.as_u64() {
        Some(n) => Ok(n as usize),
        None => Err(VocabularyError::Config(format!("given {} is not a non-negative integer", key)))
    }
}


pub mod files_handling {

    use crate::error::Result;
    use crate::state::NetworkState;

    use ndarray::Array1;
    use ndarray_npy::write_npy;
    use std::fs;
    use std::path::Path;

    pub fn read_input<R: ReadFile>(file_path: &str) -> Result<R> {
        R::read_file(file_path)
    }

    pub fn save_output<S: SaveFile>(output_dir: &str, file_name: &str, item: &S) -> Result<()> {

        // create output folder
        fs::create_dir_all(output_dir)?;

        // SaveFile can be NetworkState or Array1<f64>
        item.save_file(output_dir, file_name)
    }

    pub trait ReadFile: Sized {
        fn read_file(file_path: &str) -> Result<Self>;
    }

    impl ReadFile for NetworkState {
        fn read_file(file_path: &str) -> Result<Self> {
            let in_file = file_path.to_string() + ".bin.gz";
            NetworkState::load(Path::new(&in_file))
        }
    }

    pub trait SaveFile {
        fn save_file(&self, output_dir: &str, file_name: &str) -> Result<()>;
    }

    impl SaveFile for NetworkState {
        fn save_file(&self, output_dir: &str, file_name: &str) -> Result<()> {
            let out = output_dir.to_string() + "/" + file_name + ".bin.gz";
            self.save(Path::new(&out))
        }
    }

    impl SaveFile for Array1<f64> {
        fn save_file(&self, output_dir: &str, file_name: &str) -> Result<()> {
            let out = output_dir.to_string() + "/" + file_name + ".npy";
            write_npy(out, self)?;
            Ok(())
        }
    }

}


#[cfg(test)]
mod tests {

    use super::*;
    use super::files_handling::{read_input, save_output};
    use crate::state::{Dataset, NetworkState};
    use ndarray::array;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn defaults_are_filled_in() {
        let config = Config::from_json(&json!({"output_dir": "out", "corpus_file": "corpus.txt"})).unwrap();
        let params = config.get_params();
        assert_eq!(params.output_dir, "out");
        assert_eq!(params.corpus_file.as_deref(), Some("corpus.txt"));
        assert_eq!(params.vocabulary_format, VocabularyFormat::Words);
        assert_eq!(params.num_classes, None);
        assert!(params.update_class_probs);
        assert_eq!(params.seed, 0);
        assert_eq!(params.num_samples, 0);
    }

    #[test]
    fn explicit_values_are_read() {
        let config = Config::from_json(&json!({
            "output_dir": "out",
            "vocabulary_file": "vocab.txt",
            "vocabulary_format": "srilm-classes",
            "num_classes": 100,
            "shortlist_size": 5000,
            "update_class_probs": false,
            "seed": 7,
            "num_samples": 3
        })).unwrap();
        let params = config.get_params();
        assert_eq!(params.vocabulary_format, VocabularyFormat::SrilmClasses);
        assert_eq!(params.num_classes, Some(100));
        assert_eq!(params.shortlist_size, Some(5000));
        assert!(!params.update_class_probs);
        assert_eq!(params.seed, 7);
        assert!(params.to_string().contains("srilm-classes"));
    }

    #[test]
    fn invalid_configs_fail() {
        assert!(Config::from_json(&json!({"corpus_file": "c.txt"})).is_err());
        assert!(Config::from_json(&json!({"output_dir": "out"})).is_err());
        assert!(Config::from_json(&json!({"output_dir": "out", "corpus_file": "c", "num_classes": -3})).is_err());
        assert!(Config::from_json(&json!({"output_dir": "out", "corpus_file": "c", "num_classes": 0})).is_err());
        assert!(Config::from_json(&json!({"output_dir": "out", "vocabulary_file": "v", "vocabulary_format": "arpa"})).is_err());
        assert!(Config::new(&["prog".to_string()]).is_err());
    }

    #[test]
    fn save_and_read_outputs() {
        let dir = tempdir().unwrap();
        let output_dir = dir.path().join("out").display().to_string();

        let mut state = NetworkState::new();
        state.require_group("vocabulary").write("words", Dataset::Strings(vec!["a".to_string()])).unwrap();
        save_output(&output_dir, "state", &state).unwrap();
        save_output(&output_dir, "oos_logprobs", &array![0.0, -1.5]).unwrap();

        let loaded: NetworkState = read_input(&(output_dir.clone() + "/state")).unwrap();
        assert_eq!(loaded, state);
        assert!(dir.path().join("out").join("oos_logprobs.npy").exists());
    }

}
