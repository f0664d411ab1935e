use std::{fs, path::PathBuf};

use crate::{BatchError, core::step::DEFAULT_CHUNK_SIZE};

/// Wiring of the fruit job.
///
/// One plain struct replaces the framework configurer: the job always runs
/// against the in-memory job repository, so only the resources and the
/// commit interval vary.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchConfig {
    /// Headerless `name,price` lines.
    pub input_path: PathBuf,
    /// Appended to, created when absent.
    pub output_path: PathBuf,
    pub chunk_size: usize,
    pub job_name: String,
    pub step_name: String,
    pub delimiter: u8,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            input_path: PathBuf::from("resources/sample.csv"),
            output_path: PathBuf::from("resources/done.csv"),
            chunk_size: DEFAULT_CHUNK_SIZE,
            job_name: "testJob".to_string(),
            step_name: "step1".to_string(),
            delimiter: b',',
        }
    }
}

impl BatchConfig {
    pub fn validate(&self) -> Result<(), BatchError> {
        if self.chunk_size == 0 {
            return Err(BatchError::Configuration(
                "chunk size must be at least 1".to_string(),
            ));
        }

        if self.same_input_and_output() {
            return Err(BatchError::Configuration(format!(
                "{} is used as both input and output",
                self.input_path.display()
            )));
        }

        if self.job_name.trim().is_empty() || self.step_name.trim().is_empty() {
            return Err(BatchError::Configuration(
                "job and step names must not be blank".to_string(),
            ));
        }

        Ok(())
    }

    /// Paths that both exist are compared once resolved.
    fn same_input_and_output(&self) -> bool {
        match (
            fs::canonicalize(&self.input_path),
            fs::canonicalize(&self.output_path),
        ) {
            (Ok(input), Ok(output)) => input == output,
            _ => self.input_path == self.output_path,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{error::Error, fs, path::PathBuf};

    use crate::BatchError;

    use super::BatchConfig;

    #[test]
    fn default_config_should_match_the_bundled_resources() {
        let config = BatchConfig::default();

        assert_eq!(config.input_path, PathBuf::from("resources/sample.csv"));
        assert_eq!(config.output_path, PathBuf::from("resources/done.csv"));
        assert_eq!(config.chunk_size, 10);
        assert_eq!(config.job_name, "testJob");
        assert_eq!(config.step_name, "step1");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_chunk_size_should_be_rejected() {
        let config = BatchConfig {
            chunk_size: 0,
            ..BatchConfig::default()
        };

        assert!(matches!(
            config.validate(),
            Err(BatchError::Configuration(_))
        ));
    }

    #[test]
    fn same_input_and_output_should_be_rejected() {
        let config = BatchConfig {
            output_path: PathBuf::from("resources/sample.csv"),
            ..BatchConfig::default()
        };

        assert!(matches!(
            config.validate(),
            Err(BatchError::Configuration(_))
        ));
    }

    #[test]
    fn same_file_through_another_path_should_be_rejected() -> Result<(), Box<dyn Error>> {
        let dir = tempfile::tempdir()?;
        fs::write(dir.path().join("sample.csv"), "apple,100\n")?;
        fs::create_dir(dir.path().join("in"))?;

        let config = BatchConfig {
            input_path: dir.path().join("sample.csv"),
            output_path: dir.path().join("in").join("..").join("sample.csv"),
            ..BatchConfig::default()
        };

        assert_ne!(config.input_path, config.output_path);
        assert!(matches!(
            config.validate(),
            Err(BatchError::Configuration(_))
        ));

        Ok(())
    }

    #[test]
    fn missing_output_should_not_be_resolved() -> Result<(), Box<dyn Error>> {
        let dir = tempfile::tempdir()?;
        fs::write(dir.path().join("sample.csv"), "apple,100\n")?;

        let config = BatchConfig {
            input_path: dir.path().join("sample.csv"),
            output_path: dir.path().join("done.csv"),
            ..BatchConfig::default()
        };

        assert!(config.validate().is_ok());

        Ok(())
    }
}
