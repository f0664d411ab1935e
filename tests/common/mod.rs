#![allow(dead_code)]

mod mocks;

use std::{fs, io, path::Path};

use fruit_batch::config::BatchConfig;

pub use mocks::MockFile;

/// `count` well-formed lines: `fruit1,1`, `fruit2,2`, ...
pub fn fruit_lines(count: usize) -> String {
    (1..=count)
        .map(|index| format!("fruit{},{}\n", index, index))
        .collect()
}

/// Writes `input` next to a not yet existing output file and returns the config.
pub fn config_with_input(dir: &Path, input: &str) -> io::Result<BatchConfig> {
    let input_path = dir.join("sample.csv");
    fs::write(&input_path, input)?;

    Ok(BatchConfig {
        input_path,
        output_path: dir.join("done.csv"),
        ..BatchConfig::default()
    })
}

pub fn read_output(config: &BatchConfig) -> String {
    fs::read_to_string(&config.output_path).unwrap_or_default()
}
