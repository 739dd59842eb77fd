use crate::machine::{VALUE_BITS, WORD_WIDTH};
use anyhow::{ensure, Context, Result};
use log::debug;
use std::path::Path;

//
// Public Interface
//

/// Loads a memory image: one hex word per line, `#` starts a comment,
/// blank lines are skipped. Word zero is the reset vector since the
/// program counter starts there.
pub fn load_image(path: &Path) -> Result<Vec<u64>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read image file '{}'", path.display()))?;
    let image = parse_image(&text)
        .with_context(|| format!("Failed to parse image file '{}'", path.display()))?;
    debug!("Loaded {} words from '{}'", image.len(), path.display());
    Ok(image)
}

pub fn parse_image(text: &str) -> Result<Vec<u64>> {
    let mut image = Vec::new();
    for (number, line) in text.lines().enumerate() {
        let line = line.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }
        let word = u64::from_str_radix(line.trim_start_matches("0x"), 16)
            .with_context(|| format!("line {}: '{}' is not a hex word", number + 1, line))?;
        ensure!(
            word >> WORD_WIDTH == 0,
            "line {}: {:#x} exceeds {} bits",
            number + 1,
            word,
            WORD_WIDTH
        );
        image.push(word);
    }
    ensure!(!image.is_empty(), "image contains no words");
    ensure!(
        image.len() <= 1 << VALUE_BITS,
        "image of {} words exceeds the {}-word address space",
        image.len(),
        1 << VALUE_BITS
    );
    Ok(image)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parses_words_and_comments() {
        let image = parse_image("# boot\n0x0a2a\n\n1 # inline\nffff\n").unwrap();
        assert_eq!(image, vec![0x0a2a, 1, 0xffff]);
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_image("xyzzy\n").is_err());
        assert!(parse_image("").is_err());
        assert!(parse_image("10000\n").is_err());
    }

    #[test]
    fn loads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "0x6001 # jump 1\n6001").unwrap();
        let image = load_image(file.path()).unwrap();
        assert_eq!(image, vec![0x6001, 0x6001]);
    }

    #[test]
    fn missing_file_reports_the_path() {
        let error = load_image(Path::new("/no/such/image.hex")).unwrap_err();
        assert!(error.to_string().contains("/no/such/image.hex"));
    }
}
