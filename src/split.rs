/// Splitting multi-game cards into one card per product code
///
/// Every file of a card is copied to a fresh card holding only the saves of
/// its product code. Split cards are written to `BASE/CODE/CODE-N.mcd`, using
/// the first free channel number.

use crate::error::{McdError, Result};
use crate::filesystem::CardReader;
use crate::io::CardWriter;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Default number of channels per product code
pub const DEFAULT_MAX_CHANNELS: usize = 8;

/// Splitter options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitOptions {
    /// Highest channel number tried for a product code
    pub max_channels: usize,
}

impl Default for SplitOptions {
    fn default() -> Self {
        Self {
            max_channels: DEFAULT_MAX_CHANNELS,
        }
    }
}

/// Normalize a product code
///
/// Some games write a `P` where the dash belongs: `SCESP00582` becomes
/// `SCES-00582`.
pub fn sanitize_product_code(code: &str) -> String {
    let mut chars: Vec<char> = code.chars().collect();
    if chars.get(4) == Some(&'P') {
        chars[4] = '-';
    }
    chars.into_iter().collect()
}

/// Split a card into one encoded card per sanitized product code
///
/// Files keep their relative block order on each split card.
pub fn split_card(reader: &CardReader) -> Result<BTreeMap<String, Vec<u8>>> {
    let mut writers: BTreeMap<String, CardWriter> = BTreeMap::new();

    for file in reader.files() {
        let code = sanitize_product_code(&file.product_code);
        let writer = writers.entry(code).or_default();

        let mut source = reader.open_file(file)?;
        let mut dest = writer.create_file()?;
        io::copy(&mut source, &mut dest)?;
        dest.close()?;
    }

    let mut cards = BTreeMap::new();
    for (code, writer) in writers {
        cards.insert(code, writer.finish()?);
    }

    Ok(cards)
}

/// Can `code` name a single directory below the output base?
///
/// Separators, drive prefixes and relative elements are refused.
fn is_safe_code(code: &str) -> bool {
    !code.is_empty()
        && code != "."
        && code != ".."
        && !code.contains(&['/', '\\', '\0', ':'][..])
        && !Path::new(code).is_absolute()
}

/// Pick the path for the next card of `code` under `base`
///
/// Creates `base/code` when missing and returns the first
/// `base/code/code-N.mcd` that does not exist yet. Codes that are not a
/// plain directory name fail with [`McdError::InvalidPath`].
pub fn channel_path(base: &Path, code: &str, options: &SplitOptions) -> Result<PathBuf> {
    if !is_safe_code(code) {
        return Err(McdError::InvalidPath(code.to_string()));
    }

    let directory = base.join(code);

    match fs::metadata(&directory) {
        Ok(meta) if !meta.is_dir() => {
            return Err(McdError::NotADirectory(directory.display().to_string()))
        }
        Ok(_) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => fs::create_dir(&directory)?,
        Err(e) => return Err(e.into()),
    }

    for channel in 1..=options.max_channels {
        let target = directory.join(format!("{}-{}.mcd", code, channel));
        match fs::metadata(&target) {
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(target),
            Err(e) => return Err(e.into()),
            Ok(_) => {}
        }
    }

    Err(McdError::NoFreeChannels(code.to_string()))
}

/// Split a card and write the results below `base`
pub fn split_to_directory(
    base: &Path,
    reader: &CardReader,
    options: &SplitOptions,
) -> Result<Vec<PathBuf>> {
    let cards = split_card(reader)?;
    if let Some(code) = cards.keys().find(|code| !is_safe_code(code)) {
        warn!(code = %code, "refusing to split card with unsafe product code");
        return Err(McdError::InvalidPath(code.clone()));
    }

    let mut written = Vec::new();
    for (code, card) in cards {
        let path = channel_path(base, &code, options)?;
        fs::write(&path, card)?;
        debug!(code = %code, path = %path.display(), "wrote split card");
        written.push(path);
    }

    Ok(written)
}

/// Split every card in `inputs`, writing the results below `base`
///
/// `base` must be an existing directory.
pub fn split_files<P: AsRef<Path>>(
    base: &Path,
    inputs: &[P],
    options: &SplitOptions,
) -> Result<Vec<PathBuf>> {
    if !base.is_dir() {
        return Err(McdError::NotADirectory(base.display().to_string()));
    }

    let mut written = Vec::new();
    for input in inputs {
        let input = input.as_ref();
        let reader = CardReader::open_path(input)?;
        info!(
            input = %input.display(),
            files = reader.files().len(),
            "splitting memory card"
        );
        written.extend(split_to_directory(base, &reader, options)?);
    }

    Ok(written)
}
