// ============================================================
// Layer 3: Caption Domain Types
// ============================================================
// A caption record maps an image identifier (file name with
// the extension stripped) to every caption written for it.
//
// Example (Flickr8k has five captions per image):
//   "1000268201_693b08cb0e" → [
//       "<s> a child in a pink dress is climbing up a set of stairs </s>",
//       ...
//   ]
//
// Captions start out raw, as written by the annotators, and are
// normalised in place by the corpus loader (Layer 4).

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Marker placed in front of every normalised caption
pub const START_TOKEN: &str = "<s>";

/// Marker placed after every normalised caption
pub const END_TOKEN: &str = "</s>";

/// Reserved vocabulary entry used to equalise sequence lengths
pub const PAD_TOKEN: &str = "<PAD>";

/// Image id → captions, iterated in the order the record lists them.
pub type CaptionMap = IndexMap<String, Vec<String>>;

/// One of the three dataset partitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Split {
    Train,
    Val,
    Test,
}

impl Split {
    /// All splits, in the order they are prepared and loaded
    pub const ALL: [Split; 3] = [Split::Train, Split::Val, Split::Test];

    /// Directory name of this split under the dataset root
    pub fn as_str(&self) -> &'static str {
        match self {
            Split::Train => "train",
            Split::Val   => "val",
            Split::Test  => "test",
        }
    }

    /// File name of the persisted caption record for this split
    pub fn captions_file(&self) -> String {
        format!("captions_{}.json", self.as_str())
    }
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Split {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s {
            "train" => Ok(Split::Train),
            "val"   => Ok(Split::Val),
            "test"  => Ok(Split::Test),
            other   => anyhow::bail!("unknown split '{other}' (expected train, val or test)"),
        }
    }
}

/// Strip the file extension from an image file name.
/// "1000268201_693b08cb0e.jpg" → "1000268201_693b08cb0e"
pub fn image_id(file_name: &str) -> &str {
    match file_name.rfind('.') {
        Some(pos) if pos > 0 => &file_name[..pos],
        _ => file_name,
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_names() {
        assert_eq!(Split::Train.captions_file(), "captions_train.json");
        assert_eq!(Split::Val.to_string(), "val");
        assert_eq!("test".parse::<Split>().unwrap(), Split::Test);
        assert!("validation".parse::<Split>().is_err());
    }

    #[test]
    fn test_image_id_strips_extension() {
        assert_eq!(image_id("1000268201_693b08cb0e.jpg"), "1000268201_693b08cb0e");
        assert_eq!(image_id("no_extension"), "no_extension");
        assert_eq!(image_id(".hidden"), ".hidden");
    }
}
