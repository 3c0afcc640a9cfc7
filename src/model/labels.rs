use crate::error::AppError;
use std::collections::HashMap;
use std::path::Path;

/// Class id to display label, fixed for the lifetime of the process.
///
/// The on-disk format is the ImageNet `imagenet_class_index.json` layout:
/// `{"0": ["n01440764", "tench"], "1": [...], ...}`. Keys must cover
/// `0..N` with no gaps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelIndex {
    labels: Vec<String>,
}

impl LabelIndex {
    pub fn new(labels: Vec<String>) -> Self {
        Self { labels }
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            AppError::LabelIndex(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, AppError> {
        let raw: HashMap<String, (String, String)> = serde_json::from_str(content)
            .map_err(|e| AppError::LabelIndex(format!("malformed label index: {}", e)))?;

        let mut labels: Vec<Option<String>> = vec![None; raw.len()];
        for (key, (_wnid, label)) in raw {
            let id: usize = key
                .parse()
                .map_err(|_| AppError::LabelIndex(format!("non-numeric class id: {:?}", key)))?;
            let slot = labels.get_mut(id).ok_or_else(|| {
                AppError::LabelIndex(format!("class id {} is out of range", id))
            })?;
            *slot = Some(label);
        }

        // Ids are unique and bounded by the entry count, so every slot is filled
        // unless a key like "01" aliased "1".
        let labels = labels
            .into_iter()
            .enumerate()
            .map(|(id, label)| {
                label.ok_or_else(|| AppError::LabelIndex(format!("missing class id {}", id)))
            })
            .collect::<Result<Vec<_>, _>>()?;

        if labels.is_empty() {
            return Err(AppError::LabelIndex("label index is empty".to_string()));
        }

        Ok(Self { labels })
    }

    pub fn get(&self, class_id: usize) -> Option<&str> {
        self.labels.get(class_id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"{
        "0": ["n01440764", "tench"],
        "1": ["n01443537", "goldfish"],
        "2": ["n01484850", "great_white_shark"]
    }"#;

    #[test]
    fn test_parses_imagenet_layout() {
        let index = LabelIndex::from_json(SAMPLE).unwrap();

        assert_eq!(index.len(), 3);
        assert_eq!(index.get(0), Some("tench"));
        assert_eq!(index.get(2), Some("great_white_shark"));
        assert_eq!(index.get(3), None);
    }

    #[test]
    fn test_rejects_gap_in_ids() {
        let json = r#"{"0": ["a", "x"], "2": ["b", "y"]}"#;
        assert!(matches!(
            LabelIndex::from_json(json),
            Err(AppError::LabelIndex(_))
        ));
    }

    #[test]
    fn test_rejects_aliased_ids() {
        let json = r#"{"1": ["a", "x"], "01": ["b", "y"]}"#;
        assert!(matches!(
            LabelIndex::from_json(json),
            Err(AppError::LabelIndex(_))
        ));
    }

    #[test]
    fn test_rejects_non_numeric_key() {
        let json = r#"{"zero": ["a", "x"]}"#;
        assert!(matches!(
            LabelIndex::from_json(json),
            Err(AppError::LabelIndex(_))
        ));
    }

    #[test]
    fn test_rejects_wrong_value_shape() {
        assert!(LabelIndex::from_json(r#"{"0": "tench"}"#).is_err());
        assert!(LabelIndex::from_json(r#"{"0": ["n01440764"]}"#).is_err());
        assert!(LabelIndex::from_json("{}").is_err());
        assert!(LabelIndex::from_json("not json").is_err());
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let index = LabelIndex::from_file(file.path()).unwrap();
        assert_eq!(index.get(1), Some("goldfish"));

        let missing = LabelIndex::from_file("does/not/exist.json");
        assert!(matches!(missing, Err(AppError::LabelIndex(_))));
    }

    #[test]
    fn test_bundled_imagenet_index() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/data/imagenet_class_index.json");
        let index = LabelIndex::from_file(path).unwrap();

        assert_eq!(index.len(), 1000);
        assert_eq!(index.get(0), Some("tench"));
        assert_eq!(index.get(291), Some("lion"));
        assert_eq!(index.get(292), Some("tiger"));
        assert_eq!(index.get(999), Some("toilet_tissue"));
    }
}
