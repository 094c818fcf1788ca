use crate::error::TemplateError;
use image::RgbImage;
use regex::Regex;
use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, info, warn};

/// Which appearance of a slot a template captures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateState {
    Occupied,
    Depleted,
}

impl TemplateState {
    /// Partition order used when matching; occupied templates win ties
    pub const ALL: [TemplateState; 2] = [TemplateState::Occupied, TemplateState::Depleted];

    /// Partition directory name on disk
    pub fn dir_name(&self) -> &'static str {
        match self {
            Self::Occupied => "full",
            Self::Depleted => "empty",
        }
    }
}

/// A reference image for one slot in one state
#[derive(Debug, Clone)]
pub struct SlotTemplate {
    /// File stem, e.g. `small-health-flask_health`
    pub key: String,
    /// Display name with separators turned into spaces
    pub name: String,
    pub kind: String,
    pub state: TemplateState,
    pub image: RgbImage,
}

/// In-memory template sets keyed by 0-based slot index and state, plus one progress-bar
/// template per slot.
#[derive(Debug, Clone)]
pub struct TemplateStore {
    root: PathBuf,
    progress_dir: PathBuf,
    slot_count: usize,
    templates: HashMap<(usize, TemplateState), Vec<SlotTemplate>>,
    progress: HashMap<usize, RgbImage>,
}

impl TemplateStore {
    /// Create an empty store without touching the filesystem
    pub fn new(root: impl Into<PathBuf>, progress_dir: impl Into<PathBuf>, slot_count: usize) -> Self {
        Self {
            root: root.into(),
            progress_dir: progress_dir.into(),
            slot_count,
            templates: HashMap::new(),
            progress: HashMap::new(),
        }
    }

    /// Create a store and load everything found on disk
    pub fn load(root: impl Into<PathBuf>, progress_dir: impl Into<PathBuf>, slot_count: usize) -> Self {
        let mut store = Self::new(root, progress_dir, slot_count);
        store.reload();
        store
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn progress_dir(&self) -> &Path {
        &self.progress_dir
    }

    pub fn slot_count(&self) -> usize {
        self.slot_count
    }

    /// Re-read both partitions and the progress-bar directory.
    ///
    /// Missing directories give empty sets; unreadable files are skipped.
    pub fn reload(&mut self) {
        self.templates.clear();
        self.progress.clear();

        for index in 0..self.slot_count {
            for state in TemplateState::ALL {
                let dir = self.slot_dir(index, state);
                let loaded = load_slot_dir(&dir, state);
                if !loaded.is_empty() {
                    self.templates.insert((index, state), loaded);
                }
            }

            let progress_path = self.progress_path(index);
            if progress_path.is_file() {
                match image::open(&progress_path) {
                    Ok(img) => {
                        self.progress.insert(index, img.to_rgb8());
                    }
                    Err(e) => warn!("Skipping progress template {:?}: {}", progress_path, e),
                }
            }
        }

        info!(
            "Loaded templates: {} occupied, {} depleted, {} progress bars",
            self.count(TemplateState::Occupied),
            self.count(TemplateState::Depleted),
            self.progress.len()
        );
    }

    /// Templates for a slot in one state, in file-name order
    pub fn templates(&self, index: usize, state: TemplateState) -> &[SlotTemplate] {
        self.templates
            .get(&(index, state))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Every template of a slot: occupied first, then depleted
    pub fn slot_templates(&self, index: usize) -> impl Iterator<Item = &SlotTemplate> {
        TemplateState::ALL
            .into_iter()
            .flat_map(move |state| self.templates(index, state).iter())
    }

    pub fn progress_template(&self, index: usize) -> Option<&RgbImage> {
        self.progress.get(&index)
    }

    pub fn count(&self, state: TemplateState) -> usize {
        self.templates
            .iter()
            .filter(|((_, s), _)| *s == state)
            .map(|(_, list)| list.len())
            .sum()
    }

    /// Register a template without reading it from disk
    pub fn insert(&mut self, index: usize, state: TemplateState, key: &str, image: RgbImage) {
        let Some((name, kind)) = parse_template_key(key) else {
            warn!("Ignoring template with malformed key {:?}", key);
            return;
        };
        self.templates
            .entry((index, state))
            .or_default()
            .push(SlotTemplate {
                key: key.to_string(),
                name,
                kind,
                state,
                image,
            });
    }

    pub fn insert_progress(&mut self, index: usize, image: RgbImage) {
        self.progress.insert(index, image);
    }

    /// `<root>/<full|empty>/slot{N}`
    pub fn slot_dir(&self, index: usize, state: TemplateState) -> PathBuf {
        self.root
            .join(state.dir_name())
            .join(format!("slot{}", index + 1))
    }

    /// `<progress_dir>/slot{N}_empty.png`
    pub fn progress_path(&self, index: usize) -> PathBuf {
        self.progress_dir.join(format!("slot{}_empty.png", index + 1))
    }

    /// Create the partition and slot directories
    pub fn create_structure(&self) -> Result<(), TemplateError> {
        for index in 0..self.slot_count {
            for state in TemplateState::ALL {
                fs::create_dir_all(self.slot_dir(index, state))?;
            }
        }
        fs::create_dir_all(&self.progress_dir)?;
        info!("Template directories ready under {:?}", self.root);
        Ok(())
    }

    /// Write a capture under the naming convention and return its path.
    ///
    /// The name is lowercased with spaces replaced by `-`.
    pub fn save_template(
        &self,
        index: usize,
        state: TemplateState,
        name: &str,
        kind: &str,
        image: &RgbImage,
    ) -> Result<PathBuf, TemplateError> {
        let dir = self.slot_dir(index, state);
        fs::create_dir_all(&dir)?;

        let file_name = format!(
            "{}_{}.png",
            name.trim().to_lowercase().replace(' ', "-"),
            kind.trim().to_lowercase()
        );
        let path = dir.join(file_name);
        image.save(&path)?;

        info!("Saved template {:?}", path);
        Ok(path)
    }

    /// Write the idle progress-bar capture for slot `index`
    pub fn save_progress_template(&self, index: usize, image: &RgbImage) -> Result<PathBuf, TemplateError> {
        fs::create_dir_all(&self.progress_dir)?;
        let path = self.progress_path(index);
        image.save(&path)?;

        info!("Saved progress template {:?}", path);
        Ok(path)
    }
}

fn key_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^(?P<name>.+)_(?P<kind>[^_]+)$").ok())
        .as_ref()
}

/// Split a file stem into (display name, kind) on its last underscore
pub fn parse_template_key(stem: &str) -> Option<(String, String)> {
    let caps = key_pattern()?.captures(stem)?;
    let name = caps.name("name")?.as_str().replace('-', " ");
    let kind = caps.name("kind")?.as_str().to_lowercase();
    Some((name, kind))
}

fn load_slot_dir(dir: &Path, state: TemplateState) -> Vec<SlotTemplate> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(_) => {
            debug!("No template directory at {:?}", dir);
            return Vec::new();
        }
    };

    let mut paths: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("png"))
        })
        .collect();
    paths.sort();

    let mut templates = Vec::with_capacity(paths.len());
    for path in paths {
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        let Some((name, kind)) = parse_template_key(stem) else {
            warn!("Skipping template with unexpected name {:?}", path);
            continue;
        };
        match image::open(&path) {
            Ok(img) => templates.push(SlotTemplate {
                key: stem.to_string(),
                name,
                kind,
                state,
                image: img.to_rgb8(),
            }),
            Err(e) => warn!("Skipping unreadable template {:?}: {}", path, e),
        }
    }

    templates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::temp_dir;
    use image::Rgb;

    #[test]
    fn test_parse_template_key() {
        assert_eq!(
            parse_template_key("small-health-flask_health"),
            Some(("small health flask".to_string(), "health".to_string()))
        );
        // split happens on the last underscore
        assert_eq!(
            parse_template_key("odd_name_utility"),
            Some(("odd_name".to_string(), "utility".to_string()))
        );
        assert_eq!(parse_template_key("nounderscore"), None);
        assert_eq!(parse_template_key("trailing_"), None);
    }

    #[test]
    fn test_missing_directories_load_empty() {
        let root = temp_dir("templates-missing");
        let store = TemplateStore::load(root.join("nope"), root.join("nada"), 5);

        assert_eq!(store.count(TemplateState::Occupied), 0);
        assert_eq!(store.slot_templates(0).count(), 0);
        assert!(store.progress_template(0).is_none());
    }

    #[test]
    fn test_save_and_reload() {
        let root = temp_dir("templates-roundtrip");
        let mut store = TemplateStore::new(root.join("templates"), root.join("progress_bars"), 2);
        store.create_structure().unwrap();
        assert!(store.slot_dir(1, TemplateState::Depleted).is_dir());

        let red = RgbImage::from_pixel(8, 8, Rgb([200, 20, 20]));
        let blue = RgbImage::from_pixel(8, 8, Rgb([20, 20, 200]));
        let path = store
            .save_template(0, TemplateState::Occupied, "Small Health Flask", "Health", &red)
            .unwrap();
        assert!(path.ends_with("full/slot1/small-health-flask_health.png"));
        store
            .save_template(0, TemplateState::Depleted, "Small Health Flask", "health", &blue)
            .unwrap();
        store
            .save_template(0, TemplateState::Occupied, "Aa Mana", "mana", &blue)
            .unwrap();
        let progress = store.save_progress_template(1, &blue).unwrap();
        assert!(progress.ends_with("progress_bars/slot2_empty.png"));
        fs::write(store.slot_dir(0, TemplateState::Occupied).join("zz-broken_health.png"), b"junk")
            .unwrap();

        store.reload();

        let occupied = store.templates(0, TemplateState::Occupied);
        assert_eq!(occupied.len(), 2);
        // sorted by file name, broken file skipped
        assert_eq!(occupied[0].key, "aa-mana_mana");
        assert_eq!(occupied[1].name, "small health flask");
        assert_eq!(occupied[1].kind, "health");
        assert_eq!(store.count(TemplateState::Depleted), 1);

        let order: Vec<TemplateState> = store.slot_templates(0).map(|t| t.state).collect();
        assert_eq!(
            order,
            vec![TemplateState::Occupied, TemplateState::Occupied, TemplateState::Depleted]
        );
        assert!(store.progress_template(1).is_some());
        assert!(store.progress_template(0).is_none());
    }

    #[test]
    fn test_insert_in_memory() {
        let mut store = TemplateStore::new("unused", "unused", 5);
        store.insert(2, TemplateState::Occupied, "jade_utility", RgbImage::new(4, 4));
        store.insert(2, TemplateState::Occupied, "malformed", RgbImage::new(4, 4));

        let templates = store.templates(2, TemplateState::Occupied);
        assert_eq!(templates.len(), 1);
        assert_eq!(templates[0].name, "jade");
    }
}
