//! Resolution pipeline: reads data files, resolves name references, builds
//! the catalog.
//!
//! Provides format detection (RON/JSON/TOML), file discovery, and
//! deserialization helpers, plus [`load_game_data`] which ties them together.

use crate::schema::{IngredientData, ItemData, QuantityData};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tickworks_core::big::Big;
use tickworks_core::catalog::{
    BuildingDef, ByproductTable, Catalog, CatalogBuilder, CatalogError, ContainerDef, Recipe,
};
use tickworks_core::config::SimConfig;
use tickworks_core::engine::Engine;
use tickworks_core::id::ItemId;
use tracing::{debug, info};

// ===========================================================================
// Errors
// ===========================================================================

/// Errors that can occur during data loading.
#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    /// A required data file was not found in the given directory.
    #[error("required file '{file}' not found in {dir}")]
    MissingRequired { file: String, dir: PathBuf },

    /// The file has an extension we don't support.
    #[error("unsupported format for file: {file}")]
    UnsupportedFormat { file: PathBuf },

    /// Two files with the same base name but different formats exist.
    #[error("conflicting formats: {a} and {b}")]
    ConflictingFormats { a: PathBuf, b: PathBuf },

    /// A deserialization error occurred.
    #[error("parse error in {file}: {detail}")]
    Parse { file: PathBuf, detail: String },

    /// A name reference could not be resolved.
    #[error("unresolved {expected_kind} reference '{name}' in {file}")]
    UnresolvedRef {
        file: PathBuf,
        name: String,
        expected_kind: &'static str,
    },

    /// A duplicate name was found.
    #[error("duplicate name '{name}' in {file}")]
    DuplicateName { file: PathBuf, name: String },

    /// A quantity could not be read as a number.
    #[error("invalid quantity for '{item}' in {file}: {detail}")]
    InvalidQuantity {
        file: PathBuf,
        item: String,
        detail: String,
    },

    /// The resolved definitions do not form a valid catalog.
    #[error("invalid catalog in {file}: {source}")]
    Catalog {
        file: PathBuf,
        #[source]
        source: CatalogError,
    },

    /// An I/O error occurred.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// ===========================================================================
// Format detection
// ===========================================================================

/// Supported data file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Ron,
    Toml,
    Json,
}

/// Detect the format of a file based on its extension.
pub fn detect_format(path: &Path) -> Result<Format, DataLoadError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("ron") => Ok(Format::Ron),
        Some("toml") => Ok(Format::Toml),
        Some("json") => Ok(Format::Json),
        _ => Err(DataLoadError::UnsupportedFormat {
            file: path.to_path_buf(),
        }),
    }
}

// ===========================================================================
// File discovery
// ===========================================================================

/// Scan a directory for a data file with the given base name (without extension).
///
/// Looks for `{base_name}.ron`, `{base_name}.toml`, and `{base_name}.json`.
/// Returns `Ok(None)` if no file is found, or `Err(ConflictingFormats)` if
/// multiple formats exist for the same base name.
pub fn find_data_file(dir: &Path, base_name: &str) -> Result<Option<PathBuf>, DataLoadError> {
    let extensions = ["ron", "toml", "json"];
    let mut found: Option<PathBuf> = None;

    for ext in &extensions {
        let candidate = dir.join(format!("{base_name}.{ext}"));
        if candidate.exists() {
            if let Some(existing) = &found {
                return Err(DataLoadError::ConflictingFormats {
                    a: existing.clone(),
                    b: candidate,
                });
            }
            found = Some(candidate);
        }
    }

    Ok(found)
}

/// Like [`find_data_file`], but returns an error if no file is found.
pub fn require_data_file(dir: &Path, base_name: &str) -> Result<PathBuf, DataLoadError> {
    find_data_file(dir, base_name)?.ok_or_else(|| DataLoadError::MissingRequired {
        file: base_name.to_string(),
        dir: dir.to_path_buf(),
    })
}

// ===========================================================================
// Deserialization
// ===========================================================================

fn parse_error(path: &Path, detail: impl ToString) -> DataLoadError {
    DataLoadError::Parse {
        file: path.to_path_buf(),
        detail: detail.to_string(),
    }
}

/// Read a file and deserialize it according to its format (detected from extension).
pub fn deserialize_file<T: DeserializeOwned>(path: &Path) -> Result<T, DataLoadError> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;
    deserialize_str(&content, format, path)
}

/// Deserialize in-memory content. `path` is only used in error messages.
pub fn deserialize_str<T: DeserializeOwned>(
    content: &str,
    format: Format,
    path: &Path,
) -> Result<T, DataLoadError> {
    match format {
        Format::Ron => ron::from_str(content).map_err(|e| parse_error(path, e)),
        Format::Json => serde_json::from_str(content).map_err(|e| parse_error(path, e)),
        Format::Toml => toml::from_str(content).map_err(|e| parse_error(path, e)),
    }
}

/// Deserialize a list from a file. For TOML files, extracts the array at the
/// given `toml_key` from a top-level table. For RON and JSON, deserializes
/// directly as `Vec<T>`.
pub fn deserialize_list<T: DeserializeOwned>(
    path: &Path,
    toml_key: &str,
) -> Result<Vec<T>, DataLoadError> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;
    deserialize_list_str(&content, format, path, toml_key)
}

/// In-memory counterpart of [`deserialize_list`].
pub fn deserialize_list_str<T: DeserializeOwned>(
    content: &str,
    format: Format,
    path: &Path,
    toml_key: &str,
) -> Result<Vec<T>, DataLoadError> {
    match format {
        Format::Ron | Format::Json => deserialize_str(content, format, path),
        Format::Toml => {
            let table: toml::Value = toml::from_str(content).map_err(|e| parse_error(path, e))?;
            let array = table
                .get(toml_key)
                .ok_or_else(|| parse_error(path, format!("missing key '{toml_key}' in TOML file")))?
                .clone();
            array
                .try_into()
                .map_err(|e: toml::de::Error| parse_error(path, e))
        }
    }
}

// ===========================================================================
// Name resolution helpers
// ===========================================================================

/// Look up a name in a map, returning an `UnresolvedRef` error if not found.
pub fn resolve_name<'a, V>(
    map: &'a HashMap<String, V>,
    name: &str,
    file: &Path,
    expected_kind: &'static str,
) -> Result<&'a V, DataLoadError> {
    map.get(name).ok_or_else(|| DataLoadError::UnresolvedRef {
        file: file.to_path_buf(),
        name: name.to_string(),
        expected_kind,
    })
}

/// Check whether a name already exists in a map, returning a `DuplicateName`
/// error if so.
pub fn check_duplicate<V>(
    map: &HashMap<String, V>,
    name: &str,
    file: &Path,
) -> Result<(), DataLoadError> {
    if map.contains_key(name) {
        Err(DataLoadError::DuplicateName {
            file: file.to_path_buf(),
            name: name.to_string(),
        })
    } else {
        Ok(())
    }
}

// ===========================================================================
// Catalog resolution
// ===========================================================================

/// Resolves one item's name references and quantities.
struct Resolver<'a> {
    ids: &'a HashMap<String, ItemId>,
    file: &'a Path,
    item: &'a str,
}

impl Resolver<'_> {
    fn id(&self, name: &str, expected_kind: &'static str) -> Result<ItemId, DataLoadError> {
        resolve_name(self.ids, name, self.file, expected_kind).copied()
    }

    fn quantity(&self, quantity: &QuantityData) -> Result<Big, DataLoadError> {
        quantity.to_big().map_err(|e| DataLoadError::InvalidQuantity {
            file: self.file.to_path_buf(),
            item: self.item.to_string(),
            detail: e.to_string(),
        })
    }

    fn entries(&self, entries: &[IngredientData]) -> Result<Vec<(ItemId, Big)>, DataLoadError> {
        entries
            .iter()
            .map(|entry| Ok((self.id(entry.item(), "item")?, self.quantity(entry.quantity())?)))
            .collect()
    }

    fn recipe(&self, entries: &[IngredientData]) -> Result<Recipe, DataLoadError> {
        let mut recipe = Recipe::new();
        for (item, quantity) in self.entries(entries)? {
            let total = recipe.remove(&item).unwrap_or_default() + quantity;
            recipe.insert(item, total);
        }
        Ok(recipe)
    }
}

/// Build a catalog from item definitions.
///
/// Names are registered first (rejecting duplicates) so items may refer to
/// items defined later in the file.
pub fn build_catalog(items: &[ItemData], file: &Path) -> Result<Catalog, DataLoadError> {
    let mut builder = CatalogBuilder::new();
    let mut ids: HashMap<String, ItemId> = HashMap::new();

    // Phase 1: Register all names
    for item in items {
        check_duplicate(&ids, &item.name, file)?;
        let id = builder.register_item(&item.name);
        ids.insert(item.name.clone(), id);
    }

    // Phase 2: Resolve every definition
    for item in items {
        let r = Resolver {
            ids: &ids,
            file,
            item: &item.name,
        };
        let id = r.id(&item.name, "item")?;

        if let Some(recipe) = &item.recipe {
            let ingredients = r.entries(&recipe.ingredients)?;
            let craft_time = r.quantity(&recipe.craft_time)?;
            builder.set_recipe(id, ingredients, craft_time);
        }

        let producers = item
            .producers
            .iter()
            .map(|name| r.id(name, "building"))
            .collect::<Result<Vec<_>, _>>()?;
        let storage = match &item.storage {
            Some(names) => Some(
                names
                    .iter()
                    .map(|name| r.id(name, "container"))
                    .collect::<Result<Vec<_>, _>>()?,
            ),
            None => None,
        };
        let byproducts = item
            .byproducts
            .iter()
            .map(|table| {
                table
                    .iter()
                    .map(|(name, weight)| Ok((r.id(name, "item")?, *weight)))
                    .collect::<Result<Vec<_>, DataLoadError>>()
                    .map(ByproductTable::new)
            })
            .collect::<Result<Vec<_>, _>>()?;
        let recipe_scale = item.recipe_scale.as_ref().map(|q| r.quantity(q)).transpose()?;
        let building = match &item.building {
            Some(data) => Some(BuildingDef {
                speed: match &data.speed {
                    Some(q) => r.quantity(q)?,
                    None => Big::one(),
                },
                self_storage: match &data.self_storage {
                    Some(q) => r.quantity(q)?,
                    None => Big::zero(),
                },
                power: r.recipe(&data.power)?,
                boost_item: data.boost_item.as_deref().map(|name| r.id(name, "item")).transpose()?,
            }),
            None => None,
        };
        let container = match &item.container {
            Some(data) => Some(ContainerDef {
                capacity: r.quantity(&data.capacity)?,
            }),
            None => None,
        };

        builder
            .mutate_item(&item.name, |def| {
                def.producers = producers;
                def.storage = storage;
                def.byproducts = byproducts;
                def.recipe_scale = recipe_scale;
                def.disabled_by_default = item.disabled_by_default;
                def.building = building;
                def.container = container;
            })
            .map_err(|source| DataLoadError::Catalog {
                file: file.to_path_buf(),
                source,
            })?;
        debug!(item = %item.name, id = id.0, "resolved item");
    }

    builder.build().map_err(|source| DataLoadError::Catalog {
        file: file.to_path_buf(),
        source,
    })
}

/// Parse and build a catalog from in-memory item definitions.
pub fn load_catalog_str(content: &str, format: Format) -> Result<Catalog, DataLoadError> {
    let file = Path::new("<inline>");
    let items: Vec<ItemData> = deserialize_list_str(content, format, file, "items")?;
    build_catalog(&items, file)
}

// ===========================================================================
// Game data
// ===========================================================================

/// Everything needed to start a session.
#[derive(Debug, Clone)]
pub struct GameData {
    pub catalog: Arc<Catalog>,
    pub config: SimConfig,
}

impl GameData {
    /// A fresh engine over this catalog and config.
    pub fn new_engine(&self) -> Engine {
        Engine::new(Arc::clone(&self.catalog), self.config.clone())
    }
}

/// Load `items.{ron,json,toml}` (required) and `config.{ron,json,toml}`
/// (optional, defaults otherwise) from `dir`.
pub fn load_game_data(dir: &Path) -> Result<GameData, DataLoadError> {
    let items_path = require_data_file(dir, "items")?;
    let items: Vec<ItemData> = deserialize_list(&items_path, "items")?;
    let catalog = build_catalog(&items, &items_path)?;

    let config = match find_data_file(dir, "config")? {
        Some(path) => deserialize_file(&path)?,
        None => SimConfig::default(),
    };

    info!(
        dir = %dir.display(),
        items = catalog.item_count(),
        ticks_per_second = config.ticks_per_second,
        "loaded game data"
    );
    Ok(GameData {
        catalog: Arc::new(catalog),
        config,
    })
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    /// Create a temporary directory with a unique name for test isolation.
    fn make_test_dir(suffix: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "tickworks_data_test_{suffix}_{}",
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    /// Clean up a test directory.
    fn cleanup(dir: &Path) {
        let _ = fs::remove_dir_all(dir);
    }

    const SMELTING_JSON: &str = r#"[
        {"name": "ore"},
        {"name": "coal"},
        {"name": "plate", "recipe": {"ingredients": [["ore", 1]], "craft_time": 1},
         "producers": ["furnace"], "storage": ["chest"]},
        {"name": "gear", "recipe": {"ingredients": [["plate", 1], ["plate", 1]], "craft_time": "2"},
         "producers": ["assembler"], "disabled_by_default": true},
        {"name": "furnace", "building": {"speed": 0.5, "self_storage": 5}},
        {"name": "assembler", "building": {"power": [{"item": "coal", "quantity": 1}]}},
        {"name": "chest", "container": {"capacity": 50}}
    ]"#;

    // -----------------------------------------------------------------------
    // detect_format
    // -----------------------------------------------------------------------

    #[test]
    fn detect_format_by_extension() {
        assert_eq!(detect_format(Path::new("items.ron")).unwrap(), Format::Ron);
        assert_eq!(detect_format(Path::new("items.toml")).unwrap(), Format::Toml);
        assert_eq!(detect_format(Path::new("items.json")).unwrap(), Format::Json);
    }

    #[test]
    fn detect_format_unsupported() {
        for name in ["items.yaml", "items"] {
            assert!(matches!(
                detect_format(Path::new(name)),
                Err(DataLoadError::UnsupportedFormat { .. })
            ));
        }
    }

    // -----------------------------------------------------------------------
    // find_data_file / require_data_file
    // -----------------------------------------------------------------------

    #[test]
    fn find_data_file_found_and_missing() {
        let dir = make_test_dir("find");
        assert_eq!(find_data_file(&dir, "items").unwrap(), None);

        fs::write(dir.join("items.toml"), "").unwrap();
        assert_eq!(find_data_file(&dir, "items").unwrap(), Some(dir.join("items.toml")));

        cleanup(&dir);
    }

    #[test]
    fn find_data_file_conflict() {
        let dir = make_test_dir("find_conflict");
        fs::write(dir.join("items.ron"), "[]").unwrap();
        fs::write(dir.join("items.json"), "[]").unwrap();

        let result = find_data_file(&dir, "items");
        assert!(matches!(
            result,
            Err(DataLoadError::ConflictingFormats { .. })
        ));

        cleanup(&dir);
    }

    #[test]
    fn require_data_file_missing() {
        let dir = make_test_dir("require_missing");

        let result = require_data_file(&dir, "items");
        assert!(matches!(result, Err(DataLoadError::MissingRequired { ref file, .. }) if file == "items"));

        cleanup(&dir);
    }

    // -----------------------------------------------------------------------
    // deserialize_file / deserialize_list
    // -----------------------------------------------------------------------

    #[test]
    fn deserialize_list_all_formats() {
        let dir = make_test_dir("list_formats");
        let ron_path = dir.join("a.ron");
        fs::write(&ron_path, r#"[(name: "ore"), (name: "plate")]"#).unwrap();
        let json_path = dir.join("b.json");
        fs::write(&json_path, r#"[{"name": "ore"}, {"name": "plate"}]"#).unwrap();
        let toml_path = dir.join("c.toml");
        fs::write(&toml_path, "[[items]]\nname = \"ore\"\n\n[[items]]\nname = \"plate\"\n").unwrap();

        for path in [&ron_path, &json_path, &toml_path] {
            let items: Vec<ItemData> = deserialize_list(path, "items").unwrap();
            assert_eq!(items.len(), 2);
            assert_eq!(items[1].name, "plate");
        }

        cleanup(&dir);
    }

    #[test]
    fn deserialize_list_toml_missing_key() {
        let result: Result<Vec<ItemData>, _> =
            deserialize_list_str(r#"foo = "bar""#, Format::Toml, Path::new("items.toml"), "items");
        assert!(matches!(result, Err(DataLoadError::Parse { .. })));
    }

    #[test]
    fn deserialize_file_parse_error() {
        let dir = make_test_dir("deser_parse_err");
        let path = dir.join("bad.ron");
        fs::write(&path, "this is not valid RON {{{").unwrap();

        let result: Result<Vec<ItemData>, _> = deserialize_file(&path);
        assert!(matches!(result, Err(DataLoadError::Parse { .. })));

        cleanup(&dir);
    }

    // -----------------------------------------------------------------------
    // build_catalog
    // -----------------------------------------------------------------------

    #[test]
    fn builds_smelting_catalog() {
        let catalog = load_catalog_str(SMELTING_JSON, Format::Json).unwrap();
        let plate = catalog.item_id("plate").unwrap();
        let gear = catalog.item_id("gear").unwrap();
        let furnace = catalog.item_id("furnace").unwrap();
        let chest = catalog.item_id("chest").unwrap();
        let ore = catalog.item_id("ore").unwrap();

        let def = catalog.item(plate).unwrap();
        assert_eq!(def.recipe.as_ref().unwrap().ingredients[&ore], Big::one());
        assert!(catalog.is_producer(plate, furnace));
        assert!(catalog.can_store(plate, chest));
        assert_eq!(catalog.building(furnace).unwrap().speed, Big::new(5, -1));
        assert_eq!(catalog.building(furnace).unwrap().self_storage, Big::from(5));
        assert_eq!(catalog.container(chest).unwrap().capacity, Big::from(50));

        let gear_def = catalog.item(gear).unwrap();
        assert!(gear_def.disabled_by_default);
        assert!(gear_def.storage.is_none());
        assert_eq!(gear_def.recipe.as_ref().unwrap().ingredients[&plate], Big::from(2));
        assert_eq!(gear_def.recipe.as_ref().unwrap().craft_time, Big::from(2));
        assert!(gear_def.recipe.as_ref().unwrap().craft_time.is_frozen());
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let json = r#"[{"name": "ore"}, {"name": "ore"}]"#;
        assert!(matches!(
            load_catalog_str(json, Format::Json),
            Err(DataLoadError::DuplicateName { ref name, .. }) if name == "ore"
        ));
    }

    #[test]
    fn unknown_references_are_rejected() {
        let json = r#"[{"name": "plate", "producers": ["furnace"]}]"#;
        assert!(matches!(
            load_catalog_str(json, Format::Json),
            Err(DataLoadError::UnresolvedRef { ref name, expected_kind: "building", .. }) if name == "furnace"
        ));

        let json = r#"[{"name": "plate", "recipe": {"ingredients": [["unobtainium", 1]], "craft_time": 1}}]"#;
        assert!(matches!(
            load_catalog_str(json, Format::Json),
            Err(DataLoadError::UnresolvedRef { expected_kind: "item", .. })
        ));
    }

    #[test]
    fn non_building_producer_is_a_catalog_error() {
        let json = r#"[{"name": "ore"}, {"name": "plate", "producers": ["ore"]}]"#;
        assert!(matches!(
            load_catalog_str(json, Format::Json),
            Err(DataLoadError::Catalog {
                source: CatalogError::NotABuilding { .. },
                ..
            })
        ));
    }

    #[test]
    fn bad_quantity_is_reported() {
        let json = r#"[{"name": "chest", "container": {"capacity": "many"}}]"#;
        assert!(matches!(
            load_catalog_str(json, Format::Json),
            Err(DataLoadError::InvalidQuantity { ref item, .. }) if item == "chest"
        ));
    }

    #[test]
    fn overflowing_exponent_is_reported() {
        let json = r#"[{"name": "chest", "container": {"capacity": "1.5e-9223372036854775808"}}]"#;
        assert!(matches!(
            load_catalog_str(json, Format::Json),
            Err(DataLoadError::InvalidQuantity { ref item, .. }) if item == "chest"
        ));
    }

    // -----------------------------------------------------------------------
    // load_game_data
    // -----------------------------------------------------------------------

    #[test]
    fn load_game_data_with_default_config() {
        let dir = make_test_dir("game_default");
        fs::write(dir.join("items.json"), SMELTING_JSON).unwrap();

        let data = load_game_data(&dir).unwrap();
        assert_eq!(data.config, SimConfig::default());
        assert_eq!(data.catalog.item_count(), 7);
        let engine = data.new_engine();
        assert_eq!(engine.tick_count(), 0);

        cleanup(&dir);
    }

    #[test]
    fn load_game_data_with_partial_config() {
        let dir = make_test_dir("game_config");
        fs::write(dir.join("items.json"), SMELTING_JSON).unwrap();
        fs::write(dir.join("config.toml"), "ticks_per_second = 30\nseed = 7\n").unwrap();

        let data = load_game_data(&dir).unwrap();
        assert_eq!(data.config.ticks_per_second, 30);
        assert_eq!(data.config.seed, 7);
        assert_eq!(data.config.base_storage, 10);

        cleanup(&dir);
    }

    #[test]
    fn load_game_data_requires_items() {
        let dir = make_test_dir("game_missing");
        assert!(matches!(
            load_game_data(&dir),
            Err(DataLoadError::MissingRequired { .. })
        ));
        cleanup(&dir);
    }

    // -----------------------------------------------------------------------
    // Error display messages
    // -----------------------------------------------------------------------

    #[test]
    fn error_display_messages() {
        let e = DataLoadError::MissingRequired {
            file: "items".to_string(),
            dir: PathBuf::from("/data"),
        };
        assert!(format!("{e}").contains("items"));
        assert!(format!("{e}").contains("/data"));

        let e = DataLoadError::UnresolvedRef {
            file: PathBuf::from("items.ron"),
            name: "ore".to_string(),
            expected_kind: "item",
        };
        let msg = format!("{e}");
        assert!(msg.contains("ore"));
        assert!(msg.contains("item"));

        let e = DataLoadError::InvalidQuantity {
            file: PathBuf::from("items.ron"),
            item: "chest".to_string(),
            detail: "invalid digits".to_string(),
        };
        assert!(format!("{e}").contains("chest"));
    }

    #[test]
    fn io_error_converts() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let data_err: DataLoadError = io_err.into();
        assert!(matches!(data_err, DataLoadError::Io(_)));
        assert!(format!("{data_err}").contains("file not found"));
    }
}
