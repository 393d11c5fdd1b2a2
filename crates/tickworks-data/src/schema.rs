//! Serde data file structs for catalog definitions.
//!
//! These structs define the on-disk format for items, recipes, buildings and
//! containers. They are deserialized from RON, JSON or TOML data files and
//! then resolved into catalog types by the loader. Items refer to each other
//! by name.

use serde::Deserialize;
use tickworks_core::big::{Big, ParseBigError};

// ===========================================================================
// Quantities
// ===========================================================================

/// A quantity in a data file. Integers and floats are taken as written;
/// strings carry values too large or too precise for either (`"1e300"`,
/// `"0.000000000000000000001"`).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum QuantityData {
    Int(i64),
    Float(f64),
    Text(String),
}

impl QuantityData {
    pub fn to_big(&self) -> Result<Big, ParseBigError> {
        match self {
            Self::Int(n) => Ok(Big::from(*n)),
            Self::Float(f) => Ok(Big::from_f64(*f)),
            Self::Text(s) => s.parse(),
        }
    }
}

impl From<i64> for QuantityData {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

// ===========================================================================
// Items
// ===========================================================================

/// An item definition in a data file.
#[derive(Debug, Clone, Deserialize)]
pub struct ItemData {
    pub name: String,
    #[serde(default)]
    pub recipe: Option<RecipeData>,
    /// Names of the building items that may craft this item.
    #[serde(default)]
    pub producers: Vec<String>,
    /// Names of the container items that may hold this item. Absent means
    /// unbounded storage.
    #[serde(default)]
    pub storage: Option<Vec<String>>,
    /// Weighted output tables, `(item, weight)` entries in draw order.
    #[serde(default)]
    pub byproducts: Vec<Vec<(String, u32)>>,
    #[serde(default)]
    pub recipe_scale: Option<QuantityData>,
    #[serde(default)]
    pub disabled_by_default: bool,
    #[serde(default)]
    pub building: Option<BuildingData>,
    #[serde(default)]
    pub container: Option<ContainerData>,
}

// ===========================================================================
// Recipes
// ===========================================================================

/// An ingredient entry, in short tuple form or full form.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum IngredientData {
    /// Short form: `("item_name", quantity)`.
    Short(String, QuantityData),
    Full { item: String, quantity: QuantityData },
}

impl IngredientData {
    pub fn item(&self) -> &str {
        match self {
            Self::Short(item, _) | Self::Full { item, .. } => item,
        }
    }

    pub fn quantity(&self) -> &QuantityData {
        match self {
            Self::Short(_, quantity) | Self::Full { quantity, .. } => quantity,
        }
    }
}

/// A recipe definition: ingredients per one unit of output, and the base
/// craft time in seconds.
#[derive(Debug, Clone, Deserialize)]
pub struct RecipeData {
    pub ingredients: Vec<IngredientData>,
    pub craft_time: QuantityData,
}

// ===========================================================================
// Buildings and containers
// ===========================================================================

/// Present on items that can be assigned as assemblers.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BuildingData {
    /// Defaults to 1.
    #[serde(default)]
    pub speed: Option<QuantityData>,
    #[serde(default)]
    pub self_storage: Option<QuantityData>,
    /// Fuel per instance per power cycle.
    #[serde(default)]
    pub power: Vec<IngredientData>,
    #[serde(default)]
    pub boost_item: Option<String>,
}

/// Present on items that can be assigned as storage containers.
#[derive(Debug, Clone, Deserialize)]
pub struct ContainerData {
    pub capacity: QuantityData,
}

// ===========================================================================
// TOML wrappers
// ===========================================================================

/// TOML cannot have a top-level array, so item lists live under `items`.
#[derive(Debug, Clone, Deserialize)]
pub struct TomlItems {
    pub items: Vec<ItemData>,
}

// ===========================================================================
// Tests
// ===========================================================================
