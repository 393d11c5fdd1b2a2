//! The read-only game catalog: items, recipes, buildings, containers and
//! byproduct tables.
//!
//! Built through [`CatalogBuilder`] (register -> mutate -> build) and frozen
//! afterwards. The engine shares a [`Catalog`] by `Arc` and never mutates it.
//! Every [`Big`] stored in a built catalog is frozen.

use crate::big::Big;
use crate::id::ItemId;
use std::collections::{BTreeMap, HashMap};

/// Ingredient -> quantity per one unit of output.
pub type Recipe = BTreeMap<ItemId, Big>;

/// How an item is crafted.
#[derive(Debug, Clone, PartialEq)]
pub struct RecipeDef {
    pub ingredients: Recipe,
    /// Base seconds to craft one unit at building speed 1.
    pub craft_time: Big,
}

/// Properties of an item that can be assigned as an assembler.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildingDef {
    /// Crafting speed multiplier.
    pub speed: Big,
    /// Storage each instance contributes to the item it produces.
    pub self_storage: Big,
    /// Fuel consumed per instance per power cycle. Empty = needs no power.
    pub power: Recipe,
    /// Owning `n` of this item speeds the building up by `2^n`.
    pub boost_item: Option<ItemId>,
}

impl Default for BuildingDef {
    fn default() -> Self {
        Self {
            speed: Big::one(),
            self_storage: Big::zero(),
            power: Recipe::new(),
            boost_item: None,
        }
    }
}

/// Properties of an item that can be assigned as a storage container.
#[derive(Debug, Clone, PartialEq)]
pub struct ContainerDef {
    pub capacity: Big,
}

/// A weighted set of alternative outputs. Exactly one entry is chosen per
/// production event; entries keep their declared order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ByproductTable {
    pub entries: Vec<(ItemId, u32)>,
}

impl ByproductTable {
    pub fn new(entries: Vec<(ItemId, u32)>) -> Self {
        Self { entries }
    }

    pub fn total_weight(&self) -> u64 {
        self.entries.iter().map(|(_, w)| u64::from(*w)).sum()
    }
}

/// Everything the catalog knows about one item.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ItemDef {
    pub name: String,
    pub recipe: Option<RecipeDef>,
    /// Building kinds allowed to craft this item.
    pub producers: Vec<ItemId>,
    /// Container kinds allowed to hold this item. `None` = unbounded storage.
    pub storage: Option<Vec<ItemId>>,
    pub byproducts: Vec<ByproductTable>,
    /// Exponential cost growth per unit already produced. Pricing data; the
    /// scheduler does not read it.
    pub recipe_scale: Option<Big>,
    pub disabled_by_default: bool,
    pub building: Option<BuildingDef>,
    pub container: Option<ContainerDef>,
}

impl ItemDef {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    fn referenced_ids(&self) -> Vec<ItemId> {
        let mut ids = Vec::new();
        if let Some(recipe) = &self.recipe {
            ids.extend(recipe.ingredients.keys().copied());
        }
        ids.extend(self.producers.iter().copied());
        if let Some(storage) = &self.storage {
            ids.extend(storage.iter().copied());
        }
        for table in &self.byproducts {
            ids.extend(table.entries.iter().map(|(id, _)| *id));
        }
        if let Some(building) = &self.building {
            ids.extend(building.power.keys().copied());
            ids.extend(building.boost_item);
        }
        ids
    }

    fn freeze_values(&mut self) {
        fn freeze_recipe(recipe: &mut Recipe) {
            for value in recipe.values_mut() {
                *value = std::mem::take(value).freeze();
            }
        }
        if let Some(recipe) = &mut self.recipe {
            freeze_recipe(&mut recipe.ingredients);
            recipe.craft_time = std::mem::take(&mut recipe.craft_time).freeze();
        }
        if let Some(scale) = self.recipe_scale.take() {
            self.recipe_scale = Some(scale.freeze());
        }
        if let Some(building) = &mut self.building {
            building.speed = std::mem::take(&mut building.speed).freeze();
            building.self_storage = std::mem::take(&mut building.self_storage).freeze();
            freeze_recipe(&mut building.power);
        }
        if let Some(container) = &mut self.container {
            container.capacity = std::mem::take(&mut container.capacity).freeze();
        }
    }
}

/// Builder for constructing an immutable [`Catalog`].
#[derive(Debug, Default)]
pub struct CatalogBuilder {
    items: Vec<ItemDef>,
    name_to_id: HashMap<String, ItemId>,
}

impl CatalogBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern an item name. Registering the same name twice returns the
    /// same id.
    pub fn register_item(&mut self, name: &str) -> ItemId {
        if let Some(id) = self.name_to_id.get(name) {
            return *id;
        }
        let id = ItemId(self.items.len() as u32);
        self.items.push(ItemDef::new(name));
        self.name_to_id.insert(name.to_string(), id);
        id
    }

    pub fn item_id(&self, name: &str) -> Option<ItemId> {
        self.name_to_id.get(name).copied()
    }

    pub fn item_mut(&mut self, id: ItemId) -> Option<&mut ItemDef> {
        self.items.get_mut(id.0 as usize)
    }

    /// Mutate an existing item by name.
    pub fn mutate_item<F>(&mut self, name: &str, f: F) -> Result<(), CatalogError>
    where
        F: FnOnce(&mut ItemDef),
    {
        let id = self
            .item_id(name)
            .ok_or_else(|| CatalogError::NotFound(name.to_string()))?;
        f(&mut self.items[id.0 as usize]);
        Ok(())
    }

    /// Set the recipe of `item`. Repeated ingredients are summed.
    pub fn set_recipe(&mut self, item: ItemId, ingredients: Vec<(ItemId, Big)>, craft_time: Big) {
        let mut merged = Recipe::new();
        for (ingredient, count) in ingredients {
            let total = merged.remove(&ingredient).unwrap_or_default() + count;
            merged.insert(ingredient, total);
        }
        if let Some(def) = self.item_mut(item) {
            def.recipe = Some(RecipeDef {
                ingredients: merged,
                craft_time,
            });
        }
    }

    /// Validate references and freeze into a [`Catalog`].
    pub fn build(mut self) -> Result<Catalog, CatalogError> {
        let len = self.items.len();
        for (index, def) in self.items.iter().enumerate() {
            let item = ItemId(index as u32);
            if let Some(bad) = def.referenced_ids().into_iter().find(|id| id.0 as usize >= len) {
                return Err(CatalogError::InvalidItemRef(bad));
            }
            for &building in &def.producers {
                if self.items[building.0 as usize].building.is_none() {
                    return Err(CatalogError::NotABuilding { item, building });
                }
            }
            for &container in def.storage.iter().flatten() {
                if self.items[container.0 as usize].container.is_none() {
                    return Err(CatalogError::NotAContainer { item, container });
                }
            }
        }
        for def in &mut self.items {
            def.freeze_values();
        }
        Ok(Catalog {
            items: self.items,
            name_to_id: self.name_to_id,
        })
    }
}

/// Immutable catalog. Frozen after [`CatalogBuilder::build`].
#[derive(Debug)]
pub struct Catalog {
    items: Vec<ItemDef>,
    name_to_id: HashMap<String, ItemId>,
}

impl Catalog {
    pub fn item(&self, id: ItemId) -> Option<&ItemDef> {
        self.items.get(id.0 as usize)
    }

    pub fn item_id(&self, name: &str) -> Option<ItemId> {
        self.name_to_id.get(name).copied()
    }

    /// Name of an item, or `"?"` for ids the catalog does not know.
    pub fn name(&self, id: ItemId) -> &str {
        self.item(id).map(|def| def.name.as_str()).unwrap_or("?")
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// All items in canonical (id) order.
    pub fn items(&self) -> impl Iterator<Item = (ItemId, &ItemDef)> {
        self.items
            .iter()
            .enumerate()
            .map(|(i, def)| (ItemId(i as u32), def))
    }

    pub fn building(&self, id: ItemId) -> Option<&BuildingDef> {
        self.item(id).and_then(|def| def.building.as_ref())
    }

    pub fn container(&self, id: ItemId) -> Option<&ContainerDef> {
        self.item(id).and_then(|def| def.container.as_ref())
    }

    pub fn is_producer(&self, item: ItemId, building: ItemId) -> bool {
        self.item(item)
            .is_some_and(|def| def.producers.contains(&building))
    }

    pub fn can_store(&self, item: ItemId, container: ItemId) -> bool {
        self.item(item)
            .and_then(|def| def.storage.as_ref())
            .is_some_and(|kinds| kinds.contains(&container))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("invalid item reference: {0:?}")]
    InvalidItemRef(ItemId),
    #[error("{building:?} is listed as a producer of {item:?} but is not a building")]
    NotABuilding { item: ItemId, building: ItemId },
    #[error("{container:?} is listed as storage for {item:?} but is not a container")]
    NotAContainer { item: ItemId, container: ItemId },
}
