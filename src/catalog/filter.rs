//! Active filter set, ordering state, and the client-side predicate built
//! from them.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::records::{ARMOR_ITEM_TYPE, Item, ItemKind, WEAPON_ITEM_TYPE};

/// Localized labels of the two top-level classifications. A "category"
/// filter whose label matches one of these is really an item-type filter in
/// disguise and gets rewritten by [`FilterSortEngine::add_filter`].
const WEAPON_LABELS: &[&str] = &["Weapon", "Armes", "Waffe", "Arma", "武器"];
const ARMOR_LABELS: &[&str] = &["Armor", "Armures", "Rüstung", "Armadura", "Armatura", "防具"];

/// Item properties a filter can target.
///
/// Each property maps to a typed accessor via [`item_field`]; there is no
/// string-keyed field lookup anywhere in the predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterProperty {
    /// Top-level classification (weapon vs armor).
    ItemType,
    /// Rarity tier.
    TierType,
    /// Fine-grained category.
    Category,
    /// Character class (armor only).
    ClassType,
    /// Default damage type (weapons only).
    DefaultDamageType,
    /// Ammo type (weapons only).
    WeaponAmmoType,
}

impl FilterProperty {
    /// Query parameter name understood by the server.
    pub fn query_key(self) -> &'static str {
        match self {
            FilterProperty::ItemType => "item_type",
            FilterProperty::TierType => "tier_type",
            FilterProperty::Category => "category",
            FilterProperty::ClassType => "class_type",
            FilterProperty::DefaultDamageType => "default_damage_type",
            FilterProperty::WeaponAmmoType => "weapon_ammo_type",
        }
    }
}

/// Read the field a property targets off an item.
///
/// Kind-specific fields read `None` on items of the other kind, so such
/// filters simply never match them.
pub fn item_field(item: &Item, property: FilterProperty) -> Option<u32> {
    match (property, &item.kind) {
        (FilterProperty::ItemType, kind) => Some(kind.item_type_id()),
        (FilterProperty::TierType, _) => Some(item.tier_type),
        (FilterProperty::Category, _) => Some(item.category),
        (FilterProperty::ClassType, ItemKind::Armor { class_type }) => Some(*class_type),
        (FilterProperty::ClassType, ItemKind::Weapon { .. }) => None,
        (
            FilterProperty::DefaultDamageType,
            ItemKind::Weapon {
                default_damage_type,
                ..
            },
        ) => Some(*default_damage_type),
        (FilterProperty::DefaultDamageType, ItemKind::Armor { .. }) => None,
        (
            FilterProperty::WeaponAmmoType,
            ItemKind::Weapon {
                weapon_ammo_type, ..
            },
        ) => Some(*weapon_ammo_type),
        (FilterProperty::WeaponAmmoType, ItemKind::Armor { .. }) => None,
    }
}

/// One active filter: a property, the id it must equal, and the label shown
/// to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    /// Property the filter targets.
    pub property: FilterProperty,
    /// Id the property must equal for an item to pass.
    pub value: u32,
    /// User-facing label of the filter.
    pub label: String,
}

/// Filters grouped by property, preserving insertion order.
///
/// The predicate is AND across properties and OR within each property's
/// value list.
#[derive(Debug, Clone, Default)]
pub struct GroupedFilters(IndexMap<FilterProperty, Vec<Filter>>);

impl GroupedFilters {
    /// Iterate over the property groups in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&FilterProperty, &Vec<Filter>)> {
        self.0.iter()
    }

    /// Whether no filter is active.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Evaluate the predicate: the item passes iff for every property group
    /// at least one filter in that group matches the item's field.
    pub fn matches(&self, item: &Item) -> bool {
        self.0.iter().all(|(property, filters)| {
            let field = item_field(item, *property);
            filters.iter().any(|filter| field == Some(filter.value))
        })
    }

    /// Render the groups as per-property CSV query parameters.
    pub fn to_query_params(&self) -> Vec<(String, String)> {
        self.0
            .iter()
            .map(|(property, filters)| {
                let csv = filters
                    .iter()
                    .map(|filter| filter.value.to_string())
                    .collect::<Vec<_>>()
                    .join(",");
                (property.query_key().to_owned(), csv)
            })
            .collect()
    }
}

/// Sortable item properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderKey {
    /// Localized item name.
    Name,
    /// Rarity tier.
    TierType,
    /// Fine-grained category.
    Category,
    /// Default damage type.
    DefaultDamageType,
    /// Character class.
    ClassType,
    /// Ammo type.
    WeaponAmmoType,
}

impl OrderKey {
    fn query_token(self) -> &'static str {
        match self {
            OrderKey::Name => "translations__name",
            OrderKey::TierType => "tier_type",
            OrderKey::Category => "category",
            OrderKey::DefaultDamageType => "default_damage_type",
            OrderKey::ClassType => "class_type",
            OrderKey::WeaponAmmoType => "weapon_ammo_type",
        }
    }
}

/// The single active ordering: a key plus a direction sign.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ordering {
    /// Property the catalog is sorted by.
    pub key: OrderKey,
    /// Whether the sort runs highest-first.
    pub descending: bool,
}

impl Default for Ordering {
    fn default() -> Self {
        Self {
            key: OrderKey::Name,
            descending: false,
        }
    }
}

impl Ordering {
    /// Render the ordering as the server query token (`-` prefix when
    /// descending).
    pub fn query_token(&self) -> String {
        if self.descending {
            format!("-{}", self.key.query_token())
        } else {
            self.key.query_token().to_owned()
        }
    }
}

/// Mutable filter/sort/search state backing the browsing views and the game
/// candidate pools.
#[derive(Debug, Clone, Default)]
pub struct FilterSortEngine {
    filters: Vec<Filter>,
    ordering: Ordering,
    search_term: String,
    from_account: bool,
}

impl FilterSortEngine {
    /// Fresh engine with no filters, name-ascending ordering, empty search.
    pub fn new() -> Self {
        Self::default()
    }

    /// Currently active filters, in insertion order.
    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    /// Currently active ordering.
    pub fn ordering(&self) -> Ordering {
        self.ordering
    }

    /// Current free-text search term.
    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    /// Replace the free-text search term.
    pub fn set_search_term(&mut self, term: impl Into<String>) {
        self.search_term = term.into();
    }

    /// Whether the active pool is restricted to the linked account's items.
    pub fn from_account(&self) -> bool {
        self.from_account
    }

    /// Toggle the account-restricted scope flag.
    pub fn set_from_account(&mut self, from_account: bool) {
        self.from_account = from_account;
    }

    /// Add a filter unless an equal `(property, value)` pair is already
    /// present.
    ///
    /// A category filter whose label names a top-level classification
    /// (weapon or armor) is rewritten to the equivalent item-type filter, so
    /// the predicate needs no special casing later.
    pub fn add_filter(&mut self, property: FilterProperty, value: u32, label: impl Into<String>) {
        let label = label.into();
        let (property, value) = match classification_for_label(&label) {
            Some(item_type) if property == FilterProperty::Category => {
                (FilterProperty::ItemType, item_type)
            }
            _ => (property, value),
        };

        let duplicate = self
            .filters
            .iter()
            .any(|filter| filter.property == property && filter.value == value);
        if !duplicate {
            self.filters.push(Filter {
                property,
                value,
                label,
            });
        }
    }

    /// Remove the first filter structurally equal to `filter`.
    pub fn delete_filter(&mut self, filter: &Filter) {
        if let Some(index) = self.filters.iter().position(|existing| existing == filter) {
            self.filters.remove(index);
        }
    }

    /// Select `key` as the active ordering; re-selecting the active key
    /// flips the direction instead.
    pub fn set_sort(&mut self, key: OrderKey) {
        if self.ordering.key == key {
            self.ordering.descending = !self.ordering.descending;
        } else {
            self.ordering = Ordering {
                key,
                descending: false,
            };
        }
    }

    /// Group the active filters by property, preserving insertion order.
    pub fn group_by_property(&self) -> GroupedFilters {
        let mut groups: IndexMap<FilterProperty, Vec<Filter>> = IndexMap::new();
        for filter in &self.filters {
            groups.entry(filter.property).or_default().push(filter.clone());
        }
        GroupedFilters(groups)
    }

    /// Per-property CSV query parameters for the current filter set.
    pub fn query_params(&self) -> Vec<(String, String)> {
        self.group_by_property().to_query_params()
    }

    /// Clear filters, search term, and the account scope flag. The ordering
    /// is left untouched.
    pub fn reset(&mut self) {
        self.filters.clear();
        self.search_term.clear();
        self.from_account = false;
    }
}

/// Map a classification label to the item-type id it aliases, if any.
fn classification_for_label(label: &str) -> Option<u32> {
    let matches = |labels: &[&str]| {
        labels
            .iter()
            .any(|candidate| candidate.eq_ignore_ascii_case(label) || *candidate == label)
    };
    if matches(WEAPON_LABELS) {
        Some(WEAPON_ITEM_TYPE)
    } else if matches(ARMOR_LABELS) {
        Some(ARMOR_ITEM_TYPE)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weapon(id: u64, tier: u32, damage: u32) -> Item {
        Item {
            id,
            localized_name: format!("weapon-{id}"),
            localized_flavor_text: String::new(),
            tier_type: tier,
            category: 9,
            icon_url: None,
            screenshot_url: None,
            localized_stats: Vec::new(),
            localized_perks: Vec::new(),
            kind: ItemKind::Weapon {
                default_damage_type: damage,
                weapon_ammo_type: 1,
                localized_weapon_slot: String::new(),
                localized_weapon_ammo_type: String::new(),
            },
        }
    }

    fn armor(id: u64, tier: u32, class: u32) -> Item {
        Item {
            id,
            localized_name: format!("armor-{id}"),
            localized_flavor_text: String::new(),
            tier_type: tier,
            category: 4,
            icon_url: None,
            screenshot_url: None,
            localized_stats: Vec::new(),
            localized_perks: Vec::new(),
            kind: ItemKind::Armor { class_type: class },
        }
    }

    #[test]
    fn duplicate_filters_are_ignored() {
        let mut engine = FilterSortEngine::new();
        engine.add_filter(FilterProperty::TierType, 2, "Exotic");
        engine.add_filter(FilterProperty::TierType, 2, "Exotic");
        assert_eq!(engine.filters().len(), 1);
    }

    #[test]
    fn classification_labels_rewrite_to_item_type() {
        let mut engine = FilterSortEngine::new();
        engine.add_filter(FilterProperty::Category, 99, "Armures");
        let filter = &engine.filters()[0];
        assert_eq!(filter.property, FilterProperty::ItemType);
        assert_eq!(filter.value, ARMOR_ITEM_TYPE);

        engine.add_filter(FilterProperty::Category, 7, "Hand Cannons");
        assert_eq!(engine.filters()[1].property, FilterProperty::Category);
        assert_eq!(engine.filters()[1].value, 7);
    }

    #[test]
    fn predicate_is_or_within_group_and_across_groups() {
        let mut engine = FilterSortEngine::new();
        engine.add_filter(FilterProperty::TierType, 2, "Exotic");
        engine.add_filter(FilterProperty::TierType, 3, "Legendary");
        engine.add_filter(FilterProperty::DefaultDamageType, 4, "Arc");
        let groups = engine.group_by_property();

        assert!(groups.matches(&weapon(1, 2, 4)));
        assert!(groups.matches(&weapon(2, 3, 4)));
        // Wrong damage type: fails the AND across groups.
        assert!(!groups.matches(&weapon(3, 2, 1)));
        // Armor has no damage type field, so that group can never match.
        assert!(!groups.matches(&armor(4, 2, 1)));
    }

    #[test]
    fn empty_filter_set_matches_everything() {
        let engine = FilterSortEngine::new();
        assert!(engine.group_by_property().matches(&armor(1, 5, 0)));
    }

    #[test]
    fn query_params_join_values_with_commas() {
        let mut engine = FilterSortEngine::new();
        engine.add_filter(FilterProperty::TierType, 2, "Exotic");
        engine.add_filter(FilterProperty::TierType, 3, "Legendary");
        engine.add_filter(FilterProperty::ClassType, 1, "Titan");
        assert_eq!(
            engine.query_params(),
            vec![
                ("tier_type".to_owned(), "2,3".to_owned()),
                ("class_type".to_owned(), "1".to_owned()),
            ]
        );
    }

    #[test]
    fn set_sort_flips_only_on_repeat() {
        let mut engine = FilterSortEngine::new();
        engine.set_sort(OrderKey::TierType);
        assert_eq!(engine.ordering().query_token(), "tier_type");

        engine.set_sort(OrderKey::TierType);
        assert_eq!(engine.ordering().query_token(), "-tier_type");

        // Double flip returns to the original order.
        engine.set_sort(OrderKey::TierType);
        assert_eq!(engine.ordering().query_token(), "tier_type");

        // Switching keys resets to ascending, no flip accumulation.
        engine.set_sort(OrderKey::Category);
        engine.set_sort(OrderKey::TierType);
        assert_eq!(engine.ordering().query_token(), "tier_type");
    }

    #[test]
    fn reset_clears_everything_but_ordering() {
        let mut engine = FilterSortEngine::new();
        engine.add_filter(FilterProperty::TierType, 2, "Exotic");
        engine.set_search_term("ace");
        engine.set_from_account(true);
        engine.set_sort(OrderKey::Category);

        engine.reset();
        assert!(engine.filters().is_empty());
        assert!(engine.search_term().is_empty());
        assert!(!engine.from_account());
        assert_eq!(engine.ordering().key, OrderKey::Category);
    }

    #[test]
    fn delete_filter_removes_first_structural_match() {
        let mut engine = FilterSortEngine::new();
        engine.add_filter(FilterProperty::TierType, 2, "Exotic");
        engine.add_filter(FilterProperty::ClassType, 1, "Titan");
        let target = engine.filters()[0].clone();
        engine.delete_filter(&target);
        assert_eq!(engine.filters().len(), 1);
        assert_eq!(engine.filters()[0].property, FilterProperty::ClassType);
    }
}
