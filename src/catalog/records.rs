//! Wire-format records returned by the catalog server and the runtime item
//! model built from them.
//!
//! The server speaks a flat schema where weapons and armor share one record
//! shape and are told apart by `item_type`. At runtime that duck-typed union
//! becomes the tagged [`ItemKind`], carrying only the fields valid for its
//! kind.

use serde::{Deserialize, Serialize};

/// `item_type` discriminant the server uses for weapons.
pub const WEAPON_ITEM_TYPE: u32 = 1;
/// `item_type` discriminant the server uses for armor.
pub const ARMOR_ITEM_TYPE: u32 = 20;

/// One page of a paginated catalog response.
#[derive(Debug, Clone, Deserialize)]
pub struct Page<T> {
    /// Total number of records matching the query, across all pages.
    pub count: u64,
    /// Records carried by this page, in server-provided order.
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
    /// Absolute URL of the next page, or `None` on the last page.
    #[serde(default)]
    pub next: Option<String>,
}

/// Catalog item exactly as serialized by the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemRecord {
    /// Primary key of the item.
    pub id: u64,
    /// Top-level classification (weapon vs armor).
    pub item_type: u32,
    /// Display name in the requested locale.
    pub localized_name: String,
    /// Flavor text in the requested locale.
    #[serde(default)]
    pub localized_flavor_text: String,
    /// Localized weapon slot label (weapons only).
    #[serde(default)]
    pub localized_weapon_slot: String,
    /// Localized ammo type label (weapons only).
    #[serde(default)]
    pub localized_weapon_ammo_type: String,
    /// Ammo type id (weapons only).
    #[serde(default)]
    pub weapon_ammo_type: Option<u32>,
    /// Rarity tier id.
    pub tier_type: u32,
    /// Character class id (armor only).
    #[serde(default)]
    pub class_type: Option<u32>,
    /// Fine-grained category id.
    pub category: u32,
    /// Relative icon path, when the server knows one.
    #[serde(default)]
    pub icon_url: Option<String>,
    /// Relative screenshot path; only present on full single-item records.
    #[serde(default)]
    pub screenshot_url: Option<String>,
    /// Default damage type id (weapons only).
    #[serde(default)]
    pub default_damage_type: Option<u32>,
    /// Localized stat rows.
    #[serde(default)]
    pub localized_stats: Vec<LocalizedStat>,
    /// Localized perk rows.
    #[serde(default)]
    pub localized_perks: Vec<LocalizedPerk>,
}

/// Localized stat row attached to an item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalizedStat {
    /// Localized stat name.
    pub name: String,
    /// Stat value.
    pub value: i64,
    /// Relative icon path for the stat.
    #[serde(default)]
    pub icon_url: Option<String>,
}

/// Localized perk row attached to an item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalizedPerk {
    /// Localized perk name.
    pub name: String,
    /// Localized perk description.
    #[serde(default)]
    pub desc: String,
    /// Relative icon path for the perk.
    #[serde(default)]
    pub icon_url: Option<String>,
    /// Whether this perk is the item's intrinsic trait.
    #[serde(default)]
    pub is_intrinsic: bool,
}

/// Reference collections the catalog exposes alongside items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReferenceKind {
    /// Rarity tiers.
    Tiers,
    /// Item categories.
    Categories,
    /// Damage types.
    DamageTypes,
    /// Character classes.
    ClassTypes,
}

impl ReferenceKind {
    /// Endpoint path segment for this collection.
    pub fn path(self) -> &'static str {
        match self {
            ReferenceKind::Tiers => "tier-types/",
            ReferenceKind::Categories => "categories/",
            ReferenceKind::DamageTypes => "damage-types/",
            ReferenceKind::ClassTypes => "class-types/",
        }
    }

    /// Stable label used in cache keys and logs.
    pub fn label(self) -> &'static str {
        match self {
            ReferenceKind::Tiers => "tiers",
            ReferenceKind::Categories => "categories",
            ReferenceKind::DamageTypes => "damage_types",
            ReferenceKind::ClassTypes => "class_types",
        }
    }
}

/// Entry of a reference collection (tier, category, damage type or class).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceRecord {
    /// Primary key of the entry.
    pub id: u32,
    /// Upstream identifier of the entry.
    #[serde(default)]
    pub id_upstream: String,
    /// Canonical (untranslated) name.
    pub name: String,
    /// Display name in the requested locale.
    pub localized_name: String,
    /// Relative icon path, when the collection carries icons.
    #[serde(default)]
    pub icon_url: Option<String>,
    /// Localized description, when the collection carries one.
    #[serde(default)]
    pub localized_desc: Option<String>,
}

/// Kind-specific item data, the runtime replacement for the wire format's
/// presence/absence field convention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemKind {
    /// A weapon and its weapon-only classification fields.
    Weapon {
        /// Default damage type id.
        default_damage_type: u32,
        /// Ammo type id.
        weapon_ammo_type: u32,
        /// Localized weapon slot label.
        localized_weapon_slot: String,
        /// Localized ammo type label.
        localized_weapon_ammo_type: String,
    },
    /// An armor piece and its armor-only classification fields.
    Armor {
        /// Character class id.
        class_type: u32,
    },
}

impl ItemKind {
    /// The server-side `item_type` discriminant for this kind.
    pub fn item_type_id(&self) -> u32 {
        match self {
            ItemKind::Weapon { .. } => WEAPON_ITEM_TYPE,
            ItemKind::Armor { .. } => ARMOR_ITEM_TYPE,
        }
    }
}

/// Immutable catalog item snapshot used by browsing views and game sessions.
///
/// Items are owned by the [`CatalogCache`](super::cache::CatalogCache);
/// sessions hold clones of the filtered subset they play against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    /// Primary key of the item.
    pub id: u64,
    /// Display name in the fetch locale.
    pub localized_name: String,
    /// Flavor text in the fetch locale.
    pub localized_flavor_text: String,
    /// Rarity tier id.
    pub tier_type: u32,
    /// Fine-grained category id.
    pub category: u32,
    /// Relative icon path.
    pub icon_url: Option<String>,
    /// Relative screenshot path; `Some` marks a full single-item record.
    pub screenshot_url: Option<String>,
    /// Localized stat rows.
    pub localized_stats: Vec<LocalizedStat>,
    /// Localized perk rows.
    pub localized_perks: Vec<LocalizedPerk>,
    /// Weapon/armor discriminant and kind-specific fields.
    pub kind: ItemKind,
}

impl Item {
    /// Whether the item is a weapon.
    pub fn is_weapon(&self) -> bool {
        matches!(self.kind, ItemKind::Weapon { .. })
    }

    /// The item's intrinsic perk, if it has one.
    pub fn intrinsic_perk(&self) -> Option<&LocalizedPerk> {
        self.localized_perks.iter().find(|perk| perk.is_intrinsic)
    }
}

impl From<ItemRecord> for Item {
    fn from(record: ItemRecord) -> Self {
        let kind = if record.item_type == WEAPON_ITEM_TYPE {
            ItemKind::Weapon {
                default_damage_type: record.default_damage_type.unwrap_or_default(),
                weapon_ammo_type: record.weapon_ammo_type.unwrap_or_default(),
                localized_weapon_slot: record.localized_weapon_slot,
                localized_weapon_ammo_type: record.localized_weapon_ammo_type,
            }
        } else {
            ItemKind::Armor {
                class_type: record.class_type.unwrap_or_default(),
            }
        };

        Self {
            id: record.id,
            localized_name: record.localized_name,
            localized_flavor_text: record.localized_flavor_text,
            tier_type: record.tier_type,
            category: record.category,
            icon_url: record.icon_url,
            screenshot_url: record.screenshot_url,
            localized_stats: record.localized_stats,
            localized_perks: record.localized_perks,
            kind,
        }
    }
}
