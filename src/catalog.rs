use crate::classify::{classify_row, detect_price};
use crate::normalize::{field_number, normalise_for_match};
use crate::record::{Field, Record};
use crate::state::IdGen;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Fixed product categories, one price list per category.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Plastic,
    Metal,
    Radiator,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Plastic, Category::Metal, Category::Radiator];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Plastic => "plastic",
            Category::Metal => "metal",
            Category::Radiator => "radiator",
        }
    }

    /// Turkish display label.
    pub fn label(&self) -> &'static str {
        match self {
            Category::Plastic => "Plastik",
            Category::Metal => "Metal",
            Category::Radiator => "Radyatör",
        }
    }

    pub fn parse(text: &str) -> Option<Category> {
        match normalise_for_match(text).as_str() {
            "plastic" | "plastik" => Some(Category::Plastic),
            "metal" => Some(Category::Metal),
            "radiator" | "radyatör" | "radyator" => Some(Category::Radiator),
            _ => None,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Alias sets are capped; beyond this the extra source values add noise,
/// not recall.
pub const MAX_ALIASES: usize = 12;

/// One priced product from a supplier list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogItem {
    pub id: String,
    pub category: Category,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub unit: String,
    pub unit_price: f64,
    /// Strings usable to fuzzy-match this item against free text.
    pub aliases: Vec<String>,
    /// The original source row, retained for re-derivation.
    #[serde(default)]
    pub source: Record,
}

/// Is this source value worth keeping as an alias? Pure numbers and very
/// short strings match far too much.
fn alias_worthy(field: &Field) -> Option<&str> {
    let text = field.text()?;
    if text.chars().count() <= 2 {
        return None;
    }
    if field_number(field).is_some() {
        return None;
    }
    Some(text)
}

/// Alias set for an item: name, description and code first, then any
/// name-like values harvested from the source row. Deduplicated on the
/// case/diacritic-insensitive comparison key, capped at [`MAX_ALIASES`].
pub fn build_aliases(
    name: &str,
    description: Option<&str>,
    code: Option<&str>,
    source: &Record,
) -> Vec<String> {
    let mut aliases: Vec<String> = Vec::new();
    let mut seen: Vec<String> = Vec::new();
    let mut push = |candidate: &str, aliases: &mut Vec<String>, seen: &mut Vec<String>| {
        let trimmed = candidate.trim();
        if trimmed.is_empty() || aliases.len() >= MAX_ALIASES {
            return;
        }
        let key = normalise_for_match(trimmed);
        if key.is_empty() || seen.contains(&key) {
            return;
        }
        seen.push(key);
        aliases.push(trimmed.to_string());
    };

    push(name, &mut aliases, &mut seen);
    if let Some(description) = description {
        push(description, &mut aliases, &mut seen);
    }
    if let Some(code) = code {
        push(code, &mut aliases, &mut seen);
    }
    for (_key, field) in source.iter() {
        if let Some(text) = alias_worthy(field) {
            push(text, &mut aliases, &mut seen);
        }
    }
    aliases
}

/// All price lists, grouped by category.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog {
    lists: BTreeMap<Category, Vec<CatalogItem>>,
}

impl Catalog {
    pub fn items(&self, category: Category) -> &[CatalogItem] {
        self.lists.get(&category).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Bulk-replace one category's list (price-list upload semantics).
    pub fn replace(&mut self, category: Category, items: Vec<CatalogItem>) {
        self.lists.insert(category, items);
    }

    pub fn is_empty(&self) -> bool {
        self.lists.values().all(Vec::is_empty)
    }

    pub fn len(&self) -> usize {
        self.lists.values().map(Vec::len).sum()
    }

    pub fn iter_all(&self) -> impl Iterator<Item = &CatalogItem> {
        self.lists.values().flatten()
    }

    pub fn get(&self, id: &str) -> Option<&CatalogItem> {
        self.iter_all().find(|item| item.id == id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut CatalogItem> {
        self.lists
            .values_mut()
            .flatten()
            .find(|item| item.id == id)
    }

    /// Remove one item by id, returning it if present.
    pub fn remove(&mut self, id: &str) -> Option<CatalogItem> {
        for list in self.lists.values_mut() {
            if let Some(pos) = list.iter().position(|item| item.id == id) {
                return Some(list.remove(pos));
            }
        }
        None
    }

    /// Drop a whole category's items, returning them.
    pub fn clear_category(&mut self, category: Category) -> Vec<CatalogItem> {
        self.lists.remove(&category).unwrap_or_default()
    }

    /// Fuzzy lookup by candidate name. A hit is normalized equality or
    /// substring containment in either direction; among all hits the item
    /// whose matching alias is the longest normalized string wins (a longer
    /// alias is a more specific, higher-confidence match).
    pub fn match_product_by_name(&self, candidate: &str) -> Option<&CatalogItem> {
        let candidate = normalise_for_match(candidate);
        if candidate.is_empty() {
            return None;
        }
        let mut best: Option<(&CatalogItem, usize)> = None;
        for item in self.iter_all() {
            for alias in &item.aliases {
                let alias = normalise_for_match(alias);
                if alias.is_empty() {
                    continue;
                }
                if candidate == alias
                    || candidate.contains(&alias)
                    || alias.contains(&candidate)
                {
                    let score = alias.chars().count();
                    if best.is_none_or(|(_, s)| score > s) {
                        best = Some((item, score));
                    }
                }
            }
        }
        best.map(|(item, _)| item)
    }
}

/// Parse uploaded price-list rows into catalog items. Rows without a
/// detectable price are skipped; everything else is best-effort.
pub fn parse_price_list(ids: &mut IdGen, category: Category, rows: &[Record]) -> Vec<CatalogItem> {
    let mut items = Vec::new();
    for (index, row) in rows.iter().enumerate() {
        let Some(unit_price) = detect_price(row) else {
            continue;
        };
        let fallback = format!("{} ürün {}", category.as_str(), index + 1);
        let fields = classify_row(row, &fallback);
        let aliases = build_aliases(
            &fields.name,
            fields.description.as_deref(),
            fields.code.as_deref(),
            row,
        );
        items.push(CatalogItem {
            id: ids.next("item"),
            category,
            name: fields.name,
            description: fields.description,
            code: fields.code,
            unit: fields.unit,
            unit_price,
            aliases,
            source: row.clone(),
        });
    }
    items
}
