use serde_json::Value;
use std::cmp::Ordering;

use crate::error::{ApiError, Result};
use crate::models::{Entity, SortableField};

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 2000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Ascending => "ASC",
            SortDirection::Descending => "DESC",
        }
    }

    pub fn as_es(&self) -> &'static str {
        match self {
            SortDirection::Ascending => "asc",
            SortDirection::Descending => "desc",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortOrder {
    pub property: String,
    pub direction: SortDirection,
}

/// Page request: 0-based page index, page size and sort orders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pageable {
    pub page: u32,
    pub size: u32,
    pub sort: Vec<SortOrder>,
}

impl Default for Pageable {
    fn default() -> Self {
        Self {
            page: 0,
            size: DEFAULT_PAGE_SIZE,
            sort: Vec::new(),
        }
    }
}

impl Pageable {
    pub fn of(page: u32, size: u32) -> Self {
        Self {
            page,
            size: size.clamp(1, MAX_PAGE_SIZE),
            sort: Vec::new(),
        }
    }

    pub fn with_sort(mut self, property: &str, direction: SortDirection) -> Self {
        self.sort.push(SortOrder {
            property: property.to_string(),
            direction,
        });
        self
    }

    /// Build from raw query pairs. Unparseable or out-of-range numbers fall
    /// back to the defaults; `sort` may repeat.
    pub fn from_pairs(pairs: &[(String, String)]) -> Self {
        let mut pageable = Pageable::default();

        for (key, value) in pairs {
            match key.as_str() {
                "page" => {
                    let page = value.trim().parse::<i64>().unwrap_or(0).max(0);
                    pageable.page = u32::try_from(page).unwrap_or(u32::MAX);
                }
                "size" => {
                    pageable.size = match value.trim().parse::<i64>() {
                        Ok(size) if size >= 1 => size.min(MAX_PAGE_SIZE as i64) as u32,
                        _ => DEFAULT_PAGE_SIZE,
                    };
                }
                "sort" => pageable.sort.extend(parse_sort_param(value)),
                _ => {}
            }
        }

        pageable
    }

    pub fn offset(&self) -> u64 {
        self.page as u64 * self.size as u64
    }

    /// Resolve sort properties against an entity's whitelist, defaulting to `id` ascending.
    pub fn resolve_sort<E: Entity>(&self) -> Result<Vec<(&'static SortableField, SortDirection)>> {
        let mut resolved = Vec::with_capacity(self.sort.len() + 1);

        for order in &self.sort {
            let field = E::sortable(&order.property).ok_or_else(|| {
                ApiError::InvalidRequest(format!(
                    "Unknown sort property '{}' for {}",
                    order.property,
                    E::ENTITY_NAME
                ))
            })?;
            resolved.push((field, order.direction));
        }

        if !resolved.iter().any(|(f, _)| f.property == "id") {
            if let Some(id) = E::sortable("id") {
                resolved.push((id, SortDirection::Ascending));
            }
        }

        Ok(resolved)
    }
}

/// `prop` or `prop,asc` / `prop,desc`
fn parse_sort_param(value: &str) -> Option<SortOrder> {
    let mut parts = value.split(',').map(str::trim);
    let property = parts.next().filter(|p| !p.is_empty())?;

    let direction = match parts.next() {
        Some(dir) if dir.eq_ignore_ascii_case("desc") => SortDirection::Descending,
        _ => SortDirection::Ascending,
    };

    Some(SortOrder {
        property: property.to_string(),
        direction,
    })
}

/// A bounded slice of a larger collection.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub content: Vec<T>,
    pub number: u32,
    pub size: u32,
    pub total_elements: u64,
}

impl<T> Page<T> {
    pub fn new(content: Vec<T>, pageable: &Pageable, total_elements: u64) -> Self {
        Self {
            content,
            number: pageable.page,
            size: pageable.size,
            total_elements,
        }
    }

    pub fn empty(pageable: &Pageable) -> Self {
        Self::new(Vec::new(), pageable, 0)
    }

    pub fn total_pages(&self) -> u64 {
        if self.size == 0 {
            return 1;
        }
        self.total_elements.div_ceil(self.size as u64)
    }

    pub fn map<U, F>(self, f: F) -> Page<U>
    where
        F: FnMut(T) -> U,
    {
        Page {
            content: self.content.into_iter().map(f).collect(),
            number: self.number,
            size: self.size,
            total_elements: self.total_elements,
        }
    }
}

/// Sort and slice an in-process collection of serialized records.
pub fn page_in_memory<E: Entity>(mut records: Vec<E>, pageable: &Pageable) -> Result<Page<E>> {
    let orders = pageable.resolve_sort::<E>()?;

    let mut keyed: Vec<(Value, E)> = records
        .drain(..)
        .map(|r| (serde_json::to_value(&r).unwrap_or(Value::Null), r))
        .collect();

    keyed.sort_by(|(a, _), (b, _)| {
        for (field, direction) in &orders {
            let ordering = compare_json(&a[field.property], &b[field.property]);
            let ordering = match direction {
                SortDirection::Ascending => ordering,
                SortDirection::Descending => ordering.reverse(),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    });

    let total = keyed.len() as u64;
    let content = keyed
        .into_iter()
        .skip(pageable.offset() as usize)
        .take(pageable.size as usize)
        .map(|(_, r)| r)
        .collect();

    Ok(Page::new(content, pageable, total))
}

/// Nulls first, then numbers, then strings; other shapes compare equal.
fn compare_json(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Less,
        (_, Value::Null) => Ordering::Greater,
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => Ordering::Equal,
    }
}
