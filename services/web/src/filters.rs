//! Marketplace filter state and its query-string codec.
//!
//! Parsing never fails: every invalid or out-of-bounds value falls back to
//! the field default so the page always renders with a complete state.
//! Serialization omits fields equal to their default, keeping URLs canonical.

pub mod sync;

use serde::{Deserialize, Deserializer, Serialize};
use url::form_urlencoded;

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 20;
pub const MAX_LIMIT: u32 = 100;
pub const MAX_RADIUS_KM: u32 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortBy {
    #[default]
    Newest,
    Price,
    Distance,
}

impl SortBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortBy::Newest => "newest",
            SortBy::Price => "price",
            SortBy::Distance => "distance",
        }
    }

    fn from_param(value: &str) -> Option<Self> {
        match value {
            "newest" => Some(SortBy::Newest),
            "price" => Some(SortBy::Price),
            "distance" => Some(SortBy::Distance),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }

    fn from_param(value: &str) -> Option<Self> {
        match value {
            "asc" => Some(SortOrder::Asc),
            "desc" => Some(SortOrder::Desc),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Tab {
    #[default]
    AllOffers,
    MyCargo,
    MyQuotes,
    ActiveDeals,
}

impl Tab {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tab::AllOffers => "all-offers",
            Tab::MyCargo => "my-cargo",
            Tab::MyQuotes => "my-quotes",
            Tab::ActiveDeals => "active-deals",
        }
    }

    fn from_param(value: &str) -> Option<Self> {
        match value {
            "all-offers" => Some(Tab::AllOffers),
            "my-cargo" => Some(Tab::MyCargo),
            "my-quotes" => Some(Tab::MyQuotes),
            "active-deals" => Some(Tab::ActiveDeals),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Low,
    Medium,
    High,
}

impl Urgency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Urgency::Low => "low",
            Urgency::Medium => "medium",
            Urgency::High => "high",
        }
    }

    pub fn from_param(value: &str) -> Option<Self> {
        match value {
            "low" => Some(Urgency::Low),
            "medium" => Some(Urgency::Medium),
            "high" => Some(Urgency::High),
            _ => None,
        }
    }
}

/// Complete marketplace filter state. Field names mirror the recognized
/// query-string keys (`radius_km` travels as `radius`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterState {
    pub location: Option<String>,
    #[serde(rename = "radius")]
    pub radius_km: Option<u32>,
    pub vehicle_type: Option<String>,
    pub vehicle_types: Vec<String>,
    pub price_min: Option<f64>,
    pub price_max: Option<f64>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    pub urgency: Option<Urgency>,
    pub page: u32,
    pub limit: u32,
    pub sort_by: SortBy,
    pub sort_order: SortOrder,
    pub q: Option<String>,
    pub tab: Tab,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            location: None,
            radius_km: None,
            vehicle_type: None,
            vehicle_types: Vec::new(),
            price_min: None,
            price_max: None,
            date_from: None,
            date_to: None,
            urgency: None,
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
            sort_by: SortBy::default(),
            sort_order: SortOrder::default(),
            q: None,
            tab: Tab::default(),
        }
    }
}

impl FilterState {
    /// True when a proximity search is requested: a location together with a
    /// positive radius.
    pub fn radius_active(&self) -> bool {
        self.location.is_some() && self.radius_km.is_some_and(|r| r > 0)
    }

    /// Union of the multi-select vehicle types and the legacy single key.
    pub fn all_vehicle_types(&self) -> Vec<String> {
        let mut types = self.vehicle_types.clone();
        if let Some(single) = &self.vehicle_type {
            if !types.contains(single) {
                types.push(single.clone());
            }
        }
        types
    }
}

/// Parses a query string (with or without a leading `?`) into a `FilterState`.
///
/// Unrecognized keys are ignored. A repeated key is applied in order, so the
/// last occurrence wins, and an empty value resets the field to its default.
pub fn parse(query: &str) -> FilterState {
    let mut state = FilterState::default();
    let trimmed = query.strip_prefix('?').unwrap_or(query);
    for (key, value) in form_urlencoded::parse(trimmed.as_bytes()) {
        apply_param(&mut state, &key, value.trim());
    }
    state
}

fn apply_param(state: &mut FilterState, key: &str, value: &str) {
    match key {
        "location" => state.location = non_empty(value),
        "radius" => {
            state.radius_km = value
                .parse()
                .ok()
                .filter(|r| (1..=MAX_RADIUS_KM).contains(r))
        }
        "vehicle_type" => state.vehicle_type = non_empty(value),
        "vehicle_types" => {
            state.vehicle_types = value
                .split(',')
                .map(str::trim)
                .filter(|part| !part.is_empty())
                .map(str::to_string)
                .collect()
        }
        "price_min" => state.price_min = parse_price(value),
        "price_max" => state.price_max = parse_price(value),
        "date_from" => state.date_from = non_empty(value),
        "date_to" => state.date_to = non_empty(value),
        "urgency" => state.urgency = Urgency::from_param(value),
        "page" => {
            state.page = value
                .parse()
                .ok()
                .filter(|p| *p >= DEFAULT_PAGE)
                .unwrap_or(DEFAULT_PAGE)
        }
        "limit" => {
            state.limit = value
                .parse()
                .ok()
                .filter(|l| (1..=MAX_LIMIT).contains(l))
                .unwrap_or(DEFAULT_LIMIT)
        }
        "sort_by" => state.sort_by = SortBy::from_param(value).unwrap_or_default(),
        "sort_order" => state.sort_order = SortOrder::from_param(value).unwrap_or_default(),
        "q" => state.q = non_empty(value),
        "tab" => state.tab = Tab::from_param(value).unwrap_or_default(),
        _ => {}
    }
}

fn parse_price(value: &str) -> Option<f64> {
    value
        .parse::<f64>()
        .ok()
        .filter(|p| p.is_finite() && *p >= 0.0)
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Serializes a `FilterState` back into a query string, omitting every field
/// that equals its default. `parse(serialize(s)) == s` for canonical states.
pub fn serialize(state: &FilterState) -> String {
    let mut pairs: Vec<(&'static str, String)> = Vec::new();

    if let Some(location) = &state.location {
        pairs.push(("location", location.clone()));
    }
    if let Some(radius) = state.radius_km {
        pairs.push(("radius", radius.to_string()));
    }
    if let Some(vehicle_type) = &state.vehicle_type {
        pairs.push(("vehicle_type", vehicle_type.clone()));
    }
    if !state.vehicle_types.is_empty() {
        pairs.push(("vehicle_types", state.vehicle_types.join(",")));
    }
    if let Some(price_min) = state.price_min {
        pairs.push(("price_min", price_min.to_string()));
    }
    if let Some(price_max) = state.price_max {
        pairs.push(("price_max", price_max.to_string()));
    }
    if let Some(date_from) = &state.date_from {
        pairs.push(("date_from", date_from.clone()));
    }
    if let Some(date_to) = &state.date_to {
        pairs.push(("date_to", date_to.clone()));
    }
    if let Some(urgency) = state.urgency {
        pairs.push(("urgency", urgency.as_str().to_string()));
    }
    if state.page != DEFAULT_PAGE {
        pairs.push(("page", state.page.to_string()));
    }
    if state.limit != DEFAULT_LIMIT {
        pairs.push(("limit", state.limit.to_string()));
    }
    if state.sort_by != SortBy::default() {
        pairs.push(("sort_by", state.sort_by.as_str().to_string()));
    }
    if state.sort_order != SortOrder::default() {
        pairs.push(("sort_order", state.sort_order.as_str().to_string()));
    }
    if let Some(q) = &state.q {
        pairs.push(("q", q.clone()));
    }
    if state.tab != Tab::default() {
        pairs.push(("tab", state.tab.as_str().to_string()));
    }

    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, value) in pairs {
        serializer.append_pair(key, &value);
    }
    serializer.finish()
}

/// The one coupling between filter fields, applied on every state mutation:
/// an active location+radius pair forces the proximity sort, and dropping it
/// reverts a proximity sort back to newest-first.
pub fn apply_derived_rules(mut state: FilterState) -> FilterState {
    if state.radius_active() {
        state.sort_by = SortBy::Distance;
    } else if state.sort_by == SortBy::Distance {
        state.sort_by = SortBy::Newest;
    }
    state
}

/// A partial filter update. Each field distinguishes "leave unchanged"
/// (absent) from "reset to default" (JSON `null`) from "set" (a value).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FilterPatch {
    #[serde(deserialize_with = "double_option")]
    pub location: Option<Option<String>>,
    #[serde(rename = "radius", deserialize_with = "double_option")]
    pub radius_km: Option<Option<u32>>,
    #[serde(deserialize_with = "double_option")]
    pub vehicle_type: Option<Option<String>>,
    #[serde(deserialize_with = "double_option")]
    pub vehicle_types: Option<Option<Vec<String>>>,
    #[serde(deserialize_with = "double_option")]
    pub price_min: Option<Option<f64>>,
    #[serde(deserialize_with = "double_option")]
    pub price_max: Option<Option<f64>>,
    #[serde(deserialize_with = "double_option")]
    pub date_from: Option<Option<String>>,
    #[serde(deserialize_with = "double_option")]
    pub date_to: Option<Option<String>>,
    #[serde(deserialize_with = "double_option")]
    pub urgency: Option<Option<Urgency>>,
    #[serde(deserialize_with = "double_option")]
    pub page: Option<Option<u32>>,
    #[serde(deserialize_with = "double_option")]
    pub limit: Option<Option<u32>>,
    #[serde(deserialize_with = "double_option")]
    pub sort_by: Option<Option<SortBy>>,
    #[serde(deserialize_with = "double_option")]
    pub sort_order: Option<Option<SortOrder>>,
    #[serde(deserialize_with = "double_option")]
    pub q: Option<Option<String>>,
    #[serde(deserialize_with = "double_option")]
    pub tab: Option<Option<Tab>>,
}

fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

impl FilterPatch {
    pub fn is_empty(&self) -> bool {
        self.to_pairs().is_empty()
    }

    /// Tab switches commit without debounce.
    pub fn is_tab_only(&self) -> bool {
        self.tab.is_some()
            && self.location.is_none()
            && self.radius_km.is_none()
            && self.vehicle_type.is_none()
            && self.vehicle_types.is_none()
            && self.price_min.is_none()
            && self.price_max.is_none()
            && self.date_from.is_none()
            && self.date_to.is_none()
            && self.urgency.is_none()
            && self.page.is_none()
            && self.limit.is_none()
            && self.sort_by.is_none()
            && self.sort_order.is_none()
            && self.q.is_none()
    }

    /// Renders the patch as query-string mutations: `Some(value)` upserts the
    /// key, `None` removes it. Values equal to the field default (or invalid
    /// per the codec bounds) render as removals so merged URLs stay canonical.
    pub fn to_pairs(&self) -> Vec<(&'static str, Option<String>)> {
        let mut pairs = Vec::new();

        if let Some(field) = &self.location {
            pairs.push(("location", trimmed_value(field.as_deref())));
        }
        if let Some(field) = self.radius_km {
            let value = field
                .filter(|r| (1..=MAX_RADIUS_KM).contains(r))
                .map(|r| r.to_string());
            pairs.push(("radius", value));
        }
        if let Some(field) = &self.vehicle_type {
            pairs.push(("vehicle_type", trimmed_value(field.as_deref())));
        }
        if let Some(field) = &self.vehicle_types {
            let value = field.as_ref().and_then(|types| {
                let cleaned: Vec<&str> = types
                    .iter()
                    .map(|t| t.trim())
                    .filter(|t| !t.is_empty())
                    .collect();
                if cleaned.is_empty() {
                    None
                } else {
                    Some(cleaned.join(","))
                }
            });
            pairs.push(("vehicle_types", value));
        }
        if let Some(field) = self.price_min {
            let value = field
                .filter(|p| p.is_finite() && *p >= 0.0)
                .map(|p| p.to_string());
            pairs.push(("price_min", value));
        }
        if let Some(field) = self.price_max {
            let value = field
                .filter(|p| p.is_finite() && *p >= 0.0)
                .map(|p| p.to_string());
            pairs.push(("price_max", value));
        }
        if let Some(field) = &self.date_from {
            pairs.push(("date_from", trimmed_value(field.as_deref())));
        }
        if let Some(field) = &self.date_to {
            pairs.push(("date_to", trimmed_value(field.as_deref())));
        }
        if let Some(field) = self.urgency {
            pairs.push(("urgency", field.map(|u| u.as_str().to_string())));
        }
        if let Some(field) = self.page {
            let value = field
                .filter(|p| *p > DEFAULT_PAGE)
                .map(|p| p.to_string());
            pairs.push(("page", value));
        }
        if let Some(field) = self.limit {
            let value = field
                .filter(|l| (1..=MAX_LIMIT).contains(l) && *l != DEFAULT_LIMIT)
                .map(|l| l.to_string());
            pairs.push(("limit", value));
        }
        if let Some(field) = self.sort_by {
            let value = field
                .filter(|s| *s != SortBy::default())
                .map(|s| s.as_str().to_string());
            pairs.push(("sort_by", value));
        }
        if let Some(field) = self.sort_order {
            let value = field
                .filter(|s| *s != SortOrder::default())
                .map(|s| s.as_str().to_string());
            pairs.push(("sort_order", value));
        }
        if let Some(field) = &self.q {
            pairs.push(("q", trimmed_value(field.as_deref())));
        }
        if let Some(field) = self.tab {
            let value = field
                .filter(|t| *t != Tab::default())
                .map(|t| t.as_str().to_string());
            pairs.push(("tab", value));
        }

        pairs
    }
}

fn trimmed_value(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
}
