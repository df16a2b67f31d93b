//! Two-way sync between the filter-set and the URL query string.
//!
//! Tracked fields are mirrored one parameter per field. A filter on `id` is also
//! written as `detalle` (and read back from it) so detail links stay shareable.

use crate::filter::{FilterPredicate, Operator};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use url::{form_urlencoded, Url};

/// Alias parameter that mirrors a filter on `ID_FIELD`.
pub const DETAIL_PARAM: &str = "detalle";
pub const ID_FIELD: &str = "id";

/// Ordered query parameters with URLSearchParams semantics.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `a=1&b=2` (a leading `?` is ignored).
    pub fn parse(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        Self {
            pairs: form_urlencoded::parse(query.as_bytes())
                .map(|(k, v)| (k.into_owned(), v.into_owned()))
                .collect(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.pairs.iter().any(|(k, _)| k == key)
    }

    /// Replace the first occurrence in place and drop the rest; append when absent.
    pub fn set(&mut self, key: &str, value: &str) {
        match self.pairs.iter().position(|(k, _)| k == key) {
            Some(i) => {
                self.pairs[i].1 = value.to_string();
                let mut seen = 0;
                self.pairs.retain(|(k, _)| {
                    if k != key {
                        return true;
                    }
                    seen += 1;
                    seen == 1
                });
            }
            None => self.append(key, value),
        }
    }

    pub fn append(&mut self, key: &str, value: &str) {
        self.pairs.push((key.to_string(), value.to_string()));
    }

    pub fn delete(&mut self, key: &str) {
        self.pairs.retain(|(k, _)| k != key);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// `application/x-www-form-urlencoded` serialization, without the leading `?`.
    pub fn to_query_string(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(&self.pairs)
            .finish()
    }
}

impl fmt::Display for QueryParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_query_string())
    }
}

/// Read/write access to the current location's query string.
pub trait UrlAccessor {
    fn query(&self) -> QueryParams;
    fn set_query(&mut self, params: QueryParams);
    /// Scheme, host and port, e.g. `https://app.example.com`.
    fn origin(&self) -> String;
    fn path(&self) -> String;
}

/// In-memory browser location backed by a parsed URL.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BrowserLocation {
    url: Url,
}

impl BrowserLocation {
    pub fn parse(href: &str) -> Result<Self, url::ParseError> {
        Ok(Self {
            url: Url::parse(href)?,
        })
    }

    pub fn href(&self) -> &str {
        self.url.as_str()
    }
}

impl UrlAccessor for BrowserLocation {
    fn query(&self) -> QueryParams {
        QueryParams::parse(self.url.query().unwrap_or(""))
    }

    fn set_query(&mut self, params: QueryParams) {
        if params.is_empty() {
            self.url.set_query(None);
        } else {
            self.url.set_query(Some(&params.to_query_string()));
        }
    }

    fn origin(&self) -> String {
        self.url.origin().ascii_serialization()
    }

    fn path(&self) -> String {
        self.url.path().to_string()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UrlSyncOptions {
    /// Fields mirrored into the URL. Fixed for the lifetime of a sync.
    pub url_fields: Vec<String>,
    /// Operator given to predicates hydrated from the URL; `equals` when unset.
    pub default_operators: HashMap<String, Operator>,
    /// When false, `commit` only replaces the filter-set.
    pub sync_to_url: bool,
}

impl Default for UrlSyncOptions {
    fn default() -> Self {
        let url_fields = vec![
            "estado".to_string(),
            "proveedor".to_string(),
            "cliente_proyecto".to_string(),
        ];
        let default_operators = HashMap::from([
            ("estado".to_string(), Operator::Equals),
            ("proveedor".to_string(), Operator::Contains),
            ("cliente_proyecto".to_string(), Operator::Contains),
        ]);
        Self {
            url_fields,
            default_operators,
            sync_to_url: true,
        }
    }
}

impl UrlSyncOptions {
    pub fn tracking<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            url_fields: fields.into_iter().map(Into::into).collect(),
            default_operators: HashMap::new(),
            sync_to_url: true,
        }
    }

    pub fn with_operator(mut self, field: impl Into<String>, operator: Operator) -> Self {
        self.default_operators.insert(field.into(), operator);
        self
    }
}

/// Filter-set plus the location it is mirrored into. Every mutation goes
/// through `&mut self`, so the filter-set and the URL change together.
pub struct FilterUrlSync<L> {
    location: L,
    options: UrlSyncOptions,
    filters: Vec<FilterPredicate>,
    last_hydrated: Option<String>,
}

impl<L: UrlAccessor> FilterUrlSync<L> {
    pub fn new(location: L, options: UrlSyncOptions) -> Self {
        Self {
            location,
            options,
            filters: Vec::new(),
            last_hydrated: None,
        }
    }

    pub fn filters(&self) -> &[FilterPredicate] {
        &self.filters
    }

    pub fn location(&self) -> &L {
        &self.location
    }

    pub fn options(&self) -> &UrlSyncOptions {
        &self.options
    }

    pub fn is_tracked(&self, field: &str) -> bool {
        self.options.url_fields.iter().any(|f| f == field)
    }

    pub fn default_operator(&self, field: &str) -> Operator {
        self.options
            .default_operators
            .get(field)
            .copied()
            .unwrap_or(Operator::Equals)
    }

    /// Predicates implied by the current URL. Does not touch the filter-set.
    pub fn hydrate_from_url(&self) -> Vec<FilterPredicate> {
        let params = self.location.query();
        let mut out: Vec<FilterPredicate> = self
            .options
            .url_fields
            .iter()
            .enumerate()
            .filter_map(|(index, field)| {
                let value = params.get(field).filter(|v| !v.is_empty())?;
                Some(FilterPredicate::with_id(
                    format!("url-filter-{}", index),
                    field.clone(),
                    self.default_operator(field),
                    value,
                ))
            })
            .collect();

        if let Some(detail) = params.get(DETAIL_PARAM).filter(|v| !v.is_empty()) {
            if !out.iter().any(|f| f.targets(ID_FIELD)) {
                out.push(FilterPredicate::with_id(
                    "url-filter-detalle",
                    ID_FIELD,
                    Operator::Equals,
                    detail,
                ));
            }
        }
        out
    }

    /// Hydrate once per distinct query string. The result is applied only
    /// while the filter-set is empty, so URL state never overrides user edits.
    pub fn sync_from_url(&mut self) -> bool {
        let current = self.location.query().to_query_string();
        if self.last_hydrated.as_deref() == Some(current.as_str()) {
            return false;
        }
        self.last_hydrated = Some(current);
        if !self.filters.is_empty() {
            return false;
        }
        let hydrated = self.hydrate_from_url();
        if hydrated.is_empty() {
            return false;
        }
        tracing::debug!(count = hydrated.len(), "filters hydrated from url");
        self.filters = hydrated;
        true
    }

    /// Replace the filter-set and rewrite the tracked part of the URL.
    /// Parameters outside the tracked fields and the alias are preserved.
    pub fn commit(&mut self, filters: Vec<FilterPredicate>) {
        self.filters = filters;
        if !self.options.sync_to_url {
            return;
        }
        let mut params = self.location.query();
        for field in &self.options.url_fields {
            params.delete(field);
        }
        params.delete(DETAIL_PARAM);
        for f in &self.filters {
            if self.is_tracked(&f.field) {
                params.set(&f.field, &f.value);
            }
            if f.targets(ID_FIELD) {
                params.set(DETAIL_PARAM, &f.value);
            }
        }
        let query = params.to_query_string();
        tracing::debug!(query = %query, "url rewritten from filters");
        self.location.set_query(params);
        self.last_hydrated = Some(query);
    }

    /// Navigate to a URL carrying exactly one parameter. The filter-set is left alone.
    pub fn quick_filter(&mut self, field: &str, value: &str) {
        let mut params = QueryParams::new();
        params.set(field, value);
        self.location.set_query(params);
    }

    pub fn clear_all(&mut self) {
        self.commit(Vec::new());
    }

    /// Absolute URL for the current tracked filters.
    pub fn to_shareable_url(&self) -> String {
        let mut params = QueryParams::new();
        for f in &self.filters {
            if self.is_tracked(&f.field) {
                params.set(&f.field, &f.value);
            }
        }
        self.absolute(&params)
    }

    /// Absolute URL for a custom field -> value mapping; empty values and
    /// untracked fields are dropped.
    pub fn to_shareable_url_with<I, K, V>(&self, custom: I) -> String
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut params = QueryParams::new();
        for (k, v) in custom {
            let (k, v) = (k.as_ref(), v.as_ref());
            if !v.is_empty() && self.is_tracked(k) {
                params.set(k, v);
            }
        }
        self.absolute(&params)
    }

    fn absolute(&self, params: &QueryParams) -> String {
        format!(
            "{}{}?{}",
            self.location.origin(),
            self.location.path(),
            params.to_query_string()
        )
    }

    pub fn get_param(&self, key: &str) -> Option<String> {
        self.location.query().get(key).map(str::to_string)
    }

    pub fn set_param(&mut self, key: &str, value: &str) {
        let mut params = self.location.query();
        params.set(key, value);
        self.location.set_query(params);
    }

    pub fn remove_param(&mut self, key: &str) {
        let mut params = self.location.query();
        params.delete(key);
        self.location.set_query(params);
    }
}
