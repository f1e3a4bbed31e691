//! SQL query builder for catalog searches.
//!
//! Builds a page query and a count query from validated filters:
//! - Bucket-id equality on precomputed level columns
//! - Categorical equality
//! - Tag intersection through the normalized tag table
//! - Availability for catalogs that track stock
//!
//! Pages are always ordered popularity descending, id ascending.

use crate::error::{Error, Result};
use crate::models::{Catalog, CategoryField, Listing, RangeAttribute};
use std::collections::BTreeSet;

mod bind;

use bind::{push_int, push_int_array, push_text};

/// Bind values for `sqlx` queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindValue {
    Int(i64),
    Text(String),
    IntArray(Vec<i64>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    Bucket {
        attribute: RangeAttribute,
        bucket: i64,
    },
    Category {
        field: CategoryField,
        value: String,
    },
}

impl Filter {
    fn catalog(&self) -> Catalog {
        match self {
            Self::Bucket { attribute, .. } => attribute.catalog(),
            Self::Category { field, .. } => field.catalog(),
        }
    }

    fn push_clause(&self, sql: &mut String, bind_params: &mut Vec<BindValue>) {
        match self {
            Self::Bucket { attribute, bucket } => {
                let idx = push_int(bind_params, *bucket);
                sql.push_str(&format!("t.{} = ${}", attribute.level_column(), idx));
            }
            Self::Category { field, value } => {
                let idx = push_text(bind_params, value.clone());
                sql.push_str(&format!("t.{} = ${}", field.column(), idx));
            }
        }
    }

    fn matches<T: Listing>(&self, item: &T) -> bool {
        match self {
            Self::Bucket { attribute, bucket } => item.bucket(*attribute) == Some(*bucket),
            Self::Category { field, value } => item.category(*field) == Some(value.as_str()),
        }
    }
}

/// A validated search. Only constructible through [`SearchQueryBuilder`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    catalog: Catalog,
    filters: Vec<Filter>,
    tag_ids: Vec<i64>,
    page: i64,
    per_page: i64,
}

impl SearchQuery {
    pub fn catalog(&self) -> Catalog {
        self.catalog
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    pub fn tag_ids(&self) -> &[i64] {
        &self.tag_ids
    }

    pub fn page(&self) -> i64 {
        self.page
    }

    pub fn per_page(&self) -> i64 {
        self.per_page
    }

    /// Checked at build time, never overflows.
    pub fn offset(&self) -> i64 {
        self.page * self.per_page
    }

    /// Page query: `(sql, binds)`. Rows are full records of the catalog table.
    pub fn build_sql(&self) -> (String, Vec<BindValue>) {
        let mut sql = format!("SELECT t.* FROM {} t", self.catalog.table());
        let mut bind_params = Vec::new();
        self.push_from_where(&mut sql, &mut bind_params);

        sql.push_str(" ORDER BY t.popularity DESC, t.id ASC");
        let limit_idx = push_int(&mut bind_params, self.per_page);
        let offset_idx = push_int(&mut bind_params, self.offset());
        sql.push_str(&format!(" LIMIT ${} OFFSET ${}", limit_idx, offset_idx));

        (sql, bind_params)
    }

    pub fn build_count_sql(&self) -> (String, Vec<BindValue>) {
        let mut sql = format!("SELECT COUNT(*) FROM {} t", self.catalog.table());
        let mut bind_params = Vec::new();
        self.push_from_where(&mut sql, &mut bind_params);
        (sql, bind_params)
    }

    fn push_from_where(&self, sql: &mut String, bind_params: &mut Vec<BindValue>) {
        if !self.tag_ids.is_empty() {
            let tags_idx = push_int_array(bind_params, self.tag_ids.clone());
            let count_idx = push_int(bind_params, self.tag_ids.len() as i64);
            sql.push_str(&format!(
                " INNER JOIN (SELECT item_id FROM {} WHERE tag_id = ANY(${}) \
                 GROUP BY item_id HAVING COUNT(*) = ${}) matched ON matched.item_id = t.id",
                self.catalog.tag_table(),
                tags_idx,
                count_idx
            ));
        }

        let mut first = true;
        let mut next_clause = |sql: &mut String| {
            sql.push_str(if first { " WHERE " } else { " AND " });
            first = false;
        };

        for filter in &self.filters {
            next_clause(sql);
            filter.push_clause(sql, bind_params);
        }

        if self.catalog.requires_stock() {
            next_clause(sql);
            sql.push_str("t.stock > 0");
        }
    }

    /// In-process evaluation with the same semantics as the rendered SQL.
    pub fn matches<T: Listing>(&self, item: &T, tags: &BTreeSet<i64>) -> bool {
        T::CATALOG == self.catalog
            && item.is_available()
            && self.filters.iter().all(|f| f.matches(item))
            && self.tag_ids.iter().all(|id| tags.contains(id))
    }
}

/// Composes a [`SearchQuery`], rejecting unfiltered or malformed searches.
#[derive(Debug, Clone)]
pub struct SearchQueryBuilder {
    catalog: Catalog,
    filters: Vec<Filter>,
    tag_ids: Vec<i64>,
    page: i64,
    per_page: i64,
    max_page_size: Option<i64>,
}

impl SearchQueryBuilder {
    pub fn new(catalog: Catalog) -> Self {
        Self {
            catalog,
            filters: Vec::new(),
            tag_ids: Vec::new(),
            page: 0,
            per_page: 0,
            max_page_size: None,
        }
    }

    pub fn bucket(mut self, attribute: RangeAttribute, bucket: i64) -> Self {
        self.filters.push(Filter::Bucket { attribute, bucket });
        self
    }

    pub fn category(mut self, field: CategoryField, value: impl Into<String>) -> Self {
        self.filters.push(Filter::Category {
            field,
            value: value.into(),
        });
        self
    }

    pub fn tags(mut self, tag_ids: impl IntoIterator<Item = i64>) -> Self {
        self.tag_ids.extend(tag_ids);
        self
    }

    pub fn page(mut self, page: i64, per_page: i64) -> Self {
        self.page = page;
        self.per_page = per_page;
        self
    }

    pub fn max_page_size(mut self, max: i64) -> Self {
        self.max_page_size = Some(max);
        self
    }

    pub fn build(self) -> Result<SearchQuery> {
        if self.filters.is_empty() && self.tag_ids.is_empty() {
            return Err(Error::BadInput("at least one search condition is required".into()));
        }
        if let Some(filter) = self.filters.iter().find(|f| f.catalog() != self.catalog) {
            return Err(Error::BadInput(format!(
                "filter {:?} does not apply to the {} catalog",
                filter,
                self.catalog.as_str()
            )));
        }
        if self.page < 0 {
            return Err(Error::BadInput(format!("page must be >= 0, got {}", self.page)));
        }
        if self.per_page < 1 {
            return Err(Error::BadInput(format!(
                "perPage must be >= 1, got {}",
                self.per_page
            )));
        }
        if let Some(max) = self.max_page_size {
            if self.per_page > max {
                return Err(Error::BadInput(format!(
                    "perPage must be <= {}, got {}",
                    max, self.per_page
                )));
            }
        }
        if self.page.checked_mul(self.per_page).is_none() {
            return Err(Error::BadInput("page offset out of range".into()));
        }

        let mut tag_ids = self.tag_ids;
        tag_ids.sort_unstable();
        tag_ids.dedup();

        Ok(SearchQuery {
            catalog: self.catalog,
            filters: self.filters,
            tag_ids,
            page: self.page,
            per_page: self.per_page,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::{furniture, property};

    #[test]
    fn zero_filters_is_bad_input() {
        let err = SearchQueryBuilder::new(Catalog::Furniture)
            .page(0, 20)
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::BadInput(_)));
    }

    #[test]
    fn rejects_invalid_pagination() {
        let base = SearchQueryBuilder::new(Catalog::Property).bucket(RangeAttribute::Rent, 1);
        assert!(base.clone().page(-1, 20).build().is_err());
        assert!(base.clone().page(0, 0).build().is_err());
        assert!(base.clone().page(0, 101).max_page_size(100).build().is_err());
        assert!(base.clone().page(i64::MAX, 2).build().is_err());
        assert!(base.page(3, 25).build().is_ok());
    }

    #[test]
    fn rejects_attribute_of_other_catalog() {
        let err = SearchQueryBuilder::new(Catalog::Property)
            .bucket(RangeAttribute::Price, 0)
            .page(0, 10)
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::BadInput(_)));
    }

    #[test]
    fn furniture_sql_adds_stock_predicate_and_ordering() {
        let query = SearchQueryBuilder::new(Catalog::Furniture)
            .bucket(RangeAttribute::Price, 2)
            .category(CategoryField::Color, "black")
            .page(2, 20)
            .build()
            .unwrap();

        let (sql, binds) = query.build_sql();
        assert_eq!(
            sql,
            "SELECT t.* FROM furniture t WHERE t.price_level = $1 AND t.color = $2 \
             AND t.stock > 0 ORDER BY t.popularity DESC, t.id ASC LIMIT $3 OFFSET $4"
        );
        assert_eq!(
            binds,
            vec![
                BindValue::Int(2),
                BindValue::Text("black".into()),
                BindValue::Int(20),
                BindValue::Int(40),
            ]
        );
    }

    #[test]
    fn property_sql_has_no_stock_predicate() {
        let query = SearchQueryBuilder::new(Catalog::Property)
            .bucket(RangeAttribute::DoorWidth, 1)
            .page(0, 20)
            .build()
            .unwrap();
        let (sql, _) = query.build_count_sql();
        assert_eq!(
            sql,
            "SELECT COUNT(*) FROM property t WHERE t.door_width_level = $1"
        );
    }

    #[test]
    fn tag_filter_renders_grouped_intersection() {
        let query = SearchQueryBuilder::new(Catalog::Property)
            .tags([4, 1, 4])
            .page(0, 20)
            .build()
            .unwrap();
        assert_eq!(query.tag_ids(), &[1, 4]);

        let (sql, binds) = query.build_count_sql();
        assert_eq!(
            sql,
            "SELECT COUNT(*) FROM property t INNER JOIN (SELECT item_id FROM property_tag \
             WHERE tag_id = ANY($1) GROUP BY item_id HAVING COUNT(*) = $2) matched \
             ON matched.item_id = t.id"
        );
        assert_eq!(binds, vec![BindValue::IntArray(vec![1, 4]), BindValue::Int(2)]);
    }

    #[test]
    fn in_process_matching_follows_sql_semantics() {
        let query = SearchQueryBuilder::new(Catalog::Furniture)
            .category(CategoryField::Kind, "office")
            .tags([1, 2])
            .page(0, 20)
            .build()
            .unwrap();

        let tags: BTreeSet<i64> = [1, 2, 3].into_iter().collect();
        assert!(query.matches(&furniture(1, 100, 0, 1), &tags));
        assert!(!query.matches(&furniture(1, 100, 0, 0), &tags));

        let partial: BTreeSet<i64> = [1, 4].into_iter().collect();
        assert!(!query.matches(&furniture(1, 100, 0, 1), &partial));

        assert!(!query.matches(&property(1, 100, 0, 0.0, 0.0), &tags));
    }
}
