//! SQL assembly and pagination for [`ListQuery`].

use serde::Serialize;
use serde_json::Value;
use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};

use super::fields::{FieldKind, Resource};
use super::params::{Filter, FilterValue, ListQuery, Operator};

/// A row type that can be listed through the query builder
pub trait Listable: for<'r> FromRow<'r, PgRow> + Serialize + Send + Unpin {
    const RESOURCE: &'static Resource;
}

/// Link to a neighbouring page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageRef {
    pub page: i64,
    pub limit: i64,
}

/// `next`/`prev` links, each present only when that page has records
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Pagination {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<PageRef>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev: Option<PageRef>,
}

impl Pagination {
    pub fn compute(page: i64, limit: i64, total: i64) -> Self {
        let end = page.saturating_mul(limit);
        let start = page.saturating_sub(1).saturating_mul(limit);

        Self {
            next: (end < total)
                .then(|| page.checked_add(1))
                .flatten()
                .map(|page| PageRef { page, limit }),
            prev: (start > 0)
                .then(|| page.checked_sub(1))
                .flatten()
                .map(|page| PageRef { page, limit }),
        }
    }
}

/// One page of typed rows
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Filtered count before pagination
    pub total: i64,
    pub pagination: Pagination,
}

/// List response body
#[derive(Debug, Clone, Serialize)]
pub struct AdvancedResults {
    pub success: bool,
    pub count: usize,
    pub pagination: Pagination,
    pub data: Vec<Value>,
}

impl AdvancedResults {
    pub fn new(data: Vec<Value>, pagination: Pagination) -> Self {
        Self {
            success: true,
            count: data.len(),
            pagination,
            data,
        }
    }
}

/// Runs the filtered count and the page query
pub async fn fetch_page<T: Listable>(pool: &PgPool, query: &ListQuery) -> Result<Page<T>, sqlx::Error> {
    let resource = T::RESOURCE;

    let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM ");
    count.push(resource.table);
    push_filters(&mut count, &query.filters);
    let total: i64 = count.build_query_scalar::<i64>().fetch_one(pool).await?;

    let mut select = QueryBuilder::<Postgres>::new("SELECT * FROM ");
    select.push(resource.table);
    push_filters(&mut select, &query.filters);
    push_order(&mut select, query);
    select.push(" LIMIT ");
    select.push_bind(query.limit);
    select.push(" OFFSET ");
    select.push_bind(query.offset());

    tracing::debug!(sql = select.sql(), "List query");

    let items = select.build_query_as::<T>().fetch_all(pool).await?;

    Ok(Page {
        items,
        total,
        pagination: Pagination::compute(query.page, query.limit, total),
    })
}

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filters: &[Filter]) {
    for (i, filter) in filters.iter().enumerate() {
        qb.push(if i == 0 { " WHERE " } else { " AND " });

        let column = filter.field.expr();
        match (filter.field.kind, filter.op) {
            (FieldKind::TextArray, Operator::Eq) => {
                push_value(qb, &filter.value);
                qb.push(" = ANY(");
                qb.push(column);
                qb.push(")");
            }
            (FieldKind::TextArray, Operator::In) => {
                qb.push(column);
                qb.push(" && ");
                push_value(qb, &filter.value);
            }
            (_, Operator::In) => {
                qb.push(column);
                qb.push(" = ANY(");
                push_value(qb, &filter.value);
                qb.push(")");
            }
            (_, op) => {
                qb.push(column);
                qb.push(" ");
                qb.push(op.sql());
                qb.push(" ");
                push_value(qb, &filter.value);
            }
        }
    }
}

fn push_value(qb: &mut QueryBuilder<'_, Postgres>, value: &FilterValue) {
    match value.clone() {
        FilterValue::Text(v) => qb.push_bind(v),
        FilterValue::Number(v) => qb.push_bind(v),
        FilterValue::Bool(v) => qb.push_bind(v),
        FilterValue::Timestamp(v) => qb.push_bind(v),
        FilterValue::Uuid(v) => qb.push_bind(v),
        FilterValue::TextList(v) => qb.push_bind(v),
        FilterValue::NumberList(v) => qb.push_bind(v),
        FilterValue::UuidList(v) => qb.push_bind(v),
    };
}

fn push_order(qb: &mut QueryBuilder<'_, Postgres>, query: &ListQuery) {
    qb.push(" ORDER BY ");

    if query.sort.is_empty() {
        qb.push("created_at ASC");
    } else {
        let mut terms = qb.separated(", ");
        for key in &query.sort {
            terms.push(format!(
                "{} {}",
                key.field.column,
                if key.descending { "DESC" } else { "ASC" }
            ));
        }
    }

    qb.push(", id ASC");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::fields::Field;

    const BOOTCAMPS: &Resource = &Resource {
        table: "bootcamps",
        fields: &[
            Field::new("name", "name", FieldKind::Text),
            Field::new("averageCost", "average_cost", FieldKind::Number),
            Field::new("careers", "careers", FieldKind::TextArray),
            Field::new("createdAt", "created_at", FieldKind::Timestamp),
        ],
    };

    fn sql_for(items: &[(&str, &str)]) -> String {
        let pairs: Vec<(String, String)> = items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let query = ListQuery::parse(&pairs, BOOTCAMPS).unwrap();

        let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM bootcamps");
        push_filters(&mut qb, &query.filters);
        push_order(&mut qb, &query);
        qb.sql().to_string()
    }

    #[test]
    fn test_pagination_links() {
        // 5 records, 2 per page
        assert_eq!(
            Pagination::compute(1, 2, 5),
            Pagination {
                next: Some(PageRef { page: 2, limit: 2 }),
                prev: None
            }
        );
        assert_eq!(
            Pagination::compute(2, 2, 5),
            Pagination {
                next: Some(PageRef { page: 3, limit: 2 }),
                prev: Some(PageRef { page: 1, limit: 2 })
            }
        );
        assert_eq!(
            Pagination::compute(3, 2, 5),
            Pagination {
                next: None,
                prev: Some(PageRef { page: 2, limit: 2 })
            }
        );
        assert_eq!(Pagination::compute(1, 25, 0), Pagination::default());
    }

    #[test]
    fn test_pagination_far_past_the_end() {
        assert_eq!(
            Pagination::compute(i64::MAX, 25, 0),
            Pagination {
                next: None,
                prev: Some(PageRef {
                    page: i64::MAX - 1,
                    limit: 25
                }),
            }
        );
        assert_eq!(Pagination::compute(i64::MAX, i64::MAX, i64::MAX).next, None);
    }

    #[test]
    fn test_pagination_serialization_omits_missing_links() {
        let json = serde_json::to_value(Pagination::compute(1, 25, 3)).unwrap();
        assert_eq!(json, serde_json::json!({}));
    }

    #[test]
    fn test_default_order() {
        assert_eq!(
            sql_for(&[]),
            "SELECT * FROM bootcamps ORDER BY created_at ASC, id ASC"
        );
    }

    #[test]
    fn test_filters_and_sort() {
        assert_eq!(
            sql_for(&[
                ("averageCost[lte]", "10000"),
                ("careers", "Business"),
                ("careers[in]", "UI/UX,Other"),
                ("name[in]", "A,B"),
                ("sort", "-averageCost,name"),
            ]),
            "SELECT * FROM bootcamps WHERE average_cost <= $1 AND $2 = ANY(careers) \
             AND careers && $3 AND name = ANY($4) \
             ORDER BY average_cost DESC, name ASC, id ASC"
        );
    }

    #[test]
    fn test_advanced_results_count() {
        let results = AdvancedResults::new(
            vec![serde_json::json!({"_id": "1"}), serde_json::json!({"_id": "2"})],
            Pagination::default(),
        );
        assert!(results.success);
        assert_eq!(results.count, 2);
    }
}
