/// Advanced results: filtering, sorting, field selection and pagination for
/// list endpoints
///
/// A list request is parsed into a [`ListQuery`] against the resource's field
/// table, then [`fetch_page`] runs a filtered `COUNT(*)` and the page query.
///
/// # Query syntax
///
/// ```text
/// ?averageCost[lte]=10000&careers[in]=Business,UI/UX
///     &select=name,description&sort=-averageCost,name&page=2&limit=10
/// ```
///
/// # Example
///
/// ```no_run
/// use devcamper_shared::models::bootcamp::Bootcamp;
/// use devcamper_shared::query::{fetch_page, ListQuery, Listable};
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), Box<dyn std::error::Error>> {
/// let pairs = vec![("housing".to_string(), "true".to_string())];
/// let query = ListQuery::parse(&pairs, Bootcamp::RESOURCE)?;
/// let page = fetch_page::<Bootcamp>(&pool, &query).await?;
/// println!("{} of {}", page.items.len(), page.total);
/// # Ok(())
/// # }
/// ```

pub mod builder;
pub mod fields;
pub mod params;

pub use builder::{fetch_page, AdvancedResults, Listable, Page, PageRef, Pagination};
pub use fields::{Field, FieldKind, Resource};
pub use params::{Filter, FilterValue, ListQuery, Operator, QueryError, SortKey};

/// Default page size
pub const DEFAULT_LIMIT: i64 = 25;

/// Largest accepted page size
pub const MAX_LIMIT: i64 = 100;
