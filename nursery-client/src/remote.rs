//! Remote data service seam
//!
//! Everything the orchestrator needs from the backend goes through
//! [`RemoteDataService`]. Records cross this boundary as JSON values and are
//! validated into typed models by the caller.

use async_trait::async_trait;
use serde_json::Value;

use crate::ClientResult;

/// Comparison operator of a row filter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    In,
}

impl FilterOp {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::In => "in",
        }
    }
}

/// Row filter (`column op value`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub column: String,
    pub op: FilterOp,
    pub value: String,
}

impl Filter {
    pub fn eq(column: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            op: FilterOp::Eq,
            value: value.into(),
        }
    }

    /// Membership filter; values are joined as `(a,b,c)`
    pub fn one_of<I, S>(column: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let joined = values
            .into_iter()
            .map(|v| v.as_ref().to_string())
            .collect::<Vec<_>>()
            .join(",");
        Self {
            column: column.into(),
            op: FilterOp::In,
            value: format!("({})", joined),
        }
    }

    /// PostgREST operand, e.g. `eq.zone-1`
    pub fn operand(&self) -> String {
        format!("{}.{}", self.op.as_str(), self.value)
    }
}

/// Sort column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub column: String,
    pub ascending: bool,
    pub nulls_first: bool,
}

impl OrderBy {
    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            ascending: true,
            nulls_first: false,
        }
    }

    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            ascending: false,
            nulls_first: false,
        }
    }

    pub fn nulls_first(mut self) -> Self {
        self.nulls_first = true;
        self
    }

    fn encode(&self) -> String {
        format!(
            "{}.{}.{}",
            self.column,
            if self.ascending { "asc" } else { "desc" },
            if self.nulls_first { "nullsfirst" } else { "nullslast" }
        )
    }
}

/// Select query over one resource
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectQuery {
    pub filters: Vec<Filter>,
    pub order: Vec<OrderBy>,
    pub limit: Option<u32>,
}

impl SelectQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn order_by(mut self, order: OrderBy) -> Self {
        self.order.push(order);
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Query-string pairs in PostgREST syntax
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![("select".to_string(), "*".to_string())];
        pairs.extend(
            self.filters
                .iter()
                .map(|f| (f.column.clone(), f.operand())),
        );
        if !self.order.is_empty() {
            let order = self
                .order
                .iter()
                .map(OrderBy::encode)
                .collect::<Vec<_>>()
                .join(",");
            pairs.push(("order".to_string(), order));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit".to_string(), limit.to_string()));
        }
        pairs
    }
}

/// Remote data service (query / insert / update / delete / procedure call)
#[async_trait]
pub trait RemoteDataService: Send + Sync {
    /// Select rows from a resource
    async fn query(&self, resource: &str, query: &SelectQuery) -> ClientResult<Vec<Value>>;

    /// Invoke a remote procedure
    async fn call(&self, procedure: &str, args: Value) -> ClientResult<Value>;

    /// Insert one row (object) or many (array); returns the stored rows
    async fn insert(&self, resource: &str, rows: Value) -> ClientResult<Vec<Value>>;

    /// Patch one row by id; returns the stored row
    async fn update(&self, resource: &str, id: &str, patch: Value) -> ClientResult<Value>;

    /// Delete one row by id
    async fn delete(&self, resource: &str, id: &str) -> ClientResult<()>;
}
