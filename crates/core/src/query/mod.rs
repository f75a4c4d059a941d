//! Filter builder: typed clauses composed into a search request.

mod clause;
mod request;

pub use clause::{
    Clause, Fuzziness, Knn, KnnTarget, MatchKind, MoreLikeThis, MultiMatch, RangeBounds, Script,
    product_expression,
};
pub use request::{QueryRequest, SortClause, SortOrder, build_bool_query};
