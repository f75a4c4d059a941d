//! Aggregation builder: named aggregation requests and their decoded results.

mod decode;
mod spec;

pub use decode::{Bucket, BucketList, DecodedAgg, DecodedAggs, StatsValue, decode};
pub use spec::{
    AggSpec, Aggregations, CalendarInterval, DateHistogramAgg, FieldProduct, TermsAgg, TermsOrder,
    build_aggregations,
};
