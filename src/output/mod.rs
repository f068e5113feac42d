//! Output module
//!
//! Exports converted records as Arrow data. A typed struct schema maps to
//! an Arrow schema, and a batch of struct values sharing that schema maps
//! to a `RecordBatch`.
//!
//! # Type mapping
//!
//! | Schema            | Arrow                         |
//! |-------------------|-------------------------------|
//! | int8 .. int64     | Int8 .. Int64                 |
//! | float32 / float64 | Float32 / Float64             |
//! | string / bytes    | Utf8 / Binary                 |
//! | array / struct    | List / Struct                 |
//! | decimal(scale)    | Decimal128(38, scale)         |
//! | timestamp         | Timestamp(Millisecond, "UTC") |

mod batch;
mod schema;

pub use batch::to_record_batch;
pub use schema::{arrow_field, arrow_schema, data_type, DECIMAL_PRECISION, TIMESTAMP_ZONE};
