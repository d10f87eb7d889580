//! Domain types: canonical field names, raw tables and typed datasets.

pub mod dataset;
pub mod fields;

pub use dataset::{
    float_values, format_number, numeric_column, present_cells, text_column, text_values, Dataset,
    DatasetError, RawRecord, RawTable, RawValue,
};
pub use fields::TraderCategory;
