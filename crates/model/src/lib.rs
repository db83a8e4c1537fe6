pub mod core;
pub mod error;
pub mod records;

pub use crate::core::{
    convert::RawValue,
    data_type::{Category, ColumnType, DataType},
    value::Value,
};
pub use error::ModelError;
pub use records::{
    form::{DataForm, Dictionary},
    row::Row,
    table::Table,
    vector::Vector,
};

/// Builds a `Vec<RawValue>` from heterogeneous host values.
///
/// ```
/// use model::{row, RawValue};
///
/// let cells: Vec<RawValue> = row!["AAPL", 187.5, 1200_i64];
/// assert_eq!(cells.len(), 3);
/// ```
#[macro_export]
macro_rules! row {
    () => { Vec::<$crate::RawValue>::new() };
    ($($cell:expr),+ $(,)?) => {
        vec![$($crate::RawValue::from($cell)),+]
    };
}
