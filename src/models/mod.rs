pub mod catalog;

pub use catalog::{Metric, Operator, Property, PropertyValueOption, ValueClass};
