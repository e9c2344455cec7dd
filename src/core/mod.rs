// Core modules implementing operand classification, addition, and error modeling.
pub mod combine;
pub mod error;
pub mod number;
