pub mod catalog;
pub mod learning_example;
