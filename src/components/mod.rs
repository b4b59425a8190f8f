pub mod colors;
pub mod fill;
pub mod history;
pub mod tools;
