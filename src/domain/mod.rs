// Domain layer - Plain data types shared by every other layer
pub mod dashboard;
pub mod field;
pub mod widget;
