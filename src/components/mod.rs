pub mod button_bar;
pub mod dialog;
pub mod help;
pub mod listing;
pub mod tree;
