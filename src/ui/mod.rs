//! Desktop presentation: the quote form and its settings.

pub mod components;
pub mod pages;
pub mod shell;
