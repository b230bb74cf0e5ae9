//! Request extractors shared by the domain routers.

pub mod json_or_form;

pub use json_or_form::JsonOrForm;
