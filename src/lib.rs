//! cview, a terminal viewer for the posts and comments collections of a REST
//! content API. Fetches a category, shows it as a filterable, sortable and
//! paged table and downloads the loaded dataset as json.

pub mod columns;
pub mod controller;
pub mod domain;
pub mod export;
pub mod fetcher;
pub mod inputter;
pub mod logging;
pub mod model;
pub mod table;
pub mod ui;
