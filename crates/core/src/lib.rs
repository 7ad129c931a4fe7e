pub mod config;
pub mod error;
pub mod locale_data;
pub mod page_key;
pub mod routes;
pub mod translator;
pub mod types;

pub use config::{CONFIG_FILE, parse_site_toml};
pub use error::{Error, Result};
pub use locale_data::LocaleDataStore;
pub use page_key::{PageKey, TemplateName};
pub use routes::{RouteEntry, RouteTable, url_to_output_file};
pub use translator::Translator;
pub use types::*;
