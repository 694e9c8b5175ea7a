pub mod codec;
pub mod config;
pub mod crawler;
pub mod error;
pub mod logger;
pub mod models;
pub mod pages;
pub mod utils;

pub use crawler::VcomycsCrawler;
pub use error::PageError;
pub use models::{Chapter, Manga, MangaPage, MangaStatus};
pub use pages::{ResolvedPage, page_list};
pub use utils::get_user_input;
