pub mod builders;
pub mod db;
pub mod domain;
pub mod entities;
pub mod repositories;
pub mod services;
pub mod settings;

pub use builders::{build_all, build_all_with_clock, Repositories, Services};
