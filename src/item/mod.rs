pub mod item_dto;
pub mod item_handlers;
pub mod item_models;
pub mod item_repository;
pub mod item_service;

pub use item_models::{normalize_condition, Category, Item, ItemWithSeller, Photo};
pub use item_repository::ItemRepository;
pub use item_service::ItemService;
