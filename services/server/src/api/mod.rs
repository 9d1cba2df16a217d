pub mod error;
pub mod events;
pub mod items;
pub mod menus;
pub mod openapi;
pub mod screens;
pub mod system;
pub mod types;
