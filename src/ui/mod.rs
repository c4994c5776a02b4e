//! Client-side half of the application: controller, views and preferences.

pub mod controller;
pub mod storage;
pub mod terminal;
pub mod view;

pub use controller::{Confirm, Confirmed, TaskController, TaskView, UiState};
pub use storage::LocalStorage;
pub use view::HtmlView;
