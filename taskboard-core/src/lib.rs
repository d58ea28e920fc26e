//! Client-side state for a Kanban task board.
//!
//! [`engine::Engine`] keeps a [`view_model::ViewModel`] in step with remote
//! task and column stores reached through the [`store`] ports. Board
//! gestures (drops, CRUD, column lifecycle) go through the engine, which
//! decides when local state may change and how failures are reconciled.

pub mod engine;
pub mod sequence;
pub mod slug;
pub mod store;
pub mod types;
pub mod ui;
pub mod view_model;
pub mod wire;
