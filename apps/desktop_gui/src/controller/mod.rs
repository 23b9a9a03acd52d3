//! Controller layer: UI events and orchestration of workflow effects. The
//! state transitions themselves live in `client_core::controller`.

pub mod events;
pub mod orchestration;
