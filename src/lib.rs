//! calboard - month calendar task board
//!
//! The board engine keeps per-day tasks, a label registry and a filter state
//! in one owned [`board::Board`]. Day ranges and holidays come from the
//! [`calendar`] and [`holidays`] collaborators; [`snapshot`] and [`storage`]
//! move the board in and out of JSON files.

pub mod board;
pub mod calendar;
pub mod config;
pub mod filter;
pub mod holidays;
pub mod labels;
pub mod model;
pub mod snapshot;
pub mod storage;
pub mod store;
pub mod view;

pub use board::Board;
pub use model::{BoardError, DayKey, Label, LabelId, LabelRef, Task, TaskId};
