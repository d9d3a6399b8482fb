pub mod controller;
pub mod history;
pub mod input;
pub mod jobs;
pub mod services;
pub mod session;
pub mod shortcuts;
pub mod tools;

pub use controller::{Action, Actions, Controller, InteractionState};
pub use history::History;
pub use input::{InputEvent, Modifiers, PointerPhase};
pub use jobs::{JobId, JobOutput, JobResult, Jobs};
pub use services::{ServiceError, ServiceResult};
pub use session::{GENERATED_IMAGE_RECT, Notice, Services, Session};
pub use shortcuts::{ShortcutAction, ShortcutMap};
pub use tools::{ToolKind, ToolSettings};
