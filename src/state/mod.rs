/// State management module
///
/// This module handles all session state:
/// - The secret image and its store (data.rs)
/// - The Setup → Camera → Processing → Result state machine (flow.rs)
/// - The state machine wired to the camera (session.rs)

pub mod data;
pub mod flow;
pub mod session;
