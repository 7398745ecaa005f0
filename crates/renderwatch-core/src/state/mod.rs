mod machine;

pub use machine::{MonitorState, Status, StatusMachine, Transition};
