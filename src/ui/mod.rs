pub mod button;
pub mod typewriter;
